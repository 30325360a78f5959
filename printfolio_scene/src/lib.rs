//! Scene, camera, and animation core for the printer portfolio.
//!
//! Three stylized printers sit on a shared ground plane. Hovering or clicking
//! one zooms the camera in and lifts its label; the rest of the crate keeps
//! the toolheads printing, routes pointer input through ray picking, and
//! drives the eased camera transitions. Nothing here talks to a GPU: hosts
//! call [`PortfolioScene::tick`] from whatever frame loop they own and draw
//! [`PortfolioScene::draw_list`] with their renderer of choice.

pub mod camera;
pub mod color;
pub mod color_manager;
pub mod config;
pub mod easing;
pub mod environment;
pub mod geometry;
pub mod graph;
pub mod hover;
pub mod letters;
pub mod model_loader;
pub mod name_blocks;
pub mod picking;
pub mod portfolio;
pub mod print_animator;
pub mod printer;
pub mod sections;
pub mod transition;

pub use camera::{CameraPose, CameraRig, OrbitLimits, OrbitState, Projection};
pub use color::{ColorPair, Rgb};
pub use config::{COLOR_OPTIONS, ColorOption, HiddenProgress, SceneConfig, SectionDescriptor};
pub use graph::{DrawItem, InteractiveRole, NodeId, RoleTag, SceneGraph};
pub use model_loader::{LoadedModel, ModelLoadError, PendingModel};
pub use portfolio::{
    CursorHint, PointerButton, PortfolioScene, SceneEvent, ViewSnapshot, Viewport,
};
pub use transition::{LabelPath, TransitionDirection};

//! Runtime owner of the portfolio scene. Holds the graph, camera, transition
//! and print state, and exposes the entry points the host UI drives.
//! Submodules cover lifecycle slices: `init` for construction, `frame` for the
//! per-tick update, and `input` for pointer, touch, and wheel routing.

use glam::{Vec2, Vec3};
use serde::Serialize;

use crate::camera::{CameraPose, CameraRig, OrbitState};
use crate::color::ColorPair;
use crate::color_manager::apply_printer_colors;
use crate::config::SceneConfig;
use crate::environment::SceneEnvironment;
use crate::graph::{DrawItem, NodeId, SceneGraph};
use crate::letters::TextureStore;
use crate::model_loader::{LoadedModel, PendingModel};
use crate::name_blocks::NameBlocks;
use crate::print_animator::PrintState;
use crate::printer::Printer;
use crate::sections::path_for_view;
use crate::transition::{LabelPath, TransitionDirection, Transitioner};

mod frame;
mod init;
mod input;

pub use input::PointerButton;

/// Drawable surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    #[default]
    Grab,
    Grabbing,
    Pointer,
    Move,
}

/// Notifications for the host UI, drained once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SceneEvent {
    TransitionStarted {
        direction: TransitionDirection,
        target: Option<usize>,
    },
    ViewChanged {
        view: Option<usize>,
    },
    Navigated {
        path: String,
    },
    ColorPickerRequested {
        printer: usize,
    },
    ColorPickerClosed,
    Loaded,
    ModelAttached,
}

/// Everything a host needs to render its overlay for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub current_view: Option<usize>,
    pub path: String,
    pub is_transitioning: bool,
    pub hovered_printer: Option<usize>,
    pub hovered_spool: Option<usize>,
    pub hovered_block: Option<char>,
    pub spool_tooltip: Option<Vec2>,
    pub loaded: bool,
    pub cursor: CursorHint,
    pub camera: CameraPose,
    pub orbit: OrbitState,
    pub printer_colors: Vec<ColorPair>,
    pub boosted_printer: Option<usize>,
    pub frame: u64,
}

#[derive(Debug, Clone, Default)]
struct HoverState {
    printer: Option<usize>,
    spool: Option<usize>,
    block: Option<NodeId>,
    spool_tooltip: Option<Vec2>,
    cursor: CursorHint,
}

impl HoverState {
    fn clear(&mut self) {
        self.printer = None;
        self.spool = None;
        self.block = None;
        self.spool_tooltip = None;
        self.cursor = CursorHint::Grab;
    }
}

pub struct PortfolioScene {
    config: SceneConfig,
    graph: SceneGraph,
    textures: TextureStore,
    environment: SceneEnvironment,
    printers: Vec<Printer>,
    label_paths: Vec<LabelPath>,
    name: NameBlocks,
    model: Option<NodeId>,
    pending_model: Option<PendingModel>,
    rig: CameraRig,
    viewport: Viewport,
    transitioner: Transitioner,
    current_view: Option<usize>,
    print: PrintState,
    hover: HoverState,
    interaction: input::InteractionState,
    events: Vec<SceneEvent>,
    clock: f32,
    frames: u64,
    loaded: bool,
    mounted: bool,
}

impl PortfolioScene {
    /// Builds the scene. `initial_path` opens straight into the matching
    /// section without animating.
    pub fn new(config: SceneConfig, initial_path: &str, viewport: Viewport) -> anyhow::Result<Self> {
        init::new(config, initial_path, viewport)
    }

    /// Advances the scene by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        frame::tick(self, dt);
    }

    /// Starts the zoom into printer `index`. Only accepted from the overview
    /// while no transition runs.
    pub fn zoom_to_printer(&mut self, index: usize) -> bool {
        if !self.mounted {
            return false;
        }
        let Some(section) = self.config.sections.get(index) else {
            log::debug!("[scene] zoom to unknown printer {index} ignored");
            return false;
        };
        if let Some(view) = self.current_view {
            log::debug!("[scene] zoom to printer {index} ignored; printer {view} is focused");
            return false;
        }
        let destination = self.config.zoomed_camera.orbit_for(section);
        if !self
            .transitioner
            .begin_zoom_in(index, self.clock, self.rig.orbit, destination)
        {
            log::debug!("[scene] zoom to printer {index} ignored; transition running");
            return false;
        }
        self.rig.target = None;
        log::info!("[scene] zooming to {}", section.id);
        self.events.push(SceneEvent::TransitionStarted {
            direction: TransitionDirection::In,
            target: Some(index),
        });
        true
    }

    /// Starts the zoom back to the overview. Only accepted while a printer is
    /// focused and no transition runs.
    pub fn zoom_to_home(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        if self.current_view.is_none() {
            log::debug!("[scene] zoom home ignored; already in overview");
            return false;
        }
        let destination = self.config.overview_camera;
        if !self
            .transitioner
            .begin_zoom_out(self.current_view, self.clock, self.rig.orbit, destination)
        {
            log::debug!("[scene] zoom home ignored; transition running");
            return false;
        }
        self.rig.target = None;
        self.hover.block = None;
        log::info!("[scene] returning to overview");
        self.events.push(SceneEvent::TransitionStarted {
            direction: TransitionDirection::Out,
            target: None,
        });
        true
    }

    /// Eases the camera back to the framing of the current view.
    pub fn reset_view(&mut self) {
        let target = match self.current_view.and_then(|i| self.config.sections.get(i)) {
            Some(section) => self.config.zoomed_camera.orbit_for(section),
            None => self.config.overview_camera,
        };
        self.rig.set_target(target);
    }

    pub fn change_printer_color(&mut self, index: usize, colors: ColorPair) -> bool {
        let Some(printer) = self.printers.get_mut(index) else {
            log::debug!("[scene] color change for unknown printer {index} ignored");
            return false;
        };
        apply_printer_colors(&mut self.graph, &mut self.textures, printer, colors);
        self.events.push(SceneEvent::ColorPickerClosed);
        true
    }

    /// Restores every printer to its section's configured colors.
    pub fn reset_colors(&mut self) {
        for (index, section) in self.config.sections.iter().enumerate() {
            if let Some(printer) = self.printers.get_mut(index) {
                apply_printer_colors(&mut self.graph, &mut self.textures, printer, section.colors());
            }
        }
        self.events.push(SceneEvent::ColorPickerClosed);
    }

    /// Adds a loaded decorative model, replacing any previous one.
    pub fn attach_model(&mut self, model: LoadedModel) -> NodeId {
        init::attach_model(self, model)
    }

    /// Starts loading `path` in the background; the result is picked up by
    /// a later `tick`.
    pub fn load_model(&mut self, path: std::path::PathBuf) {
        let mut options = self.config.model.clone();
        options.path = Some(path.clone());
        self.pending_model = Some(PendingModel::spawn(path, options));
    }

    pub fn model_pending(&self) -> bool {
        self.pending_model.is_some()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
    }

    /// Stops all further ticking and input handling.
    pub fn unmount(&mut self) {
        if self.mounted {
            log::info!("[scene] unmounted after {} frames", self.frames);
        }
        self.mounted = false;
        self.pending_model = None;
        self.interaction = Default::default();
        self.print.release();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            current_view: self.current_view,
            path: path_for_view(&self.config.sections, self.current_view),
            is_transitioning: self.transitioner.is_active(),
            hovered_printer: self.hover.printer,
            hovered_spool: self.hover.spool,
            hovered_block: self
                .hover
                .block
                .and_then(|id| self.graph.node(id))
                .and_then(|node| node.meta.glyph),
            spool_tooltip: self.hover.spool_tooltip,
            loaded: self.loaded,
            cursor: self.hover.cursor,
            camera: self.rig.pose(),
            orbit: self.rig.orbit,
            printer_colors: self.printers.iter().map(|p| p.colors).collect(),
            boosted_printer: self.print.boosted(),
            frame: self.frames,
        }
    }

    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.graph.draw_list()
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn environment(&self) -> &SceneEnvironment {
        &self.environment
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn printers(&self) -> &[Printer] {
        &self.printers
    }

    pub fn name_blocks(&self) -> &NameBlocks {
        &self.name
    }

    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    pub fn current_view(&self) -> Option<usize> {
        self.current_view
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioner.is_active()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.rig
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.rig.pose()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn print_state(&self) -> &PrintState {
        &self.print
    }

    pub fn view_projection(&self) -> glam::Mat4 {
        self.environment.projection.view_projection(
            &self.rig.pose(),
            self.viewport.width,
            self.viewport.height,
        )
    }

    /// World point to viewport pixels; `None` when behind the camera.
    pub fn project_to_screen(&self, world: Vec3) -> Option<Vec2> {
        self.environment.projection.project_to_screen(
            &self.rig.pose(),
            world,
            self.viewport.width,
            self.viewport.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COLOR_OPTIONS;

    fn scene_at(path: &str) -> PortfolioScene {
        PortfolioScene::new(SceneConfig::default(), path, Viewport::new(1280.0, 720.0))
            .expect("default config builds")
    }

    #[test]
    fn deep_link_opens_focused_without_transition() {
        let scene = scene_at("/contact");
        assert_eq!(scene.current_view(), Some(2));
        assert!(!scene.is_transitioning());
        assert!(!scene.graph()[scene.printers()[0].root].visible);
        assert!(!scene.graph()[scene.name_blocks().group].visible);
        assert!((scene.camera().orbit.distance - 8.0).abs() < 1e-6);
        assert_eq!(scene.camera().orbit.pan_x, 5.0);
        assert_eq!(scene.snapshot().path, "/contact");
    }

    #[test]
    fn unknown_path_opens_overview() {
        let scene = scene_at("/login");
        assert_eq!(scene.current_view(), None);
        assert_eq!(scene.camera().orbit, OrbitState::overview());
    }

    #[test]
    fn out_of_range_requests_are_ignored() {
        let mut scene = scene_at("/");
        assert!(!scene.zoom_to_printer(7));
        assert!(!scene.change_printer_color(3, COLOR_OPTIONS[0].colors));
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn color_change_closes_picker_and_reset_restores_defaults() {
        let mut scene = scene_at("/");
        let red = COLOR_OPTIONS[1].colors;
        assert!(scene.change_printer_color(1, red));
        assert_eq!(scene.snapshot().printer_colors[1], red);
        assert_eq!(scene.drain_events(), vec![SceneEvent::ColorPickerClosed]);

        scene.reset_colors();
        let defaults: Vec<ColorPair> = scene.config().sections.iter().map(|s| s.colors()).collect();
        assert_eq!(scene.snapshot().printer_colors, defaults);
    }

    #[test]
    fn reset_view_targets_current_framing() {
        let mut scene = scene_at("/projects");
        scene.wheel(300.0);
        scene.reset_view();
        let target = scene.camera().target.expect("target set");
        assert!((target.distance - 8.0).abs() < 1e-6);
        assert_eq!(target.pan_x, 0.0);
    }

    #[test]
    fn unmounted_scene_ignores_everything() {
        let mut scene = scene_at("/");
        scene.unmount();
        let before = scene.camera().orbit;
        scene.tick(0.5);
        scene.wheel(100.0);
        assert!(!scene.zoom_to_printer(0));
        assert_eq!(scene.camera().orbit, before);
        assert_eq!(scene.snapshot().frame, 0);
    }
}

use anyhow::{Context, Result};
use glam::Vec3;

use super::{HoverState, PortfolioScene, Viewport};
use crate::camera::CameraRig;
use crate::config::SceneConfig;
use crate::environment::SceneEnvironment;
use crate::graph::{InteractiveRole, Material, NodeId, RoleTag, SceneGraph};
use crate::letters::TextureStore;
use crate::model_loader::{LoadedModel, PendingModel};
use crate::name_blocks::build_name_blocks;
use crate::print_animator::PrintState;
use crate::printer::{Printer, build_printer};
use crate::sections::section_for_path;
use crate::transition::{LabelPath, Transitioner, raise_label};

pub(super) fn new(config: SceneConfig, initial_path: &str, viewport: Viewport) -> Result<PortfolioScene> {
    config.validate().context("invalid scene configuration")?;

    let mut graph = SceneGraph::new();
    let mut textures = TextureStore::new();
    let printers: Vec<Printer> = config
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| build_printer(&mut graph, &mut textures, section, index))
        .collect();
    let label_paths: Vec<LabelPath> = config
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| section.label_path(index))
        .collect();
    let name = build_name_blocks(&mut graph, &mut textures, &config.owner_name, config.name_color);

    let mut rig = CameraRig::new(config.overview_camera, config.limits);
    let current_view = section_for_path(&config.sections, initial_path);
    if let Some(view) = current_view {
        rig.jump_to(config.zoomed_camera.orbit_for(&config.sections[view]));
        for printer in printers.iter().filter(|p| p.index != view) {
            graph.set_visible(printer.root, false);
        }
        graph.set_visible(name.group, false);
        raise_label(&mut graph, &printers[view], label_paths[view]);
    }

    let pending_model = config
        .model
        .path
        .clone()
        .map(|path| PendingModel::spawn(path, config.model.clone()));

    log::info!(
        "[scene] built {} printers, {} nodes, {} letter rasters; opening {}",
        printers.len(),
        graph.node_count(),
        textures.len(),
        current_view
            .map(|view| config.sections[view].id.as_str())
            .unwrap_or("overview")
    );

    Ok(PortfolioScene {
        environment: SceneEnvironment::from_config(&config),
        transitioner: Transitioner::new(config.transition_seconds),
        print: PrintState::new(printers.len()),
        config,
        graph,
        textures,
        printers,
        label_paths,
        name,
        model: None,
        pending_model,
        rig,
        viewport,
        current_view,
        hover: HoverState::default(),
        interaction: Default::default(),
        events: Vec::new(),
        clock: 0.0,
        frames: 0,
        loaded: false,
        mounted: true,
    })
}

pub(super) fn attach_model(scene: &mut PortfolioScene, model: LoadedModel) -> NodeId {
    if let Some(previous) = scene.model.take() {
        scene.graph.remove(previous);
    }
    let root = scene.graph.root();
    let material = Material::standard(model.color, 0.15, 0.6);
    let id = scene.graph.add_custom_mesh(root, model.mesh, material);
    let visible = scene.current_view == Some(scene.config.model.section_index);
    let node = &mut scene.graph[id];
    node.name = Some("decorativeModel".to_string());
    node.transform.position = model.position;
    node.transform.scale = Vec3::splat(model.scale);
    node.role = Some(RoleTag::free(InteractiveRole::DecorativeModel));
    node.visible = visible;

    scene.model = Some(id);
    scene.events.push(super::SceneEvent::ModelAttached);
    log::info!("[scene] decorative model attached (visible: {visible})");
    id
}

use super::{PortfolioScene, SceneEvent};
use crate::hover::{animate_label_hover, animate_name_hover};
use crate::print_animator::animate_printers;
use crate::sections::path_for_view;
use crate::transition::{TransitionOutcome, TransitionScene};

const LOADED_AFTER_FRAMES: u64 = 3;

pub(super) fn tick(scene: &mut PortfolioScene, dt: f32) {
    if !scene.mounted {
        return;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    scene.clock += dt;
    scene.frames += 1;
    if scene.frames == LOADED_AFTER_FRAMES {
        scene.loaded = true;
        scene.events.push(SceneEvent::Loaded);
    }

    poll_model(scene);
    drive_camera(scene);
    animate_hover(scene);
    animate_printers(
        &mut scene.graph,
        &scene.printers,
        &mut scene.print,
        dt,
        scene.config.hidden_progress,
    );
}

fn poll_model(scene: &mut PortfolioScene) {
    let Some(result) = scene.pending_model.as_ref().and_then(|pending| pending.poll()) else {
        return;
    };
    scene.pending_model = None;
    match result {
        Ok(model) => {
            scene.attach_model(model);
        }
        Err(err) => log::warn!("[scene] decorative model unavailable: {err}"),
    }
}

fn drive_camera(scene: &mut PortfolioScene) {
    let transition_scene = TransitionScene {
        printers: &scene.printers,
        label_paths: &scene.label_paths,
        name_group: Some(scene.name.group),
        model: scene.model.map(|id| (id, scene.config.model.section_index)),
    };
    let outcome = scene.transitioner.drive(
        scene.clock,
        &mut scene.rig,
        &mut scene.graph,
        &transition_scene,
    );
    match outcome {
        TransitionOutcome::Idle => {
            scene.rig.step();
        }
        TransitionOutcome::Running => {}
        TransitionOutcome::ZoomedIn(index) => finish_view_change(scene, Some(index)),
        TransitionOutcome::ZoomedOut => finish_view_change(scene, None),
    }
}

fn finish_view_change(scene: &mut PortfolioScene, view: Option<usize>) {
    scene.current_view = view;
    let path = path_for_view(&scene.config.sections, view);
    log::info!("[scene] view settled at {path}");
    scene.events.push(SceneEvent::ViewChanged { view });
    scene.events.push(SceneEvent::Navigated { path });
}

fn animate_hover(scene: &mut PortfolioScene) {
    if scene.transitioner.is_active() {
        return;
    }
    match scene.current_view {
        Some(view) => {
            if let Some(printer) = scene.printers.get(view) {
                animate_label_hover(&mut scene.graph, printer, scene.hover.block);
            }
        }
        None => animate_name_hover(&mut scene.graph, &scene.name.blocks, scene.hover.block),
    }
}

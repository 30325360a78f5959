//! Procedural "printing" motion.
//!
//! Each printer walks a 30 second cycle: the toolhead sweeps serpentine passes
//! across the bed, one pass per strip, while the bed slides so the active
//! strip stays under the nozzle. Strips appear as they are deposited and the
//! whole stack clears when the cycle wraps.

use glam::Vec3;

use crate::config::HiddenProgress;
use crate::easing::ease_in_out_cubic;
use crate::geometry::build_tube;
use crate::graph::SceneGraph;
use crate::printer::{
    LAYER_COUNT, LAYER_HEIGHT, LAYERS_BASE_Y, NOZZLE_LENGTH, PRINT_SIZE, Printer,
    SPOOL_OUTER_RADIUS, SPOOL_POSITION, STRIPS_PER_LAYER, TOOLHEAD_Z, strip_z, tube_material,
};

pub const START_PROGRESS: f32 = 5.0;
pub const PROGRESS_RATE: f32 = 0.35;
pub const CYCLE_SECONDS: f32 = 30.0;
pub const PHASE_OFFSET: f32 = 2.0;
/// Spool spin in radians per second at normal speed.
pub const SPOOL_SPIN: f32 = 0.72;
const MIN_DEPOSIT: f32 = 0.02;
const TUBE_SEGMENTS: u32 = 64;
const TUBE_RADIUS: f32 = 0.018;
const TUBE_RADIAL_SEGMENTS: u32 = 8;

/// Per-printer speed multipliers and accumulated progress.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintState {
    pub speeds: Vec<f32>,
    pub progress: Vec<f32>,
    boosted: Option<usize>,
}

impl PrintState {
    pub fn new(printers: usize) -> Self {
        Self {
            speeds: vec![1.0; printers],
            progress: vec![START_PROGRESS; printers],
            boosted: None,
        }
    }

    pub fn boosted(&self) -> Option<usize> {
        self.boosted
    }

    pub fn boost(&mut self, index: usize, speed: f32) {
        if let Some(previous) = self.release() {
            log::debug!("[print] boost moved from printer {previous} to {index}");
        }
        if let Some(slot) = self.speeds.get_mut(index) {
            *slot = speed;
            self.boosted = Some(index);
        }
    }

    /// Restores normal speed; returns the printer that was boosted.
    pub fn release(&mut self) -> Option<usize> {
        let index = self.boosted.take()?;
        if let Some(slot) = self.speeds.get_mut(index) {
            *slot = 1.0;
        }
        Some(index)
    }

    pub fn cycle_time(&self, index: usize) -> f32 {
        self.progress.get(index).copied().unwrap_or(START_PROGRESS) + PHASE_OFFSET * index as f32
    }
}

/// Where in the print cycle a printer is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintPhase {
    pub cycle_progress: f32,
    pub layer: usize,
    /// Progress through the current layer, `0.0..1.0`.
    pub layer_local: f32,
    pub pass: usize,
    pub pass_fraction: f32,
    pub eased: f32,
    pub left_to_right: bool,
}

pub fn print_phase(cycle_time: f32) -> PrintPhase {
    let cycle_progress = cycle_time.rem_euclid(CYCLE_SECONDS) / CYCLE_SECONDS;
    let scaled_layers = cycle_progress * LAYER_COUNT as f32;
    let layer = (scaled_layers.floor() as usize).min(LAYER_COUNT - 1);
    let layer_local = (scaled_layers - layer as f32).clamp(0.0, 1.0);

    let scaled_passes = layer_local * STRIPS_PER_LAYER as f32;
    let pass = (scaled_passes.floor() as usize) % STRIPS_PER_LAYER;
    let pass_fraction = scaled_passes.fract();
    let global_pass = layer * STRIPS_PER_LAYER + pass;

    PrintPhase {
        cycle_progress,
        layer,
        layer_local,
        pass,
        pass_fraction,
        eased: ease_in_out_cubic(pass_fraction),
        left_to_right: global_pass % 2 == 0,
    }
}

/// Nozzle-carrier position in printer space.
pub fn toolhead_position(phase: &PrintPhase) -> Vec3 {
    let amplitude = PRINT_SIZE / 2.0;
    let x = if phase.left_to_right {
        -amplitude + phase.eased * PRINT_SIZE
    } else {
        amplitude - phase.eased * PRINT_SIZE
    };
    let top_of_layer = LAYERS_BASE_Y + (phase.layer + 1) as f32 * LAYER_HEIGHT;
    Vec3::new(x, top_of_layer + NOZZLE_LENGTH, TOOLHEAD_Z)
}

/// Z offset applied to the heatbed and layer stack so the active strip sits
/// under the toolhead, drifting halfway toward the next strip.
pub fn bed_offset(phase: &PrintPhase) -> f32 {
    let current = strip_z(phase.pass);
    let next = strip_z(phase.pass + 1);
    let local = current + (next - current) * phase.eased * 0.5;
    TOOLHEAD_Z - local
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StripState {
    Hidden,
    Complete,
    /// Partially laid strip anchored at the edge the toolhead started from.
    Depositing { scale: f32, offset_x: f32 },
}

pub fn strip_state(phase: &PrintPhase, layer: usize, strip: usize) -> StripState {
    if layer < phase.layer {
        return StripState::Complete;
    }
    if layer > phase.layer {
        return StripState::Hidden;
    }
    let current = (phase.layer_local * STRIPS_PER_LAYER as f32).floor() as usize;
    if strip < current {
        StripState::Complete
    } else if strip == current {
        let scale = phase.eased.max(MIN_DEPOSIT);
        let half_gap = PRINT_SIZE / 2.0 * (1.0 - scale);
        let left_to_right = (layer * STRIPS_PER_LAYER + strip) % 2 == 0;
        StripState::Depositing {
            scale,
            offset_x: if left_to_right { -half_gap } else { half_gap },
        }
    } else {
        StripState::Hidden
    }
}

/// Bowden tube path from the spool down into the top of the toolhead.
pub fn tube_control_points(toolhead: Vec3) -> [Vec3; 6] {
    let start_y = SPOOL_POSITION.y - SPOOL_OUTER_RADIUS;
    let (sx, sz) = (SPOOL_POSITION.x, SPOOL_POSITION.z);
    let top = Vec3::new(toolhead.x, toolhead.y + 0.45, toolhead.z);
    [
        Vec3::new(sx, start_y + 0.02, sz),
        Vec3::new(sx, start_y - 0.05, sz),
        Vec3::new(sx, start_y - 0.18, sz + 0.12),
        Vec3::new(top.x + 0.1, top.y + 0.4, top.z - 0.15),
        Vec3::new(top.x + 0.02, top.y + 0.1, top.z - 0.03),
        top,
    ]
}

fn apply_phase(graph: &mut SceneGraph, printer: &Printer, phase: &PrintPhase) {
    let toolhead = toolhead_position(phase);
    graph[printer.toolhead].transform.position = toolhead;
    graph[printer.gantry].transform.position.y = toolhead.y;
    let bed_z = bed_offset(phase);
    graph[printer.heatbed].transform.position.z = bed_z;
    graph[printer.layers].transform.position.z = bed_z;

    graph.clear_children(printer.tube_group);
    let mesh = build_tube(
        &tube_control_points(toolhead),
        TUBE_SEGMENTS,
        TUBE_RADIUS,
        TUBE_RADIAL_SEGMENTS,
    );
    let tube = graph.add_custom_mesh(printer.tube_group, mesh, tube_material(printer.colors.print_color));
    graph[tube].name = Some("tube".to_string());

    for (layer, row) in printer.strips.iter().enumerate() {
        for (strip, id) in row.iter().enumerate() {
            let node = &mut graph[*id];
            match strip_state(phase, layer, strip) {
                StripState::Hidden => node.visible = false,
                StripState::Complete => {
                    node.visible = true;
                    node.transform.scale.x = 1.0;
                    node.transform.position.x = 0.0;
                }
                StripState::Depositing { scale, offset_x } => {
                    node.visible = true;
                    node.transform.scale.x = scale;
                    node.transform.position.x = offset_x;
                }
            }
        }
    }
}

/// Advances every visible printer by `dt` seconds.
pub fn animate_printers(
    graph: &mut SceneGraph,
    printers: &[Printer],
    state: &mut PrintState,
    dt: f32,
    hidden: HiddenProgress,
) {
    for printer in printers {
        let index = printer.index;
        let speed = state.speeds.get(index).copied().unwrap_or(1.0);
        let visible = graph.is_effectively_visible(printer.root);
        if !visible && hidden == HiddenProgress::Freeze {
            continue;
        }
        if let Some(progress) = state.progress.get_mut(index) {
            *progress += dt * PROGRESS_RATE * speed;
        }
        if !visible {
            continue;
        }

        let phase = print_phase(state.cycle_time(index));
        apply_phase(graph, printer, &phase);
        graph[printer.spool].transform.rotation.x -= SPOOL_SPIN * speed * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sections;
    use crate::letters::TextureStore;
    use crate::printer::build_printer;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn layers_advance_monotonically_then_wrap() {
        let mut last = 0;
        let mut wrapped = false;
        let mut t = 0.0;
        while t < CYCLE_SECONDS * 1.5 {
            let phase = print_phase(t);
            if phase.layer < last {
                assert_eq!(last, LAYER_COUNT - 1);
                assert_eq!(phase.layer, 0);
                wrapped = true;
            }
            last = phase.layer;
            t += 0.01;
        }
        assert!(wrapped);
    }

    #[test]
    fn half_deposited_strip_scales_from_its_start_edge() {
        // one strip lasts 30 / (30 * 8) = 0.125s; halfway through strip 0
        let phase = print_phase(0.0625);
        assert_eq!(phase.layer, 0);
        assert_eq!(phase.pass, 0);
        assert!(approx_eq(phase.eased, 0.5));
        match strip_state(&phase, 0, 0) {
            StripState::Depositing { scale, offset_x } => {
                assert!(approx_eq(scale, 0.5));
                assert!(approx_eq(offset_x, -0.3));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(strip_state(&phase, 0, 1), StripState::Hidden);
        assert_eq!(strip_state(&phase, 1, 0), StripState::Hidden);

        // second pass runs right to left
        let phase = print_phase(0.125 + 0.0625);
        match strip_state(&phase, 0, 1) {
            StripState::Depositing { offset_x, .. } => assert!(approx_eq(offset_x, 0.3)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(strip_state(&phase, 0, 0), StripState::Complete);
    }

    #[test]
    fn fresh_strip_has_minimum_width() {
        let phase = print_phase(3.01);
        let current = (phase.layer_local * STRIPS_PER_LAYER as f32).floor() as usize;
        match strip_state(&phase, phase.layer, current) {
            StripState::Depositing { scale, .. } => assert!(scale >= MIN_DEPOSIT),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(strip_state(&phase, phase.layer - 1, 7), StripState::Complete);
    }

    #[test]
    fn toolhead_rides_on_top_of_current_layer() {
        let phase = print_phase(0.0);
        let toolhead = toolhead_position(&phase);
        assert!(approx_eq(toolhead.x, -0.6));
        assert!(approx_eq(toolhead.y, LAYERS_BASE_Y + LAYER_HEIGHT + NOZZLE_LENGTH));
        assert!(approx_eq(toolhead.z, TOOLHEAD_Z));
        assert!(approx_eq(bed_offset(&phase), TOOLHEAD_Z - strip_z(0)));

        let tube = tube_control_points(toolhead);
        assert!(approx_eq(tube[0].y, 1.45));
        assert!(approx_eq(tube[5].y, toolhead.y + 0.45));
    }

    #[test]
    fn boost_and_release_restore_speed() {
        let mut state = PrintState::new(3);
        state.boost(1, 5.0);
        assert_eq!(state.speeds, vec![1.0, 5.0, 1.0]);
        assert_eq!(state.release(), Some(1));
        assert_eq!(state.speeds, vec![1.0, 1.0, 1.0]);
        assert_eq!(state.release(), None);
    }

    #[test]
    fn tube_is_regenerated_without_leaking_geometry() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let sections = default_sections();
        let printers: Vec<Printer> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| build_printer(&mut graph, &mut textures, s, i))
            .collect();
        let mut state = PrintState::new(printers.len());

        animate_printers(&mut graph, &printers, &mut state, 0.016, HiddenProgress::Freeze);
        let baseline = graph.geometry_count();
        for _ in 0..20 {
            animate_printers(&mut graph, &printers, &mut state, 0.016, HiddenProgress::Freeze);
        }
        assert_eq!(graph.geometry_count(), baseline);
        for printer in &printers {
            assert_eq!(graph[printer.tube_group].children().len(), 1);
        }
    }

    #[test]
    fn hidden_printers_follow_policy() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let sections = default_sections();
        let printers: Vec<Printer> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| build_printer(&mut graph, &mut textures, s, i))
            .collect();
        graph.set_visible(printers[2].root, false);

        let mut frozen = PrintState::new(3);
        animate_printers(&mut graph, &printers, &mut frozen, 1.0, HiddenProgress::Freeze);
        assert_eq!(frozen.progress[2], START_PROGRESS);
        assert!(approx_eq(frozen.progress[0], START_PROGRESS + PROGRESS_RATE));
        assert!(graph[printers[2].tube_group].children().is_empty());

        let mut advancing = PrintState::new(3);
        animate_printers(&mut graph, &printers, &mut advancing, 1.0, HiddenProgress::Advance);
        assert!(approx_eq(advancing.progress[2], START_PROGRESS + PROGRESS_RATE));
        assert!(graph[printers[2].tube_group].children().is_empty());
    }
}

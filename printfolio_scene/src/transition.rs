//! Camera transitions between the overview and a single focused printer.
//!
//! A transition is a pure function of elapsed scene time: every driven frame
//! recomputes the orbit, the scale of the printers being hidden or revealed,
//! and the pose of each label block from the snapshot taken when the
//! transition began.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraRig, OrbitState};
use crate::easing::{ease_in_out_cubic, staggered};
use crate::graph::{NodeId, SceneGraph};
use crate::printer::Printer;

/// Where a label ends up relative to its resting row once focused.
pub const LABEL_RISE: Vec3 = Vec3::new(0.0, 4.6, -2.4);
const HIDDEN_SCALE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionDirection {
    In,
    Out,
}

/// Entrance choreography for a section's label blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPath {
    /// Blocks tip over one after another, left to right.
    DominoFlip,
    /// Blocks swing in sideways with alternating heights.
    TypewriterSweep,
    /// Blocks burst outward from the middle, right to left.
    FountainBurst,
}

/// Offset from a block's stored original pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelOffset {
    pub translation: Vec3,
    /// Rotation about X.
    pub pitch: f32,
}

impl LabelPath {
    pub fn for_index(index: usize) -> LabelPath {
        match index {
            0 => LabelPath::DominoFlip,
            1 => LabelPath::TypewriterSweep,
            _ => LabelPath::FountainBurst,
        }
    }

    fn delay(self, block: usize, total: usize, direction: TransitionDirection) -> f32 {
        let reversed = total.saturating_sub(1).saturating_sub(block) as f32;
        let forward = block as f32;
        match (self, direction) {
            (LabelPath::DominoFlip, TransitionDirection::In) => forward * 0.06,
            (LabelPath::DominoFlip, TransitionDirection::Out) => reversed * 0.06,
            (LabelPath::TypewriterSweep, TransitionDirection::In) => forward * 0.05,
            (LabelPath::TypewriterSweep, TransitionDirection::Out) => reversed * 0.05,
            (LabelPath::FountainBurst, TransitionDirection::In) => reversed * 0.03,
            (LabelPath::FountainBurst, TransitionDirection::Out) => forward * 0.03,
        }
    }

    fn arc(self, block: usize, total: usize, phase: f32) -> Vec3 {
        let i = block as f32;
        match self {
            LabelPath::DominoFlip => Vec3::new(0.0, phase * 0.5, phase * 1.8),
            LabelPath::TypewriterSweep => Vec3::new(
                phase * (1.2 - i * 0.1),
                phase * (0.8 + (block % 2) as f32 * 0.4),
                phase * 0.6,
            ),
            LabelPath::FountainBurst => {
                let half = total as f32 / 2.0;
                let spread = (i - half) * 0.3;
                let falloff = if total == 0 {
                    0.0
                } else {
                    1.0 - (i - half).abs() / total as f32
                };
                Vec3::new(
                    phase * spread.sin() * 1.5,
                    phase * 1.8 * falloff,
                    phase * (0.8 + spread.cos() * 0.6),
                )
            }
        }
    }

    /// Pose offset of block `block` of `total` at eased group `progress`.
    /// `In` runs from rest to fully risen; `Out` runs the same path backwards
    /// with the stagger order flipped.
    pub fn offset(
        self,
        block: usize,
        total: usize,
        progress: f32,
        direction: TransitionDirection,
    ) -> LabelOffset {
        let local = staggered(progress, self.delay(block, total, direction));
        let lift = match direction {
            TransitionDirection::In => local,
            TransitionDirection::Out => 1.0 - local,
        };
        let phase = (lift * PI).sin();
        LabelOffset {
            translation: self.arc(block, total, phase) + LABEL_RISE * lift,
            pitch: lift * PI / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    ZoomingIn {
        target: usize,
        started_at: f32,
        start_camera: OrbitState,
        destination: OrbitState,
    },
    ZoomingOut {
        from: Option<usize>,
        started_at: f32,
        start_camera: OrbitState,
        destination: OrbitState,
    },
}

impl TransitionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, TransitionState::Idle)
    }

    pub fn direction(&self) -> Option<TransitionDirection> {
        match self {
            TransitionState::Idle => None,
            TransitionState::ZoomingIn { .. } => Some(TransitionDirection::In),
            TransitionState::ZoomingOut { .. } => Some(TransitionDirection::Out),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Idle,
    Running,
    ZoomedIn(usize),
    ZoomedOut,
}

/// Scene parts a transition moves.
pub struct TransitionScene<'a> {
    pub printers: &'a [Printer],
    pub label_paths: &'a [LabelPath],
    pub name_group: Option<NodeId>,
    pub model: Option<(NodeId, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transitioner {
    pub state: TransitionState,
    /// Seconds from start to finish.
    pub duration: f32,
}

impl Transitioner {
    pub fn new(duration: f32) -> Self {
        Self {
            state: TransitionState::Idle,
            duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Returns false and leaves the running transition alone when busy.
    pub fn begin_zoom_in(
        &mut self,
        target: usize,
        now: f32,
        start_camera: OrbitState,
        destination: OrbitState,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = TransitionState::ZoomingIn {
            target,
            started_at: now,
            start_camera,
            destination,
        };
        true
    }

    pub fn begin_zoom_out(
        &mut self,
        from: Option<usize>,
        now: f32,
        start_camera: OrbitState,
        destination: OrbitState,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = TransitionState::ZoomingOut {
            from,
            started_at: now,
            start_camera,
            destination,
        };
        true
    }

    fn eased_progress(&self, started_at: f32, now: f32) -> f32 {
        let raw = if self.duration > 0.0 {
            ((now - started_at) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        ease_in_out_cubic(raw)
    }

    /// Applies the frame at scene time `now`.
    pub fn drive(
        &mut self,
        now: f32,
        rig: &mut CameraRig,
        graph: &mut SceneGraph,
        scene: &TransitionScene<'_>,
    ) -> TransitionOutcome {
        match self.state {
            TransitionState::Idle => TransitionOutcome::Idle,
            TransitionState::ZoomingIn {
                target,
                started_at,
                start_camera,
                destination,
            } => {
                let progress = self.eased_progress(started_at, now);
                rig.orbit = start_camera.lerp(&destination, progress);
                zoom_in_frame(graph, scene, target, progress);
                if progress >= 1.0 {
                    rig.orbit = destination;
                    finish_zoom_in(graph, scene, target);
                    self.state = TransitionState::Idle;
                    TransitionOutcome::ZoomedIn(target)
                } else {
                    TransitionOutcome::Running
                }
            }
            TransitionState::ZoomingOut {
                from,
                started_at,
                start_camera,
                destination,
            } => {
                let progress = self.eased_progress(started_at, now);
                rig.orbit = start_camera.lerp(&destination, progress);
                zoom_out_frame(graph, scene, from, progress);
                if progress >= 1.0 {
                    rig.orbit = destination;
                    finish_zoom_out(graph, scene);
                    self.state = TransitionState::Idle;
                    TransitionOutcome::ZoomedOut
                } else {
                    TransitionOutcome::Running
                }
            }
        }
    }
}

fn set_uniform_scale(graph: &mut SceneGraph, id: NodeId, scale: f32) {
    graph[id].transform.scale = Vec3::splat(scale);
}

fn pose_label(
    graph: &mut SceneGraph,
    printer: &Printer,
    path: LabelPath,
    progress: f32,
    direction: TransitionDirection,
) {
    let total = printer.label_blocks.len();
    for (i, block) in printer.label_blocks.iter().enumerate() {
        let offset = path.offset(i, total, progress, direction);
        let node = &mut graph[*block];
        let Some(original) = node.meta.original_position else {
            continue;
        };
        node.transform.position = original + offset.translation;
        node.transform.rotation = Vec3::new(offset.pitch, 0.0, 0.0);
    }
}

/// Places a printer's label at its fully risen pose without animating.
pub fn raise_label(graph: &mut SceneGraph, printer: &Printer, path: LabelPath) {
    pose_label(graph, printer, path, 1.0, TransitionDirection::In);
}

fn zoom_in_frame(graph: &mut SceneGraph, scene: &TransitionScene<'_>, target: usize, progress: f32) {
    let shrink = (1.0 - progress * 1.5).max(0.0);
    let others = scene.printers.iter().filter(|p| p.index != target).map(|p| p.root);
    for id in others.chain(scene.name_group) {
        set_uniform_scale(graph, id, shrink);
        if shrink <= HIDDEN_SCALE {
            graph.set_visible(id, false);
        }
    }
    if let Some(printer) = scene.printers.get(target) {
        let path = path_for(scene, target);
        pose_label(graph, printer, path, progress, TransitionDirection::In);
    }
}

fn zoom_out_frame(
    graph: &mut SceneGraph,
    scene: &TransitionScene<'_>,
    from: Option<usize>,
    progress: f32,
) {
    let grow = ((progress - 0.3) * 1.43).clamp(0.0, 1.0);
    let others = scene
        .printers
        .iter()
        .filter(|p| Some(p.index) != from)
        .map(|p| p.root);
    for id in others.chain(scene.name_group) {
        if grow > HIDDEN_SCALE {
            graph.set_visible(id, true);
        }
        set_uniform_scale(graph, id, grow);
    }
    if let Some(printer) = from.and_then(|index| scene.printers.get(index)) {
        let path = path_for(scene, printer.index);
        pose_label(graph, printer, path, progress, TransitionDirection::Out);
    }
}

fn path_for(scene: &TransitionScene<'_>, index: usize) -> LabelPath {
    scene
        .label_paths
        .get(index)
        .copied()
        .unwrap_or(LabelPath::for_index(index))
}

fn finish_zoom_in(graph: &mut SceneGraph, scene: &TransitionScene<'_>, target: usize) {
    let others = scene.printers.iter().filter(|p| p.index != target).map(|p| p.root);
    for id in others.chain(scene.name_group) {
        graph.set_visible(id, false);
        set_uniform_scale(graph, id, 0.0);
    }
    if let Some((model, section)) = scene.model {
        graph.set_visible(model, section == target);
    }
}

/// Resets every label block to its stored original pose with no hover lift.
pub fn settle_labels(graph: &mut SceneGraph, printers: &[Printer]) {
    for printer in printers {
        graph[printer.label].transform = Default::default();
        for block in &printer.label_blocks {
            let node = &mut graph[*block];
            if let Some(original) = node.meta.original_position {
                node.transform.position = original;
            }
            node.transform.rotation = Vec3::ZERO;
            node.meta.hover_offset = 0.0;
        }
    }
}

fn finish_zoom_out(graph: &mut SceneGraph, scene: &TransitionScene<'_>) {
    let all = scene.printers.iter().map(|p| p.root);
    for id in all.chain(scene.name_group) {
        graph.set_visible(id, true);
        set_uniform_scale(graph, id, 1.0);
    }
    settle_labels(graph, scene.printers);
    if let Some((model, _)) = scene.model {
        graph.set_visible(model, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_sections;
    use crate::letters::TextureStore;
    use crate::printer::build_printer;

    const EPSILON: f32 = 1e-4;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn every_path_starts_at_rest_and_ends_risen() {
        for path in [
            LabelPath::DominoFlip,
            LabelPath::TypewriterSweep,
            LabelPath::FountainBurst,
        ] {
            for block in 0..7 {
                let start = path.offset(block, 7, 0.0, TransitionDirection::In);
                assert!(approx_vec(start.translation, Vec3::ZERO), "{path:?} {block}");
                assert_eq!(start.pitch, 0.0);

                let end = path.offset(block, 7, 1.0, TransitionDirection::In);
                assert!(approx_vec(end.translation, LABEL_RISE), "{path:?} {block}");
                assert!((end.pitch - PI / 2.0).abs() < EPSILON);

                let out_start = path.offset(block, 7, 0.0, TransitionDirection::Out);
                assert!(approx_vec(out_start.translation, LABEL_RISE));
                let out_end = path.offset(block, 7, 1.0, TransitionDirection::Out);
                assert!(approx_vec(out_end.translation, Vec3::ZERO));
                assert!(out_end.pitch.abs() < EPSILON);
            }
        }
    }

    #[test]
    fn stagger_order_flips_on_the_way_out() {
        let path = LabelPath::DominoFlip;
        let first_in = path.offset(0, 7, 0.3, TransitionDirection::In).pitch;
        let last_in = path.offset(6, 7, 0.3, TransitionDirection::In).pitch;
        assert!(first_in > last_in);

        let first_out = path.offset(0, 7, 0.3, TransitionDirection::Out).pitch;
        let last_out = path.offset(6, 7, 0.3, TransitionDirection::Out).pitch;
        assert!(last_out < first_out, "last block leads the way down");

        let fountain = LabelPath::FountainBurst;
        let first = fountain.offset(0, 7, 0.1, TransitionDirection::In).pitch;
        let last = fountain.offset(6, 7, 0.1, TransitionDirection::In).pitch;
        assert!(last > first, "fountain starts from the right");
    }

    #[test]
    fn busy_transition_rejects_new_requests() {
        let mut transitioner = Transitioner::new(1.3);
        let overview = OrbitState::overview();
        let zoomed = OrbitState::new(PI / 2.0, PI / 2.8, 8.0, 0.0);
        assert!(transitioner.begin_zoom_in(1, 0.0, overview, zoomed));
        let before = transitioner.state;
        assert!(!transitioner.begin_zoom_in(2, 0.1, overview, zoomed));
        assert!(!transitioner.begin_zoom_out(Some(1), 0.1, zoomed, overview));
        assert_eq!(transitioner.state, before);
    }

    #[test]
    fn zoom_in_then_out_restores_labels_and_visibility() {
        let mut graph = SceneGraph::new();
        let mut textures = TextureStore::new();
        let printers: Vec<Printer> = default_sections()
            .iter()
            .enumerate()
            .map(|(i, s)| build_printer(&mut graph, &mut textures, s, i))
            .collect();
        let paths: Vec<LabelPath> = (0..3).map(LabelPath::for_index).collect();
        let scene = TransitionScene {
            printers: &printers,
            label_paths: &paths,
            name_group: None,
            model: None,
        };
        let originals: Vec<Vec3> = printers[0]
            .label_blocks
            .iter()
            .map(|id| graph[*id].transform.position)
            .collect();

        let mut rig = CameraRig::default();
        let mut transitioner = Transitioner::new(1.3);
        let zoomed = OrbitState::new(PI / 2.0, PI / 2.8, 8.0, -5.0);
        transitioner.begin_zoom_in(0, 0.0, rig.orbit, zoomed);
        assert_eq!(
            transitioner.drive(0.5, &mut rig, &mut graph, &scene),
            TransitionOutcome::Running
        );
        assert_eq!(
            transitioner.drive(1.3, &mut rig, &mut graph, &scene),
            TransitionOutcome::ZoomedIn(0)
        );
        assert_eq!(rig.orbit, zoomed);
        assert!(!graph[printers[1].root].visible);
        assert_eq!(graph[printers[2].root].transform.scale, Vec3::ZERO);
        let risen = graph[printers[0].label_blocks[0]].transform.position;
        assert!(approx_vec(risen, originals[0] + LABEL_RISE));

        transitioner.begin_zoom_out(Some(0), 2.0, rig.orbit, OrbitState::overview());
        assert_eq!(
            transitioner.drive(4.0, &mut rig, &mut graph, &scene),
            TransitionOutcome::ZoomedOut
        );
        for (id, original) in printers[0].label_blocks.iter().zip(&originals) {
            assert_eq!(graph[*id].transform.position, *original);
            assert_eq!(graph[*id].transform.rotation, Vec3::ZERO);
        }
        assert!(printers.iter().all(|p| graph[p.root].visible));
        assert_eq!(graph[printers[1].root].transform.scale, Vec3::ONE);
        assert!(!transitioner.is_active());
    }
}

//! Pointer, touch, and wheel routing. Coordinates are viewport pixels with the
//! origin at the top-left corner.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{CursorHint, PortfolioScene, SceneEvent};
use crate::environment::GROUND_HEIGHT;
use crate::graph::{InteractiveRole, NodeId};
use crate::picking::{Hit, Ray, pick_nearest};
use crate::printer::{BUTTON_BOOST_EMISSIVE, BUTTON_IDLE_EMISSIVE};

const MOUSE_DRAG_THRESHOLD: f32 = 3.0;
const TOUCH_DRAG_THRESHOLD: f32 = 2.0;
const MOUSE_ORBIT_SPEED: f32 = 0.005;
const TOUCH_ORBIT_SPEED: f32 = 0.008;
const MOUSE_PAN_SPEED: f32 = 0.02;
const TOUCH_PAN_SPEED: f32 = 0.01;
const WHEEL_ZOOM_SPEED: f32 = 0.01;
const PINCH_ZOOM_SPEED: f32 = 0.03;
const TOOLTIP_OFFSET: Vec3 = Vec3::new(0.5, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Default)]
pub(super) struct InteractionState {
    /// Set between a press that may start a camera drag and its release.
    pressed: bool,
    dragging: bool,
    panning: bool,
    last_pointer: Vec2,
    /// Offset from the grab point to the model origin while dragging it.
    model_drag: Option<Vec3>,
    last_touch_distance: f32,
    touch_mid_x: f32,
}

/// What a ray hit, by the role nearest to the hit mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HitTarget {
    NameBlock(NodeId),
    SpeedButton(usize),
    Spool(usize),
    LabelBlock(NodeId),
    PrinterBody(usize),
}

impl PortfolioScene {
    fn ray_at(&self, position: Vec2) -> Ray {
        self.environment.projection.ray_from_screen(
            &self.rig.pose(),
            position.x,
            position.y,
            self.viewport.width,
            self.viewport.height,
        )
    }

    fn pick_printers(&self, ray: &Ray, include_name: bool) -> Option<Hit> {
        let mut roots: Vec<NodeId> = self.printers.iter().map(|p| p.root).collect();
        if include_name {
            roots.push(self.name.group);
        }
        pick_nearest(&self.graph, &roots, ray)
    }

    /// The decorative model, when it is on stage and under `ray`.
    fn pick_model(&self, ray: &Ray) -> Option<(NodeId, Hit)> {
        let model = self.model?;
        if self.current_view != Some(self.config.model.section_index)
            || !self.graph.is_effectively_visible(model)
        {
            return None;
        }
        pick_nearest(&self.graph, &[model], ray).map(|hit| (model, hit))
    }

    fn classify(&self, node: NodeId) -> Option<HitTarget> {
        let tag = self.graph.role_chain(node).into_iter().next()?;
        let printer = tag.printer.or_else(|| self.graph.printer_of(node));
        let owner = self.graph.nearest_with_role(node, tag.role)?;
        match tag.role {
            InteractiveRole::NameBlock => Some(HitTarget::NameBlock(owner)),
            InteractiveRole::SpeedButton => printer.map(HitTarget::SpeedButton),
            InteractiveRole::Spool => printer.map(HitTarget::Spool),
            InteractiveRole::LabelBlock => Some(HitTarget::LabelBlock(owner)),
            InteractiveRole::PrinterBody => printer.map(HitTarget::PrinterBody),
            InteractiveRole::DecorativeModel => None,
        }
    }

    fn set_button_glow(&mut self, index: usize, intensity: f32) {
        let Some(button) = self.printers.get(index).map(|p| p.speed_button) else {
            return;
        };
        if let Some(material) = self.graph[button].material_mut() {
            material.emissive_intensity = intensity;
        }
    }

    fn release_boost(&mut self) {
        if let Some(index) = self.print.release() {
            self.set_button_glow(index, BUTTON_IDLE_EMISSIVE);
            log::debug!("[input] printer {index} back to normal speed");
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton, shift: bool) {
        if !self.mounted {
            return;
        }
        let position = Vec2::new(x, y);
        let ray = self.ray_at(position);

        if let Some((model, hit)) = self.pick_model(&ray) {
            self.interaction.model_drag = Some(self.graph[model].transform.position - hit.point);
            self.hover.cursor = CursorHint::Grabbing;
            return;
        }

        if let Some(hit) = self.pick_printers(&ray, false) {
            if let Some(HitTarget::SpeedButton(index)) = self.classify(hit.node) {
                self.print.boost(index, self.config.boost_speed);
                self.set_button_glow(index, BUTTON_BOOST_EMISSIVE);
                log::debug!("[input] printer {index} boosted");
                return;
            }
        }

        self.interaction.pressed = true;
        self.interaction.dragging = false;
        self.interaction.panning = shift || button == PointerButton::Secondary;
        self.interaction.last_pointer = position;
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, shift: bool) {
        if !self.mounted {
            return;
        }
        let position = Vec2::new(x, y);

        if let Some(offset) = self.interaction.model_drag {
            let ray = self.ray_at(position);
            if let (Some(model), Some(point)) =
                (self.model, ray.intersect_horizontal_plane(GROUND_HEIGHT))
            {
                let transform = &mut self.graph[model].transform;
                transform.position.x = point.x + offset.x;
                transform.position.z = point.z + offset.z;
            }
            self.hover.cursor = CursorHint::Grabbing;
            return;
        }

        let delta = position - self.interaction.last_pointer;
        let beyond_threshold =
            delta.x.abs() > MOUSE_DRAG_THRESHOLD || delta.y.abs() > MOUSE_DRAG_THRESHOLD;
        if self.interaction.pressed && beyond_threshold {
            self.interaction.dragging = true;
            if self.current_view.is_none() && (self.interaction.panning || shift) {
                self.rig.pan_by(-delta.x * MOUSE_PAN_SPEED);
                self.hover.cursor = CursorHint::Move;
            } else {
                self.rig
                    .rotate(delta.x * MOUSE_ORBIT_SPEED, -delta.y * MOUSE_ORBIT_SPEED);
                self.hover.cursor = CursorHint::Grabbing;
            }
            self.interaction.last_pointer = position;
        } else if !self.interaction.pressed {
            self.update_hover(position);
        }
    }

    fn update_hover(&mut self, position: Vec2) {
        let ray = self.ray_at(position);

        if self.pick_model(&ray).is_some() {
            self.hover.cursor = CursorHint::Grab;
            self.hover.printer = None;
            self.hover.spool = None;
            return;
        }

        let overview = self.current_view.is_none();
        let hit = self.pick_printers(&ray, true);
        let target = hit.and_then(|hit| self.classify(hit.node));
        match target {
            Some(HitTarget::NameBlock(block)) if overview => {
                self.hover.block = Some(block);
                self.hover.spool = None;
                self.hover.printer = None;
                self.hover.cursor = CursorHint::Pointer;
                return;
            }
            Some(HitTarget::SpeedButton(_)) => {
                self.hover.spool = None;
                self.hover.printer = None;
                self.hover.cursor = CursorHint::Pointer;
                return;
            }
            Some(HitTarget::Spool(index)) => {
                self.hover.spool = Some(index);
                self.hover.printer = None;
                self.hover.cursor = CursorHint::Pointer;
                if let Some(spool) = self.printers.get(index).map(|p| p.spool) {
                    let anchor = self.graph.world_position(spool) + TOOLTIP_OFFSET;
                    self.hover.spool_tooltip = self.project_to_screen(anchor);
                }
                return;
            }
            Some(HitTarget::LabelBlock(block)) if !overview => {
                self.hover.block = Some(block);
                self.hover.spool = None;
                self.hover.cursor = CursorHint::Pointer;
                return;
            }
            _ => {}
        }
        if overview {
            if let Some(index) = hit.and_then(|hit| self.graph.printer_of(hit.node)) {
                self.hover.printer = Some(index);
                self.hover.spool = None;
                self.hover.cursor = CursorHint::Pointer;
                return;
            }
        }
        self.hover.clear();
    }

    /// Ends a press; a press that never turned into a drag counts as a click.
    pub fn pointer_up(&mut self, x: f32, y: f32) {
        if !self.mounted {
            return;
        }
        if self.interaction.model_drag.take().is_some() {
            self.hover.cursor = CursorHint::Grab;
            return;
        }

        let was_pressed = self.interaction.pressed;
        self.interaction.pressed = false;
        self.interaction.panning = false;
        self.hover.cursor = CursorHint::Grab;
        self.release_boost();

        if was_pressed && !self.interaction.dragging && !self.transitioner.is_active() {
            self.click(Vec2::new(x, y));
        }
    }

    fn click(&mut self, position: Vec2) {
        let ray = self.ray_at(position);
        let Some(hit) = self.pick_printers(&ray, false) else {
            return;
        };
        match self.classify(hit.node) {
            Some(HitTarget::SpeedButton(_)) => {}
            Some(HitTarget::Spool(index)) => {
                log::debug!("[input] color picker requested for printer {index}");
                self.events.push(SceneEvent::ColorPickerRequested { printer: index });
            }
            _ => {
                if self.current_view.is_none() {
                    if let Some(index) = self.graph.printer_of(hit.node) {
                        self.zoom_to_printer(index);
                    }
                }
            }
        }
    }

    /// Pointer left the surface: drop every press, drag, and boost.
    pub fn pointer_leave(&mut self) {
        if !self.mounted {
            return;
        }
        self.interaction.pressed = false;
        self.interaction.dragging = false;
        self.interaction.panning = false;
        self.interaction.model_drag = None;
        self.release_boost();
    }

    pub fn wheel(&mut self, delta_y: f32) {
        if !self.mounted {
            return;
        }
        self.rig.zoom_by(delta_y * WHEEL_ZOOM_SPEED);
    }

    pub fn touch_start(&mut self, touches: &[Vec2]) {
        if !self.mounted {
            return;
        }
        match touches {
            [touch] => {
                self.interaction.last_pointer = *touch;
                self.interaction.pressed = true;
                self.interaction.dragging = false;
            }
            [a, b, ..] => {
                self.interaction.last_touch_distance = a.distance(*b);
                self.interaction.touch_mid_x = (a.x + b.x) / 2.0;
            }
            [] => {}
        }
    }

    pub fn touch_move(&mut self, touches: &[Vec2]) {
        if !self.mounted {
            return;
        }
        self.rig.target = None;
        match touches {
            [touch] => {
                let delta = *touch - self.interaction.last_pointer;
                if delta.x.abs() > TOUCH_DRAG_THRESHOLD || delta.y.abs() > TOUCH_DRAG_THRESHOLD {
                    self.interaction.dragging = true;
                    self.rig
                        .rotate(delta.x * TOUCH_ORBIT_SPEED, -delta.y * TOUCH_ORBIT_SPEED);
                }
                self.interaction.last_pointer = *touch;
            }
            [a, b, ..] => {
                let distance = a.distance(*b);
                if self.interaction.last_touch_distance > 0.0 {
                    self.rig.zoom_by(
                        (self.interaction.last_touch_distance - distance) * PINCH_ZOOM_SPEED,
                    );
                }
                self.interaction.last_touch_distance = distance;

                if self.current_view.is_none() {
                    let mid_x = (a.x + b.x) / 2.0;
                    self.rig
                        .pan_by(-(mid_x - self.interaction.touch_mid_x) * TOUCH_PAN_SPEED);
                    self.interaction.touch_mid_x = mid_x;
                }
            }
            [] => {}
        }
    }

    /// `changed` holds the touches that just lifted.
    pub fn touch_end(&mut self, changed: &[Vec2]) {
        if !self.mounted {
            return;
        }
        if let [tap] = changed {
            if !self.interaction.dragging
                && !self.transitioner.is_active()
                && self.current_view.is_none()
            {
                let ray = self.ray_at(*tap);
                if let Some(index) = self
                    .pick_printers(&ray, false)
                    .and_then(|hit| self.graph.printer_of(hit.node))
                {
                    self.zoom_to_printer(index);
                }
            }
        }
        self.interaction.pressed = false;
        self.interaction.dragging = false;
        self.interaction.last_touch_distance = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::portfolio::Viewport;

    fn scene() -> PortfolioScene {
        PortfolioScene::new(SceneConfig::default(), "/", Viewport::new(1280.0, 720.0))
            .expect("default config builds")
    }

    fn screen_of(scene: &PortfolioScene, world: Vec3) -> Vec2 {
        scene.project_to_screen(world).expect("point in front of camera")
    }

    #[test]
    fn classify_uses_nearest_role() {
        let scene = scene();
        let printer = &scene.printers()[1];
        let winding = scene.graph()[printer.spool].children()[1];
        assert_eq!(scene.classify(winding), Some(HitTarget::Spool(1)));
        assert_eq!(
            scene.classify(printer.speed_button),
            Some(HitTarget::SpeedButton(1))
        );
        let block = printer.label_blocks[0];
        assert_eq!(scene.classify(block), Some(HitTarget::LabelBlock(block)));
        assert_eq!(scene.classify(printer.screen_glow), Some(HitTarget::PrinterBody(1)));
        let name_block = scene.name_blocks().blocks[0];
        assert_eq!(scene.classify(name_block), Some(HitTarget::NameBlock(name_block)));
    }

    #[test]
    fn small_motion_is_not_a_drag() {
        let mut scene = scene();
        let before = scene.camera().orbit;
        scene.pointer_down(100.0, 100.0, PointerButton::Primary, false);
        scene.pointer_move(102.0, 101.0, false);
        assert_eq!(scene.camera().orbit, before);
        scene.pointer_move(110.0, 100.0, false);
        assert!((scene.camera().orbit.theta - (before.theta + 10.0 * MOUSE_ORBIT_SPEED)).abs() < 1e-6);
    }

    #[test]
    fn secondary_drag_pans_in_overview() {
        let mut scene = scene();
        scene.pointer_down(100.0, 100.0, PointerButton::Secondary, false);
        scene.pointer_move(150.0, 100.0, false);
        assert!((scene.camera().orbit.pan_x - (-50.0 * MOUSE_PAN_SPEED)).abs() < 1e-6);
        assert_eq!(scene.snapshot().cursor, CursorHint::Move);
    }

    #[test]
    fn hovering_spool_publishes_tooltip() {
        let mut scene = scene();
        let spool = scene.printers()[0].spool;
        let center = scene.graph().world_position(spool);
        let at = screen_of(&scene, center);
        scene.pointer_move(at.x, at.y, false);
        let snapshot = scene.snapshot();
        assert_eq!(snapshot.hovered_spool, Some(0));
        assert_eq!(snapshot.cursor, CursorHint::Pointer);
        let tooltip = snapshot.spool_tooltip.expect("tooltip placed");
        assert!(tooltip.x > at.x, "tooltip sits to the right of the spool");
    }

    #[test]
    fn spool_click_requests_color_picker() {
        let mut scene = scene();
        let spool = scene.printers()[2].spool;
        let at = screen_of(&scene, scene.graph().world_position(spool));
        scene.pointer_down(at.x, at.y, PointerButton::Primary, false);
        scene.pointer_up(at.x, at.y);
        assert_eq!(
            scene.drain_events(),
            vec![SceneEvent::ColorPickerRequested { printer: 2 }]
        );
        assert!(!scene.is_transitioning());
    }

    #[test]
    fn pinch_zooms_and_two_finger_pans() {
        let mut scene = scene();
        scene.touch_start(&[Vec2::new(100.0, 300.0), Vec2::new(300.0, 300.0)]);
        scene.touch_move(&[Vec2::new(120.0, 300.0), Vec2::new(280.0, 300.0)]);
        let orbit = scene.camera().orbit;
        assert!((orbit.distance - (14.0 + 40.0 * PINCH_ZOOM_SPEED)).abs() < 1e-4);
        assert_eq!(orbit.pan_x, 0.0);

        scene.touch_move(&[Vec2::new(170.0, 300.0), Vec2::new(330.0, 300.0)]);
        assert!((scene.camera().orbit.pan_x - (-50.0 * TOUCH_PAN_SPEED)).abs() < 1e-4);
    }
}

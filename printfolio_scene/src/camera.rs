//! Orbit camera: spherical parameters around a pannable look-at point, plus
//! the projection used for picking and tooltip placement.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::picking::Ray;

pub const LERP_SPEED: f32 = 0.08;
const ANGLE_SETTLE: f32 = 0.001;
const LINEAR_SETTLE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    /// Azimuth around the Y axis.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    pub distance: f32,
    pub pan_x: f32,
}

impl OrbitState {
    pub const fn new(theta: f32, phi: f32, distance: f32, pan_x: f32) -> Self {
        Self {
            theta,
            phi,
            distance,
            pan_x,
        }
    }

    /// Overview framing of all three printers.
    pub const fn overview() -> Self {
        Self::new(PI / 2.0, PI / 3.0, 14.0, 0.0)
    }

    pub fn lerp(&self, to: &OrbitState, t: f32) -> OrbitState {
        OrbitState {
            theta: self.theta + (to.theta - self.theta) * t,
            phi: self.phi + (to.phi - self.phi) * t,
            distance: self.distance + (to.distance - self.distance) * t,
            pan_x: self.pan_x + (to.pan_x - self.pan_x) * t,
        }
    }

    fn settled_at(&self, target: &OrbitState) -> bool {
        (target.theta - self.theta).abs() < ANGLE_SETTLE
            && (target.phi - self.phi).abs() < ANGLE_SETTLE
            && (target.distance - self.distance).abs() < LINEAR_SETTLE
            && (target.pan_x - self.pan_x).abs() < LINEAR_SETTLE
    }
}

impl Default for OrbitState {
    fn default() -> Self {
        Self::overview()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    pub phi_min: f32,
    pub phi_max: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub pan_limit: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            phi_min: 0.3,
            phi_max: PI / 2.0 - 0.1,
            distance_min: 4.0,
            distance_max: 30.0,
            pan_limit: 10.0,
        }
    }
}

impl OrbitLimits {
    pub fn clamp_phi(&self, phi: f32) -> f32 {
        phi.clamp(self.phi_min, self.phi_max)
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.distance_min, self.distance_max)
    }

    pub fn clamp_pan(&self, pan_x: f32) -> f32 {
        pan_x.clamp(-self.pan_limit, self.pan_limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub eye: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, Vec3::Y)
    }
}

pub fn update_camera_position(orbit: &OrbitState) -> CameraPose {
    let OrbitState {
        theta,
        phi,
        distance,
        pan_x,
    } = *orbit;
    CameraPose {
        eye: Vec3::new(
            distance * phi.sin() * theta.cos() + pan_x,
            distance * phi.cos(),
            distance * phi.sin() * theta.sin(),
        ),
        look_at: Vec3::new(pan_x, 0.0, 0.0),
    }
}

/// Moves `orbit` a fixed fraction toward `target` and clears the target once
/// every parameter has settled. Returns whether a target was pending.
pub fn smooth_lerp(orbit: &mut OrbitState, target: &mut Option<OrbitState>) -> bool {
    let Some(goal) = *target else {
        return false;
    };
    *orbit = orbit.lerp(&goal, LERP_SPEED);
    if orbit.settled_at(&goal) {
        *target = None;
    }
    true
}

/// Live orbit parameters with an optional smoothing target.
#[derive(Debug, Clone, Default)]
pub struct CameraRig {
    pub orbit: OrbitState,
    pub target: Option<OrbitState>,
    pub limits: OrbitLimits,
}

impl CameraRig {
    pub fn new(orbit: OrbitState, limits: OrbitLimits) -> Self {
        Self {
            orbit,
            target: None,
            limits,
        }
    }

    /// Manual orbit; cancels any smoothing target.
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        self.target = None;
        self.orbit.theta += delta_theta;
        self.orbit.phi = self.limits.clamp_phi(self.orbit.phi + delta_phi);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.target = None;
        self.orbit.distance = self.limits.clamp_distance(self.orbit.distance + delta);
    }

    pub fn pan_by(&mut self, delta: f32) {
        self.target = None;
        self.orbit.pan_x = self.limits.clamp_pan(self.orbit.pan_x + delta);
    }

    pub fn set_target(&mut self, target: OrbitState) {
        self.target = Some(target);
    }

    /// Places the camera immediately, dropping any target.
    pub fn jump_to(&mut self, orbit: OrbitState) {
        self.orbit = orbit;
        self.target = None;
    }

    pub fn step(&mut self) -> bool {
        smooth_lerp(&mut self.orbit, &mut self.target)
    }

    pub fn pose(&self) -> CameraPose {
        update_camera_position(&self.orbit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 55.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect,
            self.near.max(1e-4),
            self.far.max(self.near + 1.0),
        )
    }

    pub fn view_projection(&self, pose: &CameraPose, width: f32, height: f32) -> Mat4 {
        self.matrix(width / height.max(1.0)) * pose.view_matrix()
    }

    /// World point to surface pixels (origin top-left). `None` behind the eye.
    pub fn project_to_screen(
        &self,
        pose: &CameraPose,
        world: Vec3,
        width: f32,
        height: f32,
    ) -> Option<Vec2> {
        let clip = self.view_projection(pose, width, height) * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.x.is_finite() || !ndc.y.is_finite() {
            return None;
        }
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * width,
            (-ndc.y * 0.5 + 0.5) * height,
        ))
    }

    /// Ray through a surface pixel.
    pub fn ray_from_screen(
        &self,
        pose: &CameraPose,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Ray {
        let ndc_x = (x / width.max(1.0)) * 2.0 - 1.0;
        let ndc_y = -((y / height.max(1.0)) * 2.0 - 1.0);
        let inverse = self.view_projection(pose, width, height).inverse();
        let near = inverse * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Ray::new(pose.eye, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn overview_pose_looks_at_origin_from_front() {
        let pose = update_camera_position(&OrbitState::overview());
        assert!(approx_eq(pose.eye.x, 0.0));
        assert!(approx_eq(pose.eye.y, 7.0));
        assert!(approx_eq(pose.eye.z, 14.0 * (PI / 3.0).sin()));
        assert_eq!(pose.look_at, Vec3::ZERO);
    }

    #[test]
    fn rotate_clamps_phi_and_cancels_target() {
        let mut rig = CameraRig::default();
        rig.set_target(OrbitState::new(0.0, 1.0, 8.0, 5.0));
        rig.rotate(0.0, 10.0);
        assert!(rig.target.is_none());
        assert!(approx_eq(rig.orbit.phi, PI / 2.0 - 0.1));
        rig.rotate(0.0, -10.0);
        assert!(approx_eq(rig.orbit.phi, 0.3));
    }

    #[test]
    fn zoom_and_pan_are_clamped() {
        let mut rig = CameraRig::default();
        rig.zoom_by(-100.0);
        assert_eq!(rig.orbit.distance, 4.0);
        rig.zoom_by(100.0);
        assert_eq!(rig.orbit.distance, 30.0);
        rig.pan_by(42.0);
        assert_eq!(rig.orbit.pan_x, 10.0);
        rig.pan_by(-42.0);
        assert_eq!(rig.orbit.pan_x, -10.0);
    }

    #[test]
    fn smooth_lerp_converges_and_clears_target() {
        let mut orbit = OrbitState::overview();
        let goal = OrbitState::new(PI / 2.0, PI / 2.8, 8.0, -5.0);
        let mut target = Some(goal);
        let mut frames = 0;
        while target.is_some() {
            assert!(smooth_lerp(&mut orbit, &mut target));
            frames += 1;
            assert!(frames < 200, "lerp never settled");
        }
        assert!((orbit.pan_x + 5.0).abs() < 0.01);
        assert!(!smooth_lerp(&mut orbit, &mut target));
    }

    #[test]
    fn center_ray_points_at_look_at() {
        let projection = Projection::default();
        let pose = update_camera_position(&OrbitState::overview());
        let ray = projection.ray_from_screen(&pose, 400.0, 300.0, 800.0, 600.0);
        let expected = (pose.look_at - pose.eye).normalize();
        assert!((ray.direction - expected).length() < 1e-3);

        let screen = projection
            .project_to_screen(&pose, Vec3::ZERO, 800.0, 600.0)
            .expect("origin is in front of the camera");
        assert!((screen - Vec2::new(400.0, 300.0)).length() < 0.5);
    }
}

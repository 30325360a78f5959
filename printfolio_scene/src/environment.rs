//! Renderer-agnostic description of the backdrop the printers sit in.

use glam::Vec3;
use serde::Serialize;

use crate::camera::Projection;
use crate::color::Rgb;
use crate::config::SceneConfig;

pub const GROUND_HEIGHT: f32 = -2.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Linear fog factor, 0 at `near` and 1 at `far`.
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return 0.0;
        }
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Light position; the light shines from here toward the origin.
    pub position: Vec3,
}

impl DirectionalLight {
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundPlane {
    pub height: f32,
    pub size: f32,
    pub shadow_opacity: f32,
}

/// Colors for the X/Y/Z orientation gizmo hosts may draw in a corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisColors {
    pub x: Rgb,
    pub y: Rgb,
    pub z: Rgb,
    pub origin: Rgb,
}

impl Default for AxisColors {
    fn default() -> Self {
        Self {
            x: Rgb::from_hex(0xef4444),
            y: Rgb::from_hex(0x22c55e),
            z: Rgb::from_hex(0x3b82f6),
            origin: Rgb::from_hex(0x666666),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneEnvironment {
    pub background: Rgb,
    pub fog: Fog,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub key_light: DirectionalLight,
    pub fill_light: DirectionalLight,
    pub ground: GroundPlane,
    pub projection: Projection,
    pub axis_colors: AxisColors,
}

impl SceneEnvironment {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            background: config.background,
            fog: Fog {
                color: config.background,
                near: 18.0,
                far: 35.0,
            },
            ambient_color: Rgb::WHITE,
            ambient_intensity: 1.5,
            key_light: DirectionalLight {
                color: Rgb::WHITE,
                intensity: 2.0,
                position: Vec3::new(10.0, 15.0, 10.0),
            },
            fill_light: DirectionalLight {
                color: Rgb::from_hex(0xffe4b5),
                intensity: 1.0,
                position: Vec3::new(-10.0, 5.0, -5.0),
            },
            ground: GroundPlane {
                height: GROUND_HEIGHT,
                size: 60.0,
                shadow_opacity: 0.15,
            },
            projection: config.projection,
            axis_colors: AxisColors::default(),
        }
    }

    pub fn lights(&self) -> [DirectionalLight; 2] {
        [self.key_light, self.fill_light]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_ramps_between_near_and_far() {
        let env = SceneEnvironment::from_config(&SceneConfig::default());
        assert_eq!(env.fog.factor(10.0), 0.0);
        assert!((env.fog.factor(26.5) - 0.5).abs() < 1e-6);
        assert_eq!(env.fog.factor(50.0), 1.0);
        assert_eq!(env.fog.color, Rgb::from_hex(0xf5efe4));
    }

    #[test]
    fn key_light_shines_down_toward_origin() {
        let env = SceneEnvironment::from_config(&SceneConfig::default());
        let direction = env.key_light.direction();
        assert!(direction.y < 0.0);
        assert!((direction.length() - 1.0).abs() < 1e-5);
    }
}

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::{OrbitLimits, OrbitState, Projection};
use crate::color::{ColorPair, Rgb};
use crate::transition::LabelPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub name: &'static str,
    pub colors: ColorPair,
}

/// Palette offered by the filament color picker.
pub const COLOR_OPTIONS: [ColorOption; 7] = [
    ColorOption {
        name: "Pink",
        colors: ColorPair::new(Rgb::from_hex(0xf06292), Rgb::from_hex(0xf48fb1)),
    },
    ColorOption {
        name: "Red",
        colors: ColorPair::new(Rgb::from_hex(0xe53935), Rgb::from_hex(0xef5350)),
    },
    ColorOption {
        name: "Green",
        colors: ColorPair::new(Rgb::from_hex(0x4caf50), Rgb::from_hex(0x81c784)),
    },
    ColorOption {
        name: "Blue",
        colors: ColorPair::new(Rgb::from_hex(0x2196f3), Rgb::from_hex(0x64b5f6)),
    },
    ColorOption {
        name: "Purple",
        colors: ColorPair::new(Rgb::from_hex(0xb39ddb), Rgb::from_hex(0xd1c4e9)),
    },
    ColorOption {
        name: "Orange",
        colors: ColorPair::new(Rgb::from_hex(0xff9800), Rgb::from_hex(0xffb74d)),
    },
    ColorOption {
        name: "Yellow",
        colors: ColorPair::new(Rgb::from_hex(0xffc107), Rgb::from_hex(0xffd54f)),
    },
];

pub fn color_option(name: &str) -> Option<&'static ColorOption> {
    COLOR_OPTIONS
        .iter()
        .find(|option| option.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    /// Route segment, e.g. `about` for `/about`.
    pub id: String,
    pub title: String,
    pub color: Rgb,
    pub print_color: Rgb,
    pub position: Vec3,
    #[serde(default)]
    pub label_path: Option<LabelPath>,
}

impl SectionDescriptor {
    pub fn new(id: &str, title: &str, colors: ColorPair, position: Vec3) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            color: colors.color,
            print_color: colors.print_color,
            position,
            label_path: None,
        }
    }

    pub fn colors(&self) -> ColorPair {
        ColorPair::new(self.color, self.print_color)
    }

    /// Entrance path for this section's label, falling back to the one
    /// assigned to its slot.
    pub fn label_path(&self, index: usize) -> LabelPath {
        self.label_path.unwrap_or(LabelPath::for_index(index))
    }
}

pub fn default_sections() -> Vec<SectionDescriptor> {
    vec![
        SectionDescriptor::new(
            "about",
            "About Me",
            COLOR_OPTIONS[0].colors,
            Vec3::new(-5.0, 0.0, 0.0),
        ),
        SectionDescriptor::new(
            "projects",
            "Projects",
            COLOR_OPTIONS[6].colors,
            Vec3::ZERO,
        ),
        SectionDescriptor::new(
            "contact",
            "Contact",
            COLOR_OPTIONS[4].colors,
            Vec3::new(5.0, 0.0, 0.0),
        ),
    ]
}

/// Camera framing used while one printer is focused; `pan_x` comes from the
/// focused section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomPreset {
    pub theta: f32,
    pub phi: f32,
    pub distance: f32,
}

impl Default for ZoomPreset {
    fn default() -> Self {
        Self {
            theta: PI / 2.0,
            phi: PI / 2.8,
            distance: 8.0,
        }
    }
}

impl ZoomPreset {
    pub fn orbit_for(&self, section: &SectionDescriptor) -> OrbitState {
        OrbitState::new(self.theta, self.phi, self.distance, section.position.x)
    }
}

/// What happens to print progress while a printer is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenProgress {
    /// Hidden printers are skipped entirely and resume where they stopped.
    #[default]
    Freeze,
    /// Progress keeps accumulating; only the geometry updates are skipped.
    Advance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub path: Option<PathBuf>,
    pub color: Rgb,
    /// Largest extent after normalization.
    pub target_size: f32,
    /// Resting position on the ground; `y` is recomputed from the bounds.
    pub position: Vec3,
    /// Section in which the model is shown.
    pub section_index: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            path: None,
            color: Rgb::from_hex(0xffd54f),
            target_size: 1.5,
            position: Vec3::new(2.5, 0.0, 0.5),
            section_index: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub sections: Vec<SectionDescriptor>,
    pub owner_name: String,
    pub name_color: Rgb,
    pub background: Rgb,
    pub overview_camera: OrbitState,
    pub zoomed_camera: ZoomPreset,
    pub limits: OrbitLimits,
    pub projection: Projection,
    pub transition_seconds: f32,
    pub boost_speed: f32,
    pub hidden_progress: HiddenProgress,
    pub model: ModelOptions,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            owner_name: "JOYCE TING".to_string(),
            name_color: Rgb::from_hex(0xf58e2f),
            background: Rgb::from_hex(0xf5efe4),
            overview_camera: OrbitState::overview(),
            zoomed_camera: ZoomPreset::default(),
            limits: OrbitLimits::default(),
            projection: Projection::default(),
            transition_seconds: 1.3,
            boost_speed: 5.0,
            hidden_progress: HiddenProgress::Freeze,
            model: ModelOptions::default(),
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.sections.is_empty(), "scene needs at least one section");
        for (index, section) in self.sections.iter().enumerate() {
            ensure!(
                !section.id.is_empty() && !section.id.contains('/'),
                "section {index} has an invalid id {:?}",
                section.id
            );
            ensure!(
                self.sections[..index].iter().all(|other| other.id != section.id),
                "duplicate section id {:?}",
                section.id
            );
        }
        ensure!(
            self.transition_seconds > 0.0,
            "transition_seconds must be positive (got {})",
            self.transition_seconds
        );
        ensure!(
            self.boost_speed >= 1.0,
            "boost_speed must be at least 1 (got {})",
            self.boost_speed
        );
        ensure!(
            self.limits.phi_min < self.limits.phi_max
                && self.limits.distance_min < self.limits.distance_max,
            "camera limits are inverted"
        );
        for (name, phi, distance) in [
            (
                "overview_camera",
                self.overview_camera.phi,
                self.overview_camera.distance,
            ),
            (
                "zoomed_camera",
                self.zoomed_camera.phi,
                self.zoomed_camera.distance,
            ),
        ] {
            ensure!(
                (self.limits.phi_min..=self.limits.phi_max).contains(&phi),
                "{name} phi {phi} is outside [{}, {}]",
                self.limits.phi_min,
                self.limits.phi_max
            );
            ensure!(
                (self.limits.distance_min..=self.limits.distance_max).contains(&distance),
                "{name} distance {distance} is outside [{}, {}]",
                self.limits.distance_min,
                self.limits.distance_max
            );
        }
        ensure!(
            self.model.target_size > 0.0,
            "model target_size must be positive"
        );
        Ok(())
    }

    pub fn section_index(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.id == id)
    }
}

/// Reads a JSON scene preset; omitted fields keep their defaults.
pub fn load_scene_config(path: &Path) -> Result<SceneConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scene preset {}", path.display()))?;
    let config: SceneConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing scene preset {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating scene preset {}", path.display()))?;
    Ok(config)
}

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use printfolio_scene::config::load_scene_config;
use printfolio_scene::{SceneConfig, Viewport};

#[derive(Parser, Debug)]
#[command(about = "Printer portfolio scene viewer", version)]
pub struct Args {
    /// Optional scene preset JSON (sections, colors, camera presets, model options)
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Route to open, e.g. /projects; unknown routes open the overview
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Binary or ASCII STL shown next to the model section's printer
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Skip creating a winit window/event loop; ticks the scene on a synthetic clock
    #[arg(long)]
    pub headless: bool,

    /// Number of frames to simulate in headless mode
    #[arg(long, default_value_t = 240)]
    pub frames: u32,

    /// When set, write the final scene snapshot (JSON) after the headless run
    #[arg(long)]
    pub snapshot_json: Option<PathBuf>,

    /// Section id or index to zoom to once the scene has loaded
    #[arg(long)]
    pub zoom_to: Option<String>,

    /// Surface width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "surface size must be non-zero (got {}x{})",
            self.width,
            self.height
        );
        ensure!(self.frames > 0, "frames must be at least 1");
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }
}

/// Resolves the scene configuration: preset file (or defaults) with the
/// command-line model path layered on top.
pub fn scene_config(args: &Args) -> Result<SceneConfig> {
    let mut config = match args.preset.as_deref() {
        Some(path) => load_scene_config(path).context("loading --preset")?,
        None => SceneConfig::default(),
    };
    if let Some(model) = args.model.as_ref() {
        config.model.path = Some(model.clone());
    }
    Ok(config)
}

/// Accepts either a section id (`projects`) or a zero-based index.
pub fn resolve_zoom_target(config: &SceneConfig, target: &str) -> Result<usize> {
    let trimmed = target.trim().trim_matches('/');
    if let Some(index) = config.section_index(trimmed) {
        return Ok(index);
    }
    let index: usize = trimmed
        .parse()
        .with_context(|| format!("unknown section {target:?}"))?;
    ensure!(
        index < config.sections.len(),
        "section index {index} out of range (have {})",
        config.sections.len()
    );
    Ok(index)
}

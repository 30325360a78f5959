//! Windowless run: ticks the scene on a fixed 60 Hz clock, optionally zooms to
//! a section once it has loaded, and reports the final snapshot.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use printfolio_scene::{PortfolioScene, SceneEvent, ViewSnapshot};
use serde::Serialize;

use crate::host::advance_zoom;

pub const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Serialize)]
pub struct HeadlessReport {
    pub frames: u32,
    pub elapsed_seconds: f32,
    pub events: Vec<SceneEvent>,
    pub snapshot: ViewSnapshot,
}

pub fn run(scene: &mut PortfolioScene, frames: u32, zoom_to: Option<usize>) -> HeadlessReport {
    let mut pending_zoom = zoom_to;
    let mut events = Vec::new();
    for frame in 0..frames {
        scene.tick(FRAME_DT);
        for event in scene.drain_events() {
            report_event(frame, &event);
            events.push(event);
        }
        if let Some(index) = pending_zoom {
            if advance_zoom(scene, index) {
                pending_zoom = None;
            }
        }
    }
    if let Some(index) = pending_zoom {
        log::warn!("[printfolio] zoom to section {index} never settled");
    }

    HeadlessReport {
        frames,
        elapsed_seconds: frames as f32 * FRAME_DT,
        events,
        snapshot: scene.snapshot(),
    }
}

pub fn write_report(report: &HeadlessReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating snapshot file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("writing snapshot JSON to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn print_summary(report: &HeadlessReport) {
    let snapshot = &report.snapshot;
    println!(
        "[printfolio] {} frames ({:.2}s simulated), view {} (path {})",
        report.frames,
        report.elapsed_seconds,
        snapshot
            .current_view
            .map(|index| index.to_string())
            .unwrap_or_else(|| "overview".to_string()),
        snapshot.path
    );
    println!(
        "[printfolio] camera eye ({:.2}, {:.2}, {:.2}) looking at ({:.2}, {:.2}, {:.2})",
        snapshot.camera.eye.x,
        snapshot.camera.eye.y,
        snapshot.camera.eye.z,
        snapshot.camera.look_at.x,
        snapshot.camera.look_at.y,
        snapshot.camera.look_at.z
    );
    for (index, colors) in snapshot.printer_colors.iter().enumerate() {
        println!(
            "[printfolio]   printer {index}: housing {} filament {}",
            colors.color, colors.print_color
        );
    }
}

fn report_event(frame: u32, event: &SceneEvent) {
    match event {
        SceneEvent::Navigated { path } => println!("[printfolio] frame {frame}: navigated to {path}"),
        SceneEvent::Loaded => println!("[printfolio] frame {frame}: scene loaded"),
        other => log::debug!("[printfolio] frame {frame}: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printfolio_scene::{SceneConfig, Viewport};

    fn scene(path: &str) -> PortfolioScene {
        PortfolioScene::new(SceneConfig::default(), path, Viewport::new(1280.0, 720.0))
            .expect("default scene builds")
    }

    #[test]
    fn zoom_waits_for_load_then_settles() {
        let mut scene = scene("/");
        let report = run(&mut scene, 200, Some(1));
        assert_eq!(report.snapshot.current_view, Some(1));
        assert_eq!(report.snapshot.path, "/projects");
        assert!(!report.snapshot.is_transitioning);
        let loaded_at = report
            .events
            .iter()
            .position(|event| *event == SceneEvent::Loaded)
            .expect("loaded event");
        let started_at = report
            .events
            .iter()
            .position(|event| matches!(event, SceneEvent::TransitionStarted { .. }))
            .expect("transition started");
        assert!(loaded_at < started_at);
        assert!(report.events.contains(&SceneEvent::Navigated {
            path: "/projects".to_string()
        }));
    }

    #[test]
    fn deep_link_without_zoom_stays_put() {
        let mut scene = scene("/contact");
        let report = run(&mut scene, 10, None);
        assert_eq!(report.snapshot.current_view, Some(2));
        assert!(
            !report
                .events
                .iter()
                .any(|event| matches!(event, SceneEvent::TransitionStarted { .. }))
        );
    }

    #[test]
    fn report_is_written_as_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("snapshot.json");
        let mut scene = scene("/");
        let report = run(&mut scene, 5, None);
        write_report(&report, &path)?;

        let value: serde_json::Value = serde_json::from_reader(File::open(&path)?)?;
        assert_eq!(value["frames"], 5);
        assert_eq!(value["snapshot"]["path"], "/");
        assert_eq!(value["snapshot"]["loaded"], true);
        assert_eq!(value["events"][0]["event"], "loaded");
        Ok(())
    }

    #[test]
    fn zoom_from_deep_link_passes_through_overview() {
        let mut scene = scene("/about");
        let report = run(&mut scene, 300, Some(2));
        assert_eq!(report.snapshot.current_view, Some(2));
        assert_eq!(report.snapshot.path, "/contact");
        let directions: Vec<_> = report
            .events
            .iter()
            .filter_map(|event| match event {
                SceneEvent::TransitionStarted { target, .. } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(directions, vec![None, Some(2)]);
    }
}

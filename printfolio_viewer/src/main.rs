mod cli;
mod headless;
mod host;
mod renderer;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pollster::FutureExt;
use printfolio_scene::PortfolioScene;
use winit::{
    dpi::PhysicalSize,
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use cli::Args;
use host::{HostAction, ViewerHost};
use renderer::Renderer;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    args.validate()?;
    let config = cli::scene_config(&args)?;
    let zoom_to = args
        .zoom_to
        .as_deref()
        .map(|target| cli::resolve_zoom_target(&config, target))
        .transpose()
        .context("resolving --zoom-to")?;
    let background = config.background;

    println!(
        "[printfolio] {} sections for {} (preset: {})",
        config.sections.len(),
        config.owner_name,
        args.preset
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );
    if let Some(model) = config.model.path.as_ref() {
        println!("[printfolio] loading decorative model {}", model.display());
    }

    let mut scene = PortfolioScene::new(config, &args.path, args.viewport())
        .context("building portfolio scene")?;

    if args.headless {
        let report = headless::run(&mut scene, args.frames, zoom_to);
        headless::print_summary(&report);
        if let Some(path) = args.snapshot_json.as_ref() {
            headless::write_report(&report, path)?;
            println!("[printfolio] snapshot written to {}", path.display());
        }
        return Ok(());
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("Printfolio - {}", args.path))
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );
    let size = window.inner_size();
    scene.resize(size.width as f32, size.height as f32);

    let renderer = Renderer::new(window, background)
        .block_on()
        .context("initializing renderer")?;
    let mut host = ViewerHost::new(renderer, scene);
    if let Some(index) = zoom_to {
        host.queue_zoom(index);
    }

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == host.window().id() => {
                    if host.handle_window_event(&event) == HostAction::Exit {
                        target.exit();
                    }
                }
                Event::AboutToWait => host.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

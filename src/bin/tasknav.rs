//! Developer tool for inspecting navigator layouts and transitions without a
//! compositor.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tasknav::common::config::Config;
use tasknav::common::log::init_logging;
use tasknav::layout_engine::{Layout, LayoutEngine};
use tasknav::model::{Notification, NotificationContent, NotificationId, Window, WindowId};
use tasknav::navigator::{self, Navigator, NavigatorEvent, ViewportTransform, ZoomState};
use tasknav::sys::geometry::{Point, Rect};
use tracing::info;
use tracing::level_filters::LevelFilter;

const FRAME: Duration = Duration::from_millis(16);
/// Upper bound on simulated frames per transition.
const MAX_FRAMES: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "tasknav")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file; defaults to the user config if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the layout for a number of thumbnails and notifications.
    Layout {
        #[arg(long, default_value_t = 1)]
        thumbnails: usize,
        #[arg(long, default_value_t = 0)]
        notes: usize,
    },
    /// Drive a headless navigator through enter, zoom in and zoom out.
    Simulate {
        #[arg(long, default_value_t = 3)]
        windows: usize,
        #[arg(long, default_value_t = 1)]
        notes: usize,
        /// Index of the window to zoom into.
        #[arg(long, default_value_t = 0)]
        target: usize,
    },
}

#[derive(Serialize)]
struct LayoutReport {
    layout: Layout,
    thumbnails: Vec<Rect>,
    notes: Vec<Point>,
    content_height: f64,
}

#[derive(Serialize)]
struct SimulationReport {
    events: Vec<NavigatorEvent>,
    zoomed_in: ViewportTransform,
    final_viewport: ViewportTransform,
    final_state: ZoomState,
    scroll_offset: f64,
}

fn main() -> anyhow::Result<()> {
    init_logging(LevelFilter::WARN);
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::read(path)?,
        None => Config::load()?,
    };

    let report = match cli.command {
        Command::Layout { thumbnails, notes } => {
            serde_json::to_string_pretty(&layout(&config, thumbnails, notes))?
        }
        Command::Simulate { windows, notes, target } => {
            serde_json::to_string_pretty(&simulate(config, windows, notes, target)?)?
        }
    };
    println!("{report}");
    Ok(())
}

fn layout(config: &Config, thumbnails: usize, notes: usize) -> LayoutReport {
    let engine = LayoutEngine::from_config(config);
    let layout = engine.compute_layout(thumbnails, notes);
    let top = engine.notes_area_top(&layout);
    LayoutReport {
        thumbnails: (0..thumbnails).map(|i| layout.cell_rect(i)).collect(),
        notes: (0..notes).map(|i| engine.note_slot(top, i, notes)).collect(),
        content_height: engine.content_height(&layout, notes),
        layout,
    }
}

fn synthetic_window(config: &Config, index: usize) -> Window {
    let screen = config.screen.size();
    let title_bar = config.layout.title_height;
    Window {
        id: WindowId::new(index as u32 + 1),
        class_id: format!("org.example.app{index}"),
        app_name: format!("App {index}"),
        frame: Rect::from_xywh(0.0, 0.0, screen.width, screen.height),
        content_rect: Rect::from_xywh(0.0, title_bar, screen.width, screen.height - title_bar),
    }
}

fn run_until_idle(nav: &mut Navigator) {
    for _ in 0..MAX_FRAMES {
        if !nav.zoom_state().is_transient() {
            break;
        }
        nav.advance(FRAME);
    }
}

fn simulate(
    config: Config,
    windows: usize,
    notes: usize,
    target: usize,
) -> anyhow::Result<SimulationReport> {
    if target >= windows {
        bail!("target {target} out of range for {windows} windows");
    }
    let (events_tx, mut events_rx) = navigator::events::channel();
    let mut nav = Navigator::new(config.clone(), events_tx);

    let windows: Vec<Window> = (0..windows).map(|i| synthetic_window(&config, i)).collect();
    for window in &windows {
        nav.add_window(window.clone());
    }
    for i in 0..notes {
        // Every other notification belongs to a running application.
        let destination = if i % 2 == 0 {
            windows[i % windows.len()].class_id.clone()
        } else {
            format!("org.example.service{i}")
        };
        nav.add_notification(Notification {
            id: NotificationId::new(i as u32 + 1),
            destination_app: destination,
            content: NotificationContent { summary: format!("Notification {i}"), icon: None },
        });
    }

    nav.enter();
    let target = windows[target].id;
    let card = nav
        .thumbnails()
        .find_by_window(target)
        .and_then(|id| nav.thumbnails().get(id))
        .map(|t| nav.scene().stage_rect(t.card))
        .context("target window has no thumbnail")?;
    nav.handle_click(card.mid());
    nav.handle_click(Point::new(1.0, 1.0));

    nav.zoom_in(target, || info!("zoom in finished"));
    run_until_idle(&mut nav);
    let zoomed_in = nav.viewport_transform();

    nav.zoom_out(target, || info!("zoom out finished"));
    run_until_idle(&mut nav);

    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    Ok(SimulationReport {
        events,
        zoomed_in,
        final_viewport: nav.viewport_transform(),
        final_state: nav.zoom_state(),
        scroll_offset: nav.scroll_offset(),
    })
}

//! LED Scales control server.
//!
//! Runs the render loop on a dedicated thread and the HTTP + Socket.IO
//! control surface on the tokio runtime, bridged by a shared `Mutex` for
//! state and a `watch` channel for frames.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the pixel sink, ticks the
//!   active effect, applies brightness/power fade, publishes frames.
//! - **HTTP/Socket.IO server** (tokio/axum): serves the control API and
//!   streams frames to viewers.
//!
//! ## Usage
//! ```sh
//! led-scales scale --x-count 5 --y-count 24 --panel-count 3
//! led-scales hex --config hex-layout.json
//! ```

use clap::{Parser, Subcommand};
use led_scales::broadcast::FrameBroadcaster;
use led_scales::layout::hex::{HexCell, HexLayout};
use led_scales::layout::scale::{ScaleConfig, ScaleLayout};
use led_scales::layout::Layout;
use led_scales::persistence::{self, ConfigBlob};
use led_scales::render::{render_loop, RenderLoopConfig};
use led_scales::server::{self, AppState};
use led_scales::sink::{MockSink, PixelSink};
use led_scales::state::{GlobalState, RenderStatus};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// LED Scales control server
#[derive(Parser)]
#[command(name = "led-scales")]
#[command(about = "Real-time control server for an addressable RGBW LED array")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    layout: LayoutArgs,

    /// Port to listen on
    #[arg(long, default_value = "5001")]
    port: u16,

    /// Directory to serve as static files (a web UI), if any
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Config file path (presets + last-known state). Defaults to
    /// `$XDG_CONFIG_HOME/led-scales/config.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run against real hardware instead of the in-memory mock sink.
    #[cfg(feature = "hardware")]
    #[arg(long)]
    hardware: bool,

    /// Log an FPS / render-health summary once per second.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum LayoutArgs {
    /// Rectangular scale panel geometry.
    Scale {
        #[arg(long, default_value = "5")]
        x_count: u32,
        #[arg(long, default_value = "24")]
        y_count: u32,
        #[arg(long, default_value = "3")]
        panel_count: u32,
        #[arg(long, default_value = "1.0")]
        spacing: f64,
        #[arg(long, default_value = "1.0")]
        scale_length: f64,
        #[arg(long, default_value = "1.0")]
        scale_width: f64,
    },
    /// Hex geometry, loaded from a JSON file of cell assignments produced
    /// by the hex-setup tooling.
    Hex {
        #[arg(long)]
        config: PathBuf,
    },
}

fn build_layout(args: &LayoutArgs) -> Arc<dyn Layout> {
    match args {
        LayoutArgs::Scale {
            x_count,
            y_count,
            panel_count,
            spacing,
            scale_length,
            scale_width,
        } => Arc::new(ScaleLayout::new(ScaleConfig {
            x_count: *x_count,
            y_count: *y_count,
            panel_count: *panel_count,
            spacing: *spacing,
            scale_length: *scale_length,
            scale_width: *scale_width,
        })),
        LayoutArgs::Hex { config } => {
            let raw = std::fs::read_to_string(config)
                .unwrap_or_else(|e| panic!("failed to read hex config {}: {}", config.display(), e));
            let cells: Vec<HexCell> = serde_json::from_str(&raw)
                .unwrap_or_else(|e| panic!("failed to parse hex config {}: {}", config.display(), e));
            Arc::new(HexLayout::new(cells))
        }
    }
}

/// Build the pixel sink for this run. A hardware connect failure at
/// startup is fatal (spec.md §7: "persistent failure raises a startup
/// error only") — unlike a sink that fails mid-run, which the render loop
/// degrades to the mock sink for on its own (see `render::MAX_CONSECUTIVE_SINK_FAILURES`).
#[cfg_attr(not(feature = "hardware"), allow(unused_variables))]
fn build_sink(pixel_count: usize, hardware: bool) -> Box<dyn PixelSink> {
    #[cfg(feature = "hardware")]
    if hardware {
        return match led_scales::sink::hardware::MatrixSink::new(pixel_count) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                eprintln!("fatal: failed to initialize hardware sink: {e}");
                std::process::exit(1);
            }
        };
    }
    Box::new(MockSink::new(pixel_count))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .init();

    let args = Args::parse();
    let layout = build_layout(&args.layout);
    let config_path = args.config.unwrap_or_else(persistence::default_config_path);

    tracing::info!("LED Scales server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Layout: {} pixels", layout.pixel_count());
    tracing::info!("Config: {}", config_path.display());

    let blob = persistence::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config ({}), starting fresh", e);
        ConfigBlob::default()
    });

    let mut initial_state = GlobalState::new();
    initial_state.presets = blob.presets;
    initial_state.set_params_map(blob.parameters_by_effect);
    if let Some(effect) = blob.current_effect {
        initial_state.effect = effect;
    }
    if let Some(brightness) = blob.brightness {
        initial_state.brightness = brightness.clamp(0.0, 1.0);
    }
    if let Some(power) = blob.power_state {
        initial_state.power_state = power;
        initial_state.target_power_state = power;
    }
    initial_state.active_preset_id = blob.active_preset_id;

    let state = Arc::new(Mutex::new(initial_state));
    let render_status = Arc::new(Mutex::new(RenderStatus::default()));
    let (broadcaster, _rx) = FrameBroadcaster::new();
    let running = led_scales::setup_signal_handler();

    #[cfg(feature = "hardware")]
    let hardware_requested = args.hardware;
    #[cfg(not(feature = "hardware"))]
    let hardware_requested = false;

    let sink = build_sink(layout.pixel_count(), hardware_requested);
    let tick_interval = if hardware_requested {
        Duration::from_millis(5)
    } else {
        Duration::from_millis(50)
    };

    let render_thread = {
        let state = state.clone();
        let render_status = render_status.clone();
        let layout = layout.clone();
        let broadcaster = broadcaster.clone();
        let running = running.clone();
        std::thread::spawn(move || {
            render_loop(
                RenderLoopConfig {
                    state,
                    render_status,
                    layout,
                    broadcaster,
                    running,
                    tick_interval,
                },
                sink,
            );
        })
    };

    if args.debug {
        let render_status = render_status.clone();
        let running = running.clone();
        tokio::spawn(async move {
            while led_scales::is_running(&running) {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let status = render_status.lock().unwrap().clone();
                tracing::info!(
                    "fps={:.1} consecutive_errors={} fallback_active={}",
                    status.fps,
                    status.consecutive_errors,
                    status.fallback_active
                );
            }
        });
    }

    let (io_layer, io) = socketioxide::SocketIo::new_layer();
    let app_state = AppState {
        state,
        render_status,
        layout,
        broadcaster,
        config_path,
        io,
        viewer_count: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
    };
    server::register_socket_handlers(&app_state);

    let app = server::create_router(app_state, args.static_dir, io_layer);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API documentation: http://localhost:{}/docs", args.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    let shutdown_signal = {
        let running = running.clone();
        async move {
            while led_scales::is_running(&running) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .expect("server error");

    render_thread.join().expect("render thread panicked");
}

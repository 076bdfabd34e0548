//! Render loop: the one place that ever calls into effect code, owns the
//! pixel sink, and publishes frames for viewers.
//!
//! Runs on a dedicated `std::thread`, not the tokio runtime — hardware
//! drivers and tight frame-pacing loops don't belong on an async
//! executor's worker threads. State flows in from the HTTP/Socket.IO side
//! only through the shared `Mutex<GlobalState>`; frames flow out only
//! through the pixel sink and the frame broadcaster.

use crate::broadcast::FrameBroadcaster;
use crate::color::Rgbw;
use crate::effects::{EffectCache, EffectId};
use crate::layout::Layout;
use crate::sink::{MockSink, PixelSink};
use crate::state::{GlobalState, RenderStatus};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Consecutive render panics/errors allowed before the loop gives up on
/// the active effect and falls back to a flat black frame until the user
/// picks something else.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Consecutive pixel-sink failures allowed before the loop gives up on the
/// configured sink (hardware, typically) and swaps in a `MockSink` for the
/// remainder of the process. A single bad `show()` call might be a
/// transient hardware hiccup; three in a row means the driver itself is
/// gone, not the frame.
const MAX_CONSECUTIVE_SINK_FAILURES: u32 = 3;

pub struct RenderLoopConfig {
    pub state: Arc<Mutex<GlobalState>>,
    pub render_status: Arc<Mutex<RenderStatus>>,
    pub layout: Arc<dyn Layout>,
    pub broadcaster: FrameBroadcaster,
    pub running: Arc<AtomicBool>,
    /// Target time between ticks — ~50ms for the mock sink, ~5ms for real
    /// hardware (see SPEC_FULL.md's concurrency section).
    pub tick_interval: Duration,
}

/// Render one effect frame, guarding against an effect implementation
/// panicking. A panic here must never take the whole process down — one
/// badly-behaved effect shouldn't blackout every other effect a user might
/// switch to next.
fn render_effect_frame(
    effect: EffectId,
    frame: &mut [Rgbw],
    layout: &dyn Layout,
    ms: u64,
    params: &crate::params::ParamValues,
    cache: &mut EffectCache,
) -> bool {
    let instance = effect.instance();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        instance.render(frame, layout, ms, params, cache);
    }));
    result.is_ok()
}

pub fn render_loop(config: RenderLoopConfig, mut sink: Box<dyn PixelSink>) {
    let RenderLoopConfig {
        state,
        render_status,
        layout,
        broadcaster,
        running,
        tick_interval,
    } = config;

    let pixel_count = layout.pixel_count();

    let mut cache = EffectCache::default();
    let mut cached_effect: Option<EffectId> = None;
    let mut effect_start = Instant::now();
    let mut consecutive_failures: u32 = 0;
    let mut fallback_active = false;
    let mut sequence: u64 = 0;

    let mut fps_window_start = Instant::now();
    let mut fps_window_ticks: u32 = 0;

    let mut consecutive_sink_failures: u32 = 0;
    let mut sink_degraded = false;

    tracing::info!("Render loop started: {} pixels, {:?} tick interval", pixel_count, tick_interval);

    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        let (effect, params, brightness, power_mult) = {
            let mut guard = state.lock().unwrap();
            guard.settle_power(tick_start);
            (
                guard.effect,
                guard.current_params(),
                guard.brightness,
                guard.power_multiplier(tick_start),
            )
        };

        if cached_effect != Some(effect) {
            cache.invalidate();
            cached_effect = Some(effect);
            consecutive_failures = 0;
            fallback_active = false;
            effect_start = tick_start;
        }

        let ms = tick_start.saturating_duration_since(effect_start).as_millis() as u64;

        let mut frame = vec![Rgbw::BLACK; pixel_count];

        if fallback_active {
            // Stay on a flat black frame until the user picks a different
            // effect (which resets `cached_effect` above and clears this).
        } else {
            let ok = render_effect_frame(effect, &mut frame, layout.as_ref(), ms, &params, &mut cache);

            if ok {
                consecutive_failures = 0;
            } else {
                consecutive_failures += 1;
                tracing::error!(
                    "Effect {:?} panicked rendering a frame ({} consecutive failures)",
                    effect,
                    consecutive_failures
                );
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    fallback_active = true;
                    tracing::warn!("Falling back to a flat black frame after repeated effect failures");
                }
                frame.fill(Rgbw::BLACK);
            }
        }

        let factor = brightness * power_mult;
        for pixel in frame.iter_mut() {
            *pixel = pixel.scale(factor);
        }

        match sink.show(&frame) {
            Ok(()) => consecutive_sink_failures = 0,
            Err(e) => {
                consecutive_sink_failures += 1;
                tracing::error!(
                    "Pixel sink rejected frame ({} consecutive failures): {}",
                    consecutive_sink_failures,
                    e
                );
                if !sink_degraded && consecutive_sink_failures >= MAX_CONSECUTIVE_SINK_FAILURES {
                    tracing::error!(
                        "Pixel sink failed {} ticks running; falling back to the in-memory mock sink for the remainder of the process",
                        MAX_CONSECUTIVE_SINK_FAILURES
                    );
                    sink = Box::new(MockSink::new(pixel_count));
                    sink_degraded = true;
                    consecutive_sink_failures = 0;
                }
            }
        }

        sequence += 1;
        broadcaster.publish(frame, sequence);

        {
            let mut status = render_status.lock().unwrap();
            status.consecutive_errors = consecutive_failures;
            status.fallback_active = fallback_active;
        }

        fps_window_ticks += 1;
        let window_elapsed = tick_start.saturating_duration_since(fps_window_start);
        if window_elapsed >= Duration::from_secs(1) {
            let fps = fps_window_ticks as f64 / window_elapsed.as_secs_f64();
            render_status.lock().unwrap().fps = fps;
            fps_window_ticks = 0;
            fps_window_start = tick_start;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < tick_interval {
            std::thread::sleep(tick_interval - elapsed);
        }
    }

    tracing::info!("Render loop stopping, sending final blackout frame");
    let blackout = vec![Rgbw::BLACK; pixel_count];
    let _ = sink.show(&blackout);
    sequence += 1;
    broadcaster.publish(blackout, sequence);
}

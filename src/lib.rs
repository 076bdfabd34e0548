//! Real-time rendering engine and control plane for an addressable RGBW
//! LED array, in either a rectangular "scale panel" or a hand-assigned
//! hex geometry.
//!
//! - [`color`] — the RGBW pixel value every effect and post-processing
//!   stage operates on.
//! - [`layout`] — maps a logical pixel index to a physical strand
//!   position, for both supported geometries.
//! - [`params`] — declarative, validated effect parameters.
//! - [`effects`] — the closed catalog of effect implementations.
//! - [`state`] — the single shared source of truth for what's currently
//!   playing.
//! - [`preset`] / [`persistence`] — saved snapshots of state, and their
//!   on-disk storage.
//! - [`sink`] — the narrow interface to the physical (or mock) strand.
//! - [`broadcast`] — the non-blocking mailbox that gets rendered frames
//!   to connected viewers.
//! - [`render`] — the dedicated thread that ties all of the above
//!   together, tick by tick.
//! - [`server`] — the HTTP + Socket.IO control surface.
//! - [`errors`] — the crate-wide error taxonomy.

pub mod broadcast;
pub mod color;
pub mod effects;
pub mod errors;
pub mod layout;
pub mod params;
pub mod persistence;
pub mod preset;
pub mod render;
pub mod server;
pub mod sink;
pub mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set up a Ctrl+C handler that sets `running` to false, so the render
/// loop can finish its current tick, send a final blackout frame, and
/// exit cleanly instead of leaving LEDs lit.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    running
}

pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

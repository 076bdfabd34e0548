//! Frame broadcaster: hands the latest rendered frame to any number of
//! Socket.IO viewers without the render loop ever blocking on a slow or
//! absent reader.
//!
//! `tokio::sync::watch` is built for exactly this: a single-slot mailbox
//! where a new value overwrites whatever hasn't been read yet, and
//! readers `.await` a change instead of polling. The render loop (a plain
//! OS thread, not async) only ever calls the synchronous `send` — it never
//! sees a receiver, let alone blocks on one.

use crate::color::Rgbw;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub pixels: Vec<Rgbw>,
    pub sequence: u64,
}

/// Cheaply `Clone`-able handle to the single outgoing slot: the render
/// thread and the HTTP/Socket.IO layer each hold a clone, and any number
/// of viewers each hold an independent `Receiver` from `subscribe`.
#[derive(Clone)]
pub struct FrameBroadcaster {
    tx: Arc<watch::Sender<Frame>>,
}

impl FrameBroadcaster {
    pub fn new() -> (Self, watch::Receiver<Frame>) {
        let (tx, rx) = watch::channel(Frame::default());
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Publish a new frame. Never blocks: `watch::Sender::send` only
    /// clones the value into the slot and wakes waiting receivers, it
    /// never waits on a reader to catch up.
    pub fn publish(&self, pixels: Vec<Rgbw>, sequence: u64) {
        // A send only fails once every receiver has been dropped, which
        // happens when no viewer is currently connected — not an error.
        let _ = self.tx.send(Frame { pixels, sequence });
    }

    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.tx.subscribe()
    }
}

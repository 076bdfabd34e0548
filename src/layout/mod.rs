//! Layout / controller: maps a logical pixel index onto a physical strand
//! position and back, for the two supported geometries.
//!
//! # Rust concept: trait objects
//! The render loop and the effects don't care whether they're driving a
//! `ScaleLayout` or a `HexLayout` — they only need the `Layout` trait. We
//! store the active layout as `Arc<dyn Layout>` so it can be shared (read
//! only, after startup) between the render thread and the HTTP handlers
//! that serve `GET /config`.

pub mod hex;
pub mod scale;

use serde::Serialize;

pub use hex::HexLayout;
pub use scale::ScaleLayout;

/// Which concrete geometry a layout implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Scale,
    Hex,
}

/// The wire representation returned by `GET /config`.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutDescriptor {
    Scale {
        x_count: u32,
        y_count: u32,
        panel_count: u32,
        spacing: f64,
        scale_length: f64,
        scale_width: f64,
    },
    Hex { hexagons: Vec<HexDescriptor> },
}

#[derive(Clone, Debug, Serialize)]
pub struct HexDescriptor {
    pub x: f64,
    pub y: f64,
    pub ordered_leds: Vec<usize>,
}

/// Common interface for any physical LED arrangement.
pub trait Layout: Send + Sync {
    /// Total number of addressable LEDs, `N`.
    fn pixel_count(&self) -> usize;

    fn kind(&self) -> LayoutKind;

    /// Logical (x, y) coordinate of strand index `i`, if the geometry
    /// defines one (both scale and hex layouts do).
    fn coord_of(&self, index: usize) -> Option<(f64, f64)>;

    /// Which hex cell strand index `i` belongs to. `None` for scale layouts.
    fn cell_of(&self, _index: usize) -> Option<usize> {
        None
    }

    /// The center point effects should measure radial distance/angle from.
    fn center(&self) -> (f64, f64);

    /// Wire descriptor for `GET /config`.
    fn descriptor(&self) -> LayoutDescriptor;

    /// Whether this layout supports hex-only effects (e.g. `RandomColorHex`).
    fn is_hex(&self) -> bool {
        self.kind() == LayoutKind::Hex
    }
}

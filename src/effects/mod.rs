//! Effect framework: a closed, statically-dispatched registry of effect
//! implementations (spec.md §9 replaces the original's class-name registry
//! with this), plus the per-instance cache each effect may build over the
//! active layout.

mod multi_color_radial;
mod random_color;
mod random_color_hex;
mod rainbow_radial;
mod rainbow_spin;
mod single_color;
mod single_color_radial;

use crate::color::Rgbw;
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precomputed per-layout values an effect may want to reuse across ticks.
/// Cleared whenever the active effect or layout changes.
#[derive(Default)]
pub struct EffectCache {
    pub distances: Option<Vec<f64>>,
    pub angles: Option<Vec<f64>>,
    pub hex_colors: Option<Vec<Rgbw>>,
    pub hex_color_start_ms: Option<u64>,
}

impl EffectCache {
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn distances<'a>(cache: &'a mut Self, layout: &dyn Layout) -> &'a [f64] {
        cache.distances.get_or_insert_with(|| {
            let (cx, cy) = layout.center();
            (0..layout.pixel_count())
                .map(|i| match layout.coord_of(i) {
                    Some((x, y)) => ((x - cx).powi(2) + (y - cy).powi(2)).sqrt(),
                    None => 0.0,
                })
                .collect()
        })
    }

    fn angles<'a>(cache: &'a mut Self, layout: &dyn Layout) -> &'a [f64] {
        cache.angles.get_or_insert_with(|| {
            let (cx, cy) = layout.center();
            (0..layout.pixel_count())
                .map(|i| match layout.coord_of(i) {
                    Some((x, y)) => (y - cy).atan2(x - cx).to_degrees().rem_euclid(360.0),
                    None => 0.0,
                })
                .collect()
        })
    }
}

/// A deterministic function from `(time, parameters, layout)` to a frame of
/// `N` colors.
pub trait Effect: Send + Sync {
    fn class_name(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn param_spec(&self) -> Vec<ParamSpec>;

    /// Whether this effect only makes sense on a hex layout.
    fn requires_hex(&self) -> bool {
        false
    }

    /// Write exactly `layout.pixel_count()` colors into `frame`.
    fn render(
        &self,
        frame: &mut [Rgbw],
        layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        cache: &mut EffectCache,
    );
}

/// The closed set of effect classes. A tagged union rather than a dynamic
/// registry: adding an effect means adding a variant and a match arm, and
/// the compiler enforces exhaustiveness everywhere this is matched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum EffectId {
    SingleColor,
    RainbowRadial,
    RainbowSpin,
    SingleColorRadial,
    MultiColorRadial,
    RandomColorSingle,
    RandomColorDual,
    RandomColorHex,
}

impl EffectId {
    pub const ALL: [EffectId; 8] = [
        EffectId::SingleColor,
        EffectId::RainbowRadial,
        EffectId::RainbowSpin,
        EffectId::SingleColorRadial,
        EffectId::MultiColorRadial,
        EffectId::RandomColorSingle,
        EffectId::RandomColorDual,
        EffectId::RandomColorHex,
    ];

    pub fn class_name(self) -> &'static str {
        self.instance().class_name()
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.class_name() == name)
    }

    /// Resolve to the (stateless, `'static`) trait object implementing this
    /// effect's behavior.
    pub fn instance(self) -> &'static dyn Effect {
        match self {
            EffectId::SingleColor => &single_color::SingleColor,
            EffectId::RainbowRadial => &rainbow_radial::RainbowRadial,
            EffectId::RainbowSpin => &rainbow_spin::RainbowSpin,
            EffectId::SingleColorRadial => &single_color_radial::SingleColorRadial,
            EffectId::MultiColorRadial => &multi_color_radial::MultiColorRadial,
            EffectId::RandomColorSingle => &random_color::RandomColorSingle,
            EffectId::RandomColorDual => &random_color::RandomColorDual,
            EffectId::RandomColorHex => &random_color_hex::RandomColorHex,
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        EffectId::SingleColor
    }
}

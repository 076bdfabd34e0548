use super::{Effect, EffectCache};
use crate::color::Rgbw;
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Period (ms) between color changes at `transition_speed == 0.0` and
/// `== 1.0` respectively — slower setting holds a color longer.
const SLOWEST_PERIOD_MS: f64 = 5000.0;
const FASTEST_PERIOD_MS: f64 = 200.0;

pub(super) fn period_ms(transition_speed: f64) -> f64 {
    SLOWEST_PERIOD_MS - transition_speed.clamp(0.0, 1.0) * (SLOWEST_PERIOD_MS - FASTEST_PERIOD_MS)
}

/// A pseudorandom but fully deterministic color for `(bucket, group)`: the
/// same inputs always produce the same color, so the effect needs no
/// mutable state of its own and can be driven purely by elapsed time.
pub(super) fn random_color_for(bucket: u64, group: u64) -> Rgbw {
    let mut hasher = DefaultHasher::new();
    (bucket, group).hash(&mut hasher);
    let seed = hasher.finish();
    let mut rng = SmallRng::seed_from_u64(seed);
    Rgbw::new(rng.gen(), rng.gen(), rng.gen(), 0)
}

/// Each LED independently gets a new random color every `transition_speed`
/// period.
pub struct RandomColorSingle;

impl Effect for RandomColorSingle {
    fn class_name(&self) -> &'static str {
        "RandomColorSingle"
    }

    fn display_name(&self) -> &'static str {
        "Random Color"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("transition_speed", "Transition Speed", 0.5)]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        _layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        _cache: &mut EffectCache,
    ) {
        let period = period_ms(params.float_or("transition_speed", 0.5));
        let bucket = (ms as f64 / period) as u64;
        for (i, pixel) in frame.iter_mut().enumerate() {
            *pixel = random_color_for(bucket, i as u64);
        }
    }
}

/// Adjacent LEDs are paired and share one random color, refreshed on the
/// same period as [`RandomColorSingle`].
pub struct RandomColorDual;

impl Effect for RandomColorDual {
    fn class_name(&self) -> &'static str {
        "RandomColorDual"
    }

    fn display_name(&self) -> &'static str {
        "Random Color (Dual)"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("transition_speed", "Transition Speed", 0.5)]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        _layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        _cache: &mut EffectCache,
    ) {
        let period = period_ms(params.float_or("transition_speed", 0.5));
        let bucket = (ms as f64 / period) as u64;
        for (i, pixel) in frame.iter_mut().enumerate() {
            let pair = (i / 2) as u64;
            *pixel = random_color_for(bucket, pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::scale::{ScaleConfig, ScaleLayout};

    #[test]
    fn same_bucket_is_deterministic() {
        assert_eq!(random_color_for(3, 7), random_color_for(3, 7));
    }

    #[test]
    fn different_buckets_usually_differ() {
        assert_ne!(random_color_for(1, 7), random_color_for(2, 7));
    }

    #[test]
    fn dual_pairs_adjacent_leds() {
        let layout = ScaleLayout::new(ScaleConfig {
            x_count: 2,
            y_count: 4,
            panel_count: 1,
            ..Default::default()
        });
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut cache = EffectCache::default();
        RandomColorDual.render(&mut frame, &layout, 0, &ParamValues::new(), &mut cache);
        assert_eq!(frame[0], frame[1]);
        assert_eq!(frame[2], frame[3]);
    }

    #[test]
    fn holds_steady_within_one_period() {
        let layout = ScaleLayout::new(ScaleConfig::default());
        let mut frame_a = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut frame_b = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut params = ParamValues::new();
        params
            .0
            .insert("transition_speed".into(), crate::params::ParamValue::Float(0.0));
        let mut cache_a = EffectCache::default();
        let mut cache_b = EffectCache::default();
        RandomColorSingle.render(&mut frame_a, &layout, 0, &params, &mut cache_a);
        RandomColorSingle.render(&mut frame_b, &layout, 1000, &params, &mut cache_b);
        assert_eq!(frame_a, frame_b);
    }
}

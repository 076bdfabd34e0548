use super::{Effect, EffectCache};
use crate::color::{Rgb, Rgbw};
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

/// An amplitude pulse traveling outward along radial distance, all in one
/// color.
pub struct SingleColorRadial;

impl Effect for SingleColorRadial {
    fn class_name(&self) -> &'static str {
        "SingleColorRadial"
    }

    fn display_name(&self) -> &'static str {
        "Single Color Radial"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::color("color", "Color", Rgb::new(255, 255, 255)),
            ParamSpec::float("speed", "Speed", 0.5),
            ParamSpec::float("intensity", "Intensity", 1.0),
        ]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        cache: &mut EffectCache,
    ) {
        let color = params.color_or("color", Rgb::new(255, 255, 255)).to_rgbw();
        let speed = params.float_or("speed", 0.5);
        let intensity = params.float_or("intensity", 1.0);
        let distances = EffectCache::distances(cache, layout);
        let max_distance = distances.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
        let phase = (ms as f64) * speed * 0.002;

        for (pixel, &distance) in frame.iter_mut().zip(distances.iter()) {
            let normalized = distance / max_distance;
            let wave = (0.5 + 0.5 * (normalized * std::f64::consts::TAU * 2.0 - phase * std::f64::consts::TAU).cos())
                * intensity;
            *pixel = color.scale(wave.clamp(0.0, 1.0));
        }
    }
}

use super::{Effect, EffectCache};
use crate::color::Rgbw;
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

/// Hue is a function of radial distance from the layout's center and
/// elapsed time; distances are cached per layout.
pub struct RainbowRadial;

impl Effect for RainbowRadial {
    fn class_name(&self) -> &'static str {
        "RainbowRadial"
    }

    fn display_name(&self) -> &'static str {
        "Rainbow Radial"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("speed", "Speed", 0.5)]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        cache: &mut EffectCache,
    ) {
        let speed = params.float_or("speed", 0.5);
        let distances = EffectCache::distances(cache, layout);
        let time_component = (ms as f64) * speed * 0.05;
        for (pixel, &distance) in frame.iter_mut().zip(distances.iter()) {
            let hue = (distance * 20.0 + time_component) % 360.0;
            *pixel = Rgbw::from_hue(hue);
        }
    }
}

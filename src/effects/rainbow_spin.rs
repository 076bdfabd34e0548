use super::{Effect, EffectCache};
use crate::color::Rgbw;
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

/// Hue is a function of angle around the layout's center and elapsed time;
/// angles are cached per layout.
pub struct RainbowSpin;

impl Effect for RainbowSpin {
    fn class_name(&self) -> &'static str {
        "RainbowSpin"
    }

    fn display_name(&self) -> &'static str {
        "Rainbow Spin"
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
        let angles = EffectCache::angles(cache, layout);
        let time_component = (ms as f64) * speed * 0.1;
        for (pixel, &angle) in frame.iter_mut().zip(angles.iter()) {
            let hue = (angle + time_component) % 360.0;
            *pixel = Rgbw::from_hue(hue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::scale::{ScaleConfig, ScaleLayout};

    #[test]
    fn different_angles_give_different_hues_at_rest() {
        let layout = ScaleLayout::new(ScaleConfig {
            x_count: 4,
            y_count: 4,
            panel_count: 1,
            ..Default::default()
        });
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut cache = EffectCache::default();
        RainbowSpin.render(&mut frame, &layout, 0, &ParamValues::new(), &mut cache);
        assert!(frame.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn speed_zero_is_still_deterministic() {
        let layout = ScaleLayout::new(ScaleConfig::default());
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut params = ParamValues::new();
        params
            .0
            .insert("speed".into(), crate::params::ParamValue::Float(0.0));
        let mut cache_a = EffectCache::default();
        let mut cache_b = EffectCache::default();
        RainbowSpin.render(&mut frame.clone(), &layout, 0, &params, &mut cache_a);
        RainbowSpin.render(&mut frame, &layout, 1000, &params, &mut cache_b);
        // speed 0 means time never advances the hue
        assert_eq!(cache_a.angles, cache_b.angles);
    }
}

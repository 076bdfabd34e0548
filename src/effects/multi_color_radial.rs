use super::{Effect, EffectCache};
use crate::color::{sample_palette, Rgb, Rgbw};
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

fn default_palette() -> Vec<Rgb> {
    vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)]
}

/// Like [`super::single_color_radial::SingleColorRadial`], but the color at
/// each radial phase is sampled from a palette instead of fixed.
pub struct MultiColorRadial;

impl Effect for MultiColorRadial {
    fn class_name(&self) -> &'static str {
        "MultiColorRadial"
    }

    fn display_name(&self) -> &'static str {
        "Multi Color Radial"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::color_list("colors", "Colors", default_palette()),
            ParamSpec::float("speed", "Speed", 0.5),
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
        let default_palette = default_palette();
        let palette: Vec<Rgbw> = params
            .color_list_or("colors", &default_palette)
            .iter()
            .map(|c| c.to_rgbw())
            .collect();
        let speed = params.float_or("speed", 0.5);
        let distances = EffectCache::distances(cache, layout);
        let max_distance = distances.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
        let phase_shift = (ms as f64) * speed * 0.0005;

        for (pixel, &distance) in frame.iter_mut().zip(distances.iter()) {
            let phase = (distance / max_distance + phase_shift).rem_euclid(1.0);
            *pixel = sample_palette(&palette, phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::scale::{ScaleConfig, ScaleLayout};

    #[test]
    fn center_and_edge_differ_with_multi_stop_palette() {
        let layout = ScaleLayout::new(ScaleConfig {
            x_count: 8,
            y_count: 8,
            panel_count: 1,
            ..Default::default()
        });
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut cache = EffectCache::default();
        MultiColorRadial.render(&mut frame, &layout, 0, &ParamValues::new(), &mut cache);
        assert!(frame.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn falls_back_to_default_palette_when_empty() {
        let layout = ScaleLayout::new(ScaleConfig::default());
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut params = ParamValues::new();
        params
            .0
            .insert("colors".into(), crate::params::ParamValue::ColorList(vec![]));
        let mut cache = EffectCache::default();
        // Should not panic on an empty override — falls back to defaults.
        MultiColorRadial.render(&mut frame, &layout, 0, &params, &mut cache);
    }
}

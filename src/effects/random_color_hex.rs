use super::random_color::{period_ms, random_color_for};
use super::{Effect, EffectCache};
use crate::color::Rgbw;
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

/// One random color per hex cell, shared by every LED in that cell.
/// Only meaningful on a `HexLayout` — see [`Effect::requires_hex`].
pub struct RandomColorHex;

impl Effect for RandomColorHex {
    fn class_name(&self) -> &'static str {
        "RandomColorHex"
    }

    fn display_name(&self) -> &'static str {
        "Random Color (Per Hex)"
    }

    fn requires_hex(&self) -> bool {
        true
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::float("transition_speed", "Transition Speed", 0.5)]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        layout: &dyn Layout,
        ms: u64,
        params: &ParamValues,
        _cache: &mut EffectCache,
    ) {
        let period = period_ms(params.float_or("transition_speed", 0.5));
        let bucket = (ms as f64 / period) as u64;
        for (i, pixel) in frame.iter_mut().enumerate() {
            let cell = layout.cell_of(i).unwrap_or(i);
            *pixel = random_color_for(bucket, cell as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::hex::{HexCell, HexLayout};

    fn sample_layout() -> HexLayout {
        HexLayout::new(vec![
            HexCell { x: 0.0, y: 0.0, ordered_leds: vec![0, 1, 2] },
            HexCell { x: 1.0, y: 0.0, ordered_leds: vec![3, 4, 5] },
        ])
    }

    #[test]
    fn every_led_in_a_cell_shares_its_color() {
        let layout = sample_layout();
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut cache = EffectCache::default();
        RandomColorHex.render(&mut frame, &layout, 0, &ParamValues::new(), &mut cache);
        assert_eq!(frame[0], frame[1]);
        assert_eq!(frame[1], frame[2]);
        assert_eq!(frame[3], frame[4]);
        assert_eq!(frame[4], frame[5]);
    }

    #[test]
    fn distinct_cells_usually_differ() {
        let layout = sample_layout();
        let mut frame = vec![Rgbw::BLACK; layout.pixel_count()];
        let mut cache = EffectCache::default();
        RandomColorHex.render(&mut frame, &layout, 0, &ParamValues::new(), &mut cache);
        assert_ne!(frame[0], frame[3]);
    }

    #[test]
    fn declares_hex_requirement() {
        assert!(RandomColorHex.requires_hex());
    }
}

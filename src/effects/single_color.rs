use super::{Effect, EffectCache};
use crate::color::{Rgb, Rgbw};
use crate::layout::Layout;
use crate::params::{ParamSpec, ParamValues};

/// Every LED set to one flat color.
pub struct SingleColor;

impl Effect for SingleColor {
    fn class_name(&self) -> &'static str {
        "SingleColor"
    }

    fn display_name(&self) -> &'static str {
        "Single Color"
    }

    fn param_spec(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::color("color", "Color", Rgb::new(255, 255, 255))]
    }

    fn render(
        &self,
        frame: &mut [Rgbw],
        _layout: &dyn Layout,
        _ms: u64,
        params: &ParamValues,
        _cache: &mut EffectCache,
    ) {
        let color = params.color_or("color", Rgb::new(255, 255, 255)).to_rgbw();
        frame.fill(color);
    }
}

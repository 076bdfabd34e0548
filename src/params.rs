//! Typed, declarative effect parameters: every effect publishes a static
//! `Vec<ParamSpec>` up front (spec.md §9 replaces the original's runtime
//! attribute walk with this), and live values are validated against it.

use crate::color::Rgb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The declared shape of one parameter.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    Float { default: f64 },
    Color { default: Rgb },
    Enum { options: Vec<String>, default: String },
    ColorList { default: Vec<Rgb> },
}

/// One declared parameter: name, display label, and kind.
#[derive(Clone, Debug, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn float(name: &str, label: &str, default: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ParamKind::Float { default },
        }
    }

    pub fn color(name: &str, label: &str, default: Rgb) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ParamKind::Color { default },
        }
    }

    pub fn enum_(name: &str, label: &str, options: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ParamKind::Enum {
                options: options.iter().map(|s| s.to_string()).collect(),
                default: default.to_string(),
            },
        }
    }

    pub fn color_list(name: &str, label: &str, default: Vec<Rgb>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ParamKind::ColorList { default },
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match &self.kind {
            ParamKind::Float { default } => ParamValue::Float(*default),
            ParamKind::Color { default } => ParamValue::Color(*default),
            ParamKind::Enum { default, .. } => ParamValue::Enum(default.clone()),
            ParamKind::ColorList { default } => ParamValue::ColorList(default.clone()),
        }
    }
}

/// A live parameter value, as stored in `ParamValues` and sent over the
/// wire. Untagged so the JSON shape matches whatever the parameter's kind
/// naturally is (`0.5`, `{"r":...}`, `"Fast"`, `[{"r":...}, ...]`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f64),
    Color(Rgb),
    Enum(String),
    ColorList(Vec<Rgb>),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            ParamValue::Enum(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_color_list(&self) -> Option<&[Rgb]> {
        match self {
            ParamValue::ColorList(list) => Some(list.as_slice()),
            _ => None,
        }
    }
}

/// The live parameter map for one effect instance. Ordering doesn't matter
/// here (it's a lookup table, not a wire format) so a plain `HashMap`
/// suffices; the declared order lives on `ParamSpec` / the effect's
/// `param_spec()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamValues(pub HashMap<String, ParamValue>);

impl ParamValues {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn float_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(ParamValue::as_float).unwrap_or(default)
    }

    pub fn color_or(&self, name: &str, default: Rgb) -> Rgb {
        self.get(name).and_then(ParamValue::as_color).unwrap_or(default)
    }

    pub fn enum_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).and_then(ParamValue::as_enum).unwrap_or(default)
    }

    pub fn color_list_or<'a>(&'a self, name: &str, default: &'a [Rgb]) -> &'a [Rgb] {
        self.get(name)
            .and_then(ParamValue::as_color_list)
            .filter(|l| !l.is_empty())
            .unwrap_or(default)
    }

    /// Build the declared-defaults map for `spec`, then overlay `overrides`
    /// — validating each overlaid value against its declared kind. Invalid
    /// or mismatched-kind overrides are skipped rather than rejected
    /// wholesale, matching the "unknown parameter names are ignored"
    /// resolution in SPEC_FULL.md: a bad single field shouldn't block the
    /// rest of a legitimate update.
    pub fn from_spec_with_overrides(spec: &[ParamSpec], overrides: &ParamValues) -> Self {
        let mut values = HashMap::new();
        for param in spec {
            let mut value = param.default_value();
            if let Some(override_value) = overrides.get(&param.name) {
                if kind_matches(&param.kind, override_value) {
                    value = clamp_to_kind(&param.kind, override_value.clone());
                }
            }
            values.insert(param.name.clone(), value);
        }
        Self(values)
    }
}

fn kind_matches(kind: &ParamKind, value: &ParamValue) -> bool {
    matches!(
        (kind, value),
        (ParamKind::Float { .. }, ParamValue::Float(_))
            | (ParamKind::Color { .. }, ParamValue::Color(_))
            | (ParamKind::Enum { .. }, ParamValue::Enum(_))
            | (ParamKind::ColorList { .. }, ParamValue::ColorList(_))
    )
}

fn clamp_to_kind(kind: &ParamKind, value: ParamValue) -> ParamValue {
    match (kind, value) {
        (ParamKind::Float { .. }, ParamValue::Float(f)) => ParamValue::Float(f.clamp(0.0, 1.0)),
        (ParamKind::Enum { options, default }, ParamValue::Enum(s)) => {
            if options.iter().any(|o| o == &s) {
                ParamValue::Enum(s)
            } else {
                ParamValue::Enum(default.clone())
            }
        }
        (ParamKind::ColorList { default }, ParamValue::ColorList(list)) => {
            if list.is_empty() {
                ParamValue::ColorList(default.clone())
            } else {
                ParamValue::ColorList(list)
            }
        }
        (_, value) => value,
    }
}

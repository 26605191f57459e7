//! Color filters.
//!
//! A filter is an ordered chain of color effects, written and parsed in the
//! CSS filter-function syntax (`sepia(30%) contrast(110%) hue-rotate(-10deg)`)
//! so that the export and the live preview can share one description.

use std::fmt;

use serde::{Deserialize, Serialize};
use snapbooth_common::error::{BoothError, BoothResult};

/// A single color effect with its strength.
///
/// Amounts are fractions (`1.0` = 100%); hue rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", content = "amount", rename_all = "kebab-case")]
pub enum FilterEffect {
    Grayscale(f32),
    Sepia(f32),
    HueRotate(f32),
    Brightness(f32),
    Saturate(f32),
    Contrast(f32),
    Opacity(f32),
}

impl FilterEffect {
    /// CSS function name.
    pub fn function_name(&self) -> &'static str {
        match self {
            FilterEffect::Grayscale(_) => "grayscale",
            FilterEffect::Sepia(_) => "sepia",
            FilterEffect::HueRotate(_) => "hue-rotate",
            FilterEffect::Brightness(_) => "brightness",
            FilterEffect::Saturate(_) => "saturate",
            FilterEffect::Contrast(_) => "contrast",
            FilterEffect::Opacity(_) => "opacity",
        }
    }

    /// Whether this effect leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterEffect::Grayscale(a) | FilterEffect::Sepia(a) => a == 0.0,
            FilterEffect::HueRotate(deg) => deg.rem_euclid(360.0) == 0.0,
            FilterEffect::Brightness(a)
            | FilterEffect::Saturate(a)
            | FilterEffect::Contrast(a)
            | FilterEffect::Opacity(a) => a == 1.0,
        }
    }

    /// Parse one `name(argument)` function.
    pub fn parse(function: &str) -> BoothResult<Self> {
        let invalid = |why: &str| BoothError::validation(format!("{why}: {function:?}"));
        let function = function.trim();
        let open = function
            .find('(')
            .ok_or_else(|| invalid("missing '(' in filter function"))?;
        let arg = function[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing ')' in filter function"))?
            .trim();
        let name = function[..open].trim().to_ascii_lowercase();

        if name == "hue-rotate" {
            return Ok(FilterEffect::HueRotate(parse_angle(arg).ok_or_else(
                || invalid("invalid angle in filter function"),
            )?));
        }

        let amount =
            parse_amount(arg).ok_or_else(|| invalid("invalid amount in filter function"))?;
        if amount < 0.0 {
            return Err(invalid("negative amount in filter function"));
        }
        match name.as_str() {
            "grayscale" => Ok(FilterEffect::Grayscale(amount)),
            "sepia" => Ok(FilterEffect::Sepia(amount)),
            "brightness" => Ok(FilterEffect::Brightness(amount)),
            "saturate" => Ok(FilterEffect::Saturate(amount)),
            "contrast" => Ok(FilterEffect::Contrast(amount)),
            "opacity" => Ok(FilterEffect::Opacity(amount)),
            _ => Err(invalid("unknown filter function")),
        }
    }
}

impl fmt::Display for FilterEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterEffect::HueRotate(deg) => write!(f, "hue-rotate({}deg)", deg),
            FilterEffect::Grayscale(a)
            | FilterEffect::Sepia(a)
            | FilterEffect::Brightness(a)
            | FilterEffect::Saturate(a)
            | FilterEffect::Contrast(a)
            | FilterEffect::Opacity(a) => {
                write!(f, "{}({}%)", self.function_name(), (a * 100.0).round())
            }
        }
    }
}

/// `50%` or `0.5`.
fn parse_amount(arg: &str) -> Option<f32> {
    match arg.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok().map(|v| v / 100.0),
        None => arg.parse::<f32>().ok(),
    }
    .filter(|v| v.is_finite())
}

/// `90deg`, `0.25turn`, `1.5rad` or a bare `0`.
fn parse_angle(arg: &str) -> Option<f32> {
    let value = if let Some(v) = arg.strip_suffix("deg") {
        v.trim().parse::<f32>().ok()
    } else if let Some(v) = arg.strip_suffix("turn") {
        v.trim().parse::<f32>().ok().map(|t| t * 360.0)
    } else if let Some(v) = arg.strip_suffix("rad") {
        v.trim().parse::<f32>().ok().map(f32::to_degrees)
    } else {
        arg.parse::<f32>().ok().filter(|v| *v == 0.0)
    };
    value.filter(|v| v.is_finite())
}

/// A named, ordered filter chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFilter {
    pub name: String,
    pub chain: Vec<FilterEffect>,
}

impl ColorFilter {
    pub fn new(name: impl Into<String>, chain: Vec<FilterEffect>) -> Self {
        Self {
            name: name.into(),
            chain,
        }
    }

    /// The pass-through filter.
    pub fn normal() -> Self {
        Self::new("Normal", Vec::new())
    }

    /// Parse a whitespace-separated chain of filter functions.
    /// `none` and the empty string produce an empty chain.
    pub fn parse(name: impl Into<String>, chain: &str) -> BoothResult<Self> {
        let chain = chain.trim();
        if chain.is_empty() || chain.eq_ignore_ascii_case("none") {
            return Ok(Self::new(name, Vec::new()));
        }

        let mut effects = Vec::new();
        let mut rest = chain;
        while !rest.is_empty() {
            let close = rest
                .find(')')
                .ok_or_else(|| BoothError::validation(format!("unterminated filter: {rest:?}")))?;
            effects.push(FilterEffect::parse(&rest[..=close])?);
            rest = rest[close + 1..].trim_start();
        }
        Ok(Self::new(name, effects))
    }

    /// The chain in CSS syntax, `none` when empty.
    pub fn css(&self) -> String {
        if self.chain.is_empty() {
            return "none".to_string();
        }
        self.chain
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether every effect in the chain is a no-op.
    pub fn is_identity(&self) -> bool {
        self.chain.iter().all(FilterEffect::is_identity)
    }
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self::normal()
    }
}

/// The filter catalog.
pub fn filters() -> Vec<ColorFilter> {
    use FilterEffect::*;
    vec![
        ColorFilter::normal(),
        ColorFilter::new("B&W", vec![Grayscale(1.0), Contrast(1.25)]),
        ColorFilter::new("Sepia", vec![Sepia(1.0), Contrast(1.1)]),
        ColorFilter::new(
            "Warm",
            vec![Sepia(0.3), Contrast(1.0), Brightness(1.1), Saturate(1.5)],
        ),
        ColorFilter::new("Cool", vec![HueRotate(180.0), Sepia(0.2), Opacity(0.9)]),
        ColorFilter::new(
            "Vintage",
            vec![Contrast(1.25), Sepia(0.4), Brightness(0.9), HueRotate(-10.0)],
        ),
    ]
}

/// Look up a catalog filter by name, ignoring case.
pub fn filter_by_name(name: &str) -> BoothResult<ColorFilter> {
    let catalog = filters();
    let names: Vec<String> = catalog.iter().map(|f| f.name.clone()).collect();
    catalog
        .into_iter()
        .find(|filter| filter.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            BoothError::validation(format!(
                "unknown filter {name:?} (expected one of: {})",
                names.join(", ")
            ))
        })
}

//! Scale functions for data-to-visual mappings.
//!
//! Position scales carry a per-axis [`AxisTransform`] applied to every layer,
//! and [`LinearScale`] maps transformed data space onto pixels. Categorical
//! palettes live in [`crate::grammar::DiscreteScale`].
//! Based on the Grammar of Graphics [Wilkinson 2005].

use std::fmt;

use crate::error::{PlotError, PlotResult};

/// Trait for scale functions that map domain values to range values.
pub trait Scale<D, R> {
    /// Transform a domain value to a range value.
    fn scale(&self, value: D) -> R;

    /// Get the domain extent.
    fn domain(&self) -> (D, D);

    /// Get the range extent.
    fn range(&self) -> (R, R);
}

/// Linear scale for continuous-to-continuous mapping.
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    domain_min: f64,
    domain_max: f64,
    range_min: f64,
    range_max: f64,
}

impl LinearScale {
    /// Create a new linear scale.
    ///
    /// # Errors
    ///
    /// Returns an error if domain_min equals domain_max.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> PlotResult<Self> {
        if (domain.0 - domain.1).abs() < f64::EPSILON {
            return Err(PlotError::ScaleDomain("Domain min and max cannot be equal".to_string()));
        }

        Ok(Self { domain_min: domain.0, domain_max: domain.1, range_min: range.0, range_max: range.1 })
    }

    /// Invert the scale (range to domain).
    #[must_use]
    pub fn invert(&self, value: f64) -> f64 {
        let t = (value - self.range_min) / (self.range_max - self.range_min);
        self.domain_min + t * (self.domain_max - self.domain_min)
    }
}

impl Scale<f64, f64> for LinearScale {
    fn scale(&self, value: f64) -> f64 {
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_min + t * (self.range_max - self.range_min)
    }

    fn domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }
}

/// A positional axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Coordinate transform applied to raw values before placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AxisTransform {
    /// Values are placed as-is.
    #[default]
    Identity,
    /// `x' = -x`: larger raw values render further left (x) or down (y).
    Reverse,
}

impl AxisTransform {
    /// Map a raw value into transformed space.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            AxisTransform::Identity => value,
            AxisTransform::Reverse => -value,
        }
    }

    /// Map a transformed value back to raw data space.
    #[must_use]
    pub fn inverse(self, value: f64) -> f64 {
        // Both transforms are involutions.
        self.apply(value)
    }
}

impl fmt::Display for AxisTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisTransform::Identity => "identity",
            AxisTransform::Reverse => "reverse",
        })
    }
}

/// Continuous position scale declaration for one axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionScale {
    /// Transform applied to every layer on this axis.
    pub transform: AxisTransform,
    /// Axis title; defaults to the bound field name.
    pub name: Option<String>,
}

impl PositionScale {
    /// Identity scale.
    #[must_use]
    pub fn continuous() -> Self {
        Self::default()
    }

    /// Reversed scale.
    #[must_use]
    pub fn reverse() -> Self {
        Self { transform: AxisTransform::Reverse, name: None }
    }

    /// Set the axis title.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// A tick mark on an axis guide.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tick {
    /// Position in transformed space.
    pub position: f64,
    /// Raw data value the tick stands for.
    pub value: f64,
    /// Formatted raw value.
    pub label: String,
}

/// Round-number breaks covering `[min, max]`, roughly `target` of them.
#[must_use]
pub fn pretty_breaks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max <= min || target == 0 {
        return Vec::new();
    }
    let step = nice_step((max - min) / target as f64);
    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;

    (first..=last).map(|i| i as f64 * step).collect()
}

/// Nearest 1-2-5 step at or above `raw` magnitude.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized < 1.5 {
        1.0
    } else if normalized < 3.0 {
        2.0
    } else if normalized < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Ticks for an axis whose visible range is `[lo, hi]` in transformed space.
///
/// Breaks are chosen on the raw values so labels stay round numbers, then
/// placed through the transform: on a reversed axis, larger labels sit at
/// smaller positions.
#[must_use]
pub fn axis_ticks(lo: f64, hi: f64, transform: AxisTransform, target: usize) -> Vec<Tick> {
    let (a, b) = (transform.inverse(lo), transform.inverse(hi));
    let (raw_min, raw_max) = if a <= b { (a, b) } else { (b, a) };
    let breaks = pretty_breaks(raw_min, raw_max, target);
    let decimals = breaks
        .windows(2)
        .next()
        .map_or(0, |w| (-(w[1] - w[0]).log10().floor()).max(0.0) as usize);

    let mut ticks: Vec<Tick> = breaks
        .into_iter()
        .map(|value| Tick {
            position: transform.apply(value),
            value,
            label: format_tick(value, decimals),
        })
        .collect();
    ticks.sort_by(|l, r| l.position.total_cmp(&r.position));
    ticks
}

fn format_tick(value: f64, decimals: usize) -> String {
    // Avoid "-0" labels.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

//! Categorical scales: value to color / shape assignment and legend breaks.
//!
//! Assignment always follows the canonical level order of a channel, so a
//! value keeps its encoding no matter which legend `breaks` are requested.

use tracing::warn;

use crate::color::{Hcl, Rgba};
use crate::error::PlotError;

use super::aes::Channel;
use super::geom::PointShape;

/// A visual encoding of one categorical value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Encoding {
    /// A color (color or fill channel).
    Color(Rgba),
    /// A marker shape (shape channel).
    Shape(PointShape),
}

/// Manually supplied palette values.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteValues {
    /// Colors for the color or fill channel.
    Colors(Vec<Rgba>),
    /// Shapes for the shape channel.
    Shapes(Vec<PointShape>),
}

/// Discrete scale declaration for one categorical channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteScale {
    /// Channel this scale controls.
    pub channel: Channel,
    /// Legend title; defaults to the field name.
    pub name: Option<String>,
    /// Legend entries to show, in display order.
    pub breaks: Option<Vec<String>>,
    /// Manual palette; defaults to the hue palette or the shape wheel.
    pub values: Option<PaletteValues>,
}

impl DiscreteScale {
    /// Create a scale for a channel.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self { channel, name: None, breaks: None, values: None }
    }

    /// Discrete color scale.
    #[must_use]
    pub fn color() -> Self {
        Self::new(Channel::Color)
    }

    /// Discrete fill scale.
    #[must_use]
    pub fn fill() -> Self {
        Self::new(Channel::Fill)
    }

    /// Discrete shape scale.
    #[must_use]
    pub fn shape() -> Self {
        Self::new(Channel::Shape)
    }

    /// Set the legend title.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Restrict and reorder legend entries. Does not change assignment.
    #[must_use]
    pub fn breaks<I, S>(mut self, breaks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breaks = Some(breaks.into_iter().map(Into::into).collect());
        self
    }

    /// Supply colors, assigned in canonical level order.
    #[must_use]
    pub fn manual_colors(mut self, colors: Vec<Rgba>) -> Self {
        self.values = Some(PaletteValues::Colors(colors));
        self
    }

    /// Supply shapes, assigned in canonical level order.
    #[must_use]
    pub fn manual_shapes(mut self, shapes: Vec<PointShape>) -> Self {
        self.values = Some(PaletteValues::Shapes(shapes));
        self
    }
}

/// Evenly spaced HCL hues starting at 15°, chroma 100, luminance 65.
#[must_use]
pub fn hue_palette(n: usize) -> Vec<Rgba> {
    (0..n)
        .map(|i| Hcl::new((15.0 + 360.0 * i as f64 / n as f64) % 360.0, 100.0, 65.0).to_rgba())
        .collect()
}

/// Shapes from the default wheel, wrapping after six.
#[must_use]
pub fn shape_palette(n: usize) -> Vec<PointShape> {
    if n > PointShape::WHEEL.len() {
        warn!(levels = n, "more categories than distinct shapes; shapes repeat");
    }
    PointShape::WHEEL.iter().copied().cycle().take(n).collect()
}

/// Deterministic value-to-encoding map of one channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PaletteAssignment {
    channel: Channel,
    levels: Vec<String>,
    encodings: Vec<Encoding>,
}

impl PaletteAssignment {
    /// Assign encodings to `levels` (canonical order) using `scale`'s manual values if any.
    #[must_use]
    pub fn build(channel: Channel, levels: Vec<String>, scale: Option<&DiscreteScale>) -> Self {
        let n = levels.len();
        let manual = scale.and_then(|s| s.values.as_ref());
        let encodings: Vec<Encoding> = match (channel, manual) {
            (Channel::Shape, Some(PaletteValues::Shapes(shapes))) if !shapes.is_empty() => {
                cycle_manual(channel, shapes, n).into_iter().map(Encoding::Shape).collect()
            }
            (Channel::Shape, _) => shape_palette(n).into_iter().map(Encoding::Shape).collect(),
            (_, Some(PaletteValues::Colors(colors))) if !colors.is_empty() => {
                cycle_manual(channel, colors, n).into_iter().map(Encoding::Color).collect()
            }
            _ => hue_palette(n).into_iter().map(Encoding::Color).collect(),
        };
        Self { channel, levels, encodings }
    }

    /// Channel this assignment serves.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Levels in canonical order.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Encoding of a value.
    #[must_use]
    pub fn encoding(&self, value: &str) -> Option<Encoding> {
        self.levels.iter().position(|l| l == value).map(|i| self.encodings[i])
    }

    /// Color of a value; mid grey for values outside the palette.
    #[must_use]
    pub fn color(&self, value: &str) -> Rgba {
        match self.encoding(value) {
            Some(Encoding::Color(c)) => c,
            _ => Rgba::GREY50,
        }
    }

    /// Shape of a value; circle for values outside the palette.
    #[must_use]
    pub fn shape(&self, value: &str) -> PointShape {
        match self.encoding(value) {
            Some(Encoding::Shape(s)) => s,
            _ => PointShape::default(),
        }
    }

    /// `(value, encoding)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Encoding)> {
        self.levels.iter().map(String::as_str).zip(self.encodings.iter().copied())
    }
}

fn cycle_manual<T: Copy>(channel: Channel, values: &[T], n: usize) -> Vec<T> {
    if values.len() < n {
        warn!(%channel, supplied = values.len(), levels = n, "manual palette too short; values repeat");
    }
    values.iter().copied().cycle().take(n).collect()
}

/// Legend order for `known` values under optional `breaks`.
///
/// Without breaks every known value is listed in the given order. With breaks,
/// only listed known values are kept, in break order; unknown breaks are
/// dropped and reported as [`PlotError::UnknownCategory`] warnings.
#[must_use]
pub fn apply_breaks(
    channel: Channel,
    known: &[String],
    breaks: Option<&[String]>,
) -> (Vec<String>, Vec<PlotError>) {
    let Some(breaks) = breaks else {
        return (known.to_vec(), Vec::new());
    };
    let mut shown: Vec<String> = Vec::new();
    let mut unknown = Vec::new();
    for b in breaks {
        if !known.contains(b) {
            warn!(%channel, value = %b, "legend break matches no category");
            unknown.push(PlotError::UnknownCategory { channel, value: b.clone() });
        } else if !shown.contains(b) {
            shown.push(b.clone());
        }
    }
    (shown, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hue_palette_reference_colors() {
        let p = hue_palette(3);
        assert_eq!(p[0].to_hex(), "#F8766D");
        assert_eq!(p[1].to_hex(), "#00BA38");
        assert_eq!(p[2].to_hex(), "#619CFF");
        assert!(hue_palette(0).is_empty());
    }

    #[test]
    fn test_hue_palette_distinct() {
        let p = hue_palette(10);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_shape_palette_wraps() {
        let s = shape_palette(8);
        assert_eq!(s[0], PointShape::Circle);
        assert_eq!(s[6], PointShape::Circle);
        assert_eq!(s[7], PointShape::Triangle);
    }

    #[test]
    fn test_assignment_follows_levels() {
        let a = PaletteAssignment::build(Channel::Color, levels(&["i", "e", "a"]), None);
        assert_eq!(a.color("i").to_hex(), "#F8766D");
        assert_eq!(a.color("a").to_hex(), "#619CFF");
        assert_eq!(a.color("zz"), Rgba::GREY50);
        assert_eq!(a.encoding("zz"), None);
        assert_eq!(a.iter().count(), 3);
        assert_eq!(a.channel(), Channel::Color);
    }

    #[test]
    fn test_breaks_do_not_change_assignment() {
        let lv = levels(&["A", "B", "C"]);
        let plain = PaletteAssignment::build(Channel::Color, lv.clone(), None);
        let scale = DiscreteScale::color().breaks(["C", "A"]);
        let with_breaks = PaletteAssignment::build(Channel::Color, lv, Some(&scale));
        assert_eq!(plain, with_breaks);
    }

    #[test]
    fn test_manual_colors_cycle() {
        let scale = DiscreteScale::fill().manual_colors(vec![Rgba::RED, Rgba::BLUE]);
        let a = PaletteAssignment::build(Channel::Fill, levels(&["x", "y", "z"]), Some(&scale));
        assert_eq!(a.color("x"), Rgba::RED);
        assert_eq!(a.color("y"), Rgba::BLUE);
        assert_eq!(a.color("z"), Rgba::RED);
    }

    #[test]
    fn test_manual_values_of_wrong_kind_fall_back() {
        let scale = DiscreteScale::shape().manual_colors(vec![Rgba::RED]);
        let a = PaletteAssignment::build(Channel::Shape, levels(&["x", "y"]), Some(&scale));
        assert_eq!(a.shape("y"), PointShape::Triangle);

        let scale = DiscreteScale::shape().manual_shapes(vec![PointShape::X]);
        let a = PaletteAssignment::build(Channel::Shape, levels(&["x", "y"]), Some(&scale));
        assert_eq!(a.shape("y"), PointShape::X);
    }

    #[test]
    fn test_apply_breaks() {
        let known = levels(&["A", "B", "C"]);
        let (shown, issues) = apply_breaks(Channel::Color, &known, None);
        assert_eq!(shown, known);
        assert!(issues.is_empty());

        let breaks = levels(&["C", "Z", "A", "C"]);
        let (shown, issues) = apply_breaks(Channel::Color, &known, Some(&breaks));
        assert_eq!(shown, levels(&["C", "A"]));
        assert_eq!(
            issues,
            vec![PlotError::UnknownCategory { channel: Channel::Color, value: "Z".into() }]
        );
    }

    #[test]
    fn test_scale_builders() {
        let s = DiscreteScale::color().name("Vowel").breaks(vec!["a".to_string()]);
        assert_eq!(s.channel, Channel::Color);
        assert_eq!(s.name.as_deref(), Some("Vowel"));
        assert_eq!(s.breaks, Some(vec!["a".to_string()]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn levels_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{1,3}", 1..15).prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        /// Breaks change legend order only, never the value to encoding map.
        #[test]
        fn prop_breaks_leave_assignment_alone(
            levels in levels_strategy(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
        ) {
            let breaks: Vec<String> = picks.iter().map(|i| i.get(&levels).clone()).collect();
            let plain = PaletteAssignment::build(Channel::Color, levels.clone(), None);
            let scale = DiscreteScale::color().breaks(breaks.clone());
            let ordered = PaletteAssignment::build(Channel::Color, levels.clone(), Some(&scale));
            prop_assert_eq!(&plain, &ordered);

            let (shown, unknown) = apply_breaks(Channel::Color, &levels, Some(&breaks));
            prop_assert!(unknown.is_empty());
            prop_assert!(shown.iter().all(|v| breaks.contains(v)));
            let mut dedup = shown.clone();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), shown.len());
        }

        /// Distinct levels receive distinct hues.
        #[test]
        fn prop_hue_palette_distinct(n in 1usize..20) {
            let palette = hue_palette(n);
            prop_assert_eq!(palette.len(), n);
            for (i, a) in palette.iter().enumerate() {
                prop_assert!(palette[i + 1..].iter().all(|b| b != a));
            }
        }
    }
}

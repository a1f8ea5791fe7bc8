//! Aesthetic mappings for Grammar of Graphics.
//!
//! Maps data fields (or constants) to visual channels. A layer's mapping is
//! resolved against the plot-wide mapping: a channel the layer binds
//! overrides the global binding, an unbound one inherits it.

use std::fmt;

use crate::color::Rgba;
use crate::error::{PlotError, PlotResult};

use super::geom::{GeomKind, PointShape};

/// A visual channel a field can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Channel {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Outline / marker / text color.
    Color,
    /// Interior color.
    Fill,
    /// Point marker shape.
    Shape,
    /// Text content.
    Label,
}

impl Channel {
    /// Every channel, in resolution order.
    pub const ALL: [Channel; 6] =
        [Channel::X, Channel::Y, Channel::Color, Channel::Fill, Channel::Shape, Channel::Label];

    /// Channels that take a categorical palette.
    pub const DISCRETE: [Channel; 3] = [Channel::Color, Channel::Fill, Channel::Shape];

    /// Lowercase channel name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Fill => "fill",
            Channel::Shape => "shape",
            Channel::Label => "label",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed value bound to a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Numeric constant (positions).
    Number(f64),
    /// Text constant (labels).
    Text(String),
    /// Fixed color.
    Color(Rgba),
    /// Fixed marker shape.
    Shape(PointShape),
}

/// What a channel is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum AesValue {
    /// A data field, looked up per record.
    Field(String),
    /// The same value for every record.
    Constant(Constant),
}

impl AesValue {
    /// The field name if this binding is data-mapped.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            AesValue::Field(f) => Some(f.as_str()),
            AesValue::Constant(_) => None,
        }
    }
}

/// Aesthetic mapping specification.
///
/// Each channel is either unbound (`None`) or bound to a field or constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aes {
    /// X position binding.
    pub x: Option<AesValue>,
    /// Y position binding.
    pub y: Option<AesValue>,
    /// Color binding.
    pub color: Option<AesValue>,
    /// Fill binding.
    pub fill: Option<AesValue>,
    /// Shape binding.
    pub shape: Option<AesValue>,
    /// Label binding.
    pub label: Option<AesValue>,
}

impl Aes {
    /// Create a new aesthetic mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(mut self, channel: Channel, value: AesValue) -> Self {
        *self.slot_mut(channel) = Some(value);
        self
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<AesValue> {
        match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Color => &mut self.color,
            Channel::Fill => &mut self.fill,
            Channel::Shape => &mut self.shape,
            Channel::Label => &mut self.label,
        }
    }

    /// The binding of a channel, if any.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&AesValue> {
        match channel {
            Channel::X => self.x.as_ref(),
            Channel::Y => self.y.as_ref(),
            Channel::Color => self.color.as_ref(),
            Channel::Fill => self.fill.as_ref(),
            Channel::Shape => self.shape.as_ref(),
            Channel::Label => self.label.as_ref(),
        }
    }

    /// How this mapping treats a channel when used as a layer mapping.
    #[must_use]
    pub fn source(&self, channel: Channel) -> BindingSource<'_> {
        match self.get(channel) {
            Some(value) => BindingSource::Overridden(value),
            None => BindingSource::Inherited,
        }
    }

    /// Map x position to a field.
    #[must_use]
    pub fn x(self, field: &str) -> Self {
        self.bind(Channel::X, AesValue::Field(field.to_string()))
    }

    /// Map y position to a field.
    #[must_use]
    pub fn y(self, field: &str) -> Self {
        self.bind(Channel::Y, AesValue::Field(field.to_string()))
    }

    /// Map color to a field.
    #[must_use]
    pub fn color(self, field: &str) -> Self {
        self.bind(Channel::Color, AesValue::Field(field.to_string()))
    }

    /// Map fill to a field.
    #[must_use]
    pub fn fill(self, field: &str) -> Self {
        self.bind(Channel::Fill, AesValue::Field(field.to_string()))
    }

    /// Map shape to a field.
    #[must_use]
    pub fn shape(self, field: &str) -> Self {
        self.bind(Channel::Shape, AesValue::Field(field.to_string()))
    }

    /// Map label to a field.
    #[must_use]
    pub fn label(self, field: &str) -> Self {
        self.bind(Channel::Label, AesValue::Field(field.to_string()))
    }

    /// Fix x position.
    #[must_use]
    pub fn x_value(self, x: f64) -> Self {
        self.bind(Channel::X, AesValue::Constant(Constant::Number(x)))
    }

    /// Fix y position.
    #[must_use]
    pub fn y_value(self, y: f64) -> Self {
        self.bind(Channel::Y, AesValue::Constant(Constant::Number(y)))
    }

    /// Set a fixed color value.
    #[must_use]
    pub fn color_value(self, color: Rgba) -> Self {
        self.bind(Channel::Color, AesValue::Constant(Constant::Color(color)))
    }

    /// Set a fixed fill value.
    #[must_use]
    pub fn fill_value(self, color: Rgba) -> Self {
        self.bind(Channel::Fill, AesValue::Constant(Constant::Color(color)))
    }

    /// Set a fixed marker shape.
    #[must_use]
    pub fn shape_value(self, shape: PointShape) -> Self {
        self.bind(Channel::Shape, AesValue::Constant(Constant::Shape(shape)))
    }

    /// Set a fixed label text.
    #[must_use]
    pub fn label_value(self, text: &str) -> Self {
        self.bind(Channel::Label, AesValue::Constant(Constant::Text(text.to_string())))
    }

    /// Merge another Aes, with other taking precedence.
    #[must_use]
    pub fn merge(&self, other: &Aes) -> Aes {
        let mut merged = self.clone();
        for channel in Channel::ALL {
            if let Some(value) = other.get(channel) {
                *merged.slot_mut(channel) = Some(value.clone());
            }
        }
        merged
    }
}

/// A layer's per-channel intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingSource<'a> {
    /// Use the plot-wide binding.
    Inherited,
    /// Replace the plot-wide binding.
    Overridden(&'a AesValue),
}

/// Where a resolved binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Provenance {
    /// Plot-wide mapping.
    Global,
    /// The layer's own mapping.
    Layer,
}

/// A single channel binding after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    /// Bound channel.
    pub channel: Channel,
    /// Field or constant.
    pub value: AesValue,
    /// Origin of the binding.
    pub provenance: Provenance,
}

/// The effective mapping of one layer: every bound channel, in [`Channel::ALL`] order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedAes {
    bindings: Vec<ResolvedBinding>,
}

impl ResolvedAes {
    /// The resolved binding for a channel.
    #[must_use]
    pub fn binding(&self, channel: Channel) -> Option<&ResolvedBinding> {
        self.bindings.iter().find(|b| b.channel == channel)
    }

    /// The value bound to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&AesValue> {
        self.binding(channel).map(|b| &b.value)
    }

    /// The field bound to a channel, if data-mapped.
    #[must_use]
    pub fn field(&self, channel: Channel) -> Option<&str> {
        self.get(channel).and_then(AesValue::field)
    }

    /// All bindings.
    #[must_use]
    pub fn bindings(&self) -> &[ResolvedBinding] {
        &self.bindings
    }
}

/// Resolve a layer's mapping against the plot-wide one.
///
/// Per channel the layer binding wins when present; otherwise the global one
/// is inherited. Channels bound by neither stay unbound, which is only an
/// error if `geom` requires them.
///
/// # Errors
///
/// Returns [`PlotError::UnresolvedChannel`] naming `layer_index` and the first
/// required channel that neither mapping binds.
pub fn resolve_aes(
    global: &Aes,
    layer: &Aes,
    geom: GeomKind,
    layer_index: usize,
) -> PlotResult<ResolvedAes> {
    let mut bindings = Vec::new();
    for channel in Channel::ALL {
        let resolved = match layer.source(channel) {
            BindingSource::Overridden(value) => Some((value, Provenance::Layer)),
            BindingSource::Inherited => global.get(channel).map(|v| (v, Provenance::Global)),
        };
        match resolved {
            Some((value, provenance)) => {
                bindings.push(ResolvedBinding { channel, value: value.clone(), provenance });
            }
            None if geom.required_channels().contains(&channel) => {
                return Err(PlotError::UnresolvedChannel { layer: layer_index, channel, geom });
            }
            None => {}
        }
    }
    Ok(ResolvedAes { bindings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> AesValue {
        AesValue::Field(name.to_string())
    }

    #[test]
    fn test_aes_builder() {
        let aes = Aes::new().x("F2").y("F1").color("vowel").shape_value(PointShape::Square);

        assert_eq!(aes.x, Some(field("F2")));
        assert_eq!(aes.y, Some(field("F1")));
        assert_eq!(aes.color, Some(field("vowel")));
        assert_eq!(aes.shape, Some(AesValue::Constant(Constant::Shape(PointShape::Square))));
        assert!(aes.fill.is_none());
    }

    #[test]
    fn test_aes_merge() {
        let base = Aes::new().x("x").y("y").color_value(Rgba::RED);
        let override_aes = Aes::new().y("y2").label("word");

        let merged = base.merge(&override_aes);
        assert_eq!(merged.x, Some(field("x")));
        assert_eq!(merged.y, Some(field("y2")));
        assert_eq!(merged.color, Some(AesValue::Constant(Constant::Color(Rgba::RED))));
        assert_eq!(merged.label, Some(field("word")));
    }

    #[test]
    fn test_source() {
        let aes = Aes::new().color("vowel");
        assert_eq!(aes.source(Channel::X), BindingSource::Inherited);
        assert_eq!(aes.source(Channel::Color), BindingSource::Overridden(&field("vowel")));
    }

    #[test]
    fn test_resolve_inherits_and_overrides() {
        let global = Aes::new().x("F2").y("F1").color("vowel");
        let layer = Aes::new().label("word").color_value(Rgba::BLACK);

        let resolved = resolve_aes(&global, &layer, GeomKind::Label, 1).unwrap();
        assert_eq!(resolved.field(Channel::X), Some("F2"));
        assert_eq!(resolved.binding(Channel::X).unwrap().provenance, Provenance::Global);
        assert_eq!(resolved.field(Channel::Label), Some("word"));
        assert_eq!(resolved.binding(Channel::Label).unwrap().provenance, Provenance::Layer);
        // Layer constant shadows the global field.
        assert_eq!(resolved.field(Channel::Color), None);
        assert_eq!(
            resolved.get(Channel::Color),
            Some(&AesValue::Constant(Constant::Color(Rgba::BLACK)))
        );
        assert!(resolved.get(Channel::Fill).is_none());
    }

    #[test]
    fn test_resolve_order_follows_channels() {
        let global = Aes::new().label("w").y("F1").x("F2");
        let resolved = resolve_aes(&global, &Aes::new(), GeomKind::Text, 0).unwrap();
        let channels: Vec<Channel> = resolved.bindings().iter().map(|b| b.channel).collect();
        assert_eq!(channels, vec![Channel::X, Channel::Y, Channel::Label]);
    }

    #[test]
    fn test_resolve_missing_label_for_text() {
        let global = Aes::new().x("F2").y("F1");
        let err = resolve_aes(&global, &Aes::new(), GeomKind::Text, 3).unwrap_err();
        assert_eq!(
            err,
            PlotError::UnresolvedChannel { layer: 3, channel: Channel::Label, geom: GeomKind::Text }
        );
    }

    #[test]
    fn test_resolve_missing_position() {
        let err = resolve_aes(&Aes::new().x("F2"), &Aes::new(), GeomKind::Point, 0).unwrap_err();
        assert_eq!(
            err,
            PlotError::UnresolvedChannel { layer: 0, channel: Channel::Y, geom: GeomKind::Point }
        );
    }

    #[test]
    fn test_point_does_not_need_label() {
        let global = Aes::new().x("F2").y("F1");
        assert!(resolve_aes(&global, &Aes::new(), GeomKind::Point, 0).is_ok());
        assert!(resolve_aes(&global, &Aes::new(), GeomKind::Polygon, 0).is_ok());
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Color.to_string(), "color");
        assert_eq!(Channel::ALL.len(), 6);
        assert!(!Channel::DISCRETE.contains(&Channel::Label));
    }
}

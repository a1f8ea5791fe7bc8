//! Geometry types for Grammar of Graphics.
//!
//! Defines visual representations of data.

use std::fmt;

use super::aes::{Aes, Channel};

/// Shape types for point geometries, in palette wheel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointShape {
    /// Filled circle.
    #[default]
    Circle,
    /// Filled triangle.
    Triangle,
    /// Filled square.
    Square,
    /// Cross (+).
    Cross,
    /// Diamond shape.
    Diamond,
    /// X shape.
    X,
}

impl PointShape {
    /// All shapes in the order the default shape palette hands them out.
    pub const WHEEL: [PointShape; 6] = [
        PointShape::Circle,
        PointShape::Triangle,
        PointShape::Square,
        PointShape::Cross,
        PointShape::Diamond,
        PointShape::X,
    ];

    /// Lowercase shape name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PointShape::Circle => "circle",
            PointShape::Triangle => "triangle",
            PointShape::Square => "square",
            PointShape::Cross => "cross",
            PointShape::Diamond => "diamond",
            PointShape::X => "x",
        }
    }
}

/// Kind of visual mark a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GeomKind {
    /// One marker per record.
    Point,
    /// Bare text anchored at each record.
    Text,
    /// Text inside a filled, bordered box.
    Label,
    /// Closed filled polygon per group.
    Polygon,
}

impl GeomKind {
    /// Channels that must resolve for this geometry to draw.
    #[must_use]
    pub fn required_channels(self) -> &'static [Channel] {
        match self {
            GeomKind::Point | GeomKind::Polygon => &[Channel::X, Channel::Y],
            GeomKind::Text | GeomKind::Label => &[Channel::X, Channel::Y, Channel::Label],
        }
    }
}

impl fmt::Display for GeomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeomKind::Point => "point",
            GeomKind::Text => "text",
            GeomKind::Label => "label",
            GeomKind::Polygon => "polygon",
        })
    }
}

/// Fixed (unmapped) drawing parameters of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Style {
    /// Marker diameter or font size in pixels.
    pub size: f64,
    /// Opacity applied to the mapped color (fill for polygons).
    pub alpha: f32,
    /// Outline width in pixels.
    pub stroke_width: f64,
    /// Padding between label text and its box in pixels.
    pub label_padding: f64,
}

impl Style {
    fn for_kind(kind: GeomKind) -> Self {
        let size = match kind {
            GeomKind::Point => 6.0,
            GeomKind::Text | GeomKind::Label => 12.0,
            GeomKind::Polygon => 0.0,
        };
        Self { size, alpha: 1.0, stroke_width: 1.0, label_padding: 3.0 }
    }
}

/// A geometry: its kind, optional layer-specific aesthetics and style.
#[derive(Debug, Clone, PartialEq)]
pub struct Geom {
    /// The geometry kind.
    pub kind: GeomKind,
    /// Layer-specific aesthetics.
    pub aes: Option<Aes>,
    /// Fixed drawing parameters.
    pub style: Style,
}

impl Geom {
    fn of(kind: GeomKind) -> Self {
        Self { kind, aes: None, style: Style::for_kind(kind) }
    }

    /// Create a point geometry.
    #[must_use]
    pub fn point() -> Self {
        Self::of(GeomKind::Point)
    }

    /// Create a text geometry.
    #[must_use]
    pub fn text() -> Self {
        Self::of(GeomKind::Text)
    }

    /// Create a boxed label geometry.
    #[must_use]
    pub fn label() -> Self {
        Self::of(GeomKind::Label)
    }

    /// Create a polygon geometry.
    #[must_use]
    pub fn polygon() -> Self {
        Self::of(GeomKind::Polygon)
    }

    /// Set layer-specific aesthetics.
    #[must_use]
    pub fn aes(mut self, aes: Aes) -> Self {
        self.aes = Some(aes);
        self
    }

    /// Set marker diameter or font size.
    #[must_use]
    pub fn size(mut self, size: f64) -> Self {
        self.style.size = size.max(0.0);
        self
    }

    /// Set opacity.
    #[must_use]
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.style.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Set outline width.
    #[must_use]
    pub fn stroke_width(mut self, width: f64) -> Self {
        self.style.stroke_width = width.max(0.0);
        self
    }

    /// Set label box padding.
    #[must_use]
    pub fn label_padding(mut self, padding: f64) -> Self {
        self.style.label_padding = padding.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geom_constructors() {
        assert_eq!(Geom::point().kind, GeomKind::Point);
        assert_eq!(Geom::text().kind, GeomKind::Text);
        assert_eq!(Geom::label().kind, GeomKind::Label);
        assert_eq!(Geom::polygon().kind, GeomKind::Polygon);
        assert!(Geom::point().aes.is_none());
    }

    #[test]
    fn test_required_channels() {
        assert_eq!(GeomKind::Point.required_channels(), &[Channel::X, Channel::Y]);
        assert!(GeomKind::Label.required_channels().contains(&Channel::Label));
        assert!(!GeomKind::Polygon.required_channels().contains(&Channel::Label));
    }

    #[test]
    fn test_style_builders_clamp() {
        let g = Geom::polygon().alpha(1.5).stroke_width(-2.0).size(3.0).label_padding(4.0);
        assert_eq!(g.style.alpha, 1.0);
        assert_eq!(g.style.stroke_width, 0.0);
        assert_eq!(g.style.size, 3.0);
        assert_eq!(g.style.label_padding, 4.0);
    }

    #[test]
    fn test_default_sizes() {
        assert_eq!(Geom::point().style.size, 6.0);
        assert_eq!(Geom::text().style.size, 12.0);
    }

    #[test]
    fn test_display_and_names() {
        assert_eq!(GeomKind::Polygon.to_string(), "polygon");
        assert_eq!(PointShape::Triangle.name(), "triangle");
        assert_eq!(PointShape::WHEEL.len(), 6);
        assert_eq!(PointShape::default(), PointShape::Circle);
    }
}

//! Layer composition into a backend-neutral render plan.
//!
//! Composition runs in three passes over the layers, always in declaration
//! order:
//!
//! 1. resolve every layer's aesthetics and extract its (transformed) positions;
//! 2. build one palette per categorical channel from all resolved layers;
//! 3. emit draw primitives, then the legend and axis guides.
//!
//! A layer that fails to resolve is left out of the plan and reported as a
//! [`Diagnostic`]; the rest of the plot still composes.

use tracing::{debug, warn};

use crate::color::Rgba;
use crate::error::{PlotError, PlotResult};
use crate::geometry::{Bounds, Point};
use crate::scale::{axis_ticks, Axis, AxisTransform, Tick};

use super::aes::{resolve_aes, AesValue, Channel, Constant, ResolvedAes};
use super::data::{first_encountered, Dataset};
use super::geom::{GeomKind, PointShape};
use super::ggplot::{BuiltGGPlot, Layer};
use super::palette::{apply_breaks, PaletteAssignment};
use super::theme::{LegendPosition, Theme};

/// Fraction of the data span added on each side of an axis.
const AXIS_EXPANSION: f64 = 0.05;

/// Approximate number of ticks per axis.
const TARGET_TICKS: usize = 5;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    /// The plan is complete; something looked off.
    Warning,
    /// Part of the plot (a layer or a group) was left out.
    Error,
}

/// A problem found while composing, attached to the plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// Layer the problem belongs to, if any.
    pub layer: Option<usize>,
    /// Severity, derived from the error kind.
    pub severity: Severity,
    /// The underlying error.
    pub error: PlotError,
}

impl Diagnostic {
    /// Wrap an error, classifying its severity.
    #[must_use]
    pub fn new(layer: Option<usize>, error: PlotError) -> Self {
        let severity = if error.is_warning() { Severity::Warning } else { Severity::Error };
        Self { layer, severity, error }
    }
}

/// Box drawn behind label text.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LabelBox {
    /// Box fill.
    pub fill: Rgba,
    /// Box border.
    pub border: Rgba,
    /// Padding between text and border in pixels.
    pub padding: f64,
}

/// One backend-neutral draw instruction, positioned in transformed data space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DrawPrimitive {
    /// A point marker.
    Point {
        /// Index of the emitting layer.
        layer: usize,
        /// Marker center.
        position: Point,
        /// Marker shape.
        shape: PointShape,
        /// Marker color.
        color: Rgba,
        /// Interior color for outlined shapes.
        fill: Option<Rgba>,
        /// Marker diameter in pixels.
        size: f64,
    },
    /// A text string, optionally boxed.
    Text {
        /// Index of the emitting layer.
        layer: usize,
        /// Anchor (text center).
        position: Point,
        /// Content.
        text: String,
        /// Text color.
        color: Rgba,
        /// Font size in pixels.
        size: f64,
        /// Background box for labels.
        boxed: Option<LabelBox>,
    },
    /// A closed polygon.
    Polygon {
        /// Index of the emitting layer.
        layer: usize,
        /// Group key the polygon was split by.
        key: Option<String>,
        /// Open vertex ring.
        vertices: Vec<Point>,
        /// Interior color.
        fill: Option<Rgba>,
        /// Outline color.
        stroke: Option<Rgba>,
        /// Outline width in pixels.
        stroke_width: f64,
    },
}

impl DrawPrimitive {
    /// Layer that emitted this primitive.
    #[must_use]
    pub fn layer(&self) -> usize {
        match self {
            DrawPrimitive::Point { layer, .. }
            | DrawPrimitive::Text { layer, .. }
            | DrawPrimitive::Polygon { layer, .. } => *layer,
        }
    }

    fn extend(&self, bounds: &mut Bounds) {
        match self {
            DrawPrimitive::Point { position, .. } | DrawPrimitive::Text { position, .. } => {
                bounds.include(*position);
            }
            DrawPrimitive::Polygon { vertices, .. } => {
                vertices.iter().for_each(|v| bounds.include(*v));
            }
        }
    }
}

/// One row of a legend guide.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegendEntry {
    /// Category.
    pub value: String,
    /// Color encoding, if the guide covers the color channel.
    pub color: Option<Rgba>,
    /// Fill encoding, if the guide covers the fill channel.
    pub fill: Option<Rgba>,
    /// Shape encoding, if the guide covers the shape channel.
    pub shape: Option<PointShape>,
}

/// Legend guide for one field, merging every channel it is mapped to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegendGuide {
    /// Guide title.
    pub title: String,
    /// Field the guide explains.
    pub field: String,
    /// Channels merged into this guide.
    pub channels: Vec<Channel>,
    /// Geometries whose keys are drawn.
    pub glyphs: Vec<GeomKind>,
    /// Entries in display order.
    pub entries: Vec<LegendEntry>,
}

/// The plot legend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Legend {
    /// Placement.
    pub position: LegendPosition,
    /// Guides in first-mapped order.
    pub guides: Vec<LegendGuide>,
}

impl Legend {
    /// Guide for a field.
    #[must_use]
    pub fn guide(&self, field: &str) -> Option<&LegendGuide> {
        self.guides.iter().find(|g| g.field == field)
    }
}

/// Axis guide: visible range and ticks in transformed space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AxisGuide {
    /// Axis.
    pub axis: Axis,
    /// Axis title.
    pub title: Option<String>,
    /// Transform applied to this axis.
    pub transform: AxisTransform,
    /// Visible `(min, max)` in transformed space.
    pub range: (f64, f64),
    /// Ticks sorted by position, labelled with raw values.
    pub ticks: Vec<Tick>,
}

/// Everything a backend needs to draw the plot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderPlan {
    /// Draw sequence, sorted by layer.
    pub primitives: Vec<DrawPrimitive>,
    /// Legend, absent when suppressed or empty.
    pub legend: Option<Legend>,
    /// Horizontal axis.
    pub x_axis: AxisGuide,
    /// Vertical axis.
    pub y_axis: AxisGuide,
    /// Effective theme.
    pub theme: Theme,
    /// Plot title.
    pub title: Option<String>,
    /// Palette of each mapped categorical channel.
    pub palettes: Vec<PaletteAssignment>,
    /// Problems found while composing.
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderPlan {
    /// Palette of a channel.
    #[must_use]
    pub fn palette(&self, channel: Channel) -> Option<&PaletteAssignment> {
        self.palettes.iter().find(|p| p.channel() == channel)
    }

    /// Primitives emitted by one layer.
    pub fn layer_primitives(&self, layer: usize) -> impl Iterator<Item = &DrawPrimitive> {
        self.primitives.iter().filter(move |p| p.layer() == layer)
    }

    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// A layer that resolved successfully, with its per-row values extracted.
struct ResolvedLayer<'a> {
    index: usize,
    layer: &'a Layer,
    aes: ResolvedAes,
    /// Transformed positions; NaN where a value is missing.
    positions: Vec<Point>,
    labels: Option<Vec<String>>,
    categories: Vec<(Channel, Vec<String>)>,
    groups: Option<Vec<(String, Vec<usize>)>>,
}

impl ResolvedLayer<'_> {
    fn category(&self, channel: Channel, row: usize) -> Option<&str> {
        self.categories
            .iter()
            .find(|(c, _)| *c == channel)
            .and_then(|(_, values)| values.get(row))
            .map(String::as_str)
    }
}

/// Composes a built plot into a [`RenderPlan`].
#[derive(Debug)]
pub struct Compositor<'a> {
    plot: &'a BuiltGGPlot,
}

impl<'a> Compositor<'a> {
    /// Create a compositor for a plot.
    #[must_use]
    pub fn new(plot: &'a BuiltGGPlot) -> Self {
        Self { plot }
    }

    /// Run all composition passes.
    #[must_use]
    pub fn compose(&self) -> RenderPlan {
        let mut diagnostics = Vec::new();

        let mut resolved = Vec::new();
        for (index, layer) in self.plot.layers().iter().enumerate() {
            diagnostics
                .extend(layer.stat_issues.iter().map(|e| Diagnostic::new(Some(index), e.clone())));
            match self.resolve_layer(index, layer) {
                Ok(r) => resolved.push(r),
                Err(err) => {
                    warn!(layer = index, %err, "layer omitted from plot");
                    diagnostics.push(Diagnostic::new(Some(index), err));
                }
            }
        }

        let palettes = self.build_palettes(&resolved);

        let mut primitives = Vec::new();
        for layer in &resolved {
            let before = primitives.len();
            self.emit(layer, &palettes, &mut primitives, &mut diagnostics);
            debug!(
                layer = layer.index,
                geom = %layer.layer.geom.kind,
                primitives = primitives.len() - before,
                "layer composed"
            );
        }

        let theme = self.plot.theme().clone();
        let legend = if theme.legend_position == LegendPosition::None {
            None
        } else {
            self.build_legend(&resolved, &palettes, theme.legend_position, &mut diagnostics)
        };

        let mut bounds = Bounds::EMPTY;
        primitives.iter().for_each(|p| p.extend(&mut bounds));
        let bounds = bounds.padded(AXIS_EXPANSION);

        RenderPlan {
            x_axis: self.axis_guide(Axis::X, (bounds.x_min, bounds.x_max), &resolved),
            y_axis: self.axis_guide(Axis::Y, (bounds.y_min, bounds.y_max), &resolved),
            primitives,
            legend,
            theme,
            title: self.plot.title().map(str::to_string),
            palettes,
            diagnostics,
        }
    }

    fn resolve_layer<'l>(&self, index: usize, layer: &'l Layer) -> PlotResult<ResolvedLayer<'l>>
    where
        'a: 'l,
    {
        let kind = layer.geom.kind;
        let aes = resolve_aes(self.plot.aes(), &layer.aes, kind, index)?;
        let data: &Dataset = layer.data.as_ref().unwrap_or_else(|| self.plot.data());

        let xs = position_values(&aes, Channel::X, data, index, kind)?;
        let ys = position_values(&aes, Channel::Y, data, index, kind)?;
        let (tx, ty) = (self.plot.transform(Axis::X), self.plot.transform(Axis::Y));
        let positions: Vec<Point> =
            xs.iter().zip(&ys).map(|(&x, &y)| Point::new(tx.apply(x), ty.apply(y))).collect();

        let labels = match kind {
            GeomKind::Text | GeomKind::Label => Some(label_values(&aes, data)?),
            GeomKind::Point | GeomKind::Polygon => None,
        };

        let mut categories = Vec::new();
        for channel in Channel::DISCRETE {
            if let Some(field) = aes.field(channel) {
                categories.push((channel, data.categorical(field)?));
            }
        }

        let groups = match kind {
            GeomKind::Polygon => {
                let field = layer
                    .group
                    .as_deref()
                    .or_else(|| aes.field(Channel::Fill))
                    .or_else(|| aes.field(Channel::Color));
                match field {
                    Some(f) => Some(data.partition(f)?),
                    None => Some(vec![(String::new(), (0..data.len()).collect())]),
                }
            }
            _ => None,
        };

        debug!(layer = index, geom = %kind, rows = data.len(), "layer resolved");
        Ok(ResolvedLayer { index, layer, aes, positions, labels, categories, groups })
    }

    fn build_palettes(&self, layers: &[ResolvedLayer<'_>]) -> Vec<PaletteAssignment> {
        let mut palettes = Vec::new();
        for channel in Channel::DISCRETE {
            let mut fields: Vec<&str> = Vec::new();
            for field in layers.iter().filter_map(|l| l.aes.field(channel)) {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
            if fields.is_empty() {
                continue;
            }

            let levels = self.channel_levels(channel, &fields, layers);
            debug!(%channel, levels = levels.len(), "palette built");
            palettes.push(PaletteAssignment::build(
                channel,
                levels,
                self.plot.discrete_scale(channel),
            ));
        }
        palettes
    }

    /// Canonical level order of a channel.
    ///
    /// The first dataset (global, then layers in order) annotated for one of
    /// the channel's fields supplies the order; values not covered by it are
    /// appended in first-encountered order.
    fn channel_levels(
        &self,
        channel: Channel,
        fields: &[&str],
        layers: &[ResolvedLayer<'_>],
    ) -> Vec<String> {
        let global = self.plot.data();
        let datasets = std::iter::once(global)
            .chain(layers.iter().filter_map(|l| l.layer.data.as_ref()));
        let canonical = datasets
            .into_iter()
            .find_map(|d| fields.iter().find_map(|f| d.canonical_order(f)));

        let mut observed: Vec<String> = Vec::new();
        for field in fields {
            if global.has_field(field) {
                observed.extend(global.categorical(field).unwrap_or_default());
            }
        }
        for layer in layers {
            if let Some((_, values)) = layer.categories.iter().find(|(c, _)| *c == channel) {
                observed.extend(values.iter().cloned());
            }
        }

        let mut levels = canonical.map(<[String]>::to_vec).unwrap_or_default();
        for value in first_encountered(observed) {
            if !levels.contains(&value) {
                levels.push(value);
            }
        }
        levels
    }

    fn emit(
        &self,
        layer: &ResolvedLayer<'_>,
        palettes: &[PaletteAssignment],
        out: &mut Vec<DrawPrimitive>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let style = layer.layer.geom.style;
        let index = layer.index;
        let color = |row: usize| channel_color(layer, Channel::Color, row, palettes);
        let fill = |row: usize| channel_color(layer, Channel::Fill, row, palettes);

        let dropped = layer.positions.iter().filter(|p| !drawable(p)).count();
        if dropped > 0 {
            warn!(layer = index, rows = dropped, "rows with missing positions were not drawn");
        }

        match layer.layer.geom.kind {
            GeomKind::Point => {
                let rows = layer.positions.iter().enumerate().filter(|(_, p)| drawable(p));
                for (row, &position) in rows {
                    out.push(DrawPrimitive::Point {
                        layer: index,
                        position,
                        shape: channel_shape(layer, row, palettes),
                        color: color(row).unwrap_or(Rgba::BLACK).with_opacity(style.alpha),
                        fill: fill(row).map(|c| c.with_opacity(style.alpha)),
                        size: style.size,
                    });
                }
            }
            kind @ (GeomKind::Text | GeomKind::Label) => {
                let labels = layer.labels.as_deref().unwrap_or_default();
                let rows = layer.positions.iter().enumerate().filter(|(_, p)| drawable(p));
                for (row, &position) in rows {
                    let text_color = color(row).unwrap_or(Rgba::BLACK).with_opacity(style.alpha);
                    let boxed = (kind == GeomKind::Label).then(|| LabelBox {
                        fill: fill(row).unwrap_or(Rgba::WHITE),
                        border: text_color,
                        padding: style.label_padding,
                    });
                    out.push(DrawPrimitive::Text {
                        layer: index,
                        position,
                        text: labels.get(row).cloned().unwrap_or_default(),
                        color: text_color,
                        size: style.size,
                        boxed,
                    });
                }
            }
            GeomKind::Polygon => {
                for (key, rows) in layer.groups.as_deref().unwrap_or_default() {
                    let vertices: Vec<Point> =
                        rows.iter().map(|&r| layer.positions[r]).filter(drawable).collect();
                    if vertices.len() < 3 {
                        warn!(layer = index, group = %key, "polygon has < 3 drawable vertices");
                        let err = PlotError::DroppedPolygon {
                            group: key.clone(),
                            vertices: vertices.len(),
                        };
                        diagnostics.push(Diagnostic::new(Some(index), err));
                        continue;
                    }
                    let first = rows[0];
                    let stroke = color(first);
                    let interior = match fill(first) {
                        Some(c) => Some(c),
                        None if stroke.is_none() => Some(Rgba::GREY20),
                        None => None,
                    };
                    out.push(DrawPrimitive::Polygon {
                        layer: index,
                        key: (!key.is_empty()).then(|| key.clone()),
                        vertices,
                        fill: interior.map(|c| c.with_opacity(style.alpha)),
                        stroke,
                        stroke_width: style.stroke_width,
                    });
                }
            }
        }
    }

    fn build_legend(
        &self,
        layers: &[ResolvedLayer<'_>],
        palettes: &[PaletteAssignment],
        position: LegendPosition,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Legend> {
        // (guide, values of the field seen in contributing layers)
        let mut guides: Vec<(LegendGuide, Vec<String>)> = Vec::new();
        for layer in layers.iter().filter(|l| l.layer.show_legend) {
            for channel in Channel::DISCRETE {
                let Some(field) = layer.aes.field(channel) else { continue };
                let idx = match guides.iter().position(|(g, _)| g.field == field) {
                    Some(i) => i,
                    None => {
                        guides.push((
                            LegendGuide {
                                title: field.to_string(),
                                field: field.to_string(),
                                channels: Vec::new(),
                                glyphs: Vec::new(),
                                entries: Vec::new(),
                            },
                            Vec::new(),
                        ));
                        guides.len() - 1
                    }
                };
                let (guide, seen) = &mut guides[idx];
                if !guide.channels.contains(&channel) {
                    guide.channels.push(channel);
                }
                if !guide.glyphs.contains(&layer.layer.geom.kind) {
                    guide.glyphs.push(layer.layer.geom.kind);
                }
                if let Some((_, values)) = layer.categories.iter().find(|(c, _)| *c == channel) {
                    seen.extend(values.iter().cloned());
                }
            }
        }

        let palette = |channel: Channel| palettes.iter().find(|p| p.channel() == channel);
        let guides: Vec<LegendGuide> = guides
            .into_iter()
            .map(|(mut guide, seen)| {
                let seen = first_encountered(seen);
                let primary = guide.channels[0];
                let known: Vec<String> = match palette(primary) {
                    Some(p) => p.levels().iter().filter(|v| seen.contains(v)).cloned().collect(),
                    None => seen,
                };

                let with_breaks = guide.channels.iter().find_map(|&c| {
                    self.plot
                        .discrete_scale(c)
                        .and_then(|s| s.breaks.as_deref())
                        .map(|b| (c, b))
                });
                let (values, issues) = match with_breaks {
                    Some((channel, breaks)) => apply_breaks(channel, &known, Some(breaks)),
                    None => apply_breaks(primary, &known, None),
                };
                diagnostics.extend(issues.into_iter().map(|e| Diagnostic::new(None, e)));

                if let Some(name) =
                    guide.channels.iter().find_map(|&c| self.plot.discrete_scale(c)?.name.clone())
                {
                    guide.title = name;
                }
                guide.entries =
                    values.iter().map(|v| legend_entry(v, &guide.channels, palettes)).collect();
                guide
            })
            .collect();

        (!guides.is_empty()).then_some(Legend { position, guides })
    }

    fn axis_guide(&self, axis: Axis, range: (f64, f64), layers: &[ResolvedLayer<'_>]) -> AxisGuide {
        let channel = match axis {
            Axis::X => Channel::X,
            Axis::Y => Channel::Y,
        };
        let title = self
            .plot
            .axis_title(axis)
            .or_else(|| layers.iter().find_map(|l| l.aes.field(channel)))
            .map(str::to_string);
        let transform = self.plot.transform(axis);
        let ticks = axis_ticks(range.0, range.1, transform, TARGET_TICKS);
        AxisGuide { axis, title, transform, range, ticks }
    }
}

fn drawable(p: &Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn legend_entry(value: &str, channels: &[Channel], palettes: &[PaletteAssignment]) -> LegendEntry {
    let palette = |channel: Channel| {
        channels
            .contains(&channel)
            .then(|| palettes.iter().find(|p| p.channel() == channel))
            .flatten()
    };
    LegendEntry {
        value: value.to_string(),
        color: palette(Channel::Color).map(|p| p.color(value)),
        fill: palette(Channel::Fill).map(|p| p.color(value)),
        shape: palette(Channel::Shape).map(|p| p.shape(value)),
    }
}

fn position_values(
    aes: &ResolvedAes,
    channel: Channel,
    data: &Dataset,
    layer: usize,
    geom: GeomKind,
) -> PlotResult<Vec<f64>> {
    match aes.get(channel) {
        Some(AesValue::Field(field)) => data.numeric(field),
        Some(AesValue::Constant(Constant::Number(v))) => Ok(vec![*v; data.len()]),
        Some(AesValue::Constant(_)) => {
            Err(PlotError::NonNumericValue { field: channel.name().to_string(), row: 0 })
        }
        None => Err(PlotError::UnresolvedChannel { layer, channel, geom }),
    }
}

fn label_values(aes: &ResolvedAes, data: &Dataset) -> PlotResult<Vec<String>> {
    let constant = |text: String| Ok(vec![text; data.len()]);
    match aes.get(Channel::Label) {
        Some(AesValue::Field(field)) => data.categorical(field),
        Some(AesValue::Constant(Constant::Text(t))) => constant(t.clone()),
        Some(AesValue::Constant(Constant::Number(n))) => constant(n.to_string()),
        Some(AesValue::Constant(Constant::Color(c))) => constant(c.to_hex()),
        Some(AesValue::Constant(Constant::Shape(s))) => constant(s.name().to_string()),
        None => constant(String::new()),
    }
}

fn channel_color(
    layer: &ResolvedLayer<'_>,
    channel: Channel,
    row: usize,
    palettes: &[PaletteAssignment],
) -> Option<Rgba> {
    match layer.aes.get(channel)? {
        AesValue::Field(_) => {
            let value = layer.category(channel, row)?;
            palettes.iter().find(|p| p.channel() == channel).map(|p| p.color(value))
        }
        AesValue::Constant(Constant::Color(c)) => Some(*c),
        AesValue::Constant(_) => None,
    }
}

fn channel_shape(
    layer: &ResolvedLayer<'_>,
    row: usize,
    palettes: &[PaletteAssignment],
) -> PointShape {
    match layer.aes.get(Channel::Shape) {
        Some(AesValue::Field(_)) => layer
            .category(Channel::Shape, row)
            .and_then(|v| {
                palettes.iter().find(|p| p.channel() == Channel::Shape).map(|p| p.shape(v))
            })
            .unwrap_or_default(),
        Some(AesValue::Constant(Constant::Shape(s))) => *s,
        _ => PointShape::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{
        aggregate_dataset, stat_ellipse, Aes, DataValue, DiscreteScale, GGPlot, Geom, Record,
    };

    fn formants() -> Dataset {
        Dataset::builder()
            .numeric("F1", &[300.0, 320.0, 310.0, 700.0, 720.0, 690.0, 400.0, 410.0])
            .numeric("F2", &[2300.0, 2250.0, 2280.0, 1200.0, 1150.0, 1250.0, 900.0, 950.0])
            .categorical("vowel", &["i", "i", "i", "a", "a", "a", "u", "u"])
            .build()
            .unwrap()
    }

    fn base() -> GGPlot {
        GGPlot::new().data(formants()).aes(Aes::new().x("F2").y("F1").color("vowel"))
    }

    #[test]
    fn test_points_follow_palette_and_transform() {
        let plan = base().geom(Geom::point()).scale_x_reverse().build().unwrap().render_plan();
        assert_eq!(plan.primitives.len(), 8);
        assert!(plan.diagnostics.is_empty());
        let palette = plan.palette(Channel::Color).unwrap();
        assert_eq!(palette.levels(), &["i", "a", "u"]);
        match &plan.primitives[0] {
            DrawPrimitive::Point { position, color, shape, .. } => {
                assert_eq!(*position, Point::new(-2300.0, 300.0));
                assert_eq!(*color, palette.color("i"));
                assert_eq!(*shape, PointShape::Circle);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_failed_layer_is_reported_and_omitted() {
        let plan = base()
            .geom(Geom::point())
            .geom(Geom::text())
            .build()
            .unwrap()
            .render_plan();
        assert_eq!(plan.primitives.len(), 8);
        assert!(plan.primitives.iter().all(|p| p.layer() == 0));
        assert_eq!(
            plan.diagnostics,
            vec![Diagnostic::new(
                Some(1),
                PlotError::UnresolvedChannel {
                    layer: 1,
                    channel: Channel::Label,
                    geom: GeomKind::Text,
                }
            )]
        );
        assert!(plan.has_errors());
    }

    #[test]
    fn test_unknown_field_is_layer_local() {
        let plan = base()
            .layer(Layer::new(Geom::point()).aes(Aes::new().shape("speaker")))
            .geom(Geom::point())
            .build()
            .unwrap()
            .render_plan();
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].error, PlotError::UnknownField("speaker".into()));
        assert_eq!(plan.layer_primitives(1).count(), 8);
    }

    #[test]
    fn test_labels_are_boxed() {
        let means = aggregate_dataset(&formants(), "vowel", &["F1", "F2"]).unwrap();
        let plan = base()
            .layer(Layer::new(Geom::label()).data(means).aes(Aes::new().label("vowel")))
            .build()
            .unwrap()
            .render_plan();
        assert_eq!(plan.primitives.len(), 3);
        match &plan.primitives[2] {
            DrawPrimitive::Text { text, boxed, position, .. } => {
                assert_eq!(text, "u");
                assert_eq!(boxed.map(|b| b.fill), Some(Rgba::WHITE));
                assert_eq!(*position, Point::new(925.0, 405.0));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn test_polygon_partition_and_defaults() {
        let set = stat_ellipse(&formants(), "vowel", "F2", "F1", 0.95, 16).unwrap();
        let plan = GGPlot::new()
            .data(formants())
            .aes(Aes::new().x("F2").y("F1"))
            .layer(Layer::new(Geom::polygon()).ellipses(&set))
            .build()
            .unwrap()
            .render_plan();
        let keys: Vec<Option<String>> = plan
            .primitives
            .iter()
            .map(|p| match p {
                DrawPrimitive::Polygon { key, fill, stroke, vertices, .. } => {
                    assert_eq!(*fill, Some(Rgba::GREY20));
                    assert_eq!(*stroke, None);
                    assert_eq!(vertices.len(), 16);
                    key.clone()
                }
                other => panic!("unexpected primitive {other:?}"),
            })
            .collect();
        assert_eq!(keys, vec![Some("i".to_string()), Some("a".to_string())]);
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].layer, Some(0));
        assert!(plan.legend.is_none());
    }

    #[test]
    fn test_short_polygon_group_is_reported() {
        let outline = Dataset::from_records(vec![
            Record::new().with("g", "a").with("x", 0.0).with("y", 0.0),
            Record::new().with("g", "a").with("x", 1.0).with("y", 0.0),
            Record::new().with("g", "a").with("x", 0.0).with("y", 1.0),
            Record::new().with("g", "b").with("x", 5.0).with("y", 5.0),
            Record::new().with("g", "b").with("x", DataValue::Null).with("y", 6.0),
            Record::new().with("g", "b").with("x", 6.0).with("y", 5.0),
        ]);
        let plan = GGPlot::new()
            .data(outline)
            .aes(Aes::new().x("x").y("y"))
            .layer(Layer::new(Geom::polygon()).group("g"))
            .build()
            .unwrap()
            .render_plan();

        assert_eq!(plan.primitives.len(), 1);
        match &plan.primitives[0] {
            DrawPrimitive::Polygon { key, vertices, .. } => {
                assert_eq!(key.as_deref(), Some("a"));
                assert_eq!(vertices.len(), 3);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
        assert_eq!(
            plan.diagnostics,
            vec![Diagnostic::new(
                Some(0),
                PlotError::DroppedPolygon { group: "b".into(), vertices: 2 }
            )]
        );
        assert_eq!(plan.diagnostics[0].severity, Severity::Warning);
        assert!(!plan.has_errors());
    }

    #[test]
    fn test_huge_coordinates_still_draw_ellipses() {
        let data = Dataset::builder()
            .numeric("x", &[1e200, 1.5e200, 3e200, 2e200])
            .numeric("y", &[2e200, 1e200, 2.5e200, 0.5e200])
            .categorical("g", &["a"; 4])
            .build()
            .unwrap();
        let set = stat_ellipse(&data, "g", "x", "y", 0.95, 16).unwrap();
        assert!(set.issues.is_empty());
        let plan = GGPlot::new()
            .data(data)
            .aes(Aes::new().x("x").y("y"))
            .layer(Layer::new(Geom::polygon()).ellipses(&set))
            .build()
            .unwrap()
            .render_plan();
        assert_eq!(plan.primitives.len(), 1);
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn test_legend_merges_channels_of_one_field() {
        let plan = base()
            .layer(Layer::new(Geom::point()).aes(Aes::new().shape("vowel")))
            .build()
            .unwrap()
            .render_plan();
        let legend = plan.legend.unwrap();
        assert_eq!(legend.guides.len(), 1);
        let guide = legend.guide("vowel").unwrap();
        assert_eq!(guide.channels, vec![Channel::Color, Channel::Shape]);
        assert_eq!(guide.entries[1].shape, Some(PointShape::Triangle));
        assert!(guide.entries[1].color.is_some());
        assert_eq!(guide.entries[1].fill, None);
    }

    #[test]
    fn test_constant_bindings_add_no_legend() {
        let plan = GGPlot::new()
            .data(formants())
            .aes(Aes::new().x("F2").y("F1").color_value(Rgba::BLUE))
            .geom(Geom::point())
            .build()
            .unwrap()
            .render_plan();
        assert!(plan.legend.is_none());
        assert!(plan.palettes.is_empty());
    }

    #[test]
    fn test_hidden_layer_has_no_legend_keys() {
        let plan = base()
            .layer(Layer::new(Geom::point()).show_legend(false))
            .build()
            .unwrap()
            .render_plan();
        assert!(plan.legend.is_none());
        assert!(plan.palette(Channel::Color).is_some());
    }

    #[test]
    fn test_legend_title_from_scale() {
        let plan = base()
            .geom(Geom::point())
            .scale(DiscreteScale::color().name("Vowel"))
            .build()
            .unwrap()
            .render_plan();
        assert_eq!(plan.legend.unwrap().guides[0].title, "Vowel");
    }

    #[test]
    fn test_axis_guides() {
        let plan = base().geom(Geom::point()).scale_y_reverse().build().unwrap().render_plan();
        assert_eq!(plan.x_axis.title.as_deref(), Some("F2"));
        assert_eq!(plan.y_axis.transform, AxisTransform::Reverse);
        assert!(plan.y_axis.range.0 < -720.0 && plan.y_axis.range.1 > -300.0);
        assert!(plan.y_axis.ticks.iter().all(|t| t.position == -t.value));
    }
}

//! Main GGPlot builder.
//!
//! Combines all Grammar of Graphics components into a plot specification.
//! [`GGPlot::build`] validates the plot-wide configuration; composition into a
//! [`RenderPlan`] and rendering happen on the resulting [`BuiltGGPlot`].

use std::path::Path;

use tracing::debug;

use crate::error::{PlotError, PlotResult, Result};
use crate::framebuffer::Framebuffer;
use crate::output::{PngEncoder, SvgEncoder};
use crate::render::rasterize;
use crate::scale::{Axis, AxisTransform, PositionScale};

use super::aes::{Aes, Channel};
use super::compose::{Compositor, RenderPlan};
use super::data::Dataset;
use super::geom::Geom;
use super::palette::DiscreteScale;
use super::stat::EllipseSet;
use super::theme::{LegendPosition, Theme, ThemeOp, ThemeSetting};

/// A layer in the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// The geometry.
    pub geom: Geom,
    /// Layer-specific data (if different from plot data).
    pub data: Option<Dataset>,
    /// Layer-specific aesthetics.
    pub aes: Aes,
    /// Whether the layer contributes legend keys.
    pub show_legend: bool,
    /// Field splitting polygon layers into one polygon per value.
    pub group: Option<String>,
    /// Per-group problems raised while deriving this layer's data.
    pub stat_issues: Vec<PlotError>,
}

impl Layer {
    /// Create a new layer from a geometry.
    #[must_use]
    pub fn new(geom: Geom) -> Self {
        Self {
            aes: geom.aes.clone().unwrap_or_default(),
            geom,
            data: None,
            show_legend: true,
            group: None,
            stat_issues: Vec::new(),
        }
    }

    /// Set layer-specific data.
    #[must_use]
    pub fn data(mut self, data: Dataset) -> Self {
        self.data = Some(data);
        self
    }

    /// Set layer aesthetics.
    #[must_use]
    pub fn aes(mut self, aes: Aes) -> Self {
        self.aes = aes;
        self
    }

    /// Include or exclude this layer from the legend.
    #[must_use]
    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    /// Split polygons by a field.
    #[must_use]
    pub fn group(mut self, field: &str) -> Self {
        self.group = Some(field.to_string());
        self
    }

    /// Draw a set of ellipses: vertex data, grouping and per-group issues.
    #[must_use]
    pub fn ellipses(mut self, set: &EllipseSet) -> Self {
        self.data = Some(set.to_dataset());
        self.group = Some(set.group_field.clone());
        self.stat_issues = set.issues.clone();
        self
    }
}

/// Grammar of Graphics plot builder.
#[derive(Debug, Clone)]
pub struct GGPlot {
    data: Dataset,
    aes: Aes,
    layers: Vec<Layer>,
    x_scales: Vec<PositionScale>,
    y_scales: Vec<PositionScale>,
    discrete_scales: Vec<DiscreteScale>,
    theme_ops: Vec<ThemeOp>,
    width: u32,
    height: u32,
    title: Option<String>,
    xlab: Option<String>,
    ylab: Option<String>,
}

impl Default for GGPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl GGPlot {
    /// Create a new plot builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Dataset::default(),
            aes: Aes::new(),
            layers: Vec::new(),
            x_scales: Vec::new(),
            y_scales: Vec::new(),
            discrete_scales: Vec::new(),
            theme_ops: Vec::new(),
            width: 800,
            height: 600,
            title: None,
            xlab: None,
            ylab: None,
        }
    }

    /// Set the data.
    #[must_use]
    pub fn data(mut self, data: Dataset) -> Self {
        self.data = data;
        self
    }

    /// Convenience: set x and y data directly.
    #[must_use]
    pub fn data_xy(mut self, x: &[f64], y: &[f64]) -> Self {
        self.data = Dataset::from_xy(x, y);
        self.aes = self.aes.x("x").y("y");
        self
    }

    /// Set global aesthetics.
    #[must_use]
    pub fn aes(mut self, aes: Aes) -> Self {
        self.aes = aes;
        self
    }

    /// Add a geometry layer.
    #[must_use]
    pub fn geom(mut self, geom: Geom) -> Self {
        self.layers.push(Layer::new(geom));
        self
    }

    /// Add a layer.
    #[must_use]
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Declare the x position scale.
    #[must_use]
    pub fn scale_x(mut self, scale: PositionScale) -> Self {
        self.x_scales.push(scale);
        self
    }

    /// Declare the y position scale.
    #[must_use]
    pub fn scale_y(mut self, scale: PositionScale) -> Self {
        self.y_scales.push(scale);
        self
    }

    /// Reverse the x axis.
    #[must_use]
    pub fn scale_x_reverse(self) -> Self {
        self.scale_x(PositionScale::reverse())
    }

    /// Reverse the y axis.
    #[must_use]
    pub fn scale_y_reverse(self) -> Self {
        self.scale_y(PositionScale::reverse())
    }

    /// Declare a discrete scale; a later scale for the same channel replaces it.
    #[must_use]
    pub fn scale(mut self, scale: DiscreteScale) -> Self {
        self.discrete_scales.push(scale);
        self
    }

    /// Apply a theme preset.
    #[must_use]
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme_ops.push(ThemeOp::Preset(theme));
        self
    }

    /// Override one theme key.
    #[must_use]
    pub fn theme_set(mut self, setting: ThemeSetting) -> Self {
        self.theme_ops.push(ThemeOp::Set(setting));
        self
    }

    /// Set legend placement (`LegendPosition::None` hides it).
    #[must_use]
    pub fn legend_position(self, position: LegendPosition) -> Self {
        self.theme_set(ThemeSetting::LegendPosition(position))
    }

    /// Set dimensions.
    #[must_use]
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set x-axis label.
    #[must_use]
    pub fn xlab(mut self, label: impl Into<String>) -> Self {
        self.xlab = Some(label.into());
        self
    }

    /// Set y-axis label.
    #[must_use]
    pub fn ylab(mut self, label: impl Into<String>) -> Self {
        self.ylab = Some(label.into());
        self
    }

    /// Build the plot.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::NoLayers`] without layers and
    /// [`PlotError::ConflictingTransform`] if one axis was declared both
    /// reversed and not reversed.
    pub fn build(self) -> PlotResult<BuiltGGPlot> {
        if self.layers.is_empty() {
            return Err(PlotError::NoLayers);
        }
        let (x_transform, x_name) = resolve_position(Axis::X, &self.x_scales)?;
        let (y_transform, y_name) = resolve_position(Axis::Y, &self.y_scales)?;
        let theme = Theme::resolve(&self.theme_ops);
        debug!(
            layers = self.layers.len(),
            %x_transform,
            %y_transform,
            theme_ops = self.theme_ops.len(),
            "plot built"
        );

        Ok(BuiltGGPlot {
            data: self.data,
            aes: self.aes,
            layers: self.layers,
            x_transform,
            y_transform,
            discrete_scales: self.discrete_scales,
            theme,
            width: self.width,
            height: self.height,
            title: self.title,
            xlab: self.xlab.or(x_name),
            ylab: self.ylab.or(y_name),
        })
    }
}

fn resolve_position(
    axis: Axis,
    scales: &[PositionScale],
) -> PlotResult<(AxisTransform, Option<String>)> {
    let Some(first) = scales.first() else {
        return Ok((AxisTransform::Identity, None));
    };
    if let Some(other) = scales.iter().find(|s| s.transform != first.transform) {
        return Err(PlotError::ConflictingTransform {
            axis,
            first: first.transform,
            second: other.transform,
        });
    }
    let name = scales.iter().rev().find_map(|s| s.name.clone());
    Ok((first.transform, name))
}

/// A built GGPlot ready for composition and rendering.
#[derive(Debug, Clone)]
pub struct BuiltGGPlot {
    data: Dataset,
    aes: Aes,
    layers: Vec<Layer>,
    x_transform: AxisTransform,
    y_transform: AxisTransform,
    discrete_scales: Vec<DiscreteScale>,
    theme: Theme,
    width: u32,
    height: u32,
    title: Option<String>,
    xlab: Option<String>,
    ylab: Option<String>,
}

impl BuiltGGPlot {
    /// Global dataset.
    #[must_use]
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Global aesthetics.
    #[must_use]
    pub fn aes(&self) -> &Aes {
        &self.aes
    }

    /// Layers in z-order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Transform of an axis.
    #[must_use]
    pub fn transform(&self, axis: Axis) -> AxisTransform {
        match axis {
            Axis::X => self.x_transform,
            Axis::Y => self.y_transform,
        }
    }

    /// Effective discrete scale of a channel.
    #[must_use]
    pub fn discrete_scale(&self, channel: Channel) -> Option<&DiscreteScale> {
        self.discrete_scales.iter().rev().find(|s| s.channel == channel)
    }

    /// Effective theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Output size in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Plot title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Explicit axis title, if any.
    #[must_use]
    pub fn axis_title(&self, axis: Axis) -> Option<&str> {
        match axis {
            Axis::X => self.xlab.as_deref(),
            Axis::Y => self.ylab.as_deref(),
        }
    }

    /// Compose the layers into a render plan.
    #[must_use]
    pub fn render_plan(&self) -> RenderPlan {
        Compositor::new(self).compose()
    }

    /// Render to framebuffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are invalid.
    pub fn to_framebuffer(&self) -> Result<Framebuffer> {
        rasterize(&self.render_plan(), self.width, self.height)
    }

    /// Render to an SVG document.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions leave no room for the panel.
    pub fn to_svg(&self) -> Result<SvgEncoder> {
        SvgEncoder::from_plan(&self.render_plan(), self.width, self.height)
    }

    /// Render and write a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        PngEncoder::write_to_file(&self.to_framebuffer()?, path)
    }

    /// Render and write an SVG file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_svg()?.write_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::stat::stat_ellipse;

    fn formants() -> Dataset {
        Dataset::builder()
            .numeric("F1", &[300.0, 320.0, 310.0, 700.0, 720.0, 690.0])
            .numeric("F2", &[2300.0, 2250.0, 2280.0, 1200.0, 1150.0, 1250.0])
            .categorical("vowel", &["i", "i", "i", "a", "a", "a"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_ggplot_basic() {
        let plot = GGPlot::new()
            .data_xy(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0])
            .geom(Geom::point())
            .dimensions(200, 150)
            .build()
            .unwrap();
        assert_eq!(plot.layers().len(), 1);
        assert_eq!(plot.dimensions(), (200, 150));
        assert_eq!(plot.transform(Axis::X), AxisTransform::Identity);
    }

    #[test]
    fn test_ggplot_error_no_layers() {
        let err = GGPlot::new().data(formants()).build().unwrap_err();
        assert_eq!(err, PlotError::NoLayers);
    }

    #[test]
    fn test_reverse_axes() {
        let plot = GGPlot::new()
            .data(formants())
            .geom(Geom::point())
            .scale_x_reverse()
            .scale_y_reverse()
            .scale_y_reverse()
            .build()
            .unwrap();
        assert_eq!(plot.transform(Axis::X), AxisTransform::Reverse);
        assert_eq!(plot.transform(Axis::Y), AxisTransform::Reverse);
    }

    #[test]
    fn test_conflicting_transform_is_fatal() {
        let err = GGPlot::new()
            .geom(Geom::point())
            .scale_x_reverse()
            .scale_x(PositionScale::continuous())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PlotError::ConflictingTransform {
                axis: Axis::X,
                first: AxisTransform::Reverse,
                second: AxisTransform::Identity,
            }
        );
    }

    #[test]
    fn test_axis_titles() {
        let plot = GGPlot::new()
            .geom(Geom::point())
            .scale_x(PositionScale::reverse().name("F2 (Hz)"))
            .ylab("F1 (Hz)")
            .title("Vowel space")
            .build()
            .unwrap();
        assert_eq!(plot.axis_title(Axis::X), Some("F2 (Hz)"));
        assert_eq!(plot.axis_title(Axis::Y), Some("F1 (Hz)"));
        assert_eq!(plot.title(), Some("Vowel space"));

        let plot = GGPlot::new()
            .geom(Geom::point())
            .scale_x(PositionScale::reverse().name("scale name"))
            .xlab("explicit")
            .build()
            .unwrap();
        assert_eq!(plot.axis_title(Axis::X), Some("explicit"));
    }

    #[test]
    fn test_theme_ops_fold_at_build() {
        let plot = GGPlot::new()
            .geom(Geom::point())
            .legend_position(LegendPosition::None)
            .theme(Theme::bw())
            .theme_set(ThemeSetting::Margin(12))
            .build()
            .unwrap();
        assert_eq!(plot.theme().legend_position, LegendPosition::Right);
        assert!(plot.theme().show_panel_border);
        assert_eq!(plot.theme().margin, 12);
    }

    #[test]
    fn test_discrete_scale_last_wins() {
        let plot = GGPlot::new()
            .geom(Geom::point())
            .scale(DiscreteScale::color().name("first"))
            .scale(DiscreteScale::shape())
            .scale(DiscreteScale::color().name("second"))
            .build()
            .unwrap();
        let color = plot.discrete_scale(Channel::Color).unwrap();
        assert_eq!(color.name.as_deref(), Some("second"));
        assert!(plot.discrete_scale(Channel::Fill).is_none());
    }

    #[test]
    fn test_layer_builders() {
        let layer = Layer::new(Geom::label().aes(Aes::new().label("vowel")))
            .data(formants())
            .show_legend(false)
            .group("vowel");
        assert_eq!(layer.aes, Aes::new().label("vowel"));
        assert!(!layer.show_legend);
        assert_eq!(layer.group.as_deref(), Some("vowel"));
        assert_eq!(layer.data.as_ref().map(Dataset::len), Some(6));
    }

    #[test]
    fn test_layer_ellipses() {
        let set = stat_ellipse(&formants(), "vowel", "F2", "F1", 0.95, 16).unwrap();
        let layer = Layer::new(Geom::polygon()).ellipses(&set);
        assert_eq!(layer.group.as_deref(), Some("vowel"));
        assert_eq!(layer.data.as_ref().map(Dataset::len), Some(32));
        assert!(layer.stat_issues.is_empty());
    }

    #[test]
    fn test_ggplot_default() {
        let plot = GGPlot::default();
        let _ = format!("{:?}", plot);
    }
}

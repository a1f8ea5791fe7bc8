//! Theme system for Grammar of Graphics.
//!
//! Controls the non-data visual appearance of plots. A plot accumulates an
//! ordered list of [`ThemeOp`]s; folding them in order gives the effective
//! theme, so the last write to any key wins.

use crate::color::Rgba;

/// Where the legend is placed, or `None` to suppress it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LegendPosition {
    /// No legend.
    None,
    /// Right of the panel.
    #[default]
    Right,
    /// Below the panel.
    Bottom,
    /// Above the panel.
    Top,
    /// Left of the panel.
    Left,
}

/// Theme specification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Theme {
    /// Background color.
    pub background: Rgba,
    /// Panel background color.
    pub panel_background: Rgba,
    /// Grid line color.
    pub grid_color: Rgba,
    /// Axis line color.
    pub axis_color: Rgba,
    /// Text color.
    pub text_color: Rgba,
    /// Show grid lines.
    pub show_grid: bool,
    /// Show axis lines.
    pub show_axis: bool,
    /// Show panel border.
    pub show_panel_border: bool,
    /// Grid line width.
    pub grid_width: f32,
    /// Axis line width.
    pub axis_width: f32,
    /// Margin around the plot.
    pub margin: u32,
    /// Legend placement.
    pub legend_position: LegendPosition,
    /// Base font size for titles and tick labels.
    pub base_size: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self::grey()
    }
}

impl Theme {
    /// Grey theme (ggplot2 default-like).
    #[must_use]
    pub fn grey() -> Self {
        Self {
            background: Rgba::WHITE,
            panel_background: Rgba::rgb(235, 235, 235),
            grid_color: Rgba::WHITE,
            axis_color: Rgba::rgb(50, 50, 50),
            text_color: Rgba::rgb(50, 50, 50),
            show_grid: true,
            show_axis: true,
            show_panel_border: false,
            grid_width: 1.0,
            axis_width: 1.0,
            margin: 40,
            legend_position: LegendPosition::Right,
            base_size: 11.0,
        }
    }

    /// Minimal theme with white background.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            panel_background: Rgba::WHITE,
            grid_color: Rgba::rgb(220, 220, 220),
            axis_color: Rgba::rgb(100, 100, 100),
            text_color: Rgba::BLACK,
            grid_width: 0.5,
            axis_width: 0.5,
            ..Self::grey()
        }
    }

    /// Black and white theme.
    #[must_use]
    pub fn bw() -> Self {
        Self {
            panel_background: Rgba::WHITE,
            grid_color: Rgba::rgb(200, 200, 200),
            axis_color: Rgba::BLACK,
            text_color: Rgba::BLACK,
            show_panel_border: true,
            grid_width: 0.5,
            ..Self::grey()
        }
    }

    /// Classic theme with no grid.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            panel_background: Rgba::WHITE,
            axis_color: Rgba::BLACK,
            text_color: Rgba::BLACK,
            show_grid: false,
            grid_width: 0.0,
            ..Self::grey()
        }
    }

    /// Dark theme.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(30, 30, 30),
            panel_background: Rgba::rgb(40, 40, 40),
            grid_color: Rgba::rgb(60, 60, 60),
            axis_color: Rgba::rgb(180, 180, 180),
            text_color: Rgba::rgb(220, 220, 220),
            grid_width: 0.5,
            axis_width: 0.5,
            ..Self::grey()
        }
    }

    /// Void theme (nothing but data).
    #[must_use]
    pub fn void() -> Self {
        Self {
            panel_background: Rgba::WHITE,
            axis_color: Rgba::WHITE,
            text_color: Rgba::WHITE,
            show_grid: false,
            show_axis: false,
            grid_width: 0.0,
            axis_width: 0.0,
            margin: 10,
            ..Self::grey()
        }
    }

    /// Apply one setting.
    #[must_use]
    pub fn with(mut self, setting: ThemeSetting) -> Self {
        match setting {
            ThemeSetting::Background(c) => self.background = c,
            ThemeSetting::PanelBackground(c) => self.panel_background = c,
            ThemeSetting::GridColor(c) => self.grid_color = c,
            ThemeSetting::TextColor(c) => self.text_color = c,
            ThemeSetting::Grid(show) => self.show_grid = show,
            ThemeSetting::Axis(show) => self.show_axis = show,
            ThemeSetting::PanelBorder(show) => self.show_panel_border = show,
            ThemeSetting::Margin(m) => self.margin = m,
            ThemeSetting::LegendPosition(p) => self.legend_position = p,
            ThemeSetting::BaseSize(s) => self.base_size = s,
        }
        self
    }

    /// Set background color.
    #[must_use]
    pub fn background(self, color: Rgba) -> Self {
        self.with(ThemeSetting::Background(color))
    }

    /// Set margin.
    #[must_use]
    pub fn margin(self, margin: u32) -> Self {
        self.with(ThemeSetting::Margin(margin))
    }

    /// Enable or disable grid lines.
    #[must_use]
    pub fn grid(self, show: bool) -> Self {
        self.with(ThemeSetting::Grid(show))
    }

    /// Set legend placement.
    #[must_use]
    pub fn legend_position(self, position: LegendPosition) -> Self {
        self.with(ThemeSetting::LegendPosition(position))
    }

    /// Fold theme operations in order over the default theme.
    #[must_use]
    pub fn resolve(ops: &[ThemeOp]) -> Self {
        ops.iter().fold(Self::default(), |theme, op| match op {
            ThemeOp::Preset(preset) => preset.clone(),
            ThemeOp::Set(setting) => theme.with(*setting),
        })
    }
}

/// A single theme key and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeSetting {
    /// Plot background color.
    Background(Rgba),
    /// Panel background color.
    PanelBackground(Rgba),
    /// Grid line color.
    GridColor(Rgba),
    /// Text color.
    TextColor(Rgba),
    /// Grid visibility.
    Grid(bool),
    /// Axis visibility.
    Axis(bool),
    /// Panel border visibility.
    PanelBorder(bool),
    /// Outer margin.
    Margin(u32),
    /// Legend placement.
    LegendPosition(LegendPosition),
    /// Base font size.
    BaseSize(f64),
}

/// One step of theme accumulation.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeOp {
    /// Replace every key with a preset.
    Preset(Theme),
    /// Override a single key.
    Set(ThemeSetting),
}

//! Page layout shared by the raster and SVG backends.
//!
//! A [`Viewport`] splits the canvas into margins, axis gutters, an optional
//! title band, the legend area and the data panel, and projects points from
//! transformed data space into pixels.

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::grammar::{Legend, LegendPosition, RenderPlan};
use crate::scale::{LinearScale, Scale};

/// Gutter for tick labels and axis titles on the left and bottom.
pub const AXIS_SPACE: f64 = 44.0;
/// Height of the title band.
pub const TITLE_SPACE: f64 = 26.0;
/// Width reserved for a legend beside the panel.
pub const LEGEND_WIDTH: f64 = 120.0;
/// Height reserved for a legend above or below the panel.
pub const LEGEND_BAND: f64 = 40.0;
/// Side of a legend key square.
pub const KEY_SIZE: f64 = 14.0;
/// Tick mark length.
pub const TICK_LENGTH: f64 = 4.0;

const KEY_GAP: f64 = 6.0;
const TITLE_HEIGHT: f64 = 18.0;
const GUIDE_GAP: f64 = 10.0;

/// Approximate extent of a single line of text: `(width, height)`.
///
/// Uses an average advance of 0.6 em, which holds for the sans-serif faces
/// the SVG output requests.
#[must_use]
pub fn text_extent(text: &str, size: f64) -> (f64, f64) {
    (text.chars().count() as f64 * size * 0.6, size)
}

/// One positioned element of the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendSlot {
    /// Guide title; `at` is the text's top-left corner.
    Title {
        /// Guide index.
        guide: usize,
        /// Top-left corner.
        at: Point,
    },
    /// One entry; `at` is the key's top-left corner, text follows the key.
    Key {
        /// Guide index.
        guide: usize,
        /// Entry index within the guide.
        entry: usize,
        /// Top-left corner of the key.
        at: Point,
    },
}

/// Canvas regions and the data-to-pixel projection.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    /// Panel left edge.
    pub left: f64,
    /// Panel top edge.
    pub top: f64,
    /// Panel right edge.
    pub right: f64,
    /// Panel bottom edge.
    pub bottom: f64,
    width: f64,
    margin: f64,
    title_space: f64,
    x: LinearScale,
    y: LinearScale,
}

impl Viewport {
    /// Lay out a plan on a `width` x `height` canvas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] when the margins, gutters and
    /// legend leave no room for the panel.
    pub fn new(plan: &RenderPlan, width: u32, height: u32) -> Result<Self> {
        let (w, h) = (f64::from(width), f64::from(height));
        let margin = f64::from(plan.theme.margin);
        let title_space = if plan.title.is_some() { TITLE_SPACE } else { 0.0 };

        let mut left = margin + AXIS_SPACE;
        let mut top = margin + title_space;
        let mut right = w - margin;
        let mut bottom = h - margin - AXIS_SPACE;
        match plan.legend.as_ref().map(|l| l.position) {
            Some(LegendPosition::Right) => right -= LEGEND_WIDTH,
            Some(LegendPosition::Left) => left += LEGEND_WIDTH,
            Some(LegendPosition::Top) => top += LEGEND_BAND,
            Some(LegendPosition::Bottom) => bottom -= LEGEND_BAND,
            Some(LegendPosition::None) | None => {}
        }

        if right - left < 1.0 || bottom - top < 1.0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        // Screen y grows downward, so the y range is inverted.
        let x = LinearScale::new(plan.x_axis.range, (left, right))?;
        let y = LinearScale::new(plan.y_axis.range, (bottom, top))?;
        Ok(Self { left, top, right, bottom, width: w, margin, title_space, x, y })
    }

    /// Panel width in pixels.
    #[must_use]
    pub fn panel_width(&self) -> f64 {
        self.right - self.left
    }

    /// Panel height in pixels.
    #[must_use]
    pub fn panel_height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Pixel position of a point in transformed data space.
    #[must_use]
    pub fn project(&self, p: Point) -> Point {
        Point::new(self.x.scale(p.x), self.y.scale(p.y))
    }

    /// Pixel column of an x position.
    #[must_use]
    pub fn project_x(&self, x: f64) -> f64 {
        self.x.scale(x)
    }

    /// Pixel row of a y position.
    #[must_use]
    pub fn project_y(&self, y: f64) -> f64 {
        self.y.scale(y)
    }

    /// Baseline center of the plot title.
    #[must_use]
    pub fn title_anchor(&self) -> Point {
        Point::new(self.width / 2.0, self.margin + self.title_space * 0.7)
    }

    /// Center of the x axis title.
    #[must_use]
    pub fn x_title_anchor(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, self.bottom + AXIS_SPACE - 6.0)
    }

    /// Center of the y axis title (drawn rotated).
    #[must_use]
    pub fn y_title_anchor(&self) -> Point {
        Point::new(self.left - AXIS_SPACE + 12.0, (self.top + self.bottom) / 2.0)
    }

    /// Position every guide title and key of a legend.
    ///
    /// Left and right legends stack guides vertically; top and bottom legends
    /// flow entries horizontally in a single band.
    #[must_use]
    pub fn legend_slots(&self, legend: &Legend) -> Vec<LegendSlot> {
        let mut slots = Vec::new();
        match legend.position {
            LegendPosition::Right | LegendPosition::Left => {
                let x = if legend.position == LegendPosition::Right {
                    self.right + 16.0
                } else {
                    self.margin
                };
                let mut y = self.top;
                for (gi, guide) in legend.guides.iter().enumerate() {
                    slots.push(LegendSlot::Title { guide: gi, at: Point::new(x, y) });
                    y += TITLE_HEIGHT;
                    for ei in 0..guide.entries.len() {
                        slots.push(LegendSlot::Key { guide: gi, entry: ei, at: Point::new(x, y) });
                        y += KEY_SIZE + KEY_GAP;
                    }
                    y += GUIDE_GAP;
                }
            }
            LegendPosition::Top | LegendPosition::Bottom => {
                let y = if legend.position == LegendPosition::Top {
                    self.margin + self.title_space + 8.0
                } else {
                    self.bottom + AXIS_SPACE + 8.0
                };
                let mut x = self.left;
                for (gi, guide) in legend.guides.iter().enumerate() {
                    slots.push(LegendSlot::Title { guide: gi, at: Point::new(x, y) });
                    x += text_extent(&guide.title, 11.0).0 + KEY_GAP * 2.0;
                    for (ei, entry) in guide.entries.iter().enumerate() {
                        slots.push(LegendSlot::Key { guide: gi, entry: ei, at: Point::new(x, y) });
                        x += KEY_SIZE + KEY_GAP + text_extent(&entry.value, 11.0).0 + KEY_GAP * 2.0;
                    }
                    x += GUIDE_GAP;
                }
            }
            LegendPosition::None => {}
        }
        slots
    }

    /// Left edge of the text that follows a legend key.
    #[must_use]
    pub fn key_label_x(key: Point) -> f64 {
        key.x + KEY_SIZE + KEY_GAP
    }
}

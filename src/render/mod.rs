//! Rendering backends and rasterization.
//!
//! [`rasterize`] turns a [`RenderPlan`](crate::grammar::RenderPlan) into pixels;
//! [`Viewport`] holds the page layout it shares with the SVG encoder.
//!
//! # Algorithms
//!
//! - **Wu's Anti-aliased Line**: polygon outlines and marker strokes
//! - **Bresenham's Line**: crisp marker diagonals
//! - **Midpoint Circle**: filled circle markers
//! - **Even-odd Scanline Fill**: ellipse and marker polygons, blended per span
//!
//! # References
//!
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.
//! - Bresenham, J. E. (1965). "Algorithm for computer control of a digital plotter."

mod layout;
mod primitives;
mod raster;

pub use layout::{
    text_extent, LegendSlot, Viewport, AXIS_SPACE, KEY_SIZE, LEGEND_BAND, LEGEND_WIDTH,
    TICK_LENGTH, TITLE_SPACE,
};
pub use primitives::{
    draw_circle, draw_line, draw_line_aa, draw_marker, draw_rect, draw_rect_outline,
    draw_thick_line, fill_polygon, stroke_polygon,
};
pub use raster::rasterize;

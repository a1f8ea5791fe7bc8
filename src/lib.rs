//! # Formant-Viz
//!
//! Layered grammar-of-graphics engine for grouped scatter plots: points
//! colored by category, per-group mean labels and confidence ellipses, on
//! axes that may be reversed (the classic F2/F1 vowel chart).
//!
//! A plot is declared with [`grammar::GGPlot`], composed into a
//! backend-neutral [`grammar::RenderPlan`], and drawn by the raster backend
//! ([`render::rasterize`], PNG output) or the [`output::SvgEncoder`].
//!
//! ## Quick Start
//!
//! ```rust
//! use formant_viz::prelude::*;
//!
//! let data = Dataset::builder()
//!     .numeric("F1", &[300.0, 320.0, 290.0, 700.0, 720.0, 690.0])
//!     .numeric("F2", &[2300.0, 2250.0, 2350.0, 1200.0, 1150.0, 1250.0])
//!     .categorical("vowel", &["i", "i", "i", "a", "a", "a"])
//!     .build()?;
//! let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", DEFAULT_LEVEL, DEFAULT_SEGMENTS)?;
//! let means = aggregate_dataset(&data, "vowel", &["F1", "F2"])?;
//!
//! let plot = GGPlot::new()
//!     .data(data)
//!     .aes(Aes::new().x("F2").y("F1").color("vowel"))
//!     .geom(Geom::point())
//!     .layer(Layer::new(Geom::polygon().alpha(0.2)).ellipses(&ellipses))
//!     .layer(Layer::new(Geom::label()).data(means).aes(Aes::new().label("vowel")))
//!     .scale_x_reverse()
//!     .scale_y_reverse()
//!     .build()?;
//!
//! let plan = plot.render_plan();
//! assert!(!plan.has_errors());
//! let svg = plot.to_svg()?.render();
//! assert!(svg.contains("<polygon"));
//! # Ok::<(), formant_viz::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Estimate per-group ellipses in parallel with rayon
//! - `serde`: Serialize render plans, datasets and diagnostics
//! - `cli`: Build the `vowel-plot` demo binary
//! - `full`: All features enabled
//!
//! ## Academic References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." *JCGS* 19(1).
//! - Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics/visualization code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color types and the HCL palette space.
pub mod color;

/// RGBA framebuffer for the raster backend.
pub mod framebuffer;

/// Points, extents and polygon measures.
pub mod geometry;

/// Position scales, axis transforms and tick breaks.
pub mod scale;

// ============================================================================
// Visualization Modules
// ============================================================================

/// Grammar of Graphics implementation.
pub mod grammar;

// ============================================================================
// Rendering Modules
// ============================================================================

/// Page layout and rasterization.
pub mod render;

/// Output encoders (PNG, SVG).
pub mod output;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for formant-viz operations.
pub mod error;

pub use error::{Error, PlotError, PlotResult, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and functions for convenient imports.
///
/// ```rust
/// use formant_viz::prelude::*;
///
/// let plot = GGPlot::new().data_xy(&[1.0, 2.0], &[3.0, 4.0]).geom(Geom::point());
/// assert!(plot.build().is_ok());
/// ```
pub mod prelude {
    pub use crate::color::Rgba;
    pub use crate::error::{Error, PlotError, PlotResult, Result};
    pub use crate::framebuffer::Framebuffer;
    pub use crate::geometry::Point;
    pub use crate::grammar::{
        aggregate_dataset, stat_ellipse, Aes, Channel, Dataset, Diagnostic, DiscreteScale,
        DrawPrimitive, GGPlot, Geom, Layer, LegendPosition, PointShape, RenderPlan, Severity,
        Theme, ThemeSetting, DEFAULT_LEVEL, DEFAULT_SEGMENTS,
    };
    pub use crate::output::{PngEncoder, SvgEncoder};
    pub use crate::scale::{Axis, AxisTransform, PositionScale};
}

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export trueno for direct access to SIMD operations.
pub use trueno;

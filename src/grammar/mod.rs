//! Grammar of Graphics implementation.
//!
//! Provides declarative visualization specification based on Wilkinson's
//! Grammar of Graphics [Wilkinson 2005].
//!
//! # Components
//!
//! - **Data**: immutable, shareable datasets with canonical category orders
//! - **Aesthetics**: channel bindings from fields or constants, global and per layer
//! - **Geometries**: point, text, label and polygon marks
//! - **Statistics**: group means and confidence ellipses
//! - **Palettes**: categorical color and shape assignment with legend breaks
//! - **Composition**: layers folded into a backend-neutral [`RenderPlan`]
//!
//! # Example
//!
//! ```rust
//! use formant_viz::grammar::*;
//!
//! let data = Dataset::builder()
//!     .numeric("F1", &[300.0, 320.0, 310.0, 700.0, 720.0, 690.0])
//!     .numeric("F2", &[2300.0, 2250.0, 2280.0, 1200.0, 1150.0, 1250.0])
//!     .categorical("vowel", &["i", "i", "i", "a", "a", "a"])
//!     .build()
//!     .unwrap();
//! let means = aggregate_dataset(&data, "vowel", &["F1", "F2"]).unwrap();
//! let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", 0.95, 64).unwrap();
//!
//! let plan = GGPlot::new()
//!     .data(data)
//!     .aes(Aes::new().x("F2").y("F1").color("vowel"))
//!     .geom(Geom::point())
//!     .layer(Layer::new(Geom::polygon().alpha(0.2)).ellipses(&ellipses).aes(Aes::new().fill("vowel")))
//!     .layer(Layer::new(Geom::label()).data(means).aes(Aes::new().label("vowel")))
//!     .scale_x_reverse()
//!     .scale_y_reverse()
//!     .build()
//!     .unwrap()
//!     .render_plan();
//! assert!(plan.diagnostics.is_empty());
//! ```
//!
//! # References
//!
//! - Wilkinson, L. (2005). *The Grammar of Graphics*. Springer.
//! - Wickham, H. (2010). "A Layered Grammar of Graphics." Journal of Computational
//!   and Graphical Statistics.

mod aes;
mod compose;
mod data;
mod geom;
mod ggplot;
mod palette;
mod stat;
mod theme;

pub use aes::{
    resolve_aes, Aes, AesValue, BindingSource, Channel, Constant, Provenance, ResolvedAes,
    ResolvedBinding,
};
pub use compose::{
    AxisGuide, Compositor, Diagnostic, DrawPrimitive, LabelBox, Legend, LegendEntry, LegendGuide,
    RenderPlan, Severity,
};
pub use data::{DataValue, Dataset, DatasetBuilder, Record};
pub use geom::{Geom, GeomKind, PointShape, Style};
pub use ggplot::{BuiltGGPlot, GGPlot, Layer};
pub use palette::{
    apply_breaks, hue_palette, shape_palette, DiscreteScale, Encoding, PaletteAssignment,
    PaletteValues,
};
pub use stat::{
    aggregate, aggregate_dataset, chi2_quantile_2df, estimate_ellipse, stat_ellipse,
    EllipseEstimate, EllipsePolygon, EllipseSet, GroupSummary, DEFAULT_LEVEL, DEFAULT_SEGMENTS,
    MIN_ELLIPSE_SAMPLES,
};
pub use theme::{LegendPosition, Theme, ThemeOp, ThemeSetting};

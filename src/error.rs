//! Error types for formant-viz operations.

use std::io;
use thiserror::Error;

use crate::grammar::{Channel, GeomKind};
use crate::scale::{Axis, AxisTransform};

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias using [`PlotError`].
pub type PlotResult<T> = std::result::Result<T, PlotError>;

/// Errors that can occur in formant-viz operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// Invalid dimensions for framebuffer or plot.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Plot specification, statistics or composition error.
    #[error(transparent)]
    Plot(#[from] PlotError),
}

/// Errors raised while resolving, transforming and composing a plot.
///
/// Unlike [`Error`], these are cheap to clone and comparable, so they can be
/// carried inside a [`RenderPlan`](crate::grammar::RenderPlan) as diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PlotError {
    /// A geometry needs a channel that neither the layer nor the plot binds.
    #[error("layer {layer}: {geom} geometry requires the `{channel}` channel but it is not bound")]
    UnresolvedChannel {
        /// Index of the offending layer.
        layer: usize,
        /// Missing channel.
        channel: Channel,
        /// Geometry kind of the layer.
        geom: GeomKind,
    },

    /// Too few samples to estimate a covariance ellipse.
    #[error("group `{group}` has {count} samples; at least 3 are needed for an ellipse")]
    InsufficientSamples {
        /// Group key.
        group: String,
        /// Number of samples found.
        count: usize,
    },

    /// Collinear or identical samples; the ellipse degenerates to a segment.
    #[error("group `{group}` has a degenerate covariance (determinant {determinant:.3e})")]
    DegenerateCovariance {
        /// Group key.
        group: String,
        /// Covariance determinant.
        determinant: f64,
    },

    /// A sample handed to the ellipse estimator is NaN or infinite.
    #[error("group `{group}` sample {index} has a non-finite coordinate")]
    NonFiniteSample {
        /// Group key.
        group: String,
        /// Index of the offending sample.
        index: usize,
    },

    /// The fitted ellipse does not fit in the `f64` range.
    #[error("group `{group}`: ellipse coordinates overflow")]
    EllipseOverflow {
        /// Group key.
        group: String,
    },

    /// A polygon group had fewer than three drawable vertices and was left out.
    #[error("polygon group `{group}` has {vertices} drawable vertices; at least 3 are needed")]
    DroppedPolygon {
        /// Group key (empty for an ungrouped polygon).
        group: String,
        /// Number of finite vertices found.
        vertices: usize,
    },

    /// An explicit legend break names a value absent from the data.
    #[error("break `{value}` on the {channel} scale does not match any category")]
    UnknownCategory {
        /// Channel the breaks were declared for.
        channel: Channel,
        /// Unknown value.
        value: String,
    },

    /// A referenced field does not exist in the dataset.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A numeric field holds a non-numeric value.
    #[error("field `{field}` row {row}: expected a number")]
    NonNumericValue {
        /// Field name.
        field: String,
        /// Row index.
        row: usize,
    },

    /// Columns of different lengths were supplied to the dataset builder.
    #[error("Data length mismatch: column `{field}` has {len} rows, expected {expected}")]
    DataLengthMismatch {
        /// Field name.
        field: String,
        /// Length of the offending column.
        len: usize,
        /// Length of the first column.
        expected: usize,
    },

    /// Confidence level outside (0, 1).
    #[error("confidence level {0} must lie strictly between 0 and 1")]
    InvalidLevel(f64),

    /// Too few segments to discretize an ellipse.
    #[error("ellipse needs at least 3 segments, got {0}")]
    InvalidSegments(usize),

    /// A canonical order does not cover every value in the data.
    #[error("canonical order for `{field}` is missing value `{value}`")]
    IncompleteOrder {
        /// Field name.
        field: String,
        /// Value present in the data but absent from the order.
        value: String,
    },

    /// Two contradictory transforms were declared for the same axis.
    #[error("conflicting transforms on the {axis} axis: {first} then {second}")]
    ConflictingTransform {
        /// Axis.
        axis: Axis,
        /// First declared transform.
        first: AxisTransform,
        /// Later, contradicting transform.
        second: AxisTransform,
    },

    /// Empty data provided where non-empty is required.
    #[error("Empty data provided")]
    EmptyData,

    /// A plot was built without any layer.
    #[error("No geometry layers specified")]
    NoLayers,

    /// Scale domain error (e.g., zero-width domain).
    #[error("Scale domain error: {0}")]
    ScaleDomain(String),
}

impl PlotError {
    /// Whether this error is a recoverable warning rather than a failure.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            PlotError::DegenerateCovariance { .. }
                | PlotError::UnknownCategory { .. }
                | PlotError::DroppedPolygon { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDimensions { width: 0, height: 100 };
        assert!(err.to_string().contains("Invalid dimensions"));
    }

    #[test]
    fn test_unresolved_channel_display() {
        let err = PlotError::UnresolvedChannel {
            layer: 2,
            channel: Channel::Label,
            geom: GeomKind::Text,
        };
        let msg = err.to_string();
        assert!(msg.contains("layer 2"));
        assert!(msg.contains("label"));
        assert!(msg.contains("text"));
    }

    #[test]
    fn test_plot_error_wraps_transparently() {
        let err: Error = PlotError::InsufficientSamples { group: "u".into(), count: 2 }.into();
        assert!(err.to_string().contains("group `u` has 2 samples"));
    }

    #[test]
    fn test_warning_classification() {
        assert!(PlotError::UnknownCategory { channel: Channel::Color, value: "Z".into() }
            .is_warning());
        assert!(PlotError::DegenerateCovariance { group: "a".into(), determinant: 0.0 }
            .is_warning());
        assert!(!PlotError::InsufficientSamples { group: "a".into(), count: 1 }.is_warning());
        assert!(PlotError::DroppedPolygon { group: "a".into(), vertices: 0 }.is_warning());
        assert!(!PlotError::NonFiniteSample { group: "a".into(), index: 2 }.is_warning());
        assert!(!PlotError::NoLayers.is_warning());
    }

    #[test]
    fn test_data_length_mismatch() {
        let err = PlotError::DataLengthMismatch { field: "F2".into(), len: 10, expected: 20 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("20"));
    }
}

//! Statistical transformations for Grammar of Graphics.
//!
//! Transforms data before visualization. Statistics are plain functions over
//! a [`Dataset`] producing a new, derived dataset; callers attach the result
//! to a layer. Nothing here decides which layers get which statistic.
//!
//! - [`aggregate`] / [`aggregate_dataset`]: per-group means.
//! - [`estimate_ellipse`] / [`stat_ellipse`]: bivariate normal confidence
//!   ellipses from the sample covariance.

use nalgebra::{Matrix2, SymmetricEigen};
use tracing::{debug, warn};

use crate::error::{PlotError, PlotResult};
use crate::geometry::Point;

use super::data::{DataValue, Dataset, Record};

/// Default confidence level for ellipses.
pub const DEFAULT_LEVEL: f64 = 0.95;

/// Default number of polygon vertices per ellipse.
pub const DEFAULT_SEGMENTS: usize = 64;

/// Minimum samples needed to estimate a covariance ellipse.
pub const MIN_ELLIPSE_SAMPLES: usize = 3;

/// Per-group means of a set of numeric fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    /// Group key.
    pub key: String,
    /// Number of records in the group.
    pub count: usize,
    /// `(field, mean)` in the order the fields were requested.
    pub means: Vec<(String, f64)>,
}

impl GroupSummary {
    /// Mean of a field, if it was aggregated.
    #[must_use]
    pub fn mean(&self, field: &str) -> Option<f64> {
        self.means.iter().find(|(f, _)| f == field).map(|&(_, m)| m)
    }
}

/// Arithmetic mean ignoring missing (NaN) values; NaN if none remain.
fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) =
        values.filter(|v| v.is_finite()).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Partition `dataset` by `group_field` and average each numeric field.
///
/// Groups appear in first-encountered order. Missing values are skipped.
///
/// # Errors
///
/// Returns [`PlotError::UnknownField`] for an unknown field and
/// [`PlotError::NonNumericValue`] if a numeric field holds text.
pub fn aggregate(
    dataset: &Dataset,
    group_field: &str,
    numeric_fields: &[&str],
) -> PlotResult<Vec<GroupSummary>> {
    let groups = dataset.partition(group_field)?;
    let columns = numeric_fields
        .iter()
        .map(|f| dataset.numeric(f).map(|col| (*f, col)))
        .collect::<PlotResult<Vec<_>>>()?;

    Ok(groups
        .into_iter()
        .map(|(key, rows)| GroupSummary {
            count: rows.len(),
            means: columns
                .iter()
                .map(|(field, col)| (field.to_string(), finite_mean(rows.iter().map(|&r| col[r]))))
                .collect(),
            key,
        })
        .collect())
}

/// One record per group carrying the group means under the original field names.
///
/// The group field keeps the first record's value and the canonical order of
/// the source dataset, so global bindings and palettes apply unchanged.
///
/// # Errors
///
/// Same as [`aggregate`].
pub fn aggregate_dataset(
    dataset: &Dataset,
    group_field: &str,
    numeric_fields: &[&str],
) -> PlotResult<Dataset> {
    let summaries = aggregate(dataset, group_field, numeric_fields)?;
    let groups = dataset.partition(group_field)?;
    let group_values = dataset.values(group_field)?;

    let records = summaries
        .iter()
        .zip(&groups)
        .map(|(summary, (_, rows))| {
            let key = rows
                .first()
                .map_or(DataValue::Null, |&r| group_values[r].clone());
            summary
                .means
                .iter()
                .fold(Record::new().with(group_field, key), |rec, (f, m)| rec.with(f, *m))
        })
        .collect();

    let out = Dataset::from_records(records);
    Ok(match dataset.canonical_order(group_field) {
        Some(order) => out.with_order_annotation(group_field, order.to_vec()),
        None => out,
    })
}

/// Quantile of the chi-squared distribution with 2 degrees of freedom.
///
/// Closed form `-2 ln(1 - p)`.
#[must_use]
pub fn chi2_quantile_2df(p: f64) -> f64 {
    -2.0 * (-p).ln_1p()
}

/// A confidence ellipse discretized as a polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsePolygon {
    /// Group key.
    pub key: String,
    /// Sample mean.
    pub center: Point,
    /// Semi-axis lengths, major first.
    pub semi_axes: (f64, f64),
    /// Direction of the major axis in radians.
    pub angle: f64,
    /// Open ring of vertices; closure back to the first is implied.
    pub vertices: Vec<Point>,
}

/// Result of a single ellipse estimation: the polygon plus an optional warning.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseEstimate {
    /// The ellipse.
    pub polygon: EllipsePolygon,
    /// Set when the covariance was degenerate; the polygon is still usable.
    pub warning: Option<PlotError>,
}

/// Estimate the `level` confidence ellipse of a bivariate sample.
///
/// Uses the unbiased sample covariance and its eigendecomposition; the radius
/// factor is `sqrt(chi2_quantile_2df(level))`. Vertex `k` sits at angle
/// `2πk / segments` on the parametric ellipse.
///
/// # Errors
///
/// Returns [`PlotError::InsufficientSamples`] below three samples,
/// [`PlotError::NonFiniteSample`] for a NaN or infinite coordinate,
/// [`PlotError::InvalidLevel`] unless `0 < level < 1`,
/// [`PlotError::InvalidSegments`] below three segments and
/// [`PlotError::EllipseOverflow`] if the polygon leaves the `f64` range.
pub fn estimate_ellipse(
    key: &str,
    samples: &[(f64, f64)],
    level: f64,
    segments: usize,
) -> PlotResult<EllipseEstimate> {
    if samples.len() < MIN_ELLIPSE_SAMPLES {
        return Err(PlotError::InsufficientSamples { group: key.to_string(), count: samples.len() });
    }
    if let Some(index) = samples.iter().position(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(PlotError::NonFiniteSample { group: key.to_string(), index });
    }
    validate_params(level, segments)?;
    let overflow = || PlotError::EllipseOverflow { group: key.to_string() };

    let n = samples.len() as f64;
    let (sx, sy) = samples.iter().fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let center = if sx.is_finite() && sy.is_finite() {
        Point::new(sx / n, sy / n)
    } else {
        let (mx, my) =
            samples.iter().fold((0.0, 0.0), |(mx, my), &(x, y)| (mx + x / n, my + y / n));
        Point::new(mx, my)
    };

    // Deviations are measured in units of the largest one so squares stay finite.
    let spread = samples.iter().fold(0.0f64, |m, &(x, y)| {
        m.max((x - center.x).abs()).max((y - center.y).abs())
    });
    if !spread.is_finite() {
        return Err(overflow());
    }
    let unit = if spread > 0.0 { spread } else { 1.0 };

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in samples {
        let (dx, dy) = ((x - center.x) / unit, (y - center.y) / unit);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let cov = Matrix2::new(sxx, sxy, sxy, syy) / (n - 1.0);

    let normalized = cov.determinant();
    let trace = cov.trace();
    let warning = (normalized <= 1e-12 * (trace * trace + f64::MIN_POSITIVE)).then(|| {
        let determinant = normalized * unit.powi(4);
        warn!(group = key, determinant, "degenerate covariance; ellipse collapses to a segment");
        PlotError::DegenerateCovariance { group: key.to_string(), determinant }
    });

    let eigen = SymmetricEigen::new(cov);
    let (major, minor) =
        if eigen.eigenvalues[0] >= eigen.eigenvalues[1] { (0, 1) } else { (1, 0) };
    let lambda1 = eigen.eigenvalues[major].max(0.0);
    let lambda2 = eigen.eigenvalues[minor].max(0.0);

    // Canonical sign: major axis points right (or up when vertical).
    let (mut ux, mut uy) = (eigen.eigenvectors[(0, major)], eigen.eigenvectors[(1, major)]);
    if ux < -1e-12 || (ux.abs() <= 1e-12 && uy < 0.0) {
        ux = -ux;
        uy = -uy;
    }
    let (vx, vy) = (-uy, ux);

    let scale = chi2_quantile_2df(level).sqrt() * unit;
    let (a, b) = (scale * lambda1.sqrt(), scale * lambda2.sqrt());

    let vertices: Vec<Point> = (0..segments)
        .map(|k| {
            let theta = std::f64::consts::TAU * k as f64 / segments as f64;
            let (c, s) = (a * theta.cos(), b * theta.sin());
            Point::new(center.x + c * ux + s * vx, center.y + c * uy + s * vy)
        })
        .collect();
    let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
    if !(a.is_finite() && b.is_finite() && vertices.iter().all(finite)) {
        return Err(overflow());
    }

    Ok(EllipseEstimate {
        polygon: EllipsePolygon {
            key: key.to_string(),
            center,
            semi_axes: (a, b),
            angle: uy.atan2(ux),
            vertices,
        },
        warning,
    })
}

fn validate_params(level: f64, segments: usize) -> PlotResult<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(PlotError::InvalidLevel(level));
    }
    if segments < 3 {
        return Err(PlotError::InvalidSegments(segments));
    }
    Ok(())
}

/// Ellipses for every group of a dataset, with per-group issues.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseSet {
    /// Field the groups were keyed by.
    pub group_field: String,
    /// Field holding x positions.
    pub x_field: String,
    /// Field holding y positions.
    pub y_field: String,
    /// Successfully estimated ellipses, in group order.
    pub ellipses: Vec<EllipsePolygon>,
    /// Failed groups (errors) and degenerate ones (warnings), in group order.
    pub issues: Vec<PlotError>,
    canonical_order: Option<Vec<String>>,
}

impl EllipseSet {
    /// Look up the ellipse of a group.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EllipsePolygon> {
        self.ellipses.iter().find(|e| e.key == key)
    }

    /// Vertex records (group, x, y) in polygon order, ready for a polygon layer.
    #[must_use]
    pub fn to_dataset(&self) -> Dataset {
        let records = self
            .ellipses
            .iter()
            .flat_map(|e| {
                e.vertices.iter().map(move |v| {
                    Record::new()
                        .with(&self.group_field, e.key.as_str())
                        .with(&self.x_field, v.x)
                        .with(&self.y_field, v.y)
                })
            })
            .collect();
        let out = Dataset::from_records(records);
        match &self.canonical_order {
            Some(order) => out.with_order_annotation(&self.group_field, order.clone()),
            None => out,
        }
    }
}

/// Estimate a confidence ellipse per group of `dataset`.
///
/// Rows with a missing x or y are skipped. Groups failing estimation are left
/// out of [`EllipseSet::ellipses`] and reported in [`EllipseSet::issues`].
///
/// # Errors
///
/// Fails as a whole only on unknown or non-numeric fields and invalid
/// `level` / `segments`.
pub fn stat_ellipse(
    dataset: &Dataset,
    group_field: &str,
    x_field: &str,
    y_field: &str,
    level: f64,
    segments: usize,
) -> PlotResult<EllipseSet> {
    validate_params(level, segments)?;
    let xs = dataset.numeric(x_field)?;
    let ys = dataset.numeric(y_field)?;
    let groups: Vec<(String, Vec<(f64, f64)>)> = dataset
        .partition(group_field)?
        .into_iter()
        .map(|(key, rows)| {
            let samples = rows
                .iter()
                .map(|&r| (xs[r], ys[r]))
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect();
            (key, samples)
        })
        .collect();

    debug!(groups = groups.len(), level, segments, "estimating confidence ellipses");

    #[cfg(feature = "parallel")]
    let results: Vec<PlotResult<EllipseEstimate>> = {
        use rayon::prelude::*;
        groups
            .par_iter()
            .map(|(key, samples)| estimate_ellipse(key, samples, level, segments))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<PlotResult<EllipseEstimate>> = groups
        .iter()
        .map(|(key, samples)| estimate_ellipse(key, samples, level, segments))
        .collect();

    let mut ellipses = Vec::new();
    let mut issues = Vec::new();
    for result in results {
        match result {
            Ok(estimate) => {
                issues.extend(estimate.warning);
                ellipses.push(estimate.polygon);
            }
            Err(err) => {
                warn!(%err, "skipping ellipse");
                issues.push(err);
            }
        }
    }

    Ok(EllipseSet {
        group_field: group_field.to_string(),
        x_field: x_field.to_string(),
        y_field: y_field.to_string(),
        ellipses,
        issues,
        canonical_order: dataset.canonical_order(group_field).map(<[String]>::to_vec),
    })
}


// ============================================================================
// Property-based tests with proptest
// ============================================================================

//! Geometric primitives for visualization.
//!
//! Provides the point and extent types shared by statistics, the render plan
//! and the rasterizer, plus the polygon measures used to check ellipses.

/// A 2D point with double-precision coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate the distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned extent in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bounds {
    /// Minimum x.
    pub x_min: f64,
    /// Maximum x.
    pub x_max: f64,
    /// Minimum y.
    pub y_min: f64,
    /// Maximum y.
    pub y_max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// An empty extent that any point will grow.
    pub const EMPTY: Self = Self {
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };

    /// Grow the extent to include a point. Non-finite coordinates are ignored.
    pub fn include(&mut self, p: Point) {
        if p.x.is_finite() {
            self.x_min = self.x_min.min(p.x);
            self.x_max = self.x_max.max(p.x);
        }
        if p.y.is_finite() {
            self.y_min = self.y_min.min(p.y);
            self.y_max = self.y_max.max(p.y);
        }
    }

    /// Whether no point has been included on either axis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    /// Widen zero-width axes by one unit and pad both axes by a fraction of their span.
    #[must_use]
    pub fn padded(self, fraction: f64) -> Self {
        let (mut x_min, mut x_max, mut y_min, mut y_max) = if self.is_empty() {
            (0.0, 1.0, 0.0, 1.0)
        } else {
            (self.x_min, self.x_max, self.y_min, self.y_max)
        };

        if x_min >= x_max {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if y_min >= y_max {
            y_min -= 1.0;
            y_max += 1.0;
        }

        let x_pad = (x_max - x_min) * fraction;
        let y_pad = (y_max - y_min) * fraction;
        Self { x_min: x_min - x_pad, x_max: x_max + x_pad, y_min: y_min - y_pad, y_max: y_max + y_pad }
    }
}

/// Signed area of a closed polygon (shoelace formula); positive when counter-clockwise.
#[must_use]
pub fn polygon_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, p) in vertices.iter().enumerate() {
        let q = vertices[(i + 1) % vertices.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    twice / 2.0
}

/// Arithmetic mean of a vertex set.
#[must_use]
pub fn vertex_mean(vertices: &[Point]) -> Option<Point> {
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let (sx, sy) = vertices.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

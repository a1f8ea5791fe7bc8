//! Primitive rendering functions.
//!
//! Rasterization for the marks a render plan can contain: lines, rectangles,
//! filled circles, point markers and filled polygons. Coordinates are pixels.

use crate::color::Rgba;
use crate::framebuffer::Framebuffer;
use crate::geometry::Point;
use crate::grammar::PointShape;

// ============================================================================
// Line Drawing
// ============================================================================

/// Draw a line using Bresenham's algorithm (non-antialiased).
pub fn draw_line(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);
    loop {
        if x >= 0 && y >= 0 {
            fb.blend_pixel(x as u32, y as u32, color);
        }
        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw an anti-aliased line using Wu's algorithm.
///
/// Two pixels are plotted per step along the major axis, weighted by the
/// fractional distance to the ideal line.
///
/// # References
///
/// Wu, X. (1991). "An Efficient Antialiasing Technique." SIGGRAPH '91.
pub fn draw_line_aa(fb: &mut Framebuffer, from: Point, to: Point, color: Rgba) {
    let (mut x0, mut y0, mut x1, mut y1) = (from.x, from.y, to.x, to.y);
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let gradient = if dx.abs() < f64::EPSILON { 1.0 } else { (y1 - y0) / dx };
    let mut put = |major: i32, minor: i32, intensity: f64| {
        if steep {
            plot(fb, minor, major, color, intensity);
        } else {
            plot(fb, major, minor, color, intensity);
        }
    };

    // Endpoints
    let xend = x0.round();
    let yend = y0 + gradient * (xend - x0);
    let xgap = rfpart(x0 + 0.5);
    let xpxl1 = xend as i32;
    put(xpxl1, yend.floor() as i32, rfpart(yend) * xgap);
    put(xpxl1, yend.floor() as i32 + 1, fpart(yend) * xgap);
    let mut intery = yend + gradient;

    let xend = x1.round();
    let yend = y1 + gradient * (xend - x1);
    let xgap = fpart(x1 + 0.5);
    let xpxl2 = xend as i32;
    put(xpxl2, yend.floor() as i32, rfpart(yend) * xgap);
    put(xpxl2, yend.floor() as i32 + 1, fpart(yend) * xgap);

    for x in (xpxl1 + 1)..xpxl2 {
        let ipart = intery.floor() as i32;
        put(x, ipart, rfpart(intery));
        put(x, ipart + 1, fpart(intery));
        intery += gradient;
    }
}

/// Draw a line `width` pixels wide as parallel anti-aliased strokes.
pub fn draw_thick_line(fb: &mut Framebuffer, from: Point, to: Point, width: f64, color: Rgba) {
    let len = from.distance(to);
    if len < f64::EPSILON {
        return;
    }
    let (nx, ny) = (-(to.y - from.y) / len, (to.x - from.x) / len);
    let strokes = width.round().max(1.0) as i32;
    for i in 0..strokes {
        let offset = f64::from(i) - f64::from(strokes - 1) / 2.0;
        let shift = |p: Point| Point::new(p.x + nx * offset, p.y + ny * offset);
        draw_line_aa(fb, shift(from), shift(to), color);
    }
}

#[inline]
fn plot(fb: &mut Framebuffer, x: i32, y: i32, color: Rgba, intensity: f64) {
    if x >= 0 && y >= 0 {
        let alpha = (f64::from(color.a) * intensity.clamp(0.0, 1.0)) as u8;
        fb.blend_pixel(x as u32, y as u32, color.with_alpha(alpha));
    }
}

#[inline]
fn fpart(x: f64) -> f64 {
    x - x.floor()
}

#[inline]
fn rfpart(x: f64) -> f64 {
    1.0 - fpart(x)
}

// ============================================================================
// Rectangle Drawing
// ============================================================================

/// Draw a filled rectangle; translucent colors are blended.
pub fn draw_rect(fb: &mut Framebuffer, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
    let (x0, y0) = (x.max(0), y.max(0));
    let x1 = x.saturating_add(width as i32);
    let y1 = y.saturating_add(height as i32);
    for row in y0..y1 {
        fb.blend_span(row as u32, x0 as u32, x1.max(0) as u32, color);
    }
}

/// Draw a rectangle outline.
pub fn draw_rect_outline(
    fb: &mut Framebuffer,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgba,
    thickness: u32,
) {
    let t = thickness.max(1).min(width).min(height);
    let (w, h) = (width as i32, height as i32);
    let ti = t as i32;

    draw_rect(fb, x, y, width, t, color);
    draw_rect(fb, x, y + h - ti, width, t, color);
    if height > 2 * t {
        draw_rect(fb, x, y + ti, t, height - 2 * t, color);
        draw_rect(fb, x + w - ti, y + ti, t, height - 2 * t, color);
    }
}

// ============================================================================
// Circle/Marker Drawing
// ============================================================================

/// Draw a filled circle using the midpoint algorithm.
pub fn draw_circle(fb: &mut Framebuffer, cx: i32, cy: i32, radius: i32, color: Rgba) {
    if radius <= 0 {
        if radius == 0 && cx >= 0 && cy >= 0 {
            fb.blend_pixel(cx as u32, cy as u32, color);
        }
        return;
    }

    // Each octant step contributes up to four rows; collect the widest span
    // per row so translucent colors are blended exactly once.
    let mut half_widths = vec![-1i32; (2 * radius + 1) as usize];
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;
    while x >= y {
        for (dy, half) in [(y, x), (-y, x), (x, y), (-x, y)] {
            let slot = &mut half_widths[(dy + radius) as usize];
            *slot = (*slot).max(half);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }

    for (i, &half) in half_widths.iter().enumerate() {
        if half >= 0 {
            draw_span(fb, cx - half, cx + half, cy - radius + i as i32, color);
        }
    }
}

/// Draw a point marker of the given shape, `size` pixels across.
///
/// Solid shapes are filled with `color`; `fill`, when given, paints the
/// interior and `color` becomes the outline.
pub fn draw_marker(
    fb: &mut Framebuffer,
    center: Point,
    shape: PointShape,
    size: f64,
    color: Rgba,
    fill: Option<Rgba>,
) {
    let r = (size / 2.0).max(0.5);
    let (cx, cy) = (center.x, center.y);
    let interior = fill.unwrap_or(color);
    let ring = |points: &[(f64, f64)]| -> Vec<Point> {
        points.iter().map(|&(dx, dy)| Point::new(cx + dx * r, cy + dy * r)).collect()
    };

    match shape {
        PointShape::Circle => {
            let (x, y, radius) = (cx.round() as i32, cy.round() as i32, r.round() as i32);
            if fill.is_some() {
                draw_circle(fb, x, y, radius, color);
                draw_circle(fb, x, y, radius - 1, interior);
            } else {
                draw_circle(fb, x, y, radius, color);
            }
        }
        PointShape::Triangle => {
            let h = 3f64.sqrt() / 2.0;
            let vertices = ring(&[(0.0, -1.0), (h, 0.5), (-h, 0.5)]);
            fill_polygon(fb, &vertices, interior);
            if fill.is_some() {
                stroke_polygon(fb, &vertices, 1.0, color);
            }
        }
        PointShape::Square => {
            let s = std::f64::consts::FRAC_1_SQRT_2;
            let vertices = ring(&[(-s, -s), (s, -s), (s, s), (-s, s)]);
            fill_polygon(fb, &vertices, interior);
            if fill.is_some() {
                stroke_polygon(fb, &vertices, 1.0, color);
            }
        }
        PointShape::Diamond => {
            let vertices = ring(&[(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)]);
            fill_polygon(fb, &vertices, interior);
            if fill.is_some() {
                stroke_polygon(fb, &vertices, 1.0, color);
            }
        }
        PointShape::Cross => {
            let (x, y) = (cx.round() as i32, cy.round() as i32);
            let arm = r.round() as i32;
            let bar = (r / 3.0).round().max(1.0) as i32;
            let half = bar / 2;
            let len = (2 * arm + 1) as u32;
            // Horizontal bar, then the vertical bar above and below it.
            draw_rect(fb, x - arm, y - half, len, bar as u32, color);
            draw_rect(fb, x - half, y - arm, bar as u32, (arm - half).max(0) as u32, color);
            let below = (arm + 1 + half - bar).max(0) as u32;
            draw_rect(fb, x - half, y - half + bar, bar as u32, below, color);
        }
        PointShape::X => {
            let (x, y) = (cx.round() as i32, cy.round() as i32);
            let d = (r * std::f64::consts::FRAC_1_SQRT_2).round() as i32;
            let bar = (r / 3.0).round().max(1.0) as i32;
            for k in 0..bar {
                draw_line(fb, x - d + k, y - d, x + d + k, y + d, color);
                draw_line(fb, x - d + k, y + d, x + d + k, y - d, color);
            }
        }
    }
}

/// Blend the inclusive pixel run `[x1, x2]` on row `y`.
#[inline]
fn draw_span(fb: &mut Framebuffer, x1: i32, x2: i32, y: i32, color: Rgba) {
    if y < 0 || x2 < 0 {
        return;
    }
    fb.blend_span(y as u32, x1.max(0) as u32, (x2 + 1) as u32, color);
}

// ============================================================================
// Polygon Drawing
// ============================================================================

/// Fill a simple polygon with the even-odd rule.
///
/// Each row is sampled at its pixel centers; a pixel is inside when its
/// center lies between an odd and the following even edge crossing. Rows are
/// blended span by span, so a translucent fill darkens every covered pixel
/// exactly once.
pub fn fill_polygon(fb: &mut Framebuffer, vertices: &[Point], color: Rgba) {
    if vertices.len() < 3 || color.a == 0 {
        return;
    }
    let (y_min, y_max) = vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v.y), hi.max(v.y)));
    if !y_min.is_finite() || !y_max.is_finite() {
        return;
    }

    let first_row = (y_min - 0.5).ceil().max(0.0) as i64;
    let last_row = ((y_max - 0.5).floor() as i64).min(i64::from(fb.height()) - 1);
    let mut crossings = Vec::with_capacity(vertices.len());

    for row in first_row..=last_row {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            if (a.y <= yc && yc < b.y) || (b.y <= yc && yc < a.y) {
                crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0);
            let end = (pair[1] - 0.5).ceil().max(0.0);
            if end > start {
                fb.blend_span(row as u32, start as u32, end as u32, color);
            }
        }
    }
}

/// Stroke the closed outline of a polygon.
pub fn stroke_polygon(fb: &mut Framebuffer, vertices: &[Point], width: f64, color: Rgba) {
    if vertices.len() < 2 || width <= 0.0 {
        return;
    }
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        draw_thick_line(fb, a, b, width, color);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Framebuffer {
        let mut fb = Framebuffer::new(100, 100).expect("framebuffer creation should succeed");
        fb.clear(Rgba::WHITE);
        fb
    }

    #[test]
    fn test_draw_line_horizontal() {
        let mut fb = canvas();
        draw_line(&mut fb, 10, 50, 90, 50, Rgba::BLACK);

        assert_eq!(fb.get_pixel(10, 50), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(90, 50), Some(Rgba::BLACK));
        assert_eq!(fb.count_color(Rgba::BLACK), 81);
    }

    #[test]
    fn test_draw_line_diagonal() {
        let mut fb = canvas();
        draw_line(&mut fb, 10, 10, 90, 90, Rgba::BLACK);

        assert_eq!(fb.get_pixel(10, 10), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::BLACK));
        assert_eq!(fb.get_pixel(90, 90), Some(Rgba::BLACK));
    }

    #[test]
    fn test_line_out_of_bounds() {
        let mut fb = canvas();
        draw_line(&mut fb, -10, -10, 110, 110, Rgba::BLACK);
        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::BLACK));
    }

    #[test]
    fn test_draw_line_aa_darkens_path() {
        let mut fb = canvas();
        draw_line_aa(&mut fb, Point::new(10.0, 10.0), Point::new(90.0, 50.0), Rgba::BLACK);

        let (min, _, _) = fb.luminance_stats();
        assert!(min < 128.0);
        assert_eq!(fb.get_pixel(50, 90), Some(Rgba::WHITE));
    }

    #[test]
    fn test_thick_line_covers_width() {
        let mut fb = canvas();
        draw_thick_line(&mut fb, Point::new(10.0, 50.0), Point::new(90.0, 50.0), 3.0, Rgba::BLACK);

        for y in 49..=51 {
            assert_eq!(fb.get_pixel(50, y), Some(Rgba::BLACK), "row {y}");
        }
        assert_eq!(fb.get_pixel(50, 55), Some(Rgba::WHITE));
    }

    #[test]
    fn test_draw_rect_and_outline() {
        let mut fb = canvas();
        draw_rect(&mut fb, 20, 20, 30, 30, Rgba::RED);
        draw_rect_outline(&mut fb, 60, 60, 30, 30, Rgba::BLUE, 2);

        assert_eq!(fb.get_pixel(25, 25), Some(Rgba::RED));
        assert_eq!(fb.get_pixel(10, 10), Some(Rgba::WHITE));
        assert_eq!(fb.get_pixel(60, 60), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(89, 75), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(75, 75), Some(Rgba::WHITE));
    }

    #[test]
    fn test_draw_rect_negative_origin() {
        let mut fb = canvas();
        draw_rect(&mut fb, -5, -5, 10, 10, Rgba::RED);
        assert_eq!(fb.count_color(Rgba::RED), 25);
    }

    #[test]
    fn test_draw_circle() {
        let mut fb = canvas();
        draw_circle(&mut fb, 50, 50, 20, Rgba::BLUE);

        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(70, 50), Some(Rgba::BLUE));
        assert_eq!(fb.get_pixel(50, 29), Some(Rgba::WHITE));
        assert_eq!(fb.get_pixel(5, 5), Some(Rgba::WHITE));
    }

    #[test]
    fn test_translucent_circle_blends_once() {
        let mut fb = canvas();
        draw_circle(&mut fb, 50, 50, 10, Rgba::new(0, 0, 0, 128));

        // Any pixel blended twice would be darker than one pass.
        let center = fb.get_pixel(50, 50).unwrap();
        let edge = fb.get_pixel(50, 41).unwrap();
        assert_eq!(center, edge);
    }

    #[test]
    fn test_circle_zero_radius() {
        let mut fb = canvas();
        draw_circle(&mut fb, 50, 50, 0, Rgba::RED);
        assert_eq!(fb.count_color(Rgba::RED), 1);
    }

    #[test]
    fn test_fill_polygon_square() {
        let mut fb = canvas();
        let square = [
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(30.0, 30.0),
            Point::new(10.0, 30.0),
        ];
        fill_polygon(&mut fb, &square, Rgba::GREEN);

        assert_eq!(fb.count_color(Rgba::GREEN), 400);
        assert_eq!(fb.get_pixel(10, 10), Some(Rgba::GREEN));
        assert_eq!(fb.get_pixel(30, 30), Some(Rgba::WHITE));
    }

    #[test]
    fn test_fill_polygon_clips_and_ignores_degenerate() {
        let mut fb = canvas();
        let triangle = [Point::new(-50.0, -50.0), Point::new(150.0, 50.0), Point::new(-50.0, 150.0)];
        fill_polygon(&mut fb, &triangle, Rgba::RED);
        assert_eq!(fb.get_pixel(0, 50), Some(Rgba::RED));

        let mut blank = canvas();
        fill_polygon(&mut blank, &triangle[..2], Rgba::RED);
        let nan = [Point::new(f64::NAN, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 0.0)];
        fill_polygon(&mut blank, &nan, Rgba::RED);
        assert_eq!(blank.count_color(Rgba::RED), 0);
    }

    #[test]
    fn test_translucent_polygon_overlap_darkens() {
        let mut fb = canvas();
        let a = [Point::new(10.0, 10.0), Point::new(60.0, 10.0), Point::new(60.0, 60.0), Point::new(10.0, 60.0)];
        let b = [Point::new(40.0, 40.0), Point::new(90.0, 40.0), Point::new(90.0, 90.0), Point::new(40.0, 90.0)];
        let tint = Rgba::new(0, 0, 255, 80);
        fill_polygon(&mut fb, &a, tint);
        fill_polygon(&mut fb, &b, tint);

        let single = fb.get_pixel(20, 20).unwrap();
        let double = fb.get_pixel(50, 50).unwrap();
        assert!(double.r < single.r);
        assert_eq!(single, fb.get_pixel(80, 80).unwrap());
    }

    #[test]
    fn test_markers_paint_their_center() {
        for shape in PointShape::WHEEL {
            let mut fb = canvas();
            draw_marker(&mut fb, Point::new(50.0, 50.0), shape, 12.0, Rgba::BLACK, None);
            let (min, _, _) = fb.luminance_stats();
            assert!(min < 1.0, "{} left no solid pixel", shape.name());
            assert_eq!(fb.get_pixel(5, 5), Some(Rgba::WHITE));
        }
    }

    #[test]
    fn test_marker_fill_paints_interior() {
        let mut fb = canvas();
        draw_marker(&mut fb, Point::new(50.0, 50.0), PointShape::Square, 20.0, Rgba::BLACK, Some(Rgba::RED));
        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::RED));
    }

    #[test]
    fn test_stroke_polygon_leaves_interior() {
        let mut fb = canvas();
        let square = [
            Point::new(20.0, 20.0),
            Point::new(80.0, 20.0),
            Point::new(80.0, 80.0),
            Point::new(20.0, 80.0),
        ];
        stroke_polygon(&mut fb, &square, 1.0, Rgba::BLACK);
        assert_eq!(fb.get_pixel(50, 50), Some(Rgba::WHITE));
        assert_eq!(fb.get_pixel(50, 20), Some(Rgba::BLACK));
    }
}

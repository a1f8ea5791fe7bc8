//! Raster backend: draws a [`RenderPlan`] into a [`Framebuffer`].
//!
//! Paint order is background, panel, grid, the plan's primitives in sequence,
//! axes and border, then the legend keys. The raster backend has no font, so
//! text primitives contribute only their label boxes; use the SVG encoder
//! for annotated output.

use tracing::debug;

use crate::color::Rgba;
use crate::error::Result;
use crate::framebuffer::Framebuffer;
use crate::geometry::Point;
use crate::grammar::{DrawPrimitive, GeomKind, LegendEntry, LegendGuide, PointShape, RenderPlan};

use super::layout::{text_extent, LegendSlot, Viewport, KEY_SIZE, TICK_LENGTH};
use super::primitives::{draw_marker, draw_rect, draw_rect_outline, fill_polygon, stroke_polygon};

/// Rasterize a plan onto a `width` x `height` canvas.
///
/// # Errors
///
/// Returns an error if the dimensions are zero or too small for the layout.
pub fn rasterize(plan: &RenderPlan, width: u32, height: u32) -> Result<Framebuffer> {
    let mut fb = Framebuffer::new(width, height)?;
    let vp = Viewport::new(plan, width, height)?;
    let theme = &plan.theme;

    fb.clear(theme.background);
    let (px, py) = (vp.left.round() as i32, vp.top.round() as i32);
    let (pw, ph) = (vp.panel_width().round() as u32, vp.panel_height().round() as u32);
    draw_rect(&mut fb, px, py, pw, ph, theme.panel_background);

    if theme.show_grid {
        let line = theme.grid_width.round().max(1.0) as u32;
        for tick in &plan.x_axis.ticks {
            let x = vp.project_x(tick.position).round() as i32;
            draw_rect(&mut fb, x, py, line, ph, theme.grid_color);
        }
        for tick in &plan.y_axis.ticks {
            let y = vp.project_y(tick.position).round() as i32;
            draw_rect(&mut fb, px, y, pw, line, theme.grid_color);
        }
    }

    for primitive in &plan.primitives {
        draw_primitive(&mut fb, &vp, primitive);
    }

    if theme.show_axis {
        let line = theme.axis_width.round().max(1.0) as u32;
        let bottom = vp.bottom.round() as i32;
        let tick = TICK_LENGTH as u32;
        draw_rect(&mut fb, px, bottom, pw, line, theme.axis_color);
        draw_rect(&mut fb, px - line as i32, py, line, ph, theme.axis_color);
        for t in &plan.x_axis.ticks {
            let x = vp.project_x(t.position).round() as i32;
            draw_rect(&mut fb, x, bottom, line, tick, theme.axis_color);
        }
        for t in &plan.y_axis.ticks {
            let y = vp.project_y(t.position).round() as i32;
            draw_rect(&mut fb, px - tick as i32, y, tick, line, theme.axis_color);
        }
    }
    if theme.show_panel_border {
        draw_rect_outline(&mut fb, px, py, pw, ph, theme.axis_color, 1);
    }

    if let Some(legend) = &plan.legend {
        for slot in vp.legend_slots(legend) {
            if let LegendSlot::Key { guide, entry, at } = slot {
                let guide = &legend.guides[guide];
                draw_key(&mut fb, at, guide, &guide.entries[entry]);
            }
        }
    }

    debug!(width, height, primitives = plan.primitives.len(), "plan rasterized");
    Ok(fb)
}

fn draw_primitive(fb: &mut Framebuffer, vp: &Viewport, primitive: &DrawPrimitive) {
    match primitive {
        DrawPrimitive::Polygon { vertices, fill, stroke, stroke_width, .. } => {
            let pixels: Vec<Point> = vertices.iter().map(|v| vp.project(*v)).collect();
            if let Some(fill) = fill {
                fill_polygon(fb, &pixels, *fill);
            }
            if let Some(stroke) = stroke {
                stroke_polygon(fb, &pixels, *stroke_width, *stroke);
            }
        }
        DrawPrimitive::Point { position, shape, color, fill, size, .. } => {
            draw_marker(fb, vp.project(*position), *shape, *size, *color, *fill);
        }
        DrawPrimitive::Text { position, text, size, boxed: Some(label), .. } => {
            let center = vp.project(*position);
            let (w, h) = text_extent(text, *size);
            let (bw, bh) = (w + 2.0 * label.padding, h + 2.0 * label.padding);
            let x = (center.x - bw / 2.0).round() as i32;
            let y = (center.y - bh / 2.0).round() as i32;
            let (bw, bh) = (bw.round() as u32, bh.round() as u32);
            draw_rect(fb, x, y, bw, bh, label.fill);
            draw_rect_outline(fb, x, y, bw, bh, label.border, 1);
        }
        DrawPrimitive::Text { boxed: None, .. } => {}
    }
}

/// Draw one legend key: a fill swatch for polygon guides, then a marker for
/// point guides, or a bare label box for text-only guides.
fn draw_key(fb: &mut Framebuffer, at: Point, guide: &LegendGuide, entry: &LegendEntry) {
    let (x, y, side) = (at.x.round() as i32, at.y.round() as i32, KEY_SIZE as u32);
    let center = Point::new(at.x + KEY_SIZE / 2.0, at.y + KEY_SIZE / 2.0);
    let has = |kind: GeomKind| guide.glyphs.contains(&kind);

    if has(GeomKind::Polygon) {
        if let Some(fill) = entry.fill {
            draw_rect(fb, x, y, side, side, fill);
        }
        if let Some(color) = entry.color {
            draw_rect_outline(fb, x, y, side, side, color, 1);
        }
    }
    if has(GeomKind::Point) {
        let shape = entry.shape.unwrap_or(PointShape::Circle);
        let color = entry.color.unwrap_or(Rgba::BLACK);
        draw_marker(fb, center, shape, KEY_SIZE * 0.5, color, None);
    } else if !has(GeomKind::Polygon) {
        let color = entry.color.or(entry.fill).unwrap_or(Rgba::BLACK);
        draw_rect(fb, x + 2, y + 2, side - 4, side - 4, Rgba::WHITE);
        draw_rect_outline(fb, x + 2, y + 2, side - 4, side - 4, color, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::grammar::{
        hue_palette, stat_ellipse, Aes, Dataset, GGPlot, Geom, Layer, LegendPosition, Theme,
    };

    fn formants() -> Dataset {
        Dataset::builder()
            .numeric("F1", &[300.0, 330.0, 310.0, 290.0, 700.0, 740.0, 680.0, 720.0])
            .numeric("F2", &[2300.0, 2250.0, 2200.0, 2350.0, 1200.0, 1150.0, 1250.0, 1300.0])
            .categorical("vowel", &["i", "i", "i", "i", "a", "a", "a", "a"])
            .build()
            .expect("dataset should build")
    }

    fn vowel_plot() -> GGPlot {
        GGPlot::new()
            .data(formants())
            .aes(Aes::new().x("F2").y("F1").color("vowel"))
            .scale_x_reverse()
            .scale_y_reverse()
    }

    #[test]
    fn test_background_and_panel() {
        let plot = vowel_plot().geom(Geom::point()).build().unwrap();
        let plan = plot.render_plan();
        let fb = rasterize(&plan, 400, 300).unwrap();

        assert_eq!(fb.get_pixel(1, 1), Some(plan.theme.background));
        let vp = Viewport::new(&plan, 400, 300).unwrap();
        let inside = fb.count_color(plan.theme.panel_background);
        assert!(inside > (vp.panel_width() * vp.panel_height() / 2.0) as usize);
    }

    #[test]
    fn test_points_painted_in_palette_color() {
        let plot = vowel_plot().geom(Geom::point().size(8.0)).build().unwrap();
        let plan = plot.render_plan();
        let fb = rasterize(&plan, 400, 300).unwrap();
        let vp = Viewport::new(&plan, 400, 300).unwrap();

        let first = plan
            .primitives
            .iter()
            .find_map(|p| match p {
                DrawPrimitive::Point { position, color, .. } => Some((*position, *color)),
                _ => None,
            })
            .unwrap();
        let px = vp.project(first.0);
        assert_eq!(fb.get_pixel(px.x.round() as u32, px.y.round() as u32), Some(first.1));
        assert!(hue_palette(2).contains(&first.1));
    }

    #[test]
    fn test_later_layers_paint_over_earlier() {
        let data = formants();
        let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", 0.95, 64).unwrap();
        let plot = vowel_plot()
            .layer(Layer::new(Geom::polygon()).ellipses(&ellipses).aes(Aes::new().fill("vowel")))
            .geom(Geom::point().size(8.0))
            .legend_position(LegendPosition::None)
            .build()
            .unwrap();
        let plan = plot.render_plan();
        let fb = rasterize(&plan, 400, 300).unwrap();
        let vp = Viewport::new(&plan, 400, 300).unwrap();

        for p in plan.layer_primitives(1) {
            if let DrawPrimitive::Point { position, color, .. } = p {
                let px = vp.project(*position);
                assert_eq!(fb.get_pixel(px.x.round() as u32, px.y.round() as u32), Some(*color));
            }
        }
    }

    #[test]
    fn test_translucent_ellipse_tints_panel() {
        let data = formants();
        let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", 0.95, 64).unwrap();
        let plot = vowel_plot()
            .layer(
                Layer::new(Geom::polygon().alpha(0.3))
                    .ellipses(&ellipses)
                    .aes(Aes::new().fill("vowel")),
            )
            .build()
            .unwrap();
        let plan = plot.render_plan();
        let fb = rasterize(&plan, 400, 300).unwrap();
        let vp = Viewport::new(&plan, 400, 300).unwrap();

        // Both axes are reversed, so the plan holds negated positions.
        let raw = ellipses.ellipses[0].center;
        let center = vp.project(Point::new(-raw.x, -raw.y));
        let pixel = fb.get_pixel(center.x.round() as u32, center.y.round() as u32).unwrap();
        assert_ne!(pixel, plan.theme.panel_background);
        assert_ne!(pixel, hue_palette(2)[0]);
    }

    #[test]
    fn test_legend_keys_drawn_outside_panel() {
        let plot = vowel_plot().geom(Geom::point()).build().unwrap();
        let plan = plot.render_plan();
        let fb = rasterize(&plan, 400, 300).unwrap();
        let vp = Viewport::new(&plan, 400, 300).unwrap();

        let keys: Vec<Point> = vp
            .legend_slots(plan.legend.as_ref().unwrap())
            .into_iter()
            .filter_map(|s| match s {
                LegendSlot::Key { at, .. } => Some(at),
                LegendSlot::Title { .. } => None,
            })
            .collect();
        assert_eq!(keys.len(), 2);
        for (at, color) in keys.iter().zip(hue_palette(2)) {
            assert!(at.x > vp.right);
            let c = (at.x + KEY_SIZE / 2.0).round() as u32;
            let r = (at.y + KEY_SIZE / 2.0).round() as u32;
            assert_eq!(fb.get_pixel(c, r), Some(color));
        }
    }

    #[test]
    fn test_label_boxes_without_glyphs() {
        let render = |geom: Geom| {
            let plot = vowel_plot()
                .layer(Layer::new(geom).aes(Aes::new().label("vowel")))
                .theme(Theme::classic())
                .legend_position(LegendPosition::None)
                .build()
                .unwrap();
            rasterize(&plot.render_plan(), 400, 300).unwrap()
        };

        // Bare text has no raster form; labels leave their boxes.
        let text = render(Geom::text());
        let label = render(Geom::label());
        let blank = text.count_color(Rgba::WHITE);
        assert!(label.count_color(Rgba::WHITE) < blank);
        assert_eq!(text.luminance_stats().0, label.luminance_stats().0);
    }

    #[test]
    fn test_rejects_tiny_canvas() {
        let plan = vowel_plot().geom(Geom::point()).build().unwrap().render_plan();
        assert!(matches!(rasterize(&plan, 0, 10), Err(Error::InvalidDimensions { .. })));
        assert!(matches!(rasterize(&plan, 50, 50), Err(Error::InvalidDimensions { .. })));
    }
}

//! SVG output encoder.
//!
//! [`SvgEncoder::from_plan`] draws a render plan as vector graphics, in the
//! same layout the raster backend uses, with text, tick labels, axis titles
//! and legend labels included. The element builders are public so callers can
//! annotate a plot before writing it.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::color::Rgba;
use crate::error::Result;
use crate::geometry::Point;
use crate::grammar::{DrawPrimitive, GeomKind, LegendEntry, LegendGuide, PointShape, RenderPlan};
use crate::render::{text_extent, LegendSlot, Viewport, KEY_SIZE, TICK_LENGTH};

/// SVG document builder.
#[derive(Debug, Clone)]
pub struct SvgEncoder {
    width: u32,
    height: u32,
    /// Background color (None for transparent)
    background: Option<Rgba>,
    elements: Vec<SvgElement>,
}

/// An SVG element.
///
/// Field names are self-documenting and match SVG attribute names.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SvgElement {
    /// Rectangle
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Rgba>,
        stroke: Option<Rgba>,
        stroke_width: f64,
    },
    /// Circle
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: Option<Rgba>,
        stroke: Option<Rgba>,
        stroke_width: f64,
    },
    /// Line
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Rgba,
        stroke_width: f64,
    },
    /// Closed polygon
    Polygon {
        points: Vec<Point>,
        fill: Option<Rgba>,
        stroke: Option<Rgba>,
        stroke_width: f64,
    },
    /// Text, optionally rotated about its anchor
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        fill: Rgba,
        anchor: TextAnchor,
        rotate: Option<f64>,
    },
}

/// Text anchor position for SVG text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    /// Align text start at position (left-aligned for LTR)
    #[default]
    Start,
    /// Center text at position
    Middle,
    /// Align text end at position (right-aligned for LTR)
    End,
}

impl TextAnchor {
    fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

impl Default for SvgEncoder {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl SvgEncoder {
    /// Create an empty document with a white background.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, background: Some(Rgba::WHITE), elements: Vec::new() }
    }

    /// Draw a render plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions leave no room for the panel.
    pub fn from_plan(plan: &RenderPlan, width: u32, height: u32) -> Result<Self> {
        let vp = Viewport::new(plan, width, height)?;
        let theme = &plan.theme;
        let base = theme.base_size;
        let mut svg = Self::new(width, height).background(Some(theme.background));

        svg = svg.rect(vp.left, vp.top, vp.panel_width(), vp.panel_height(), theme.panel_background);
        if theme.show_grid {
            let w = f64::from(theme.grid_width);
            for t in &plan.x_axis.ticks {
                let x = vp.project_x(t.position);
                svg = svg.line(x, vp.top, x, vp.bottom, theme.grid_color, w);
            }
            for t in &plan.y_axis.ticks {
                let y = vp.project_y(t.position);
                svg = svg.line(vp.left, y, vp.right, y, theme.grid_color, w);
            }
        }

        for primitive in &plan.primitives {
            svg.push_primitive(&vp, primitive);
        }

        if theme.show_axis {
            let (color, w) = (theme.axis_color, f64::from(theme.axis_width));
            svg = svg
                .line(vp.left, vp.bottom, vp.right, vp.bottom, color, w)
                .line(vp.left, vp.top, vp.left, vp.bottom, color, w);
            for t in &plan.x_axis.ticks {
                let x = vp.project_x(t.position);
                svg = svg.line(x, vp.bottom, x, vp.bottom + TICK_LENGTH, color, w).text_anchored(
                    x,
                    vp.bottom + TICK_LENGTH + base,
                    &t.label,
                    base * 0.8,
                    theme.text_color,
                    TextAnchor::Middle,
                );
            }
            for t in &plan.y_axis.ticks {
                let y = vp.project_y(t.position);
                svg = svg.line(vp.left - TICK_LENGTH, y, vp.left, y, color, w).text_anchored(
                    vp.left - TICK_LENGTH - 2.0,
                    y + base * 0.3,
                    &t.label,
                    base * 0.8,
                    theme.text_color,
                    TextAnchor::End,
                );
            }
        }
        if theme.show_panel_border {
            svg.add_element(SvgElement::Rect {
                x: vp.left,
                y: vp.top,
                width: vp.panel_width(),
                height: vp.panel_height(),
                fill: None,
                stroke: Some(theme.axis_color),
                stroke_width: 1.0,
            });
        }

        if let Some(title) = &plan.x_axis.title {
            let at = vp.x_title_anchor();
            svg = svg.text_anchored(at.x, at.y, title, base, theme.text_color, TextAnchor::Middle);
        }
        if let Some(title) = &plan.y_axis.title {
            let at = vp.y_title_anchor();
            svg.add_element(SvgElement::Text {
                x: at.x,
                y: at.y,
                text: title.clone(),
                font_size: base,
                fill: theme.text_color,
                anchor: TextAnchor::Middle,
                rotate: Some(-90.0),
            });
        }
        if let Some(title) = &plan.title {
            let at = vp.title_anchor();
            svg = svg.text_anchored(at.x, at.y, title, base * 1.3, theme.text_color, TextAnchor::Middle);
        }

        if let Some(legend) = &plan.legend {
            for slot in vp.legend_slots(legend) {
                match slot {
                    LegendSlot::Title { guide, at } => {
                        let title = &legend.guides[guide].title;
                        svg = svg.text(at.x, at.y + base, title, base, theme.text_color);
                    }
                    LegendSlot::Key { guide, entry, at } => {
                        let guide = &legend.guides[guide];
                        let entry = &guide.entries[entry];
                        svg.push_key(at, guide, entry);
                        let x = Viewport::key_label_x(at);
                        let y = at.y + KEY_SIZE - 3.0;
                        svg = svg.text(x, y, &entry.value, base * 0.9, theme.text_color);
                    }
                }
            }
        }

        debug!(width, height, elements = svg.elements.len(), "plan encoded as svg");
        Ok(svg)
    }

    fn push_primitive(&mut self, vp: &Viewport, primitive: &DrawPrimitive) {
        match primitive {
            DrawPrimitive::Polygon { vertices, fill, stroke, stroke_width, .. } => {
                self.add_element(SvgElement::Polygon {
                    points: vertices.iter().map(|v| vp.project(*v)).collect(),
                    fill: *fill,
                    stroke: *stroke,
                    stroke_width: *stroke_width,
                });
            }
            DrawPrimitive::Point { position, shape, color, fill, size, .. } => {
                self.push_marker(vp.project(*position), *shape, *size, *color, *fill);
            }
            DrawPrimitive::Text { position, text, color, size, boxed, .. } => {
                let at = vp.project(*position);
                if let Some(label) = boxed {
                    let (w, h) = text_extent(text, *size);
                    let (bw, bh) = (w + 2.0 * label.padding, h + 2.0 * label.padding);
                    self.add_element(SvgElement::Rect {
                        x: at.x - bw / 2.0,
                        y: at.y - bh / 2.0,
                        width: bw,
                        height: bh,
                        fill: Some(label.fill),
                        stroke: Some(label.border),
                        stroke_width: 1.0,
                    });
                }
                // Baseline sits a third of an em below the visual center.
                self.add_element(SvgElement::Text {
                    x: at.x,
                    y: at.y + size * 0.35,
                    text: text.clone(),
                    font_size: *size,
                    fill: *color,
                    anchor: TextAnchor::Middle,
                    rotate: None,
                });
            }
        }
    }

    fn push_marker(
        &mut self,
        center: Point,
        shape: PointShape,
        size: f64,
        color: Rgba,
        fill: Option<Rgba>,
    ) {
        let r = size / 2.0;
        let (interior, outline) = match fill {
            Some(f) => (Some(f), Some(color)),
            None => (Some(color), None),
        };
        let ring = |points: &[(f64, f64)]| -> Vec<Point> {
            points.iter().map(|&(dx, dy)| Point::new(center.x + dx * r, center.y + dy * r)).collect()
        };
        let polygon = |points: Vec<Point>| SvgElement::Polygon {
            points,
            fill: interior,
            stroke: outline,
            stroke_width: 1.0,
        };

        match shape {
            PointShape::Circle => self.add_element(SvgElement::Circle {
                cx: center.x,
                cy: center.y,
                r,
                fill: interior,
                stroke: outline,
                stroke_width: 1.0,
            }),
            PointShape::Triangle => {
                let h = 3f64.sqrt() / 2.0;
                self.add_element(polygon(ring(&[(0.0, -1.0), (h, 0.5), (-h, 0.5)])));
            }
            PointShape::Square => {
                let s = std::f64::consts::FRAC_1_SQRT_2;
                self.add_element(polygon(ring(&[(-s, -s), (s, -s), (s, s), (-s, s)])));
            }
            PointShape::Diamond => {
                self.add_element(polygon(ring(&[(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)])));
            }
            PointShape::Cross | PointShape::X => {
                let d = if shape == PointShape::X { std::f64::consts::FRAC_1_SQRT_2 } else { 1.0 };
                let arms: [(f64, f64); 2] =
                    if shape == PointShape::X { [(-d, -d), (-d, d)] } else { [(-d, 0.0), (0.0, -d)] };
                for (dx, dy) in arms {
                    self.add_element(SvgElement::Line {
                        x1: center.x + dx * r,
                        y1: center.y + dy * r,
                        x2: center.x - dx * r,
                        y2: center.y - dy * r,
                        stroke: color,
                        stroke_width: (r / 3.0).max(1.0),
                    });
                }
            }
        }
    }

    fn push_key(&mut self, at: Point, guide: &LegendGuide, entry: &LegendEntry) {
        let has = |kind: GeomKind| guide.glyphs.contains(&kind);
        let center = Point::new(at.x + KEY_SIZE / 2.0, at.y + KEY_SIZE / 2.0);

        if has(GeomKind::Polygon) {
            self.add_element(SvgElement::Rect {
                x: at.x,
                y: at.y,
                width: KEY_SIZE,
                height: KEY_SIZE,
                fill: entry.fill,
                stroke: entry.color,
                stroke_width: 1.0,
            });
        }
        if has(GeomKind::Point) {
            let shape = entry.shape.unwrap_or(PointShape::Circle);
            let color = entry.color.unwrap_or(Rgba::BLACK);
            self.push_marker(center, shape, KEY_SIZE * 0.5, color, None);
        } else if !has(GeomKind::Polygon) {
            // Text-only guides show a sample letter in the mapped color.
            let color = entry.color.or(entry.fill).unwrap_or(Rgba::BLACK);
            self.add_element(SvgElement::Text {
                x: center.x,
                y: center.y + KEY_SIZE * 0.35,
                text: "a".to_string(),
                font_size: KEY_SIZE,
                fill: color,
                anchor: TextAnchor::Middle,
                rotate: None,
            });
        }
    }

    /// Set background color (None for transparent).
    #[must_use]
    pub fn background(mut self, color: Option<Rgba>) -> Self {
        self.background = color;
        self
    }

    /// Add a filled rectangle.
    #[must_use]
    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Rect {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            stroke: None,
            stroke_width: 1.0,
        });
        self
    }

    /// Add a filled circle.
    #[must_use]
    pub fn circle(mut self, cx: f64, cy: f64, r: f64, fill: Rgba) -> Self {
        self.elements.push(SvgElement::Circle {
            cx,
            cy,
            r,
            fill: Some(fill),
            stroke: None,
            stroke_width: 1.0,
        });
        self
    }

    /// Add a line.
    #[must_use]
    pub fn line(mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Rgba, stroke_width: f64) -> Self {
        self.elements.push(SvgElement::Line { x1, y1, x2, y2, stroke, stroke_width });
        self
    }

    /// Add a closed polygon.
    #[must_use]
    pub fn polygon(mut self, points: &[Point], fill: Option<Rgba>, stroke: Option<Rgba>) -> Self {
        self.elements.push(SvgElement::Polygon {
            points: points.to_vec(),
            fill,
            stroke,
            stroke_width: 1.0,
        });
        self
    }

    /// Add left-aligned text.
    #[must_use]
    pub fn text(self, x: f64, y: f64, text: &str, font_size: f64, fill: Rgba) -> Self {
        self.text_anchored(x, y, text, font_size, fill, TextAnchor::Start)
    }

    /// Add text with anchor.
    #[must_use]
    pub fn text_anchored(
        mut self,
        x: f64,
        y: f64,
        text: &str,
        font_size: f64,
        fill: Rgba,
        anchor: TextAnchor,
    ) -> Self {
        self.elements.push(SvgElement::Text {
            x,
            y,
            text: text.to_string(),
            font_size,
            fill,
            anchor,
            rotate: None,
        });
        self
    }

    /// Add a raw element.
    pub fn add_element(&mut self, element: SvgElement) {
        self.elements.push(element);
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[SvgElement] {
        &self.elements
    }

    /// Render to an SVG string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(256 + self.elements.len() * 96);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        if let Some(bg) = self.background {
            let _ = writeln!(svg, r#"  <rect width="100%" height="100%"{}/>"#, paint("fill", Some(bg)));
        }
        for element in &self.elements {
            let _ = writeln!(svg, "  {}", element_to_svg(element));
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Write to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())?;
        debug!(path = %path.display(), "svg written");
        Ok(())
    }
}

/// Compact coordinate: at most two decimals, no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// ` fill="#RRGGBB" fill-opacity=".."` (or `none`) for a paint attribute.
fn paint(attr: &str, color: Option<Rgba>) -> String {
    match color {
        None => format!(r#" {attr}="none""#),
        Some(c) if c.a == 255 => format!(r#" {attr}="{}""#, c.to_hex()),
        Some(c) => format!(
            r#" {attr}="{}" {attr}-opacity="{:.3}""#,
            c.to_hex(),
            f32::from(c.a) / 255.0
        ),
    }
}

fn stroke_attrs(stroke: Option<Rgba>, width: f64) -> String {
    match stroke {
        Some(_) => format!(r#"{} stroke-width="{}""#, paint("stroke", stroke), num(width)),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn element_to_svg(element: &SvgElement) -> String {
    match element {
        SvgElement::Rect { x, y, width, height, fill, stroke, stroke_width } => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
            num(*x),
            num(*y),
            num(*width),
            num(*height),
            paint("fill", *fill),
            stroke_attrs(*stroke, *stroke_width)
        ),
        SvgElement::Circle { cx, cy, r, fill, stroke, stroke_width } => format!(
            r#"<circle cx="{}" cy="{}" r="{}"{}{}/>"#,
            num(*cx),
            num(*cy),
            num(*r),
            paint("fill", *fill),
            stroke_attrs(*stroke, *stroke_width)
        ),
        SvgElement::Line { x1, y1, x2, y2, stroke, stroke_width } => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            num(*x1),
            num(*y1),
            num(*x2),
            num(*y2),
            stroke_attrs(Some(*stroke), *stroke_width)
        ),
        SvgElement::Polygon { points, fill, stroke, stroke_width } => {
            let points: Vec<String> =
                points.iter().map(|p| format!("{},{}", num(p.x), num(p.y))).collect();
            format!(
                r#"<polygon points="{}"{}{}/>"#,
                points.join(" "),
                paint("fill", *fill),
                stroke_attrs(*stroke, *stroke_width)
            )
        }
        SvgElement::Text { x, y, text, font_size, fill, anchor, rotate } => {
            let (x, y) = (num(*x), num(*y));
            let transform = rotate
                .map(|deg| format!(r#" transform="rotate({} {x} {y})""#, num(deg)))
                .unwrap_or_default();
            format!(
                r#"<text x="{x}" y="{y}" font-size="{}"{} text-anchor="{}" font-family="sans-serif"{transform}>{}</text>"#,
                num(*font_size),
                paint("fill", Some(*fill)),
                anchor.as_str(),
                escape(text)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{stat_ellipse, Aes, Dataset, GGPlot, Geom, Layer, LegendPosition};

    #[test]
    fn test_svg_encoder_new() {
        let svg = SvgEncoder::new(800, 600).render();

        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("height=\"600\""));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_svg_rect() {
        let svg = SvgEncoder::new(100, 100).rect(10.0, 20.5, 30.0, 40.0, Rgba::RED).render();

        assert!(svg.contains(r##"<rect x="10" y="20.5" width="30" height="40" fill="#FF0000"/>"##));
    }

    #[test]
    fn test_svg_circle_and_line() {
        let svg = SvgEncoder::new(100, 100)
            .circle(50.0, 50.0, 25.0, Rgba::BLUE)
            .line(0.0, 0.0, 100.0, 100.0, Rgba::BLACK, 2.0)
            .render();

        assert!(svg.contains(r##"<circle cx="50" cy="50" r="25" fill="#0000FF"/>"##));
        assert!(svg.contains(r##"x2="100" y2="100" stroke="#000000" stroke-width="2""##));
    }

    #[test]
    fn test_svg_translucent_polygon() {
        let square = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let svg = SvgEncoder::new(10, 10)
            .polygon(&square, Some(Rgba::RED.with_opacity(0.2)), None)
            .render();

        assert!(svg.contains(r#"points="0,0 1,0 1,1""#));
        assert!(svg.contains(r##"fill="#FF0000" fill-opacity="0.200""##));
        assert!(!svg.contains("stroke="));
    }

    #[test]
    fn test_svg_text_escaping() {
        let svg = SvgEncoder::new(100, 100).text(0.0, 0.0, "<a & \"b\">", 12.0, Rgba::BLACK).render();
        assert!(svg.contains("&lt;a &amp; &quot;b&quot;&gt;"));
        assert!(svg.contains(r#"text-anchor="start""#));
    }

    #[test]
    fn test_svg_transparent_background() {
        let svg = SvgEncoder::new(10, 10).background(None).render();
        assert!(!svg.contains("100%"));
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(10.0), "10");
        assert_eq!(num(1.256), "1.26");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(12.5), "12.5");
    }

    fn vowel_plot() -> GGPlot {
        let data = Dataset::builder()
            .numeric("F1", &[300.0, 330.0, 310.0, 290.0, 700.0, 740.0, 680.0, 720.0])
            .numeric("F2", &[2300.0, 2250.0, 2200.0, 2350.0, 1200.0, 1150.0, 1250.0, 1300.0])
            .categorical("vowel", &["i", "i", "i", "i", "a", "a", "a", "a"])
            .build()
            .unwrap();
        let ellipses = stat_ellipse(&data, "vowel", "F2", "F1", 0.95, 32).unwrap();
        GGPlot::new()
            .data(data)
            .aes(Aes::new().x("F2").y("F1").color("vowel"))
            .layer(
                Layer::new(Geom::polygon().alpha(0.2))
                    .ellipses(&ellipses)
                    .aes(Aes::new().fill("vowel")),
            )
            .geom(Geom::point())
            .layer(Layer::new(Geom::label()).aes(Aes::new().label("vowel")))
            .scale_x_reverse()
            .scale_y_reverse()
            .title("Vowel space")
    }

    #[test]
    fn test_from_plan_follows_layer_order() {
        let svg = vowel_plot().build().unwrap().to_svg().unwrap();
        let kinds: Vec<usize> = svg
            .elements()
            .iter()
            .filter_map(|e| match e {
                SvgElement::Polygon { points, .. } if points.len() == 32 => Some(0),
                SvgElement::Circle { .. } => Some(1),
                SvgElement::Rect { stroke: Some(_), fill: Some(Rgba::WHITE), .. } => Some(2),
                _ => None,
            })
            .collect();

        assert_eq!(kinds.iter().filter(|&&k| k == 0).count(), 2);
        assert_eq!(kinds.iter().filter(|&&k| k == 2).count(), 8);
        // Ellipses, then points, then label boxes; legend circles come last.
        let first_label = kinds.iter().position(|&k| k == 2).unwrap();
        assert!(kinds[..2].iter().all(|&k| k == 0));
        assert!(kinds[2..first_label].iter().all(|&k| k == 1));
        assert_eq!(first_label, 2 + 8);
    }

    #[test]
    fn test_from_plan_text_content() {
        let svg = vowel_plot().build().unwrap().to_svg().unwrap().render();

        assert!(svg.contains(">Vowel space</text>"));
        assert!(svg.contains(">F2</text>"));
        assert!(svg.contains(r#"transform="rotate(-90"#));
        assert!(svg.contains(">vowel</text>"));
        assert!(svg.contains(">2000</text>"));
        assert!(svg.contains("fill-opacity=\"0.200\""));
    }

    #[test]
    fn test_from_plan_without_legend() {
        let plan = vowel_plot()
            .legend_position(LegendPosition::None)
            .build()
            .unwrap()
            .render_plan();
        let svg = SvgEncoder::from_plan(&plan, 640, 480).unwrap().render();
        assert!(!svg.contains(">vowel</text>"));
    }

    #[test]
    fn test_from_plan_rejects_tiny_canvas() {
        let plan = vowel_plot().build().unwrap().render_plan();
        assert!(SvgEncoder::from_plan(&plan, 100, 100).is_err());
    }

    #[test]
    fn test_svg_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vowels.svg");
        vowel_plot().build().unwrap().write_svg(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<svg"));
        assert!(content.contains("<polygon"));
    }
}

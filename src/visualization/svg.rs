//! Minimal SVG document builder used by the chart renderers

use std::fmt::Write;

/// Escape text for use in SVG content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Horizontal text anchor
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// An SVG document under construction
pub struct SvgDocument {
    width: u32,
    height: u32,
    body: String,
}

impl SvgDocument {
    pub fn new(width: u32, height: u32) -> Self {
        let mut doc = Self {
            width,
            height,
            body: String::new(),
        };
        doc.rect(0.0, 0.0, f64::from(width), f64::from(height), "#ffffff");
        doc
    }

    pub fn width(&self) -> f64 {
        f64::from(self.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.height)
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x, y, width, height, fill
        );
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &str) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
            from.0, from.1, to.0, to.1, stroke
        );
    }

    /// Polyline through `points`; `dashed` draws a dashed stroke
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, dashed: bool) {
        if points.is_empty() {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", x, y))
            .collect();
        let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
        let _ = writeln!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"{}/>"#,
            coords.join(" "),
            stroke,
            dash
        );
    }

    pub fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            r##"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" stroke="#ffffff"/>"##,
            center.0, center.1, radius, fill
        );
    }

    /// Pie slice between two angles in radians, measured clockwise from 12 o'clock
    pub fn pie_slice(&mut self, center: (f64, f64), radius: f64, start: f64, end: f64, fill: &str) {
        let point = |angle: f64| {
            (
                center.0 + radius * angle.sin(),
                center.1 - radius * angle.cos(),
            )
        };
        let (x1, y1) = point(start);
        let (x2, y2) = point(end);
        let large_arc = u8::from(end - start > std::f64::consts::PI);
        let _ = writeln!(
            self.body,
            r##"<path d="M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z" fill="{}" stroke="#ffffff"/>"##,
            center.0, center.1, x1, y1, radius, radius, large_arc, x2, y2, fill
        );
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, size: u32, anchor: Anchor) {
        let _ = writeln!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{}" text-anchor="{}">{}</text>"#,
            x,
            y,
            size,
            anchor.as_str(),
            escape(content)
        );
    }

    /// Text rotated 90 degrees counter-clockwise around its anchor point
    pub fn vertical_text(&mut self, x: f64, y: f64, content: &str, size: u32) {
        let _ = writeln!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{}" text-anchor="middle" transform="rotate(-90 {:.2} {:.2})">{}</text>"#,
            x,
            y,
            size,
            x,
            y,
            escape(content)
        );
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_document_wraps_elements() {
        let mut doc = SvgDocument::new(100, 50);
        doc.text(10.0, 20.0, "ERROR <db>", 12, Anchor::Start);
        let svg = doc.finish();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\""));
        assert!(svg.contains("ERROR &lt;db&gt;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_large_arc_flag() {
        let mut doc = SvgDocument::new(100, 100);
        doc.pie_slice((50.0, 50.0), 40.0, 0.0, 4.0, "#000000");
        let svg = doc.finish();
        assert!(svg.contains(" 0 1 1 "));
    }
}

//! Printable SVG rendering of a form page.

use crate::form::FormDocument;
use crate::model::{self, DisplayText, ElementKind};

use super::geometry::grid_layout;

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn text_lines(x: f32, y: f32, size: f32, text: &str, fill: &str) -> String {
    let line_height = size * 1.2;
    let mut out = format!(
        r#"<text x="{:.3}" y="{:.3}" font-size="{:.3}" font-family="sans-serif" fill="{}">"#,
        x, y, size, fill
    );
    for (i, line) in text.split('\n').enumerate() {
        let dy = if i == 0 { 0.0 } else { line_height };
        out.push_str(&format!(
            r#"<tspan x="{:.3}" dy="{:.3}">{}</tspan>"#,
            x,
            dy,
            escape_xml(line)
        ));
    }
    out.push_str("</text>");
    out
}

/// Renders the page as it would be printed.
///
/// Blank bubbles get a circle and no glyph. Student fields print their
/// label when empty; other unset text prints nothing.
pub fn document_to_svg(doc: &FormDocument) -> String {
    let page = doc.page;
    let mut out = String::new();
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.3}" height="{h:.3}" viewBox="0 0 {w:.3} {h:.3}">"#,
        w = page.width,
        h = page.height
    ));
    out.push('\n');
    out.push_str(&format!(
        r#"<rect x="0" y="0" width="{:.3}" height="{:.3}" fill="white"/>"#,
        page.width, page.height
    ));
    out.push('\n');

    if let Some(overlay) = doc.overlay() {
        for mark in &overlay.marks {
            out.push_str(&format!(
                r#"<rect class="corner-mark" x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="black"/>"#,
                mark.rect.min.x,
                mark.rect.min.y,
                mark.rect.width(),
                mark.rect.height()
            ));
            out.push('\n');
        }
    }

    let bubbles = doc.resolved_bubbles();
    for element in &doc.elements {
        let r = element.rect;
        match &element.kind {
            ElementKind::BubbleGrid {
                questions,
                options,
                first_question,
                ..
            } => {
                let Some(layout) = grid_layout(r, &element.kind) else {
                    continue;
                };
                let font = layout.radius * 1.1;
                out.push_str(&format!(r#"<g id="{}">"#, escape_xml(element.id.as_str())));
                out.push('\n');
                for q in 0..*questions {
                    let n = layout.number_anchor(q);
                    out.push_str(&format!(
                        r#"<text x="{:.3}" y="{:.3}" font-size="{:.3}" text-anchor="end" dominant-baseline="middle">{}.</text>"#,
                        n.x,
                        n.y,
                        font,
                        first_question + q
                    ));
                    for (o, (key, content)) in bubbles
                        .bubbles(&element.id)
                        .iter()
                        .take(*options as usize)
                        .enumerate()
                    {
                        let c = layout.bubble_center(q, o as u32);
                        out.push_str(&format!(
                            r#"<circle cx="{:.3}" cy="{:.3}" r="{:.3}" fill="none" stroke="black" stroke-width="0.8" data-key="{}"/>"#,
                            c.x,
                            c.y,
                            layout.radius,
                            escape_xml(key)
                        ));
                        if let Some(glyph) = content.glyph() {
                            out.push_str(&format!(
                                r#"<text x="{:.3}" y="{:.3}" font-size="{:.3}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
                                c.x,
                                c.y,
                                font,
                                escape_xml(glyph)
                            ));
                        }
                    }
                    out.push('\n');
                }
                out.push_str("</g>\n");
            }
            ElementKind::TextField | ElementKind::StudentField { .. } | ElementKind::TextArea => {
                let shown = match model::display_text(element, false) {
                    Some(DisplayText::Text(t)) => Some((t, "black")),
                    Some(DisplayText::Placeholder(p))
                        if matches!(element.kind, ElementKind::StudentField { .. }) =>
                    {
                        Some((p, "#666666"))
                    }
                    _ => None,
                };
                if matches!(element.kind, ElementKind::TextArea) {
                    out.push_str(&format!(
                        r##"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="none" stroke="#999999" stroke-width="0.5"/>"##,
                        r.min.x,
                        r.min.y,
                        r.width(),
                        r.height()
                    ));
                } else {
                    out.push_str(&format!(
                        r##"<line x1="{:.3}" y1="{:.3}" x2="{:.3}" y2="{:.3}" stroke="#999999" stroke-width="0.5"/>"##,
                        r.min.x, r.max.y, r.max.x, r.max.y
                    ));
                }
                if let Some((text, fill)) = shown {
                    let baseline = if element.kind.is_multiline() {
                        r.min.y + element.text_size
                    } else {
                        r.max.y - 4.0
                    };
                    out.push_str(&text_lines(r.min.x + 2.0, baseline, element.text_size, text, fill));
                }
                out.push('\n');
            }
            ElementKind::Image { source } => {
                out.push_str(&format!(
                    r#"<image x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" href="{}" preserveAspectRatio="none"/>"#,
                    r.min.x,
                    r.min.y,
                    r.width(),
                    r.height(),
                    escape_xml(source)
                ));
                out.push('\n');
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

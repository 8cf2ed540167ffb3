use crate::bubbles::ResolvedBubbles;
use crate::corner_marks::CalibrationOverlay;
use crate::form::FormDocument;
use crate::model::{self, DisplayText, ElementId, ElementKind};
use eframe::egui;
use std::collections::{HashMap, HashSet};

use super::geometry::grid_layout;
use super::{InProgress, Tool, View};

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const INK: egui::Color32 = egui::Color32::from_rgb(20, 20, 20);
const PLACEHOLDER_INK: egui::Color32 = egui::Color32::from_rgb(150, 150, 150);

pub(super) fn tool_button(ui: &mut egui::Ui, label: &str, tool: Tool, selected: &mut Tool) {
    let active = *selected == tool;
    if ui.selectable_label(active, label).clicked() {
        *selected = tool;
    }
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(70));
}

pub(super) fn draw_page(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    page: model::PageSetup,
    grid_size: Option<f32>,
) {
    let r = view.rect_to_screen(origin, page.rect());
    painter.rect_filled(r.translate(egui::vec2(3.0, 3.0)), 0.0, egui::Color32::from_gray(40));
    painter.rect_filled(r, 0.0, egui::Color32::WHITE);
    let Some(grid) = grid_size else {
        return;
    };
    let spacing_screen = grid * view.zoom;
    if spacing_screen < 6.0 {
        return;
    }
    let color = egui::Color32::from_gray(235);
    let mut x = r.min.x + spacing_screen;
    while x < r.max.x {
        painter.line_segment(
            [egui::pos2(x, r.min.y), egui::pos2(x, r.max.y)],
            egui::Stroke::new(1.0, color),
        );
        x += spacing_screen;
    }
    let mut y = r.min.y + spacing_screen;
    while y < r.max.y {
        painter.line_segment(
            [egui::pos2(r.min.x, y), egui::pos2(r.max.x, y)],
            egui::Stroke::new(1.0, color),
        );
        y += spacing_screen;
    }
}

pub(super) fn draw_overlay(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    overlay: &CalibrationOverlay,
) {
    for mark in &overlay.marks {
        painter.rect_filled(view.rect_to_screen(origin, mark.rect), 0.0, INK);
    }
    let zone = view.rect_to_screen(origin, overlay.safe_zone);
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(230, 120, 120));
    let corners = [
        zone.left_top(),
        zone.right_top(),
        zone.right_bottom(),
        zone.left_bottom(),
        zone.left_top(),
    ];
    for pair in corners.windows(2) {
        draw_dashed_line(painter, pair[0], pair[1], stroke, 6.0, 4.0);
    }
}

pub(super) struct ElementPaint<'a> {
    pub doc: &'a FormDocument,
    pub bubbles: &'a ResolvedBubbles,
    pub selected: &'a HashSet<ElementId>,
    pub editing: Option<&'a ElementId>,
    pub textures: &'a HashMap<String, Option<egui::TextureHandle>>,
}

pub(super) fn draw_elements(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    paint: &ElementPaint<'_>,
) {
    for element in &paint.doc.elements {
        draw_element(painter, origin, view, paint, element);
    }
}

fn draw_element(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    paint: &ElementPaint<'_>,
    element: &model::Element,
) {
    let screen = view.rect_to_screen(origin, element.rect);
    let font_size = element.text_size * view.zoom;
    match &element.kind {
        ElementKind::BubbleGrid {
            questions,
            options,
            first_question,
            ..
        } => {
            let Some(layout) = grid_layout(element.rect, &element.kind) else {
                return;
            };
            let bubbles = paint.bubbles.bubbles(&element.id);
            let stroke = egui::Stroke::new(1.0, INK);
            let label_font = egui::FontId::proportional((layout.radius * 1.1 * view.zoom).max(4.0));
            for q in 0..*questions {
                let anchor = view.world_to_screen(origin, layout.number_anchor(q).to_pos2());
                painter.text(
                    anchor,
                    egui::Align2::RIGHT_CENTER,
                    format!("{}.", first_question + q),
                    label_font.clone(),
                    INK,
                );
                for (o, (_, content)) in bubbles.iter().take(*options as usize).enumerate() {
                    let center =
                        view.world_to_screen(origin, layout.bubble_center(q, o as u32).to_pos2());
                    painter.circle_stroke(center, layout.radius * view.zoom, stroke);
                    if let Some(glyph) = content.glyph() {
                        painter.text(
                            center,
                            egui::Align2::CENTER_CENTER,
                            glyph,
                            label_font.clone(),
                            INK,
                        );
                    }
                }
            }
        }
        ElementKind::TextField | ElementKind::StudentField { .. } | ElementKind::TextArea => {
            if paint.editing == Some(&element.id) {
                return;
            }
            let underline = egui::Stroke::new(1.0, egui::Color32::from_gray(120));
            if matches!(element.kind, ElementKind::TextArea) {
                painter.rect_stroke(screen, 2.0, underline, egui::StrokeKind::Inside);
            } else {
                painter.line_segment([screen.left_bottom(), screen.right_bottom()], underline);
            }
            let (text, color) = match model::display_text(element, true) {
                Some(DisplayText::Text(t)) => (t, INK),
                Some(DisplayText::Placeholder(p)) => (p, PLACEHOLDER_INK),
                Some(DisplayText::Blank) | None => return,
            };
            let galley = painter.layout(
                text.to_string(),
                egui::FontId::proportional(font_size.max(4.0)),
                color,
                screen.width().max(1.0),
            );
            let pos = if element.kind.is_multiline() {
                screen.min + egui::vec2(2.0, 2.0)
            } else {
                egui::pos2(screen.min.x + 2.0, screen.center().y - galley.size().y * 0.5)
            };
            painter.with_clip_rect(screen).galley(pos, galley, color);
        }
        ElementKind::Image { source } => {
            match paint.textures.get(source).and_then(Option::as_ref) {
                Some(texture) => {
                    painter.image(
                        texture.id(),
                        screen,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
                None => {
                    let stroke = egui::Stroke::new(1.0, PLACEHOLDER_INK);
                    painter.rect_stroke(screen, 0.0, stroke, egui::StrokeKind::Inside);
                    painter.line_segment([screen.left_top(), screen.right_bottom()], stroke);
                    painter.line_segment([screen.right_top(), screen.left_bottom()], stroke);
                }
            }
        }
    }
    if paint.selected.contains(&element.id) {
        draw_selection_bounds(painter, screen);
    }
}

pub(super) fn draw_in_progress(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    in_progress: &InProgress,
) {
    match in_progress {
        InProgress::Place { start, current } => {
            let r = egui::Rect::from_two_pos(
                view.world_to_screen(origin, *start),
                view.world_to_screen(origin, *current),
            );
            let s = egui::Stroke::new(1.0, INK);
            painter.rect_stroke(r, 0.0, s, egui::StrokeKind::Middle);
        }
        InProgress::SelectBox { start, current } => {
            let r = egui::Rect::from_two_pos(
                view.world_to_screen(origin, *start),
                view.world_to_screen(origin, *current),
            );
            let s = egui::Stroke::new(1.0, SELECTION_COLOR);
            painter.rect_stroke(r, 0.0, s, egui::StrokeKind::Middle);
        }
    }
}

fn draw_selection_bounds(painter: &egui::Painter, rect: egui::Rect) {
    let stroke = egui::Stroke::new(1.0, SELECTION_COLOR);
    painter.rect_stroke(rect.expand(1.0), 0.0, stroke, egui::StrokeKind::Middle);
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let seg_len = if drawing { dash_len } else { gap_len };
        let next_pos = (pos + seg_len).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next_pos], stroke);
        }
        pos = next_pos;
        drawing = !drawing;
    }
}

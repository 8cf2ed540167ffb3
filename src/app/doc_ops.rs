use crate::form::FormEditor;
use crate::model::{self, ElementId, ElementKind};
use eframe::egui;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum AlignMode {
    Left,
    HCenter,
    Right,
    Top,
    VCenter,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Axis {
    Horizontal,
    Vertical,
}

fn selected_bounds(form: &FormEditor, selected: &HashSet<ElementId>) -> Vec<(ElementId, egui::Rect)> {
    form.elements()
        .iter()
        .filter(|e| selected.contains(&e.id))
        .map(|e| (e.id.clone(), e.bounds()))
        .collect()
}

fn apply_moves(form: &mut FormEditor, moves: Vec<(ElementId, egui::Vec2)>) {
    for (id, delta) in moves {
        form.move_element(&id, delta.x, delta.y);
    }
}

pub(super) fn align_selected(form: &mut FormEditor, selected: &HashSet<ElementId>, mode: AlignMode) {
    let items = selected_bounds(form, selected);
    if items.len() < 2 {
        return;
    }
    let Some(overall) = items.iter().map(|(_, r)| *r).reduce(|a, b| a.union(b)) else {
        return;
    };
    let moves = items
        .into_iter()
        .map(|(id, b)| {
            let delta = match mode {
                AlignMode::Left => egui::vec2(overall.min.x - b.min.x, 0.0),
                AlignMode::HCenter => egui::vec2(overall.center().x - b.center().x, 0.0),
                AlignMode::Right => egui::vec2(overall.max.x - b.max.x, 0.0),
                AlignMode::Top => egui::vec2(0.0, overall.min.y - b.min.y),
                AlignMode::VCenter => egui::vec2(0.0, overall.center().y - b.center().y),
                AlignMode::Bottom => egui::vec2(0.0, overall.max.y - b.max.y),
            };
            (id, delta)
        })
        .collect();
    apply_moves(form, moves);
}

/// Spaces element centers evenly between the outermost two.
pub(super) fn distribute_selected(form: &mut FormEditor, selected: &HashSet<ElementId>, axis: Axis) {
    let mut items = selected_bounds(form, selected);
    if items.len() < 3 {
        return;
    }
    let center = |r: &egui::Rect| match axis {
        Axis::Horizontal => r.center().x,
        Axis::Vertical => r.center().y,
    };
    items.sort_by(|a, b| center(&a.1).total_cmp(&center(&b.1)));
    let first = center(&items[0].1);
    let last = center(&items[items.len() - 1].1);
    let step = (last - first) / ((items.len() - 1) as f32);
    let moves = items
        .into_iter()
        .enumerate()
        .map(|(i, (id, b))| {
            let shift = first + step * (i as f32) - center(&b);
            let delta = match axis {
                Axis::Horizontal => egui::vec2(shift, 0.0),
                Axis::Vertical => egui::vec2(0.0, shift),
            };
            (id, delta)
        })
        .collect();
    apply_moves(form, moves);
}

/// Packs elements edge to edge, starting from the leftmost (or topmost).
pub(super) fn stack_selected(
    form: &mut FormEditor,
    selected: &HashSet<ElementId>,
    axis: Axis,
    gap: f32,
) {
    let mut items = selected_bounds(form, selected);
    if items.len() < 2 {
        return;
    }
    let mut moves = Vec::with_capacity(items.len());
    match axis {
        Axis::Horizontal => {
            items.sort_by(|a, b| a.1.min.x.total_cmp(&b.1.min.x));
            let mut x = items[0].1.min.x;
            for (id, b) in items {
                moves.push((id, egui::vec2(x - b.min.x, 0.0)));
                x += b.width() + gap;
            }
        }
        Axis::Vertical => {
            items.sort_by(|a, b| a.1.min.y.total_cmp(&b.1.min.y));
            let mut y = items[0].1.min.y;
            for (id, b) in items {
                moves.push((id, egui::vec2(0.0, y - b.min.y)));
                y += b.height() + gap;
            }
        }
    }
    apply_moves(form, moves);
}

pub(super) fn element_label(element: &model::Element) -> String {
    match &element.kind {
        ElementKind::BubbleGrid {
            questions, options, ..
        } => format!("Bubbles {} ({questions}x{options})", element.id),
        ElementKind::StudentField { subtype } => format!("{} {}", subtype.label(), element.id),
        ElementKind::Image { source } if !source.is_empty() => {
            let name = std::path::Path::new(source)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(source);
            format!("Image {} ({name})", element.id)
        }
        kind => format!("{} {}", kind.name(), element.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BubbleLabels, Point, RectF, StudentFieldKind};
    use pretty_assertions::assert_eq;

    fn form_with(rects: &[(f32, f32, f32, f32)]) -> (FormEditor, Vec<ElementId>) {
        let mut form = FormEditor::default();
        let ids = rects
            .iter()
            .map(|&(x, y, w, h)| {
                form.add_element(
                    ElementKind::TextField,
                    RectF::from_min_size(Point::new(x, y), w, h),
                )
            })
            .collect();
        (form, ids)
    }

    fn min_of(form: &FormEditor, id: &ElementId) -> Point {
        form.element(id).map(|e| e.rect.min).unwrap_or_default()
    }

    #[test]
    fn align_left_uses_leftmost_edge() {
        let (mut form, ids) = form_with(&[(10.0, 0.0, 50.0, 20.0), (40.0, 30.0, 80.0, 20.0)]);
        let selected: HashSet<_> = ids.iter().cloned().collect();
        align_selected(&mut form, &selected, AlignMode::Left);
        assert_eq!(min_of(&form, &ids[1]), Point::new(10.0, 30.0));
        assert_eq!(min_of(&form, &ids[0]), Point::new(10.0, 0.0));
    }

    #[test]
    fn distribute_evens_out_centers() {
        let (mut form, ids) = form_with(&[
            (0.0, 0.0, 10.0, 10.0),
            (20.0, 0.0, 10.0, 10.0),
            (100.0, 0.0, 10.0, 10.0),
        ]);
        let selected: HashSet<_> = ids.iter().cloned().collect();
        distribute_selected(&mut form, &selected, Axis::Horizontal);
        assert_eq!(min_of(&form, &ids[1]), Point::new(50.0, 0.0));
    }

    #[test]
    fn stack_packs_with_gap() {
        let (mut form, ids) = form_with(&[(0.0, 0.0, 10.0, 20.0), (0.0, 50.0, 10.0, 5.0)]);
        let selected: HashSet<_> = ids.iter().cloned().collect();
        stack_selected(&mut form, &selected, Axis::Vertical, 4.0);
        assert_eq!(min_of(&form, &ids[1]), Point::new(0.0, 24.0));
    }

    #[test]
    fn labels_name_the_kind() {
        let mut form = FormEditor::default();
        let grid = form.add_element(
            ElementKind::BubbleGrid {
                questions: 20,
                options: 4,
                labels: BubbleLabels::Letters,
                first_question: 1,
            },
            RectF::default(),
        );
        let student = form.add_element(
            ElementKind::StudentField {
                subtype: StudentFieldKind::ClassInfo,
            },
            RectF::default(),
        );
        let label = |id: &ElementId| form.element(id).map(element_label).unwrap_or_default();
        assert_eq!(label(&grid), "Bubbles e1 (20x4)");
        assert_eq!(label(&student), "Class e2");
    }
}

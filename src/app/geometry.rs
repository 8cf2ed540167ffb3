use crate::model::{self, ElementKind, Point, RectF};
use eframe::egui;

/// Smallest width or height an element can be resized to.
pub(crate) const MIN_ELEMENT_SIZE: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResizeHandle {
    NW,
    N,
    NE,
    W,
    E,
    SW,
    S,
    SE,
}

impl ResizeHandle {
    pub(crate) const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::W,
        ResizeHandle::E,
        ResizeHandle::SW,
        ResizeHandle::S,
        ResizeHandle::SE,
    ];

    pub(crate) fn position(self, rect: egui::Rect) -> egui::Pos2 {
        match self {
            ResizeHandle::NW => rect.left_top(),
            ResizeHandle::N => rect.center_top(),
            ResizeHandle::NE => rect.right_top(),
            ResizeHandle::W => rect.left_center(),
            ResizeHandle::E => rect.right_center(),
            ResizeHandle::SW => rect.left_bottom(),
            ResizeHandle::S => rect.center_bottom(),
            ResizeHandle::SE => rect.right_bottom(),
        }
    }

    pub(crate) fn cursor(self) -> egui::CursorIcon {
        match self {
            ResizeHandle::N | ResizeHandle::S => egui::CursorIcon::ResizeVertical,
            ResizeHandle::E | ResizeHandle::W => egui::CursorIcon::ResizeHorizontal,
            ResizeHandle::NE | ResizeHandle::SW => egui::CursorIcon::ResizeNeSw,
            ResizeHandle::NW | ResizeHandle::SE => egui::CursorIcon::ResizeNwSe,
        }
    }
}

/// `start` dragged by `delta` on `handle`, never smaller than the minimum size.
pub(crate) fn resized_rect(start: RectF, handle: ResizeHandle, delta: egui::Vec2) -> RectF {
    let mut min = start.min.to_pos2();
    let mut max = start.max.to_pos2();
    match handle {
        ResizeHandle::NW => {
            min.x += delta.x;
            min.y += delta.y;
        }
        ResizeHandle::N => min.y += delta.y,
        ResizeHandle::NE => {
            max.x += delta.x;
            min.y += delta.y;
        }
        ResizeHandle::W => min.x += delta.x,
        ResizeHandle::E => max.x += delta.x,
        ResizeHandle::SW => {
            min.x += delta.x;
            max.y += delta.y;
        }
        ResizeHandle::S => max.y += delta.y,
        ResizeHandle::SE => {
            max.x += delta.x;
            max.y += delta.y;
        }
    }
    if max.x - min.x < MIN_ELEMENT_SIZE {
        if matches!(handle, ResizeHandle::NW | ResizeHandle::W | ResizeHandle::SW) {
            min.x = max.x - MIN_ELEMENT_SIZE;
        } else {
            max.x = min.x + MIN_ELEMENT_SIZE;
        }
    }
    if max.y - min.y < MIN_ELEMENT_SIZE {
        if matches!(handle, ResizeHandle::NW | ResizeHandle::N | ResizeHandle::NE) {
            min.y = max.y - MIN_ELEMENT_SIZE;
        } else {
            max.y = min.y + MIN_ELEMENT_SIZE;
        }
    }
    RectF::from_min_max(min, max)
}

pub(crate) fn snap_value(v: f32, grid: f32) -> f32 {
    if grid <= f32::EPSILON {
        return v;
    }
    (v / grid).round() * grid
}

pub(crate) fn snap_rect_origin(rect: RectF, grid: f32) -> RectF {
    let dx = snap_value(rect.min.x, grid) - rect.min.x;
    let dy = snap_value(rect.min.y, grid) - rect.min.y;
    rect.translated(dx, dy)
}

pub(crate) fn hit_test_element(element: &model::Element, world_pos: egui::Pos2, threshold: f32) -> bool {
    element.bounds().expand(threshold).contains(world_pos)
}

/// Cell geometry of a bubble grid: a question-number column, then one
/// column per option.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GridLayout {
    pub origin: Point,
    pub number_width: f32,
    pub cell_width: f32,
    pub row_height: f32,
    pub radius: f32,
}

impl GridLayout {
    pub(crate) fn bubble_center(&self, question: u32, option: u32) -> Point {
        Point::new(
            self.origin.x + self.number_width + self.cell_width * (option as f32 + 0.5),
            self.origin.y + self.row_height * (question as f32 + 0.5),
        )
    }

    pub(crate) fn number_anchor(&self, question: u32) -> Point {
        Point::new(
            self.origin.x + self.number_width - 4.0,
            self.origin.y + self.row_height * (question as f32 + 0.5),
        )
    }
}

pub(crate) fn grid_layout(rect: RectF, kind: &ElementKind) -> Option<GridLayout> {
    let ElementKind::BubbleGrid {
        questions, options, ..
    } = kind
    else {
        return None;
    };
    if *questions == 0 || *options == 0 {
        return None;
    }
    let number_width = (rect.width() * 0.2).min(28.0);
    let cell_width = (rect.width() - number_width) / *options as f32;
    let row_height = rect.height() / *questions as f32;
    let radius = (cell_width.min(row_height) * 0.38).max(1.0);
    Some(GridLayout {
        origin: rect.min,
        number_width,
        cell_width,
        row_height,
        radius,
    })
}

/// Default size of a new element of `kind`, used for click-to-place.
pub(crate) fn default_size(kind: &ElementKind) -> egui::Vec2 {
    match kind {
        ElementKind::BubbleGrid {
            questions, options, ..
        } => egui::vec2(28.0 + 18.0 * *options as f32, 16.0 * *questions as f32),
        ElementKind::TextField | ElementKind::StudentField { .. } => egui::vec2(180.0, 22.0),
        ElementKind::TextArea => egui::vec2(240.0, 80.0),
        ElementKind::Image { .. } => egui::vec2(120.0, 80.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BubbleLabels;

    fn rect() -> RectF {
        RectF::from_min_size(Point::new(10.0, 10.0), 100.0, 50.0)
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let r = resized_rect(rect(), ResizeHandle::SE, egui::vec2(-200.0, -200.0));
        assert_eq!(r.width(), MIN_ELEMENT_SIZE);
        assert_eq!(r.height(), MIN_ELEMENT_SIZE);
        assert_eq!(r.min, rect().min);

        let r = resized_rect(rect(), ResizeHandle::NW, egui::vec2(500.0, 500.0));
        assert_eq!(r.max, rect().max);
        assert_eq!(r.width(), MIN_ELEMENT_SIZE);
    }

    #[test]
    fn edge_handles_move_one_side() {
        let r = resized_rect(rect(), ResizeHandle::E, egui::vec2(20.0, 99.0));
        assert_eq!(r.width(), 120.0);
        assert_eq!(r.height(), 50.0);
    }

    #[test]
    fn snapping_moves_origin_only() {
        let r = snap_rect_origin(RectF::from_min_size(Point::new(13.0, 22.0), 50.0, 10.0), 8.0);
        assert_eq!(r.min, Point::new(16.0, 24.0));
        assert_eq!(r.width(), 50.0);
        assert_eq!(snap_value(5.0, 0.0), 5.0);
    }

    #[test]
    fn grid_cells_fill_rect() {
        let kind = ElementKind::BubbleGrid {
            questions: 5,
            options: 4,
            labels: BubbleLabels::Letters,
            first_question: 1,
        };
        let layout = grid_layout(rect(), &kind).unwrap();
        assert_eq!(layout.row_height, 10.0);
        let last = layout.bubble_center(4, 3);
        assert!(last.x < rect().max.x && last.y < rect().max.y);
        assert!(grid_layout(rect(), &ElementKind::TextArea).is_none());
    }
}

use crate::model::ElementUpdate;
use eframe::egui;

use super::geometry::{ResizeHandle, resized_rect, snap_rect_origin};
use super::{ActiveTransform, FormEditorApp, View};

const HANDLE_SIZE_SCREEN: f32 = 10.0;

impl FormEditorApp {
    /// Draws and drives the resize handles of a single selected element.
    /// Returns true while the pointer is over a handle.
    pub(super) fn interact_selection_handles(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        origin: egui::Pos2,
        view: &View,
        pointer_world: Option<egui::Pos2>,
    ) -> bool {
        let Some(selected_id) = self.single_selected() else {
            if matches!(self.active_transform, Some(ActiveTransform::Resize { .. })) {
                self.active_transform = None;
            }
            return false;
        };
        let Some(rect) = self.form.element(&selected_id).map(|e| e.rect) else {
            self.active_transform = None;
            return false;
        };

        if let Some(ActiveTransform::Resize {
            element_id,
            handle,
            start_rect,
            start_pointer_world,
        }) = &self.active_transform
        {
            if *element_id != selected_id {
                self.active_transform = None;
            } else if let Some(p) = pointer_world {
                let mut resized = resized_rect(*start_rect, *handle, p - *start_pointer_world);
                if self.snap_to_grid {
                    resized = snap_rect_origin(resized, self.grid_size);
                }
                let id = element_id.clone();
                self.form.update_element(&id, ElementUpdate::rect(resized));
            }
        }

        let handle_fill = egui::Color32::from_rgb(250, 250, 250);
        let handle_stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255));
        let screen_rect = view.rect_to_screen(origin, rect);
        let mut over_handle = false;

        for (i, handle) in ResizeHandle::ALL.into_iter().enumerate() {
            let r = egui::Rect::from_center_size(
                handle.position(screen_rect),
                egui::vec2(HANDLE_SIZE_SCREEN, HANDLE_SIZE_SCREEN),
            );
            let id = ui.id().with(("resize", selected_id.as_str(), i));
            let resp = ui.interact(r, id, egui::Sense::drag());
            painter.rect_filled(r, 1.0, handle_fill);
            painter.rect_stroke(r, 1.0, handle_stroke, egui::StrokeKind::Middle);
            if resp.drag_started() {
                if let Some(p) = pointer_world {
                    self.push_undo();
                    self.active_transform = Some(ActiveTransform::Resize {
                        element_id: selected_id.clone(),
                        handle,
                        start_rect: rect,
                        start_pointer_world: p,
                    });
                }
            }
            if resp.drag_stopped() {
                self.active_transform = None;
            }
            if resp.hovered() || resp.dragged() {
                over_handle = true;
                ui.ctx().set_cursor_icon(handle.cursor());
            }
        }
        over_handle
    }
}

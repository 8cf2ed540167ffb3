use crate::error::FormResult;
use crate::form::FormEditor;
use crate::model::{self, ElementId, ElementKind, Point, RectF};
use eframe::egui;
use std::path::Path;

use super::geometry::{default_size, hit_test_element, snap_rect_origin};
use super::{settings, svg};
use super::{FormEditorApp, Snapshot, Tool};

const DUPLICATE_OFFSET: f32 = 12.0;

fn load_color_image(path: &str) -> FormResult<egui::ColorImage> {
    let rgba = image::open(path)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

impl FormEditorApp {
    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.form.document().clone(),
            selected: self.selected.iter().cloned().collect(),
        }
    }

    pub(super) fn restore(&mut self, snapshot: Snapshot) {
        if let Err(e) = self.form.replace_document(snapshot.doc) {
            tracing::warn!(error = %e, "snapshot rejected");
            return;
        }
        self.selected = snapshot.selected.into_iter().collect();
        self.in_progress = None;
        self.active_transform = None;
        self.status = None;
    }

    pub(super) fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.push_history(snapshot);
    }

    fn push_history(&mut self, snapshot: Snapshot) {
        const LIMIT: usize = 200;
        self.history.push(snapshot);
        if self.history.len() > LIMIT {
            let overflow = self.history.len() - LIMIT;
            self.history.drain(0..overflow);
        }
        self.future.clear();
    }

    pub(super) fn undo(&mut self) {
        self.form.commit_edit();
        let Some(prev) = self.history.pop() else {
            return;
        };
        let current = self.snapshot();
        self.future.push(current);
        self.restore(prev);
    }

    pub(super) fn redo(&mut self) {
        self.form.commit_edit();
        let Some(next) = self.future.pop() else {
            return;
        };
        let current = self.snapshot();
        self.history.push(current);
        self.restore(next);
    }

    pub(super) fn topmost_hit(&self, world_pos: egui::Pos2, threshold_world: f32) -> Option<ElementId> {
        self.form
            .elements()
            .iter()
            .rev()
            .find(|e| hit_test_element(e, world_pos, threshold_world))
            .map(|e| e.id.clone())
    }

    pub(super) fn single_selected(&self) -> Option<ElementId> {
        if self.selected.len() != 1 {
            return None;
        }
        self.selected.iter().next().cloned()
    }

    /// Selected ids in paint order.
    pub(super) fn selected_in_order(&self) -> Vec<ElementId> {
        self.form
            .elements()
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .map(|e| e.id.clone())
            .collect()
    }

    pub(super) fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub(super) fn set_selection_single(&mut self, id: ElementId) {
        self.selected.clear();
        self.selected.insert(id);
    }

    pub(super) fn toggle_selection(&mut self, id: ElementId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub(super) fn select_all(&mut self) {
        self.selected = self.form.elements().iter().map(|e| e.id.clone()).collect();
    }

    /// Selects every element whose bounds intersect the world-space box.
    pub(super) fn select_in_box(&mut self, a: egui::Pos2, b: egui::Pos2, additive: bool) {
        let area = egui::Rect::from_two_pos(a, b);
        if !additive {
            self.selected.clear();
        }
        for e in self.form.elements() {
            if area.intersects(e.bounds()) {
                self.selected.insert(e.id.clone());
            }
        }
    }

    /// Places a new element of the active tool's kind covering `a`..`b`,
    /// or at its default size when the drag was a click.
    pub(super) fn place_element(&mut self, a: egui::Pos2, b: egui::Pos2) {
        let Some(kind) = self.new_element.kind_for(self.tool) else {
            return;
        };
        let dragged = egui::Rect::from_two_pos(a, b);
        let mut rect = if dragged.width() < 4.0 && dragged.height() < 4.0 {
            let size = default_size(&kind);
            RectF::from_min_size(Point::from_pos2(a), size.x, size.y)
        } else {
            RectF::from_min_max(a, b)
        };
        if self.snap_to_grid {
            rect = snap_rect_origin(rect, self.grid_size);
        }
        self.push_undo();
        let supports_text = kind.supports_text();
        let id = self.form.add_element(kind, rect);
        self.set_selection_single(id.clone());
        self.tool = Tool::Select;
        if supports_text {
            self.form.start_editing(&id);
        }
    }

    pub(super) fn translate_selected(&mut self, delta_world: egui::Vec2) {
        for id in self.selected_in_order() {
            self.form.move_element(&id, delta_world.x, delta_world.y);
        }
    }

    pub(super) fn snap_selected_to_grid(&mut self) {
        if !self.snap_to_grid {
            return;
        }
        for id in self.selected_in_order() {
            let Some(rect) = self.form.element(&id).map(|e| e.rect) else {
                continue;
            };
            let snapped = snap_rect_origin(rect, self.grid_size);
            self.form.update_element(&id, model::ElementUpdate::rect(snapped));
        }
    }

    pub(super) fn delete_selected(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.push_undo();
        for id in self.selected_in_order() {
            self.form.remove_element(&id);
        }
        self.clear_selection();
    }

    pub(super) fn duplicate_selected(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.push_undo();
        let mut copies = Vec::new();
        for id in self.selected_in_order() {
            if let Some(copy) = self
                .form
                .duplicate_element(&id, DUPLICATE_OFFSET, DUPLICATE_OFFSET)
            {
                copies.push(copy);
            }
        }
        self.selected = copies.into_iter().collect();
    }

    pub(super) fn bring_selected_to_front(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.push_undo();
        for id in self.selected_in_order() {
            self.form.reorder_element(&id, usize::MAX);
        }
    }

    pub(super) fn send_selected_to_back(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.push_undo();
        for (i, id) in self.selected_in_order().into_iter().enumerate() {
            self.form.reorder_element(&id, i);
        }
    }

    /// Starts an inline edit on `id` when its kind carries text.
    pub(super) fn begin_text_edit(&mut self, id: &ElementId) {
        let Some(element) = self.form.element(id) else {
            return;
        };
        if !element.kind.supports_text() {
            return;
        }
        if self.form.editing_target() != Some(id) {
            self.push_undo();
        }
        self.form.start_editing(id);
        self.set_selection_single(id.clone());
    }

    pub(super) fn set_bubble_content(&mut self, id: &ElementId, key: &str, value: String) {
        self.push_undo();
        self.form.update_bubble_content(id, key, value);
    }

    pub(super) fn revert_bubble_content(&mut self, id: &ElementId, key: &str) {
        self.push_undo();
        self.form.clear_bubble_content(id, key);
    }

    pub(super) fn tidy_bubble_overrides(&mut self) {
        self.push_undo();
        let removed = self.form.tidy_bubble_overrides();
        self.status = Some(format!("Removed {removed} redundant override(s)"));
    }

    pub(super) fn toggle_corner_marks(&mut self) {
        let mut marks = self.form.corner_marks();
        marks.is_visible = !marks.is_visible;
        self.push_undo();
        self.form.set_corner_marks(marks);
    }

    /// Swaps in `doc` and records the outgoing one, live draft included, for undo.
    fn replace_with_undo(&mut self, doc: crate::form::FormDocument) -> FormResult<()> {
        let selected = self.selected.iter().cloned().collect();
        let previous = self.form.commit_then_replace(doc)?;
        self.push_history(Snapshot {
            doc: previous,
            selected,
        });
        self.selected.clear();
        self.in_progress = None;
        self.active_transform = None;
        Ok(())
    }

    pub(super) fn new_form(&mut self) {
        let doc = crate::form::FormDocument {
            page: self.default_page,
            corner_marks: self.default_corner_marks,
            ..Default::default()
        };
        match self.replace_with_undo(doc) {
            Ok(()) => self.status = Some("New form".to_string()),
            Err(e) => self.status = Some(format!("New form failed: {e}")),
        }
    }

    fn write_json(&mut self, path: &Path) -> FormResult<()> {
        self.form.commit_edit();
        self.form.save(path)
    }

    pub(super) fn save_to_path(&mut self) {
        let path = self.file_path.clone();
        match self.write_json(Path::new(&path)) {
            Ok(()) => self.status = Some(format!("Saved {path}")),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "save failed");
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    pub(super) fn save_json_dialog(&mut self) {
        let default_name = format!("{}.json", self.form_name);
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter("JSON", &["json"])
            .save_file()
        else {
            return;
        };
        match self.write_json(&path) {
            Ok(()) => {
                self.file_path = path.display().to_string();
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    self.form_name = stem.to_string();
                }
                self.status = Some(format!("Saved {}", self.file_path));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "save failed");
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    pub(super) fn open_json_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match FormEditor::load(&path) {
            Ok(loaded) => {
                if let Err(e) = self.replace_with_undo(loaded.document().clone()) {
                    self.status = Some(format!("Open failed: {e}"));
                    return;
                }
                self.file_path = path.display().to_string();
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    self.form_name = stem.to_string();
                }
                self.textures.clear();
                self.status = Some(format!("Loaded {}", self.file_path));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "open failed");
                self.status = Some(format!("Open failed: {e}"));
            }
        }
    }

    fn write_svg(&mut self, path: &Path) -> FormResult<()> {
        self.form.commit_edit();
        std::fs::write(path, svg::document_to_svg(self.form.document()))?;
        tracing::info!(path = %path.display(), "exported svg");
        Ok(())
    }

    pub(super) fn save_svg_to_path(&mut self) {
        let path = self.svg_path.clone();
        match self.write_svg(Path::new(&path)) {
            Ok(()) => self.status = Some(format!("Exported {path}")),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "svg export failed");
                self.status = Some(format!("SVG export failed: {e}"));
            }
        }
    }

    pub(super) fn save_svg_dialog(&mut self) {
        let default_name = format!("{}.svg", self.form_name);
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        match self.write_svg(&path) {
            Ok(()) => {
                self.svg_path = path.display().to_string();
                self.status = Some(format!("Exported {}", self.svg_path));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "svg export failed");
                self.status = Some(format!("SVG export failed: {e}"));
            }
        }
    }

    pub(super) fn pick_image_for_selected(&mut self) {
        let Some(id) = self.single_selected() else {
            return;
        };
        if !matches!(
            self.form.element(&id).map(|e| &e.kind),
            Some(ElementKind::Image { .. })
        ) {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };
        self.push_undo();
        let update = model::ElementUpdate {
            kind: Some(ElementKind::Image {
                source: path.display().to_string(),
            }),
            ..Default::default()
        };
        self.form.update_element(&id, update);
    }

    /// Loads every image referenced by the form that is not cached yet.
    /// Failures are cached as `None` so they are reported once.
    pub(super) fn ensure_textures(&mut self, ctx: &egui::Context) {
        let sources: Vec<String> = self
            .form
            .elements()
            .iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Image { source } if !source.is_empty() => Some(source.clone()),
                _ => None,
            })
            .filter(|s| !self.textures.contains_key(s))
            .collect();
        for source in sources {
            let handle = match load_color_image(&source) {
                Ok(image) => Some(ctx.load_texture(&source, image, egui::TextureOptions::LINEAR)),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "image load failed");
                    None
                }
            };
            self.textures.insert(source, handle);
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::AppSettings {
        settings::AppSettings {
            file_path: self.file_path.clone(),
            svg_path: self.svg_path.clone(),
            page: self.default_page,
            corner_marks: self.default_corner_marks,
            snap_to_grid: self.snap_to_grid,
            grid_size: self.grid_size,
            move_step: self.move_step,
            move_step_fast: self.move_step_fast,
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        match settings::save_settings(&self.settings_path, &snapshot) {
            Ok(()) => self.status = Some(format!("Settings saved to {}", self.settings_path)),
            Err(e) => {
                tracing::warn!(path = %self.settings_path, error = %e, "settings save failed");
                self.status = Some(format!("Settings save failed: {e}"));
            }
        }
    }

    pub(super) fn reload_settings(&mut self) {
        let settings = settings::load_or_default(&self.settings_path);
        self.file_path = settings.file_path;
        self.svg_path = settings.svg_path;
        self.snap_to_grid = settings.snap_to_grid;
        self.grid_size = settings.grid_size;
        self.move_step = settings.move_step;
        self.move_step_fast = settings.move_step_fast;
        self.default_page = settings.page;
        self.default_corner_marks = settings.corner_marks;
        self.status = Some("Settings reloaded".to_string());
    }

    /// Makes the current page setup and marks the defaults for new forms.
    pub(super) fn adopt_form_defaults(&mut self) {
        self.default_page = self.form.page();
        self.default_corner_marks = self.form.corner_marks();
        self.persist_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::settings::AppSettings;
    use pretty_assertions::assert_eq;

    fn editing(text: &str) -> (FormEditorApp, ElementId) {
        let mut app = FormEditorApp::with_settings(AppSettings::default(), String::new());
        let id = app.form.add_element(
            ElementKind::TextField,
            RectF::from_min_size(Point::new(40.0, 40.0), 200.0, 24.0),
        );
        app.begin_text_edit(&id);
        app.form.update_draft(text);
        (app, id)
    }

    fn content(app: &FormEditorApp, id: &ElementId) -> Option<String> {
        app.form.element(id).and_then(|e| e.content.clone())
    }

    #[test]
    fn undo_while_editing_commits_first_so_redo_brings_the_text_back() {
        let (mut app, id) = editing("Ad Soyad");
        app.undo();
        assert!(!app.form.is_editing());
        assert_eq!(content(&app, &id), None);

        app.redo();
        assert_eq!(content(&app, &id).as_deref(), Some("Ad Soyad"));
    }

    #[test]
    fn new_form_while_editing_keeps_the_draft_in_history() {
        let (mut app, id) = editing("Ad Soyad");
        app.new_form();
        assert!(app.form.elements().is_empty());
        assert!(app.selected.is_empty());

        app.undo();
        assert_eq!(content(&app, &id).as_deref(), Some("Ad Soyad"));
        assert!(app.selected.contains(&id));
    }

    #[test]
    fn history_is_capped() {
        let mut app = FormEditorApp::with_settings(AppSettings::default(), String::new());
        for _ in 0..250 {
            app.push_undo();
        }
        assert_eq!(app.history.len(), 200);
    }
}

use crate::bubbles::BubbleContent;
use crate::corner_marks;
use crate::model::{self, ElementId, ElementKind, ElementUpdate, Point, RectF};
use crate::text_edit::EditEvent;
use eframe::egui;

use super::command_palette::{CommandContext, CommandPalette};
use super::doc_ops::{AlignMode, Axis, align_selected, distribute_selected, element_label, stack_selected};
use super::geometry::MIN_ELEMENT_SIZE;
use super::render::{
    ElementPaint, draw_background, draw_elements, draw_in_progress, draw_overlay, draw_page,
    tool_button,
};
use super::{ActiveTransform, FormEditorApp, InProgress, Tool};

/// Tracks whether a group of inspector widgets began or changed an edit this
/// frame, so one undo snapshot covers the whole gesture.
#[derive(Default)]
struct FieldEdit {
    began: bool,
    changed: bool,
}

impl FieldEdit {
    fn track(&mut self, resp: &egui::Response) {
        self.began |= resp.drag_started() || resp.gained_focus();
        self.changed |= resp.changed();
    }
}

enum BubbleEdit {
    Set(String, String),
    Blank(String),
    Revert(String),
}

impl eframe::App for FormEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(notice) = self.edit_notice.borrow_mut().take() {
            self.status = Some(notice);
        }
        self.ensure_textures(ctx);
        let press = ctx.input(|i| {
            i.pointer
                .primary_pressed()
                .then(|| i.pointer.interact_pos())
                .flatten()
        });
        self.commit_on_outside_press(press);
        self.handle_edit_keys(ctx);

        let wants_keyboard = ctx.wants_keyboard_input();
        ctx.input_mut(|i| {
            if !self.command_palette.open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                self.command_palette.open();
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S) {
                self.save_svg_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
                self.save_json_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_json_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::N) {
                self.new_form();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                self.show_help = !self.show_help;
            }
            let skip_shortcuts =
                wants_keyboard || self.form.is_editing() || self.command_palette.open;
            if skip_shortcuts {
                return;
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
            {
                self.redo();
            } else if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z) {
                self.undo();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                self.tool = Tool::Select;
                self.in_progress = None;
                self.active_transform = None;
                self.tool_before_pan = None;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::A) {
                self.select_all();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::D) {
                self.duplicate_selected();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace)
            {
                self.delete_selected();
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::V) {
                self.tool = Tool::Select;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::B) {
                self.tool = Tool::BubbleGrid;
            }
            if i.consume_key(egui::Modifiers::SHIFT, egui::Key::T) {
                self.tool = Tool::TextArea;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::T) {
                self.tool = Tool::TextField;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::S) {
                self.tool = Tool::StudentField;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::I) {
                self.tool = Tool::Image;
            }

            let step = if i.modifiers.shift {
                self.move_step_fast
            } else {
                self.move_step
            };
            let arrows = [
                (egui::Key::ArrowLeft, egui::vec2(-1.0, 0.0)),
                (egui::Key::ArrowRight, egui::vec2(1.0, 0.0)),
                (egui::Key::ArrowUp, egui::vec2(0.0, -1.0)),
                (egui::Key::ArrowDown, egui::vec2(0.0, 1.0)),
            ];
            for (key, dir) in arrows {
                if !i.consume_key(egui::Modifiers::NONE, key) {
                    continue;
                }
                if self.selected.is_empty() {
                    self.view.pan_screen -= dir * step * self.view.zoom;
                } else {
                    self.push_undo();
                    self.translate_selected(dir * step);
                }
            }
        });

        self.menu_bar(ctx);

        egui::SidePanel::left("form_panel")
            .resizable(true)
            .min_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.tools_section(ui);
                    ui.separator();
                    self.page_section(ui);
                    ui.separator();
                    self.inspector_section(ui);
                    ui.separator();
                    self.layers_section(ui);
                });
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match &self.status {
                    Some(status) => ui.label(status),
                    None => ui.label("Ready"),
                };
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.0}%", self.view.zoom * 100.0));
                    ui.separator();
                    ui.label(format!("Elements: {}", self.form.elements().len()));
                    ui.separator();
                    ui.label(format!("Selected: {}", self.selected.len()));
                    if let Some(target) = self.form.editing_target() {
                        ui.separator();
                        ui.label(format!("Editing {target}"));
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui, ctx));

        let text_selected = self
            .single_selected()
            .and_then(|id| self.form.element(&id).map(|e| e.kind.supports_text()))
            .unwrap_or(false);
        let cx = CommandContext {
            selected_len: self.selected.len(),
            has_undo: !self.history.is_empty(),
            has_redo: !self.future.is_empty(),
            snap_to_grid: self.snap_to_grid,
            text_selected,
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }

        super::help::draw_help_window(ctx, &mut self.show_help);
    }
}

impl FormEditorApp {
    /// Maps keys to edit-session events before the inline editor sees them.
    /// Text areas keep plain Enter for newlines and commit on Cmd/Ctrl+Enter.
    fn handle_edit_keys(&mut self, ctx: &egui::Context) {
        let Some(multiline) = self
            .form
            .editing_target()
            .and_then(|id| self.form.element(id))
            .map(|e| e.kind.is_multiline())
        else {
            return;
        };
        let (cancel, confirm) = ctx.input_mut(|i| {
            let cancel = i.consume_key(egui::Modifiers::NONE, egui::Key::Escape);
            let confirm = if multiline {
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Enter)
            } else {
                i.consume_key(egui::Modifiers::NONE, egui::Key::Enter)
            };
            (cancel, confirm)
        });
        if cancel {
            self.form.handle_edit_event(EditEvent::CancelKey);
        } else if confirm {
            self.form.handle_edit_event(EditEvent::ConfirmKey);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    ui.label("Form name:");
                    ui.text_edit_singleline(&mut self.form_name);
                    ui.separator();
                    if ui.button("New (⌘N)").clicked() {
                        self.new_form();
                        ui.close();
                    }
                    if ui.button("Open... (⌘O)").clicked() {
                        self.open_json_dialog();
                        ui.close();
                    }
                    if ui.button("Save JSON... (⌘S)").clicked() {
                        self.save_json_dialog();
                        ui.close();
                    }
                    if ui.button("Export SVG... (⌘⇧S)").clicked() {
                        self.save_svg_dialog();
                        ui.close();
                    }
                    ui.separator();
                    ui.label("Quick paths:");
                    ui.small("JSON:");
                    if ui.text_edit_singleline(&mut self.file_path).lost_focus() {
                        self.persist_settings();
                    }
                    if ui.button("Save to quick path").clicked() {
                        self.save_to_path();
                        ui.close();
                    }
                    ui.small("SVG:");
                    if ui.text_edit_singleline(&mut self.svg_path).lost_focus() {
                        self.persist_settings();
                    }
                    if ui.button("Export to quick path").clicked() {
                        self.save_svg_to_path();
                        ui.close();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(!self.history.is_empty(), egui::Button::new("Undo (⌘Z)"))
                        .clicked()
                    {
                        self.undo();
                        ui.close();
                    }
                    if ui
                        .add_enabled(!self.future.is_empty(), egui::Button::new("Redo (⌘⇧Z)"))
                        .clicked()
                    {
                        self.redo();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Select all (⌘A)").clicked() {
                        self.select_all();
                        ui.close();
                    }
                    if ui.button("Duplicate (⌘D)").clicked() {
                        self.duplicate_selected();
                        ui.close();
                    }
                    if ui.button("Delete").clicked() {
                        self.delete_selected();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Command palette (⌘⇧P)").clicked() {
                        self.command_palette.open();
                        ui.close();
                    }
                });
                ui.menu_button("Form", |ui| {
                    let mut visible = self.form.corner_marks().is_visible;
                    if ui.checkbox(&mut visible, "Corner marks").changed() {
                        self.toggle_corner_marks();
                    }
                    if ui.button("Tidy bubble overrides").clicked() {
                        self.tidy_bubble_overrides();
                        ui.close();
                    }
                    ui.separator();
                    if ui.checkbox(&mut self.snap_to_grid, "Snap to grid").changed() {
                        self.persist_settings();
                    }
                    ui.horizontal(|ui| {
                        ui.label("Grid:");
                        let resp = ui.add(
                            egui::DragValue::new(&mut self.grid_size)
                                .range(1.0..=100.0)
                                .speed(0.5),
                        );
                        if resp.drag_stopped() || resp.lost_focus() {
                            self.persist_settings();
                        }
                    });
                    if ui.button("Snap selection to grid").clicked() {
                        self.push_undo();
                        self.snap_selected_to_grid();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Use page setup as default").clicked() {
                        self.adopt_form_defaults();
                        ui.close();
                    }
                    if ui.button("Reload settings").clicked() {
                        self.reload_settings();
                        ui.close();
                    }
                });
                ui.menu_button("Arrange", |ui| {
                    let many = self.selected.len() >= 2;
                    if ui.button("Bring to front").clicked() {
                        self.bring_selected_to_front();
                        ui.close();
                    }
                    if ui.button("Send to back").clicked() {
                        self.send_selected_to_back();
                        ui.close();
                    }
                    ui.separator();
                    let aligns = [
                        ("Align left", AlignMode::Left),
                        ("Align center", AlignMode::HCenter),
                        ("Align right", AlignMode::Right),
                        ("Align top", AlignMode::Top),
                        ("Align middle", AlignMode::VCenter),
                        ("Align bottom", AlignMode::Bottom),
                    ];
                    for (label, mode) in aligns {
                        if ui.add_enabled(many, egui::Button::new(label)).clicked() {
                            self.push_undo();
                            align_selected(&mut self.form, &self.selected, mode);
                            ui.close();
                        }
                    }
                    ui.separator();
                    let spread = self.selected.len() >= 3;
                    if ui
                        .add_enabled(spread, egui::Button::new("Distribute horizontally"))
                        .clicked()
                    {
                        self.push_undo();
                        distribute_selected(&mut self.form, &self.selected, Axis::Horizontal);
                        ui.close();
                    }
                    if ui
                        .add_enabled(spread, egui::Button::new("Distribute vertically"))
                        .clicked()
                    {
                        self.push_undo();
                        distribute_selected(&mut self.form, &self.selected, Axis::Vertical);
                        ui.close();
                    }
                    if ui.add_enabled(many, egui::Button::new("Stack vertically")).clicked() {
                        self.push_undo();
                        stack_selected(&mut self.form, &self.selected, Axis::Vertical, 0.0);
                        ui.close();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Show help (F1)").clicked() {
                        self.show_help = true;
                        ui.close();
                    }
                });
                ui.separator();
                tool_button(ui, "Select", Tool::Select, &mut self.tool);
                tool_button(ui, "Bubbles", Tool::BubbleGrid, &mut self.tool);
                tool_button(ui, "Text", Tool::TextField, &mut self.tool);
                tool_button(ui, "Student", Tool::StudentField, &mut self.tool);
                tool_button(ui, "Area", Tool::TextArea, &mut self.tool);
                tool_button(ui, "Image", Tool::Image, &mut self.tool);
                tool_button(ui, "Pan", Tool::Pan, &mut self.tool);
            });
        });
    }

    fn tools_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("New elements");
        ui.horizontal(|ui| {
            ui.label("Questions");
            ui.add(egui::DragValue::new(&mut self.new_element.questions).range(1..=200));
            ui.label("Options");
            ui.add(egui::DragValue::new(&mut self.new_element.options).range(1..=26));
        });
        ui.horizontal(|ui| {
            ui.label("Labels");
            ui.radio_value(&mut self.new_element.labels, model::BubbleLabels::Letters, "A B C");
            ui.radio_value(&mut self.new_element.labels, model::BubbleLabels::Digits, "0 1 2");
        });
        ui.horizontal(|ui| {
            ui.label("Student field");
            student_kind_combo(ui, "new_student_kind", &mut self.new_element.student_subtype);
        });
        ui.horizontal(|ui| {
            ui.label("Image");
            ui.add(
                egui::TextEdit::singleline(&mut self.new_element.image_source)
                    .hint_text("path to png/jpeg")
                    .desired_width(140.0),
            );
        });
    }

    fn page_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Page");
        let mut page = self.form.page();
        let mut marks = self.form.corner_marks();
        let mut edit = FieldEdit::default();
        ui.horizontal(|ui| {
            ui.label("W");
            edit.track(&ui.add(egui::DragValue::new(&mut page.width).range(100.0..=2000.0)));
            ui.label("H");
            edit.track(&ui.add(egui::DragValue::new(&mut page.height).range(100.0..=2000.0)));
        });
        edit.track(&ui.checkbox(&mut marks.is_visible, "Corner marks"));
        ui.add_enabled_ui(marks.is_visible, |ui| {
            edit.track(&ui.add(
                egui::Slider::new(&mut marks.safe_zone_margin, 0.0..=60.0).text("Margin"),
            ));
            edit.track(&ui.add(
                egui::Slider::new(&mut marks.safe_zone_padding, 0.0..=60.0).text("Padding"),
            ));
        });
        if edit.began || (edit.changed && ui.ctx().input(|i| !i.pointer.any_down())) {
            self.push_undo();
        }
        if edit.changed {
            self.form.set_page(page);
            self.form.set_corner_marks(marks);
        }
    }

    fn inspector_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Inspector");
        let Some(id) = self.single_selected() else {
            ui.weak(match self.selected.len() {
                0 => "Nothing selected".to_string(),
                n => format!("{n} elements selected"),
            });
            return;
        };
        let Some(element) = self.form.element(&id).cloned() else {
            return;
        };
        ui.label(element_label(&element));
        if !corner_marks::within_safe_zone(&self.form.corner_marks(), self.form.page(), element.rect)
        {
            ui.colored_label(egui::Color32::from_rgb(230, 120, 80), "Outside the safe zone");
        }

        let mut edit = FieldEdit::default();
        let (mut x, mut y) = (element.rect.min.x, element.rect.min.y);
        let (mut w, mut h) = (element.rect.width(), element.rect.height());
        egui::Grid::new("geometry").num_columns(4).show(ui, |ui| {
            ui.label("X");
            edit.track(&ui.add(egui::DragValue::new(&mut x).speed(1.0)));
            ui.label("Y");
            edit.track(&ui.add(egui::DragValue::new(&mut y).speed(1.0)));
            ui.end_row();
            ui.label("W");
            edit.track(&ui.add(
                egui::DragValue::new(&mut w)
                    .range(MIN_ELEMENT_SIZE..=2000.0)
                    .speed(1.0),
            ));
            ui.label("H");
            edit.track(&ui.add(
                egui::DragValue::new(&mut h)
                    .range(MIN_ELEMENT_SIZE..=2000.0)
                    .speed(1.0),
            ));
            ui.end_row();
        });
        if edit.began {
            self.push_undo();
        }
        if edit.changed {
            let rect = RectF::from_min_size(Point::new(x, y), w, h);
            self.form.update_element(&id, ElementUpdate::rect(rect));
        }

        match &element.kind {
            ElementKind::BubbleGrid { .. } => self.bubble_grid_inspector(ui, &element),
            ElementKind::TextField | ElementKind::StudentField { .. } | ElementKind::TextArea => {
                self.text_inspector(ui, &element)
            }
            ElementKind::Image { source } => {
                ui.separator();
                ui.label(if source.is_empty() { "No image chosen" } else { source.as_str() });
                if ui.button("Choose image...").clicked() {
                    self.pick_image_for_selected();
                }
            }
        }
    }

    fn text_inspector(&mut self, ui: &mut egui::Ui, element: &model::Element) {
        ui.separator();
        if let ElementKind::StudentField { subtype } = element.kind {
            let mut subtype_now = subtype;
            ui.horizontal(|ui| {
                ui.label("Field");
                student_kind_combo(ui, "selected_student_kind", &mut subtype_now);
            });
            if subtype_now != subtype {
                self.push_undo();
                let update = ElementUpdate {
                    kind: Some(ElementKind::StudentField {
                        subtype: subtype_now,
                    }),
                    ..Default::default()
                };
                self.form.update_element(&element.id, update);
            }
        }

        let mut size = element.text_size;
        let mut edit = FieldEdit::default();
        ui.horizontal(|ui| {
            ui.label("Text size");
            edit.track(&ui.add(egui::DragValue::new(&mut size).range(6.0..=72.0).speed(0.2)));
        });
        if edit.began {
            self.push_undo();
        }
        if edit.changed {
            let update = ElementUpdate {
                text_size: Some(size),
                ..Default::default()
            };
            self.form.update_element(&element.id, update);
        }

        match element.content.as_deref() {
            None => ui.weak("Content unset, placeholder shown"),
            Some("") => ui.weak("Content left blank"),
            Some(text) => ui.label(egui::RichText::new(text).italics()),
        };
        ui.horizontal(|ui| {
            if ui.button("Edit").clicked() {
                self.begin_text_edit(&element.id);
            }
            if ui
                .add_enabled(element.content.as_deref() != Some(""), egui::Button::new("Blank"))
                .on_hover_text("Print nothing, not even the placeholder")
                .clicked()
            {
                self.push_undo();
                self.form
                    .update_element(&element.id, ElementUpdate::content(""));
            }
            if ui
                .add_enabled(element.content.is_some(), egui::Button::new("Unset"))
                .on_hover_text("Show the placeholder again")
                .clicked()
            {
                self.push_undo();
                self.form
                    .update_element(&element.id, ElementUpdate::clear_content());
            }
        });
    }

    fn bubble_grid_inspector(&mut self, ui: &mut egui::Ui, element: &model::Element) {
        let ElementKind::BubbleGrid {
            mut questions,
            mut options,
            mut labels,
            mut first_question,
        } = element.kind.clone()
        else {
            return;
        };
        ui.separator();
        let mut edit = FieldEdit::default();
        egui::Grid::new("bubble_grid").num_columns(2).show(ui, |ui| {
            ui.label("Questions");
            edit.track(&ui.add(egui::DragValue::new(&mut questions).range(1..=200)));
            ui.end_row();
            ui.label("Options");
            edit.track(&ui.add(egui::DragValue::new(&mut options).range(1..=26)));
            ui.end_row();
            ui.label("First number");
            edit.track(&ui.add(egui::DragValue::new(&mut first_question).range(0..=999)));
            ui.end_row();
            ui.label("Labels");
            ui.horizontal(|ui| {
                edit.track(&ui.radio_value(&mut labels, model::BubbleLabels::Letters, "A B C"));
                edit.track(&ui.radio_value(&mut labels, model::BubbleLabels::Digits, "0 1 2"));
            });
            ui.end_row();
        });
        if edit.began || (edit.changed && ui.ctx().input(|i| !i.pointer.any_down())) {
            self.push_undo();
        }
        if edit.changed {
            let update = ElementUpdate {
                kind: Some(ElementKind::BubbleGrid {
                    questions,
                    options,
                    labels,
                    first_question,
                }),
                ..Default::default()
            };
            self.form.update_element(&element.id, update);
        }

        ui.separator();
        ui.label("Bubble labels");
        let resolved = self.form.resolved_bubbles();
        let mut edits = Vec::new();
        let mut began = false;
        egui::Grid::new("bubble_overrides")
            .num_columns(4)
            .striped(true)
            .show(ui, |ui| {
                for (key, content) in resolved.bubbles(&element.id) {
                    ui.monospace(key);
                    let mut value = content.glyph().unwrap_or_default().to_string();
                    let resp = ui.add(egui::TextEdit::singleline(&mut value).desired_width(48.0));
                    began |= resp.gained_focus();
                    if resp.changed() {
                        edits.push(BubbleEdit::Set(key.clone(), value));
                    }
                    match content {
                        BubbleContent::Default(_) => ui.weak("default"),
                        BubbleContent::Custom(_) => ui.label("custom"),
                        BubbleContent::Blank => ui.strong("blank"),
                    };
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!content.is_blank(), egui::Button::new("Blank").small())
                            .clicked()
                        {
                            edits.push(BubbleEdit::Blank(key.clone()));
                        }
                        let overridden = !matches!(content, BubbleContent::Default(_));
                        if ui
                            .add_enabled(overridden, egui::Button::new("Revert").small())
                            .clicked()
                        {
                            edits.push(BubbleEdit::Revert(key.clone()));
                        }
                    });
                    ui.end_row();
                }
            });
        if began {
            self.push_undo();
        }
        for edit in edits {
            match edit {
                BubbleEdit::Set(key, value) => {
                    self.form.update_bubble_content(&element.id, &key, value);
                }
                BubbleEdit::Blank(key) => self.set_bubble_content(&element.id, &key, String::new()),
                BubbleEdit::Revert(key) => self.revert_bubble_content(&element.id, &key),
            }
        }
        if !resolved.orphans.is_empty() {
            ui.weak(format!(
                "{} removed element(s) still carry bubble overrides",
                resolved.orphans.len()
            ));
        }
    }

    fn layers_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        let mut clicked: Option<(ElementId, bool)> = None;
        for element in self.form.elements().iter().rev() {
            let selected = self.selected.contains(&element.id);
            if ui.selectable_label(selected, element_label(element)).clicked() {
                let additive = ui.input(|i| i.modifiers.shift || i.modifiers.command);
                clicked = Some((element.id.clone(), additive));
            }
        }
        match clicked {
            Some((id, true)) => self.toggle_selection(id),
            Some((id, false)) => self.set_selection_single(id),
            None => {}
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let origin = rect.min;
        let painter = ui.painter_at(rect);

        let space_down = ctx.input(|i| i.key_down(egui::Key::Space)) && !ctx.wants_keyboard_input();
        if space_down {
            if self.tool_before_pan.is_none() {
                self.tool_before_pan = Some(self.tool);
                self.tool = Tool::Pan;
            }
        } else if let Some(prev) = self.tool_before_pan.take() {
            if self.tool == Tool::Pan {
                self.tool = prev;
            }
        }

        let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_delta.abs() > 0.0 {
            if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                if rect.contains(hover_pos) {
                    let zoom_delta = (1.0 + scroll_delta * 0.001).clamp(0.8, 1.25);
                    self.view.zoom_about_screen_point(origin, hover_pos, zoom_delta);
                }
            }
        }
        if self.tool == Tool::Pan && response.dragged() {
            self.view.pan_screen += response.drag_delta();
        }

        let pointer_pos = ctx.input(|i| i.pointer.interact_pos());
        let pointer_world = pointer_pos.map(|p| self.view.screen_to_world(origin, p));
        let threshold_world = 4.0 / self.view.zoom;

        draw_background(&painter, rect);
        let grid = self.snap_to_grid.then_some(self.grid_size);
        draw_page(&painter, origin, &self.view, self.form.page(), grid);
        if let Some(overlay) = self.form.overlay() {
            draw_overlay(&painter, origin, &self.view, &overlay);
        }
        let bubbles = self.form.resolved_bubbles();
        draw_elements(
            &painter,
            origin,
            &self.view,
            &ElementPaint {
                doc: self.form.document(),
                bubbles: &bubbles,
                selected: &self.selected,
                editing: self.form.editing_target(),
                textures: &self.textures,
            },
        );
        if let Some(in_progress) = &self.in_progress {
            draw_in_progress(&painter, origin, &self.view, in_progress);
        }
        let view = self.view;
        let over_handle = self.interact_selection_handles(ui, &painter, origin, &view, pointer_world);

        let mut handled_double_click = false;
        if response.double_clicked() && self.tool == Tool::Select {
            if let Some(hit) = pointer_world.and_then(|p| self.topmost_hit(p, threshold_world)) {
                self.begin_text_edit(&hit);
                handled_double_click = self.form.editing_target() == Some(&hit);
            }
        }

        let additive = ctx.input(|i| i.modifiers.shift || i.modifiers.command);
        if response.clicked() && !handled_double_click {
            if let Some(world) = pointer_world {
                match self.tool {
                    Tool::Select => match self.topmost_hit(world, threshold_world) {
                        Some(id) if additive => self.toggle_selection(id),
                        Some(id) => self.set_selection_single(id),
                        None if !additive => self.clear_selection(),
                        None => {}
                    },
                    tool if tool.creates() => self.place_element(world, world),
                    _ => {}
                }
            }
        }

        if response.drag_started() && !over_handle && self.active_transform.is_none() {
            let start = ctx
                .input(|i| i.pointer.press_origin())
                .map(|p| self.view.screen_to_world(origin, p))
                .or(pointer_world);
            if let Some(start) = start {
                self.drag_transform_recorded = false;
                match self.tool {
                    Tool::Select => match self.topmost_hit(start, threshold_world) {
                        Some(id) => {
                            if additive {
                                self.selected.insert(id);
                            } else if !self.selected.contains(&id) {
                                self.set_selection_single(id);
                            }
                            self.active_transform = Some(ActiveTransform::Move {
                                last_pointer_world: start,
                            });
                        }
                        None => {
                            self.in_progress = Some(InProgress::SelectBox {
                                start,
                                current: start,
                            });
                        }
                    },
                    tool if tool.creates() => {
                        self.in_progress = Some(InProgress::Place {
                            start,
                            current: start,
                        });
                    }
                    _ => {}
                }
            }
        }

        if response.dragged() {
            if let Some(world) = pointer_world {
                match &mut self.in_progress {
                    Some(InProgress::Place { current, .. })
                    | Some(InProgress::SelectBox { current, .. }) => *current = world,
                    None => {}
                }
                if let Some(ActiveTransform::Move { last_pointer_world }) = &mut self.active_transform
                {
                    let delta = world - *last_pointer_world;
                    *last_pointer_world = world;
                    if delta != egui::Vec2::ZERO {
                        if !self.drag_transform_recorded {
                            self.push_undo();
                            self.drag_transform_recorded = true;
                        }
                        self.translate_selected(delta);
                    }
                }
            }
        }

        if response.drag_stopped() {
            if matches!(self.active_transform, Some(ActiveTransform::Move { .. })) {
                if self.drag_transform_recorded {
                    self.snap_selected_to_grid();
                }
                self.active_transform = None;
            }
            self.drag_transform_recorded = false;
            match self.in_progress.take() {
                Some(InProgress::Place { start, current }) => self.place_element(start, current),
                Some(InProgress::SelectBox { start, current }) => {
                    self.select_in_box(start, current, additive)
                }
                None => {}
            }
        }

        self.inline_editor(ui, ctx, origin);

        response.context_menu(|ui| {
            if let Some(id) = self.single_selected() {
                let has_text = self
                    .form
                    .element(&id)
                    .is_some_and(|e| e.kind.supports_text());
                if ui.add_enabled(has_text, egui::Button::new("Edit text")).clicked() {
                    self.begin_text_edit(&id);
                    ui.close();
                }
                ui.separator();
            }
            if ui.button("Duplicate").clicked() {
                self.duplicate_selected();
                ui.close();
            }
            if ui.button("Delete").clicked() {
                self.delete_selected();
                ui.close();
            }
            ui.separator();
            if ui.button("Bring to front").clicked() {
                self.bring_selected_to_front();
                ui.close();
            }
            if ui.button("Send to back").clicked() {
                self.send_selected_to_back();
                ui.close();
            }
        });

        if let (Some(world), false) = (pointer_world, over_handle) {
            if self.tool.creates() {
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
            } else if self.tool == Tool::Pan {
                ctx.set_cursor_icon(egui::CursorIcon::Grab);
            } else if self.topmost_hit(world, threshold_world).is_some() {
                ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        }
    }

    /// Floating editor over the element being edited, bound to the draft.
    fn inline_editor(&mut self, ui: &egui::Ui, ctx: &egui::Context, origin: egui::Pos2) {
        let Some(element) = self
            .form
            .editing_target()
            .and_then(|id| self.form.element(id))
            .cloned()
        else {
            return;
        };
        let screen = self.view.rect_to_screen(origin, element.rect);
        let font = egui::FontId::proportional((element.text_size * self.view.zoom).max(6.0));
        let hint = model::placeholder(&element, true).unwrap_or_default();
        let multiline = element.kind.is_multiline();

        let area = egui::Area::new(ui.id().with("inline_text_edit"))
            .fixed_pos(screen.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let frame = egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 240))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255)))
                    .inner_margin(2.0);
                frame.show(ui, |ui| {
                    ui.set_min_size((screen.size() - egui::vec2(4.0, 4.0)).max(egui::Vec2::ZERO));
                    let Some(draft) = self.form.draft_mut() else {
                        return;
                    };
                    let editor = if multiline {
                        egui::TextEdit::multiline(draft)
                    } else {
                        egui::TextEdit::singleline(draft)
                    };
                    let response = ui.add(
                        editor
                            .font(font)
                            .hint_text(hint)
                            .text_color(egui::Color32::from_gray(20))
                            .desired_width((screen.width() - 4.0).max(20.0))
                            .frame(false),
                    );
                    response.request_focus();
                });
            });
        self.edit_surface = Some(screen.union(area.response.rect));
    }

    /// Commits the live edit when the primary button goes down anywhere in
    /// the window outside the inline editor, panels and menus included.
    fn commit_on_outside_press(&mut self, press: Option<egui::Pos2>) {
        if !self.form.is_editing() {
            self.edit_surface = None;
            return;
        }
        if let (Some(press), Some(surface)) = (press, self.edit_surface) {
            self.form.handle_edit_event(screen_press(press, surface));
        }
    }
}

/// A primary press in screen space against the editor's on-screen rect.
fn screen_press(press: egui::Pos2, surface: egui::Rect) -> EditEvent {
    EditEvent::PointerDown {
        pos: Point::from_pos2(press),
        surface: RectF::from_min_max(surface.min, surface.max),
    }
}

fn student_kind_combo(ui: &mut egui::Ui, salt: &str, value: &mut model::StudentFieldKind) {
    egui::ComboBox::from_id_salt(salt)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for kind in model::StudentFieldKind::ALL {
                ui.selectable_value(value, kind, kind.label());
            }
        });
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
            RectF::from_min_size(Point::new(100.0, 100.0), 200.0, 24.0),
        );
        app.begin_text_edit(&id);
        app.form.update_draft(text);
        app.edit_surface = Some(egui::Rect::from_min_size(
            egui::pos2(300.0, 200.0),
            egui::vec2(200.0, 24.0),
        ));
        (app, id)
    }

    fn content(app: &FormEditorApp, id: &ElementId) -> Option<String> {
        app.form.element(id).and_then(|e| e.content.clone())
    }

    #[test]
    fn press_on_a_side_panel_commits_the_draft() {
        let (mut app, id) = editing("Ad Soyad");
        app.commit_on_outside_press(Some(egui::pos2(20.0, 300.0)));
        assert!(!app.form.is_editing());
        assert_eq!(content(&app, &id).as_deref(), Some("Ad Soyad"));
    }

    #[test]
    fn press_on_the_menu_bar_commits_the_draft() {
        let (mut app, id) = editing("menu");
        app.commit_on_outside_press(Some(egui::pos2(40.0, 8.0)));
        assert_eq!(content(&app, &id).as_deref(), Some("menu"));
    }

    #[test]
    fn press_inside_the_editor_keeps_editing() {
        let (mut app, id) = editing("still typing");
        app.commit_on_outside_press(Some(egui::pos2(320.0, 210.0)));
        assert!(app.form.is_editing());
        assert_eq!(content(&app, &id), None);
        assert_eq!(app.form.draft(), Some("still typing"));
    }

    #[test]
    fn no_press_leaves_the_session_alone() {
        let (mut app, _) = editing("x");
        app.commit_on_outside_press(None);
        assert!(app.form.is_editing());

        app.form.cancel_edit();
        app.commit_on_outside_press(Some(egui::pos2(0.0, 0.0)));
        assert_eq!(app.edit_surface, None);
    }
}

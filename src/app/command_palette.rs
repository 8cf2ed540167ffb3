use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::doc_ops::{AlignMode, Axis, align_selected, distribute_selected, stack_selected};
use super::{FormEditorApp, Tool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    ToolSelect,
    ToolBubbleGrid,
    ToolTextField,
    ToolStudentField,
    ToolTextArea,
    ToolImage,
    Undo,
    Redo,
    SelectAll,
    Duplicate,
    Delete,
    EditText,
    BringFront,
    SendBack,
    AlignLeft,
    AlignHCenter,
    AlignRight,
    AlignTop,
    AlignVCenter,
    AlignBottom,
    DistributeH,
    DistributeV,
    StackH,
    StackV,
    ToggleCornerMarks,
    TidyOverrides,
    NewForm,
    SaveJson,
    OpenJson,
    ExportSvg,
    ToggleSnap,
    SnapSelectionToGrid,
    SaveSettings,
    ReloadSettings,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { id: CommandId::ToolSelect, name: "Tool: Select", search: "select tool v" },
    CommandSpec { id: CommandId::ToolBubbleGrid, name: "Tool: Bubble grid", search: "bubble grid answers optical tool b" },
    CommandSpec { id: CommandId::ToolTextField, name: "Tool: Text field", search: "text field line tool t" },
    CommandSpec { id: CommandId::ToolStudentField, name: "Tool: Student field", search: "student name number class field tool s" },
    CommandSpec { id: CommandId::ToolTextArea, name: "Tool: Text area", search: "text area paragraph multiline tool shift t" },
    CommandSpec { id: CommandId::ToolImage, name: "Tool: Image", search: "image picture logo tool i" },
    CommandSpec { id: CommandId::Undo, name: "Edit: Undo", search: "undo" },
    CommandSpec { id: CommandId::Redo, name: "Edit: Redo", search: "redo" },
    CommandSpec { id: CommandId::SelectAll, name: "Edit: Select all", search: "select all" },
    CommandSpec { id: CommandId::Duplicate, name: "Edit: Duplicate", search: "duplicate clone copy" },
    CommandSpec { id: CommandId::Delete, name: "Edit: Delete", search: "delete remove" },
    CommandSpec { id: CommandId::EditText, name: "Edit: Edit text", search: "edit text inline content" },
    CommandSpec { id: CommandId::BringFront, name: "Arrange: Bring to front", search: "front bring layer" },
    CommandSpec { id: CommandId::SendBack, name: "Arrange: Send to back", search: "back send layer" },
    CommandSpec { id: CommandId::AlignLeft, name: "Align: Left", search: "align left" },
    CommandSpec { id: CommandId::AlignHCenter, name: "Align: Center (Horizontal)", search: "align center horizontal" },
    CommandSpec { id: CommandId::AlignRight, name: "Align: Right", search: "align right" },
    CommandSpec { id: CommandId::AlignTop, name: "Align: Top", search: "align top" },
    CommandSpec { id: CommandId::AlignVCenter, name: "Align: Middle (Vertical)", search: "align middle vertical" },
    CommandSpec { id: CommandId::AlignBottom, name: "Align: Bottom", search: "align bottom" },
    CommandSpec { id: CommandId::DistributeH, name: "Distribute: Horizontal", search: "distribute horizontal" },
    CommandSpec { id: CommandId::DistributeV, name: "Distribute: Vertical", search: "distribute vertical" },
    CommandSpec { id: CommandId::StackH, name: "Stack: Horizontal", search: "stack abut pack horizontal" },
    CommandSpec { id: CommandId::StackV, name: "Stack: Vertical", search: "stack abut pack vertical" },
    CommandSpec { id: CommandId::ToggleCornerMarks, name: "Form: Toggle corner marks", search: "corner marks calibration safe zone toggle" },
    CommandSpec { id: CommandId::TidyOverrides, name: "Form: Tidy bubble overrides", search: "tidy clean bubble overrides" },
    CommandSpec { id: CommandId::NewForm, name: "File: New form", search: "new form blank" },
    CommandSpec { id: CommandId::SaveJson, name: "File: Save", search: "save file json" },
    CommandSpec { id: CommandId::OpenJson, name: "File: Open", search: "open load file json" },
    CommandSpec { id: CommandId::ExportSvg, name: "File: Export SVG", search: "export svg print" },
    CommandSpec { id: CommandId::ToggleSnap, name: "Grid: Toggle snap", search: "grid snap toggle" },
    CommandSpec { id: CommandId::SnapSelectionToGrid, name: "Grid: Snap selection", search: "grid snap selection" },
    CommandSpec { id: CommandId::SaveSettings, name: "Settings: Save", search: "settings save preferences" },
    CommandSpec { id: CommandId::ReloadSettings, name: "Settings: Reload", search: "settings reload preferences" },
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub selected_len: usize,
    pub has_undo: bool,
    pub has_redo: bool,
    pub snap_to_grid: bool,
    pub text_selected: bool,
}

impl CommandPalette {
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::Undo => cx.has_undo,
            CommandId::Redo => cx.has_redo,
            CommandId::Duplicate
            | CommandId::Delete
            | CommandId::BringFront
            | CommandId::SendBack => cx.selected_len > 0,
            CommandId::EditText => cx.text_selected,
            CommandId::AlignLeft
            | CommandId::AlignHCenter
            | CommandId::AlignRight
            | CommandId::AlignTop
            | CommandId::AlignVCenter
            | CommandId::AlignBottom
            | CommandId::StackH
            | CommandId::StackV => cx.selected_len >= 2,
            CommandId::DistributeH | CommandId::DistributeV => cx.selected_len >= 3,
            CommandId::SnapSelectionToGrid => cx.selected_len > 0 && cx.snap_to_grid,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut FormEditorApp, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::ToolSelect => app.tool = Tool::Select,
            CommandId::ToolBubbleGrid => app.tool = Tool::BubbleGrid,
            CommandId::ToolTextField => app.tool = Tool::TextField,
            CommandId::ToolStudentField => app.tool = Tool::StudentField,
            CommandId::ToolTextArea => app.tool = Tool::TextArea,
            CommandId::ToolImage => app.tool = Tool::Image,
            CommandId::Undo => app.undo(),
            CommandId::Redo => app.redo(),
            CommandId::SelectAll => app.select_all(),
            CommandId::Duplicate => app.duplicate_selected(),
            CommandId::Delete => app.delete_selected(),
            CommandId::EditText => {
                if let Some(id) = app.single_selected() {
                    app.begin_text_edit(&id);
                }
            }
            CommandId::BringFront => app.bring_selected_to_front(),
            CommandId::SendBack => app.send_selected_to_back(),
            CommandId::AlignLeft => app.align(AlignMode::Left),
            CommandId::AlignHCenter => app.align(AlignMode::HCenter),
            CommandId::AlignRight => app.align(AlignMode::Right),
            CommandId::AlignTop => app.align(AlignMode::Top),
            CommandId::AlignVCenter => app.align(AlignMode::VCenter),
            CommandId::AlignBottom => app.align(AlignMode::Bottom),
            CommandId::DistributeH => {
                app.push_undo();
                distribute_selected(&mut app.form, &app.selected, Axis::Horizontal);
            }
            CommandId::DistributeV => {
                app.push_undo();
                distribute_selected(&mut app.form, &app.selected, Axis::Vertical);
            }
            CommandId::StackH => {
                app.push_undo();
                stack_selected(&mut app.form, &app.selected, Axis::Horizontal, 0.0);
            }
            CommandId::StackV => {
                app.push_undo();
                stack_selected(&mut app.form, &app.selected, Axis::Vertical, 0.0);
            }
            CommandId::ToggleCornerMarks => app.toggle_corner_marks(),
            CommandId::TidyOverrides => app.tidy_bubble_overrides(),
            CommandId::NewForm => app.new_form(),
            CommandId::SaveJson => app.save_to_path(),
            CommandId::OpenJson => app.open_json_dialog(),
            CommandId::ExportSvg => app.save_svg_to_path(),
            CommandId::ToggleSnap => {
                app.snap_to_grid = !app.snap_to_grid;
                app.persist_settings();
            }
            CommandId::SnapSelectionToGrid => {
                app.push_undo();
                app.snap_selected_to_grid();
            }
            CommandId::SaveSettings => app.persist_settings(),
            CommandId::ReloadSettings => app.reload_settings(),
        }
        ctx.request_repaint();
    }

    fn filtered(&self) -> Vec<(&'static CommandSpec, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().map(|c| (c, 0)).collect();
        }
        let mut out: Vec<_> = COMMANDS
            .iter()
            .filter_map(|c| matcher.fuzzy_match(c.search, q).map(|score| (c, score)))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        out
    }

    /// Moves the highlight to the next enabled match, wrapping at either end.
    fn step(&mut self, matches: &[(&'static CommandSpec, i64)], cx: CommandContext, down: bool) {
        let len = matches.len();
        for offset in 1..=len {
            let idx = if down {
                (self.selected + offset) % len
            } else {
                (self.selected + len - offset % len) % len
            };
            if Self::is_enabled(cx, matches[idx].0.id) {
                self.selected = idx;
                return;
            }
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        self.selected = self.selected.min(matches.len().saturating_sub(1));

        let (escape, down, up, enter) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::Enter),
            )
        });
        if escape {
            self.close();
            return None;
        }
        if down || up {
            self.step(&matches, cx, down);
        }
        let mut chosen = enter.then_some(self.selected);
        let just_opened = self.request_focus;

        let screen = ctx.content_rect();
        let width = 480.0;
        let area = egui::Area::new(egui::Id::new("form_command_palette"))
            .fixed_pos(egui::pos2(screen.center().x - width * 0.5, screen.top() + 64.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(width);
                    let query = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Type a command, e.g. corner marks"),
                    );
                    if std::mem::take(&mut self.request_focus) {
                        query.request_focus();
                    }
                    ui.weak(format!("{} matching", matches.len()));
                    egui::ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
                        for (idx, (spec, _)) in matches.iter().enumerate() {
                            let (group, label) = spec.name.split_once(": ").unwrap_or(("", spec.name));
                            let row = ui.add_enabled_ui(Self::is_enabled(cx, spec.id), |ui| {
                                ui.horizontal(|ui| {
                                    let resp = ui.selectable_label(idx == self.selected, label);
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| ui.weak(group),
                                    );
                                    resp
                                })
                                .inner
                            });
                            if row.inner.clicked() {
                                chosen = Some(idx);
                            }
                            if idx == self.selected && (down || up) {
                                row.inner.scroll_to_me(None);
                            }
                        }
                    });
                });
            });
        if !just_opened && area.response.clicked_elsewhere() {
            self.close();
            return None;
        }

        let spec = matches.get(chosen?)?.0;
        if !Self::is_enabled(cx, spec.id) {
            return None;
        }
        self.close();
        Some(spec.id)
    }
}

impl FormEditorApp {
    fn align(&mut self, mode: AlignMode) {
        self.push_undo();
        align_selected(&mut self.form, &self.selected, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx(selected_len: usize) -> CommandContext {
        CommandContext {
            selected_len,
            has_undo: false,
            has_redo: false,
            snap_to_grid: false,
            text_selected: false,
        }
    }

    #[test]
    fn fuzzy_query_ranks_corner_marks() {
        let palette = CommandPalette {
            query: "corner".to_string(),
            ..Default::default()
        };
        let matches = palette.filtered();
        assert_eq!(matches.first().map(|(c, _)| c.id), Some(CommandId::ToggleCornerMarks));
    }

    fn spec(id: CommandId) -> (&'static CommandSpec, i64) {
        let found = COMMANDS.iter().find(|c| c.id == id);
        (found.unwrap(), 0)
    }

    #[test]
    fn arrow_keys_skip_disabled_commands_and_wrap() {
        let matches = [
            spec(CommandId::AlignLeft),
            spec(CommandId::Undo),
            spec(CommandId::NewForm),
        ];
        let mut palette = CommandPalette::default();

        palette.step(&matches, cx(0), true);
        assert_eq!(palette.selected, 2);
        palette.step(&matches, cx(0), true);
        assert_eq!(palette.selected, 2);

        palette.step(&matches, cx(2), true);
        assert_eq!(palette.selected, 0);
        palette.step(&matches, cx(2), false);
        assert_eq!(palette.selected, 2);
    }

    #[test]
    fn selection_commands_need_a_selection() {
        assert!(!CommandPalette::is_enabled(cx(0), CommandId::Delete));
        assert!(CommandPalette::is_enabled(cx(1), CommandId::Delete));
        assert!(!CommandPalette::is_enabled(cx(2), CommandId::DistributeH));
        assert!(CommandPalette::is_enabled(cx(3), CommandId::DistributeH));
        assert!(CommandPalette::is_enabled(cx(0), CommandId::TidyOverrides));
    }
}

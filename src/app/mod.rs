use crate::form::{FormDocument, FormEditor};
use crate::model::{self, ElementId, ElementKind};
use crate::text_edit::{EditObserver, PendingCommit};
use eframe::egui;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

mod actions;
mod command_palette;
mod doc_ops;
mod geometry;
mod help;
mod interaction;
mod render;
pub mod settings;
pub mod svg;
mod update;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tool {
    Select,
    BubbleGrid,
    TextField,
    StudentField,
    TextArea,
    Image,
    Pan,
}

impl Tool {
    fn creates(self) -> bool {
        !matches!(self, Tool::Select | Tool::Pan)
    }
}

#[derive(Clone, Debug)]
enum InProgress {
    Place {
        start: egui::Pos2,
        current: egui::Pos2,
    },
    SelectBox {
        start: egui::Pos2,
        current: egui::Pos2,
    },
}

#[derive(Clone, Debug)]
enum ActiveTransform {
    Move {
        last_pointer_world: egui::Pos2,
    },
    Resize {
        element_id: ElementId,
        handle: geometry::ResizeHandle,
        start_rect: model::RectF,
        start_pointer_world: egui::Pos2,
    },
}

#[derive(Clone, Copy, Debug)]
struct View {
    pan_screen: egui::Vec2,
    zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan_screen: egui::vec2(40.0, 40.0),
            zoom: 1.0,
        }
    }
}

impl View {
    fn world_to_screen(&self, origin: egui::Pos2, world: egui::Pos2) -> egui::Pos2 {
        origin + self.pan_screen + world.to_vec2() * self.zoom
    }

    fn screen_to_world(&self, origin: egui::Pos2, screen: egui::Pos2) -> egui::Pos2 {
        ((screen - origin - self.pan_screen) / self.zoom).to_pos2()
    }

    fn rect_to_screen(&self, origin: egui::Pos2, rect: model::RectF) -> egui::Rect {
        egui::Rect::from_min_max(
            self.world_to_screen(origin, rect.min.to_pos2()),
            self.world_to_screen(origin, rect.max.to_pos2()),
        )
    }

    fn zoom_about_screen_point(
        &mut self,
        origin: egui::Pos2,
        screen_point: egui::Pos2,
        zoom_delta: f32,
    ) {
        let before = self.screen_to_world(origin, screen_point);
        self.zoom = (self.zoom * zoom_delta).clamp(0.1, 8.0);
        let after_screen = self.world_to_screen(origin, before);
        self.pan_screen += screen_point - after_screen;
    }
}

/// Settings for elements created by the placement tools.
#[derive(Clone, Debug)]
struct NewElementDefaults {
    questions: u32,
    options: u32,
    labels: model::BubbleLabels,
    student_subtype: model::StudentFieldKind,
    image_source: String,
}

impl Default for NewElementDefaults {
    fn default() -> Self {
        Self {
            questions: 10,
            options: 5,
            labels: model::BubbleLabels::Letters,
            student_subtype: model::StudentFieldKind::NameSurname,
            image_source: String::new(),
        }
    }
}

impl NewElementDefaults {
    fn kind_for(&self, tool: Tool) -> Option<ElementKind> {
        match tool {
            Tool::BubbleGrid => Some(ElementKind::BubbleGrid {
                questions: self.questions.max(1),
                options: self.options.max(1),
                labels: self.labels,
                first_question: 1,
            }),
            Tool::TextField => Some(ElementKind::TextField),
            Tool::StudentField => Some(ElementKind::StudentField {
                subtype: self.student_subtype,
            }),
            Tool::TextArea => Some(ElementKind::TextArea),
            Tool::Image => Some(ElementKind::Image {
                source: self.image_source.clone(),
            }),
            Tool::Select | Tool::Pan => None,
        }
    }
}

#[derive(Clone)]
struct Snapshot {
    doc: FormDocument,
    selected: Vec<ElementId>,
}

/// Feeds edit-session outcomes into the status bar.
struct StatusObserver {
    notice: Rc<RefCell<Option<String>>>,
}

impl EditObserver for StatusObserver {
    fn on_commit(&mut self, commit: &PendingCommit) {
        *self.notice.borrow_mut() = Some(format!("Updated {}", commit.target));
    }

    fn on_cancel(&mut self, target: &ElementId) {
        *self.notice.borrow_mut() = Some(format!("Edit of {target} cancelled"));
    }
}

pub struct FormEditorApp {
    form: FormEditor,
    selected: HashSet<ElementId>,
    tool: Tool,
    tool_before_pan: Option<Tool>,
    view: View,
    in_progress: Option<InProgress>,
    active_transform: Option<ActiveTransform>,
    drag_transform_recorded: bool,
    history: Vec<Snapshot>,
    future: Vec<Snapshot>,
    new_element: NewElementDefaults,
    form_name: String,
    file_path: String,
    svg_path: String,
    settings_path: String,
    status: Option<String>,
    edit_notice: Rc<RefCell<Option<String>>>,
    snap_to_grid: bool,
    grid_size: f32,
    move_step: f32,
    move_step_fast: f32,
    default_corner_marks: crate::corner_marks::CornerMarkConfig,
    default_page: model::PageSetup,
    textures: HashMap<String, Option<egui::TextureHandle>>,
    /// Screen rect of the inline editor as drawn last frame.
    edit_surface: Option<egui::Rect>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
}

impl FormEditorApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("optiform.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_or_default(&settings_path);
        Self::with_settings(settings, settings_path)
    }

    fn with_settings(settings: settings::AppSettings, settings_path: String) -> Self {
        let mut form = FormEditor::default();
        form.set_page(settings.page);
        form.set_corner_marks(settings.corner_marks);
        let edit_notice = Rc::new(RefCell::new(None));
        form.set_observer(Some(Box::new(StatusObserver {
            notice: edit_notice.clone(),
        })));

        Self {
            form,
            selected: HashSet::new(),
            tool: Tool::Select,
            tool_before_pan: None,
            view: View::default(),
            in_progress: None,
            active_transform: None,
            drag_transform_recorded: false,
            history: Vec::new(),
            future: Vec::new(),
            new_element: NewElementDefaults::default(),
            form_name: "answer-sheet".to_string(),
            file_path: settings.file_path,
            svg_path: settings.svg_path,
            settings_path,
            status: None,
            edit_notice,
            snap_to_grid: settings.snap_to_grid,
            grid_size: settings.grid_size,
            move_step: settings.move_step,
            move_step_fast: settings.move_step_fast,
            default_corner_marks: settings.corner_marks,
            default_page: settings.page,
            textures: HashMap::new(),
            edit_surface: None,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
        }
    }
}

impl Drop for FormEditorApp {
    fn drop(&mut self) {
        self.form.teardown();
    }
}

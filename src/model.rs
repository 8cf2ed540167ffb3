use eframe::egui;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RectF {
    pub min: Point,
    pub max: Point,
}

impl RectF {
    pub fn from_min_size(min: Point, width: f32, height: f32) -> Self {
        Self {
            min,
            max: Point::new(min.x + width, min.y + height),
        }
    }

    pub fn from_min_max(a: egui::Pos2, b: egui::Pos2) -> Self {
        let min = egui::pos2(a.x.min(b.x), a.y.min(b.y));
        let max = egui::pos2(a.x.max(b.x), a.y.max(b.y));
        Self {
            min: Point::from_pos2(min),
            max: Point::from_pos2(max),
        }
    }

    pub fn to_rect(self) -> egui::Rect {
        egui::Rect::from_min_max(self.min.to_pos2(), self.max.to_pos2())
    }

    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn is_valid(self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            min: Point::new(self.min.x + dx, self.min.y + dy),
            max: Point::new(self.max.x + dx, self.max.y + dy),
        }
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Page dimensions in points. Defaults to A4.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
        }
    }
}

impl PageSetup {
    pub fn rect(self) -> RectF {
        RectF::from_min_size(Point::default(), self.width, self.height)
    }
}

/// Opaque element identifier, unique within a page.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StudentFieldKind {
    #[default]
    NameSurname,
    SchoolNumber,
    ClassInfo,
    Generic,
}

impl StudentFieldKind {
    pub const ALL: [StudentFieldKind; 4] = [
        StudentFieldKind::NameSurname,
        StudentFieldKind::SchoolNumber,
        StudentFieldKind::ClassInfo,
        StudentFieldKind::Generic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StudentFieldKind::NameSurname => "Name Surname",
            StudentFieldKind::SchoolNumber => "School Number",
            StudentFieldKind::ClassInfo => "Class",
            StudentFieldKind::Generic => "Student Info",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BubbleLabels {
    #[default]
    Letters,
    Digits,
}

impl BubbleLabels {
    /// Default printed content of the bubble at `option`.
    pub fn default_label(self, option: u32) -> String {
        match self {
            BubbleLabels::Letters => {
                let mut n = option;
                let mut out = Vec::new();
                loop {
                    out.push((b'A' + (n % 26) as u8) as char);
                    if n < 26 {
                        break;
                    }
                    n = n / 26 - 1;
                }
                out.iter().rev().collect()
            }
            BubbleLabels::Digits => option.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ElementKind {
    BubbleGrid {
        questions: u32,
        options: u32,
        #[serde(default)]
        labels: BubbleLabels,
        #[serde(default = "default_first_question")]
        first_question: u32,
    },
    TextField,
    StudentField {
        #[serde(default)]
        subtype: StudentFieldKind,
    },
    TextArea,
    Image {
        source: String,
    },
}

fn default_first_question() -> u32 {
    1
}

fn default_text_size() -> f32 {
    12.0
}

impl ElementKind {
    pub fn supports_text(&self) -> bool {
        matches!(
            self,
            ElementKind::TextField | ElementKind::StudentField { .. } | ElementKind::TextArea
        )
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, ElementKind::TextArea)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::BubbleGrid { .. } => "Bubble Grid",
            ElementKind::TextField => "Text Field",
            ElementKind::StudentField { .. } => "Student Field",
            ElementKind::TextArea => "Text Area",
            ElementKind::Image { .. } => "Image",
        }
    }

    /// Bubble keys of a grid in option order; empty for other kinds.
    pub fn bubble_keys(&self) -> Vec<String> {
        match self {
            ElementKind::BubbleGrid {
                options, labels, ..
            } => (0..*options).map(|i| labels.default_label(i)).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub rect: RectF,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default = "default_text_size")]
    pub text_size: f32,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind, rect: RectF) -> Self {
        Self {
            id,
            kind,
            rect,
            content: None,
            text_size: default_text_size(),
        }
    }

    pub fn bounds(&self) -> egui::Rect {
        self.rect.to_rect()
    }

    pub fn apply(&mut self, update: ElementUpdate) {
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(rect) = update.rect {
            self.rect = rect;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(text_size) = update.text_size {
            self.text_size = text_size;
        }
    }
}

/// Fields to merge into an existing element. `None` leaves a field as is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementUpdate {
    pub content: Option<Option<String>>,
    pub rect: Option<RectF>,
    pub kind: Option<ElementKind>,
    pub text_size: Option<f32>,
}

impl ElementUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(Some(content.into())),
            ..Self::default()
        }
    }

    pub fn clear_content() -> Self {
        Self {
            content: Some(None),
            ..Self::default()
        }
    }

    pub fn rect(rect: RectF) -> Self {
        Self {
            rect: Some(rect),
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayText<'a> {
    Placeholder(&'static str),
    Blank,
    Text(&'a str),
}

pub fn placeholder(element: &Element, editable: bool) -> Option<&'static str> {
    match &element.kind {
        ElementKind::StudentField { subtype } => Some(subtype.label()),
        ElementKind::TextField | ElementKind::TextArea => Some(if editable {
            "Double-click to edit"
        } else {
            "Click to add text"
        }),
        ElementKind::BubbleGrid { .. } | ElementKind::Image { .. } => None,
    }
}

/// What a renderer should show for a text-bearing element.
pub fn display_text(element: &Element, editable: bool) -> Option<DisplayText<'_>> {
    if !element.kind.supports_text() {
        return None;
    }
    match element.content.as_deref() {
        None => placeholder(element, editable).map(DisplayText::Placeholder),
        Some("") => Some(DisplayText::Blank),
        Some(text) => Some(DisplayText::Text(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_field(content: Option<&str>) -> Element {
        let mut e = Element::new(
            ElementId::from("e1"),
            ElementKind::TextField,
            RectF::from_min_size(Point::new(10.0, 10.0), 100.0, 20.0),
        );
        e.content = content.map(str::to_string);
        e
    }

    #[test]
    fn letter_labels_roll_over_past_z() {
        assert_eq!(BubbleLabels::Letters.default_label(0), "A");
        assert_eq!(BubbleLabels::Letters.default_label(4), "E");
        assert_eq!(BubbleLabels::Letters.default_label(25), "Z");
        assert_eq!(BubbleLabels::Letters.default_label(26), "AA");
        assert_eq!(BubbleLabels::Digits.default_label(7), "7");
    }

    #[test]
    fn bubble_keys_follow_label_style() {
        let grid = ElementKind::BubbleGrid {
            questions: 10,
            options: 4,
            labels: BubbleLabels::Letters,
            first_question: 1,
        };
        assert_eq!(grid.bubble_keys(), vec!["A", "B", "C", "D"]);
        assert!(ElementKind::TextArea.bubble_keys().is_empty());
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut e = text_field(Some("old"));
        let rect = e.rect;
        e.apply(ElementUpdate::content("new"));
        assert_eq!(e.content.as_deref(), Some("new"));
        assert_eq!(e.rect, rect);

        e.apply(ElementUpdate::clear_content());
        assert_eq!(e.content, None);
        assert_eq!(e.id, ElementId::from("e1"));
    }

    #[test]
    fn unset_content_shows_placeholder_but_empty_is_blank() {
        let unset = text_field(None);
        assert_eq!(
            display_text(&unset, true),
            Some(DisplayText::Placeholder("Double-click to edit"))
        );
        assert_eq!(
            display_text(&unset, false),
            Some(DisplayText::Placeholder("Click to add text"))
        );

        let blank = text_field(Some(""));
        assert_eq!(display_text(&blank, true), Some(DisplayText::Blank));

        let filled = text_field(Some("Ad Soyad"));
        assert_eq!(display_text(&filled, true), Some(DisplayText::Text("Ad Soyad")));
    }

    #[test]
    fn student_field_placeholder_depends_on_subtype() {
        for subtype in StudentFieldKind::ALL {
            let e = Element::new(
                ElementId::from("s"),
                ElementKind::StudentField { subtype },
                RectF::default(),
            );
            assert_eq!(placeholder(&e, true), Some(subtype.label()));
            assert_eq!(placeholder(&e, false), Some(subtype.label()));
        }
    }

    #[test]
    fn non_text_kinds_have_no_display_text() {
        let image = Element::new(
            ElementId::from("img"),
            ElementKind::Image {
                source: "logo.png".to_string(),
            },
            RectF::default(),
        );
        assert_eq!(display_text(&image, true), None);
        assert!(!image.kind.supports_text());
    }

    #[test]
    fn element_ids_serialize_as_plain_strings() {
        let e = text_field(None);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["id"], "e1");
        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }
}

use optiform::bubbles::BubbleContent;
use optiform::corner_marks::CornerMarkConfig;
use optiform::model::{BubbleLabels, ElementId, ElementKind, ElementUpdate, PageSetup, Point, RectF};
use optiform::text_edit::EditEvent;
use optiform::{FormDocument, FormEditor, FormError};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn rect(x: f32, y: f32, w: f32, h: f32) -> RectF {
    RectF::from_min_size(Point::new(x, y), w, h)
}

fn grid(options: u32) -> ElementKind {
    ElementKind::BubbleGrid {
        questions: 5,
        options,
        labels: BubbleLabels::Letters,
        first_question: 1,
    }
}

fn content_of(form: &FormEditor, id: &ElementId) -> Option<String> {
    form.element(id).and_then(|e| e.content.clone())
}

#[test]
fn typing_into_an_unset_field_commits_the_draft() {
    let mut form = FormEditor::default();
    let id = form.add_element(ElementKind::TextField, rect(40.0, 40.0, 200.0, 24.0));
    assert_eq!(id.as_str(), "e1");
    assert_eq!(content_of(&form, &id), None);

    form.start_editing(&id);
    assert_eq!(form.draft(), Some(""));
    form.update_draft("Ad Soyad");
    assert_eq!(form.draft(), Some("Ad Soyad"));

    assert!(form.commit_edit());
    assert_eq!(content_of(&form, &id).as_deref(), Some("Ad Soyad"));
    assert!(!form.is_editing());
}

#[test]
fn blank_bubble_override_survives_reconciliation() {
    let json = r#"{
        "elements": [
            {
                "id": "e1",
                "kind": { "BubbleGrid": { "questions": 3, "options": 4 } },
                "rect": { "min": { "x": 50.0, "y": 80.0 }, "max": { "x": 250.0, "y": 160.0 } }
            }
        ],
        "bubble_values": { "e1": { "A": "" } }
    }"#;
    let doc = FormDocument::from_json(json).expect("valid form");
    let mut form = FormEditor::new(doc).expect("unique ids");
    let id = ElementId::from("e1");

    let resolved = form.resolved_bubbles();
    assert_eq!(resolved.content(&id, "A"), Some(&BubbleContent::Blank));
    assert_eq!(
        resolved.content(&id, "B"),
        Some(&BubbleContent::Default("B".to_string()))
    );

    assert_eq!(form.tidy_bubble_overrides(), 0);
    assert_eq!(form.document().bubble_values.get(&id, "A"), Some(""));
}

#[test]
fn corner_marks_sit_at_margin_and_safe_zone_adds_padding() {
    let page = PageSetup::default();
    let config = CornerMarkConfig {
        safe_zone_margin: 17.0,
        safe_zone_padding: 10.0,
        is_visible: true,
    };
    let overlay = config.layout(page).expect("visible marks");

    let anchors: Vec<Point> = overlay.marks.iter().map(|m| m.anchor).collect();
    assert_eq!(
        anchors,
        vec![
            Point::new(17.0, 17.0),
            Point::new(page.width - 17.0, 17.0),
            Point::new(17.0, page.height - 17.0),
            Point::new(page.width - 17.0, page.height - 17.0),
        ]
    );
    assert_eq!(overlay.safe_zone.min, Point::new(27.0, 27.0));
    assert_eq!(
        overlay.safe_zone.max,
        Point::new(page.width - 27.0, page.height - 27.0)
    );
}

#[test]
fn hiding_corner_marks_lays_out_nothing() {
    let mut form = FormEditor::default();
    let mut config = form.corner_marks();
    config.is_visible = false;
    form.set_corner_marks(config);
    assert_eq!(form.overlay(), None);
}

#[test]
fn ids_stay_unique_across_add_duplicate_and_remove() {
    let mut form = FormEditor::default();
    let a = form.add_element(ElementKind::TextField, rect(0.0, 0.0, 10.0, 10.0));
    let b = form.add_element(grid(4), rect(0.0, 20.0, 100.0, 60.0));
    let c = form.duplicate_element(&b, 12.0, 12.0).expect("b exists");
    form.remove_element(&a);
    let d = form.add_element(ElementKind::TextArea, rect(0.0, 90.0, 100.0, 60.0));

    let ids: HashSet<_> = form.elements().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), form.elements().len());
    assert_ne!(d, a);
    assert_eq!(
        form.element(&c).map(|e| e.rect.min),
        Some(Point::new(12.0, 32.0))
    );

    let dup = form.document().elements[0].clone();
    assert!(matches!(
        form.insert_element(dup),
        Err(FormError::DuplicateElementId(_))
    ));
}

#[test]
fn empty_content_is_kept_apart_from_unset() {
    let mut form = FormEditor::default();
    let id = form.add_element(ElementKind::TextField, rect(0.0, 0.0, 100.0, 20.0));

    form.start_editing(&id);
    assert!(form.commit_edit());
    assert_eq!(content_of(&form, &id).as_deref(), Some(""));

    form.update_element(&id, ElementUpdate::clear_content());
    assert_eq!(content_of(&form, &id), None);
}

#[test]
fn second_commit_is_a_no_op() {
    let mut form = FormEditor::default();
    let id = form.add_element(ElementKind::TextField, rect(0.0, 0.0, 100.0, 20.0));
    form.start_editing(&id);
    form.update_draft("first");
    assert!(form.commit_edit());
    let after_first = form.document().clone();

    assert!(!form.commit_edit());
    assert_eq!(form.document(), &after_first);
}

#[test]
fn cancel_leaves_the_document_untouched() {
    let mut form = FormEditor::default();
    let id = form.add_element(ElementKind::TextArea, rect(0.0, 0.0, 100.0, 80.0));
    form.update_element(&id, ElementUpdate::content("kept"));
    let before = form.document().clone();

    form.start_editing(&id);
    form.update_draft("discarded");
    assert!(!form.handle_edit_event(EditEvent::CancelKey));

    assert_eq!(form.document(), &before);
    assert!(!form.is_editing());
}

#[test]
fn pointer_down_commits_only_outside_the_surface() {
    let mut form = FormEditor::default();
    let surface = rect(10.0, 10.0, 100.0, 20.0);
    let id = form.add_element(ElementKind::TextField, surface);
    form.start_editing(&id);
    form.update_draft("inside");

    let inside = EditEvent::PointerDown {
        pos: Point::new(20.0, 15.0),
        surface,
    };
    assert!(!form.handle_edit_event(inside));
    assert!(form.is_editing());

    let outside = EditEvent::PointerDown {
        pos: Point::new(300.0, 300.0),
        surface,
    };
    assert!(form.handle_edit_event(outside));
    assert_eq!(content_of(&form, &id).as_deref(), Some("inside"));
}

#[test]
fn switching_targets_commits_the_previous_draft() {
    let mut form = FormEditor::default();
    let first = form.add_element(ElementKind::TextField, rect(0.0, 0.0, 100.0, 20.0));
    let second = form.add_element(ElementKind::TextField, rect(0.0, 40.0, 100.0, 20.0));

    form.start_editing(&first);
    form.update_draft("one");
    form.start_editing(&second);

    assert_eq!(content_of(&form, &first).as_deref(), Some("one"));
    assert_eq!(form.editing_target(), Some(&second));
}

#[test]
fn teardown_drops_the_draft() {
    let mut form = FormEditor::default();
    let id = form.add_element(ElementKind::TextField, rect(0.0, 0.0, 100.0, 20.0));
    form.start_editing(&id);
    form.update_draft("never saved");
    form.teardown();

    assert!(!form.is_editing());
    assert_eq!(content_of(&form, &id), None);
}

#[test]
fn bubble_updates_for_unknown_elements_are_ignored() {
    let mut form = FormEditor::default();
    form.update_bubble_content(&ElementId::from("e9"), "A", "x");
    assert!(form.document().bubble_values.is_empty());
}

#[test]
fn saved_form_loads_back_identically() {
    let mut form = FormEditor::default();
    let g = form.add_element(grid(5), rect(50.0, 100.0, 300.0, 120.0));
    let t = form.add_element(ElementKind::TextField, rect(50.0, 40.0, 200.0, 24.0));
    form.update_bubble_content(&g, "C", "");
    form.update_bubble_content(&g, "D", "X");
    form.update_element(&t, ElementUpdate::content(""));

    let path = std::env::temp_dir().join(format!("optiform-roundtrip-{}.json", std::process::id()));
    form.save(&path).expect("save");
    let loaded = FormEditor::load(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.document(), form.document());

    // the id counter resumes past loaded ids
    let mut loaded = loaded;
    let next = loaded.add_element(ElementKind::TextArea, rect(0.0, 0.0, 10.0, 10.0));
    assert_eq!(next.as_str(), "e3");
}

#[test]
fn duplicate_ids_in_a_file_are_rejected() {
    let json = r#"{
        "elements": [
            { "id": "e1", "kind": "TextField", "rect": { "min": { "x": 0.0, "y": 0.0 }, "max": { "x": 1.0, "y": 1.0 } } },
            { "id": "e1", "kind": "TextArea", "rect": { "min": { "x": 0.0, "y": 0.0 }, "max": { "x": 1.0, "y": 1.0 } } }
        ]
    }"#;
    assert!(matches!(
        FormDocument::from_json(json),
        Err(FormError::DuplicateElementId(id)) if id == "e1"
    ));
}

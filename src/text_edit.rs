//! Inline text edit sessions shared by text fields, student fields and text
//! areas.
//!
//! The controller holds at most one session. It never touches the element
//! list itself: transitions that write back return a [`PendingCommit`] and the
//! owner applies it through its single update entry point. Every
//! (state, event) pair is defined; transitions that make no sense in the
//! current state are no-ops.

use crate::model::{Element, ElementId, Point, RectF};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        target: ElementId,
        draft: String,
    },
}

/// Draft text to be written into `target`'s content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCommit {
    pub target: ElementId,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditEvent {
    ConfirmKey,
    CancelKey,
    /// Pointer pressed at `pos`; commits when it lands outside `surface`.
    PointerDown { pos: Point, surface: RectF },
}

/// Optional hook for instrumentation. All methods default to no-ops.
pub trait EditObserver {
    fn on_start(&mut self, _target: &ElementId) {}
    fn on_commit(&mut self, _commit: &PendingCommit) {}
    fn on_cancel(&mut self, _target: &ElementId) {}
}

#[derive(Default)]
pub struct TextEditController {
    state: EditState,
    observer: Option<Box<dyn EditObserver>>,
}

impl fmt::Debug for TextEditController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEditController")
            .field("state", &self.state)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl TextEditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Box<dyn EditObserver>) -> Self {
        Self {
            state: EditState::Idle,
            observer: Some(observer),
        }
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn EditObserver>>) {
        self.observer = observer;
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    pub fn target(&self) -> Option<&ElementId> {
        match &self.state {
            EditState::Editing { target, .. } => Some(target),
            EditState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft.as_str()),
            EditState::Idle => None,
        }
    }

    /// Mutable access to the draft buffer for widgets that edit in place.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        match &mut self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Idle => None,
        }
    }

    /// Opens a session on `element`.
    ///
    /// Elements without text are ignored. A live session on another element
    /// is committed first and its commit is returned; restarting on the
    /// element already being edited keeps the current draft.
    pub fn start(&mut self, element: &Element) -> Option<PendingCommit> {
        if !element.kind.supports_text() {
            tracing::debug!(id = %element.id, kind = element.kind.name(), "edit ignored: no text");
            return None;
        }
        if self.target() == Some(&element.id) {
            return None;
        }
        let previous = self.commit();
        let draft = element.content.clone().unwrap_or_default();
        tracing::debug!(id = %element.id, "edit session started");
        self.state = EditState::Editing {
            target: element.id.clone(),
            draft,
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.on_start(&element.id);
        }
        previous
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        if let EditState::Editing { draft, .. } = &mut self.state {
            *draft = text.into();
        }
    }

    pub fn commit(&mut self) -> Option<PendingCommit> {
        let EditState::Editing { target, draft } = std::mem::take(&mut self.state) else {
            return None;
        };
        let commit = PendingCommit {
            target,
            content: draft,
        };
        tracing::debug!(id = %commit.target, len = commit.content.len(), "edit session committed");
        if let Some(observer) = self.observer.as_mut() {
            observer.on_commit(&commit);
        }
        Some(commit)
    }

    pub fn cancel(&mut self) {
        let EditState::Editing { target, .. } = std::mem::take(&mut self.state) else {
            return;
        };
        tracing::debug!(id = %target, "edit session cancelled");
        if let Some(observer) = self.observer.as_mut() {
            observer.on_cancel(&target);
        }
    }

    pub fn handle(&mut self, event: EditEvent) -> Option<PendingCommit> {
        match event {
            EditEvent::ConfirmKey => self.commit(),
            EditEvent::CancelKey => {
                self.cancel();
                None
            }
            EditEvent::PointerDown { pos, surface } => {
                if surface.contains(pos) {
                    None
                } else {
                    self.commit()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, StudentFieldKind};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn element(id: &str, kind: ElementKind, content: Option<&str>) -> Element {
        let mut e = Element::new(
            ElementId::from(id),
            kind,
            RectF::from_min_size(Point::new(0.0, 0.0), 100.0, 20.0),
        );
        e.content = content.map(str::to_string);
        e
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl EditObserver for Recorder {
        fn on_start(&mut self, target: &ElementId) {
            self.0.borrow_mut().push(format!("start {target}"));
        }
        fn on_commit(&mut self, commit: &PendingCommit) {
            self.0
                .borrow_mut()
                .push(format!("commit {} {:?}", commit.target, commit.content));
        }
        fn on_cancel(&mut self, target: &ElementId) {
            self.0.borrow_mut().push(format!("cancel {target}"));
        }
    }

    #[test]
    fn draft_starts_from_content_or_empty() {
        let mut c = TextEditController::new();
        c.start(&element("e1", ElementKind::TextField, None));
        assert_eq!(c.draft(), Some(""));

        let mut c = TextEditController::new();
        c.start(&element("e2", ElementKind::TextArea, Some("line one\nline two")));
        assert_eq!(c.draft(), Some("line one\nline two"));
        assert_eq!(c.target(), Some(&ElementId::from("e2")));
    }

    #[test]
    fn update_replaces_draft_verbatim() {
        let mut c = TextEditController::new();
        c.start(&element("e1", ElementKind::TextField, Some("x")));
        c.update_draft("  padded\t ");
        assert_eq!(c.draft(), Some("  padded\t "));
    }

    #[test]
    fn commit_returns_draft_and_goes_idle() {
        let mut c = TextEditController::new();
        c.start(&element("e1", ElementKind::TextField, None));
        c.update_draft("Ad Soyad");
        assert_eq!(
            c.commit(),
            Some(PendingCommit {
                target: ElementId::from("e1"),
                content: "Ad Soyad".to_string(),
            })
        );
        assert_eq!(c.state(), &EditState::Idle);
        assert_eq!(c.commit(), None);
    }

    #[test]
    fn cancel_discards_and_is_idempotent() {
        let mut c = TextEditController::new();
        c.start(&element("e1", ElementKind::TextField, Some("keep")));
        c.update_draft("X");
        c.cancel();
        assert_eq!(c.state(), &EditState::Idle);
        c.cancel();
        assert_eq!(c.state(), &EditState::Idle);
    }

    #[test]
    fn non_text_elements_do_not_start_sessions() {
        let mut c = TextEditController::new();
        let grid = element(
            "g",
            ElementKind::BubbleGrid {
                questions: 1,
                options: 4,
                labels: Default::default(),
                first_question: 1,
            },
            None,
        );
        assert_eq!(c.start(&grid), None);
        assert!(!c.is_editing());

        let image = element(
            "i",
            ElementKind::Image {
                source: "a.png".to_string(),
            },
            None,
        );
        c.start(&image);
        assert!(!c.is_editing());
    }

    #[test]
    fn starting_elsewhere_commits_the_live_session() {
        let mut c = TextEditController::new();
        c.start(&element("e1", ElementKind::TextField, None));
        c.update_draft("first");
        let previous = c.start(&element(
            "e2",
            ElementKind::StudentField {
                subtype: StudentFieldKind::SchoolNumber,
            },
            Some("123"),
        ));
        assert_eq!(
            previous,
            Some(PendingCommit {
                target: ElementId::from("e1"),
                content: "first".to_string(),
            })
        );
        assert_eq!(c.target(), Some(&ElementId::from("e2")));
        assert_eq!(c.draft(), Some("123"));
    }

    #[test]
    fn restarting_on_same_target_keeps_draft() {
        let mut c = TextEditController::new();
        let e = element("e1", ElementKind::TextField, Some("old"));
        c.start(&e);
        c.update_draft("typing");
        assert_eq!(c.start(&e), None);
        assert_eq!(c.draft(), Some("typing"));
    }

    #[test]
    fn events_map_to_transitions() {
        let surface = RectF::from_min_size(Point::new(0.0, 0.0), 100.0, 20.0);
        let mut c = TextEditController::new();
        let e = element("e1", ElementKind::TextField, None);

        c.start(&e);
        c.update_draft("in");
        let inside = EditEvent::PointerDown {
            pos: Point::new(50.0, 10.0),
            surface,
        };
        assert_eq!(c.handle(inside), None);
        assert!(c.is_editing());

        let outside = EditEvent::PointerDown {
            pos: Point::new(150.0, 10.0),
            surface,
        };
        assert_eq!(c.handle(outside).map(|p| p.content), Some("in".to_string()));
        assert!(!c.is_editing());
        // A late outside click after the commit does nothing.
        assert_eq!(c.handle(outside), None);

        c.start(&e);
        assert!(c.handle(EditEvent::ConfirmKey).is_some());
        assert_eq!(c.handle(EditEvent::ConfirmKey), None);

        c.start(&e);
        assert_eq!(c.handle(EditEvent::CancelKey), None);
        assert!(!c.is_editing());
    }

    #[test]
    fn idle_update_is_ignored() {
        let mut c = TextEditController::new();
        c.update_draft("nobody home");
        assert_eq!(c.state(), &EditState::Idle);
        assert!(c.draft_mut().is_none());
    }

    #[test]
    fn observer_sees_each_transition_once() {
        let recorder = Recorder::default();
        let log = recorder.0.clone();
        let mut c = TextEditController::with_observer(Box::new(recorder));
        let e = element("e1", ElementKind::TextField, None);

        c.start(&e);
        c.update_draft("a");
        c.commit();
        c.commit();
        c.start(&e);
        c.cancel();
        c.cancel();

        assert_eq!(
            *log.borrow(),
            vec![
                "start e1".to_string(),
                "commit e1 \"a\"".to_string(),
                "start e1".to_string(),
                "cancel e1".to_string(),
            ]
        );
    }
}

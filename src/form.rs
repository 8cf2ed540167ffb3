//! The canonical form document and its single writer.

use crate::bubbles::{self, BubbleValues, ResolvedBubbles};
use crate::corner_marks::{CalibrationOverlay, CornerMarkConfig};
use crate::error::{FormError, FormResult};
use crate::model::{Element, ElementId, ElementKind, ElementUpdate, PageSetup, RectF};
use crate::text_edit::{EditEvent, EditObserver, PendingCommit, TextEditController};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FormDocument {
    #[serde(default)]
    pub page: PageSetup,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub bubble_values: BubbleValues,
    #[serde(default)]
    pub corner_marks: CornerMarkConfig,
}

impl FormDocument {
    pub fn from_json(json: &str) -> FormResult<Self> {
        let doc: FormDocument = serde_json::from_str(json)?;
        doc.check_unique_ids()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> FormResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn check_unique_ids(&self) -> FormResult<()> {
        let mut seen = HashSet::new();
        for e in &self.elements {
            if !seen.insert(&e.id) {
                return Err(FormError::DuplicateElementId(e.id.to_string()));
            }
        }
        Ok(())
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn resolved_bubbles(&self) -> ResolvedBubbles {
        bubbles::reconcile(&self.elements, &self.bubble_values)
    }

    pub fn overlay(&self) -> Option<CalibrationOverlay> {
        self.corner_marks.layout(self.page)
    }
}

/// Owns the document, the id counter and the one edit session of the page.
#[derive(Debug)]
pub struct FormEditor {
    doc: FormDocument,
    next_id: u64,
    edit: TextEditController,
}

impl Default for FormEditor {
    fn default() -> Self {
        Self {
            doc: FormDocument::default(),
            next_id: 1,
            edit: TextEditController::new(),
        }
    }
}

impl FormEditor {
    /// Takes ownership of `doc`, rejecting duplicate element ids.
    pub fn new(doc: FormDocument) -> FormResult<Self> {
        doc.check_unique_ids()?;
        let next_id = next_free_counter(&doc.elements);
        Ok(Self {
            doc,
            next_id,
            edit: TextEditController::new(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> FormResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let doc = FormDocument::from_json(&json)?;
        tracing::info!(path = %path.display(), elements = doc.elements.len(), "loaded form");
        Self::new(doc)
    }

    /// Writes the document. A live draft is not part of it.
    pub fn save(&self, path: impl AsRef<Path>) -> FormResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.doc.to_json()?)?;
        tracing::info!(path = %path.display(), "saved form");
        Ok(())
    }

    pub fn document(&self) -> &FormDocument {
        &self.doc
    }

    /// Replaces the whole document, discarding any live draft. A document
    /// with duplicate ids is rejected and the current one is left as is.
    pub fn replace_document(&mut self, doc: FormDocument) -> FormResult<()> {
        doc.check_unique_ids()?;
        self.edit.cancel();
        self.next_id = self.next_id.max(next_free_counter(&doc.elements));
        self.doc = doc;
        Ok(())
    }

    /// Writes a live draft back, then swaps in `doc`. Returns the outgoing
    /// document including the committed draft.
    pub fn commit_then_replace(&mut self, doc: FormDocument) -> FormResult<FormDocument> {
        doc.check_unique_ids()?;
        self.commit_edit();
        let previous = std::mem::replace(&mut self.doc, FormDocument::default());
        self.replace_document(doc)?;
        Ok(previous)
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn EditObserver>>) {
        self.edit.set_observer(observer);
    }

    pub fn elements(&self) -> &[Element] {
        &self.doc.elements
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.doc.element(id)
    }

    fn allocate_id(&mut self) -> ElementId {
        loop {
            let id = ElementId::new(format!("e{}", self.next_id));
            self.next_id += 1;
            if self.doc.element(&id).is_none() {
                return id;
            }
        }
    }

    pub fn add_element(&mut self, kind: ElementKind, rect: RectF) -> ElementId {
        let id = self.allocate_id();
        tracing::debug!(id = %id, kind = kind.name(), "element added");
        self.doc.elements.push(Element::new(id.clone(), kind, rect));
        id
    }

    /// Inserts a prepared element, keeping ids unique.
    pub fn insert_element(&mut self, element: Element) -> FormResult<()> {
        if self.doc.element(&element.id).is_some() {
            return Err(FormError::DuplicateElementId(element.id.to_string()));
        }
        self.doc.elements.push(element);
        Ok(())
    }

    /// Copies an element under a fresh id, offset by (`dx`, `dy`).
    pub fn duplicate_element(&mut self, id: &ElementId, dx: f32, dy: f32) -> Option<ElementId> {
        let mut copy = self.doc.element(id)?.clone();
        copy.id = self.allocate_id();
        copy.rect = copy.rect.translated(dx, dy);
        let new_id = copy.id.clone();
        self.doc.elements.push(copy);
        Some(new_id)
    }

    /// Removes an element. Its bubble overrides stay until cleared explicitly.
    pub fn remove_element(&mut self, id: &ElementId) -> Option<Element> {
        if self.edit.target() == Some(id) {
            self.edit.cancel();
        }
        let idx = self.doc.elements.iter().position(|e| &e.id == id)?;
        Some(self.doc.elements.remove(idx))
    }

    /// Merges `update` into the element with `id`. Unknown ids are ignored.
    pub fn update_element(&mut self, id: &ElementId, update: ElementUpdate) -> bool {
        match self.doc.elements.iter_mut().find(|e| &e.id == id) {
            Some(element) => {
                element.apply(update);
                true
            }
            None => {
                tracing::debug!(id = %id, "update for unknown element ignored");
                false
            }
        }
    }

    pub fn move_element(&mut self, id: &ElementId, dx: f32, dy: f32) -> bool {
        let Some(rect) = self.doc.element(id).map(|e| e.rect.translated(dx, dy)) else {
            return false;
        };
        self.update_element(id, ElementUpdate::rect(rect))
    }

    /// Moves `id` to index `to` in paint order, clamped to the list.
    pub fn reorder_element(&mut self, id: &ElementId, to: usize) {
        let Some(idx) = self.doc.elements.iter().position(|e| &e.id == id) else {
            return;
        };
        let element = self.doc.elements.remove(idx);
        let to = to.min(self.doc.elements.len());
        self.doc.elements.insert(to, element);
    }

    /// Sets a bubble override; `""` marks the bubble as deliberately blank.
    pub fn update_bubble_content(&mut self, id: &ElementId, key: &str, value: impl Into<String>) {
        if self.doc.element(id).is_none() {
            tracing::debug!(id = %id, key, "bubble update for unknown element ignored");
            return;
        }
        self.doc.bubble_values.set(id, key, value);
    }

    /// Reverts a bubble to its default label.
    pub fn clear_bubble_content(&mut self, id: &ElementId, key: &str) -> Option<String> {
        self.doc.bubble_values.clear(id, key)
    }

    pub fn tidy_bubble_overrides(&mut self) -> usize {
        self.doc.bubble_values.retain_meaningful(&self.doc.elements)
    }

    pub fn resolved_bubbles(&self) -> ResolvedBubbles {
        self.doc.resolved_bubbles()
    }

    pub fn page(&self) -> PageSetup {
        self.doc.page
    }

    pub fn set_page(&mut self, page: PageSetup) {
        self.doc.page = page;
    }

    pub fn corner_marks(&self) -> CornerMarkConfig {
        self.doc.corner_marks
    }

    pub fn set_corner_marks(&mut self, config: CornerMarkConfig) {
        self.doc.corner_marks = config;
    }

    pub fn overlay(&self) -> Option<CalibrationOverlay> {
        self.doc.overlay()
    }

    pub fn editing_target(&self) -> Option<&ElementId> {
        self.edit.target()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    pub fn draft(&self) -> Option<&str> {
        self.edit.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut String> {
        self.edit.draft_mut()
    }

    pub fn start_editing(&mut self, id: &ElementId) {
        let Some(element) = self.doc.element(id) else {
            return;
        };
        let previous = self.edit.start(element);
        self.apply_commit(previous);
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.edit.update_draft(text);
    }

    pub fn commit_edit(&mut self) -> bool {
        let commit = self.edit.commit();
        self.apply_commit(commit)
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel();
    }

    pub fn handle_edit_event(&mut self, event: EditEvent) -> bool {
        let commit = self.edit.handle(event);
        self.apply_commit(commit)
    }

    /// Page teardown: a live draft is dropped, never partially written.
    pub fn teardown(&mut self) {
        self.edit.cancel();
    }

    fn apply_commit(&mut self, commit: Option<PendingCommit>) -> bool {
        match commit {
            Some(PendingCommit { target, content }) => {
                self.update_element(&target, ElementUpdate::content(content))
            }
            None => false,
        }
    }
}

fn next_free_counter(elements: &[Element]) -> u64 {
    elements
        .iter()
        .filter_map(|e| e.id.as_str().strip_prefix('e')?.parse::<u64>().ok())
        .max()
        .map_or(1, |n| n + 1)
}

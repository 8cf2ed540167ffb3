//! Authored bubble overrides and the read-side reconciliation renderers use.
//!
//! An override of `""` means the author deliberately left a bubble blank. It
//! is distinct from a missing override, which falls back to the grid's
//! default label. Nothing in this module turns one into the other.

use crate::model::{Element, ElementId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BubbleValues(BTreeMap<ElementId, BTreeMap<String, String>>);

impl BubbleValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ElementId, key: &str) -> Option<&str> {
        self.0.get(id)?.get(key).map(String::as_str)
    }

    pub fn for_element(&self, id: &ElementId) -> Option<&BTreeMap<String, String>> {
        self.0.get(id)
    }

    pub fn set(&mut self, id: &ElementId, key: impl Into<String>, value: impl Into<String>) {
        self.0
            .entry(id.clone())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Explicit revert to the default label. Returns the removed override.
    pub fn clear(&mut self, id: &ElementId, key: &str) -> Option<String> {
        let map = self.0.get_mut(id)?;
        let removed = map.remove(key);
        if map.is_empty() {
            self.0.remove(id);
        }
        removed
    }

    pub fn is_explicitly_blank(&self, id: &ElementId, key: &str) -> bool {
        self.get(id, key) == Some("")
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &str, &str)> {
        self.0.iter().flat_map(|(id, map)| {
            map.iter()
                .map(move |(key, value)| (id, key.as_str(), value.as_str()))
        })
    }

    /// Drops overrides that spell out the grid's default label. Blank
    /// overrides are always kept, as are overrides for unknown elements.
    pub fn retain_meaningful(&mut self, elements: &[Element]) -> usize {
        let mut removed = 0;
        for element in elements {
            let Some(map) = self.0.get_mut(&element.id) else {
                continue;
            };
            let defaults = element.kind.bubble_keys();
            map.retain(|key, value| {
                let redundant = !value.is_empty()
                    && defaults
                        .iter()
                        .any(|d| d == key && d.as_str() == value.as_str());
                if redundant {
                    removed += 1;
                }
                !redundant
            });
            if map.is_empty() {
                self.0.remove(&element.id);
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "pruned default-valued bubble overrides");
        }
        removed
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BubbleContent {
    Default(String),
    Custom(String),
    Blank,
}

impl BubbleContent {
    /// Glyph to print inside the bubble; `None` for a blank bubble.
    pub fn glyph(&self) -> Option<&str> {
        match self {
            BubbleContent::Default(s) | BubbleContent::Custom(s) => Some(s),
            BubbleContent::Blank => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, BubbleContent::Blank)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedBubbles {
    by_element: BTreeMap<ElementId, Vec<(String, BubbleContent)>>,
    /// Element ids that carry overrides but are not on the page.
    pub orphans: Vec<ElementId>,
}

impl ResolvedBubbles {
    /// Bubbles of one grid in option order, then any extra authored keys.
    pub fn bubbles(&self, id: &ElementId) -> &[(String, BubbleContent)] {
        self.by_element.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn content(&self, id: &ElementId, key: &str) -> Option<&BubbleContent> {
        self.bubbles(id)
            .iter()
            .find_map(|(k, c)| (k == key).then_some(c))
    }

    pub fn is_blank(&self, id: &ElementId, key: &str) -> bool {
        self.content(id, key).is_some_and(BubbleContent::is_blank)
    }
}

/// Resolves what every bubble on the page should print. Pure; called on
/// every read instead of patching the document in the background.
pub fn reconcile(elements: &[Element], values: &BubbleValues) -> ResolvedBubbles {
    let mut resolved = ResolvedBubbles::default();
    for element in elements {
        let keys = element.kind.bubble_keys();
        let overrides = values.for_element(&element.id);
        if keys.is_empty() && overrides.is_none() {
            continue;
        }
        let mut bubbles: Vec<(String, BubbleContent)> = keys
            .iter()
            .map(|key| {
                let content = match overrides.and_then(|m| m.get(key)) {
                    Some(v) if v.is_empty() => BubbleContent::Blank,
                    Some(v) => BubbleContent::Custom(v.clone()),
                    None => BubbleContent::Default(key.clone()),
                };
                (key.clone(), content)
            })
            .collect();
        if let Some(map) = overrides {
            for (key, value) in map {
                if keys.contains(key) {
                    continue;
                }
                let content = if value.is_empty() {
                    BubbleContent::Blank
                } else {
                    BubbleContent::Custom(value.clone())
                };
                bubbles.push((key.clone(), content));
            }
        }
        resolved.by_element.insert(element.id.clone(), bubbles);
    }
    for id in values.0.keys() {
        if !elements.iter().any(|e| &e.id == id) {
            resolved.orphans.push(id.clone());
        }
    }
    if !resolved.orphans.is_empty() {
        tracing::debug!(orphans = resolved.orphans.len(), "bubble overrides without element");
    }
    resolved
}

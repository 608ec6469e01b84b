//! Stack of open elements.

use std::collections::HashMap;

use crate::attributes::{Attributes, QName};

/// Name of the pseudo-entry at the bottom of every stack.
pub(crate) const DOCUMENT: &str = "#document";

/// Entry in the stack of open elements.
#[derive(Clone, Debug)]
pub(crate) struct OpenElement {
    /// Name as reported in events.
    pub(crate) name: QName,
    /// ASCII-lowercased name used for rule lookups and end-tag matching.
    pub(crate) key: String,
    pub(crate) attributes: Attributes,
    pub(crate) synthesized: bool,
}

impl OpenElement {
    pub(crate) fn new(name: QName, attributes: Attributes, synthesized: bool) -> Self {
        let key = name.as_str().to_ascii_lowercase();
        Self {
            name,
            key,
            attributes,
            synthesized,
        }
    }

    fn document() -> Self {
        Self {
            name: QName::new(DOCUMENT),
            key: DOCUMENT.to_string(),
            attributes: Attributes::new(),
            synthesized: true,
        }
    }

    pub(crate) fn is_document(&self) -> bool {
        self.key == DOCUMENT
    }
}

/// Open-element stack; the document entry stays at the bottom until the
/// final unwind.
///
/// Per-name counts answer "is any `x` open" without walking the stack.
#[derive(Clone, Debug)]
pub(crate) struct OpenElementsStack {
    items: Vec<OpenElement>,
    open_counts: HashMap<String, usize>,
    max_depth: usize,
}

impl OpenElementsStack {
    pub(crate) fn new() -> Self {
        Self {
            items: vec![OpenElement::document()],
            open_counts: HashMap::new(),
            max_depth: 0,
        }
    }

    pub(crate) fn push(&mut self, element: OpenElement) {
        debug_assert!(!element.is_document());
        *self.open_counts.entry(element.key.clone()).or_default() += 1;
        self.items.push(element);
        self.max_depth = self.max_depth.max(self.depth());
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement> {
        let element = self.items.pop()?;
        if let Some(count) = self.open_counts.get_mut(&element.key) {
            *count -= 1;
            if *count == 0 {
                self.open_counts.remove(&element.key);
            }
        }
        Some(element)
    }

    /// Open elements named `key`.
    pub(crate) fn count_open(&self, key: &str) -> usize {
        self.open_counts.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn top(&self) -> Option<&OpenElement> {
        self.items.last()
    }

    /// Whether only the document entry (or nothing) is left.
    pub(crate) fn top_is_document(&self) -> bool {
        self.top().is_none_or(OpenElement::is_document)
    }

    pub(crate) fn top_key(&self) -> Option<&str> {
        self.top().map(|e| e.key.as_str())
    }

    /// Open elements, excluding the document entry.
    pub(crate) fn depth(&self) -> usize {
        let document = self.items.first().is_some_and(OpenElement::is_document);
        self.items.len() - usize::from(document)
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Index of the nearest open element named `key`, searching downward.
    pub(crate) fn find_from_top(&self, key: &str) -> Option<usize> {
        if self.count_open(key) == 0 {
            return None;
        }
        self.items
            .iter()
            .rposition(|e| !e.is_document() && e.key == key)
    }

    pub(crate) fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.count_open(k) > 0)
    }

    /// Number of entries above `index`.
    pub(crate) fn above(&self, index: usize) -> usize {
        self.items.len().saturating_sub(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> OpenElement {
        OpenElement::new(QName::new(name), Attributes::new(), false)
    }

    #[test]
    fn starts_with_document_entry() {
        let stack = OpenElementsStack::new();
        assert!(stack.top_is_document());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top_key(), Some(DOCUMENT));
    }

    #[test]
    fn tracks_depth_and_lookup() {
        let mut stack = OpenElementsStack::new();
        stack.push(element("DIV"));
        stack.push(element("p"));
        stack.push(element("div"));
        assert_eq!(stack.find_from_top("div"), Some(3));
        assert_eq!(stack.above(1), 2);
        assert!(stack.contains_any(&["x", "p"]));
        assert!(!stack.contains_any(&["body"]));
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.max_depth(), 3);
        assert_eq!(stack.find_from_top(DOCUMENT), None);
    }

    #[test]
    fn open_counts_follow_push_and_pop() {
        let mut stack = OpenElementsStack::new();
        for _ in 0..3 {
            stack.push(element("div"));
        }
        stack.push(element("p"));
        assert_eq!(stack.count_open("div"), 3);
        assert_eq!(stack.count_open("x"), 0);
        assert!(!stack.contains_any(&[DOCUMENT]));

        stack.pop();
        assert_eq!(stack.count_open("p"), 0);
        assert!(!stack.contains_any(&["p"]));
        while stack.pop().is_some() {}
        assert_eq!(stack.count_open("div"), 0);
        assert_eq!(stack.find_from_top("div"), None);
    }
}

//! Attribute collection attached to start tags.
//!
//! Determinism contract:
//! - Entries keep insertion order (source order for scanned tags).
//! - Names are unique; re-adding a name overwrites the existing entry in place.
//! - Index-based and name-based access agree after every mutation; removing an
//!   entry renumbers every later entry down by one.

use std::collections::HashMap;
use std::fmt;

/// Type name given to attributes when none is known.
pub const DEFAULT_ATTRIBUTE_TYPE: &str = "CDATA";

/// Qualified name as written in the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    /// Full name (`prefix:local` or `local`).
    pub raw: String,
    pub prefix: Option<String>,
    pub local: String,
    /// Namespace URI. The scanner never binds namespaces; filters may.
    pub uri: Option<String>,
}

impl QName {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
                (Some(prefix.to_string()), local.to_string())
            }
            _ => (None, raw.clone()),
        };
        Self {
            raw,
            prefix,
            local,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for QName {
    fn from(raw: &str) -> Self {
        QName::new(raw)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub type_name: String,
    pub value: String,
    pub specified: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Attributes {
    entries: Vec<Attribute>,
    by_name: HashMap<String, usize>,
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Attributes {}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute and returns its index.
    ///
    /// If the name is already present, its type and value are replaced, the
    /// entry keeps its position, and it is marked as specified.
    pub fn add(
        &mut self,
        name: QName,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> usize {
        if let Some(&index) = self.by_name.get(name.as_str()) {
            let entry = &mut self.entries[index];
            entry.type_name = type_name.into();
            entry.value = value.into();
            entry.specified = true;
            return index;
        }
        let index = self.entries.len();
        self.by_name.insert(name.raw.clone(), index);
        self.entries.push(Attribute {
            name,
            type_name: type_name.into(),
            value: value.into(),
            specified: true,
        });
        index
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }

    /// Removes the entry at `index`, returning it. Later entries shift down.
    pub fn remove_at(&mut self, index: usize) -> Option<Attribute> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.by_name.remove(removed.name.as_str());
        for slot in self.by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, qname: &str) -> Option<usize> {
        self.by_name.get(qname).copied()
    }

    pub fn index_of_ns(&self, uri: &str, local: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|a| a.name.uri.as_deref() == Some(uri) && a.name.local == local)
    }

    /// Renames the entry at `index`.
    ///
    /// Returns `false` (and leaves the collection untouched) when the index is
    /// out of range or another entry already uses the new name.
    pub fn set_name(&mut self, index: usize, name: QName) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        match self.by_name.get(name.as_str()) {
            Some(&existing) if existing != index => return false,
            _ => {}
        }
        let old = std::mem::replace(&mut self.entries[index].name, name);
        self.by_name.remove(old.as_str());
        self.by_name
            .insert(self.entries[index].name.raw.clone(), index);
        true
    }

    pub fn name(&self, index: usize) -> Option<&QName> {
        self.entries.get(index).map(|a| &a.name)
    }

    pub fn set_type(&mut self, index: usize, type_name: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.type_name = type_name.into();
                true
            }
            None => false,
        }
    }

    pub fn type_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|a| a.type_name.as_str())
    }

    pub fn type_of(&self, qname: &str) -> Option<&str> {
        self.index_of(qname).and_then(|i| self.type_at(i))
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|a| a.value.as_str())
    }

    pub fn value_of(&self, qname: &str) -> Option<&str> {
        self.index_of(qname).and_then(|i| self.value_at(i))
    }

    pub fn set_specified(&mut self, index: usize, specified: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.specified = specified;
                true
            }
            None => false,
        }
    }

    pub fn is_specified(&self, index: usize) -> Option<bool> {
        self.entries.get(index).map(|a| a.specified)
    }

    pub fn get(&self, index: usize) -> Option<&Attribute> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.add(QName::new("id"), DEFAULT_ATTRIBUTE_TYPE, "main");
        attrs.add(QName::new("class"), DEFAULT_ATTRIBUTE_TYPE, "box");
        attrs.add(QName::new("data-x"), "NMTOKEN", "1");
        attrs
    }

    #[test]
    fn preserves_insertion_order() {
        let attrs = sample();
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["id", "class", "data-x"]);
        assert_eq!(attrs.index_of("data-x"), Some(2));
    }

    #[test]
    fn re_adding_a_name_overwrites_in_place() {
        let mut attrs = sample();
        attrs.set_specified(1, false);
        let index = attrs.add(QName::new("class"), "ID", "other");
        assert_eq!(index, 1);
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.value_of("class"), Some("other"));
        assert_eq!(attrs.type_of("class"), Some("ID"));
        assert_eq!(attrs.is_specified(1), Some(true));
    }

    #[test]
    fn removing_an_earlier_entry_keeps_lookups_consistent() {
        let mut attrs = sample();
        let before = attrs.get(attrs.index_of("data-x").unwrap()).cloned();
        let removed = attrs.remove_at(0).expect("index 0 exists");
        assert_eq!(removed.name.as_str(), "id");
        assert_eq!(attrs.index_of("data-x"), Some(1));
        assert_eq!(attrs.index_of("id"), None);
        assert_eq!(attrs.get(1).cloned(), before);
        assert_eq!(attrs.remove_at(7), None);
    }

    #[test]
    fn set_name_updates_the_index() {
        let mut attrs = sample();
        assert!(attrs.set_name(0, QName::new("xml:id")));
        assert_eq!(attrs.index_of("id"), None);
        assert_eq!(attrs.index_of("xml:id"), Some(0));
        assert_eq!(attrs.name(0).unwrap().prefix.as_deref(), Some("xml"));
        assert!(!attrs.set_name(0, QName::new("class")), "duplicate name");
        assert!(attrs.set_name(1, QName::new("class")), "renaming to itself");
    }

    #[test]
    fn namespace_lookup_uses_uri_and_local_part() {
        let mut attrs = Attributes::new();
        attrs.add(
            QName::new("xlink:href").with_uri("http://www.w3.org/1999/xlink"),
            DEFAULT_ATTRIBUTE_TYPE,
            "#a",
        );
        assert_eq!(attrs.index_of_ns("http://www.w3.org/1999/xlink", "href"), Some(0));
        assert_eq!(attrs.index_of_ns("urn:other", "href"), None);
    }

    #[test]
    fn qname_splits_only_well_formed_prefixes() {
        assert_eq!(QName::new("svg:rect").local, "rect");
        assert_eq!(QName::new(":odd").prefix, None);
        assert_eq!(QName::new("odd:").local, "odd:");
    }

    #[test]
    fn remove_all_clears_name_index() {
        let mut attrs = sample();
        attrs.remove_all();
        assert!(attrs.is_empty());
        assert_eq!(attrs.index_of("id"), None);
        assert_eq!(attrs.add(QName::new("id"), DEFAULT_ATTRIBUTE_TYPE, "x"), 0);
    }
}

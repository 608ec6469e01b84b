//! Structural events delivered through the pipeline.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::attributes::{Attributes, QName};
use crate::location::LocationSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    DocumentStart,
    DocumentEnd,
    ElementStart { name: QName, attributes: Attributes },
    ElementEnd { name: QName },
    Characters(String),
    Comment(String),
    DocTypeDecl {
        root: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
}

impl EventKind {
    /// Element name for start and end events.
    pub fn element_name(&self) -> Option<&QName> {
        match self {
            Self::ElementStart { name, .. } | Self::ElementEnd { name } => Some(name),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::DocumentStart => "document-start",
            Self::DocumentEnd => "document-end",
            Self::ElementStart { .. } => "element-start",
            Self::ElementEnd { .. } => "element-end",
            Self::Characters(_) => "characters",
            Self::Comment(_) => "comment",
            Self::DocTypeDecl { .. } => "doctype",
        }
    }
}

/// Type-keyed extension bag carried with every event.
///
/// Filters attach their own entries and must forward entries they do not
/// recognize; moving the event moves the bag.
#[derive(Default)]
pub struct Augmentations {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Augmentations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value`, returning the previous entry of the same type.
    pub fn insert<T: Any>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Augmentations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Augmentations")
            .field("len", &self.entries.len())
            .finish()
    }
}

pub struct Event {
    pub kind: EventKind,
    pub span: LocationSpan,
    pub synthesized: bool,
    pub augmentations: Augmentations,
}

impl Event {
    /// Event backed by source characters at `span`.
    pub fn real(kind: EventKind, span: LocationSpan) -> Self {
        Self {
            kind,
            span,
            synthesized: false,
            augmentations: Augmentations::new(),
        }
    }

    /// Event with no literal source representation; always carries the
    /// sentinel span.
    pub fn synthesized(kind: EventKind) -> Self {
        Self {
            kind,
            span: LocationSpan::SYNTHESIZED,
            synthesized: true,
            augmentations: Augmentations::new(),
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DocumentStart | EventKind::ElementStart { .. }
        )
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, EventKind::DocumentEnd | EventKind::ElementEnd { .. })
    }
}

/// Augmentations are not compared.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.span == other.span && self.synthesized == other.synthesized
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("span", &self.span)
            .field("synthesized", &self.synthesized)
            .field("augmentations", &self.augmentations)
            .finish()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if let Some(name) = self.kind.element_name() {
            write!(f, " {name}")?;
        }
        if self.synthesized {
            f.write_str(" (synthesized)")
        } else {
            write!(f, " [{}]", self.span)
        }
    }
}

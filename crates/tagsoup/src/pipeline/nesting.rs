use std::fmt;

use super::{EventFilter, EventHandler, PipelineError};
use crate::event::{Event, EventKind};
use crate::location::LocationSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NestingViolation {
    /// An event arrived before `DocumentStart` or after `DocumentEnd`.
    OutsideDocument { event: &'static str },
    DuplicateDocumentStart,
    /// An end event did not close the innermost open element.
    MismatchedEnd {
        expected: Option<String>,
        found: String,
    },
    /// `DocumentEnd` with elements still open.
    UnclosedAtEnd { open: Vec<String> },
}

impl fmt::Display for NestingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsideDocument { event } => write!(f, "{event} outside the document"),
            Self::DuplicateDocumentStart => f.write_str("second document-start"),
            Self::MismatchedEnd {
                expected: Some(expected),
                found,
            } => write!(f, "end of `{found}` while `{expected}` is open"),
            Self::MismatchedEnd {
                expected: None,
                found,
            } => write!(f, "end of `{found}` with nothing open"),
            Self::UnclosedAtEnd { open } => write!(f, "still open at end: {}", open.join(", ")),
        }
    }
}

/// Pass-through filter that checks events form a properly nested document.
///
/// Violations are recorded with the span of the offending event. In strict
/// mode the first violation rejects the stream instead.
#[derive(Debug, Default)]
pub struct NestingCheck {
    open: Vec<String>,
    started: bool,
    ended: bool,
    strict: bool,
    max_depth: usize,
    violations: Vec<(LocationSpan, NestingViolation)>,
}

impl NestingCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn violations(&self) -> &[(LocationSpan, NestingViolation)] {
        &self.violations
    }

    pub fn is_well_formed(&self) -> bool {
        self.violations.is_empty() && self.ended
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn check(&mut self, event: &Event) -> Result<(), PipelineError> {
        let violation = match &event.kind {
            EventKind::DocumentStart if self.started => Some(NestingViolation::DuplicateDocumentStart),
            EventKind::DocumentStart => {
                self.started = true;
                None
            }
            _ if !self.started || self.ended => Some(NestingViolation::OutsideDocument {
                event: event.kind.label(),
            }),
            EventKind::DocumentEnd => {
                self.ended = true;
                (!self.open.is_empty()).then(|| NestingViolation::UnclosedAtEnd {
                    open: std::mem::take(&mut self.open),
                })
            }
            EventKind::ElementStart { name, .. } => {
                self.open.push(name.as_str().to_string());
                self.max_depth = self.max_depth.max(self.open.len());
                None
            }
            EventKind::ElementEnd { name } => match self.open.pop() {
                Some(top) if top == name.as_str() => None,
                expected => Some(NestingViolation::MismatchedEnd {
                    expected,
                    found: name.as_str().to_string(),
                }),
            },
            EventKind::Characters(_) | EventKind::Comment(_) | EventKind::DocTypeDecl { .. } => None,
        };

        if let Some(violation) = violation {
            log::debug!(target: "tagsoup.nesting", "[{}] {violation}", event.span);
            if self.strict {
                return Err(PipelineError::Rejected {
                    filter: "nesting-check",
                    reason: violation.to_string(),
                });
            }
            self.violations.push((event.span, violation));
        }
        Ok(())
    }
}

impl EventFilter for NestingCheck {
    fn name(&self) -> &'static str {
        "nesting-check"
    }

    fn filter(&mut self, event: Event, next: &mut dyn EventHandler) -> Result<(), PipelineError> {
        self.check(&event)?;
        next.handle(event)
    }
}

impl EventHandler for NestingCheck {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        self.check(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::QName;

    fn start(name: &str) -> Event {
        Event::synthesized(EventKind::ElementStart {
            name: QName::new(name),
            attributes: Default::default(),
        })
    }

    fn end(name: &str) -> Event {
        Event::synthesized(EventKind::ElementEnd {
            name: QName::new(name),
        })
    }

    fn doc(kind: EventKind) -> Event {
        Event::synthesized(kind)
    }

    #[test]
    fn accepts_a_nested_document() {
        let mut check = NestingCheck::new();
        for event in [
            doc(EventKind::DocumentStart),
            start("a"),
            start("b"),
            end("b"),
            end("a"),
            doc(EventKind::DocumentEnd),
        ] {
            check.handle(event).unwrap();
        }
        assert!(check.is_well_formed());
        assert_eq!(check.max_depth(), 2);
    }

    #[test]
    fn records_violations() {
        let mut check = NestingCheck::new();
        for event in [
            start("early"),
            doc(EventKind::DocumentStart),
            start("a"),
            end("b"),
            start("c"),
            doc(EventKind::DocumentEnd),
        ] {
            check.handle(event).unwrap();
        }
        let found: Vec<String> = check.violations().iter().map(|(_, v)| v.to_string()).collect();
        assert_eq!(
            found,
            [
                "element-start outside the document",
                "end of `b` while `a` is open",
                "still open at end: c",
            ]
        );
        assert!(!check.is_well_formed());
    }

    #[test]
    fn strict_mode_rejects() {
        let mut check = NestingCheck::strict();
        check.handle(doc(EventKind::DocumentStart)).unwrap();
        let err = check.handle(end("x")).unwrap_err();
        assert!(matches!(err, PipelineError::Rejected { filter: "nesting-check", .. }));
    }
}

//! Advisory notices for recovered malformations.
//!
//! Notices never alter the event stream; they are handed to an [`ErrorSink`]
//! when error reporting is enabled and logged at `debug` level.

use std::fmt;

use crate::location::LocationSpan;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoticeKind {
    /// An open element was closed because a start tag implies its end.
    AutoClosed,
    /// A missing ancestor element was inserted.
    AncestorSynthesized,
    /// An end tag with no matching open element was discarded.
    StrayEndTag,
    /// Elements left open inside an element closed by an explicit end tag.
    MisnestedEndTag,
    /// An element was still open at end of input.
    ClosedAtEndOfInput,
    /// A start tag that would duplicate document structure was ignored.
    IgnoredStartTag,
    /// A root end tag was absorbed; the element closes at end of input.
    IgnoredEndTag,
    UnterminatedTag,
    UnterminatedComment,
    UnterminatedRawText,
    /// A `<` that does not start markup was kept as text.
    BareLessThan,
    DuplicateAttribute,
}

impl NoticeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AutoClosed => "auto-closed",
            Self::AncestorSynthesized => "ancestor-synthesized",
            Self::StrayEndTag => "stray-end-tag",
            Self::MisnestedEndTag => "misnested-end-tag",
            Self::ClosedAtEndOfInput => "closed-at-end-of-input",
            Self::IgnoredStartTag => "ignored-start-tag",
            Self::IgnoredEndTag => "ignored-end-tag",
            Self::UnterminatedTag => "unterminated-tag",
            Self::UnterminatedComment => "unterminated-comment",
            Self::UnterminatedRawText => "unterminated-raw-text",
            Self::BareLessThan => "bare-less-than",
            Self::DuplicateAttribute => "duplicate-attribute",
        }
    }

    /// Whether the scanner (rather than the balancer) raises this kind.
    pub const fn is_lexical(self) -> bool {
        matches!(
            self,
            Self::UnterminatedTag
                | Self::UnterminatedComment
                | Self::UnterminatedRawText
                | Self::BareLessThan
                | Self::DuplicateAttribute
        )
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Location of the token that triggered the recovery.
    pub span: LocationSpan,
    /// Element (or attribute) names involved, most relevant first.
    pub names: Vec<String>,
}

impl Notice {
    pub fn new(kind: NoticeKind, span: LocationSpan, names: Vec<String>) -> Self {
        Self { kind, span, names }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.span, self.kind)?;
        if !self.names.is_empty() {
            write!(f, ": {}", self.names.join(", "))?;
        }
        Ok(())
    }
}

/// Receiver for notices.
pub trait ErrorSink {
    fn report(&mut self, notice: Notice);
}

/// Error sink that buffers into a Vec.
#[derive(Debug, Default)]
pub struct VecErrorSink(pub Vec<Notice>);

impl ErrorSink for VecErrorSink {
    fn report(&mut self, notice: Notice) {
        self.0.push(notice);
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn report(&mut self, notice: Notice) {
        (**self).report(notice);
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for Box<S> {
    fn report(&mut self, notice: Notice) {
        (**self).report(notice);
    }
}

/// Per-parse notice buffer shared by scanner and balancer.
///
/// Notices are dropped (but still logged) unless collection is enabled.
#[derive(Debug, Default)]
pub(crate) struct NoticeLog {
    collect: bool,
    pending: Vec<Notice>,
    total: u64,
}

impl NoticeLog {
    pub(crate) fn new(collect: bool) -> Self {
        Self {
            collect,
            pending: Vec::new(),
            total: 0,
        }
    }

    pub(crate) fn push(&mut self, kind: NoticeKind, span: LocationSpan, names: Vec<String>) {
        let notice = Notice::new(kind, span, names);
        log::debug!(target: "tagsoup.notices", "{notice}");
        self.total = self.total.saturating_add(1);
        if self.collect {
            self.pending.push(notice);
        }
    }

    /// Position in the queue; notices pushed after it can be held back with
    /// [`NoticeLog::hold_from`].
    pub(crate) fn mark(&self) -> usize {
        self.pending.len()
    }

    /// Removes the notices queued since `mark`.
    pub(crate) fn hold_from(&mut self, mark: usize) -> Vec<Notice> {
        self.pending.split_off(mark.min(self.pending.len()))
    }

    /// Queues notices previously held back, after anything already queued.
    pub(crate) fn release(&mut self, held: Vec<Notice>) {
        self.pending.extend(held);
    }

    pub(crate) fn drain_into(&mut self, sink: &mut dyn ErrorSink) {
        for notice in self.pending.drain(..) {
            sink.report(notice);
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }
}

//! Tag balancer: turns a token stream into a properly nested event stream.
//!
//! Every malformed construct maps to one recovery action:
//! - a start tag force-closes open elements its rule lists in `closes`
//!   (checked against the current element, repeatedly);
//! - a start tag with no valid parent open gets its missing ancestors
//!   synthesized, outermost first, when ancestor synthesis is enabled;
//! - an end tag closes everything opened after its match; with no match it
//!   is discarded;
//! - end of input closes everything still open, innermost first.
//!
//! Synthesized events carry the sentinel span and `synthesized = true`.
//! Recovery actions raise notices; they never fail the parse. The only
//! errors are those returned by the downstream handler.

mod stack;

use crate::attributes::{Attributes, QName};
use crate::config::ParserConfig;
use crate::event::{Event, EventKind};
use crate::location::LocationSpan;
use crate::notices::{ErrorSink, NoticeKind, NoticeLog};
use crate::pipeline::{EventHandler, PipelineError};
use crate::rules::{self, ElementRule, ParentScope};
use crate::scanner::{Token, TokenKind, is_html_whitespace};

use stack::{OpenElement, OpenElementsStack};

const HTML: &str = "html";
const HEAD: &str = "head";
const BODY: &str = "body";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Running,
    Finished,
}

/// Which document-structure elements have been opened so far.
#[derive(Clone, Copy, Debug, Default)]
struct Structure {
    html: bool,
    head: bool,
    body: bool,
}

impl Structure {
    fn seen(&self, key: &str) -> Option<bool> {
        match key {
            HTML => Some(self.html),
            HEAD => Some(self.head),
            BODY => Some(self.body),
            _ => None,
        }
    }

    fn mark(&mut self, key: &str) {
        match key {
            HTML => self.html = true,
            HEAD => self.head = true,
            BODY => self.body = true,
            _ => {}
        }
    }
}

struct PendingText {
    text: String,
    span: LocationSpan,
}

pub struct TagBalancer<'c> {
    config: &'c ParserConfig,
    stack: OpenElementsStack,
    pending: Option<PendingText>,
    structure: Structure,
    phase: Phase,
    notices: NoticeLog,
    events: u64,
}

impl<'c> TagBalancer<'c> {
    pub fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            stack: OpenElementsStack::new(),
            pending: None,
            structure: Structure::default(),
            phase: Phase::NotStarted,
            notices: NoticeLog::new(config.report_errors),
            events: 0,
        }
    }

    pub fn events_emitted(&self) -> u64 {
        self.events
    }

    pub fn notices_raised(&self) -> u64 {
        self.notices.total()
    }

    /// Open elements, excluding the document entry.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn max_depth(&self) -> usize {
        self.stack.max_depth()
    }

    /// Name and attributes of the innermost open element.
    pub fn current_element(&self) -> Option<(&QName, &Attributes)> {
        self.stack
            .top()
            .filter(|e| !e.is_document())
            .map(|e| (&e.name, &e.attributes))
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub(crate) fn drain_notices(&mut self, sink: &mut dyn ErrorSink) {
        self.notices.drain_into(sink);
    }

    fn emit(&mut self, event: Event, handler: &mut dyn EventHandler) -> Result<(), PipelineError> {
        self.events += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "tagsoup.balancer", "{event}");
        handler.handle(event)
    }

    fn notice(&mut self, kind: NoticeKind, span: LocationSpan, names: Vec<String>) {
        self.notices.push(kind, span, names);
    }

    /// Emits `DocumentStart`. Called implicitly by the first token.
    pub fn start(&mut self, handler: &mut dyn EventHandler) -> Result<(), PipelineError> {
        if self.phase != Phase::NotStarted {
            return Ok(());
        }
        self.phase = Phase::Running;
        self.emit(Event::synthesized(EventKind::DocumentStart), handler)
    }

    pub fn push_token(
        &mut self,
        token: Token,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        match self.phase {
            Phase::NotStarted => self.start(handler)?,
            Phase::Running => {}
            Phase::Finished => {
                log::warn!(target: "tagsoup.balancer", "token after end of document ignored: {token}");
                return Ok(());
            }
        }
        let span = token.span;
        match token.kind {
            TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing, span, handler),
            TokenKind::EndTag { name } => self.end_tag(name, span, handler),
            TokenKind::Text(text) => self.text(text, span, handler),
            TokenKind::RawText(text) => {
                self.buffer_text(&text, span);
                Ok(())
            }
            TokenKind::Comment(text) => {
                self.flush_text(handler)?;
                self.emit(Event::real(EventKind::Comment(text), span), handler)
            }
            TokenKind::DocType {
                root,
                public_id,
                system_id,
            } => {
                self.flush_text(handler)?;
                let kind = EventKind::DocTypeDecl {
                    root,
                    public_id,
                    system_id,
                };
                self.emit(Event::real(kind, span), handler)
            }
        }
    }

    /// Closes everything still open and emits `DocumentEnd`.
    pub fn finish(&mut self, handler: &mut dyn EventHandler) -> Result<(), PipelineError> {
        match self.phase {
            Phase::NotStarted => self.start(handler)?,
            Phase::Running => {}
            Phase::Finished => return Ok(()),
        }
        self.flush_text(handler)?;
        while let Some(element) = self.stack.pop() {
            if element.is_document() {
                continue;
            }
            let structural = matches!(element.key.as_str(), HTML | HEAD | BODY);
            if !structural && !element.synthesized {
                self.notice(
                    NoticeKind::ClosedAtEndOfInput,
                    LocationSpan::SYNTHESIZED,
                    vec![element.name.as_str().to_string()],
                );
            }
            self.emit_synthesized_end(element, handler)?;
        }
        self.phase = Phase::Finished;
        self.emit(Event::synthesized(EventKind::DocumentEnd), handler)
    }

    /// Delivers buffered text without closing the document, for a parse
    /// abandoned on an input failure.
    pub fn abort(&mut self, handler: &mut dyn EventHandler) -> Result<(), PipelineError> {
        let flushed = self.flush_text(handler);
        self.phase = Phase::Finished;
        flushed
    }

    fn buffer_text(&mut self, text: &str, span: LocationSpan) {
        match &mut self.pending {
            Some(pending) => {
                pending.text.push_str(text);
                pending.span = pending.span.cover(span);
            }
            None => {
                self.pending = Some(PendingText {
                    text: text.to_string(),
                    span,
                });
            }
        }
    }

    fn flush_text(&mut self, handler: &mut dyn EventHandler) -> Result<(), PipelineError> {
        match self.pending.take() {
            Some(PendingText { text, span }) if !text.is_empty() => {
                self.emit(Event::real(EventKind::Characters(text), span), handler)
            }
            _ => Ok(()),
        }
    }

    fn text(
        &mut self,
        text: String,
        span: LocationSpan,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        if self.needs_body_for_text(&text) {
            self.flush_text(handler)?;
            if self.stack.top_key() == Some(HEAD) {
                self.auto_close_top(BODY, span, handler)?;
            }
            self.synthesize_ancestors(rules::lookup(BODY), BODY, span, handler)?;
            self.notice(
                NoticeKind::AncestorSynthesized,
                span,
                vec![BODY.to_string(), "#text".to_string()],
            );
            self.push_synthesized(BODY, handler)?;
        }
        self.buffer_text(&text, span);
        Ok(())
    }

    /// Non-whitespace character data at document level belongs in `body`.
    fn needs_body_for_text(&self, text: &str) -> bool {
        self.config.synthesize_ancestors
            && !self.config.document_fragment
            && !self.structure.body
            && (self.stack.top_is_document() || matches!(self.stack.top_key(), Some(HTML | HEAD)))
            && text.chars().any(|ch| !is_html_whitespace(ch))
    }

    fn start_tag(
        &mut self,
        name: QName,
        attributes: Attributes,
        self_closing: bool,
        span: LocationSpan,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        let key = name.as_str().to_ascii_lowercase();
        let rule = rules::lookup(&key);

        // Ignored tags leave the surrounding text run intact.
        if self.is_duplicate_structure(&key) {
            self.notice(NoticeKind::IgnoredStartTag, span, vec![name.as_str().to_string()]);
            return Ok(());
        }
        self.flush_text(handler)?;

        while let Some(top) = self.stack.top() {
            if top.is_document() || !rule.closes_on_open(&top.key) {
                break;
            }
            self.auto_close_top(&key, span, handler)?;
        }

        if self.config.synthesize_ancestors {
            self.synthesize_ancestors(rule, &key, span, handler)?;
        }

        self.structure.mark(&key);
        let element = OpenElement::new(name.clone(), attributes.clone(), false);
        self.stack.push(element);
        self.emit(
            Event::real(EventKind::ElementStart { name, attributes }, span),
            handler,
        )?;

        if rule.is_void() || self_closing {
            if let Some(element) = self.stack.pop() {
                self.emit(Event::real(EventKind::ElementEnd { name: element.name }, span), handler)?;
            }
        }
        Ok(())
    }

    /// `html`, `head` and `body` open at most once; `head` never after `body`.
    fn is_duplicate_structure(&self, key: &str) -> bool {
        match self.structure.seen(key) {
            Some(seen) => seen || (key == HEAD && self.structure.body),
            None => false,
        }
    }

    fn auto_close_top(
        &mut self,
        opener: &str,
        span: LocationSpan,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        if let Some(element) = self.stack.pop() {
            self.notice(
                NoticeKind::AutoClosed,
                span,
                vec![element.name.as_str().to_string(), opener.to_string()],
            );
            self.emit_synthesized_end(element, handler)?;
        }
        Ok(())
    }

    fn emit_synthesized_end(
        &mut self,
        element: OpenElement,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        self.emit(
            Event::synthesized(EventKind::ElementEnd { name: element.name }),
            handler,
        )
    }

    fn has_valid_parent(&self, rule: &ElementRule) -> bool {
        if rule.accepts_any_parent() {
            return true;
        }
        match rule.scope {
            ParentScope::Direct => self.stack.top_key().is_some_and(|top| rule.is_valid_parent(top)),
            ParentScope::Anywhere => self.stack.contains_any(rule.parents),
        }
    }

    /// Whether `key` may be synthesized as an implied ancestor.
    fn may_synthesize(&self, key: &str) -> bool {
        match self.structure.seen(key) {
            Some(seen) => !seen && !self.config.document_fragment,
            None => true,
        }
    }

    /// Pushes the ancestors `rule` needs, outermost first.
    fn synthesize_ancestors(
        &mut self,
        rule: &ElementRule,
        key: &str,
        span: LocationSpan,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        let mut chain: Vec<&'static str> = Vec::new();
        let mut current = rule;
        while !self.has_valid_parent(current) {
            let Some(parent) = current.preferred_parent() else {
                break;
            };
            if !self.may_synthesize(parent) || chain.contains(&parent) || parent == key {
                break;
            }
            chain.push(parent);
            current = rules::lookup(parent);
        }

        for parent in chain.into_iter().rev() {
            self.notice(
                NoticeKind::AncestorSynthesized,
                span,
                vec![parent.to_string(), key.to_string()],
            );
            self.push_synthesized(parent, handler)?;
        }
        Ok(())
    }

    fn push_synthesized(
        &mut self,
        key: &str,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        let name = QName::new(self.config.element_case.apply(key));
        self.structure.mark(key);
        self.stack
            .push(OpenElement::new(name.clone(), Attributes::new(), true));
        self.emit(
            Event::synthesized(EventKind::ElementStart {
                name,
                attributes: Attributes::new(),
            }),
            handler,
        )
    }

    fn end_tag(
        &mut self,
        name: QName,
        span: LocationSpan,
        handler: &mut dyn EventHandler,
    ) -> Result<(), PipelineError> {
        self.flush_text(handler)?;
        let key = name.as_str().to_ascii_lowercase();

        let Some(index) = self.stack.find_from_top(&key) else {
            self.notice(NoticeKind::StrayEndTag, span, vec![name.as_str().to_string()]);
            return Ok(());
        };
        if self.config.ignore_root_end_tags && matches!(key.as_str(), HTML | BODY) {
            self.notice(NoticeKind::IgnoredEndTag, span, vec![name.as_str().to_string()]);
            return Ok(());
        }

        let above = self.stack.above(index);
        if above > 0 {
            let closed: Vec<OpenElement> = (0..above).filter_map(|_| self.stack.pop()).collect();
            let mut names = vec![name.as_str().to_string()];
            names.extend(closed.iter().map(|e| e.name.as_str().to_string()));
            self.notice(NoticeKind::MisnestedEndTag, span, names);
            for element in closed {
                self.emit_synthesized_end(element, handler)?;
            }
        }
        if let Some(element) = self.stack.pop() {
            self.emit(Event::real(EventKind::ElementEnd { name: element.name }, span), handler)?;
        }
        Ok(())
    }
}

//! Lenient, pull-based HTML scanner.
//!
//! Contract:
//! - `next_token` yields a finite, ordered sequence of tokens and then
//!   `Ok(None)`. Once an I/O error has been returned, the scanner is done.
//! - Consecutive character data is delivered as one `Text` token; a bare `<`
//!   or an unterminated tag at end of input is folded into the surrounding
//!   text rather than splitting it.
//! - After a start tag for a raw-text element (see
//!   [`ParserConfig::raw_text_elements`]) everything up to the literal
//!   `</name` + optional whitespace + `>` is one `RawText` token.
//! - Malformed markup never fails the scan; it degrades to text or to a
//!   best-effort token and raises a notice.
//! - Spans cover the source characters of the token, including any character
//!   references that were decoded in its payload.

mod cursor;
mod token;

pub use cursor::Cursor;
pub use token::{Token, TokenKind};

use std::borrow::Cow;
use std::io;

use crate::attributes::{Attributes, DEFAULT_ATTRIBUTE_TYPE, QName};
use crate::config::ParserConfig;
use crate::entities::decode_entities;
use crate::location::{Location, LocationSpan};
use crate::notices::{ErrorSink, Notice, NoticeKind, NoticeLog};
use crate::rules::{self, ContentKind};
use crate::source::CharSource;

pub(crate) use cursor::is_html_whitespace;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const DOCTYPE_OPEN: &str = "<!doctype";

pub struct Scanner<'c, S> {
    cursor: Cursor<S>,
    config: &'c ParserConfig,
    /// Lower-cased name of the raw-text element whose body comes next.
    raw_text_end: Option<String>,
    /// Token scanned ahead while merging text.
    stash: Option<Token>,
    /// Notices raised while scanning `stash`, released with it.
    stash_notices: Vec<Notice>,
    /// I/O failure hit while merging text; returned on the next call.
    deferred_error: Option<io::Error>,
    done: bool,
    notices: NoticeLog,
    tokens: u64,
}

impl<'c, S: CharSource> Scanner<'c, S> {
    pub fn new(source: S, config: &'c ParserConfig) -> Self {
        Self {
            cursor: Cursor::new(source),
            config,
            raw_text_end: None,
            stash: None,
            stash_notices: Vec::new(),
            deferred_error: None,
            done: false,
            notices: NoticeLog::new(config.report_errors),
            tokens: 0,
        }
    }

    /// Location of the next unread character.
    pub fn location(&self) -> Location {
        self.cursor.location()
    }

    pub fn tokens_scanned(&self) -> u64 {
        self.tokens
    }

    pub fn notices_raised(&self) -> u64 {
        self.notices.total()
    }

    pub(crate) fn drain_notices(&mut self, sink: &mut dyn ErrorSink) {
        self.notices.drain_into(sink);
    }

    /// Releases the underlying source.
    pub fn into_source(self) -> S {
        self.cursor.into_source()
    }

    pub fn next_token(&mut self) -> io::Result<Option<Token>> {
        if let Some(err) = self.deferred_error.take() {
            self.done = true;
            return Err(err);
        }
        if self.done {
            return Ok(None);
        }
        let next = match self.stash.take() {
            Some(token) => {
                let held = std::mem::take(&mut self.stash_notices);
                self.notices.release(held);
                Some(token)
            }
            None => self.scan_token().inspect_err(|_| self.done = true)?,
        };
        let Some(mut token) = next else {
            self.done = true;
            return Ok(None);
        };

        if let TokenKind::Text(text) = &mut token.kind {
            while self.deferred_error.is_none() {
                let mark = self.notices.mark();
                match self.scan_token() {
                    Ok(Some(Token {
                        kind: TokenKind::Text(more),
                        span,
                    })) => {
                        text.push_str(&more);
                        token.span = token.span.cover(span);
                    }
                    Ok(other) => {
                        // The lookahead's notices surface with it, not
                        // ahead of this text.
                        if other.is_some() {
                            self.stash_notices = self.notices.hold_from(mark);
                        }
                        self.stash = other;
                        break;
                    }
                    Err(err) => {
                        self.deferred_error = Some(err);
                        break;
                    }
                }
            }
        }

        self.tokens += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "tagsoup.scanner", "[{}] {}", token.span, token);
        Ok(Some(token))
    }

    fn span_from(&self, begin: Location) -> LocationSpan {
        LocationSpan::new(begin, self.cursor.location())
    }

    fn notice(&mut self, kind: NoticeKind, span: LocationSpan, names: Vec<String>) {
        self.notices.push(kind, span, names);
    }

    /// Consumes one char, recording it in `raw`.
    fn take(&mut self, raw: &mut String) -> io::Result<Option<char>> {
        let next = self.cursor.bump()?;
        if let Some(ch) = next {
            raw.push(ch);
        }
        Ok(next)
    }

    fn skip_whitespace_into(&mut self, raw: &mut String) -> io::Result<()> {
        while matches!(self.cursor.peek()?, Some(ch) if is_html_whitespace(ch)) {
            self.take(raw)?;
        }
        Ok(())
    }

    fn starts_markup(&mut self) -> io::Result<bool> {
        if self.cursor.peek()? != Some('<') {
            return Ok(false);
        }
        Ok(match self.cursor.peek_nth(1)? {
            Some(ch) if ch.is_ascii_alphabetic() => true,
            Some('/') => matches!(self.cursor.peek_nth(2)?, Some(ch) if ch.is_ascii_alphabetic()),
            Some('!' | '?') => true,
            _ => false,
        })
    }

    fn scan_token(&mut self) -> io::Result<Option<Token>> {
        if let Some(name) = self.raw_text_end.take() {
            if let Some(token) = self.scan_raw_text(&name)? {
                return Ok(Some(token));
            }
        }
        let begin = self.cursor.location();
        if self.cursor.is_at_end()? {
            return Ok(None);
        }
        if self.starts_markup()? {
            return self.scan_markup(begin).map(Some);
        }
        self.scan_text(begin).map(Some)
    }

    fn scan_text(&mut self, begin: Location) -> io::Result<Token> {
        let mut raw = String::new();
        if let Err(err) = self.read_text(&mut raw) {
            if raw.is_empty() {
                return Err(err);
            }
            // Deliver what was read; the failure surfaces on the next call.
            self.deferred_error = Some(err);
        }
        Ok(Token::new(
            TokenKind::Text(decode_owned(raw)),
            self.span_from(begin),
        ))
    }

    fn read_text(&mut self, raw: &mut String) -> io::Result<()> {
        while let Some(ch) = self.cursor.peek()? {
            if ch == '<' {
                if self.starts_markup()? {
                    break;
                }
                let at = self.cursor.location();
                self.cursor.bump()?;
                self.notice(NoticeKind::BareLessThan, self.span_from(at), Vec::new());
            } else {
                self.cursor.bump()?;
            }
            raw.push(ch);
        }
        Ok(())
    }

    fn scan_markup(&mut self, begin: Location) -> io::Result<Token> {
        match self.cursor.peek_nth(1)? {
            Some('/') => self.scan_end_tag(begin),
            Some('!') => {
                if self.cursor.eat_ignore_case(COMMENT_OPEN)? {
                    self.scan_comment(begin)
                } else if self.cursor.eat_ignore_case(CDATA_OPEN)? {
                    self.scan_cdata(begin)
                } else if self.cursor.eat_ignore_case(DOCTYPE_OPEN)? {
                    self.scan_doctype(begin)
                } else {
                    self.scan_bogus_comment(begin)
                }
            }
            Some('?') => self.scan_bogus_comment(begin),
            _ => self.scan_start_tag(begin),
        }
    }

    /// Reads a tag or attribute name; the first char is always taken.
    fn read_name(&mut self, raw: &mut String, stop_at_equals: bool) -> io::Result<String> {
        let mut name = String::new();
        if let Some(first) = self.take(raw)? {
            name.push(first);
        }
        while let Some(ch) = self.cursor.peek()? {
            if is_html_whitespace(ch)
                || matches!(ch, '/' | '>' | '<')
                || (stop_at_equals && ch == '=')
            {
                break;
            }
            self.take(raw)?;
            name.push(ch);
        }
        Ok(name)
    }

    /// Literal fallback for a tag cut off by the end of input.
    fn unterminated_tag(&mut self, begin: Location, raw: String) -> Token {
        let span = self.span_from(begin);
        self.notice(NoticeKind::UnterminatedTag, span, Vec::new());
        Token::new(TokenKind::Text(decode_owned(raw)), span)
    }

    fn scan_start_tag(&mut self, begin: Location) -> io::Result<Token> {
        let mut raw = String::new();
        self.take(&mut raw)?;
        let written = self.read_name(&mut raw, false)?;
        let name = self.config.element_case.apply(&written);
        let mut attributes = Attributes::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace_into(&mut raw)?;
            match self.cursor.peek()? {
                None => return Ok(self.unterminated_tag(begin, raw)),
                Some('>') => {
                    self.take(&mut raw)?;
                    break;
                }
                Some('/') => {
                    self.take(&mut raw)?;
                    if self.cursor.peek()? == Some('>') {
                        self.take(&mut raw)?;
                        self_closing = true;
                        break;
                    }
                }
                Some('<') => {
                    let span = self.span_from(begin);
                    self.notice(NoticeKind::UnterminatedTag, span, vec![name.clone()]);
                    break;
                }
                Some(_) => {
                    if !self.scan_attribute(&mut raw, &mut attributes)? {
                        return Ok(self.unterminated_tag(begin, raw));
                    }
                }
            }
        }

        if !self_closing && self.config.is_raw_text(&written) {
            self.raw_text_end = Some(written.to_ascii_lowercase());
        }
        Ok(Token::new(
            TokenKind::StartTag {
                name: QName::new(name),
                attributes,
                self_closing,
            },
            self.span_from(begin),
        ))
    }

    /// Scans one attribute. Returns `false` if input ended inside a quoted
    /// value.
    fn scan_attribute(&mut self, raw: &mut String, attributes: &mut Attributes) -> io::Result<bool> {
        let begin = self.cursor.location();
        let written = self.read_name(raw, true)?;
        let name = self.config.attribute_case.apply(&written);
        self.skip_whitespace_into(raw)?;

        let mut value = String::new();
        if self.cursor.peek()? == Some('=') {
            self.take(raw)?;
            self.skip_whitespace_into(raw)?;
            match self.cursor.peek()? {
                Some(quote @ ('"' | '\'')) => {
                    self.take(raw)?;
                    loop {
                        match self.take(raw)? {
                            None => return Ok(false),
                            Some(ch) if ch == quote => break,
                            Some(ch) => value.push(ch),
                        }
                    }
                }
                _ => {
                    while let Some(ch) = self.cursor.peek()? {
                        if is_html_whitespace(ch) || ch == '>' {
                            break;
                        }
                        self.take(raw)?;
                        value.push(ch);
                    }
                }
            }
        }

        if attributes.index_of(&name).is_some() {
            let span = self.span_from(begin);
            self.notice(NoticeKind::DuplicateAttribute, span, vec![name]);
        } else {
            attributes.add(QName::new(name), DEFAULT_ATTRIBUTE_TYPE, decode_owned(value));
        }
        Ok(true)
    }

    fn scan_end_tag(&mut self, begin: Location) -> io::Result<Token> {
        let mut raw = String::new();
        self.take(&mut raw)?;
        self.take(&mut raw)?;
        let written = self.read_name(&mut raw, false)?;
        loop {
            match self.cursor.peek()? {
                None => return Ok(self.unterminated_tag(begin, raw)),
                Some('>') => {
                    self.take(&mut raw)?;
                    break;
                }
                Some('<') => {
                    let span = self.span_from(begin);
                    self.notice(NoticeKind::UnterminatedTag, span, vec![written.clone()]);
                    break;
                }
                Some(_) => {
                    self.take(&mut raw)?;
                }
            }
        }
        let name = self.config.element_case.apply(&written);
        Ok(Token::new(
            TokenKind::EndTag {
                name: QName::new(name),
            },
            self.span_from(begin),
        ))
    }

    /// Collects chars up to `close` (consumed, not included).
    ///
    /// Returns `false` when input ended first.
    fn read_until(&mut self, close: &str, body: &mut String) -> io::Result<bool> {
        loop {
            if self.cursor.eat_ignore_case(close)? {
                return Ok(true);
            }
            match self.cursor.bump()? {
                Some(ch) => body.push(ch),
                None => return Ok(false),
            }
        }
    }

    fn scan_comment(&mut self, begin: Location) -> io::Result<Token> {
        let mut body = String::new();
        // `<!-->` and `<!--->` are empty comments.
        let closed = self.cursor.eat_ignore_case(">")?
            || self.cursor.eat_ignore_case("->")?
            || self.read_until(COMMENT_CLOSE, &mut body)?;
        let span = self.span_from(begin);
        if !closed {
            self.notice(NoticeKind::UnterminatedComment, span, Vec::new());
        }
        Ok(Token::new(TokenKind::Comment(body), span))
    }

    fn scan_cdata(&mut self, begin: Location) -> io::Result<Token> {
        let mut body = String::new();
        let closed = self.read_until(CDATA_CLOSE, &mut body)?;
        let span = self.span_from(begin);
        if !closed {
            self.notice(NoticeKind::UnterminatedComment, span, Vec::new());
        }
        let kind = if self.config.cdata_sections {
            TokenKind::Text(body)
        } else {
            TokenKind::Comment(format!("[CDATA[{body}]]"))
        };
        Ok(Token::new(kind, span))
    }

    fn scan_bogus_comment(&mut self, begin: Location) -> io::Result<Token> {
        self.cursor.bump()?;
        if self.cursor.peek()? == Some('!') {
            self.cursor.bump()?;
        }
        let mut body = String::new();
        let closed = self.read_until(">", &mut body)?;
        let span = self.span_from(begin);
        if !closed {
            self.notice(NoticeKind::UnterminatedComment, span, Vec::new());
        }
        Ok(Token::new(TokenKind::Comment(body), span))
    }

    fn read_quoted(&mut self) -> io::Result<Option<String>> {
        let Some(quote @ ('"' | '\'')) = self.cursor.peek()? else {
            return Ok(None);
        };
        self.cursor.bump()?;
        let mut value = String::new();
        while let Some(ch) = self.cursor.peek()? {
            if ch == '>' {
                break;
            }
            self.cursor.bump()?;
            if ch == quote {
                break;
            }
            value.push(ch);
        }
        Ok(Some(value))
    }

    fn scan_doctype(&mut self, begin: Location) -> io::Result<Token> {
        self.cursor.skip_whitespace()?;
        let mut root = String::new();
        while let Some(ch) = self.cursor.peek()? {
            if is_html_whitespace(ch) || ch == '>' {
                break;
            }
            self.cursor.bump()?;
            root.push(ch);
        }
        self.cursor.skip_whitespace()?;

        let mut public_id = None;
        let mut system_id = None;
        if self.cursor.eat_ignore_case("public")? {
            self.cursor.skip_whitespace()?;
            public_id = self.read_quoted()?;
            self.cursor.skip_whitespace()?;
            system_id = self.read_quoted()?;
        } else if self.cursor.eat_ignore_case("system")? {
            self.cursor.skip_whitespace()?;
            system_id = self.read_quoted()?;
        }

        let closed = self.read_until(">", &mut String::new())?;
        let span = self.span_from(begin);
        if !closed {
            self.notice(NoticeKind::UnterminatedTag, span, vec![root.clone()]);
        }
        Ok(Token::new(
            TokenKind::DocType {
                root,
                public_id,
                system_id,
            },
            span,
        ))
    }

    fn at_raw_text_close(&mut self, close: &str) -> io::Result<bool> {
        if !self.cursor.at_ignore_case(close)? {
            return Ok(false);
        }
        let mut i = close.chars().count();
        loop {
            match self.cursor.peek_nth(i)? {
                Some('>') => return Ok(true),
                Some(ch) if is_html_whitespace(ch) => i += 1,
                _ => return Ok(false),
            }
        }
    }

    /// Scans a raw-text body up to (not including) its close tag.
    ///
    /// Returns `None` for an empty body.
    fn scan_raw_text(&mut self, name: &str) -> io::Result<Option<Token>> {
        let begin = self.cursor.location();
        let close = format!("</{name}");
        let mut body = String::new();
        loop {
            match self.cursor.peek()? {
                None => {
                    let span = self.span_from(begin);
                    self.notice(NoticeKind::UnterminatedRawText, span, vec![name.to_string()]);
                    break;
                }
                Some('<') if self.at_raw_text_close(&close)? => break,
                Some(ch) => {
                    self.cursor.bump()?;
                    body.push(ch);
                }
            }
        }
        if body.is_empty() {
            return Ok(None);
        }
        let text = match rules::lookup(name).content {
            ContentKind::EscapableRawText => decode_owned(body),
            ContentKind::RawText | ContentKind::Normal => body,
        };
        Ok(Some(Token::new(TokenKind::RawText(text), self.span_from(begin))))
    }
}

impl<S: CharSource> Iterator for Scanner<'_, S> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

fn decode_owned(raw: String) -> String {
    match decode_entities(&raw) {
        Cow::Owned(decoded) => decoded,
        Cow::Borrowed(_) => raw,
    }
}

//! Lookahead cursor over a [`CharSource`].

use std::collections::VecDeque;
use std::io;

use crate::location::{Location, LocationTracker};
use crate::source::CharSource;

/// Bounded-lookahead reader that tracks the location of the next character.
///
/// Lookahead is filled on demand; the scanner never peeks further than the
/// longest fixed markup prefix (`<![CDATA[`) or a raw-text close tag.
pub struct Cursor<S> {
    source: S,
    lookahead: VecDeque<char>,
    tracker: LocationTracker,
    exhausted: bool,
}

impl<S: CharSource> Cursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            lookahead: VecDeque::new(),
            tracker: LocationTracker::new(),
            exhausted: false,
        }
    }

    /// Location of the next unread character.
    pub fn location(&self) -> Location {
        self.tracker.location()
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn fill(&mut self, wanted: usize) -> io::Result<()> {
        while self.lookahead.len() < wanted && !self.exhausted {
            match self.source.next_char()? {
                Some(ch) => self.lookahead.push_back(ch),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    pub fn peek_nth(&mut self, n: usize) -> io::Result<Option<char>> {
        self.fill(n + 1)?;
        Ok(self.lookahead.get(n).copied())
    }

    pub fn peek(&mut self) -> io::Result<Option<char>> {
        self.peek_nth(0)
    }

    pub fn is_at_end(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }

    pub fn bump(&mut self) -> io::Result<Option<char>> {
        self.fill(1)?;
        let next = self.lookahead.pop_front();
        if let Some(ch) = next {
            self.tracker.advance(ch);
        }
        Ok(next)
    }

    /// Whether the upcoming characters match `prefix`, ASCII case-insensitively.
    pub fn at_ignore_case(&mut self, prefix: &str) -> io::Result<bool> {
        for (i, expected) in prefix.chars().enumerate() {
            match self.peek_nth(i)? {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Consumes `prefix` if it comes next; see [`Cursor::at_ignore_case`].
    pub fn eat_ignore_case(&mut self, prefix: &str) -> io::Result<bool> {
        if !self.at_ignore_case(prefix)? {
            return Ok(false);
        }
        for _ in prefix.chars() {
            self.bump()?;
        }
        Ok(true)
    }

    pub fn skip_whitespace(&mut self) -> io::Result<()> {
        while matches!(self.peek()?, Some(ch) if is_html_whitespace(ch)) {
            self.bump()?;
        }
        Ok(())
    }
}

pub(crate) fn is_html_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

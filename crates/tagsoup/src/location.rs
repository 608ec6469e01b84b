//! Source locations attached to tokens and events.
//!
//! Real locations are 1-based line/column pairs plus a 0-based character
//! offset. Items with no source representation carry [`Location::SYNTHESIZED`]
//! (every field `-1`) instead of an `Option`, so consumers never have to
//! distinguish "missing" from "synthesized".

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: i64,
    pub column: i64,
    pub offset: i64,
}

impl Location {
    pub const SYNTHESIZED: Location = Location {
        line: -1,
        column: -1,
        offset: -1,
    };

    /// Location of the first character of a document.
    pub const START: Location = Location {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: i64, column: i64, offset: i64) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    pub fn is_synthesized(self) -> bool {
        self == Self::SYNTHESIZED
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthesized() {
            return f.write_str("synthesized");
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Begin/end pair. `end` is the location one past the last character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocationSpan {
    pub begin: Location,
    pub end: Location,
}

impl LocationSpan {
    pub const SYNTHESIZED: LocationSpan = LocationSpan {
        begin: Location::SYNTHESIZED,
        end: Location::SYNTHESIZED,
    };

    pub fn new(begin: Location, end: Location) -> Self {
        debug_assert!(
            begin.is_synthesized() || begin.offset <= end.offset,
            "span begin must not follow its end"
        );
        Self { begin, end }
    }

    pub fn is_synthesized(self) -> bool {
        self.begin.is_synthesized() && self.end.is_synthesized()
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: LocationSpan) -> LocationSpan {
        if self.is_synthesized() {
            return other;
        }
        if other.is_synthesized() {
            return self;
        }
        let begin = if other.begin.offset < self.begin.offset {
            other.begin
        } else {
            self.begin
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        LocationSpan { begin, end }
    }

    /// Number of source characters covered, `0` for synthesized spans.
    pub fn char_len(self) -> usize {
        if self.is_synthesized() {
            return 0;
        }
        usize::try_from(self.end.offset - self.begin.offset).unwrap_or(0)
    }
}

impl fmt::Display for LocationSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthesized() {
            return f.write_str("synthesized");
        }
        write!(f, "{}-{}", self.begin, self.end)
    }
}

/// Tracks the location of the next character to be read.
///
/// `\n`, `\r\n` and a lone `\r` each count as one line break.
#[derive(Clone, Debug, Default)]
pub struct LocationTracker {
    current: Location,
    after_cr: bool,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> Location {
        self.current
    }

    pub fn advance(&mut self, ch: char) {
        self.current.offset += 1;
        match ch {
            '\n' if self.after_cr => {
                // Second half of a CRLF pair; the line already advanced.
                self.after_cr = false;
            }
            '\n' | '\r' => {
                self.current.line += 1;
                self.current.column = 1;
                self.after_cr = ch == '\r';
            }
            _ => {
                self.current.column += 1;
                self.after_cr = false;
            }
        }
    }

    pub fn advance_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(text: &str) -> Location {
        let mut tracker = LocationTracker::new();
        tracker.advance_str(text);
        tracker.location()
    }

    #[test]
    fn tracks_columns_on_a_single_line() {
        assert_eq!(track(""), Location::new(1, 1, 0));
        assert_eq!(track("abc"), Location::new(1, 4, 3));
    }

    #[test]
    fn counts_every_line_break_style_once() {
        assert_eq!(track("a\nb"), Location::new(2, 2, 3));
        assert_eq!(track("a\r\nb"), Location::new(2, 2, 4));
        assert_eq!(track("a\rb"), Location::new(2, 2, 3));
        assert_eq!(track("\r\r\n\n"), Location::new(4, 1, 4));
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        assert_eq!(track("café"), Location::new(1, 5, 4));
        assert_eq!(track("😊x"), Location::new(1, 3, 2));
    }

    #[test]
    fn synthesized_span_is_all_minus_one() {
        let span = LocationSpan::SYNTHESIZED;
        assert!(span.is_synthesized());
        assert_eq!(span.begin, Location::new(-1, -1, -1));
        assert_eq!(span.end, Location::new(-1, -1, -1));
        assert_eq!(span.char_len(), 0);
        assert_eq!(span.to_string(), "synthesized");
    }

    #[test]
    fn cover_ignores_synthesized_side() {
        let real = LocationSpan::new(Location::new(1, 1, 0), Location::new(1, 3, 2));
        let later = LocationSpan::new(Location::new(1, 5, 4), Location::new(2, 1, 7));
        assert_eq!(real.cover(LocationSpan::SYNTHESIZED), real);
        assert_eq!(LocationSpan::SYNTHESIZED.cover(real), real);
        let both = real.cover(later);
        assert_eq!(both.begin, real.begin);
        assert_eq!(both.end, later.end);
        assert_eq!(both.char_len(), 7);
    }
}

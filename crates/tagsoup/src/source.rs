//! Character sources feeding the scanner.
//!
//! Input is pre-decoded text. `ReaderSource` only performs the UTF-8 step
//! needed to turn an `io::Read` into characters; charset sniffing belongs to
//! the caller.

use std::collections::VecDeque;
use std::io::{self, Read};

/// Pull-style character stream.
///
/// `Ok(None)` marks the end of input. An `Err` is an unrecoverable input
/// failure; the scanner stops at the first one.
pub trait CharSource {
    fn next_char(&mut self) -> io::Result<Option<char>>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        (**self).next_char()
    }
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        (**self).next_char()
    }
}

/// In-memory source over a string slice.
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    chars: std::str::Chars<'a>,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
        }
    }
}

impl CharSource for StrSource<'_> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        Ok(self.chars.next())
    }
}

const READ_CHUNK: usize = 8 * 1024;

/// Source over any `io::Read` producing UTF-8 bytes.
///
/// Multi-byte sequences split across reads are carried to the next read;
/// invalid sequences decode to U+FFFD so the scan always makes progress.
/// The reader is owned and released when the source is dropped, whether or
/// not the parse ran to completion.
pub struct ReaderSource<R> {
    reader: R,
    carry: Vec<u8>,
    decoded: VecDeque<char>,
    chunk: Box<[u8]>,
    eof: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, READ_CHUNK)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            carry: Vec::new(),
            decoded: VecDeque::new(),
            chunk: vec![0u8; chunk_size.max(1)].into_boxed_slice(),
            eof: false,
        }
    }

    /// Releases the underlying reader early.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> io::Result<()> {
        while self.decoded.is_empty() && !self.eof {
            let read = match self.reader.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if read == 0 {
                self.eof = true;
                if !self.carry.is_empty() {
                    // Incomplete trailing sequence.
                    self.carry.clear();
                    self.decoded.push_back('\u{FFFD}');
                }
                break;
            }
            let mut bytes = std::mem::take(&mut self.carry);
            bytes.extend_from_slice(&self.chunk[..read]);
            decode_utf8(&bytes, &mut self.decoded, &mut self.carry);
        }
        Ok(())
    }
}

impl<R: Read> CharSource for ReaderSource<R> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.decoded.is_empty() {
            self.fill()?;
        }
        Ok(self.decoded.pop_front())
    }
}

fn decode_utf8(mut bytes: &[u8], out: &mut VecDeque<char>, carry: &mut Vec<u8>) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.extend(text.chars());
                break;
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                if let Ok(valid) = std::str::from_utf8(&bytes[..valid_up_to]) {
                    out.extend(valid.chars());
                }
                match err.error_len() {
                    Some(len) => {
                        out.push_back('\u{FFFD}');
                        bytes = &bytes[valid_up_to + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid_up_to..]);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut source: impl CharSource) -> io::Result<String> {
        let mut out = String::new();
        while let Some(ch) = source.next_char()? {
            out.push(ch);
        }
        Ok(out)
    }

    #[test]
    fn str_source_yields_every_char() {
        assert_eq!(drain(StrSource::new("a<é>")).unwrap(), "a<é>");
    }

    #[test]
    fn reader_source_keeps_split_multibyte_sequences() {
        // One-byte reads force every multi-byte char across a boundary.
        let text = "€ café 😀!";
        let source = ReaderSource::with_chunk_size(text.as_bytes(), 1);
        assert_eq!(drain(source).unwrap(), text);
    }

    #[test]
    fn reader_source_replaces_invalid_bytes() {
        let bytes: &[u8] = &[0xFF, b'f', 0xE2, 0x82];
        let source = ReaderSource::with_chunk_size(bytes, 2);
        assert_eq!(drain(source).unwrap(), "\u{FFFD}f\u{FFFD}");
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("disk gone"));
            }
            self.served = true;
            buf[0] = b'x';
            Ok(1)
        }
    }

    #[test]
    fn reader_source_surfaces_io_errors() {
        let mut source = ReaderSource::new(FailingReader { served: false });
        assert_eq!(source.next_char().unwrap(), Some('x'));
        let err = source.next_char().unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
    }

    #[test]
    fn into_inner_returns_the_reader() {
        let source = ReaderSource::new(io::Cursor::new(b"abc".to_vec()));
        let reader = source.into_inner();
        assert_eq!(reader.into_inner(), b"abc");
    }
}

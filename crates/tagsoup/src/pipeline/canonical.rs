//! Line-oriented canonical form of an event stream.
//!
//! One line per event:
//!
//! ```text
//! !root PUBLIC "p" "s"   doctype (`!root SYSTEM "s"` or bare `!root` when ids are missing)
//! (name                  element start, followed by one `Aname value` per attribute
//! "text                  characters
//! #text                  comment
//! )name                  element end
//! ```
//!
//! An attribute with an empty value prints as `Aname`. Document start and end
//! produce no output. Newlines, tabs, carriage returns and backslashes in
//! payloads are escaped as `\n`, `\t`, `\r`, `\\`.

use std::io::{self, Write};

use super::{EventFilter, EventHandler, PipelineError};
use crate::event::{Event, EventKind};

pub struct CanonicalWriter<W> {
    out: W,
}

impl<W: Write> CanonicalWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        let out = &mut self.out;
        match &event.kind {
            EventKind::DocumentStart => {}
            EventKind::DocumentEnd => out.flush()?,
            EventKind::DocTypeDecl {
                root,
                public_id,
                system_id,
            } => {
                write!(out, "!{root}")?;
                match (public_id, system_id) {
                    (Some(public), Some(system)) => write!(out, " PUBLIC \"{public}\" \"{system}\"")?,
                    (Some(public), None) => write!(out, " PUBLIC \"{public}\"")?,
                    (None, Some(system)) => write!(out, " SYSTEM \"{system}\"")?,
                    (None, None) => {}
                }
                out.write_all(b"\n")?;
            }
            EventKind::ElementStart { name, attributes } => {
                writeln!(out, "({name}")?;
                for attr in attributes {
                    write!(out, "A{}", attr.name)?;
                    if !attr.value.is_empty() {
                        out.write_all(b" ")?;
                        write_escaped(out, &attr.value)?;
                    }
                    out.write_all(b"\n")?;
                }
            }
            EventKind::ElementEnd { name } => writeln!(out, "){name}")?,
            EventKind::Characters(text) => {
                out.write_all(b"\"")?;
                write_escaped(out, text)?;
                out.write_all(b"\n")?;
            }
            EventKind::Comment(text) => {
                out.write_all(b"#")?;
                write_escaped(out, text)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

fn write_escaped(out: &mut impl Write, text: &str) -> io::Result<()> {
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        let escape: &[u8] = match ch {
            '\n' => b"\\n",
            '\t' => b"\\t",
            '\r' => b"\\r",
            '\\' => b"\\\\",
            _ => continue,
        };
        out.write_all(text[start..i].as_bytes())?;
        out.write_all(escape)?;
        start = i + ch.len_utf8();
    }
    out.write_all(text[start..].as_bytes())
}

impl<W: Write> EventHandler for CanonicalWriter<W> {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        self.write_event(&event)?;
        Ok(())
    }
}

/// As a filter the writer records each event and forwards it unchanged.
impl<W: Write> EventFilter for CanonicalWriter<W> {
    fn name(&self) -> &'static str {
        "canonical-writer"
    }

    fn filter(&mut self, event: Event, next: &mut dyn EventHandler) -> Result<(), PipelineError> {
        self.write_event(&event)?;
        next.handle(event)
    }
}

use std::fmt;

use crate::attributes::{Attributes, QName};
use crate::location::LocationSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    StartTag {
        name: QName,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag {
        name: QName,
    },
    /// Decoded character data.
    Text(String),
    /// Body of a raw-text element, verbatim.
    RawText(String),
    Comment(String),
    DocType {
        root: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: LocationSpan,
}

impl Token {
    pub fn new(kind: TokenKind, span: LocationSpan) -> Self {
        Self { kind, span }
    }

    /// Token that has no literal source representation.
    pub fn synthesized(kind: TokenKind) -> Self {
        Self {
            kind,
            span: LocationSpan::SYNTHESIZED,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.span.is_synthesized()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, " {}={:?}", attr.name, attr.value)?;
                }
                f.write_str(if *self_closing { " />" } else { ">" })
            }
            TokenKind::EndTag { name } => write!(f, "</{name}>"),
            TokenKind::Text(text) => write!(f, "text {text:?}"),
            TokenKind::RawText(text) => write!(f, "raw {text:?}"),
            TokenKind::Comment(text) => write!(f, "<!--{text}-->"),
            TokenKind::DocType { root, .. } => write!(f, "<!DOCTYPE {root}>"),
        }
    }
}

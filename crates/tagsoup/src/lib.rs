//! Lenient HTML scanner and tag balancer.
//!
//! Arbitrary, possibly malformed HTML goes in; a properly nested stream of
//! structural [`Event`]s comes out, delivered through a chain of
//! [`EventFilter`]s to an [`EventHandler`].
//!
//! ```
//! use tagsoup::{EventKind, ParserConfig, parse_str};
//!
//! let mut events = Vec::new();
//! parse_str("<p>one<p>two", ParserConfig::default(), &mut events).unwrap();
//! let paragraphs = events
//!     .iter()
//!     .filter(|e| matches!(&e.kind, EventKind::ElementStart { name, .. } if name.as_str() == "p"))
//!     .count();
//! assert_eq!(paragraphs, 2);
//! ```

pub mod attributes;
pub mod balancer;
pub mod config;
pub mod entities;
pub mod event;
pub mod location;
pub mod notices;
pub mod parser;
pub mod perf_fixtures;
pub mod pipeline;
pub mod rules;
pub mod scanner;
pub mod source;

pub use crate::attributes::{Attribute, Attributes, DEFAULT_ATTRIBUTE_TYPE, QName};
pub use crate::balancer::TagBalancer;
pub use crate::config::{ConfigError, NameCase, ParserConfig};
pub use crate::entities::decode_entities;
pub use crate::event::{Augmentations, Event, EventKind};
pub use crate::location::{Location, LocationSpan, LocationTracker};
pub use crate::notices::{ErrorSink, Notice, NoticeKind, VecErrorSink};
pub use crate::parser::{HtmlParser, ParseError, ParseStats, parse_str};
pub use crate::pipeline::{
    CanonicalWriter, EventFilter, EventHandler, FnFilter, NestingCheck, NestingViolation,
    NullHandler, Pipeline, PipelineError, filter_fn,
};
pub use crate::rules::{ContentKind, ElementRule, ParentScope};
pub use crate::scanner::{Scanner, Token, TokenKind};
pub use crate::source::{CharSource, ReaderSource, StrSource};

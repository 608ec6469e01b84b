//! Parser driver: scanner → balancer → pipeline.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::balancer::TagBalancer;
use crate::config::ParserConfig;
use crate::notices::ErrorSink;
use crate::pipeline::{EventHandler, PipelineError};
use crate::scanner::Scanner;
use crate::source::{CharSource, StrSource};

#[derive(Debug, Error)]
pub enum ParseError {
    /// The character source failed; events delivered so far stay valid.
    #[error("input failed")]
    Input(#[source] io::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Counters for one parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub tokens: u64,
    pub events: u64,
    pub notices: u64,
    pub max_depth: usize,
}

impl fmt::Display for ParseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tokens={} events={} notices={} max_depth={}",
            self.tokens, self.events, self.notices, self.max_depth
        )
    }
}

/// Reusable parser. Each call to [`HtmlParser::parse`] runs with its own
/// scanner and balancer; only the configuration and error sink are shared
/// between runs.
pub struct HtmlParser<'s> {
    config: ParserConfig,
    error_sink: Option<Box<dyn ErrorSink + 's>>,
}

impl Default for HtmlParser<'_> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<'s> HtmlParser<'s> {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            error_sink: None,
        }
    }

    /// Routes notices to `sink`. Notices are only produced when
    /// [`ParserConfig::report_errors`] is set.
    pub fn with_error_sink(mut self, sink: impl ErrorSink + 's) -> Self {
        self.error_sink = Some(Box::new(sink));
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse<S, H>(&mut self, source: S, mut handler: H) -> Result<ParseStats, ParseError>
    where
        S: CharSource,
        H: EventHandler,
    {
        let config = &self.config;
        let mut scanner = Scanner::new(source, config);
        let mut balancer = TagBalancer::new(config);
        let handler: &mut dyn EventHandler = &mut handler;

        balancer.start(handler)?;
        loop {
            let token = match scanner.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => break,
                Err(err) => {
                    log::debug!(target: "tagsoup.parser", "input failed after {} tokens: {err}", scanner.tokens_scanned());
                    if let Some(sink) = self.error_sink.as_deref_mut() {
                        scanner.drain_notices(sink);
                        balancer.drain_notices(sink);
                    }
                    balancer.abort(handler)?;
                    if let Some(sink) = self.error_sink.as_deref_mut() {
                        balancer.drain_notices(sink);
                    }
                    return Err(ParseError::Input(err));
                }
            };
            if let Some(sink) = self.error_sink.as_deref_mut() {
                scanner.drain_notices(sink);
            }
            // Notices for the token are delivered even if a handler fails.
            let pushed = balancer.push_token(token, handler);
            if let Some(sink) = self.error_sink.as_deref_mut() {
                balancer.drain_notices(sink);
            }
            pushed?;
        }
        let finished = balancer.finish(handler);
        if let Some(sink) = self.error_sink.as_deref_mut() {
            scanner.drain_notices(sink);
            balancer.drain_notices(sink);
        }
        finished?;

        let stats = ParseStats {
            tokens: scanner.tokens_scanned(),
            events: balancer.events_emitted(),
            notices: scanner.notices_raised() + balancer.notices_raised(),
            max_depth: balancer.max_depth(),
        };
        log::debug!(target: "tagsoup.parser", "parse finished: {stats}");
        Ok(stats)
    }

    pub fn parse_str<H: EventHandler>(
        &mut self,
        input: &str,
        handler: H,
    ) -> Result<ParseStats, ParseError> {
        self.parse(StrSource::new(input), handler)
    }
}

/// Parses `input` with `config` into `handler`.
pub fn parse_str<H: EventHandler>(
    input: &str,
    config: ParserConfig,
    handler: H,
) -> Result<ParseStats, ParseError> {
    HtmlParser::new(config).parse_str(input, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventKind};
    use crate::notices::{NoticeKind, VecErrorSink};
    use crate::pipeline::{NullHandler, Pipeline, filter_fn};

    #[test]
    fn parse_str_collects_events_and_stats() {
        let mut events: Vec<Event> = Vec::new();
        let stats = parse_str("<p>hi</p>", ParserConfig::default(), &mut events).unwrap();
        assert_eq!(stats.tokens, 3);
        assert_eq!(stats.events, events.len() as u64);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(events.first().map(|e| &e.kind), Some(&EventKind::DocumentStart));
        assert_eq!(events.last().map(|e| &e.kind), Some(&EventKind::DocumentEnd));
    }

    #[test]
    fn notices_reach_the_error_sink_in_order() {
        let mut sink = VecErrorSink::default();
        let config = ParserConfig {
            report_errors: true,
            document_fragment: true,
            ..ParserConfig::default()
        };
        let stats = HtmlParser::new(config)
            .with_error_sink(&mut sink)
            .parse_str("a < b</x><p>1<p>2", Vec::new())
            .unwrap();
        let kinds: Vec<NoticeKind> = sink.0.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [
                NoticeKind::BareLessThan,
                NoticeKind::StrayEndTag,
                NoticeKind::AutoClosed,
                NoticeKind::ClosedAtEndOfInput,
            ]
        );
        assert_eq!(stats.notices, 4);
    }

    #[test]
    fn notices_are_counted_but_not_reported_when_disabled() {
        let mut sink = VecErrorSink::default();
        let stats = HtmlParser::default()
            .with_error_sink(&mut sink)
            .parse_str("</x>", Vec::new())
            .unwrap();
        assert!(sink.0.is_empty());
        assert_eq!(stats.notices, 1);
    }

    #[test]
    fn lookahead_notices_follow_earlier_recoveries() {
        let mut sink = VecErrorSink::default();
        let config = ParserConfig {
            report_errors: true,
            ..ParserConfig::default()
        };
        HtmlParser::new(config)
            .with_error_sink(&mut sink)
            .parse_str("a<b id=1 id=2>", Vec::new())
            .unwrap();
        let seen: Vec<(NoticeKind, i64)> = sink.0.iter().map(|n| (n.kind, n.span.begin.offset)).collect();
        assert_eq!(
            seen,
            [
                (NoticeKind::AncestorSynthesized, 0),
                (NoticeKind::AncestorSynthesized, 0),
                (NoticeKind::DuplicateAttribute, 9),
                (NoticeKind::ClosedAtEndOfInput, -1),
            ]
        );
    }

    #[test]
    fn notices_reach_the_sink_when_a_handler_fails() {
        let mut sink = VecErrorSink::default();
        let config = ParserConfig {
            report_errors: true,
            document_fragment: true,
            ..ParserConfig::default()
        };
        let fail_on_end = filter_fn("fail-on-end", |event: Event, next: &mut dyn EventHandler| {
            if matches!(event.kind, EventKind::ElementEnd { .. }) {
                return Err(PipelineError::Rejected {
                    filter: "fail-on-end",
                    reason: "no ends".to_string(),
                });
            }
            next.handle(event)
        });
        let pipeline = Pipeline::new(NullHandler).with_filter(fail_on_end);
        let err = HtmlParser::new(config)
            .with_error_sink(&mut sink)
            .parse_str("<b><i>x</b>", pipeline)
            .unwrap_err();
        assert!(matches!(err, ParseError::Pipeline(PipelineError::Rejected { .. })));
        let kinds: Vec<NoticeKind> = sink.0.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, [NoticeKind::MisnestedEndTag]);
    }

    struct Broken;

    impl CharSource for Broken {
        fn next_char(&mut self) -> io::Result<Option<char>> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "slow source"))
        }
    }

    #[test]
    fn input_failure_stops_without_document_end() {
        let mut events: Vec<Event> = Vec::new();
        let err = HtmlParser::default().parse(Broken, &mut events).unwrap_err();
        assert!(matches!(err, ParseError::Input(ref e) if e.kind() == io::ErrorKind::TimedOut));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::DocumentStart);
    }
}

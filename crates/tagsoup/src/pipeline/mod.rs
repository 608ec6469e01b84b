//! Event pipeline: an ordered chain of filters ending in a handler.
//!
//! Each filter receives events one at a time together with the remainder of
//! the chain as `next`. A filter that forwards must forward in arrival order;
//! one that suppresses or expands events documents it. Augmentations a filter
//! does not understand travel on untouched because the event is moved, not
//! rebuilt.
//!
//! The chain is fixed for the duration of a parse: the parser holds the
//! pipeline mutably while it runs, so filters can only be added or removed
//! between parses.

mod canonical;
mod nesting;

pub use canonical::CanonicalWriter;
pub use nesting::{NestingCheck, NestingViolation};

use std::io;

use thiserror::Error;

use crate::event::Event;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("event sink i/o failed")]
    Io(#[from] io::Error),
    #[error("filter `{filter}` rejected the event stream: {reason}")]
    Rejected { filter: &'static str, reason: String },
}

/// Terminal consumer of events.
pub trait EventHandler {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError>;
}

/// Pipeline stage with an explicit downstream handler.
pub trait EventFilter {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str {
        "filter"
    }

    fn filter(&mut self, event: Event, next: &mut dyn EventHandler) -> Result<(), PipelineError>;
}

impl EventHandler for Vec<Event> {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        self.push(event);
        Ok(())
    }
}

impl<H: EventHandler + ?Sized> EventHandler for &mut H {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        (**self).handle(event)
    }
}

impl<H: EventHandler + ?Sized> EventHandler for Box<H> {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        (**self).handle(event)
    }
}

/// Handler that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHandler;

impl EventHandler for NullHandler {
    fn handle(&mut self, _event: Event) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Filter built from a closure.
pub struct FnFilter<F> {
    name: &'static str,
    f: F,
}

pub fn filter_fn<F>(name: &'static str, f: F) -> FnFilter<F>
where
    F: FnMut(Event, &mut dyn EventHandler) -> Result<(), PipelineError>,
{
    FnFilter { name, f }
}

impl<F> EventFilter for FnFilter<F>
where
    F: FnMut(Event, &mut dyn EventHandler) -> Result<(), PipelineError>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn filter(&mut self, event: Event, next: &mut dyn EventHandler) -> Result<(), PipelineError> {
        (self.f)(event, next)
    }
}

/// Ordered filters in front of a terminal handler.
pub struct Pipeline<H> {
    filters: Vec<Box<dyn EventFilter>>,
    sink: H,
}

impl<H: EventHandler> Pipeline<H> {
    pub fn new(sink: H) -> Self {
        Self {
            filters: Vec::new(),
            sink,
        }
    }

    /// Appends a filter; it runs after every filter added before it.
    pub fn with_filter(mut self, filter: impl EventFilter + 'static) -> Self {
        self.push_filter(filter);
        self
    }

    pub fn push_filter(&mut self, filter: impl EventFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Inserts a filter at `index` (clamped to the chain length).
    pub fn insert_filter(&mut self, index: usize, filter: impl EventFilter + 'static) {
        let index = index.min(self.filters.len());
        self.filters.insert(index, Box::new(filter));
    }

    pub fn remove_filter(&mut self, index: usize) -> Option<Box<dyn EventFilter>> {
        (index < self.filters.len()).then(|| self.filters.remove(index))
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn sink(&self) -> &H {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut H {
        &mut self.sink
    }

    pub fn into_sink(self) -> H {
        self.sink
    }
}

impl<H: EventHandler> EventHandler for Pipeline<H> {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        Chain {
            filters: &mut self.filters,
            sink: &mut self.sink,
        }
        .handle(event)
    }
}

/// The remainder of a pipeline as seen by one filter.
struct Chain<'a, 's> {
    filters: &'a mut [Box<dyn EventFilter>],
    sink: &'a mut (dyn EventHandler + 's),
}

impl EventHandler for Chain<'_, '_> {
    fn handle(&mut self, event: Event) -> Result<(), PipelineError> {
        match self.filters.split_first_mut() {
            None => self.sink.handle(event),
            Some((first, rest)) => {
                let mut next = Chain {
                    filters: rest,
                    sink: &mut *self.sink,
                };
                first.filter(event, &mut next)
            }
        }
    }
}

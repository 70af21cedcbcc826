//! Element runtime context.
//!
//! The context is handed to an element for every lifecycle step. It gives
//! read access to the element's properties and a way to post events on the
//! pipeline bus, including from the element's own worker threads.

use super::pad::Pad;
use super::properties::{Properties, PropertyValue};
use crate::clock::ClockTime;
use crate::pipeline::{Bus, Event};

/// Context for one lifecycle step of an element.
pub struct ElementContext<'a> {
    name: &'a str,
    properties: &'a Properties,
    bus: &'a Bus,
}

impl<'a> ElementContext<'a> {
    pub(crate) fn new(name: &'a str, properties: &'a Properties, bus: &'a Bus) -> Self {
        Self {
            name,
            properties,
            bus,
        }
    }

    /// Get the element's name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Get the element's properties.
    pub fn properties(&self) -> &Properties {
        self.properties
    }

    /// Get a property value (or its default).
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Get an owned poster that can be moved into a worker thread.
    pub fn poster(&self) -> ElementPoster {
        ElementPoster {
            element: self.name.to_string(),
            bus: self.bus.clone(),
        }
    }
}

impl std::fmt::Debug for ElementContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementContext")
            .field("name", &self.name)
            .finish()
    }
}

/// Posts events on behalf of one element.
///
/// Cheap to clone and `Send`, so element worker threads can own one.
#[derive(Clone, Debug)]
pub struct ElementPoster {
    element: String,
    bus: Bus,
}

impl ElementPoster {
    /// Name of the element the events are attributed to.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Post a fatal runtime error.
    pub fn error(&self, message: impl Into<String>, debug: Option<String>) -> bool {
        self.bus.post(Event::Error {
            source: self.element.clone(),
            message: message.into(),
            debug,
        })
    }

    /// Post a non-fatal warning.
    pub fn warning(&self, message: impl Into<String>) -> bool {
        self.bus.post(Event::Warning {
            source: self.element.clone(),
            message: message.into(),
        })
    }

    /// Post end-of-stream.
    pub fn eos(&self) -> bool {
        self.bus.post(Event::Eos {
            source: Some(self.element.clone()),
        })
    }

    /// Announce a pad that appeared at runtime.
    pub fn pad_added(&self, pad: Pad) -> bool {
        self.bus.post(Event::PadAdded {
            element: self.element.clone(),
            pad,
        })
    }

    /// Announce a newly known stream duration.
    pub fn duration_changed(&self, duration: ClockTime) -> bool {
        self.bus.post(Event::DurationChanged {
            source: self.element.clone(),
            duration,
        })
    }
}

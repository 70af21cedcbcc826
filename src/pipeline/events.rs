//! Events carried on the pipeline bus.

use super::State;
use crate::clock::ClockTime;
use crate::element::Pad;
use std::fmt;

/// Notifications posted by elements and the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An element hit an unrecoverable runtime fault.
    Error {
        /// The element that posted the error.
        source: String,
        /// The error message.
        message: String,
        /// Additional debugging details.
        debug: Option<String>,
    },

    /// End of stream reached.
    Eos {
        /// The element that reached the end, if known.
        source: Option<String>,
    },

    /// An element created a pad at runtime.
    PadAdded {
        /// The element that owns the new pad.
        element: String,
        /// The new pad.
        pad: Pad,
    },

    /// A container finished a state change step.
    StateChanged {
        /// The container that changed state.
        source: String,
        /// Previous state.
        old: State,
        /// New state.
        new: State,
    },

    /// An element learned the stream duration.
    DurationChanged {
        /// The element reporting the duration.
        source: String,
        /// The new duration.
        duration: ClockTime,
    },

    /// Non-fatal issue.
    Warning {
        /// The element that emitted the warning.
        source: String,
        /// The warning message.
        message: String,
    },

    /// Application-defined notification.
    Custom {
        /// The poster.
        source: String,
        /// Event name.
        name: String,
    },
}

impl Event {
    /// Short, stable name of the event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Error { .. } => "error",
            Event::Eos { .. } => "eos",
            Event::PadAdded { .. } => "pad-added",
            Event::StateChanged { .. } => "state-changed",
            Event::DurationChanged { .. } => "duration-changed",
            Event::Warning { .. } => "warning",
            Event::Custom { .. } => "custom",
        }
    }

    /// Whether the event conventionally ends the supervision loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Error { .. } | Event::Eos { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Error {
                source, message, ..
            } => write!(f, "Error from {}: {}", source, message),
            Event::Eos { source: Some(s) } => write!(f, "EOS from {}", s),
            Event::Eos { source: None } => write!(f, "EOS"),
            Event::PadAdded { element, pad } => {
                write!(f, "Pad {}:{} added", element, pad.name())
            }
            Event::StateChanged { source, old, new } => {
                write!(f, "{} changed state: {} -> {}", source, old, new)
            }
            Event::DurationChanged { source, duration } => {
                write!(f, "{} duration is {}", source, duration)
            }
            Event::Warning { source, message } => write!(f, "Warning from {}: {}", source, message),
            Event::Custom { source, name } => write!(f, "Custom event '{}' from {}", name, source),
        }
    }
}

//! Error types for Mediagraph.

use crate::pipeline::{State, StateChange};
use thiserror::Error;

/// Result type alias using Mediagraph's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Mediagraph operations.
///
/// Assembly-time variants are returned synchronously by the operation that
/// failed and leave the graph in its previous, valid shape. Runtime faults of
/// elements that are already running travel over the bus as
/// [`Event::Error`](crate::pipeline::Event::Error) instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Capability descriptors of two pads have no common format.
    #[error("incompatible capabilities between {src} and {sink}: {src_caps} vs {sink_caps}")]
    IncompatibleCapabilities {
        /// Source pad (`element:pad`).
        src: String,
        /// Sink pad (`element:pad`).
        sink: String,
        /// Caps of the source pad.
        src_caps: String,
        /// Caps of the sink pad.
        sink_caps: String,
    },

    /// A pad already has a peer.
    #[error("pad {0} is already linked")]
    PortBusy(String),

    /// An element already has a pad with this name.
    #[error("element '{element}' already has a pad named '{pad}'")]
    DuplicatePortName {
        /// Element owning the pad.
        element: String,
        /// Colliding pad name.
        pad: String,
    },

    /// A container already holds an element with this name.
    #[error("container already has an element named '{0}'")]
    DuplicateElementName(String),

    /// A state change step failed.
    #[error("state change failed, last reached state is {state}: {cause}")]
    TransitionFailed {
        /// Last state that was successfully reached.
        state: State,
        /// Why the failing step was refused.
        cause: String,
    },

    /// An element refused a lifecycle step.
    #[error("element '{element}' failed {transition}: {reason}")]
    StateChangeRefused {
        /// Element that refused.
        element: String,
        /// The step being applied.
        transition: StateChange,
        /// Reason given by the element.
        reason: String,
    },

    /// Element-specific failure.
    #[error("{0}")]
    Element(String),

    /// No factory is registered for this element kind.
    #[error("no element factory registered for kind '{0}'")]
    UnknownKind(String),

    /// Unknown property, wrong value type, or write in a state that forbids it.
    #[error("invalid property '{property}' on '{element}': {reason}")]
    InvalidProperty {
        /// Element being configured.
        element: String,
        /// Property name.
        property: String,
        /// Reason for rejection.
        reason: String,
    },

    /// Element not present in the container.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Pad not present on the element.
    #[error("element '{element}' has no pad '{pad}'")]
    PadNotFound {
        /// Element name.
        element: String,
        /// Pad name.
        pad: String,
    },

    /// Link request is structurally invalid (direction mismatch, cycle).
    #[error("invalid link: {0}")]
    InvalidLink(String),

    /// The pipeline cannot leave Null because assembly did not complete.
    #[error("pipeline assembly is incomplete: {0}")]
    IncompleteAssembly(String),

    /// The runtime context was shut down.
    #[error("runtime has been shut down")]
    RuntimeShutDown,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! # Mediagraph
//!
//! The control plane of a media pipeline: assemble a graph of opaque
//! processing elements, drive it through its lifecycle, and supervise it
//! from a single-threaded loop that reacts to bus events.
//!
//! ## Features
//!
//! - **Graph assembly**: Named elements, pads with capability descriptors,
//!   link validation, and bins with ghost pads
//! - **Lifecycle control**: `Null -> Ready -> Paused -> Playing`, one step at a
//!   time, sinks first, with revert on failure
//! - **Event bus**: Ordered, thread-safe, non-blocking posts from element
//!   worker threads
//! - **Supervision loop**: Bus dispatch plus periodic timers on one thread
//! - **Dynamic pads**: Pads announced at runtime are linked on dispatch
//!
//! ## Quick Start
//!
//! ```rust
//! use mediagraph::prelude::*;
//!
//! let runtime = Runtime::new();
//! let mut pipeline = Pipeline::new(&runtime, "quick");
//! pipeline.make("videotestsrc", "src").unwrap();
//! pipeline.make("fakesink", "sink").unwrap();
//! pipeline.link("src", "sink").unwrap();
//!
//! pipeline.set_state(State::Playing).unwrap();
//! assert!(pipeline.query_position().is_some());
//! pipeline.set_state(State::Null).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod caps;
pub mod clock;
pub mod element;
pub mod elements;
pub mod error;
pub mod pipeline;
pub mod runtime;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::caps::Caps;
    pub use crate::clock::ClockTime;
    pub use crate::element::{Element, ElementImpl, Pad, PadTemplate, PropertySpec};
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::{
        Bin, Event, Flow, LoopConfig, MainLoop, Pipeline, State, TimerFlow, default_handler,
    };
    pub use crate::runtime::Runtime;
}

pub use error::{Error, Result};

//! Pipeline construction, lifecycle and supervision.
//!
//! This module provides the control plane:
//!
//! - [`Graph`]: Elements plus the links between their pads (daggy DAG)
//! - [`Bin`]: A composite element exposing ghost pads
//! - [`Pipeline`]: The top-level container with a bus and a lifecycle
//! - [`Bus`]: Ordered, thread-safe event queue from elements to the loop
//! - [`MainLoop`]: Single-threaded supervision of bus events and timers
//! - [`ElementFactory`]: Element creation by kind name
//!
//! # Example
//!
//! ```rust,no_run
//! use mediagraph::pipeline::{default_handler, MainLoop, Pipeline, State};
//! use mediagraph::runtime::Runtime;
//!
//! # fn main() -> mediagraph::Result<()> {
//! let runtime = Runtime::new();
//! let mut pipeline = Pipeline::new(&runtime, "audio-player");
//!
//! pipeline.make("filesrc", "source")?;
//! pipeline.make("oggdemux", "demuxer")?;
//! pipeline.make("vorbisdec", "decoder")?;
//! pipeline.make("autoaudiosink", "output")?;
//! pipeline.element_mut("source").unwrap().set_property("location", "song.ogg")?;
//!
//! pipeline.link("source", "demuxer")?;
//! pipeline.link("decoder", "output")?;
//! pipeline.connect_pad_added("demuxer", "decoder")?;
//!
//! pipeline.set_state(State::Playing)?;
//! MainLoop::default().run_blocking(&mut pipeline, default_handler)?;
//! # Ok(())
//! # }
//! ```

mod bin;
mod bus;
mod container;
mod dispatch;
mod events;
pub mod factory;
mod graph;
mod main_loop;
mod state;

pub use bin::Bin;
pub use bus::{Bus, Flow};
pub use container::Pipeline;
pub use dispatch::default_handler;
pub use events::Event;
pub use factory::{ElementConstructor, ElementFactory};
pub use graph::{Graph, LinkInfo};
pub use main_loop::{LoopConfig, LoopExit, LoopHandle, MainLoop, TimerFlow, TimerId};
pub use state::{State, StateChange};

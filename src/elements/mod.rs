//! Built-in pipeline elements.
//!
//! These stand in for real media plugins. They carry no data; they declare
//! pads and properties, hold or release resources at the right lifecycle
//! steps, and post the events a real element would.
//!
//! ## Sources
//! - [`FileSrc`] (`filesrc`): Opens a file while Ready or above
//! - [`VideoTestSrc`] (`videotestsrc`): Raw video of any size
//!
//! ## Demuxers and decoders
//! - [`Demuxer`] (`demux`, `oggdemux`): Announces stream pads at runtime
//! - [`Decoder`] (`decoder`, `vorbisdec`): One-in, one-out
//!
//! ## Sinks
//! - [`FakeSink`] (`fakesink`, `autoaudiosink`): Discards everything
//!
//! ## Self-contained
//! - [`PlayBin`] (`playbin`, `playback`): Plays a location without pads

mod decoder;
mod demuxer;
mod fakesink;
mod file;
mod playbin;
mod testsrc;
mod timeline;

pub use decoder::Decoder;
pub use demuxer::Demuxer;
pub use fakesink::FakeSink;
pub use file::FileSrc;
pub use playbin::PlayBin;
pub use testsrc::{MAX_DIMENSION, VideoTestSrc};

//! Example 01: Self-contained playback element
//!
//! A single `playback` element plays a location on its own. The example
//! creates one, sets its `location` property, and supervises it until the
//! end of the stream.
//!
//! Run with: cargo run --example 01_playback_element [media file]

use mediagraph::prelude::*;
use std::io::Write;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Play the given file, or a scratch file standing in for one.
    let mut scratch = tempfile::NamedTempFile::new()?;
    let location = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            scratch.write_all(b"OggS")?;
            scratch.path().display().to_string()
        }
    };

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "player");

    let mut play = runtime.make_element("playback", "play")?;
    play.set_property("location", location.as_str())?;
    play.set_property("duration-ms", 500i64)?;
    pipeline.add(play)?;

    println!("Playing {location}");
    pipeline.set_state(State::Playing)?;

    let exit = MainLoop::default().run_blocking(&mut pipeline, default_handler)?;
    println!("Loop exited: {exit:?}, pipeline is {}", pipeline.state());
    Ok(())
}

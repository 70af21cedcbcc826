//! Example 03: Dynamic pads
//!
//! A demuxer only knows its streams once data flows, so its audio pad is
//! announced at runtime. `connect_pad_added` registers the decoder as the
//! element waiting for it; the link is made when the `PadAdded` event is
//! dispatched.
//!
//! Run with: cargo run --example 03_dynamic_pads

use mediagraph::prelude::*;
use std::io::Write;

fn on_event(pipeline: &mut Pipeline, event: &Event) -> Flow {
    if let Event::PadAdded { element, pad } = event {
        println!("A new pad {} was created on {element}", pad.name());
    }
    let flow = default_handler(pipeline, event);
    if let Event::PadAdded { element, pad } = event {
        if let Some(peer) = pipeline
            .element(element)
            .and_then(|e| e.pad(pad.name()))
            .and_then(|p| p.peer())
        {
            println!("Pad {} linked to {peer}", pad.name());
        }
    }
    flow
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut input = tempfile::NamedTempFile::new()?;
    input.write_all(b"OggS\0\x02")?;

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "my_pipeline");
    pipeline.make("filesrc", "source")?;
    pipeline.make("oggdemux", "demuxer")?;
    pipeline.make("vorbisdec", "decoder")?;
    pipeline.make("fakesink", "sink")?;

    if let Some(source) = pipeline.element_mut("source") {
        source.set_property("location", input.path())?;
    }
    if let Some(demuxer) = pipeline.element_mut("demuxer") {
        demuxer.set_property("duration-ms", 300i64)?;
    }

    pipeline.link_pads("source", "src", "demuxer", "sink")?;
    pipeline.link("decoder", "sink")?;
    pipeline.connect_pad_added("demuxer", "decoder")?;

    pipeline.set_state(State::Playing)?;
    MainLoop::default().run_blocking(&mut pipeline, on_event)?;

    for link in pipeline.links() {
        println!("{} -> {}", link.src, link.sink);
    }
    Ok(())
}

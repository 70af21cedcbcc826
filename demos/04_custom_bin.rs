//! Example 04: A custom bin
//!
//! A bin packages a decoder and a sink behind a single ghost `sink` pad.
//! To the pipeline it is one element: it is linked, started and stopped
//! like any other, and its children follow it through every state.
//!
//! Run with: cargo run --example 04_custom_bin

use mediagraph::prelude::*;

fn audio_output(runtime: &Runtime) -> Result<Element> {
    let mut bin = Bin::new("audio-output");
    bin.add(runtime.make_element("vorbisdec", "decoder")?)?;
    bin.add(runtime.make_element("autoaudiosink", "sink")?)?;
    bin.link("decoder", "sink")?;
    bin.add_ghost_pad("decoder", "sink", "sink")?;
    Ok(bin.into_element())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "bin-demo");
    pipeline.make("demux", "demuxer")?;
    pipeline.add(audio_output(&runtime)?)?;
    pipeline.connect_pad_added("demuxer", "audio-output")?;

    if let Some(output) = pipeline.element("audio-output") {
        println!(
            "bin accepts: {}",
            output
                .pad_caps("sink")
                .map_or_else(|| "ANY".to_string(), |c| c.to_string())
        );
    }

    pipeline.set_state(State::Paused)?;
    for name in ["demuxer", "audio-output", "decoder", "sink"] {
        if let Some(element) = pipeline.element(name) {
            println!("{name}: {}", element.state());
        }
    }
    pipeline.set_state(State::Null)?;
    Ok(())
}

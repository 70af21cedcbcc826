//! Example 02: Watching the bus
//!
//! Every event posted on a pipeline's bus reaches the handler in order.
//! The handler prints each one and quits the loop on error or end of
//! stream.
//!
//! Run with: cargo run --example 02_bus_watch

use mediagraph::prelude::*;

fn bus_call(_pipeline: &mut Pipeline, event: &Event) -> Flow {
    match event {
        Event::Eos { .. } => {
            println!("End of stream");
            Flow::Stop
        }
        Event::Error { message, .. } => {
            eprintln!("Error: {message}");
            Flow::Stop
        }
        other => {
            println!("Got {} event: {other}", other.type_name());
            Flow::Continue
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "watched");
    pipeline.make("videotestsrc", "src")?;
    pipeline.make("fakesink", "sink")?;
    pipeline.link("src", "sink")?;

    // 15 frames at 30 fps: half a second of stream.
    if let Some(src) = pipeline.element_mut("src") {
        src.set_property("num-buffers", 15i64)?;
    }

    pipeline.set_state(State::Playing)?;
    let exit = MainLoop::default().run(&mut pipeline, bus_call).await?;
    println!("Loop exited: {exit:?}");
    Ok(())
}

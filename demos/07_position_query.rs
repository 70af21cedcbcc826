//! Example 07: Polling the playback position
//!
//! A 200 ms timer on the supervision loop queries the pipeline's position
//! and duration and prints them on one line, while bus events are handled
//! as they arrive.
//!
//! Run with: cargo run --example 07_position_query

use mediagraph::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cb_print_position(pipeline: &mut Pipeline) -> TimerFlow {
    if let (Some(pos), Some(len)) = (pipeline.query_position(), pipeline.query_duration()) {
        print!("Time: {pos} / {len}\r");
        let _ = std::io::stdout().flush();
    }
    TimerFlow::Repeat
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let media = tempfile::NamedTempFile::new()?;

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "position");
    let mut play = runtime.make_element("playbin", "play")?;
    play.set_property("location", media.path())?;
    play.set_property("duration-ms", 1500i64)?;
    pipeline.add(play)?;

    pipeline.set_state(State::Playing)?;

    let mut main_loop = MainLoop::new(LoopConfig::default());
    main_loop.add_timer(Duration::from_millis(200), cb_print_position);
    main_loop
        .run(&mut pipeline, |p, event| {
            if let Event::Eos { .. } = event {
                println!("\nEnd of stream");
            }
            default_handler(p, event)
        })
        .await?;
    Ok(())
}

//! Ogg/Vorbis audio player.
//!
//! Builds `filesrc ! oggdemux ! vorbisdec ! autoaudiosink`, links the
//! demuxer's audio pad once it appears, prints the playback position every
//! 200 ms and exits at end of stream or on the first error.
//!
//! Usage: mediaplay <Ogg/Vorbis filename>
//!
//! Set `RUST_LOG=mediagraph=debug` to see every state change.

use mediagraph::prelude::*;
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Player configuration.
#[derive(Debug, Clone)]
struct PlayerConfig {
    /// File to play.
    location: String,
    /// How often the position line is refreshed.
    position_interval: Duration,
}

impl PlayerConfig {
    fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            position_interval: Duration::from_millis(200),
        }
    }
}

fn build(pipeline: &mut Pipeline) -> Result<()> {
    pipeline.make("filesrc", "file-source")?;
    pipeline.make("oggdemux", "ogg-demuxer")?;
    pipeline.make("vorbisdec", "vorbis-decoder")?;
    pipeline.make("autoaudiosink", "audio-output")?;
    Ok(())
}

fn link(pipeline: &mut Pipeline, config: &PlayerConfig) -> Result<()> {
    if let Some(source) = pipeline.element_mut("file-source") {
        source.set_property("location", config.location.as_str())?;
    }
    pipeline.link("file-source", "ogg-demuxer")?;
    pipeline.link("vorbis-decoder", "audio-output")?;
    pipeline.connect_pad_added("ogg-demuxer", "vorbis-decoder")
}

fn print_position(pipeline: &mut Pipeline) -> TimerFlow {
    if let (Some(position), Some(duration)) = (pipeline.query_position(), pipeline.query_duration()) {
        print!("Time: {position} / {duration}\r");
        let _ = std::io::stdout().flush();
    }
    TimerFlow::Repeat
}

fn handle_event(pipeline: &mut Pipeline, event: &Event) -> Flow {
    match event {
        Event::Error { message, debug, .. } => {
            eprintln!("Error: {message}");
            if let Some(debug) = debug {
                eprintln!("Debug details: {debug}");
            }
        }
        Event::Eos { .. } => println!("\nEnd of stream"),
        Event::PadAdded { .. } => println!("Dynamic pad created, linking demuxer/decoder"),
        _ => {}
    }
    default_handler(pipeline, event)
}

/// Release every element, then exit with -1.
///
/// `process::exit` skips destructors, so the pipeline is taken to Null here.
fn abort(mut pipeline: Pipeline, message: &str) -> ! {
    eprintln!("{message}");
    if let Err(e) = pipeline.set_state(State::Null) {
        eprintln!("Pipeline did not shut down cleanly: {e}");
    }
    drop(pipeline);
    std::process::exit(-1);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mediagraph=info")),
        )
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "mediaplay".to_string());
    let Some(location) = args.next() else {
        eprintln!("Usage: {program} <Ogg/Vorbis filename>");
        std::process::exit(-1);
    };
    let config = PlayerConfig::new(location);

    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "audio-player");

    if let Err(e) = build(&mut pipeline) {
        abort(pipeline, &format!("One element could not be created. Exiting. ({e})"));
    }
    if let Err(e) = link(&mut pipeline, &config) {
        abort(pipeline, &format!("Elements could not be linked. Exiting. ({e})"));
    }

    println!("Now playing: {}", config.location);
    if let Err(e) = pipeline.set_state(State::Playing) {
        abort(
            pipeline,
            &format!("Unable to set the pipeline to the playing state. ({e})"),
        );
    }

    println!("Running...");
    let mut main_loop = MainLoop::new(LoopConfig::default());
    main_loop.add_timer(config.position_interval, print_position);
    let result = main_loop.run(&mut pipeline, handle_event).await;

    println!("Returned, stopping playback");
    if let Err(e) = result {
        eprintln!("Pipeline did not shut down cleanly: {e}");
    }
    println!("Deleting pipeline");
    drop(pipeline);
    runtime.shutdown();
}

//! Example 05: Reading the video size from fixed caps
//!
//! Only fixed caps carry a definite width and height. The test source
//! advertises ranges; restricting its pad to one size and linking it
//! produces fixed, negotiated caps that can be read back.
//!
//! Run with: cargo run --example 05_caps_video_size

use mediagraph::prelude::*;

fn read_video_props(caps: &Caps) {
    if !caps.is_fixed() {
        println!("Caps are not fixed: {caps}");
        return;
    }
    match caps.video_size() {
        Some((width, height)) => {
            println!("The video size of this set of capabilities is {width}x{height}")
        }
        None => println!("No width/height available"),
    }
}

fn main() -> Result<()> {
    let runtime = Runtime::new();
    let mut pipeline = Pipeline::new(&runtime, "caps-demo");
    pipeline.make("videotestsrc", "src")?;
    pipeline.make("fakesink", "sink")?;

    if let Some(src) = pipeline.element("src") {
        if let Some(caps) = src.pad_caps("src") {
            read_video_props(&caps);
        }
    }

    let size = Caps::new("video/x-raw")
        .with_str("format", "I420")
        .with_int("width", 640)
        .with_int("height", 480);
    if let Some(src) = pipeline.element_mut("src") {
        let Some(restricted) = src.pad_caps("src").and_then(|c| c.intersect(&size)) else {
            println!("{size} is not offered by the source");
            return Ok(());
        };
        src.set_pad_caps("src", Some(restricted))?;
    }

    let link = pipeline.link("src", "sink")?;
    println!("{} -> {}", link.src, link.sink);
    if let Some(caps) = pipeline.element("sink").and_then(|s| s.negotiated_caps("sink")) {
        read_video_props(&caps);
    }
    Ok(())
}

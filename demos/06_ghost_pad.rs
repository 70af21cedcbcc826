//! Example 06: Ghost pads
//!
//! A ghost pad exposes a child's pad on its bin. Its direction and caps
//! are always those of the child pad it targets.
//!
//! Run with: cargo run --example 06_ghost_pad

use mediagraph::prelude::*;

fn main() -> Result<()> {
    let runtime = Runtime::new();

    let mut bin = Bin::new("mybin");
    bin.add(runtime.make_element("fakesink", "sink")?)?;
    bin.add_ghost_pad("sink", "sink", "sink")?;

    if let Some(target) = bin.ghost_pad_target("sink") {
        println!(
            "bin pad name is {}, sink pad name is {}.",
            "sink", target.pad
        );
    }

    let element = bin.into_element();
    if let Some(pad) = element.pad("sink") {
        println!("ghost pad direction: {:?}, ghost: {}", pad.direction(), pad.is_ghost());
    }
    Ok(())
}

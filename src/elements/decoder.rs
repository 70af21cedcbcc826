//! Decoder element.

use crate::caps::Caps;
use crate::element::{ElementContext, ElementImpl, PadTemplate};
use crate::error::Result;
use crate::pipeline::StateChange;

/// A one-in, one-out decoder.
///
/// Decoding itself happens outside the control plane; the element only
/// declares which formats it accepts and produces.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    input: Option<Caps>,
    output: Option<Caps>,
}

impl Decoder {
    /// Create a decoder accepting and producing any format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Vorbis audio decoder.
    pub fn vorbis() -> Self {
        Self {
            input: Some(Caps::new("audio/x-vorbis")),
            output: Some(Caps::new("audio/x-raw")),
        }
    }
}

fn template(template: PadTemplate, caps: &Option<Caps>) -> PadTemplate {
    match caps {
        Some(caps) => template.with_caps(caps.clone()),
        None => template,
    }
}

impl ElementImpl for Decoder {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        vec![
            template(PadTemplate::sink("sink"), &self.input),
            template(PadTemplate::src("src"), &self.output),
        ]
    }

    fn change_state(&mut self, _transition: StateChange, _ctx: &ElementContext<'_>) -> Result<()> {
        Ok(())
    }
}

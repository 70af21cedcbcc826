//! Container demuxer element.

use super::timeline::Timeline;
use crate::caps::Caps;
use crate::clock::ClockTime;
use crate::element::{ElementContext, ElementImpl, Pad, PadTemplate, PropertySpec};
use crate::error::{Error, Result};
use crate::pipeline::StateChange;

const DEFAULT_DURATION_MS: i64 = 1000;

/// A demuxer that exposes its elementary streams as sometimes pads.
///
/// Stream pads (`audio_0`, `audio_1`, ...) are not present at creation.
/// They are announced from the streaming thread with a `PadAdded` event
/// once the element starts playing, and the stream ends after
/// `duration-ms` of playback.
pub struct Demuxer {
    stream_caps: Option<Caps>,
    timeline: Timeline,
    announced: bool,
}

impl Demuxer {
    /// Create a demuxer producing unconstrained streams.
    pub fn new() -> Self {
        Self {
            stream_caps: None,
            timeline: Timeline::new(ClockTime::from_millis(DEFAULT_DURATION_MS as u64)),
            announced: false,
        }
    }

    /// Create an Ogg demuxer producing Vorbis audio streams.
    pub fn ogg() -> Self {
        Self {
            stream_caps: Some(Caps::new("audio/x-vorbis")),
            ..Self::new()
        }
    }

    fn stream_template(&self) -> PadTemplate {
        let template = PadTemplate::sometimes_src("audio_%u");
        match &self.stream_caps {
            Some(caps) => template.with_caps(caps.clone()),
            None => template,
        }
    }

    fn configure(&mut self, ctx: &ElementContext<'_>) -> Result<()> {
        let ms = ctx
            .properties()
            .get_i64("duration-ms")
            .unwrap_or(DEFAULT_DURATION_MS);
        let ms = u64::try_from(ms)
            .map_err(|_| Error::Element(format!("negative duration-ms {ms}")))?;
        self.timeline.set_duration(ClockTime::from_millis(ms));
        Ok(())
    }

    fn start(&mut self, ctx: &ElementContext<'_>) -> Result<()> {
        let streams = if self.announced {
            0
        } else {
            ctx.properties().get_i64("streams").unwrap_or(1).max(0)
        };
        self.announced = true;

        let template = self.stream_template();
        let duration = self.timeline.duration();
        self.timeline.start(ctx.poster(), move |poster| {
            for n in 0..streams {
                let pad = Pad::from_template(&template, format!("audio_{n}"));
                poster.pad_added(pad);
            }
            poster.duration_changed(duration);
        })?;
        Ok(())
    }
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementImpl for Demuxer {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        vec![PadTemplate::sink("sink"), self.stream_template()]
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::integer("streams", "Number of streams to expose").with_default(1i64),
            PropertySpec::integer("duration-ms", "Stream length in milliseconds")
                .with_default(DEFAULT_DURATION_MS),
        ]
    }

    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
        match transition {
            StateChange::ReadyToPaused => self.configure(ctx),
            StateChange::PausedToPlaying => self.start(ctx),
            StateChange::PlayingToPaused => {
                self.timeline.stop();
                Ok(())
            }
            StateChange::PausedToReady => {
                self.timeline.reset();
                self.announced = false;
                Ok(())
            }
            StateChange::NullToReady | StateChange::ReadyToNull => Ok(()),
        }
    }

    fn duration(&self) -> Option<ClockTime> {
        Some(self.timeline.duration())
    }
}

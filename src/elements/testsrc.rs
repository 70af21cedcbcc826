//! Video test source element.

use super::timeline::Timeline;
use crate::caps::Caps;
use crate::clock::ClockTime;
use crate::element::{ElementContext, ElementImpl, PadTemplate, PropertySpec};
use crate::error::Result;
use crate::pipeline::StateChange;

/// Largest frame dimension advertised on the src pad.
pub const MAX_DIMENSION: i64 = 16384;

/// A live-style video source.
///
/// Advertises raw video of any size on its `src` pad. With `num-buffers`
/// set to a non-negative count it ends the stream after that many frames
/// at `framerate` frames per second; otherwise it runs until stopped.
pub struct VideoTestSrc {
    timeline: Option<Timeline>,
}

impl VideoTestSrc {
    /// Create a new video test source.
    pub fn new() -> Self {
        Self { timeline: None }
    }

    /// Caps advertised by the src pad.
    pub fn caps() -> Caps {
        Caps::new("video/x-raw")
            .with_list("format", ["I420", "RGBA"])
            .with_int_range("width", 1, MAX_DIMENSION)
            .with_int_range("height", 1, MAX_DIMENSION)
    }

    fn finite_duration(ctx: &ElementContext<'_>) -> Option<ClockTime> {
        let frames = u64::try_from(ctx.properties().get_i64("num-buffers")?).ok()?;
        let rate = u64::try_from(ctx.properties().get_i64("framerate")?)
            .ok()
            .filter(|&r| r > 0)?;
        Some(ClockTime::from_nanos(frames * 1_000_000_000 / rate))
    }
}

impl Default for VideoTestSrc {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementImpl for VideoTestSrc {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        vec![PadTemplate::src("src").with_caps(Self::caps())]
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::integer("num-buffers", "Frames to produce, -1 for unlimited")
                .with_default(-1i64),
            PropertySpec::integer("framerate", "Frames per second").with_default(30i64),
        ]
    }

    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
        match transition {
            StateChange::ReadyToPaused => {
                self.timeline = Self::finite_duration(ctx).map(Timeline::new);
            }
            StateChange::PausedToPlaying => {
                if let Some(timeline) = &mut self.timeline {
                    timeline.start(ctx.poster(), |_| {})?;
                }
            }
            StateChange::PlayingToPaused => {
                if let Some(timeline) = &mut self.timeline {
                    timeline.stop();
                }
            }
            StateChange::PausedToReady => self.timeline = None,
            StateChange::NullToReady | StateChange::ReadyToNull => {}
        }
        Ok(())
    }

    fn duration(&self) -> Option<ClockTime> {
        self.timeline.as_ref().map(Timeline::duration)
    }
}

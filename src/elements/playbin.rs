//! Self-contained playback element.

use super::timeline::Timeline;
use crate::clock::ClockTime;
use crate::element::{ElementContext, ElementImpl, PadTemplate, PropertySpec};
use crate::error::{Error, Result};
use crate::pipeline::StateChange;
use std::path::Path;

const DEFAULT_DURATION_MS: i64 = 2000;

/// Plays a media location on its own, without any pad.
///
/// The `location` property is required; the media must exist when the
/// element enters Ready. Playback lasts `duration-ms` and ends with
/// end-of-stream.
pub struct PlayBin {
    timeline: Timeline,
}

impl PlayBin {
    /// Create a new playback element.
    pub fn new() -> Self {
        Self {
            timeline: Timeline::new(ClockTime::from_millis(DEFAULT_DURATION_MS as u64)),
        }
    }

    /// Current playback position.
    pub fn position(&self) -> ClockTime {
        self.timeline.position()
    }

    fn prepare(&mut self, ctx: &ElementContext<'_>) -> Result<()> {
        let location = ctx
            .properties()
            .get_str("location")
            .ok_or_else(|| Error::Element("no location set".to_string()))?;
        let location = location.strip_prefix("file://").unwrap_or(location);
        std::fs::metadata(Path::new(location))?;

        let ms = ctx
            .properties()
            .get_i64("duration-ms")
            .unwrap_or(DEFAULT_DURATION_MS);
        let ms = u64::try_from(ms)
            .map_err(|_| Error::Element(format!("negative duration-ms {ms}")))?;
        self.timeline.set_duration(ClockTime::from_millis(ms));
        Ok(())
    }
}

impl Default for PlayBin {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementImpl for PlayBin {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        Vec::new()
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![
            PropertySpec::string("location", "Path or file:// URI of the media").required(),
            PropertySpec::integer("duration-ms", "Playback length in milliseconds")
                .with_default(DEFAULT_DURATION_MS),
        ]
    }

    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
        match transition {
            StateChange::NullToReady => self.prepare(ctx),
            StateChange::PausedToPlaying => {
                let duration = self.timeline.duration();
                self.timeline.start(ctx.poster(), move |poster| {
                    poster.duration_changed(duration);
                })?;
                Ok(())
            }
            StateChange::PlayingToPaused => {
                self.timeline.stop();
                Ok(())
            }
            StateChange::PausedToReady => {
                self.timeline.reset();
                Ok(())
            }
            StateChange::ReadyToPaused | StateChange::ReadyToNull => Ok(()),
        }
    }

    fn duration(&self) -> Option<ClockTime> {
        Some(self.timeline.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Properties;
    use crate::pipeline::Bus;

    #[test]
    fn test_accepts_file_uri() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let uri = format!("file://{}", tmp.path().display());

        let mut playbin = PlayBin::new();
        let mut props = Properties::new(playbin.properties());
        props.set("play", "location", uri.into()).unwrap();
        props.set("play", "duration-ms", 500i64.into()).unwrap();
        let bus = Bus::new();
        let ctx = ElementContext::new("play", &props, &bus);

        playbin.change_state(StateChange::NullToReady, &ctx).unwrap();
        assert_eq!(playbin.duration(), Some(ClockTime::from_millis(500)));
        assert_eq!(playbin.position(), ClockTime::ZERO);
    }

    #[test]
    fn test_missing_media_refused() {
        let mut playbin = PlayBin::new();
        let mut props = Properties::new(playbin.properties());
        props
            .set("play", "location", "/nonexistent/media.ogg".into())
            .unwrap();
        let bus = Bus::new();
        let ctx = ElementContext::new("play", &props, &bus);

        assert!(playbin.change_state(StateChange::NullToReady, &ctx).is_err());
    }
}

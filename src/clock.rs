//! Clock and time types for position reporting.
//!
//! This module provides:
//! - [`ClockTime`]: A nanosecond timestamp type (8 bytes, Copy)
//! - [`PipelineClock`]: Running time of a pipeline, frozen while paused

use std::time::{Duration, Instant};

// ============================================================================
// ClockTime
// ============================================================================

/// Time in nanoseconds (8 bytes, Copy).
///
/// Displays as `H:MM:SS.nnnnnnnnn`, the usual media position format.
///
/// ```rust
/// use mediagraph::clock::ClockTime;
///
/// let t = ClockTime::from_secs(61) + ClockTime::from_millis(500);
/// assert_eq!(t.millis(), 61_500);
/// assert_eq!(t.to_string(), "0:01:01.500000000");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClockTime(u64);

impl ClockTime {
    /// Zero time.
    pub const ZERO: Self = Self(0);

    /// Create from nanoseconds.
    #[inline]
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    /// Create from milliseconds.
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    /// Create from seconds.
    #[inline]
    pub const fn from_secs(s: u64) -> Self {
        Self(s.saturating_mul(1_000_000_000))
    }

    /// Get as nanoseconds.
    #[inline]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Get as milliseconds (truncated).
    #[inline]
    pub const fn millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Get as seconds (truncated).
    #[inline]
    pub const fn secs(self) -> u64 {
        self.0 / 1_000_000_000
    }

    /// Get the nanoseconds part (0..999_999_999).
    #[inline]
    pub const fn subsec_nanos(self) -> u32 {
        (self.0 % 1_000_000_000) as u32
    }
}

impl std::ops::Add for ClockTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for ClockTime {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl From<Duration> for ClockTime {
    #[inline]
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl From<ClockTime> for Duration {
    #[inline]
    fn from(t: ClockTime) -> Self {
        Duration::from_nanos(t.0)
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.secs();
        write!(
            f,
            "{}:{:02}:{:02}.{:09}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            self.subsec_nanos()
        )
    }
}

// ============================================================================
// PipelineClock
// ============================================================================

/// Running time of a pipeline.
///
/// The clock advances only while the pipeline is Playing. Pausing freezes
/// the accumulated time, playing again resumes from it, and a reset (on the
/// way back to Ready) returns it to zero.
#[derive(Debug, Default)]
pub struct PipelineClock {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl PipelineClock {
    /// Create a stopped clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) advancing.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Freeze the running time.
    pub fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
        }
    }

    /// Stop and return to zero.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    /// Whether the clock is currently advancing.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total time spent Playing since the last reset.
    pub fn running_time(&self) -> ClockTime {
        let live = self.started_at.map_or(Duration::ZERO, |s| s.elapsed());
        ClockTime::from(self.accumulated + live)
    }
}

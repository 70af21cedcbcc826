//! Simulated stream progress shared by the built-in timed elements.
//!
//! A [`Timeline`] stands in for a streaming thread: it advances a position
//! in small slices on a private worker thread while the element is Playing,
//! and posts end-of-stream once the configured duration has elapsed. The
//! position survives pause/resume and is cleared by [`Timeline::reset`].

use crate::clock::ClockTime;
use crate::element::ElementPoster;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Granularity of the worker's progress.
const SLICE: Duration = Duration::from_millis(10);

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub(crate) struct Timeline {
    duration: ClockTime,
    position: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    worker: Option<Worker>,
}

impl Timeline {
    pub(crate) fn new(duration: ClockTime) -> Self {
        Self {
            duration,
            position: Arc::new(AtomicU64::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub(crate) fn set_duration(&mut self, duration: ClockTime) {
        self.duration = duration;
    }

    pub(crate) fn duration(&self) -> ClockTime {
        self.duration
    }

    pub(crate) fn position(&self) -> ClockTime {
        ClockTime::from_nanos(self.position.load(Ordering::Acquire))
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start the worker. `on_start` runs first, on the worker thread.
    pub(crate) fn start<F>(&mut self, poster: ElementPoster, on_start: F) -> std::io::Result<()>
    where
        F: FnOnce(&ElementPoster) + Send + 'static,
    {
        if self.worker.is_some() {
            return Ok(());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let position = Arc::clone(&self.position);
        let finished = Arc::clone(&self.finished);
        let duration = self.duration.nanos();
        let worker_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name(format!("{}-stream", poster.element()))
            .spawn(move || {
                on_start(&poster);
                while !worker_stop.load(Ordering::Acquire) {
                    let elapsed = position.load(Ordering::Acquire);
                    if elapsed >= duration {
                        if !finished.swap(true, Ordering::AcqRel) {
                            tracing::debug!(element = poster.element(), "stream finished");
                            poster.eos();
                        }
                        return;
                    }
                    let step = SLICE.min(Duration::from_nanos(duration - elapsed));
                    std::thread::sleep(step);
                    position.fetch_add(step.as_nanos() as u64, Ordering::AcqRel);
                }
            })?;

        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Stop the worker and wait for it. The position is kept.
    pub(crate) fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            if worker.handle.join().is_err() {
                tracing::warn!("stream worker panicked");
            }
        }
    }

    /// Stop the worker and rewind to the start.
    pub(crate) fn reset(&mut self) {
        self.stop();
        self.position.store(0, Ordering::Release);
        self.finished.store(false, Ordering::Release);
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Bus, Event};

    fn poster(bus: &Bus) -> ElementPoster {
        let props = crate::element::Properties::default();
        crate::element::ElementContext::new("timed", &props, bus).poster()
    }

    #[test]
    fn test_runs_to_eos_once() {
        let bus = Bus::new();
        bus.set_flushing(false);
        let mut timeline = Timeline::new(ClockTime::from_millis(30));

        timeline.start(poster(&bus), |_| {}).unwrap();
        std::thread::sleep(Duration::from_millis(200));
        timeline.stop();

        assert_eq!(timeline.position(), ClockTime::from_millis(30));
        assert_eq!(
            bus.pop(),
            Some(Event::Eos {
                source: Some("timed".to_string())
            })
        );

        // Resuming a finished timeline does not repeat end-of-stream.
        timeline.start(poster(&bus), |_| {}).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        timeline.stop();
        assert!(bus.pop().is_none());
    }

    #[test]
    fn test_stop_keeps_position() {
        let bus = Bus::new();
        bus.set_flushing(false);
        let mut timeline = Timeline::new(ClockTime::from_secs(60));

        timeline.start(poster(&bus), |p| {
            p.warning("started");
        })
        .unwrap();
        assert!(timeline.is_running());
        std::thread::sleep(Duration::from_millis(50));
        timeline.stop();
        let paused_at = timeline.position();
        assert!(paused_at > ClockTime::ZERO);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(timeline.position(), paused_at);

        timeline.reset();
        assert_eq!(timeline.position(), ClockTime::ZERO);
        assert!(matches!(bus.pop(), Some(Event::Warning { .. })));
    }
}

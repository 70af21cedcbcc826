//! The supervision loop.
//!
//! A [`MainLoop`] runs on a single thread. Each iteration dispatches pending
//! bus events to a handler, fires the periodic timers that are due, and
//! then sleeps until the bus wakes it, the next timer is due, or the loop
//! is cancelled through a [`LoopHandle`]. Timers never consume bus events.
//!
//! Whatever ends the loop, the pipeline is driven back to Null before
//! [`MainLoop::run`] returns.
//!
//! # Example
//!
//! ```rust
//! use mediagraph::pipeline::{default_handler, LoopConfig, LoopExit, MainLoop, Pipeline, State};
//! use mediagraph::runtime::Runtime;
//!
//! let runtime = Runtime::new();
//! let mut pipeline = Pipeline::new(&runtime, "test");
//! pipeline.make("videotestsrc", "src").unwrap();
//! pipeline.make("fakesink", "sink").unwrap();
//! pipeline.link("src", "sink").unwrap();
//! pipeline.element_mut("src").unwrap().set_property("num-buffers", 3i64).unwrap();
//! pipeline.set_state(State::Playing).unwrap();
//!
//! let mut main_loop = MainLoop::new(LoopConfig::default());
//! let exit = main_loop.run_blocking(&mut pipeline, default_handler).unwrap();
//! assert_eq!(exit, LoopExit::Stopped);
//! assert_eq!(pipeline.state(), State::Null);
//! ```

use super::{Event, Flow, Pipeline, State};
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::Instrument;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a supervision loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Events dispatched before due timers get a chance to run.
    pub max_batch: usize,

    /// When a timer falls more than one period behind, fire it once and
    /// reschedule from now instead of firing every missed tick.
    pub coalesce_missed_ticks: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_batch: 64,
            coalesce_missed_ticks: true,
        }
    }
}

impl LoopConfig {
    /// Interleave timers with events more finely.
    pub fn responsive() -> Self {
        Self {
            max_batch: 8,
            ..Self::default()
        }
    }

    /// Fire every missed timer tick.
    pub fn catch_up() -> Self {
        Self {
            coalesce_missed_ticks: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Whether a timer stays installed after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFlow {
    /// Fire again after another interval.
    Repeat,
    /// Uninstall the timer.
    Remove,
}

/// Identifier of an installed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type TimerCallback = Box<dyn FnMut(&mut Pipeline) -> TimerFlow>;

struct Timer {
    id: TimerId,
    interval: Duration,
    next_due: Instant,
    callback: TimerCallback,
}

// ============================================================================
// Handle
// ============================================================================

struct HandleInner {
    quit: AtomicBool,
    wake: Notify,
}

/// Cancels a running loop from anywhere.
#[derive(Clone)]
pub struct LoopHandle {
    inner: Arc<HandleInner>,
}

impl LoopHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                quit: AtomicBool::new(false),
                wake: Notify::new(),
            }),
        }
    }

    /// Ask the loop to exit after the current iteration.
    pub fn quit(&self) {
        self.inner.quit.store(true, Ordering::Release);
        self.inner.wake.notify_one();
    }

    /// Whether a quit was requested and not yet honoured.
    pub fn is_quit(&self) -> bool {
        self.inner.quit.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("quit", &self.is_quit())
            .finish()
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The event handler returned [`Flow::Stop`].
    Stopped,
    /// [`LoopHandle::quit`] was called.
    Cancelled,
}

/// Single-threaded supervision loop.
pub struct MainLoop {
    config: LoopConfig,
    timers: Vec<Timer>,
    next_timer: u64,
    handle: LoopHandle,
}

impl MainLoop {
    /// Create a loop with no timers.
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            timers: Vec::new(),
            next_timer: 0,
            handle: LoopHandle::new(),
        }
    }

    /// Get a handle that can cancel the loop.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Install a periodic timer. It first fires one `interval` from now.
    pub fn add_timer<F>(&mut self, interval: Duration, callback: F) -> TimerId
    where
        F: FnMut(&mut Pipeline) -> TimerFlow + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer {
            id,
            interval,
            next_due: Instant::now() + interval,
            callback: Box::new(callback),
        });
        id
    }

    /// Uninstall a timer. Returns `false` if it was not installed.
    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Number of installed timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Supervise `pipeline` until `handler` returns [`Flow::Stop`] or the
    /// loop is cancelled, then drive the pipeline to Null.
    pub async fn run<H>(&mut self, pipeline: &mut Pipeline, mut handler: H) -> Result<LoopExit>
    where
        H: FnMut(&mut Pipeline, &Event) -> Flow,
    {
        let span = tracing::info_span!("main_loop", pipeline = %pipeline.name());
        let exit = self
            .pump(pipeline, &mut handler)
            .instrument(span.clone())
            .await;

        let _enter = span.enter();
        self.handle.inner.quit.store(false, Ordering::Release);
        tracing::info!("loop exited ({:?}), stopping pipeline", exit);
        pipeline.set_state(State::Null)?;
        Ok(exit)
    }

    /// Run on a fresh current-thread tokio runtime.
    pub fn run_blocking<H>(&mut self, pipeline: &mut Pipeline, handler: H) -> Result<LoopExit>
    where
        H: FnMut(&mut Pipeline, &Event) -> Flow,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.run(pipeline, handler))
    }

    async fn pump<H>(&mut self, pipeline: &mut Pipeline, handler: &mut H) -> LoopExit
    where
        H: FnMut(&mut Pipeline, &Event) -> Flow,
    {
        let bus = pipeline.bus().clone();
        let handle = self.handle.clone();

        loop {
            if handle.is_quit() {
                return LoopExit::Cancelled;
            }
            if pipeline.dispatch_pending(self.config.max_batch, handler) == Flow::Stop {
                return LoopExit::Stopped;
            }
            self.fire_due_timers(pipeline);
            if handle.is_quit() {
                return LoopExit::Cancelled;
            }
            if !bus.is_empty() {
                tokio::task::yield_now().await;
                continue;
            }

            let next_due = self.timers.iter().map(|t| t.next_due).min();
            tokio::select! {
                biased;
                _ = handle.inner.wake.notified() => {}
                _ = bus.wait() => {}
                _ = sleep_until(next_due) => {}
            }
        }
    }

    fn fire_due_timers(&mut self, pipeline: &mut Pipeline) {
        let now = Instant::now();
        let coalesce = self.config.coalesce_missed_ticks;
        self.timers.retain_mut(|timer| {
            if timer.next_due > now {
                return true;
            }
            let flow = (timer.callback)(pipeline);
            timer.next_due += timer.interval;
            if coalesce && timer.next_due <= now {
                tracing::debug!("timer {:?} falling behind, skipping missed ticks", timer.id);
                timer.next_due = now + timer.interval;
            }
            flow == TimerFlow::Repeat
        });
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}

impl std::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoop")
            .field("config", &self.config)
            .field("timers", &self.timers.len())
            .finish()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

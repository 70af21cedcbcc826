//! The pipeline bus.
//!
//! A single ordered, unbounded queue of [`Event`]s per pipeline. Elements
//! post from any thread without blocking; the supervision loop is the only
//! consumer. Events come out in exactly the order the posts were
//! serialised by the channel, with no coalescing.
//!
//! While the owning pipeline is in Null the bus is flushing: posts are
//! dropped so that nothing from an unprepared graph reaches the loop.

use super::Event;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Verdict of an event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep polling the bus.
    Continue,
    /// Leave the supervision loop.
    Stop,
}

struct BusInner {
    sender: kanal::Sender<Event>,
    receiver: kanal::Receiver<Event>,
    wake: Notify,
    flushing: AtomicBool,
    posted: AtomicU64,
}

/// Handle to a pipeline bus.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Bus {
    /// Create a bus. A new bus is flushing until it is enabled.
    pub fn new() -> Self {
        let (sender, receiver) = kanal::unbounded();
        Self {
            inner: Arc::new(BusInner {
                sender,
                receiver,
                wake: Notify::new(),
                flushing: AtomicBool::new(true),
                posted: AtomicU64::new(0),
            }),
        }
    }

    /// Post an event.
    ///
    /// Never blocks. Returns `false` if the event was dropped because the
    /// bus is flushing.
    pub fn post(&self, event: Event) -> bool {
        if self.inner.flushing.load(Ordering::Acquire) {
            tracing::trace!(event = event.type_name(), "bus flushing, event dropped");
            return false;
        }
        if self.inner.sender.send(event).is_err() {
            return false;
        }
        self.inner.posted.fetch_add(1, Ordering::Relaxed);
        self.inner.wake.notify_one();
        true
    }

    /// Take the oldest pending event, if any.
    pub fn pop(&self) -> Option<Event> {
        self.inner.receiver.try_recv().ok().flatten()
    }

    /// Deliver pending events to `handler` in post order.
    ///
    /// Stops at the first event for which the handler returns
    /// [`Flow::Stop`]; later events stay queued.
    pub fn drain<F>(&self, mut handler: F) -> Flow
    where
        F: FnMut(&Event) -> Flow,
    {
        while let Some(event) = self.pop() {
            if handler(&event) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Wait until something was posted since the last wake-up.
    ///
    /// May return while the queue is empty; callers re-check with
    /// [`pop`](Self::pop).
    pub async fn wait(&self) {
        self.inner.wake.notified().await;
    }

    /// Enable or disable flushing. Enabling it discards pending events.
    pub fn set_flushing(&self, flushing: bool) {
        self.inner.flushing.store(flushing, Ordering::Release);
        if flushing {
            let mut dropped = 0usize;
            while self.pop().is_some() {
                dropped += 1;
            }
            if dropped > 0 {
                tracing::debug!(dropped, "flushed pending bus events");
            }
        }
    }

    /// Whether posts are currently dropped.
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.load(Ordering::Acquire)
    }

    /// Number of events waiting to be taken.
    pub fn pending(&self) -> usize {
        self.inner.receiver.len()
    }

    /// Whether no event is waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.receiver.is_empty()
    }

    /// Total number of events accepted since creation.
    pub fn posted(&self) -> u64 {
        self.inner.posted.load(Ordering::Relaxed)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("flushing", &self.is_flushing())
            .field("posted", &self.posted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn custom(name: &str) -> Event {
        Event::Custom {
            source: "test".to_string(),
            name: name.to_string(),
        }
    }

    fn live_bus() -> Bus {
        let bus = Bus::new();
        bus.set_flushing(false);
        bus
    }

    #[test]
    fn test_new_bus_is_flushing() {
        let bus = Bus::new();
        assert!(!bus.post(custom("dropped")));
        assert!(bus.pop().is_none());
        assert_eq!(bus.posted(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let bus = live_bus();
        assert!(bus.post(custom("e1")));
        assert!(bus.post(custom("e2")));

        let mut seen = Vec::new();
        let flow = bus.drain(|event| {
            seen.push(event.clone());
            Flow::Continue
        });
        assert_eq!(flow, Flow::Continue);
        assert_eq!(seen, vec![custom("e1"), custom("e2")]);
    }

    #[test]
    fn test_drain_stops_and_keeps_rest() {
        let bus = live_bus();
        bus.post(Event::Eos { source: None });
        bus.post(custom("after"));

        let flow = bus.drain(|event| {
            if event.is_terminal() {
                Flow::Stop
            } else {
                Flow::Continue
            }
        });
        assert_eq!(flow, Flow::Stop);
        assert_eq!(bus.pop(), Some(custom("after")));
    }

    #[test]
    fn test_flushing_discards_pending() {
        let bus = live_bus();
        bus.post(custom("stale"));
        bus.set_flushing(true);
        assert!(bus.pop().is_none());
        assert!(bus.is_flushing());
    }

    #[test]
    fn test_concurrent_producers_keep_per_thread_order() {
        let bus = live_bus();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        bus.post(custom(&format!("{t}:{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last = [None::<usize>; 4];
        let mut total = 0;
        bus.drain(|event| {
            let Event::Custom { name, .. } = event else {
                panic!("unexpected event {event}");
            };
            let (t, i) = name.split_once(':').unwrap();
            let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            assert!(last[t].is_none_or(|prev| prev < i));
            last[t] = Some(i);
            total += 1;
            Flow::Continue
        });
        assert_eq!(total, 400);
    }

    #[tokio::test]
    async fn test_wait_wakes_on_post_from_thread() {
        let bus = live_bus();
        let poster = bus.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            poster.post(custom("late"));
        });

        tokio::time::timeout(Duration::from_secs(2), bus.wait())
            .await
            .unwrap();
        assert_eq!(bus.pop(), Some(custom("late")));
    }
}

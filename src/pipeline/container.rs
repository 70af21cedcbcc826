//! The top-level pipeline container.

use super::{Bus, Event, Flow, Graph, LinkInfo, State, StateChange};
use crate::clock::{ClockTime, PipelineClock};
use crate::element::{Element, PadDirection};
use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// A named graph of elements with its own bus and lifecycle.
///
/// The pipeline owns every element added to it. Dropping a pipeline that is
/// not in Null drives it there first, so every element releases what it
/// holds.
///
/// # Example
///
/// ```rust
/// use mediagraph::pipeline::{Pipeline, State};
/// use mediagraph::runtime::Runtime;
///
/// let runtime = Runtime::new();
/// let mut pipeline = Pipeline::new(&runtime, "test");
/// pipeline.make("videotestsrc", "src").unwrap();
/// pipeline.make("fakesink", "sink").unwrap();
/// pipeline.link("src", "sink").unwrap();
///
/// pipeline.set_state(State::Paused).unwrap();
/// assert_eq!(pipeline.state(), State::Paused);
/// pipeline.set_state(State::Null).unwrap();
/// ```
pub struct Pipeline {
    name: String,
    runtime: Runtime,
    graph: Graph,
    state: State,
    bus: Bus,
    clock: PipelineClock,
    /// Factory lookups that failed during assembly, by element name.
    assembly_failures: Vec<(String, String)>,
    /// `(announcing element, waiting element)` pairs for runtime pads.
    pad_added_links: Vec<(String, String)>,
    span: tracing::Span,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(runtime: &Runtime, name: impl Into<String>) -> Self {
        let name = name.into();
        let span = tracing::info_span!("pipeline", name = %name);
        Self {
            name,
            runtime: runtime.clone(),
            graph: Graph::new(),
            state: State::Null,
            bus: Bus::new(),
            clock: PipelineClock::new(),
            assembly_failures: Vec::new(),
            pad_added_links: Vec::new(),
            span,
        }
    }

    /// Get the pipeline's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Get the pipeline's bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Get the runtime this pipeline creates elements from.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Get the element graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Add an element.
    ///
    /// An element added after the pipeline left Null is first brought to the
    /// pipeline's state. If that fails, the element is taken back to where
    /// it started and the add is refused.
    pub fn add(&mut self, mut element: Element) -> Result<()> {
        if self.graph.contains(element.name()) {
            return Err(Error::DuplicateElementName(element.name().to_string()));
        }

        let mut done = Vec::new();
        for step in element.state().path_to(self.state) {
            if let Err(e) = element.change_state(step, &self.bus) {
                for step in done.iter().rev().map(|s: &StateChange| s.reverse()) {
                    if let Err(revert) = element.change_state(step, &self.bus) {
                        tracing::warn!("element '{}' failed to revert: {}", element.name(), revert);
                    }
                }
                return Err(e);
            }
            done.push(step);
        }

        let name = element.name().to_string();
        self.graph.add(element)?;
        self.assembly_failures.retain(|(failed, _)| *failed != name);
        Ok(())
    }

    /// Add several elements, stopping at the first failure.
    pub fn add_many(&mut self, elements: impl IntoIterator<Item = Element>) -> Result<()> {
        elements.into_iter().try_for_each(|element| self.add(element))
    }

    /// Create an element from the runtime's factory and add it.
    ///
    /// A failed lookup is remembered: the pipeline refuses to leave Null
    /// until an element with that name is added.
    pub fn make(&mut self, kind: &str, name: &str) -> Result<()> {
        match self.runtime.make_element(kind, name) {
            Ok(element) => self.add(element),
            Err(e) => {
                tracing::warn!("could not create '{}' of kind '{}': {}", name, kind, e);
                self.assembly_failures
                    .push((name.to_string(), format!("{name} ({kind}): {e}")));
                Err(e)
            }
        }
    }

    /// Find an element by name, including inside bins.
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.graph.find(name)
    }

    /// Find an element by name for configuration.
    pub fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.graph.find_mut(name)
    }

    /// Link `src:src_pad` to `sink:sink_pad`.
    pub fn link_pads(
        &mut self,
        src: &str,
        src_pad: &str,
        sink: &str,
        sink_pad: &str,
    ) -> Result<LinkInfo> {
        self.graph.link_pads(src, src_pad, sink, sink_pad)
    }

    /// Link two elements through their first compatible free pads.
    pub fn link(&mut self, src: &str, sink: &str) -> Result<LinkInfo> {
        self.graph.link(src, sink)
    }

    /// Link a chain of elements pairwise.
    pub fn link_many(&mut self, names: &[&str]) -> Result<Vec<LinkInfo>> {
        self.graph.link_many(names)
    }

    /// All links between direct children.
    pub fn links(&self) -> Vec<LinkInfo> {
        self.graph.links()
    }

    /// Link pads that `src` announces at runtime to a free sink pad of
    /// `sink`.
    ///
    /// The link is made when the `PadAdded` event is dispatched, see
    /// [`link_dynamic_pad`](Self::link_dynamic_pad).
    ///
    /// Both elements may sit inside a bin, but they must share the same
    /// parent.
    pub fn connect_pad_added(&mut self, src: &str, sink: &str) -> Result<()> {
        let owner = self
            .graph
            .owner_of(src)
            .ok_or_else(|| Error::ElementNotFound(src.to_string()))?;
        if !owner.contains(sink) {
            if self.graph.find(sink).is_none() {
                return Err(Error::ElementNotFound(sink.to_string()));
            }
            return Err(Error::InvalidLink(format!(
                "'{src}' and '{sink}' do not share a parent"
            )));
        }
        self.pad_added_links
            .push((src.to_string(), sink.to_string()));
        Ok(())
    }

    /// Try to link a pad announced at runtime.
    ///
    /// Returns `Ok(None)` when no element waits for pads of `element`, or
    /// none of the waiting elements has a free compatible sink pad.
    pub fn link_dynamic_pad(&mut self, element: &str, pad: &str) -> Result<Option<LinkInfo>> {
        let owner = self
            .graph
            .owner_of(element)
            .ok_or_else(|| Error::ElementNotFound(element.to_string()))?;
        let announcing = owner
            .get(element)
            .ok_or_else(|| Error::ElementNotFound(element.to_string()))?;
        let announced = announcing.pad(pad).ok_or_else(|| Error::PadNotFound {
            element: element.to_string(),
            pad: pad.to_string(),
        })?;
        if announced.direction() != PadDirection::Src || announced.is_linked() {
            return Ok(None);
        }
        let caps = announcing.pad_caps(pad);

        let target = self
            .pad_added_links
            .iter()
            .filter(|(src, _)| src == element)
            .find_map(|(_, sink)| {
                let sink_pad = owner
                    .get(sink)?
                    .compatible_pad(PadDirection::Sink, caps.as_ref())?;
                Some((sink.clone(), sink_pad.to_string()))
            });

        let Some((sink, sink_pad)) = target else {
            return Ok(None);
        };
        let owner = self
            .graph
            .owner_of_mut(element)
            .ok_or_else(|| Error::ElementNotFound(element.to_string()))?;
        owner.link_pads(element, pad, &sink, &sink_pad).map(Some)
    }

    /// Drive the pipeline to `target` one adjacent state at a time.
    ///
    /// Requesting the current state does nothing. If a step fails the
    /// pipeline stays in the last state it fully reached, which is reported
    /// in [`Error::TransitionFailed`].
    pub fn set_state(&mut self, target: State) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.state == target {
            tracing::debug!("already in {}", target);
            return Ok(());
        }
        if self.state == State::Null {
            self.check_assembly()?;
        }

        for step in self.state.path_to(target) {
            self.apply(step).map_err(|e| {
                tracing::error!("state change {} failed: {}", step, e);
                Error::TransitionFailed {
                    state: self.state,
                    cause: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    fn check_assembly(&self) -> Result<()> {
        if !self.assembly_failures.is_empty() {
            let failures: Vec<&str> = self
                .assembly_failures
                .iter()
                .map(|(_, reason)| reason.as_str())
                .collect();
            return Err(Error::IncompleteAssembly(failures.join("; ")));
        }
        if self.graph.is_empty() {
            return Err(Error::IncompleteAssembly("pipeline has no elements".to_string()));
        }
        if let Some((element, property)) = self.graph.missing_required() {
            return Err(Error::InvalidProperty {
                element,
                property: property.to_string(),
                reason: "required property is not set".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, step: StateChange) -> Result<()> {
        if step == StateChange::NullToReady {
            self.bus.set_flushing(false);
        }
        if let Err(e) = self.graph.change_state(step, &self.bus) {
            if step == StateChange::NullToReady {
                self.bus.set_flushing(true);
            }
            return Err(e);
        }

        match step {
            StateChange::PausedToPlaying => self.clock.start(),
            StateChange::PlayingToPaused => self.clock.pause(),
            StateChange::PausedToReady => self.clock.reset(),
            _ => {}
        }

        let old = self.state;
        self.state = step.next();
        tracing::debug!("state changed {} -> {}", old, self.state);
        self.bus.post(Event::StateChanged {
            source: self.name.clone(),
            old,
            new: self.state,
        });

        if step == StateChange::ReadyToNull {
            self.bus.set_flushing(true);
        }
        Ok(())
    }

    /// Dispatch up to `limit` pending bus events to `handler`.
    ///
    /// Pads announced by `PadAdded` are added to their element before the
    /// handler sees the event. Stops early when the handler returns
    /// [`Flow::Stop`].
    pub fn dispatch_pending<H>(&mut self, limit: usize, handler: &mut H) -> Flow
    where
        H: FnMut(&mut Pipeline, &Event) -> Flow,
    {
        for _ in 0..limit {
            let Some(event) = self.bus.pop() else {
                break;
            };
            self.materialize(&event);
            if handler(self, &event) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Dispatch every pending bus event to `handler`.
    pub fn drain<H>(&mut self, mut handler: H) -> Flow
    where
        H: FnMut(&mut Pipeline, &Event) -> Flow,
    {
        self.dispatch_pending(usize::MAX, &mut handler)
    }

    fn materialize(&mut self, event: &Event) {
        let Event::PadAdded { element, pad } = event else {
            return;
        };
        match self.graph.find_mut(element) {
            Some(owner) => {
                if let Err(e) = owner.add_pad(pad.clone()) {
                    tracing::debug!("ignoring announced pad: {}", e);
                }
            }
            None => tracing::warn!("pad announced by unknown element '{}'", element),
        }
    }

    /// Running time spent in Playing, while at least Paused.
    pub fn query_position(&self) -> Option<ClockTime> {
        (self.state >= State::Paused).then(|| self.clock.running_time())
    }

    /// Longest stream duration reported by any element.
    pub fn query_duration(&self) -> Option<ClockTime> {
        self.graph.duration()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if self.state != State::Null {
            if let Err(e) = self.set_state(State::Null) {
                tracing::warn!("pipeline '{}' dropped outside Null: {}", self.name, e);
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("graph", &self.graph)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Runtime {
        Runtime::new()
    }

    #[test]
    fn test_empty_pipeline_cannot_start() {
        let mut pipeline = Pipeline::new(&runtime(), "empty");
        let err = pipeline.set_state(State::Ready).unwrap_err();
        assert!(matches!(err, Error::IncompleteAssembly(_)));
        assert_eq!(pipeline.state(), State::Null);
    }

    #[test]
    fn test_bus_flushing_follows_null() {
        let mut pipeline = Pipeline::new(&runtime(), "p");
        pipeline.make("fakesink", "sink").unwrap();
        assert!(pipeline.bus().is_flushing());

        pipeline.set_state(State::Ready).unwrap();
        assert!(!pipeline.bus().is_flushing());
        assert!(matches!(
            pipeline.bus().pop(),
            Some(Event::StateChanged {
                old: State::Null,
                new: State::Ready,
                ..
            })
        ));

        pipeline.set_state(State::Null).unwrap();
        assert!(pipeline.bus().is_flushing());
        assert!(pipeline.bus().pop().is_none());
    }

    #[test]
    fn test_position_frozen_outside_playing() {
        let mut pipeline = Pipeline::new(&runtime(), "p");
        pipeline.make("fakesink", "sink").unwrap();
        assert_eq!(pipeline.query_position(), None);

        pipeline.set_state(State::Playing).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        pipeline.set_state(State::Paused).unwrap();
        let paused = pipeline.query_position().unwrap();
        assert!(paused >= ClockTime::from_millis(20));
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(pipeline.query_position(), Some(paused));
    }

    #[test]
    fn test_added_element_follows_pipeline_state() {
        let mut pipeline = Pipeline::new(&runtime(), "p");
        pipeline.make("fakesink", "a").unwrap();
        pipeline.set_state(State::Paused).unwrap();

        pipeline.make("fakesink", "b").unwrap();
        assert_eq!(pipeline.element("b").unwrap().state(), State::Paused);

        let mut stubborn = pipeline.runtime().make_element("fakesink", "c").unwrap();
        stubborn.set_property("fail-on", "paused").unwrap();
        assert!(pipeline.add(stubborn).is_err());
        assert!(pipeline.element("c").is_none());
    }

    #[test]
    fn test_pad_added_materialized_before_handler() {
        let mut pipeline = Pipeline::new(&runtime(), "p");
        pipeline.make("oggdemux", "demuxer").unwrap();
        pipeline.make("vorbisdec", "decoder").unwrap();
        pipeline.connect_pad_added("demuxer", "decoder").unwrap();
        pipeline.set_state(State::Ready).unwrap();
        pipeline.drain(|_, _| Flow::Continue);

        let template = pipeline.element("demuxer").unwrap().templates()[1].clone();
        pipeline.bus().post(Event::PadAdded {
            element: "demuxer".to_string(),
            pad: crate::element::Pad::from_template(&template, "audio_0"),
        });

        let mut linked = None;
        pipeline.drain(|p, event| {
            if let Event::PadAdded { element, pad } = event {
                assert!(p.element(element).unwrap().pad(pad.name()).is_some());
                linked = p.link_dynamic_pad(element, pad.name()).unwrap();
            }
            Flow::Continue
        });

        let link = linked.unwrap();
        assert_eq!(link.sink.to_string(), "decoder:sink");
        assert_eq!(pipeline.links().len(), 1);
    }
}

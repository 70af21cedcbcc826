//! Element graph structure using daggy.
//!
//! A [`Graph`] owns a set of uniquely named elements and the directed links
//! between their pads. It is the storage behind both [`Pipeline`] and
//! [`Bin`]; daggy rejects any link that would close a cycle.
//!
//! [`Pipeline`]: super::Pipeline
//! [`Bin`]: super::Bin

use super::{Bus, StateChange};
use crate::caps::{Caps, intersect_optional};
use crate::clock::ClockTime;
use crate::element::{Element, PadDirection, PadRef};
use crate::error::{Error, Result};
use daggy::{Dag, EdgeIndex, NodeIndex};
use std::collections::HashMap;

/// Edge weight: the pads joined by a link.
#[derive(Debug, Clone)]
struct Link {
    src_pad: String,
    sink_pad: String,
    caps: Option<Caps>,
}

/// Public description of a link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    /// Upstream pad.
    pub src: PadRef,
    /// Downstream pad.
    pub sink: PadRef,
    /// Intersection of both pads' caps at link time, `None` if unconstrained.
    pub caps: Option<Caps>,
}

/// Elements plus the links between their pads.
pub struct Graph {
    dag: Dag<Element, Link>,
    by_name: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            dag: Dag::new(),
            by_name: HashMap::new(),
        }
    }

    /// Take ownership of an element.
    pub fn add(&mut self, element: Element) -> Result<()> {
        if self.by_name.contains_key(element.name()) {
            return Err(Error::DuplicateElementName(element.name().to_string()));
        }
        let name = element.name().to_string();
        let idx = self.dag.add_node(element);
        self.by_name.insert(name, idx);
        Ok(())
    }

    /// Whether a direct child has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Get a direct child by name.
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.by_name
            .get(name)
            .and_then(|&idx| self.dag.node_weight(idx))
    }

    /// Get a mutable reference to a direct child.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Element> {
        let idx = *self.by_name.get(name)?;
        self.dag.node_weight_mut(idx)
    }

    /// Find an element by name, searching nested bins.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.get(name).or_else(|| {
            self.elements()
                .filter_map(Element::children)
                .find_map(|graph| graph.find(name))
        })
    }

    /// Find an element by name for mutation, searching nested bins.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        if self.contains(name) {
            return self.get_mut(name);
        }
        let owner = self.by_name.values().copied().find(|&idx| {
            self.dag[idx]
                .children()
                .is_some_and(|graph| graph.find(name).is_some())
        })?;
        self.dag[owner].children_mut()?.find_mut(name)
    }

    /// The graph holding `name` as a direct child: this one or a nested
    /// bin's.
    pub fn owner_of(&self, name: &str) -> Option<&Graph> {
        if self.contains(name) {
            return Some(self);
        }
        self.elements()
            .filter_map(Element::children)
            .find_map(|graph| graph.owner_of(name))
    }

    /// Mutable access to the graph holding `name` as a direct child.
    pub fn owner_of_mut(&mut self, name: &str) -> Option<&mut Graph> {
        if self.contains(name) {
            return Some(self);
        }
        let owner = self.by_name.values().copied().find(|&idx| {
            self.dag[idx]
                .children()
                .is_some_and(|graph| graph.owner_of(name).is_some())
        })?;
        self.dag[owner].children_mut()?.owner_of_mut(name)
    }

    /// Direct children in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.dag.raw_nodes().iter().map(|node| &node.weight)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.dag.node_count()
    }

    /// Whether the graph holds no element.
    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// All links in creation order.
    pub fn links(&self) -> Vec<LinkInfo> {
        self.dag
            .raw_edges()
            .iter()
            .map(|edge| LinkInfo {
                src: PadRef::new(self.dag[edge.source()].name(), &edge.weight.src_pad),
                sink: PadRef::new(self.dag[edge.target()].name(), &edge.weight.sink_pad),
                caps: edge.weight.caps.clone(),
            })
            .collect()
    }

    fn index(&self, name: &str) -> Result<NodeIndex> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    /// Link `src:src_pad` to `sink:sink_pad`.
    ///
    /// Validation happens before anything is touched, so a failed link
    /// leaves the graph exactly as it was. When the intersected caps are
    /// already fixed, both pads are marked negotiated.
    pub fn link_pads(
        &mut self,
        src: &str,
        src_pad: &str,
        sink: &str,
        sink_pad: &str,
    ) -> Result<LinkInfo> {
        let src_idx = self.index(src)?;
        let sink_idx = self.index(sink)?;
        let src_ref = PadRef::new(src, src_pad);
        let sink_ref = PadRef::new(sink, sink_pad);

        if src_idx == sink_idx {
            return Err(Error::InvalidLink(format!("cannot link '{src}' to itself")));
        }

        let caps = {
            let src_el = &self.dag[src_idx];
            let sink_el = &self.dag[sink_idx];
            let out = src_el.pad(src_pad).ok_or_else(|| Error::PadNotFound {
                element: src.to_string(),
                pad: src_pad.to_string(),
            })?;
            let inp = sink_el.pad(sink_pad).ok_or_else(|| Error::PadNotFound {
                element: sink.to_string(),
                pad: sink_pad.to_string(),
            })?;

            if out.direction() != PadDirection::Src {
                return Err(Error::InvalidLink(format!("{src_ref} is not a source pad")));
            }
            if inp.direction() != PadDirection::Sink {
                return Err(Error::InvalidLink(format!("{sink_ref} is not a sink pad")));
            }
            if out.is_linked() {
                return Err(Error::PortBusy(src_ref.to_string()));
            }
            if inp.is_linked() {
                return Err(Error::PortBusy(sink_ref.to_string()));
            }

            let src_caps = src_el.pad_caps(src_pad);
            let sink_caps = sink_el.pad_caps(sink_pad);
            intersect_optional(src_caps.as_ref(), sink_caps.as_ref()).ok_or_else(|| {
                Error::IncompatibleCapabilities {
                    src: src_ref.to_string(),
                    sink: sink_ref.to_string(),
                    src_caps: describe(src_caps.as_ref()),
                    sink_caps: describe(sink_caps.as_ref()),
                }
            })?
        };

        let link = Link {
            src_pad: src_pad.to_string(),
            sink_pad: sink_pad.to_string(),
            caps: caps.clone(),
        };
        self.dag.add_edge(src_idx, sink_idx, link).map_err(|_| {
            Error::InvalidLink(format!("linking {src_ref} to {sink_ref} would create a cycle"))
        })?;

        if let Some(pad) = self.dag[src_idx].pad_mut(src_pad) {
            pad.set_peer(Some(sink_ref.clone()));
        }
        if let Some(pad) = self.dag[sink_idx].pad_mut(sink_pad) {
            pad.set_peer(Some(src_ref.clone()));
        }
        if let Some(fixed) = caps.as_ref().filter(|c| c.is_fixed()) {
            self.dag[src_idx].set_negotiated_caps(src_pad, Some(fixed.clone()))?;
            self.dag[sink_idx].set_negotiated_caps(sink_pad, Some(fixed.clone()))?;
        }

        tracing::debug!(src = %src_ref, sink = %sink_ref, caps = %describe(caps.as_ref()), "linked");
        Ok(LinkInfo {
            src: src_ref,
            sink: sink_ref,
            caps,
        })
    }

    /// Link two elements through their first compatible free pads.
    pub fn link(&mut self, src: &str, sink: &str) -> Result<LinkInfo> {
        let src_el = self
            .get(src)
            .ok_or_else(|| Error::ElementNotFound(src.to_string()))?;
        let sink_el = self
            .get(sink)
            .ok_or_else(|| Error::ElementNotFound(sink.to_string()))?;

        let free_srcs: Vec<String> = src_el
            .pads()
            .srcs()
            .filter(|p| !p.is_linked())
            .map(|p| p.name().to_string())
            .collect();
        let Some(first_src) = free_srcs.first().cloned() else {
            return Err(Error::InvalidLink(format!("'{src}' has no free source pad")));
        };

        let pair = free_srcs.iter().find_map(|pad| {
            let caps = src_el.pad_caps(pad);
            sink_el
                .compatible_pad(PadDirection::Sink, caps.as_ref())
                .map(|sink_pad| (pad.clone(), sink_pad.to_string()))
        });

        match pair {
            Some((src_pad, sink_pad)) => self.link_pads(src, &src_pad, sink, &sink_pad),
            None => {
                // Report why the first free pair does not fit.
                let sink_pad = sink_el
                    .pads()
                    .sinks()
                    .find(|p| !p.is_linked())
                    .map(|p| p.name().to_string())
                    .ok_or_else(|| Error::InvalidLink(format!("'{sink}' has no free sink pad")))?;
                self.link_pads(src, &first_src, sink, &sink_pad)
            }
        }
    }

    /// Link a chain of elements pairwise.
    ///
    /// All or nothing: if a pair fails, the links made by this call are
    /// removed again before the error is returned.
    pub fn link_many(&mut self, names: &[&str]) -> Result<Vec<LinkInfo>> {
        let before = self.dag.edge_count();
        let mut links = Vec::with_capacity(names.len().saturating_sub(1));
        for pair in names.windows(2) {
            match self.link(pair[0], pair[1]) {
                Ok(link) => links.push(link),
                Err(e) => {
                    while self.dag.edge_count() > before && self.unlink_last() {}
                    return Err(e);
                }
            }
        }
        Ok(links)
    }

    /// Remove the most recent link and free both of its pads.
    fn unlink_last(&mut self) -> bool {
        let Some(last) = self.dag.edge_count().checked_sub(1) else {
            return false;
        };
        let idx: EdgeIndex = EdgeIndex::new(last);
        let Some((src, sink)) = self.dag.graph().edge_endpoints(idx) else {
            return false;
        };
        let Some(link) = self.dag.remove_edge(idx) else {
            return false;
        };
        let negotiated = link.caps.as_ref().is_some_and(Caps::is_fixed);
        for (node, pad) in [(src, &link.src_pad), (sink, &link.sink_pad)] {
            let element = &mut self.dag[node];
            if let Some(pad) = element.pad_mut(pad) {
                pad.set_peer(None);
            }
            if negotiated {
                if let Err(e) = element.set_negotiated_caps(pad, None) {
                    tracing::warn!(element = %element.name(), error = %e, "could not clear caps");
                }
            }
        }
        tracing::debug!(src = %link.src_pad, sink = %link.sink_pad, "unlinked");
        true
    }

    /// Element indices with every downstream element before its upstream.
    fn sink_first_order(&self) -> Vec<NodeIndex> {
        match daggy::petgraph::algo::toposort(self.dag.graph(), None) {
            Ok(mut order) => {
                order.reverse();
                order
            }
            Err(_) => self.dag.graph().node_indices().rev().collect(),
        }
    }

    /// Apply one lifecycle step to every element, sinks first.
    ///
    /// If an element refuses, the elements already moved are taken back
    /// and the refusal is returned.
    pub(crate) fn change_state(&mut self, transition: StateChange, bus: &Bus) -> Result<()> {
        let mut changed = Vec::new();

        for idx in self.sink_first_order() {
            let element = &mut self.dag[idx];
            if element.state() != transition.current() {
                continue;
            }
            if let Err(e) = element.change_state(transition, bus) {
                tracing::warn!(
                    element = %element.name(),
                    %transition,
                    reverted = changed.len(),
                    "state change refused"
                );
                for &done in changed.iter().rev() {
                    let element: &mut Element = &mut self.dag[done];
                    if let Err(revert) = element.change_state(transition.reverse(), bus) {
                        tracing::warn!(element = %element.name(), error = %revert, "revert failed");
                    }
                }
                return Err(e);
            }
            changed.push(idx);
        }
        Ok(())
    }

    /// Longest duration known to any element.
    pub fn duration(&self) -> Option<ClockTime> {
        self.elements().filter_map(Element::duration).max()
    }

    /// First required property left unset, searching nested bins.
    pub fn missing_required(&self) -> Option<(String, &'static str)> {
        self.elements().find_map(Element::missing_required)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("elements", &self.len())
            .field("links", &self.link_count())
            .finish()
    }
}

fn describe(caps: Option<&Caps>) -> String {
    caps.map_or_else(|| "ANY".to_string(), Caps::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementContext, ElementImpl, PadTemplate};
    use crate::pipeline::State;
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Stub {
        templates: Vec<PadTemplate>,
        refuse: Option<StateChange>,
        journal: Journal,
    }

    impl ElementImpl for Stub {
        fn pad_templates(&self) -> Vec<PadTemplate> {
            self.templates.clone()
        }

        fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
            if self.refuse == Some(transition) {
                return Err(Error::Element("refused".into()));
            }
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", ctx.name(), transition));
            Ok(())
        }
    }

    fn stub(name: &str, templates: Vec<PadTemplate>, journal: &Journal) -> Element {
        Element::new(
            name,
            "stub",
            Box::new(Stub {
                templates,
                refuse: None,
                journal: journal.clone(),
            }),
        )
    }

    fn chain(journal: &Journal) -> Graph {
        let mut graph = Graph::new();
        graph
            .add(stub("src", vec![PadTemplate::src("src")], journal))
            .unwrap();
        graph
            .add(stub(
                "filter",
                vec![PadTemplate::sink("sink"), PadTemplate::src("src")],
                journal,
            ))
            .unwrap();
        graph
            .add(stub("sink", vec![PadTemplate::sink("sink")], journal))
            .unwrap();
        graph
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let journal = Journal::default();
        let mut graph = chain(&journal);
        let err = graph
            .add(stub("filter", vec![], &journal))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateElementName(name) if name == "filter"));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_link_sets_peers() {
        let journal = Journal::default();
        let mut graph = chain(&journal);
        let links = graph.link_many(&["src", "filter", "sink"]).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(graph.link_count(), 2);
        let src_pad = graph.get("src").unwrap().pad("src").unwrap();
        assert_eq!(src_pad.peer(), Some(&PadRef::new("filter", "sink")));
        assert_eq!(graph.links(), links);
    }

    #[test]
    fn test_pad_links_at_most_once() {
        let journal = Journal::default();
        let mut graph = chain(&journal);
        graph.link_pads("src", "src", "filter", "sink").unwrap();

        let err = graph.link_pads("src", "src", "sink", "sink").unwrap_err();
        assert!(matches!(err, Error::PortBusy(pad) if pad == "src:src"));
        assert_eq!(graph.link_count(), 1);
        assert!(!graph.get("sink").unwrap().pad("sink").unwrap().is_linked());
    }

    #[test]
    fn test_incompatible_caps_leave_graph_untouched() {
        let journal = Journal::default();
        let mut graph = Graph::new();
        graph
            .add(stub(
                "a",
                vec![PadTemplate::src("src").with_caps(Caps::new("video/x-raw").with_int("width", 640))],
                &journal,
            ))
            .unwrap();
        graph
            .add(stub(
                "b",
                vec![PadTemplate::sink("sink").with_caps(Caps::new("video/x-raw").with_int("width", 1280))],
                &journal,
            ))
            .unwrap();

        let err = graph.link_pads("a", "src", "b", "sink").unwrap_err();
        assert!(matches!(err, Error::IncompatibleCapabilities { .. }));
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.get("a").unwrap().pad("src").unwrap().is_linked());
    }

    #[test]
    fn test_fixed_caps_negotiated_on_link() {
        let journal = Journal::default();
        let mut graph = Graph::new();
        let caps = Caps::new("audio/x-raw").with_int("rate", 44100);
        graph
            .add(stub("a", vec![PadTemplate::src("src").with_caps(caps.clone())], &journal))
            .unwrap();
        graph
            .add(stub("b", vec![PadTemplate::sink("sink")], &journal))
            .unwrap();

        let info = graph.link("a", "b").unwrap();
        assert_eq!(info.caps, Some(caps.clone()));
        assert_eq!(graph.get("b").unwrap().negotiated_caps("sink"), Some(caps));
    }

    #[test]
    fn test_direction_and_cycle_checks() {
        let journal = Journal::default();
        let mut graph = Graph::new();
        let both = || vec![PadTemplate::sink("sink"), PadTemplate::src("src")];
        graph.add(stub("a", both(), &journal)).unwrap();
        graph.add(stub("b", both(), &journal)).unwrap();

        assert!(matches!(
            graph.link_pads("a", "sink", "b", "sink"),
            Err(Error::InvalidLink(_))
        ));
        assert!(matches!(
            graph.link_pads("a", "src", "a", "sink"),
            Err(Error::InvalidLink(_))
        ));
        graph.link("a", "b").unwrap();
        assert!(matches!(graph.link("b", "a"), Err(Error::InvalidLink(_))));
        assert!(!graph.get("b").unwrap().pad("src").unwrap().is_linked());
    }

    #[test]
    fn test_state_change_runs_sinks_first() {
        let journal = Journal::default();
        let mut graph = chain(&journal);
        graph.link_many(&["src", "filter", "sink"]).unwrap();
        let bus = Bus::new();

        graph.change_state(StateChange::NullToReady, &bus).unwrap();

        let names: Vec<String> = journal.lock().unwrap().clone();
        assert_eq!(
            names,
            vec![
                "sink:NULL -> READY",
                "filter:NULL -> READY",
                "src:NULL -> READY",
            ]
        );
        assert!(graph.elements().all(|e| e.state() == State::Ready));
    }

    #[test]
    fn test_refused_step_reverts_others() {
        let journal = Journal::default();
        let mut graph = chain(&journal);
        graph
            .add(Element::new(
                "stubborn",
                "stub",
                Box::new(Stub {
                    templates: vec![PadTemplate::sink("sink")],
                    refuse: Some(StateChange::NullToReady),
                    journal: journal.clone(),
                }),
            ))
            .unwrap();
        graph.link_many(&["src", "filter", "sink"]).unwrap();
        let bus = Bus::new();

        let err = graph
            .change_state(StateChange::NullToReady, &bus)
            .unwrap_err();
        assert!(matches!(err, Error::StateChangeRefused { element, .. } if element == "stubborn"));
        assert!(graph.elements().all(|e| e.state() == State::Null));
        let reverted = journal
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.ends_with("READY -> NULL"))
            .count();
        let advanced = journal
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.ends_with("NULL -> READY"))
            .count();
        assert_eq!(reverted, advanced);
    }
}

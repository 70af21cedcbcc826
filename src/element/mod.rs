//! Element system for Mediagraph pipelines.
//!
//! This module defines the processing nodes that pipelines are built from:
//!
//! - [`Element`]: A named node with pads, typed properties and a lifecycle
//!   state, wrapping either an opaque [`ElementImpl`] or, for bins, a nested
//!   graph of child elements
//! - [`Pad`]: A directional connection point with optional [`Caps`]
//! - [`ElementImpl`]: The behaviour supplied by an element kind
//!
//! # Example
//!
//! ```rust
//! use mediagraph::runtime::Runtime;
//!
//! let runtime = Runtime::new();
//! let mut src = runtime.make_element("filesrc", "source").unwrap();
//! src.set_property("location", "song.ogg").unwrap();
//!
//! assert_eq!(src.kind(), "filesrc");
//! assert!(src.pad("src").is_some());
//! ```

mod context;
mod pad;
mod properties;
mod traits;

pub use context::{ElementContext, ElementPoster};
pub use pad::{Pad, PadDirection, PadList, PadPresence, PadRef, PadTemplate};
pub use properties::{Properties, PropertySpec, PropertyType, PropertyValue};
pub use traits::ElementImpl;

use crate::caps::Caps;
use crate::clock::ClockTime;
use crate::error::{Error, Result};
use crate::pipeline::{Bus, Graph, State, StateChange};

pub(crate) enum Body {
    Leaf(Box<dyn ElementImpl>),
    Bin(Box<Graph>),
}

/// A named processing node.
pub struct Element {
    name: String,
    kind: String,
    templates: Vec<PadTemplate>,
    pads: PadList,
    properties: Properties,
    state: State,
    body: Body,
}

impl Element {
    /// Create an element around an implementation.
    ///
    /// Pads are instantiated from the implementation's `Always` templates.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        imp: Box<dyn ElementImpl>,
    ) -> Self {
        let templates = imp.pad_templates();
        let mut pads = PadList::new();
        for template in templates
            .iter()
            .filter(|t| t.presence == PadPresence::Always)
        {
            // Duplicate template names collapse onto the first one.
            let _ = pads.add(Pad::from_template(template, template.name.clone()));
        }

        Self {
            name: name.into(),
            kind: kind.into(),
            templates,
            pads,
            properties: Properties::new(imp.properties()),
            state: State::Null,
            body: Body::Leaf(imp),
        }
    }

    pub(crate) fn new_bin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "bin".to_string(),
            templates: Vec::new(),
            pads: PadList::new(),
            properties: Properties::default(),
            state: State::Null,
            body: Body::Bin(Box::new(Graph::new())),
        }
    }

    /// Get the element's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the kind the element was created from.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Get the element's current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether this element is a bin.
    pub fn is_bin(&self) -> bool {
        matches!(self.body, Body::Bin(_))
    }

    /// Child elements, for bins.
    pub fn children(&self) -> Option<&Graph> {
        match &self.body {
            Body::Bin(graph) => Some(&**graph),
            Body::Leaf(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Graph> {
        match &mut self.body {
            Body::Bin(graph) => Some(&mut **graph),
            Body::Leaf(_) => None,
        }
    }

    /// Pad templates declared by the element kind.
    pub fn templates(&self) -> &[PadTemplate] {
        &self.templates
    }

    /// All pads currently on the element.
    pub fn pads(&self) -> &PadList {
        &self.pads
    }

    /// Get a pad by name.
    pub fn pad(&self, name: &str) -> Option<&Pad> {
        self.pads.get(name)
    }

    pub(crate) fn pad_mut(&mut self, name: &str) -> Option<&mut Pad> {
        self.pads.get_mut(name)
    }

    /// Add a pad.
    ///
    /// A pad without caps inherits them from the first template whose name
    /// pattern and direction match.
    pub fn add_pad(&mut self, mut pad: Pad) -> Result<()> {
        if pad.caps().is_none() && !pad.is_ghost() {
            let inherited = self
                .templates
                .iter()
                .find(|t| t.direction == pad.direction() && t.matches(pad.name()))
                .and_then(|t| t.caps.clone());
            pad.set_caps(inherited);
        }

        self.pads.add(pad).map_err(|pad| Error::DuplicatePortName {
            element: self.name.clone(),
            pad: pad.name().to_string(),
        })
    }

    fn pad_or_err(&self, pad: &str) -> Result<&Pad> {
        self.pads.get(pad).ok_or_else(|| Error::PadNotFound {
            element: self.name.clone(),
            pad: pad.to_string(),
        })
    }

    /// Effective caps of a pad.
    ///
    /// For a ghost pad this is read from its target child pad on every call.
    pub fn pad_caps(&self, pad: &str) -> Option<Caps> {
        let pad = self.pads.get(pad)?;
        match pad.ghost_target() {
            Some(target) => self
                .children()?
                .get(&target.element)?
                .pad_caps(&target.pad),
            None => pad.caps().cloned(),
        }
    }

    /// Caps agreed on the pad's link, if negotiation has completed.
    ///
    /// For a ghost pad this is read from its target child pad on every call.
    pub fn negotiated_caps(&self, pad: &str) -> Option<Caps> {
        let pad = self.pads.get(pad)?;
        match pad.ghost_target() {
            Some(target) => self
                .children()?
                .get(&target.element)?
                .negotiated_caps(&target.pad),
            None => pad.negotiated().cloned(),
        }
    }

    /// Replace the declared caps of a pad.
    ///
    /// Only unlinked pads can be restricted; ghost pads forward to their
    /// target.
    pub fn set_pad_caps(&mut self, pad: &str, caps: Option<Caps>) -> Result<()> {
        if self.pad_or_err(pad)?.is_linked() {
            return Err(Error::PortBusy(format!("{}:{pad}", self.name)));
        }
        self.replace_pad_caps(pad, caps)
    }

    // The target of a ghost pad is peered with the bin, so only the ghost
    // itself is checked for an existing link.
    fn replace_pad_caps(&mut self, pad: &str, caps: Option<Caps>) -> Result<()> {
        let target = self.pad_or_err(pad)?.ghost_target().cloned();
        match target {
            Some(target) => self
                .child_mut(&target.element)?
                .replace_pad_caps(&target.pad, caps),
            None => {
                if let Some(pad) = self.pads.get_mut(pad) {
                    pad.set_caps(caps);
                }
                Ok(())
            }
        }
    }

    /// Record the caps agreed on a pad's link.
    ///
    /// Renegotiation through this call is observed immediately through any
    /// ghost pad that targets the pad.
    pub fn set_negotiated_caps(&mut self, pad: &str, caps: Option<Caps>) -> Result<()> {
        let target = self.pad_or_err(pad)?.ghost_target().cloned();
        match target {
            Some(target) => self
                .child_mut(&target.element)?
                .set_negotiated_caps(&target.pad, caps),
            None => {
                if let Some(pad) = self.pads.get_mut(pad) {
                    pad.set_negotiated(caps);
                }
                Ok(())
            }
        }
    }

    fn child_mut(&mut self, name: &str) -> Result<&mut Element> {
        self.children_mut()
            .and_then(|graph| graph.get_mut(name))
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    /// First unlinked pad of the given direction whose caps intersect `caps`.
    pub fn compatible_pad(&self, direction: PadDirection, caps: Option<&Caps>) -> Option<&str> {
        self.pads
            .iter()
            .filter(|p| p.direction() == direction && !p.is_linked())
            .find(|p| {
                let ours = self.pad_caps(p.name());
                crate::caps::intersect_optional(ours.as_ref(), caps).is_some()
            })
            .map(Pad::name)
    }

    pub(crate) fn add_ghost_pad(&mut self, child: &str, child_pad: &str, external: &str) -> Result<()> {
        if self.pads.contains(external) {
            return Err(Error::DuplicatePortName {
                element: self.name.clone(),
                pad: external.to_string(),
            });
        }

        let bin_name = self.name.clone();
        let graph = self
            .children_mut()
            .ok_or_else(|| Error::InvalidLink(format!("'{bin_name}' is not a bin")))?;
        let target = graph
            .get_mut(child)
            .ok_or_else(|| Error::ElementNotFound(child.to_string()))?;
        let direction = {
            let pad = target.pad_or_err(child_pad)?;
            if pad.is_linked() {
                return Err(Error::PortBusy(format!("{child}:{child_pad}")));
            }
            pad.direction()
        };
        if let Some(pad) = target.pad_mut(child_pad) {
            pad.set_peer(Some(PadRef::new(bin_name, external)));
        }

        let ghost = Pad::ghost(external, direction, PadRef::new(child, child_pad));
        self.pads.add(ghost).map_err(|pad| Error::DuplicatePortName {
            element: self.name.clone(),
            pad: pad.name().to_string(),
        })
    }

    /// Get the element's property record.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Get a property value (or its default).
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Set a property.
    ///
    /// Properties can only be changed while the element is in Null or Ready.
    pub fn set_property(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        if self.state > State::Ready {
            return Err(Error::InvalidProperty {
                element: self.name.clone(),
                property: name.to_string(),
                reason: format!("cannot be changed in state {}", self.state),
            });
        }
        self.properties.set(&self.name, name, value.into())
    }

    /// Stream duration known to this element or, for bins, any child.
    pub fn duration(&self) -> Option<ClockTime> {
        match &self.body {
            Body::Leaf(imp) => imp.duration(),
            Body::Bin(graph) => graph.duration(),
        }
    }

    /// First required property without a value, as `(element, property)`.
    pub fn missing_required(&self) -> Option<(String, &'static str)> {
        if let Some(property) = self.properties.missing_required() {
            return Some((self.name.clone(), property));
        }
        self.children().and_then(Graph::missing_required)
    }

    /// Apply one lifecycle step to this element (and its children for bins).
    pub(crate) fn change_state(&mut self, transition: StateChange, bus: &Bus) -> Result<()> {
        match &mut self.body {
            Body::Leaf(imp) => {
                let ctx = ElementContext::new(&self.name, &self.properties, bus);
                imp.change_state(transition, &ctx)
                    .map_err(|e| Error::StateChangeRefused {
                        element: self.name.clone(),
                        transition,
                        reason: e.to_string(),
                    })?;
            }
            Body::Bin(graph) => graph.change_state(transition, bus)?,
        }
        self.state = transition.next();
        tracing::debug!(element = %self.name, %transition, "element state changed");
        Ok(())
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("pads", &self.pads.len())
            .field("children", &self.children().map(Graph::len))
            .finish()
    }
}

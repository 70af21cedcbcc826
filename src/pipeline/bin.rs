//! Composite elements.
//!
//! A [`Bin`] groups child elements and their internal links behind a set of
//! ghost pads. Once assembled it is turned into an ordinary [`Element`] and
//! added to a pipeline or another bin like any leaf element.

use super::{Graph, LinkInfo};
use crate::element::{Element, PadRef};
use crate::error::{Error, Result};

/// Builder for a composite element.
///
/// # Example
///
/// ```rust
/// use mediagraph::pipeline::Bin;
/// use mediagraph::runtime::Runtime;
///
/// let runtime = Runtime::new();
/// let mut bin = Bin::new("audio-out");
/// bin.add(runtime.make_element("fakesink", "sink").unwrap()).unwrap();
/// bin.add_ghost_pad("sink", "sink", "sink").unwrap();
///
/// assert_eq!(bin.ghost_pad_target("sink").unwrap().to_string(), "sink:sink");
/// ```
#[derive(Debug)]
pub struct Bin {
    element: Element,
}

impl Bin {
    /// Create an empty bin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            element: Element::new_bin(name),
        }
    }

    /// Name of the bin.
    pub fn name(&self) -> &str {
        self.element.name()
    }

    fn graph(&self) -> Result<&Graph> {
        self.element
            .children()
            .ok_or_else(|| Error::InvalidLink(format!("'{}' is not a bin", self.name())))
    }

    fn graph_mut(&mut self) -> Result<&mut Graph> {
        let name = self.element.name().to_string();
        self.element
            .children_mut()
            .ok_or_else(|| Error::InvalidLink(format!("'{name}' is not a bin")))
    }

    /// Add a child element.
    pub fn add(&mut self, element: Element) -> Result<()> {
        self.graph_mut()?.add(element)
    }

    /// Link two child pads.
    pub fn link_pads(
        &mut self,
        src: &str,
        src_pad: &str,
        sink: &str,
        sink_pad: &str,
    ) -> Result<LinkInfo> {
        self.graph_mut()?.link_pads(src, src_pad, sink, sink_pad)
    }

    /// Link two children through their first compatible free pads.
    pub fn link(&mut self, src: &str, sink: &str) -> Result<LinkInfo> {
        self.graph_mut()?.link(src, sink)
    }

    /// Link a chain of children pairwise.
    pub fn link_many(&mut self, names: &[&str]) -> Result<Vec<LinkInfo>> {
        self.graph_mut()?.link_many(names)
    }

    /// Expose `child:child_pad` on the bin as `external`.
    ///
    /// The ghost pad takes the child pad's direction, and its caps are read
    /// through the child pad on every access, so later renegotiation is
    /// visible immediately. The child pad counts as linked from then on.
    pub fn add_ghost_pad(&mut self, child: &str, child_pad: &str, external: &str) -> Result<()> {
        self.element.add_ghost_pad(child, child_pad, external)?;
        tracing::debug!(bin = %self.name(), external, target = %PadRef::new(child, child_pad), "ghost pad added");
        Ok(())
    }

    /// The child pad a ghost pad forwards to.
    pub fn ghost_pad_target(&self, external: &str) -> Option<&PadRef> {
        self.element.pad(external)?.ghost_target()
    }

    /// Get a child element.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.graph().ok()?.get(name)
    }

    /// Get a child element for mutation.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.graph_mut().ok()?.get_mut(name)
    }

    /// The bin viewed as an element.
    pub fn as_element(&self) -> &Element {
        &self.element
    }

    /// Finish assembly and return the bin as an element.
    pub fn into_element(self) -> Element {
        self.element
    }
}

impl From<Bin> for Element {
    fn from(bin: Bin) -> Self {
        bin.into_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::Caps;
    use crate::element::{ElementContext, ElementImpl, PadDirection, PadTemplate};
    use crate::pipeline::StateChange;

    struct Sink(Option<Caps>);

    impl ElementImpl for Sink {
        fn pad_templates(&self) -> Vec<PadTemplate> {
            let template = PadTemplate::sink("sink");
            vec![match &self.0 {
                Some(caps) => template.with_caps(caps.clone()),
                None => template,
            }]
        }

        fn change_state(&mut self, _: StateChange, _: &ElementContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    fn sink(name: &str, caps: Option<Caps>) -> Element {
        Element::new(name, "sink", Box::new(Sink(caps)))
    }

    #[test]
    fn test_ghost_pad_mirrors_target() {
        let mut bin = Bin::new("bin");
        bin.add(sink("inner", Some(Caps::new("audio/x-raw"))))
            .unwrap();
        bin.add_ghost_pad("inner", "sink", "in").unwrap();

        let element = bin.as_element();
        let ghost = element.pad("in").unwrap();
        assert_eq!(ghost.direction(), PadDirection::Sink);
        assert!(ghost.is_ghost());
        assert_eq!(element.pad_caps("in"), Some(Caps::new("audio/x-raw")));

        let narrowed = Caps::new("audio/x-raw").with_int("channels", 2);
        bin.child_mut("inner")
            .unwrap()
            .set_negotiated_caps("sink", Some(narrowed.clone()))
            .unwrap();
        assert_eq!(bin.as_element().negotiated_caps("in"), Some(narrowed));
    }

    #[test]
    fn test_ghost_pad_name_collision() {
        let mut bin = Bin::new("bin");
        bin.add(sink("a", None)).unwrap();
        bin.add(sink("b", None)).unwrap();
        bin.add_ghost_pad("a", "sink", "sink").unwrap();

        let err = bin.add_ghost_pad("b", "sink", "sink").unwrap_err();
        assert!(matches!(err, Error::DuplicatePortName { pad, .. } if pad == "sink"));
        assert!(!bin.child("b").unwrap().pad("sink").unwrap().is_linked());
    }

    #[test]
    fn test_ghost_target_must_be_free() {
        let mut bin = Bin::new("bin");
        bin.add(sink("a", None)).unwrap();
        bin.add_ghost_pad("a", "sink", "first").unwrap();

        assert!(matches!(
            bin.add_ghost_pad("a", "sink", "second"),
            Err(Error::PortBusy(_))
        ));
        assert!(matches!(
            bin.add_ghost_pad("missing", "sink", "third"),
            Err(Error::ElementNotFound(_))
        ));
        assert!(matches!(
            bin.add_ghost_pad("a", "nope", "fourth"),
            Err(Error::PadNotFound { .. })
        ));
    }

    #[test]
    fn test_bin_into_element() {
        let mut bin = Bin::new("bin");
        bin.add(sink("a", None)).unwrap();
        let element: Element = bin.into();
        assert!(element.is_bin());
        assert_eq!(element.children().map(Graph::len), Some(1));
    }
}

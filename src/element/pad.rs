//! Pad abstraction for element inputs and outputs.
//!
//! Pads are the connection points of elements. Each pad has a direction,
//! an optional capability descriptor, and at most one peer. A ghost pad on a
//! bin carries no caps of its own: it forwards to a pad of one of the bin's
//! children, and everything observed through it is read from that target.

use crate::caps::Caps;
use smallvec::SmallVec;
use std::fmt;

/// Direction of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadDirection {
    /// Produces data (downstream side of an element).
    Src,
    /// Accepts data (upstream side of an element).
    Sink,
}

impl PadDirection {
    /// The direction a peer pad must have.
    pub fn opposite(self) -> Self {
        match self {
            PadDirection::Src => PadDirection::Sink,
            PadDirection::Sink => PadDirection::Src,
        }
    }
}

/// Whether a pad is always present or created dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadPresence {
    /// Pad is always present on the element.
    Always,
    /// Pad appears at runtime (e.g., demuxer streams).
    Sometimes,
    /// Pad is created when requested.
    Request,
}

/// Template for creating pads.
///
/// Element implementations declare their templates; `Always` templates are
/// instantiated when the element is created, `Sometimes` templates describe
/// the pads announced later through `PadAdded`.
#[derive(Debug, Clone, PartialEq)]
pub struct PadTemplate {
    /// Name pattern for this pad (e.g., "src", "sink", "audio_%u").
    pub name: String,
    /// Direction of this pad.
    pub direction: PadDirection,
    /// Whether this pad is always present or created on demand.
    pub presence: PadPresence,
    /// Caps of pads created from this template.
    pub caps: Option<Caps>,
}

impl PadTemplate {
    /// Create a new pad template.
    pub fn new(name: impl Into<String>, direction: PadDirection, presence: PadPresence) -> Self {
        Self {
            name: name.into(),
            direction,
            presence,
            caps: None,
        }
    }

    /// Create a template for an always-present sink pad.
    pub fn sink(name: impl Into<String>) -> Self {
        Self::new(name, PadDirection::Sink, PadPresence::Always)
    }

    /// Create a template for an always-present src pad.
    pub fn src(name: impl Into<String>) -> Self {
        Self::new(name, PadDirection::Src, PadPresence::Always)
    }

    /// Create a template for a sometimes-present src pad.
    pub fn sometimes_src(name: impl Into<String>) -> Self {
        Self::new(name, PadDirection::Src, PadPresence::Sometimes)
    }

    /// Restrict pads created from this template to the given caps.
    pub fn with_caps(mut self, caps: Caps) -> Self {
        self.caps = Some(caps);
        self
    }

    /// Check whether a concrete pad name matches this template.
    ///
    /// `%u` and `%d` match a run of decimal digits; anything else must match
    /// literally.
    pub fn matches(&self, pad_name: &str) -> bool {
        match self.name.find('%') {
            None => self.name == pad_name,
            Some(at) => {
                let (prefix, rest) = self.name.split_at(at);
                let suffix = rest.get(2..).unwrap_or("");
                let Some(middle) = pad_name
                    .strip_prefix(prefix)
                    .and_then(|s| s.strip_suffix(suffix))
                else {
                    return false;
                };
                !middle.is_empty() && middle.bytes().all(|b| b.is_ascii_digit())
            }
        }
    }
}

/// Reference to a pad by owning element name and pad name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PadRef {
    /// Element owning the pad.
    pub element: String,
    /// Pad name on that element.
    pub pad: String,
}

impl PadRef {
    /// Create a pad reference.
    pub fn new(element: impl Into<String>, pad: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            pad: pad.into(),
        }
    }
}

impl fmt::Display for PadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element, self.pad)
    }
}

/// A pad instance on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    name: String,
    direction: PadDirection,
    presence: PadPresence,
    /// Declared caps. Unused for ghost pads.
    caps: Option<Caps>,
    /// Caps agreed with the peer. Unused for ghost pads.
    negotiated: Option<Caps>,
    /// Child pad a ghost pad forwards to.
    ghost_target: Option<PadRef>,
    peer: Option<PadRef>,
}

impl Pad {
    /// Create a new always-present pad.
    pub fn new(name: impl Into<String>, direction: PadDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            presence: PadPresence::Always,
            caps: None,
            negotiated: None,
            ghost_target: None,
            peer: None,
        }
    }

    /// Create a pad from a template.
    pub fn from_template(template: &PadTemplate, name: impl Into<String>) -> Self {
        Self {
            presence: template.presence,
            caps: template.caps.clone(),
            ..Self::new(name, template.direction)
        }
    }

    /// Create a standard sink pad named "sink".
    pub fn sink() -> Self {
        Self::new("sink", PadDirection::Sink)
    }

    /// Create a standard src pad named "src".
    pub fn src() -> Self {
        Self::new("src", PadDirection::Src)
    }

    /// Restrict this pad to the given caps.
    pub fn with_caps(mut self, caps: Caps) -> Self {
        self.caps = Some(caps);
        self
    }

    pub(crate) fn ghost(name: impl Into<String>, direction: PadDirection, target: PadRef) -> Self {
        Self {
            ghost_target: Some(target),
            ..Self::new(name, direction)
        }
    }

    /// Get the pad's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the pad's direction.
    pub fn direction(&self) -> PadDirection {
        self.direction
    }

    /// Get the pad's presence.
    pub fn presence(&self) -> PadPresence {
        self.presence
    }

    /// Check if this is a src pad.
    pub fn is_src(&self) -> bool {
        self.direction == PadDirection::Src
    }

    /// Check if this is a sink pad.
    pub fn is_sink(&self) -> bool {
        self.direction == PadDirection::Sink
    }

    /// Declared caps of a real pad.
    ///
    /// Always `None` for ghost pads; read ghost caps through the owning
    /// element, which resolves the target.
    pub fn caps(&self) -> Option<&Caps> {
        self.caps.as_ref()
    }

    pub(crate) fn set_caps(&mut self, caps: Option<Caps>) {
        self.caps = caps;
    }

    pub(crate) fn negotiated(&self) -> Option<&Caps> {
        self.negotiated.as_ref()
    }

    pub(crate) fn set_negotiated(&mut self, caps: Option<Caps>) {
        self.negotiated = caps;
    }

    /// Whether this pad is a ghost pad.
    pub fn is_ghost(&self) -> bool {
        self.ghost_target.is_some()
    }

    /// The child pad a ghost pad forwards to.
    pub fn ghost_target(&self) -> Option<&PadRef> {
        self.ghost_target.as_ref()
    }

    /// The peer pad, if linked.
    pub fn peer(&self) -> Option<&PadRef> {
        self.peer.as_ref()
    }

    /// Check if this pad has a peer.
    pub fn is_linked(&self) -> bool {
        self.peer.is_some()
    }

    pub(crate) fn set_peer(&mut self, peer: Option<PadRef>) {
        self.peer = peer;
    }
}

/// Collection of pads for an element.
#[derive(Debug, Default, Clone)]
pub struct PadList {
    pads: SmallVec<[Pad; 4]>,
}

impl PadList {
    /// Create an empty pad list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pad to the list.
    ///
    /// Returns the pad back if its name is already taken.
    pub fn add(&mut self, pad: Pad) -> std::result::Result<(), Pad> {
        if self.contains(pad.name()) {
            return Err(pad);
        }
        self.pads.push(pad);
        Ok(())
    }

    /// Check whether a pad with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get a pad by name.
    pub fn get(&self, name: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.name() == name)
    }

    /// Get a pad by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Pad> {
        self.pads.iter_mut().find(|p| p.name() == name)
    }

    /// Get all sink pads.
    pub fn sinks(&self) -> impl Iterator<Item = &Pad> {
        self.pads.iter().filter(|p| p.is_sink())
    }

    /// Get all src pads.
    pub fn srcs(&self) -> impl Iterator<Item = &Pad> {
        self.pads.iter().filter(|p| p.is_src())
    }

    /// Get all pads.
    pub fn iter(&self) -> impl Iterator<Item = &Pad> {
        self.pads.iter()
    }

    /// Get the number of pads.
    pub fn len(&self) -> usize {
        self.pads.len()
    }

    /// Check if the pad list is empty.
    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_creation() {
        let sink = Pad::sink();
        assert_eq!(sink.name(), "sink");
        assert!(sink.is_sink());
        assert!(!sink.is_src());
        assert!(!sink.is_linked());

        let src = Pad::src();
        assert_eq!(src.name(), "src");
        assert!(src.is_src());
        assert_eq!(src.direction().opposite(), PadDirection::Sink);
    }

    #[test]
    fn test_pad_template() {
        let template = PadTemplate::sink("sink");
        assert_eq!(template.direction, PadDirection::Sink);
        assert_eq!(template.presence, PadPresence::Always);

        let template = PadTemplate::sometimes_src("audio_%u");
        assert_eq!(template.direction, PadDirection::Src);
        assert_eq!(template.presence, PadPresence::Sometimes);
    }

    #[test]
    fn test_template_matches() {
        let template = PadTemplate::sometimes_src("audio_%u");
        assert!(template.matches("audio_0"));
        assert!(template.matches("audio_12"));
        assert!(!template.matches("audio_"));
        assert!(!template.matches("video_0"));
        assert!(!template.matches("audio_x"));

        let fixed = PadTemplate::src("src");
        assert!(fixed.matches("src"));
        assert!(!fixed.matches("src_0"));
    }

    #[test]
    fn test_pad_from_template() {
        let caps = Caps::new("audio/x-vorbis");
        let template = PadTemplate::sometimes_src("audio_%u").with_caps(caps.clone());
        let pad = Pad::from_template(&template, "audio_0");

        assert_eq!(pad.name(), "audio_0");
        assert!(pad.is_src());
        assert_eq!(pad.presence(), PadPresence::Sometimes);
        assert_eq!(pad.caps(), Some(&caps));
    }

    #[test]
    fn test_pad_list() {
        let mut list = PadList::new();
        list.add(Pad::sink()).unwrap();
        list.add(Pad::src()).unwrap();
        list.add(Pad::new("aux_src", PadDirection::Src)).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.sinks().count(), 1);
        assert_eq!(list.srcs().count(), 2);

        assert!(list.get("sink").is_some());
        assert!(list.get("nonexistent").is_none());

        let rejected = list.add(Pad::src()).unwrap_err();
        assert_eq!(rejected.name(), "src");
        assert_eq!(list.len(), 3);
    }
}

//! Element factory for creating elements by kind name.

use crate::element::{Element, ElementImpl};
use crate::elements::{Decoder, Demuxer, FakeSink, FileSrc, PlayBin, VideoTestSrc};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Type alias for element constructor functions.
pub type ElementConstructor = fn() -> Box<dyn ElementImpl>;

/// Registry of element constructors.
pub struct ElementFactory {
    constructors: HashMap<String, ElementConstructor>,
    /// Counter for automatically named elements.
    auto_names: AtomicUsize,
}

impl ElementFactory {
    /// Create a new factory with built-in elements registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();

        // Sources
        factory.register("filesrc", create_filesrc);
        factory.register("videotestsrc", create_videotestsrc);

        // Demuxers and decoders
        factory.register("demux", create_demux);
        factory.register("oggdemux", create_oggdemux);
        factory.register("decoder", create_decoder);
        factory.register("vorbisdec", create_vorbisdec);

        // Sinks
        factory.register("fakesink", create_fakesink);
        factory.register("autoaudiosink", create_fakesink);

        // Self-contained playback
        factory.register("playbin", create_playbin);
        factory.register("playback", create_playbin);

        factory
    }

    /// Create a factory without any registered kind.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            auto_names: AtomicUsize::new(0),
        }
    }

    /// Register a custom element constructor, replacing any previous one.
    pub fn register(&mut self, kind: &str, constructor: ElementConstructor) {
        self.constructors.insert(kind.to_string(), constructor);
    }

    /// Create an element of `kind` named `name`.
    pub fn create(&self, kind: &str, name: impl Into<String>) -> Result<Element> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))?;
        let name = name.into();
        tracing::debug!(kind, element = %name, "created element");
        Ok(Element::new(name, kind, constructor()))
    }

    /// Create an element with a generated name such as `fakesink0`.
    pub fn create_auto(&self, kind: &str) -> Result<Element> {
        if !self.is_registered(kind) {
            return Err(Error::UnknownKind(kind.to_string()));
        }
        let n = self.auto_names.fetch_add(1, Ordering::Relaxed);
        self.create(kind, format!("{kind}{n}"))
    }

    /// Check if an element kind is registered.
    pub fn is_registered(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// List all available element kinds.
    pub fn list_elements(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ElementFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ElementFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementFactory")
            .field("kinds", &self.constructors.len())
            .finish()
    }
}

// Built-in element constructors

fn create_filesrc() -> Box<dyn ElementImpl> {
    Box::new(FileSrc::new())
}

fn create_videotestsrc() -> Box<dyn ElementImpl> {
    Box::new(VideoTestSrc::new())
}

fn create_demux() -> Box<dyn ElementImpl> {
    Box::new(Demuxer::new())
}

fn create_oggdemux() -> Box<dyn ElementImpl> {
    Box::new(Demuxer::ogg())
}

fn create_decoder() -> Box<dyn ElementImpl> {
    Box::new(Decoder::new())
}

fn create_vorbisdec() -> Box<dyn ElementImpl> {
    Box::new(Decoder::vorbis())
}

fn create_fakesink() -> Box<dyn ElementImpl> {
    Box::new(FakeSink::new())
}

fn create_playbin() -> Box<dyn ElementImpl> {
    Box::new(PlayBin::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_elements() {
        let factory = ElementFactory::new();
        for kind in ["filesrc", "oggdemux", "vorbisdec", "autoaudiosink", "playbin"] {
            assert!(factory.is_registered(kind), "{kind} missing");
        }
        let names = factory.list_elements();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_create_element() {
        let factory = ElementFactory::new();
        let element = factory.create("oggdemux", "demuxer").unwrap();
        assert_eq!(element.name(), "demuxer");
        assert_eq!(element.kind(), "oggdemux");
        assert!(element.pad("sink").is_some());
        assert!(element.pad("audio_0").is_none());
    }

    #[test]
    fn test_unknown_kind() {
        let factory = ElementFactory::new();
        let err = factory.create("nonexistent", "x").unwrap_err();
        assert!(matches!(err, Error::UnknownKind(kind) if kind == "nonexistent"));
        assert!(ElementFactory::empty().create("filesrc", "src").is_err());
    }

    #[test]
    fn test_auto_names_are_unique() {
        let factory = ElementFactory::new();
        let a = factory.create_auto("fakesink").unwrap();
        let b = factory.create_auto("fakesink").unwrap();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("fakesink"));
    }
}

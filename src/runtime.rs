//! The runtime context.
//!
//! A [`Runtime`] replaces process-global framework initialisation: it owns
//! the element factory and is passed explicitly to every pipeline. Clones
//! share the same context.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::pipeline::ElementFactory;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct RuntimeInner {
    factory: ElementFactory,
    shut_down: AtomicBool,
}

/// Shared runtime context.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with the built-in element kinds.
    pub fn new() -> Self {
        Self::with_factory(ElementFactory::new())
    }

    /// Create a runtime around a custom factory.
    pub fn with_factory(factory: ElementFactory) -> Self {
        tracing::debug!(kinds = factory.list_elements().len(), "runtime initialised");
        Self {
            inner: Arc::new(RuntimeInner {
                factory,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// The element factory.
    pub fn factory(&self) -> &ElementFactory {
        &self.inner.factory
    }

    /// Create an element by kind.
    pub fn make_element(&self, kind: &str, name: impl Into<String>) -> Result<Element> {
        self.check()?;
        self.inner.factory.create(kind, name)
    }

    /// Create an element with a generated name.
    pub fn make_element_auto(&self, kind: &str) -> Result<Element> {
        self.check()?;
        self.inner.factory.create_auto(kind)
    }

    /// Stop handing out elements. Existing pipelines are unaffected.
    pub fn shutdown(&self) {
        if !self.inner.shut_down.swap(true, Ordering::AcqRel) {
            tracing::debug!("runtime shut down");
        }
    }

    /// Whether [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::RuntimeShutDown);
        }
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("factory", &self.inner.factory)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_element() {
        let runtime = Runtime::new();
        let element = runtime.make_element("fakesink", "sink").unwrap();
        assert_eq!(element.name(), "sink");
    }

    #[test]
    fn test_shutdown_is_shared() {
        let runtime = Runtime::new();
        let clone = runtime.clone();
        runtime.shutdown();
        assert!(clone.is_shut_down());
        assert!(matches!(
            clone.make_element("fakesink", "sink"),
            Err(Error::RuntimeShutDown)
        ));
    }
}

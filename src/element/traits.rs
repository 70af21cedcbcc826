//! The element implementation trait.

use super::context::ElementContext;
use super::pad::PadTemplate;
use super::properties::PropertySpec;
use crate::clock::ClockTime;
use crate::error::Result;
use crate::pipeline::StateChange;

/// Behaviour of an opaque processing node.
///
/// The core never looks at what an element does with data. It only needs
/// the element's pad templates, its property declarations, and a hook for
/// every lifecycle step. Implementations that run worker threads start them
/// on [`StateChange::PausedToPlaying`] and must stop them on
/// [`StateChange::PlayingToPaused`]; anything held from outside the process
/// (files, devices) is released on [`StateChange::ReadyToNull`].
///
/// # Example
///
/// ```rust
/// use mediagraph::element::{ElementContext, ElementImpl, PadTemplate};
/// use mediagraph::pipeline::StateChange;
/// use mediagraph::Result;
///
/// struct Identity;
///
/// impl ElementImpl for Identity {
///     fn pad_templates(&self) -> Vec<PadTemplate> {
///         vec![PadTemplate::sink("sink"), PadTemplate::src("src")]
///     }
///
///     fn change_state(&mut self, _transition: StateChange, _ctx: &ElementContext<'_>) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait ElementImpl: Send {
    /// Pad templates of this element kind.
    fn pad_templates(&self) -> Vec<PadTemplate>;

    /// Properties this element kind recognizes.
    fn properties(&self) -> Vec<PropertySpec> {
        Vec::new()
    }

    /// Apply one lifecycle step.
    ///
    /// Returning an error refuses the step; the element stays in its
    /// previous state.
    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()>;

    /// Stream duration, if this element knows it.
    fn duration(&self) -> Option<ClockTime> {
        None
    }
}

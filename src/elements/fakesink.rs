//! Sink element that discards everything.

use crate::element::{ElementContext, ElementImpl, PadTemplate, PropertySpec};
use crate::error::{Error, Result};
use crate::pipeline::StateChange;

/// A sink that accepts any format and renders nothing.
///
/// Setting `fail-on` to a state name (`ready`, `paused`, `playing` or
/// `null`) makes the element refuse the step that enters that state.
#[derive(Debug, Default)]
pub struct FakeSink {
    transitions: u64,
}

impl FakeSink {
    /// Create a new sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lifecycle steps applied so far.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl ElementImpl for FakeSink {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        vec![PadTemplate::sink("sink")]
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::string(
            "fail-on",
            "Refuse the state change entering this state",
        )]
    }

    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
        let fail_on = ctx.properties().get_str("fail-on");
        if let Some(state) = fail_on.filter(|s| transition.next().to_string().eq_ignore_ascii_case(s)) {
            return Err(Error::Element(format!("configured to fail entering {state}")));
        }
        self.transitions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Properties;
    use crate::pipeline::Bus;

    #[test]
    fn test_fail_on() {
        let mut sink = FakeSink::new();
        let mut props = Properties::new(sink.properties());
        props.set("sink", "fail-on", "paused".into()).unwrap();
        let bus = Bus::new();
        let ctx = ElementContext::new("sink", &props, &bus);

        sink.change_state(StateChange::NullToReady, &ctx).unwrap();
        assert!(sink.change_state(StateChange::ReadyToPaused, &ctx).is_err());
        assert!(sink.change_state(StateChange::PlayingToPaused, &ctx).is_err());
        assert_eq!(sink.transitions(), 1);
    }
}

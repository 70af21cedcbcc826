//! Default reactions to bus events.

use super::{Event, Flow, Pipeline};

/// Handle an event the standard way.
///
/// - `Error`: logged, the loop stops. Runtime errors are never retried.
/// - `Eos`: the stream completed, the loop stops.
/// - `PadAdded`: the new pad is linked to a waiting element registered
///   with [`Pipeline::connect_pad_added`], if one has a compatible free
///   sink pad. A pad nobody waits for is ignored.
/// - Anything else: the loop continues.
///
/// Custom handlers usually print or record what they need and then
/// delegate here.
pub fn default_handler(pipeline: &mut Pipeline, event: &Event) -> Flow {
    match event {
        Event::Error {
            source,
            message,
            debug: details,
        } => {
            tracing::error!(
                "error from '{}': {} ({})",
                source,
                message,
                details.as_deref().unwrap_or("no debug info")
            );
            Flow::Stop
        }
        Event::Eos { source } => {
            match source {
                Some(source) => tracing::info!("end of stream from '{}'", source),
                None => tracing::info!("end of stream"),
            }
            Flow::Stop
        }
        Event::PadAdded { element, pad } => {
            match pipeline.link_dynamic_pad(element, pad.name()) {
                Ok(Some(link)) => tracing::info!("linked pad {} to {}", link.src, link.sink),
                Ok(None) => tracing::debug!("no counterpart for pad {}:{}, ignored", element, pad.name()),
                Err(e) => tracing::warn!("could not link pad {}:{}: {}", element, pad.name(), e),
            }
            Flow::Continue
        }
        Event::Warning { source, message } => {
            tracing::warn!("warning from '{}': {}", source, message);
            Flow::Continue
        }
        Event::StateChanged { .. } | Event::DurationChanged { .. } | Event::Custom { .. } => {
            tracing::trace!("{}", event);
            Flow::Continue
        }
    }
}

//! Per-webhook progress lines for one-shot commands.

use inbox_core::{DeliveryEvent, EventHandler};

/// Prints one line per finished delivery attempt to stdout.
#[derive(Debug, Default)]
pub struct ProgressReporter;

impl ProgressReporter {
    /// Formats an event, or `None` for events that print nothing.
    pub fn line(event: &DeliveryEvent) -> Option<String> {
        match event {
            DeliveryEvent::AttemptStarted(_) => None,
            DeliveryEvent::Succeeded(event) => Some(format!(
                "  ok    {} (HTTP {}, {} ms)",
                event.url, event.response_status, event.duration_ms
            )),
            DeliveryEvent::Failed(event) => Some(format!(
                "  fail  {}: {}",
                event.url,
                event.outcome.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }
}

#[async_trait::async_trait]
impl EventHandler for ProgressReporter {
    async fn handle_event(&self, event: DeliveryEvent) {
        if let Some(line) = Self::line(&event) {
            println!("{line}");
        }
    }
}

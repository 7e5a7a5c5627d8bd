use super::TrackerTransport;
use crate::console::{default_console, TrackerConsole};
use crate::event::TrackerEvent;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const DEBUG_TRANSPORT: &str = "DebugTransport";

/// Writes every event to a diagnostic sink instead of sending it anywhere.
///
/// Always usable, which makes it a handy last member of a
/// [`TransportGroup`](super::TransportGroup) during development.
pub struct DebugTransport {
    console: Arc<dyn TrackerConsole>,
}

impl DebugTransport {
    pub fn new(console: Option<Arc<dyn TrackerConsole>>) -> Self {
        Self {
            console: console.unwrap_or_else(default_console),
        }
    }
}

impl Default for DebugTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl TrackerTransport for DebugTransport {
    fn transport_name(&self) -> &str {
        DEBUG_TRANSPORT
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        for event in &events {
            let wire = event.to_wire()?;
            self.console.group_collapsed(&format!(
                "{}: {} ({})",
                DEBUG_TRANSPORT,
                event.event_type(),
                event.id()
            ));
            self.console.log(&serde_json::to_string_pretty(&wire)?);
            self.console.group_end();
        }
        Ok(())
    }
}

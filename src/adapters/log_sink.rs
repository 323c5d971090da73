//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future syslog or MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                mode,
                role,
                variant,
            } => {
                info!("START | role={} chip={} mode={:?}", role, variant, mode);
            }
            AppEvent::ConfigCommitted => info!("CONFIG | committed"),
            AppEvent::ConfigRejected(e) => warn!("CONFIG | rejected: {}", e),
            AppEvent::PersistFailed(e) => warn!("CONFIG | persist failed: {}", e),
            AppEvent::AuthRejected => warn!("AUTH | rejected"),
            AppEvent::NotProvisioned => warn!("PROV | refused, unit not provisioned"),
            AppEvent::OtaStateChanged { from, to } => info!("OTA | {} -> {}", from, to),
            AppEvent::LedTest(symbol) => info!("LED | test {}", symbol),
            AppEvent::DisplayRefresh => info!("DISPLAY | refresh"),
            AppEvent::RestartScheduled(reason) => info!("SYSTEM | restart ({:?})", reason),
        }
    }
}

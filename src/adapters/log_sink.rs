//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every session event as one
//! structured log line.  A notification or quick-tile adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SessionEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started(cap) => {
                info!(
                    "START | available={} strength={} max_level={}",
                    cap.available, cap.strength_supported, cap.max_level
                );
            }
            SessionEvent::ModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?}", from, to);
            }
            SessionEvent::AutoOffArmed { deadline_epoch_ms } => {
                info!("TIMER | auto-off armed, deadline={} ms", deadline_epoch_ms);
            }
            SessionEvent::AutoOffDisarmed => {
                info!("TIMER | auto-off disarmed");
            }
            SessionEvent::Shutdown { reason } => {
                info!("OFF   | shutdown, reason={:?}", reason);
            }
            SessionEvent::LampFault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}

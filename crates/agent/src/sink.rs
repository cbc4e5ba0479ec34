//! Streaming sink for auto-agent output.
//!
//! A thin wrapper over a tokio `mpsc` sender. The receiving side cancels a
//! run by dropping (or closing) its receiver; the loop checks
//! [`StreamSink::is_closed`] before every round and every tool call. The
//! channel closes for the receiver once the run ends and the sink is dropped.

use crate::execute::ExecutionReport;
use crate::stream_event::AgentStreamEvent;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StreamSink {
    tx: mpsc::Sender<AgentStreamEvent>,
}

impl StreamSink {
    pub fn new(tx: mpsc::Sender<AgentStreamEvent>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver that observes it.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<AgentStreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Send an event. Returns `false` if the receiver has gone away.
    pub async fn emit(&self, event: AgentStreamEvent) -> bool {
        match self.tx.send(event).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                debug!(event = event.event_type(), "Stream receiver closed, event dropped");
                false
            }
        }
    }

    /// Send the terminal `done` event for `report`.
    pub async fn complete(&self, report: &ExecutionReport) -> bool {
        self.emit(report.done_event()).await
    }

    /// Send the terminal `error` event.
    pub async fn error(&self, error: &armory_core::Error) -> bool {
        self.emit(AgentStreamEvent::Error {
            message: error.to_string(),
        })
        .await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

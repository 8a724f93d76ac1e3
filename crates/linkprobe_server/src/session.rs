//! One check session per client connection.
//!
//! The session is the only writer to its transport: scheduler workers hand
//! results over the batch channel and this loop forwards them one frame at a
//! time.

use engine_logging::{engine_debug, engine_info, engine_warn};
use linkprobe_core::{parse_batch, SessionMessage};
use linkprobe_engine::{BatchHandle, CheckEngine, EngineEvent};
use thiserror::Error;

/// What the client sent, reduced to what a session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// Peer closed the connection or the transport failed.
    Closed,
    /// Frames outside the contract (binary, control frames).
    Other,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("transport send failed: {0}")]
    Transport(String),
}

/// Bidirectional message channel to one client.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn recv(&mut self) -> Inbound;
    async fn send(&mut self, message: &SessionMessage) -> Result<(), SessionError>;
    async fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Candidates in the submitted batch.
    pub submitted: usize,
    /// Result frames delivered.
    pub emitted: usize,
    /// Whether the terminal frame was delivered.
    pub completed: bool,
}

/// Receives one batch, streams its results and finishes with the done frame.
///
/// Returns early, cancelling the batch, when the client goes away or a send
/// fails; nothing is sent after that.
pub async fn run_session<T: Transport>(transport: &mut T, engine: &CheckEngine) -> SessionSummary {
    let raw = loop {
        match transport.recv().await {
            Inbound::Text(text) => break text,
            Inbound::Other => engine_debug!("ignoring non-text frame before batch"),
            Inbound::Closed => {
                engine_info!("client left before submitting a batch");
                return SessionSummary::default();
            }
        }
    };

    let urls = parse_batch(&raw);
    let mut summary = SessionSummary {
        submitted: urls.len(),
        ..SessionSummary::default()
    };

    if urls.is_empty() {
        summary.completed = finish(transport).await;
        return summary;
    }

    let mut batch = engine.start_batch(urls);
    stream_batch(transport, &mut batch, &mut summary).await;
    summary
}

async fn stream_batch<T: Transport>(
    transport: &mut T,
    batch: &mut BatchHandle,
    summary: &mut SessionSummary,
) {
    loop {
        tokio::select! {
            event = batch.next_event() => match event {
                Some(EngineEvent::Checked(result)) => {
                    if let Err(err) = transport.send(&SessionMessage::Result(result)).await {
                        engine_warn!("dropping session after send failure: {}", err);
                        batch.cancel();
                        return;
                    }
                    summary.emitted += 1;
                }
                Some(EngineEvent::BatchDone { checked }) => {
                    engine_debug!("batch done checked={}", checked);
                    summary.completed = finish(transport).await;
                    return;
                }
                None => {
                    engine_warn!(
                        "batch stopped early after {}/{} results",
                        summary.emitted,
                        summary.submitted
                    );
                    return;
                }
            },
            inbound = transport.recv() => match inbound {
                Inbound::Closed => {
                    engine_info!(
                        "client disconnected after {}/{} results",
                        summary.emitted,
                        summary.submitted
                    );
                    batch.cancel();
                    return;
                }
                Inbound::Text(_) => {
                    engine_warn!("rejecting second batch on the same connection");
                }
                Inbound::Other => {}
            },
        }
    }
}

async fn finish<T: Transport>(transport: &mut T) -> bool {
    match transport.send(&SessionMessage::Done).await {
        Ok(()) => {
            transport.close().await;
            true
        }
        Err(err) => {
            engine_warn!("could not deliver done frame: {}", err);
            false
        }
    }
}

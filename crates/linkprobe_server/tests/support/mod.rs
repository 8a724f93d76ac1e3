#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use linkprobe_core::SessionMessage;
use linkprobe_engine::{CheckEngine, EngineSettings, FailureKind, FetchError, Fetcher, HopResponse};
use linkprobe_server::{Inbound, SessionError, Transport};
use tokio::sync::mpsc;
use url::Url;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Answers 200 for every host except `down.test`, after a fixed delay.
pub struct SlowFetcher {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch_once(&self, url: &Url) -> Result<HopResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if url.host_str() == Some("down.test") {
            return Err(FetchError {
                kind: FailureKind::Connect,
                message: "refused".to_string(),
            });
        }
        Ok(HopResponse {
            status: 200,
            headers: [("server", "nginx")].into_iter().collect(),
            redirect_target: None,
        })
    }
}

pub fn engine_with(fetcher: Arc<SlowFetcher>, concurrency: usize) -> CheckEngine {
    let settings = EngineSettings {
        concurrency,
        throttle_delay: Duration::ZERO,
        ..EngineSettings::default()
    };
    CheckEngine::with_fetcher(fetcher, settings)
}

/// In-memory client. Inbound frames come from a channel; outbound frames are
/// recorded as the JSON text a WebSocket client would see.
pub struct MemoryTransport {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    pub sent: Vec<String>,
    pub closed: bool,
    /// Reports the client as gone once this many frames were sent.
    disconnect_after: Option<usize>,
    /// Sends fail once this many frames were sent.
    fail_after: Option<usize>,
    disconnected: bool,
    pub sent_after_disconnect: usize,
}

impl MemoryTransport {
    pub fn new(frames: impl IntoIterator<Item = Inbound>) -> (Self, mpsc::UnboundedSender<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        for frame in frames {
            tx.send(frame).unwrap();
        }
        let transport = Self {
            inbound: rx,
            sent: Vec::new(),
            closed: false,
            disconnect_after: None,
            fail_after: None,
            disconnected: false,
            sent_after_disconnect: 0,
        };
        (transport, tx)
    }

    pub fn disconnect_after(mut self, frames: usize) -> Self {
        self.disconnect_after = Some(frames);
        self
    }

    pub fn fail_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn results(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .filter(|value: &serde_json::Value| value["status"] != "done")
            .collect()
    }

    pub fn done_frames(&self) -> usize {
        self.sent
            .iter()
            .filter(|text| text.as_str() == r#"{"status":"done"}"#)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn recv(&mut self) -> Inbound {
        if self
            .disconnect_after
            .is_some_and(|limit| self.sent.len() >= limit)
        {
            self.disconnected = true;
            return Inbound::Closed;
        }
        match self.inbound.recv().await {
            Some(frame) => frame,
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, message: &SessionMessage) -> Result<(), SessionError> {
        if self.fail_after.is_some_and(|limit| self.sent.len() >= limit) {
            return Err(SessionError::Transport("connection reset".to_string()));
        }
        if self.disconnected {
            self.sent_after_disconnect += 1;
        }
        self.sent.push(message.to_json()?);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

pub fn batch_text(urls: &[&str]) -> Inbound {
    Inbound::Text(urls.join("\n"))
}


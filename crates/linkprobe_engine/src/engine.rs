use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_info;
use linkprobe_core::DEFAULT_SCHEME;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::scheduler::Scheduler;
use crate::{EngineEvent, FetchError};

/// Upper bound on concurrent traces, whatever the configuration asks for.
pub const MAX_CONCURRENCY: usize = 100;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum number of URLs traced at the same time.
    pub concurrency: usize,
    pub max_hops: usize,
    /// Scheme prepended to candidates submitted without one; `None` disables it.
    pub default_scheme: Option<String>,
    /// Batches larger than this get `throttle_delay` before every check.
    pub throttle_threshold: usize,
    pub throttle_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_hops: 10,
            default_scheme: Some(DEFAULT_SCHEME.to_string()),
            throttle_threshold: 50,
            throttle_delay: Duration::from_millis(100),
        }
    }
}

impl EngineSettings {
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

/// Shared entry point: one engine serves every session, one batch per call.
#[derive(Clone)]
pub struct CheckEngine {
    fetcher: Arc<dyn Fetcher>,
    settings: EngineSettings,
}

impl CheckEngine {
    pub fn new(fetch_settings: FetchSettings, settings: EngineSettings) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(fetch_settings)?;
        Ok(Self::with_fetcher(Arc::new(fetcher), settings))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, settings: EngineSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Spawns a scheduler for `urls` on the current tokio runtime.
    ///
    /// Results arrive on the returned handle in completion order, followed by
    /// a single `BatchDone`. Dropping the handle cancels the batch.
    pub fn start_batch(&self, urls: Vec<String>) -> BatchHandle {
        let total = urls.len();
        let (event_tx, event_rx) = mpsc::channel(self.settings.effective_concurrency());
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::new(self.fetcher.clone(), self.settings.clone(), cancel.clone());

        engine_info!(
            "starting batch urls={} concurrency={}",
            total,
            self.settings.effective_concurrency()
        );
        tokio::spawn(scheduler.run(urls, event_tx));

        BatchHandle {
            events: event_rx,
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
        }
    }
}

pub struct BatchHandle {
    events: mpsc::Receiver<EngineEvent>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl BatchHandle {
    /// Next event of the batch; `None` once the scheduler has stopped.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }

    /// Stops dispatching new URLs and abandons in-flight traces.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

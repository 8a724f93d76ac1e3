#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use linkprobe_core::ResponseHeaders;
use linkprobe_engine::{FailureKind, FetchError, Fetcher, HopResponse};
use url::Url;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Redirect(u16, String),
    Fail,
}

type Router = dyn Fn(&Url) -> Reply + Send + Sync;

/// In-memory fetcher answering from a routing closure.
pub struct ScriptedFetcher {
    router: Box<Router>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(router: impl Fn(&Url) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            router: Box::new(router),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fetcher answering from a fixed table; unknown URLs fail.
    pub fn from_routes(routes: &[(&str, Reply)]) -> Self {
        let table: HashMap<String, Reply> = routes
            .iter()
            .map(|(url, reply)| (url.to_string(), reply.clone()))
            .collect();
        Self::new(move |url| table.get(url.as_str()).cloned().unwrap_or(Reply::Fail))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_delay_for(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_once(&self, url: &Url) -> Result<HopResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self
            .delays
            .get(url.as_str())
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match (self.router)(url) {
            Reply::Status(status) => Ok(HopResponse {
                status,
                headers: [("server", "scripted")].into_iter().collect(),
                redirect_target: None,
            }),
            Reply::Redirect(status, location) => Ok(HopResponse {
                status,
                headers: ResponseHeaders::new(),
                redirect_target: url.join(&location).ok(),
            }),
            Reply::Fail => Err(scripted_failure()),
        }
    }
}

fn scripted_failure() -> FetchError {
    // FetchError::new is crate-private; build through the public fields.
    FetchError {
        kind: FailureKind::Timeout,
        message: "scripted failure".to_string(),
    }
}

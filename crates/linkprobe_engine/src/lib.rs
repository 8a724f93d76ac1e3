//! Linkprobe engine: fetching, redirect tracing and batch scheduling.
mod engine;
mod fetch;
mod scheduler;
mod trace;
mod types;

pub use engine::{BatchHandle, CheckEngine, EngineSettings, MAX_CONCURRENCY};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use scheduler::{check_candidate, Scheduler};
pub use trace::trace;
pub use types::{EngineEvent, FailureKind, FetchError, HopResponse};

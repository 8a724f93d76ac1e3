use std::fmt;

use linkprobe_core::{CheckResult, ResponseHeaders};
use url::Url;

/// Everything the tracer needs from one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    /// Resolved `Location` for 3xx responses; `None` when missing or unusable.
    pub redirect_target: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Checked(CheckResult),
    /// Sent once, after every candidate of the batch has been checked.
    BatchDone { checked: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Client,
    Timeout,
    Connect,
    Tls,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Client => write!(f, "http client setup failed"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connect => write!(f, "connection failed"),
            FailureKind::Tls => write!(f, "tls error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

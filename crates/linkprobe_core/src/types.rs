use serde::{Serialize, Serializer};

use crate::ResponseHeaders;

/// Status recorded for one hop: the HTTP code, or `"Error"` when the request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopStatus {
    Code(u16),
    Error,
}

impl HopStatus {
    pub fn is_redirect(self) -> bool {
        matches!(self, HopStatus::Code(300..=399))
    }
}

impl Serialize for HopStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HopStatus::Code(code) => serializer.serialize_u16(*code),
            HopStatus::Error => serializer.serialize_str("Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub url: String,
    pub status: HopStatus,
}

impl Hop {
    pub fn new(url: impl Into<String>, status: HopStatus) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }
}

pub type RedirectChain = Vec<Hop>;

/// Why the redirect tracer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A non-redirect response, or a redirect without a usable target.
    Terminal,
    /// The fetch for the last hop failed.
    FetchFailed,
    /// The configured hop limit was reached while still redirecting.
    HopLimit,
    /// The next target was already visited in this chain.
    Cycle,
}

impl Termination {
    pub fn is_truncated(self) -> bool {
        matches!(self, Termination::HopLimit | Termination::Cycle)
    }
}

/// Output of tracing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub chain: RedirectChain,
    pub termination: Termination,
    /// Headers of the last hop that produced a response.
    pub headers: ResponseHeaders,
}

/// Overall status reported for a submitted URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Code(u16),
    Error,
    Invalid,
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultStatus::Code(code) => serializer.serialize_u16(*code),
            ResultStatus::Error => serializer.serialize_str("Error"),
            ResultStatus::Invalid => serializer.serialize_str("Invalid"),
        }
    }
}

/// One row of output: produced exactly once per submitted candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub url: String,
    pub status: ResultStatus,
    pub server_name: String,
    pub redirect_chain: RedirectChain,
    pub comment: String,
}

use std::error::Error as _;
use std::time::Duration;

use engine_logging::engine_trace;
use linkprobe_core::{resolve_redirect, ResponseHeaders};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LOCATION};
use url::Url;

use crate::{FailureKind, FetchError, HopResponse};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

/// Performs exactly one request/response cycle; never follows redirects.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_once(&self, url: &Url) -> Result<HopResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        default_headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent)
            .default_headers(default_headers)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Client, err.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_once(&self, url: &Url) -> Result<HopResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let headers: ResponseHeaders = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())))
            .collect();

        let redirect_target = if status.is_redirection() {
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| resolve_redirect(url, location))
        } else {
            None
        };

        engine_trace!(
            "fetched url={} status={} redirect={:?}",
            url,
            status.as_u16(),
            redirect_target.as_ref().map(Url::as_str)
        );

        // The body is never read; dropping the response releases the connection.
        Ok(HopResponse {
            status: status.as_u16(),
            headers,
            redirect_target,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    let causes = source_causes(&err);
    let kind = failure_kind(err.is_timeout(), err.is_connect(), &causes);
    let detail = std::iter::once(err.to_string())
        .chain(causes)
        .collect::<Vec<_>>()
        .join(": ");
    FetchError::new(kind, detail)
}

/// Messages of the underlying errors, without reqwest's own message (which
/// embeds the request URL).
fn source_causes(err: &reqwest::Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

// TLS handshake failures surface as connect errors, so they are matched first.
fn failure_kind(is_timeout: bool, is_connect: bool, causes: &[String]) -> FailureKind {
    if is_timeout {
        return FailureKind::Timeout;
    }
    let tls = causes.iter().any(|cause| {
        let lowered = cause.to_lowercase();
        lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("handshake")
    });
    if tls {
        return FailureKind::Tls;
    }
    if is_connect {
        return FailureKind::Connect;
    }
    FailureKind::Network
}

//! Linkprobe core: pure parsing, validation and classification.
mod batch;
mod candidate;
mod classify;
mod headers;
mod message;
mod server_name;
mod types;

pub use batch::parse_batch;
pub use candidate::{normalize_candidate, resolve_redirect, InvalidUrl, DEFAULT_SCHEME};
pub use classify::{
    classify, COMMENT_CLIENT_ERROR, COMMENT_FAILED, COMMENT_INVALID, COMMENT_OK,
    COMMENT_REDIRECTED, COMMENT_REDIRECT_WITHOUT_LOCATION, COMMENT_SERVER_ERROR,
    COMMENT_TRUNCATED, COMMENT_UNEXPECTED, SERVER_NOT_AVAILABLE,
};
pub use headers::ResponseHeaders;
pub use message::SessionMessage;
pub use server_name::{detect_server_name, UNKNOWN_SERVER};
pub use types::{CheckResult, Hop, HopStatus, RedirectChain, ResultStatus, Termination, Trace};

use crate::{
    detect_server_name, normalize_candidate, CheckResult, HopStatus, ResultStatus, Trace,
};

pub const COMMENT_OK: &str = "OK";
pub const COMMENT_REDIRECTED: &str = "Redirected";
pub const COMMENT_REDIRECT_WITHOUT_LOCATION: &str = "Redirect without location";
pub const COMMENT_CLIENT_ERROR: &str = "Client Error";
pub const COMMENT_SERVER_ERROR: &str = "Server Error";
pub const COMMENT_UNEXPECTED: &str = "Unexpected status";
pub const COMMENT_TRUNCATED: &str = "Truncated redirect chain";
pub const COMMENT_FAILED: &str = "Request failed or timed out";
pub const COMMENT_INVALID: &str = "Malformed URL";

/// Server name reported when no response was received.
pub const SERVER_NOT_AVAILABLE: &str = "N/A";

/// Maps a candidate and its trace onto the row reported to the client.
///
/// `trace` is `None` when nothing was fetched.
pub fn classify(candidate: &str, trace: Option<&Trace>, default_scheme: Option<&str>) -> CheckResult {
    if normalize_candidate(candidate, default_scheme).is_err() {
        return unanswered(candidate, ResultStatus::Invalid, COMMENT_INVALID, Vec::new());
    }

    let Some(trace) = trace else {
        return unanswered(candidate, ResultStatus::Error, COMMENT_FAILED, Vec::new());
    };
    let Some(terminal) = trace.chain.last() else {
        return unanswered(candidate, ResultStatus::Error, COMMENT_FAILED, Vec::new());
    };

    let code = match terminal.status {
        HopStatus::Code(code) => code,
        HopStatus::Error => {
            return unanswered(
                candidate,
                ResultStatus::Error,
                COMMENT_FAILED,
                trace.chain.clone(),
            );
        }
    };

    let comment = if trace.termination.is_truncated() {
        COMMENT_TRUNCATED
    } else {
        comment_for_code(code, trace.chain.len())
    };

    CheckResult {
        url: candidate.to_string(),
        status: ResultStatus::Code(code),
        server_name: detect_server_name(&trace.headers),
        redirect_chain: trace.chain.clone(),
        comment: comment.to_string(),
    }
}

fn comment_for_code(code: u16, chain_len: usize) -> &'static str {
    match code {
        200..=299 => COMMENT_OK,
        300..=399 if chain_len > 1 => COMMENT_REDIRECTED,
        300..=399 => COMMENT_REDIRECT_WITHOUT_LOCATION,
        400..=499 => COMMENT_CLIENT_ERROR,
        500..=599 => COMMENT_SERVER_ERROR,
        _ => COMMENT_UNEXPECTED,
    }
}

fn unanswered(
    candidate: &str,
    status: ResultStatus,
    comment: &str,
    redirect_chain: crate::RedirectChain,
) -> CheckResult {
    CheckResult {
        url: candidate.to_string(),
        status,
        server_name: SERVER_NOT_AVAILABLE.to_string(),
        redirect_chain,
        comment: comment.to_string(),
    }
}

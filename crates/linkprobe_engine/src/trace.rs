use std::collections::HashSet;

use engine_logging::engine_debug;
use linkprobe_core::{Hop, HopStatus, ResponseHeaders, Termination, Trace};
use url::Url;

use crate::Fetcher;

/// Follows the redirect chain starting at `start`, one hop per fetch.
///
/// Stops on a terminal response, a failed fetch, after `max_hops` recorded
/// hops, or when the next target was already visited. The returned chain is
/// never longer than `max_hops` (a limit of 0 is treated as 1).
pub async fn trace(fetcher: &dyn Fetcher, start: Url, max_hops: usize) -> Trace {
    let max_hops = max_hops.max(1);
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut headers = ResponseHeaders::new();
    let mut current = start;

    loop {
        visited.insert(current.as_str().to_string());

        let response = match fetcher.fetch_once(&current).await {
            Ok(response) => response,
            Err(err) => {
                engine_debug!("hop failed url={} error={}", current, err);
                chain.push(Hop::new(current.as_str(), HopStatus::Error));
                return finish(chain, Termination::FetchFailed, headers);
            }
        };

        let status = HopStatus::Code(response.status);
        chain.push(Hop::new(current.as_str(), status));
        headers = response.headers;

        let target = match response.redirect_target {
            Some(target) if status.is_redirect() => target,
            _ => return finish(chain, Termination::Terminal, headers),
        };

        if chain.len() >= max_hops {
            engine_debug!("hop limit {} reached at url={}", max_hops, current);
            return finish(chain, Termination::HopLimit, headers);
        }
        if visited.contains(target.as_str()) {
            engine_debug!("redirect cycle at url={} target={}", current, target);
            return finish(chain, Termination::Cycle, headers);
        }

        current = target;
    }
}

fn finish(chain: Vec<Hop>, termination: Termination, headers: ResponseHeaders) -> Trace {
    Trace {
        chain,
        termination,
        headers,
    }
}

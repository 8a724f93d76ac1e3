use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use linkprobe_core::{classify, normalize_candidate, CheckResult};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::trace::trace;
use crate::{EngineEvent, EngineSettings, Fetcher};

/// Runs one batch on a fixed pool of workers.
pub struct Scheduler {
    fetcher: Arc<dyn Fetcher>,
    settings: EngineSettings,
    cancel: CancellationToken,
}

struct Worker {
    fetcher: Arc<dyn Fetcher>,
    settings: EngineSettings,
    cancel: CancellationToken,
    queue: Arc<Mutex<VecDeque<String>>>,
    events: mpsc::Sender<EngineEvent>,
    throttle: Option<Duration>,
}

impl Scheduler {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: EngineSettings, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            settings,
            cancel,
        }
    }

    /// Checks every URL, sending one `Checked` per URL as it completes and a
    /// final `BatchDone`. Nothing further is sent once cancelled.
    pub async fn run(self, urls: Vec<String>, events: mpsc::Sender<EngineEvent>) {
        let total = urls.len();
        if total == 0 {
            let _ = events.send(EngineEvent::BatchDone { checked: 0 }).await;
            return;
        }

        let throttle = (total > self.settings.throttle_threshold)
            .then_some(self.settings.throttle_delay)
            .filter(|delay| !delay.is_zero());
        let worker_count = self.settings.effective_concurrency().min(total);
        let queue = Arc::new(Mutex::new(urls.into_iter().collect::<VecDeque<_>>()));

        let mut pool = JoinSet::new();
        for _ in 0..worker_count {
            let worker = Worker {
                fetcher: self.fetcher.clone(),
                settings: self.settings.clone(),
                cancel: self.cancel.clone(),
                queue: queue.clone(),
                events: events.clone(),
                throttle,
            };
            pool.spawn(worker.run());
        }

        let mut checked = 0;
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(count) => checked += count,
                Err(err) => engine_error!("check worker stopped abnormally: {}", err),
            }
        }

        if self.cancel.is_cancelled() {
            engine_info!("batch cancelled after {}/{} results", checked, total);
            return;
        }
        if checked != total {
            engine_warn!("batch produced {} results for {} urls", checked, total);
        }
        engine_info!("batch finished results={}", checked);
        let _ = events.send(EngineEvent::BatchDone { checked }).await;
    }
}

impl Worker {
    async fn run(self) -> usize {
        let mut checked = 0;
        while !self.cancel.is_cancelled() {
            let Some(candidate) = self.next_candidate() else {
                break;
            };

            if let Some(delay) = self.throttle {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            // A panicking check is reported as a failed request.
            let fetcher = self.fetcher.clone();
            let settings = self.settings.clone();
            let owned = candidate.clone();
            let mut task = tokio::spawn(async move {
                check_candidate(fetcher.as_ref(), &owned, &settings).await
            });
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    task.abort();
                    break;
                }
                joined = &mut task => match joined {
                    Ok(result) => result,
                    Err(err) => {
                        engine_error!("check of {:?} aborted: {}", candidate, err);
                        classify(&candidate, None, self.settings.default_scheme.as_deref())
                    }
                },
            };
            if self.cancel.is_cancelled() {
                break;
            }

            if self.events.send(EngineEvent::Checked(result)).await.is_err() {
                // Receiver dropped without cancelling; stop the rest of the batch too.
                self.cancel.cancel();
                break;
            }
            checked += 1;
        }
        checked
    }

    fn next_candidate(&self) -> Option<String> {
        match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

/// Validates, traces and classifies a single candidate.
pub async fn check_candidate(
    fetcher: &dyn Fetcher,
    candidate: &str,
    settings: &EngineSettings,
) -> CheckResult {
    let scheme = settings.default_scheme.as_deref();
    match normalize_candidate(candidate, scheme) {
        Ok(url) => {
            let traced = trace(fetcher, url, settings.max_hops).await;
            classify(candidate, Some(&traced), scheme)
        }
        Err(reason) => {
            engine_debug!("skipping invalid candidate {:?}: {}", candidate, reason);
            classify(candidate, None, scheme)
        }
    }
}

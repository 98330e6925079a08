//! Multi-instance search orchestration
//!
//! Runs one pager per active instance on its own task, merges their results
//! into a single stream in arrival order and gathers their statistics once
//! every pager has stopped.

use super::pager::InstancePager;
use crate::config::ScraperSettings;
use crate::instances::Instance;
use crate::metrics::{InstanceStats, RunStats};
use crate::network::Session;
use crate::query::SearchQuery;
use crate::results::SearchResult;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// Results buffered between the pagers and the consumer
const RESULT_CHANNEL_CAPACITY: usize = 100;

/// Searches many instances at once
pub struct Orchestrator {
    session: Session,
    concurrent_requests: usize,
    max_pages: u32,
    stats: Arc<RwLock<RunStats>>,
}

impl Orchestrator {
    pub fn new(session: Session, settings: &ScraperSettings) -> Self {
        Self {
            session,
            concurrent_requests: settings.concurrent_requests.max(1),
            max_pages: settings.max_pages,
            stats: Arc::new(RwLock::new(RunStats::new())),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start a search across `instances`.
    ///
    /// Inactive instances are ignored. Pagers are started in descending
    /// priority, ties in input order; at most `concurrent_requests` run at
    /// a time.
    /// Must be called from within a Tokio runtime.
    pub fn search(
        &self,
        instances: &[Instance],
        query: &SearchQuery,
        max_pages: Option<u32>,
    ) -> SearchRun {
        let id = Uuid::new_v4();
        let max_pages = max_pages.unwrap_or(self.max_pages);
        let span = info_span!("search", run = %id);

        let mut active: Vec<Instance> = instances.iter().filter(|i| i.is_active).cloned().collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));

        if active.is_empty() {
            span.in_scope(|| warn!("No active instances available for search"));
        } else {
            span.in_scope(|| {
                info!(
                    "Starting search across {} instances for query: {}",
                    active.len(),
                    query.query
                )
            });
        }

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let (stats_tx, stats_rx) = oneshot::channel();

        let pagers = active
            .into_iter()
            .map(|instance| {
                let instance_span = info_span!(parent: &span, "instance", name = %instance.name);
                let pager =
                    InstancePager::new(self.session.clone(), instance, query.clone(), max_pages);
                (pager, instance_span)
            })
            .collect();

        let run = Dispatch {
            pagers,
            permits: Arc::new(Semaphore::new(self.concurrent_requests)),
            tx,
            cancel: cancel.clone(),
            cumulative: self.stats.clone(),
            done: stats_tx,
            query: query.query.clone(),
        };
        tokio::spawn(run.run().instrument(span));

        SearchRun {
            id,
            results: ReceiverStream::new(rx),
            stats: stats_rx,
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
        }
    }

    /// Snapshot of the statistics accumulated since the last reset
    pub fn stats(&self) -> RunStats {
        self.stats.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reset_stats(&self) {
        self.stats.write().unwrap_or_else(|e| e.into_inner()).reset();
    }
}

/// Starts the pagers of one run in priority order and gathers their
/// statistics once all of them have stopped.
struct Dispatch {
    pagers: Vec<(InstancePager, Span)>,
    permits: Arc<Semaphore>,
    tx: mpsc::Sender<SearchResult>,
    cancel: CancellationToken,
    cumulative: Arc<RwLock<RunStats>>,
    done: oneshot::Sender<RunStats>,
    query: String,
}

impl Dispatch {
    async fn run(self) {
        let searched = self.pagers.len();
        let mut run = RunStats::new();
        let mut tasks = JoinSet::new();

        // Permits are taken here, one pager at a time, so start order
        // follows priority whatever the runtime flavour.
        for (pager, span) in self.pagers {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = self.permits.clone().acquire_owned() => permit.ok(),
            };

            match permit {
                Some(permit) => {
                    tasks.spawn(
                        run_pager(pager, permit, self.tx.clone(), self.cancel.clone())
                            .instrument(span),
                    );
                }
                None => run.absorb(&pager.instance().key(), &pager.into_stats()),
            }
        }
        drop(self.tx);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, stats)) => {
                    debug!(
                        instance = %stats.name,
                        "{} results, {:.1}% errors",
                        stats.results,
                        stats.error_rate()
                    );
                    run.absorb(&key, &stats)
                }
                Err(e) => error!("Pager task failed: {}", e),
            }
        }

        if searched > 0 {
            run.record_query(run.total_results > 0);
            info!(
                "Completed search for query: {} ({} results)",
                self.query, run.total_results
            );
        }

        self.cumulative
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .merge(&run);

        // The caller may have dropped the run without asking for stats.
        let _ = self.done.send(run);
    }
}

async fn run_pager(
    mut pager: InstancePager,
    _permit: OwnedSemaphorePermit,
    tx: mpsc::Sender<SearchResult>,
    cancel: CancellationToken,
) -> (String, InstanceStats) {
    let key = pager.instance().key();

    'pages: loop {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            page = pager.next_page() => page,
        };
        let Some(results) = page else { break };

        for result in results {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'pages,
                sent = tx.send(result) => {
                    if sent.is_err() {
                        break 'pages;
                    }
                    pager.record_delivered(1);
                }
            }
        }
    }

    debug!(state = ?pager.state(), "Pager stopped");
    (key, pager.into_stats())
}

/// A running search.
///
/// Yields results as they arrive from any instance. Dropping the run
/// cancels every pager at its next suspension point.
pub struct SearchRun {
    id: Uuid,
    results: ReceiverStream<SearchResult>,
    stats: oneshot::Receiver<RunStats>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl SearchRun {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask every pager to stop; results already buffered stay readable
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the search and return its statistics
    pub async fn finish(self) -> RunStats {
        self.cancel.cancel();
        let SearchRun { id, results, stats, .. } = self;
        drop(results);

        match stats.await {
            Ok(stats) => stats,
            Err(_) => {
                warn!(run = %id, "Statistics collector ended without a report");
                RunStats::new()
            }
        }
    }

    /// Drain every result, then return them with the run statistics
    pub async fn collect(mut self) -> (Vec<SearchResult>, RunStats) {
        let mut results = Vec::new();
        while let Some(result) = self.results.next().await {
            results.push(result);
        }
        let stats = self.finish().await;
        (results, stats)
    }
}

impl Stream for SearchRun {
    type Item = SearchResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.results).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.results.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Session::new().unwrap(), &ScraperSettings::default())
    }

    #[tokio::test]
    async fn test_no_active_instances() {
        let orchestrator = orchestrator();
        let instances = vec![Instance::new("off", "http://127.0.0.1:9").with_active(false)];

        let (results, stats) = orchestrator
            .search(&instances, &SearchQuery::new("rust"), None)
            .collect()
            .await;

        assert!(results.is_empty());
        assert_eq!(stats.total_queries, 0);
        assert!(stats.instance_stats.is_empty());
        assert_eq!(orchestrator.stats().total_queries, 0);
    }

    #[tokio::test]
    async fn test_failing_instance_counts_failed_query() {
        let orchestrator = orchestrator();
        let instances = vec![Instance::new("broken", "not a url")];

        let (results, stats) = orchestrator
            .search(&instances, &SearchQuery::new("rust"), Some(2))
            .collect()
            .await;

        assert!(results.is_empty());
        assert_eq!(stats.total_queries, 1);
        assert_eq!(stats.failed_queries, 1);
        assert_eq!(stats.instance("broken_not a url").map(|s| s.errors), Some(1));

        let cumulative = orchestrator.stats();
        assert_eq!(cumulative.failed_queries, 1);

        orchestrator.reset_stats();
        assert_eq!(orchestrator.stats().total_queries, 0);
    }

    #[tokio::test]
    async fn test_run_ids_differ() {
        let orchestrator = orchestrator();
        let a = orchestrator.search(&[], &SearchQuery::new("a"), None);
        let b = orchestrator.search(&[], &SearchQuery::new("b"), None);
        assert_ne!(a.id(), b.id());
        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
    }
}

//! Per-instance pagination
//!
//! Walks the result pages of one instance the way a browser would: the
//! first page as a plain navigation, every later page as the in-page
//! "load more" form post.

use crate::instances::Instance;
use crate::metrics::InstanceStats;
use crate::network::{navigation_headers, xhr_headers, PageRequest, Session, TransportError};
use crate::parser;
use crate::query::SearchQuery;
use crate::results::SearchResult;
use futures::stream::{self, Stream};
use std::time::Instant;
use tracing::{debug, warn};

/// Where a pager is in its protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// Ready to request the next page
    Idle,
    /// A request is in flight
    FetchingPage,
    /// Pagination ended normally
    Done,
    /// A page failed; the instance is abandoned for this search
    Failed,
}

impl PagerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Why a page could not be fetched
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("invalid instance URL: {0}")]
    InvalidUrl(String),
}

impl PageError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// Pages through the results of one instance.
///
/// Owns its copy of the query so page numbers never leak between
/// instances.
pub struct InstancePager {
    session: Session,
    instance: Instance,
    query: SearchQuery,
    max_pages: u32,
    page: u32,
    state: PagerState,
    stats: InstanceStats,
}

impl InstancePager {
    pub fn new(session: Session, instance: Instance, query: SearchQuery, max_pages: u32) -> Self {
        let stats = InstanceStats::new(instance.name.clone());
        Self {
            session,
            instance,
            query: query.with_page(1),
            max_pages,
            page: 1,
            state: PagerState::Idle,
            stats,
        }
    }

    /// Fetch and parse the next page.
    ///
    /// Returns `None` once the pager is done or has failed; every later
    /// call returns `None` without touching the network. Returned results
    /// are not counted as delivered until [`record_delivered`] is called.
    ///
    /// [`record_delivered`]: Self::record_delivered
    pub async fn next_page(&mut self) -> Option<Vec<SearchResult>> {
        if self.state.is_terminal() {
            return None;
        }

        if !self.instance.is_active {
            debug!(instance = %self.instance.name, "Instance inactive, skipping");
            self.state = PagerState::Done;
            return None;
        }

        if self.page > self.max_pages {
            self.state = PagerState::Done;
            return None;
        }

        if self.page > 1 {
            let delay = self.instance.rate_limit();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        self.state = PagerState::FetchingPage;
        self.query.pageno = self.page;

        debug!(
            instance = %self.instance.name,
            page = self.page,
            "Searching '{}'",
            self.query.query
        );

        let started = Instant::now();
        let markup = match self.fetch().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(
                    instance = %self.instance.name,
                    page = self.page,
                    "Page failed: {}",
                    e
                );
                self.stats.record_error(e.to_string(), e.is_timeout());
                self.state = PagerState::Failed;
                return None;
            }
        };
        self.stats.record_response(started.elapsed());

        let results: Vec<SearchResult> = parser::parse(&markup, self.page)
            .into_iter()
            .map(|r| r.with_instance(self.instance.name.clone()))
            .collect();

        if results.is_empty() {
            debug!(
                instance = %self.instance.name,
                page = self.page,
                "No results, stopping pagination"
            );
            self.state = PagerState::Done;
            return None;
        }

        debug!(
            instance = %self.instance.name,
            page = self.page,
            "Got {} results",
            results.len()
        );

        self.stats.record_page();
        self.page += 1;
        self.state = if self.page > self.max_pages {
            PagerState::Done
        } else {
            PagerState::Idle
        };

        Some(results)
    }

    async fn fetch(&self) -> Result<String, PageError> {
        let url = self
            .instance
            .search_url()
            .map_err(|e| PageError::InvalidUrl(format!("{}: {}", self.instance.url, e)))?;

        let request = if self.page == 1 {
            PageRequest::get(url.as_str())
                .params(self.query.to_params())
                .headers(&navigation_headers(&self.query.language))
        } else {
            PageRequest::post(url.as_str())
                .form(self.query.to_form_fields())
                .headers(&xhr_headers(&self.instance.origin(), &self.query.language))
        };

        let request = request
            .headers(&self.instance.custom_headers)
            .timeout(self.instance.request_timeout());

        let response = self.session.execute(request).await?;
        if !response.is_ok() {
            return Err(PageError::UnexpectedStatus(response.status));
        }

        Ok(response.text)
    }

    /// All results of this instance as a lazy stream, page after page.
    ///
    /// Each result is counted as delivered when the stream yields it.
    pub fn results(&mut self) -> impl Stream<Item = SearchResult> + '_ {
        stream::unfold(
            (self, Vec::<SearchResult>::new().into_iter()),
            |(pager, mut pending)| async move {
                loop {
                    if let Some(result) = pending.next() {
                        pager.record_delivered(1);
                        return Some((result, (pager, pending)));
                    }
                    pending = pager.next_page().await?.into_iter();
                }
            },
        )
    }

    /// Count results handed to the consumer
    pub fn record_delivered(&mut self, count: usize) {
        self.stats.record_results(count);
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    /// Next page to be requested
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn stats(&self) -> &InstanceStats {
        &self.stats
    }

    pub fn into_stats(self) -> InstanceStats {
        self.stats
    }
}

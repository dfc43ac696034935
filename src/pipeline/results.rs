use crate::gateway::{ApiClient, ApiError};
use crate::models::Place;
use crate::pipeline::filters::apply_filters;
use crate::pipeline::paginate::{clamp_page, paginate, total_pages};
use crate::pipeline::search::apply_text_search;
use crate::pipeline::types::FilterCriteria;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Sequence number handed out when a search fetch is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

/// Hands out increasing tickets so a slow, older search can't overwrite a
/// newer one. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct SearchSequencer {
    latest: Arc<AtomicU64>,
}

impl SearchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_ticket(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True only for the most recently dispatched ticket
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// What a ticketed search fetch brought back
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub ticket: SearchTicket,
    pub query: Option<String>,
    pub places: Vec<Place>,
}

/// Fetch every place and keep the ones matching `query`
pub async fn fetch_search(
    client: &ApiClient,
    ticket: SearchTicket,
    query: Option<&str>,
) -> Result<SearchOutcome, ApiError> {
    let fetched = client.list_places().await?;
    let places = match query {
        Some(query) => apply_text_search(&fetched, query),
        None => fetched,
    };

    Ok(SearchOutcome {
        ticket,
        query: query.map(str::to_string),
        places,
    })
}

/// State behind the results page.
///
/// The fetched set is kept untouched; filters and paging are recomputed
/// from it on every read, so toggling a filter off brings places back.
#[derive(Debug, Clone)]
pub struct PlaceResults {
    original: Vec<Place>,
    query: Option<String>,
    criteria: FilterCriteria,
    page: usize,
    page_size: usize,
    sequencer: SearchSequencer,
}

impl Default for PlaceResults {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PlaceResults {
    pub fn new(page_size: usize) -> Self {
        Self {
            original: Vec::new(),
            query: None,
            criteria: FilterCriteria::default(),
            page: 1,
            page_size: page_size.max(1),
            sequencer: SearchSequencer::new(),
        }
    }

    /// Start a search; the returned ticket must come back with its results
    pub fn begin_search(&self) -> SearchTicket {
        self.sequencer.next_ticket()
    }

    pub fn sequencer(&self) -> &SearchSequencer {
        &self.sequencer
    }

    /// Install search results unless a newer search was dispatched since.
    /// Returns whether the outcome was used.
    pub fn accept(&mut self, outcome: SearchOutcome) -> bool {
        if !self.sequencer.is_current(outcome.ticket) {
            debug!("Discarding stale search results {:?}", outcome.ticket);
            return false;
        }

        info!(
            "Loaded {} places{}",
            outcome.places.len(),
            outcome
                .query
                .as_deref()
                .map(|q| format!(" matching \"{}\"", q))
                .unwrap_or_default()
        );
        self.original = outcome.places;
        self.query = outcome.query;
        self.page = 1;
        true
    }

    /// Replace the fetched set directly. Any search still in flight is
    /// superseded and its results will be discarded.
    pub fn load(&mut self, places: Vec<Place>) {
        self.sequencer.next_ticket();
        self.original = places;
        self.query = None;
        self.page = 1;
    }

    /// Dispatch a search and install it if it is still the newest when it lands
    pub async fn refresh(&mut self, client: &ApiClient, query: Option<&str>) -> Result<bool, ApiError> {
        let ticket = self.begin_search();
        let outcome = fetch_search(client, ticket, query).await?;
        Ok(self.accept(outcome))
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn original(&self) -> &[Place] {
        &self.original
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.page = 1;
    }

    pub fn reset_criteria(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    pub fn toggle_amenity(&mut self, name: &str) {
        self.criteria.toggle_amenity(name);
        self.page = 1;
    }

    /// Every place passing the current criteria
    pub fn filtered(&self) -> Vec<Place> {
        apply_filters(&self.original, &self.criteria)
    }

    /// Places on the current page
    pub fn displayed(&self) -> Vec<Place> {
        let filtered = self.filtered();
        let page = clamp_page(self.page, total_pages(filtered.len(), self.page_size));
        paginate(&filtered, page, self.page_size).to_vec()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = clamp_page(page, self.total_pages());
    }

    pub fn next_page(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }
}

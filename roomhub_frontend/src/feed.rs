//! Infinite-scroll room feed.
//!
//! A feed generation is one fixed filter set. Each filter change starts a new
//! generation; page results are tagged with the generation that requested them
//! and anything arriving for an older generation is dropped.

use thiserror::Error;

use crate::models::{RoomFilters, RoomSummary, SearchRoomsResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedFetchError {
    #[error("room search request failed: {0}")]
    Transport(String),
    #[error("room search response could not be decoded: {0}")]
    Decode(String),
}

/// Why a generation stopped paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEnd {
    /// The server returned an empty page.
    NoMoreResults,
    /// The response had no `rooms` collection.
    MissingRooms,
    Failed(FeedFetchError),
}

/// A page fetch the caller must dispatch, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub page: u32,
    pub limit: u32,
    pub filters: RoomFilters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Appended(usize),
    Ended(FeedEnd),
    Stale,
}

#[derive(Debug)]
pub struct RoomFeed {
    filters: RoomFilters,
    generation: u64,
    items: Vec<RoomSummary>,
    page: u32,
    limit: u32,
    loading: bool,
    end: Option<FeedEnd>,
    total: Option<u64>,
}

impl RoomFeed {
    pub fn new(filters: RoomFilters, limit: u32) -> Self {
        Self {
            filters,
            generation: 0,
            items: Vec::new(),
            page: 1,
            limit: limit.max(1),
            loading: false,
            end: None,
            total: None,
        }
    }

    pub fn filters(&self) -> &RoomFilters {
        &self.filters
    }

    pub fn items(&self) -> &[RoomSummary] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.end.is_some()
    }

    pub fn end(&self) -> Option<&FeedEnd> {
        self.end.as_ref()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Replaces the filter set. Any change starts a new generation; an
    /// identical filter set leaves the feed untouched.
    pub fn set_filters(&mut self, filters: RoomFilters) -> bool {
        if filters == self.filters {
            return false;
        }
        self.filters = filters;
        self.restart();
        true
    }

    /// Starts a fresh generation with the current filters.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.page = 1;
        self.loading = false;
        self.end = None;
        self.total = None;
    }

    /// Claims the next page if nothing is in flight and the generation has
    /// not ended. Concurrent triggers coalesce: only the first one gets a
    /// request until that request is applied.
    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        if self.loading || self.end.is_some() {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            generation: self.generation,
            page: self.page,
            limit: self.limit,
            filters: self.filters.clone(),
        })
    }

    /// Applies the result of a [`PageRequest`].
    pub fn apply_page(
        &mut self,
        generation: u64,
        result: Result<SearchRoomsResponse, FeedFetchError>,
    ) -> PageOutcome {
        if generation != self.generation {
            log::debug!(
                "dropping room page for generation {generation} (current {})",
                self.generation
            );
            return PageOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(SearchRoomsResponse { rooms: Some(rooms), total }) if !rooms.is_empty() => {
                let count = rooms.len();
                self.items.extend(rooms);
                self.total = total.or(self.total);
                log::info!(
                    "room feed page {} appended {count} rooms ({} total)",
                    self.page,
                    self.items.len()
                );
                self.page += 1;
                PageOutcome::Appended(count)
            }
            Ok(SearchRoomsResponse { rooms: Some(_), .. }) => {
                log::info!("room feed reached the end at page {}", self.page);
                self.finish(FeedEnd::NoMoreResults)
            }
            Ok(SearchRoomsResponse { rooms: None, .. }) => {
                log::info!("room feed page {} had no rooms field; stopping", self.page);
                self.finish(FeedEnd::MissingRooms)
            }
            Err(err) => {
                log::warn!("room feed page {} failed: {err}", self.page);
                self.finish(FeedEnd::Failed(err))
            }
        }
    }

    fn finish(&mut self, end: FeedEnd) -> PageOutcome {
        self.end = Some(end.clone());
        PageOutcome::Ended(end)
    }

    /// Index of the item that acts as the load-more sentinel, if paging can
    /// continue.
    pub fn sentinel_index(&self) -> Option<usize> {
        if self.end.is_some() {
            return None;
        }
        self.items.len().checked_sub(1)
    }
}

/// Edge detector for the sentinel: fires when the watched item becomes
/// visible, and again whenever the watched item changes while visible.
#[derive(Debug, Default)]
pub struct SentinelWatch {
    watched: Option<(u64, usize)>,
    visible: bool,
}

impl SentinelWatch {
    pub fn observe(&mut self, generation: u64, index: usize, visible: bool) -> bool {
        let key = (generation, index);
        let entered = if self.watched != Some(key) {
            self.watched = Some(key);
            visible
        } else {
            visible && !self.visible
        };
        self.visible = visible;
        entered
    }

    pub fn reset(&mut self) {
        self.watched = None;
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rooms(prefix: &str, count: usize) -> Vec<RoomSummary> {
        (0..count)
            .map(|i| RoomSummary {
                id: format!("{prefix}-{i}"),
                title: format!("Room {i}"),
                campus: "University of Lagos".into(),
                location: "Akoka".into(),
                price: 120000.0,
                room_type: "Single".into(),
                images: Vec::new(),
                created_at: None,
            })
            .collect()
    }

    fn page_of(items: Vec<RoomSummary>) -> Result<SearchRoomsResponse, FeedFetchError> {
        let total = items.len() as u64;
        Ok(SearchRoomsResponse {
            rooms: Some(items),
            total: Some(total),
        })
    }

    fn unilag() -> RoomFilters {
        RoomFilters {
            campus: "University of Lagos".into(),
            ..RoomFilters::default()
        }
    }

    #[test]
    fn paging_until_an_empty_page() {
        let mut feed = RoomFeed::new(unilag(), 10);

        let first = feed.request_next_page().expect("page 1");
        assert_eq!(first.page, 1);
        assert_eq!(first.limit, 10);
        assert_eq!(first.filters, unilag());
        assert_eq!(
            feed.apply_page(first.generation, page_of(rooms("a", 10))),
            PageOutcome::Appended(10)
        );
        assert_eq!(feed.items().len(), 10);
        assert_eq!(feed.page(), 2);
        assert!(!feed.is_exhausted());

        let second = feed.request_next_page().expect("page 2");
        assert_eq!(second.page, 2);
        assert_eq!(
            feed.apply_page(second.generation, page_of(Vec::new())),
            PageOutcome::Ended(FeedEnd::NoMoreResults)
        );
        assert!(feed.is_exhausted());
        assert_eq!(feed.items().len(), 10);
        assert_eq!(feed.page(), 2);
        assert!(feed.request_next_page().is_none());
        assert!(feed.sentinel_index().is_none());
    }

    #[test]
    fn overlapping_triggers_yield_one_request() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        assert!(feed.request_next_page().is_some());
        assert!(feed.is_loading());
        assert!(feed.request_next_page().is_none());
        assert!(feed.request_next_page().is_none());
    }

    #[test]
    fn filter_change_resets_before_next_fetch() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        let request = feed.request_next_page().expect("page 1");
        feed.apply_page(request.generation, page_of(rooms("a", 10)));
        assert_eq!(feed.page(), 2);

        assert!(feed.set_filters(unilag()));
        assert!(feed.items().is_empty());
        assert_eq!(feed.page(), 1);
        assert!(!feed.is_loading());
        let next = feed.request_next_page().expect("fresh page 1");
        assert_eq!(next.page, 1);
        assert_eq!(next.filters, unilag());
    }

    #[test]
    fn same_filters_do_not_restart() {
        let mut feed = RoomFeed::new(unilag(), 10);
        let generation = feed.generation();
        assert!(!feed.set_filters(unilag()));
        assert_eq!(feed.generation(), generation);
    }

    #[test]
    fn late_results_from_old_generation_are_dropped() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        let old = feed.request_next_page().expect("old page");

        feed.set_filters(RoomFilters {
            search: "self contained".into(),
            ..RoomFilters::default()
        });
        let current = feed.request_next_page().expect("new page");
        assert_ne!(old.generation, current.generation);

        assert_eq!(feed.apply_page(old.generation, page_of(rooms("old", 10))), PageOutcome::Stale);
        assert!(feed.items().is_empty());
        assert!(feed.is_loading());

        assert_eq!(
            feed.apply_page(current.generation, page_of(rooms("new", 3))),
            PageOutcome::Appended(3)
        );
        assert_eq!(feed.items()[0].id, "new-0");
    }

    #[test]
    fn stale_failure_does_not_end_the_new_generation() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        let old = feed.request_next_page().expect("old page");
        feed.set_filters(unilag());
        let outcome =
            feed.apply_page(old.generation, Err(FeedFetchError::Transport("reset".into())));
        assert_eq!(outcome, PageOutcome::Stale);
        assert!(!feed.is_exhausted());
    }

    #[test]
    fn missing_rooms_field_ends_the_generation() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        let request = feed.request_next_page().expect("page");
        let outcome = feed.apply_page(request.generation, Ok(SearchRoomsResponse::default()));
        assert_eq!(outcome, PageOutcome::Ended(FeedEnd::MissingRooms));
        assert!(feed.request_next_page().is_none());
    }

    #[test]
    fn fetch_errors_stop_paging_but_stay_distinguishable() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        let request = feed.request_next_page().expect("page");
        feed.apply_page(request.generation, Err(FeedFetchError::Decode("expected value".into())));
        assert!(feed.is_exhausted());
        assert!(!feed.is_loading());
        assert!(matches!(feed.end(), Some(FeedEnd::Failed(FeedFetchError::Decode(_)))));

        feed.set_filters(unilag());
        assert!(feed.request_next_page().is_some());
    }

    #[test]
    fn server_order_is_preserved() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 2);
        let mut batch = rooms("z", 2);
        batch.reverse();
        let request = feed.request_next_page().expect("page");
        feed.apply_page(request.generation, page_of(batch));
        let ids: Vec<_> = feed.items().iter().map(|room| room.id.as_str()).collect();
        assert_eq!(ids, vec!["z-1", "z-0"]);
    }

    #[test]
    fn sentinel_fires_on_entry_and_on_new_last_item() {
        let mut watch = SentinelWatch::default();
        assert!(!watch.observe(1, 9, false));
        assert!(watch.observe(1, 9, true));
        assert!(!watch.observe(1, 9, true));
        assert!(!watch.observe(1, 9, false));
        assert!(watch.observe(1, 9, true));
        // list grew and the new last card is already on screen
        assert!(watch.observe(1, 19, true));
        // filter change re-arms even at the same index
        assert!(watch.observe(2, 19, true));
    }

    #[test]
    fn sentinel_follows_last_item() {
        let mut feed = RoomFeed::new(RoomFilters::default(), 10);
        assert_eq!(feed.sentinel_index(), None);
        let request = feed.request_next_page().expect("page");
        feed.apply_page(request.generation, page_of(rooms("a", 4)));
        assert_eq!(feed.sentinel_index(), Some(3));
    }
}

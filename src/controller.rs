use tracing::debug;

use crate::error::ClientError;
use crate::feed::{FeedEvent, FeedState};
use crate::models::{FeedPage, SortKey};

/// Page-level coordinator for one feed view: holds the store plus the view
/// intent (page, page size, sort), and arbitrates between the two update
/// paths.
///
/// List fetches are tagged with a monotonically increasing sequence number
/// at issue time; a response is applied only while its number is still the
/// latest issued, so a slow response from an abandoned page/sort can never
/// overwrite the feed the user actually asked for.
pub struct FeedController {
    pub state: FeedState,
    sort: SortKey,
    page: u64,
    page_size: u64,
    latest_seq: u64,
}

impl FeedController {
    pub fn new(page_size: u64) -> Self {
        FeedController {
            state: FeedState::new(),
            sort: SortKey::Newest,
            page: 1,
            page_size: page_size.max(1),
            latest_seq: 0,
        }
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Issue a new list intent. The returned sequence number must accompany
    /// the eventual response to `apply_list`.
    pub fn begin_list(&mut self) -> u64 {
        self.latest_seq += 1;
        self.state.clear_status();
        self.state.begin_loading();
        self.latest_seq
    }

    /// Apply a resolved list fetch. Returns `false` when the response was
    /// stale (superseded by a later `begin_list`) and therefore discarded.
    pub fn apply_list(&mut self, seq: u64, result: Result<FeedPage, ClientError>) -> bool {
        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, "discarding stale list response");
            return false;
        }
        match result {
            Ok(page) => {
                self.page = page.page.max(1);
                self.state
                    .replace_page(page.comments, page.total_pages, page.page, page.total_comments);
            }
            Err(e) => self.state.fail(e.to_string()),
        }
        true
    }

    /// Change the sort order; resets to the first page. Returns the sequence
    /// number of the re-fetch this requires.
    pub fn set_sort(&mut self, sort: SortKey) -> u64 {
        self.sort = sort;
        self.page = 1;
        self.begin_list()
    }

    pub fn set_page(&mut self, page: u64) -> u64 {
        self.page = page.max(1);
        self.begin_list()
    }

    pub fn next_page(&mut self) -> Option<u64> {
        if self.page < self.state.total_pages {
            Some(self.set_page(self.page + 1))
        } else {
            None
        }
    }

    pub fn prev_page(&mut self) -> Option<u64> {
        if self.page > 1 {
            Some(self.set_page(self.page - 1))
        } else {
            None
        }
    }

    /// Funnel any event (realtime push or the acting user's own result)
    /// into the store.
    pub fn apply_event(&mut self, event: FeedEvent) {
        self.state.apply(event);
    }

    pub fn report_error(&mut self, err: &ClientError) {
        self.state.fail(err.to_string());
    }

    pub fn clear_status(&mut self) {
        self.state.clear_status();
    }

    /// View unmount: store back to its initial state, intent to defaults.
    pub fn teardown(&mut self) {
        self.state.reset();
        self.sort = SortKey::Newest;
        self.page = 1;
        self.latest_seq += 1; // any in-flight response is now stale
    }
}

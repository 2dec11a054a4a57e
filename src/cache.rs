//! Cache of the pages the integration can write to.
//!
//! Listing pages means paging through the search endpoint, so the result is
//! kept for a while. The cache is an ordinary value owned by the caller, and
//! time comes from an injected [`Clock`] so expiry can be tested.

use std::time::{Duration, Instant};

use serde_json::Value;

/// How long a page listing stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// A page the integration can write notes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub title: String,
}

impl PageRef {
    /// Extract a page reference from a search result object.
    ///
    /// The title comes from the `title` property, or `Name` for database
    /// rows, and falls back to "Untitled".
    pub fn from_search_result(page: &Value) -> Option<Self> {
        let id = page.get("id")?.as_str()?.to_string();
        let properties = page.get("properties");
        let title = ["title", "Name"]
            .iter()
            .filter_map(|key| properties?.get(key)?.get("title")?.as_array())
            .find_map(|runs| runs.first()?.get("plain_text")?.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or("Untitled")
            .to_string();
        Some(Self { id, title })
    }

    /// All page references in one page of search results.
    pub fn from_search_response(response: &Value) -> Vec<Self> {
        response
            .get("results")
            .and_then(Value::as_array)
            .map(|results| results.iter().filter_map(Self::from_search_result).collect())
            .unwrap_or_default()
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
pub struct PageTreeCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entry: Option<(Instant, Vec<PageRef>)>,
}

impl PageTreeCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl Default for PageTreeCache<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<C: Clock> PageTreeCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entry: None,
        }
    }

    /// Cached pages, if present and not expired.
    pub fn get(&self) -> Option<&[PageRef]> {
        let (stored_at, pages) = self.entry.as_ref()?;
        if self.clock.now().saturating_duration_since(*stored_at) < self.ttl {
            Some(pages.as_slice())
        } else {
            None
        }
    }

    pub fn store(&mut self, pages: Vec<PageRef>) {
        self.entry = Some((self.clock.now(), pages));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Cached pages, calling `fetch` to refill on a miss or after expiry.
    /// A failed fetch leaves the cache empty and returns the error.
    pub fn get_or_refresh<E>(
        &mut self,
        fetch: impl FnOnce() -> Result<Vec<PageRef>, E>,
    ) -> Result<&[PageRef], E> {
        if self.get().is_none() {
            self.entry = None;
            let pages = fetch()?;
            tracing::info!("Cached {} pages", pages.len());
            self.store(pages);
        }
        Ok(self.entry.as_ref().map(|(_, pages)| pages.as_slice()).unwrap_or_default())
    }
}

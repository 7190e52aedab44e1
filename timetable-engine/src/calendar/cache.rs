//! Calendar deduplication for import runs.
//!
//! Feeds repeat the same operating pattern under many ids. Interning by
//! content lets every trip with an identical pattern share one `Arc`.

use std::sync::Arc;

use moka::sync::Cache as MokaCache;

use crate::domain::{Calendar, CalendarKey};

/// Interns calendars by content for the length of one import.
///
/// Safe to share between threads: concurrent callers interning equal
/// calendars all get the same `Arc`.
#[derive(Clone)]
pub struct CalendarCache {
    calendars: MokaCache<CalendarKey, Arc<Calendar>>,
}

impl CalendarCache {
    pub fn new() -> Self {
        Self {
            calendars: MokaCache::builder().build(),
        }
    }

    /// The shared calendar with the same content as `calendar`.
    ///
    /// The first calendar interned with given content wins, id and summary
    /// included.
    pub fn intern(&self, calendar: Calendar) -> Arc<Calendar> {
        self.calendars
            .get_with(calendar.content_key(), || Arc::new(calendar))
    }

    /// Look up a previously interned calendar by content.
    pub fn get(&self, key: &CalendarKey) -> Option<Arc<Calendar>> {
        self.calendars.get(key)
    }

    /// Number of distinct calendars held.
    pub fn len(&self) -> u64 {
        self.calendars.run_pending_tasks();
        self.calendars.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CalendarCache {
    fn default() -> Self {
        Self::new()
    }
}

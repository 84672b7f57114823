use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use crate::engine::source::DataSource;
use crate::error::DataSourceError;
use crate::model::{Group, Item, TimelineStore, Viewport};

pub const DEFAULT_CAPACITY: usize = 64;
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Preload this much extra window on each side of the viewport.
const PRELOAD_PADDING: f64 = 0.5;

/// Identity of one fetch. Times are millisecond ticks so keys hash cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Items { offset: usize, limit: usize },
    Groups { offset: usize, limit: usize },
    TimeRange { start_ms: i64, end_ms: i64 },
    Group(Uuid),
}

#[derive(Debug, Clone)]
enum Payload {
    Items {
        items: Vec<Item>,
        total: usize,
        has_more: bool,
    },
    Groups {
        groups: Vec<Group>,
    },
    Range(Vec<Item>),
    GroupItems(Vec<Item>),
}

struct Completion {
    key: RequestKey,
    result: Result<Payload, DataSourceError>,
}

fn run_worker(source: Arc<dyn DataSource>, rx: Receiver<RequestKey>, tx: Sender<Completion>) {
    while let Ok(key) = rx.recv() {
        let result = match key {
            RequestKey::Items { offset, limit } => {
                source.fetch_items(offset, limit).map(|page| Payload::Items {
                    items: page.items,
                    total: page.total,
                    has_more: page.has_more,
                })
            }
            RequestKey::Groups { offset, limit } => source
                .fetch_groups(offset, limit)
                .map(|page| Payload::Groups {
                    groups: page.groups,
                }),
            RequestKey::TimeRange { start_ms, end_ms } => {
                let start = Utc.timestamp_millis_opt(start_ms).single();
                let end = Utc.timestamp_millis_opt(end_ms).single();
                match (start, end) {
                    (Some(s), Some(e)) => source.fetch_by_time_range(s, e).map(Payload::Range),
                    _ => Err(DataSourceError::Unavailable(
                        "time range out of bounds".into(),
                    )),
                }
            }
            RequestKey::Group(id) => source.fetch_by_group(id).map(Payload::GroupItems),
        };
        if tx.send(Completion { key, result }).is_err() {
            break;
        }
    }
}

/// Async-loading cache between the UI and a [`DataSource`].
///
/// Fetches run on one worker thread; results come back over a channel and
/// are merged into the store by `poll_completions`, which the app calls once
/// per frame. The UI thread never blocks on the source.
pub struct LazyCache {
    tx: Sender<RequestKey>,
    rx: Receiver<Completion>,
    entries: HashMap<RequestKey, Payload>,
    // Insertion order of `entries`, oldest at the front.
    order: VecDeque<RequestKey>,
    pending: HashSet<RequestKey>,
    capacity: usize,
    batch_size: usize,
    cursor: usize,
    total: Option<usize>,
    has_more: bool,
    loading_more: bool,
    last_error: Option<(RequestKey, DataSourceError)>,
}

impl LazyCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(source: Arc<dyn DataSource>, capacity: usize) -> Self {
        let (req_tx, req_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        thread::Builder::new()
            .name("timeloom-cache".into())
            .spawn(move || run_worker(source, req_rx, done_tx))
            .expect("failed to spawn cache worker");
        Self {
            tx: req_tx,
            rx: done_rx,
            entries: HashMap::new(),
            order: VecDeque::new(),
            pending: HashSet::new(),
            capacity: capacity.max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            cursor: 0,
            total: None,
            has_more: true,
            loading_more: false,
            last_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn loaded_count(&self) -> usize {
        self.cursor
    }

    pub fn last_error(&self) -> Option<&DataSourceError> {
        self.last_error.as_ref().map(|(_, e)| e)
    }

    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_cached(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Issue a fetch unless the same request is already cached or in flight.
    pub fn request(&mut self, key: RequestKey) {
        if self.entries.contains_key(&key) || self.pending.contains(&key) {
            return;
        }
        log::debug!("cache request {key:?}");
        self.pending.insert(key);
        // Send only fails if the worker died, which recv will surface.
        let _ = self.tx.send(key);
    }

    /// Fetch the next page of the paged item listing. Calling again while a
    /// page is in flight, or after the listing is exhausted, does nothing.
    pub fn load_more(&mut self) {
        if self.loading_more || !self.has_more {
            return;
        }
        self.loading_more = true;
        self.request(RequestKey::Items {
            offset: self.cursor,
            limit: self.batch_size,
        });
    }

    /// Preload items around the viewport so near-future panning hits cache.
    /// The requested window is the visible one widened by 50% on each side.
    pub fn preload_window(&mut self, viewport: &Viewport) {
        let start = viewport.start.timestamp_millis();
        let end = viewport.end.timestamp_millis();
        let pad = ((end - start) as f64 * PRELOAD_PADDING) as i64;
        let key = RequestKey::TimeRange {
            start_ms: start.saturating_sub(pad),
            end_ms: end.saturating_add(pad),
        };
        if self.covers(&key) {
            return;
        }
        self.request(key);
    }

    // A cached or in-flight range that contains `key`'s span counts as
    // coverage, so panning within a preloaded window issues nothing.
    fn covers(&self, key: &RequestKey) -> bool {
        let RequestKey::TimeRange { start_ms, end_ms } = key else {
            return false;
        };
        self.entries
            .keys()
            .chain(self.pending.iter())
            .any(|k| match k {
                RequestKey::TimeRange {
                    start_ms: s,
                    end_ms: e,
                } => s <= start_ms && e >= end_ms,
                _ => false,
            })
    }

    /// Re-issue the most recent failed request, if any.
    pub fn retry_last_failed(&mut self) {
        if let Some((key, _)) = self.last_error.take() {
            self.entries.remove(&key);
            self.order.retain(|k| k != &key);
            self.request(key);
        }
    }

    /// Drop all cached pages. In-flight requests still complete and land.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.cursor = 0;
        self.total = None;
        self.has_more = true;
    }

    /// Drain finished fetches and merge their payloads into the store.
    /// Returns the number of completions applied.
    pub fn poll_completions(&mut self, store: &mut TimelineStore) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.apply_completion(done, store);
            applied += 1;
        }
        applied
    }

    /// Block until every in-flight request has completed or `timeout`
    /// elapses. Returns true when the cache went idle.
    pub fn wait_idle(&mut self, store: &mut TimelineStore, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.pending.is_empty() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(left) {
                Ok(done) => self.apply_completion(done, store),
                Err(_) => return false,
            }
        }
        true
    }

    fn apply_completion(&mut self, done: Completion, store: &mut TimelineStore) {
        self.pending.remove(&done.key);
        match done.result {
            Ok(payload) => {
                self.merge(&payload, store);
                if let Payload::Items {
                    items,
                    total,
                    has_more,
                } = &payload
                {
                    if let RequestKey::Items { offset, .. } = done.key {
                        // A re-fetch of an already-consumed page must not
                        // rewind the cursor or resurrect `has_more`.
                        let reach = offset + items.len();
                        if reach >= self.cursor {
                            self.cursor = reach;
                            self.total = Some(*total);
                            self.has_more = *has_more;
                        }
                    }
                    self.loading_more = false;
                }
                self.insert_entry(done.key, payload);
            }
            Err(err) => {
                log::warn!("fetch {:?} failed: {err}", done.key);
                if matches!(done.key, RequestKey::Items { .. }) {
                    self.loading_more = false;
                }
                self.last_error = Some((done.key, err));
            }
        }
    }

    fn merge(&self, payload: &Payload, store: &mut TimelineStore) {
        match payload {
            Payload::Items { items, .. } | Payload::Range(items) | Payload::GroupItems(items) => {
                let added = store.merge_items(items.clone());
                if added > 0 {
                    log::debug!("merged {added} new items");
                }
            }
            Payload::Groups { groups } => {
                store.merge_groups(groups.clone());
            }
        }
    }

    fn insert_entry(&mut self, key: RequestKey, payload: Payload) {
        if self.entries.insert(key, payload).is_none() {
            self.order.push_back(key);
            while self.order.len() > self.capacity {
                if let Some(evicted) = self.order.pop_front() {
                    self.entries.remove(&evicted);
                    log::debug!("evicted {evicted:?}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::{GroupPage, InMemorySource, ItemPage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const IDLE: Duration = Duration::from_secs(2);

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + chrono::Days::new(u64::from(d - 1))
    }

    fn dataset(n: u32) -> Vec<Item> {
        (1..=n)
            .map(|d| Item::new(format!("t{d}"), day(d), day(d + 1)))
            .collect()
    }

    /// Source wrapper that counts fetches, for dedupe assertions.
    struct CountingSource {
        inner: InMemorySource,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(items: Vec<Item>) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemorySource::new(items, vec![]),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemorySource::new(vec![], vec![]),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DataSource for CountingSource {
        fn fetch_items(&self, offset: usize, limit: usize) -> Result<ItemPage, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataSourceError::Timeout);
            }
            self.inner.fetch_items(offset, limit)
        }

        fn fetch_groups(&self, offset: usize, limit: usize) -> Result<GroupPage, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_groups(offset, limit)
        }

        fn fetch_by_time_range(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Item>, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataSourceError::Timeout);
            }
            self.inner.fetch_by_time_range(start, end)
        }

        fn fetch_by_group(&self, group: Uuid) -> Result<Vec<Item>, DataSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_by_group(group)
        }
    }

    #[test]
    fn identical_requests_hit_the_source_once() {
        let source = CountingSource::new(dataset(10));
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        let key = RequestKey::Items {
            offset: 0,
            limit: 5,
        };
        cache.request(key);
        cache.request(key); // in flight, deduped
        assert!(cache.wait_idle(&mut store, IDLE));
        cache.request(key); // cached, deduped
        assert!(cache.wait_idle(&mut store, IDLE));

        assert_eq!(source.calls(), 1);
        assert_eq!(store.items().len(), 5);
    }

    #[test]
    fn load_more_is_idempotent_and_pages_forward() {
        let source = CountingSource::new(dataset(250));
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        cache.load_more();
        cache.load_more(); // already loading
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.loaded_count(), 100);
        assert_eq!(cache.total(), Some(250));
        assert!(cache.has_more());

        cache.load_more();
        cache.load_more();
        cache.load_more();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 2);

        cache.load_more();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(cache.loaded_count(), 250);
        assert!(!cache.has_more());
        assert_eq!(store.items().len(), 250);

        cache.load_more(); // exhausted, no fetch
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn fifo_eviction_drops_the_oldest_entry() {
        let source = CountingSource::new(dataset(30));
        let mut cache = LazyCache::with_capacity(source.clone(), 2);
        let mut store = TimelineStore::new();

        let r1 = RequestKey::Items {
            offset: 0,
            limit: 10,
        };
        let r2 = RequestKey::Items {
            offset: 10,
            limit: 10,
        };
        let r3 = RequestKey::Items {
            offset: 20,
            limit: 10,
        };
        for key in [r1, r2, r3] {
            cache.request(key);
            assert!(cache.wait_idle(&mut store, IDLE));
        }

        assert_eq!(cache.cached_len(), 2);
        assert!(!cache.is_cached(&r1));
        assert!(cache.is_cached(&r2));
        assert!(cache.is_cached(&r3));
        // Evicted data stays in the store; only the page entry is gone.
        assert_eq!(store.items().len(), 30);

        // The evicted request fetches again.
        cache.request(r1);
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 4);
    }

    #[test]
    fn group_fetch_dedupes_and_merges_members() {
        let group = Group::new("g");
        let gid = group.id;
        let mut items = dataset(6);
        for item in items.iter_mut().take(4) {
            item.group = Some(gid);
        }
        let source = Arc::new(CountingSource {
            inner: InMemorySource::new(items, vec![group]),
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        cache.request(RequestKey::Group(gid));
        cache.request(RequestKey::Group(gid)); // in flight, deduped
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 1);
        assert_eq!(store.items().len(), 4);
        assert!(store.items().iter().all(|i| i.group == Some(gid)));

        cache.request(RequestKey::Group(gid)); // cached, deduped
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn refetching_an_old_page_keeps_the_listing_exhausted() {
        let source = CountingSource::new(dataset(30));
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        cache.load_more();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert!(!cache.has_more());
        assert_eq!(cache.loaded_count(), 30);

        // An early page comes back with has_more = true; that must not
        // reopen the exhausted listing.
        cache.request(RequestKey::Items {
            offset: 0,
            limit: 10,
        });
        assert!(cache.wait_idle(&mut store, IDLE));
        assert!(!cache.has_more());
        assert_eq!(cache.total(), Some(30));
        assert_eq!(cache.loaded_count(), 30);

        cache.load_more(); // still exhausted, no fetch
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn preload_covers_contained_windows() {
        let source = CountingSource::new(dataset(20));
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        let mut vp = Viewport::new(day(5), day(9));
        vp.set_container_size(800.0, 400.0);
        cache.preload_window(&vp);
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 1);

        // A narrower window inside the padded one needs no fetch.
        let vp2 = Viewport::new(day(6), day(8));
        cache.preload_window(&vp2);
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 1);

        // A window outside the padded span does.
        let vp3 = Viewport::new(day(14), day(18));
        cache.preload_window(&vp3);
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn failed_fetch_is_recoverable_and_isolated() {
        let source = CountingSource::failing();
        let mut cache = LazyCache::new(source.clone());
        let mut store = TimelineStore::new();

        cache.load_more();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert!(matches!(cache.last_error(), Some(DataSourceError::Timeout)));
        assert!(store.items().is_empty());

        // The failure released the load_more latch.
        cache.load_more();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 2);

        cache.retry_last_failed();
        assert!(cache.wait_idle(&mut store, IDLE));
        assert_eq!(source.calls(), 3);
    }
}

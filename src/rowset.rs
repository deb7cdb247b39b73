//! Paged result sets.
//!
//! A `RowSet` is one page of a query result plus the means to fetch the
//! following pages. Rows sit in a lock-free queue and are removed as they are
//! read, so a `RowSet` is single-pass. When the queue runs dry and the server
//! reported more pages, the next page is fetched with the injected
//! continuation and its rows are appended to the same queue.
//!
//! At most one page fetch is in flight per `RowSet`. Concurrent readers that
//! find a fetch running wait for that fetch instead of starting another one.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::Stream;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::options::ResultOptions;
use crate::protocol::types::{ColumnDescription, Row, RowSetMetadata};

/// Continuation that fetches the page identified by a paging state.
pub type PageFetcher = Arc<dyn Fn(Bytes) -> BoxFuture<'static, Result<RowSet>> + Send + Sync>;

type FetchOutcome = std::result::Result<usize, Arc<Error>>;
type InFlightFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Information about how a request was executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionInfo {
    /// Host that answered the request.
    pub queried_host: Option<SocketAddr>,
    /// Hosts tried, in order, including the one that answered.
    pub tried_hosts: Vec<SocketAddr>,
    /// Tracing session id when tracing was requested.
    pub tracing_id: Option<Uuid>,
    /// Warnings returned by the server.
    pub warnings: Vec<String>,
}

/// A page of rows with transparent fetching of the following pages.
///
/// Cloning is cheap and yields another handle to the same queue; rows read
/// through one handle are gone for all of them.
///
/// # Example
///
/// ```no_run
/// use cql_thin_rs::{Result, RowSet};
///
/// async fn print_all(rows: RowSet) -> Result<()> {
///     while let Some(row) = rows.next_row().await? {
///         let name: String = row.get_by_name("name")?;
///         let age: Option<i32> = row.get_by_name("age")?;
///         println!("{} {:?}", name, age);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RowSet {
    inner: Arc<Inner>,
}

struct Inner {
    metadata: Arc<RowSetMetadata>,
    /// `None` for results that carry no rows (void results).
    queue: Option<(Sender<Row>, Receiver<Row>)>,
    paging_state: RwLock<Option<Bytes>>,
    auto_page: bool,
    fetch_timeout: Duration,
    info: RwLock<ExecutionInfo>,
    fetcher: OnceLock<PageFetcher>,
    /// The running fetch, tagged with its id.
    in_flight: Mutex<Option<(u64, InFlightFetch)>>,
    next_fetch_id: AtomicU64,
}

impl RowSet {
    /// Create an empty page for rows described by `metadata`.
    pub fn new(metadata: Arc<RowSetMetadata>, options: &ResultOptions) -> Self {
        Self::build(metadata, Some(crossbeam_channel::unbounded()), options)
    }

    /// Create a result set for a response without rows.
    ///
    /// It yields no rows and rejects [`add_row`](Self::add_row).
    pub fn void() -> Self {
        Self::build(
            Arc::new(RowSetMetadata::default()),
            None,
            &ResultOptions::default(),
        )
    }

    fn build(
        metadata: Arc<RowSetMetadata>,
        queue: Option<(Sender<Row>, Receiver<Row>)>,
        options: &ResultOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                metadata,
                queue,
                paging_state: RwLock::new(None),
                auto_page: options.auto_page,
                fetch_timeout: options.fetch_timeout,
                info: RwLock::new(ExecutionInfo::default()),
                fetcher: OnceLock::new(),
                in_flight: Mutex::new(None),
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    /// Whether this result set was created for a void result.
    pub fn is_void(&self) -> bool {
        self.inner.queue.is_none()
    }

    /// Column descriptions shared by every row.
    pub fn columns(&self) -> &[ColumnDescription] {
        self.inner.metadata.columns()
    }

    /// Shared result metadata.
    pub fn metadata(&self) -> &Arc<RowSetMetadata> {
        &self.inner.metadata
    }

    /// Append a row to the queue.
    pub fn add_row(&self, row: Row) -> Result<()> {
        let (sender, _) = self
            .inner
            .queue
            .as_ref()
            .ok_or_else(|| Error::misuse("cannot add rows to a void result"))?;
        sender
            .send(row)
            .map_err(|_| Error::misuse("row queue is disconnected"))
    }

    /// Remove and return the next queued row without fetching.
    pub fn dequeue(&self) -> Option<Row> {
        self.inner.queue.as_ref()?.1.try_recv().ok()
    }

    /// Number of rows that can be read without fetching another page.
    pub fn available_without_fetching(&self) -> usize {
        self.inner.queue.as_ref().map_or(0, |(_, receiver)| receiver.len())
    }

    /// Opaque token identifying the next page, if the server has more rows.
    pub fn paging_state(&self) -> Option<Bytes> {
        self.inner.paging_state.read().clone()
    }

    /// Set the token for the next page.
    ///
    /// Called by whoever builds the page from a response.
    pub fn set_paging_state(&self, paging_state: Option<Bytes>) {
        *self.inner.paging_state.write() = paging_state;
    }

    /// Whether following pages are fetched automatically while reading.
    pub fn auto_page(&self) -> bool {
        self.inner.auto_page
    }

    /// True when no further page will be fetched automatically.
    pub fn is_fully_fetched(&self) -> bool {
        self.inner.paging_state.read().is_none() || !self.inner.auto_page
    }

    /// True when the queue is empty and no further page will be fetched.
    pub fn is_exhausted(&self) -> bool {
        // A fetch appends rows before it clears the paging state, so the
        // paging state must be read first.
        let fully_fetched = self.is_fully_fetched();
        fully_fetched && self.available_without_fetching() == 0
    }

    /// Execution information of the request that produced this result.
    pub fn info(&self) -> ExecutionInfo {
        self.inner.info.read().clone()
    }

    /// Replace the execution information.
    pub fn set_info(&self, info: ExecutionInfo) {
        *self.inner.info.write() = info;
    }

    /// Inject the continuation used to fetch the following pages.
    ///
    /// It can be set only once; a second call fails with [`Error::Misuse`].
    pub fn set_fetch_next_page<F, Fut>(&self, fetch: F) -> Result<()>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RowSet>> + Send + 'static,
    {
        let fetcher: PageFetcher = Arc::new(move |paging_state| fetch(paging_state).boxed());
        self.inner
            .fetcher
            .set(fetcher)
            .map_err(|_| Error::misuse("fetch-next-page continuation is already set"))
    }

    /// Get the next row, fetching following pages as needed.
    ///
    /// Returns `Ok(None)` once every page has been read.
    pub async fn next_row(&self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.dequeue() {
                return Ok(Some(row));
            }
            if self.is_fully_fetched() {
                // Rows of the last page may have landed after the dequeue.
                return Ok(self.dequeue());
            }
            self.fetch_next_page(true).await?;
        }
    }

    /// Fetch the next page now, regardless of the auto-page setting.
    ///
    /// Returns the number of rows appended; 0 when there are no more pages.
    pub async fn fetch_more_results(&self) -> Result<usize> {
        self.fetch_next_page(false).await
    }

    /// Blocking form of [`fetch_more_results`](Self::fetch_more_results).
    ///
    /// Must not be called from within an asynchronous context.
    pub fn fetch_more_results_blocking(&self, handle: &Handle) -> Result<usize> {
        handle.block_on(self.fetch_more_results())
    }

    /// Read every remaining row of every page.
    pub async fn collect_all(&self) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.available_without_fetching());
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Iterate synchronously, blocking on `handle` whenever a page is fetched.
    ///
    /// Each wait is bounded by the fetch timeout. The handle must belong to a
    /// multi-threaded runtime and the iterator must not be driven from within
    /// an asynchronous context.
    pub fn blocking_iter(self, handle: Handle) -> BlockingRows {
        BlockingRows { rows: self, handle }
    }

    /// Convert into a stream of rows.
    pub fn into_stream(self) -> impl Stream<Item = Result<Row>> {
        use futures::stream;

        stream::unfold(Some(self), |opt_rows| async move {
            let rows = opt_rows?;
            match rows.next_row().await {
                Ok(Some(row)) => Some((Ok(row), Some(rows))),
                Ok(None) => None,
                Err(e) => Some((Err(e), Some(rows))),
            }
        })
    }

    /// Start or join the fetch of the next page and wait for it.
    ///
    /// With `only_if_drained`, nothing is fetched while rows are still queued.
    async fn fetch_next_page(&self, only_if_drained: bool) -> Result<usize> {
        let fetch = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some((_, fetch)) => {
                    trace!("joining in-flight page fetch");
                    fetch.clone()
                }
                None => {
                    if only_if_drained && self.available_without_fetching() > 0 {
                        return Ok(0);
                    }
                    let Some(paging_state) = self.paging_state() else {
                        return Ok(0);
                    };
                    let fetcher = self.inner.fetcher.get().cloned().ok_or_else(|| {
                        Error::misuse("more pages exist but no fetch-next-page continuation is set")
                    })?;
                    let handle = Handle::try_current().map_err(|_| {
                        Error::misuse("fetching the next page requires a Tokio runtime")
                    })?;
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.spawn_fetch(&handle, id, fetcher, paging_state);
                    *slot = Some((id, fetch.clone()));
                    fetch
                }
            }
        };

        let timeout = self.inner.fetch_timeout;
        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(appended)) => Ok(appended),
            Ok(Err(source)) => Err(Error::PageFetch { source }),
            Err(_) => {
                warn!(?timeout, "timed out waiting for page fetch");
                Err(Error::FetchTimeout { timeout })
            }
        }
    }

    /// Run the fetch on its own task so it completes even if every waiter
    /// gives up.
    ///
    /// The slot is cleared by the task when it finishes, or by a waiter when
    /// the task panicked or was cancelled. Both only clear fetch `id`.
    fn spawn_fetch(
        &self,
        handle: &Handle,
        id: u64,
        fetcher: PageFetcher,
        paging_state: Bytes,
    ) -> InFlightFetch {
        let inner = Arc::clone(&self.inner);
        let task = handle.spawn(async move {
            debug!(id, paging_state_len = paging_state.len(), "fetching next page");
            let fetched = match fetcher(paging_state).await {
                Ok(page) => inner.absorb(&page),
                Err(e) => Err(e),
            };
            let outcome = match fetched {
                Ok(appended) => {
                    debug!(
                        id,
                        rows = appended,
                        more_pages = inner.paging_state.read().is_some(),
                        "page fetched"
                    );
                    Ok(appended)
                }
                Err(e) => {
                    warn!(id, error = %e, "page fetch failed");
                    Err(Arc::new(e))
                }
            };
            inner.finish_fetch(id);
            outcome
        });

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.finish_fetch(id);
                    }
                    warn!(id, error = %join_error, "page fetch task did not complete");
                    Err(Arc::new(Error::misuse(format!(
                        "page fetch task did not complete: {}",
                        join_error
                    ))))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    /// Empty the in-flight slot if it still holds fetch `id`.
    fn finish_fetch(&self, id: u64) {
        let mut slot = self.in_flight.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            slot.take();
        }
    }

    /// Move every row of `page` into this queue, then take its paging state.
    fn absorb(&self, page: &RowSet) -> Result<usize> {
        if std::ptr::eq(self, Arc::as_ptr(&page.inner)) {
            return Err(Error::misuse(
                "fetch-next-page continuation returned the result set being paged",
            ));
        }
        let mut appended = 0;
        if let (Some((sender, _)), Some((_, receiver))) = (&self.queue, &page.inner.queue) {
            for row in receiver.try_iter() {
                if sender.send(row).is_ok() {
                    appended += 1;
                }
            }
        }

        let page_info = page.info();
        {
            let mut info = self.info.write();
            info.warnings.extend(page_info.warnings);
            for host in page_info.tried_hosts {
                if !info.tried_hosts.contains(&host) {
                    info.tried_hosts.push(host);
                }
            }
        }

        *self.paging_state.write() = page.paging_state();
        Ok(appended)
    }
}

impl fmt::Debug for RowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSet")
            .field("columns", &self.inner.metadata.column_names())
            .field("available", &self.available_without_fetching())
            .field("paging_state", &self.paging_state())
            .field("auto_page", &self.inner.auto_page)
            .field("void", &self.is_void())
            .finish()
    }
}

/// Blocking iterator over a [`RowSet`], created by [`RowSet::blocking_iter`].
pub struct BlockingRows {
    rows: RowSet,
    handle: Handle,
}

impl Iterator for BlockingRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.handle.block_on(self.rows.next_row()).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{ColumnTypeCode, CqlValue, TypeSpec};

    fn metadata() -> Arc<RowSetMetadata> {
        Arc::new(RowSetMetadata::new(vec![ColumnDescription::new(
            "ks",
            "t",
            "id",
            TypeSpec::simple(ColumnTypeCode::Int),
        )]))
    }

    fn page(ids: &[i32], paging_state: Option<&'static [u8]>) -> RowSet {
        let meta = metadata();
        let rows = RowSet::new(Arc::clone(&meta), &ResultOptions::default());
        for &id in ids {
            rows.add_row(Row::new(vec![CqlValue::Int(id)], Arc::clone(&meta)).unwrap())
                .unwrap();
        }
        rows.set_paging_state(paging_state.map(Bytes::from_static));
        rows
    }

    #[test]
    fn test_void_rowset() {
        let rows = RowSet::void();
        assert!(rows.is_void());
        assert!(rows.dequeue().is_none());
        assert!(rows.is_exhausted());
        let row = Row::new(vec![CqlValue::Int(1)], metadata()).unwrap();
        assert!(matches!(rows.add_row(row), Err(Error::Misuse { .. })));
    }

    #[test]
    fn test_dequeue_preserves_order() {
        let rows = page(&[1, 2, 3], None);
        assert_eq!(rows.available_without_fetching(), 3);
        let ids: Vec<i32> = std::iter::from_fn(|| rows.dequeue())
            .map(|r| r.get(0).unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(rows.is_exhausted());
    }

    #[test]
    fn test_auto_page_off_is_fully_fetched() {
        let meta = metadata();
        let options = ResultOptions::new().with_auto_page(false);
        let rows = RowSet::new(meta, &options);
        rows.set_paging_state(Some(Bytes::from_static(b"next")));
        assert!(rows.is_fully_fetched());

        let auto = page(&[], Some(b"next"));
        assert!(!auto.is_fully_fetched());
        assert!(!auto.is_exhausted());
    }

    #[test]
    fn test_fetcher_injected_once() {
        let rows = page(&[], Some(b"x"));
        rows.set_fetch_next_page(|_| async { Ok(RowSet::void()) }).unwrap();
        let second = rows.set_fetch_next_page(|_| async { Ok(RowSet::void()) });
        assert!(matches!(second, Err(Error::Misuse { .. })));
    }

    #[test]
    fn test_fetch_skipped_while_rows_queued() {
        let rows = page(&[1], Some(b"p2"));
        rows.set_fetch_next_page(|_| async { Ok(page(&[2, 3], None)) })
            .unwrap();

        let fetched = tokio_test::block_on(rows.fetch_next_page(true)).unwrap();
        assert_eq!(fetched, 0);
        assert_eq!(rows.available_without_fetching(), 1);

        let fetched = tokio_test::block_on(rows.fetch_more_results()).unwrap();
        assert_eq!(fetched, 2);
        assert_eq!(rows.available_without_fetching(), 3);
    }

    #[tokio::test]
    async fn test_continuation_returning_same_rowset_is_misuse() {
        let rows = page(&[], Some(b"p2"));
        let same = rows.clone();
        rows.set_fetch_next_page(move |_| {
            let same = same.clone();
            async move { Ok(same) }
        })
        .unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), rows.next_row())
            .await
            .unwrap();
        match outcome {
            Err(Error::PageFetch { source }) => {
                assert!(matches!(source.as_ref(), Error::Misuse { .. }))
            }
            other => panic!("Expected PageFetch, got {:?}", other),
        }
        assert!(rows.paging_state().is_some());
    }

    #[tokio::test]
    async fn test_finish_fetch_only_clears_matching_id() {
        let rows = page(&[], Some(b"p2"));
        rows.set_fetch_next_page(|_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(page(&[1], None))
        })
        .unwrap();

        let reader = rows.clone();
        let pending = tokio::spawn(async move { reader.fetch_more_results().await });
        while rows.inner.in_flight.lock().is_none() {
            tokio::task::yield_now().await;
        }
        let running = rows.inner.in_flight.lock().as_ref().map(|(id, _)| *id).unwrap();

        rows.inner.finish_fetch(running + 1);
        assert!(rows.inner.in_flight.lock().is_some());

        assert_eq!(pending.await.unwrap().unwrap(), 1);
        assert!(rows.inner.in_flight.lock().is_none());
    }

    #[tokio::test]
    async fn test_panicked_fetch_is_reported_and_retried() {
        let rows = page(&[], Some(b"p2"));
        let attempts = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&attempts);
        rows.set_fetch_next_page(move |_| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    panic!("connection reset during fetch");
                }
                Ok(page(&[5], None))
            }
        })
        .unwrap();

        match rows.next_row().await {
            Err(Error::PageFetch { source }) => {
                assert!(matches!(source.as_ref(), Error::Misuse { .. }))
            }
            other => panic!("Expected PageFetch, got {:?}", other),
        }
        assert!(rows.inner.in_flight.lock().is_none());
        assert_eq!(rows.next_row().await.unwrap().unwrap().get::<i32>(0).unwrap(), 5);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fetch_outside_runtime_is_misuse() {
        let rows = page(&[], Some(b"p2"));
        rows.set_fetch_next_page(|_| async { Ok(page(&[1], None)) })
            .unwrap();
        let outcome = futures::executor::block_on(rows.fetch_more_results());
        assert!(matches!(outcome, Err(Error::Misuse { .. })));
        assert!(rows.inner.in_flight.lock().is_none());
    }

    #[tokio::test]
    async fn test_missing_fetcher_is_misuse() {
        let rows = page(&[], Some(b"x"));
        assert!(matches!(rows.next_row().await, Err(Error::Misuse { .. })));
    }

    #[tokio::test]
    async fn test_absorb_merges_warnings() {
        let rows = page(&[1], Some(b"p2"));
        rows.set_fetch_next_page(|_| async {
            let next = page(&[2], None);
            next.set_info(ExecutionInfo {
                warnings: vec!["aggregation without partition key".to_string()],
                ..Default::default()
            });
            Ok(next)
        })
        .unwrap();

        assert_eq!(rows.collect_all().await.unwrap().len(), 2);
        assert_eq!(rows.info().warnings.len(), 1);
        assert!(rows.paging_state().is_none());
    }
}

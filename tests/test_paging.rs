//! Integration tests for paged result sets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cql_thin_rs::{
    ColumnDescription, ColumnTypeCode, CqlValue, Error, ResultOptions, Row, RowSet,
    RowSetMetadata, TypeSpec,
};
use futures::stream::TryStreamExt;

fn metadata() -> Arc<RowSetMetadata> {
    Arc::new(RowSetMetadata::new(vec![ColumnDescription::new(
        "ks",
        "events",
        "id",
        TypeSpec::simple(ColumnTypeCode::Int),
    )]))
}

fn page(
    meta: &Arc<RowSetMetadata>,
    ids: impl IntoIterator<Item = i32>,
    paging_state: Option<&'static str>,
    options: &ResultOptions,
) -> RowSet {
    let rows = RowSet::new(Arc::clone(meta), options);
    for id in ids {
        rows.add_row(Row::new(vec![CqlValue::Int(id)], Arc::clone(meta)).unwrap())
            .unwrap();
    }
    rows.set_paging_state(paging_state.map(|s| Bytes::from_static(s.as_bytes())));
    rows
}

fn id(row: Row) -> i32 {
    row.get(0).unwrap()
}

#[tokio::test]
async fn test_two_pages_yield_all_rows_in_order() {
    let options = ResultOptions::default();
    let meta = metadata();
    let rows = page(&meta, [1, 2], Some("page-2"), &options);

    let calls = Arc::new(AtomicUsize::new(0));
    let fetch_calls = Arc::clone(&calls);
    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |paging_state| {
        fetch_calls.fetch_add(1, Ordering::SeqCst);
        let meta = Arc::clone(&fetch_meta);
        async move {
            assert_eq!(&paging_state[..], b"page-2");
            Ok(page(&meta, [3, 4, 5], None, &ResultOptions::default()))
        }
    })
    .unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        ids.push(id(rows.next_row().await.unwrap().unwrap()));
    }
    assert!(!rows.is_fully_fetched());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    while let Some(row) = rows.next_row().await.unwrap() {
        ids.push(id(row));
    }
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(rows.is_fully_fetched());
    assert!(rows.is_exhausted());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_share_one_fetch() {
    let options = ResultOptions::default();
    let meta = metadata();
    let rows = page(&meta, [], Some("page-2"), &options);

    let calls = Arc::new(AtomicUsize::new(0));
    let fetch_calls = Arc::clone(&calls);
    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        fetch_calls.fetch_add(1, Ordering::SeqCst);
        let meta = Arc::clone(&fetch_meta);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(page(&meta, 0..100, None, &ResultOptions::default()))
        }
    })
    .unwrap();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let rows = rows.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(row) = rows.next_row().await.unwrap() {
                    seen.push(id(row));
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::new();
    for reader in readers {
        all.extend(reader.await.unwrap());
    }
    all.sort_unstable();
    assert_eq!(all, (0..100).collect::<Vec<_>>());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_can_be_retried() {
    let options = ResultOptions::default();
    let meta = metadata();
    let rows = page(&meta, [], Some("page-2"), &options);

    let calls = Arc::new(AtomicUsize::new(0));
    let fetch_calls = Arc::clone(&calls);
    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        let attempt = fetch_calls.fetch_add(1, Ordering::SeqCst);
        let meta = Arc::clone(&fetch_meta);
        async move {
            if attempt == 0 {
                return Err(Error::Server {
                    code: 0x1200,
                    message: "Operation timed out".to_string(),
                });
            }
            Ok(page(&meta, [7], None, &ResultOptions::default()))
        }
    })
    .unwrap();

    match rows.next_row().await {
        Err(Error::PageFetch { source }) => {
            assert!(matches!(source.as_ref(), Error::Server { code: 0x1200, .. }));
        }
        other => panic!("Expected PageFetch, got {:?}", other),
    }
    assert_eq!(rows.paging_state().as_deref(), Some(&b"page-2"[..]));

    assert_eq!(id(rows.next_row().await.unwrap().unwrap()), 7);
    assert!(rows.next_row().await.unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetch_timeout_leaves_fetch_running() {
    let options = ResultOptions::new().with_fetch_timeout(Duration::from_millis(50));
    let meta = metadata();
    let rows = page(&meta, [], Some("page-2"), &options);

    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        let meta = Arc::clone(&fetch_meta);
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(page(&meta, [42], None, &ResultOptions::default()))
        }
    })
    .unwrap();

    match rows.next_row().await {
        Err(Error::FetchTimeout { timeout }) => assert_eq!(timeout, Duration::from_millis(50)),
        other => panic!("Expected FetchTimeout, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(rows.available_without_fetching(), 1);
    assert!(rows.is_fully_fetched());
    assert_eq!(id(rows.next_row().await.unwrap().unwrap()), 42);
}

#[tokio::test]
async fn test_manual_paging_without_auto_page() {
    let options = ResultOptions::new().with_auto_page(false);
    let meta = metadata();
    let rows = page(&meta, [1], Some("page-2"), &options);

    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        let meta = Arc::clone(&fetch_meta);
        async move { Ok(page(&meta, [2, 3], None, &ResultOptions::default())) }
    })
    .unwrap();

    assert_eq!(rows.collect_all().await.unwrap().len(), 1);
    assert!(rows.paging_state().is_some());

    assert_eq!(rows.fetch_more_results().await.unwrap(), 2);
    assert_eq!(rows.available_without_fetching(), 2);
    assert!(rows.paging_state().is_none());
    assert_eq!(rows.fetch_more_results().await.unwrap(), 0);
}

#[tokio::test]
async fn test_stream_over_pages() {
    let options = ResultOptions::default();
    let meta = metadata();
    let rows = page(&meta, [1], Some("page-2"), &options);

    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |paging_state| {
        let meta = Arc::clone(&fetch_meta);
        async move {
            let next = if &paging_state[..] == b"page-2" {
                page(&meta, [2], Some("page-3"), &ResultOptions::default())
            } else {
                page(&meta, [3], None, &ResultOptions::default())
            };
            Ok(next)
        }
    })
    .unwrap();

    let collected: Vec<Row> = rows.into_stream().try_collect().await.unwrap();
    let ids: Vec<i32> = collected.into_iter().map(id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_void_result_has_no_rows() {
    let rows = RowSet::void();
    assert!(rows.next_row().await.unwrap().is_none());
    assert_eq!(rows.available_without_fetching(), 0);

    let row = Row::new(vec![CqlValue::Int(1)], metadata()).unwrap();
    match rows.add_row(row) {
        Err(Error::Misuse { message }) => assert!(message.contains("void")),
        other => panic!("Expected Misuse, got {:?}", other),
    }
}

#[test]
fn test_blocking_iteration() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let options = ResultOptions::default();
    let meta = metadata();
    let rows = page(&meta, [1], Some("page-2"), &options);
    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        let meta = Arc::clone(&fetch_meta);
        async move { Ok(page(&meta, [2, 3], None, &ResultOptions::default())) }
    })
    .unwrap();

    let ids: Vec<i32> = rows
        .blocking_iter(runtime.handle().clone())
        .map(|row| id(row.unwrap()))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_blocking_fetch_times_out() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let options = ResultOptions::new()
        .with_auto_page(false)
        .with_fetch_timeout(Duration::from_millis(20));
    let meta = metadata();
    let rows = page(&meta, [], Some("page-2"), &options);
    let fetch_meta = Arc::clone(&meta);
    rows.set_fetch_next_page(move |_| {
        let meta = Arc::clone(&fetch_meta);
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(page(&meta, [9], None, &ResultOptions::default()))
        }
    })
    .unwrap();

    let result = rows.fetch_more_results_blocking(runtime.handle());
    assert!(matches!(result, Err(Error::FetchTimeout { .. })));

    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(rows.available_without_fetching(), 1);
    assert_eq!(rows.fetch_more_results_blocking(runtime.handle()).unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_is_exhausted_never_true_while_page_lands() {
    let meta = metadata();
    let mut violations = 0;
    for _ in 0..500 {
        let rows = page(&meta, [], Some("page-2"), &ResultOptions::default());
        let fetch_meta = Arc::clone(&meta);
        rows.set_fetch_next_page(move |_| {
            let meta = Arc::clone(&fetch_meta);
            async move { Ok(page(&meta, [1, 2], None, &ResultOptions::default())) }
        })
        .unwrap();

        let landed = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let poller = {
            let rows = rows.clone();
            let landed = Arc::clone(&landed);
            tokio::task::spawn_blocking(move || {
                let mut seen = 0;
                loop {
                    let done = landed.load(Ordering::SeqCst);
                    if rows.is_exhausted() {
                        seen += 1;
                    }
                    if done {
                        return seen;
                    }
                }
            })
        };

        assert_eq!(rows.fetch_more_results().await.unwrap(), 2);
        landed.store(true, Ordering::SeqCst);
        violations += poller.await.unwrap();
        assert!(!rows.is_exhausted());
    }
    assert_eq!(violations, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reader_sees_rows_of_concurrent_prefetch() {
    let meta = metadata();
    for _ in 0..500 {
        let options = ResultOptions::default();
        let rows = page(&meta, [], Some("page-2"), &options);
        let fetch_meta = Arc::clone(&meta);
        rows.set_fetch_next_page(move |_| {
            let meta = Arc::clone(&fetch_meta);
            async move { Ok(page(&meta, [11], None, &ResultOptions::default())) }
        })
        .unwrap();

        let prefetch = {
            let rows = rows.clone();
            tokio::spawn(async move { rows.fetch_more_results().await })
        };
        let row = rows.next_row().await.unwrap();
        assert_eq!(row.map(id), Some(11));
        prefetch.await.unwrap().unwrap();
        assert!(rows.next_row().await.unwrap().is_none());
    }
}

mod common;

use common::{preload, FakeBackend, TABLE};
use hbase_pouch::{Error, Row, ScanCursor, Session};

async fn seeded_session(count: usize) -> Session<FakeBackend> {
    let backend = FakeBackend::new();
    let rows: Vec<(String, String)> = (0..count)
        .map(|i| (format!("row-{:02}", i), format!("value-{}", i)))
        .collect();
    let borrowed: Vec<(&str, &str)> = rows.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    preload(&backend, &borrowed).await;
    Session::new(backend, "default")
}

fn keys(rows: &[Row]) -> Vec<String> {
    rows.iter().map(Row::key_str).collect()
}

#[tokio::test]
async fn test_page_size_does_not_change_results() {
    let session = seeded_session(25).await;

    let by_one = session.scan_all(TABLE, "row-05", "row-20", 1).await.unwrap();
    let by_ten = session.scan_all(TABLE, "row-05", "row-20", 10).await.unwrap();
    let by_thousand = session.scan_all(TABLE, "row-05", "row-20", 1000).await.unwrap();

    assert_eq!(by_one.len(), 15);
    assert_eq!(by_one, by_ten);
    assert_eq!(by_one, by_thousand);
    assert_eq!(keys(&by_one).first().map(String::as_str), Some("row-05"));
    assert_eq!(keys(&by_one).last().map(String::as_str), Some("row-19"));

    let ordered = keys(&by_one);
    assert!(ordered.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_rescan_is_identical() {
    let session = seeded_session(12).await;

    let first = session.scan_all(TABLE, "", "", 5).await.unwrap();
    let second = session.scan_all(TABLE, "", "", 5).await.unwrap();
    assert_eq!(first.len(), 12);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_scan_issues_one_call_per_page_plus_final() {
    let session = seeded_session(15).await;

    let cursor = ScanCursor::new(b"", b"", 10).unwrap();
    let mut scanner = session.scan(TABLE, cursor);
    let mut sizes = Vec::new();
    while let Some(page) = scanner.next_page().await.unwrap() {
        sizes.push(page.len());
    }
    assert_eq!(sizes, vec![10, 5]);
    assert_eq!(scanner.pages_fetched(), 3);
    assert!(scanner.is_done());
    assert!(scanner.next_page().await.unwrap().is_none());
    assert_eq!(scanner.pages_fetched(), 3);
}

#[tokio::test]
async fn test_empty_range_skips_backend() {
    let session = seeded_session(5).await;

    let rows = session.scan_all(TABLE, "row-03", "row-01", 10).await.unwrap();
    assert!(rows.is_empty());
    let rows = session.scan_all(TABLE, "row-03", "row-03", 10).await.unwrap();
    assert!(rows.is_empty());
    session.close().await;
}

#[tokio::test]
async fn test_empty_range_makes_no_calls() {
    let backend = FakeBackend::new();
    preload(&backend, &[("a", "1")]).await;
    let session = Session::new(backend, "default");

    let cursor = ScanCursor::new(b"b", b"a", 10).unwrap();
    let mut scanner = session.scan(TABLE, cursor);
    assert!(scanner.next_page().await.unwrap().is_none());
    assert_eq!(scanner.pages_fetched(), 0);
}

#[tokio::test]
async fn test_unbounded_stop_reads_to_end() {
    let session = seeded_session(7).await;

    let rows = session.scan_all(TABLE, "row-04", "", 2).await.unwrap();
    assert_eq!(keys(&rows), vec!["row-04", "row-05", "row-06"]);
}

#[tokio::test]
async fn test_prefix_keys_are_not_skipped() {
    let backend = FakeBackend::new();
    preload(
        &backend,
        &[("a", "1"), ("a\u{0}", "2"), ("a\u{1}", "3"), ("ab", "4"), ("b", "5")],
    )
    .await;
    let session = Session::new(backend, "default");

    let rows = session.scan_all(TABLE, "", "", 1).await.unwrap();
    assert_eq!(keys(&rows), vec!["a", "a\u{0}", "a\u{1}", "ab", "b"]);
}

#[tokio::test]
async fn test_resume_from_key() {
    let session = seeded_session(10).await;

    let cursor = ScanCursor::new(b"", b"row-08", 3).unwrap();
    let mut scanner = session.scan(TABLE, cursor.clone());
    let first = scanner.next_page().await.unwrap().unwrap();
    assert_eq!(keys(&first), vec!["row-00", "row-01", "row-02"]);
    assert_eq!(scanner.resume_key(), b"row-02\x00");

    let resumed = ScanCursor::new(scanner.resume_key(), b"row-08", 3).unwrap();
    let rest = session.scan(TABLE, resumed).collect_rows().await.unwrap();
    assert_eq!(
        keys(&rest),
        vec!["row-03", "row-04", "row-05", "row-06", "row-07"]
    );

    let restarted = session
        .scan(TABLE, cursor.resume_after(b"row-05"))
        .collect_rows()
        .await
        .unwrap();
    assert_eq!(keys(&restarted), vec!["row-06", "row-07"]);
}

#[tokio::test]
async fn test_next_row_walks_every_row_once() {
    let session = seeded_session(6).await;

    let mut scanner = session.scan(TABLE, ScanCursor::new(b"", b"", 4).unwrap());
    let mut seen = Vec::new();
    while let Some(row) = scanner.next_row().await.unwrap() {
        assert_eq!(row.value().unwrap(), format!("value-{}", seen.len()));
        seen.push(row.key_str());
    }
    assert_eq!(seen.len(), 6);
    assert!(scanner.is_done());
}

#[tokio::test]
async fn test_scan_that_does_not_advance_is_an_error() {
    let mut backend = FakeBackend::new();
    backend.stuck_scan = true;
    preload(&backend, &[("a", "1"), ("b", "2")]).await;
    let session = Session::new(backend, "default");

    // every page restarts at "a", so the second page lands behind the cursor
    let err = session.scan_all(TABLE, "", "", 1).await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
}

#[tokio::test]
async fn test_scan_missing_table_is_backend_error() {
    let session = seeded_session(1).await;

    let err = session.scan_all("nope", "", "", 10).await.unwrap_err();
    assert!(err.to_string().starts_with("error GetScannerResults: "));
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let session = seeded_session(1).await;

    assert!(matches!(
        session.scan_all(TABLE, "", "", 0).await,
        Err(Error::InvalidArgument(_))
    ));
}

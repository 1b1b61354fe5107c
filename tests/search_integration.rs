//! Integration tests for paginated search runs.
//!
//! Every test scripts the API in-process and checks the calls issued, the
//! unique id set and what landed in the temporary data directory.

use std::fs;

use ikfetch_core::api::{doc_endpoint, search_endpoint};
use ikfetch_core::{DocLimits, FailureKind, Query, SearchOptions, StopReason};
use tempfile::TempDir;

mod support;
use support::{
    ScriptedTransport, detail_body, empty_search_body, errmsg_body, search_body, test_context,
    test_settings,
};

const SC: &str = "Supreme Court of India";

fn script_detail(transport: &ScriptedTransport, doc_id: i64) {
    transport.respond(
        doc_endpoint(doc_id, DocLimits::default()),
        detail_body(&format!("Doc {doc_id}"), false, "<p>body</p>"),
    );
}

// ==================== Termination Tests ====================

#[tokio::test]
async fn test_income_tax_two_hits_then_empty_page() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(
            search_endpoint("income tax", 0, 1),
            search_body(&[(101, "A v. B", "2019-03-15", SC), (202, "C v. D", "2020-01-02", SC)]),
        )
        .respond(search_endpoint("income tax", 1, 1), empty_search_body());
    script_detail(&transport, 101);
    script_detail(&transport, 202);

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("income tax")).await;

    assert_eq!(report.unique_count(), 2);
    assert_eq!(report.positions, 2);
    assert_eq!(report.pages, 1);
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(transport.calls_to("/search/"), 2);

    let search_dir = dir.path().join("income tax");
    let toc = fs::read_to_string(search_dir.join("toc.csv")).unwrap();
    let lines: Vec<_> = toc.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "position,docid,date,court,title");
    assert_eq!(lines[1], "1,101,2019-03-15,Supreme Court of India,A v. B");
    assert_eq!(lines[2], "2,202,2020-01-02,Supreme Court of India,C v. D");

    assert!(search_dir.join("1").join("101.json").is_file());
    assert!(search_dir.join("2").join("202.json").is_file());
}

#[tokio::test]
async fn test_empty_first_page_issues_one_call() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport.respond(search_endpoint("nothing here", 0, 1), empty_search_body());

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("nothing here")).await;

    assert!(report.doc_ids.is_empty());
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_missing_docs_field_stops() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport.respond(search_endpoint("q", 0, 1), r#"{"found":"0"}"#);

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert!(report.doc_ids.is_empty());
    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_errmsg_stops_with_rejection() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport.respond(search_endpoint("q", 0, 1), errmsg_body("Invalid token"));

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.stop, StopReason::Rejected("Invalid token".to_string()));
    assert!(report.doc_ids.is_empty());
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_malformed_page_keeps_partial_results() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 1), search_body(&[(7, "T", "2019-01-01", SC)]))
        .respond(search_endpoint("q", 1, 1), "<html>not json</html>");
    script_detail(&transport, 7);

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.unique_count(), 1);
    match report.stop {
        StopReason::Failed(reason) => assert_eq!(reason.kind, FailureKind::ParseError),
        other => panic!("expected parse failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_persistent_gateway_page_is_gateway_failure() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 1), search_body(&[(7, "T", "2019-01-01", SC)]))
        .respond(search_endpoint("q", 1, 1), "error code: 502");
    script_detail(&transport, 7);

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.unique_count(), 1);
    assert_eq!(transport.calls_to(&search_endpoint("q", 1, 1)), 3);
    match report.stop {
        StopReason::Failed(reason) => {
            assert_eq!(reason.kind, FailureKind::UpstreamGatewayError);
        }
        other => panic!("expected gateway failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hit_with_null_fields_keeps_whole_window() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    let window = r#"{"found":"1 - 2 of 2","docs":[
        {"tid":11,"title":"A v. B","publishdate":"2019-03-15","docsource":"Delhi High Court"},
        {"tid":12,"title":null,"publishdate":null,"docsource":null}
    ]}"#;
    transport
        .respond(search_endpoint("q", 0, 1), window)
        .respond(search_endpoint("q", 1, 1), empty_search_body());
    script_detail(&transport, 11);
    script_detail(&transport, 12);

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.unique_count(), 2);
    assert!(report.doc_ids.contains(&12));
    assert_eq!(report.positions, 2);

    let toc = fs::read_to_string(dir.path().join("q").join("toc.csv")).unwrap();
    assert_eq!(toc.lines().nth(2), Some("2,12,,,"));
    assert!(dir.path().join("q").join("2").join("12.json").is_file());
}

#[tokio::test]
async fn test_page_limit_caps_windows() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    // Every window returns the same hit; only the limit ends the run.
    transport.respond("/search/", search_body(&[(9, "T", "2019-01-01", SC)]));
    script_detail(&transport, 9);

    let mut settings = test_settings(dir.path());
    settings.search.page_limit = Some(2);
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.stop, StopReason::PageLimit);
    assert_eq!(report.pages, 2);
    assert_eq!(report.positions, 2);
    assert_eq!(report.unique_count(), 1);
    assert_eq!(transport.calls_to("/search/"), 2);
}

// ==================== Dedup and Position Tests ====================

#[tokio::test]
async fn test_positions_contiguous_across_pages_with_duplicates() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(
            search_endpoint("q", 0, 1),
            search_body(&[(1, "a", "2019-01-01", SC), (2, "b", "2019-01-02", SC)]),
        )
        .respond(
            search_endpoint("q", 1, 1),
            search_body(&[(3, "c", "2019-01-03", SC), (2, "b", "2019-01-02", SC)]),
        )
        .respond(search_endpoint("q", 2, 1), empty_search_body());
    for id in 1..=3 {
        script_detail(&transport, id);
    }

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.positions, 4);
    assert_eq!(report.unique_count(), 3);
    assert_eq!(report.pages, 2);

    let toc = fs::read_to_string(dir.path().join("q").join("toc.csv")).unwrap();
    let positions: Vec<_> = toc
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().to_string())
        .collect();
    assert_eq!(positions, vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_page_number_advances_by_max_pages() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 5), search_body(&[(1, "a", "2019-01-01", SC)]))
        .respond(search_endpoint("q", 5, 5), empty_search_body());
    script_detail(&transport, 1);

    let mut settings = test_settings(dir.path());
    settings.search.max_pages = 5;
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.unique_count(), 1);
    let searches: Vec<_> = transport
        .calls()
        .into_iter()
        .filter(|endpoint| endpoint.starts_with("/search/"))
        .collect();
    assert_eq!(searches, vec![search_endpoint("q", 0, 5), search_endpoint("q", 5, 5)]);
}

#[tokio::test]
async fn test_failed_download_still_counts_hit() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 1), search_body(&[(5, "a", "2019-01-01", SC)]))
        .respond(search_endpoint("q", 1, 1), empty_search_body())
        .respond(doc_endpoint(5, DocLimits::default()), errmsg_body("Not found"));

    let settings = test_settings(dir.path());
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert!(report.doc_ids.contains(&5));
    assert!(!dir.path().join("q").join("1").join("5.json").exists());
    assert_eq!(ctx.downloader().stats().failed(), 1);
}

// ==================== Output Mode Tests ====================

#[tokio::test]
async fn test_count_only_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(
            search_endpoint("q", 0, 1),
            search_body(&[(1, "a", "2019-01-01", SC), (2, "b", "2019-01-02", SC)]),
        )
        .respond(search_endpoint("q", 1, 1), empty_search_body());

    let mut settings = test_settings(dir.path());
    settings.search.count_only = true;
    let ctx = test_context(&settings, &transport);
    let report = ctx.paginator().run(&Query::raw("q")).await;

    assert_eq!(report.unique_count(), 2);
    assert_eq!(transport.calls_to("/doc/"), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_path_by_source_layout() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 1), search_body(&[(11, "a", "2019-03-15", SC)]))
        .respond(search_endpoint("q", 1, 1), empty_search_body());
    script_detail(&transport, 11);

    let mut settings = test_settings(dir.path());
    settings.search.path_by_source = true;
    settings.search.csv_output = false;
    let ctx = test_context(&settings, &transport);
    ctx.paginator().run(&Query::raw("q")).await;

    let doc_dir = dir.path().join(SC).join("2019").join("2019-03-15");
    assert!(doc_dir.join("11.json").is_file());
    // No table requested, so no search directory either.
    assert!(!dir.path().join("q").exists());
}

#[tokio::test]
async fn test_no_csv_skips_table_but_keeps_position_dirs() {
    let dir = TempDir::new().unwrap();
    let transport = ScriptedTransport::shared();
    transport
        .respond(search_endpoint("q", 0, 1), search_body(&[(11, "a", "2019-03-15", SC)]))
        .respond(search_endpoint("q", 1, 1), empty_search_body());
    script_detail(&transport, 11);

    let mut settings = test_settings(dir.path());
    settings.search.csv_output = false;
    let ctx = test_context(&settings, &transport);
    ctx.paginator().run(&Query::raw("q")).await;

    assert!(!dir.path().join("q").join("toc.csv").exists());
    assert!(dir.path().join("q").join("1").join("11.json").is_file());
}

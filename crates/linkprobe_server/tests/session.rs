mod support;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use linkprobe_server::{run_session, Inbound, SessionSummary};
use pretty_assertions::assert_eq;
use support::{batch_text, engine_with, init_logging, MemoryTransport, SlowFetcher};

fn ten_urls() -> Vec<String> {
    (0..10).map(|i| format!("https://site{i}.test/")).collect()
}

#[tokio::test]
async fn streams_every_result_then_done() {
    init_logging();
    let fetcher = Arc::new(SlowFetcher::new(Duration::from_millis(5)));
    let engine = engine_with(fetcher.clone(), 3);
    let (mut transport, _tx) = MemoryTransport::new([Inbound::Text(
        "https://a.test/\n\n  not a url  \nhttps://down.test/\nb.test\n".to_string(),
    )]);

    let summary = run_session(&mut transport, &engine).await;

    assert_eq!(
        summary,
        SessionSummary {
            submitted: 4,
            emitted: 4,
            completed: true
        }
    );
    assert_eq!(transport.sent.len(), 5);
    assert_eq!(transport.sent.last().map(String::as_str), Some(r#"{"status":"done"}"#));
    assert_eq!(transport.done_frames(), 1);
    assert!(transport.closed);

    let results = transport.results();
    let by_url = |url: &str| {
        results
            .iter()
            .find(|value| value["url"] == url)
            .cloned()
            .unwrap()
    };
    assert_eq!(by_url("https://a.test/")["status"], 200);
    assert_eq!(by_url("https://a.test/")["serverName"], "Nginx");
    assert_eq!(by_url("https://a.test/")["comment"], "OK");
    assert_eq!(by_url("not a url")["status"], "Invalid");
    assert_eq!(by_url("https://down.test/")["status"], "Error");
    assert_eq!(by_url("b.test")["status"], 200);
    assert_eq!(
        by_url("b.test")["redirectChain"][0]["url"],
        "https://b.test/"
    );
    // The invalid candidate never reaches the fetcher.
    assert_eq!(fetcher.call_count(), 3);
}

#[tokio::test]
async fn blank_batch_gets_only_done() {
    init_logging();
    let fetcher = Arc::new(SlowFetcher::new(Duration::ZERO));
    let engine = engine_with(fetcher.clone(), 2);
    let (mut transport, _tx) = MemoryTransport::new([Inbound::Text("\n   \n\t\n".to_string())]);

    let summary = run_session(&mut transport, &engine).await;

    assert_eq!(summary.submitted, 0);
    assert!(summary.completed);
    assert_eq!(transport.sent, vec![r#"{"status":"done"}"#.to_string()]);
    assert!(transport.closed);
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn client_leaving_before_batch_ends_quietly() {
    init_logging();
    let engine = engine_with(Arc::new(SlowFetcher::new(Duration::ZERO)), 2);
    let (mut transport, _tx) = MemoryTransport::new([Inbound::Other, Inbound::Closed]);

    let summary = run_session(&mut transport, &engine).await;

    assert_eq!(summary, SessionSummary::default());
    assert!(transport.sent.is_empty());
}

#[tokio::test]
async fn non_text_frames_before_batch_are_skipped() {
    init_logging();
    let engine = engine_with(Arc::new(SlowFetcher::new(Duration::ZERO)), 2);
    let (mut transport, _tx) = MemoryTransport::new([
        Inbound::Other,
        batch_text(&["https://a.test/", "https://b.test/"]),
    ]);

    let summary = run_session(&mut transport, &engine).await;

    assert!(summary.completed);
    assert_eq!(transport.results().len(), 2);
}

#[tokio::test]
async fn disconnect_mid_batch_stops_the_stream() {
    init_logging();
    let fetcher = Arc::new(SlowFetcher::new(Duration::from_millis(40)));
    let engine = engine_with(fetcher.clone(), 2);
    let urls = ten_urls();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let (transport, _tx) = MemoryTransport::new([batch_text(&refs)]);
    let mut transport = transport.disconnect_after(3);

    let summary = run_session(&mut transport, &engine).await;

    assert!(!summary.completed);
    assert_eq!(transport.done_frames(), 0);
    assert_eq!(transport.sent_after_disconnect, 0);
    assert!(transport.sent.len() < 10);

    // Give cancelled workers a moment; no further URLs get dispatched.
    let calls_at_disconnect = fetcher.call_count();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(fetcher.call_count(), calls_at_disconnect);
    assert!(calls_at_disconnect < 10);
}

#[tokio::test]
async fn send_failure_abandons_the_batch() {
    init_logging();
    let fetcher = Arc::new(SlowFetcher::new(Duration::from_millis(20)));
    let engine = engine_with(fetcher.clone(), 1);
    let urls = ten_urls();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let (transport, _tx) = MemoryTransport::new([batch_text(&refs)]);
    let mut transport = transport.fail_after(2);

    let summary = run_session(&mut transport, &engine).await;

    assert_eq!(summary.emitted, 2);
    assert!(!summary.completed);
    assert!(!transport.closed);
    assert_eq!(transport.done_frames(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fetcher.call_count() < 10);
}

#[tokio::test]
async fn second_batch_on_same_connection_is_ignored() {
    init_logging();
    let engine = engine_with(Arc::new(SlowFetcher::new(Duration::from_millis(10))), 2);
    let (mut transport, _tx) = MemoryTransport::new([
        batch_text(&["https://first.test/", "https://second.test/"]),
        batch_text(&["https://third.test/"]),
    ]);

    let summary = run_session(&mut transport, &engine).await;

    assert!(summary.completed);
    let seen: BTreeSet<String> = transport
        .results()
        .iter()
        .map(|value| value["url"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        seen,
        BTreeSet::from([
            "https://first.test/".to_string(),
            "https://second.test/".to_string()
        ])
    );
    assert_eq!(transport.done_frames(), 1);
}

//! End-to-end ingestion runs against mock feed servers.
//!
//! Each test gets its own wiremock server and a temp directory for the store,
//! so runs are isolated from each other and from any real job list.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jobfeed_core::feed::{FeedFetcher, Source};
use jobfeed_core::job::JobNormalizer;
use jobfeed_core::pipeline::IngestPipeline;
use jobfeed_core::{Error, JobStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{}</title><link>{}</link><description>About {}</description>\
                 <pubDate>Wed, 01 May 2024 12:00:00 GMT</pubDate></item>",
                title, link, title
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Board</title><link>https://board.example.com</link><description>Jobs</description>{}</channel></rss>"#,
        body
    )
}

async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
        .mount(server)
        .await;
}

fn source(server: &MockServer, name: &str, route: &str) -> Source {
    Source {
        name: name.to_string(),
        url: format!("{}{}", server.uri(), route),
        ttl: chrono::Duration::days(30),
        max_items: None,
    }
}

fn pipeline(sources: Vec<Source>, timeout: Duration, concurrency: usize) -> IngestPipeline {
    let fetcher = FeedFetcher::with_timeout(timeout, None).unwrap();
    IngestPipeline::from_parts(fetcher, JobNormalizer::default(), sources, concurrency)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
}

fn temp_store() -> (TempDir, JobStore) {
    let dir = TempDir::new().unwrap();
    let store = JobStore::new(dir.path().join("data").join("jobs.json"));
    (dir, store)
}

#[tokio::test]
async fn ingest_writes_normalized_jobs() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[
        ("Rust Engineer", "https://a.example.com/1"),
        ("Go Engineer", "https://a.example.com/2"),
    ])).await;

    let (_dir, store) = temp_store();
    let report = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await
        .unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.total, 2);
    assert!(report.saved);
    assert_eq!(report.failed_sources(), 0);

    let jobs = store.load();
    assert_eq!(jobs[0].title, "Rust Engineer");
    assert_eq!(jobs[0].company, "Board A");
    assert_eq!(jobs[0].source, "Board A");
    assert_eq!(jobs[0].url, "https://a.example.com/1");
    assert!(jobs[0].expires_at.at().unwrap() > jobs[0].published_at.at().unwrap());
}

#[tokio::test]
async fn rerunning_unchanged_feed_does_not_grow_store() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[
        ("Rust Engineer", "https://a.example.com/1"),
        ("Go Engineer", "https://a.example.com/2"),
    ])).await;

    let (_dir, store) = temp_store();
    let pipeline = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1);

    let first = pipeline.run(&store, now()).await.unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();

    let second = pipeline.run(&store, now() + chrono::Duration::hours(6)).await.unwrap();

    assert_eq!(first.total, 2);
    assert_eq!(second.added, 0);
    assert_eq!(second.total, 2);
    assert!(!second.saved);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn timed_out_source_is_skipped_without_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(rss(&[("Never", "https://slow.example.com/1")]), "application/rss+xml")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_feed(&server, "/fast.rss", rss(&[("Fast Job", "https://fast.example.com/1")])).await;

    let (_dir, store) = temp_store();
    let report = pipeline(
        vec![source(&server, "Slow", "/slow.rss"), source(&server, "Fast", "/fast.rss")],
        Duration::from_millis(300),
        1,
    )
    .run(&store, now())
    .await
    .unwrap();

    assert_eq!(report.sources[0].name, "Slow");
    assert_eq!(report.sources[0].error.as_deref(), Some("request timed out"));
    assert!(report.sources[1].is_success());

    let jobs = store.load();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].source, "Fast");
    assert!(jobs.iter().all(|j| j.source != "Slow"));
}

#[tokio::test]
async fn failing_sources_do_not_abort_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down.rss"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_feed(&server, "/broken.rss", "<html><body>Just a moment...</body></html>".to_string()).await;
    mount_feed(&server, "/ok.rss", rss(&[("Real Job", "https://ok.example.com/1")])).await;

    let (_dir, store) = temp_store();
    let report = pipeline(
        vec![
            source(&server, "Down", "/down.rss"),
            source(&server, "Broken", "/broken.rss"),
            source(&server, "Ok", "/ok.rss"),
        ],
        Duration::from_secs(5),
        1,
    )
    .run(&store, now())
    .await
    .unwrap();

    assert_eq!(report.sources[0].error.as_deref(), Some("HTTP status 503"));
    assert!(report.sources[1].error.as_deref().unwrap().starts_with("Feed parsing error"));
    assert_eq!(report.sources[2].fetched, 1);
    assert_eq!(report.failed_sources(), 2);
    assert_eq!(store.load().len(), 1);
}

#[tokio::test]
async fn all_sources_failing_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_dir, store) = temp_store();
    let existing = r#"[
  {
    "id": "kept",
    "title": "Existing Job",
    "description": "Still listed",
    "company": "Acme",
    "url": "https://acme.example.com/jobs/1",
    "source": "Board A",
    "date": "2024-05-01T12:00:00.000Z",
    "expires": "2024-05-31T12:00:00.000Z"
  }
]"#;
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), existing).unwrap();

    let report = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await
        .unwrap();

    assert_eq!(report.added, 0);
    assert_eq!(report.total, 1);
    assert!(!report.saved);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), existing);
}

#[tokio::test]
async fn new_jobs_append_after_existing_ones() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[
        ("Rust Engineer", "https://a.example.com/1"),
        ("Go Engineer", "https://a.example.com/2"),
    ])).await;

    let (_dir, store) = temp_store();
    let pipeline = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1);

    // Seed the store with the first item only
    let (collected, _) = pipeline.collect(now()).await;
    store.save(&collected[..1]).unwrap();

    let report = pipeline.run(&store, now()).await.unwrap();
    let titles: Vec<String> = store.load().into_iter().map(|j| j.title).collect();

    assert_eq!(report.added, 1);
    assert_eq!(titles, vec!["Rust Engineer", "Go Engineer"]);
}

#[tokio::test]
async fn concurrent_fetches_keep_source_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first.rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(rss(&[("First Job", "https://first.example.com/1")]), "application/rss+xml")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_feed(&server, "/second.rss", rss(&[("Second Job", "https://second.example.com/1")])).await;

    let pipeline = pipeline(
        vec![source(&server, "First", "/first.rss"), source(&server, "Second", "/second.rss")],
        Duration::from_secs(5),
        4,
    );

    let (jobs, outcomes) = pipeline.collect(now()).await;

    assert_eq!(jobs[0].source, "First");
    assert_eq!(jobs[1].source, "Second");
    assert_eq!(outcomes[0].name, "First");
    assert_eq!(outcomes[1].name, "Second");
}

#[tokio::test]
async fn max_items_caps_each_source() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[
        ("One", "https://a.example.com/1"),
        ("Two", "https://a.example.com/2"),
        ("Three", "https://a.example.com/3"),
    ])).await;

    let mut capped = source(&server, "Board A", "/a.rss");
    capped.max_items = Some(2);

    let (jobs, outcomes) = pipeline(vec![capped], Duration::from_secs(5), 1)
        .collect(now())
        .await;

    assert_eq!(jobs.len(), 2);
    assert_eq!(outcomes[0].fetched, 2);
    assert_eq!(jobs[1].title, "Two");
}

fn seed_store(store: &JobStore, content: &str) {
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), content).unwrap();
}

#[tokio::test]
async fn duplicate_ids_in_store_are_not_counted_as_added() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[("Rust Engineer", "https://a.example.com/1")])).await;

    let (_dir, store) = temp_store();
    let record = r#"{"id":"dup","title":"Old","description":"D","company":"C","url":"https://x.example","source":"S","date":"2024-05-01T12:00:00.000Z","expires":"2024-05-31T12:00:00.000Z"}"#;
    let seeded = format!("[{},{}]", record, record);
    seed_store(&store, &seeded);

    let idle = pipeline(Vec::new(), Duration::from_secs(5), 1)
        .run(&store, now())
        .await
        .unwrap();
    assert_eq!(idle.added, 0);
    assert_eq!(idle.total, 1);
    assert!(!idle.saved);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), seeded);

    let report = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await
        .unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.total, 2);

    let ids: Vec<String> = store.load().into_iter().map(|j| j.id).collect();
    assert_eq!(ids[0], "dup");
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn records_missing_a_url_survive_ingest() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[("Rust Engineer", "https://a.example.com/1")])).await;

    let (_dir, store) = temp_store();
    seed_store(&store, r#"[
  {"id":"kept","title":"Kept","description":"D","company":"C","url":"https://x.example","source":"S","date":"2024-05-01T12:00:00.000Z","expires":"2024-05-31T12:00:00.000Z"},
  {"id":"no-link","title":"No link","description":"D","company":"C","source":"S","date":"2024-05-01T12:00:00.000Z","expires":"2024-05-31T12:00:00.000Z"}
]"#);

    let report = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await
        .unwrap();

    assert_eq!(report.added, 1);
    let ids: Vec<String> = store.load().into_iter().map(|j| j.id).collect();
    assert_eq!(&ids[..2], ["kept", "no-link"]);
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn unparseable_store_is_not_overwritten() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[("Rust Engineer", "https://a.example.com/1")])).await;

    let (_dir, store) = temp_store();
    seed_store(&store, "[{\"id\": \"half-written\"");

    let result = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await;

    assert!(matches!(result, Err(Error::StoreRead { .. })));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[{\"id\": \"half-written\"");
}

#[tokio::test]
async fn unreadable_store_aborts_before_writing() {
    let server = MockServer::start().await;
    mount_feed(&server, "/a.rss", rss(&[("Rust Engineer", "https://a.example.com/1")])).await;

    // A directory where the store file should be fails the read itself
    let dir = TempDir::new().unwrap();
    let store = JobStore::new(dir.path().join("jobs.json"));
    std::fs::create_dir(store.path()).unwrap();
    std::fs::write(store.path().join("keep"), "x").unwrap();

    let result = pipeline(vec![source(&server, "Board A", "/a.rss")], Duration::from_secs(5), 1)
        .run(&store, now())
        .await;

    assert!(matches!(result, Err(Error::StoreRead { .. })));
    assert!(store.path().is_dir());
    assert_eq!(std::fs::read_to_string(store.path().join("keep")).unwrap(), "x");
}

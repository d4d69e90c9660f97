//! Integration tests for crawling and indexing
//!
//! These tests use wiremock to serve small sites and run full indexing
//! cycles against in-memory storage.

use sitedex::config::{parse_config, Config};
use sitedex::crawler::IndexPageOutcome;
use sitedex::morphology::lemmatize;
use sitedex::storage::{into_shared, SharedStorage, SqliteStorage};
use sitedex::{Indexer, IndexingError, SearchEngine, SearchQuery, SiteStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration for the given sites
fn create_test_config(sites: &[(&str, &str)], crawler: &str) -> Config {
    let mut toml = format!(
        r#"
[crawler]
request-delay-ms = 0
{}

[storage]
database-path = "unused.db"
"#,
        crawler
    );
    for (url, name) in sites {
        toml.push_str(&format!("\n[[sites]]\nurl = \"{}\"\nname = \"{}\"\n", url, name));
    }
    parse_config(&toml).expect("valid test config")
}

fn create_indexer(config: Config) -> (Indexer, SharedStorage) {
    let storage = into_shared(SqliteStorage::new_in_memory().expect("in-memory database"));
    let indexer = Indexer::new(config, storage.clone()).expect("indexer");
    (indexer, storage)
}

/// An HTML response; wiremock's string bodies are served as text/plain
fn html(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html; charset=utf-8",
    )
}

async fn mount(server: &MockServer, page: &str, response: ResponseTemplate, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .expect(expected_hits)
        .mount(server)
        .await;
}

fn site_id(storage: &SharedStorage, url: &str) -> i64 {
    storage
        .lock()
        .find_site_by_url(url)
        .unwrap()
        .expect("site row")
        .id
}

fn frequency(storage: &SharedStorage, site_id: i64, lemma: &str) -> u64 {
    storage
        .lock()
        .lemma_document_frequency(lemma, Some(site_id))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_page_site() {
    let server = MockServer::start().await;
    mount(&server, "/", html("Главная", "кот сидит на окне"), 1).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Кошки")], ""));
    let summary = indexer.run_full_indexing().await.expect("run");

    assert!(!summary.stopped);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.sites.len(), 1);
    assert_eq!(summary.sites[0].status, SiteStatus::Indexed);
    assert!(!indexer.is_indexing());

    let site = site_id(&storage, &server.uri());
    let page = storage.lock().find_page(site, "/").unwrap().expect("home page");
    assert_eq!(page.code, 200);
    assert!(page.content.contains("кот сидит на окне"));
    assert_eq!(frequency(&storage, site, "кот"), 1);

    let engine = SearchEngine::new(storage.clone(), indexer.config().search.clone());
    let response = engine.search(&SearchQuery::new("кот")).unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].path, "/");
    assert_eq!(response.results[0].relative_relevance, 1.0);
    assert_eq!(response.results[0].site_name, "Кошки");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_follows_links_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    let pages = [
        (
            "/",
            format!(
                r#"<p>главная страница про котов</p>
                <a href="/a">A</a> <a href="{base}/a#part">A again</a> <a href="/b">B</a>
                <a href="/files/report.pdf">PDF</a> <a href="/feed">Feed</a>
                <a href="/missing">Missing</a> <a href="https://other.example/">Other</a>
                <a href="mailto:cat@example.com">Mail</a>"#,
                base = base
            ),
        ),
        (
            "/a",
            r#"<p>кот спит на диване</p><a href="/">Home</a> <a href="/b">B</a>"#.to_string(),
        ),
        (
            "/b",
            r#"<p>пес лает на кота</p><a href="/c">C</a> <a href="/a">A</a>"#.to_string(),
        ),
        ("/c", r#"<p>кот и пес дружат</p><a href="/">Home</a>"#.to_string()),
    ];
    for (page, body) in &pages {
        mount(&server, page, html("", body), 1).await;
    }
    mount(&server, "/missing", ResponseTemplate::new(404), 1).await;
    mount(
        &server,
        "/feed",
        ResponseTemplate::new(200).set_body_raw(r#"{"items":[]}"#, "application/json"),
        1,
    )
    .await;
    mount(&server, "/files/report.pdf", ResponseTemplate::new(200), 0).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&base, "Test")], ""));
    let summary = indexer.run_full_indexing().await.expect("run");
    assert_eq!(summary.sites[0].status, SiteStatus::Indexed);

    let site = site_id(&storage, &base);
    assert_eq!(storage.lock().count_pages(Some(site)).unwrap(), 5);
    for (page, _) in &pages {
        let stored = storage.lock().find_page(site, page).unwrap().expect("page row");
        assert_eq!(stored.code, 200);
    }

    let missing = storage.lock().find_page(site, "/missing").unwrap().expect("404 row");
    assert_eq!(missing.code, 404);
    assert!(missing.content.is_empty());
    assert!(storage.lock().find_page(site, "/feed").unwrap().is_none());

    // every lemma's frequency is the number of pages holding a posting for it
    let mut lemmas: Vec<String> = pages
        .iter()
        .flat_map(|(_, body)| lemmatize(body).into_keys())
        .collect();
    lemmas.sort();
    lemmas.dedup();
    for lemma in &lemmas {
        let holders = storage
            .lock()
            .find_pages_matching_lemma(lemma, Some(site))
            .unwrap()
            .len() as u64;
        assert!(holders > 0, "no posting for {}", lemma);
        assert_eq!(frequency(&storage, site, lemma), holders, "lemma {}", lemma);
    }
    assert_eq!(frequency(&storage, site, "кот"), 4);
    assert_eq!(frequency(&storage, site, "пес"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_page_marks_site_failed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        html("", r#"кот <a href="/slow">slow</a> <a href="/ok">ok</a>"#),
        1,
    )
    .await;
    mount(&server, "/ok", html("", "пес"), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("", "поздно").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = create_test_config(&[(&server.uri(), "Test")], "fetch-timeout-ms = 300");
    let (indexer, storage) = create_indexer(config);
    let summary = indexer.run_full_indexing().await.expect("run");

    let outcome = &summary.sites[0];
    assert_eq!(outcome.status, SiteStatus::Failed);
    assert!(outcome.last_error.is_some());

    let site = site_id(&storage, &server.uri());
    let slow = storage.lock().find_page(site, "/slow").unwrap().expect("stub row");
    assert_eq!(slow.code, 500);
    assert!(slow.content.is_empty());

    // siblings of the failed page are still crawled and indexed
    assert!(storage.lock().find_page(site, "/ok").unwrap().is_some());
    assert_eq!(frequency(&storage, site, "пес"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_force_stop_leaves_no_indexing_site() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("GET"))
            .respond_with(html("", "медленная страница").set_delay(Duration::from_secs(5)))
            .mount(server)
            .await;
    }

    let config = create_test_config(
        &[(&first.uri(), "First"), (&second.uri(), "Second")],
        "fetch-timeout-ms = 10000",
    );
    let stopped_message = config.messages.stopped_by_user.clone();
    let (indexer, storage) = create_indexer(config);
    let indexer = Arc::new(indexer);

    let run = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.run_full_indexing().await })
    };
    while !indexer.is_indexing() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    indexer.force_stop().expect("stop");

    let summary = tokio::time::timeout(Duration::from_secs(3), run)
        .await
        .expect("run ends promptly")
        .expect("run task")
        .expect("run");

    assert!(summary.stopped);
    assert!(!indexer.is_indexing());
    let sites = storage.lock().list_sites().unwrap();
    assert_eq!(sites.len(), 2);
    for site in sites {
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some(stopped_message.as_str()));
    }
    assert!(matches!(indexer.force_stop(), Err(IndexingError::NotRunning)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_finished_site_survives_stop() {
    let fast = MockServer::start().await;
    let slow = MockServer::start().await;
    mount(&fast, "/", html("", "кот"), 1).await;
    Mock::given(method("GET"))
        .respond_with(html("", "медленная страница").set_delay(Duration::from_secs(5)))
        .mount(&slow)
        .await;

    let config = create_test_config(
        &[(&fast.uri(), "Fast"), (&slow.uri(), "Slow")],
        "fetch-timeout-ms = 10000",
    );
    let stopped_message = config.messages.stopped_by_user.clone();
    let (indexer, storage) = create_indexer(config);
    let indexer = Arc::new(indexer);

    let run = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.run_full_indexing().await })
    };

    // the fast site is finalized while the slow one is still crawling
    let status_of = |url: &str| storage.lock().find_site_by_url(url).unwrap().map(|s| s.status);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while status_of(&fast.uri()) != Some(SiteStatus::Indexed) {
        assert!(tokio::time::Instant::now() < deadline, "fast site never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(indexer.is_indexing());
    assert_eq!(status_of(&slow.uri()), Some(SiteStatus::Indexing));

    indexer.force_stop().expect("stop");
    let summary = tokio::time::timeout(Duration::from_secs(3), run)
        .await
        .expect("run ends promptly")
        .expect("run task")
        .expect("run");
    assert!(summary.stopped);

    let fast_site = storage.lock().find_site_by_url(&fast.uri()).unwrap().expect("fast site");
    assert_eq!(fast_site.status, SiteStatus::Indexed);
    assert!(fast_site.last_error.is_none());

    let slow_site = storage.lock().find_site_by_url(&slow.uri()).unwrap().expect("slow site");
    assert_eq!(slow_site.status, SiteStatus::Failed);
    assert_eq!(slow_site.last_error.as_deref(), Some(stopped_message.as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_request_stop_drains_in_flight_fetches() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        html("", r#"кот <a href="/next">next</a>"#).set_delay(Duration::from_millis(800)),
        1,
    )
    .await;
    mount(&server, "/next", html("", "пес"), 0).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Test")], ""));
    let indexer = Arc::new(indexer);

    let run = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.run_full_indexing().await })
    };
    while !indexer.is_indexing() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    indexer.request_stop().expect("stop");

    let summary = run.await.expect("run task").expect("run");
    assert!(summary.stopped);
    assert_eq!(summary.sites[0].status, SiteStatus::Failed);

    // the fetch in flight completed and was stored; nothing new started
    let site = site_id(&storage, &server.uri());
    assert!(storage.lock().find_page(site, "/").unwrap().is_some());
    assert!(storage.lock().find_page(site, "/next").unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deferred_indexing_matches_inline() {
    let server = MockServer::start().await;
    mount(&server, "/", html("", r#"кот сидит <a href="/a">a</a>"#), 2).await;
    mount(&server, "/a", html("", "кот и пес"), 2).await;

    let mut frequencies = Vec::new();
    for crawler in ["", "deferred-indexing = true"] {
        let config = create_test_config(&[(&server.uri(), "Test")], crawler);
        let (indexer, storage) = create_indexer(config);
        let summary = indexer.run_full_indexing().await.expect("run");
        assert_eq!(summary.sites[0].status, SiteStatus::Indexed);

        let site = site_id(&storage, &server.uri());
        frequencies.push((
            frequency(&storage, site, "кот"),
            frequency(&storage, site, "пес"),
            frequency(&storage, site, "сид"),
        ));
    }

    assert_eq!(frequencies[0], (2, 1, 1));
    assert_eq!(frequencies[0], frequencies[1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_index_page_outside_sites_writes_nothing() {
    let server = MockServer::start().await;
    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Test")], ""));

    let result = indexer.index_page_url("https://elsewhere.example/page").await;

    assert!(matches!(result, Err(IndexingError::OutsideConfiguredSites(_))));
    assert!(storage.lock().list_sites().unwrap().is_empty());
    assert_eq!(storage.lock().count_pages(None).unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_index_page_replaces_stored_page() {
    let server = MockServer::start().await;
    mount(&server, "/", html("", "кот"), 1).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Test")], ""));
    indexer.run_full_indexing().await.expect("run");
    let site = site_id(&storage, &server.uri());
    assert_eq!(frequency(&storage, site, "кот"), 1);

    server.reset().await;
    mount(&server, "/", html("", "пес лает"), 1).await;

    let outcome = indexer
        .index_page_url(&format!("{}/", server.uri()))
        .await
        .expect("reindex");
    match outcome {
        IndexPageOutcome::Indexed { path, code, lemmas, .. } => {
            assert_eq!(path, "/");
            assert_eq!(code, 200);
            assert_eq!(lemmas, 2);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    assert_eq!(storage.lock().count_pages(Some(site)).unwrap(), 1);
    assert_eq!(frequency(&storage, site, "кот"), 0);
    assert_eq!(frequency(&storage, site, "пес"), 1);
    assert_eq!(storage.lock().count_lemmas(Some(site)).unwrap(), 2);
    assert_eq!(storage.lock().get_site(site).unwrap().status, SiteStatus::Indexed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_index_page_creates_missing_site() {
    let server = MockServer::start().await;
    mount(&server, "/news", html("", "новости про котов"), 1).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Test")], ""));
    let outcome = indexer
        .index_page_url(&format!("{}/news", server.uri()))
        .await
        .expect("reindex");

    assert!(matches!(outcome, IndexPageOutcome::Indexed { code: 200, .. }));
    let site = storage.lock().find_site_by_url(&server.uri()).unwrap().expect("site");
    assert_eq!(site.name, "Test");
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(frequency(&storage, site.id, "кот"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rebuild_site_index() {
    let server = MockServer::start().await;
    mount(&server, "/", html("", r#"кот сидит <a href="/a">a</a>"#), 1).await;
    mount(&server, "/a", html("", "кот и пес"), 1).await;

    let (indexer, storage) = create_indexer(create_test_config(&[(&server.uri(), "Test")], ""));
    indexer.run_full_indexing().await.expect("run");
    let site = site_id(&storage, &server.uri());

    let indexed = indexer.rebuild_site_index(&server.uri()).expect("rebuild");

    assert_eq!(indexed, 2);
    assert_eq!(frequency(&storage, site, "кот"), 2);
    assert_eq!(frequency(&storage, site, "пес"), 1);
    assert_eq!(storage.lock().get_site(site).unwrap().status, SiteStatus::Indexed);
}

//! HTTP session behavior against a mock server

use catalog_harvest::config::BackoffKind;
use catalog_harvest::harvest::{open_with_retry, Fetcher, HttpFetcher, RetryPolicy, SessionConfig};
use catalog_harvest::FetchError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(SessionConfig {
        user_agent: "CatalogHarvestTest/1.0".to_string(),
        timeout,
        settle: Duration::ZERO,
        proxy: None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_open_returns_body_and_final_url() {
    let server = MockServer::start().await;

    let moved_to = format!("{}/new", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", moved_to.as_str()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
        .mount(&server)
        .await;

    let mut session = create_fetcher(Duration::from_secs(5)).open_session().unwrap();
    let page = session.open(&format!("{}/old", server.uri())).await.unwrap();

    assert_eq!(page.url, format!("{}/new", server.uri()));
    assert_eq!(page.body, "<html>moved</html>");
}

#[tokio::test]
async fn test_status_classification() {
    let server = MockServer::start().await;

    for (route, status) in [("/forbidden", 403), ("/throttled", 429), ("/broken", 500)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let mut session = create_fetcher(Duration::from_secs(5)).open_session().unwrap();

    let result = session.open(&format!("{}/forbidden", server.uri())).await;
    assert!(matches!(result, Err(FetchError::Blocked { status: 403, .. })));

    let result = session.open(&format!("{}/throttled", server.uri())).await;
    assert!(matches!(result, Err(FetchError::Blocked { status: 429, .. })));

    let result = session.open(&format!("{}/broken", server.uri())).await;
    assert!(matches!(result, Err(FetchError::Connection { .. })));
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut session = create_fetcher(Duration::from_millis(50)).open_session().unwrap();
    let result = session.open(&format!("{}/slow", server.uri())).await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_resolve_destination_follows_redirects() {
    let server = MockServer::start().await;

    let vendor_home = format!("{}/vendor/home", server.uri());
    Mock::given(method("GET"))
        .and(path("/visit/acme"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", vendor_home.as_str()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vendor/home"))
        .respond_with(ResponseTemplate::new(200).set_body_string("vendor"))
        .mount(&server)
        .await;

    let mut session = create_fetcher(Duration::from_secs(5)).open_session().unwrap();
    let destination = session
        .resolve_destination(&format!("{}/visit/acme", server.uri()))
        .await
        .unwrap();

    assert_eq!(destination, format!("{}/vendor/home", server.uri()));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(1),
        backoff: BackoffKind::Exponential,
        attempt_timeout: Duration::from_secs(5),
    };

    let mut session = create_fetcher(Duration::from_secs(5)).open_session().unwrap();
    let (page, attempts) = open_with_retry(
        session.as_mut(),
        &format!("{}/flaky", server.uri()),
        &policy,
    )
    .await
    .unwrap();

    assert_eq!(page.body, "ok");
    assert_eq!(attempts, 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(1),
        backoff: BackoffKind::Fixed,
        attempt_timeout: Duration::from_secs(5),
    };

    let mut session = create_fetcher(Duration::from_secs(5)).open_session().unwrap();
    let failure = open_with_retry(session.as_mut(), &format!("{}/down", server.uri()), &policy)
        .await
        .unwrap_err();

    assert_eq!(failure.attempts, 2);
    assert!(matches!(failure.error, FetchError::Connection { .. }));
}

#[tokio::test]
async fn test_settle_longer_than_attempt_timeout_still_loads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("listing"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(SessionConfig {
        user_agent: "CatalogHarvestTest/1.0".to_string(),
        timeout: Duration::from_millis(200),
        settle: Duration::from_millis(400),
        proxy: None,
    })
    .unwrap();

    let policy = RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(1),
        backoff: BackoffKind::Fixed,
        attempt_timeout: Duration::from_millis(200),
    };

    let mut session = fetcher.open_session().unwrap();
    let (page, attempts) = open_with_retry(
        session.as_mut(),
        &format!("{}/listing", server.uri()),
        &policy,
    )
    .await
    .unwrap();

    assert_eq!(page.body, "listing");
    assert_eq!(attempts, 1);
}

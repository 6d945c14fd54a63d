//! End-to-end tests of synchronous clients against a mock server.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use plume_core::{
    BasicAuthInterceptor, Builder, Client, DefaultRetryer, HardCodedTarget, JsonDecoder,
    JsonEncoder, LogLevel, NeverRetry, Options, PlumeError, Request, TracingLogger, UreqClient,
    http_api,
};
use plume_testkit::{MockResponse, MockServer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Contributor {
    login: String,
    contributions: u32,
}

http_api! {
    /// A slice of the GitHub API.
    #[headers("Accept: application/json")]
    pub struct GitHub {
        #[request_line("GET /repos/{owner}/{repo}/contributors?anon={anon}")]
        fn contributors(&self, owner: &str, repo: &str, anon: Option<bool>) -> Result<Vec<Contributor>, PlumeError>;

        #[request_line("POST /repos/{owner}/{repo}/contributors")]
        #[headers("Content-Type: application/json")]
        fn add(&self, owner: &str, repo: &str, contributor: &Contributor) -> Result<Contributor, PlumeError>;

        #[request_line("GET /users/{login}")]
        fn user(&self, login: &str) -> Result<Option<Contributor>, PlumeError>;
    }
}

http_api! {
    pub struct Other {
        #[request_line("GET /")]
        fn get(&self) -> Result<String, PlumeError>;
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn json_builder() -> Builder {
    Builder::new()
        .encoder(JsonEncoder)
        .decoder(JsonDecoder)
        .logger(TracingLogger)
        .log_level(LogLevel::Full)
}

fn github_client(server: &MockServer) -> GitHub {
    json_builder()
        .retryer(NeverRetry)
        .target(server.url())
        .unwrap()
}

#[test]
fn expands_path_and_query_and_decodes_json() {
    init_tracing();
    let server = MockServer::start().unwrap();
    server.enqueue(
        MockResponse::new().set_body(r#"[{"login":"octocat","contributions":7}]"#),
    );

    let github = github_client(&server);
    let contributors = github.contributors("rust-lang", "rust", Some(true)).unwrap();
    assert_eq!(
        contributors,
        vec![Contributor {
            login: "octocat".into(),
            contributions: 7,
        }]
    );

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/repos/rust-lang/rust/contributors?anon=true");
    assert_eq!(request.header("accept"), Some("application/json"));
}

#[test]
fn unresolved_queries_are_dropped() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_body("[]"));

    let github = github_client(&server);
    assert!(github.contributors("a", "b", None).unwrap().is_empty());
    assert_eq!(
        server.take_request().unwrap().path,
        "/repos/a/b/contributors"
    );
}

#[test]
fn encodes_the_body_parameter() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_body(r#"{"login":"ferris","contributions":1}"#));

    let github = github_client(&server);
    let ferris = Contributor {
        login: "ferris".into(),
        contributions: 1,
    };
    assert_eq!(github.add("a", "b", &ferris).unwrap(), ferris);

    let request = server.take_request().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("content-type"), Some("application/json"));
    let sent: Contributor = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(sent, ferris);
}

#[test]
fn error_statuses_become_status_errors() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_status(500).set_body("boom"));

    let github = github_client(&server);
    match github.user("octocat") {
        Err(PlumeError::Status {
            method,
            status,
            body,
        }) => {
            assert_eq!(method, "GitHub#user(login)");
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, b"boom");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[test]
fn not_found_decodes_when_enabled() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_status(404));
    server.enqueue(MockResponse::new().set_status(404));

    let github: GitHub = json_builder()
        .retryer(NeverRetry)
        .decode404()
        .target(server.url())
        .unwrap();
    assert_eq!(github.user("nobody").unwrap(), None);

    let strict = github_client(&server);
    let err = strict.user("nobody").unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[test]
fn not_found_is_empty_for_the_default_decoder() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_status(404).set_body("no such page"));

    let other: Other = Builder::new()
        .retryer(NeverRetry)
        .decode404()
        .target(server.url())
        .unwrap();
    assert_eq!(other.get().unwrap(), "");
}

#[test]
fn path_values_cannot_escape_their_segment() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_body("null"));
    server.enqueue(MockResponse::new().set_body("null"));

    let github = github_client(&server);
    assert_eq!(
        github.user("a/b?admin=1").unwrap(),
        None
    );
    assert_eq!(github.user("c#frag").unwrap(), None);

    assert_eq!(
        server.take_request().unwrap().path,
        "/users/a%2Fb%3Fadmin%3D1"
    );
    assert_eq!(server.take_request().unwrap().path, "/users/c%23frag");
}

#[test]
fn retries_when_the_server_asks_to() {
    init_tracing();
    let server = MockServer::start().unwrap();
    server.enqueue(
        MockResponse::new()
            .set_status(503)
            .header("Retry-After", "0"),
    );
    server.enqueue(MockResponse::new().set_body("[]"));

    let github: GitHub = json_builder()
        .retryer(DefaultRetryer::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            3,
        ))
        .target(server.url())
        .unwrap();
    assert!(github.contributors("a", "b", None).unwrap().is_empty());
    assert_eq!(server.request_count(), 2);
}

#[test]
fn gives_up_after_max_attempts() {
    let server = MockServer::start().unwrap();
    for _ in 0..3 {
        server.enqueue(
            MockResponse::new()
                .set_status(503)
                .header("Retry-After", "0"),
        );
    }

    let github: GitHub = json_builder()
        .retryer(DefaultRetryer::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            2,
        ))
        .target(server.url())
        .unwrap();
    let err = github.contributors("a", "b", None).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(server.request_count(), 2);
}

#[test]
fn connection_failures_are_retryable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let github: GitHub = json_builder()
        .retryer(NeverRetry)
        .target(format!("http://127.0.0.1:{port}"))
        .unwrap();
    let err = github.user("octocat").unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

fn get(server: &MockServer) -> Request {
    Request {
        method: http::Method::GET,
        url: url::Url::parse(&server.url()).unwrap(),
        headers: Vec::new(),
        body: None,
    }
}

#[test]
fn agent_timeouts_govern_slow_responses() {
    let server = MockServer::start().unwrap();
    let slow = || {
        MockResponse::new()
            .set_delay(Duration::from_millis(300))
            .set_body("slow")
    };
    server.enqueue(slow());
    server.enqueue(slow());

    let tight = Options {
        connect_timeout: Duration::from_millis(50),
        read_timeout: Duration::from_millis(50),
        follow_redirects: false,
    };
    let patient = UreqClient::new(&Options::default());
    let response = patient.execute(&get(&server), &tight).unwrap();
    assert_eq!(response.text().unwrap(), "slow");

    let impatient = UreqClient::new(&tight);
    let err = impatient
        .execute(&get(&server), &Options::default())
        .unwrap_err();
    assert!(matches!(err, PlumeError::Io(_)), "{err}");
}

#[test]
fn interceptors_run_on_every_request() {
    let server = MockServer::start().unwrap();
    server.enqueue(MockResponse::new().set_body("null"));

    let github: GitHub = json_builder()
        .retryer(NeverRetry)
        .request_interceptor(BasicAuthInterceptor::new("Aladdin", "open sesame"))
        .request_interceptor(|t: &mut plume_core::RequestTemplate| {
            t.header("X-Request-Id", "42");
        })
        .target(server.url())
        .unwrap();
    github.user("octocat").unwrap();

    let request = server.take_request().unwrap();
    assert_eq!(
        request.header("authorization"),
        Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
    );
    assert_eq!(request.header("x-request-id"), Some("42"));
}

#[test]
fn targets_must_serve_the_interface() {
    let target = Arc::new(HardCodedTarget::new("Other", "http://localhost"));
    let err = Builder::new().target_with::<GitHub>(target).unwrap_err();
    assert!(matches!(err, PlumeError::Config(_)), "{err}");
}

#[test]
fn clients_compare_through_their_targets() {
    let plume = Builder::new().build();
    let a: Other = plume
        .new_instance(Arc::new(HardCodedTarget::new("Other", "http://a")))
        .unwrap();
    let b: Other = plume
        .new_instance(Arc::new(HardCodedTarget::new("Other", "http://a")))
        .unwrap();
    let c: Other = plume
        .new_instance(Arc::new(HardCodedTarget::new("Other", "http://c")))
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "HardCodedTarget(type=Other, url=http://a)");
}

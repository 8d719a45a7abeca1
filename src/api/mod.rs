//! HTTP surface: the index greeting plus the two orchestrator probes.
//!
//! | Route        | Handler             | Purpose                               |
//! |--------------|---------------------|---------------------------------------|
//! | `/alive`     | [`health::alive`]   | liveness, always 200                  |
//! | `/ready`     | [`health::ready`]   | readiness, 500 once shutdown begins   |
//! | anything else| [`index::index`]    | greeting with the machine hostname    |
//!
//! Every route answers any method.

use std::sync::Arc;

use axum::{
    http::{header::HOST, HeaderMap},
    routing::any,
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{host::HostnameSource, state::ShutdownState};

pub mod health;
pub mod index;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub shutdown: ShutdownState,
    pub host: Arc<dyn HostnameSource>,
}

impl AppState {
    pub fn new(shutdown: ShutdownState, host: Arc<dyn HostnameSource>) -> Self {
        Self { shutdown, host }
    }
}

/// Build the axum router.
///
/// The index handler is the fallback, so `/` and every unmatched path get
/// the greeting.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/alive", any(health::alive))
        .route("/ready", any(health::ready))
        .fallback(index::index)
        .with_state(state)
}

/// Attach per-request trace spans.
///
/// A failing `/ready` during a drain is expected, so 5xx classification is
/// logged at DEBUG rather than tower-http's default ERROR. Handler errors
/// already log at WARN through [`crate::error::AppError`].
pub fn with_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::DEBUG))
            .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
    )
}

/// The `Host` header of a request, for log lines.
fn request_host(headers: &HeaderMap) -> &str {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        io,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
    };
    use tower::ServiceExt; // oneshot
    use tracing::{Event, Subscriber};
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer, Registry,
    };

    use super::*;

    /// Hostname source with a fixed answer.
    pub struct FixedHostname(pub &'static str);

    impl HostnameSource for FixedHostname {
        fn hostname(&self) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Hostname source that always fails.
    pub struct BrokenHostname;

    impl HostnameSource for BrokenHostname {
        fn hostname(&self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::Other, "no uts namespace"))
        }
    }

    pub fn test_state(host: impl HostnameSource + 'static) -> AppState {
        AppState::new(ShutdownState::new(), Arc::new(host))
    }

    #[test]
    fn request_host_reads_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("pod-a:8080"));
        assert_eq!(request_host(&headers), "pod-a:8080");
    }

    #[test]
    fn request_host_defaults_to_dash() {
        assert_eq!(request_host(&HeaderMap::new()), "-");
    }

    /// Counts captured events by level.
    #[derive(Clone, Default)]
    struct LevelCounter {
        errors: Arc<AtomicUsize>,
        infos: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for LevelCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            match *event.metadata().level() {
                Level::ERROR => self.errors.fetch_add(1, Ordering::SeqCst),
                Level::INFO => self.infos.fetch_add(1, Ordering::SeqCst),
                _ => 0,
            };
        }
    }

    #[tokio::test]
    async fn failing_readiness_is_not_logged_as_error() {
        let counter = LevelCounter::default();
        let _guard = tracing::subscriber::set_default(Registry::default().with(counter.clone()));

        let state = test_state(FixedHostname("pod-drain"));
        state.shutdown.begin_shutdown();
        let app = with_tracing(router(state));

        let req = Request::builder().uri("/ready").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The handler's own "failing readiness request" line was captured...
        assert!(counter.infos.load(Ordering::SeqCst) >= 1);
        // ...but the 500 did not produce an ERROR line.
        assert_eq!(counter.errors.load(Ordering::SeqCst), 0);
    }

    /// Serve the router on an ephemeral port and drive it over real HTTP.
    #[tokio::test]
    async fn serves_probes_over_http_and_flips_readiness() {
        let state = test_state(FixedHostname("pod-e2e"));
        let shutdown = state.shutdown.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let get = |path: &str| client.get(format!("http://{addr}{path}")).send();

        let resp = get("/").await.expect("index request failed");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "Hello! I am here! - pod-e2e");

        assert_eq!(get("/alive").await.unwrap().status(), 200);
        assert_eq!(get("/ready").await.unwrap().status(), 200);

        shutdown.begin_shutdown();

        assert_eq!(get("/ready").await.unwrap().status(), 500);
        assert_eq!(get("/ready").await.unwrap().status(), 500);
        assert_eq!(get("/alive").await.unwrap().status(), 200);

        server.abort();
    }
}

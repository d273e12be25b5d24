//! Request logging and the per-request trace span.
//!
//! Neither ever records a query string: the OAuth callback carries the
//! authorization code and state there.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::state::AppState;

/// Paths polled by load balancers and uptime checks.
const PROBE_PATHS: &[&str] = &["/health"];

/// Span for `TraceLayer`: method and path only.
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// How loudly a finished request is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loudness {
    /// Health probes that succeeded.
    Quiet,
    Normal,
    ClientError,
    ServerError,
}

impl Loudness {
    fn of(path: &str, status: StatusCode) -> Self {
        if status.is_server_error() {
            Loudness::ServerError
        } else if status.is_client_error() {
            Loudness::ClientError
        } else if PROBE_PATHS.contains(&path) {
            Loudness::Quiet
        } else {
            Loudness::Normal
        }
    }
}

/// Log method, path, status and duration once the response is ready.
///
/// `query_omitted` flags requests whose query string was dropped from the log.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query_omitted = request.uri().query().is_some();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    match Loudness::of(&path, response.status()) {
        Loudness::Quiet => {
            tracing::debug!(%method, %path, status, duration_ms, "Probe answered");
        }
        Loudness::Normal => {
            tracing::info!(%method, %path, status, duration_ms, query_omitted, "Request completed");
        }
        Loudness::ClientError => {
            tracing::warn!(
                %method,
                %path,
                status,
                duration_ms,
                query_omitted,
                "Request completed with client error"
            );
        }
        Loudness::ServerError => {
            tracing::error!(
                %method,
                %path,
                status,
                duration_ms,
                query_omitted,
                "Request completed with server error"
            );
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_loudness() {
        assert_eq!(Loudness::of("/health", StatusCode::OK), Loudness::Quiet);
        assert_eq!(
            Loudness::of("/health", StatusCode::SERVICE_UNAVAILABLE),
            Loudness::ServerError
        );
        assert_eq!(Loudness::of("/api/chat", StatusCode::OK), Loudness::Normal);
        assert_eq!(
            Loudness::of("/api/tidal/callback", StatusCode::TEMPORARY_REDIRECT),
            Loudness::Normal
        );
        assert_eq!(
            Loudness::of("/api/tidal/user", StatusCode::UNAUTHORIZED),
            Loudness::ClientError
        );
    }

    #[test]
    fn test_request_span_leaves_out_query() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let request = Request::builder()
            .uri("/api/tidal/callback?code=secret-code&state=secret-state")
            .body(Body::empty())
            .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            let span = request_span(&request);
            let _entered = span.enter();
            tracing::info!("inside");
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("path=/api/tidal/callback"), "{out}");
        assert!(out.contains("method=GET"), "{out}");
        assert!(!out.contains("secret-code"), "{out}");
        assert!(!out.contains("secret-state"), "{out}");
    }
}

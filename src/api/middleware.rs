//! Cross-cutting request/response layers.
//!
//! Applied to every request, outermost first:
//!
//! 1. security headers
//! 2. CORS
//! 3. gzip compression
//! 4. access log (plus request metrics)
//! 5. panic catcher, turning a handler panic into a JSON 500
//!
//! Body parsing happens in the [`Payload`](super::extract::Payload) extractor.

use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    compression::{
        predicate::{And, NotForContentType, Predicate, SizeAbove},
        CompressionLayer,
    },
    cors::{self, CorsLayer},
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing::{info, Span};

use crate::error::AppError;
use crate::metrics;

/// Bodies at or below this many bytes are sent uncompressed.
pub const COMPRESSION_THRESHOLD: u16 = 1024;

/// Defensive headers added to every response.
pub const SECURITY_HEADERS: [(&str, &str); 12] = [
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
         form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
         object-src 'none';script-src 'self';script-src-attr 'none';\
         style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Middleware that adds [`SECURITY_HEADERS`] without overwriting handler-set values.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers
            .entry(HeaderName::from_static(name))
            .or_insert(HeaderValue::from_static(value));
    }
    response
}

/// Permissive CORS: any origin, the common methods, any request headers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(cors::Any)
}

/// Predicate deciding which responses get compressed.
pub type CompressionPredicate =
    And<And<And<SizeAbove, NotForContentType>, NotForContentType>, NotForContentType>;

/// Gzip bodies above [`COMPRESSION_THRESHOLD`], skipping images and streams.
pub fn compression_layer() -> CompressionLayer<CompressionPredicate> {
    let predicate = SizeAbove::new(COMPRESSION_THRESHOLD)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE);

    CompressionLayer::new().compress_when(predicate)
}

/// Client address recorded by the server, or `-` when it is unknown.
pub fn remote_addr<B>(request: &axum::http::Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}

/// Opens one span per request carrying the request side of the access log.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessSpan;

impl<B> MakeSpan<B> for AccessSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let header_str = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-")
                .to_owned()
        };

        tracing::info_span!(
            "request",
            remote_addr = %remote_addr(request),
            method = %request.method(),
            path = %request.uri().path(),
            version = ?request.version(),
            referrer = %header_str(header::REFERER),
            user_agent = %header_str(header::USER_AGENT),
        )
    }
}

/// Writes the access log line and records request metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl<B: HttpBody> OnResponse<B> for AccessLog {
    fn on_response(self, response: &axum::http::Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();
        let bytes = response
            .body()
            .size_hint()
            .exact()
            .map_or_else(|| "-".to_string(), |b| b.to_string());

        info!(
            status,
            latency_ms = latency.as_secs_f64() * 1000.0,
            bytes = %bytes,
            "request completed"
        );

        metrics::record_http_request(status, latency);
    }
}

/// Access log layer.
pub fn access_log_layer(
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, AccessSpan, (), AccessLog> {
    TraceLayer::new_for_http()
        .make_span_with(AccessSpan)
        .on_request(())
        .on_response(AccessLog)
}

/// Convert a caught handler panic into a JSON 500.
///
/// The panic report itself has already gone to stderr via the panic hook.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };

    metrics::inc_handler_panics();
    AppError::Internal(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn handle_panic_extracts_message() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(42_u32));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn remote_addr_reads_connect_info() {
        let mut request = axum::http::Request::new(());
        assert_eq!(remote_addr(&request), "-");

        let addr: SocketAddr = "203.0.113.7:51234".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(remote_addr(&request), "203.0.113.7");
    }

    #[test]
    fn security_header_names_are_valid() {
        for (name, value) in SECURITY_HEADERS {
            assert!(HeaderName::from_bytes(name.as_bytes()).is_ok(), "{name}");
            assert!(HeaderValue::from_str(value).is_ok(), "{value}");
        }
    }
}

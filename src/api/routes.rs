//! HTTP API route definitions.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use super::handlers::{analyze, data, date, health, index, not_found};
use super::middleware::{
    access_log_layer, compression_layer, cors_layer, handle_panic, security_headers,
};

/// Route table without middleware.
///
/// A known path requested with the wrong method falls through to the 404
/// handler like any other unmatched request.
pub fn routes() -> Router {
    Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .route("/data", get(data).fallback(not_found))
        .route("/analyze", post(analyze).fallback(not_found))
        .route("/utils/date", get(date).fallback(not_found))
        .fallback(not_found)
}

/// Wrap `router` in the middleware chain.
///
/// Layers are added innermost first; on the way in a request meets security
/// headers, CORS, compression, the access log and finally the panic catcher.
pub fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(access_log_layer())
        .layer(compression_layer())
        .layer(cors_layer())
        .layer(from_fn(security_headers))
}

/// Create the API router.
pub fn create_router() -> Router {
    with_middleware(routes())
}

//! HTTP API module: handlers, body extraction, middleware and routes.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::{create_router, routes, with_middleware};

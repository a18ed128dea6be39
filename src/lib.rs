//! SBOM example REST service.
//!
//! A small JSON-over-HTTP service with a realistic dependency graph, used to
//! exercise software bill-of-materials tooling.
//!
//! # Endpoints
//!
//! ```text
//! GET  /            greeting, version, timestamp
//! GET  /health      status, uptime, memory
//! GET  /data        ten synthetic records
//! POST /analyze     mean/sum/min/max/count over {"numbers": [...]}
//! GET  /utils/date  now in four renderings, ?format=YYYY-MM-DD
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`api`]: Routes, handlers and middleware
//! - [`analysis`]: Summary statistics
//! - [`dates`]: Moment-style date formatting
//! - [`process`]: Uptime and memory figures
//! - [`metrics`]: Request metrics
//! - [`utils`]: Utility functions

pub mod analysis;
pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod metrics;
pub mod process;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result, ServiceError};

//! Dremio REST client module
//!
//! Structure:
//! - `transport.rs`: HTTP seam (reqwest in production, scripted in tests)
//! - `client.rs`: typed endpoint calls
//! - `auth.rs`: token probe, login and refresh
//! - `catalog.rs`: exact-path catalog descent
//! - `job.rs`: SQL submission and completion polling
//! - `results.rs`: paginated result collection
//! - `models.rs`: REST payloads
//! - `error.rs`: error types

pub mod auth;
pub mod catalog;
pub mod client;
pub mod error;
pub mod job;
pub mod models;
pub mod results;
pub mod transport;

// Re-exports for convenience
pub use auth::{ensure_valid_token, TokenStatus};
pub use catalog::{resolve_dataset, DatasetPath};
pub use client::DremioClient;
pub use error::{DremioError, Result};
pub use job::{PollPolicy, QueryExecutor, Sleeper, TokioSleeper};
pub use results::collect_results;
pub use transport::{HttpTransport, Transport};

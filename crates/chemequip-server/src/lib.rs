//! ChemEquip Server Library
//!
//! HTTP service that ingests chemical-equipment CSV files, keeps a bounded
//! per-user history of datasets and serves statistics and PDF reports.
//!
//! # Architecture
//!
//! Feature slices follow a command/query split:
//!
//! - **Commands** (writes): registration, login/logout, CSV upload
//! - **Queries** (reads): dataset listing and detail, equipment listing,
//!   per-dataset and global summaries, report rendering
//!
//! HTTP handlers call each slice's `handle` function directly; the same
//! handlers are registered with a mediator for in-process callers (see
//! [`cqrs::build_mediator`]).
//!
//! ## Framework Stack
//!
//! - **Axum**: routing, extractors, multipart uploads
//! - **SQLx**: SQLite in WAL mode, migrations embedded at build time
//! - **Tower**: compression, tracing and CORS layers
//!
//! # Example
//!
//! ```no_run
//! use chemequip_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod report;

// Re-export commonly used types
pub use error::AppError;
pub use features::FeatureState;

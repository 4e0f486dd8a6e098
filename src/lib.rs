// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Datadis Connector Development Kit (CDK)
//!
//! Paginated, retrying, authenticated extraction from the Datadis private
//! API, with parent-child stream slicing.
//!
//! ## Features
//!
//! - **Bearer Auth**: credential exchange at a login endpoint, optional token reuse
//! - **Retry/Backoff**: user-defined or exponential waits within attempt and time budgets
//! - **Lazy Pagination**: pages are requested only as records are consumed
//! - **Fan-out**: one child fetch cycle per parent record, in parent order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datadis_cdk::{ConnectorConfig, DatadisConnector, RecordSource, Result};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = ConnectorConfig::from_env();
//!     config.consumption.start_date = Some("2023/10".to_string());
//!
//!     let connector = DatadisConnector::new(config)?;
//!     let consumption = connector.consumption()?;
//!
//!     let mut records = consumption.read_records(None);
//!     while let Some(record) = records.try_next().await? {
//!         println!("{}", serde_json::Value::Object(record));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  DependentStream: parent records → slices → child reads  │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────────────────────────────────┐
//! │  StreamReader: pagination loop, one page per pull         │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌────────────┬───────────────┴──────────┬──────────────────┐
//! │   Auth     │   Request Builder        │  Retry Executor  │
//! ├────────────┼──────────────────────────┼──────────────────┤
//! │ Login      │ URL join, query, headers │ Backoff tiers    │
//! │ Bearer     │ JSON / form bodies       │ Attempt budget   │
//! │ Token TTL  │ Conflict check           │ Time budget      │
//! └────────────┴──────────────────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the CDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and backoff
pub mod http;

/// Paginated streams and parent-child fan-out
pub mod stream;

/// Datadis resources
pub mod connectors;

/// Connector configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ConnectorConfig;
pub use connectors::{Consumption, ConsumptionStream, DatadisConnector, Supplies};
pub use stream::{DependentStream, HttpStream, RecordSource, RecordStream, StreamReader};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

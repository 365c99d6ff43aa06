//! # tokend Provider
//!
//! Connection lifecycle and request plumbing for tokend. A [`ConnectionManager`]
//! owns the single connection of a token service; every contract call and
//! transaction goes through the [`Connection`] it hands out.
//!
//! ## Features
//!
//! - Three backends: direct JSON-RPC, a remote public node, or a local test chain
//! - Chain id verification against the configured [`Network`]
//! - Per-request timeouts and a bounded receipt wait
//! - Transport errors classified into retryable and terminal failures
//!
//! ## Example
//!
//! ```ignore
//! use tokend_provider::{ConnectionManager, ServiceConfig};
//!
//! let manager = ConnectionManager::new(ServiceConfig::direct_rpc("http://localhost:8545"));
//! manager.connect().await?;
//!
//! let connection = manager.connection().await?;
//! let balance = connection.get_balance(owner).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod manager;
pub mod timeout;

pub use classify::{classify, RequestKind};
pub use config::{Backend, Network, ServiceConfig, TimeoutConfig, LOCAL_RPC_URL};
pub use manager::{Connection, ConnectionManager};
pub use timeout::with_timeout;

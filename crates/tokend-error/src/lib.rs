//! # tokend Error
//!
//! Unified error types for the tokend workspace. Every crate in the workspace
//! reports failures through [`TokendError`] so callers can branch on one taxonomy
//! regardless of which layer failed.
//!
//! ## Error Categories
//!
//! - Lookup errors ([`TokendError::UnknownToken`], [`TokendError::UnknownTokenVersion`])
//!   are produced synchronously from static registry data.
//! - Connection errors ([`TokendError::Connection`], [`TokendError::NotConnected`],
//!   [`TokendError::ChainIdMismatch`]) come from the connection lifecycle.
//! - Request errors ([`TokendError::TransientNetwork`], [`TokendError::Timeout`],
//!   [`TokendError::RpcRequest`]) come from individual reads.
//! - [`TokendError::TransactionReverted`] is reserved for state-changing calls the
//!   node or contract refused. [`TokendError::TransactionPending`] carries the hash
//!   of a transaction the node accepted but whose receipt was never observed.
//!
//! ## Example
//!
//! ```
//! use tokend_error::{TokendError, Result};
//!
//! fn lookup(symbol: &str) -> Result<()> {
//!     if symbol != "DAI" {
//!         return Err(TokendError::UnknownToken {
//!             symbol: symbol.to_string(),
//!             network: "mainnet".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert!(lookup("XYZ").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for tokend operations.
#[derive(Error, Debug)]
pub enum TokendError {
    // ============ Connection Errors ============
    /// The endpoint could not be reached or is misconfigured
    #[error("Connection to {url} failed: {reason}")]
    Connection {
        /// Endpoint URL
        url: String,
        /// Error reason
        reason: String,
    },

    /// An operation needed a connection but `connect()` has not completed
    #[error("Not connected: call connect() first")]
    NotConnected,

    /// The node reports a different chain than the configured network
    #[error("Invalid chain ID: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Expected chain ID
        expected: u64,
        /// Actual chain ID
        got: u64,
    },

    // ============ Registry Errors ============
    /// Symbol is not registered on the active network
    #[error("Unknown token '{symbol}' on network {network}")]
    UnknownToken {
        /// Requested symbol
        symbol: String,
        /// Active network
        network: String,
    },

    /// Symbol is known but the requested version is not
    #[error("Unknown version {version} of token '{symbol}'")]
    UnknownTokenVersion {
        /// Requested symbol
        symbol: String,
        /// Requested version
        version: u32,
    },

    /// Registry table is inconsistent (duplicate or malformed entries)
    #[error("Registry error: {0}")]
    RegistryError(String),

    // ============ Request Errors ============
    /// The request failed in flight on an otherwise valid connection
    #[error("Transient network failure in {method}: {reason}")]
    TransientNetwork {
        /// RPC method or operation name
        method: String,
        /// Error reason
        reason: String,
    },

    /// The request did not complete within its bound
    #[error("Operation '{operation}' timed out after {seconds}s")]
    Timeout {
        /// Operation name
        operation: String,
        /// Timeout duration
        seconds: u64,
    },

    /// The node answered a read with an error
    #[error("RPC request failed: {method} - {reason}")]
    RpcRequest {
        /// RPC method name
        method: String,
        /// Error reason
        reason: String,
    },

    // ============ Transaction Errors ============
    /// The node or contract rejected a state-changing call
    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    /// The transaction was accepted by the node but its outcome is unknown
    #[error("Transaction {hash} submitted but not confirmed: {reason}")]
    TransactionPending {
        /// Hash returned by the node
        hash: String,
        /// Why confirmation could not be observed
        reason: String,
    },

    /// No account is available to send transactions from
    #[error("No sending account available on this connection")]
    MissingAccount,

    // ============ Input Errors ============
    /// Invalid address format
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The invalid address
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid amount format
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// ABI encoding/decoding error
    #[error("ABI error: {0}")]
    AbiError(String),

    /// Operation is not available for this token kind
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ============ Generic ============
    /// Wrapped error from external source
    #[error("External error: {message}")]
    External {
        /// Error message
        message: String,
    },
}

/// Convenient Result type using TokendError
pub type Result<T> = std::result::Result<T, TokendError>;

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Adds context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;

    /// Adds context using a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| TokendError::External {
            message: format!("{}: {}", ctx.into(), e),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| TokendError::External {
            message: format!("{}: {}", f(), e),
        })
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| TokendError::ConfigError(ctx.into()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| TokendError::ConfigError(f()))
    }
}

impl From<std::num::ParseIntError> for TokendError {
    fn from(err: std::num::ParseIntError) -> Self {
        TokendError::ConfigError(err.to_string())
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Invalid address
    InvalidAddress = 1001,
    /// Invalid amount
    InvalidAmount = 1002,
    /// Unknown token symbol
    UnknownToken = 2001,
    /// Unknown token version
    UnknownTokenVersion = 2002,
    /// Registry error
    RegistryError = 2003,
    /// Transaction reverted
    TransactionReverted = 3001,
    /// Missing sending account
    MissingAccount = 3002,
    /// Submitted transaction with unobserved outcome
    TransactionPending = 3003,
    /// Connection error
    Connection = 4001,
    /// RPC request error
    RpcRequest = 4002,
    /// Request timeout
    Timeout = 4003,
    /// Transient network failure
    TransientNetwork = 4004,
    /// Chain ID mismatch
    ChainIdMismatch = 4005,
    /// Not connected
    NotConnected = 4006,
    /// ABI error
    AbiError = 5001,
    /// Configuration error
    ConfigError = 6001,
    /// Not supported
    NotSupported = 9001,
}

impl TokendError {
    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TokendError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            TokendError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            TokendError::UnknownToken { .. } => ErrorCode::UnknownToken,
            TokendError::UnknownTokenVersion { .. } => ErrorCode::UnknownTokenVersion,
            TokendError::RegistryError(_) => ErrorCode::RegistryError,
            TokendError::TransactionReverted(_) => ErrorCode::TransactionReverted,
            TokendError::MissingAccount => ErrorCode::MissingAccount,
            TokendError::TransactionPending { .. } => ErrorCode::TransactionPending,
            TokendError::Connection { .. } => ErrorCode::Connection,
            TokendError::RpcRequest { .. } => ErrorCode::RpcRequest,
            TokendError::Timeout { .. } => ErrorCode::Timeout,
            TokendError::TransientNetwork { .. } => ErrorCode::TransientNetwork,
            TokendError::ChainIdMismatch { .. } => ErrorCode::ChainIdMismatch,
            TokendError::NotConnected => ErrorCode::NotConnected,
            TokendError::AbiError(_) => ErrorCode::AbiError,
            TokendError::ConfigError(_) => ErrorCode::ConfigError,
            TokendError::NotSupported(_) => ErrorCode::NotSupported,
            TokendError::External { .. } => ErrorCode::Unknown,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only idempotent reads should be retried on these; a state-changing call
    /// that failed transiently may still have been mined.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TokendError::TransientNetwork { .. }
                | TokendError::Timeout { .. }
                | TokendError::Connection { .. }
        )
    }

    /// Returns suggested retry delay in seconds, if applicable
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            TokendError::Timeout { seconds, .. } => Some((*seconds / 2).max(1)),
            _ if self.is_retryable() => Some(5),
            _ => None,
        }
    }

    /// Hash of a submitted transaction whose outcome is unknown.
    ///
    /// Check the chain for this hash before resubmitting.
    pub fn pending_transaction(&self) -> Option<&str> {
        match self {
            TokendError::TransactionPending { hash, .. } => Some(hash),
            _ => None,
        }
    }

    /// Returns true for failures detected locally, before any network access
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            TokendError::UnknownToken { .. } | TokendError::UnknownTokenVersion { .. }
        )
    }
}

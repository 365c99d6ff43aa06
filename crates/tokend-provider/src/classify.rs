//! Maps transport failures onto the tokend error taxonomy.
//!
//! Distinguishes between:
//! - transport failures (connection reset, DNS, HTTP status) -> `TransientNetwork`
//! - node error responses to a state-changing call -> `TransactionReverted`
//! - node error responses to a read -> `RpcRequest`

use alloy::transports::{RpcError, TransportError};
use tokend_error::TokendError;

/// Whether a request reads state or tries to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Idempotent query
    Read,
    /// Transaction submission
    Send,
}

/// Classifies an alloy transport error for `method`.
pub fn classify(method: &str, kind: RequestKind, err: TransportError) -> TokendError {
    match err {
        RpcError::ErrorResp(payload) => {
            let message = payload.message.to_string();
            if kind == RequestKind::Send || is_revert(payload.code, &message) {
                tracing::warn!(method, code = payload.code, reason = %message, "node rejected request");
                TokendError::TransactionReverted(message)
            } else {
                TokendError::RpcRequest {
                    method: method.to_string(),
                    reason: format!("code={}, message={}", payload.code, message),
                }
            }
        }
        RpcError::Transport(transport) => {
            tracing::warn!(method, error = %transport, "transport failure");
            TokendError::TransientNetwork {
                method: method.to_string(),
                reason: transport.to_string(),
            }
        }
        RpcError::NullResp => TokendError::RpcRequest {
            method: method.to_string(),
            reason: "null response".to_string(),
        },
        other => TokendError::RpcRequest {
            method: method.to_string(),
            reason: other.to_string(),
        },
    }
}

// Code 3 is the execution-reverted code used by geth and anvil.
fn is_revert(code: i64, message: &str) -> bool {
    code == 3 || message.contains("revert")
}

//! # tokend Traits
//!
//! Shared capability traits and value types for tokend. Every token kind
//! (contract-issued ERC20 tokens and the chain's native asset) implements
//! [`Token`], so callers can hold either behind one interface.
//!
//! ## Core Items
//!
//! - [`Token`] - balance, allowance, approve and transfer for one token version
//! - [`TxReceipt`] - the outcome of a submitted state-changing call
//! - [`parse_address`], [`parse_amount`], [`format_amount`] - lossless boundary conversions
//!
//! ## Example
//!
//! ```ignore
//! use tokend_traits::prelude::*;
//!
//! async fn show<T: Token>(token: &T, owner: Address) -> tokend_error::Result<String> {
//!     let balance = token.balance_of(owner).await?;
//!     format_amount(balance, token.decimals())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokend_error::{Result, TokendError};

/// Allowance reported for the native asset, which has no approval mechanism.
///
/// Equal to `2^53 - 1`, the largest integer a double can hold exactly.
pub const MAX_SAFE_INTEGER: U256 = U256::from_limbs([9_007_199_254_740_991, 0, 0, 0]);

/// Outcome of a state-changing call accepted by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub hash: B256,
    /// Block the transaction was mined in, if it was awaited
    pub block_number: Option<u64>,
    /// Gas used, if the transaction was awaited
    pub gas_used: Option<u64>,
}

impl TxReceipt {
    /// Creates a receipt for a submitted but not yet awaited transaction
    pub fn submitted(hash: B256) -> Self {
        Self {
            hash,
            block_number: None,
            gas_used: None,
        }
    }

    /// Returns true once the transaction is known to be in a block
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }
}

impl fmt::Display for TxReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{} (block {})", self.hash, block),
            None => write!(f, "{} (pending)", self.hash),
        }
    }
}

/// Capability interface shared by every token kind.
///
/// Amounts are always [`U256`] in the token's smallest unit.
#[async_trait]
pub trait Token: Send + Sync {
    /// Registry symbol, e.g. "DAI"
    fn symbol(&self) -> &str;

    /// Registry version this handle was resolved to
    fn version(&self) -> u32;

    /// Decimal places recorded in the registry
    fn decimals(&self) -> u8;

    /// Returns the balance held by `owner`
    async fn balance_of(&self, owner: Address) -> Result<U256>;

    /// Returns how much `spender` may move out of `owner`'s balance
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;

    /// Authorizes `spender` to move up to `amount` from the sending account
    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt>;

    /// Authorizes `spender` for the maximum representable amount
    async fn approve_unlimited(&self, spender: Address) -> Result<TxReceipt> {
        self.approve(spender, U256::MAX).await
    }

    /// Moves `amount` from `from` to `to`
    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt>;
}

/// Parses a 42 character `0x` hex address.
pub fn parse_address(address: &str) -> Result<Address> {
    let trimmed = address.trim();
    if trimmed.len() != 42 || !(trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
        return Err(TokendError::InvalidAddress {
            address: address.to_string(),
            reason: "expected 0x followed by 40 hex characters".to_string(),
        });
    }
    Address::from_str(&trimmed[2..]).map_err(|e| TokendError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Converts a human decimal string ("1.5") into smallest units.
pub fn parse_amount(value: &str, decimals: u8) -> Result<U256> {
    if value.trim_start().starts_with('-') {
        return Err(TokendError::InvalidAmount(format!(
            "negative amount '{value}'"
        )));
    }
    let parsed = parse_units(value.trim(), decimals)
        .map_err(|e| TokendError::InvalidAmount(format!("'{value}': {e}")))?;
    Ok(parsed.get_absolute())
}

/// Renders smallest units as a human decimal string.
pub fn format_amount(value: U256, decimals: u8) -> Result<String> {
    format_units(value, decimals).map_err(|e| TokendError::InvalidAmount(e.to_string()))
}

/// Commonly used items.
pub mod prelude {
    pub use super::{format_amount, parse_address, parse_amount, Token, TxReceipt, MAX_SAFE_INTEGER};
    pub use alloy::primitives::{Address, B256, U256};
}

//! # tokend Testing Infrastructure
//!
//! Testing utilities for tokend:
//! - [`MockNode`], an in-process JSON-RPC node with scripted state
//! - Edge case addresses and amounts
//! - Property-based testing strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tokend_testing::*;
//!
//! let node = MockNode::start().await;
//! node.set_balance(DEFAULT_ACCOUNT, U256::from(10u64));
//!
//! let config = ServiceConfig::direct_rpc(node.url());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use alloy::primitives::{address, Address, U256};
use proptest::prelude::*;

mod node;

pub use node::{MockNode, MOCK_CHAIN_ID};

// ============================================================================
// Fixture Accounts
// ============================================================================

/// First account reported by a fresh [`MockNode`]; also anvil's first dev account
pub const DEFAULT_ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// A second funded account, used as recipient or spender
pub const SECOND_ACCOUNT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// A third account, used as spender in delegated transfers
pub const THIRD_ACCOUNT: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

// ============================================================================
// Edge Case Addresses
// ============================================================================

/// Edge case address strings for boundary parsing tests
pub struct EdgeCaseAddresses;

impl EdgeCaseAddresses {
    /// Checksummed valid address
    pub const VALID: &'static str = "0x742d35Cc6634C0532925a3b844Bc9e7595f5fFb9";

    /// Zero address
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// All-ones address
    pub const MAX: &'static str = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF";

    /// Malformed addresses
    pub fn invalid() -> Vec<&'static str> {
        vec![
            "",
            "0x",
            "0xGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG", // Invalid hex
            "0x742d35Cc6634C0532925a3b844Bc9e7595f5",     // Too short
            "742d35Cc6634C0532925a3b844Bc9e7595f5fFb9",   // Missing 0x
        ]
    }
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Edge case token amounts in smallest units
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// One token with 18 decimals
    pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

    /// Amounts spanning the interesting magnitudes, including values past 2^53
    pub fn boundary() -> Vec<U256> {
        vec![
            U256::ZERO,
            U256::from(1u64),
            U256::from((1u64 << 53) - 1),
            U256::from(1u64 << 53),
            U256::from(Self::ONE_TOKEN),
            U256::from(u128::MAX),
            U256::MAX,
        ]
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Generates arbitrary addresses
pub fn any_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

/// Generates arbitrary 256-bit amounts
pub fn any_amount() -> impl Strategy<Value = U256> {
    any::<[u64; 4]>().prop_map(U256::from_limbs)
}

/// Generates decimal amount strings with at most `decimals` fractional digits
pub fn decimal_amount(decimals: u8) -> impl Strategy<Value = (u64, String)> {
    let max_fraction = decimals.min(9) as u32;
    (0u64..1_000_000, 0u32..=max_fraction).prop_flat_map(move |(whole, digits)| {
        let bound = 10u64.pow(digits);
        (Just(whole), Just(digits), 0..bound.max(1)).prop_map(|(whole, digits, fraction)| {
            let text = if digits == 0 {
                whole.to_string()
            } else {
                format!("{whole}.{fraction:0width$}", width = digits as usize)
            };
            (whole, text)
        })
    })
}

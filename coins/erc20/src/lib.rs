//! tokend ERC-20 module
//!
//! This crate provides the ERC-20 side of tokend: the Solidity bindings in
//! [`abi`], the [`Erc20Token`] handle implementing [`tokend_traits::Token`],
//! and the versioned [`TokenRegistry`] that maps a symbol to its contract
//! deployments per network.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

pub mod abi;
pub mod registry;
pub mod symbols;
pub mod token;

pub use registry::{TokenInfo, TokenKind, TokenRegistry};
pub use token::Erc20Token;

/// Exposes commonly used types when working with ERC-20 tokens.
pub mod prelude {
    pub use super::registry::{TokenInfo, TokenKind, TokenRegistry};
    pub use super::symbols;
    pub use super::token::Erc20Token;
    pub use tokend_traits::Token;
}

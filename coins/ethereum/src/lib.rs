//! # tokend Ethereum Library
//!
//! A token-access facade over Ethereum-compatible chains. A [`TokenService`]
//! enumerates known tokens, resolves token contract versions, and hands out
//! [`TokenHandle`]s that read balances and allowances, approve spenders and
//! transfer value.
//!
//! This library uses the [alloy](https://github.com/alloy-rs/alloy) framework for Ethereum interactions.
//!
//! ## Quickstart Guide
//!
//! Build a service from a [`ServiceConfig`] preset, connect it, then resolve tokens by symbol.
//! ```no_run
//! use tokend_ethereum::prelude::*;
//!
//! # async fn tokens() -> tokend_ethereum::Result<()> {
//! let service = TokenService::new(ServiceConfig::remote(Network::Mainnet))?;
//! service.manager().connect().await?;
//!
//! for (symbol, versions) in service.get_token_versions()? {
//!     println!("{symbol}: {versions:?}");
//! }
//!
//! let mkr = service.get_token("MKR")?;
//! let owner = parse_address("0x0000000000000000000000000000000000000003")?;
//! let balance = mkr.balance_of(owner).await?;
//! println!("{} {}", format_amount(balance, mkr.decimals())?, mkr.symbol());
//! # Ok(())
//! # }
//! ```
//!
//! ### Local test chain
//! [`ServiceConfig::local_test_chain`] spawns an ephemeral anvil node on `connect()`
//! and sends from its first dev account.
//! ```no_run
//! # use tokend_ethereum::prelude::*;
//! # async fn local() -> tokend_ethereum::Result<()> {
//! let service = TokenService::new(ServiceConfig::local_test_chain())?;
//! service.manager().connect().await?;
//!
//! let eth = service.get_token("ETH")?;
//! let sender = service.manager().default_account().await?.ok_or(TokendError::MissingAccount)?;
//! let recipient = parse_address("0x0000000000000000000000000000000000000003")?;
//! eth.transfer(sender, recipient, parse_amount("0.0000000015", 18)?).await?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod handle;
pub use handle::TokenHandle;
mod native;
pub use native::NativeToken;
mod service;
pub use service::TokenService;
pub mod prelude;

pub use alloy;
pub use tokend_error::{Result, TokendError};
pub use tokend_erc20::{symbols, Erc20Token, TokenInfo, TokenKind, TokenRegistry};
pub use tokend_provider::{Backend, ConnectionManager, Network, ServiceConfig, TimeoutConfig};

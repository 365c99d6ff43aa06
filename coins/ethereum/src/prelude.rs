//! This prelude module simplifies importing many useful items from the tokend_ethereum crate using a glob import.
//!
//! To use this prelude, add the following to your code:
//! ```
//! use tokend_ethereum::prelude::*;
//! ```

pub use crate::{NativeToken, TokenHandle, TokenService, TokendError};

pub use tokend_erc20::{symbols, Erc20Token, TokenInfo, TokenKind, TokenRegistry};
pub use tokend_provider::{Backend, Network, ServiceConfig, TimeoutConfig};
pub use tokend_traits::{format_amount, parse_address, parse_amount, Token, TxReceipt, MAX_SAFE_INTEGER};
pub use alloy::primitives::{Address, B256, U256};

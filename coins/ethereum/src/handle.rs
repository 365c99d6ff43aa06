use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokend_erc20::{Erc20Token, TokenInfo, TokenKind};
use tokend_error::Result;
use tokend_provider::ConnectionManager;
use tokend_traits::{Token, TxReceipt};

use crate::native::NativeToken;

/// A resolved token version, either a contract token or the native asset.
#[derive(Debug, Clone)]
pub enum TokenHandle {
    /// ERC-20 contract token
    Erc20(Erc20Token),
    /// The chain's native asset
    Native(NativeToken),
}

impl TokenHandle {
    /// Builds the handle matching the entry's kind
    pub fn from_info(info: TokenInfo, manager: Arc<ConnectionManager>) -> Result<Self> {
        match info.kind {
            TokenKind::Native => Ok(Self::Native(NativeToken::new(info, manager)?)),
            TokenKind::Erc20 { .. } => Ok(Self::Erc20(Erc20Token::new(info, manager)?)),
        }
    }

    /// Registry entry this handle was resolved from
    pub fn info(&self) -> &TokenInfo {
        match self {
            Self::Erc20(token) => token.info(),
            Self::Native(token) => token.info(),
        }
    }

    /// Returns true for the native asset
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// The ERC-20 handle, if this is a contract token
    pub fn as_erc20(&self) -> Option<&Erc20Token> {
        match self {
            Self::Erc20(token) => Some(token),
            Self::Native(_) => None,
        }
    }

    /// The native handle, if this is the native asset
    pub fn as_native(&self) -> Option<&NativeToken> {
        match self {
            Self::Native(token) => Some(token),
            Self::Erc20(_) => None,
        }
    }
}

#[async_trait]
impl Token for TokenHandle {
    fn symbol(&self) -> &str {
        &self.info().symbol
    }

    fn version(&self) -> u32 {
        self.info().version
    }

    fn decimals(&self) -> u8 {
        self.info().decimals
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        match self {
            Self::Erc20(token) => token.balance_of(owner).await,
            Self::Native(token) => token.balance_of(owner).await,
        }
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        match self {
            Self::Erc20(token) => token.allowance(owner, spender).await,
            Self::Native(token) => token.allowance(owner, spender).await,
        }
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt> {
        match self {
            Self::Erc20(token) => token.approve(spender, amount).await,
            Self::Native(token) => token.approve(spender, amount).await,
        }
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        match self {
            Self::Erc20(token) => token.transfer(from, to, amount).await,
            Self::Native(token) => token.transfer(from, to, amount).await,
        }
    }
}

//! The chain's native asset as a token.

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tokend_erc20::TokenInfo;
use tokend_error::{Result, TokendError};
use tokend_provider::{ConnectionManager, RequestKind};
use tokend_traits::{Token, TxReceipt, MAX_SAFE_INTEGER};

/// Native ether behind the [`Token`] interface.
///
/// Balances are account balances. There is no approval mechanism, so the
/// allowance is always [`MAX_SAFE_INTEGER`] and `approve` is unsupported.
#[derive(Debug, Clone)]
pub struct NativeToken {
    info: TokenInfo,
    manager: Arc<ConnectionManager>,
}

impl NativeToken {
    /// Creates a handle for a native registry entry
    pub fn new(info: TokenInfo, manager: Arc<ConnectionManager>) -> Result<Self> {
        if !info.is_native() {
            return Err(TokendError::NotSupported(format!(
                "{} is not the native asset",
                info.symbol
            )));
        }
        Ok(Self { info, manager })
    }

    /// Registry entry this handle was resolved from
    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    /// Balance read with a raw `eth_getBalance` request
    pub async fn balance_of_raw(&self, owner: Address) -> Result<U256> {
        let connection = self.manager.connection().await?;
        connection
            .raw_request("eth_getBalance", (owner, "latest"), RequestKind::Read)
            .await
    }

    /// Value transfer submitted with a raw `eth_sendTransaction` request
    pub async fn transfer_raw(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        let connection = self.manager.connection().await?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(amount);

        let hash: B256 = connection
            .raw_request("eth_sendTransaction", (tx,), RequestKind::Send)
            .await?;
        tracing::info!(%hash, %from, %to, %amount, "raw value transfer submitted");
        connection.confirm(hash).await
    }
}

#[async_trait]
impl Token for NativeToken {
    fn symbol(&self) -> &str {
        &self.info.symbol
    }

    fn version(&self) -> u32 {
        self.info.version
    }

    fn decimals(&self) -> u8 {
        self.info.decimals
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.manager.connection().await?.get_balance(owner).await
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256> {
        self.manager.connection().await?;
        Ok(MAX_SAFE_INTEGER)
    }

    async fn approve(&self, _spender: Address, _amount: U256) -> Result<TxReceipt> {
        Err(TokendError::NotSupported(format!(
            "{} has no approval mechanism",
            self.info.symbol
        )))
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        let connection = self.manager.connection().await?;
        tracing::debug!(%from, %to, %amount, "sending value transfer");
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(amount);
        connection.send_transaction(tx).await
    }
}

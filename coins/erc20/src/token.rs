//! ERC-20 token handle

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tokend_error::{Result, TokendError};
use tokend_provider::{Connection, ConnectionManager};
use tokend_traits::{Token, TxReceipt};

use crate::abi::IERC20;
use crate::registry::TokenInfo;

/// A resolved version of an ERC-20 token.
///
/// Holds no state beyond the registry entry; every call goes through the
/// manager's current connection.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    info: TokenInfo,
    address: Address,
    manager: Arc<ConnectionManager>,
}

impl Erc20Token {
    /// Creates a handle for a registry entry.
    ///
    /// Fails with `NotSupported` for native entries.
    pub fn new(info: TokenInfo, manager: Arc<ConnectionManager>) -> Result<Self> {
        let address = info.contract_address().ok_or_else(|| {
            TokendError::NotSupported(format!("{} is not an ERC-20 contract", info.symbol))
        })?;
        Ok(Self {
            info,
            address,
            manager,
        })
    }

    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Registry entry this handle was resolved from
    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    /// Decimals reported by the contract itself
    pub async fn onchain_decimals(&self) -> Result<u8> {
        self.call(IERC20::decimalsCall {}).await
    }

    /// Total supply reported by the contract
    pub async fn total_supply(&self) -> Result<U256> {
        self.call(IERC20::totalSupplyCall {}).await
    }

    /// Symbol reported by the contract
    pub async fn onchain_symbol(&self) -> Result<String> {
        self.call(IERC20::symbolCall {}).await
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let connection = self.manager.connection().await?;
        let result = connection
            .call(self.address, call.abi_encode().into())
            .await?;

        C::abi_decode_returns(&result).map_err(|e| {
            TokendError::AbiError(format!(
                "{}.{} returned undecodable data: {e}",
                self.info.symbol,
                C::SIGNATURE
            ))
        })
    }

    async fn send<C: SolCall>(&self, connection: &Connection, from: Address, call: C) -> Result<TxReceipt> {
        tracing::debug!(
            token = %self.info.symbol,
            version = self.info.version,
            contract = %self.address,
            %from,
            function = C::SIGNATURE,
            "sending contract call"
        );
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_input(call.abi_encode());
        connection.send_transaction(tx).await
    }
}

#[async_trait]
impl Token for Erc20Token {
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
        self.call(IERC20::balanceOfCall { account: owner }).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.call(IERC20::allowanceCall { owner, spender }).await
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt> {
        let connection = self.manager.connection().await?;
        let sender = connection.sender()?;
        self.send(&connection, sender, IERC20::approveCall { spender, amount })
            .await
    }

    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        let connection = self.manager.connection().await?;
        let sender = connection.sender()?;
        if from == sender {
            self.send(&connection, sender, IERC20::transferCall { to, amount })
                .await
        } else {
            // Moving a third party's tokens spends the sender's allowance.
            self.send(&connection, sender, IERC20::transferFromCall { from, to, amount })
                .await
        }
    }
}

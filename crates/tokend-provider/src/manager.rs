//! Connection lifecycle: one provider per service, established by `connect()`.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::json_rpc::{RpcRecv, RpcSend};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use tokend_error::{Result, TokendError};
use tokend_traits::TxReceipt;
use tokio::sync::RwLock;
use url::Url;

use crate::classify::{classify, RequestKind};
use crate::config::{Backend, ServiceConfig, TimeoutConfig};
use crate::timeout::with_timeout;

/// An established connection. Shared by every handle resolved while it is open.
pub struct Connection {
    provider: DynProvider,
    endpoint: String,
    chain_id: u64,
    default_account: Option<Address>,
    timeouts: TimeoutConfig,
    confirmations: u64,
    // Keeps a spawned test node alive for as long as the connection is.
    _node: Option<AnvilInstance>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id)
            .field("default_account", &self.default_account)
            .field("spawned_node", &self._node.is_some())
            .finish()
    }
}

impl Connection {
    /// The underlying alloy provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Endpoint URL this connection dialed
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Chain id reported by the node at connect time
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Account used for state-changing calls, if any
    pub fn default_account(&self) -> Option<Address> {
        self.default_account
    }

    /// Returns the sending account or [`TokendError::MissingAccount`]
    pub fn sender(&self) -> Result<Address> {
        self.default_account.ok_or(TokendError::MissingAccount)
    }

    /// Native balance of `owner` at the latest block
    pub async fn get_balance(&self, owner: Address) -> Result<U256> {
        tracing::debug!(%owner, "eth_getBalance");
        self.read("eth_getBalance", async { self.provider.get_balance(owner).await })
            .await
    }

    /// Executes a read-only contract call
    pub async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        tracing::debug!(%to, selector = %hex_selector(&input), "eth_call");
        let tx = TransactionRequest::default().with_to(to).with_input(input);
        self.read("eth_call", async { self.provider.call(tx).await }).await
    }

    /// Sends a JSON-RPC request as is, bypassing the typed provider methods
    pub async fn raw_request<P, R>(&self, method: &'static str, params: P, kind: RequestKind) -> Result<R>
    where
        P: RpcSend,
        R: RpcRecv,
    {
        tracing::debug!(method, "raw request");
        let fut = async {
            self.provider
                .raw_request::<P, R>(Cow::Borrowed(method), params)
                .await
        };
        with_timeout(self.timeouts.request, method, fut)
            .await?
            .map_err(|e| classify(method, kind, e))
    }

    /// Submits a transaction from a node-managed account and waits for the
    /// configured confirmation depth.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxReceipt> {
        let method = "eth_sendTransaction";
        let fut = async { self.provider.send_transaction(tx).await };
        let pending = with_timeout(self.timeouts.request, method, fut)
            .await?
            .map_err(|e| classify(method, RequestKind::Send, e))?;

        let hash = *pending.tx_hash();
        tracing::info!(%hash, "transaction submitted");
        self.confirm(hash).await
    }

    /// Waits for `hash` per the confirmation policy.
    ///
    /// A mined transaction with a failed status is reported as
    /// [`TokendError::TransactionReverted`]. When the receipt cannot be observed
    /// (timeout or a failing poll) the error is [`TokendError::TransactionPending`]
    /// carrying `hash`.
    pub async fn confirm(&self, hash: B256) -> Result<TxReceipt> {
        if self.confirmations == 0 {
            return Ok(TxReceipt::submitted(hash));
        }

        let receipt = with_timeout(self.timeouts.receipt, "eth_getTransactionReceipt", self.await_mined(hash))
            .await
            .and_then(|mined| mined)
            .map_err(|e| {
                tracing::warn!(%hash, error = %e, "transaction outcome unknown");
                TokendError::TransactionPending {
                    hash: hash.to_string(),
                    reason: e.to_string(),
                }
            })?;

        if !receipt.status() {
            tracing::warn!(%hash, block = ?receipt.block_number, "transaction reverted");
            return Err(TokendError::TransactionReverted(format!(
                "transaction {hash} failed in block {}",
                receipt.block_number.unwrap_or_default()
            )));
        }

        tracing::info!(%hash, block = ?receipt.block_number, gas_used = receipt.gas_used, "transaction mined");
        Ok(TxReceipt {
            hash,
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
        })
    }

    async fn await_mined(&self, hash: B256) -> Result<TransactionReceipt> {
        let receipt = loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => break receipt,
                Ok(None) => tokio::time::sleep(self.timeouts.poll_interval).await,
                Err(e) => return Err(classify("eth_getTransactionReceipt", RequestKind::Read, e)),
            }
        };

        if let (Some(mined), true) = (receipt.block_number, self.confirmations > 1) {
            let target = mined + self.confirmations - 1;
            loop {
                let head = self
                    .provider
                    .get_block_number()
                    .await
                    .map_err(|e| classify("eth_blockNumber", RequestKind::Read, e))?;
                if head >= target {
                    break;
                }
                tokio::time::sleep(self.timeouts.poll_interval).await;
            }
        }

        Ok(receipt)
    }

    async fn read<T>(
        &self,
        method: &'static str,
        fut: impl std::future::Future<Output = alloy::transports::TransportResult<T>>,
    ) -> Result<T> {
        with_timeout(self.timeouts.request, method, fut)
            .await?
            .map_err(|e| classify(method, RequestKind::Read, e))
    }
}

fn hex_selector(input: &Bytes) -> String {
    input
        .get(..4)
        .map(|s| format!("0x{}", alloy::primitives::hex::encode(s)))
        .unwrap_or_else(|| "0x".to_string())
}

/// Owns the single network connection of a token service.
///
/// `connect()` must complete before any dependent call; it is serialized and
/// idempotent. `disconnect()` drops the connection (and a spawned node).
#[derive(Debug)]
pub struct ConnectionManager {
    config: ServiceConfig,
    state: RwLock<Option<Arc<Connection>>>,
    connected: AtomicBool,
}

impl ConnectionManager {
    /// Creates a disconnected manager
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns true once `connect()` has completed and until `disconnect()`
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Establishes connectivity.
    ///
    /// Fails with [`TokendError::Connection`] when the endpoint is unreachable or
    /// misconfigured and with [`TokendError::ChainIdMismatch`] when the node serves
    /// another chain than the configured network.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_some() {
            tracing::debug!("already connected");
            return Ok(());
        }

        if let Some(url) = &self.config.endpoint {
            Url::parse(url).map_err(|e| TokendError::Connection {
                url: url.clone(),
                reason: format!("invalid URL: {e}"),
            })?;
        }
        self.config.validate()?;
        let connection = self.establish().await?;
        tracing::info!(
            backend = %self.config.backend,
            network = %self.config.network,
            endpoint = %connection.endpoint,
            chain_id = connection.chain_id,
            account = ?connection.default_account,
            "connected"
        );

        *state = Some(Arc::new(connection));
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    /// Drops the connection; later operations fail with `NotConnected`
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if let Some(previous) = state.take() {
            self.connected.store(false, Ordering::Release);
            tracing::info!(endpoint = %previous.endpoint, "disconnected");
        }
    }

    /// The open connection, or [`TokendError::NotConnected`]
    pub async fn connection(&self) -> Result<Arc<Connection>> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(TokendError::NotConnected)
    }

    /// Chain id of the open connection
    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.connection().await?.chain_id())
    }

    /// Sending account of the open connection
    pub async fn default_account(&self) -> Result<Option<Address>> {
        Ok(self.connection().await?.default_account())
    }

    /// Endpoint of the open connection
    pub async fn endpoint(&self) -> Result<String> {
        Ok(self.connection().await?.endpoint().to_string())
    }

    async fn establish(&self) -> Result<Connection> {
        let (endpoint, node) = match self.config.resolved_endpoint() {
            Some(url) => (url, None),
            None => {
                let node = spawn_test_node().await?;
                (node.endpoint(), Some(node))
            }
        };

        let connection_error = |reason: String| TokendError::Connection {
            url: endpoint.clone(),
            reason,
        };

        let provider = DynProvider::new(
            ProviderBuilder::new()
                .disable_recommended_fillers()
                .connect_http(
                    endpoint
                        .parse()
                        .map_err(|e| connection_error(format!("invalid URL: {e}")))?,
                ),
        );

        let chain_id = with_timeout(self.config.timeouts.connect, "eth_chainId", async {
            provider.get_chain_id().await
        })
        .await
        .map_err(|e| connection_error(e.to_string()))?
        .map_err(|e| connection_error(e.to_string()))?;

        if let Some(expected) = self.config.network.expected_chain_id() {
            if expected != chain_id {
                return Err(TokendError::ChainIdMismatch {
                    expected,
                    got: chain_id,
                });
            }
        }

        let default_account = match (self.config.account, &node) {
            (Some(account), _) => Some(account),
            (None, Some(node)) => node.addresses().first().copied(),
            (None, None) if self.config.backend == Backend::RemoteNode => None,
            (None, None) => self.first_node_account(&provider).await,
        };

        Ok(Connection {
            provider,
            endpoint,
            chain_id,
            default_account,
            timeouts: self.config.timeouts,
            confirmations: self.config.confirmations,
            _node: node,
        })
    }

    async fn first_node_account(&self, provider: &DynProvider) -> Option<Address> {
        let accounts = with_timeout(self.config.timeouts.request, "eth_accounts", async {
            provider.get_accounts().await
        })
        .await;

        match accounts {
            Ok(Ok(accounts)) => accounts.first().copied(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "node exposes no accounts");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "eth_accounts timed out");
                None
            }
        }
    }
}

async fn spawn_test_node() -> Result<AnvilInstance> {
    let node_error = |reason: String| TokendError::Connection {
        url: "anvil".to_string(),
        reason,
    };

    let node = tokio::task::spawn_blocking(|| Anvil::new().try_spawn())
        .await
        .map_err(|e| node_error(e.to_string()))?
        .map_err(|e| node_error(format!("failed to spawn anvil: {e}")))?;

    tracing::info!(endpoint = %node.endpoint(), chain_id = node.chain_id(), "spawned local test chain");
    Ok(node)
}

//! Service configuration: which backend to wire, which network it serves,
//! and the bounds applied to every request.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tokend_error::{ErrorContext, Result, TokendError};
use url::Url;

/// Default endpoint for a node running on the local machine
pub const LOCAL_RPC_URL: &str = "http://localhost:8545";

/// Network identity; selects the active address table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// Kovan public test network
    Kovan,
    /// Local or ephemeral development chain
    Test,
}

impl Network {
    /// All networks with built-in tables
    pub fn variants() -> &'static [Network] {
        &[Network::Mainnet, Network::Kovan, Network::Test]
    }

    /// Chain id the node must report, if fixed for this network
    pub fn expected_chain_id(&self) -> Option<u64> {
        match self {
            Self::Mainnet => Some(1),
            Self::Kovan => Some(42),
            Self::Test => None,
        }
    }

    /// Default public RPC endpoint
    pub fn default_rpc(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://eth.llamarpc.com",
            Self::Kovan => "https://kovan.poa.network",
            Self::Test => LOCAL_RPC_URL,
        }
    }

    /// Lowercase network name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Kovan => "kovan",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = TokendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "kovan" => Ok(Self::Kovan),
            "test" | "local" | "dev" => Ok(Self::Test),
            other => Err(TokendError::ConfigError(format!("unknown network '{other}'"))),
        }
    }
}

/// How the service reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// JSON-RPC against a configured node, with node-managed accounts
    DirectRpc,
    /// Publicly reachable node for the selected network
    RemoteNode,
    /// Local test chain; spawns an ephemeral anvil node when no endpoint is set
    LocalTestChain,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectRpc => f.write_str("direct_rpc"),
            Self::RemoteNode => f.write_str("remote_node"),
            Self::LocalTestChain => f.write_str("local_test_chain"),
        }
    }
}

impl FromStr for Backend {
    type Err = TokendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "direct_rpc" | "rpc" => Ok(Self::DirectRpc),
            "remote" | "remote_node" => Ok(Self::RemoteNode),
            "local" | "test" | "local_test_chain" => Ok(Self::LocalTestChain),
            other => Err(TokendError::ConfigError(format!("unknown backend '{other}'"))),
        }
    }
}

/// Timeouts applied to connection setup, single requests and receipt waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Bound on `connect()`
    pub connect: Duration,
    /// Bound on a single JSON-RPC request
    pub request: Duration,
    /// Bound on waiting for a transaction receipt
    pub receipt: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
            receipt: Duration::from_secs(120),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl TimeoutConfig {
    /// Fast timeouts for local/low-latency connections
    pub fn fast() -> Self {
        Self {
            connect: Duration::from_secs(2),
            request: Duration::from_secs(5),
            receipt: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Set request timeout
    pub fn with_request(mut self, timeout: Duration) -> Self {
        self.request = timeout;
        self
    }

    /// Set connection timeout
    pub fn with_connect(mut self, timeout: Duration) -> Self {
        self.connect = timeout;
        self
    }

    /// Set receipt timeout
    pub fn with_receipt(mut self, timeout: Duration) -> Self {
        self.receipt = timeout;
        self
    }

    /// Set receipt poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Configuration consumed by the connection manager and the token service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backend wiring
    pub backend: Backend,
    /// Network whose address table is active
    pub network: Network,
    /// Explicit endpoint; backends fall back to their defaults when unset
    pub endpoint: Option<String>,
    /// Request bounds
    pub timeouts: TimeoutConfig,
    /// Blocks to wait for after submitting; 0 returns on submission
    pub confirmations: u64,
    /// Sending account; defaults to the node's first account
    pub account: Option<Address>,
}

impl ServiceConfig {
    /// Creates a configuration for the given backend and network
    pub fn new(backend: Backend, network: Network) -> Self {
        Self {
            backend,
            network,
            endpoint: None,
            timeouts: TimeoutConfig::default(),
            confirmations: 1,
            account: None,
        }
    }

    /// Direct JSON-RPC to `url`, used for contract calls and transactions
    pub fn direct_rpc(url: impl Into<String>) -> Self {
        Self::new(Backend::DirectRpc, Network::Test).with_endpoint(url)
    }

    /// Public node of `network`; version history reflects real deployments
    pub fn remote(network: Network) -> Self {
        Self::new(Backend::RemoteNode, network)
    }

    /// Ephemeral local chain with deterministic, zeroed state
    pub fn local_test_chain() -> Self {
        Self::new(Backend::LocalTestChain, Network::Test).with_timeouts(TimeoutConfig::fast())
    }

    /// Sets the endpoint URL
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the network
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Sets all timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = timeout;
        self
    }

    /// Sets the confirmation depth
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Sets the sending account
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    /// Endpoint the backend will dial, or `None` when a local node is spawned
    pub fn resolved_endpoint(&self) -> Option<String> {
        match (self.backend, &self.endpoint) {
            (_, Some(url)) => Some(url.clone()),
            (Backend::DirectRpc, None) => Some(LOCAL_RPC_URL.to_string()),
            (Backend::RemoteNode, None) => Some(self.network.default_rpc().to_string()),
            (Backend::LocalTestChain, None) => None,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.endpoint {
            Url::parse(url).map_err(|e| TokendError::ConfigError(format!("invalid endpoint '{url}': {e}")))?;
        }
        if self.backend == Backend::LocalTestChain && self.network != Network::Test {
            return Err(TokendError::ConfigError(format!(
                "local test chain cannot serve network {}",
                self.network
            )));
        }
        if self.timeouts.request.is_zero() || self.timeouts.connect.is_zero() {
            return Err(TokendError::ConfigError("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    /// Reads the configuration from `TOKEND_*` environment variables.
    ///
    /// - `TOKEND_BACKEND`: `direct`, `remote` or `local` (required)
    /// - `TOKEND_NETWORK`: `mainnet`, `kovan` or `test` (default `test`)
    /// - `TOKEND_RPC_URL`: endpoint override
    /// - `TOKEND_TIMEOUT_SECS`: request timeout
    /// - `TOKEND_CONFIRMATIONS`: confirmation depth
    /// - `TOKEND_ACCOUNT`: sending account
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend: Backend = get("TOKEND_BACKEND").context("TOKEND_BACKEND not set")?.parse()?;
        let network = match get("TOKEND_NETWORK") {
            Some(value) => value.parse()?,
            None => Network::Test,
        };

        let mut config = Self::new(backend, network);
        if let Some(url) = get("TOKEND_RPC_URL") {
            config = config.with_endpoint(url);
        }
        if let Some(secs) = get("TOKEND_TIMEOUT_SECS") {
            config = config.with_request_timeout(Duration::from_secs(secs.trim().parse()?));
        }
        if let Some(depth) = get("TOKEND_CONFIRMATIONS") {
            config = config.with_confirmations(depth.trim().parse()?);
        }
        if let Some(account) = get("TOKEND_ACCOUNT") {
            config = config.with_account(tokend_traits::parse_address(&account)?);
        }

        config.validate()?;
        Ok(config)
    }
}

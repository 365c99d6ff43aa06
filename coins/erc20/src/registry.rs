//! Versioned token registry
//!
//! Maps a token symbol to its ordered contract versions, partitioned by network.
//! Lookups are pure and never touch the network.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokend_error::{Result, TokendError};
use tokend_provider::Network;

use crate::symbols::{DAI, ETH, MKR, PETH, WETH};

/// How a token is reached on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenKind {
    /// The chain's native asset; balances are account balances
    Native,
    /// An ERC-20 contract
    Erc20 {
        /// Contract address
        address: Address,
    },
}

/// One registered version of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token symbol (e.g., "MKR")
    pub symbol: String,
    /// Version, starting at 1
    pub version: u32,
    /// Decimal places
    pub decimals: u8,
    /// Native asset or contract
    #[serde(flatten)]
    pub kind: TokenKind,
}

impl TokenInfo {
    /// Create an ERC-20 token entry
    pub fn erc20(symbol: &str, version: u32, decimals: u8, address: Address) -> Self {
        Self {
            symbol: symbol.to_string(),
            version,
            decimals,
            kind: TokenKind::Erc20 { address },
        }
    }

    /// Create a native asset entry
    pub fn native(symbol: &str, version: u32, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            version,
            decimals,
            kind: TokenKind::Native,
        }
    }

    /// Contract address, `None` for the native asset
    pub fn contract_address(&self) -> Option<Address> {
        match self.kind {
            TokenKind::Erc20 { address } => Some(address),
            TokenKind::Native => None,
        }
    }

    /// Returns true for the native asset
    pub fn is_native(&self) -> bool {
        self.kind == TokenKind::Native
    }
}

type Versions = BTreeMap<u32, TokenInfo>;

/// Token tables per network
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tables: HashMap<Network, BTreeMap<String, Versions>>,
}

impl TokenRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Create registry with the built-in tables for every network
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.load_defaults();
        registry
    }

    /// Load registry tables from JSON keyed by network name:
    ///
    /// ```json
    /// { "mainnet": [ { "symbol": "DAI", "version": 1, "decimals": 18,
    ///                  "type": "erc20", "address": "0x..." } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: HashMap<Network, Vec<TokenInfo>> = serde_json::from_str(json)
            .map_err(|e| TokendError::RegistryError(format!("invalid registry JSON: {e}")))?;

        let mut registry = Self::new();
        for (network, tokens) in tables {
            for token in tokens {
                registry.add_token(network, token)?;
            }
        }
        Ok(registry)
    }

    /// Load the built-in tables
    pub fn load_defaults(&mut self) {
        for (network, tokens) in default_tables() {
            for token in tokens {
                // Built-in tables have unique (symbol, version) pairs.
                let _ = self.add_token(network, token);
            }
        }
    }

    /// Register one token version.
    ///
    /// Fails when the version is 0 or the (symbol, version) pair is taken.
    pub fn add_token(&mut self, network: Network, token: TokenInfo) -> Result<()> {
        if token.version == 0 {
            return Err(TokendError::RegistryError(format!(
                "{} version must start at 1",
                token.symbol
            )));
        }
        if token.symbol.is_empty() {
            return Err(TokendError::RegistryError("empty token symbol".into()));
        }

        let versions = self
            .tables
            .entry(network)
            .or_default()
            .entry(token.symbol.clone())
            .or_default();
        if versions.contains_key(&token.version) {
            return Err(TokendError::RegistryError(format!(
                "{} v{} already registered on {network}",
                token.symbol, token.version
            )));
        }
        versions.insert(token.version, token);
        Ok(())
    }

    /// Symbols known on `network`, ascending
    pub fn tokens(&self, network: Network) -> Vec<String> {
        self.tables
            .get(&network)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every symbol on `network` with its ascending versions
    pub fn token_versions(&self, network: Network) -> BTreeMap<String, Vec<u32>> {
        self.tables
            .get(&network)
            .map(|table| {
                table
                    .iter()
                    .map(|(symbol, versions)| (symbol.clone(), versions.keys().copied().collect()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves `symbol` to the given version, or to the latest one when `version` is `None`
    pub fn resolve(&self, network: Network, symbol: &str, version: Option<u32>) -> Result<&TokenInfo> {
        let versions = self
            .tables
            .get(&network)
            .and_then(|table| table.get(symbol))
            .ok_or_else(|| TokendError::UnknownToken {
                symbol: symbol.to_string(),
                network: network.to_string(),
            })?;

        let found = match version {
            Some(version) => versions.get(&version),
            None => versions.values().next_back(),
        };
        found.ok_or_else(|| TokendError::UnknownTokenVersion {
            symbol: symbol.to_string(),
            version: version.unwrap_or_default(),
        })
    }

    /// Returns true if `symbol` has at least one version on `network`
    pub fn contains(&self, network: Network, symbol: &str) -> bool {
        self.tables
            .get(&network)
            .is_some_and(|table| table.contains_key(symbol))
    }

    /// Number of symbols registered on `network`
    pub fn token_count(&self, network: Network) -> usize {
        self.tables.get(&network).map(|t| t.len()).unwrap_or(0)
    }
}

fn default_tables() -> Vec<(Network, Vec<TokenInfo>)> {
    vec![
        (
            Network::Mainnet,
            vec![
                TokenInfo::native(ETH, 1, 18),
                TokenInfo::erc20(DAI, 1, 18, address!("89d24A6b4CcB1B6fAA2625fE562bDD9a23260359")),
                TokenInfo::erc20(MKR, 1, 18, address!("C66eA802717bFb9833400264Dd12c2bCeAa34a6d")),
                TokenInfo::erc20(MKR, 2, 18, address!("9f8F72aA9304c8B593d555F12eF6589cC3A579A2")),
                TokenInfo::erc20(WETH, 1, 18, address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
                TokenInfo::erc20(PETH, 1, 18, address!("f53AD2c6851052A81B42133467480961B2321C09")),
            ],
        ),
        (
            Network::Kovan,
            vec![
                TokenInfo::native(ETH, 1, 18),
                TokenInfo::erc20(DAI, 1, 18, address!("C4375B7De8af5a38a93548eb8453a498222C4fF2")),
                TokenInfo::erc20(MKR, 1, 18, address!("4bb514a7f83fbb13c2b41448208e89fabbcfe2fb")),
                TokenInfo::erc20(MKR, 2, 18, address!("aaf64bfcc32d0f15873a02163e7e500671a4ffcd")),
                TokenInfo::erc20(WETH, 1, 18, address!("d0a1e359811322d97991e03f863a0c30c2cf029c")),
                TokenInfo::erc20(PETH, 1, 18, address!("f4d791139ce033ad35db2b2201435fad668b1b64")),
            ],
        ),
        (
            // Deterministic addresses of the first deployments from anvil's first dev account.
            Network::Test,
            vec![
                TokenInfo::native(ETH, 1, 18),
                TokenInfo::erc20(DAI, 1, 18, address!("5FbDB2315678afecb367f032d93F642f64180aa3")),
                TokenInfo::erc20(MKR, 1, 18, address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512")),
                TokenInfo::erc20(MKR, 2, 18, address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0")),
                TokenInfo::erc20(WETH, 1, 18, address!("Cf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9")),
                TokenInfo::erc20(PETH, 1, 18, address!("Dc64a140Aa3E981100a9becA4E685f962f0cF6C9")),
            ],
        ),
    ]
}

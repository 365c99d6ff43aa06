//! The token service facade.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokend_erc20::TokenRegistry;
use tokend_error::{Result, TokendError};
use tokend_provider::{ConnectionManager, Network, ServiceConfig};

use crate::handle::TokenHandle;

/// Entry point: owns the connection manager and resolves symbols into handles.
///
/// The service is bound to the network of its configuration for its whole
/// lifetime. Registry views require a connected manager; resolving a handle
/// does not, but every operation on the handle does.
#[derive(Debug)]
pub struct TokenService {
    config: ServiceConfig,
    registry: TokenRegistry,
    manager: Arc<ConnectionManager>,
}

impl TokenService {
    /// Creates a service over the built-in token tables
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_registry(config, TokenRegistry::with_defaults())
    }

    /// Creates a service over custom token tables
    pub fn with_registry(config: ServiceConfig, registry: TokenRegistry) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            backend = %config.backend,
            network = %config.network,
            tokens = registry.token_count(config.network),
            "token service created"
        );

        Ok(Self {
            manager: Arc::new(ConnectionManager::new(config.clone())),
            registry,
            config,
        })
    }

    /// The connection manager; call `connect()` on it before using handles
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Network this service is bound to
    pub fn network(&self) -> Network {
        self.config.network
    }

    /// Configuration this service was built from
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Token tables
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Symbols known on the bound network, ascending
    pub fn get_tokens(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.registry.tokens(self.network()))
    }

    /// Every symbol on the bound network with its ascending versions
    pub fn get_token_versions(&self) -> Result<BTreeMap<String, Vec<u32>>> {
        self.ensure_connected()?;
        Ok(self.registry.token_versions(self.network()))
    }

    /// Resolves the latest version of `symbol`
    pub fn get_token(&self, symbol: &str) -> Result<TokenHandle> {
        self.resolve(symbol, None)
    }

    /// Resolves a specific version of `symbol`
    pub fn get_token_version(&self, symbol: &str, version: u32) -> Result<TokenHandle> {
        self.resolve(symbol, Some(version))
    }

    fn resolve(&self, symbol: &str, version: Option<u32>) -> Result<TokenHandle> {
        let info = self.registry.resolve(self.network(), symbol, version)?;
        tracing::debug!(
            symbol,
            version = info.version,
            address = ?info.contract_address(),
            "resolved token"
        );
        TokenHandle::from_info(info.clone(), Arc::clone(&self.manager))
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.manager.is_connected() {
            Ok(())
        } else {
            Err(TokendError::NotConnected)
        }
    }
}

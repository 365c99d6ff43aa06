//! Symbols of the built-in tokens.

/// Native asset
pub const ETH: &str = "ETH";
/// Dai stablecoin (single-collateral)
pub const DAI: &str = "DAI";
/// Maker governance token
pub const MKR: &str = "MKR";
/// Wrapped ether
pub const WETH: &str = "WETH";
/// Pooled ether
pub const PETH: &str = "PETH";

/// Every built-in symbol, in ascending order
pub const ALL: [&str; 5] = [DAI, ETH, MKR, PETH, WETH];

//! Composite keys for multi-instance resources.
//!
//! Balances, chain info, address lists and transaction histories are cached
//! per key. The key string is the only structural invariant: two requests
//! that build the same key share one cache slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used in balance keys when no token contract is given.
pub const NATIVE_TOKEN: &str = "native";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// `{blockchain}-{network}-{tokenAddress|native}`
    pub fn balance(blockchain: &str, network: &str, token_address: Option<&str>) -> Self {
        let token = token_address
            .filter(|t| !t.is_empty())
            .unwrap_or(NATIVE_TOKEN);
        Self(format!("{blockchain}-{network}-{token}"))
    }

    /// `{blockchain}-{network}`
    pub fn chain(blockchain: &str, network: &str) -> Self {
        Self(format!("{blockchain}-{network}"))
    }

    /// `{address}-{blockchain}-{network}`
    pub fn history(address: &str, blockchain: &str, network: &str) -> Self {
        Self(format!("{address}-{blockchain}-{network}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_balance_key() {
        let key = ResourceKey::balance("ethereum", "goerli", None);
        assert_eq!(key.as_str(), "ethereum-goerli-native");
    }

    #[test]
    fn empty_token_address_is_native() {
        assert_eq!(
            ResourceKey::balance("ethereum", "goerli", Some("")),
            ResourceKey::balance("ethereum", "goerli", None)
        );
    }

    #[test]
    fn token_balance_key_differs_from_native() {
        let token = ResourceKey::balance("ethereum", "mainnet", Some("0xdac17f958d2ee523a2206206994597c13d831ec7"));
        assert_eq!(
            token.as_str(),
            "ethereum-mainnet-0xdac17f958d2ee523a2206206994597c13d831ec7"
        );
        assert_ne!(token, ResourceKey::balance("ethereum", "mainnet", None));
    }

    #[test]
    fn chain_and_history_keys() {
        assert_eq!(ResourceKey::chain("polygon", "mainnet").as_str(), "polygon-mainnet");
        assert_eq!(
            ResourceKey::history("0xabc", "bsc", "testnet").to_string(),
            "0xabc-bsc-testnet"
        );
    }
}

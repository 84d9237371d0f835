//! Endpoint paths for the two gateway API flavours.
//!
//! `V1` is the versioned API under `/v1`; `Legacy` is the older unversioned
//! layout whose auth endpoints use different names.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    #[default]
    V1,
    Legacy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Authenticate,
    Register,
    Refresh,
    Balance,
    Addresses,
    Send,
    Transactions,
    BlockchainInfo,
    Health,
    Portfolio,
    Notifications,
    BillingInfo,
    BillingUpgrade,
    Templates,
    Scripts,
}

/// Default page size of the legacy transaction history endpoint.
pub const LEGACY_HISTORY_LIMIT: u32 = 20;

impl ApiFlavor {
    pub fn path(self, endpoint: Endpoint) -> &'static str {
        use Endpoint::*;
        match (self, endpoint) {
            (Self::V1, Authenticate) => "/v1/auth/authenticate",
            (Self::V1, Register) => "/v1/auth/register",
            (Self::V1, Refresh) => "/v1/auth/refresh",
            (Self::V1, Balance) => "/v1/wallet/balance",
            (Self::V1, Addresses) => "/v1/wallet/addresses",
            (Self::V1, Send) => "/v1/wallet/send",
            (Self::V1, Transactions) => "/v1/wallet/transactions",
            (Self::V1, BlockchainInfo) => "/v1/blockchain/info",
            (Self::V1, Health) => "/v1/health",
            (Self::V1, Portfolio) => "/v1/analytics/portfolio",
            (Self::V1, Notifications) => "/v1/notifications",
            (Self::V1, BillingInfo) => "/v1/billing/info",
            (Self::V1, BillingUpgrade) => "/v1/billing/upgrade",
            (Self::V1, Templates) => "/v1/templates",
            (Self::V1, Scripts) => "/v1/scripts",
            (Self::Legacy, Authenticate) => "/auth/login",
            (Self::Legacy, Register) => "/auth/register",
            (Self::Legacy, Refresh) => "/auth/refresh",
            (Self::Legacy, Balance) => "/wallet/balance",
            (Self::Legacy, Addresses) => "/wallet/addresses",
            (Self::Legacy, Send) => "/wallet/send",
            (Self::Legacy, Transactions) => "/wallet/transactions",
            (Self::Legacy, BlockchainInfo) => "/blockchain/info",
            (Self::Legacy, Health) => "/health",
            (Self::Legacy, Portfolio) => "/analytics/portfolio",
            (Self::Legacy, Notifications) => "/notifications",
            (Self::Legacy, BillingInfo) => "/billing/info",
            (Self::Legacy, BillingUpgrade) => "/billing/upgrade",
            (Self::Legacy, Templates) => "/templates",
            (Self::Legacy, Scripts) => "/scripts",
        }
    }

    /// Query parameter carrying the token contract address.
    pub fn token_param(self) -> &'static str {
        match self {
            Self::V1 => "tokenAddress",
            Self::Legacy => "token_address",
        }
    }

    /// Path of one item under a collection endpoint, e.g. `/v1/scripts/s1`.
    pub fn item_path(self, collection: Endpoint, id: &str) -> String {
        format!("{}/{id}", self.path(collection))
    }

    /// Path of an action on one item, e.g. `/v1/templates/t1/install`.
    pub fn item_action_path(self, collection: Endpoint, id: &str, action: &str) -> String {
        format!("{}/{action}", self.item_path(collection, id))
    }

    pub fn notification_read_path(self, id: &str) -> String {
        self.item_action_path(Endpoint::Notifications, id, "read")
    }

    pub fn notifications_read_all_path(self) -> String {
        format!("{}/read-all", self.path(Endpoint::Notifications))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::Legacy => "legacy",
        }
    }
}

impl FromStr for ApiFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown API flavor: {other} (expected v1 or legacy)")),
        }
    }
}

//! Wallet state: balances, addresses, histories and the rest of what the
//! gateway serves, each cached as a [`RequestState`].

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

use phillet_gateway::{GatewayClient, GatewayError};
use phillet_types::{
    BalanceDisplay, BlockchainInfoRequest, BlockchainInfoResponse, CreateAddressRequest,
    CreateAddressResponse, HealthResponse, PortfolioAnalytics, ResourceKey,
    SendTransactionRequest, SendTransactionResponse, TransactionHistoryRequest,
    TransactionHistoryResponse, WalletAddressesRequest, WalletAddressesResponse,
    WalletBalanceRequest, WalletBalanceResponse,
};

use crate::error::StoreError;
use crate::event::{EventBus, EventListener, StoreEvent};
use crate::request_state::RequestState;
use crate::validation::validate_send;

/// Page size used when a submitted transaction triggers a history reload.
pub const HISTORY_REFRESH_LIMIT: u32 = 50;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WalletState {
    pub balances: HashMap<ResourceKey, RequestState<WalletBalanceResponse>>,
    pub blockchain_info: HashMap<ResourceKey, RequestState<BlockchainInfoResponse>>,
    pub addresses: HashMap<ResourceKey, RequestState<WalletAddressesResponse>>,
    pub transactions: HashMap<ResourceKey, RequestState<TransactionHistoryResponse>>,
    pub last_submission: RequestState<SendTransactionResponse>,
    pub last_created_address: RequestState<CreateAddressResponse>,
    pub health: RequestState<HealthResponse>,
    pub portfolio: RequestState<PortfolioAnalytics>,
}

impl WalletState {
    fn clear_errors(&mut self) {
        self.balances.values_mut().for_each(RequestState::clear_error);
        self.blockchain_info.values_mut().for_each(RequestState::clear_error);
        self.addresses.values_mut().for_each(RequestState::clear_error);
        self.transactions.values_mut().for_each(RequestState::clear_error);
        self.last_submission.clear_error();
        self.last_created_address.clear_error();
        self.health.clear_error();
        self.portfolio.clear_error();
    }
}

pub struct WalletStore {
    client: Arc<GatewayClient>,
    events: Arc<EventBus>,
    state: watch::Sender<WalletState>,
}

/// Reloads dependent resources after wallet events.
struct DependentRefresh {
    store: Weak<WalletStore>,
}

#[async_trait]
impl EventListener for DependentRefresh {
    async fn on_event(&self, event: &StoreEvent) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        match event {
            StoreEvent::TransactionSubmitted {
                from_address,
                blockchain,
                network,
                ..
            } => {
                let request = TransactionHistoryRequest {
                    address: from_address.clone(),
                    blockchain: blockchain.clone(),
                    network: network.clone(),
                    limit: Some(HISTORY_REFRESH_LIMIT),
                    offset: Some(0),
                };
                if let Err(e) = store.get_transaction_history(request).await {
                    warn!(error = %e, "history refresh after send failed");
                }
            }
            StoreEvent::AddressCreated {
                blockchain,
                network,
                ..
            } => {
                let request = WalletAddressesRequest {
                    blockchain: blockchain.clone(),
                    network: network.clone(),
                };
                if let Err(e) = store.get_addresses(request).await {
                    warn!(error = %e, "address refresh after create failed");
                }
            }
            StoreEvent::LoggedOut => store.clear_all(),
        }
    }
}

impl WalletStore {
    /// Build the store and subscribe its dependent refreshes to `events`.
    pub fn new(client: Arc<GatewayClient>, events: Arc<EventBus>) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            events.subscribe(Arc::new(DependentRefresh {
                store: weak.clone(),
            }));
            let (state, _) = watch::channel(WalletState::default());
            Self {
                client,
                events,
                state,
            }
        })
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    /// Run `call`, mirroring its progress into the slot chosen by `slot`.
    /// Whichever call resolves last owns the slot's final value.
    async fn track<T, S, Fut>(&self, slot: S, call: Fut) -> Result<T, StoreError>
    where
        T: Clone,
        S: Fn(&mut WalletState) -> &mut RequestState<T>,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        self.state.send_modify(|s| slot(s).start());
        match call.await {
            Ok(data) => {
                let stored = data.clone();
                self.state.send_modify(|s| slot(s).succeed(stored));
                Ok(data)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| slot(s).fail(message));
                Err(e.into())
            }
        }
    }

    // ── Actions ────────────────────────────────────────────────────────

    pub async fn get_balance(
        &self,
        request: WalletBalanceRequest,
    ) -> Result<WalletBalanceResponse, StoreError> {
        let key = request.key();
        debug!(%key, "loading balance");
        self.track(
            |s| s.balances.entry(key.clone()).or_default(),
            self.client.get_balance(&request),
        )
        .await
    }

    pub async fn get_blockchain_info(
        &self,
        request: BlockchainInfoRequest,
    ) -> Result<BlockchainInfoResponse, StoreError> {
        let key = request.key();
        self.track(
            |s| s.blockchain_info.entry(key.clone()).or_default(),
            self.client.get_blockchain_info(&request),
        )
        .await
    }

    pub async fn get_addresses(
        &self,
        request: WalletAddressesRequest,
    ) -> Result<WalletAddressesResponse, StoreError> {
        let key = request.key();
        self.track(
            |s| s.addresses.entry(key.clone()).or_default(),
            self.client.get_addresses(&request),
        )
        .await
    }

    pub async fn get_transaction_history(
        &self,
        request: TransactionHistoryRequest,
    ) -> Result<TransactionHistoryResponse, StoreError> {
        let key = request.key();
        self.track(
            |s| s.transactions.entry(key.clone()).or_default(),
            self.client.get_transaction_history(&request),
        )
        .await
    }

    /// Create an address; on success the chain's address list is reloaded.
    pub async fn create_address(
        &self,
        request: CreateAddressRequest,
    ) -> Result<CreateAddressResponse, StoreError> {
        let created = self
            .track(
                |s| &mut s.last_created_address,
                self.client.create_address(&request),
            )
            .await?;
        self.events
            .emit(&StoreEvent::AddressCreated {
                address: created.address.clone(),
                blockchain: request.blockchain,
                network: request.network,
            })
            .await;
        Ok(created)
    }

    /// Validate and submit a transaction. Invalid input never reaches the
    /// gateway; on success the sender's history is reloaded.
    pub async fn send_transaction(
        &self,
        request: SendTransactionRequest,
    ) -> Result<SendTransactionResponse, StoreError> {
        if let Err(errors) = validate_send(&request) {
            let message = errors.to_string();
            self.state
                .send_modify(|s| s.last_submission.fail(message));
            return Err(errors.into());
        }

        let submitted = self
            .track(
                |s| &mut s.last_submission,
                self.client.send_transaction(&request),
            )
            .await?;
        debug!(tx_hash = %submitted.tx_hash, status = submitted.status.as_str(), "transaction submitted");
        self.events
            .emit(&StoreEvent::TransactionSubmitted {
                from_address: request.from_address,
                blockchain: request.blockchain,
                network: request.network,
                tx_hash: submitted.tx_hash.clone(),
            })
            .await;
        Ok(submitted)
    }

    pub async fn health_check(&self) -> Result<HealthResponse, StoreError> {
        self.track(|s| &mut s.health, self.client.health_check())
            .await
    }

    pub async fn load_portfolio(&self) -> Result<PortfolioAnalytics, StoreError> {
        self.track(|s| &mut s.portfolio, self.client.portfolio_analytics())
            .await
    }

    // ── Views ──────────────────────────────────────────────────────────

    /// The cached balance under `key`, scaled for display.
    pub fn balance_display(&self, key: &ResourceKey) -> Option<BalanceDisplay> {
        let state = self.state.borrow();
        let balance = state.balances.get(key)?.data.as_ref()?;
        match balance.display() {
            Ok(display) => Some(display),
            Err(e) => {
                warn!(%key, error = %e, "unrenderable balance");
                None
            }
        }
    }

    // ── Reset ──────────────────────────────────────────────────────────

    pub fn clear_balances(&self) {
        self.state.send_modify(|s| s.balances.clear());
    }

    pub fn clear_addresses(&self) {
        self.state.send_modify(|s| {
            s.addresses.clear();
            s.last_created_address = RequestState::default();
        });
    }

    pub fn clear_transactions(&self) {
        self.state.send_modify(|s| {
            s.transactions.clear();
            s.last_submission = RequestState::default();
        });
    }

    pub fn clear_blockchain_info(&self) {
        self.state.send_modify(|s| s.blockchain_info.clear());
    }

    pub fn clear_all(&self) {
        self.state.send_replace(WalletState::default());
    }

    pub fn clear_errors(&self) {
        self.state.send_modify(WalletState::clear_errors);
    }
}

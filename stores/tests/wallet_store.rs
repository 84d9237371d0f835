use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use phillet_gateway::{GatewayClient, Method, RawResponse};
use phillet_nullables::{NullSessionStore, NullTransport};
use phillet_stores::{AuthStore, EventBus, StoreError, WalletStore};
use phillet_types::{
    BlockchainInfoRequest, CreateAddressRequest, ResourceKey, SendTransactionRequest, Session,
    Timestamp, WalletAddressesRequest, WalletBalanceRequest,
};

const BALANCE: &str = "/v1/wallet/balance";
const SEND: &str = "/v1/wallet/send";
const HISTORY: &str = "/v1/wallet/transactions";
const ADDRESSES: &str = "/v1/wallet/addresses";
const REFRESH: &str = "/v1/auth/refresh";

const SENDER: &str = "0x1111111111111111111111111111111111111111";
const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

struct World {
    transport: Arc<NullTransport>,
    client: Arc<GatewayClient>,
    events: Arc<EventBus>,
    wallet: Arc<WalletStore>,
}

fn world() -> World {
    let transport = Arc::new(NullTransport::new());
    let sessions = Arc::new(NullSessionStore::with_session(Session::new(
        "a0",
        "r0",
        Timestamp::new(u64::MAX),
    )));
    let client = Arc::new(GatewayClient::new(transport.clone(), sessions));
    let events = Arc::new(EventBus::new());
    let wallet = WalletStore::new(Arc::clone(&client), Arc::clone(&events));
    World {
        transport,
        client,
        events,
        wallet,
    }
}

fn balance(raw: &str) -> Value {
    json!({
        "balance": raw,
        "symbol": "ETH",
        "decimals": 18,
        "address": SENDER,
        "blockchain": "ethereum",
        "network": "goerli"
    })
}

fn goerli() -> WalletBalanceRequest {
    WalletBalanceRequest::native("ethereum", "goerli")
}

fn send_request(amount: &str) -> SendTransactionRequest {
    SendTransactionRequest {
        from_address: SENDER.into(),
        to_address: RECIPIENT.into(),
        amount: amount.into(),
        blockchain: "ethereum".into(),
        network: "goerli".into(),
        token_address: None,
        gas_price: None,
        gas_limit: None,
    }
}

fn empty_history() -> Value {
    json!({ "transactions": [], "total": 0 })
}

fn send_ok() -> Value {
    json!({
        "txHash": "0xfeed",
        "status": "pending",
        "blockchain": "ethereum",
        "network": "goerli",
        "timestamp": 1_700_000_000
    })
}

#[tokio::test]
async fn native_balance_is_keyed_and_displayed() {
    let w = world();
    w.transport
        .respond_json(Method::GET, BALANCE, 200, balance("500000000000000000"));

    w.wallet.get_balance(goerli()).await.unwrap();

    let key = ResourceKey::balance("ethereum", "goerli", None);
    assert_eq!(key.as_str(), "ethereum-goerli-native");
    let state = w.wallet.state();
    let slot = &state.balances[&key];
    assert!(!slot.loading);
    assert_eq!(slot.error, None);
    assert_eq!(
        w.wallet.balance_display(&key).unwrap().to_string(),
        "0.500000 ETH"
    );
}

#[tokio::test]
async fn last_resolved_balance_wins() {
    let w = world();
    w.transport
        .respond_after(
            Method::GET,
            BALANCE,
            Duration::from_millis(80),
            RawResponse::json(200, &balance("1")),
        )
        .respond_after(
            Method::GET,
            BALANCE,
            Duration::from_millis(10),
            RawResponse::json(200, &balance("2")),
        );

    let (slow, fast) = tokio::join!(w.wallet.get_balance(goerli()), w.wallet.get_balance(goerli()));
    assert_eq!(slow.unwrap().balance, "1");
    assert_eq!(fast.unwrap().balance, "2");

    let key = ResourceKey::balance("ethereum", "goerli", None);
    let state = w.wallet.state();
    assert_eq!(state.balances[&key].data.as_ref().unwrap().balance, "1");
}

#[tokio::test]
async fn failed_reload_keeps_stale_balance() {
    let w = world();
    w.transport
        .respond_json(Method::GET, BALANCE, 200, balance("7"))
        .respond(Method::GET, BALANCE, RawResponse::new(500, ""));

    w.wallet.get_balance(goerli()).await.unwrap();
    let err = w.wallet.get_balance(goerli()).await.unwrap_err();

    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    let key = ResourceKey::balance("ethereum", "goerli", None);
    let state = w.wallet.state();
    let slot = &state.balances[&key];
    assert_eq!(slot.data.as_ref().unwrap().balance, "7");
    assert_eq!(slot.error.as_deref(), Some("HTTP 500: Internal Server Error"));
    assert!(!slot.loading);
}

#[tokio::test]
async fn failed_refresh_marks_resource_unauthorized() {
    let w = world();
    w.transport
        .respond(Method::GET, BALANCE, RawResponse::new(401, ""));
    w.transport
        .respond(Method::POST, REFRESH, RawResponse::new(401, ""));

    let err = w.wallet.get_balance(goerli()).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(w.transport.count(REFRESH), 1);
    assert!(!w.client.is_authenticated());
    let key = ResourceKey::balance("ethereum", "goerli", None);
    assert_eq!(
        w.wallet.state().balances[&key].error.as_deref(),
        Some("Unauthorized - please login again")
    );
}

#[tokio::test]
async fn send_reloads_sender_history_exactly_once() {
    let w = world();
    w.transport.respond_json(Method::POST, SEND, 200, send_ok());
    w.transport
        .respond_json(Method::GET, HISTORY, 200, empty_history());

    let submitted = w.wallet.send_transaction(send_request("0.25")).await.unwrap();

    assert_eq!(submitted.tx_hash, "0xfeed");
    let history_calls = w.transport.requests_to(HISTORY);
    assert_eq!(history_calls.len(), 1);
    assert_eq!(history_calls[0].query_value("address"), Some(SENDER));
    assert_eq!(history_calls[0].query_value("limit"), Some("50"));
    assert_eq!(history_calls[0].query_value("offset"), Some("0"));

    let state = w.wallet.state();
    assert_eq!(state.last_submission.data.as_ref().unwrap().tx_hash, "0xfeed");
    let key = ResourceKey::history(SENDER, "ethereum", "goerli");
    assert!(state.transactions[&key].data.is_some());
}

#[tokio::test]
async fn zero_amount_is_rejected_before_network() {
    let w = world();

    let err = w.wallet.send_transaction(send_request("0")).await.unwrap_err();

    assert!(matches!(err, StoreError::Validation(_)));
    assert!(w.transport.requests().is_empty());
    assert_eq!(
        w.wallet.state().last_submission.error.as_deref(),
        Some("Please enter a valid amount")
    );
}

#[tokio::test]
async fn history_failure_after_send_stays_on_history() {
    let w = world();
    w.transport.respond_json(Method::POST, SEND, 200, send_ok());
    w.transport
        .respond(Method::GET, HISTORY, RawResponse::new(502, ""));

    w.wallet.send_transaction(send_request("1")).await.unwrap();

    let state = w.wallet.state();
    assert_eq!(state.last_submission.error, None);
    let key = ResourceKey::history(SENDER, "ethereum", "goerli");
    assert_eq!(
        state.transactions[&key].error.as_deref(),
        Some("HTTP 502: Bad Gateway")
    );
}

#[tokio::test]
async fn failed_send_does_not_reload_history() {
    let w = world();
    w.transport.respond_json(
        Method::POST,
        SEND,
        400,
        json!({ "message": "insufficient funds" }),
    );

    let err = w.wallet.send_transaction(send_request("1")).await.unwrap_err();

    assert_eq!(err.to_string(), "insufficient funds");
    assert_eq!(w.transport.count(HISTORY), 0);
}

#[tokio::test]
async fn created_address_reloads_chain_addresses() {
    let w = world();
    w.transport.respond_json(
        Method::POST,
        ADDRESSES,
        201,
        json!({
            "address": RECIPIENT,
            "privateKey": "0xsecret",
            "blockchain": "ethereum",
            "network": "goerli",
            "createdAt": "2024-01-01T00:00:00Z"
        }),
    );
    w.transport.respond_json(
        Method::GET,
        ADDRESSES,
        200,
        json!({ "addresses": [
            { "address": SENDER, "blockchain": "ethereum", "network": "goerli", "isDefault": true },
            { "address": RECIPIENT, "blockchain": "ethereum", "network": "goerli" }
        ]}),
    );

    w.wallet
        .create_address(CreateAddressRequest {
            blockchain: "ethereum".into(),
            network: "goerli".into(),
            label: None,
        })
        .await
        .unwrap();

    assert_eq!(w.transport.count(ADDRESSES), 2);
    let state = w.wallet.state();
    let list = state.addresses[&ResourceKey::chain("ethereum", "goerli")]
        .data
        .as_ref()
        .unwrap();
    assert_eq!(list.addresses.len(), 2);
    assert_eq!(list.default_address().unwrap().address, SENDER);
}

#[tokio::test]
async fn logout_drops_cached_wallet_data() {
    let w = world();
    let auth = AuthStore::new(Arc::clone(&w.client), Arc::clone(&w.events));
    w.transport
        .respond_json(Method::GET, BALANCE, 200, balance("5"));
    w.wallet.get_balance(goerli()).await.unwrap();
    assert!(!w.wallet.state().balances.is_empty());

    auth.logout().await;

    assert!(w.wallet.state().balances.is_empty());
}

#[tokio::test]
async fn lost_session_drops_cached_wallet_data() {
    let w = world();
    let auth = AuthStore::new(Arc::clone(&w.client), Arc::clone(&w.events));
    assert!(auth.restore());
    w.transport
        .respond_json(Method::GET, BALANCE, 200, balance("5"))
        .respond(Method::GET, BALANCE, RawResponse::new(401, ""));
    w.transport
        .respond(Method::POST, REFRESH, RawResponse::new(401, ""));

    w.wallet.get_balance(goerli()).await.unwrap();
    let err = w.wallet.get_balance(goerli()).await.unwrap_err();
    assert!(err.is_unauthorized());

    assert!(!auth.revalidate().await);
    assert!(!auth.state().is_authenticated);
    assert!(w.wallet.state().balances.is_empty());

    // Already logged out: nothing more to drop.
    assert!(!auth.revalidate().await);
}

#[tokio::test]
async fn clear_actions_reset_their_resources() {
    let w = world();
    w.transport
        .respond_json(Method::GET, BALANCE, 200, balance("5"));
    w.transport.respond(
        Method::GET,
        "/v1/blockchain/info",
        RawResponse::new(503, ""),
    );

    w.wallet.get_balance(goerli()).await.unwrap();
    let _ = w
        .wallet
        .get_blockchain_info(BlockchainInfoRequest {
            blockchain: "ethereum".into(),
            network: "goerli".into(),
        })
        .await;

    w.wallet.clear_errors();
    let chain = ResourceKey::chain("ethereum", "goerli");
    assert_eq!(w.wallet.state().blockchain_info[&chain].error, None);

    w.wallet.clear_balances();
    assert!(w.wallet.state().balances.is_empty());
    w.wallet.clear_blockchain_info();
    assert!(w.wallet.state().blockchain_info.is_empty());
}

#[tokio::test]
async fn health_and_portfolio_are_tracked() {
    let w = world();
    w.transport.respond_json(
        Method::GET,
        "/v1/health",
        200,
        json!({ "status": "ok", "version": "1.2.0", "services": { "ethereum": "ok", "bitcoin": "degraded" } }),
    );
    w.transport.respond_json(
        Method::GET,
        "/v1/analytics/portfolio",
        200,
        json!({ "totalValue": "1234.56", "change24h": 1.5, "assets": [] }),
    );

    let health = w.wallet.health_check().await.unwrap();
    assert_eq!(health.degraded_services(), vec!["bitcoin"]);
    let portfolio = w.wallet.load_portfolio().await.unwrap();
    assert_eq!(portfolio.total_value, "1234.56");

    let state = w.wallet.state();
    assert!(state.health.data.is_some());
    assert!(state.portfolio.data.is_some());
}

#[tokio::test]
async fn subscribers_observe_address_list_changes() {
    let w = world();
    w.transport.respond_json(
        Method::GET,
        ADDRESSES,
        200,
        json!({ "addresses": [] }),
    );
    let mut rx = w.wallet.subscribe();

    w.wallet
        .get_addresses(WalletAddressesRequest {
            blockchain: "ethereum".into(),
            network: "goerli".into(),
        })
        .await
        .unwrap();

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert!(snapshot
        .addresses
        .contains_key(&ResourceKey::chain("ethereum", "goerli")));
}

//! The gateway client.
//!
//! Every call goes through [`GatewayClient::call`], which attaches the
//! current access token and, on `401`, runs at most one silent
//! refresh-and-replay cycle before giving up with
//! [`GatewayError::Unauthorized`]. Auth endpoints go through
//! [`GatewayClient::call_anonymous`] and never trigger a refresh.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use phillet_session::{FileSessionStore, SessionStore};
use phillet_types::{
    AuthRequest, AuthResponse, BillingInfo, BlockchainInfoRequest, BlockchainInfoResponse, Clock,
    CreateAddressRequest, CreateAddressResponse, HealthResponse, Notification, Page,
    PortfolioAnalytics, RefreshRequest, RegisterRequest, RegisterResponse, Script, ScriptDraft,
    ScriptExecution, ScriptUpdate, SendTransactionRequest, SendTransactionResponse, Session,
    SystemClock, Template, TemplateQuery, Timestamp, TransactionHistoryRequest,
    TransactionHistoryResponse, UpgradePlanRequest, UpgradePlanResponse, WalletAddressesRequest,
    WalletAddressesResponse, WalletBalanceRequest, WalletBalanceResponse,
};

use crate::config::{ClientConfig, RefreshPolicy};
use crate::error::GatewayError;
use crate::http::ReqwestTransport;
use crate::routes::{ApiFlavor, Endpoint, LEGACY_HISTORY_LIMIT};
use crate::transport::{GatewayRequest, RawResponse, Transport};

/// Body of a successful token refresh. The gateway may omit a rotated
/// refresh token, in which case the old one stays in use.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_at: Timestamp,
}

pub struct GatewayClient {
    transport: Arc<dyn Transport>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    flavor: ApiFlavor,
    policy: RefreshPolicy,
    /// The active session; replaced as a whole, never held across an await.
    session: RwLock<Option<Session>>,
    /// Serialises silent refreshes so concurrent 401s refresh once.
    refresh_lock: Mutex<()>,
}

impl GatewayClient {
    /// Create a client, restoring whatever session the store holds.
    pub fn new(transport: Arc<dyn Transport>, sessions: Arc<dyn SessionStore>) -> Self {
        let restored = match sessions.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to load persisted session, starting logged out");
                None
            }
        };
        if restored.is_some() {
            debug!("restored persisted session");
        }
        Self {
            transport,
            sessions,
            clock: Arc::new(SystemClock),
            flavor: ApiFlavor::default(),
            policy: RefreshPolicy::default(),
            session: RwLock::new(restored),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::from_config(config)?;
        let sessions = FileSessionStore::new(config.session_file.clone());
        Ok(Self::new(Arc::new(transport), Arc::new(sessions))
            .with_flavor(config.api_flavor)
            .with_refresh_policy(config.refresh_policy))
    }

    pub fn with_flavor(mut self, flavor: ApiFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ── Session ────────────────────────────────────────────────────────

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        let now = self.clock.now();
        self.session().is_some_and(|s| s.is_valid_at(now))
    }

    /// Forget the session locally and in the store. Never touches the network.
    pub fn logout(&self) {
        self.drop_session();
    }

    fn install_session(&self, session: Session) {
        if let Err(e) = self.sessions.save(&session) {
            warn!(error = %e, "failed to persist session, keeping it in memory only");
        }
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
        info!("session updated");
    }

    fn drop_session(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Err(e) = self.sessions.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
        if previous.is_some() {
            info!("session cleared");
        }
    }

    // ── Auth ───────────────────────────────────────────────────────────

    /// Log in. On success the returned token pair becomes the active session.
    pub async fn authenticate(&self, credentials: &AuthRequest) -> Result<AuthResponse, GatewayError> {
        let request =
            GatewayRequest::post(self.flavor.path(Endpoint::Authenticate)).with_json(credentials)?;
        let response: AuthResponse = self.call_anonymous(request).await?;
        self.install_session(response.session());
        info!(user = %response.user.email, "authenticated");
        Ok(response)
    }

    pub async fn register(&self, user: &RegisterRequest) -> Result<RegisterResponse, GatewayError> {
        let request = GatewayRequest::post(self.flavor.path(Endpoint::Register)).with_json(user)?;
        self.call_anonymous(request).await
    }

    /// Exchange `refresh_token` for a new session. Failure leaves the
    /// current session untouched.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, GatewayError> {
        let request = GatewayRequest::post(self.flavor.path(Endpoint::Refresh)).with_json(
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )?;
        let response: RefreshResponse = self.call_anonymous(request).await?;
        let session = Session::new(
            response.access_token,
            response
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| refresh_token.to_string()),
            response.expires_at,
        );
        self.install_session(session.clone());
        Ok(session)
    }

    // ── Wallet ─────────────────────────────────────────────────────────

    pub async fn get_balance(
        &self,
        request: &WalletBalanceRequest,
    ) -> Result<WalletBalanceResponse, GatewayError> {
        let token = request.token_address.as_deref().filter(|t| !t.is_empty());
        let req = GatewayRequest::get(self.flavor.path(Endpoint::Balance))
            .with_query("blockchain", &request.blockchain)
            .with_query("network", &request.network)
            .with_optional_query(self.flavor.token_param(), token);
        self.call(req).await
    }

    pub async fn get_addresses(
        &self,
        request: &WalletAddressesRequest,
    ) -> Result<WalletAddressesResponse, GatewayError> {
        let req = GatewayRequest::get(self.flavor.path(Endpoint::Addresses))
            .with_query("blockchain", &request.blockchain)
            .with_query("network", &request.network);
        self.call(req).await
    }

    pub async fn create_address(
        &self,
        request: &CreateAddressRequest,
    ) -> Result<CreateAddressResponse, GatewayError> {
        let req = GatewayRequest::post(self.flavor.path(Endpoint::Addresses)).with_json(request)?;
        self.call(req).await
    }

    pub async fn send_transaction(
        &self,
        request: &SendTransactionRequest,
    ) -> Result<SendTransactionResponse, GatewayError> {
        let req = GatewayRequest::post(self.flavor.path(Endpoint::Send)).with_json(request)?;
        self.call(req).await
    }

    pub async fn get_transaction_history(
        &self,
        request: &TransactionHistoryRequest,
    ) -> Result<TransactionHistoryResponse, GatewayError> {
        let (limit, offset) = match self.flavor {
            ApiFlavor::V1 => (request.limit, request.offset),
            ApiFlavor::Legacy => (
                Some(request.limit.unwrap_or(LEGACY_HISTORY_LIMIT)),
                Some(request.offset.unwrap_or(0)),
            ),
        };
        let req = GatewayRequest::get(self.flavor.path(Endpoint::Transactions))
            .with_query("address", &request.address)
            .with_query("blockchain", &request.blockchain)
            .with_query("network", &request.network)
            .with_optional_query("limit", limit)
            .with_optional_query("offset", offset);
        self.call(req).await
    }

    // ── Chain / service ────────────────────────────────────────────────

    pub async fn get_blockchain_info(
        &self,
        request: &BlockchainInfoRequest,
    ) -> Result<BlockchainInfoResponse, GatewayError> {
        let req = GatewayRequest::get(self.flavor.path(Endpoint::BlockchainInfo))
            .with_query("blockchain", &request.blockchain)
            .with_query("network", &request.network);
        self.call(req).await
    }

    pub async fn health_check(&self) -> Result<HealthResponse, GatewayError> {
        self.call(GatewayRequest::get(self.flavor.path(Endpoint::Health)))
            .await
    }

    // ── Analytics / notifications ──────────────────────────────────────

    pub async fn portfolio_analytics(&self) -> Result<PortfolioAnalytics, GatewayError> {
        self.call(GatewayRequest::get(self.flavor.path(Endpoint::Portfolio)))
            .await
    }

    pub async fn notifications(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<Notification>, GatewayError> {
        let req = GatewayRequest::get(self.flavor.path(Endpoint::Notifications))
            .with_query("page", page)
            .with_query("limit", limit);
        self.call(req).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<(), GatewayError> {
        self.call::<IgnoredAny>(GatewayRequest::put(self.flavor.notification_read_path(id)))
            .await
            .map(|_| ())
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), GatewayError> {
        self.call::<IgnoredAny>(GatewayRequest::put(self.flavor.notifications_read_all_path()))
            .await
            .map(|_| ())
    }

    // ── Billing ────────────────────────────────────────────────────────

    pub async fn billing_info(&self) -> Result<BillingInfo, GatewayError> {
        self.call(GatewayRequest::get(self.flavor.path(Endpoint::BillingInfo)))
            .await
    }

    /// Start a plan upgrade; the gateway answers with a checkout URL.
    pub async fn upgrade_plan(&self, plan: &str) -> Result<UpgradePlanResponse, GatewayError> {
        let req = GatewayRequest::post(self.flavor.path(Endpoint::BillingUpgrade))
            .with_json(&UpgradePlanRequest { plan: plan.to_string() })?;
        self.call(req).await
    }

    // ── Templates / scripts ────────────────────────────────────────────

    pub async fn templates(&self, query: &TemplateQuery) -> Result<Page<Template>, GatewayError> {
        let req = GatewayRequest::get(self.flavor.path(Endpoint::Templates))
            .with_query("page", query.page)
            .with_query("limit", query.limit)
            .with_optional_query("category", query.category.as_deref())
            .with_optional_query("search", query.search.as_deref());
        self.call(req).await
    }

    pub async fn template(&self, id: &str) -> Result<Template, GatewayError> {
        self.call(GatewayRequest::get(self.flavor.item_path(Endpoint::Templates, id)))
            .await
    }

    /// Install a template as a new script owned by the caller.
    pub async fn install_template(&self, id: &str) -> Result<Script, GatewayError> {
        let path = self
            .flavor
            .item_action_path(Endpoint::Templates, id, "install");
        self.call(GatewayRequest::post(path)).await
    }

    pub async fn scripts(&self) -> Result<Vec<Script>, GatewayError> {
        self.call(GatewayRequest::get(self.flavor.path(Endpoint::Scripts)))
            .await
    }

    pub async fn create_script(&self, draft: &ScriptDraft) -> Result<Script, GatewayError> {
        let req = GatewayRequest::post(self.flavor.path(Endpoint::Scripts)).with_json(draft)?;
        self.call(req).await
    }

    pub async fn update_script(
        &self,
        id: &str,
        update: &ScriptUpdate,
    ) -> Result<Script, GatewayError> {
        let req =
            GatewayRequest::put(self.flavor.item_path(Endpoint::Scripts, id)).with_json(update)?;
        self.call(req).await
    }

    pub async fn delete_script(&self, id: &str) -> Result<(), GatewayError> {
        self.call::<IgnoredAny>(GatewayRequest::delete(
            self.flavor.item_path(Endpoint::Scripts, id),
        ))
        .await
        .map(|_| ())
    }

    pub async fn execute_script(&self, id: &str) -> Result<ScriptExecution, GatewayError> {
        let path = self.flavor.item_action_path(Endpoint::Scripts, id, "execute");
        self.call(GatewayRequest::post(path)).await
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Authenticated call with one silent refresh-and-replay on `401`.
    async fn call<T: DeserializeOwned>(&self, request: GatewayRequest) -> Result<T, GatewayError> {
        let sent_with = self.session();
        let mut first = request.clone();
        first.bearer = sent_with.as_ref().map(|s| s.access_token.clone());

        let response = self.dispatch(&first).await?;
        if !response.is_unauthorized() {
            return decode(response);
        }

        let response = self.recover(request, sent_with).await?;
        decode(response)
    }

    /// Call to an auth endpoint: no bearer, no refresh, a 401 is an ordinary error.
    async fn call_anonymous<T: DeserializeOwned>(
        &self,
        request: GatewayRequest,
    ) -> Result<T, GatewayError> {
        let response = self.dispatch(&request).await?;
        decode(response)
    }

    async fn dispatch(&self, request: &GatewayRequest) -> Result<RawResponse, GatewayError> {
        debug!(method = %request.method, path = %request.path, "gateway request");
        let result = self.transport.send(request).await;
        if let Err(e) = &result {
            debug!(path = %request.path, error = %e, "gateway unreachable");
        }
        result
    }

    /// Handle a `401` on `request`, which was sent with `sent_with`.
    async fn recover(
        &self,
        mut request: GatewayRequest,
        sent_with: Option<Session>,
    ) -> Result<RawResponse, GatewayError> {
        if self.policy == RefreshPolicy::FailFast {
            warn!(path = %request.path, "unauthorized, clearing session");
            self.drop_session();
            return Err(GatewayError::Unauthorized);
        }

        let session = {
            let _guard = self.refresh_lock.lock().await;
            match self.session() {
                Some(current) if Some(&current) != sent_with.as_ref() => {
                    debug!(path = %request.path, "session replaced in flight, replaying");
                    current
                }
                Some(current) if current.can_refresh() => {
                    match self.refresh_session(&current.refresh_token).await {
                        Ok(session) => session,
                        Err(e) => {
                            warn!(error = %e, "silent refresh failed, clearing session");
                            self.drop_session();
                            return Err(GatewayError::Unauthorized);
                        }
                    }
                }
                _ => {
                    warn!(path = %request.path, "unauthorized and nothing to refresh");
                    self.drop_session();
                    return Err(GatewayError::Unauthorized);
                }
            }
        };

        request.bearer = Some(session.access_token);
        let response = self.dispatch(&request).await?;
        if response.is_unauthorized() {
            warn!(path = %request.path, "replay rejected, clearing session");
            self.drop_session();
            return Err(GatewayError::Unauthorized);
        }
        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: RawResponse) -> Result<T, GatewayError> {
    if !response.is_success() {
        return Err(http_error(&response));
    }
    // Bodiless replies (204, empty 200) decode as `null`.
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Prefer the body's `message`; fall back to the status line.
fn http_error(response: &RawResponse) -> GatewayError {
    let message = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.status_text));
    GatewayError::Http {
        status: response.status,
        message,
    }
}

//! Authentication state.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use phillet_gateway::GatewayClient;
use phillet_types::{AuthRequest, RegisterResponse, User};

use crate::error::StoreError;
use crate::event::{EventBus, StoreEvent};
use crate::validation::{validate_registration, RegistrationForm};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct AuthStore {
    client: Arc<GatewayClient>,
    events: Arc<EventBus>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new(client: Arc<GatewayClient>, events: Arc<EventBus>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            client,
            events,
            state,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub async fn login(&self, credentials: AuthRequest) -> Result<User, StoreError> {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.client.authenticate(&credentials).await {
            Ok(response) => {
                let user = response.user.into_user(self.client.clock().now());
                self.persist_user(&user);
                info!(user = %user.email, "logged in");
                let logged_in = user.clone();
                self.state.send_modify(move |s| {
                    *s = AuthState {
                        user: Some(logged_in),
                        is_authenticated: true,
                        is_loading: false,
                        error: None,
                    }
                });
                Ok(user)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(move |s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                Err(e.into())
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, form: RegistrationForm) -> Result<RegisterResponse, StoreError> {
        if let Err(errors) = validate_registration(&form) {
            let message = errors.to_string();
            self.state.send_modify(move |s| s.error = Some(message));
            return Err(errors.into());
        }

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.client.register(&form.into_request()).await {
            Ok(response) => {
                self.state.send_modify(|s| s.is_loading = false);
                Ok(response)
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(move |s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                Err(e.into())
            }
        }
    }

    /// Always succeeds; no network call.
    pub async fn logout(&self) {
        self.client.logout();
        self.state.send_replace(AuthState::default());
        info!("logged out");
        self.events.emit(&StoreEvent::LoggedOut).await;
    }

    /// Rebuild the view from the persisted session and cached user.
    /// Returns whether the user is logged in.
    pub fn restore(&self) -> bool {
        let is_authenticated = self.client.is_authenticated();
        let user = if is_authenticated {
            match self.client.session_store().load_user() {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "failed to load cached user");
                    None
                }
            }
        } else {
            None
        };
        self.state.send_modify(move |s| {
            s.user = user;
            s.is_authenticated = is_authenticated;
        });
        is_authenticated
    }

    /// Drop the logged-in view if the client has lost its session,
    /// e.g. after a failed silent refresh. Dependent stores are told via
    /// [`StoreEvent::LoggedOut`] so no cached account data outlives it.
    pub async fn revalidate(&self) -> bool {
        if self.client.session().is_some() {
            return self.state.borrow().is_authenticated;
        }
        let dropped = self.state.send_if_modified(|s| {
            if !s.is_authenticated && s.user.is_none() {
                return false;
            }
            s.user = None;
            s.is_authenticated = false;
            true
        });
        if dropped {
            info!("session lost, logged out");
            self.events.emit(&StoreEvent::LoggedOut).await;
        }
        false
    }

    pub fn set_user(&self, user: User) {
        self.persist_user(&user);
        self.state.send_modify(move |s| s.user = Some(user));
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    fn persist_user(&self, user: &User) {
        if let Err(e) = self.client.session_store().save_user(user) {
            warn!(error = %e, "failed to cache user");
        }
    }
}

//! Observable application state for the Phillet wallet.
//!
//! [`AuthStore`] and [`WalletStore`] wrap the gateway client and publish
//! snapshots over `tokio::sync::watch`. Each cached resource is a
//! [`RequestState`]; cross-store reactions (history refresh after a send,
//! cache reset after logout) travel over the [`EventBus`].

pub mod auth;
pub mod error;
pub mod event;
pub mod request_state;
pub mod validation;
pub mod wallet;

pub use auth::{AuthState, AuthStore};
pub use error::StoreError;
pub use event::{EventBus, EventListener, StoreEvent};
pub use request_state::RequestState;
pub use validation::{
    validate_registration, validate_send, FieldError, RegistrationForm, ValidationErrors,
};
pub use wallet::{WalletState, WalletStore, HISTORY_REFRESH_LIMIT};

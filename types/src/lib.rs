//! Fundamental types for the Phillet wallet client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! sessions and users, gateway request/response shapes, resource keys,
//! timestamps, and balance display helpers.

pub mod address;
pub mod amount;
pub mod api;
pub mod error;
pub mod keys;
pub mod session;
pub mod time;

pub use address::short_address;
pub use amount::{format_balance, BalanceDisplay, DISPLAY_DECIMALS};
pub use api::*;
pub use error::TypesError;
pub use keys::ResourceKey;
pub use session::{Session, User};
pub use time::{Clock, SystemClock, Timestamp};

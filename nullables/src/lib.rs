//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the wallet client (clock, gateway transport,
//! session storage) sits behind a trait. This crate provides in-memory
//! implementations that:
//! - Return scripted, deterministic values
//! - Record what was asked of them for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod session;
pub mod transport;

pub use clock::NullClock;
pub use session::NullSessionStore;
pub use transport::NullTransport;

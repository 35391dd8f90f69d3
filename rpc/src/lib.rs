//! JSON-over-HTTP server for the staking engine.
//!
//! Provides endpoints for:
//! - Pool creation, closing and listing
//! - Staking, unstaking and withdrawal
//! - Per-account stake info, claimable reward and whitelist status
//! - Liveness and engine time

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{build_router, RpcServer};

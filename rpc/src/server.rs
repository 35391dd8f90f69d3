//! Axum-based RPC server.

use crate::error::RpcError;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use stakepool_engine::StakingEngine;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Every route served by the engine, sharing one engine handle.
pub fn build_router(engine: Arc<StakingEngine>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/time", get(handlers::time))
        .route("/pools", get(handlers::list_pools).post(handlers::create_pool))
        .route("/pools/active", get(handlers::list_active_pools))
        .route("/pools/:id", get(handlers::get_pool))
        .route("/pools/:id/close", post(handlers::close_pool))
        .route("/pools/:id/whitelist", get(handlers::whitelist))
        .route("/pools/:id/stake", post(handlers::stake))
        .route("/pools/:id/unstake", post(handlers::unstake))
        .route("/pools/:id/withdraw", post(handlers::withdraw))
        .route("/pools/:id/stakes/:account", get(handlers::stake_info))
        .with_state(engine)
}

pub struct RpcServer {
    pub bind_address: String,
    pub port: u16,
    pub engine: Arc<StakingEngine>,
}

impl RpcServer {
    pub fn new(bind_address: impl Into<String>, port: u16, engine: Arc<StakingEngine>) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            engine,
        }
    }

    /// Serve until the process is stopped.
    pub async fn start(&self) -> Result<(), RpcError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests.
    pub async fn start_with_shutdown(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let app = build_router(self.engine.clone());
        let addr = format!("{}:{}", self.bind_address, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!("RPC server listening on {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server stopped");
        Ok(())
    }
}

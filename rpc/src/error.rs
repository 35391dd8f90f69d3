//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stakepool_engine::StakingError;
use stakepool_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Staking(#[from] StakingError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<TypesError> for RpcError {
    fn from(e: TypesError) -> Self {
        RpcError::InvalidRequest(e.to_string())
    }
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Staking(e) => match e {
                StakingError::PoolNotFound(_) => StatusCode::NOT_FOUND,
                StakingError::Unauthorized(_) => StatusCode::FORBIDDEN,
                StakingError::InvalidPoolTerms { .. }
                | StakingError::BelowMinimum { .. }
                | StakingError::AboveCap { .. } => StatusCode::BAD_REQUEST,
                StakingError::PoolClosed(_)
                | StakingError::NoActiveStake { .. }
                | StakingError::RedemptionPeriodNotElapsed { .. } => StatusCode::CONFLICT,
                StakingError::TransferFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StakingError::Overflow => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Staking(e) => e.kind(),
            RpcError::InvalidRequest(_) => "InvalidRequest",
            RpcError::Server(_) => "Server",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

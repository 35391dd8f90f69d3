//! RPC request handlers and their wire types.
//!
//! Amounts travel as decimal strings so 18-decimal token units survive JSON
//! clients that only have doubles.

use crate::error::RpcError;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use stakepool_engine::{Pool, PoolTerms, StakePosition, StakingEngine};
use stakepool_types::amount::decimal_string;
use stakepool_types::{AccountId, PoolId, Timestamp};
use std::sync::Arc;
use tracing::debug;

pub type AppState = Arc<StakingEngine>;

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub pool_count: usize,
}

pub async fn health(State(engine): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        pool_count: engine.list_pools().len(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct TimeResponse {
    pub now: Timestamp,
}

pub async fn time(State(engine): State<AppState>) -> Json<TimeResponse> {
    Json(TimeResponse { now: engine.now() })
}

// ── Pools ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct PoolResponse {
    #[serde(flatten)]
    pub pool: Pool,
    pub end_time: Timestamp,
    pub redemption_time: Timestamp,
    #[serde(with = "decimal_string")]
    pub total_staked: u128,
}

impl PoolResponse {
    fn build(engine: &StakingEngine, pool: Pool) -> Result<Self, RpcError> {
        Ok(Self {
            end_time: pool.end_time(),
            redemption_time: pool.redemption_time(),
            total_staked: engine.total_staked(pool.id)?,
            pool,
        })
    }
}

#[derive(Serialize, Deserialize)]
pub struct PoolListResponse {
    pub pools: Vec<PoolResponse>,
}

fn pool_list(engine: &StakingEngine, pools: Vec<Pool>) -> Result<Json<PoolListResponse>, RpcError> {
    let pools = pools
        .into_iter()
        .map(|p| PoolResponse::build(engine, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(PoolListResponse { pools }))
}

pub async fn list_pools(
    State(engine): State<AppState>,
) -> Result<Json<PoolListResponse>, RpcError> {
    pool_list(&engine, engine.list_pools())
}

pub async fn list_active_pools(
    State(engine): State<AppState>,
) -> Result<Json<PoolListResponse>, RpcError> {
    pool_list(&engine, engine.list_active_pools())
}

pub async fn get_pool(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<Json<PoolResponse>, RpcError> {
    let pool = engine.get_pool(pool_id)?;
    Ok(Json(PoolResponse::build(&engine, pool)?))
}

#[derive(Deserialize)]
pub struct CreatePoolRequest {
    pub caller: String,
    #[serde(flatten)]
    pub terms: PoolTerms,
}

#[derive(Serialize, Deserialize)]
pub struct CreatePoolResponse {
    pub pool_id: PoolId,
}

pub async fn create_pool(
    State(engine): State<AppState>,
    Json(req): Json<CreatePoolRequest>,
) -> Result<Json<CreatePoolResponse>, RpcError> {
    let caller = AccountId::parse(&req.caller)?;
    let pool_id = engine.create_pool(&caller, req.terms)?;
    Ok(Json(CreatePoolResponse { pool_id }))
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

pub async fn close_pool(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<PoolResponse>, RpcError> {
    let caller = AccountId::parse(&req.caller)?;
    engine.close_pool(&caller, pool_id)?;
    let pool = engine.get_pool(pool_id)?;
    Ok(Json(PoolResponse::build(&engine, pool)?))
}

#[derive(Serialize, Deserialize)]
pub struct WhitelistResponse {
    pub pool_id: PoolId,
    #[serde(with = "decimal_string")]
    pub threshold: u128,
    pub accounts: Vec<AccountId>,
}

pub async fn whitelist(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<Json<WhitelistResponse>, RpcError> {
    let pool = engine.get_pool(pool_id)?;
    let accounts = engine.whitelist(pool_id)?;
    Ok(Json(WhitelistResponse {
        pool_id,
        threshold: pool.terms.whitelist_threshold,
        accounts,
    }))
}

// ── Staking ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StakeRequest {
    pub account: String,
    #[serde(with = "decimal_string")]
    pub amount: u128,
}

#[derive(Deserialize)]
pub struct AccountRequest {
    pub account: String,
}

#[derive(Serialize, Deserialize)]
pub struct StakeResponse {
    pub pool_id: PoolId,
    pub account: AccountId,
    pub position: StakePosition,
    pub whitelisted: bool,
}

pub async fn stake(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
    Json(req): Json<StakeRequest>,
) -> Result<Json<StakeResponse>, RpcError> {
    let account = AccountId::parse(&req.account)?;
    let position = engine.stake(pool_id, &account, req.amount)?;
    let whitelisted = engine.is_whitelisted(pool_id, &account)?;
    Ok(Json(StakeResponse {
        pool_id,
        account,
        position,
        whitelisted,
    }))
}

#[derive(Serialize, Deserialize)]
pub struct UnstakeResponse {
    pub pool_id: PoolId,
    pub account: AccountId,
    #[serde(with = "decimal_string")]
    pub returned: u128,
}

pub async fn unstake(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
    Json(req): Json<AccountRequest>,
) -> Result<Json<UnstakeResponse>, RpcError> {
    let account = AccountId::parse(&req.account)?;
    let returned = engine.unstake(pool_id, &account)?;
    Ok(Json(UnstakeResponse {
        pool_id,
        account,
        returned,
    }))
}

#[derive(Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub pool_id: PoolId,
    pub account: AccountId,
    #[serde(with = "decimal_string")]
    pub principal: u128,
    #[serde(with = "decimal_string")]
    pub reward: u128,
    #[serde(with = "decimal_string")]
    pub total: u128,
}

pub async fn withdraw(
    State(engine): State<AppState>,
    Path(pool_id): Path<PoolId>,
    Json(req): Json<AccountRequest>,
) -> Result<Json<WithdrawResponse>, RpcError> {
    let account = AccountId::parse(&req.account)?;
    let payout = engine.withdraw(pool_id, &account)?;
    Ok(Json(WithdrawResponse {
        pool_id,
        account,
        principal: payout.principal,
        reward: payout.reward,
        total: payout.total(),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct StakeInfoResponse {
    pub pool_id: PoolId,
    pub account: AccountId,
    #[serde(with = "decimal_string")]
    pub amount: u128,
    pub staked_at: Timestamp,
    pub withdrawn: bool,
    #[serde(with = "decimal_string")]
    pub claimable_reward: u128,
    pub whitelisted: bool,
    pub redeemable_at: Timestamp,
}

pub async fn stake_info(
    State(engine): State<AppState>,
    Path((pool_id, account)): Path<(PoolId, String)>,
) -> Result<Json<StakeInfoResponse>, RpcError> {
    let account = AccountId::parse(&account)?;
    let pool = engine.get_pool(pool_id)?;
    let position = engine.get_stake_info(pool_id, &account)?;
    let claimable_reward = engine.get_reward_claimable(pool_id, &account)?;
    let whitelisted = engine.is_whitelisted(pool_id, &account)?;
    debug!(pool_id, %account, amount = position.amount, "stake info served");
    Ok(Json(StakeInfoResponse {
        pool_id,
        account,
        amount: position.amount,
        staked_at: position.staked_at,
        withdrawn: position.withdrawn,
        claimable_reward,
        whitelisted,
        redeemable_at: pool.redemption_time(),
    }))
}

//! Builds a ready engine from a [`DaemonConfig`].

use crate::config::DaemonConfig;
use anyhow::Context;
use stakepool_engine::{AccessControl, StakingEngine};
use stakepool_token::MemoryTokenLedger;
use stakepool_types::Clock;
use std::sync::Arc;
use tracing::info;

pub struct Bootstrapped {
    pub engine: Arc<StakingEngine>,
    pub tokens: Arc<MemoryTokenLedger>,
}

/// Mint opening balances, fund reward escrow and create the configured pools.
pub fn build(config: &DaemonConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Bootstrapped> {
    config.validate()?;
    let escrow = config.escrow_account.clone();
    let tokens = Arc::new(MemoryTokenLedger::new());

    for m in &config.mint {
        tokens
            .mint(&m.token, &m.account, m.amount)
            .with_context(|| format!("minting {} {} to {}", m.amount, m.token, m.account))?;
        if m.approve {
            let current = tokens.allowance(&m.token, &m.account, &escrow);
            tokens.approve(&m.token, &m.account, &escrow, current.saturating_add(m.amount));
        }
    }

    let engine = StakingEngine::with_access(
        clock,
        tokens.clone(),
        escrow,
        AccessControl::with_admins(config.admins.iter().cloned()),
    );

    for f in &config.reward_funding {
        engine
            .fund_rewards(&f.from, &f.token, f.amount)
            .with_context(|| format!("funding {} {} from {}", f.amount, f.token, f.from))?;
    }

    for (i, terms) in config.pools.iter().enumerate() {
        let id = engine
            .create_pool(config.pool_creator()?, terms.clone())
            .with_context(|| format!("creating configured pool #{i}"))?;
        info!(pool_id = id, start = %terms.start_time, "configured pool ready");
    }

    info!(
        pools = config.pools.len(),
        admins = config.admins.len(),
        escrow = %engine.escrow(),
        "engine bootstrapped"
    );
    Ok(Bootstrapped {
        engine: Arc::new(engine),
        tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakepool_nullables::NullClock;
    use stakepool_token::TokenLedger;
    use stakepool_types::{AccountId, TokenId};

    fn clock() -> Arc<NullClock> {
        Arc::new(NullClock::new(1_700_000_000))
    }

    #[test]
    fn example_config_bootstraps() {
        let config = DaemonConfig::from_toml_str(include_str!("../stakepool.example.toml")).unwrap();
        let ready = build(&config, clock()).unwrap();

        assert_eq!(ready.engine.list_active_pools().len(), 1);
        assert!(ready.engine.is_admin(&AccountId::new("owner")));
        let stk = TokenId::new("STK");
        let e18 = 10u128.pow(18);
        assert_eq!(
            ready.tokens.balance_of(&stk, &AccountId::new("escrow")),
            1_000_000 * e18
        );
        assert_eq!(ready.engine.reward_reserve(&stk), 1_000_000 * e18);
        assert_eq!(
            ready.tokens.allowance(&stk, &AccountId::new("alice"), &AccountId::new("escrow")),
            50_000 * e18
        );
    }

    #[test]
    fn pool_starting_in_the_past_fails_startup() {
        let toml = r#"
            admins = ["owner"]

            [[pools]]
            start_time = 10
            stake_token = "STK"
            reward_token = "STK"
            min_stake_amount = "1"
            max_stake_amount_per_user = "10"
            pool_cap = "100"
            duration_days = 1
            apr = 1
            apr_denominator = 100
            whitelist_threshold = "5"
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        let err = build(&config, clock()).err().expect("startup should fail");
        assert!(format!("{err:#}").contains("configured pool #0"));
    }

    #[test]
    fn empty_config_starts_without_admins() {
        let ready = build(&DaemonConfig::default(), clock()).unwrap();
        assert!(ready.engine.admins().is_empty());
        assert!(!ready.engine.is_admin(&AccountId::new("admin")));
    }

    #[test]
    fn unfunded_reward_source_fails_startup() {
        let toml = r#"
            admins = ["nobody"]

            [[reward_funding]]
            from = "nobody"
            token = "STK"
            amount = "5"
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert!(build(&config, clock()).is_err());
    }
}

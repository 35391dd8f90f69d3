//! Pool-admin capability.

use crate::error::StakingError;
use stakepool_types::AccountId;
use std::collections::BTreeSet;

/// The set of accounts allowed to create and close pools and to manage
/// the admin set itself.
#[derive(Clone, Debug, Default)]
pub struct AccessControl {
    admins: BTreeSet<AccountId>,
}

impl AccessControl {
    /// Start with a single admin, typically the deployer.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admins: BTreeSet::from([admin]),
        }
    }

    pub fn with_admins(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    pub fn ensure_admin(&self, caller: &AccountId) -> Result<(), StakingError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(StakingError::Unauthorized(caller.clone()))
        }
    }

    /// Add `account` to the admin set. Returns whether it was newly added.
    pub fn grant(&mut self, caller: &AccountId, account: AccountId) -> Result<bool, StakingError> {
        self.ensure_admin(caller)?;
        Ok(self.admins.insert(account))
    }

    /// Remove `account` from the admin set. Returns whether it was present.
    pub fn revoke(&mut self, caller: &AccountId, account: &AccountId) -> Result<bool, StakingError> {
        self.ensure_admin(caller)?;
        Ok(self.admins.remove(account))
    }

    pub fn admins(&self) -> impl Iterator<Item = &AccountId> {
        self.admins.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployer_is_admin() {
        let acl = AccessControl::new(AccountId::new("owner"));
        assert!(acl.is_admin(&AccountId::new("owner")));
        assert!(!acl.is_admin(&AccountId::new("mallory")));
    }

    #[test]
    fn only_admins_can_grant() {
        let mut acl = AccessControl::new(AccountId::new("owner"));
        let err = acl
            .grant(&AccountId::new("mallory"), AccountId::new("mallory"))
            .unwrap_err();
        assert_eq!(err, StakingError::Unauthorized(AccountId::new("mallory")));

        assert!(acl.grant(&AccountId::new("owner"), AccountId::new("ops")).unwrap());
        assert!(!acl.grant(&AccountId::new("owner"), AccountId::new("ops")).unwrap());
        assert!(acl.is_admin(&AccountId::new("ops")));
    }

    #[test]
    fn revoke_removes_capability() {
        let mut acl = AccessControl::with_admins([AccountId::new("a"), AccountId::new("b")]);
        assert!(acl.revoke(&AccountId::new("a"), &AccountId::new("b")).unwrap());
        assert!(acl.ensure_admin(&AccountId::new("b")).is_err());
        assert_eq!(acl.admins().count(), 1);
    }
}

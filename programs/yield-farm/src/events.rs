use solana_sdk::pubkey::Pubkey;

use crate::{roles::Role, state::PoolId};

/// Observable side effect of a committed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmEvent {
    PoolAdded {
        pid:             PoolId,
        stake_asset:     Pubkey,
        alloc_point:     u64,
        deposit_fee_bps: u16,
    },
    PoolUpdated {
        pid:             PoolId,
        alloc_point:     u64,
        deposit_fee_bps: u16,
    },
    /// `amount` is what was credited to the stake, after tax and fee.
    Deposit { user: Pubkey, pid: PoolId, amount: u64, fee: u64 },
    Withdraw { user: Pubkey, pid: PoolId, amount: u64 },
    /// `amount` is the gross reward routed into the vault.
    Harvest { user: Pubkey, pid: PoolId, amount: u64 },
    EmergencyWithdraw { user: Pubkey, pid: PoolId, amount: u64 },
    ReferralRecorded { user: Pubkey, referrer: Pubkey },
    CommissionRecorded { referrer: Pubkey, amount: u64 },
    CommissionClaimed { referrer: Pubkey, amount: u64 },
    VestingDeposit { beneficiary: Pubkey, amount: u64 },
    VestingWithdrawal { beneficiary: Pubkey, amount: u64 },
    RoleTransferred { role: Role, previous: Pubkey, new: Pubkey },
    ReferralOperatorUpdated { operator: Pubkey, enabled: bool },
    EmissionRateUpdated { previous: u64, new: u64 },
    ReferralRateUpdated { previous: u16, new: u16 },
}

/// Events staged by an in-flight operation and the committed history.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    committed: Vec<FarmEvent>,
    staged:    Vec<FarmEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: FarmEvent) {
        self.staged.push(event);
    }

    pub fn commit(&mut self) {
        self.committed.append(&mut self.staged);
    }

    pub fn discard(&mut self) {
        self.staged.clear();
    }

    pub fn committed(&self) -> &[FarmEvent] {
        &self.committed
    }

    pub fn staged(&self) -> &[FarmEvent] {
        &self.staged
    }

    /// Hand the committed history to the caller and start empty.
    pub fn drain(&mut self) -> Vec<FarmEvent> {
        std::mem::take(&mut self.committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_events_only_survive_commit() {
        let mut log = EventLog::new();
        let user = Pubkey::new_unique();
        log.emit(FarmEvent::Withdraw { user, pid: 0, amount: 1 });
        log.discard();
        assert!(log.committed().is_empty());

        log.emit(FarmEvent::Withdraw { user, pid: 0, amount: 2 });
        log.commit();
        assert_eq!(log.committed(), &[FarmEvent::Withdraw { user, pid: 0, amount: 2 }]);
        assert!(log.staged().is_empty());

        assert_eq!(log.drain().len(), 1);
        assert!(log.committed().is_empty());
    }
}

//! Referral registry: who introduced whom, and the commission each referrer
//! has accrued.
//!
//! Writes are restricted to operators (in practice the farm ledger). Bad
//! referral input is ignored rather than rejected so that a deposit carrying
//! a junk referrer still goes through.

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    error::{FarmError, Result},
    events::{EventLog, FarmEvent},
    journal::JournaledMap,
};

#[derive(Debug, Clone)]
pub struct ReferralRegistry {
    owner:              Pubkey,
    operators:          JournaledMap<Pubkey, ()>,
    referrers:          JournaledMap<Pubkey, Pubkey>,
    referrals_count:    JournaledMap<Pubkey, u64>,
    total_commissions:  JournaledMap<Pubkey, u64>,
    claimed_commission: JournaledMap<Pubkey, u64>,
    /// Recorded minus claimed, across all referrers
    outstanding:        u64,
    /// `(owner, outstanding)` as of the open checkpoint
    saved:              Option<(Pubkey, u64)>,
}

impl ReferralRegistry {
    pub fn new(owner: Pubkey) -> Self {
        Self {
            owner,
            operators:          JournaledMap::new(),
            referrers:          JournaledMap::new(),
            referrals_count:    JournaledMap::new(),
            total_commissions:  JournaledMap::new(),
            claimed_commission: JournaledMap::new(),
            outstanding:        0,
            saved:              None,
        }
    }

    pub(crate) fn checkpoint(&mut self) {
        self.saved = Some((self.owner, self.outstanding));
        self.operators.checkpoint();
        self.referrers.checkpoint();
        self.referrals_count.checkpoint();
        self.total_commissions.checkpoint();
        self.claimed_commission.checkpoint();
    }

    pub(crate) fn commit(&mut self) {
        self.saved = None;
        self.operators.commit();
        self.referrers.commit();
        self.referrals_count.commit();
        self.total_commissions.commit();
        self.claimed_commission.commit();
    }

    pub(crate) fn rollback(&mut self) {
        if let Some((owner, outstanding)) = self.saved.take() {
            self.owner = owner;
            self.outstanding = outstanding;
        }
        self.operators.rollback();
        self.referrers.rollback();
        self.referrals_count.rollback();
        self.total_commissions.rollback();
        self.claimed_commission.rollback();
    }

    pub fn owner(&self) -> Pubkey {
        self.owner
    }

    pub fn is_operator(&self, account: &Pubkey) -> bool {
        self.operators.contains_key(account)
    }

    fn require_operator(&self, caller: &Pubkey, op: &'static str) -> Result<()> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            Err(FarmError::Unauthorized { op, caller: *caller })
        }
    }

    pub fn transfer_ownership(&mut self, caller: &Pubkey, new_owner: Pubkey) -> Result<()> {
        if *caller != self.owner {
            return Err(FarmError::Unauthorized { op: "transfer_ownership", caller: *caller });
        }
        if new_owner == Pubkey::default() {
            return Err(FarmError::ZeroAddress("transfer_ownership"));
        }
        self.owner = new_owner;
        Ok(())
    }

    /// Grant or revoke operator rights. Owner only.
    pub fn update_operator(
        &mut self,
        caller: &Pubkey,
        operator: Pubkey,
        enabled: bool,
        events: &mut EventLog,
    ) -> Result<()> {
        if *caller != self.owner {
            return Err(FarmError::Unauthorized { op: "update_operator", caller: *caller });
        }
        if enabled {
            self.operators.insert(operator, ());
        } else {
            self.operators.remove(&operator);
        }
        events.emit(FarmEvent::ReferralOperatorUpdated { operator, enabled });
        Ok(())
    }

    /// Link `user` to `referrer` unless `user` already has one.
    ///
    /// Zero keys and self-referral are ignored. Returns whether a new edge
    /// was recorded.
    pub fn record_referral(
        &mut self,
        caller: &Pubkey,
        user: Pubkey,
        referrer: Pubkey,
        events: &mut EventLog,
    ) -> Result<bool> {
        self.require_operator(caller, "record_referral")?;
        let zero = Pubkey::default();
        if user == zero || referrer == zero || user == referrer || self.referrers.contains_key(&user) {
            return Ok(false);
        }
        self.referrers.insert(user, referrer);
        let count = self.referrals_count(&referrer) + 1;
        self.referrals_count.insert(referrer, count);
        info!(%user, %referrer, "referral recorded");
        events.emit(FarmEvent::ReferralRecorded { user, referrer });
        Ok(true)
    }

    /// Add `amount` to the referrer's accrued total. Zero referrer or amount is a no-op.
    pub fn record_commission(
        &mut self,
        caller: &Pubkey,
        referrer: Pubkey,
        amount: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        self.require_operator(caller, "record_commission")?;
        if referrer == Pubkey::default() || amount == 0 {
            return Ok(());
        }
        let total = self
            .total_commission(&referrer)
            .checked_add(amount)
            .ok_or(FarmError::MathOverflow)?;
        let outstanding = self.outstanding.checked_add(amount).ok_or(FarmError::MathOverflow)?;
        self.total_commissions.insert(referrer, total);
        self.outstanding = outstanding;
        info!(%referrer, amount, total, "referral commission recorded");
        events.emit(FarmEvent::CommissionRecorded { referrer, amount });
        Ok(())
    }

    /// Mark everything the referrer has accrued as paid; returns the amount
    /// that was outstanding.
    pub fn take_claimable(&mut self, caller: &Pubkey, referrer: &Pubkey) -> Result<u64> {
        self.require_operator(caller, "take_claimable")?;
        let claimable = self.claimable_commission(referrer);
        if claimable > 0 {
            let claimed = self.claimed_commission(referrer) + claimable;
            self.claimed_commission.insert(*referrer, claimed);
            self.outstanding -= claimable;
        }
        Ok(claimable)
    }

    pub fn referrer_of(&self, user: &Pubkey) -> Option<Pubkey> {
        self.referrers.get(user).copied()
    }

    pub fn referrals_count(&self, referrer: &Pubkey) -> u64 {
        self.referrals_count.value(referrer)
    }

    pub fn total_commission(&self, referrer: &Pubkey) -> u64 {
        self.total_commissions.value(referrer)
    }

    pub fn claimed_commission(&self, referrer: &Pubkey) -> u64 {
        self.claimed_commission.value(referrer)
    }

    pub fn claimable_commission(&self, referrer: &Pubkey) -> u64 {
        self.total_commission(referrer) - self.claimed_commission(referrer)
    }

    /// Recorded but unclaimed commission across all referrers.
    pub fn outstanding_commission(&self) -> u64 {
        self.outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        registry: ReferralRegistry,
        owner:    Pubkey,
        operator: Pubkey,
        events:   EventLog,
    }

    fn fixture() -> Fixture {
        let owner = Pubkey::new_unique();
        let operator = Pubkey::new_unique();
        let mut events = EventLog::new();
        let mut registry = ReferralRegistry::new(owner);
        registry.update_operator(&owner, operator, true, &mut events).unwrap();
        Fixture { registry, owner, operator, events }
    }

    #[test]
    fn only_owner_updates_operators() {
        let Fixture { mut registry, owner, operator, mut events } = fixture();
        let carol = Pubkey::new_unique();
        let err = registry.update_operator(&carol, carol, true, &mut events).unwrap_err();
        assert_eq!(err.code(), "Unauthorized");

        registry.update_operator(&owner, operator, false, &mut events).unwrap();
        assert!(!registry.is_operator(&operator));
        let err = registry
            .record_referral(&operator, Pubkey::new_unique(), Pubkey::new_unique(), &mut events)
            .unwrap_err();
        assert_eq!(err.code(), "Unauthorized");
    }

    #[test]
    fn ownership_moves_operator_control() {
        let Fixture { mut registry, owner, operator, mut events } = fixture();
        let next = Pubkey::new_unique();
        assert_eq!(
            registry.transfer_ownership(&owner, Pubkey::default()).unwrap_err(),
            FarmError::ZeroAddress("transfer_ownership")
        );
        registry.transfer_ownership(&owner, next).unwrap();
        assert_eq!(registry.owner(), next);
        assert!(registry.update_operator(&owner, operator, false, &mut events).is_err());
        registry.update_operator(&next, operator, false, &mut events).unwrap();
    }

    #[test]
    fn junk_referrals_are_ignored() {
        let Fixture { mut registry, operator, mut events, .. } = fixture();
        let alice = Pubkey::new_unique();
        let referrer = Pubkey::new_unique();
        let zero = Pubkey::default();

        assert!(!registry.record_referral(&operator, zero, referrer, &mut events).unwrap());
        assert!(!registry.record_referral(&operator, alice, zero, &mut events).unwrap());
        assert!(!registry.record_referral(&operator, zero, zero, &mut events).unwrap());
        assert!(!registry.record_referral(&operator, alice, alice, &mut events).unwrap());
        assert_eq!(registry.referrer_of(&alice), None);
        assert_eq!(registry.referrals_count(&referrer), 0);
    }

    #[test]
    fn first_referrer_sticks() {
        let Fixture { mut registry, operator, mut events, .. } = fixture();
        let (alice, bob, carol, referrer) =
            (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        assert!(registry.record_referral(&operator, alice, referrer, &mut events).unwrap());
        assert_eq!(registry.referrer_of(&alice), Some(referrer));
        assert_eq!(registry.referrals_count(&referrer), 1);

        assert!(!registry.record_referral(&operator, alice, bob, &mut events).unwrap());
        assert_eq!(registry.referrer_of(&alice), Some(referrer));
        assert_eq!(registry.referrals_count(&bob), 0);

        assert!(registry.record_referral(&operator, carol, referrer, &mut events).unwrap());
        assert_eq!(registry.referrals_count(&referrer), 2);
    }

    #[test]
    fn commission_accumulates() {
        let Fixture { mut registry, operator, mut events, .. } = fixture();
        let referrer = Pubkey::new_unique();
        let stranger = Pubkey::new_unique();

        let err = registry.record_commission(&stranger, referrer, 1, &mut events).unwrap_err();
        assert_eq!(err.code(), "Unauthorized");

        registry.record_commission(&operator, referrer, 1, &mut events).unwrap();
        registry.record_commission(&operator, referrer, 0, &mut events).unwrap();
        assert_eq!(registry.total_commission(&referrer), 1);
        registry.record_commission(&operator, referrer, 111, &mut events).unwrap();
        assert_eq!(registry.total_commission(&referrer), 112);

        registry.record_commission(&operator, Pubkey::default(), 100, &mut events).unwrap();
        assert_eq!(registry.total_commission(&Pubkey::default()), 0);
    }

    #[test]
    fn claims_drain_outstanding_but_not_total() {
        let Fixture { mut registry, operator, mut events, .. } = fixture();
        let referrer = Pubkey::new_unique();
        registry.record_commission(&operator, referrer, 50, &mut events).unwrap();

        assert_eq!(registry.take_claimable(&operator, &referrer).unwrap(), 50);
        assert_eq!(registry.take_claimable(&operator, &referrer).unwrap(), 0);
        assert_eq!(registry.total_commission(&referrer), 50);

        registry.record_commission(&operator, referrer, 7, &mut events).unwrap();
        registry.record_commission(&operator, Pubkey::new_unique(), 3, &mut events).unwrap();
        assert_eq!(registry.claimable_commission(&referrer), 7);
        assert_eq!(registry.outstanding_commission(), 10);
    }

    #[test]
    fn rollback_discards_referrals_and_commission() {
        let Fixture { mut registry, owner, operator, mut events } = fixture();
        let (alice, referrer) = (Pubkey::new_unique(), Pubkey::new_unique());
        registry.record_commission(&operator, referrer, 5, &mut events).unwrap();

        registry.checkpoint();
        registry.record_referral(&operator, alice, referrer, &mut events).unwrap();
        registry.record_commission(&operator, referrer, 20, &mut events).unwrap();
        registry.take_claimable(&operator, &referrer).unwrap();
        registry.update_operator(&owner, operator, false, &mut events).unwrap();
        registry.transfer_ownership(&owner, Pubkey::new_unique()).unwrap();
        registry.rollback();

        assert_eq!(registry.owner(), owner);
        assert!(registry.is_operator(&operator));
        assert_eq!(registry.referrer_of(&alice), None);
        assert_eq!(registry.referrals_count(&referrer), 0);
        assert_eq!(registry.total_commission(&referrer), 5);
        assert_eq!(registry.claimable_commission(&referrer), 5);
        assert_eq!(registry.outstanding_commission(), 5);
    }

    #[test]
    fn emits_one_event_per_accepted_write() {
        let Fixture { mut registry, operator, mut events, .. } = fixture();
        events.commit();
        let before = events.committed().len();
        let (alice, referrer) = (Pubkey::new_unique(), Pubkey::new_unique());
        registry.record_referral(&operator, alice, referrer, &mut events).unwrap();
        registry.record_referral(&operator, alice, Pubkey::new_unique(), &mut events).unwrap();
        registry.record_commission(&operator, referrer, 0, &mut events).unwrap();
        events.commit();
        assert_eq!(events.committed().len(), before + 1);
    }
}

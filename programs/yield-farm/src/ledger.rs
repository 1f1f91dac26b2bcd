//! The reward ledger: per-pool accumulators, per-user reward debt, and the
//! transactional envelope every public operation runs in.

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::{
    asset::FungibleAssetPort,
    error::{FarmError, Result},
    events::{EventLog, FarmEvent},
    journal::JournaledMap,
    math,
    pools::PoolRegistry,
    referral::ReferralRegistry,
    roles::Roles,
    state::{Clock, FarmAccounts, FarmConfig, Pool, PoolId, UserStake, VestingAccount},
    vesting::VestingVault,
};

/// Everything an operation may mutate.
///
/// Per-account books are journaled, so rolling back touches only the rows an
/// operation wrote. Settings and the pool list are few and copied whole.
#[derive(Debug)]
pub(crate) struct FarmState {
    pub config:   FarmConfig,
    pub roles:    Roles,
    pub pools:    PoolRegistry,
    pub stakes:   JournaledMap<(PoolId, Pubkey), UserStake>,
    pub referral: ReferralRegistry,
    pub vault:    VestingVault,
    saved:        Option<(FarmConfig, Roles, PoolRegistry)>,
}

impl FarmState {
    fn checkpoint(&mut self) {
        self.saved = Some((self.config.clone(), self.roles, self.pools.clone()));
        self.stakes.checkpoint();
        self.referral.checkpoint();
        self.vault.checkpoint();
    }

    fn commit(&mut self) {
        self.saved = None;
        self.stakes.commit();
        self.referral.commit();
        self.vault.commit();
    }

    fn rollback(&mut self) {
        if let Some((config, roles, pools)) = self.saved.take() {
            self.config = config;
            self.roles = roles;
            self.pools = pools;
        }
        self.stakes.rollback();
        self.referral.rollback();
        self.vault.rollback();
    }
}

/// Multi-pool farm over an injected asset port.
///
/// Each public operation is atomic: it either completes or leaves ledger
/// state, asset balances and the event log exactly as they were.
pub struct Farm<A: FungibleAssetPort> {
    pub(crate) authority:     Pubkey,
    pub(crate) vault_custody: Pubkey,
    pub(crate) reward_asset:  Pubkey,
    pub(crate) state:         FarmState,
    pub(crate) assets:        A,
    pub(crate) events:        EventLog,
    entered:                  bool,
}

impl<A: FungibleAssetPort> Farm<A> {
    pub fn new(assets: A, accounts: FarmAccounts, config: FarmConfig) -> Result<Self> {
        accounts.validate()?;
        config.validate()?;

        let mut events = EventLog::new();
        let mut referral = ReferralRegistry::new(accounts.operator);
        referral.update_operator(&accounts.operator, accounts.authority, true, &mut events)?;
        events.commit();
        let vault = VestingVault::new(accounts.authority, config.vesting)?;

        info!(
            authority = %accounts.authority,
            reward_asset = %accounts.reward_asset,
            emission_per_block = config.emission_per_block,
            start_block = config.start_block,
            "farm initialized"
        );
        Ok(Self {
            authority:     accounts.authority,
            vault_custody: accounts.vault_custody,
            reward_asset:  accounts.reward_asset,
            state: FarmState {
                config,
                roles: Roles {
                    operator: accounts.operator,
                    dev:      accounts.dev,
                    treasury: accounts.treasury,
                },
                pools: PoolRegistry::new(),
                stakes: JournaledMap::new(),
                referral,
                vault,
                saved: None,
            },
            assets,
            events,
            entered: false,
        })
    }

    // ── Transaction envelope ──────────────────────────────────────────────────

    /// Run `body` as one all-or-nothing unit guarded against re-entry.
    pub(crate) fn atomic<T>(
        &mut self,
        op: &'static str,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.entered {
            warn!(op, "re-entrant call rejected");
            return Err(FarmError::Reentrancy);
        }
        self.entered = true;
        self.state.checkpoint();
        self.assets.checkpoint();

        let outcome = body(self);
        match &outcome {
            Ok(_) => {
                self.state.commit();
                self.assets.commit();
                self.events.commit();
            }
            Err(e) => {
                self.state.rollback();
                self.assets.rollback();
                self.events.discard();
                warn!(op, code = e.code(), error = %e, "operation aborted");
            }
        }
        self.entered = false;
        outcome
    }

    // ── Accrual ───────────────────────────────────────────────────────────────

    /// Bring `acc_reward_per_share` of one pool up to `block`, minting the
    /// pool's emission into farm custody.
    pub(crate) fn accrue(&mut self, pid: PoolId, block: u64) -> Result<()> {
        let total_alloc_point = self.state.pools.total_alloc_point();
        let config = &self.state.config;
        let (bonus_end, bonus_multiplier, emission) =
            (config.bonus_end_block, config.bonus_multiplier, config.emission_per_block);

        let pool = self.state.pools.get(pid)?;
        if block <= pool.last_reward_block {
            return Ok(());
        }
        if pool.total_staked == 0 || pool.alloc_point == 0 || total_alloc_point == 0 {
            self.state.pools.get_mut(pid)?.last_reward_block = block;
            return Ok(());
        }

        let multiplier = math::block_range_multiplier(pool.last_reward_block, block, bonus_end, bonus_multiplier)?;
        let reward = math::pool_reward(multiplier, emission, pool.alloc_point, total_alloc_point)?;
        let total_staked = pool.total_staked;
        let minted = if reward > 0 {
            self.assets.mint(&self.reward_asset, &self.authority, reward)?
        } else {
            0
        };
        let delta = math::acc_per_share_delta(minted, total_staked)?;

        let pool = self.state.pools.get_mut(pid)?;
        pool.acc_reward_per_share = pool
            .acc_reward_per_share
            .checked_add(delta)
            .ok_or(FarmError::MathOverflow)?;
        pool.last_reward_block = block;
        debug!(
            pid,
            block,
            multiplier,
            reward,
            minted,
            acc_reward_per_share = pool.acc_reward_per_share,
            "pool accrued"
        );
        Ok(())
    }

    /// Accrue every pool to `block`.
    pub(crate) fn accrue_all(&mut self, block: u64) -> Result<()> {
        for pid in 0..self.state.pools.len() {
            self.accrue(pid, block)?;
        }
        Ok(())
    }

    // ── Harvest settlement ────────────────────────────────────────────────────

    /// Route `pending` reward of `user`: mint the referral commission on top,
    /// then lock the reward in the vesting vault. Returns the amount paid.
    ///
    /// Per-user rounding can leave the sum of pending rewards a few units above
    /// what was minted, so the payout is capped at the custody balance not
    /// reserved for commission or stake.
    pub(crate) fn settle_pending(&mut self, pid: PoolId, user: Pubkey, pending: u64, clock: &Clock) -> Result<u64> {
        if pending == 0 {
            return Ok(0);
        }

        let reserved = self
            .state
            .referral
            .outstanding_commission()
            .checked_add(self.state.pools.staked_of(&self.reward_asset))
            .ok_or(FarmError::MathOverflow)?;
        let spare = self
            .assets
            .balance_of(&self.reward_asset, &self.authority)
            .saturating_sub(reserved);
        let payout = pending.min(spare);
        if payout < pending {
            warn!(%user, pid, pending, payout, "reward custody short, paying what is left");
        }
        if payout == 0 {
            return Ok(0);
        }

        if let Some(referrer) = self.state.referral.referrer_of(&user) {
            let commission = math::referral_commission(payout, self.state.config.referral_commission_bps)?;
            if commission > 0 {
                let minted = self.assets.mint(&self.reward_asset, &self.authority, commission)?;
                self.state
                    .referral
                    .record_commission(&self.authority, referrer, minted, &mut self.events)?;
            }
        }

        let locked = self
            .assets
            .transfer(&self.reward_asset, &self.authority, &self.vault_custody, payout)?;
        if locked == 0 {
            return Err(FarmError::ZeroReceived { requested: payout });
        }
        self.state
            .vault
            .deposit_locked(&self.authority, user, locked, clock.unix_timestamp, &mut self.events)?;

        info!(%user, pid, pending, locked, "reward harvested");
        self.events.emit(FarmEvent::Harvest { user, pid, amount: payout });
        Ok(payout)
    }

    pub(crate) fn pool_snapshot(&self, pid: PoolId) -> Result<(Pubkey, u16, u128)> {
        let pool = self.state.pools.get(pid)?;
        Ok((pool.stake_asset, pool.deposit_fee_bps, pool.acc_reward_per_share))
    }

    pub(crate) fn store_stake(&mut self, pid: PoolId, user: Pubkey, stake: UserStake) {
        self.state.stakes.insert((pid, user), stake);
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Reward `user` could harvest from `pid` at `block`, without minting.
    pub fn pending_reward(&self, pid: PoolId, user: &Pubkey, block: u64) -> Result<u64> {
        let pool = self.state.pools.get(pid)?;
        let total_alloc_point = self.state.pools.total_alloc_point();
        let config = &self.state.config;

        let mut acc = pool.acc_reward_per_share;
        if block > pool.last_reward_block && pool.total_staked != 0 {
            let multiplier = math::block_range_multiplier(
                pool.last_reward_block,
                block,
                config.bonus_end_block,
                config.bonus_multiplier,
            )?;
            let reward = math::pool_reward(multiplier, config.emission_per_block, pool.alloc_point, total_alloc_point)?;
            acc = acc
                .checked_add(math::acc_per_share_delta(reward, pool.total_staked)?)
                .ok_or(FarmError::MathOverflow)?;
        }
        self.user_stake(pid, user).pending(acc)
    }

    pub fn authority(&self) -> Pubkey {
        self.authority
    }

    pub fn vault_custody(&self) -> Pubkey {
        self.vault_custody
    }

    pub fn reward_asset(&self) -> Pubkey {
        self.reward_asset
    }

    pub fn config(&self) -> &FarmConfig {
        &self.state.config
    }

    pub fn roles(&self) -> &Roles {
        &self.state.roles
    }

    pub fn pool_count(&self) -> usize {
        self.state.pools.len()
    }

    pub fn pool(&self, pid: PoolId) -> Result<&Pool> {
        self.state.pools.get(pid)
    }

    pub fn pools(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.state.pools.iter()
    }

    pub fn total_alloc_point(&self) -> u64 {
        self.state.pools.total_alloc_point()
    }

    /// Stake of `user` in `pid`; all-zero if the user never touched the pool.
    pub fn user_stake(&self, pid: PoolId, user: &Pubkey) -> UserStake {
        self.state.stakes.value(&(pid, *user))
    }

    /// Every stake row ever created, ordered by pool then account.
    pub fn stakes(&self) -> impl Iterator<Item = (PoolId, &Pubkey, &UserStake)> {
        self.state.stakes.iter().map(|((pid, user), stake)| (*pid, user, stake))
    }

    pub fn referral(&self) -> &ReferralRegistry {
        &self.state.referral
    }

    pub fn referrer_of(&self, user: &Pubkey) -> Option<Pubkey> {
        self.state.referral.referrer_of(user)
    }

    pub fn total_commission(&self, referrer: &Pubkey) -> u64 {
        self.state.referral.total_commission(referrer)
    }

    pub fn referrals_count(&self, referrer: &Pubkey) -> u64 {
        self.state.referral.referrals_count(referrer)
    }

    pub fn claimable_commission(&self, referrer: &Pubkey) -> u64 {
        self.state.referral.claimable_commission(referrer)
    }

    pub fn vault(&self) -> &VestingVault {
        &self.state.vault
    }

    pub fn vesting_account(&self, beneficiary: &Pubkey) -> VestingAccount {
        self.state.vault.account(beneficiary)
    }

    pub fn vested_amount(&self, beneficiary: &Pubkey, now: i64) -> u64 {
        self.state.vault.vested_amount(beneficiary, now)
    }

    pub fn unlocked_amount(&self, beneficiary: &Pubkey, now: i64) -> u64 {
        self.state.vault.unlocked_amount(beneficiary, now)
    }

    pub fn events(&self) -> &[FarmEvent] {
        self.events.committed()
    }

    pub fn drain_events(&mut self) -> Vec<FarmEvent> {
        self.events.drain()
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// Direct access to the port, for seeding balances between operations.
    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::InMemoryAssets;

    struct Fixture {
        farm:     Farm<InMemoryAssets>,
        accounts: FarmAccounts,
        lp:       Pubkey,
        alice:    Pubkey,
    }

    fn fixture() -> Fixture {
        let accounts = FarmAccounts {
            authority:     Pubkey::new_unique(),
            vault_custody: Pubkey::new_unique(),
            reward_asset:  Pubkey::new_unique(),
            operator:      Pubkey::new_unique(),
            dev:           Pubkey::new_unique(),
            treasury:      Pubkey::new_unique(),
        };
        let config = FarmConfig { emission_per_block: 1, ..FarmConfig::default() };
        let mut farm = Farm::new(InMemoryAssets::new(), accounts, config).unwrap();
        let lp = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        farm.assets_mut().credit(lp, alice, 1_000).unwrap();
        farm.add_pool(accounts.operator, lp, 1_000, 0, false, Clock::new(0, 0)).unwrap();
        Fixture { farm, accounts, lp, alice }
    }

    #[test]
    fn constructor_wires_collaborators() {
        let Fixture { farm, accounts, .. } = fixture();
        assert!(farm.referral().is_operator(&accounts.authority));
        assert_eq!(farm.referral().owner(), accounts.operator);
        assert_eq!(farm.vault().depositor(), accounts.authority);
        assert_eq!(farm.roles().treasury, accounts.treasury);
    }

    #[test]
    fn constructor_rejects_invalid_config() {
        let Fixture { accounts, .. } = fixture();
        let config = FarmConfig { referral_commission_bps: 5_000, ..FarmConfig::default() };
        let err = Farm::new(InMemoryAssets::new(), accounts, config).err().unwrap();
        assert_eq!(err.code(), "InvalidCommissionRate");
    }

    #[test]
    fn reentrant_call_is_rejected() {
        let Fixture { mut farm, lp, alice, .. } = fixture();
        let err = farm
            .atomic("outer", |f| f.deposit(alice, 0, 100, Pubkey::default(), Clock::new(1, 0)))
            .unwrap_err();
        assert_eq!(err, FarmError::Reentrancy);
        assert_eq!(farm.user_stake(0, &alice).amount, 0);

        // Guard is released afterwards
        farm.deposit(alice, 0, 100, Pubkey::default(), Clock::new(1, 0)).unwrap();
        assert_eq!(farm.assets().balance_of(&lp, &alice), 900);
    }

    #[test]
    fn failed_operation_leaves_no_trace() {
        let Fixture { mut farm, accounts, alice, .. } = fixture();
        farm.deposit(alice, 0, 100, Pubkey::default(), Clock::new(0, 0)).unwrap();
        let events_before = farm.events().len();
        let pool_before = farm.pool(0).unwrap().clone();

        // Accrual mints 10 before the transfer fails on balance
        let err = farm
            .deposit(alice, 0, 5_000, Pubkey::default(), Clock::new(10, 0))
            .unwrap_err();
        assert_eq!(err.code(), "InsufficientBalance");

        assert_eq!(farm.pool(0).unwrap(), &pool_before);
        assert_eq!(farm.assets().total_supply(&accounts.reward_asset), 0);
        assert_eq!(farm.vesting_account(&alice), VestingAccount::default());
        assert_eq!(farm.events().len(), events_before);
    }

    #[test]
    fn rollback_after_partial_writes_restores_every_book() {
        let Fixture { mut farm, accounts, lp, alice } = fixture();
        let bob = Pubkey::new_unique();
        let others: Vec<Pubkey> = (0..50).map(|_| Pubkey::new_unique()).collect();
        for user in &others {
            farm.assets_mut().credit(lp, *user, 10).unwrap();
            farm.deposit(*user, 0, 10, Pubkey::default(), Clock::new(0, 0)).unwrap();
        }
        farm.deposit(alice, 0, 500, Pubkey::default(), Clock::new(0, 0)).unwrap();
        let stakes_before: Vec<UserStake> = farm.stakes().map(|(_, _, s)| *s).collect();

        // Accrues, records bob as referrer and locks alice's reward in the
        // vault before the stake transfer fails
        let err = farm.deposit(alice, 0, 5_000, bob, Clock::new(10, 0)).unwrap_err();
        assert_eq!(err.code(), "InsufficientBalance");

        assert_eq!(farm.referrer_of(&alice), None);
        assert_eq!(farm.referrals_count(&bob), 0);
        assert_eq!(farm.vault().outstanding(), 0);
        assert_eq!(farm.vesting_account(&alice), VestingAccount::default());
        assert_eq!(farm.assets().total_supply(&accounts.reward_asset), 0);
        assert_eq!(farm.stakes().map(|(_, _, s)| *s).collect::<Vec<_>>(), stakes_before);
        assert_eq!(farm.state.stakes.journal_len(), 0);

        farm.deposit(alice, 0, 0, bob, Clock::new(10, 0)).unwrap();
        assert_eq!(farm.referrer_of(&alice), Some(bob));
    }

    #[test]
    fn accrual_skips_empty_pool() {
        let Fixture { mut farm, accounts, .. } = fixture();
        farm.update_pool(0, Clock::new(50, 0)).unwrap();
        let pool = farm.pool(0).unwrap();
        assert_eq!(pool.last_reward_block, 50);
        assert_eq!(pool.acc_reward_per_share, 0);
        assert_eq!(farm.assets().total_supply(&accounts.reward_asset), 0);
    }

    #[test]
    fn pending_view_matches_harvest() {
        let Fixture { mut farm, alice, .. } = fixture();
        farm.deposit(alice, 0, 100, Pubkey::default(), Clock::new(0, 0)).unwrap();
        assert_eq!(farm.pending_reward(0, &alice, 7).unwrap(), 7);
        assert_eq!(farm.harvest(alice, 0, Clock::new(7, 0)).unwrap(), 7);
        assert_eq!(farm.pending_reward(0, &alice, 7).unwrap(), 0);
    }

    #[test]
    fn capped_mint_only_credits_what_was_minted() {
        let Fixture { mut farm, accounts, alice, .. } = fixture();
        farm.assets_mut()
            .set_rules(
                accounts.reward_asset,
                crate::asset::AssetRules { max_supply: Some(4), ..Default::default() },
            )
            .unwrap();
        farm.deposit(alice, 0, 100, Pubkey::default(), Clock::new(0, 0)).unwrap();
        assert_eq!(farm.harvest(alice, 0, Clock::new(10, 0)).unwrap(), 4);
        assert_eq!(farm.vesting_account(&alice).total_locked, 4);
    }
}

mod add_pool;
mod admin;
mod claim;
mod deposit;
mod emergency_withdraw;
mod harvest;
mod set_pool;
mod update_pool;
mod withdraw;

use solana_sdk::pubkey::Pubkey;

use crate::{
    asset::FungibleAssetPort,
    error::Result,
    ledger::Farm,
    roles::Role,
    state::{Clock, PoolId},
};

// ─── Entry points ─────────────────────────────────────────────────────────────
// Each call runs its handler inside one atomic, non-reentrant unit of work.

impl<A: FungibleAssetPort> Farm<A> {
    // ── Pools ────────────────────────────────────────────────────────────────

    pub fn add_pool(
        &mut self,
        caller: Pubkey,
        stake_asset: Pubkey,
        alloc_point: u64,
        deposit_fee_bps: u16,
        with_update: bool,
        clock: Clock,
    ) -> Result<PoolId> {
        self.atomic("add_pool", |farm| {
            add_pool::handler(farm, caller, stake_asset, alloc_point, deposit_fee_bps, with_update, clock)
        })
    }

    pub fn set_pool(
        &mut self,
        caller: Pubkey,
        pid: PoolId,
        alloc_point: u64,
        deposit_fee_bps: u16,
        with_update: bool,
        clock: Clock,
    ) -> Result<()> {
        self.atomic("set_pool", |farm| {
            set_pool::handler(farm, caller, pid, alloc_point, deposit_fee_bps, with_update, clock)
        })
    }

    pub fn update_pool(&mut self, pid: PoolId, clock: Clock) -> Result<()> {
        self.atomic("update_pool", |farm| update_pool::handler(farm, pid, clock))
    }

    pub fn mass_update_pools(&mut self, clock: Clock) -> Result<()> {
        self.atomic("mass_update_pools", |farm| update_pool::mass_handler(farm, clock))
    }

    // ── Staking ──────────────────────────────────────────────────────────────

    /// Stake into `pid`; pass `Pubkey::default()` as `referrer` for none.
    /// Returns the amount credited after transfer tax and deposit fee.
    pub fn deposit(&mut self, caller: Pubkey, pid: PoolId, amount: u64, referrer: Pubkey, clock: Clock) -> Result<u64> {
        self.atomic("deposit", |farm| deposit::handler(farm, caller, pid, amount, referrer, clock))
    }

    pub fn withdraw(&mut self, caller: Pubkey, pid: PoolId, amount: u64, clock: Clock) -> Result<()> {
        self.atomic("withdraw", |farm| withdraw::handler(farm, caller, pid, amount, clock))
    }

    pub fn harvest(&mut self, caller: Pubkey, pid: PoolId, clock: Clock) -> Result<u64> {
        self.atomic("harvest", |farm| harvest::handler(farm, caller, pid, clock))
    }

    pub fn emergency_withdraw(&mut self, caller: Pubkey, pid: PoolId, clock: Clock) -> Result<u64> {
        self.atomic("emergency_withdraw", |farm| emergency_withdraw::handler(farm, caller, pid, clock))
    }

    // ── Claims ───────────────────────────────────────────────────────────────

    pub fn withdraw_vested(&mut self, caller: Pubkey, amount: u64, clock: Clock) -> Result<u64> {
        self.atomic("withdraw_vested", |farm| claim::withdraw_vested(farm, caller, amount, clock))
    }

    pub fn claim_commission(&mut self, caller: Pubkey) -> Result<u64> {
        self.atomic("claim_commission", |farm| claim::claim_commission(farm, caller))
    }

    // ── Administration ───────────────────────────────────────────────────────

    pub fn set_dev_address(&mut self, caller: Pubkey, new_dev: Pubkey) -> Result<()> {
        self.atomic("set_dev_address", |farm| {
            admin::rotate_role(farm, Role::Dev, caller, new_dev, "set_dev_address")
        })
    }

    pub fn set_treasury_address(&mut self, caller: Pubkey, new_treasury: Pubkey) -> Result<()> {
        self.atomic("set_treasury_address", |farm| {
            admin::rotate_role(farm, Role::Treasury, caller, new_treasury, "set_treasury_address")
        })
    }

    pub fn transfer_operator(&mut self, caller: Pubkey, new_operator: Pubkey) -> Result<()> {
        self.atomic("transfer_operator", |farm| {
            admin::rotate_role(farm, Role::Operator, caller, new_operator, "transfer_operator")
        })
    }

    pub fn update_referral_operator(&mut self, caller: Pubkey, operator: Pubkey, enabled: bool) -> Result<()> {
        self.atomic("update_referral_operator", |farm| {
            admin::update_referral_operator(farm, caller, operator, enabled)
        })
    }

    pub fn update_emission_rate(&mut self, caller: Pubkey, emission_per_block: u64, clock: Clock) -> Result<()> {
        self.atomic("update_emission_rate", |farm| {
            admin::update_emission_rate(farm, caller, emission_per_block, clock)
        })
    }

    pub fn set_referral_commission_rate(&mut self, caller: Pubkey, rate_bps: u16) -> Result<()> {
        self.atomic("set_referral_commission_rate", |farm| {
            admin::set_referral_commission_rate(farm, caller, rate_bps)
        })
    }
}

//! Vesting vault for harvested reward.
//!
//! Reward is never paid out directly: the ledger locks it here and the
//! beneficiary withdraws what the schedule has released. Each new deposit
//! re-anchors the schedule of the *entire* locked balance at the deposit time,
//! so topping up restarts the release clock instead of vesting per tranche.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    constants::*,
    error::{FarmError, Result},
    events::{EventLog, FarmEvent},
    journal::JournaledMap,
    state::VestingAccount,
};

// ─── Schedule ─────────────────────────────────────────────────────────────────

/// Release curve: linear over `duration_secs`, advancing in whole
/// `release_interval_secs` steps (1 = continuous).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub duration_secs:         i64,
    pub release_interval_secs: i64,
}

impl Default for VestingSchedule {
    fn default() -> Self {
        Self::linear(DEFAULT_VESTING_DURATION_SECS)
    }
}

impl VestingSchedule {
    pub fn linear(duration_secs: i64) -> Self {
        Self { duration_secs, release_interval_secs: 1 }
    }

    /// 20 % every 30 days, fully released after 150 days.
    pub fn monthly() -> Self {
        Self {
            duration_secs:         DEFAULT_VESTING_DURATION_SECS,
            release_interval_secs: MONTHLY_RELEASE_INTERVAL_SECS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_secs <= 0 || self.release_interval_secs <= 0 {
            return Err(FarmError::InvalidArgument(format!(
                "vesting duration ({}) and release interval ({}) must be positive",
                self.duration_secs, self.release_interval_secs
            )));
        }
        if self.release_interval_secs > self.duration_secs {
            return Err(FarmError::InvalidArgument(format!(
                "release interval {} exceeds vesting duration {}",
                self.release_interval_secs, self.duration_secs
            )));
        }
        Ok(())
    }

    /// Portion of `total` released `elapsed` seconds after the anchor.
    pub fn released(&self, total: u64, elapsed: i64) -> u64 {
        if elapsed <= 0 {
            return 0;
        }
        let stepped = elapsed - elapsed % self.release_interval_secs;
        if stepped >= self.duration_secs {
            return total;
        }
        (total as u128 * stepped as u128 / self.duration_secs as u128) as u64
    }
}

// ─── Vault ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VestingVault {
    /// The only account allowed to lock reward (the farm ledger)
    depositor: Pubkey,
    schedule:  VestingSchedule,
    accounts:  JournaledMap<Pubkey, VestingAccount>,
    /// Locked minus withdrawn, summed over beneficiaries
    outstanding: u64,
    saved_outstanding: Option<u64>,
}

impl VestingVault {
    pub fn new(depositor: Pubkey, schedule: VestingSchedule) -> Result<Self> {
        schedule.validate()?;
        Ok(Self {
            depositor,
            schedule,
            accounts: JournaledMap::new(),
            outstanding: 0,
            saved_outstanding: None,
        })
    }

    pub(crate) fn checkpoint(&mut self) {
        self.saved_outstanding = Some(self.outstanding);
        self.accounts.checkpoint();
    }

    pub(crate) fn commit(&mut self) {
        self.saved_outstanding = None;
        self.accounts.commit();
    }

    pub(crate) fn rollback(&mut self) {
        if let Some(outstanding) = self.saved_outstanding.take() {
            self.outstanding = outstanding;
        }
        self.accounts.rollback();
    }

    pub fn depositor(&self) -> Pubkey {
        self.depositor
    }

    pub fn schedule(&self) -> VestingSchedule {
        self.schedule
    }

    pub fn outstanding(&self) -> u64 {
        self.outstanding
    }

    pub fn account(&self, beneficiary: &Pubkey) -> VestingAccount {
        self.accounts.value(beneficiary)
    }

    /// Lock `amount` for `beneficiary` and restart its schedule at `now`.
    pub fn deposit_locked(
        &mut self,
        caller: &Pubkey,
        beneficiary: Pubkey,
        amount: u64,
        now: i64,
        events: &mut EventLog,
    ) -> Result<()> {
        if *caller != self.depositor {
            return Err(FarmError::Unauthorized { op: "deposit_locked", caller: *caller });
        }
        if beneficiary == Pubkey::default() {
            return Err(FarmError::ZeroAddress("deposit_locked"));
        }
        let outstanding = self.outstanding.checked_add(amount).ok_or(FarmError::MathOverflow)?;
        let mut account = self.account(&beneficiary);
        account.total_locked = account
            .total_locked
            .checked_add(amount)
            .ok_or(FarmError::MathOverflow)?;
        account.last_deposit_time = now;
        self.accounts.insert(beneficiary, account);
        self.outstanding = outstanding;

        info!(%beneficiary, amount, total_locked = account.total_locked, "reward locked");
        events.emit(FarmEvent::VestingDeposit { beneficiary, amount });
        Ok(())
    }

    /// Gross amount released so far, never below what was already withdrawn.
    pub fn vested_amount(&self, beneficiary: &Pubkey, now: i64) -> u64 {
        let account = self.account(beneficiary);
        let released = self
            .schedule
            .released(account.total_locked, now - account.last_deposit_time);
        released.max(account.total_withdrawn)
    }

    /// Released and not yet withdrawn.
    pub fn unlocked_amount(&self, beneficiary: &Pubkey, now: i64) -> u64 {
        let account = self.account(beneficiary);
        self.vested_amount(beneficiary, now) - account.total_withdrawn
    }

    /// Book a withdrawal of `amount` by `caller`. The ledger moves the tokens.
    pub fn withdraw(&mut self, caller: Pubkey, amount: u64, now: i64, events: &mut EventLog) -> Result<()> {
        let unlocked = self.unlocked_amount(&caller, now);
        if amount > unlocked {
            return Err(FarmError::InsufficientUnlocked { requested: amount, unlocked });
        }
        if amount == 0 {
            return Ok(());
        }
        let mut account = self.account(&caller);
        account.total_withdrawn += amount;
        self.accounts.insert(caller, account);
        self.outstanding -= amount;

        info!(beneficiary = %caller, amount, total_withdrawn = account.total_withdrawn, "vested reward withdrawn");
        events.emit(FarmEvent::VestingWithdrawal { beneficiary: caller, amount });
        Ok(())
    }
}

//! Yield Farm: multi-pool staking ledger with block-based reward emission,
//! deposit fees, referral commission and vested payouts.
//!
//! Operations on [`Farm`]:
//!   add_pool / set_pool           operator-managed pool set and weights
//!   deposit / withdraw / harvest  stake, unstake, settle pending reward
//!   emergency_withdraw            leave a pool immediately, forfeiting reward
//!   withdraw_vested               release unlocked reward from the vault
//!   claim_commission              pay out accrued referral commission
//!   update_pool / mass_update_pools, role rotation, emission and rate updates
//!
//! Harvested reward is never paid directly: it is locked in the
//! [`VestingVault`] and released on a schedule. All value moves through an
//! injected [`FungibleAssetPort`]; [`InMemoryAssets`] is the reference port.

pub mod asset;
pub mod constants;
pub mod error;
pub mod events;
mod instructions;
pub mod journal;
pub mod ledger;
pub mod math;
pub mod pools;
pub mod referral;
pub mod roles;
pub mod state;
pub mod vesting;

pub use asset::{AssetRules, FungibleAssetPort, InMemoryAssets};
pub use error::{ErrorKind, FarmError, Result};
pub use events::FarmEvent;
pub use ledger::Farm;
pub use roles::{Role, Roles};
pub use state::{Clock, FarmAccounts, FarmConfig, Pool, PoolId, UserStake, VestingAccount};
pub use vesting::{VestingSchedule, VestingVault};

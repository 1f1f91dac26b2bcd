//! Farm error type.
//!
//! Every variant maps to a stable [`FarmError::code`] string; callers and
//! scenario files match on the code, never on the display text.

use solana_sdk::pubkey::Pubkey;

use crate::state::PoolId;

/// Broad class of a [`FarmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Validation,
    State,
    AssetTransfer,
    Arithmetic,
}

/// All errors returned by the farm ledger and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FarmError {
    // ── Authorization ────────────────────────────────────────────────────────
    /// Caller does not hold the role the operation requires.
    #[error("{op}: caller {caller} is not authorized")]
    Unauthorized { op: &'static str, caller: Pubkey },

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Deposit fee {0} bps exceeds the 10000 bps cap")]
    InvalidFeeRate(u16),

    #[error("Referral commission {rate} bps exceeds the {max} bps cap")]
    InvalidCommissionRate { rate: u16, max: u16 },

    #[error("Pool {0} does not exist")]
    InvalidPool(PoolId),

    #[error("A pool for stake asset {0} already exists")]
    DuplicatePool(Pubkey),

    /// A role or asset address was the all-zero key.
    #[error("{0}: zero address")]
    ZeroAddress(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ── State ────────────────────────────────────────────────────────────────
    #[error("Insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake { requested: u64, staked: u64 },

    #[error("Insufficient unlocked balance: requested {requested}, unlocked {unlocked}")]
    InsufficientUnlocked { requested: u64, unlocked: u64 },

    #[error("Insufficient balance of {asset} in {owner}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset:     Pubkey,
        owner:     Pubkey,
        requested: u64,
        available: u64,
    },

    #[error("Re-entrant call rejected while another operation is in progress")]
    Reentrancy,

    // ── Asset transfer ───────────────────────────────────────────────────────
    /// A non-zero transfer credited nothing to the receiver.
    #[error("Transfer of {requested} units delivered nothing")]
    ZeroReceived { requested: u64 },

    #[error("Asset transfer failed: {0}")]
    AssetTransfer(String),

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Integer overflow in reward / fee math")]
    MathOverflow,
}

impl FarmError {
    /// Stable machine-checkable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            FarmError::Unauthorized { .. }         => "Unauthorized",
            FarmError::InvalidFeeRate(_)           => "InvalidFeeRate",
            FarmError::InvalidCommissionRate { .. } => "InvalidCommissionRate",
            FarmError::InvalidPool(_)              => "InvalidPool",
            FarmError::DuplicatePool(_)            => "DuplicatePool",
            FarmError::ZeroAddress(_)              => "ZeroAddress",
            FarmError::InvalidArgument(_)          => "InvalidArgument",
            FarmError::InsufficientStake { .. }    => "InsufficientStake",
            FarmError::InsufficientUnlocked { .. } => "InsufficientUnlocked",
            FarmError::InsufficientBalance { .. }  => "InsufficientBalance",
            FarmError::Reentrancy                  => "Reentrancy",
            FarmError::ZeroReceived { .. }         => "ZeroReceived",
            FarmError::AssetTransfer(_)            => "AssetTransfer",
            FarmError::MathOverflow                => "MathOverflow",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FarmError::Unauthorized { .. } => ErrorKind::Authorization,
            FarmError::InvalidFeeRate(_)
            | FarmError::InvalidCommissionRate { .. }
            | FarmError::InvalidPool(_)
            | FarmError::DuplicatePool(_)
            | FarmError::ZeroAddress(_)
            | FarmError::InvalidArgument(_) => ErrorKind::Validation,
            FarmError::InsufficientStake { .. }
            | FarmError::InsufficientUnlocked { .. }
            | FarmError::InsufficientBalance { .. }
            | FarmError::Reentrancy => ErrorKind::State,
            FarmError::ZeroReceived { .. } | FarmError::AssetTransfer(_) => {
                ErrorKind::AssetTransfer
            }
            FarmError::MathOverflow => ErrorKind::Arithmetic,
        }
    }
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, FarmError>;

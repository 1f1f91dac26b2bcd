use solana_sdk::pubkey::Pubkey;

use crate::error::{FarmError, Result};

/// Role holders of a farm. Checked explicitly at the top of each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    /// Configures pools, emission and referral rate
    pub operator: Pubkey,
    /// Receives the dev share of deposit fees; rotates itself
    pub dev:      Pubkey,
    /// Receives the treasury share of deposit fees; rotates itself
    pub treasury: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Operator,
    Dev,
    Treasury,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Dev => "dev",
            Role::Treasury => "treasury",
        }
    }
}

impl Roles {
    pub fn holder(&self, role: Role) -> Pubkey {
        match role {
            Role::Operator => self.operator,
            Role::Dev => self.dev,
            Role::Treasury => self.treasury,
        }
    }

    /// Fail with `Unauthorized` unless `caller` currently holds `role`.
    pub fn require(&self, role: Role, caller: &Pubkey, op: &'static str) -> Result<()> {
        if self.holder(role) == *caller {
            Ok(())
        } else {
            Err(FarmError::Unauthorized { op, caller: *caller })
        }
    }

    /// Hand `role` from its current holder to `new_holder`; returns the previous holder.
    pub fn rotate(&mut self, role: Role, caller: &Pubkey, new_holder: Pubkey, op: &'static str) -> Result<Pubkey> {
        self.require(role, caller, op)?;
        if new_holder == Pubkey::default() {
            return Err(FarmError::ZeroAddress(op));
        }
        let slot = match role {
            Role::Operator => &mut self.operator,
            Role::Dev => &mut self.dev,
            Role::Treasury => &mut self.treasury,
        };
        Ok(std::mem::replace(slot, new_holder))
    }
}

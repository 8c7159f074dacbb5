use std::fmt::{Display, Formatter};

use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};
use type_layout::TypeLayout;

use crate::{
    assert_struct_align, assert_struct_size, check,
    constants::BIPS_DENOMINATOR,
    math_error,
    state::share_math::mul_div_floor,
    GovPoolError, GovPoolResult,
};

#[repr(u8)]
#[derive(Debug, Clone, Copy, AnchorDeserialize, AnchorSerialize, PartialEq, Eq, Default)]
pub enum OverrideState {
    #[default]
    Normal = 0,
    /// Voting weight forcibly redirected away from a non-qualifying
    /// delegatee; the original delegatee is still recorded on the deposit.
    Overridden = 1,
    /// The override's target was reassigned while the override stood.
    Migrated = 2,
}
unsafe impl Zeroable for OverrideState {}
unsafe impl Pod for OverrideState {}
impl Display for OverrideState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideState::Normal => write!(f, "Normal"),
            OverrideState::Overridden => write!(f, "Overridden"),
            OverrideState::Migrated => write!(f, "Migrated"),
        }
    }
}

assert_struct_size!(DelegateeDeposit, 208);
assert_struct_align!(DelegateeDeposit, 8);
#[account(zero_copy)]
#[repr(C)]
#[derive(Default, Debug, PartialEq, Eq, TypeLayout)]
pub struct DelegateeDeposit {
    pub pool: Pubkey,
    /// Holder-facing delegatee this deposit was created for. Never changes,
    /// even while an override points the voting weight elsewhere.
    pub delegatee: Pubkey,
    /// The collaborator-side deposit account this entry wraps.
    pub staker_deposit: Pubkey,
    /// Where the voting weight currently points while overridden.
    pub override_target: Pubkey,

    /// Mirror of the collaborator-side balance, updated by the delegation
    /// router before any external call is issued.
    pub balance: u64,

    pub override_state: OverrideState,
    pub bump: u8,
    pub _pad0: [u8; 6],

    pub _padding: [[u64; 2]; 4],
}

impl DelegateeDeposit {
    pub const LEN: usize = std::mem::size_of::<DelegateeDeposit>();

    pub fn add_balance(&mut self, amount: u64) -> GovPoolResult {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(math_error!())?;
        Ok(())
    }

    pub fn remove_balance(&mut self, amount: u64) -> GovPoolResult {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(math_error!())?;
        Ok(())
    }

    /// Any external call that moves this deposit's funds must target the
    /// collaborator account recorded at creation.
    pub fn verify_staker_deposit(&self, key: &Pubkey) -> GovPoolResult {
        check!(self.staker_deposit == *key, GovPoolError::InvalidDeposit);
        Ok(())
    }

    /// An override may only be enacted while the delegatee's externally
    /// reported earning power sits below `min_qualifying_bips` of the
    /// deposit's balance. Guards healthy delegatees against griefing.
    pub fn qualifies_for_override(
        &self,
        earning_power: u64,
        min_qualifying_bips: u64,
    ) -> GovPoolResult<bool> {
        let threshold = mul_div_floor(
            self.balance as u128,
            min_qualifying_bips as u128,
            BIPS_DENOMINATOR as u128,
        )?;
        Ok((earning_power as u128) < threshold)
    }

    pub fn enact_override(&mut self, target: Pubkey) -> GovPoolResult {
        check!(
            self.override_state == OverrideState::Normal,
            GovPoolError::DepositAlreadyOverridden
        );
        self.override_state = OverrideState::Overridden;
        self.override_target = target;
        Ok(())
    }

    /// Returns the delegatee voting weight must be restored to.
    pub fn revoke_override(&mut self) -> GovPoolResult<Pubkey> {
        check!(
            self.override_state != OverrideState::Normal,
            GovPoolError::DepositNotOverridden
        );
        self.override_state = OverrideState::Normal;
        self.override_target = Pubkey::default();
        Ok(self.delegatee)
    }

    pub fn migrate_override(&mut self, new_target: Pubkey) -> GovPoolResult {
        check!(
            self.override_state != OverrideState::Normal,
            GovPoolError::DepositNotOverridden
        );
        self.override_state = OverrideState::Migrated;
        self.override_target = new_target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn deposit_with_balance(balance: u64) -> DelegateeDeposit {
        DelegateeDeposit {
            delegatee: Pubkey::new_unique(),
            balance,
            ..Default::default()
        }
    }

    // 10% qualifying threshold over a 10_000 balance.
    #[test_case(999, true ; "below threshold qualifies")]
    #[test_case(1_000, false ; "at threshold is healthy")]
    #[test_case(5_000, false ; "well above threshold is healthy")]
    fn earning_power_qualification(earning_power: u64, qualifies: bool) {
        let deposit = deposit_with_balance(10_000);
        assert_eq!(
            deposit
                .qualifies_for_override(earning_power, 1_000)
                .unwrap(),
            qualifies
        );
    }

    #[test]
    fn override_lifecycle_normal_to_overridden_to_normal() {
        let mut deposit = deposit_with_balance(10_000);
        let target = Pubkey::new_unique();

        deposit.enact_override(target).unwrap();
        assert_eq!(deposit.override_state, OverrideState::Overridden);
        assert_eq!(deposit.override_target, target);

        let restored = deposit.revoke_override().unwrap();
        assert_eq!(restored, deposit.delegatee);
        assert_eq!(deposit.override_state, OverrideState::Normal);
        assert_eq!(deposit.override_target, Pubkey::default());
    }

    #[test]
    fn override_migrates_while_standing() {
        let mut deposit = deposit_with_balance(10_000);
        deposit.enact_override(Pubkey::new_unique()).unwrap();

        let new_target = Pubkey::new_unique();
        deposit.migrate_override(new_target).unwrap();
        assert_eq!(deposit.override_state, OverrideState::Migrated);
        assert_eq!(deposit.override_target, new_target);

        // A migrated override can still be revoked back to the original.
        let restored = deposit.revoke_override().unwrap();
        assert_eq!(restored, deposit.delegatee);
    }

    #[test]
    fn double_enact_and_stray_revoke_fail() {
        let mut deposit = deposit_with_balance(10_000);
        assert!(deposit.revoke_override().is_err());
        assert!(deposit.migrate_override(Pubkey::new_unique()).is_err());

        deposit.enact_override(Pubkey::new_unique()).unwrap();
        assert!(deposit.enact_override(Pubkey::new_unique()).is_err());
    }

    #[test]
    fn staker_deposit_target_must_match_record() {
        let recorded = Pubkey::new_unique();
        let deposit = DelegateeDeposit {
            staker_deposit: recorded,
            ..deposit_with_balance(100)
        };

        assert!(deposit.verify_staker_deposit(&recorded).is_ok());
        assert!(deposit
            .verify_staker_deposit(&Pubkey::new_unique())
            .is_err());
    }

    #[test]
    fn mirror_balance_never_goes_negative() {
        let mut deposit = deposit_with_balance(100);
        deposit.remove_balance(60).unwrap();
        assert_eq!(deposit.balance, 40);
        assert!(deposit.remove_balance(41).is_err());
    }
}

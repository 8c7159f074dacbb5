use anchor_lang::prelude::*;
use type_layout::TypeLayout;

use crate::{
    assert_struct_align, assert_struct_size, check, math_error, state::pool::WrappedU128,
    GovPoolError, GovPoolResult,
};

assert_struct_size!(HolderPosition, 232);
assert_struct_align!(HolderPosition, 8);
#[account(zero_copy)]
#[repr(C)]
#[derive(Default, Debug, PartialEq, Eq, TypeLayout)]
pub struct HolderPosition {
    pub owner: Pubkey,
    pub pool: Pubkey,
    /// Deposit that receives this holder's underlying value.
    /// `Pubkey::default()` routes to the pool's default deposit.
    pub deposit: Pubkey,
    /// Single active spender, SPL-token delegate style.
    pub spender: Pubkey,

    pub share_balance: WrappedU128,

    /// Raw balance last synced into the custom deposit. Rebase growth above
    /// the checkpoint is backed by the default deposit until the holder
    /// re-syncs by staking, transferring, or moving deposits.
    pub balance_checkpoint: u64,
    pub allowance: u64,

    pub bump: u8,
    pub _pad0: [u8; 7],

    pub _padding: [[u64; 2]; 4],
}

/// How much of a debit comes out of which deposit. The default deposit is
/// debited first so the common case (holder never delegated, or only rebase
/// growth is being touched) stays a single external call.
#[derive(Debug, PartialEq, Eq)]
pub struct DebitPlan {
    pub from_default: u64,
    pub from_custom: u64,
}

impl HolderPosition {
    pub const LEN: usize = std::mem::size_of::<HolderPosition>();

    pub fn uses_default_deposit(&self) -> bool {
        self.deposit == Pubkey::default()
    }

    pub fn add_shares(&mut self, delta: u128) -> GovPoolResult {
        let share_balance: u128 = self.share_balance.into();
        self.share_balance = share_balance
            .checked_add(delta)
            .ok_or_else(math_error!())?
            .into();
        Ok(())
    }

    pub fn remove_shares(&mut self, delta: u128) -> GovPoolResult {
        let share_balance: u128 = self.share_balance.into();
        self.share_balance = share_balance
            .checked_sub(delta)
            .ok_or_else(math_error!())?
            .into();
        Ok(())
    }

    /// Split `amount` across the deposits backing this holder, given the
    /// holder's current raw `balance`.
    pub fn plan_debit(&self, balance: u64, amount: u64) -> GovPoolResult<DebitPlan> {
        check!(amount <= balance, GovPoolError::InsufficientBalance);

        if self.uses_default_deposit() {
            return Ok(DebitPlan {
                from_default: amount,
                from_custom: 0,
            });
        }

        // A downward rebase can leave the checkpoint above the live balance;
        // the surplus stays in the custom deposit as pool-favor dust.
        let custom_backed = self.balance_checkpoint.min(balance);
        let default_backed = balance - custom_backed;

        let from_default = amount.min(default_backed);
        let from_custom = amount - from_default;

        Ok(DebitPlan {
            from_default,
            from_custom,
        })
    }

    pub fn apply_debit(&mut self, plan: &DebitPlan) -> GovPoolResult {
        // min() rather than checked_sub: the checkpoint may already sit below
        // the plan's custom slice after a downward rebase.
        self.balance_checkpoint = self
            .balance_checkpoint
            .saturating_sub(plan.from_custom);
        Ok(())
    }

    /// Record `amount` of underlying newly parked in the custom deposit.
    pub fn credit_checkpoint(&mut self, amount: u64) -> GovPoolResult {
        if self.uses_default_deposit() {
            return Ok(());
        }
        self.balance_checkpoint = self
            .balance_checkpoint
            .checked_add(amount)
            .ok_or_else(math_error!())?;
        Ok(())
    }

    pub fn approve(&mut self, spender: Pubkey, amount: u64) {
        self.spender = spender;
        self.allowance = amount;
    }

    pub fn spend_allowance(&mut self, spender: &Pubkey, amount: u64) -> GovPoolResult {
        check!(self.spender == *spender, GovPoolError::Unauthorized);
        check!(
            amount <= self.allowance,
            GovPoolError::InsufficientAllowance
        );
        self.allowance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn custom_routed(checkpoint: u64) -> HolderPosition {
        HolderPosition {
            deposit: Pubkey::new_unique(),
            balance_checkpoint: checkpoint,
            ..Default::default()
        }
    }

    #[test]
    fn default_routed_holder_debits_default_only() {
        let holder = HolderPosition::default();
        let plan = holder.plan_debit(1_000, 700).unwrap();
        assert_eq!(
            plan,
            DebitPlan {
                from_default: 700,
                from_custom: 0
            }
        );
    }

    // balance 1_000, checkpoint 600: 400 of rebase growth sits in the
    // default deposit and is always consumed first.
    #[test_case(100, 100, 0 ; "small debit stays in default")]
    #[test_case(400, 400, 0 ; "exactly the default backed slice")]
    #[test_case(401, 400, 1 ; "first unit past growth hits custom")]
    #[test_case(1_000, 400, 600 ; "full balance drains both")]
    fn custom_routed_debits_default_first(amount: u64, from_default: u64, from_custom: u64) {
        let holder = custom_routed(600);
        let plan = holder.plan_debit(1_000, amount).unwrap();
        assert_eq!(
            plan,
            DebitPlan {
                from_default,
                from_custom
            }
        );
    }

    #[test]
    fn checkpoint_above_balance_is_clamped() {
        // Downward rebase: balance 500 but 600 recorded in the custom
        // deposit. Everything debits from custom, dust stays behind.
        let holder = custom_routed(600);
        let plan = holder.plan_debit(500, 500).unwrap();
        assert_eq!(
            plan,
            DebitPlan {
                from_default: 0,
                from_custom: 500
            }
        );
    }

    #[test]
    fn debit_exceeding_balance_fails() {
        let holder = custom_routed(600);
        assert!(holder.plan_debit(1_000, 1_001).is_err());
    }

    #[test]
    fn apply_debit_unwinds_checkpoint() {
        let mut holder = custom_routed(600);
        let plan = holder.plan_debit(1_000, 700).unwrap();
        holder.apply_debit(&plan).unwrap();
        assert_eq!(holder.balance_checkpoint, 300);
    }

    #[test]
    fn credit_checkpoint_ignored_for_default_routing() {
        let mut holder = HolderPosition::default();
        holder.credit_checkpoint(500).unwrap();
        assert_eq!(holder.balance_checkpoint, 0);

        let mut custom = custom_routed(100);
        custom.credit_checkpoint(500).unwrap();
        assert_eq!(custom.balance_checkpoint, 600);
    }

    #[test]
    fn deposit_mirrors_track_total_supply_across_ledger_ops() {
        // Drives the share ledger and the deposit mirrors together the way
        // the handlers sequence them: stake, rebase, re-delegation, transfer
        // to a default-routed receiver, full unstake. After every step the
        // mirrors must sum to the pool's total supply.
        use crate::state::{deposit::DelegateeDeposit, pool::Pool};

        let mut pool = Pool::default();
        let mut default_dep = DelegateeDeposit::default();
        let mut custom_dep = DelegateeDeposit::default();
        let custom_key = Pubkey::new_unique();

        // Initialization burn seed parks in the default deposit.
        pool.mint_burned_stake(1_000).unwrap();
        default_dep.add_balance(1_000).unwrap();

        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut collector = HolderPosition::default();

        pool.mint_stake(&mut a, 10_000).unwrap();
        default_dep.add_balance(10_000).unwrap();
        pool.mint_stake(&mut b, 4_000).unwrap();
        default_dep.add_balance(4_000).unwrap();
        assert_eq!(
            default_dep.balance + custom_dep.balance,
            pool.total_supply
        );

        // Reward claim: supply rebases by the payout, which is restaked
        // under the default deposit.
        pool.distribute_reward(777, 77, &mut collector).unwrap();
        default_dep.add_balance(777).unwrap();
        assert_eq!(
            default_dep.balance + custom_dep.balance,
            pool.total_supply
        );

        // A re-delegates: the full balance moves into the custom deposit.
        let a_balance = pool.balance_of(&a).unwrap();
        let plan = a.plan_debit(a_balance, a_balance).unwrap();
        a.deposit = custom_key;
        a.balance_checkpoint = a_balance;
        let default_before = default_dep.balance;
        let custom_before = custom_dep.balance;
        default_dep.remove_balance(plan.from_default).unwrap();
        custom_dep
            .add_balance(plan.from_default + plan.from_custom)
            .unwrap();
        // The old deposit decreases by exactly what the new one gains.
        assert_eq!(
            default_before - default_dep.balance,
            custom_dep.balance - custom_before
        );
        assert_eq!(
            default_dep.balance + custom_dep.balance,
            pool.total_supply
        );

        // A sends a third of the balance to B, who routes to the default
        // deposit; the custom-backed slice restakes under the default.
        let a_balance = pool.balance_of(&a).unwrap();
        let amount = a_balance / 3;
        let (sender_decrease, _) = pool.transfer_stake(&mut a, &mut b, amount).unwrap();
        let plan = a.plan_debit(a_balance, sender_decrease).unwrap();
        a.apply_debit(&plan).unwrap();
        default_dep.add_balance(plan.from_custom).unwrap();
        custom_dep.remove_balance(plan.from_custom).unwrap();
        assert_eq!(
            default_dep.balance + custom_dep.balance,
            pool.total_supply
        );

        // B unstakes everything.
        let b_balance = pool.balance_of(&b).unwrap();
        let plan = b.plan_debit(b_balance, b_balance).unwrap();
        pool.burn_stake(&mut b, b_balance).unwrap();
        b.apply_debit(&plan).unwrap();
        default_dep.remove_balance(plan.from_default).unwrap();
        custom_dep.remove_balance(plan.from_custom).unwrap();
        assert_eq!(
            default_dep.balance + custom_dep.balance,
            pool.total_supply
        );
    }

    #[test]
    fn allowance_spend_and_exhaustion() {
        let mut holder = HolderPosition::default();
        let spender = Pubkey::new_unique();
        holder.approve(spender, 100);

        holder.spend_allowance(&spender, 60).unwrap();
        assert_eq!(holder.allowance, 40);
        assert!(holder.spend_allowance(&spender, 41).is_err());

        let stranger = Pubkey::new_unique();
        assert!(holder.spend_allowance(&stranger, 1).is_err());
    }
}

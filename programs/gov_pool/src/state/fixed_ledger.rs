use anchor_lang::prelude::*;
use type_layout::TypeLayout;

use crate::{
    assert_struct_align, assert_struct_size, check, constants::SHARE_SCALE_FACTOR, math_error,
    GovPoolError, GovPoolResult,
};

assert_struct_size!(FixedPosition, 216);
assert_struct_align!(FixedPosition, 8);
#[account(zero_copy)]
#[repr(C)]
#[derive(Default, Debug, PartialEq, Eq, TypeLayout)]
pub struct FixedPosition {
    pub owner: Pubkey,
    pub pool: Pubkey,
    /// Alias identity under which the share ledger holds this position.
    pub alias: Pubkey,
    pub spender: Pubkey,

    /// Non-rebasing fixed-token balance. The alias's share balance is always
    /// at least `balance * SHARE_SCALE_FACTOR`; any surplus is dust or a
    /// stray rebasing transfer, recoverable through `rescue`.
    pub balance: u64,
    pub allowance: u64,

    pub bump: u8,
    pub alias_bump: u8,
    pub _pad0: [u8; 6],

    pub _padding: [[u64; 2]; 4],
}

/// One fixed token is exactly `SHARE_SCALE_FACTOR` raw shares.
pub fn shares_for_fixed(fixed_tokens: u64) -> GovPoolResult<u128> {
    Ok((fixed_tokens as u128)
        .checked_mul(SHARE_SCALE_FACTOR)
        .ok_or_else(math_error!())?)
}

/// Truncating; never inflates a fixed balance.
pub fn fixed_for_shares(shares: u128) -> GovPoolResult<u64> {
    Ok((shares / SHARE_SCALE_FACTOR)
        .try_into()
        .ok()
        .ok_or_else(math_error!())?)
}

impl FixedPosition {
    pub const LEN: usize = std::mem::size_of::<FixedPosition>();

    pub fn add_balance(&mut self, fixed_tokens: u64) -> GovPoolResult {
        self.balance = self
            .balance
            .checked_add(fixed_tokens)
            .ok_or_else(math_error!())?;
        Ok(())
    }

    pub fn remove_balance(&mut self, fixed_tokens: u64) -> GovPoolResult {
        check!(
            fixed_tokens <= self.balance,
            GovPoolError::InsufficientFixedBalance
        );
        self.balance -= fixed_tokens;
        Ok(())
    }

    /// Shares sitting in the alias above what this ledger has accounted for,
    /// truncated to whole fixed tokens. Sub-scale dust is deliberately
    /// discarded rather than credited at inflated precision.
    pub fn rescuable(&self, alias_share_balance: u128) -> GovPoolResult<u64> {
        let accounted = shares_for_fixed(self.balance)?;
        let surplus = alias_share_balance
            .checked_sub(accounted)
            .ok_or_else(math_error!())?;
        fixed_for_shares(surplus)
    }

    pub fn approve(&mut self, spender: Pubkey, fixed_tokens: u64) {
        self.spender = spender;
        self.allowance = fixed_tokens;
    }

    pub fn spend_allowance(&mut self, spender: &Pubkey, fixed_tokens: u64) -> GovPoolResult {
        check!(self.spender == *spender, GovPoolError::Unauthorized);
        check!(
            fixed_tokens <= self.allowance,
            GovPoolError::InsufficientAllowance
        );
        self.allowance -= fixed_tokens;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{holder::HolderPosition, pool::Pool};
    use pretty_assertions::assert_eq;

    fn seeded_pool() -> Pool {
        let mut pool = Pool::default();
        pool.mint_burned_stake(1_000).unwrap();
        pool
    }

    #[test]
    fn scale_round_trip_loses_at_most_one_quantum() {
        for shares in [0u128, 1, SHARE_SCALE_FACTOR - 1, SHARE_SCALE_FACTOR, 123 * SHARE_SCALE_FACTOR + 7] {
            let fixed = fixed_for_shares(shares).unwrap();
            let back = shares_for_fixed(fixed).unwrap();
            assert!(back <= shares);
            assert!(shares - back < SHARE_SCALE_FACTOR);
        }
    }

    #[test]
    fn convert_round_trip_never_gains() {
        // convert_to_rebasing(convert_to_fixed(x)) <= x, loss bounded by the
        // scale factor.
        let mut pool = seeded_pool();
        let mut holder = HolderPosition::default();
        let mut alias = HolderPosition::default();
        let mut fixed = FixedPosition::default();
        let mut collector = HolderPosition::default();

        pool.mint_stake(&mut holder, 10_000).unwrap();
        // Rebase so one share is no longer worth an integral stake unit.
        pool.distribute_reward(137, 0, &mut collector).unwrap();

        let x = 5_000u64;
        let (sender_decrease, _) = pool.transfer_stake(&mut holder, &mut alias, x).unwrap();
        assert!(sender_decrease <= x + 1);
        let moved_shares: u128 = alias.share_balance.into();
        let fixed_tokens = fixed_for_shares(moved_shares).unwrap();
        fixed.add_balance(fixed_tokens).unwrap();

        // Back out.
        fixed.remove_balance(fixed_tokens).unwrap();
        let out_shares = shares_for_fixed(fixed_tokens).unwrap();
        let (_, receiver_increase) = pool
            .transfer_shares(&mut alias, &mut holder, out_shares)
            .unwrap();

        assert!(receiver_increase <= x);
        // Loss bounded by one scale quantum's worth of stake.
        let quantum_value = pool.stake_for_shares(SHARE_SCALE_FACTOR).unwrap();
        assert!(x - receiver_increase <= quantum_value + 1);
    }

    #[test]
    fn alias_surplus_is_rescuable_in_whole_tokens() {
        let fixed = FixedPosition {
            balance: 10,
            ..Default::default()
        };

        // Alias holds 12.7 tokens' worth of shares but only 10 accounted.
        let alias_shares = 12 * SHARE_SCALE_FACTOR + 7_000_000_000;
        assert_eq!(fixed.rescuable(alias_shares).unwrap(), 2);

        // Nothing stray: nothing to rescue.
        assert_eq!(fixed.rescuable(10 * SHARE_SCALE_FACTOR).unwrap(), 0);
    }

    #[test]
    fn alias_below_accounting_is_an_error() {
        let fixed = FixedPosition {
            balance: 10,
            ..Default::default()
        };
        assert!(fixed.rescuable(9 * SHARE_SCALE_FACTOR).is_err());
    }

    #[test]
    fn fixed_balance_cannot_go_negative() {
        let mut fixed = FixedPosition::default();
        fixed.add_balance(5).unwrap();
        assert!(fixed.remove_balance(6).is_err());
        assert_eq!(fixed.balance, 5);
    }
}

use anchor_lang::prelude::*;
use type_layout::TypeLayout;

use crate::{
    assert_struct_align, assert_struct_size, check,
    constants::SHARE_SCALE_FACTOR,
    math_error,
    state::{
        holder::HolderPosition,
        share_math::{mul_div_ceil, mul_div_floor},
    },
    GovPoolError, GovPoolResult,
};

/// u128 stored as little-endian bytes so the containing account keeps 8-byte
/// alignment.
#[zero_copy]
#[repr(C)]
#[derive(Default, Debug, PartialEq, Eq, AnchorDeserialize, AnchorSerialize)]
pub struct WrappedU128 {
    pub value: [u8; 16],
}

impl From<u128> for WrappedU128 {
    fn from(value: u128) -> Self {
        Self {
            value: value.to_le_bytes(),
        }
    }
}

impl From<WrappedU128> for u128 {
    fn from(wrapped: WrappedU128) -> Self {
        u128::from_le_bytes(wrapped.value)
    }
}

assert_struct_size!(Pool, 544);
assert_struct_align!(Pool, 8);
#[account(zero_copy)]
#[repr(C)]
#[derive(Default, Debug, PartialEq, Eq, TypeLayout)]
pub struct Pool {
    pub owner: Pubkey,
    pub delegatee_guardian: Pubkey,
    /// The external staking collaborator that owns per-delegatee deposits.
    pub staker_program: Pubkey,
    /// Optional withdrawal-delay collaborator. `Pubkey::default()` disables it
    /// and unstaked funds go straight to the holder.
    pub withdrawal_gate: Pubkey,
    pub stake_mint: Pubkey,
    pub reward_mint: Pubkey,

    pub default_delegatee: Pubkey,
    /// Deposit used for holders who never picked a delegatee. Well known and
    /// distinct from the `Pubkey::default()` sentinel on a holder, which
    /// means "no deposit assigned".
    pub default_deposit: Pubkey,

    pub stake_vault: Pubkey,
    pub reward_vault: Pubkey,
    pub fee_collector: Pubkey,

    pub total_shares: WrappedU128,
    /// Shares assigned to nobody at initialization (anti-inflation seed).
    pub burned_shares: WrappedU128,

    pub total_supply: u64,
    pub payout_amount: u64,
    pub fee_bips: u64,
    pub max_override_tip: u64,
    pub min_qualifying_earning_power_bips: u64,

    pub pool_authority_bump: u8,
    pub stake_vault_bump: u8,
    pub reward_vault_bump: u8,
    pub _pad0: [u8; 5],

    pub _padding: [[u64; 2]; 7],
}

impl Pool {
    pub const LEN: usize = std::mem::size_of::<Pool>();

    /// `amount * total_shares / total_supply`, truncating. An empty pool
    /// seeds at `SHARE_SCALE_FACTOR` shares per stake unit for precision
    /// headroom.
    pub fn shares_for_stake(&self, amount: u64) -> GovPoolResult<u128> {
        if self.total_supply == 0 {
            return Ok((amount as u128)
                .checked_mul(SHARE_SCALE_FACTOR)
                .ok_or_else(math_error!())?);
        }
        mul_div_floor(
            amount as u128,
            self.total_shares.into(),
            self.total_supply as u128,
        )
    }

    /// `shares * total_supply / total_shares`, truncating.
    pub fn stake_for_shares(&self, shares: u128) -> GovPoolResult<u64> {
        let total_shares: u128 = self.total_shares.into();
        if total_shares == 0 {
            return Ok(0);
        }
        let amount = mul_div_floor(shares, self.total_supply as u128, total_shares)?;
        Ok(amount.try_into().ok().ok_or_else(math_error!())?)
    }

    pub fn balance_of(&self, holder: &HolderPosition) -> GovPoolResult<u64> {
        self.stake_for_shares(holder.share_balance.into())
    }

    pub fn add_shares(&mut self, delta: u128) -> GovPoolResult {
        let total_shares: u128 = self.total_shares.into();
        self.total_shares = total_shares
            .checked_add(delta)
            .ok_or_else(math_error!())?
            .into();
        Ok(())
    }

    pub fn remove_shares(&mut self, delta: u128) -> GovPoolResult {
        let total_shares: u128 = self.total_shares.into();
        self.total_shares = total_shares
            .checked_sub(delta)
            .ok_or_else(math_error!())?
            .into();
        Ok(())
    }

    /// Mint shares against `amount` of newly staked underlying. Returns the
    /// realized balance increase, which truncation can leave at `amount - 1`.
    pub fn mint_stake(
        &mut self,
        holder: &mut HolderPosition,
        amount: u64,
    ) -> GovPoolResult<u64> {
        check!(amount > 0, GovPoolError::ZeroAmount);

        let balance_before = self.balance_of(holder)?;
        let shares = self.shares_for_stake(amount)?;

        self.add_shares(shares)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(math_error!())?;
        holder.add_shares(shares)?;

        let balance_after = self.balance_of(holder)?;
        Ok(balance_after
            .checked_sub(balance_before)
            .ok_or_else(math_error!())?)
    }

    /// Stake whose shares belong to nobody. Run once at initialization so a
    /// first staker can never inflate the exchange rate against later ones.
    pub fn mint_burned_stake(&mut self, amount: u64) -> GovPoolResult {
        check!(amount > 0, GovPoolError::ZeroAmount);

        let shares = self.shares_for_stake(amount)?;
        self.add_shares(shares)?;
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(math_error!())?;

        let burned: u128 = self.burned_shares.into();
        self.burned_shares = burned
            .checked_add(shares)
            .ok_or_else(math_error!())?
            .into();
        Ok(())
    }

    /// Burn the shares backing `amount`. Shares are rounded up so the
    /// holder's remaining balance never exceeds what their shares are worth;
    /// burning the entire balance burns the entire share balance.
    pub fn burn_stake(
        &mut self,
        holder: &mut HolderPosition,
        amount: u64,
    ) -> GovPoolResult<u128> {
        let balance = self.balance_of(holder)?;
        check!(amount <= balance, GovPoolError::InsufficientBalance);

        let holder_shares: u128 = holder.share_balance.into();
        let shares = if amount == balance {
            holder_shares
        } else {
            mul_div_ceil(
                amount as u128,
                self.total_shares.into(),
                self.total_supply as u128,
            )?
            .min(holder_shares)
        };

        holder.remove_shares(shares)?;
        self.remove_shares(shares)?;
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(math_error!())?;

        Ok(shares)
    }

    /// Move `amount` between two holders. The share count is derived from the
    /// sender's own balance-to-share ratio rather than the global one, so a
    /// full-balance transfer moves every last share and leaves no dust.
    /// Returns the realized (sender decrease, receiver increase) pair; the
    /// receiver's increase never exceeds the sender's decrease, and the two
    /// differ by at most one unit of truncation.
    pub fn transfer_stake(
        &mut self,
        sender: &mut HolderPosition,
        receiver: &mut HolderPosition,
        amount: u64,
    ) -> GovPoolResult<(u64, u64)> {
        let sender_before = self.balance_of(sender)?;
        check!(amount <= sender_before, GovPoolError::InsufficientBalance);

        let receiver_before = self.balance_of(receiver)?;
        let sender_shares: u128 = sender.share_balance.into();
        let shares = if amount == sender_before {
            sender_shares
        } else {
            mul_div_floor(sender_shares, amount as u128, sender_before as u128)?
        };

        sender.remove_shares(shares)?;
        receiver.add_shares(shares)?;

        let sender_decrease = sender_before
            .checked_sub(self.balance_of(sender)?)
            .ok_or_else(math_error!())?;
        let mut receiver_increase = self
            .balance_of(receiver)?
            .checked_sub(receiver_before)
            .ok_or_else(math_error!())?;

        // Truncating on both sides can let the receiver's latent sub-unit
        // dust surface as a whole extra unit. Shave the revealing shares off
        // and retire them with the burned shares, so the receiver never gains
        // more than the sender gave up.
        if receiver_increase > sender_decrease {
            let target = receiver_before
                .checked_add(sender_decrease)
                .ok_or_else(math_error!())?;
            let max_shares = mul_div_ceil(
                (target as u128).checked_add(1).ok_or_else(math_error!())?,
                self.total_shares.into(),
                self.total_supply as u128,
            )?
            .checked_sub(1)
            .ok_or_else(math_error!())?;
            let shave = u128::from(receiver.share_balance)
                .checked_sub(max_shares)
                .ok_or_else(math_error!())?;

            receiver.remove_shares(shave)?;
            let burned: u128 = self.burned_shares.into();
            self.burned_shares = burned
                .checked_add(shave)
                .ok_or_else(math_error!())?
                .into();

            receiver_increase = self
                .balance_of(receiver)?
                .checked_sub(receiver_before)
                .ok_or_else(math_error!())?;
        }

        Ok((sender_decrease, receiver_increase))
    }

    /// Move an exact share count between holders. The fixed ledger works in
    /// whole share multiples, so no sender-ratio conversion applies. Returns
    /// the realized (sender decrease, receiver increase) pair.
    pub fn transfer_shares(
        &mut self,
        sender: &mut HolderPosition,
        receiver: &mut HolderPosition,
        shares: u128,
    ) -> GovPoolResult<(u64, u64)> {
        check!(
            shares <= sender.share_balance.into(),
            GovPoolError::InsufficientBalance
        );

        let sender_before = self.balance_of(sender)?;
        let receiver_before = self.balance_of(receiver)?;

        sender.remove_shares(shares)?;
        receiver.add_shares(shares)?;

        let sender_decrease = sender_before
            .checked_sub(self.balance_of(sender)?)
            .ok_or_else(math_error!())?;
        let receiver_increase = self
            .balance_of(receiver)?
            .checked_sub(receiver_before)
            .ok_or_else(math_error!())?;

        Ok((sender_decrease, receiver_increase))
    }

    /// Burn an exact share count and release its underlying value, floored.
    /// Returns the released amount.
    pub fn burn_shares(
        &mut self,
        holder: &mut HolderPosition,
        shares: u128,
    ) -> GovPoolResult<u64> {
        check!(
            shares <= holder.share_balance.into(),
            GovPoolError::InsufficientBalance
        );

        let amount = self.stake_for_shares(shares)?;
        holder.remove_shares(shares)?;
        self.remove_shares(shares)?;
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(math_error!())?;

        Ok(amount)
    }

    /// Rebase every balance upward by `payout` of underlying. The fee is not
    /// paid out; it is minted as shares to the fee collector so the fee is an
    /// ownership claim that dilutes instead of a one-time payment. Returns
    /// the fee shares minted.
    pub fn distribute_reward(
        &mut self,
        payout: u64,
        fee_amount: u64,
        fee_collector: &mut HolderPosition,
    ) -> GovPoolResult<u128> {
        let total_shares: u128 = self.total_shares.into();
        check!(total_shares > 0, GovPoolError::InvalidParameter);
        check!(fee_amount <= payout, GovPoolError::InvalidParameter);

        self.total_supply = self
            .total_supply
            .checked_add(payout)
            .ok_or_else(math_error!())?;

        if fee_amount == 0 {
            return Ok(0);
        }

        // Solve for x in: x * new_supply / (shares + x) == fee_amount, so the
        // collector's post-mint balance is the fee, to truncation.
        let fee_shares = mul_div_floor(
            fee_amount as u128,
            total_shares,
            (self.total_supply - fee_amount) as u128,
        )?;

        self.add_shares(fee_shares)?;
        fee_collector.add_shares(fee_shares)?;

        Ok(fee_shares)
    }

    /// Rebase every balance downward by `tip`. The share count stays fixed;
    /// the tip comes out of everyone proportionally.
    pub fn socialize_tip(&mut self, tip: u64) -> GovPoolResult {
        self.total_supply = self
            .total_supply
            .checked_sub(tip)
            .ok_or_else(math_error!())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn empty_pool() -> Pool {
        Pool::default()
    }

    fn seeded_pool(burn: u64) -> Pool {
        let mut pool = empty_pool();
        pool.mint_burned_stake(burn).unwrap();
        pool
    }

    fn total_holder_balance(pool: &Pool, holders: &[&HolderPosition]) -> u64 {
        holders
            .iter()
            .map(|h| pool.balance_of(h).unwrap())
            .sum()
    }

    #[test]
    fn first_stake_seeds_scale_factor() {
        let mut pool = empty_pool();
        let mut a = HolderPosition::default();

        let realized = pool.mint_stake(&mut a, 100).unwrap();

        assert_eq!(realized, 100);
        assert_eq!(u128::from(a.share_balance), 100 * SHARE_SCALE_FACTOR);
        assert_eq!(pool.total_supply, 100);
        assert_eq!(pool.balance_of(&a).unwrap(), 100);
    }

    #[test]
    fn stake_rebase_full_transfer_scenario() {
        // Pool empty; A stakes 100; a claim rebases by 10; A sends everything
        // to B and keeps zero shares.
        let mut pool = empty_pool();
        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut collector = HolderPosition::default();

        pool.mint_stake(&mut a, 100).unwrap();
        assert_eq!(pool.balance_of(&a).unwrap(), 100);
        assert_eq!(pool.total_supply, 100);

        pool.distribute_reward(10, 0, &mut collector).unwrap();
        assert_eq!(pool.total_supply, 110);
        assert_eq!(pool.balance_of(&a).unwrap(), 110);

        let (sender_decrease, receiver_increase) =
            pool.transfer_stake(&mut a, &mut b, 110).unwrap();
        assert_eq!(sender_decrease, 110);
        assert_eq!(receiver_increase, 110);
        assert_eq!(u128::from(a.share_balance), 0);
        assert_eq!(pool.balance_of(&b).unwrap(), 110);
    }

    #[test]
    fn full_balance_transfer_is_dust_free_at_odd_rates() {
        let mut pool = seeded_pool(1_000);
        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut collector = HolderPosition::default();

        pool.mint_stake(&mut a, 333).unwrap();
        // Odd rebase makes the exchange rate non-integral.
        pool.distribute_reward(7, 0, &mut collector).unwrap();

        let balance = pool.balance_of(&a).unwrap();
        pool.transfer_stake(&mut a, &mut b, balance).unwrap();

        assert_eq!(u128::from(a.share_balance), 0);
        assert_eq!(pool.balance_of(&a).unwrap(), 0);
    }

    #[test]
    fn stake_realized_delta_is_amount_minus_truncation() {
        let mut pool = seeded_pool(1_000);
        let mut collector = HolderPosition::default();
        pool.distribute_reward(333, 0, &mut collector).unwrap();

        let mut a = HolderPosition::default();
        let realized = pool.mint_stake(&mut a, 997).unwrap();

        assert!(realized <= 997);
        assert!(realized >= 996);
    }

    #[test]
    fn unstake_more_than_balance_fails() {
        let mut pool = seeded_pool(1_000);
        let mut a = HolderPosition::default();
        pool.mint_stake(&mut a, 50).unwrap();

        assert!(pool.burn_stake(&mut a, 51).is_err());
        // State untouched by the failed call.
        assert_eq!(pool.balance_of(&a).unwrap(), 50);
        assert_eq!(pool.total_supply, 1_050);
    }

    #[test]
    fn full_unstake_burns_every_share() {
        let mut pool = seeded_pool(1_000);
        let mut a = HolderPosition::default();
        let mut collector = HolderPosition::default();
        pool.mint_stake(&mut a, 250).unwrap();
        pool.distribute_reward(99, 0, &mut collector).unwrap();

        let balance = pool.balance_of(&a).unwrap();
        pool.burn_stake(&mut a, balance).unwrap();

        assert_eq!(u128::from(a.share_balance), 0);
    }

    #[test]
    fn transfer_never_lets_receiver_out_gain_sender() {
        // Receiver dust plus moved-share dust would otherwise round up to a
        // whole extra unit on the receiver side.
        let mut pool = seeded_pool(39);
        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut collector = HolderPosition::default();

        pool.mint_stake(&mut a, 59).unwrap();
        pool.mint_stake(&mut b, 19).unwrap();
        pool.distribute_reward(39, 0, &mut collector).unwrap();

        let a_balance = pool.balance_of(&a).unwrap();
        assert_eq!(a_balance, 78);
        let b_before = pool.balance_of(&b).unwrap();
        let burned_before: u128 = pool.burned_shares.into();

        let (sender_decrease, receiver_increase) =
            pool.transfer_stake(&mut a, &mut b, a_balance).unwrap();

        assert_eq!(sender_decrease, 78);
        assert_eq!(receiver_increase, 78);
        assert_eq!(pool.balance_of(&b).unwrap(), b_before + 78);
        // Full-balance transfer still empties the sender.
        assert_eq!(u128::from(a.share_balance), 0);
        // The shaved dust is retired, not destroyed.
        assert!(u128::from(pool.burned_shares) > burned_before);
        let share_sum = u128::from(a.share_balance)
            + u128::from(b.share_balance)
            + u128::from(pool.burned_shares);
        assert_eq!(share_sum, u128::from(pool.total_shares));
    }

    #[test]
    fn conservation_under_mixed_operations() {
        let mut pool = seeded_pool(10_000);
        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut c = HolderPosition::default();
        let mut collector = HolderPosition::default();

        let mut op_count = 0u64;
        let amounts = [501u64, 7, 1_003, 88, 12_345, 2, 999];

        for (i, &amount) in amounts.iter().enumerate() {
            pool.mint_stake(&mut a, amount).unwrap();
            pool.mint_stake(&mut b, amount / 2 + 1).unwrap();
            op_count += 2;

            if i % 2 == 0 {
                pool.distribute_reward(amount / 3 + 1, (amount / 3 + 1) / 10, &mut collector)
                    .unwrap();
                op_count += 1;
            }

            let a_balance = pool.balance_of(&a).unwrap();
            pool.transfer_stake(&mut a, &mut c, a_balance / 2).unwrap();
            op_count += 1;

            let b_balance = pool.balance_of(&b).unwrap();
            if b_balance > 1 {
                pool.burn_stake(&mut b, b_balance / 2).unwrap();
                op_count += 1;
            }
        }

        // Shares conserve exactly.
        let share_sum: u128 = [&a, &b, &c, &collector]
            .iter()
            .map(|h| u128::from(h.share_balance))
            .sum::<u128>()
            + u128::from(pool.burned_shares);
        assert_eq!(share_sum, u128::from(pool.total_shares));

        // Balances conserve within one rounding unit per operation, always
        // in the pool's favor.
        let burned_balance = pool.stake_for_shares(pool.burned_shares.into()).unwrap();
        let balance_sum =
            total_holder_balance(&pool, &[&a, &b, &c, &collector]) + burned_balance;
        assert!(balance_sum <= pool.total_supply);
        assert!(pool.total_supply - balance_sum <= op_count);
    }

    #[test]
    fn rebase_is_monotone_and_strict_for_non_fee_holders() {
        let mut pool = seeded_pool(1_000);
        let mut a = HolderPosition::default();
        let mut b = HolderPosition::default();
        let mut collector = HolderPosition::default();
        pool.mint_stake(&mut a, 40_000).unwrap();
        pool.mint_stake(&mut b, 60_000).unwrap();

        let before: Vec<u64> = [&a, &b, &collector]
            .iter()
            .map(|h| pool.balance_of(h).unwrap())
            .collect();

        let payout = 10_000;
        let fee = 1_000;
        pool.distribute_reward(payout, fee, &mut collector).unwrap();

        let after: Vec<u64> = [&a, &b, &collector]
            .iter()
            .map(|h| pool.balance_of(h).unwrap())
            .collect();

        for (b_after, b_before) in after.iter().zip(before.iter()) {
            assert!(b_after >= b_before);
        }
        assert!(after[0] > before[0]);
        assert!(after[1] > before[1]);
    }

    #[test]
    fn fee_shares_are_worth_the_fee_amount() {
        let mut pool = seeded_pool(1_000_000);
        let mut collector = HolderPosition::default();

        let payout = 50_000;
        let fee = 5_000;
        pool.distribute_reward(payout, fee, &mut collector).unwrap();

        let collector_balance = pool.balance_of(&collector).unwrap();
        assert!(collector_balance <= fee);
        assert!(collector_balance >= fee - 1);
    }

    #[test]
    fn reward_to_empty_pool_is_rejected() {
        let mut pool = empty_pool();
        let mut collector = HolderPosition::default();
        assert!(pool.distribute_reward(100, 0, &mut collector).is_err());
    }

    #[test]
    fn socialized_tip_rebases_downward() {
        let mut pool = seeded_pool(1_000);
        let mut a = HolderPosition::default();
        pool.mint_stake(&mut a, 9_000).unwrap();

        pool.socialize_tip(100).unwrap();

        assert_eq!(pool.total_supply, 9_900);
        assert!(pool.balance_of(&a).unwrap() < 9_000);
        // Shares untouched.
        assert_eq!(
            u128::from(a.share_balance),
            9_000 * SHARE_SCALE_FACTOR
        );
    }

    #[test]
    fn burn_seed_shares_are_unreachable() {
        let pool = seeded_pool(1_000);
        assert_eq!(u128::from(pool.burned_shares), 1_000 * SHARE_SCALE_FACTOR);
        assert_eq!(u128::from(pool.total_shares), 1_000 * SHARE_SCALE_FACTOR);
        assert_eq!(pool.total_supply, 1_000);
    }
}

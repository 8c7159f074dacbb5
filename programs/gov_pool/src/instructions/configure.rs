use crate::{
    check,
    constants::{BIPS_DENOMINATOR, MAX_FEE_BIPS},
    events::RewardParametersUpdateEvent,
    set_if_some,
    state::pool::Pool,
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;

/// Owner only.
pub fn set_reward_parameters(
    ctx: Context<SetRewardParameters>,
    payout_amount: Option<u64>,
    fee_bips: Option<u64>,
    fee_collector: Option<Pubkey>,
    max_override_tip: Option<u64>,
    min_qualifying_earning_power_bips: Option<u64>,
    delegatee_guardian: Option<Pubkey>,
) -> GovPoolResult {
    let mut pool = ctx.accounts.pool.load_mut()?;

    set_if_some!(pool.payout_amount, payout_amount);
    set_if_some!(pool.fee_bips, fee_bips);
    set_if_some!(pool.fee_collector, fee_collector);
    set_if_some!(pool.max_override_tip, max_override_tip);
    set_if_some!(
        pool.min_qualifying_earning_power_bips,
        min_qualifying_earning_power_bips
    );
    set_if_some!(pool.delegatee_guardian, delegatee_guardian);

    check!(pool.fee_bips <= MAX_FEE_BIPS, GovPoolError::InvalidParameter);
    check!(
        pool.min_qualifying_earning_power_bips <= BIPS_DENOMINATOR,
        GovPoolError::InvalidParameter
    );

    emit!(RewardParametersUpdateEvent {
        pool: ctx.accounts.pool.key(),
        payout_amount: pool.payout_amount,
        fee_bips: pool.fee_bips,
        fee_collector: pool.fee_collector,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct SetRewardParameters<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    #[account(
        address = pool.load()?.owner,
    )]
    pub owner: Signer<'info>,
}

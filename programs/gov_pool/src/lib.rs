pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod macros;
pub mod prelude;
pub mod staking;
pub mod state;
pub mod utils;

use anchor_lang::prelude::*;
use instructions::*;
pub use prelude::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "mainnet-beta")] {
        declare_id!("Gov1111111111111111111111111111111111111111");
    } else if #[cfg(feature = "devnet")] {
        declare_id!("Gvd1111111111111111111111111111111111111111");
    } else {
        declare_id!("Gvp1111111111111111111111111111111111111111");
    }
}

#[program]
pub mod gov_pool {
    use super::*;

    // Admin instructions

    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        settings: PoolSettings,
    ) -> GovPoolResult {
        instructions::initialize_pool::initialize_pool(ctx, settings)
    }

    pub fn set_reward_parameters(
        ctx: Context<SetRewardParameters>,
        payout_amount: Option<u64>,
        fee_bips: Option<u64>,
        fee_collector: Option<Pubkey>,
        max_override_tip: Option<u64>,
        min_qualifying_earning_power_bips: Option<u64>,
        delegatee_guardian: Option<Pubkey>,
    ) -> GovPoolResult {
        configure::set_reward_parameters(
            ctx,
            payout_amount,
            fee_bips,
            fee_collector,
            max_override_tip,
            min_qualifying_earning_power_bips,
            delegatee_guardian,
        )
    }

    // Deposit directory

    pub fn fetch_or_initialize_deposit(
        ctx: Context<FetchOrInitializeDeposit>,
        delegatee: Pubkey,
    ) -> GovPoolResult {
        deposit_directory::fetch_or_initialize_deposit(ctx, delegatee)
    }

    // Share ledger

    pub fn stake(ctx: Context<Stake>, amount: u64) -> GovPoolResult {
        instructions::stake::stake(ctx, amount)
    }

    pub fn unstake(ctx: Context<Unstake>, amount: u64) -> GovPoolResult {
        instructions::unstake::unstake(ctx, amount)
    }

    pub fn approve(ctx: Context<Approve>, spender: Pubkey, amount: u64) -> GovPoolResult {
        transfer::approve(ctx, spender, amount)
    }

    pub fn transfer(ctx: Context<TransferStake>, amount: u64) -> GovPoolResult {
        instructions::transfer::transfer(ctx, amount)
    }

    pub fn transfer_from(ctx: Context<TransferStake>, amount: u64) -> GovPoolResult {
        instructions::transfer::transfer_from(ctx, amount)
    }

    pub fn update_deposit(ctx: Context<UpdateDeposit>) -> GovPoolResult {
        instructions::update_deposit::update_deposit(ctx)
    }

    // Reward claim

    pub fn claim_and_distribute_reward<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimReward<'info>>,
        min_expected_reward: u64,
    ) -> GovPoolResult {
        claim_reward::claim_and_distribute_reward(ctx, min_expected_reward)
    }

    // Fixed-balance ledger

    pub fn fixed_stake(ctx: Context<FixedStake>, amount: u64) -> GovPoolResult {
        fixed::fixed_stake(ctx, amount)
    }

    pub fn fixed_unstake(ctx: Context<FixedUnstake>, fixed_tokens: u64) -> GovPoolResult {
        fixed::fixed_unstake(ctx, fixed_tokens)
    }

    pub fn convert_to_fixed(ctx: Context<ConvertToFixed>, amount: u64) -> GovPoolResult {
        fixed::convert_to_fixed(ctx, amount)
    }

    pub fn convert_to_rebasing(
        ctx: Context<ConvertToRebasing>,
        fixed_tokens: u64,
    ) -> GovPoolResult {
        fixed::convert_to_rebasing(ctx, fixed_tokens)
    }

    pub fn fixed_approve(
        ctx: Context<FixedApprove>,
        spender: Pubkey,
        fixed_tokens: u64,
    ) -> GovPoolResult {
        fixed::fixed_approve(ctx, spender, fixed_tokens)
    }

    pub fn fixed_transfer(ctx: Context<FixedTransfer>, fixed_tokens: u64) -> GovPoolResult {
        fixed::fixed_transfer(ctx, fixed_tokens)
    }

    pub fn fixed_rescue(ctx: Context<FixedRescue>) -> GovPoolResult {
        fixed::fixed_rescue(ctx)
    }

    // Override guardian

    pub fn enact_override(ctx: Context<EnactOverride>, requested_tip: u64) -> GovPoolResult {
        override_guard::enact_override(ctx, requested_tip)
    }

    pub fn revoke_override(ctx: Context<GuardOverride>) -> GovPoolResult {
        override_guard::revoke_override(ctx)
    }

    pub fn migrate_override(
        ctx: Context<GuardOverride>,
        new_delegatee: Pubkey,
    ) -> GovPoolResult {
        override_guard::migrate_override(ctx, new_delegatee)
    }
}

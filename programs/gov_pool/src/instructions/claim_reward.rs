use crate::{
    check,
    constants::{HOLDER_SEED, POOL_AUTHORITY_SEED, REWARD_VAULT_SEED, STAKE_VAULT_SEED},
    events::RewardClaimEvent,
    math_error, pool_signer, staking,
    state::{deposit::DelegateeDeposit, holder::HolderPosition, pool::Pool},
    utils::bips_of,
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

/// Permissionless Dutch-auction claim: whoever calls first pays the pool's
/// fixed `payout_amount` of underlying and walks away with every reward the
/// listed deposits have accumulated.
///
/// 1. Claim CPI per collaborator deposit passed in `remaining_accounts`,
///    measuring the reward received into the reward vault.
/// 2. Rebase the ledger: supply grows by the payout, the fee portion is
///    minted as shares to the fee collector.
/// 3. Pull the payout from the caller and park it in the default deposit.
/// 4. Forward the full reward to the recipient.
pub fn claim_and_distribute_reward<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimReward<'info>>,
    min_expected_reward: u64,
) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let (pool_authority_bump, payout_amount, fee_bips, staker_program_key) = {
        let pool = ctx.accounts.pool.load()?;
        (
            pool.pool_authority_bump,
            pool.payout_amount,
            pool.fee_bips,
            pool.staker_program,
        )
    };

    let reward_before = ctx.accounts.reward_vault.amount;
    for staker_deposit in ctx.remaining_accounts.iter() {
        check!(
            staker_deposit.owner == &staker_program_key,
            GovPoolError::InvalidStakerAccount
        );
        staking::cpi_claim_reward(
            &ctx.accounts.staker_program,
            staker_deposit,
            &ctx.accounts.reward_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }
    ctx.accounts.reward_vault.reload()?;
    let reward_amount = ctx
        .accounts
        .reward_vault
        .amount
        .checked_sub(reward_before)
        .ok_or_else(math_error!())?;
    check!(
        reward_amount >= min_expected_reward,
        GovPoolError::InsufficientRewards
    );

    let fee = bips_of(payout_amount, fee_bips)?;
    let fee_shares;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        let mut collector = ctx
            .accounts
            .fee_collector_position
            .load_init()
            .or_else(|_| ctx.accounts.fee_collector_position.load_mut())?;
        if collector.owner == Pubkey::default() {
            collector.owner = ctx.accounts.fee_collector.key();
            collector.pool = pool_key;
            collector.bump = ctx.bumps.fee_collector_position;
        }

        fee_shares = pool.distribute_reward(payout_amount, fee, &mut collector)?;

        let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
        check!(
            default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        default_deposit.add_balance(payout_amount)?;
    }

    if payout_amount > 0 {
        token::transfer(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.payout_source.to_account_info(),
                    to: ctx.accounts.stake_vault.to_account_info(),
                    authority: ctx.accounts.signer.to_account_info(),
                },
            ),
            payout_amount,
        )?;
        staking::cpi_stake_more(
            &ctx.accounts.staker_program,
            &ctx.accounts.default_staker_deposit,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            payout_amount,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }

    if reward_amount > 0 {
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.reward_vault.to_account_info(),
                    to: ctx.accounts.reward_recipient.to_account_info(),
                    authority: ctx.accounts.pool_authority.to_account_info(),
                },
                pool_signer!(pool_key, pool_authority_bump),
            ),
            reward_amount,
        )?;
    }

    emit!(RewardClaimEvent {
        pool: pool_key,
        claimer: ctx.accounts.signer.key(),
        recipient: ctx.accounts.reward_recipient.key(),
        reward_amount,
        payout_amount,
        fee_shares,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct ClaimReward<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
    pub signer: Signer<'info>,

    /// CHECK: Must be the collector recorded on the pool; keyed into the
    /// collector's holder PDA derivation
    #[account(
        address = pool.load()?.fee_collector,
    )]
    pub fee_collector: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = signer,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            fee_collector.key().as_ref(),
        ],
        bump,
    )]
    pub fee_collector_position: AccountLoader<'info, HolderPosition>,

    #[account(
        mut,
        address = pool.load()?.default_deposit,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the default deposit's recorded collaborator account
    #[account(mut)]
    pub default_staker_deposit: AccountInfo<'info>,

    /// CHECK: Seed constraint check
    #[account(
        seeds = [
            POOL_AUTHORITY_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump = pool.load()?.pool_authority_bump,
    )]
    pub pool_authority: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            STAKE_VAULT_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump = pool.load()?.stake_vault_bump,
    )]
    pub stake_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [
            REWARD_VAULT_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump = pool.load()?.reward_vault_bump,
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    /// Caller-funded source of the payout, in the stake mint.
    #[account(mut)]
    pub payout_source: Box<Account<'info, TokenAccount>>,

    /// Receives the claimed rewards, in the reward mint.
    #[account(mut)]
    pub reward_recipient: Box<Account<'info, TokenAccount>>,

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

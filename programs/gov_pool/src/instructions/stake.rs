use crate::{
    check,
    constants::{HOLDER_SEED, POOL_AUTHORITY_SEED, STAKE_VAULT_SEED},
    events::StakeEvent,
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, holder::HolderPosition, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

/// 1. Mint shares against `amount` of underlying.
/// 2. Record the realized balance delta in the holder's checkpoint when the
///    holder routes to a custom deposit.
/// 3. Pull the underlying into the stake vault and push it on to the deposit's
///    collaborator-side account.
pub fn stake(ctx: Context<Stake>, amount: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let deposit_key = ctx.accounts.deposit.key();
    let pool_authority_bump;
    let realized;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut holder = ctx
            .accounts
            .holder
            .load_init()
            .or_else(|_| ctx.accounts.holder.load_mut())?;
        if holder.owner == Pubkey::default() {
            holder.owner = ctx.accounts.signer.key();
            holder.pool = pool_key;
            holder.bump = ctx.bumps.holder;
        }

        let routed = if holder.uses_default_deposit() {
            pool.default_deposit
        } else {
            holder.deposit
        };
        check!(deposit_key == routed, GovPoolError::InvalidDeposit);

        let mut deposit = ctx.accounts.deposit.load_mut()?;
        check!(
            deposit.staker_deposit == ctx.accounts.staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );

        realized = pool.mint_stake(&mut holder, amount)?;
        holder.credit_checkpoint(realized)?;
        deposit.add_balance(amount)?;
    }

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.source_token_account.to_account_info(),
                to: ctx.accounts.stake_vault.to_account_info(),
                authority: ctx.accounts.signer.to_account_info(),
            },
        ),
        amount,
    )?;

    staking::cpi_stake_more(
        &ctx.accounts.staker_program,
        &ctx.accounts.staker_deposit,
        &ctx.accounts.stake_vault.to_account_info(),
        &ctx.accounts.pool_authority,
        &ctx.accounts.token_program.to_account_info(),
        amount,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    emit!(StakeEvent {
        pool: pool_key,
        holder: ctx.accounts.holder.key(),
        amount,
        realized,
        deposit: deposit_key,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
    pub signer: Signer<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = signer,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump,
    )]
    pub holder: AccountLoader<'info, HolderPosition>,

    /// The deposit the holder routes to: their custom deposit, or the pool's
    /// default deposit.
    #[account(
        mut,
        constraint = deposit.load()?.pool == pool.key() @ GovPoolError::InvalidDeposit,
    )]
    pub deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the deposit's recorded collaborator account
    #[account(mut)]
    pub staker_deposit: AccountInfo<'info>,

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

    #[account(mut)]
    pub source_token_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

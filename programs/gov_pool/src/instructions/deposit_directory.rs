use crate::{
    check,
    constants::{DEPOSIT_SEED, POOL_AUTHORITY_SEED},
    events::DepositInitializeEvent,
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;

/// Permissionless. The PDA derivation keys the directory: at most one deposit
/// per delegatee, created lazily on first use. Calling again for an existing
/// delegatee verifies and returns it untouched.
pub fn fetch_or_initialize_deposit(
    ctx: Context<FetchOrInitializeDeposit>,
    delegatee: Pubkey,
) -> GovPoolResult {
    check!(
        delegatee != Pubkey::default(),
        GovPoolError::InvalidDelegatee
    );

    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump = ctx.accounts.pool.load()?.pool_authority_bump;

    let fresh = {
        let mut deposit = ctx
            .accounts
            .deposit
            .load_init()
            .or_else(|_| ctx.accounts.deposit.load_mut())?;

        if deposit.staker_deposit == Pubkey::default() {
            deposit.pool = pool_key;
            deposit.delegatee = delegatee;
            deposit.staker_deposit = ctx.accounts.staker_deposit.key();
            deposit.bump = ctx.bumps.deposit;
            true
        } else {
            check!(
                deposit.staker_deposit == ctx.accounts.staker_deposit.key(),
                GovPoolError::InvalidDeposit
            );
            false
        }
    };

    if fresh {
        staking::cpi_create_deposit(
            &ctx.accounts.staker_program,
            &ctx.accounts.payer.to_account_info(),
            &ctx.accounts.staker_deposit,
            &ctx.accounts.pool_authority,
            &ctx.accounts.system_program.to_account_info(),
            delegatee,
            pool_signer!(pool_key, pool_authority_bump),
        )?;

        emit!(DepositInitializeEvent {
            pool: pool_key,
            delegatee,
            deposit: ctx.accounts.deposit.key(),
            staker_deposit: ctx.accounts.staker_deposit.key(),
        });
    }

    Ok(())
}

#[derive(Accounts)]
#[instruction(delegatee: Pubkey)]
pub struct FetchOrInitializeDeposit<'info> {
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<DelegateeDeposit>(),
        payer = payer,
        seeds = [
            DEPOSIT_SEED.as_bytes(),
            pool.key().as_ref(),
            delegatee.as_ref(),
        ],
        bump,
    )]
    pub deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Seed constraint check
    #[account(
        seeds = [
            POOL_AUTHORITY_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump = pool.load()?.pool_authority_bump,
    )]
    pub pool_authority: AccountInfo<'info>,

    /// CHECK: Created and thereafter owned by the staking collaborator
    #[account(mut)]
    pub staker_deposit: AccountInfo<'info>,

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

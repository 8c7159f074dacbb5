use crate::{
    check,
    constants::{POOL_AUTHORITY_SEED, STAKE_VAULT_SEED},
    events::{OverrideEnactEvent, OverrideMigrateEvent, OverrideRevokeEvent},
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

/// Permissionless. Anyone who can show the deposit's delegatee has fallen
/// below the qualifying earning-power threshold may redirect its voting
/// weight to the default delegatee, collecting a tip socialized out of the
/// pool (supply rebased down, every balance pays proportionally).
pub fn enact_override(ctx: Context<EnactOverride>, requested_tip: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let default_delegatee;
    let delegatee;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;
        default_delegatee = pool.default_delegatee;

        check!(
            ctx.accounts.deposit.key() != pool.default_deposit,
            GovPoolError::InvalidDeposit
        );
        check!(
            requested_tip <= pool.max_override_tip,
            GovPoolError::TipExceedsMax
        );

        let mut deposit = ctx.accounts.deposit.load_mut()?;
        delegatee = deposit.delegatee;
        check!(
            deposit.staker_deposit == ctx.accounts.staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );

        let view = staking::MinimalStakerDeposit::from_account_info(
            &ctx.accounts.staker_deposit,
            &pool.staker_program,
        )?;
        check!(
            deposit.qualifies_for_override(
                view.earning_power,
                pool.min_qualifying_earning_power_bips
            )?,
            GovPoolError::EarningPowerNotQualified
        );

        deposit.enact_override(default_delegatee)?;
        deposit.remove_balance(requested_tip)?;
        pool.socialize_tip(requested_tip)?;
    }

    staking::cpi_alter_delegatee(
        &ctx.accounts.staker_program,
        &ctx.accounts.staker_deposit,
        &ctx.accounts.pool_authority,
        default_delegatee,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    if requested_tip > 0 {
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            &ctx.accounts.staker_deposit,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            requested_tip,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.stake_vault.to_account_info(),
                    to: ctx.accounts.tip_destination.to_account_info(),
                    authority: ctx.accounts.pool_authority.to_account_info(),
                },
                pool_signer!(pool_key, pool_authority_bump),
            ),
            requested_tip,
        )?;
    }

    emit!(OverrideEnactEvent {
        pool: pool_key,
        deposit: ctx.accounts.deposit.key(),
        delegatee,
        tip: requested_tip,
        tip_recipient: ctx.accounts.tip_destination.key(),
    });

    Ok(())
}

#[derive(Accounts)]
pub struct EnactOverride<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        constraint = deposit.load()?.pool == pool.key() @ GovPoolError::InvalidDeposit,
    )]
    pub deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Owner-checked against the pool's staking collaborator before
    /// its state is read
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

    /// Receives the tip, in the stake mint.
    #[account(mut)]
    pub tip_destination: Box<Account<'info, TokenAccount>>,

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

/// Guardian only. Restores the displaced delegatee.
pub fn revoke_override(ctx: Context<GuardOverride>) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump = ctx.accounts.pool.load()?.pool_authority_bump;
    let restored;

    {
        let mut deposit = ctx.accounts.deposit.load_mut()?;
        check!(
            deposit.staker_deposit == ctx.accounts.staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        restored = deposit.revoke_override()?;
    }

    staking::cpi_alter_delegatee(
        &ctx.accounts.staker_program,
        &ctx.accounts.staker_deposit,
        &ctx.accounts.pool_authority,
        restored,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    emit!(OverrideRevokeEvent {
        pool: pool_key,
        deposit: ctx.accounts.deposit.key(),
        restored_delegatee: restored,
    });

    Ok(())
}

/// Guardian only. Re-points a standing override at a new delegatee.
pub fn migrate_override(
    ctx: Context<GuardOverride>,
    new_delegatee: Pubkey,
) -> GovPoolResult {
    check!(
        new_delegatee != Pubkey::default(),
        GovPoolError::InvalidDelegatee
    );

    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump = ctx.accounts.pool.load()?.pool_authority_bump;

    {
        let mut deposit = ctx.accounts.deposit.load_mut()?;
        check!(
            deposit.staker_deposit == ctx.accounts.staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        deposit.migrate_override(new_delegatee)?;
    }

    staking::cpi_alter_delegatee(
        &ctx.accounts.staker_program,
        &ctx.accounts.staker_deposit,
        &ctx.accounts.pool_authority,
        new_delegatee,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    emit!(OverrideMigrateEvent {
        pool: pool_key,
        deposit: ctx.accounts.deposit.key(),
        new_delegatee,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct GuardOverride<'info> {
    pub pool: AccountLoader<'info, Pool>,

    #[account(
        address = pool.load()?.delegatee_guardian,
    )]
    pub delegatee_guardian: Signer<'info>,

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

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,
}

use crate::{
    check,
    constants::{HOLDER_SEED, POOL_AUTHORITY_SEED, STAKE_VAULT_SEED},
    events::DepositUpdateEvent,
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, holder::HolderPosition, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

/// Re-delegation: move the holder's entire underlying value into
/// `new_deposit` and re-sync the checkpoint to the full balance. Passing the
/// default deposit clears the custom routing.
pub fn update_deposit(ctx: Context<UpdateDeposit>) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let new_deposit_key = ctx.accounts.new_deposit.key();
    let pool_authority_bump;
    let old_deposit_key;
    let balance;
    let plan;
    let new_is_default;
    let withdraw_default;
    let restake;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut holder = ctx.accounts.holder.load_mut()?;
        old_deposit_key = if holder.uses_default_deposit() {
            pool.default_deposit
        } else {
            holder.deposit
        };
        check!(
            new_deposit_key != old_deposit_key,
            GovPoolError::InvalidDeposit
        );

        balance = pool.balance_of(&holder)?;
        plan = holder.plan_debit(balance, balance)?;

        new_is_default = new_deposit_key == pool.default_deposit;
        withdraw_default = if new_is_default { 0 } else { plan.from_default };
        restake = withdraw_default
            .checked_add(plan.from_custom)
            .ok_or(GovPoolError::MathError)?;

        if new_is_default {
            holder.deposit = Pubkey::default();
            holder.balance_checkpoint = 0;
        } else {
            holder.deposit = new_deposit_key;
            holder.balance_checkpoint = balance;
        }

        {
            let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
            check!(
                default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
                GovPoolError::InvalidDeposit
            );
            if new_is_default {
                default_deposit.add_balance(plan.from_custom)?;
            } else {
                default_deposit.remove_balance(plan.from_default)?;
            }
        }

        if plan.from_custom > 0 {
            let loader = ctx
                .accounts
                .old_custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(
                loader.key() == old_deposit_key,
                GovPoolError::InvalidDeposit
            );
            let staker = ctx
                .accounts
                .old_custom_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            let mut old_custom = loader.load_mut()?;
            check!(
                old_custom.staker_deposit == staker.key(),
                GovPoolError::InvalidDeposit
            );
            old_custom.remove_balance(plan.from_custom)?;
        }

        if !new_is_default {
            let mut new_deposit = ctx.accounts.new_deposit.load_mut()?;
            check!(
                new_deposit.staker_deposit == ctx.accounts.new_staker_deposit.key(),
                GovPoolError::InvalidDeposit
            );
            new_deposit.add_balance(restake)?;
        }
    }

    if withdraw_default > 0 {
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            &ctx.accounts.default_staker_deposit,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            withdraw_default,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }
    if plan.from_custom > 0 {
        let staker = ctx
            .accounts
            .old_custom_staker_deposit
            .as_ref()
            .ok_or(GovPoolError::InvalidDeposit)?;
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            staker,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            plan.from_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }
    if restake > 0 {
        let target = if new_is_default {
            &ctx.accounts.default_staker_deposit
        } else {
            &ctx.accounts.new_staker_deposit
        };
        staking::cpi_stake_more(
            &ctx.accounts.staker_program,
            target,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            restake,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }

    emit!(DepositUpdateEvent {
        pool: pool_key,
        holder: ctx.accounts.holder.key(),
        old_deposit: old_deposit_key,
        new_deposit: new_deposit_key,
        moved_amount: balance,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct UpdateDeposit<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump = holder.load()?.bump,
    )]
    pub holder: AccountLoader<'info, HolderPosition>,

    #[account(
        mut,
        address = pool.load()?.default_deposit,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the default deposit's recorded collaborator account
    #[account(mut)]
    pub default_staker_deposit: AccountInfo<'info>,

    /// Required when the holder currently routes to a custom deposit.
    #[account(mut)]
    pub old_custom_deposit: Option<AccountLoader<'info, DelegateeDeposit>>,

    /// CHECK: Verified against the old deposit's recorded collaborator account
    #[account(mut)]
    pub old_custom_staker_deposit: Option<AccountInfo<'info>>,

    #[account(
        mut,
        constraint = new_deposit.load()?.pool == pool.key() @ GovPoolError::InvalidDeposit,
    )]
    pub new_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the new deposit's recorded collaborator account
    #[account(mut)]
    pub new_staker_deposit: AccountInfo<'info>,

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

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

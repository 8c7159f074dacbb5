use crate::{
    check,
    constants::{HOLDER_SEED, POOL_AUTHORITY_SEED, STAKE_VAULT_SEED},
    events::UnstakeEvent,
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, holder::HolderPosition, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

/// 1. Burn the shares backing `amount` (full-balance burns every share).
/// 2. Debit the default-backed slice of the balance first, then the custom
///    deposit.
/// 3. Withdraw from the collaborator deposits into the stake vault and forward
///    to the holder, through the withdrawal gate when one is configured.
pub fn unstake(ctx: Context<Unstake>, amount: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let withdrawal_gate;
    let plan;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;
        withdrawal_gate = pool.withdrawal_gate;

        let mut holder = ctx.accounts.holder.load_mut()?;
        let balance = pool.balance_of(&holder)?;
        plan = holder.plan_debit(balance, amount)?;

        pool.burn_stake(&mut holder, amount)?;
        holder.apply_debit(&plan)?;

        let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
        check!(
            default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        default_deposit.remove_balance(plan.from_default)?;

        if plan.from_custom > 0 {
            let custom_loader = ctx
                .accounts
                .custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(
                custom_loader.key() == holder.deposit,
                GovPoolError::InvalidDeposit
            );
            let mut custom_deposit = custom_loader.load_mut()?;
            let custom_staker = ctx
                .accounts
                .custom_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(
                custom_deposit.staker_deposit == custom_staker.key(),
                GovPoolError::InvalidDeposit
            );
            custom_deposit.remove_balance(plan.from_custom)?;
        }
    }

    staking::cpi_withdraw(
        &ctx.accounts.staker_program,
        &ctx.accounts.default_staker_deposit,
        &ctx.accounts.stake_vault.to_account_info(),
        &ctx.accounts.pool_authority,
        &ctx.accounts.token_program.to_account_info(),
        plan.from_default,
        pool_signer!(pool_key, pool_authority_bump),
    )?;
    if plan.from_custom > 0 {
        let custom_staker = ctx
            .accounts
            .custom_staker_deposit
            .as_ref()
            .ok_or(GovPoolError::InvalidDeposit)?;
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            custom_staker,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            plan.from_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }

    if withdrawal_gate != Pubkey::default() {
        let gate_program = ctx
            .accounts
            .withdrawal_gate_program
            .as_ref()
            .ok_or(GovPoolError::InvalidTransfer)?;
        check!(
            gate_program.key() == withdrawal_gate,
            GovPoolError::InvalidTransfer
        );
        staking::cpi_initiate_withdrawal(
            gate_program,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.destination_token_account.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            amount,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    } else {
        token::transfer(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                Transfer {
                    from: ctx.accounts.stake_vault.to_account_info(),
                    to: ctx.accounts.destination_token_account.to_account_info(),
                    authority: ctx.accounts.pool_authority.to_account_info(),
                },
                pool_signer!(pool_key, pool_authority_bump),
            ),
            amount,
        )?;
    }

    emit!(UnstakeEvent {
        pool: pool_key,
        holder: ctx.accounts.holder.key(),
        amount,
        from_default: plan.from_default,
        from_custom: plan.from_custom,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct Unstake<'info> {
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

    /// Required when part of the debit comes out of the holder's custom
    /// deposit.
    #[account(mut)]
    pub custom_deposit: Option<AccountLoader<'info, DelegateeDeposit>>,

    /// CHECK: Verified against the custom deposit's recorded collaborator account
    #[account(mut)]
    pub custom_staker_deposit: Option<AccountInfo<'info>>,

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
    pub destination_token_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    /// CHECK: Verified against the pool's configured withdrawal gate
    #[account(executable)]
    pub withdrawal_gate_program: Option<AccountInfo<'info>>,

    pub token_program: Program<'info, Token>,
}

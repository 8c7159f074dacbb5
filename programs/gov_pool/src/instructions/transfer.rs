use crate::{
    check,
    constants::{HOLDER_SEED, POOL_AUTHORITY_SEED, STAKE_VAULT_SEED},
    events::{ApproveEvent, TransferEvent},
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, holder::HolderPosition, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

pub fn approve(ctx: Context<Approve>, spender: Pubkey, amount: u64) -> GovPoolResult {
    let mut holder = ctx.accounts.holder.load_mut()?;
    holder.approve(spender, amount);

    emit!(ApproveEvent {
        pool: ctx.accounts.pool.key(),
        holder: ctx.accounts.holder.key(),
        spender,
        amount,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct Approve<'info> {
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
}

pub fn transfer(ctx: Context<TransferStake>, amount: u64) -> GovPoolResult {
    check!(
        ctx.accounts.authority.key() == ctx.accounts.sender.key(),
        GovPoolError::Unauthorized
    );
    handle_transfer(ctx, amount, false)
}

pub fn transfer_from(ctx: Context<TransferStake>, amount: u64) -> GovPoolResult {
    handle_transfer(ctx, amount, true)
}

/// Shares move at the sender's own balance-to-share ratio; underlying value is
/// rebalanced between the deposits backing the two holders, default-backed
/// slice first. The realized sender/receiver deltas can differ by one unit of
/// truncation, always in the pool's favor.
fn handle_transfer(
    ctx: Context<TransferStake>,
    amount: u64,
    use_allowance: bool,
) -> GovPoolResult {
    check!(
        ctx.accounts.sender.key() != ctx.accounts.receiver.key(),
        GovPoolError::InvalidTransfer
    );

    let pool_key = ctx.accounts.pool.key();
    let receiver_deposit_key = ctx.accounts.receiver_deposit.key();
    let pool_authority_bump;
    let plan;
    let sender_decrease;
    let receiver_increase;
    let receiver_is_default;
    let withdraw_default;
    let restake;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut sender_holder = ctx.accounts.sender_holder.load_mut()?;
        if use_allowance {
            sender_holder.spend_allowance(&ctx.accounts.authority.key(), amount)?;
        }

        let mut receiver_holder = ctx
            .accounts
            .receiver_holder
            .load_init()
            .or_else(|_| ctx.accounts.receiver_holder.load_mut())?;
        if receiver_holder.owner == Pubkey::default() {
            receiver_holder.owner = ctx.accounts.receiver.key();
            receiver_holder.pool = pool_key;
            receiver_holder.bump = ctx.bumps.receiver_holder;
        }

        let sender_balance = pool.balance_of(&sender_holder)?;
        let (decrease, increase) =
            pool.transfer_stake(&mut sender_holder, &mut receiver_holder, amount)?;
        sender_decrease = decrease;
        receiver_increase = increase;

        plan = sender_holder.plan_debit(sender_balance, sender_decrease)?;
        sender_holder.apply_debit(&plan)?;

        let receiver_routed = if receiver_holder.uses_default_deposit() {
            pool.default_deposit
        } else {
            receiver_holder.deposit
        };
        check!(
            receiver_deposit_key == receiver_routed,
            GovPoolError::InvalidDeposit
        );
        receiver_is_default = receiver_routed == pool.default_deposit;

        // The default-backed slice only moves when the receiver routes to a
        // custom deposit; otherwise it is already where it needs to be.
        withdraw_default = if receiver_is_default {
            0
        } else {
            plan.from_default
        };
        restake = withdraw_default
            .checked_add(plan.from_custom)
            .ok_or(GovPoolError::MathError)?;

        receiver_holder.credit_checkpoint(receiver_increase.min(restake))?;

        {
            let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
            default_deposit
                .verify_staker_deposit(&ctx.accounts.default_staker_deposit.key())?;
            if receiver_is_default {
                default_deposit.add_balance(plan.from_custom)?;
            } else {
                default_deposit.remove_balance(plan.from_default)?;
            }
        }

        let sender_custom_key = if plan.from_custom > 0 {
            let loader = ctx
                .accounts
                .sender_custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(
                loader.key() == sender_holder.deposit,
                GovPoolError::InvalidDeposit
            );
            let staker = ctx
                .accounts
                .sender_custom_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            loader.load()?.verify_staker_deposit(&staker.key())?;
            Some(loader.key())
        } else {
            None
        };

        if !receiver_is_default && sender_custom_key == Some(receiver_deposit_key) {
            // Sender's custom deposit doubles as the receiver's routing
            // deposit; net the two legs on the shared mirror. The restake CPI
            // still targets `receiver_staker_deposit`, so it must match the
            // shared deposit's recorded collaborator account too.
            let loader = ctx
                .accounts
                .sender_custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            let staker = ctx
                .accounts
                .receiver_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            let mut shared = loader.load_mut()?;
            shared.verify_staker_deposit(&staker.key())?;
            shared.add_balance(restake)?;
            shared.remove_balance(plan.from_custom)?;
        } else {
            if sender_custom_key.is_some() {
                let loader = ctx
                    .accounts
                    .sender_custom_deposit
                    .as_ref()
                    .ok_or(GovPoolError::InvalidDeposit)?;
                loader.load_mut()?.remove_balance(plan.from_custom)?;
            }
            if !receiver_is_default && restake > 0 {
                let mut receiver_deposit = ctx.accounts.receiver_deposit.load_mut()?;
                let staker = ctx
                    .accounts
                    .receiver_staker_deposit
                    .as_ref()
                    .ok_or(GovPoolError::InvalidDeposit)?;
                receiver_deposit.verify_staker_deposit(&staker.key())?;
                receiver_deposit.add_balance(restake)?;
            }
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
            .sender_custom_staker_deposit
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
        let target = if receiver_is_default {
            &ctx.accounts.default_staker_deposit
        } else {
            ctx.accounts
                .receiver_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?
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

    emit!(TransferEvent {
        pool: pool_key,
        from: ctx.accounts.sender.key(),
        to: ctx.accounts.receiver.key(),
        sender_decrease,
        receiver_increase,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct TransferStake<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The sender, or a spender working down an allowance.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: Keyed into the sender holder PDA derivation
    pub sender: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            sender.key().as_ref(),
        ],
        bump = sender_holder.load()?.bump,
    )]
    pub sender_holder: AccountLoader<'info, HolderPosition>,

    /// CHECK: Keyed into the receiver holder PDA derivation
    pub receiver: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = authority,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            receiver.key().as_ref(),
        ],
        bump,
    )]
    pub receiver_holder: AccountLoader<'info, HolderPosition>,

    #[account(
        mut,
        address = pool.load()?.default_deposit,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the default deposit's recorded collaborator account
    #[account(mut)]
    pub default_staker_deposit: AccountInfo<'info>,

    /// Required when part of the sender's balance is backed by a custom
    /// deposit.
    #[account(mut)]
    pub sender_custom_deposit: Option<AccountLoader<'info, DelegateeDeposit>>,

    /// CHECK: Verified against the custom deposit's recorded collaborator account
    #[account(mut)]
    pub sender_custom_staker_deposit: Option<AccountInfo<'info>>,

    /// The deposit the receiver routes to; pass the default deposit again
    /// when the receiver has no custom delegatee.
    #[account(
        mut,
        constraint = receiver_deposit.load()?.pool == pool.key() @ GovPoolError::InvalidDeposit,
    )]
    pub receiver_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the receiver deposit's recorded collaborator account
    #[account(mut)]
    pub receiver_staker_deposit: Option<AccountInfo<'info>>,

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
    pub system_program: Program<'info, System>,
}

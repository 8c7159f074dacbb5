use crate::{
    check,
    constants::{
        FIXED_ALIAS_SEED, FIXED_SEED, HOLDER_SEED, POOL_AUTHORITY_SEED, STAKE_VAULT_SEED,
    },
    events::{
        ApproveEvent, FixedConvertEvent, FixedRescueEvent, FixedStakeEvent, FixedTransferEvent,
        FixedUnstakeEvent,
    },
    pool_signer, staking,
    state::{
        deposit::DelegateeDeposit,
        fixed_ledger::{fixed_for_shares, shares_for_fixed, FixedPosition},
        holder::HolderPosition,
        pool::Pool,
    },
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

fn init_fixed_if_fresh(
    fixed: &mut FixedPosition,
    owner: Pubkey,
    pool: Pubkey,
    alias: Pubkey,
    bump: u8,
    alias_bump: u8,
) {
    if fixed.owner == Pubkey::default() {
        fixed.owner = owner;
        fixed.pool = pool;
        fixed.alias = alias;
        fixed.bump = bump;
        fixed.alias_bump = alias_bump;
    }
}

fn init_holder_if_fresh(holder: &mut HolderPosition, owner: Pubkey, pool: Pubkey, bump: u8) {
    if holder.owner == Pubkey::default() {
        holder.owner = owner;
        holder.pool = pool;
        holder.bump = bump;
    }
}

/// Stake underlying straight into the fixed ledger: shares land under the
/// holder's alias, the fixed balance records them divided down by the scale
/// factor. All fixed-ledger value is default-backed.
pub fn fixed_stake(ctx: Context<FixedStake>, amount: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let fixed_tokens;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut fixed = ctx
            .accounts
            .fixed
            .load_init()
            .or_else(|_| ctx.accounts.fixed.load_mut())?;
        init_fixed_if_fresh(
            &mut fixed,
            ctx.accounts.signer.key(),
            pool_key,
            ctx.accounts.alias.key(),
            ctx.bumps.fixed,
            ctx.bumps.alias,
        );

        let mut alias_holder = ctx
            .accounts
            .alias_holder
            .load_init()
            .or_else(|_| ctx.accounts.alias_holder.load_mut())?;
        init_holder_if_fresh(
            &mut alias_holder,
            ctx.accounts.alias.key(),
            pool_key,
            ctx.bumps.alias_holder,
        );

        let shares = pool.shares_for_stake(amount)?;
        pool.mint_stake(&mut alias_holder, amount)?;
        fixed_tokens = fixed_for_shares(shares)?;
        fixed.add_balance(fixed_tokens)?;

        let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
        check!(
            default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        default_deposit.add_balance(amount)?;
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
        &ctx.accounts.default_staker_deposit,
        &ctx.accounts.stake_vault.to_account_info(),
        &ctx.accounts.pool_authority,
        &ctx.accounts.token_program.to_account_info(),
        amount,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    emit!(FixedStakeEvent {
        pool: pool_key,
        holder: ctx.accounts.fixed.key(),
        amount,
        fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct FixedStake<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
    pub signer: Signer<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<FixedPosition>(),
        payer = signer,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        seeds = [
            FIXED_ALIAS_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump,
    )]
    pub alias: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = signer,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            alias.key().as_ref(),
        ],
        bump,
    )]
    pub alias_holder: AccountLoader<'info, HolderPosition>,

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

/// Burn fixed tokens back to underlying at the current exchange rate.
pub fn fixed_unstake(ctx: Context<FixedUnstake>, fixed_tokens: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let withdrawal_gate;
    let amount;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;
        withdrawal_gate = pool.withdrawal_gate;

        let mut fixed = ctx.accounts.fixed.load_mut()?;
        let mut alias_holder = ctx.accounts.alias_holder.load_mut()?;

        let shares = shares_for_fixed(fixed_tokens)?;
        fixed.remove_balance(fixed_tokens)?;
        amount = pool.burn_shares(&mut alias_holder, shares)?;

        let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
        check!(
            default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
            GovPoolError::InvalidDeposit
        );
        default_deposit.remove_balance(amount)?;
    }

    staking::cpi_withdraw(
        &ctx.accounts.staker_program,
        &ctx.accounts.default_staker_deposit,
        &ctx.accounts.stake_vault.to_account_info(),
        &ctx.accounts.pool_authority,
        &ctx.accounts.token_program.to_account_info(),
        amount,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

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

    emit!(FixedUnstakeEvent {
        pool: pool_key,
        holder: ctx.accounts.fixed.key(),
        fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct FixedUnstake<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump = fixed.load()?.bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        address = fixed.load()?.alias,
    )]
    pub alias: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            alias.key().as_ref(),
        ],
        bump = alias_holder.load()?.bump,
    )]
    pub alias_holder: AccountLoader<'info, HolderPosition>,

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

/// Move rebasing balance under the fixed ledger. The moved shares are
/// truncated down to whole fixed tokens; sub-scale dust stays on the alias
/// and remains rescuable.
pub fn convert_to_fixed(ctx: Context<ConvertToFixed>, amount: u64) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let sender_decrease;
    let fixed_tokens;
    let from_custom;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut holder = ctx.accounts.holder.load_mut()?;

        let mut fixed = ctx
            .accounts
            .fixed
            .load_init()
            .or_else(|_| ctx.accounts.fixed.load_mut())?;
        init_fixed_if_fresh(
            &mut fixed,
            ctx.accounts.signer.key(),
            pool_key,
            ctx.accounts.alias.key(),
            ctx.bumps.fixed,
            ctx.bumps.alias,
        );

        let mut alias_holder = ctx
            .accounts
            .alias_holder
            .load_init()
            .or_else(|_| ctx.accounts.alias_holder.load_mut())?;
        init_holder_if_fresh(
            &mut alias_holder,
            ctx.accounts.alias.key(),
            pool_key,
            ctx.bumps.alias_holder,
        );

        let balance = pool.balance_of(&holder)?;
        let alias_shares_before: u128 = alias_holder.share_balance.into();

        let (decrease, _) = pool.transfer_stake(&mut holder, &mut alias_holder, amount)?;
        sender_decrease = decrease;

        let moved_shares = u128::from(alias_holder.share_balance) - alias_shares_before;
        fixed_tokens = fixed_for_shares(moved_shares)?;
        fixed.add_balance(fixed_tokens)?;

        let plan = holder.plan_debit(balance, sender_decrease)?;
        holder.apply_debit(&plan)?;
        from_custom = plan.from_custom;

        // The alias is default-backed; only the custom-backed slice moves.
        if from_custom > 0 {
            let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
            check!(
                default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
                GovPoolError::InvalidDeposit
            );
            default_deposit.add_balance(from_custom)?;

            let loader = ctx
                .accounts
                .custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(loader.key() == holder.deposit, GovPoolError::InvalidDeposit);
            let staker = ctx
                .accounts
                .custom_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            let mut custom = loader.load_mut()?;
            check!(
                custom.staker_deposit == staker.key(),
                GovPoolError::InvalidDeposit
            );
            custom.remove_balance(from_custom)?;
        }
    }

    if from_custom > 0 {
        let staker = ctx
            .accounts
            .custom_staker_deposit
            .as_ref()
            .ok_or(GovPoolError::InvalidDeposit)?;
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            staker,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            from_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
        staking::cpi_stake_more(
            &ctx.accounts.staker_program,
            &ctx.accounts.default_staker_deposit,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            from_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }

    emit!(FixedConvertEvent {
        pool: pool_key,
        holder: ctx.accounts.fixed.key(),
        to_fixed: true,
        amount: sender_decrease,
        fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct ConvertToFixed<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
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
        init_if_needed,
        space = 8 + std::mem::size_of::<FixedPosition>(),
        payer = signer,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        seeds = [
            FIXED_ALIAS_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump,
    )]
    pub alias: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = signer,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            alias.key().as_ref(),
        ],
        bump,
    )]
    pub alias_holder: AccountLoader<'info, HolderPosition>,

    #[account(
        mut,
        address = pool.load()?.default_deposit,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the default deposit's recorded collaborator account
    #[account(mut)]
    pub default_staker_deposit: AccountInfo<'info>,

    /// Required when the holder routes to a custom deposit.
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

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// The reverse conversion: whole fixed tokens back to a rebasing balance,
/// value re-routed into the holder's own deposit.
pub fn convert_to_rebasing(
    ctx: Context<ConvertToRebasing>,
    fixed_tokens: u64,
) -> GovPoolResult {
    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump;
    let receiver_increase;
    let moved_to_custom;

    {
        let mut pool = ctx.accounts.pool.load_mut()?;
        pool_authority_bump = pool.pool_authority_bump;

        let mut fixed = ctx.accounts.fixed.load_mut()?;
        let mut alias_holder = ctx.accounts.alias_holder.load_mut()?;
        let mut holder = ctx
            .accounts
            .holder
            .load_init()
            .or_else(|_| ctx.accounts.holder.load_mut())?;
        init_holder_if_fresh(
            &mut holder,
            ctx.accounts.signer.key(),
            pool_key,
            ctx.bumps.holder,
        );

        let shares = shares_for_fixed(fixed_tokens)?;
        fixed.remove_balance(fixed_tokens)?;
        let (sender_decrease, increase) =
            pool.transfer_shares(&mut alias_holder, &mut holder, shares)?;
        receiver_increase = increase;

        moved_to_custom = if holder.uses_default_deposit() {
            0
        } else {
            sender_decrease
        };

        if moved_to_custom > 0 {
            holder.credit_checkpoint(receiver_increase.min(moved_to_custom))?;

            let mut default_deposit = ctx.accounts.default_deposit.load_mut()?;
            check!(
                default_deposit.staker_deposit == ctx.accounts.default_staker_deposit.key(),
                GovPoolError::InvalidDeposit
            );
            default_deposit.remove_balance(moved_to_custom)?;

            let loader = ctx
                .accounts
                .custom_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            check!(loader.key() == holder.deposit, GovPoolError::InvalidDeposit);
            let staker = ctx
                .accounts
                .custom_staker_deposit
                .as_ref()
                .ok_or(GovPoolError::InvalidDeposit)?;
            let mut custom = loader.load_mut()?;
            check!(
                custom.staker_deposit == staker.key(),
                GovPoolError::InvalidDeposit
            );
            custom.add_balance(moved_to_custom)?;
        }
    }

    if moved_to_custom > 0 {
        let staker = ctx
            .accounts
            .custom_staker_deposit
            .as_ref()
            .ok_or(GovPoolError::InvalidDeposit)?;
        staking::cpi_withdraw(
            &ctx.accounts.staker_program,
            &ctx.accounts.default_staker_deposit,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            moved_to_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
        staking::cpi_stake_more(
            &ctx.accounts.staker_program,
            staker,
            &ctx.accounts.stake_vault.to_account_info(),
            &ctx.accounts.pool_authority,
            &ctx.accounts.token_program.to_account_info(),
            moved_to_custom,
            pool_signer!(pool_key, pool_authority_bump),
        )?;
    }

    emit!(FixedConvertEvent {
        pool: pool_key,
        holder: ctx.accounts.fixed.key(),
        to_fixed: false,
        amount: receiver_increase,
        fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct ConvertToRebasing<'info> {
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

    #[account(
        mut,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump = fixed.load()?.bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        address = fixed.load()?.alias,
    )]
    pub alias: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            alias.key().as_ref(),
        ],
        bump = alias_holder.load()?.bump,
    )]
    pub alias_holder: AccountLoader<'info, HolderPosition>,

    #[account(
        mut,
        address = pool.load()?.default_deposit,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Verified against the default deposit's recorded collaborator account
    #[account(mut)]
    pub default_staker_deposit: AccountInfo<'info>,

    /// Required when the holder routes to a custom deposit.
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

    /// CHECK: Must be the collaborator recorded on the pool
    #[account(
        executable,
        address = pool.load()?.staker_program,
    )]
    pub staker_program: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn fixed_approve(ctx: Context<FixedApprove>, spender: Pubkey, fixed_tokens: u64) -> GovPoolResult {
    let mut fixed = ctx.accounts.fixed.load_mut()?;
    fixed.approve(spender, fixed_tokens);

    emit!(ApproveEvent {
        pool: ctx.accounts.pool.key(),
        holder: ctx.accounts.fixed.key(),
        spender,
        amount: fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct FixedApprove<'info> {
    pub pool: AccountLoader<'info, Pool>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump = fixed.load()?.bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,
}

/// Whole fixed tokens move alias-to-alias; both sides stay default-backed so
/// no underlying value moves.
pub fn fixed_transfer(ctx: Context<FixedTransfer>, fixed_tokens: u64) -> GovPoolResult {
    check!(
        ctx.accounts.sender.key() != ctx.accounts.receiver.key(),
        GovPoolError::InvalidTransfer
    );

    let pool_key = ctx.accounts.pool.key();

    let mut pool = ctx.accounts.pool.load_mut()?;
    let mut sender_fixed = ctx.accounts.sender_fixed.load_mut()?;

    if ctx.accounts.authority.key() != ctx.accounts.sender.key() {
        sender_fixed.spend_allowance(&ctx.accounts.authority.key(), fixed_tokens)?;
    }

    let mut receiver_fixed = ctx
        .accounts
        .receiver_fixed
        .load_init()
        .or_else(|_| ctx.accounts.receiver_fixed.load_mut())?;
    init_fixed_if_fresh(
        &mut receiver_fixed,
        ctx.accounts.receiver.key(),
        pool_key,
        ctx.accounts.receiver_alias.key(),
        ctx.bumps.receiver_fixed,
        ctx.bumps.receiver_alias,
    );

    let mut sender_alias_holder = ctx.accounts.sender_alias_holder.load_mut()?;
    let mut receiver_alias_holder = ctx
        .accounts
        .receiver_alias_holder
        .load_init()
        .or_else(|_| ctx.accounts.receiver_alias_holder.load_mut())?;
    init_holder_if_fresh(
        &mut receiver_alias_holder,
        ctx.accounts.receiver_alias.key(),
        pool_key,
        ctx.bumps.receiver_alias_holder,
    );

    let shares = shares_for_fixed(fixed_tokens)?;
    sender_fixed.remove_balance(fixed_tokens)?;
    pool.transfer_shares(&mut sender_alias_holder, &mut receiver_alias_holder, shares)?;
    receiver_fixed.add_balance(fixed_tokens)?;

    emit!(FixedTransferEvent {
        pool: pool_key,
        from: ctx.accounts.sender.key(),
        to: ctx.accounts.receiver.key(),
        fixed_tokens,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct FixedTransfer<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The sender, or a spender working down a fixed-ledger allowance.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: Keyed into the sender's fixed-position PDA derivation
    pub sender: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            sender.key().as_ref(),
        ],
        bump = sender_fixed.load()?.bump,
    )]
    pub sender_fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        address = sender_fixed.load()?.alias,
    )]
    pub sender_alias: AccountInfo<'info>,

    #[account(
        mut,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            sender_alias.key().as_ref(),
        ],
        bump = sender_alias_holder.load()?.bump,
    )]
    pub sender_alias_holder: AccountLoader<'info, HolderPosition>,

    /// CHECK: Keyed into the receiver's fixed-position PDA derivation
    pub receiver: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<FixedPosition>(),
        payer = authority,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            receiver.key().as_ref(),
        ],
        bump,
    )]
    pub receiver_fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        seeds = [
            FIXED_ALIAS_SEED.as_bytes(),
            pool.key().as_ref(),
            receiver.key().as_ref(),
        ],
        bump,
    )]
    pub receiver_alias: AccountInfo<'info>,

    #[account(
        init_if_needed,
        space = 8 + std::mem::size_of::<HolderPosition>(),
        payer = authority,
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            receiver_alias.key().as_ref(),
        ],
        bump,
    )]
    pub receiver_alias_holder: AccountLoader<'info, HolderPosition>,

    pub system_program: Program<'info, System>,
}

/// Credit stray share value sitting on the alias (a rebasing transfer sent
/// directly to it, or accumulated conversion dust) back into the fixed
/// balance, in whole tokens only.
pub fn fixed_rescue(ctx: Context<FixedRescue>) -> GovPoolResult {
    let rescued;

    {
        let mut fixed = ctx.accounts.fixed.load_mut()?;
        let alias_holder = ctx.accounts.alias_holder.load()?;

        rescued = fixed.rescuable(alias_holder.share_balance.into())?;
        check!(rescued > 0, GovPoolError::NothingToRescue);
        fixed.add_balance(rescued)?;
    }

    emit!(FixedRescueEvent {
        pool: ctx.accounts.pool.key(),
        holder: ctx.accounts.fixed.key(),
        rescued_fixed_tokens: rescued,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct FixedRescue<'info> {
    pub pool: AccountLoader<'info, Pool>,

    pub signer: Signer<'info>,

    #[account(
        mut,
        seeds = [
            FIXED_SEED.as_bytes(),
            pool.key().as_ref(),
            signer.key().as_ref(),
        ],
        bump = fixed.load()?.bump,
    )]
    pub fixed: AccountLoader<'info, FixedPosition>,

    /// CHECK: Deterministic alias identity, never a live account
    #[account(
        address = fixed.load()?.alias,
    )]
    pub alias: AccountInfo<'info>,

    #[account(
        seeds = [
            HOLDER_SEED.as_bytes(),
            pool.key().as_ref(),
            alias.key().as_ref(),
        ],
        bump = alias_holder.load()?.bump,
    )]
    pub alias_holder: AccountLoader<'info, HolderPosition>,
}

use crate::{
    check,
    constants::{
        BIPS_DENOMINATOR, DEPOSIT_SEED, MAX_FEE_BIPS, POOL_AUTHORITY_SEED, REWARD_VAULT_SEED,
        STAKE_VAULT_SEED,
    },
    events::PoolInitializeEvent,
    pool_signer, staking,
    state::{deposit::DelegateeDeposit, pool::Pool},
    GovPoolError, GovPoolResult,
};
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct PoolSettings {
    pub owner: Pubkey,
    pub delegatee_guardian: Pubkey,
    /// `Pubkey::default()` disables the withdrawal gate.
    pub withdrawal_gate: Pubkey,
    pub default_delegatee: Pubkey,
    pub fee_collector: Pubkey,
    pub payout_amount: u64,
    pub fee_bips: u64,
    pub max_override_tip: u64,
    pub min_qualifying_earning_power_bips: u64,
    /// Staked at initialization with its shares assigned to nobody, so the
    /// first real staker cannot inflate the exchange rate.
    pub initial_burn_amount: u64,
}

pub fn initialize_pool(ctx: Context<InitializePool>, settings: PoolSettings) -> GovPoolResult {
    check!(
        settings.fee_bips <= MAX_FEE_BIPS,
        GovPoolError::InvalidParameter
    );
    check!(
        settings.min_qualifying_earning_power_bips <= BIPS_DENOMINATOR,
        GovPoolError::InvalidParameter
    );
    check!(
        settings.default_delegatee != Pubkey::default(),
        GovPoolError::InvalidDelegatee
    );
    check!(
        settings.initial_burn_amount > 0,
        GovPoolError::ZeroAmount
    );

    let pool_key = ctx.accounts.pool.key();
    let pool_authority_bump = ctx.bumps.pool_authority;

    {
        let mut pool = ctx.accounts.pool.load_init()?;
        pool.owner = settings.owner;
        pool.delegatee_guardian = settings.delegatee_guardian;
        pool.staker_program = ctx.accounts.staker_program.key();
        pool.withdrawal_gate = settings.withdrawal_gate;
        pool.stake_mint = ctx.accounts.stake_mint.key();
        pool.reward_mint = ctx.accounts.reward_mint.key();
        pool.default_delegatee = settings.default_delegatee;
        pool.default_deposit = ctx.accounts.default_deposit.key();
        pool.stake_vault = ctx.accounts.stake_vault.key();
        pool.reward_vault = ctx.accounts.reward_vault.key();
        pool.fee_collector = settings.fee_collector;
        pool.payout_amount = settings.payout_amount;
        pool.fee_bips = settings.fee_bips;
        pool.max_override_tip = settings.max_override_tip;
        pool.min_qualifying_earning_power_bips = settings.min_qualifying_earning_power_bips;
        pool.pool_authority_bump = pool_authority_bump;
        pool.stake_vault_bump = ctx.bumps.stake_vault;
        pool.reward_vault_bump = ctx.bumps.reward_vault;

        pool.mint_burned_stake(settings.initial_burn_amount)?;

        let mut default_deposit = ctx.accounts.default_deposit.load_init()?;
        default_deposit.pool = pool_key;
        default_deposit.delegatee = settings.default_delegatee;
        default_deposit.staker_deposit = ctx.accounts.staker_deposit.key();
        default_deposit.bump = ctx.bumps.default_deposit;
        default_deposit.add_balance(settings.initial_burn_amount)?;
    }

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.initial_stake_source.to_account_info(),
                to: ctx.accounts.stake_vault.to_account_info(),
                authority: ctx.accounts.payer.to_account_info(),
            },
        ),
        settings.initial_burn_amount,
    )?;

    staking::cpi_create_deposit(
        &ctx.accounts.staker_program,
        &ctx.accounts.payer.to_account_info(),
        &ctx.accounts.staker_deposit,
        &ctx.accounts.pool_authority,
        &ctx.accounts.system_program.to_account_info(),
        settings.default_delegatee,
        pool_signer!(pool_key, pool_authority_bump),
    )?;
    staking::cpi_stake_more(
        &ctx.accounts.staker_program,
        &ctx.accounts.staker_deposit,
        &ctx.accounts.stake_vault.to_account_info(),
        &ctx.accounts.pool_authority,
        &ctx.accounts.token_program.to_account_info(),
        settings.initial_burn_amount,
        pool_signer!(pool_key, pool_authority_bump),
    )?;

    emit!(PoolInitializeEvent {
        pool: pool_key,
        owner: settings.owner,
        default_delegatee: settings.default_delegatee,
        burned_amount: settings.initial_burn_amount,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(settings: PoolSettings)]
pub struct InitializePool<'info> {
    #[account(
        init,
        space = 8 + std::mem::size_of::<Pool>(),
        payer = payer,
    )]
    pub pool: AccountLoader<'info, Pool>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub stake_mint: Box<Account<'info, Mint>>,
    pub reward_mint: Box<Account<'info, Mint>>,

    /// CHECK: Seed constraint check
    #[account(
        seeds = [
            POOL_AUTHORITY_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump
    )]
    pub pool_authority: AccountInfo<'info>,

    #[account(
        init,
        payer = payer,
        token::mint = stake_mint,
        token::authority = pool_authority,
        seeds = [
            STAKE_VAULT_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump,
    )]
    pub stake_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        init,
        payer = payer,
        token::mint = reward_mint,
        token::authority = pool_authority,
        seeds = [
            REWARD_VAULT_SEED.as_bytes(),
            pool.key().as_ref(),
        ],
        bump,
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        init,
        space = 8 + std::mem::size_of::<DelegateeDeposit>(),
        payer = payer,
        seeds = [
            DEPOSIT_SEED.as_bytes(),
            pool.key().as_ref(),
            settings.default_delegatee.as_ref(),
        ],
        bump,
    )]
    pub default_deposit: AccountLoader<'info, DelegateeDeposit>,

    /// CHECK: Created and thereafter owned by the staking collaborator
    #[account(mut)]
    pub staker_deposit: AccountInfo<'info>,

    /// CHECK: Recorded on the pool as its staking collaborator
    #[account(executable)]
    pub staker_program: AccountInfo<'info>,

    #[account(
        mut,
        token::mint = stake_mint,
    )]
    pub initial_stake_source: Box<Account<'info, TokenAccount>>,

    pub rent: Sysvar<'info, Rent>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

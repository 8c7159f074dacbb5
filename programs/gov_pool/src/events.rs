use anchor_lang::prelude::*;

#[event]
pub struct PoolInitializeEvent {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub default_delegatee: Pubkey,
    pub burned_amount: u64,
}

#[event]
pub struct RewardParametersUpdateEvent {
    pub pool: Pubkey,
    pub payout_amount: u64,
    pub fee_bips: u64,
    pub fee_collector: Pubkey,
}

#[event]
pub struct DepositInitializeEvent {
    pub pool: Pubkey,
    pub delegatee: Pubkey,
    pub deposit: Pubkey,
    pub staker_deposit: Pubkey,
}

#[event]
pub struct StakeEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub amount: u64,
    /// Balance increase actually realized after share truncation. At most
    /// `amount`, never less than `amount` minus one rounding unit.
    pub realized: u64,
    pub deposit: Pubkey,
}

#[event]
pub struct UnstakeEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub amount: u64,
    pub from_default: u64,
    pub from_custom: u64,
}

#[event]
pub struct TransferEvent {
    pub pool: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub sender_decrease: u64,
    pub receiver_increase: u64,
}

#[event]
pub struct ApproveEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub spender: Pubkey,
    pub amount: u64,
}

#[event]
pub struct DepositUpdateEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub old_deposit: Pubkey,
    pub new_deposit: Pubkey,
    pub moved_amount: u64,
}

#[event]
pub struct RewardClaimEvent {
    pub pool: Pubkey,
    pub claimer: Pubkey,
    pub recipient: Pubkey,
    pub reward_amount: u64,
    pub payout_amount: u64,
    pub fee_shares: u128,
}

#[event]
pub struct OverrideEnactEvent {
    pub pool: Pubkey,
    pub deposit: Pubkey,
    pub delegatee: Pubkey,
    pub tip: u64,
    pub tip_recipient: Pubkey,
}

#[event]
pub struct OverrideRevokeEvent {
    pub pool: Pubkey,
    pub deposit: Pubkey,
    pub restored_delegatee: Pubkey,
}

#[event]
pub struct OverrideMigrateEvent {
    pub pool: Pubkey,
    pub deposit: Pubkey,
    pub new_delegatee: Pubkey,
}

#[event]
pub struct FixedStakeEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub amount: u64,
    pub fixed_tokens: u64,
}

#[event]
pub struct FixedUnstakeEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub fixed_tokens: u64,
}

#[event]
pub struct FixedConvertEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    /// True when converting rebasing balance into fixed tokens, false for
    /// the reverse direction.
    pub to_fixed: bool,
    pub amount: u64,
    pub fixed_tokens: u64,
}

#[event]
pub struct FixedTransferEvent {
    pub pool: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub fixed_tokens: u64,
}

#[event]
pub struct FixedRescueEvent {
    pub pool: Pubkey,
    pub holder: Pubkey,
    pub rescued_fixed_tokens: u64,
}

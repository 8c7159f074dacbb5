use anchor_lang::prelude::*;

#[error_code]
pub enum GovPoolError {
    #[msg("Math error")] // 6000
    MathError,
    #[msg("Invalid parameter")] // 6001
    InvalidParameter,
    #[msg("Amount must be greater than zero")] // 6002
    ZeroAmount,
    #[msg("Requested amount exceeds balance")] // 6003
    InsufficientBalance,
    #[msg("Requested amount exceeds allowance")] // 6004
    InsufficientAllowance,
    #[msg("Claimed rewards below the caller's minimum")] // 6005
    InsufficientRewards,
    #[msg("Caller lacks the required authority")] // 6006
    Unauthorized,
    #[msg("Deposit is not owned by this pool")] // 6007
    InvalidDeposit,
    #[msg("Invalid delegatee")] // 6008
    InvalidDelegatee,
    #[msg("Deposit is already overridden")] // 6009
    DepositAlreadyOverridden,
    #[msg("Deposit is not overridden")] // 6010
    DepositNotOverridden,
    #[msg("Delegatee earning power does not qualify for an override")] // 6011
    EarningPowerNotQualified,
    #[msg("Requested tip exceeds the configured maximum")] // 6012
    TipExceedsMax,
    #[msg("Invalid vault")] // 6013
    InvalidTransfer,
    #[msg("Invalid staker account")] // 6014
    InvalidStakerAccount,
    #[msg("Fixed-ledger balance too low")] // 6015
    InsufficientFixedBalance,
    #[msg("Nothing to rescue")] // 6016
    NothingToRescue,
}

impl From<GovPoolError> for ProgramError {
    fn from(e: GovPoolError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

use crate::{
    constants::{
        BIPS_DENOMINATOR, DEPOSIT_SEED, FIXED_ALIAS_SEED, HOLDER_SEED, POOL_AUTHORITY_SEED,
    },
    state::share_math::mul_div_floor,
    GovPoolResult,
};
use anchor_lang::prelude::*;

pub fn find_pool_authority_pda(pool_pk: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[POOL_AUTHORITY_SEED.as_bytes(), &pool_pk.to_bytes()],
        &crate::id(),
    )
}

pub fn find_holder_pda(pool_pk: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            HOLDER_SEED.as_bytes(),
            &pool_pk.to_bytes(),
            &owner.to_bytes(),
        ],
        &crate::id(),
    )
}

pub fn find_deposit_pda(pool_pk: &Pubkey, delegatee: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            DEPOSIT_SEED.as_bytes(),
            &pool_pk.to_bytes(),
            &delegatee.to_bytes(),
        ],
        &crate::id(),
    )
}

/// The deterministic alias identity the fixed ledger uses inside the share
/// ledger. PDA construction makes it collision-free with every real account.
pub fn find_fixed_alias_pda(pool_pk: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            FIXED_ALIAS_SEED.as_bytes(),
            &pool_pk.to_bytes(),
            &owner.to_bytes(),
        ],
        &crate::id(),
    )
}

/// Truncating basis-point fraction of `amount`.
pub fn bips_of(amount: u64, bips: u64) -> GovPoolResult<u64> {
    let result = mul_div_floor(amount as u128, bips as u128, BIPS_DENOMINATOR as u128)?;
    Ok(result as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bips_truncates() {
        assert_eq!(bips_of(10_000, 250).unwrap(), 250);
        assert_eq!(bips_of(99, 100).unwrap(), 0);
        assert_eq!(bips_of(101, 100).unwrap(), 1);
    }
}

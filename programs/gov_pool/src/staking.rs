//! Interface to the external staking collaborator and the optional
//! withdrawal-delay collaborator.
//!
//! The pool owns one collaborator-side deposit per delegatee and moves
//! underlying value in and out of them by CPI. Only a minimal slice of the
//! collaborator's deposit account is read back: its balance, its delegatee,
//! and the delegatee's externally scored earning power.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    program::invoke_signed,
};
use bytemuck::{Pod, Zeroable};

use crate::{check, GovPoolError, GovPoolResult};

/// Minimal view of a collaborator-side deposit, read past the 8-byte
/// discriminator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MinimalStakerDeposit {
    pub owner: Pubkey,
    pub beneficiary: Pubkey,
    pub delegatee: Pubkey,
    pub balance: u64,
    pub earning_power: u64,
}

impl MinimalStakerDeposit {
    pub const LEN: usize = std::mem::size_of::<Self>();

    pub fn from_account_info(
        ai: &AccountInfo,
        staker_program: &Pubkey,
    ) -> GovPoolResult<Self> {
        check!(
            ai.owner.eq(staker_program),
            GovPoolError::InvalidStakerAccount
        );
        let data = ai.try_borrow_data()?;
        check!(
            data.len() >= 8 + Self::LEN,
            GovPoolError::InvalidStakerAccount
        );
        Ok(bytemuck::pod_read_unaligned::<Self>(
            &data[8..8 + Self::LEN],
        ))
    }
}

/// Anchor global-namespace discriminator for the collaborator's entry points.
fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    out
}

pub fn cpi_create_deposit<'info>(
    staker_program: &AccountInfo<'info>,
    payer: &AccountInfo<'info>,
    deposit: &AccountInfo<'info>,
    owner: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    delegatee: Pubkey,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    let mut data = sighash("create_deposit").to_vec();
    data.extend_from_slice(&delegatee.to_bytes());
    // Beneficiary of earned rewards is the pool itself.
    data.extend_from_slice(&owner.key.to_bytes());

    let ix = Instruction {
        program_id: *staker_program.key,
        accounts: vec![
            AccountMeta::new(*payer.key, true),
            AccountMeta::new(*deposit.key, false),
            AccountMeta::new_readonly(*owner.key, true),
            AccountMeta::new_readonly(*system_program.key, false),
        ],
        data,
    };
    invoke_signed(
        &ix,
        &[
            payer.clone(),
            deposit.clone(),
            owner.clone(),
            system_program.clone(),
        ],
        signer_seeds,
    )?;
    Ok(())
}

pub fn cpi_stake_more<'info>(
    staker_program: &AccountInfo<'info>,
    deposit: &AccountInfo<'info>,
    source_vault: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    if amount == 0 {
        return Ok(());
    }
    let mut data = sighash("stake_more").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());

    let ix = Instruction {
        program_id: *staker_program.key,
        accounts: vec![
            AccountMeta::new(*deposit.key, false),
            AccountMeta::new(*source_vault.key, false),
            AccountMeta::new_readonly(*authority.key, true),
            AccountMeta::new_readonly(*token_program.key, false),
        ],
        data,
    };
    invoke_signed(
        &ix,
        &[
            deposit.clone(),
            source_vault.clone(),
            authority.clone(),
            token_program.clone(),
        ],
        signer_seeds,
    )?;
    Ok(())
}

pub fn cpi_withdraw<'info>(
    staker_program: &AccountInfo<'info>,
    deposit: &AccountInfo<'info>,
    destination_vault: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    if amount == 0 {
        return Ok(());
    }
    let mut data = sighash("withdraw").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());

    let ix = Instruction {
        program_id: *staker_program.key,
        accounts: vec![
            AccountMeta::new(*deposit.key, false),
            AccountMeta::new(*destination_vault.key, false),
            AccountMeta::new_readonly(*authority.key, true),
            AccountMeta::new_readonly(*token_program.key, false),
        ],
        data,
    };
    invoke_signed(
        &ix,
        &[
            deposit.clone(),
            destination_vault.clone(),
            authority.clone(),
            token_program.clone(),
        ],
        signer_seeds,
    )?;
    Ok(())
}

pub fn cpi_alter_delegatee<'info>(
    staker_program: &AccountInfo<'info>,
    deposit: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    new_delegatee: Pubkey,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    let mut data = sighash("alter_delegatee").to_vec();
    data.extend_from_slice(&new_delegatee.to_bytes());

    let ix = Instruction {
        program_id: *staker_program.key,
        accounts: vec![
            AccountMeta::new(*deposit.key, false),
            AccountMeta::new_readonly(*authority.key, true),
        ],
        data,
    };
    invoke_signed(&ix, &[deposit.clone(), authority.clone()], signer_seeds)?;
    Ok(())
}

pub fn cpi_claim_reward<'info>(
    staker_program: &AccountInfo<'info>,
    deposit: &AccountInfo<'info>,
    reward_vault: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    let data = sighash("claim_reward").to_vec();

    let ix = Instruction {
        program_id: *staker_program.key,
        accounts: vec![
            AccountMeta::new(*deposit.key, false),
            AccountMeta::new(*reward_vault.key, false),
            AccountMeta::new_readonly(*authority.key, true),
            AccountMeta::new_readonly(*token_program.key, false),
        ],
        data,
    };
    invoke_signed(
        &ix,
        &[
            deposit.clone(),
            reward_vault.clone(),
            authority.clone(),
            token_program.clone(),
        ],
        signer_seeds,
    )?;
    Ok(())
}

/// Route unstaked funds through the withdrawal-delay collaborator. Delay and
/// failure semantics past this call are entirely the collaborator's.
pub fn cpi_initiate_withdrawal<'info>(
    gate_program: &AccountInfo<'info>,
    source_vault: &AccountInfo<'info>,
    receiver: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> GovPoolResult {
    let mut data = sighash("initiate_withdrawal").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&receiver.key.to_bytes());

    let ix = Instruction {
        program_id: *gate_program.key,
        accounts: vec![
            AccountMeta::new(*source_vault.key, false),
            AccountMeta::new(*receiver.key, false),
            AccountMeta::new_readonly(*authority.key, true),
            AccountMeta::new_readonly(*token_program.key, false),
        ],
        data,
    };
    invoke_signed(
        &ix,
        &[
            source_vault.clone(),
            receiver.clone(),
            authority.clone(),
            token_program.clone(),
        ],
        signer_seeds,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sighash_is_stable_per_name() {
        assert_eq!(sighash("stake_more"), sighash("stake_more"));
        assert_ne!(sighash("stake_more"), sighash("withdraw"));
    }

    #[test]
    fn minimal_deposit_layout() {
        // Three keys and two u64 counters past the discriminator.
        assert_eq!(MinimalStakerDeposit::LEN, 112);
    }
}

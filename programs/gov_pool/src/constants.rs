pub const POOL_AUTHORITY_SEED: &str = "pool_auth";
pub const STAKE_VAULT_SEED: &str = "stake_vault";
pub const REWARD_VAULT_SEED: &str = "reward_vault";

pub const HOLDER_SEED: &str = "holder";
pub const DEPOSIT_SEED: &str = "deposit";
pub const FIXED_SEED: &str = "fixed";
pub const FIXED_ALIAS_SEED: &str = "fixed_alias";

/// Precision headroom between a raw stake unit and one share. Seeding the
/// first stake at this ratio keeps rebase arithmetic exact until the pool's
/// exchange rate has drifted ten orders of magnitude.
pub const SHARE_SCALE_FACTOR: u128 = 10_000_000_000;

pub const BIPS_DENOMINATOR: u64 = 10_000;

/// Caps `fee_bips` on reward claims. A claim fee above 20% makes the
/// Dutch-auction race unprofitable long before this bound matters.
pub const MAX_FEE_BIPS: u64 = 2_000;

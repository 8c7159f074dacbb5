pub mod claim_reward;
pub mod configure;
pub mod deposit_directory;
pub mod fixed;
pub mod initialize_pool;
pub mod override_guard;
pub mod stake;
pub mod transfer;
pub mod unstake;
pub mod update_deposit;

pub use claim_reward::*;
pub use configure::*;
pub use deposit_directory::*;
pub use fixed::*;
pub use initialize_pool::*;
pub use override_guard::*;
pub use stake::*;
pub use transfer::*;
pub use unstake::*;
pub use update_deposit::*;

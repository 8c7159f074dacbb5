pub mod deposit;
pub mod fixed_ledger;
pub mod holder;
pub mod pool;
pub mod share_math;

pub use deposit::*;
pub use fixed_ledger::*;
pub use holder::*;
pub use pool::*;

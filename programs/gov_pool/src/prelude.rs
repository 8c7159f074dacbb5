use anchor_lang::prelude::*;

pub type GovPoolResult<G = ()> = Result<G>;

pub use crate::{
    errors::GovPoolError,
    macros::*,
    state::pool::Pool,
};

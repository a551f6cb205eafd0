//! Remote schema contract and probing.

mod contract;
mod probe;

pub use contract::*;
pub use probe::*;

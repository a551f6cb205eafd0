//! Domain models for the oncology ward.

mod clinical;
mod patient;
mod treatment;
mod validation;

pub use clinical::*;
pub use patient::*;
pub use treatment::*;
pub use validation::*;

pub mod comparison;
pub mod error;
pub mod guard;
pub mod input;
pub mod tables;
pub mod types;

#[cfg(feature = "valuation")]
pub mod engine;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "sync")]
pub mod sync;

pub use error::FairValueError;
pub use input::{InputRecord, InputState};
pub use types::*;

#[cfg(feature = "valuation")]
pub use engine::evaluate;
#[cfg(feature = "valuation")]
pub use valuation::{ResultLine, ValuationResult};

#[cfg(feature = "sync")]
pub use sync::synchronize;

/// Standard result type for all fair-value computations
pub type FairValueResult<T> = Result<T, FairValueError>;

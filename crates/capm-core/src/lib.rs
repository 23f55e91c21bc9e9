pub mod error;
pub mod intervals;
pub mod prices;
pub mod regression;
pub mod returns;
pub mod statistics;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "density")]
pub mod density;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::CapmError;
pub use types::*;

/// Standard result type for all CAPM engine operations
pub type CapmResult<T> = Result<T, CapmError>;

pub mod error;
pub mod types;

pub mod buy_vs_rent;
pub mod mortgage;
pub mod portfolio;
pub mod projection;
pub mod rental_yield;
pub mod stats;
pub mod tax;

#[cfg(feature = "simulation")]
pub mod monte_carlo;

pub use error::RealtyAnalyticsError;
pub use types::*;

/// Standard result type for all engine operations
pub type RealtyAnalyticsResult<T> = Result<T, RealtyAnalyticsError>;

//! Mathematical utilities: Lorentzian building blocks and fit covariance.

pub mod covariance;
pub mod lorentz;

pub use covariance::*;
pub use lorentz::*;

pub mod scaler;

pub use scaler::*;

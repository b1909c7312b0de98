pub mod classification;
pub mod curves;
pub mod regression;

pub use classification::*;
pub use curves::*;
pub use regression::*;

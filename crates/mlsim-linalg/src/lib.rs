pub mod solve;

pub use solve::*;

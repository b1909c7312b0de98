pub mod complexity;
pub mod logistic;
pub mod regression;

pub use complexity::*;
pub use logistic::*;
pub use regression::*;

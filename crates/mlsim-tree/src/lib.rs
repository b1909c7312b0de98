pub mod criterion;
pub mod decision_tree;

pub use criterion::*;
pub use decision_tree::*;

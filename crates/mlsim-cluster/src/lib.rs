pub mod agglomerative;
pub mod kmeans;

pub use agglomerative::*;
pub use kmeans::*;

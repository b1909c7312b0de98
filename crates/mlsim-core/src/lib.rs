pub mod dataset;
pub mod distance;
pub mod dtype;
pub mod error;
pub mod matrix;

pub use dataset::{Dataset, Point};
pub use distance::DistanceMetric;
pub use dtype::Float;
pub use error::{MlError, MlResult};
pub use matrix::Matrix;

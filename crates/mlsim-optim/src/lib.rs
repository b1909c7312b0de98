pub mod descent;
pub mod objective;

pub use descent::*;
pub use objective::*;

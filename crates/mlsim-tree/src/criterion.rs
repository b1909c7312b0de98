use mlsim_core::Float;
use serde::{Deserialize, Serialize};

/// Node impurity measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// `1 − Σpᵢ²`
    #[default]
    Gini,
    /// `−Σpᵢ·log₂pᵢ`, with `0·log₂0 = 0`
    Entropy,
}

impl Criterion {
    /// Impurity of a node holding `counts[c]` samples of class `c`.
    /// An empty node is pure.
    pub fn impurity<T: Float>(self, counts: &[usize]) -> T {
        let total: usize = counts.iter().sum();
        if total == 0 {
            return T::ZERO;
        }
        let n = T::from_usize(total);
        let proportions = counts.iter().filter(|&&c| c > 0).map(|&c| T::from_usize(c) / n);
        match self {
            Criterion::Gini => T::ONE - proportions.map(|p| p * p).sum::<T>(),
            Criterion::Entropy => -proportions.map(|p| p * p.log2()).sum::<T>(),
        }
    }
}

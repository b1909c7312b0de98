use serde::{Deserialize, Serialize};

use crate::dtype::Float;

/// Distance between two feature vectors of equal length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn distance<T: Float>(self, a: &[T], b: &[T]) -> T {
        match self {
            DistanceMetric::Euclidean => squared_euclidean(a, b).sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b).map(|(&x, &y)| (x - y).abs()).sum(),
        }
    }
}

/// Squared Euclidean distance; avoids the square root when only ordering matters.
pub fn squared_euclidean<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

pub fn euclidean<T: Float>(a: &[T], b: &[T]) -> T {
    DistanceMetric::Euclidean.distance(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_metrics() {
        let a = [0.0f64, 0.0];
        let b = [3.0f64, 4.0];
        assert_abs_diff_eq!(euclidean(&a, &b), 5.0);
        assert_abs_diff_eq!(squared_euclidean(&a, &b), 25.0);
        assert_abs_diff_eq!(DistanceMetric::Manhattan.distance(&a, &b), 7.0);
    }
}

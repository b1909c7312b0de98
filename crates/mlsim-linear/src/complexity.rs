use mlsim_core::{Dataset, Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

use crate::regression::PolynomialRegression;

/// Training and validation error of one polynomial degree.
///
/// Both errors are `None` when the fit at that degree was singular.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct ComplexityPoint<T: Float> {
    pub degree: usize,
    pub training_error: Option<T>,
    pub validation_error: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct ComplexityCurve<T: Float> {
    pub points: Vec<ComplexityPoint<T>>,
    /// Degree with the lowest validation error; the lowest degree wins ties.
    pub best_degree: Option<usize>,
}

/// Fit polynomials of degree `1..=max_degree` on `train` and score each on
/// both sets. Low degrees underfit (both errors high); high degrees overfit
/// (training error keeps falling while validation error rises).
pub fn degree_sweep<T: Float>(
    train: &Dataset<T>,
    validation: &Dataset<T>,
    max_degree: usize,
) -> MlResult<ComplexityCurve<T>> {
    if max_degree == 0 {
        return Err(MlError::invalid("max_degree", "must be at least 1"));
    }
    train.require_non_empty()?;
    validation.require_non_empty()?;

    let mut points = Vec::with_capacity(max_degree);
    let mut best: Option<(usize, T)> = None;
    for degree in 1..=max_degree {
        let point = match PolynomialRegression::new(degree).fit(train) {
            Ok(fit) => {
                let training_error = fit.mse(train)?;
                let validation_error = fit.mse(validation)?;
                if best.map_or(true, |(_, e)| validation_error < e) {
                    best = Some((degree, validation_error));
                }
                ComplexityPoint {
                    degree,
                    training_error: Some(training_error),
                    validation_error: Some(validation_error),
                }
            }
            Err(MlError::SingularMatrix { .. }) => {
                log::debug!("degree_sweep: degree {} is singular on the training set", degree);
                ComplexityPoint {
                    degree,
                    training_error: None,
                    validation_error: None,
                }
            }
            Err(e) => return Err(e),
        };
        points.push(point);
    }

    Ok(ComplexityCurve {
        points,
        best_degree: best.map(|(d, _)| d),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(xs: &[f64]) -> Dataset<f64> {
        let ys: Vec<f64> = xs.iter().map(|&x| 0.5 * x * x - x + 2.0).collect();
        Dataset::from_xy(xs, &ys).unwrap()
    }

    #[test]
    fn test_sweep_prefers_true_degree() {
        let train_x: Vec<f64> = (0..12).map(|i| -3.0 + i as f64 * 0.5).collect();
        let val_x: Vec<f64> = (0..6).map(|i| -2.75 + i as f64).collect();
        let train = quadratic(&train_x);
        let validation = quadratic(&val_x);

        let curve = degree_sweep(&train, &validation, 4).unwrap();
        assert_eq!(curve.points.len(), 4);
        // Degrees above 2 also fit exactly; only numerical noise separates them.
        assert!(curve.best_degree.unwrap() >= 2);
        let linear = curve.points[0].validation_error.unwrap();
        let quad = curve.points[1].validation_error.unwrap();
        assert!(quad < linear);
    }

    #[test]
    fn test_singular_degrees_are_reported_not_fatal() {
        let train = Dataset::from_xy(&[0.0, 1.0, 2.0], &[1.0, 2.0, 5.0]).unwrap();
        let validation = Dataset::from_xy(&[0.5, 1.5], &[1.25, 3.25]).unwrap();
        let curve = degree_sweep(&train, &validation, 4).unwrap();
        assert!(curve.points[0].training_error.is_some());
        assert!(curve.points[3].training_error.is_none());
    }

    #[test]
    fn test_rejects_zero_degree() {
        let d = Dataset::from_xy(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(degree_sweep(&d, &d, 0).is_err());
    }
}

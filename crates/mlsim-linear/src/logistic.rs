use mlsim_core::{Dataset, Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

/// `1 / (1 + e^−z)`.
pub fn sigmoid<T: Float>(z: T) -> T {
    T::ONE / (T::ONE + (-z).exp())
}

/// Binary logistic scorer: `P(class 1 | x) = sigmoid(w·x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LogisticModel<T: Float> {
    pub weights: Vec<T>,
    pub bias: T,
}

impl<T: Float> LogisticModel<T> {
    pub fn new(weights: Vec<T>, bias: T) -> Self {
        LogisticModel { weights, bias }
    }

    /// `w·x + b`; zero on the decision boundary.
    pub fn decision_value(&self, features: &[T]) -> MlResult<T> {
        if features.len() != self.weights.len() {
            return Err(MlError::DimensionMismatch {
                expected: self.weights.len(),
                got: features.len(),
            });
        }
        let z: T = self
            .weights
            .iter()
            .zip(features)
            .map(|(&w, &x)| w * x)
            .sum();
        Ok(z + self.bias)
    }

    pub fn probability(&self, features: &[T]) -> MlResult<T> {
        Ok(sigmoid(self.decision_value(features)?))
    }

    /// Class 1 iff the probability is strictly greater than 0.5.
    pub fn predict(&self, features: &[T]) -> MlResult<usize> {
        Ok(usize::from(self.probability(features)? > T::HALF))
    }

    /// All weights zero: no boundary exists and every point gets the same class.
    pub fn is_degenerate(&self) -> bool {
        self.weights.iter().all(|&w| w == T::ZERO)
    }

    /// For two features, the boundary `w₁x₁ + w₂x₂ + b = 0` as
    /// `x₂ = slope·x₁ + intercept`. `None` when `w₂` is too small to solve for `x₂`
    /// (vertical or absent boundary) or the model is not two-dimensional.
    pub fn decision_boundary_2d(&self) -> Option<(T, T)> {
        if self.weights.len() != 2 || self.weights[1].abs() < T::from_f64(1e-12) {
            return None;
        }
        let (w1, w2) = (self.weights[0], self.weights[1]);
        Some((-w1 / w2, -self.bias / w2))
    }

    /// Fraction of labeled points classified correctly.
    pub fn accuracy(&self, data: &Dataset<T>) -> MlResult<T> {
        data.require_non_empty()?;
        let labels = data.class_labels()?;
        let mut correct = 0usize;
        for (point, &label) in data.iter().zip(&labels) {
            if self.predict(point.features())? == label {
                correct += 1;
            }
        }
        Ok(T::from_usize(correct) / T::from_usize(labels.len()))
    }
}

/// Batch gradient descent on binary cross-entropy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LogisticRegression<T: Float> {
    pub learning_rate: T,
    pub epochs: usize,
}

/// Trained model plus the mean cross-entropy after each epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LogisticFit<T: Float> {
    pub model: LogisticModel<T>,
    pub loss_trace: Vec<T>,
}

impl<T: Float> LogisticRegression<T> {
    pub fn new(learning_rate: T, epochs: usize) -> Self {
        LogisticRegression {
            learning_rate,
            epochs,
        }
    }

    pub fn validate(&self) -> MlResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= T::ZERO {
            return Err(MlError::invalid(
                "learning_rate",
                format!("must be finite and > 0, got {}", self.learning_rate),
            ));
        }
        if self.epochs == 0 {
            return Err(MlError::invalid("epochs", "must be at least 1"));
        }
        Ok(())
    }

    /// Starts from zero weights; labels must be 0 or 1.
    pub fn fit(&self, data: &Dataset<T>) -> MlResult<LogisticFit<T>> {
        self.validate()?;
        data.require_non_empty()?;
        let labels = data.class_labels()?;
        if let Some(index) = labels.iter().position(|&l| l > 1) {
            return Err(MlError::InvalidLabel { index });
        }

        let n = T::from_usize(data.len());
        let p = data.dim();
        let mut model = LogisticModel::new(vec![T::ZERO; p], T::ZERO);
        let mut loss_trace = Vec::with_capacity(self.epochs);
        let eps = T::from_f64(1e-15);

        for _epoch in 0..self.epochs {
            let mut dw = vec![T::ZERO; p];
            let mut db = T::ZERO;
            for (point, &label) in data.iter().zip(&labels) {
                let a = model.probability(point.features())?;
                let error = a - T::from_usize(label);
                for (g, &x) in dw.iter_mut().zip(point.features()) {
                    *g += error * x;
                }
                db += error;
            }
            for (w, g) in model.weights.iter_mut().zip(&dw) {
                *w -= self.learning_rate * *g / n;
            }
            model.bias -= self.learning_rate * db / n;

            let mut loss = T::ZERO;
            for (point, &label) in data.iter().zip(&labels) {
                let a = model.probability(point.features())?;
                let y = T::from_usize(label);
                loss -= y * (a + eps).ln() + (T::ONE - y) * (T::ONE - a + eps).ln();
            }
            loss_trace.push(loss / n);
        }

        log::debug!(
            "logistic: {} epochs, final loss {:?}",
            self.epochs,
            loss_trace.last()
        );
        Ok(LogisticFit { model, loss_trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mlsim_core::Point;

    fn separable() -> Dataset<f64> {
        // label = 1 iff 2x + y − 1 > 0
        let mut points = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                let x = i as f64 - 3.5;
                let y = j as f64 - 3.5;
                let label = if 2.0 * x + y - 1.0 > 0.0 { 1.0 } else { 0.0 };
                points.push(Point::labeled(vec![x, y], label));
            }
        }
        Dataset::new(points).unwrap()
    }

    #[test]
    fn test_sigmoid() {
        assert_abs_diff_eq!(sigmoid(0.0f64), 0.5);
        assert!(sigmoid(20.0f64) > 0.999);
        assert!(sigmoid(-20.0f64) < 0.001);
    }

    #[test]
    fn test_scoring_and_boundary() {
        let model = LogisticModel::new(vec![2.0, 1.0], -1.0);
        assert_eq!(model.predict(&[1.0, 1.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-1.0, 0.0]).unwrap(), 0);
        // Exactly on the boundary: probability is 0.5, which is not > 0.5.
        assert_eq!(model.predict(&[0.5, 0.0]).unwrap(), 0);

        let (slope, intercept) = model.decision_boundary_2d().unwrap();
        assert_abs_diff_eq!(slope, -2.0);
        assert_abs_diff_eq!(intercept, 1.0);
        assert_abs_diff_eq!(model.accuracy(&separable()).unwrap(), 1.0);
    }

    #[test]
    fn test_degenerate_model() {
        let model = LogisticModel::new(vec![0.0, 0.0], 0.3);
        assert!(model.is_degenerate());
        assert_eq!(model.predict(&[100.0, -100.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-100.0, 100.0]).unwrap(), 1);
        assert!(LogisticModel::new(vec![1.0, 0.0], 0.0).decision_boundary_2d().is_none());
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = LogisticModel::new(vec![1.0, 1.0], 0.0);
        assert!(matches!(model.predict(&[1.0]), Err(MlError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_fit_separable() {
        let data = separable();
        let fit = LogisticRegression::new(0.5, 300).fit(&data).unwrap();
        assert_eq!(fit.loss_trace.len(), 300);
        assert!(fit.loss_trace[299] < fit.loss_trace[0]);
        assert!(fit.model.accuracy(&data).unwrap() >= 0.9);
    }

    #[test]
    fn test_fit_rejects_multiclass_and_bad_rate() {
        let data = Dataset::new(vec![
            Point::labeled(vec![0.0], 0.0),
            Point::labeled(vec![1.0], 2.0),
        ])
        .unwrap();
        assert_eq!(
            LogisticRegression::new(0.1, 10).fit(&data).unwrap_err(),
            MlError::InvalidLabel { index: 1 }
        );
        assert!(LogisticRegression::new(0.0, 10).validate().is_err());
        assert!(LogisticRegression::new(0.1, 0).validate().is_err());
    }
}

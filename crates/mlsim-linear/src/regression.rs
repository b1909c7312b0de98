use mlsim_core::{Dataset, Float, Matrix, MlError, MlResult};
use mlsim_linalg::solve;
use serde::{Deserialize, Serialize};

/// Default number of coordinate-descent sweeps for [`Lasso`].
pub const DEFAULT_LASSO_SWEEPS: usize = 100;

// ─── Fitted models ──────────────────────────────────────────────────────────

/// Fitted line `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LinearFit<T: Float> {
    pub slope: T,
    pub intercept: T,
}

impl<T: Float> LinearFit<T> {
    pub fn predict(&self, x: T) -> T {
        self.slope * x + self.intercept
    }

    pub fn mse(&self, data: &Dataset<T>) -> MlResult<T> {
        let xs = single_feature(data)?;
        let ys = data.targets()?;
        let preds: Vec<T> = xs.iter().map(|&x| self.predict(x)).collect();
        Ok(mean_squared_error(&ys, &preds))
    }
}

/// Fitted polynomial; `coefficients[i]` multiplies `x^i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct PolynomialFit<T: Float> {
    pub coefficients: Vec<T>,
}

impl<T: Float> PolynomialFit<T> {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Horner evaluation.
    pub fn predict(&self, x: T) -> T {
        self.coefficients
            .iter()
            .rev()
            .fold(T::ZERO, |acc, &c| acc * x + c)
    }

    pub fn mse(&self, data: &Dataset<T>) -> MlResult<T> {
        let xs = single_feature(data)?;
        let ys = data.targets()?;
        let preds: Vec<T> = xs.iter().map(|&x| self.predict(x)).collect();
        Ok(mean_squared_error(&ys, &preds))
    }
}

/// Regularization term added to the mean squared error when reporting loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub enum Penalty<T: Float> {
    None,
    /// `λ·Σ|wᵢ|`
    L1(T),
    /// `λ·Σwᵢ²`
    L2(T),
}

/// Multi-feature linear model `y = w·x + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LinearModel<T: Float> {
    pub weights: Vec<T>,
    /// Zero when the model was fitted without an intercept.
    pub intercept: T,
}

impl<T: Float> LinearModel<T> {
    pub fn predict(&self, features: &[T]) -> MlResult<T> {
        if features.len() != self.weights.len() {
            return Err(MlError::DimensionMismatch {
                expected: self.weights.len(),
                got: features.len(),
            });
        }
        Ok(dot(&self.weights, features) + self.intercept)
    }

    pub fn predict_all(&self, data: &Dataset<T>) -> MlResult<Vec<T>> {
        data.iter().map(|p| self.predict(p.features())).collect()
    }

    pub fn mse(&self, data: &Dataset<T>) -> MlResult<T> {
        let ys = data.targets()?;
        let preds = self.predict_all(data)?;
        Ok(mean_squared_error(&ys, &preds))
    }

    /// MSE plus the given penalty on the weights (the intercept is never penalized).
    pub fn penalized_loss(&self, data: &Dataset<T>, penalty: Penalty<T>) -> MlResult<T> {
        let mse = self.mse(data)?;
        let reg = match penalty {
            Penalty::None => T::ZERO,
            Penalty::L1(lambda) => lambda * self.weights.iter().map(|w| w.abs()).sum::<T>(),
            Penalty::L2(lambda) => lambda * self.weights.iter().map(|&w| w * w).sum::<T>(),
        };
        Ok(mse + reg)
    }

    /// Count of weights that are exactly zero.
    pub fn zero_weights(&self) -> usize {
        self.weights.iter().filter(|&&w| w == T::ZERO).count()
    }
}

// ─── Ordinary least squares (one feature) ───────────────────────────────────

/// Closed-form simple linear regression on a one-feature dataset.
///
/// `slope = cov(x, y) / var(x)`, `intercept = mean(y) − slope·mean(x)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearRegression;

impl LinearRegression {
    pub fn new() -> Self {
        LinearRegression
    }

    pub fn fit<T: Float>(&self, data: &Dataset<T>) -> MlResult<LinearFit<T>> {
        data.require_non_empty()?;
        let xs = single_feature(data)?;
        let ys = data.targets()?;

        let mx = mean(&xs);
        let my = mean(&ys);
        let mut cov = T::ZERO;
        let mut var = T::ZERO;
        let mut scale = T::ZERO;
        for (&x, &y) in xs.iter().zip(&ys) {
            cov += (x - mx) * (y - my);
            var += (x - mx) * (x - mx);
            scale += x * x;
        }
        // Variance is judged relative to the scale of x.
        if var <= T::EPSILON * scale {
            return Err(MlError::DegenerateInput(
                "x has zero variance; slope is undefined".into(),
            ));
        }

        let slope = cov / var;
        let intercept = my - slope * mx;
        log::debug!("ols: slope={} intercept={} (n={})", slope, intercept, xs.len());
        Ok(LinearFit { slope, intercept })
    }
}

// ─── Polynomial least squares ───────────────────────────────────────────────

/// Least-squares polynomial fit through the normal equations `(XᵀX)·a = Xᵀy`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolynomialRegression {
    pub degree: usize,
}

impl PolynomialRegression {
    pub fn new(degree: usize) -> Self {
        PolynomialRegression { degree }
    }

    /// Propagates `SingularMatrix` when the design has fewer distinct `x`
    /// values than coefficients.
    pub fn fit<T: Float>(&self, data: &Dataset<T>) -> MlResult<PolynomialFit<T>> {
        data.require_non_empty()?;
        let xs = single_feature(data)?;
        let ys = data.targets()?;

        let design = vandermonde(&xs, self.degree)?;
        let coefficients = normal_equations(&design, &ys, &vec![T::ZERO; self.degree + 1])?;
        log::debug!("polynomial: degree {} fitted on {} points", self.degree, xs.len());
        Ok(PolynomialFit { coefficients })
    }
}

/// Rows `[1, x, x², …, x^degree]`.
pub fn vandermonde<T: Float>(xs: &[T], degree: usize) -> MlResult<Matrix<T>> {
    let mut data = Vec::with_capacity(xs.len() * (degree + 1));
    for &x in xs {
        let mut power = T::ONE;
        for _ in 0..=degree {
            data.push(power);
            power = power * x;
        }
    }
    Matrix::new(data, xs.len(), degree + 1)
}

// ─── Ridge ──────────────────────────────────────────────────────────────────

/// Ridge regression (L2): solves `(XᵀX + λI)·w = Xᵀy`.
///
/// With an intercept, a leading column of ones is added and its diagonal
/// entry is left unpenalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Ridge<T: Float> {
    pub lambda: T,
    pub fit_intercept: bool,
}

impl<T: Float> Ridge<T> {
    pub fn new(lambda: T) -> Self {
        Ridge {
            lambda,
            fit_intercept: false,
        }
    }

    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn validate(&self) -> MlResult<()> {
        validate_lambda(self.lambda)
    }

    pub fn fit(&self, data: &Dataset<T>) -> MlResult<LinearModel<T>> {
        self.validate()?;
        data.require_non_empty()?;
        let ys = data.targets()?;
        let p = data.dim();
        let offset = usize::from(self.fit_intercept);

        let mut rows = Vec::with_capacity(data.len());
        for point in data {
            let mut row = Vec::with_capacity(p + offset);
            if self.fit_intercept {
                row.push(T::ONE);
            }
            row.extend_from_slice(point.features());
            rows.push(row);
        }
        let design = Matrix::from_rows(&rows)?;

        let mut penalty = vec![self.lambda; p + offset];
        if self.fit_intercept {
            penalty[0] = T::ZERO;
        }
        let solution = normal_equations(&design, &ys, &penalty)?;

        let (intercept, weights) = if self.fit_intercept {
            (solution[0], solution[1..].to_vec())
        } else {
            (T::ZERO, solution)
        };
        log::debug!("ridge: lambda={} weights={:?}", self.lambda, weights);
        Ok(LinearModel { weights, intercept })
    }
}

/// Multi-feature ordinary least squares; ridge with `λ = 0`.
pub fn fit_least_squares<T: Float>(
    data: &Dataset<T>,
    fit_intercept: bool,
) -> MlResult<LinearModel<T>> {
    Ridge::new(T::ZERO).with_intercept(fit_intercept).fit(data)
}

// ─── Lasso ──────────────────────────────────────────────────────────────────

/// Lasso regression (L1) via cyclic coordinate descent, without intercept.
///
/// Runs exactly `sweeps` passes over the coordinates; there is no early stop.
/// For coordinate `j`, with `denom = Σxᵢⱼ²` and `raw = Σxᵢⱼ·rᵢ / denom`
/// (`r` the residual excluding feature `j`), the update is
/// `wⱼ = soft_threshold(raw, λ / (2·denom))`. This threshold scale differs
/// from the textbook `λ / denom` form; regularization paths are not
/// interchangeable with other lasso implementations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Lasso<T: Float> {
    pub lambda: T,
    pub sweeps: usize,
}

/// Lasso weights together with the number of sweeps that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LassoFit<T: Float> {
    pub model: LinearModel<T>,
    pub sweeps: usize,
}

impl<T: Float> Lasso<T> {
    pub fn new(lambda: T) -> Self {
        Lasso {
            lambda,
            sweeps: DEFAULT_LASSO_SWEEPS,
        }
    }

    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }

    pub fn validate(&self) -> MlResult<()> {
        validate_lambda(self.lambda)?;
        if self.sweeps == 0 {
            return Err(MlError::invalid("sweeps", "must be at least 1"));
        }
        Ok(())
    }

    pub fn fit(&self, data: &Dataset<T>) -> MlResult<LassoFit<T>> {
        self.validate()?;
        data.require_non_empty()?;
        let ys = data.targets()?;
        let p = data.dim();
        let mut w = vec![T::ZERO; p];

        for _sweep in 0..self.sweeps {
            for j in 0..p {
                let mut numerator = T::ZERO;
                let mut denominator = T::ZERO;
                for (point, &y) in data.iter().zip(&ys) {
                    let x = point.features();
                    let partial: T = x
                        .iter()
                        .zip(&w)
                        .enumerate()
                        .filter(|(k, _)| *k != j)
                        .map(|(_, (&xk, &wk))| xk * wk)
                        .sum();
                    numerator += x[j] * (y - partial);
                    denominator += x[j] * x[j];
                }
                if denominator == T::ZERO {
                    // Constant-zero feature contributes nothing.
                    w[j] = T::ZERO;
                    continue;
                }
                let raw = numerator / denominator;
                w[j] = soft_threshold(raw, self.lambda / (T::TWO * denominator));
            }
        }

        log::debug!(
            "lasso: lambda={} sweeps={} zero weights={}",
            self.lambda,
            self.sweeps,
            w.iter().filter(|&&v| v == T::ZERO).count()
        );
        Ok(LassoFit {
            model: LinearModel {
                weights: w,
                intercept: T::ZERO,
            },
            sweeps: self.sweeps,
        })
    }
}

/// `sign(raw)·max(|raw| − threshold, 0)`.
pub fn soft_threshold<T: Float>(raw: T, threshold: T) -> T {
    if raw > threshold {
        raw - threshold
    } else if raw < -threshold {
        raw + threshold
    } else {
        T::ZERO
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Solve `(XᵀX + diag(penalty))·w = Xᵀy`.
fn normal_equations<T: Float>(design: &Matrix<T>, ys: &[T], penalty: &[T]) -> MlResult<Vec<T>> {
    let xt = design.transpose();
    let xtx = xt.matmul(design)?.add_diagonal(penalty)?;
    let xty = xt.matvec(ys)?;
    solve(&xtx, &xty)
}

fn validate_lambda<T: Float>(lambda: T) -> MlResult<()> {
    if !lambda.is_finite() || lambda < T::ZERO {
        return Err(MlError::invalid("lambda", format!("must be finite and >= 0, got {}", lambda)));
    }
    Ok(())
}

fn single_feature<T: Float>(data: &Dataset<T>) -> MlResult<Vec<T>> {
    if data.dim() != 1 && !data.is_empty() {
        return Err(MlError::DimensionMismatch {
            expected: 1,
            got: data.dim(),
        });
    }
    if data.is_empty() {
        return Ok(Vec::new());
    }
    data.column(0)
}

fn mean<T: Float>(values: &[T]) -> T {
    values.iter().copied().sum::<T>() / T::from_usize(values.len())
}

fn dot<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

pub(crate) fn mean_squared_error<T: Float>(ys: &[T], preds: &[T]) -> T {
    if ys.is_empty() {
        return T::ZERO;
    }
    let sum: T = ys
        .iter()
        .zip(preds)
        .map(|(&y, &p)| (y - p) * (y - p))
        .sum();
    sum / T::from_usize(ys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mlsim_core::Point;

    fn three_feature_data(n: usize) -> Dataset<f64> {
        // y = 3·x1 − 1.5·x2 + 0·x3 + small deterministic noise
        let points = (0..n)
            .map(|i| {
                let t = i as f64;
                let x1 = (t * 0.37).sin() * 2.0;
                let x2 = (t * 0.91).cos() * 2.0;
                let x3 = (t * 1.3).sin();
                let y = 3.0 * x1 - 1.5 * x2 + 0.05 * (t * 2.1).sin();
                Point::labeled(vec![x1, x2, x3], y)
            })
            .collect();
        Dataset::new(points).unwrap()
    }

    #[test]
    fn test_ols_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.5, 4.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 3.0).collect();
        let data = Dataset::from_xy(&xs, &ys).unwrap();
        let fit = LinearRegression::new().fit(&data).unwrap();
        assert_abs_diff_eq!(fit.slope, 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.intercept, 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.mse(&data).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ols_fine_scale_inputs() {
        let xs = [0.0, 1e-9, 2e-9, 3e-9];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 3.0).collect();
        let data = Dataset::from_xy(&xs, &ys).unwrap();
        let fit = LinearRegression::new().fit(&data).unwrap();
        assert_abs_diff_eq!(fit.slope, 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.intercept, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ols_degenerate_inputs() {
        let constant = Dataset::from_xy(&[2.0, 2.0, 2.0], &[1.0, 5.0, 3.0]).unwrap();
        assert!(matches!(LinearRegression.fit(&constant), Err(MlError::DegenerateInput(_))));

        let single = Dataset::from_xy(&[1.0], &[1.0]).unwrap();
        assert!(matches!(LinearRegression.fit(&single), Err(MlError::DegenerateInput(_))));

        let empty = Dataset::<f64>::new(vec![]).unwrap();
        assert!(matches!(
            LinearRegression.fit(&empty),
            Err(MlError::InvalidHyperparameter { .. })
        ));

        let two_d = Dataset::new(vec![Point::labeled(vec![1.0, 2.0], 1.0)]).unwrap();
        assert!(matches!(
            LinearRegression.fit(&two_d),
            Err(MlError::DimensionMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_polynomial_recovers_quadratic() {
        let xs: Vec<f64> = (-3..=3).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x * x - x + 2.0).collect();
        let data = Dataset::from_xy(&xs, &ys).unwrap();
        let fit = PolynomialRegression::new(2).fit(&data).unwrap();
        assert_eq!(fit.degree(), 2);
        assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], -1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[2], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.predict(4.0), 6.0, epsilon = 1e-8);
    }

    #[test]
    fn test_polynomial_degree_one_matches_ols() {
        let xs = [0.5, 1.5, 2.0, 3.5, 5.0, 6.0];
        let ys = [1.2, 2.9, 3.1, 6.2, 8.8, 10.1];
        let data = Dataset::from_xy(&xs, &ys).unwrap();
        let ols = LinearRegression.fit(&data).unwrap();
        let poly = PolynomialRegression::new(1).fit(&data).unwrap();
        assert_abs_diff_eq!(poly.coefficients[0], ols.intercept, epsilon = 1e-8);
        assert_abs_diff_eq!(poly.coefficients[1], ols.slope, epsilon = 1e-8);
    }

    #[test]
    fn test_polynomial_underdetermined_is_singular() {
        let data = Dataset::from_xy(&[1.0, 1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            PolynomialRegression::new(2).fit(&data),
            Err(MlError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn test_ridge_limits() {
        let data = three_feature_data(30);
        let ols = fit_least_squares(&data, false).unwrap();
        let tiny = Ridge::new(1e-9).fit(&data).unwrap();
        for j in 0..3 {
            assert_abs_diff_eq!(tiny.weights[j], ols.weights[j], epsilon = 1e-6);
        }
        assert_abs_diff_eq!(ols.weights[0], 3.0, epsilon = 0.05);
        assert_abs_diff_eq!(ols.weights[1], -1.5, epsilon = 0.05);

        let huge = Ridge::new(1e12).fit(&data).unwrap();
        for w in &huge.weights {
            assert!(w.abs() < 1e-6, "weight {} did not shrink", w);
        }
    }

    #[test]
    fn test_ridge_intercept_is_unpenalized() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [6.0, 11.0, 16.0, 21.0];
        let data = Dataset::from_xy(&xs, &ys).unwrap();
        let model = Ridge::new(1e12).with_intercept(true).fit(&data).unwrap();
        assert!(model.weights[0].abs() < 1e-6);
        assert_abs_diff_eq!(model.intercept, 13.5, epsilon = 1e-4);

        let ols = fit_least_squares(&data, true).unwrap();
        assert_abs_diff_eq!(ols.weights[0], 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ols.intercept, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ridge_rejects_negative_lambda() {
        let data = three_feature_data(10);
        assert!(matches!(
            Ridge::new(-1.0).fit(&data),
            Err(MlError::InvalidHyperparameter { name: "lambda", .. })
        ));
        assert!(Ridge::new(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_lasso_zero_lambda_matches_ols() {
        let data = three_feature_data(30);
        let ols = fit_least_squares(&data, false).unwrap();
        let lasso = Lasso::new(0.0).fit(&data).unwrap();
        assert_eq!(lasso.sweeps, DEFAULT_LASSO_SWEEPS);
        for j in 0..3 {
            assert_abs_diff_eq!(lasso.model.weights[j], ols.weights[j], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_lasso_drives_weights_to_exact_zero() {
        let data = three_feature_data(30);
        let unregularized = Lasso::new(0.0).fit(&data).unwrap();
        assert_eq!(unregularized.model.zero_weights(), 0);

        let moderate = Lasso::new(10.0).fit(&data).unwrap();
        let l1 = |m: &LinearModel<f64>| m.weights.iter().map(|w| w.abs()).sum::<f64>();
        assert!(l1(&moderate.model) < l1(&unregularized.model));

        let heavy = Lasso::new(1e4).with_sweeps(5).fit(&data).unwrap();
        assert_eq!(heavy.sweeps, 5);
        assert_eq!(heavy.model.zero_weights(), 3);
        assert!(heavy.model.weights.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_lasso_constant_zero_feature() {
        let data = Dataset::new(vec![
            Point::labeled(vec![1.0, 0.0], 2.0),
            Point::labeled(vec![2.0, 0.0], 4.0),
            Point::labeled(vec![3.0, 0.0], 6.0),
        ])
        .unwrap();
        let fit = Lasso::new(0.001).with_sweeps(1000).fit(&data).unwrap();
        assert_eq!(fit.model.weights[1], 0.0);
        assert_abs_diff_eq!(fit.model.weights[0], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_lasso_validation() {
        let data = three_feature_data(5);
        assert!(Lasso::new(-0.5).fit(&data).is_err());
        assert!(matches!(
            Lasso::new(1.0).with_sweeps(0).fit(&data),
            Err(MlError::InvalidHyperparameter { name: "sweeps", .. })
        ));
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_penalized_loss() {
        let data = Dataset::from_xy(&[1.0, 2.0], &[2.0, 4.0]).unwrap();
        let model = LinearModel {
            weights: vec![2.0],
            intercept: 0.0,
        };
        assert_abs_diff_eq!(model.penalized_loss(&data, Penalty::None).unwrap(), 0.0);
        assert_abs_diff_eq!(model.penalized_loss(&data, Penalty::L1(0.5)).unwrap(), 1.0);
        assert_abs_diff_eq!(model.penalized_loss(&data, Penalty::L2(0.5)).unwrap(), 2.0);
    }
}

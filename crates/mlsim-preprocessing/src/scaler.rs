use mlsim_core::{Dataset, Float, MlError, MlResult, Point};
use serde::{Deserialize, Serialize};

/// Per-feature rescaling strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scaling {
    /// Min-max to `[0, 1]`: `(x − min) / (max − min)`.
    #[default]
    Normalization,
    /// Z-score with the population standard deviation: `(x − mean) / std`.
    Standardization,
}

/// Fitted per-feature `offset` and `scale`; transforms compute
/// `(x − offset) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct FeatureScaler<T: Float> {
    pub scaling: Scaling,
    pub offsets: Vec<T>,
    pub scales: Vec<T>,
}

impl<T: Float> FeatureScaler<T> {
    /// Learn column statistics. A column with zero range (normalization) or
    /// zero deviation (standardization) cannot be rescaled.
    pub fn fit(data: &Dataset<T>, scaling: Scaling) -> MlResult<Self> {
        data.require_non_empty()?;
        let mut offsets = Vec::with_capacity(data.dim());
        let mut scales = Vec::with_capacity(data.dim());
        for j in 0..data.dim() {
            let (offset, scale) = column_stats(&data.column(j)?, scaling);
            if !(scale > T::EPSILON) {
                return Err(MlError::DegenerateInput(format!(
                    "feature {} has no spread to scale",
                    j
                )));
            }
            offsets.push(offset);
            scales.push(scale);
        }
        log::debug!("{:?} fitted on {} features", scaling, data.dim());
        Ok(FeatureScaler {
            scaling,
            offsets,
            scales,
        })
    }

    pub fn transform_point(&self, features: &[T]) -> MlResult<Vec<T>> {
        self.check_dim(features.len())?;
        Ok(features
            .iter()
            .zip(self.offsets.iter().zip(&self.scales))
            .map(|(&x, (&o, &s))| (x - o) / s)
            .collect())
    }

    pub fn inverse_transform_point(&self, scaled: &[T]) -> MlResult<Vec<T>> {
        self.check_dim(scaled.len())?;
        Ok(scaled
            .iter()
            .zip(self.offsets.iter().zip(&self.scales))
            .map(|(&z, (&o, &s))| z * s + o)
            .collect())
    }

    /// New dataset with every point's features rescaled; labels are kept.
    pub fn transform(&self, data: &Dataset<T>) -> MlResult<Dataset<T>> {
        let points = data
            .iter()
            .map(|p| {
                let features = self.transform_point(p.features())?;
                Ok(match p.label() {
                    Some(label) => Point::labeled(features, label),
                    None => Point::new(features),
                })
            })
            .collect::<MlResult<Vec<_>>>()?;
        Dataset::new(points)
    }

    fn check_dim(&self, got: usize) -> MlResult<()> {
        if got != self.offsets.len() {
            return Err(MlError::DimensionMismatch {
                expected: self.offsets.len(),
                got,
            });
        }
        Ok(())
    }
}

impl Scaling {
    /// Fit on `data` and transform it in one step.
    pub fn apply<T: Float>(self, data: &Dataset<T>) -> MlResult<Dataset<T>> {
        FeatureScaler::fit(data, self)?.transform(data)
    }

    /// Rescale a single column of values.
    pub fn apply_values<T: Float>(self, values: &[T]) -> MlResult<Vec<T>> {
        if values.is_empty() {
            return Err(MlError::invalid("values", "nothing to scale"));
        }
        let (offset, scale) = column_stats(values, self);
        if !(scale > T::EPSILON) {
            return Err(MlError::DegenerateInput("values have no spread to scale".into()));
        }
        Ok(values.iter().map(|&v| (v - offset) / scale).collect())
    }
}

fn column_stats<T: Float>(values: &[T], scaling: Scaling) -> (T, T) {
    match scaling {
        Scaling::Normalization => {
            let min = values.iter().copied().fold(T::INFINITY, T::min);
            let max = values.iter().copied().fold(T::NEG_INFINITY, T::max);
            (min, max - min)
        }
        Scaling::Standardization => {
            let n = T::from_usize(values.len());
            let mean = values.iter().copied().sum::<T>() / n;
            let var = values
                .iter()
                .map(|&v| {
                    let d = v - mean;
                    d * d
                })
                .sum::<T>()
                / n;
            (mean, var.sqrt())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table() -> Dataset<f64> {
        Dataset::new(vec![
            Point::labeled(vec![1.0, 10.0], 0.0),
            Point::labeled(vec![5.0, 20.0], 1.0),
            Point::labeled(vec![3.0, 30.0], 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_minmax_scaler() {
        let scaled = Scaling::Normalization.apply(&table()).unwrap();
        assert_eq!(scaled.column(0).unwrap(), vec![0.0, 1.0, 0.5]);
        assert_eq!(scaled.column(1).unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled.targets().unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_standard_scaler() {
        let scaled = Scaling::Standardization.apply(&table()).unwrap();
        for j in 0..2 {
            let col = scaled.column(j).unwrap();
            let mean: f64 = col.iter().sum::<f64>() / 3.0;
            let var: f64 = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_population_std() {
        // mean 5, population std 2
        let z = Scaling::Standardization
            .apply_values(&[2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        assert_abs_diff_eq!(z[0], -1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(z[7], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip_point() {
        let scaler = FeatureScaler::fit(&table(), Scaling::Standardization).unwrap();
        let z = scaler.transform_point(&[4.0, 25.0]).unwrap();
        let back = scaler.inverse_transform_point(&z).unwrap();
        assert_abs_diff_eq!(back[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back[1], 25.0, epsilon = 1e-12);
        assert!(scaler.transform_point(&[1.0]).is_err());
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let points = vec![Point::new(vec![1.0f64, 2.0]), Point::new(vec![1.0, 3.0])];
        let data = Dataset::new(points).unwrap();
        for scaling in [Scaling::Normalization, Scaling::Standardization] {
            assert!(matches!(scaling.apply(&data), Err(MlError::DegenerateInput(_))));
        }
        assert!(Scaling::Normalization.apply_values(&[3.0f64, 3.0]).is_err());
    }
}

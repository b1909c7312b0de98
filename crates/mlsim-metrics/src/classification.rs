use mlsim_core::{Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

/// Binary classification outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tn: usize,
}

/// A classifier score for one sample with its true class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct ScoredSample<T: Float> {
    pub score: T,
    pub positive: bool,
}

impl<T: Float> ScoredSample<T> {
    pub fn new(score: T, positive: bool) -> Self {
        ScoredSample { score, positive }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ConfusionMatrix {
    pub fn new(tp: usize, fp: usize, fn_: usize, tn: usize) -> Self {
        ConfusionMatrix { tp, fp, fn_, tn }
    }

    /// Count outcomes from parallel 0/1 label slices (1 = positive).
    pub fn from_predictions(truth: &[usize], predicted: &[usize]) -> MlResult<Self> {
        if truth.len() != predicted.len() {
            return Err(MlError::DimensionMismatch {
                expected: truth.len(),
                got: predicted.len(),
            });
        }
        let mut cm = ConfusionMatrix::default();
        for (index, (&t, &p)) in truth.iter().zip(predicted).enumerate() {
            match (t, p) {
                (1, 1) => cm.tp += 1,
                (0, 1) => cm.fp += 1,
                (1, 0) => cm.fn_ += 1,
                (0, 0) => cm.tn += 1,
                _ => return Err(MlError::InvalidLabel { index }),
            }
        }
        Ok(cm)
    }

    /// Predict positive iff `score >= threshold`.
    pub fn at_threshold<T: Float>(samples: &[ScoredSample<T>], threshold: T) -> Self {
        let mut cm = ConfusionMatrix::default();
        for s in samples {
            match (s.positive, s.score >= threshold) {
                (true, true) => cm.tp += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
                (false, false) => cm.tn += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.fn_ + self.tn
    }

    pub fn positives(&self) -> usize {
        self.tp + self.fn_
    }

    pub fn negatives(&self) -> usize {
        self.fp + self.tn
    }

    /// `(TP + TN) / total`; 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// `TP / (TP + FP)`; 0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `TP / (TP + FN)`, the true positive rate; 0 without positives.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.positives())
    }

    /// `TN / (TN + FP)`; 0 without negatives.
    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.negatives())
    }

    /// `FP / (FP + TN)`; 0 without negatives.
    pub fn false_positive_rate(&self) -> f64 {
        ratio(self.fp, self.negatives())
    }

    /// Harmonic mean of precision and recall; 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// Fraction of equal labels in two parallel slices.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> MlResult<f64> {
    if truth.len() != predicted.len() {
        return Err(MlError::DimensionMismatch {
            expected: truth.len(),
            got: predicted.len(),
        });
    }
    let correct = truth.iter().zip(predicted).filter(|(a, b)| a == b).count();
    Ok(ratio(correct, truth.len()))
}

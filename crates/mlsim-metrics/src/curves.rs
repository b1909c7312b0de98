use mlsim_core::{Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

use crate::classification::{ConfusionMatrix, ScoredSample};

/// Evenly spaced decision thresholds from 1 down to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSweep {
    pub steps: usize,
}

impl Default for ThresholdSweep {
    fn default() -> Self {
        ThresholdSweep { steps: 50 }
    }
}

impl ThresholdSweep {
    pub fn new(steps: usize) -> Self {
        ThresholdSweep { steps }
    }

    pub fn validate(&self) -> MlResult<()> {
        if self.steps == 0 {
            return Err(MlError::invalid("steps", "threshold sweep needs at least 1 step"));
        }
        Ok(())
    }

    /// `steps + 1` thresholds: `1 − i/steps` for `i = 0..=steps`.
    pub fn thresholds(&self) -> Vec<f64> {
        (0..=self.steps)
            .map(|i| 1.0 - i as f64 / self.steps as f64)
            .collect()
    }
}

/// One point of a threshold curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Swept threshold in `[0, 1]`; `None` for the ROC anchor that predicts
    /// nothing positive.
    pub threshold: Option<f64>,
    pub x: f64,
    pub y: f64,
}

fn counts(samples: &[ScoredSample<impl Float>]) -> (usize, usize) {
    let positives = samples.iter().filter(|s| s.positive).count();
    (positives, samples.len() - positives)
}

/// `(FPR, TPR)` at every threshold of the sweep, preceded by the `(0, 0)`
/// anchor where nothing is predicted positive. The anchor keeps the curve
/// closed when some scores reach 1.
pub fn roc_curve<T: Float>(
    samples: &[ScoredSample<T>],
    sweep: ThresholdSweep,
) -> MlResult<Vec<CurvePoint>> {
    sweep.validate()?;
    let (positives, negatives) = counts(samples);
    if positives == 0 || negatives == 0 {
        return Err(MlError::DegenerateInput(format!(
            "ROC needs both classes, got {} positive and {} negative",
            positives, negatives
        )));
    }
    let mut points = vec![CurvePoint {
        threshold: None,
        x: 0.0,
        y: 0.0,
    }];
    for threshold in sweep.thresholds() {
        let cm = ConfusionMatrix::at_threshold(samples, T::from_f64(threshold));
        points.push(CurvePoint {
            threshold: Some(threshold),
            x: cm.false_positive_rate(),
            y: cm.recall(),
        });
    }
    log::debug!("roc curve: {} points, auc {}", points.len(), auc(&points));
    Ok(points)
}

/// `(recall, precision)` at every threshold of the sweep.
///
/// A threshold that predicts nothing positive plots at precision 1, the
/// usual curve convention; `ConfusionMatrix::precision` reports 0 there.
pub fn pr_curve<T: Float>(
    samples: &[ScoredSample<T>],
    sweep: ThresholdSweep,
) -> MlResult<Vec<CurvePoint>> {
    sweep.validate()?;
    let (positives, _) = counts(samples);
    if positives == 0 {
        return Err(MlError::DegenerateInput("PR curve needs at least one positive".into()));
    }
    let points: Vec<CurvePoint> = sweep
        .thresholds()
        .into_iter()
        .map(|threshold| {
            let cm = ConfusionMatrix::at_threshold(samples, T::from_f64(threshold));
            let precision = if cm.tp + cm.fp == 0 { 1.0 } else { cm.precision() };
            CurvePoint {
                threshold: Some(threshold),
                x: cm.recall(),
                y: precision,
            }
        })
        .collect();
    log::debug!("pr curve: {} points, auc {}", points.len(), auc(&points));
    Ok(points)
}

/// Trapezoidal area under `points` taken in the given order.
///
/// No sorting is applied: `y` may rise and fall freely, and a step back in
/// `x` subtracts area.
pub fn auc(points: &[CurvePoint]) -> f64 {
    trapezoid(points.iter().map(|p| (p.x, p.y)))
}

/// Trapezoidal integral over an ordered `(x, y)` sequence.
pub fn trapezoid(xy: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let mut iter = xy.into_iter();
    let mut prev = match iter.next() {
        Some(p) => p,
        None => return 0.0,
    };
    let mut area = 0.0;
    for p in iter {
        area += (p.0 - prev.0) * (p.1 + prev.1) / 2.0;
        prev = p;
    }
    area
}

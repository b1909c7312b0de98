use mlsim_core::{MlError, MlResult};

fn require(separation: f64, steps: usize, min_separation: f64) -> MlResult<()> {
    if steps == 0 {
        return Err(MlError::invalid("steps", "need at least 1 step"));
    }
    if !separation.is_finite() || separation < min_separation {
        return Err(MlError::invalid(
            "separation",
            format!("must be finite and >= {}, got {}", min_separation, separation),
        ));
    }
    Ok(())
}

fn grid(steps: usize) -> impl Iterator<Item = f64> {
    (0..=steps).map(move |i| i as f64 / steps as f64)
}

/// Analytic ROC curve `TPR = FPR^(1/(separation + 0.1))` sampled at
/// `steps + 1` evenly spaced FPR values, framed by `(0, 0)` and `(1, 1)`.
/// Larger separation bows the curve towards the top-left corner.
pub fn synthetic_roc(separation: f64, steps: usize) -> MlResult<Vec<(f64, f64)>> {
    require(separation, steps, 0.0)?;
    let exponent = 1.0 / (separation + 0.1);
    let mut points = vec![(0.0, 0.0)];
    points.extend(grid(steps).map(|fpr| (fpr, fpr.powf(exponent).min(1.0))));
    points.push((1.0, 1.0));
    Ok(points)
}

/// Analytic precision-recall curve `precision = max(0.1, 1 − recall^separation)`
/// sampled at `steps + 1` evenly spaced recall values.
pub fn synthetic_pr(separation: f64, steps: usize) -> MlResult<Vec<(f64, f64)>> {
    require(separation, steps, f64::MIN_POSITIVE)?;
    Ok(grid(steps)
        .map(|recall| (recall, (1.0 - recall.powf(separation)).max(0.1)))
        .collect())
}

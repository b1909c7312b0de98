use mlsim_core::{Float, MlError, MlResult};

fn check<T: Float>(y_true: &[T], y_pred: &[T]) -> MlResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(MlError::DimensionMismatch {
            expected: y_true.len(),
            got: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MlError::DegenerateInput("no samples to score".into()));
    }
    Ok(())
}

/// Mean Squared Error.
pub fn mse<T: Float>(y_true: &[T], y_pred: &[T]) -> MlResult<f64> {
    check(y_true, y_pred)?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| {
            let d = (t - p).to_f64();
            d * d
        })
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Root Mean Squared Error.
pub fn rmse<T: Float>(y_true: &[T], y_pred: &[T]) -> MlResult<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// Mean Absolute Error.
pub fn mae<T: Float>(y_true: &[T], y_pred: &[T]) -> MlResult<f64> {
    check(y_true, y_pred)?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t - p).to_f64().abs())
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// R² (coefficient of determination). A constant target scores 0.
pub fn r2_score<T: Float>(y_true: &[T], y_pred: &[T]) -> MlResult<f64> {
    check(y_true, y_pred)?;
    let n = y_true.len() as f64;
    let mean_true: f64 = y_true.iter().map(|v| v.to_f64()).sum::<f64>() / n;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| {
            let d = t.to_f64() - p.to_f64();
            d * d
        })
        .sum();
    let ss_tot: f64 = y_true
        .iter()
        .map(|&t| {
            let d = t.to_f64() - mean_true;
            d * d
        })
        .sum();

    if ss_tot < 1e-15 {
        return Ok(0.0);
    }
    Ok(1.0 - ss_res / ss_tot)
}

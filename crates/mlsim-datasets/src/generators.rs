use mlsim_core::{Dataset, MlError, MlResult, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::noise::{standard_normal, Noise};

/// Weights of the sparse regression problem; two of the five are zero.
pub const SPARSE_WEIGHTS: [f64; 5] = [3.0, -1.5, 0.0, 0.8, 0.0];

/// Weights of the dense ridge problem; all five are non-zero.
pub const DENSE_WEIGHTS: [f64; 5] = [3.0, -1.5, 0.2, 0.8, -0.1];

fn require_samples(n: usize) -> MlResult<()> {
    if n == 0 {
        return Err(MlError::invalid("n_samples", "must be at least 1"));
    }
    Ok(())
}

fn require_range(range: (f64, f64)) -> MlResult<()> {
    if !(range.0.is_finite() && range.1.is_finite() && range.0 < range.1) {
        return Err(MlError::invalid(
            "x_range",
            format!("need finite lo < hi, got {:?}", range),
        ));
    }
    Ok(())
}

fn require_probability(name: &'static str, p: f64) -> MlResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(MlError::invalid(name, format!("must be in [0, 1], got {}", p)));
    }
    Ok(())
}

fn uniform(rng: &mut StdRng, range: (f64, f64)) -> f64 {
    range.0 + rng.gen::<f64>() * (range.1 - range.0)
}

/// Gaussian blobs, `per_center` points around each center, labeled with the
/// center's index.
pub fn make_blobs(
    centers: &[Vec<f64>],
    per_center: usize,
    spread: f64,
    seed: u64,
) -> MlResult<Dataset<f64>> {
    if centers.is_empty() {
        return Err(MlError::invalid("centers", "need at least one center"));
    }
    require_samples(per_center)?;
    Noise::Gaussian(spread).validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(centers.len() * per_center);
    for (label, center) in centers.iter().enumerate() {
        for _ in 0..per_center {
            let features = center.iter().map(|&c| c + standard_normal(&mut rng) * spread).collect();
            points.push(Point::labeled(features, label as f64));
        }
    }
    Dataset::new(points)
}

/// `y = slope·x + intercept + noise` with `x` uniform over `x_range`.
pub fn make_line(
    slope: f64,
    intercept: f64,
    n: usize,
    noise: Noise,
    x_range: (f64, f64),
    seed: u64,
) -> MlResult<Dataset<f64>> {
    make_polynomial(&[intercept, slope], n, noise, x_range, seed)
}

/// `y = a·x² + b·x + c + noise`, sorted by `x`.
pub fn make_quadratic(
    a: f64,
    b: f64,
    c: f64,
    n: usize,
    noise: Noise,
    x_range: (f64, f64),
    seed: u64,
) -> MlResult<Dataset<f64>> {
    let data = make_polynomial(&[c, b, a], n, noise, x_range, seed)?;
    let mut points = data.points().to_vec();
    points.sort_by(|p, q| p.features()[0].total_cmp(&q.features()[0]));
    Dataset::new(points)
}

/// `y = Σ coefficients[i]·xⁱ + noise`, coefficients lowest power first.
pub fn make_polynomial(
    coefficients: &[f64],
    n: usize,
    noise: Noise,
    x_range: (f64, f64),
    seed: u64,
) -> MlResult<Dataset<f64>> {
    require_samples(n)?;
    require_range(x_range)?;
    noise.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for _ in 0..n {
        let x = uniform(&mut rng, x_range);
        let y = coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c);
        xs.push(x);
        ys.push(y + noise.sample(&mut rng));
    }
    Dataset::from_xy(&xs, &ys)
}

/// `y = w·x + noise` with every feature uniform on `[−2, 2]`.
pub fn make_sparse_regression(
    true_weights: &[f64],
    n: usize,
    noise: Noise,
    seed: u64,
) -> MlResult<Dataset<f64>> {
    require_samples(n)?;
    if true_weights.is_empty() {
        return Err(MlError::invalid("true_weights", "need at least one feature"));
    }
    noise.validate()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..n)
        .map(|_| {
            let x: Vec<f64> = true_weights.iter().map(|_| uniform(&mut rng, (-2.0, 2.0))).collect();
            let y: f64 = x.iter().zip(true_weights).map(|(a, w)| a * w).sum();
            Point::labeled(x, y + noise.sample(&mut rng))
        })
        .collect();
    Dataset::new(points)
}

/// Points uniform on `[0, 10]²` labeled 1 inside the two regions
/// `x > 5 ∧ y > 4` and `x < 4 ∧ y > 6`, with each label flipped with
/// probability `flip`.
pub fn make_rule_classification(n: usize, flip: f64, seed: u64) -> MlResult<Dataset<f64>> {
    make_labeled_square(n, flip, (0.0, 10.0), seed, |x, y| {
        (x > 5.0 && y > 4.0) || (x < 4.0 && y > 6.0)
    })
}

/// Points uniform on `[−5, 5]²` labeled 1 iff `2x + y − 1 > 0`, with each
/// label flipped with probability `flip`.
pub fn make_linear_classification(n: usize, flip: f64, seed: u64) -> MlResult<Dataset<f64>> {
    make_labeled_square(n, flip, (-5.0, 5.0), seed, |x, y| 2.0 * x + y - 1.0 > 0.0)
}

fn make_labeled_square(
    n: usize,
    flip: f64,
    range: (f64, f64),
    seed: u64,
    rule: impl Fn(f64, f64) -> bool,
) -> MlResult<Dataset<f64>> {
    require_samples(n)?;
    require_probability("flip", flip)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..n)
        .map(|_| {
            let x = uniform(&mut rng, range);
            let y = uniform(&mut rng, range);
            let mut positive = rule(x, y);
            if rng.gen::<f64>() < flip {
                positive = !positive;
            }
            Point::labeled(vec![x, y], if positive { 1.0 } else { 0.0 })
        })
        .collect();
    Dataset::new(points)
}

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use mlsim_core::{MlError, MlResult};

/// Additive noise on generated targets or coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Noise {
    #[default]
    None,
    /// Uniform on `[−width/2, width/2]`.
    Uniform(f64),
    /// Normal with mean 0 and this standard deviation.
    Gaussian(f64),
}

impl Noise {
    pub fn validate(&self) -> MlResult<()> {
        match *self {
            Noise::None => Ok(()),
            Noise::Uniform(v) | Noise::Gaussian(v) if v.is_finite() && v >= 0.0 => Ok(()),
            Noise::Uniform(v) | Noise::Gaussian(v) => Err(MlError::invalid(
                "noise",
                format!("scale must be finite and >= 0, got {}", v),
            )),
        }
    }

    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match *self {
            Noise::None => 0.0,
            Noise::Uniform(width) => (rng.gen::<f64>() - 0.5) * width,
            Noise::Gaussian(std) => standard_normal(rng) * std,
        }
    }
}

/// Box-Muller transform.
pub fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-10);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_noise_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = Noise::Uniform(3.0).sample(&mut rng);
            assert!((-1.5..1.5).contains(&v));
        }
        assert_eq!(Noise::None.sample(&mut rng), 0.0);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| Noise::Gaussian(2.0).sample(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1);
        assert!((var.sqrt() - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_validate() {
        assert!(Noise::Gaussian(-1.0).validate().is_err());
        assert!(Noise::Uniform(f64::NAN).validate().is_err());
        assert!(Noise::Uniform(0.0).validate().is_ok());
    }
}

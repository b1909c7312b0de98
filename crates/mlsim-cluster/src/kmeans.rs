use mlsim_core::distance::squared_euclidean;
use mlsim_core::{Dataset, Float, MlError, MlResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How the first centroids are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Init {
    /// Each coordinate uniform within that feature's `(min, max)` over the data.
    #[default]
    UniformBounds,
    /// k-means++: spread seeds by sampling proportional to squared distance.
    PlusPlus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iter: usize,
    pub init: Init,
    /// Independent restarts; the run with the lowest inertia is kept.
    /// Defaults to 10. A single run can strand a centroid in an empty region
    /// or place two centroids in one cluster.
    pub n_init: usize,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        KMeansParams {
            k: 3,
            max_iter: 300,
            init: Init::UniformBounds,
            n_init: 10,
            seed: 42,
        }
    }
}

impl KMeansParams {
    pub fn new(k: usize) -> Self {
        KMeansParams {
            k,
            ..KMeansParams::default()
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `1 <= k <= n_points`, at least one iteration and one restart.
    pub fn validate(&self, n_points: usize) -> MlResult<()> {
        if self.k == 0 || self.k > n_points {
            return Err(MlError::invalid(
                "k",
                format!("must be in 1..={}, got {}", n_points, self.k),
            ));
        }
        if self.max_iter == 0 {
            return Err(MlError::invalid("max_iter", "must be at least 1"));
        }
        if self.n_init == 0 {
            return Err(MlError::invalid("n_init", "must be at least 1"));
        }
        Ok(())
    }
}

/// Lloyd iteration state between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct KMeansState<T: Float> {
    pub centroids: Vec<Vec<T>>,
    /// Empty until the first assignment step.
    pub assignments: Vec<usize>,
    pub iteration: usize,
    /// The last step left every assignment unchanged.
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct KMeansFit<T: Float> {
    pub centroids: Vec<Vec<T>>,
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: T,
}

/// K-Means clustering (Lloyd's algorithm).
///
/// Converges to a local optimum that depends on the initial centroids; no
/// single run is guaranteed to find the global minimum of inertia. Restarts
/// (`n_init`) and k-means++ seeding make a good optimum more likely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    pub params: KMeansParams,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        KMeans { params }
    }

    /// Initial centroids for the run seeded with `seed`.
    pub fn init<T: Float>(&self, data: &Dataset<T>, seed: u64) -> MlResult<KMeansState<T>> {
        data.require_non_empty()?;
        self.params.validate(data.len())?;
        let mut rng = StdRng::seed_from_u64(seed);
        let centroids = match self.params.init {
            Init::UniformBounds => uniform_centroids(data, self.params.k, &mut rng),
            Init::PlusPlus => plus_plus_centroids(data, self.params.k, &mut rng),
        };
        Ok(KMeansState {
            centroids,
            assignments: Vec::new(),
            iteration: 0,
            converged: false,
        })
    }

    /// One assignment + update round. `state` must hold exactly `k`
    /// centroids of the data's dimension.
    pub fn step<T: Float>(
        &self,
        data: &Dataset<T>,
        state: KMeansState<T>,
    ) -> MlResult<KMeansState<T>> {
        data.require_non_empty()?;
        if state.centroids.len() != self.params.k {
            return Err(MlError::invalid(
                "centroids",
                format!("expected {} centroids, got {}", self.params.k, state.centroids.len()),
            ));
        }
        if let Some(c) = state.centroids.iter().find(|c| c.len() != data.dim()) {
            return Err(MlError::DimensionMismatch {
                expected: data.dim(),
                got: c.len(),
            });
        }
        let assignments: Vec<usize> = data
            .iter()
            .map(|p| nearest_centroid(p.features(), &state.centroids))
            .collect();
        let converged = assignments == state.assignments;

        let k = state.centroids.len();
        let mut sums = vec![vec![T::ZERO; data.dim()]; k];
        let mut counts = vec![0usize; k];
        for (p, &c) in data.iter().zip(&assignments) {
            counts[c] += 1;
            for (s, &v) in sums[c].iter_mut().zip(p.features()) {
                *s += v;
            }
        }
        let centroids = state
            .centroids
            .into_iter()
            .zip(sums)
            .zip(&counts)
            .map(|((old, sum), &count)| {
                if count == 0 {
                    old
                } else {
                    let n = T::from_usize(count);
                    sum.into_iter().map(|s| s / n).collect()
                }
            })
            .collect();

        log::trace!("kmeans iteration {}: sizes {:?}", state.iteration + 1, counts);
        Ok(KMeansState {
            centroids,
            assignments,
            iteration: state.iteration + 1,
            converged,
        })
    }

    /// Iterate one seeded run until assignments stop changing or `max_iter`.
    pub fn run<T: Float>(&self, data: &Dataset<T>, seed: u64) -> MlResult<KMeansFit<T>> {
        let mut state = self.init(data, seed)?;
        while !state.converged && state.iteration < self.params.max_iter {
            state = self.step(data, state)?;
        }
        let inertia = inertia(data, &state.centroids, &state.assignments)?;
        Ok(KMeansFit {
            centroids: state.centroids,
            assignments: state.assignments,
            iterations: state.iteration,
            converged: state.converged,
            inertia,
        })
    }

    /// Best of `n_init` runs seeded `seed, seed + 1, ...`.
    pub fn fit<T: Float>(&self, data: &Dataset<T>) -> MlResult<KMeansFit<T>> {
        data.require_non_empty()?;
        self.params.validate(data.len())?;
        let mut best: Option<KMeansFit<T>> = None;
        for run in 0..self.params.n_init {
            let fit = self.run(data, self.params.seed.wrapping_add(run as u64))?;
            log::debug!(
                "kmeans run {}: {} iterations, converged={}, inertia={}",
                run,
                fit.iterations,
                fit.converged,
                fit.inertia
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        best.ok_or_else(|| MlError::invalid("n_init", "must be at least 1"))
    }
}

/// Index of the closest centroid; the lowest index wins ties.
pub fn nearest_centroid<T: Float>(point: &[T], centroids: &[Vec<T>]) -> usize {
    let mut best = 0;
    let mut best_dist = T::INFINITY;
    for (k, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(point, c);
        if d < best_dist {
            best_dist = d;
            best = k;
        }
    }
    best
}

/// Sum of squared distances from each point to its assigned centroid.
pub fn inertia<T: Float>(
    data: &Dataset<T>,
    centroids: &[Vec<T>],
    assignments: &[usize],
) -> MlResult<T> {
    if assignments.len() != data.len() {
        return Err(MlError::DimensionMismatch {
            expected: data.len(),
            got: assignments.len(),
        });
    }
    data.iter()
        .zip(assignments)
        .map(|(p, &c)| match centroids.get(c) {
            Some(centroid) => Ok(squared_euclidean(p.features(), centroid)),
            None => Err(MlError::invalid(
                "assignments",
                format!("cluster {} has no centroid ({} given)", c, centroids.len()),
            )),
        })
        .sum()
}

fn uniform_centroids<T: Float>(data: &Dataset<T>, k: usize, rng: &mut StdRng) -> Vec<Vec<T>> {
    let bounds = data.feature_bounds();
    (0..k)
        .map(|_| {
            bounds
                .iter()
                .map(|&(lo, hi)| lo + T::from_f64(rng.gen::<f64>()) * (hi - lo))
                .collect()
        })
        .collect()
}

fn plus_plus_centroids<T: Float>(data: &Dataset<T>, k: usize, rng: &mut StdRng) -> Vec<Vec<T>> {
    let points = data.points();
    let n = points.len();
    let mut centroids: Vec<Vec<T>> = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].features().to_vec());

    let mut nearest: Vec<T> = points
        .iter()
        .map(|p| squared_euclidean(p.features(), &centroids[0]))
        .collect();
    while centroids.len() < k {
        let total: T = nearest.iter().copied().sum();
        let threshold = T::from_f64(rng.gen::<f64>()) * total;
        let mut cumulative = T::ZERO;
        let mut selected = n - 1;
        for (i, &d) in nearest.iter().enumerate() {
            cumulative += d;
            if d > T::ZERO && cumulative >= threshold {
                selected = i;
                break;
            }
        }
        let chosen = points[selected].features().to_vec();
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_euclidean(p.features(), &chosen));
        }
        centroids.push(chosen);
    }
    centroids
}

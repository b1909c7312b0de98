use mlsim_core::{Dataset, DistanceMetric, Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

/// Inter-cluster distance built from pairwise point distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// Minimum pairwise distance.
    #[default]
    Single,
    /// Maximum pairwise distance.
    Complete,
    /// Mean pairwise distance.
    Average,
}

/// One agglomeration step.
///
/// Points are clusters `0..n`; the cluster created by merge `s` gets id
/// `n + s`, so ids never shift as the active set shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Merge<T: Float> {
    pub left: usize,
    pub right: usize,
    pub distance: T,
    /// Points in the merged cluster.
    pub size: usize,
}

/// Full merge history of a hierarchical clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Dendrogram<T: Float> {
    n_points: usize,
    merges: Vec<Merge<T>>,
}

impl<T: Float> Dendrogram<T> {
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Exactly `n_points − 1` entries, in merge order.
    pub fn merges(&self) -> &[Merge<T>] {
        &self.merges
    }

    /// Merge distances in merge order.
    pub fn heights(&self) -> Vec<T> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// The `k`-cluster partition obtained by replaying the first `n − k`
    /// recorded merges. Each cluster lists its point indices ascending;
    /// clusters are ordered by their smallest member.
    pub fn cut(&self, k: usize) -> MlResult<Vec<Vec<usize>>> {
        if k == 0 || k > self.n_points {
            return Err(MlError::invalid(
                "k",
                format!("must be in 1..={}, got {}", self.n_points, k),
            ));
        }
        let mut slots: Vec<Option<Vec<usize>>> =
            (0..self.n_points).map(|i| Some(vec![i])).collect();
        for m in &self.merges[..self.n_points - k] {
            let mut members = slots[m.left].take().unwrap_or_default();
            members.extend(slots[m.right].take().unwrap_or_default());
            slots.push(Some(members));
        }
        let mut clusters: Vec<Vec<usize>> = slots
            .into_iter()
            .flatten()
            .map(|mut c| {
                c.sort_unstable();
                c
            })
            .collect();
        clusters.sort_by_key(|c| c[0]);
        Ok(clusters)
    }

    /// Per-point cluster index for the `k`-cluster cut.
    pub fn labels_at(&self, k: usize) -> MlResult<Vec<usize>> {
        let mut labels = vec![0usize; self.n_points];
        for (label, cluster) in self.cut(k)?.iter().enumerate() {
            for &i in cluster {
                labels[i] = label;
            }
        }
        Ok(labels)
    }
}

/// Bottom-up hierarchical clustering: starts with every point as its own
/// cluster and repeatedly merges the closest pair until one remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgglomerativeClustering {
    pub linkage: Linkage,
    pub metric: DistanceMetric,
}

impl AgglomerativeClustering {
    pub fn new(linkage: Linkage) -> Self {
        AgglomerativeClustering {
            linkage,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Record the complete merge sequence. Among equally close pairs the
    /// first one found scanning the active clusters in order wins.
    pub fn fit<T: Float>(&self, data: &Dataset<T>) -> MlResult<Dendrogram<T>> {
        data.require_non_empty()?;
        let n = data.len();
        let points = data.points();

        let mut dist = vec![vec![T::ZERO; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let d = self.metric.distance(points[i].features(), points[j].features());
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        // (cluster id, member points)
        let mut active: Vec<(usize, Vec<usize>)> = (0..n).map(|i| (i, vec![i])).collect();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        while active.len() > 1 {
            let mut min_dist = T::INFINITY;
            let mut merge_a = 0;
            let mut merge_b = 1;
            for i in 0..active.len() {
                for j in i + 1..active.len() {
                    let d = self.cluster_distance(&dist, &active[i].1, &active[j].1);
                    if d < min_dist {
                        min_dist = d;
                        merge_a = i;
                        merge_b = j;
                    }
                }
            }

            let (right_id, right_members) = active.remove(merge_b);
            let (left_id, mut members) = std::mem::take(&mut active[merge_a]);
            members.extend(right_members);
            merges.push(Merge {
                left: left_id,
                right: right_id,
                distance: min_dist,
                size: members.len(),
            });
            log::trace!(
                "merge {}: {} + {} at {}",
                merges.len(),
                left_id,
                right_id,
                min_dist
            );
            active[merge_a] = (n + merges.len() - 1, members);
        }

        log::debug!("hierarchical clustering ({:?}): {} merges", self.linkage, merges.len());
        Ok(Dendrogram { n_points: n, merges })
    }

    fn cluster_distance<T: Float>(&self, dist: &[Vec<T>], a: &[usize], b: &[usize]) -> T {
        let pairs = a.iter().flat_map(|&i| b.iter().map(move |&j| dist[i][j]));
        match self.linkage {
            Linkage::Single => pairs.fold(T::INFINITY, T::min),
            Linkage::Complete => pairs.fold(T::NEG_INFINITY, T::max),
            Linkage::Average => {
                let sum: T = pairs.sum();
                sum / T::from_usize(a.len() * b.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mlsim_core::Point;

    fn data(coords: &[[f64; 2]]) -> Dataset<f64> {
        Dataset::new(coords.iter().map(|c| Point::new(c.to_vec())).collect()).unwrap()
    }

    fn two_pairs() -> Dataset<f64> {
        data(&[[0.0, 0.0], [5.0, 5.0], [0.1, 0.1], [5.2, 5.2]])
    }

    #[test]
    fn test_agglomerative_single() {
        let dendro = AgglomerativeClustering::new(Linkage::Single).fit(&two_pairs()).unwrap();
        assert_eq!(dendro.cut(2).unwrap(), vec![vec![0, 2], vec![1, 3]]);
        assert_eq!(dendro.labels_at(2).unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_merge_sequence_ids() {
        let dendro = AgglomerativeClustering::new(Linkage::Single).fit(&two_pairs()).unwrap();
        let merges = dendro.merges();
        assert_eq!(merges.len(), 3);
        assert_eq!((merges[0].left, merges[0].right, merges[0].size), (0, 2, 2));
        assert_eq!((merges[1].left, merges[1].right, merges[1].size), (1, 3, 2));
        assert_eq!((merges[2].left, merges[2].right, merges[2].size), (4, 5, 4));
        assert_abs_diff_eq!(merges[0].distance, 0.02f64.sqrt(), epsilon = 1e-12);
        let heights = dendro.heights();
        assert!(heights.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_cut_extremes() {
        let points = data(&[[0.0, 0.0], [1.0, 3.0], [4.0, 1.0], [2.0, 2.0], [9.0, 9.0]]);
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let dendro = AgglomerativeClustering::new(linkage).fit(&points).unwrap();
            assert_eq!(dendro.merges().len(), 4);
            let singletons = dendro.cut(5).unwrap();
            assert_eq!(singletons, (0..5).map(|i| vec![i]).collect::<Vec<_>>());
            assert_eq!(dendro.cut(1).unwrap(), vec![vec![0, 1, 2, 3, 4]]);
            assert!(dendro.cut(0).is_err());
            assert!(dendro.cut(6).is_err());
        }
    }

    #[test]
    fn test_linkages_differ() {
        // A chain that single linkage joins link by link.
        let points = data(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.5, 0.0]]);
        let single = AgglomerativeClustering::new(Linkage::Single).fit(&points).unwrap();
        let complete = AgglomerativeClustering::new(Linkage::Complete).fit(&points).unwrap();
        let average = AgglomerativeClustering::new(Linkage::Average).fit(&points).unwrap();
        assert_abs_diff_eq!(*single.heights().last().unwrap(), 1.5);
        assert_abs_diff_eq!(*complete.heights().last().unwrap(), 4.5);
        let last_avg = *average.heights().last().unwrap();
        assert!(last_avg > 1.5 && last_avg < 4.5);
    }

    #[test]
    fn test_single_point() {
        let dendro = AgglomerativeClustering::default().fit(&data(&[[1.0, 1.0]])).unwrap();
        assert!(dendro.merges().is_empty());
        assert_eq!(dendro.cut(1).unwrap(), vec![vec![0]]);
    }

    #[test]
    fn test_empty_rejected() {
        let empty = Dataset::<f64>::new(vec![]).unwrap();
        assert!(AgglomerativeClustering::default().fit(&empty).is_err());
    }
}

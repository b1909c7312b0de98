use mlsim_core::{Dataset, Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;

/// Stopping rules and impurity measure for tree induction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub criterion: Criterion,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: 3,
            min_samples_split: 2,
            criterion: Criterion::Gini,
        }
    }
}

impl TreeParams {
    pub fn new(max_depth: usize) -> Self {
        TreeParams {
            max_depth,
            ..TreeParams::default()
        }
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn validate(&self) -> MlResult<()> {
        if self.min_samples_split < 2 {
            return Err(MlError::invalid(
                "min_samples_split",
                format!("a split needs at least 2 samples, got {}", self.min_samples_split),
            ));
        }
        Ok(())
    }
}

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub enum Node<T: Float> {
    /// Internal node: `features[feature] <= threshold` goes left.
    Split {
        feature: usize,
        threshold: T,
        gain: T,
        depth: usize,
        samples: usize,
        impurity: T,
        left: Box<Node<T>>,
        right: Box<Node<T>>,
    },
    /// Leaf: predicts the majority class of its samples.
    Leaf {
        prediction: usize,
        depth: usize,
        samples: usize,
        impurity: T,
        /// Sample count per class, ordered like [`DecisionTree::classes`].
        class_counts: Vec<usize>,
    },
}

impl<T: Float> Node<T> {
    pub fn samples(&self) -> usize {
        match self {
            Node::Split { samples, .. } | Node::Leaf { samples, .. } => *samples,
        }
    }

    pub fn impurity(&self) -> T {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Split { depth, .. } | Node::Leaf { depth, .. } => *depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    fn height(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.height().max(right.height()),
        }
    }

    fn leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.leaves() + right.leaves(),
        }
    }
}

/// A split boundary clipped to the region of feature space its node owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct SplitSegment<T: Float> {
    pub feature: usize,
    pub threshold: T,
    pub depth: usize,
    /// Per-feature `(min, max)` of the node's region.
    pub region: Vec<(T, T)>,
}

/// Binary classification tree grown greedily on impurity reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DecisionTree<T: Float> {
    root: Node<T>,
    n_features: usize,
    /// Distinct class ids seen while fitting, ascending.
    classes: Vec<usize>,
    params: TreeParams,
}

struct Builder<'a, T: Float> {
    rows: Vec<&'a [T]>,
    /// Positions into `classes`, not raw class ids.
    labels: Vec<usize>,
    classes: &'a [usize],
    params: TreeParams,
}

struct BestSplit<T> {
    feature: usize,
    threshold: T,
    gain: T,
}

impl<'a, T: Float> Builder<'a, T> {
    fn counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    fn build(&self, indices: &[usize], depth: usize) -> Node<T> {
        let counts = self.counts(indices);
        let impurity: T = self.params.criterion.impurity(&counts);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if depth >= self.params.max_depth || indices.len() < self.params.min_samples_split || pure {
            return self.leaf(counts, depth, impurity);
        }

        let best = match self.best_split(indices, impurity) {
            Some(best) => best,
            None => return self.leaf(counts, depth, impurity),
        };
        log::trace!(
            "tree depth {}: split feature {} at {} (gain {})",
            depth,
            best.feature,
            best.threshold,
            best.gain
        );

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            gain: best.gain,
            depth,
            samples: indices.len(),
            impurity,
            left: Box::new(self.build(&left, depth + 1)),
            right: Box::new(self.build(&right, depth + 1)),
        }
    }

    /// Highest-gain `(feature, midpoint)` pair. Ties keep the first candidate
    /// found scanning features in order and thresholds ascending; a gain that
    /// is not positive yields `None`.
    fn best_split(&self, indices: &[usize], parent: T) -> Option<BestSplit<T>> {
        let n = T::from_usize(indices.len());
        let n_features = self.rows.first().map_or(0, |r| r.len());
        let mut best: Option<BestSplit<T>> = None;

        for feature in 0..n_features {
            let mut values: Vec<T> = indices.iter().map(|&i| self.rows[i][feature]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for w in values.windows(2) {
                let threshold = (w[0] + w[1]) / T::TWO;
                let mut left = vec![0usize; self.classes.len()];
                let mut right = vec![0usize; self.classes.len()];
                for &i in indices {
                    if self.rows[i][feature] <= threshold {
                        left[self.labels[i]] += 1;
                    } else {
                        right[self.labels[i]] += 1;
                    }
                }
                let n_left: usize = left.iter().sum();
                let n_right = indices.len() - n_left;
                if n_left == 0 || n_right == 0 {
                    continue;
                }

                let criterion = self.params.criterion;
                let weighted = T::from_usize(n_left) / n * criterion.impurity::<T>(&left)
                    + T::from_usize(n_right) / n * criterion.impurity::<T>(&right);
                let gain = parent - weighted;
                if gain > T::EPSILON && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn leaf(&self, class_counts: Vec<usize>, depth: usize, impurity: T) -> Node<T> {
        Node::Leaf {
            prediction: self.classes[majority(&class_counts)],
            depth,
            samples: class_counts.iter().sum(),
            impurity,
            class_counts,
        }
    }
}

/// Position of the most frequent class; the lowest position wins ties.
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = class;
        }
    }
    best
}

impl<T: Float> DecisionTree<T> {
    /// Grow a tree on a labeled dataset. Recursion depth is bounded by
    /// `max_depth`, so induction always terminates.
    pub fn fit(data: &Dataset<T>, params: TreeParams) -> MlResult<Self> {
        params.validate()?;
        data.require_non_empty()?;
        let raw = data.class_labels()?;
        let mut classes = raw.clone();
        classes.sort_unstable();
        classes.dedup();
        // Class ids can be sparse; count tables are indexed by position.
        let labels = raw
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let builder = Builder {
            rows: data.iter().map(|p| p.features()).collect(),
            labels,
            classes: &classes,
            params,
        };
        let indices: Vec<usize> = (0..data.len()).collect();
        let root = builder.build(&indices, 0);

        let tree = DecisionTree {
            root,
            n_features: data.dim(),
            classes,
            params,
        };
        log::debug!(
            "decision tree: {} samples, depth {}, {} leaves",
            data.len(),
            tree.depth(),
            tree.leaf_count()
        );
        Ok(tree)
    }

    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Number of split levels; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.root.height()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaves()
    }

    pub fn predict(&self, features: &[T]) -> MlResult<usize> {
        if features.len() != self.n_features {
            return Err(MlError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { prediction, .. } => return Ok(*prediction),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if features[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn predict_all(&self, data: &Dataset<T>) -> MlResult<Vec<usize>> {
        data.iter().map(|p| self.predict(p.features())).collect()
    }

    pub fn accuracy(&self, data: &Dataset<T>) -> MlResult<T> {
        data.require_non_empty()?;
        let truth = data.class_labels()?;
        let predicted = self.predict_all(data)?;
        let correct = truth.iter().zip(&predicted).filter(|(a, b)| a == b).count();
        Ok(T::from_usize(correct) / T::from_usize(truth.len()))
    }

    /// Split boundaries in pre-order, each clipped to the region its node
    /// owns inside `bounds`.
    pub fn partition(&self, bounds: &[(T, T)]) -> MlResult<Vec<SplitSegment<T>>> {
        if bounds.len() != self.n_features {
            return Err(MlError::DimensionMismatch {
                expected: self.n_features,
                got: bounds.len(),
            });
        }
        let mut segments = Vec::new();
        collect_segments(&self.root, bounds.to_vec(), &mut segments);
        Ok(segments)
    }
}

fn collect_segments<T: Float>(node: &Node<T>, region: Vec<(T, T)>, out: &mut Vec<SplitSegment<T>>) {
    if let Node::Split {
        feature,
        threshold,
        depth,
        left,
        right,
        ..
    } = node
    {
        let mut left_region = region.clone();
        left_region[*feature].1 = *threshold;
        let mut right_region = region.clone();
        right_region[*feature].0 = *threshold;
        out.push(SplitSegment {
            feature: *feature,
            threshold: *threshold,
            depth: *depth,
            region,
        });
        collect_segments(left, left_region, out);
        collect_segments(right, right_region, out);
    }
}

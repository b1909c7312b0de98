//! # mlsim
//!
//! Classic machine-learning algorithms sized for interactive teaching
//! simulators: every routine is a pure function of its inputs and
//! hyperparameters, returns plain result structures a renderer can draw,
//! and is deterministic for a given seed.
//!
//! ## Modules
//!
//! - **core**: `Float`, `Point`, `Dataset`, dense `Matrix`, distances, `MlError`
//! - **linalg**: Gauss-Jordan solver with partial pivoting
//! - **linear**: OLS, polynomial, ridge, lasso, least squares, logistic regression, degree sweep
//! - **optim**: Step-wise scalar gradient descent
//! - **neighbors**: K-Nearest Neighbors classifier
//! - **tree**: Decision tree induction (Gini / entropy) and partition geometry
//! - **cluster**: K-Means (step-wise) and hierarchical agglomerative clustering
//! - **metrics**: Confusion matrix, ROC / PR curves, AUC, regression errors
//! - **preprocessing**: Min-max normalization and z-score standardization
//! - **datasets**: Seeded synthetic data generators

/// Numeric trait, datasets, matrices and errors.
pub use mlsim_core as core;

/// Linear system solver.
pub use mlsim_linalg as linalg;

/// Linear and logistic models.
pub use mlsim_linear as linear;

/// Gradient descent.
pub use mlsim_optim as optim;

/// Nearest neighbors.
pub use mlsim_neighbors as neighbors;

/// Decision trees.
pub use mlsim_tree as tree;

/// Clustering algorithms.
pub use mlsim_cluster as cluster;

/// Evaluation metrics.
pub use mlsim_metrics as metrics;

/// Feature scaling.
pub use mlsim_preprocessing as preprocessing;

/// Synthetic datasets.
pub use mlsim_datasets as datasets;

pub use mlsim_core::{Dataset, Float, MlError, MlResult, Point};

//! # pairclust
//!
//! Cluster a table two features at a time, then relate the resulting clusters
//! to each other.
//!
//! For every unordered pair of selected numeric features the [`engine`]
//! clusters the records in that 2-D projection (k-means or DBSCAN). Clusters
//! from different pairs partition the same records, so they can be compared
//! by Jaccard overlap:
//!
//! - [`similarity::rank`]: every cluster against one reference cluster
//! - [`matrix::global_matrix`]: every cluster against every other
//! - [`matrix::feature_pair_matrix`]: per feature pair, an aggregate of how
//!   its clusters overlap one reference cluster
//!
//! [`reorder::reorder`] permutes either kind of matrix so that similar rows
//! sit together, using optimal leaf ordering of an average-linkage dendrogram.
//!
//! ```rust
//! use pairclust::{compute, global_matrix, rank, AlgorithmParams, FeatureTable};
//!
//! let table = FeatureTable::from_columns([
//!     ("x", vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0]),
//!     ("y", vec![0.0, 1.0, 0.0, 10.0, 11.0, 10.0]),
//!     ("z", vec![1.0, 1.0, 9.0, 9.0, 9.0, 9.0]),
//! ])
//! .unwrap();
//!
//! let params = AlgorithmParams::Kmeans { k: 2, max_iterations: 100, seed: Some(1) };
//! let clusters = compute(&table, &["x", "y", "z"], &params).unwrap();
//! assert_eq!(clusters.len(), 3);
//!
//! let m = global_matrix(&clusters);
//! assert_eq!(m.len(), 6);
//!
//! let ranked = rank(&clusters, "x", "y", 0);
//! assert_eq!(ranked.len(), 4);
//! ```
//!
//! Everything here is synchronous and holds no state between calls. With the
//! default `parallel` feature, pairs and matrix rows are computed on the
//! rayon pool; callers serving requests on an async runtime should still run
//! these on a blocking worker.

pub mod cluster;
pub mod config;
pub mod engine;
/// Error types used across `pairclust`.
pub mod error;
pub mod hierarchy;
pub mod matrix;
pub mod partition;
pub mod reorder;
pub mod similarity;
pub mod table;

pub use cluster::{ClusterId, Clustering, Dbscan, Kmeans, Linkage, NOISE};
pub use config::{AlgorithmParams, ClusteringRequest, MatrixRequest, SimilarityRequest};
pub use engine::{compute, compute_request, compute_with};
pub use error::{Error, Result};
pub use hierarchy::Dendrogram;
pub use matrix::{
    feature_pair_matrix, global_matrix, Aggregation, SimilarityMatrix, SimilarityStats,
};
pub use partition::{
    ClusterCollection, ClusterIdentifier, ClusterPartition, ClusteringResult, StoredClusters,
};
pub use reorder::{reorder, ReorderMethod, ReorderResult};
pub use similarity::{jaccard, rank, SimilarityRecord};
pub use table::{FeatureTable, Record};

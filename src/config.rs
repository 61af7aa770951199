//! Request-side configuration.
//!
//! These types mirror what a caller sends: which algorithm with which
//! parameters, which features to cluster, which reference cluster to compare
//! against, and how to aggregate and reorder. All of them deserialize with
//! defaults, so a minimal request is `{}` plus whatever the operation needs.
//!
//! ```rust
//! use pairclust::config::{AlgorithmParams, ClusteringRequest};
//!
//! let req: ClusteringRequest = serde_json::from_str(
//!     r#"{"columns": ["x", "y"], "params": {"algorithm": "dbscan", "eps": 0.3}}"#,
//! ).unwrap();
//! assert_eq!(req.params, AlgorithmParams::Dbscan { eps: 0.3, min_samples: 5 });
//! ```

use crate::cluster::{ClusterId, Clustering, Dbscan, Kmeans};
use crate::error::{Error, Result};
use crate::matrix::{feature_pair_matrix, Aggregation};
use crate::partition::ClusterCollection;
use crate::reorder::{reorder, ReorderMethod, ReorderResult};
use crate::similarity::{rank, SimilarityRecord};
use crate::table::FeatureTable;
use serde::{Deserialize, Serialize};

fn default_k() -> usize {
    3
}

fn default_max_iterations() -> usize {
    1000
}

fn default_eps() -> f64 {
    0.5
}

fn default_min_samples() -> usize {
    5
}

/// Algorithm choice with its parameters, tagged by `algorithm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum AlgorithmParams {
    /// K-means with `k` clusters per pair.
    Kmeans {
        /// Clusters per pair.
        #[serde(default = "default_k")]
        k: usize,
        /// Lloyd iteration cap.
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
        /// Seed for reproducible initialization.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    /// DBSCAN with neighborhood radius `eps`.
    Dbscan {
        /// Neighborhood radius.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Minimum neighborhood size for a core point.
        #[serde(default = "default_min_samples")]
        min_samples: usize,
    },
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        Self::Kmeans {
            k: default_k(),
            max_iterations: default_max_iterations(),
            seed: None,
        }
    }
}

impl AlgorithmParams {
    /// Algorithm name, as stored alongside computed clusters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kmeans { .. } => "kmeans",
            Self::Dbscan { .. } => "dbscan",
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Kmeans {
                k, max_iterations, ..
            } => {
                if k == 0 {
                    return Err(Error::InvalidParameter {
                        name: "k",
                        message: "must be at least 1",
                    });
                }
                if max_iterations == 0 {
                    return Err(Error::InvalidParameter {
                        name: "max_iterations",
                        message: "must be at least 1",
                    });
                }
            }
            Self::Dbscan { eps, min_samples } => {
                // Clustering runs in f32, so eps must survive the narrowing.
                let narrowed = eps as f32;
                if !(eps > 0.0 && eps.is_finite() && narrowed > 0.0 && narrowed.is_finite()) {
                    return Err(Error::InvalidParameter {
                        name: "eps",
                        message: "must be positive and finite in f32 range",
                    });
                }
                if min_samples == 0 {
                    return Err(Error::InvalidParameter {
                        name: "min_samples",
                        message: "must be at least 1",
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and build the configured algorithm.
    pub fn build(&self) -> Result<Algorithm> {
        self.validate()?;
        Ok(match *self {
            Self::Kmeans {
                k,
                max_iterations,
                seed,
            } => {
                let kmeans = Kmeans::new(k).with_max_iter(max_iterations);
                Algorithm::Kmeans(match seed {
                    Some(s) => kmeans.with_seed(s),
                    None => kmeans,
                })
            }
            Self::Dbscan { eps, min_samples } => {
                Algorithm::Dbscan(Dbscan::new(eps as f32, min_samples))
            }
        })
    }
}

/// A configured clustering algorithm.
#[derive(Debug, Clone)]
pub enum Algorithm {
    /// K-means.
    Kmeans(Kmeans),
    /// DBSCAN.
    Dbscan(Dbscan),
}

impl Clustering for Algorithm {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<ClusterId>> {
        match self {
            Self::Kmeans(k) => k.fit_predict(data),
            Self::Dbscan(d) => d.fit_predict(data),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Kmeans(k) => k.name(),
            Self::Dbscan(d) => d.name(),
        }
    }

    fn is_scale_invariant(&self) -> bool {
        match self {
            Self::Kmeans(k) => k.is_scale_invariant(),
            Self::Dbscan(d) => d.is_scale_invariant(),
        }
    }
}

/// Request to cluster every pair of the selected columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteringRequest {
    /// Columns to pair up; empty means every numeric column.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Algorithm and parameters.
    #[serde(default)]
    pub params: AlgorithmParams,
}

impl ClusteringRequest {
    /// The columns to cluster against `table`.
    pub fn resolve_columns(&self, table: &FeatureTable) -> Vec<String> {
        if self.columns.is_empty() {
            table.numeric_columns().to_vec()
        } else {
            self.columns.clone()
        }
    }
}

/// A reference cluster: one label within one feature pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityRequest {
    /// First feature of the reference pair.
    #[serde(alias = "selected_feature1")]
    pub feature1: String,
    /// Second feature of the reference pair.
    #[serde(alias = "selected_feature2")]
    pub feature2: String,
    /// Reference cluster label.
    #[serde(alias = "selected_cluster_id")]
    pub cluster_id: ClusterId,
}

impl SimilarityRequest {
    /// Rank the clusters of `collection` against this reference.
    pub fn rank(&self, collection: &ClusterCollection) -> Vec<SimilarityRecord> {
        rank(collection, &self.feature1, &self.feature2, self.cluster_id)
    }
}

/// Request for a feature-pair similarity matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRequest {
    /// Reference cluster.
    #[serde(flatten)]
    pub reference: SimilarityRequest,
    /// Matrix axis; empty means the features of the clustered collection.
    #[serde(default)]
    pub features: Vec<String>,
    /// How per-cluster similarities collapse into one cell.
    #[serde(default)]
    pub aggregation: Aggregation,
    /// How to reorder the result.
    #[serde(default)]
    pub reorder: ReorderMethod,
}

impl MatrixRequest {
    /// Build the aggregated feature-pair matrix and reorder it.
    pub fn build(&self, collection: &ClusterCollection) -> Result<ReorderResult<String>> {
        let features = if self.features.is_empty() {
            collection.features()
        } else {
            self.features.clone()
        };
        let matrix = feature_pair_matrix(
            collection,
            &self.reference.feature1,
            &self.reference.feature2,
            self.reference.cluster_id,
            &features,
            self.aggregation,
        )?;
        Ok(reorder(&matrix, self.reorder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req: ClusteringRequest = serde_json::from_str("{}").unwrap();
        assert!(req.columns.is_empty());
        assert_eq!(
            req.params,
            AlgorithmParams::Kmeans {
                k: 3,
                max_iterations: 1000,
                seed: None
            }
        );
    }

    #[test]
    fn test_validate_ranges() {
        let bad_k = AlgorithmParams::Kmeans {
            k: 0,
            max_iterations: 10,
            seed: None,
        };
        assert!(bad_k.validate().is_err());
        assert!(bad_k.build().is_err());

        let bad_eps = AlgorithmParams::Dbscan {
            eps: -0.1,
            min_samples: 3,
        };
        assert!(bad_eps.validate().is_err());

        let bad_min = AlgorithmParams::Dbscan {
            eps: 0.1,
            min_samples: 0,
        };
        assert!(bad_min.validate().is_err());

        for eps in [1e-50, 1e40] {
            let params = AlgorithmParams::Dbscan {
                eps,
                min_samples: 1,
            };
            assert!(matches!(
                params.validate(),
                Err(Error::InvalidParameter { name: "eps", .. })
            ));
        }

        assert!(AlgorithmParams::default().validate().is_ok());
    }

    #[test]
    fn test_build_names() {
        let algo = AlgorithmParams::Dbscan {
            eps: 1.0,
            min_samples: 2,
        }
        .build()
        .unwrap();
        assert_eq!(algo.name(), "dbscan");
        assert_eq!(AlgorithmParams::default().build().unwrap().name(), "kmeans");
    }

    #[test]
    fn test_resolve_columns_defaults_to_numeric() {
        let table = FeatureTable::from_columns([("a", vec![1.0]), ("b", vec![2.0])]).unwrap();
        let all = ClusteringRequest::default();
        assert_eq!(all.resolve_columns(&table), vec!["a".to_string(), "b".into()]);

        let some = ClusteringRequest {
            columns: vec!["b".into()],
            ..Default::default()
        };
        assert_eq!(some.resolve_columns(&table), vec!["b".to_string()]);
    }

    #[test]
    fn test_matrix_request_aliases_and_fallbacks() {
        let req: MatrixRequest = serde_json::from_str(
            r#"{
                "selected_feature1": "x",
                "selected_feature2": "y",
                "selected_cluster_id": 1,
                "aggregation": "median",
                "reorder": "sideways"
            }"#,
        )
        .unwrap();

        assert_eq!(req.reference.feature1, "x");
        assert_eq!(req.reference.cluster_id, 1);
        assert_eq!(req.aggregation, Aggregation::Median);
        assert_eq!(req.reorder, ReorderMethod::None);
        assert!(req.features.is_empty());
    }

    fn collection() -> ClusterCollection {
        use crate::partition::ClusterPartition;
        let mut c = ClusterCollection::new();
        c.insert("x", "y", ClusterPartition::from_labels(&[0, 0, 1, 1]));
        c.insert("x", "z", ClusterPartition::from_labels(&[0, 1, 1, 1]));
        c
    }

    #[test]
    fn test_matrix_request_defaults_to_collection_features() {
        let req = MatrixRequest {
            reference: SimilarityRequest {
                feature1: "y".into(),
                feature2: "x".into(),
                cluster_id: 0,
            },
            features: Vec::new(),
            aggregation: Aggregation::Max,
            reorder: ReorderMethod::None,
        };
        let result = req.build(&collection()).unwrap();

        assert_eq!(result.matrix.labels(), ["x", "y", "z"]);
        assert_eq!(result.order, vec![0, 1, 2]);
        // {0,1} against {0} and {1,2,3}
        assert_eq!(result.matrix.get(0, 2), Some(0.5));
        // (y, z) was never clustered
        assert_eq!(result.matrix.get(1, 2), Some(0.0));
    }

    #[test]
    fn test_matrix_request_missing_reference() {
        let req = MatrixRequest {
            reference: SimilarityRequest {
                feature1: "y".into(),
                feature2: "z".into(),
                cluster_id: 0,
            },
            features: vec!["x".into(), "y".into()],
            aggregation: Aggregation::Max,
            reorder: ReorderMethod::Optimal,
        };
        assert!(matches!(
            req.build(&collection()),
            Err(Error::ReferenceNotFound { .. })
        ));
    }

    #[test]
    fn test_similarity_request_rank() {
        let req = SimilarityRequest {
            feature1: "x".into(),
            feature2: "y".into(),
            cluster_id: 1,
        };
        let ranked = req.rank(&collection());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].cluster_id, 1);
        assert!((ranked[0].similarity - 2.0 / 3.0).abs() < 1e-12);
    }
}

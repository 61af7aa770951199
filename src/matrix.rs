//! Similarity matrices over clusters and over feature pairs.
//!
//! Two kinds of square matrix are built from a [`ClusterCollection`]:
//!
//! | Builder | Axis | Cell (i, j) |
//! |---------|------|-------------|
//! | [`global_matrix`] | every cluster of every pair | Jaccard of the two clusters |
//! | [`feature_pair_matrix`] | caller-chosen features | aggregated Jaccard of a reference cluster against every cluster of pair (i, j) |
//!
//! Both have 1.0 on the diagonal and carry min/max statistics over the
//! off-diagonal cells only. The two kinds report different values when there
//! are no off-diagonal cells:
//!
//! | Matrix | min | max |
//! |--------|-----|-----|
//! | global | 1.0 | 1.0 |
//! | feature pair | 0.0 | 1.0 |

use crate::cluster::ClusterId;
use crate::error::{Error, Result};
use crate::partition::{ClusterCollection, ClusterIdentifier};
use crate::similarity::jaccard_sorted;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Type usable as the index axis of a [`SimilarityMatrix`].
pub trait AxisLabel: Clone {
    /// Field name the axis is serialized under.
    const AXIS: &'static str;
}

impl AxisLabel for ClusterIdentifier {
    const AXIS: &'static str = "cluster_identifiers";
}

impl AxisLabel for String {
    const AXIS: &'static str = "features";
}

/// Summary of the off-diagonal cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityStats {
    /// Smallest off-diagonal similarity.
    pub min_similarity: f64,
    /// Largest off-diagonal similarity.
    pub max_similarity: f64,
    /// Matrix dimension.
    pub size: usize,
}

impl SimilarityStats {
    /// Stats over the off-diagonal cells of `values`, or `(empty_min,
    /// empty_max)` when there are none.
    fn off_diagonal(values: &[Vec<f64>], empty_min: f64, empty_max: f64) -> Self {
        let mut range: Option<(f64, f64)> = None;
        for (i, row) in values.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if i == j {
                    continue;
                }
                range = Some(match range {
                    None => (v, v),
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                });
            }
        }
        let (min_similarity, max_similarity) = range.unwrap_or((empty_min, empty_max));
        Self {
            min_similarity,
            max_similarity,
            size: values.len(),
        }
    }
}

/// Square similarity matrix with labelled axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix<L> {
    labels: Vec<L>,
    values: Vec<Vec<f64>>,
    stats: SimilarityStats,
}

impl<L: AxisLabel> SimilarityMatrix<L> {
    /// Assemble a matrix; `values` must be `labels.len()` square.
    pub fn new(labels: Vec<L>, values: Vec<Vec<f64>>, stats: SimilarityStats) -> Result<Self> {
        let n = labels.len();
        if values.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|r| r.len() != n) {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: row.len(),
            });
        }
        Ok(Self {
            labels,
            values,
            stats,
        })
    }

    /// Axis labels, shared by rows and columns.
    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Row-major cell values.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Cell (i, j).
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied()
    }

    /// Off-diagonal summary.
    pub fn stats(&self) -> SimilarityStats {
        self.stats
    }

    /// Matrix dimension.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True for a 0×0 matrix.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Same matrix with rows and columns both taken in `order`:
    /// `out[a][b] == self[order[a]][order[b]]`.
    ///
    /// `order` must be a permutation of `0..len()`.
    pub fn permuted(&self, order: &[usize]) -> Result<Self> {
        if !is_permutation(order, self.len()) {
            return Err(Error::Other(format!(
                "order of length {} is not a permutation of 0..{}",
                order.len(),
                self.len()
            )));
        }
        Ok(Self {
            labels: order.iter().map(|&i| self.labels[i].clone()).collect(),
            values: order
                .iter()
                .map(|&i| order.iter().map(|&j| self.values[i][j]).collect())
                .collect(),
            stats: self.stats,
        })
    }
}

pub(crate) fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    order
        .iter()
        .all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
}

impl<L: AxisLabel + Serialize> Serialize for SimilarityMatrix<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SimilarityMatrix", 3)?;
        s.serialize_field(L::AXIS, &self.labels)?;
        s.serialize_field("similarities", &self.values)?;
        s.serialize_field("stats", &self.stats)?;
        s.end()
    }
}

/// Fill a symmetric matrix with 1.0 on the diagonal from an upper-triangle
/// cell function.
fn symmetric<F>(n: usize, cell: F) -> Vec<Vec<f64>>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| ((i + 1)..n).map(|j| cell(i, j)).collect())
        .collect();

    #[cfg(not(feature = "parallel"))]
    let upper: Vec<Vec<f64>> = (0..n)
        .map(|i| ((i + 1)..n).map(|j| cell(i, j)).collect())
        .collect();

    let mut values = vec![vec![1.0; n]; n];
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, v) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            values[i][j] = v;
            values[j][i] = v;
        }
    }
    values
}

/// Jaccard similarity between every pair of clusters in the collection.
///
/// Clusters appear in collection order: pairs in insertion order, labels
/// ascending within a pair.
pub fn global_matrix(collection: &ClusterCollection) -> SimilarityMatrix<ClusterIdentifier> {
    let (labels, points): (Vec<ClusterIdentifier>, Vec<&[usize]>) = collection.clusters().unzip();
    let n = labels.len();

    let values = symmetric(n, |i, j| jaccard_sorted(points[i], points[j]));
    let stats = SimilarityStats::off_diagonal(&values, 1.0, 1.0);
    debug!(size = n, pairs = collection.len(), "built global cluster similarity matrix");

    SimilarityMatrix {
        labels,
        values,
        stats,
    }
}

/// Rule collapsing a list of similarities into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Aggregation {
    /// Largest value.
    #[default]
    Max,
    /// Arithmetic mean.
    Avg,
    /// Smallest value.
    Min,
    /// Middle value; mean of the two middle values for even lengths.
    Median,
}

impl Aggregation {
    /// Parse a name, falling back to [`Aggregation::Max`] for anything
    /// unrecognized.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "avg" | "average" | "mean" => Self::Avg,
            "min" => Self::Min,
            "median" => Self::Median,
            _ => Self::Max,
        }
    }

    /// Collapse `values`. An empty list collapses to 0.0.
    pub fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
        }
    }
}

impl From<String> for Aggregation {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Median => "median",
        };
        f.write_str(name)
    }
}

/// Feature × feature matrix of how strongly each feature pair's clusters
/// overlap a reference cluster.
///
/// Cell (A, B), A ≠ B, is `aggregation` applied to the Jaccard similarity of
/// the reference against every cluster of pair (A, B); 0.0 when (A, B) was
/// never clustered. Repeated names in `features` are dropped, first
/// occurrence kept. Fails with [`Error::ReferenceNotFound`] when the
/// reference is missing under both orderings of its pair.
pub fn feature_pair_matrix<S: AsRef<str>>(
    collection: &ClusterCollection,
    feature1: &str,
    feature2: &str,
    cluster_id: ClusterId,
    features: &[S],
    aggregation: Aggregation,
) -> Result<SimilarityMatrix<String>> {
    let reference =
        collection
            .cluster(feature1, feature2, cluster_id)
            .ok_or_else(|| Error::ReferenceNotFound {
                feature1: feature1.to_string(),
                feature2: feature2.to_string(),
                cluster_id,
                available: collection.pair_names(),
            })?;

    let mut labels: Vec<String> = Vec::with_capacity(features.len());
    for f in features {
        if !labels.iter().any(|l| l == f.as_ref()) {
            labels.push(f.as_ref().to_string());
        }
    }
    let values = symmetric(labels.len(), |i, j| {
        match collection.get(&labels[i], &labels[j]) {
            None => 0.0,
            Some(partition) => {
                let sims: Vec<f64> = partition
                    .iter()
                    .map(|(_, points)| jaccard_sorted(reference, points))
                    .collect();
                aggregation.apply(&sims)
            }
        }
    });
    let stats = SimilarityStats::off_diagonal(&values, 0.0, 1.0);
    debug!(
        size = labels.len(),
        %aggregation,
        feature1,
        feature2,
        cluster_id,
        "built feature pair similarity matrix"
    );

    Ok(SimilarityMatrix {
        labels,
        values,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::ClusterPartition;

    fn collection() -> ClusterCollection {
        let mut c = ClusterCollection::new();
        c.insert("x", "y", ClusterPartition::from_labels(&[0, 0, 0, 1, 1, 1]));
        c.insert("x", "z", ClusterPartition::from_labels(&[0, 0, 1, 1, 2, 2]));
        c
    }

    #[test]
    fn test_aggregation_rules() {
        let sims = [0.1, 0.4, 0.2];
        assert_eq!(Aggregation::Max.apply(&sims), 0.4);
        assert_eq!(Aggregation::Min.apply(&sims), 0.1);
        assert_eq!(Aggregation::Median.apply(&sims), 0.2);
        assert!((Aggregation::Avg.apply(&sims) - 0.7 / 3.0).abs() < 1e-12);
        assert!((Aggregation::Median.apply(&[0.1, 0.4, 0.2, 0.3]) - 0.25).abs() < 1e-12);
        assert_eq!(Aggregation::Median.apply(&[]), 0.0);
    }

    #[test]
    fn test_aggregation_parse_falls_back_to_max() {
        assert_eq!(Aggregation::parse("median"), Aggregation::Median);
        assert_eq!(Aggregation::parse(" AVG "), Aggregation::Avg);
        assert_eq!(Aggregation::parse("geometric"), Aggregation::Max);
        let parsed: Aggregation = serde_json::from_str("\"nonsense\"").unwrap();
        assert_eq!(parsed, Aggregation::Max);
    }

    #[test]
    fn test_global_matrix_symmetric_unit_diagonal() {
        let m = global_matrix(&collection());

        assert_eq!(m.len(), 5);
        for i in 0..m.len() {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..m.len() {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        // (x,y,0) = {0,1,2} vs (x,z,1) = {2,3}
        assert!((m.get(0, 3).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(m.stats().min_similarity, 0.0);
        assert!((m.stats().max_similarity - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_global_matrix_small_sentinels() {
        let empty = global_matrix(&ClusterCollection::new());
        assert!(empty.is_empty());
        assert_eq!(empty.stats().min_similarity, 1.0);
        assert_eq!(empty.stats().max_similarity, 1.0);

        let mut one = ClusterCollection::new();
        one.insert("a", "b", ClusterPartition::from_labels(&[0, 0]));
        let m = global_matrix(&one);
        assert_eq!(m.stats().size, 1);
        assert_eq!(m.stats().max_similarity, 1.0);
    }

    #[test]
    fn test_feature_pair_matrix_cells() {
        let c = collection();
        let m = feature_pair_matrix(&c, "y", "x", 0, &["x", "y", "z"], Aggregation::Max).unwrap();

        assert_eq!(m.labels(), &["x".to_string(), "y".into(), "z".into()]);
        assert_eq!(m.get(0, 1), Some(1.0));
        // {0,1,2} vs {0,1}, {2,3}, {4,5}
        assert!((m.get(0, 2).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        // (y, z) never clustered
        assert_eq!(m.get(1, 2), Some(0.0));
        assert_eq!(m.get(2, 1), Some(0.0));
        assert_eq!(m.stats().min_similarity, 0.0);
        assert_eq!(m.stats().max_similarity, 1.0);
    }

    #[test]
    fn test_feature_pair_matrix_missing_reference() {
        let err = feature_pair_matrix(&collection(), "y", "z", 0, &["x"], Aggregation::Max)
            .unwrap_err();
        match err {
            Error::ReferenceNotFound { available, .. } => assert_eq!(available.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_feature_pair_matrix_drops_repeated_features() {
        let c = collection();
        let m = feature_pair_matrix(&c, "x", "y", 0, &["x", "y", "x", "y"], Aggregation::Max)
            .unwrap();

        assert_eq!(m.labels(), ["x", "y"]);
        assert_eq!(m.get(0, 1), Some(1.0));
        assert_eq!(m.stats().size, 2);
    }

    #[test]
    fn test_feature_pair_matrix_single_feature_sentinels() {
        let m = feature_pair_matrix(&collection(), "x", "y", 1, &["x"], Aggregation::Min).unwrap();
        assert_eq!(m.values(), &[vec![1.0]]);
        assert_eq!(m.stats().min_similarity, 0.0);
        assert_eq!(m.stats().max_similarity, 1.0);
    }

    #[test]
    fn test_permuted_moves_both_axes() {
        let m = global_matrix(&collection());
        let order = vec![4, 2, 0, 1, 3];
        let p = m.permuted(&order).unwrap();
        for a in 0..5 {
            assert_eq!(p.labels()[a], m.labels()[order[a]]);
            for b in 0..5 {
                assert_eq!(p.get(a, b), m.get(order[a], order[b]));
            }
        }
        assert!(m.permuted(&[0, 0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_serialized_axis_name() {
        let m = feature_pair_matrix(&collection(), "x", "y", 0, &["x", "z"], Aggregation::Avg)
            .unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["features"], serde_json::json!(["x", "z"]));
        assert_eq!(json["stats"]["size"], 2);

        let g = serde_json::to_value(global_matrix(&collection())).unwrap();
        assert_eq!(g["cluster_identifiers"][0]["feature1"], "x");
    }
}

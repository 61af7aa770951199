//! Set-overlap similarity between clusters.
//!
//! Clusters from different feature pairs partition the same records, so two
//! clusters can be compared by how many records they share:
//!
//! ```text
//! J(A, B) = |A ∩ B| / |A ∪ B|
//! ```
//!
//! `J` is symmetric, lies in [0, 1], and is 1 exactly when both sets hold the
//! same records. Two empty sets score 0 rather than dividing by zero.

use crate::cluster::ClusterId;
use crate::partition::ClusterCollection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Jaccard similarity of two index sets. Order and duplicates are ignored.
pub fn jaccard(a: &[usize], b: &[usize]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    jaccard_sorted(&a, &b)
}

/// Jaccard similarity of two strictly increasing index lists.
///
/// Partitions keep their indices sorted and unique, so the builders call this
/// directly and skip the copy.
pub(crate) fn jaccard_sorted(a: &[usize], b: &[usize]) -> f64 {
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Similarity of one cluster to a fixed reference cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRecord {
    /// First feature of the candidate's pair.
    pub feature1: String,
    /// Second feature of the candidate's pair.
    pub feature2: String,
    /// Candidate cluster label.
    pub cluster_id: ClusterId,
    /// Jaccard similarity to the reference, in [0, 1].
    pub similarity: f64,
}

/// Rank every cluster of every other feature pair by similarity to a
/// reference cluster, most similar first.
///
/// The reference is looked up under both orderings of its pair. Clusters of
/// the reference's own pair are skipped. A missing pair or cluster id yields
/// an empty ranking. Ties keep collection order.
pub fn rank(
    collection: &ClusterCollection,
    feature1: &str,
    feature2: &str,
    cluster_id: ClusterId,
) -> Vec<SimilarityRecord> {
    let Some(reference) = collection.cluster(feature1, feature2, cluster_id) else {
        debug!(feature1, feature2, cluster_id, "reference cluster not found, nothing to rank");
        return Vec::new();
    };

    let mut records: Vec<SimilarityRecord> = collection
        .iter()
        .filter(|(a, b, _)| !is_same_pair((*a, *b), (feature1, feature2)))
        .flat_map(|(a, b, partition)| {
            partition.iter().map(move |(id, points)| SimilarityRecord {
                feature1: a.to_string(),
                feature2: b.to_string(),
                cluster_id: id,
                similarity: jaccard_sorted(reference, points),
            })
        })
        .collect();

    records.sort_by(|x, y| y.similarity.total_cmp(&x.similarity));
    records
}

/// Whether two feature pairs name the same unordered pair.
pub(crate) fn is_same_pair(x: (&str, &str), y: (&str, &str)) -> bool {
    (x.0 == y.0 && x.1 == y.1) || (x.0 == y.1 && x.1 == y.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::ClusterPartition;

    #[test]
    fn test_jaccard_basic() {
        assert!((jaccard(&[0, 1, 2], &[2, 3, 4]) - 0.2).abs() < 1e-12);
        assert_eq!(jaccard(&[0, 1, 2], &[2, 1, 0]), 1.0);
        assert_eq!(jaccard(&[0, 1], &[2, 3]), 0.0);
    }

    #[test]
    fn test_jaccard_empty_sets() {
        assert_eq!(jaccard(&[], &[]), 0.0);
        assert_eq!(jaccard(&[1], &[]), 0.0);
    }

    #[test]
    fn test_jaccard_ignores_duplicates() {
        assert_eq!(jaccard(&[1, 1, 2], &[2, 1]), 1.0);
        assert!((jaccard(&[5, 5, 5], &[5, 6]) - 0.5).abs() < 1e-12);
    }

    fn collection() -> ClusterCollection {
        let mut c = ClusterCollection::new();
        c.insert("x", "y", ClusterPartition::from_labels(&[0, 0, 0, 1, 1, 1]));
        c.insert("x", "z", ClusterPartition::from_labels(&[0, 0, 1, 1, 1, 1]));
        c.insert("y", "z", ClusterPartition::from_labels(&[0, 1, 0, 1, 0, 1]));
        c
    }

    #[test]
    fn test_rank_excludes_reference_pair_and_sorts() {
        let ranked = rank(&collection(), "x", "y", 0);

        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| !(r.feature1 == "x" && r.feature2 == "y")));
        assert!(ranked.windows(2).all(|w| w[0].similarity >= w[1].similarity));

        // {0,1,2} vs {0,1}
        assert_eq!(ranked[0].feature2, "z");
        assert_eq!(ranked[0].cluster_id, 0);
        assert!((ranked[0].similarity - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_is_ordering_agnostic() {
        let c = collection();
        assert_eq!(rank(&c, "x", "z", 1), rank(&c, "z", "x", 1));
    }

    #[test]
    fn test_rank_missing_reference_is_empty() {
        let c = collection();
        assert!(rank(&c, "x", "w", 0).is_empty());
        assert!(rank(&c, "x", "y", 7).is_empty());
        assert!(rank(&ClusterCollection::new(), "x", "y", 0).is_empty());
    }
}

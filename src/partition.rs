//! Cluster partitions and the per-feature-pair collection that holds them.
//!
//! A [`ClusterPartition`] maps a cluster label to the sorted record indices
//! carrying that label. A [`ClusterCollection`] holds one partition per
//! unordered feature pair, stored under a canonical ordering `(feature1,
//! feature2)`. Lookups accept either ordering.
//!
//! The storage shape is the nested map
//! `feature1 -> feature2 -> {cluster_id -> [indices]}`; serialization keeps
//! insertion order so a round trip through storage preserves pair order.

use crate::cluster::ClusterId;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Record indices grouped by cluster label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<ClusterId, Vec<usize>>")]
pub struct ClusterPartition {
    clusters: BTreeMap<ClusterId, Vec<usize>>,
}

impl Serialize for ClusterPartition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.clusters.serialize(serializer)
    }
}

impl From<BTreeMap<ClusterId, Vec<usize>>> for ClusterPartition {
    fn from(mut clusters: BTreeMap<ClusterId, Vec<usize>>) -> Self {
        for indices in clusters.values_mut() {
            indices.sort_unstable();
            indices.dedup();
        }
        Self { clusters }
    }
}

impl ClusterPartition {
    /// Group record indices by label. `labels[i]` is the label of record `i`.
    pub fn from_labels(labels: &[ClusterId]) -> Self {
        let mut clusters: BTreeMap<ClusterId, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            clusters.entry(label).or_default().push(idx);
        }
        Self { clusters }
    }

    /// Indices of one cluster.
    pub fn get(&self, cluster_id: ClusterId) -> Option<&[usize]> {
        self.clusters.get(&cluster_id).map(Vec::as_slice)
    }

    /// Clusters in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &[usize])> {
        self.clusters.iter().map(|(&id, v)| (id, v.as_slice()))
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of indices across all clusters.
    pub fn n_records(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    /// True when every index in `0..n` appears in exactly one cluster and
    /// nothing else does.
    pub fn covers(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for indices in self.clusters.values() {
            for &idx in indices {
                if idx >= n || seen[idx] {
                    return false;
                }
                seen[idx] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}

/// One cluster named across the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterIdentifier {
    /// First feature of the pair.
    pub feature1: String,
    /// Second feature of the pair.
    pub feature2: String,
    /// Cluster label within the pair.
    pub cluster_id: ClusterId,
}

/// Partition of one feature pair, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// First feature of the pair.
    pub feature1: String,
    /// Second feature of the pair.
    pub feature2: String,
    /// Label -> record indices.
    pub clusters: ClusterPartition,
}

#[derive(Debug, Clone, PartialEq)]
struct PairEntry {
    feature1: String,
    feature2: String,
    partition: ClusterPartition,
}

impl PairEntry {
    fn is(&self, a: &str, b: &str) -> bool {
        (self.feature1 == a && self.feature2 == b) || (self.feature1 == b && self.feature2 == a)
    }
}

/// Partitions keyed by unordered feature pair, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterCollection {
    pairs: Vec<PairEntry>,
}

impl ClusterCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the partition for `(feature1, feature2)`.
    ///
    /// If the pair is already present under either ordering its partition is
    /// replaced and the stored ordering kept.
    pub fn insert(
        &mut self,
        feature1: impl Into<String>,
        feature2: impl Into<String>,
        partition: ClusterPartition,
    ) {
        let (feature1, feature2) = (feature1.into(), feature2.into());
        match self.pairs.iter_mut().find(|e| e.is(&feature1, &feature2)) {
            Some(entry) => entry.partition = partition,
            None => self.pairs.push(PairEntry {
                feature1,
                feature2,
                partition,
            }),
        }
    }

    /// Partition of a pair, trying both orderings.
    pub fn get(&self, feature1: &str, feature2: &str) -> Option<&ClusterPartition> {
        self.pairs
            .iter()
            .find(|e| e.is(feature1, feature2))
            .map(|e| &e.partition)
    }

    /// Indices of one cluster of a pair, trying both orderings.
    pub fn cluster(&self, feature1: &str, feature2: &str, cluster_id: ClusterId) -> Option<&[usize]> {
        self.get(feature1, feature2)?.get(cluster_id)
    }

    /// Whether the pair is stored under either ordering.
    pub fn contains_pair(&self, feature1: &str, feature2: &str) -> bool {
        self.get(feature1, feature2).is_some()
    }

    /// Stored pairs with their partitions, in canonical ordering.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ClusterPartition)> {
        self.pairs
            .iter()
            .map(|e| (e.feature1.as_str(), e.feature2.as_str(), &e.partition))
    }

    /// Stored pairs, in canonical ordering.
    pub fn pair_names(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|e| (e.feature1.clone(), e.feature2.clone()))
            .collect()
    }

    /// Every feature named by a stored pair, in order of first appearance.
    pub fn features(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for e in &self.pairs {
            for f in [&e.feature1, &e.feature2] {
                if !out.contains(f) {
                    out.push(f.clone());
                }
            }
        }
        out
    }

    /// Every cluster in iteration order, with its indices.
    pub fn clusters(&self) -> impl Iterator<Item = (ClusterIdentifier, &[usize])> {
        self.pairs.iter().flat_map(|e| {
            e.partition.iter().map(move |(id, indices)| {
                (
                    ClusterIdentifier {
                        feature1: e.feature1.clone(),
                        feature2: e.feature2.clone(),
                        cluster_id: id,
                    },
                    indices,
                )
            })
        })
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Flat response shape: one entry per pair.
    pub fn to_results(&self) -> Vec<ClusteringResult> {
        self.pairs
            .iter()
            .map(|e| ClusteringResult {
                feature1: e.feature1.clone(),
                feature2: e.feature2.clone(),
                clusters: e.partition.clone(),
            })
            .collect()
    }
}

/// Serializes as `feature1 -> feature2 -> partition`, grouping by first
/// feature in order of first appearance.
impl Serialize for ClusterCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut groups: Vec<(&str, Vec<&PairEntry>)> = Vec::new();
        for entry in &self.pairs {
            match groups.iter_mut().find(|(f1, _)| *f1 == entry.feature1.as_str()) {
                Some((_, members)) => members.push(entry),
                None => groups.push((entry.feature1.as_str(), vec![entry])),
            }
        }

        let mut outer = serializer.serialize_map(Some(groups.len()))?;
        for (feature1, members) in groups {
            outer.serialize_entry(feature1, &Inner(members))?;
        }
        outer.end()
    }
}

struct Inner<'a>(Vec<&'a PairEntry>);

impl Serialize for Inner<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.feature2, &entry.partition)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClusterCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OuterVisitor)
    }
}

/// Ordered second-level map.
struct OrderedPartitions(Vec<(String, ClusterPartition)>);

impl<'de> Deserialize<'de> for OrderedPartitions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InnerVisitor;

        impl<'de> Visitor<'de> for InnerVisitor {
            type Value = OrderedPartitions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to cluster partition")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out: Vec<(String, ClusterPartition)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((feature2, partition)) = map.next_entry()? {
                    out.push((feature2, partition));
                }
                Ok(OrderedPartitions(out))
            }
        }

        deserializer.deserialize_map(InnerVisitor)
    }
}

struct OuterVisitor;

impl<'de> Visitor<'de> for OuterVisitor {
    type Value = ClusterCollection;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a nested map feature1 -> feature2 -> cluster partition")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut collection = ClusterCollection::new();
        while let Some((feature1, inner)) = map.next_entry::<String, OrderedPartitions>()? {
            for (feature2, partition) in inner.0 {
                collection.insert(feature1.clone(), feature2, partition);
            }
        }
        Ok(collection)
    }
}

/// A collection tagged with the algorithm that produced it, for the
/// external cluster store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredClusters {
    /// Algorithm name, e.g. `"kmeans"` or `"dbscan"`.
    pub algorithm: String,
    /// The partitions.
    pub clusters: ClusterCollection,
}

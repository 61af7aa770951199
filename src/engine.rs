//! Pairwise clustering engine.
//!
//! For features `f_0 .. f_{m-1}` (duplicates dropped, first occurrence kept),
//! every pair `(f_i, f_j)` with `i < j` is projected to 2-D points and
//! clustered independently. Each pair's labels become a [`ClusterPartition`]
//! stored under `(f_i, f_j)`.
//!
//! Points are clustered as `f32`. Pairs with coordinates beyond `1e15` are
//! divided by their largest magnitude first when the algorithm is
//! scale-invariant (k-means), and fail otherwise.
//!
//! A pair that fails (non-finite values, too few records for `k`, an
//! algorithm error) is logged and left out; the remaining pairs are still
//! returned. If every pair fails the result is an empty collection.
//! Only structural problems fail the whole call: unknown columns and
//! invalid parameters.

use crate::cluster::Clustering;
use crate::config::{AlgorithmParams, ClusteringRequest};
use crate::error::{Error, Result};
use crate::partition::{ClusterCollection, ClusterPartition, StoredClusters};
use crate::table::{fill_missing, FeatureTable};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Largest coordinate clustered as-is. Squared `f32` distances inside this
/// bound, and their sums over many points, stay finite.
const MAX_MAGNITUDE: f64 = 1e15;

/// Cluster every feature pair with the algorithm described by `params`.
pub fn compute<S: AsRef<str>>(
    table: &FeatureTable,
    features: &[S],
    params: &AlgorithmParams,
) -> Result<ClusterCollection> {
    let algorithm = params.build()?;
    compute_with(table, features, &algorithm)
}

/// Cluster every feature pair with an already-configured algorithm.
pub fn compute_with<S, C>(table: &FeatureTable, features: &[S], algorithm: &C) -> Result<ClusterCollection>
where
    S: AsRef<str>,
    C: Clustering + Sync,
{
    let mut names: Vec<&str> = Vec::with_capacity(features.len());
    for f in features {
        if !names.contains(&f.as_ref()) {
            names.push(f.as_ref());
        }
    }

    let columns: Vec<Vec<f64>> = table
        .select(&names)?
        .into_iter()
        .map(|col| {
            let mut col = col.to_vec();
            fill_missing(&mut col);
            col
        })
        .collect();

    let pairs: Vec<(usize, usize)> = (0..names.len())
        .flat_map(|i| ((i + 1)..names.len()).map(move |j| (i, j)))
        .collect();

    let run = |&(i, j): &(usize, usize)| {
        let outcome = cluster_pair(
            algorithm,
            (names[i], columns[i].as_slice()),
            (names[j], columns[j].as_slice()),
        );
        (i, j, outcome)
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<_> = pairs.par_iter().map(run).collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<_> = pairs.iter().map(run).collect();

    let mut collection = ClusterCollection::new();
    for (i, j, outcome) in outcomes {
        match outcome {
            Ok(partition) => {
                debug!(
                    feature1 = names[i],
                    feature2 = names[j],
                    clusters = partition.len(),
                    "clustered feature pair"
                );
                collection.insert(names[i], names[j], partition);
            }
            Err(e) => warn!(feature1 = names[i], feature2 = names[j], error = %e, "skipping feature pair"),
        }
    }

    info!(
        algorithm = algorithm.name(),
        features = names.len(),
        attempted = pairs.len(),
        succeeded = collection.len(),
        "pairwise clustering finished"
    );
    Ok(collection)
}

/// Cluster one pair of columns.
fn cluster_pair<C: Clustering>(
    algorithm: &C,
    (name_a, a): (&str, &[f64]),
    (name_b, b): (&str, &[f64]),
) -> Result<ClusterPartition> {
    let wrap = |message: String| Error::Clustering {
        feature1: name_a.to_string(),
        feature2: name_b.to_string(),
        message,
    };

    for (name, col) in [(name_a, a), (name_b, b)] {
        if col.iter().any(|v| !v.is_finite()) {
            return Err(wrap(
                Error::NonFinite {
                    column: name.to_string(),
                }
                .to_string(),
            ));
        }
    }

    let magnitude = a.iter().chain(b).fold(0.0f64, |m, v| m.max(v.abs()));
    let divisor = if magnitude <= MAX_MAGNITUDE {
        1.0
    } else if algorithm.is_scale_invariant() {
        magnitude
    } else {
        return Err(wrap(format!(
            "values up to {magnitude:e} exceed the f32 clustering range ({MAX_MAGNITUDE:e})"
        )));
    };

    let points: Vec<Vec<f32>> = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| vec![(x / divisor) as f32, (y / divisor) as f32])
        .collect();

    let labels = algorithm
        .fit_predict(&points)
        .map_err(|e| wrap(e.to_string()))?;
    if labels.len() != points.len() {
        return Err(wrap(
            Error::DimensionMismatch {
                expected: points.len(),
                found: labels.len(),
            }
            .to_string(),
        ));
    }
    Ok(ClusterPartition::from_labels(&labels))
}

/// Run a [`ClusteringRequest`] against `table`.
pub fn compute_request(table: &FeatureTable, request: &ClusteringRequest) -> Result<StoredClusters> {
    let columns = request.resolve_columns(table);
    let clusters = compute(table, &columns, &request.params)?;
    Ok(StoredClusters {
        algorithm: request.params.name().to_string(),
        clusters,
    })
}

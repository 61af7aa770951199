//! Hierarchical (agglomerative) clustering over a precomputed distance matrix.
//!
//! Bottom-up: every item starts as its own cluster and the two closest
//! clusters are merged until one remains. The merge history is a
//! [`Dendrogram`], which the reorderer walks to lay similar items side by
//! side.
//!
//! # Linkage Methods
//!
//! | Linkage | Distance between clusters A and B |
//! |---------|-----------------------------------|
//! | Single | min(d(a,b)) |
//! | Complete | max(d(a,b)) |
//! | Average | mean(d(a,b)) (UPGMA) |
//! | Ward | increase in within-cluster variance |
//!
//! # Condensed form
//!
//! Distances are passed as the strict upper triangle of the n×n matrix,
//! row-major, of length n(n-1)/2: entry (i, j) with i < j sits at
//! `n*i - i*(i+1)/2 + (j - i - 1)`.

use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    #[default]
    Average,
    /// Ward's method: minimize within-cluster variance.
    Ward,
}

impl From<Linkage> for KodamaMethod {
    fn from(linkage: Linkage) -> Self {
        match linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        }
    }
}

/// Strict upper triangle of a square matrix, row-major.
pub fn condensed(square: &[Vec<f64>]) -> Result<Vec<f64>> {
    let n = square.len();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for (i, row) in square.iter().enumerate() {
        if row.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: row.len(),
            });
        }
        out.extend_from_slice(&row[i + 1..]);
    }
    Ok(out)
}

/// Run agglomerative clustering on a condensed distance vector of `n` items.
pub fn linkage(condensed: &[f64], n: usize, method: Linkage) -> Result<Dendrogram> {
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    let expected = n * (n - 1) / 2;
    if condensed.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            found: condensed.len(),
        });
    }
    if condensed.iter().any(|d| !d.is_finite()) {
        return Err(Error::NonFinite {
            column: "distance".to_string(),
        });
    }

    let mut dendro = Dendrogram::new(n);
    if n == 1 {
        return Ok(dendro);
    }

    // kodama overwrites its input.
    let mut scratch = condensed.to_vec();
    let steps = kodama_linkage(&mut scratch, n, method.into());
    for step in steps.steps() {
        dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
    }

    Ok(dendro)
}

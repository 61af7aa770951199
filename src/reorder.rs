//! Reordering similarity matrices so similar rows sit next to each other.
//!
//! | Method | Ordering |
//! |--------|----------|
//! | `optimal` | average-linkage dendrogram on `1 - similarity`, then optimal leaf ordering |
//! | `average` | descending mean similarity to every other row |
//! | `none` | identity |
//!
//! Matrices of size 2 or less are never reordered. Reordering never fails
//! the caller: a degenerate input (every off-diagonal distance equal) gets
//! the identity order plus a `warning`, and any other failure gets the
//! identity order plus an `error` message.
//!
//! For every result, `order` is a permutation of `0..n` and
//! `matrix[a][b] == original[order[a]][order[b]]`.

use crate::cluster::{condensed, linkage, Linkage};
use crate::error::{Error, Result};
use crate::matrix::{is_permutation, AxisLabel, SimilarityMatrix};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Off-diagonal distances closer than this are treated as equal.
const DEGENERATE_TOL: f64 = 1e-12;

/// Reordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReorderMethod {
    /// Optimal leaf ordering of an average-linkage dendrogram.
    Optimal,
    /// Sort by mean similarity, descending.
    Average,
    /// Keep the input order.
    #[default]
    None,
}

impl ReorderMethod {
    /// Parse a name, falling back to [`ReorderMethod::None`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "optimal" => Self::Optimal,
            "average" => Self::Average,
            _ => Self::None,
        }
    }
}

impl From<String> for ReorderMethod {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl fmt::Display for ReorderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optimal => "optimal",
            Self::Average => "average",
            Self::None => "none",
        })
    }
}

/// A reordered matrix and the permutation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "L: AxisLabel + Serialize"))]
pub struct ReorderResult<L> {
    /// The matrix with rows and columns in `order`.
    #[serde(flatten)]
    pub matrix: SimilarityMatrix<L>,
    /// Original index of each position.
    pub order: Vec<usize>,
    /// Requested method.
    pub method: ReorderMethod,
    /// Set when reordering was skipped for lack of signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Set when reordering failed and the identity order was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<L: AxisLabel> ReorderResult<L> {
    fn identity(matrix: &SimilarityMatrix<L>, method: ReorderMethod) -> Self {
        Self {
            matrix: matrix.clone(),
            order: (0..matrix.len()).collect(),
            method,
            warning: None,
            error: None,
        }
    }
}

enum Outcome {
    Ordered(Vec<usize>),
    Degenerate(String),
}

/// Reorder `matrix` with `method`.
pub fn reorder<L: AxisLabel>(matrix: &SimilarityMatrix<L>, method: ReorderMethod) -> ReorderResult<L> {
    let n = matrix.len();
    if method == ReorderMethod::None || n <= 2 {
        return ReorderResult::identity(matrix, method);
    }

    let outcome = match method {
        ReorderMethod::Optimal => optimal_order(matrix.values()),
        ReorderMethod::Average => average_order(matrix.values()).map(Outcome::Ordered),
        ReorderMethod::None => Ok(Outcome::Ordered((0..n).collect())),
    };

    let ordered = match outcome {
        Ok(Outcome::Degenerate(msg)) => {
            warn!(size = n, %method, "{msg}");
            return ReorderResult {
                warning: Some(msg),
                ..ReorderResult::identity(matrix, method)
            };
        }
        Ok(Outcome::Ordered(order)) => matrix.permuted(&order).map(|m| (m, order)),
        Err(e) => Err(e),
    };

    match ordered {
        Ok((reordered, order)) => {
            debug!(size = n, %method, "reordered similarity matrix");
            ReorderResult {
                matrix: reordered,
                order,
                method,
                warning: None,
                error: None,
            }
        }
        Err(e) => {
            warn!(size = n, %method, error = %e, "reordering failed, keeping input order");
            ReorderResult {
                error: Some(e.to_string()),
                ..ReorderResult::identity(matrix, method)
            }
        }
    }
}

fn check_values(values: &[Vec<f64>]) -> Result<()> {
    let n = values.len();
    for row in values {
        if row.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFinite {
                column: "similarity".to_string(),
            });
        }
    }
    Ok(())
}

fn optimal_order(values: &[Vec<f64>]) -> Result<Outcome> {
    check_values(values)?;
    let n = values.len();

    let dist: Vec<Vec<f64>> = values
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(|(j, &s)| if i == j { 0.0 } else { 1.0 - s })
                .collect()
        })
        .collect();

    let flat = condensed(&dist)?;
    let (lo, hi) = flat
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| (lo.min(d), hi.max(d)));
    if hi - lo <= DEGENERATE_TOL {
        return Ok(Outcome::Degenerate(format!(
            "all {} off-diagonal distances are equal ({lo}); nothing to reorder",
            flat.len()
        )));
    }

    let dendro = linkage(&flat, n, Linkage::Average)?;
    let order = dendro.optimal_leaf_order(|i, j| dist[i][j])?;
    if !is_permutation(&order, n) {
        return Err(Error::Other("leaf ordering is not a permutation".to_string()));
    }
    Ok(Outcome::Ordered(order))
}

fn average_order(values: &[Vec<f64>]) -> Result<Vec<usize>> {
    check_values(values)?;
    let n = values.len();
    let means: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let others: f64 = row
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, v)| v)
                .sum();
            others / (n - 1) as f64
        })
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| means[b].total_cmp(&means[a]));
    Ok(order)
}

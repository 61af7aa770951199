//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! Groups points that sit in dense regions and leaves the rest as noise.
//!
//! - **eps**: neighborhood radius (Euclidean).
//! - **min_samples**: neighbors within `eps`, counting the point itself, for
//!   a point to be a **core** point.
//! - **Border point**: not core, but within `eps` of a core point.
//! - **Noise**: neither; labelled [`NOISE`] (`-1`).
//!
//! Clusters are grown breadth-first from each unvisited core point, so cluster
//! ids are assigned in order of the lowest-index core point of each cluster.
//! A border point reachable from two clusters joins whichever reaches it first.
//!
//! Neighborhood queries are brute force, O(n²) per fit. That is adequate for
//! the 2-D projections the pairwise engine feeds in.
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use super::traits::{ClusterId, Clustering};
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Label given to points that belong to no cluster.
pub const NOISE: ClusterId = -1;

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Neighborhood radius.
    eps: f32,
    /// Minimum neighborhood size (including the point) for a core point.
    min_samples: usize,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    pub fn new(eps: f32, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Set the neighborhood radius.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set the minimum neighborhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Indices within `eps` of `idx`, including `idx` itself.
    fn region_query(&self, data: &[Vec<f32>], idx: usize) -> Vec<usize> {
        let eps_sq = self.eps * self.eps;
        let point = &data[idx];
        data.iter()
            .enumerate()
            .filter(|(_, other)| {
                point
                    .iter()
                    .zip(other.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f32>()
                    <= eps_sq
            })
            .map(|(j, _)| j)
            .collect()
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<ClusterId>> {
        let n = data.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "eps",
                message: "must be positive and finite",
            });
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        let d = data[0].len();
        if let Some(p) = data.iter().find(|p| p.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: p.len(),
            });
        }

        let mut labels = vec![NOISE; n];
        let mut visited = vec![false; n];
        let mut next_id: ClusterId = 0;

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            let neighbors = self.region_query(data, start);
            if neighbors.len() < self.min_samples {
                // Stays noise unless a later core point claims it as border.
                continue;
            }

            let cluster = next_id;
            next_id += 1;
            labels[start] = cluster;

            let mut queue: VecDeque<usize> = neighbors.into();
            while let Some(j) = queue.pop_front() {
                if labels[j] == NOISE {
                    labels[j] = cluster;
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;

                let reach = self.region_query(data, j);
                if reach.len() >= self.min_samples {
                    queue.extend(reach.into_iter().filter(|&m| !visited[m]));
                }
            }
        }

        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "dbscan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs_and_outlier() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![0.1, 0.1],
            vec![100.0, 100.0],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
            vec![5.1, 5.1],
        ]
    }

    #[test]
    fn test_dbscan_two_clusters_and_noise() {
        let labels = Dbscan::new(0.3, 3)
            .fit_predict(&two_blobs_and_outlier())
            .unwrap();

        assert_eq!(labels, vec![0, 0, 0, 0, NOISE, 1, 1, 1, 1]);
    }

    #[test]
    fn test_dbscan_all_noise() {
        let data = vec![
            vec![0.0, 0.0],
            vec![10.0, 0.0],
            vec![0.0, 10.0],
            vec![10.0, 10.0],
        ];

        let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
        assert!(labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn test_dbscan_min_samples_one_makes_every_point_core() {
        let data = vec![vec![0.0, 0.0], vec![10.0, 0.0]];
        let labels = Dbscan::new(0.5, 1).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_dbscan_chain_is_one_cluster() {
        let data: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32 * 0.3, 0.0]).collect();

        let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_dbscan_border_point_joins_cluster() {
        // Point 3 has only one neighbor (point 2), so it is border, not core.
        let data = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![0.4, 0.0],
            vec![0.8, 0.0],
        ];
        let labels = Dbscan::new(0.45, 3).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_dbscan_invalid_params() {
        let data = vec![vec![0.0, 0.0]];

        assert!(Dbscan::new(0.0, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(-1.0, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(f32::NAN, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(0.5, 0).fit_predict(&data).is_err());
        assert_eq!(Dbscan::default().fit_predict(&[]), Err(Error::EmptyInput));
    }
}

//! K-means clustering.
//!
//! Partitions points into k clusters by minimizing the within-cluster sum of
//! squares (inertia):
//!
//! ```text
//! inertia = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! Lloyd iterations alternate an assignment step (each point to its nearest
//! centroid) and an update step (each centroid to the mean of its points)
//! until the total centroid shift drops below `tol` or `max_iter` is reached.
//!
//! Centroids are seeded with k-means++ (first uniformly, the rest with
//! probability proportional to squared distance to the nearest chosen
//! centroid). Because Lloyd only finds a local optimum, `n_init` independent
//! seedings are run and the lowest-inertia labelling is kept.
//!
//! Returned labels are renumbered in order of first appearance, so the first
//! point is always in cluster 0 and labels are contiguous even when a
//! centroid ends up empty.

use super::traits::{ClusterId, Clustering};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations per run.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Independent k-means++ restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// One finished Lloyd run.
struct Run {
    labels: Vec<usize>,
    inertia: f32,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 1000,
            tol: 1e-4,
            n_init: 3,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of clusters requested.
    pub fn k(&self) -> usize {
        self.k
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        if self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        Ok(())
    }

    /// k-means++ seeding.
    fn seed_centroids(&self, points: &Array2<f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = points.nrows();
        let mut centroids = Array2::zeros((self.k, points.ncols()));
        centroids
            .row_mut(0)
            .assign(&points.row(rng.random_range(0..n)));

        // Squared distance of every point to its nearest chosen centroid.
        let mut nearest: Vec<f32> = points
            .rows()
            .into_iter()
            .map(|p| squared_distance(&p, &centroids.row(0)))
            .collect();

        for c in 1..self.k {
            let total: f32 = nearest.iter().sum();
            let chosen = if total > 0.0 {
                let threshold = rng.random::<f32>() * total;
                let mut cumsum = 0.0;
                nearest
                    .iter()
                    .position(|&d| {
                        cumsum += d;
                        cumsum >= threshold
                    })
                    .unwrap_or(n - 1)
            } else {
                // All points coincide with chosen centroids.
                rng.random_range(0..n)
            };
            centroids.row_mut(c).assign(&points.row(chosen));

            for (i, p) in points.rows().into_iter().enumerate() {
                let d = squared_distance(&p, &centroids.row(c));
                if d < nearest[i] {
                    nearest[i] = d;
                }
            }
        }

        centroids
    }

    fn lloyd(&self, points: &Array2<f32>, rng: &mut impl Rng) -> Run {
        let (n, d) = points.dim();
        let mut centroids = self.seed_centroids(points, rng);
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iter {
            assign(points, &centroids, &mut labels);

            let mut sums = Array2::<f32>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &label) in labels.iter().enumerate() {
                let mut row = sums.row_mut(label);
                row += &points.row(i);
                counts[label] += 1;
            }
            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    sums.row_mut(c).mapv_inplace(|v| v / count as f32);
                } else {
                    // Empty cluster: restart it at a random point.
                    sums.row_mut(c)
                        .assign(&points.row(rng.random_range(0..n)));
                }
            }

            let shift: f32 = centroids
                .iter()
                .zip(sums.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = sums;
            if f64::from(shift) < self.tol {
                break;
            }
        }

        // Final assignment against the converged centroids.
        assign(points, &centroids, &mut labels);
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &c)| squared_distance(&points.row(i), &centroids.row(c)))
            .sum();

        Run { labels, inertia }
    }
}

fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest_centroid(point: &ArrayView1<'_, f32>, centroids: &Array2<f32>) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

fn assign(points: &Array2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) {
    #[cfg(feature = "parallel")]
    labels.par_iter_mut().enumerate().for_each(|(i, label)| {
        *label = nearest_centroid(&points.row(i), centroids);
    });

    #[cfg(not(feature = "parallel"))]
    for (i, label) in labels.iter_mut().enumerate() {
        *label = nearest_centroid(&points.row(i), centroids);
    }
}

/// Renumber labels by first appearance.
fn compact(labels: &[usize]) -> Vec<ClusterId> {
    let mut mapping: Vec<Option<ClusterId>> = Vec::new();
    let mut next: ClusterId = 0;
    labels
        .iter()
        .map(|&l| {
            if l >= mapping.len() {
                mapping.resize(l + 1, None);
            }
            *mapping[l].get_or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect()
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<ClusterId>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = data.len();
        let d = data[0].len();
        self.validate(n)?;

        let mut flat: Vec<f32> = Vec::with_capacity(n * d);
        for point in data {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            flat.extend_from_slice(point);
        }
        let points =
            Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut best: Option<Run> = None;
        for _ in 0..self.n_init {
            let run = self.lloyd(&points, &mut rng);
            match &best {
                Some(b) if b.inertia <= run.inertia => {}
                _ => best = Some(run),
            }
        }

        let best = best.ok_or_else(|| Error::Other("k-means produced no run".into()))?;
        Ok(compact(&best.labels))
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn is_scale_invariant(&self) -> bool {
        true
    }
}

//! Clustering algorithms.
//!
//! The pairwise engine treats these as black boxes behind [`Clustering`]:
//! points in, one integer label per point out. Label [`NOISE`] (`-1`) means
//! "not assigned" and is only produced by density-based methods.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, move centroids to the mean of
//! their points, repeat. Needs `k` up front and assumes roughly spherical
//! clusters; every point gets a real cluster.
//!
//! ## DBSCAN
//!
//! Grows clusters from points with at least `min_samples` neighbors within
//! `eps`. Finds the number of clusters itself and leaves sparse points as
//! noise.
//!
//! ## Hierarchical (agglomerative)
//!
//! Not a labeller here: [`linkage`] turns a condensed distance vector into a
//! [`Dendrogram`](crate::hierarchy::Dendrogram) that the matrix reorderer uses
//! for optimal leaf ordering.
//!
//! ```rust
//! use pairclust::cluster::{Clustering, Dbscan, Kmeans, NOISE};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![50.0, 50.0],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(1).fit_predict(&data[..4]).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
//! assert_eq!(labels[4], NOISE);
//! ```

mod dbscan;
mod hierarchical;
mod kmeans;
mod traits;

pub use dbscan::{Dbscan, NOISE};
pub use hierarchical::{condensed, linkage, Linkage};
pub use kmeans::Kmeans;
pub use traits::{ClusterId, Clustering};

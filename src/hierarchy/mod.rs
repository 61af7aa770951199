//! Merge trees from agglomerative clustering.
//!
//! A [`Dendrogram`] records every merge:
//!
//! ```text
//!         6 (height=1.0)
//!        / \
//!       4   5 (height=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```
//!
//! Reading the leaves left to right gives a one-dimensional layout in which
//! members of each subtree are adjacent. Swapping the two children of any
//! internal node keeps that property, and
//! [`Dendrogram::optimal_leaf_order`] picks the swaps that minimize the
//! distance between neighbouring leaves.

mod dendrogram;

pub use dendrogram::{Dendrogram, Merge};

//! Dendrogram: the merge tree produced by agglomerative clustering.
//!
//! Ids follow the SciPy/kodama convention: leaves are `0..n`, and merge `s`
//! creates node `n + s`. The last merge is the root.
//!
//! Besides the plain left-to-right leaf order, the dendrogram can compute an
//! **optimal leaf ordering** (Bar-Joseph, Gifford & Jaakkola, 2001): among
//! the 2ⁿ⁻¹ orderings obtained by flipping children at internal nodes, pick
//! the one minimizing the sum of distances between adjacent leaves.
//!
//! # Algorithm
//!
//! For leaves `i` and `j` with lowest common ancestor `v`, let `M[i][j]` be
//! the cheapest ordering of `v`'s leaves that starts at `i` and ends at `j`.
//! Each pair has exactly one such `v`, so a single n×n table holds every
//! subproblem. With `i` under child `a` and `j` under child `b`:
//!
//! ```text
//! M[i][j] = min over k ∈ ends(a, i), m ∈ ends(b, j) of
//!           M[i][k] + D(k, m) + M[m][j]
//! ```
//!
//! where `ends(a, i)` is `{i}` for a leaf and otherwise the leaves of the
//! child of `a` not containing `i`. Splitting the min over `k` and `m` gives
//! O(n³) total work and O(n²) memory.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    /// Merge history, in merge order.
    merges: Vec<Merge>,
    /// Number of original items.
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First node being merged.
    pub cluster_a: usize,
    /// Second node being merged.
    pub cluster_b: usize,
    /// Dissimilarity at which the merge occurred.
    pub distance: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Leaf positions of every node under a fixed left-to-right traversal.
///
/// Every node's leaves form a contiguous run of `order`.
struct Layout {
    order: Vec<usize>,
    pos: Vec<usize>,
    span: Vec<(usize, usize)>,
    children: Vec<Option<(usize, usize)>>,
}

impl Layout {
    fn leaves(&self, node: usize) -> &[usize] {
        let (start, end) = self.span[node];
        &self.order[start..end]
    }

    fn contains(&self, node: usize, leaf: usize) -> bool {
        let (start, end) = self.span[node];
        (start..end).contains(&self.pos[leaf])
    }

    /// Leaves that can end an ordering of `node` which starts at `leaf`.
    fn ends(&self, node: usize, leaf: usize) -> &[usize] {
        match self.children[node] {
            None => self.leaves(node),
            Some((a, b)) => {
                if self.contains(a, leaf) {
                    self.leaves(b)
                } else {
                    self.leaves(a)
                }
            }
        }
    }
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Check that the merges form one complete binary tree over the leaves.
    fn layout(&self) -> Result<Layout> {
        let n = self.n_items;
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.merges.len() != n - 1 {
            return Err(Error::DimensionMismatch {
                expected: n - 1,
                found: self.merges.len(),
            });
        }

        let total = 2 * n - 1;
        let mut children = vec![None; total];
        let mut used = vec![false; total];
        for (s, m) in self.merges.iter().enumerate() {
            for c in [m.cluster_a, m.cluster_b] {
                if c >= n + s || used[c] {
                    return Err(Error::Other(format!(
                        "malformed merge {s}: node {c} is unknown or already merged"
                    )));
                }
                used[c] = true;
            }
            children[n + s] = Some((m.cluster_a, m.cluster_b));
        }

        let root = total - 1;
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match children[node] {
                None => order.push(node),
                Some((a, b)) => {
                    stack.push(b);
                    stack.push(a);
                }
            }
        }

        let mut pos = vec![0; n];
        for (p, &leaf) in order.iter().enumerate() {
            pos[leaf] = p;
        }
        let mut span = vec![(0, 0); total];
        for leaf in 0..n {
            span[leaf] = (pos[leaf], pos[leaf] + 1);
        }
        for (s, m) in self.merges.iter().enumerate() {
            let (a, b) = (span[m.cluster_a], span[m.cluster_b]);
            span[n + s] = (a.0.min(b.0), a.1.max(b.1));
        }

        Ok(Layout {
            order,
            pos,
            span,
            children,
        })
    }

    /// Leaves in plain left-to-right traversal order.
    pub fn leaf_order(&self) -> Result<Vec<usize>> {
        Ok(self.layout()?.order)
    }

    /// Leaf order minimizing the summed distance between adjacent leaves,
    /// among all orders consistent with the tree.
    ///
    /// `dist(i, j)` must be symmetric for the result to be meaningful.
    pub fn optimal_leaf_order<F>(&self, dist: F) -> Result<Vec<usize>>
    where
        F: Fn(usize, usize) -> f64,
    {
        let layout = self.layout()?;
        let n = self.n_items;
        if n <= 2 {
            return Ok(layout.order);
        }

        let mut cost = vec![f64::INFINITY; n * n];
        for i in 0..n {
            cost[i * n + i] = 0.0;
        }

        for m in &self.merges {
            let (a, b) = (m.cluster_a, m.cluster_b);
            let (la, lb) = (layout.leaves(a), layout.leaves(b));
            let b_start = layout.span[b].0;

            for &i in la {
                let ends_a = layout.ends(a, i);
                // best[x]: cheapest way to leave `a` from i and step onto lb[x].
                let best: Vec<f64> = lb
                    .iter()
                    .map(|&mm| {
                        ends_a
                            .iter()
                            .map(|&k| cost[i * n + k] + dist(k, mm))
                            .fold(f64::INFINITY, f64::min)
                    })
                    .collect();

                for &j in lb {
                    let c = layout
                        .ends(b, j)
                        .iter()
                        .map(|&mm| best[layout.pos[mm] - b_start] + cost[mm * n + j])
                        .fold(f64::INFINITY, f64::min);
                    cost[i * n + j] = c;
                    cost[j * n + i] = c;
                }
            }
        }

        let root = 2 * n - 2;
        let (left, right) = layout.children[root].ok_or(Error::EmptyInput)?;
        let mut start = (layout.leaves(left)[0], layout.leaves(right)[0]);
        let mut best = f64::INFINITY;
        for &i in layout.leaves(left) {
            for &j in layout.leaves(right) {
                if cost[i * n + j] < best {
                    best = cost[i * n + j];
                    start = (i, j);
                }
            }
        }

        // Unwind the table: each frame is (node, first leaf, last leaf).
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![(root, start.0, start.1)];
        while let Some((node, i, j)) = stack.pop() {
            let Some((c1, c2)) = layout.children[node] else {
                order.push(i);
                continue;
            };
            let (a, b) = if layout.contains(c1, i) { (c1, c2) } else { (c2, c1) };

            let mut split = (i, j);
            let mut split_cost = f64::INFINITY;
            for &k in layout.ends(a, i) {
                for &mm in layout.ends(b, j) {
                    let c = cost[i * n + k] + dist(k, mm) + cost[mm * n + j];
                    if c < split_cost {
                        split_cost = c;
                        split = (k, mm);
                    }
                }
            }

            stack.push((b, split.1, j));
            stack.push((a, i, split.0));
        }

        Ok(order)
    }
}

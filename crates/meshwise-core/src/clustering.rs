//! Spatial clustering for dead-zone detection
//!
//! Single-link clustering over grid cells backed by a union-find
//! (disjoint-set) structure. Two points belong to the same cluster when a
//! chain of points connects them with every hop no longer than the linkage
//! distance. Unlike a greedy seed-and-sweep pass, the result is independent
//! of input order, so boundary ties are well-defined and testable.

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    /// Create a forest of `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find the representative of `i`'s set.
    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }

    /// True if `a` and `b` are in the same set.
    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

/// Cluster 2D points with single-link grouping at the given linkage
/// distance (inclusive). Returns clusters as sorted index lists, ordered by
/// their smallest member index, so identical inputs always produce an
/// identical clustering regardless of point order within a cluster.
pub fn cluster_points(points: &[(f64, f64)], linkage: f64) -> Vec<Vec<usize>> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sets = DisjointSet::new(n);
    let linkage_sq = linkage * linkage;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            if dx * dx + dy * dy <= linkage_sq {
                sets.union(i, j);
            }
        }
    }

    // Group members under their root, then order deterministically.
    let mut by_root: std::collections::HashMap<usize, Vec<usize>> =
        std::collections::HashMap::new();
    for i in 0..n {
        let root = sets.find(i);
        by_root.entry(root).or_default().push(i);
    }

    let mut clusters: Vec<Vec<usize>> = by_root.into_values().collect();
    for cluster in &mut clusters {
        cluster.sort_unstable();
    }
    clusters.sort_unstable_by_key(|c| c[0]);
    clusters
}

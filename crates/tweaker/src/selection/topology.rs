//! Edge topology derived from a triangle list.
//!
//! Edges are keyed by their sorted vertex pair so both windings of a shared
//! edge count as one. An edge used by exactly one triangle is a boundary
//! edge; boundary edges chained through shared vertices form boundary loops.

use std::collections::HashMap;

use glam::Vec3;

/// Undirected edge stored as (smaller, larger) vertex index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(pub u32, pub u32);

impl Edge {
    pub fn new(a: u32, b: u32) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }
}

/// Number of triangles using each edge.
pub fn edge_use_counts(indices: &[u32]) -> HashMap<Edge, u32> {
    let mut counts = HashMap::with_capacity(indices.len());
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *counts.entry(Edge::new(a, b)).or_insert(0) += 1;
        }
    }
    counts
}

/// Edges used by exactly one triangle, sorted for stable iteration.
pub fn boundary_edges(indices: &[u32]) -> Vec<Edge> {
    let mut edges: Vec<Edge> = edge_use_counts(indices)
        .into_iter()
        .filter_map(|(edge, count)| (count == 1).then_some(edge))
        .collect();
    edges.sort_unstable();
    edges
}

/// Vertex neighbours along triangle edges, deduplicated.
pub fn vertex_adjacency(indices: &[u32], vertex_count: usize) -> Vec<Vec<u32>> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            adjacency[a as usize].push(b);
            adjacency[b as usize].push(a);
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
        neighbours.dedup();
    }
    adjacency
}

/// Disjoint-set forest over vertex indices.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
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
}

/// Connected-component root of every vertex, joined through triangles.
///
/// Vertices referenced by no triangle are their own component.
pub fn connected_components(indices: &[u32], vertex_count: usize) -> Vec<usize> {
    let mut sets = UnionFind::new(vertex_count);
    for tri in indices.chunks_exact(3) {
        sets.union(tri[0] as usize, tri[1] as usize);
        sets.union(tri[1] as usize, tri[2] as usize);
    }
    (0..vertex_count).map(|v| sets.find(v)).collect()
}

/// A chain of boundary edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoop {
    /// Vertices on the loop, sorted
    pub vertices: Vec<u32>,
    /// Sum of the loop's edge lengths
    pub perimeter: f32,
}

/// Group boundary edges into loops.
///
/// Boundary edges sharing a vertex belong to the same loop, so a
/// non-manifold vertex joins the loops meeting at it.
pub fn boundary_loops(indices: &[u32], positions: &[Vec3]) -> Vec<BoundaryLoop> {
    let edges = boundary_edges(indices);
    let mut sets = UnionFind::new(positions.len());
    for edge in &edges {
        sets.union(edge.0 as usize, edge.1 as usize);
    }

    let mut by_root: HashMap<usize, BoundaryLoop> = HashMap::new();
    for edge in &edges {
        let root = sets.find(edge.0 as usize);
        let entry = by_root.entry(root).or_insert_with(|| BoundaryLoop {
            vertices: Vec::new(),
            perimeter: 0.0,
        });
        entry.vertices.push(edge.0);
        entry.vertices.push(edge.1);
        entry.perimeter += positions[edge.0 as usize].distance(positions[edge.1 as usize]);
    }

    let mut loops: Vec<BoundaryLoop> = by_root
        .into_values()
        .map(|mut l| {
            l.vertices.sort_unstable();
            l.vertices.dedup();
            l
        })
        .collect();
    loops.sort_by_key(|l| l.vertices[0]);
    loops
}

/// Boundary loops that bound internal gaps.
///
/// Within each connected component the loop with the longest perimeter is
/// the outer rim; every other loop of that component is a hole.
pub fn hole_loops(indices: &[u32], positions: &[Vec3]) -> Vec<BoundaryLoop> {
    let components = connected_components(indices, positions.len());
    let loops = boundary_loops(indices, positions);

    let mut outer: HashMap<usize, usize> = HashMap::new();
    for (i, l) in loops.iter().enumerate() {
        let component = components[l.vertices[0] as usize];
        match outer.get(&component) {
            Some(&best) if loops[best].perimeter >= l.perimeter => {}
            _ => {
                outer.insert(component, i);
            }
        }
    }

    loops
        .into_iter()
        .enumerate()
        .filter(|(i, l)| outer.get(&components[l.vertices[0] as usize]) != Some(i))
        .map(|(_, l)| l)
        .collect()
}

//! Vantage-point tree for exact nearest-neighbor search under a true metric.
//!
//! Each node picks a vantage point and splits the remaining points at the
//! median distance from it. Queries prune a subtree when the triangle
//! inequality proves no point inside can beat the current k-th candidate.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, VitrineError};
use crate::neighbors::Neighbor;
use crate::neighbors::distance::DistanceMetric;

/// Relative slack on pruning bounds. `acos` near zero angles loses about
/// eight digits, so the slack must stay well above 1e-8.
const PRUNE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
struct VpNode {
    point: usize,
    radius: f64,
    inside: Option<usize>,
    outside: Option<usize>,
}

/// Exact k-NN search tree.
#[derive(Debug, Clone)]
pub struct VpTreeSearcher {
    points: Vec<Vec<f64>>,
    metric: DistanceMetric,
    nodes: Vec<VpNode>,
    root: Option<usize>,
}

impl VpTreeSearcher {
    /// Build a tree over `points`.
    pub fn build(points: Vec<Vec<f64>>, metric: DistanceMetric) -> Result<Self> {
        if !metric.is_true_metric() {
            return Err(VitrineError::invalid_operation(format!(
                "Vantage-point tree requires a true metric, got {}",
                metric.name()
            )));
        }

        let mut tree = Self {
            points,
            metric,
            nodes: Vec::new(),
            root: None,
        };
        let indices: Vec<usize> = (0..tree.points.len()).collect();
        tree.root = tree.build_node(indices)?;
        Ok(tree)
    }

    fn build_node(&mut self, mut indices: Vec<usize>) -> Result<Option<usize>> {
        if indices.is_empty() {
            return Ok(None);
        }

        let point = indices.remove(0);
        let mut by_distance = Vec::with_capacity(indices.len());
        for idx in indices {
            let d = self.metric.distance(&self.points[point], &self.points[idx])?;
            by_distance.push((d, idx));
        }
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mid = by_distance.len() / 2;
        let radius = by_distance.get(mid).map(|(d, _)| *d).unwrap_or(0.0);
        let outside: Vec<usize> = by_distance.split_off(mid).into_iter().map(|(_, i)| i).collect();
        let inside: Vec<usize> = by_distance.into_iter().map(|(_, i)| i).collect();

        let slot = self.nodes.len();
        self.nodes.push(VpNode {
            point,
            radius,
            inside: None,
            outside: None,
        });

        let inside = self.build_node(inside)?;
        let outside = self.build_node(outside)?;
        self.nodes[slot].inside = inside;
        self.nodes[slot].outside = outside;

        Ok(Some(slot))
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    /// The `k` nearest rows to `query`, skipping `exclude`.
    pub fn search(&self, query: &[f64], k: usize, exclude: Option<usize>) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        let mut stack: Vec<usize> = self.root.into_iter().collect();

        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            let d = self.metric.distance(query, &self.points[node.point])?;

            if Some(node.point) != exclude {
                let candidate = Candidate(Neighbor {
                    row: node.point,
                    distance: d,
                });
                if heap.len() < k {
                    heap.push(candidate);
                } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                    heap.pop();
                    heap.push(candidate);
                }
            }

            let tau = if heap.len() < k {
                f64::INFINITY
            } else {
                heap.peek().map(|c| c.0.distance).unwrap_or(f64::INFINITY)
            };
            let reach = tau + PRUNE_EPSILON * (1.0 + tau.abs());

            // Points inside satisfy d(p, v) <= radius, points outside d(p, v) >= radius.
            if let Some(inside) = node.inside
                && d - node.radius <= reach
            {
                stack.push(inside);
            }
            if let Some(outside) = node.outside
                && node.radius - d <= reach
            {
                stack.push(outside);
            }
        }

        let mut neighbors: Vec<Neighbor> = heap.into_iter().map(|c| c.0).collect();
        neighbors.sort_by(Neighbor::cmp_by_distance);
        Ok(neighbors)
    }
}

/// Max-heap entry ordered by (distance, row).
#[derive(Debug, Clone, Copy)]
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        Neighbor::cmp_by_distance(&self.0, &other.0)
    }
}

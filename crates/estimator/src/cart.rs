//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression tree construction on a (possibly bootstrapped)
//! multiset of row indices. Candidate features are re-drawn at every node
//! from the tree's own RNG.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

use crate::deterministic::SplitTieBreaker;
use crate::tree::{Node, Tree};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of candidate features examined per node.
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }
}

/// Split candidate with its score and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    /// sum_l² / n_l + sum_r² / n_r; larger means lower squared error.
    score: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        match self.score.total_cmp(&other.score) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.tie_breaker.cmp_key(&other.tie_breaker) == Ordering::Less,
        }
    }
}

/// Build a regression tree using exact-greedy CART
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: TreeConfig) -> Self {
        assert_eq!(features.len(), targets.len());

        let feature_count = features.first().map(Vec::len).unwrap_or(0);

        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree over `sample`; repeated indices count with multiplicity.
    pub fn build(&self, sample: &[usize], rng: &mut StdRng) -> Tree {
        let mut nodes = Vec::new();
        let mut indices = sample.to_vec();
        self.build_node(&mut indices, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the created node
    fn build_node(
        &self,
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut StdRng,
    ) -> usize {
        let current_idx = nodes.len();
        let leaf_value = self.mean_target(indices);

        // Reserve space for current node
        nodes.push(Node::Leaf { value: leaf_value });

        let n = indices.len();
        let depth_reached = self.config.max_depth.map_or(false, |max| depth >= max);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || self.is_pure(indices)
        {
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, rng) else {
            return current_idx;
        };

        let feature_idx = split.tie_breaker.feature_idx;
        let threshold = split.tie_breaker.threshold;
        let n_left = partition(indices, |&i| self.features[i][feature_idx] <= threshold);
        let (left_indices, right_indices) = indices.split_at_mut(n_left);

        let left = self.build_node(left_indices, depth + 1, nodes, rng);
        let right = self.build_node(right_indices, depth + 1, nodes, rng);

        nodes[current_idx] = Node::Split {
            feature_idx,
            threshold,
            left,
            right,
        };

        current_idx
    }

    /// Search a random subset of features for the split minimising squared error
    fn find_best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.feature_count).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut informative = 0usize;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(indices.len());

        for feature_idx in order {
            if informative >= self.config.max_features {
                break;
            }

            column.clear();
            column.extend(
                indices
                    .iter()
                    .map(|&i| (self.features[i][feature_idx], self.targets[i])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            // Constant features in this node do not count against max_features
            if column[0].0 == column[column.len() - 1].0 {
                continue;
            }
            informative += 1;

            if let Some(candidate) = self.best_threshold(feature_idx, &column) {
                best = match best {
                    Some(current) if !candidate.beats(&current) => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        best
    }

    /// Best threshold for one feature given (value, target) pairs sorted by value
    fn best_threshold(&self, feature_idx: usize, column: &[(f64, f64)]) -> Option<SplitCandidate> {
        let n = column.len();
        let total: f64 = column.iter().map(|(_, t)| t).sum();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<SplitCandidate> = None;
        let mut left_sum = 0.0;

        for pos in 1..n {
            left_sum += column[pos - 1].1;

            let (prev, next) = (column[pos - 1].0, column[pos].0);
            if prev == next {
                continue;
            }
            let n_left = pos;
            let n_right = n - pos;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let score =
                left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

            let mut threshold = prev + (next - prev) / 2.0;
            if threshold >= next || !threshold.is_finite() {
                threshold = prev;
            }

            let candidate = SplitCandidate {
                score,
                tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
            };
            best = match best {
                Some(current) if !candidate.beats(&current) => Some(current),
                _ => Some(candidate),
            };
        }

        best
    }

    fn mean_target(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        sum / indices.len() as f64
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let first = self.targets[indices[0]];
        indices.iter().all(|&i| self.targets[i] == first)
    }
}

/// Stable in-place partition; returns the number of elements satisfying `pred`.
fn partition<F: Fn(&usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let (mut left, right): (Vec<usize>, Vec<usize>) = indices.iter().partition(|i| pred(i));
    let n_left = left.len();
    left.extend(right);
    indices.copy_from_slice(&left);
    n_left
}

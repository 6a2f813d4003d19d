//! Regression tree structure and traversal
//!
//! Nodes are stored in a flat vector; node 0 is the root.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes send a sample left when `features[feature_idx] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// A single regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature_idx).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    left,
                    right,
                    threshold,
                    ..
                } => {
                    if *left <= i || *left >= self.nodes.len() {
                        return Err(format!("Node {i} has invalid left child: {left}"));
                    }
                    if *right <= i || *right >= self.nodes.len() {
                        return Err(format!("Node {i} has invalid right child: {right}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("Node {i} has non-finite threshold"));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("Leaf node {i} has non-finite value"));
                    }
                }
            }
        }

        Ok(())
    }
}

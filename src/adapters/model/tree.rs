//! Gradient-boosted tree ensemble evaluation.

use serde::{Deserialize, Serialize};

use crate::ports::ModelError;

/// A tree node. Splits send `x[feature] < threshold` (and NaN) left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Nodes stored in array order; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Sum of tree outputs in logit space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

impl Tree {
    /// Children must come after their parent, so every walk terminates.
    fn validate(&self, index: usize, n_features: usize) -> Result<(), ModelError> {
        let invalid =
            |msg: String| Err(ModelError::InvalidArtifact(format!("tree {index}: {msg}")));

        if self.nodes.is_empty() {
            return invalid("no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return invalid(format!("node {i} splits on unknown feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return invalid(format!("node {i} has a NaN threshold"));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return invalid(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return invalid(format!("leaf {i} is not finite"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = x[feature];
                    i = if v.is_nan() || v < threshold { left } else { right };
                }
            }
        }
    }
}

impl TreeEnsemble {
    pub(super) fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err(ModelError::InvalidArtifact(
                "base_score and learning_rate must be finite".into(),
            ));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, n_features)?;
        }
        Ok(())
    }

    pub(super) fn logit(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.leaf_value(x)).sum();
        self.base_score + self.learning_rate * sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    #[test]
    fn test_ensemble_logit() {
        let ensemble = TreeEnsemble {
            base_score: 0.5,
            learning_rate: 0.5,
            trees: vec![stump(0, 40.0, 1.0, -1.0), stump(1, 0.5, 0.2, 0.4)],
        };
        ensemble.validate(2).expect("Should validate");

        assert!((ensemble.logit(&[30.0, 1.0]) - (0.5 + 0.5 * 1.4)).abs() < 1e-12);
        assert!((ensemble.logit(&[50.0, 0.0]) - (0.5 + 0.5 * -0.8)).abs() < 1e-12);
        // NaN follows the left branch.
        assert!((ensemble.logit(&[f64::NAN, 0.0]) - (0.5 + 0.5 * 1.2)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = Tree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { value: 0.0 },
            ],
        };
        assert!(tree.validate(0, 1).is_err());
    }

    #[test]
    fn test_rejects_unknown_feature() {
        assert!(stump(3, 1.0, 0.0, 0.0).validate(0, 2).is_err());
    }

    #[test]
    fn test_untagged_nodes_parse() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"value": -0.5},
                {"value": 0.5}
            ]}"#,
        )
        .expect("Should parse");
        assert!(matches!(tree.nodes[0], TreeNode::Split { feature: 0, .. }));
        assert!(matches!(tree.nodes[2], TreeNode::Leaf { .. }));
    }
}

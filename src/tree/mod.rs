//! The trained decision tree handed to the compiler.
//!
//! A node owns either nothing (leaf) or exactly two boxed children
//! (internal), so the strict-binary invariant holds by construction.
//! Trees arrive from the training step as JSON in this shape, or as the
//! parallel-array export handled by [`array`].

pub mod array;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::CircuitConfig;
use crate::error::{Error, FeatureOffender, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Internal {
        feature: usize,
        /// Training thresholds may be fractional; the flattener makes them integral.
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        /// One-hot class vector.
        classification: Vec<u8>,
    },
}

impl Node {
    pub fn leaf(class: usize, num_classes: usize) -> Self {
        let mut classification = vec![0u8; num_classes];
        if class < num_classes {
            classification[class] = 1;
        }
        Node::Leaf { classification }
    }

    pub fn internal(feature: usize, threshold: f64, left: Node, right: Node) -> Self {
        Node::Internal {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Number of split levels: a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    pub fn internal_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => {
                1 + left.internal_count() + right.internal_count()
            }
        }
    }

    pub fn features_used(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features(&self, out: &mut BTreeSet<usize>) {
        if let Node::Internal {
            feature,
            left,
            right,
            ..
        } = self
        {
            out.insert(*feature);
            left.collect_features(out);
            right.collect_features(out);
        }
    }

    /// Return if every leaf sits at the same depth.
    pub fn is_complete(&self) -> bool {
        self.min_depth() == self.depth()
    }

    fn min_depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.min_depth().min(right.min_depth()),
        }
    }

    /// Check the tree against the circuit before compiling it: feature
    /// indices in range, leaves one-hot over `num_classes`, and depth
    /// within `max_depth`.
    pub fn check(&self, config: &CircuitConfig) -> Result<()> {
        let mut offenders = Vec::new();
        let mut slot = 0;
        self.check_node(config, &mut slot, &mut offenders)?;
        if !offenders.is_empty() {
            return Err(Error::FeatureRange {
                num_features: config.num_features,
                offenders,
            });
        }
        let depth = self.depth();
        if depth > config.max_depth {
            return Err(Error::Structure(format!(
                "tree depth {} exceeds circuit depth {}",
                depth, config.max_depth
            )));
        }
        Ok(())
    }

    /// Pre-order walk; `slot` counts internal nodes in flattening order.
    fn check_node(
        &self,
        config: &CircuitConfig,
        slot: &mut usize,
        offenders: &mut Vec<FeatureOffender>,
    ) -> Result<()> {
        match self {
            Node::Leaf { classification } => {
                let ones = classification.iter().filter(|&&b| b == 1).count();
                let others = classification.iter().filter(|&&b| b > 1).count();
                if classification.len() != config.num_classes || ones != 1 || others != 0 {
                    return Err(Error::Structure(format!(
                        "leaf classification {:?} is not one-hot over {} classes",
                        classification, config.num_classes
                    )));
                }
                Ok(())
            }
            Node::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= config.num_features {
                    offenders.push(FeatureOffender {
                        slot: *slot,
                        feature: *feature,
                    });
                }
                if !threshold.is_finite() {
                    return Err(Error::Structure(format!(
                        "internal node {} has non-finite threshold",
                        slot
                    )));
                }
                *slot += 1;
                left.check_node(config, slot, offenders)?;
                right.check_node(config, slot, offenders)
            }
        }
    }

    /// Return a complete tree of the given depth: every leaf above the
    /// bottom level is replaced by a split that sends all inputs left and
    /// has the same leaf on both sides. Classification is unchanged.
    ///
    /// Pre: `depth >= self.depth()`.
    pub fn complete_to_depth(&self, depth: usize, config: &CircuitConfig) -> Node {
        match self {
            Node::Internal {
                feature,
                threshold,
                left,
                right,
            } => Node::internal(
                *feature,
                *threshold,
                left.complete_to_depth(depth.saturating_sub(1), config),
                right.complete_to_depth(depth.saturating_sub(1), config),
            ),
            Node::Leaf { .. } if depth == 0 => self.clone(),
            Node::Leaf { .. } => {
                let below = self.complete_to_depth(depth - 1, config);
                Node::internal(0, f64::from(config.input_max), below.clone(), below)
            }
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Malformed(format!("tree model: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unbalanced strict tree: a split whose right side splits again.
    fn lopsided() -> Node {
        Node::internal(
            0,
            500.0,
            Node::leaf(1, 8),
            Node::internal(4, 250.5, Node::leaf(2, 8), Node::leaf(6, 8)),
        )
    }

    #[test]
    fn test_counts_and_depth() {
        let tree = lopsided();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.internal_count(), 2);
        assert!(!tree.is_complete());
        assert_eq!(tree.features_used().into_iter().collect::<Vec<_>>(), vec![0, 4]);

        let single = Node::leaf(3, 8);
        assert_eq!(single.depth(), 0);
        assert_eq!(single.leaf_count(), 1);
        assert!(single.is_complete());
    }

    #[test]
    fn test_json_shape() {
        let text = r#"{
            "feature": 2, "threshold": 300,
            "left": {"classification": [1,0,0,0,0,0,0,0]},
            "right": {"classification": [0,1,0,0,0,0,0,0]}
        }"#;
        let tree = Node::from_json(text).unwrap();
        assert_eq!(
            tree,
            Node::internal(2, 300.0, Node::leaf(0, 8), Node::leaf(1, 8))
        );
        let back = serde_json::to_string(&tree).unwrap();
        assert_eq!(Node::from_json(&back).unwrap(), tree);
    }

    #[test]
    fn test_json_rejects_single_child() {
        let text = r#"{"feature": 2, "threshold": 300,
            "left": {"classification": [1,0,0,0,0,0,0,0]}}"#;
        assert_eq!(Node::from_json(text).unwrap_err().kind(), "MalformedError");
    }

    #[test]
    fn test_check_accepts_valid_tree() {
        let config = CircuitConfig::standard();
        assert!(lopsided().check(&config).is_ok());
        assert!(Node::leaf(3, 8).check(&config).is_ok());
    }

    #[test]
    fn test_check_reports_feature_offenders() {
        let config = CircuitConfig::standard();
        let tree = Node::internal(
            25,
            1.0,
            Node::leaf(0, 8),
            Node::internal(30, 1.0, Node::leaf(1, 8), Node::leaf(2, 8)),
        );
        match tree.check(&config) {
            Err(Error::FeatureRange { offenders, .. }) => {
                assert_eq!(
                    offenders,
                    vec![
                        FeatureOffender {
                            slot: 0,
                            feature: 25
                        },
                        FeatureOffender {
                            slot: 1,
                            feature: 30
                        },
                    ]
                );
            }
            other => panic!("expected FeatureRange, got {:?}", other),
        }
    }

    #[test]
    fn test_check_rejects_bad_leaves_and_depth() {
        let config = CircuitConfig::standard();
        let two_hot = Node::Leaf {
            classification: vec![0, 0, 1, 1, 0, 0, 0, 0],
        };
        assert_eq!(two_hot.check(&config).unwrap_err().kind(), "StructureError");

        let short = Node::Leaf {
            classification: vec![1, 0],
        };
        assert!(short.check(&config).is_err());

        let mut deep = Node::leaf(0, 8);
        for _ in 0..4 {
            deep = Node::internal(1, 10.0, deep, Node::leaf(1, 8));
        }
        let err = deep.check(&config).unwrap_err();
        assert!(err.to_string().contains("depth 4"), "{}", err);
    }

    #[test]
    fn test_complete_to_depth() {
        let config = CircuitConfig::standard();
        let complete = lopsided().complete_to_depth(3, &config);
        assert!(complete.is_complete());
        assert_eq!(complete.depth(), 3);
        assert_eq!(complete.internal_count(), 7);
        assert_eq!(complete.leaf_count(), 8);

        let single = Node::leaf(3, 8).complete_to_depth(3, &config);
        assert_eq!(single.leaf_count(), 8);
        assert!(single.check(&config).is_ok());
    }
}

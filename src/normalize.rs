//! Capacity normalizer: pad flattened sequences to the circuit's exact
//! slot counts.
//!
//! Missing internal slots get `{feature: 0, threshold: 0}`, missing leaf
//! slots the all-zero vector. Trees larger than the circuit are rejected
//! unless the caller opts into truncation, in which case the excess is
//! dropped and the result says so.

use crate::artifact::{CompiledArtifact, InternalRecord, LeafRecord};
use crate::config::CircuitConfig;
use crate::error::{Error, Result};
use crate::flatten::Flattened;

/// What to do with a tree that needs more slots than the circuit has.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OverflowPolicy {
    /// Fail with `CapacityExceeded`.
    #[default]
    Reject,
    /// Keep the first slots and drop the rest.
    Truncate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Normalized {
    pub artifact: CompiledArtifact,
    /// Internal records before padding.
    pub logical_internals: usize,
    /// Leaf records before padding.
    pub logical_leaves: usize,
    /// Real records were dropped to fit.
    pub truncated: bool,
}

pub fn normalize(
    flat: &Flattened,
    config: &CircuitConfig,
    policy: OverflowPolicy,
) -> Result<Normalized> {
    let logical_internals = flat.internals.len();
    let logical_leaves = flat.leaves.len();
    let overflow =
        logical_internals > config.internal_capacity || logical_leaves > config.leaf_capacity;

    if overflow && policy == OverflowPolicy::Reject {
        return Err(Error::CapacityExceeded {
            internals: logical_internals,
            leaves: logical_leaves,
            internal_capacity: config.internal_capacity,
            leaf_capacity: config.leaf_capacity,
        });
    }
    if overflow {
        tracing::warn!(
            internals = logical_internals,
            leaves = logical_leaves,
            internal_capacity = config.internal_capacity,
            leaf_capacity = config.leaf_capacity,
            "truncating tree to circuit capacity; dropped nodes change classification"
        );
    }

    let mut internals = flat.internals.clone();
    internals.resize(config.internal_capacity, InternalRecord::padding());

    let mut leaves = flat.leaves.clone();
    leaves.resize(config.leaf_capacity, LeafRecord::padding(config.num_classes));

    tracing::debug!(
        logical_internals,
        logical_leaves,
        padded_internals = config.internal_capacity - logical_internals.min(config.internal_capacity),
        padded_leaves = config.leaf_capacity - logical_leaves.min(config.leaf_capacity),
        "normalized to circuit capacity"
    );

    Ok(Normalized {
        artifact: CompiledArtifact { internals, leaves },
        logical_internals,
        logical_leaves,
        truncated: overflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{flatten, ThresholdMode};
    use crate::tree::Node;

    fn chain(splits: usize) -> Node {
        let mut node = Node::leaf(0, 8);
        for i in 0..splits {
            node = Node::internal(i % 25, i as f64, node, Node::leaf((i + 1) % 8, 8));
        }
        node
    }

    #[test]
    fn test_pads_single_leaf() {
        let config = CircuitConfig::standard();
        let flat = flatten(&Node::leaf(3, 8), ThresholdMode::Truncate).unwrap();
        let out = normalize(&flat, &config, OverflowPolicy::Reject).unwrap();

        assert_eq!(out.artifact.internals, vec![InternalRecord::padding(); 7]);
        assert_eq!(out.artifact.leaves.len(), 8);
        assert_eq!(out.artifact.leaves[0], LeafRecord::one_hot(3, 8));
        assert!(out.artifact.leaves[1..].iter().all(|l| l.is_padding()));
        assert_eq!((out.logical_internals, out.logical_leaves), (0, 1));
        assert!(!out.truncated);
    }

    #[test]
    fn test_full_tree_needs_no_padding() {
        let config = CircuitConfig::standard();
        let tree = Node::leaf(2, 8).complete_to_depth(3, &config);
        let flat = flatten(&tree, ThresholdMode::Truncate).unwrap();
        let out = normalize(&flat, &config, OverflowPolicy::Reject).unwrap();
        assert_eq!(out.artifact.internals, flat.internals);
        assert_eq!(out.artifact.leaves, flat.leaves);
    }

    #[test]
    fn test_rejects_overflow() {
        let config = CircuitConfig::standard();
        let flat = flatten(&chain(8), ThresholdMode::Truncate).unwrap();
        match normalize(&flat, &config, OverflowPolicy::Reject) {
            Err(Error::CapacityExceeded {
                internals, leaves, ..
            }) => assert_eq!((internals, leaves), (8, 9)),
            other => panic!("expected CapacityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_truncation_is_reported() {
        let config = CircuitConfig::standard();
        let flat = flatten(&chain(8), ThresholdMode::Truncate).unwrap();
        let out = normalize(&flat, &config, OverflowPolicy::Truncate).unwrap();
        assert!(out.truncated);
        assert_eq!(out.artifact.internals.len(), 7);
        assert_eq!(out.artifact.leaves.len(), 8);
        assert_eq!(out.artifact.internals[..], flat.internals[..7]);
        assert_eq!(out.logical_leaves, 9);
    }

    #[test]
    fn test_at_capacity_is_not_truncated() {
        let config = CircuitConfig::standard();
        let flat = flatten(&chain(7), ThresholdMode::Truncate).unwrap();
        let out = normalize(&flat, &config, OverflowPolicy::Truncate).unwrap();
        assert!(!out.truncated);
    }
}

//! Compilation pipeline: tree → flatten → normalize → validate.

use crate::artifact::CompiledArtifact;
use crate::config::CircuitConfig;
use crate::error::{Error, Result};
use crate::flatten::{flatten, Layout, ThresholdMode};
use crate::normalize::{normalize, OverflowPolicy};
use crate::tree::Node;
use crate::validate::validate;

#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub thresholds: ThresholdMode,
    pub overflow: OverflowPolicy,
    /// Expand an incomplete tree to a complete tree of `max_depth` before
    /// flattening, so its pre-order matches the circuit's hard-wired
    /// topology. When off, incomplete trees are rejected.
    pub complete: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            thresholds: ThresholdMode::default(),
            overflow: OverflowPolicy::default(),
            complete: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Compilation {
    pub artifact: CompiledArtifact,
    /// Child links for the artifact's logical tree.
    pub layout: Layout,
    pub logical_internals: usize,
    pub logical_leaves: usize,
    pub truncated: bool,
}

impl Compilation {
    /// Whether the circuit's fixed topology agrees with the tree's own.
    /// Only a truncated compilation can disagree.
    pub fn matches_circuit(&self, config: &CircuitConfig) -> bool {
        self.layout == Layout::complete(config.max_depth) || self.layout == Layout::single_leaf()
    }
}

/// Compile a tree into a fixed-capacity artifact that has passed the
/// structural validator and that the circuit routes exactly like the tree.
/// The tree itself is only read.
///
/// Trees that fit the circuit are checked with [`Node::check`], then
/// completed to `max_depth` (or rejected when `complete` is off). Trees
/// that do not fit are rejected with `CapacityExceeded`, or sliced under
/// [`OverflowPolicy::Truncate`].
pub fn compile(tree: &Node, config: &CircuitConfig, options: &CompileOptions) -> Result<Compilation> {
    config.check()?;

    let fits = tree.internal_count() <= config.internal_capacity
        && tree.leaf_count() <= config.leaf_capacity;

    let completed;
    let tree = if !fits || tree.is_leaf() {
        tree
    } else {
        tree.check(config)?;
        if options.complete {
            completed = tree.complete_to_depth(config.max_depth, config);
            &completed
        } else if tree.is_complete() && tree.depth() == config.max_depth {
            tree
        } else {
            return Err(Error::Structure(format!(
                "tree is not complete to depth {}; the circuit would route it differently",
                config.max_depth
            )));
        }
    };

    let flat = flatten(tree, options.thresholds)?;
    flat.check_ratio()?;
    tracing::debug!(
        internals = flat.internals.len(),
        leaves = flat.leaves.len(),
        depth = tree.depth(),
        "flattened tree"
    );

    // Rejects or slices trees that do not fit.
    let normalized = normalize(&flat, config, options.overflow)?;
    let summary = validate(&normalized.artifact, config).into_result()?;
    tracing::info!(
        circuit = %config.name,
        real_leaves = summary.real_leaf_count,
        truncated = normalized.truncated,
        "compiled artifact {}",
        normalized.artifact.content_hash()
    );

    Ok(Compilation {
        artifact: normalized.artifact,
        layout: flat.layout,
        logical_internals: normalized.logical_internals,
        logical_leaves: normalized.logical_leaves,
        truncated: normalized.truncated,
    })
}

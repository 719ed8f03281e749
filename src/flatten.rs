//! Flattener: tree → pre-order `internals` / `leaves` sequences.
//!
//! At each internal node the `{feature, threshold}` record is appended
//! before the left subtree is walked, then the right subtree. Leaves are
//! appended in the order they are reached. This order is part of the
//! compiled format: the circuit's fixed index arithmetic assumes it.
//!
//! Pre-order positions alone do not say where a node's right child
//! starts, so the flattener also records an explicit [`Layout`].

use crate::artifact::{CompiledArtifact, InternalRecord, LeafRecord};
use crate::config::CircuitConfig;
use crate::error::{Error, Result};
use crate::tree::Node;

// ─── Layout ────────────────────────────────────────────────────────

/// A position in the flattened arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Internal(usize),
    Leaf(usize),
}

/// Explicit child references for every internal slot.
///
/// `children[i]` holds the `[left, right]` slots of internal `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub root: Slot,
    pub children: Vec<[Slot; 2]>,
}

impl Layout {
    /// The degenerate tree: one leaf at slot 0.
    pub fn single_leaf() -> Self {
        Self {
            root: Slot::Leaf(0),
            children: Vec::new(),
        }
    }

    /// The topology the circuit hard-codes: a complete tree of `depth`
    /// split levels in pre-order. Internal `i` at level `d` has its left
    /// child at `i + 1` and its right child at `i + 2^(depth - d - 1)`.
    pub fn complete(depth: usize) -> Self {
        let mut builder = LayoutBuilder::default();
        let root = builder.complete(depth);
        builder.finish(root)
    }

    /// Layout for an artifact read back from storage, which carries no
    /// child references: the single-leaf layout when slot 0 is the only
    /// real leaf, the circuit layout otherwise.
    pub fn for_artifact(artifact: &CompiledArtifact, config: &CircuitConfig) -> Self {
        let real: Vec<usize> = artifact
            .leaves
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_padding())
            .map(|(i, _)| i)
            .collect();
        if real == [0] {
            Self::single_leaf()
        } else {
            Self::complete(config.max_depth)
        }
    }

    /// Sequence of `(internal, went_left)` steps from the root to each leaf,
    /// indexed by leaf slot.
    pub fn leaf_paths(&self) -> Vec<Vec<(usize, bool)>> {
        let mut paths = Vec::new();
        let mut trail = Vec::new();
        self.walk_paths(self.root, &mut trail, &mut paths);
        paths
    }

    fn walk_paths(
        &self,
        slot: Slot,
        trail: &mut Vec<(usize, bool)>,
        paths: &mut Vec<Vec<(usize, bool)>>,
    ) {
        match slot {
            Slot::Leaf(j) => {
                if paths.len() <= j {
                    paths.resize(j + 1, Vec::new());
                }
                paths[j] = trail.clone();
            }
            Slot::Internal(i) => {
                let Some([left, right]) = self.children.get(i).copied() else {
                    return;
                };
                trail.push((i, true));
                self.walk_paths(left, trail, paths);
                trail.pop();
                trail.push((i, false));
                self.walk_paths(right, trail, paths);
                trail.pop();
            }
        }
    }
}

/// Hands out pre-order slot numbers and records child links.
#[derive(Default)]
struct LayoutBuilder {
    next_internal: usize,
    next_leaf: usize,
    children: Vec<[Slot; 2]>,
}

impl LayoutBuilder {
    fn leaf(&mut self) -> Slot {
        let slot = Slot::Leaf(self.next_leaf);
        self.next_leaf += 1;
        slot
    }

    /// Reserve an internal slot; children are filled in by `link`.
    fn internal(&mut self) -> usize {
        let i = self.next_internal;
        self.next_internal += 1;
        self.children.push([Slot::Leaf(0); 2]);
        i
    }

    fn link(&mut self, i: usize, left: Slot, right: Slot) {
        self.children[i] = [left, right];
    }

    fn complete(&mut self, depth: usize) -> Slot {
        if depth == 0 {
            return self.leaf();
        }
        let i = self.internal();
        let left = self.complete(depth - 1);
        let right = self.complete(depth - 1);
        self.link(i, left, right);
        Slot::Internal(i)
    }

    fn finish(self, root: Slot) -> Layout {
        Layout {
            root,
            children: self.children,
        }
    }
}

// ─── Flattener ─────────────────────────────────────────────────────

/// How fractional training thresholds become integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ThresholdMode {
    /// Toward zero, matching an integer cast.
    #[default]
    Truncate,
    /// To nearest, half away from zero.
    Round,
}

impl ThresholdMode {
    pub fn apply(self, threshold: f64) -> Result<i32> {
        let value = match self {
            ThresholdMode::Truncate => threshold.trunc(),
            ThresholdMode::Round => threshold.round(),
        };
        if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
            return Err(Error::Structure(format!(
                "threshold {} does not fit an integer record",
                threshold
            )));
        }
        Ok(value as i32)
    }
}

/// Flattener output: logical (unpadded) sequences plus their layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Flattened {
    pub internals: Vec<InternalRecord>,
    pub leaves: Vec<LeafRecord>,
    pub layout: Layout,
}

impl Flattened {
    /// Ratio check on logical counts: `leaves == internals + 1`.
    pub fn check_ratio(&self) -> Result<()> {
        if self.leaves.len() != self.internals.len() + 1 {
            return Err(Error::Structure(format!(
                "{} leaves for {} internal nodes (expected {})",
                self.leaves.len(),
                self.internals.len(),
                self.internals.len() + 1
            )));
        }
        Ok(())
    }
}

/// Walk `tree` in pre-order. Never fails on a finite-threshold tree.
pub fn flatten(tree: &Node, mode: ThresholdMode) -> Result<Flattened> {
    let mut out = Flattener {
        mode,
        internals: Vec::new(),
        leaves: Vec::new(),
        layout: LayoutBuilder::default(),
    };
    let root = out.visit(tree)?;
    Ok(Flattened {
        internals: out.internals,
        leaves: out.leaves,
        layout: out.layout.finish(root),
    })
}

struct Flattener {
    mode: ThresholdMode,
    internals: Vec<InternalRecord>,
    leaves: Vec<LeafRecord>,
    layout: LayoutBuilder,
}

impl Flattener {
    fn visit(&mut self, node: &Node) -> Result<Slot> {
        match node {
            Node::Leaf { classification } => {
                self.leaves.push(LeafRecord {
                    classification: classification.clone(),
                });
                Ok(self.layout.leaf())
            }
            Node::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                self.internals.push(InternalRecord {
                    feature: *feature,
                    threshold: self.mode.apply(*threshold)?,
                });
                let i = self.layout.internal();
                let left = self.visit(left)?;
                let right = self.visit(right)?;
                self.layout.link(i, left, right);
                Ok(Slot::Internal(i))
            }
        }
    }
}

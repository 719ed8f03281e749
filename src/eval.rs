//! Reference evaluator: walks a compiled artifact with the downstream
//! evaluator's semantics, one path at a time.
//!
//! At internal slot `i` the input routes left when
//! `input[internals[i].feature] <= internals[i].threshold`, right otherwise.
//! Navigation follows a [`Layout`]: the one recorded at compile time, or
//! [`Layout::for_artifact`] for artifacts read back from storage.

use rayon::prelude::*;

use crate::artifact::CompiledArtifact;
use crate::config::CircuitConfig;
use crate::error::{Error, FeatureOffender, Result};
use crate::flatten::{Layout, Slot};

/// Reject inputs of the wrong length or with values outside the circuit's range.
pub fn check_input(input: &[i32], config: &CircuitConfig) -> Result<()> {
    if input.len() != config.num_features {
        return Err(Error::InputShape(format!(
            "expected {} values, got {}",
            config.num_features,
            input.len()
        )));
    }
    if let Some((i, v)) = input
        .iter()
        .enumerate()
        .find(|&(_, &v)| v < config.input_min || v > config.input_max)
    {
        return Err(Error::InputShape(format!(
            "value {} at position {} outside [{}, {}]",
            v, i, config.input_min, config.input_max
        )));
    }
    Ok(())
}

/// Classify `input`, returning the class label of the leaf reached.
pub fn evaluate(
    artifact: &CompiledArtifact,
    layout: &Layout,
    input: &[i32],
    config: &CircuitConfig,
) -> Result<usize> {
    check_input(input, config)?;

    let mut slot = layout.root;
    // A well-formed layout reaches a leaf in at most one step per internal slot.
    for _ in 0..=layout.children.len() {
        match slot {
            Slot::Leaf(j) => {
                let leaf = artifact
                    .leaves
                    .get(j)
                    .ok_or(Error::UnreachableLeaf { leaf: j })?;
                if leaf.is_padding() {
                    return Err(Error::UnreachableLeaf { leaf: j });
                }
                return leaf.class().ok_or_else(|| {
                    Error::Structure(format!(
                        "leaf {} classification {:?} is not one-hot",
                        j, leaf.classification
                    ))
                });
            }
            Slot::Internal(i) => {
                let (Some(record), Some(children)) =
                    (artifact.internals.get(i), layout.children.get(i))
                else {
                    return Err(Error::Structure(format!(
                        "layout refers to internal slot {} outside the artifact",
                        i
                    )));
                };
                let value = input.get(record.feature).ok_or_else(|| Error::FeatureRange {
                    num_features: config.num_features,
                    offenders: vec![FeatureOffender {
                        slot: i,
                        feature: record.feature,
                    }],
                })?;
                slot = if *value <= record.threshold {
                    children[0]
                } else {
                    children[1]
                };
            }
        }
    }
    Err(Error::Structure("layout does not terminate in a leaf".to_string()))
}

/// Classify an artifact read from storage, inferring its layout.
pub fn evaluate_stored(
    artifact: &CompiledArtifact,
    input: &[i32],
    config: &CircuitConfig,
) -> Result<usize> {
    let layout = Layout::for_artifact(artifact, config);
    evaluate(artifact, &layout, input, config)
}

/// Classify many inputs in parallel; results keep input order.
pub fn evaluate_batch(
    artifact: &CompiledArtifact,
    layout: &Layout,
    inputs: &[Vec<i32>],
    config: &CircuitConfig,
) -> Vec<Result<usize>> {
    inputs
        .par_iter()
        .map(|input| evaluate(artifact, layout, input, config))
        .collect()
}

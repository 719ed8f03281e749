//! Plain simulation of the fixed-topology classification circuit.
//!
//! The circuit never branches: it compares every internal vertex, ANDs
//! comparison bits along each of the hard-wired root-to-leaf paths, then
//! ORs `path & classification` bit-wise across all leaves. The result is a
//! class bit vector, one-hot when exactly one real leaf is selected.
//!
//! Running the reference evaluator and this simulator side by side shows
//! whether an artifact behaves the same once deployed.

use crate::artifact::CompiledArtifact;
use crate::config::CircuitConfig;
use crate::error::Result;
use crate::eval::check_input;
use crate::flatten::Layout;

/// Comparison bit per internal slot: `true` routes left.
fn vertex_bits(artifact: &CompiledArtifact, input: &[i32]) -> Vec<bool> {
    artifact
        .internals
        .iter()
        .map(|record| {
            // Out-of-range indices read as 0, like the circuit's masked lookup.
            let value = input.get(record.feature).copied().unwrap_or(0);
            value <= record.threshold
        })
        .collect()
}

/// Evaluate all paths obliviously and return the output class bits.
pub fn simulate(
    artifact: &CompiledArtifact,
    input: &[i32],
    config: &CircuitConfig,
) -> Result<Vec<u8>> {
    check_input(input, config)?;

    let vertices = vertex_bits(artifact, input);
    let paths = Layout::complete(config.max_depth).leaf_paths();

    let mut output = vec![0u8; config.num_classes];
    for (leaf, path) in artifact.leaves.iter().zip(&paths) {
        let taken = path
            .iter()
            .all(|&(i, left)| vertices.get(i).copied().unwrap_or(false) == left);
        if !taken {
            continue;
        }
        for (out, &bit) in output.iter_mut().zip(&leaf.classification) {
            *out |= bit & 1;
        }
    }
    Ok(output)
}

/// The class selected by a circuit output, when exactly one bit is set.
pub fn decode_class(bits: &[u8]) -> Option<usize> {
    let mut ones = bits.iter().enumerate().filter(|&(_, &b)| b != 0);
    match (ones.next(), ones.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

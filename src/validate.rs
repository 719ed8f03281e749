//! Structural validator: gate between compilation and deployment.
//!
//! Checks run in order and stop at the first failure:
//! 1. required fields present (parse time; malformed input is an `Err`)
//! 2. `len(leaves) == len(internals) + 1`
//! 3. every feature index in `[0, num_features - 1]`
//! 4. every leaf is one-hot or all-zero padding, real leaves first
//!
//! Structural problems are reported, not raised. The summary is advisory
//! and logged at `info`.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::artifact::CompiledArtifact;
use crate::config::CircuitConfig;
use crate::diagnostic::{locate_key, locate_name, Diagnostic};
use crate::error::{Error, FeatureOffender, Result};
use crate::labels::FeatureLabels;

// ─── Report ────────────────────────────────────────────────────────

/// Audit counts; not part of the pass/fail contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub internal_count: usize,
    pub leaf_count: usize,
    pub real_leaf_count: usize,
    pub features_used: BTreeSet<usize>,
}

impl ArtifactSummary {
    pub fn of(artifact: &CompiledArtifact) -> Self {
        Self {
            internal_count: artifact.internals.len(),
            leaf_count: artifact.leaves.len(),
            real_leaf_count: artifact.real_leaf_count(),
            features_used: artifact.features_used(),
        }
    }

    pub fn render(&self, labels: Option<&FeatureLabels>) -> String {
        let features: Vec<String> = self
            .features_used
            .iter()
            .map(|&f| match labels {
                Some(labels) => labels.describe(f),
                None => f.to_string(),
            })
            .collect();
        format!(
            "internal nodes: {}\nleaf nodes: {} ({} real, {} padding)\nfeatures used: [{}]",
            self.internal_count,
            self.leaf_count,
            self.real_leaf_count,
            self.leaf_count - self.real_leaf_count,
            features.join(", ")
        )
    }
}

#[derive(Debug)]
pub struct ValidationReport {
    pub summary: ArtifactSummary,
    /// First failed check, if any.
    pub failure: Option<Error>,
    /// Failure details plus advisory warnings.
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Turn a failed report into its error.
    pub fn into_result(self) -> Result<ArtifactSummary> {
        match self.failure {
            None => Ok(self.summary),
            Some(err) => Err(err),
        }
    }
}

// ─── Checks ────────────────────────────────────────────────────────

/// Validate an in-memory artifact. Never mutates its input.
pub fn validate(artifact: &CompiledArtifact, config: &CircuitConfig) -> ValidationReport {
    run(artifact, config, None)
}

/// Parse and validate an artifact's JSON text; diagnostics carry spans
/// into `source`. Missing fields or bad JSON are returned as `Err`.
pub fn validate_json(source: &str, config: &CircuitConfig) -> Result<ValidationReport> {
    let artifact = CompiledArtifact::from_json(source)?;
    Ok(run(&artifact, config, Some(source)))
}

/// Validate independent artifacts in parallel.
pub fn validate_all(artifacts: &[CompiledArtifact], config: &CircuitConfig) -> Vec<ValidationReport> {
    artifacts.par_iter().map(|a| validate(a, config)).collect()
}

fn run(artifact: &CompiledArtifact, config: &CircuitConfig, source: Option<&str>) -> ValidationReport {
    let summary = ArtifactSummary::of(artifact);
    tracing::info!(
        internals = summary.internal_count,
        leaves = summary.leaf_count,
        real_leaves = summary.real_leaf_count,
        features = ?summary.features_used,
        "artifact summary"
    );

    let mut diagnostics = Vec::new();

    if artifact.internals.len() != config.internal_capacity
        || artifact.leaves.len() != config.leaf_capacity
    {
        diagnostics.push(
            Diagnostic::warning(format!(
                "artifact has {} internal / {} leaf slots, circuit expects {} / {}",
                artifact.internals.len(),
                artifact.leaves.len(),
                config.internal_capacity,
                config.leaf_capacity
            ))
            .at(source.and_then(|s| locate_name(s, "internals", 0)))
            .help("recompile to pad the artifact to circuit capacity"),
        );
    }

    let failure = check_ratio(artifact)
        .and_then(|_| check_features(artifact, config))
        .and_then(|_| check_leaves(artifact, config))
        .err();

    if let Some(err) = &failure {
        tracing::warn!(kind = err.kind(), "artifact rejected: {}", err);
        diagnostics.extend(explain(err, artifact, source));
    }

    ValidationReport {
        summary,
        failure,
        diagnostics,
    }
}

fn check_ratio(artifact: &CompiledArtifact) -> Result<()> {
    let (n_internal, n_leaves) = (artifact.internals.len(), artifact.leaves.len());
    if n_leaves != n_internal + 1 {
        return Err(Error::Structure(format!(
            "{} leaves for {} internal nodes (expected {})",
            n_leaves,
            n_internal,
            n_internal + 1
        )));
    }
    Ok(())
}

fn check_features(artifact: &CompiledArtifact, config: &CircuitConfig) -> Result<()> {
    let offenders: Vec<FeatureOffender> = artifact
        .internals
        .iter()
        .enumerate()
        .filter(|(_, r)| r.feature >= config.num_features)
        .map(|(slot, r)| FeatureOffender {
            slot,
            feature: r.feature,
        })
        .collect();
    if !offenders.is_empty() {
        return Err(Error::FeatureRange {
            num_features: config.num_features,
            offenders,
        });
    }
    Ok(())
}

fn check_leaves(artifact: &CompiledArtifact, config: &CircuitConfig) -> Result<()> {
    let mut seen_padding = None;
    for (j, leaf) in artifact.leaves.iter().enumerate() {
        if leaf.classification.len() != config.num_classes {
            return Err(Error::Structure(format!(
                "leaf {} has {} classification entries, expected {}",
                j,
                leaf.classification.len(),
                config.num_classes
            )));
        }
        if leaf.is_padding() {
            seen_padding.get_or_insert(j);
            continue;
        }
        if leaf.class().is_none() {
            return Err(Error::Structure(format!(
                "leaf {} classification {:?} is not one-hot",
                j, leaf.classification
            )));
        }
        if let Some(pad) = seen_padding {
            return Err(Error::Structure(format!(
                "real leaf {} follows padding leaf {}",
                j, pad
            )));
        }
    }
    if seen_padding == Some(0) {
        return Err(Error::Structure("artifact has no real leaves".to_string()));
    }
    Ok(())
}

/// Turn a failure into span-carrying diagnostics.
fn explain(err: &Error, artifact: &CompiledArtifact, source: Option<&str>) -> Vec<Diagnostic> {
    match err {
        Error::FeatureRange {
            num_features,
            offenders,
        } => offenders
            .iter()
            .map(|o| {
                Diagnostic::error(format!("internal slot {} uses feature {}", o.slot, o.feature))
                    .at(source.and_then(|s| locate_key(s, "feature", o.slot)))
                    .note(format!("features must lie in 0..={}", num_features - 1))
            })
            .collect(),
        Error::Structure(msg) => vec![Diagnostic::error(msg.clone())
            .at(source.and_then(|s| locate_name(s, "leaves", 0)))
            .note(format!(
                "artifact holds {} internal and {} leaf records",
                artifact.internals.len(),
                artifact.leaves.len()
            ))],
        other => vec![Diagnostic::error(other.to_string())],
    }
}

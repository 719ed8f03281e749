//! Whole-pipeline properties over randomly shaped trees that fit the
//! standard circuit.

use proptest::prelude::*;

use treeforge::circuit::{decode_class, simulate};
use treeforge::{
    compile, evaluate, evaluate_stored, validate, CircuitConfig, CompileOptions, CompiledArtifact,
    Node,
};

fn config() -> CircuitConfig {
    CircuitConfig::standard()
}

/// Full binary trees of depth <= 3 over 25 features and 8 classes.
fn arb_tree() -> impl Strategy<Value = Node> {
    let leaf = (0usize..8).prop_map(|c| Node::leaf(c, 8));
    leaf.prop_recursive(3, 15, 2, |inner| {
        (0usize..25, 0.0f64..1000.0, inner.clone(), inner)
            .prop_map(|(feature, threshold, left, right)| {
                Node::internal(feature, threshold, left, right)
            })
    })
}

fn arb_input() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(0i32..=1000, 25)
}

/// Walk the tree itself, with thresholds truncated the way the compiler does.
fn classify(node: &Node, input: &[i32]) -> usize {
    match node {
        Node::Leaf { classification } => classification
            .iter()
            .position(|&b| b == 1)
            .expect("one-hot leaf"),
        Node::Internal {
            feature,
            threshold,
            left,
            right,
        } => {
            if input[*feature] <= threshold.trunc() as i32 {
                classify(left, input)
            } else {
                classify(right, input)
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn leaves_outnumber_internals_by_one(tree in arb_tree()) {
        let out = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        prop_assert_eq!(out.logical_leaves, out.logical_internals + 1);
        prop_assert_eq!(out.artifact.internals.len(), 7);
        prop_assert_eq!(out.artifact.leaves.len(), 8);
        prop_assert_eq!(out.artifact.real_leaf_count(), out.logical_leaves);
    }

    #[test]
    fn compilation_is_idempotent(tree in arb_tree()) {
        let a = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        let b = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        prop_assert_eq!(a.artifact.to_json(), b.artifact.to_json());
    }

    #[test]
    fn compiled_artifacts_pass_validation(tree in arb_tree()) {
        let out = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        let report = validate(&out.artifact, &config());
        prop_assert!(report.passed(), "{:?}", report.failure);
        prop_assert!(out.artifact.features_used().iter().all(|&f| f < 25));
    }

    #[test]
    fn evaluation_agrees_with_tree(tree in arb_tree(), input in arb_input()) {
        let out = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        let first = evaluate(&out.artifact, &out.layout, &input, &config()).unwrap();
        let second = evaluate(&out.artifact, &out.layout, &input, &config()).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(first, classify(&tree, &input));

        // Read back from storage, the artifact still classifies like the tree.
        let stored = CompiledArtifact::from_json(&out.artifact.to_json()).unwrap();
        prop_assert_eq!(evaluate_stored(&stored, &input, &config()).unwrap(), first);
    }

    #[test]
    fn compiled_trees_match_the_circuit(tree in arb_tree(), input in arb_input()) {
        let out = compile(&tree, &config(), &CompileOptions::default()).unwrap();
        prop_assert!(out.matches_circuit(&config()));
        prop_assume!(!matches!(tree, Node::Leaf { .. }));

        let reference = evaluate(&out.artifact, &out.layout, &input, &config()).unwrap();
        let bits = simulate(&out.artifact, &input, &config()).unwrap();
        prop_assert_eq!(decode_class(&bits), Some(reference));
        prop_assert_eq!(reference, classify(&tree, &input));
    }
}

#[test]
fn single_leaf_artifact_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let out = compile(&Node::leaf(3, 8), &config(), &CompileOptions::default()).unwrap();
    out.artifact.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, out.artifact.to_json());

    let loaded = CompiledArtifact::load(&path).unwrap();
    assert_eq!(loaded, out.artifact);
    for v in [0, 250, 500, 1000] {
        assert_eq!(evaluate_stored(&loaded, &[v; 25], &config()).unwrap(), 3);
    }
}

#[test]
fn stored_complete_artifact_evaluates_like_compiled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");

    let tree = Node::internal(
        4,
        612.7,
        Node::leaf(2, 8),
        Node::internal(9, 40.0, Node::leaf(0, 8), Node::leaf(5, 8)),
    );
    let out = compile(&tree, &config(), &CompileOptions::default()).unwrap();
    out.artifact.save(&path).unwrap();
    let loaded = CompiledArtifact::load(&path).unwrap();

    let mut input = vec![500; 25];
    assert_eq!(evaluate_stored(&loaded, &input, &config()).unwrap(), 2);
    input[4] = 613;
    input[9] = 40;
    assert_eq!(evaluate_stored(&loaded, &input, &config()).unwrap(), 0);
    input[9] = 41;
    assert_eq!(evaluate_stored(&loaded, &input, &config()).unwrap(), 5);
}

#[test]
fn lopsided_tree_reloads_and_classifies_like_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let tree = Node::internal(
        0,
        500.0,
        Node::leaf(1, 8),
        Node::internal(4, 250.0, Node::leaf(2, 8), Node::leaf(6, 8)),
    );
    compile(&tree, &config(), &CompileOptions::default())
        .unwrap()
        .artifact
        .save(&path)
        .unwrap();
    let loaded = CompiledArtifact::load(&path).unwrap();

    let mut cases = vec![vec![1000; 25], vec![0; 25], vec![500; 25]];
    let mut right_left = vec![0; 25];
    right_left[0] = 600;
    cases.push(right_left);
    for input in cases {
        let expected = classify(&tree, &input);
        assert_eq!(evaluate_stored(&loaded, &input, &config()).unwrap(), expected);
        let bits = simulate(&loaded, &input, &config()).unwrap();
        assert_eq!(decode_class(&bits), Some(expected), "input {:?}", input);
    }
}

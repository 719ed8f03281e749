//! Import of the parallel-array tree export produced by common training
//! libraries: node `i` has children `children_left[i]` /
//! `children_right[i]` (`-1` for none), split `feature[i]` /
//! `threshold[i]`, and per-class sample counts `value[i][0]`.

use std::path::Path;

use serde::Deserialize;

use super::Node;
use crate::error::{Error, Result};

const NO_CHILD: i64 = -1;

/// Deepest split chain the importer follows. Far beyond any circuit
/// depth; keeps hostile exports from exhausting the stack.
pub const MAX_IMPORT_DEPTH: usize = 64;

#[derive(Clone, Debug, Deserialize)]
pub struct ArrayTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Shape `[n_nodes][n_outputs][n_classes]`; only output 0 is used.
    pub value: Vec<Vec<Vec<f64>>>,
}

impl ArrayTree {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Malformed(format!("array tree: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Rebuild the node graph from node 0. Leaves become one-hot over
    /// `num_classes`, selecting the class with the most samples (the first
    /// one on ties).
    pub fn to_node(&self, num_classes: usize) -> Result<Node> {
        let n = self.node_count();
        if n == 0 {
            return Err(Error::Malformed("array tree has no nodes".to_string()));
        }
        let lengths = [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(Error::Malformed(format!(
                "array tree columns disagree on node count: {} vs {:?}",
                n, lengths
            )));
        }
        let mut visited = vec![false; n];
        self.build(0, 0, num_classes, &mut visited)
    }

    fn build(
        &self,
        id: usize,
        depth: usize,
        num_classes: usize,
        visited: &mut [bool],
    ) -> Result<Node> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(Error::Structure(format!(
                "array tree is deeper than {} levels at node {}",
                MAX_IMPORT_DEPTH, id
            )));
        }
        if visited[id] {
            return Err(Error::Structure(format!("node {} is reached twice", id)));
        }
        visited[id] = true;

        match (self.children_left[id], self.children_right[id]) {
            (NO_CHILD, NO_CHILD) => {
                let class = self.majority_class(id)?;
                if class >= num_classes {
                    return Err(Error::Structure(format!(
                        "leaf {} selects class {} but the circuit has {} classes",
                        id, class, num_classes
                    )));
                }
                Ok(Node::leaf(class, num_classes))
            }
            (NO_CHILD, _) | (_, NO_CHILD) => Err(Error::Structure(format!(
                "node {} has exactly one child",
                id
            ))),
            (left, right) => {
                let left = self.child_index(id, left)?;
                let right = self.child_index(id, right)?;
                let feature = usize::try_from(self.feature[id]).map_err(|_| {
                    Error::Structure(format!(
                        "internal node {} has negative feature {}",
                        id, self.feature[id]
                    ))
                })?;
                Ok(Node::internal(
                    feature,
                    self.threshold[id],
                    self.build(left, depth + 1, num_classes, visited)?,
                    self.build(right, depth + 1, num_classes, visited)?,
                ))
            }
        }
    }

    fn child_index(&self, parent: usize, child: i64) -> Result<usize> {
        usize::try_from(child)
            .ok()
            .filter(|&c| c < self.node_count())
            .ok_or_else(|| {
                Error::Structure(format!(
                    "node {} points at missing child {}",
                    parent, child
                ))
            })
    }

    fn majority_class(&self, id: usize) -> Result<usize> {
        let counts = self.value[id]
            .first()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Malformed(format!("leaf {} has no class counts", id)))?;
        let mut best = 0;
        for (i, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = i;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_split_export() -> ArrayTree {
        // 0: split f3 <= 1.5 -> 1, 2
        // 1: leaf (class 2)
        // 2: split f7 <= 2.5 -> 3, 4
        // 3: leaf (class 0), 4: leaf (class 5)
        ArrayTree {
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![3, -2, 7, -2, -2],
            threshold: vec![1.5, -2.0, 2.5, -2.0, -2.0],
            value: vec![
                vec![vec![10.0; 8]],
                vec![vec![0.0, 1.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
                vec![vec![1.0; 8]],
                vec![vec![7.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
                vec![vec![0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0, 0.0]],
            ],
        }
    }

    #[test]
    fn test_rebuilds_preorder_shape() {
        let node = two_split_export().to_node(8).unwrap();
        assert_eq!(
            node,
            Node::internal(
                3,
                1.5,
                Node::leaf(2, 8),
                Node::internal(7, 2.5, Node::leaf(0, 8), Node::leaf(5, 8)),
            )
        );
    }

    #[test]
    fn test_parses_json_export() {
        let text = r#"{
            "children_left": [-1], "children_right": [-1],
            "feature": [-2], "threshold": [-2.0],
            "value": [[[0, 0, 0, 12, 0, 0, 0, 0]]]
        }"#;
        let node = ArrayTree::from_json(text).unwrap().to_node(8).unwrap();
        assert_eq!(node, Node::leaf(3, 8));
    }

    #[test]
    fn test_rejects_single_child() {
        let mut tree = two_split_export();
        tree.children_right[2] = -1;
        let err = tree.to_node(8).unwrap_err();
        assert!(err.to_string().contains("exactly one child"), "{}", err);
    }

    #[test]
    fn test_rejects_cycles_and_dangling() {
        let mut tree = two_split_export();
        tree.children_left[2] = 0;
        assert!(tree.to_node(8).unwrap_err().to_string().contains("twice"));

        let mut tree = two_split_export();
        tree.children_right[0] = 42;
        assert!(tree.to_node(8).unwrap_err().to_string().contains("missing child"));
    }

    #[test]
    fn test_rejects_class_outside_circuit() {
        let err = two_split_export().to_node(4).unwrap_err();
        assert!(err.to_string().contains("class 5"), "{}", err);
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let mut tree = two_split_export();
        tree.threshold.pop();
        assert_eq!(tree.to_node(8).unwrap_err().kind(), "MalformedError");
    }

    /// Right-leaning chain: node `2k` splits into leaf `2k + 1` and node `2k + 2`.
    fn chain_export(splits: usize) -> ArrayTree {
        let n = 2 * splits + 1;
        let mut tree = ArrayTree {
            children_left: vec![-1; n],
            children_right: vec![-1; n],
            feature: vec![-2; n],
            threshold: vec![-2.0; n],
            value: vec![vec![vec![1.0, 0.0]]; n],
        };
        for k in 0..splits {
            let id = 2 * k;
            tree.children_left[id] = (id + 1) as i64;
            tree.children_right[id] = (id + 2) as i64;
            tree.feature[id] = 0;
            tree.threshold[id] = 10.0;
        }
        tree
    }

    #[test]
    fn test_deep_chain_is_an_error() {
        let err = chain_export(10_000).to_node(2).unwrap_err();
        assert_eq!(err.kind(), "StructureError");
        assert!(err.to_string().contains("deeper than 64 levels"), "{}", err);

        let node = chain_export(MAX_IMPORT_DEPTH).to_node(2).unwrap();
        assert_eq!(node.depth(), MAX_IMPORT_DEPTH);
    }
}

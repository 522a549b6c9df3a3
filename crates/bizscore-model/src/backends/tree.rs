use bizscore_core::FeatureVector;

use crate::artifact::{Aggregation, TreeEnsembleSpec, TreeSpec};
use crate::error::ModelError;
use crate::traits::RegressionModel;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(spec: &TreeSpec, n_features: usize, tree_idx: usize) -> Result<Self, ModelError> {
        let n = spec.children_left.len();
        let invalid = |msg: String| ModelError::InvalidArtifact(format!("tree {tree_idx}: {msg}"));

        if n == 0 {
            return Err(invalid("tree has no nodes".to_string()));
        }
        if [
            spec.children_right.len(),
            spec.feature.len(),
            spec.threshold.len(),
            spec.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(invalid("node arrays have different lengths".to_string()));
        }

        let rows = spec
            .children_left
            .iter()
            .zip(&spec.children_right)
            .zip(&spec.feature)
            .zip(&spec.threshold)
            .zip(&spec.value);

        let mut nodes = Vec::with_capacity(n);
        for (idx, ((((left, right), feature), threshold), value)) in rows.enumerate() {
            if *left == LEAF {
                if *right != LEAF {
                    return Err(invalid(format!("node {idx} has only one child")));
                }
                if !value.is_finite() {
                    return Err(invalid(format!("leaf {idx} has a non-finite value")));
                }
                nodes.push(Node::Leaf(*value));
                continue;
            }

            // Children are stored after their parent, which rules out cycles.
            let child = |raw: i64| {
                usize::try_from(raw)
                    .ok()
                    .filter(|c| *c > idx && *c < n)
                    .ok_or_else(|| invalid(format!("node {idx} has invalid child {raw}")))
            };
            let left = child(*left)?;
            let right = child(*right)?;
            let feature = usize::try_from(*feature)
                .ok()
                .filter(|f| *f < n_features)
                .ok_or_else(|| invalid(format!("node {idx} splits on invalid feature {feature}")))?;
            if threshold.is_nan() {
                return Err(invalid(format!("node {idx} has a NaN threshold")));
            }
            nodes.push(Node::Split {
                feature,
                threshold: *threshold,
                left,
                right,
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf(value)) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).copied().ok_or_else(|| {
                        ModelError::Inference(format!("feature {feature} missing from input"))
                    })?;
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Inference(format!("node {idx} out of range")));
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeEnsembleModel {
    trees: Vec<Tree>,
    aggregation: Aggregation,
    base_score: f64,
    learning_rate: f64,
    n_features: usize,
}

impl TreeEnsembleModel {
    pub fn new(spec: &TreeEnsembleSpec, n_features: usize) -> Result<Self, ModelError> {
        if spec.trees.is_empty() {
            return Err(ModelError::InvalidArtifact(
                "tree ensemble has no trees".to_string(),
            ));
        }
        if !spec.base_score.is_finite() || !spec.learning_rate.is_finite() {
            return Err(ModelError::InvalidArtifact(
                "tree ensemble has non-finite base_score or learning_rate".to_string(),
            ));
        }
        let trees = spec
            .trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| Tree::compile(tree, n_features, idx))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            aggregation: spec.aggregation,
            base_score: spec.base_score,
            learning_rate: spec.learning_rate,
            n_features,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl RegressionModel for TreeEnsembleModel {
    fn name(&self) -> &'static str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = features.as_slice();
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.leaf_value(x)?;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.trees.len() as f64;
        Ok(match self.aggregation {
            Aggregation::Mean => total / count,
            Aggregation::Sum => self.learning_rate.mul_add(total, self.base_score),
        })
    }
}

//! Random-forest heading model.
//!
//! The model is trained offline and exported as JSON:
//!
//! ```json
//! {
//!   "feature_names": ["font_size", "is_bold", "word_count", "size_diff_from_prev",
//!                     "starts_with_numbering", "y_position", "is_centered"],
//!   "classes": ["H1", "H2", "H3", "Title", "paragraph"],
//!   "trees": [
//!     {"nodes": [
//!       {"feature": 0, "threshold": 13.5, "left": 1, "right": 2},
//!       {"value": [0, 0, 0, 0, 40]},
//!       {"value": [12, 3, 0, 5, 1]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Split nodes send a row left when `row[feature] <= threshold`. Children
//! always follow their parent, which keeps every walk finite.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::LineLabel;
use crate::parser::{FeatureColumn, FeatureVector};

#[derive(Debug, Deserialize)]
struct ForestFile {
    feature_names: Vec<String>,
    classes: Vec<String>,
    trees: Vec<TreeFile>,
}

#[derive(Debug, Deserialize)]
struct TreeFile {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A validated decision tree.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Class distribution of the leaf `row` falls into, normalized.
    fn leaf_distribution(&self, row: &[f64]) -> Vec<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return if total > 0.0 {
                        value.iter().map(|v| v / total).collect()
                    } else {
                        value.clone()
                    };
                }
            }
        }
    }
}

/// A random-forest classifier over named feature columns.
#[derive(Debug, Clone)]
pub struct ForestModel {
    columns: Vec<FeatureColumn>,
    classes: Vec<LineLabel>,
    trees: Vec<Tree>,
}

impl ForestModel {
    /// Load a model file. A missing file is reported as
    /// [`Error::ModelNotFound`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ModelNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let model = Self::from_json(&data)?;
        log::info!(
            "Loaded heading model from {} ({} trees, {} features)",
            path.display(),
            model.trees.len(),
            model.columns.len()
        );
        Ok(model)
    }

    /// Parse and validate a model from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ForestFile =
            serde_json::from_str(json).map_err(|e| Error::InvalidModel(e.to_string()))?;

        let mut columns = Vec::with_capacity(file.feature_names.len());
        for name in &file.feature_names {
            let column: FeatureColumn = name.parse()?;
            if columns.contains(&column) {
                return Err(Error::SchemaMismatch(format!(
                    "feature column '{name}' listed twice"
                )));
            }
            columns.push(column);
        }
        if columns.is_empty() {
            return Err(Error::SchemaMismatch("model declares no features".into()));
        }

        let classes = file
            .classes
            .iter()
            .map(|c| c.parse::<LineLabel>())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::InvalidModel(e.to_string()))?;
        if classes.is_empty() {
            return Err(Error::InvalidModel("model declares no classes".into()));
        }
        if file.trees.is_empty() {
            return Err(Error::InvalidModel("model has no trees".into()));
        }

        let trees = file
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| validate_tree(i, tree, columns.len(), classes.len()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            classes,
            trees,
        })
    }

    /// Feature columns in the order the model consumes them.
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Class labels in output order.
    pub fn classes(&self) -> &[LineLabel] {
        &self.classes
    }

    /// Mean class probabilities over all trees.
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let row = features.row(&self.columns);
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.leaf_distribution(&row)) {
                *p += v;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Most probable label; the earlier class wins ties.
    pub fn predict(&self, features: &FeatureVector) -> LineLabel {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

fn validate_tree(index: usize, tree: TreeFile, n_features: usize, n_classes: usize) -> Result<Tree> {
    let invalid = |msg: String| Error::InvalidModel(format!("tree {index}: {msg}"));

    if tree.nodes.is_empty() {
        return Err(invalid("no nodes".into()));
    }
    for (i, node) in tree.nodes.iter().enumerate() {
        match node {
            Node::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= n_features {
                    return Err(invalid(format!("node {i} uses feature {feature}")));
                }
                for child in [*left, *right] {
                    if child <= i || child >= tree.nodes.len() {
                        return Err(invalid(format!("node {i} has bad child {child}")));
                    }
                }
            }
            Node::Leaf { value } => {
                if value.len() != n_classes {
                    return Err(invalid(format!(
                        "leaf {i} has {} values for {n_classes} classes",
                        value.len()
                    )));
                }
            }
        }
    }
    Ok(Tree { nodes: tree.nodes })
}

// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Fault classification

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{FaultSeverity, FeatureVector};
use crate::error::{EngineError, EngineResult};

/// A pre-trained decision function.
///
/// Implementations must be deterministic for a given input and report the
/// feature names they were trained on, in order.
pub trait FaultModel: Send + Sync {
    /// Expected feature names, in input order
    fn feature_names(&self) -> &[String];

    /// Class index for one feature row
    fn predict(&self, features: &[f64]) -> EngineResult<i64>;
}

/// Node of a flattened binary decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go left when `features[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

/// Decision tree artifact as exported from training, stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeModel {
    #[serde(default)]
    pub name: String,
    pub feature_names: Vec<String>,
    /// Node 0 is the root
    pub nodes: Vec<TreeNode>,
}

impl DecisionTreeModel {
    pub fn new(name: &str, feature_names: Vec<String>, nodes: Vec<TreeNode>) -> EngineResult<Self> {
        let model = Self {
            name: name.to_string(),
            feature_names,
            nodes,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a JSON artifact
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Model(format!("failed to read {:?}: {}", path, e)))?;
        let model: DecisionTreeModel = serde_json::from_str(&content)
            .map_err(|e| EngineError::Model(format!("failed to parse {:?}: {}", path, e)))?;
        model.validate()?;
        info!(
            "Loaded model '{}' from {:?} ({} nodes, {} features)",
            model.name,
            path,
            model.nodes.len(),
            model.feature_names.len()
        );
        Ok(model)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.nodes.is_empty() {
            return Err(EngineError::Model("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, left, right, threshold } => {
                    if *feature >= self.feature_names.len() {
                        return Err(EngineError::Model(format!(
                            "node {} splits on feature {} but only {} features exist",
                            i,
                            feature,
                            self.feature_names.len()
                        )));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(EngineError::Model(format!("node {} has a child out of range", i)));
                    }
                    if !threshold.is_finite() {
                        return Err(EngineError::Model(format!("node {} has a non-finite threshold", i)));
                    }
                }
                TreeNode::Leaf { class } => {
                    FaultSeverity::try_from(*class)?;
                }
            }
        }
        Ok(())
    }
}

impl FaultModel for DecisionTreeModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &[f64]) -> EngineResult<i64> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return Ok(*class),
                TreeNode::Split { feature, threshold, left, right } => {
                    let value = features.get(*feature).ok_or_else(|| {
                        EngineError::Model(format!("input has no feature {}", feature))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
            }
        }
        Err(EngineError::Model("tree traversal did not reach a leaf".into()))
    }
}

/// Maps feature vectors to severities through a loaded model
pub struct FaultClassifier {
    model: Box<dyn FaultModel>,
}

impl FaultClassifier {
    /// Wrap a model, rejecting it up front if its schema is not ours
    pub fn new(model: Box<dyn FaultModel>) -> EngineResult<Self> {
        let classifier = Self { model };
        classifier.check_schema(&super::FEATURE_NAMES)?;
        Ok(classifier)
    }

    /// Load a decision tree artifact from disk
    pub fn from_path(path: &Path) -> EngineResult<Self> {
        Self::new(Box::new(DecisionTreeModel::load(path)?))
    }

    pub fn model(&self) -> &dyn FaultModel {
        self.model.as_ref()
    }

    /// Classify one complete feature vector
    pub fn classify(&self, vector: &FeatureVector) -> EngineResult<FaultSeverity> {
        self.check_schema(vector.names())?;
        vector.validate_mode_encoding()?;

        let class = self.model.predict(vector.values())?;
        let severity = FaultSeverity::try_from(class)?;
        debug!("Classified {:?} as {}", vector.values(), severity);
        Ok(severity)
    }

    fn check_schema(&self, names: &[&str]) -> EngineResult<()> {
        let expected = self.model.feature_names();
        let matches = expected.len() == names.len()
            && expected.iter().zip(names).all(|(a, b)| a == b);

        if matches {
            Ok(())
        } else {
            Err(EngineError::SchemaMismatch {
                expected: expected.to_vec(),
                found: names.iter().map(|s| s.to_string()).collect(),
            })
        }
    }
}

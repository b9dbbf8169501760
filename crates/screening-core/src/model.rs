use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ScreeningError};
use crate::util::{clamp01, sigmoid};

/// Inference entrypoint of a fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Row width the model was fitted on.
    fn n_features(&self) -> usize;

    /// `[P(class 0), P(class 1)]` per row.
    fn predict_proba(&self, rows: &[&[f64]]) -> Result<Vec<[f64; 2]>, ScreeningError>;
}

/// Exported classifier artifact (`depression_gbc.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    GradientBoosting(GradientBoosting),
    Logistic(LogisticModel),
}

impl Model {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Model::GradientBoosting(m) => m.validate(),
            Model::Logistic(m) => m.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Model::GradientBoosting(_) => "gradient_boosting",
            Model::Logistic(_) => "logistic",
        }
    }
}

impl Classifier for Model {
    fn n_features(&self) -> usize {
        match self {
            Model::GradientBoosting(m) => m.n_features(),
            Model::Logistic(m) => m.n_features(),
        }
    }

    fn predict_proba(&self, rows: &[&[f64]]) -> Result<Vec<[f64; 2]>, ScreeningError> {
        match self {
            Model::GradientBoosting(m) => m.predict_proba(rows),
            Model::Logistic(m) => m.predict_proba(rows),
        }
    }
}

fn check_width(expected: usize, row: &[f64]) -> Result<(), ScreeningError> {
    if row.len() != expected {
        return Err(ScreeningError::ShapeMismatch {
            expected,
            got: row.len(),
        });
    }
    Ok(())
}

#[inline]
fn proba_pair(raw: f64) -> [f64; 2] {
    let p1 = clamp01(sigmoid(raw));
    [1.0 - p1, p1]
}

/// Binary-deviance boosted trees: `P1 = sigmoid(init_raw + learning_rate * Σ leaf)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub n_features: usize,
    pub learning_rate: f64,
    pub init_raw: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    /// Root is `nodes[0]`; children always sit after their parent.
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    /// Goes left on `x <= threshold`. NaN goes right.
    fn eval(&self, row: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn validate(&self, t: usize, n_features: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::InvalidModel(format!("tree {t} has no nodes")));
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ArtifactError::InvalidModel(format!(
                            "tree {t} node {i}: non-finite leaf value"
                        )));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ArtifactError::InvalidModel(format!(
                            "tree {t} node {i}: feature {feature} >= n_features {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ArtifactError::InvalidModel(format!(
                            "tree {t} node {i}: NaN threshold"
                        )));
                    }
                    // forward-only children guarantee eval terminates
                    for child in [left, right] {
                        if child <= i || child >= n {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {t} node {i}: child {child} out of order (nodes={n})"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl GradientBoosting {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 {
            return Err(ArtifactError::InvalidModel("n_features is 0".into()));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("ensemble has no trees".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ArtifactError::InvalidModel(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !self.init_raw.is_finite() {
            return Err(ArtifactError::InvalidModel("init_raw is not finite".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(t, self.n_features)?;
        }
        Ok(())
    }

    pub fn raw_score(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.eval(row)).sum();
        self.init_raw + self.learning_rate * sum
    }
}

impl Classifier for GradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, rows: &[&[f64]]) -> Result<Vec<[f64; 2]>, ScreeningError> {
        rows.iter()
            .map(|row| {
                check_width(self.n_features, row)?;
                Ok(proba_pair(self.raw_score(row)))
            })
            .collect()
    }
}

/// `P1 = sigmoid(intercept + coefficients · x)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::InvalidModel("no coefficients".into()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::InvalidModel("non-finite weight".into()));
        }
        Ok(())
    }

    pub fn raw_score(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, rows: &[&[f64]]) -> Result<Vec<[f64; 2]>, ScreeningError> {
        rows.iter()
            .map(|row| {
                check_width(self.coefficients.len(), row)?;
                Ok(proba_pair(self.raw_score(row)))
            })
            .collect()
    }
}

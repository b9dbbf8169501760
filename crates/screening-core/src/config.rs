use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration. The server overrides fields from CLI/env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen address
    pub bind: String,

    /// Directory holding the artifacts (or their `artifact_subdir`)
    pub artifact_dir: PathBuf,

    /// Fallback directory under `artifact_dir`, checked second
    pub artifact_subdir: String,

    pub model_file: String,
    pub schema_file: String,

    /// Optional (field, category) -> column mapping, looked up next to the schema
    pub mapping_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            artifact_dir: PathBuf::from("."),
            artifact_subdir: "model_artifacts".to_string(),
            model_file: "depression_gbc.json".to_string(),
            schema_file: "feature_columns.json".to_string(),
            mapping_file: "feature_mapping.json".to_string(),
        }
    }
}

impl Config {
    pub fn with_artifact_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.artifact_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Candidate paths for `file`, in lookup order.
    pub fn candidates(&self, file: &str) -> [PathBuf; 2] {
        [
            self.artifact_dir.join(file),
            self.artifact_dir.join(&self.artifact_subdir).join(file),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_check_base_then_subdir() {
        let cfg = Config::default().with_artifact_dir("/srv/app");
        let [first, second] = cfg.candidates("depression_gbc.json");
        assert_eq!(first, PathBuf::from("/srv/app/depression_gbc.json"));
        assert_eq!(
            second,
            PathBuf::from("/srv/app/model_artifacts/depression_gbc.json")
        );
    }
}

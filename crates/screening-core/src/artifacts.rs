use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ArtifactError;
use crate::features::{ColumnIndex, FeatureMapping, FeatureSchema, ONE_HOT_SEPARATOR};
use crate::model::{Classifier, Model};
use crate::schema::field;

/// First candidate that exists on disk.
pub fn resolve(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let s = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&s).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_model(path: &Path) -> Result<Model, ArtifactError> {
    let model: Model = read_json(path)?;
    model.validate()?;
    Ok(model)
}

fn load_schema(path: &Path) -> Result<FeatureSchema, ArtifactError> {
    let columns: Vec<String> = read_json(path)?;
    FeatureSchema::new(columns)
}

/// Mapping file is optional; it lives in the same directory as the schema.
fn load_mapping(
    schema_path: &Path,
    file: &str,
) -> Result<Option<(PathBuf, FeatureMapping)>, ArtifactError> {
    let dir = schema_path.parent().unwrap_or_else(|| Path::new("."));
    let p = dir.join(file);
    if !p.is_file() {
        return Ok(None);
    }
    let mapping: FeatureMapping = read_json(&p)?;
    Ok(Some((p, mapping)))
}

/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct Artifacts {
    pub model_path: PathBuf,
    pub schema_path: PathBuf,
    pub mapping_path: Option<PathBuf>,
    pub model: Model,
    pub schema: FeatureSchema,
    pub index: ColumnIndex,
}

impl Artifacts {
    pub fn load(cfg: &Config) -> Result<Self, ArtifactError> {
        let model_candidates = cfg.candidates(&cfg.model_file);
        let schema_candidates = cfg.candidates(&cfg.schema_file);

        // both must resolve before anything is parsed; model is reported first
        let model_path = resolve(&model_candidates).ok_or_else(|| ArtifactError::ModelNotFound {
            file: cfg.model_file.clone(),
            searched: model_candidates.to_vec(),
        })?;
        let schema_path =
            resolve(&schema_candidates).ok_or_else(|| ArtifactError::SchemaNotFound {
                file: cfg.schema_file.clone(),
                searched: schema_candidates.to_vec(),
            })?;

        tracing::info!(path = %model_path.display(), "model artifact resolved");
        tracing::info!(path = %schema_path.display(), "feature schema resolved");

        let model = load_model(&model_path)?;
        let schema = load_schema(&schema_path)?;

        let (mapping_path, index) = match load_mapping(&schema_path, &cfg.mapping_file)? {
            Some((p, mapping)) => {
                tracing::info!(path = %p.display(), "feature mapping loaded");
                (Some(p), ColumnIndex::from_mapping(&schema, &mapping)?)
            }
            None => {
                let index = ColumnIndex::derive(
                    &schema,
                    &field::CONTINUOUS,
                    &field::CATEGORICAL,
                    ONE_HOT_SEPARATOR,
                );
                (None, index)
            }
        };

        if model.n_features() != schema.len() {
            tracing::warn!(
                model_features = model.n_features(),
                schema_columns = schema.len(),
                "model width differs from feature schema; every prediction will fail"
            );
        }

        tracing::info!(
            kind = model.kind(),
            columns = schema.len(),
            explicit_mapping = mapping_path.is_some(),
            "artifacts loaded"
        );

        Ok(Self {
            model_path,
            schema_path,
            mapping_path,
            model,
            schema,
            index,
        })
    }
}

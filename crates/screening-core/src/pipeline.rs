use std::time::Instant;
use uuid::Uuid;

use crate::{
    artifacts::Artifacts,
    config::Config,
    error::{ArtifactError, ScreeningError},
    features::{AlignedVector, Alignment, ColumnIndex, FeatureSchema},
    model::Classifier,
    schema::{PredictResponse, RiskLevel, StudentProfile, TimingsUs},
    util::{format_percent, now_us},
};

/// Everything a request needs, built once at startup and never mutated.
pub struct ScreeningCore {
    schema: FeatureSchema,
    index: ColumnIndex,
    model: Box<dyn Classifier>,
}

impl std::fmt::Debug for ScreeningCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreeningCore")
            .field("columns", &self.schema.len())
            .field("model_features", &self.model.n_features())
            .finish()
    }
}

impl ScreeningCore {
    pub fn new(schema: FeatureSchema, index: ColumnIndex, model: Box<dyn Classifier>) -> Self {
        Self {
            schema,
            index,
            model,
        }
    }

    pub fn from_artifacts(a: Artifacts) -> Self {
        Self::new(a.schema, a.index, Box::new(a.model))
    }

    pub fn load(cfg: &Config) -> Result<Self, ArtifactError> {
        Artifacts::load(cfg).map(Self::from_artifacts)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Validate, then align to the schema.
    pub fn encode(&self, profile: &StudentProfile) -> Result<Alignment, ScreeningError> {
        profile.validate()?;
        self.index.align(&profile.to_raw_record())
    }

    /// P(class 1) for one aligned row.
    pub fn predict(&self, row: &AlignedVector) -> Result<f64, ScreeningError> {
        let out = self.model.predict_proba(&[row.values()])?;
        out.first()
            .map(|p| p[1])
            .ok_or_else(|| ScreeningError::Model("predict_proba returned no rows".into()))
    }

    /// One form submission end to end. Any error fails the whole request.
    pub fn assess(&self, profile: &StudentProfile) -> Result<PredictResponse, ScreeningError> {
        let t0 = Instant::now();
        let trace_id = Uuid::new_v4();
        let mut timings = TimingsUs::default();

        let result = self.assess_inner(profile, &mut timings);
        timings.total = now_us(t0);
        metrics::histogram!("e2e_us").record(timings.total as f64);

        let probability = match result {
            Ok(p) => p,
            Err(e) => {
                metrics::counter!("predict_error_total").increment(1);
                tracing::warn!(%trace_id, error = %e, "prediction failed");
                return Err(e);
            }
        };

        let risk = RiskLevel::from_probability(probability);
        metrics::counter!("predict_total", "label" => risk.label().to_string()).increment(1);
        tracing::debug!(%trace_id, probability, label = risk.label(), "prediction");

        Ok(PredictResponse {
            trace_id,
            probability,
            label: risk.label(),
            risk_level: risk,
            percent: format_percent(probability),
            message: risk.message().to_string(),
            timings_us: timings,
        })
    }

    fn assess_inner(
        &self,
        profile: &StudentProfile,
        timings: &mut TimingsUs,
    ) -> Result<f64, ScreeningError> {
        let t_feat = Instant::now();
        let aligned = self.encode(profile)?;
        timings.feature = now_us(t_feat);
        metrics::histogram!("stage_feature_us").record(timings.feature as f64);

        if !aligned.ignored.is_empty() {
            metrics::counter!("align_unknown_category_total").increment(aligned.ignored.len() as u64);
            tracing::debug!(fields = ?aligned.ignored, "values without a schema column");
        }

        let t_model = Instant::now();
        let p = self.predict(&aligned.vector)?;
        timings.model = now_us(t_model);
        metrics::histogram!("stage_model_us").record(timings.model as f64);

        Ok(p)
    }
}

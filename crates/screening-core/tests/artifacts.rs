use screening_core::{
    artifacts::Artifacts,
    config::Config,
    error::ArtifactError,
    model::Classifier,
    pipeline::ScreeningCore,
    schema::{CityRegion, RiskLevel, SleepDuration, StudentProfile, YesNo},
    util::sigmoid,
};
use std::fs;
use std::path::{Path, PathBuf};

fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn example_profile() -> StudentProfile {
    StudentProfile {
        city_region: CityRegion::North,
        sleep_duration: SleepDuration::SevenToEight,
        ..StudentProfile::default()
    }
}

const SCHEMA: &str = r#"["Age","Gender_Female","Gender_Male"]"#;
const MODEL: &str = r#"{"kind":"logistic","intercept":0.0,"coefficients":[0.1,1.0,-1.0]}"#;

#[test]
fn demo_artifacts_resolve_from_subdir() {
    let cfg = Config::default().with_artifact_dir(demo_dir());
    let art = Artifacts::load(&cfg).unwrap();

    assert!(art.model_path.ends_with("model_artifacts/depression_gbc.json"));
    assert!(art.schema_path.ends_with("model_artifacts/feature_columns.json"));
    assert!(art.mapping_path.is_none());
    assert_eq!(art.schema.len(), 29);
    assert_eq!(art.model.n_features(), art.schema.len());
}

#[test]
fn demo_example_record() {
    let cfg = Config::default().with_artifact_dir(demo_dir());
    let art = Artifacts::load(&cfg).unwrap();

    let a = art.index.align(&example_profile().to_raw_record()).unwrap();
    assert!(a.ignored.is_empty());
    let v = &a.vector;
    let s = &art.schema;
    assert_eq!(v.get(s, "Age"), Some(22.0));
    assert_eq!(v.get(s, "Financial Stress"), Some(5.0));
    assert_eq!(v.get(s, "Gender_Male"), Some(1.0));
    assert_eq!(v.get(s, "Gender_Female"), Some(0.0));
    assert_eq!(v.get(s, "Sleep Duration_Others"), Some(0.0));
    assert_eq!(v.get(s, "Dietary Habits_Others"), Some(0.0));
    assert_eq!(v.get(s, "City_Region_North India"), Some(1.0));
    assert_eq!(v.get(s, "City_Region_Central India"), Some(0.0));

    // leaves: -1.6 + 1.0 + 0.6 - 0.5 - 0.2 - 0.15 - 0.3 - 0.3 - 0.1
    let core = ScreeningCore::from_artifacts(art);
    let r = core.assess(&example_profile()).unwrap();
    let expected = sigmoid(0.35 + 0.5 * -1.55);
    assert!((r.probability - expected).abs() < 1e-9);
    assert_eq!(r.risk_level, RiskLevel::Lower);
    assert_eq!(r.percent, "39.53%");

    let r = core
        .assess(&StudentProfile {
            suicidal_thoughts: YesNo::Yes,
            ..example_profile()
        })
        .unwrap();
    assert_eq!(r.risk_level, RiskLevel::Higher);
    assert_eq!(r.label, 1);
}

#[test]
fn base_dir_wins_over_subdir() {
    let tmp = tempfile::tempdir().unwrap();
    let sub = tmp.path().join("model_artifacts");
    fs::create_dir(&sub).unwrap();
    fs::write(tmp.path().join("depression_gbc.json"), MODEL).unwrap();
    fs::write(sub.join("depression_gbc.json"), "not json").unwrap();
    fs::write(sub.join("feature_columns.json"), SCHEMA).unwrap();

    let art = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap();
    assert_eq!(art.model_path, tmp.path().join("depression_gbc.json"));
    assert_eq!(art.schema_path, sub.join("feature_columns.json"));
}

#[test]
fn missing_schema_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("depression_gbc.json"), MODEL).unwrap();

    let err = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::SchemaNotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Feature columns file not found. Upload feature_columns.json in the app folder or model_artifacts/."
    );
}

#[test]
fn malformed_artifacts_fail_at_startup() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("feature_columns.json"), SCHEMA).unwrap();
    fs::write(tmp.path().join("depression_gbc.json"), r#"{"kind":"logistic""#).unwrap();
    let err = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::Parse { .. }));

    fs::write(
        tmp.path().join("depression_gbc.json"),
        r#"{"kind":"logistic","intercept":0.0,"coefficients":[]}"#,
    )
    .unwrap();
    let err = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidModel(_)));

    fs::write(tmp.path().join("depression_gbc.json"), MODEL).unwrap();
    fs::write(tmp.path().join("feature_columns.json"), r#"["Age","Age"]"#).unwrap();
    let err = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidSchema(_)));
}

#[test]
fn mapping_file_next_to_schema_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("depression_gbc.json"), MODEL).unwrap();
    fs::write(tmp.path().join("feature_columns.json"), r#"["age","sex=F","sex=M"]"#).unwrap();
    fs::write(
        tmp.path().join("feature_mapping.json"),
        r#"{"continuous":["Age"],"categorical":{"Gender":{"Female":"sex=F","Male":"sex=M"}}}"#,
    )
    .unwrap();

    // "Age" is the record key but the schema calls it "age": mapping must name schema columns
    let err = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidMapping(_)));

    fs::write(
        tmp.path().join("feature_mapping.json"),
        r#"{"categorical":{"Gender":{"Female":"sex=F","Male":"sex=M"}}}"#,
    )
    .unwrap();
    let art = Artifacts::load(&Config::default().with_artifact_dir(tmp.path())).unwrap();
    assert!(art.mapping_path.is_some());

    let a = art.index.align(&StudentProfile::default().to_raw_record()).unwrap();
    // Age has no column under this mapping
    assert_eq!(a.vector.values(), &[0.0, 0.0, 1.0]);
}

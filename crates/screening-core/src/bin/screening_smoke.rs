use anyhow::Context;
use screening_core::{
    artifacts::Artifacts,
    config::Config,
    model::Classifier,
    schema::{
        CityRegion, DietaryHabits, EducationLevel, Gender, RiskLevel, SleepDuration,
        StudentProfile, YesNo,
    },
    util::format_percent,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // 1) artifact dir: first arg, default cwd
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let cfg = Config::default().with_artifact_dir(&dir);

    // 2) load model + schema (same resolution as the server)
    let art = Artifacts::load(&cfg)
        .with_context(|| format!("load artifacts from {}", dir.display()))?;
    println!("model={}", art.model_path.display());
    println!("schema={} columns={}", art.schema_path.display(), art.schema.len());

    // 3) a typical record
    let profile = StudentProfile {
        age: 22,
        gender: Gender::Male,
        city_region: CityRegion::North,
        education_level: EducationLevel::Undergraduate,
        academic_pressure: 5.0,
        cgpa: 7.0,
        study_satisfaction: 5.0,
        work_study_hours: 6.0,
        financial_stress: 5.0,
        sleep_duration: SleepDuration::SevenToEight,
        dietary_habits: DietaryHabits::Healthy,
        suicidal_thoughts: YesNo::No,
        family_history: YesNo::No,
    };
    profile.validate()?;

    // 4) align + predict
    let aligned = art.index.align(&profile.to_raw_record())?;
    println!("row_len={}", aligned.vector.len());
    if !aligned.ignored.is_empty() {
        println!("ignored={:?}", aligned.ignored);
    }
    println!("non-zero columns:");
    for (name, v) in aligned.vector.non_zero(&art.schema) {
        println!("  {:<48} {:>8.3}", name, v);
    }

    let proba = art.model.predict_proba(&[aligned.vector.values()])?;
    let p = proba.first().map(|r| r[1]).context("model returned no rows")?;
    let risk = RiskLevel::from_probability(p);
    println!("pred_proba={} ({}) label={}", p, format_percent(p), risk.label());
    println!("{}", risk.message());

    Ok(())
}

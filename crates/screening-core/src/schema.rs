// crates/screening-core/src/schema.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScreeningError;
use crate::features::RawRecord;

/// Probability at or above which a record is labelled higher risk.
pub const RISK_THRESHOLD: f64 = 0.5;

/// Column names of the training data, used as RawRecord keys.
pub mod field {
    pub const AGE: &str = "Age";
    pub const ACADEMIC_PRESSURE: &str = "Academic Pressure";
    pub const CGPA: &str = "CGPA";
    pub const STUDY_SATISFACTION: &str = "Study Satisfaction";
    pub const WORK_STUDY_HOURS: &str = "Work/Study Hours";
    pub const FINANCIAL_STRESS: &str = "Financial Stress";

    pub const GENDER: &str = "Gender";
    pub const SLEEP_DURATION: &str = "Sleep Duration";
    pub const DIETARY_HABITS: &str = "Dietary Habits";
    pub const SUICIDAL_THOUGHTS: &str = "Have you ever had suicidal thoughts ?";
    pub const FAMILY_HISTORY: &str = "Family History of Mental Illness";
    pub const DEGREE: &str = "New_Degree";
    pub const CITY_REGION: &str = "City_Region";

    pub const CONTINUOUS: [&str; 6] = [
        AGE,
        ACADEMIC_PRESSURE,
        CGPA,
        STUDY_SATISFACTION,
        WORK_STUDY_HOURS,
        FINANCIAL_STRESS,
    ];

    pub const CATEGORICAL: [&str; 7] = [
        GENDER,
        SLEEP_DURATION,
        DIETARY_HABITS,
        SUICIDAL_THOUGHTS,
        FAMILY_HISTORY,
        DEGREE,
        CITY_REGION,
    ];
}

/// Declares a form option set. The serde name is the exact option text,
/// which is also the category value the model was trained on.
macro_rules! category {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

category!(Gender {
    Male => "Male",
    Female => "Female",
});

category!(CityRegion {
    Central => "Central India",
    East => "East India",
    North => "North India",
    South => "South India",
    West => "West India",
});

category!(EducationLevel {
    Undergraduate => "Undergraduate",
    PostGraduate => "Post Graduate",
    Professional => "Professional",
});

category!(SleepDuration {
    LessThan5 => "Less than 5 hours",
    FiveToSix => "5-6 hours",
    SevenToEight => "7-8 hours",
    MoreThan8 => "More than 8 hours",
});

category!(DietaryHabits {
    Healthy => "Healthy",
    Moderate => "Moderate",
    Unhealthy => "Unhealthy",
});

category!(
    /// Used for both the suicidal-thoughts and family-history questions.
    YesNo {
        No => "No",
        Yes => "Yes",
    }
);

/// Inclusive bounds of a numeric form input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    const fn new(label: &'static str, min: f64, max: f64) -> Self {
        Self { label, min, max }
    }

    fn check(&self, value: f64) -> Result<(), ScreeningError> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(ScreeningError::OutOfRange {
                field: self.label,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const AGE_BOUNDS: Bounds = Bounds::new("Age", 18.0, 35.0);
pub const ACADEMIC_PRESSURE_BOUNDS: Bounds = Bounds::new("Academic Pressure", 0.0, 10.0);
pub const CGPA_BOUNDS: Bounds = Bounds::new("CGPA", 0.0, 10.0);
pub const STUDY_SATISFACTION_BOUNDS: Bounds = Bounds::new("Study Satisfaction", 0.0, 10.0);
pub const WORK_STUDY_HOURS_BOUNDS: Bounds = Bounds::new("Work/Study Hours", 0.0, 24.0);
pub const FINANCIAL_STRESS_BOUNDS: Bounds = Bounds::new("Financial Stress", 0.0, 10.0);

/// One form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub age: u32,
    pub gender: Gender,
    pub city_region: CityRegion,
    pub education_level: EducationLevel,

    pub academic_pressure: f64,
    pub cgpa: f64,
    pub study_satisfaction: f64,
    pub work_study_hours: f64,
    pub financial_stress: f64,
    pub sleep_duration: SleepDuration,
    pub dietary_habits: DietaryHabits,

    pub suicidal_thoughts: YesNo,
    pub family_history: YesNo,
}

impl Default for StudentProfile {
    /// Initial form values.
    fn default() -> Self {
        Self {
            age: 22,
            gender: Gender::default(),
            city_region: CityRegion::default(),
            education_level: EducationLevel::default(),
            academic_pressure: 5.0,
            cgpa: 7.0,
            study_satisfaction: 5.0,
            work_study_hours: 6.0,
            financial_stress: 5.0,
            sleep_duration: SleepDuration::default(),
            dietary_habits: DietaryHabits::default(),
            suicidal_thoughts: YesNo::default(),
            family_history: YesNo::default(),
        }
    }
}

impl StudentProfile {
    pub fn validate(&self) -> Result<(), ScreeningError> {
        AGE_BOUNDS.check(self.age as f64)?;
        ACADEMIC_PRESSURE_BOUNDS.check(self.academic_pressure)?;
        CGPA_BOUNDS.check(self.cgpa)?;
        STUDY_SATISFACTION_BOUNDS.check(self.study_satisfaction)?;
        WORK_STUDY_HOURS_BOUNDS.check(self.work_study_hours)?;
        FINANCIAL_STRESS_BOUNDS.check(self.financial_stress)?;
        Ok(())
    }

    /// Keys are the training column names, see [`field`].
    pub fn to_raw_record(&self) -> RawRecord {
        RawRecord::new()
            .with_number(field::AGE, self.age as f64)
            .with_number(field::ACADEMIC_PRESSURE, self.academic_pressure)
            .with_number(field::CGPA, self.cgpa)
            .with_number(field::STUDY_SATISFACTION, self.study_satisfaction)
            .with_number(field::WORK_STUDY_HOURS, self.work_study_hours)
            .with_number(field::FINANCIAL_STRESS, self.financial_stress)
            .with_category(field::GENDER, self.gender.as_str())
            .with_category(field::SLEEP_DURATION, self.sleep_duration.as_str())
            .with_category(field::DIETARY_HABITS, self.dietary_habits.as_str())
            .with_category(field::SUICIDAL_THOUGHTS, self.suicidal_thoughts.as_str())
            .with_category(field::FAMILY_HISTORY, self.family_history.as_str())
            .with_category(field::DEGREE, self.education_level.as_str())
            .with_category(field::CITY_REGION, self.city_region.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Lower,
    Higher,
}

impl RiskLevel {
    /// Exactly 0.5 is higher risk.
    pub fn from_probability(p: f64) -> Self {
        if p >= RISK_THRESHOLD {
            RiskLevel::Higher
        } else {
            RiskLevel::Lower
        }
    }

    pub fn label(self) -> u8 {
        match self {
            RiskLevel::Lower => 0,
            RiskLevel::Higher => 1,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskLevel::Higher => {
                "Higher risk detected. Consider reaching out to a counselor or support services."
            }
            RiskLevel::Lower => "Lower risk detected based on the provided inputs.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub trace_id: Uuid,
    /// P(class 1)
    pub probability: f64,
    pub label: u8,
    pub risk_level: RiskLevel,
    /// `probability` as a percentage with two decimals
    pub percent: String,
    pub message: String,
    /// Stage timings (microseconds)
    pub timings_us: TimingsUs,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingsUs {
    pub feature: u64,
    pub model: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FieldValue;

    #[test]
    fn test_threshold_boundary_is_higher() {
        assert_eq!(RiskLevel::from_probability(0.5), RiskLevel::Higher);
        assert_eq!(RiskLevel::from_probability(0.4999999), RiskLevel::Lower);
        assert_eq!(RiskLevel::from_probability(1.0).label(), 1);
        assert_eq!(RiskLevel::from_probability(0.0).label(), 0);
    }

    #[test]
    fn test_default_profile_is_valid() {
        let p = StudentProfile::default();
        assert_eq!(p.age, 22);
        assert_eq!(p.gender, Gender::Male);
        assert_eq!(p.city_region, CityRegion::Central);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_names_field() {
        let p = StudentProfile {
            work_study_hours: 25.0,
            ..StudentProfile::default()
        };
        let err = p.validate().unwrap_err();
        assert!(err.to_string().starts_with("Work/Study Hours must be between 0 and 24"));

        let p = StudentProfile {
            age: 17,
            ..StudentProfile::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ScreeningError::OutOfRange { field: "Age", .. })
        ));

        let p = StudentProfile {
            cgpa: f64::NAN,
            ..StudentProfile::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_raw_record_uses_training_column_names() {
        let p = StudentProfile {
            education_level: EducationLevel::PostGraduate,
            suicidal_thoughts: YesNo::Yes,
            ..StudentProfile::default()
        };
        let r = p.to_raw_record();
        assert_eq!(r.len(), 13);
        assert_eq!(r.get("Age"), Some(&FieldValue::Number(22.0)));
        assert_eq!(
            r.get("New_Degree"),
            Some(&FieldValue::Category("Post Graduate".into()))
        );
        assert_eq!(
            r.get("Have you ever had suicidal thoughts ?"),
            Some(&FieldValue::Category("Yes".into()))
        );
    }

    #[test]
    fn test_profile_json_uses_option_text() {
        let v = serde_json::to_value(StudentProfile::default()).unwrap();
        assert_eq!(v["sleep_duration"], "Less than 5 hours");
        assert_eq!(v["city_region"], "Central India");

        let p: StudentProfile = serde_json::from_value(serde_json::json!({
            "age": 30,
            "gender": "Female",
            "city_region": "South India",
            "education_level": "Professional",
            "academic_pressure": 3.5,
            "cgpa": 8.1,
            "study_satisfaction": 2.0,
            "work_study_hours": 10.0,
            "financial_stress": 9.0,
            "sleep_duration": "5-6 hours",
            "dietary_habits": "Unhealthy",
            "suicidal_thoughts": "No",
            "family_history": "Yes"
        }))
        .unwrap();
        assert_eq!(p.sleep_duration, SleepDuration::FiveToSix);
        assert_eq!(p.family_history, YesNo::Yes);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let r: Result<Gender, _> = serde_json::from_str("\"Other\"");
        assert!(r.is_err());
    }
}

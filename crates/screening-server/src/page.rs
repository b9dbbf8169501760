//! Server-rendered HTML for the screening form.

use screening_core::schema::{
    Bounds, CityRegion, DietaryHabits, EducationLevel, Gender, PredictResponse, RiskLevel,
    SleepDuration, StudentProfile, YesNo, ACADEMIC_PRESSURE_BOUNDS, AGE_BOUNDS, CGPA_BOUNDS,
    FINANCIAL_STRESS_BOUNDS, STUDY_SATISFACTION_BOUNDS, WORK_STUDY_HOURS_BOUNDS,
};
use std::fmt::Write;

pub enum Outcome<'a> {
    Prediction(&'a PredictResponse),
    Error(String),
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:720px;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:.6rem 0 .2rem}input,select{width:100%;padding:.3rem}\
.warning{background:#fff4e5;border-left:4px solid #f0a020;padding:.8rem}\
.success{background:#e9f7ef;border-left:4px solid #2e9e5b;padding:.8rem}\
.error{background:#fdecea;border-left:4px solid #d93025;padding:.8rem}\
button{margin-top:1rem;padding:.5rem 1.2rem}";

fn open(out: &mut String) {
    out.push_str("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    out.push_str("<title>Student Depression Risk</title>");
    let _ = write!(out, "<style>{STYLE}</style></head><body>");
    out.push_str("<h1>Student Depression Risk Screening</h1>");
}

fn close(out: &mut String) {
    out.push_str("</body></html>");
}

fn number(out: &mut String, name: &str, caption: &str, b: Bounds, step: &str, value: f64) {
    let _ = write!(
        out,
        "<label for=\"{name}\">{}</label>\
         <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{}\" max=\"{}\" step=\"{step}\" value=\"{value}\" required>",
        escape(caption),
        b.min,
        b.max,
    );
}

fn select<T: Copy + PartialEq + std::fmt::Display>(
    out: &mut String,
    name: &str,
    caption: &str,
    options: &[T],
    selected: T,
) {
    let _ = write!(
        out,
        "<label for=\"{name}\">{}</label><select id=\"{name}\" name=\"{name}\">",
        escape(caption)
    );
    for opt in options {
        let text = escape(&opt.to_string());
        let sel = if *opt == selected { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{text}\"{sel}>{text}</option>");
    }
    out.push_str("</select>");
}

fn form(out: &mut String, p: &StudentProfile) {
    out.push_str("<form method=\"post\" action=\"/predict\">");

    out.push_str("<h2>Student Profile</h2>");
    number(out, "age", "Age", AGE_BOUNDS, "1", p.age as f64);
    select(out, "gender", "Gender", Gender::ALL, p.gender);
    select(out, "city_region", "City Region", CityRegion::ALL, p.city_region);
    select(out, "education_level", "Education Level", EducationLevel::ALL, p.education_level);

    out.push_str("<h2>Academic &amp; Lifestyle</h2>");
    number(
        out,
        "academic_pressure",
        "Academic Pressure (0 = None, 10 = Extreme)",
        ACADEMIC_PRESSURE_BOUNDS,
        "0.1",
        p.academic_pressure,
    );
    number(out, "cgpa", "CGPA (0.0 to 10.0)", CGPA_BOUNDS, "0.01", p.cgpa);
    number(
        out,
        "study_satisfaction",
        "Study Satisfaction (0 = Low, 10 = High)",
        STUDY_SATISFACTION_BOUNDS,
        "0.1",
        p.study_satisfaction,
    );
    number(
        out,
        "work_study_hours",
        "Work/Study Hours per Day",
        WORK_STUDY_HOURS_BOUNDS,
        "0.1",
        p.work_study_hours,
    );
    number(
        out,
        "financial_stress",
        "Financial Stress (0 = None, 10 = Extreme)",
        FINANCIAL_STRESS_BOUNDS,
        "0.1",
        p.financial_stress,
    );
    select(out, "sleep_duration", "Sleep Duration", SleepDuration::ALL, p.sleep_duration);
    select(out, "dietary_habits", "Dietary Habits", DietaryHabits::ALL, p.dietary_habits);

    out.push_str("<h2>Mental Health Indicators</h2>");
    select(
        out,
        "suicidal_thoughts",
        "Have you ever had suicidal thoughts?",
        YesNo::ALL,
        p.suicidal_thoughts,
    );
    select(
        out,
        "family_history",
        "Family history of mental illness?",
        YesNo::ALL,
        p.family_history,
    );

    out.push_str("<button type=\"submit\">Predict Risk</button></form>");
}

fn outcome(out: &mut String, o: &Outcome<'_>) {
    match o {
        Outcome::Prediction(r) => {
            out.push_str("<h2>Prediction</h2>");
            let _ = write!(
                out,
                "<p>Estimated probability of depression: <strong>{}</strong></p>",
                escape(&r.percent)
            );
            let class = match r.risk_level {
                RiskLevel::Higher => "warning",
                RiskLevel::Lower => "success",
            };
            let _ = write!(out, "<p class=\"{class}\">{}</p>", escape(&r.message));
        }
        Outcome::Error(e) => {
            let _ = write!(
                out,
                "<p class=\"error\">An error occurred during prediction: {}</p>",
                escape(e)
            );
        }
    }
}

/// Form page, optionally followed by the result of the last submission.
pub fn render(profile: &StudentProfile, result: Option<Outcome<'_>>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    open(&mut out);
    out.push_str(
        "<p>Provide inputs to estimate depression risk. This is <strong>not</strong> a medical diagnosis.</p>",
    );
    form(&mut out, profile);
    if let Some(o) = result {
        outcome(&mut out, &o);
    }
    close(&mut out);
    out
}

/// Shown instead of the form when artifacts failed to load.
pub fn unavailable(error: &str) -> String {
    let mut out = String::with_capacity(1024);
    open(&mut out);
    let _ = write!(out, "<p class=\"error\">{}</p>", escape(error));
    close(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_form_keeps_submitted_values() {
        let p = StudentProfile {
            gender: Gender::Female,
            cgpa: 8.25,
            ..StudentProfile::default()
        };
        let html = render(&p, None);
        assert!(html.contains("<option value=\"Female\" selected>Female</option>"));
        assert!(html.contains("<option value=\"Male\">Male</option>"));
        assert!(html.contains("value=\"8.25\""));
        assert!(html.contains("Predict Risk"));
        assert!(html.contains("Mental Health Indicators"));
        assert!(!html.contains("<h2>Prediction</h2>"));
    }

    #[test]
    fn test_error_outcome_is_escaped() {
        let html = render(
            &StudentProfile::default(),
            Some(Outcome::Error("bad <input>".into())),
        );
        assert!(html.contains("An error occurred during prediction: bad &lt;input&gt;"));
    }

    #[test]
    fn test_unavailable_has_no_form() {
        let html = unavailable("Model file not found.");
        assert!(html.contains("Model file not found."));
        assert!(!html.contains("<form"));
    }
}

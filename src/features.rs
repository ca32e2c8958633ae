// src/features.rs
//! Feature encoding shared by the trainer and the HTTP service.
//!
//! The classifier has no schema of its own: it sees nine numbers in a fixed
//! order. Every code path that builds those numbers goes through this module,
//! and the artifact records [`SCHEMA_VERSION`] and [`FEATURE_NAMES`] so a model
//! trained against a different encoding is rejected at load time.

use crate::app_log;
use crate::error::MatchError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// Raw request body: string keys to heterogeneous JSON values.
pub type RawRecord = serde_json::Map<String, Value>;

/// Bumped whenever a mapping below changes meaning.
pub const SCHEMA_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 9;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "skill_count",
    "experience_years",
    "profile_completeness",
    "required_skill_count",
    "optional_skill_count",
    "difficulty_num",
    "duration_num",
    "applicant_type_num",
    "education_num",
];

pub const DEFAULT_DIFFICULTY: u8 = 2;
pub const DEFAULT_DURATION: u32 = 1;
pub const DEFAULT_APPLICANT_TYPE: u8 = 2;
pub const DEFAULT_EDUCATION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub skill_count: u32,
    pub experience_years: f64,
    pub profile_completeness: f64,
    pub required_skill_count: u32,
    pub optional_skill_count: u32,
    pub difficulty_num: u8,
    pub duration_num: u32,
    pub applicant_type_num: u8,
    pub education_num: u8,
}

/// Count non-empty, whitespace-trimmed tokens of a comma-separated list.
pub fn count_skill_items(text: &str) -> usize {
    text.split(',').filter(|token| !token.trim().is_empty()).count()
}

/// Number of entries in a JSON-encoded skills rating. Anything that does not
/// decode to an object or array counts as zero.
pub fn skill_count_from_rating(json_text: &str) -> usize {
    match serde_json::from_str::<Value>(json_text) {
        Ok(value) => json_collection_len(&value).unwrap_or(0),
        Err(_) => 0,
    }
}

fn json_collection_len(value: &Value) -> Option<usize> {
    match value {
        Value::Object(map) => Some(map.len()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn difficulty_level(text: &str) -> Option<u8> {
    match normalize(text).as_str() {
        "easy" => Some(1),
        "medium" => Some(2),
        "hard" => Some(3),
        _ => None,
    }
}

pub fn applicant_type_level(text: &str) -> Option<u8> {
    match normalize(text).as_str() {
        "student" => Some(1),
        "fresher" => Some(2),
        "experienced" => Some(3),
        _ => None,
    }
}

pub fn education_level(text: &str) -> Option<u8> {
    match normalize(text).as_str() {
        "diploma" => Some(1),
        "bsc" => Some(2),
        "b.tech" => Some(3),
        "msc" => Some(4),
        "m.tech" => Some(5),
        _ => None,
    }
}

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// First run of digits in a free-text duration such as `"6 months"`.
pub fn extract_duration(text: &str) -> Option<u32> {
    digits_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// One row of the training CSV. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetRow {
    #[serde(default)]
    pub skills_rating: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub experience_years: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub profile_completeness: Option<f64>,
    #[serde(default)]
    pub project_required_skills: Option<String>,
    #[serde(default)]
    pub project_optional_skills: Option<String>,
    #[serde(default)]
    pub project_difficulty: Option<String>,
    #[serde(default)]
    pub project_duration: Option<String>,
    #[serde(default)]
    pub applicant_type: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub selection_status: Option<u8>,
}

impl DatasetRow {
    /// Binary target, `None` for anything other than 0 or 1.
    pub fn label(&self) -> Option<usize> {
        match self.selection_status {
            Some(0) => Some(0),
            Some(1) => Some(1),
            _ => None,
        }
    }
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.skill_count as f64,
            self.experience_years,
            self.profile_completeness,
            self.required_skill_count as f64,
            self.optional_skill_count as f64,
            self.difficulty_num as f64,
            self.duration_num as f64,
            self.applicant_type_num as f64,
            self.education_num as f64,
        ]
    }

    /// Strict encoding for training: every unmapped or unparseable field is
    /// reported by name instead of being defaulted.
    pub fn from_dataset_row(row: &DatasetRow) -> Result<Self, Vec<&'static str>> {
        let mut missing = Vec::new();

        let experience_years = row.experience_years.filter(|v| v.is_finite() && *v >= 0.0);
        if experience_years.is_none() {
            missing.push("experience_years");
        }
        let profile_completeness = row
            .profile_completeness
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.min(100.0));
        if profile_completeness.is_none() {
            missing.push("profile_completeness");
        }
        let difficulty_num = row.project_difficulty.as_deref().and_then(difficulty_level);
        if difficulty_num.is_none() {
            missing.push("difficulty_num");
        }
        let duration_num = row
            .project_duration
            .as_deref()
            .and_then(extract_duration)
            .map(|d| d.max(1));
        if duration_num.is_none() {
            missing.push("duration_num");
        }
        let applicant_type_num = row.applicant_type.as_deref().and_then(applicant_type_level);
        if applicant_type_num.is_none() {
            missing.push("applicant_type_num");
        }
        let education_num = row.education.as_deref().and_then(education_level);
        if education_num.is_none() {
            missing.push("education_num");
        }

        match (
            experience_years,
            profile_completeness,
            difficulty_num,
            duration_num,
            applicant_type_num,
            education_num,
        ) {
            (Some(exp), Some(completeness), Some(diff), Some(dur), Some(applicant), Some(edu)) => {
                Ok(Self {
                    skill_count: row
                        .skills_rating
                        .as_deref()
                        .map(skill_count_from_rating)
                        .unwrap_or(0) as u32,
                    experience_years: exp,
                    profile_completeness: completeness,
                    required_skill_count: row
                        .project_required_skills
                        .as_deref()
                        .map(count_skill_items)
                        .unwrap_or(0) as u32,
                    optional_skill_count: row
                        .project_optional_skills
                        .as_deref()
                        .map(count_skill_items)
                        .unwrap_or(0) as u32,
                    difficulty_num: diff,
                    duration_num: dur,
                    applicant_type_num: applicant,
                    education_num: edu,
                })
            }
            _ => Err(missing),
        }
    }

    /// Lenient encoding for serving. Pre-shaped keys (`difficulty_num`) win
    /// over raw keys (`project_difficulty`); absent fields take defaults.
    /// Categorical text never fails; malformed numbers do.
    pub fn from_record(record: &RawRecord) -> Result<Self, MatchError> {
        let skill_count = match present(record, "skill_count") {
            Some(value) => whole_number("skill_count", value)?,
            None => match present(record, "skills_rating") {
                Some(Value::String(text)) => skill_count_from_rating(text) as u32,
                Some(value) => json_collection_len(value).unwrap_or(0) as u32,
                None => 0,
            },
        };

        let experience_years = number("experience_years", record)?.unwrap_or(0.0);
        let profile_completeness = number("profile_completeness", record)?
            .unwrap_or(0.0)
            .min(100.0);

        let required_skill_count =
            list_count(record, "required_skill_count", "project_required_skills")?;
        let optional_skill_count =
            list_count(record, "optional_skill_count", "project_optional_skills")?;

        let difficulty_num = categorical(
            record,
            "difficulty_num",
            "project_difficulty",
            difficulty_level,
            3,
            DEFAULT_DIFFICULTY,
        );
        let applicant_type_num = categorical(
            record,
            "applicant_type_num",
            "applicant_type",
            applicant_type_level,
            3,
            DEFAULT_APPLICANT_TYPE,
        );
        let education_num = categorical(
            record,
            "education_num",
            "education",
            education_level,
            5,
            DEFAULT_EDUCATION,
        );

        let duration_num = duration(record).max(1);

        Ok(Self {
            skill_count,
            experience_years,
            profile_completeness,
            required_skill_count,
            optional_skill_count,
            difficulty_num,
            duration_num,
            applicant_type_num,
            education_num,
        })
    }
}

/// Field value unless absent, null or a blank string.
fn present<'a>(record: &'a RawRecord, key: &str) -> Option<&'a Value> {
    match record.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn parse_number(field: &str, value: &Value) -> Result<f64, MatchError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let parsed = parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| MatchError::InvalidInput(format!("Field '{}' must be numeric", field)))?;
    if parsed < 0.0 {
        return Err(MatchError::InvalidInput(format!(
            "Field '{}' must not be negative",
            field
        )));
    }
    Ok(parsed)
}

fn number(field: &str, record: &RawRecord) -> Result<Option<f64>, MatchError> {
    present(record, field)
        .map(|value| parse_number(field, value))
        .transpose()
}

fn whole_number(field: &str, value: &Value) -> Result<u32, MatchError> {
    let parsed = parse_number(field, value)?;
    if parsed.fract() != 0.0 || parsed > u32::MAX as f64 {
        return Err(MatchError::InvalidInput(format!(
            "Field '{}' must be a whole number",
            field
        )));
    }
    Ok(parsed as u32)
}

fn list_count(record: &RawRecord, count_key: &str, list_key: &str) -> Result<u32, MatchError> {
    if let Some(value) = present(record, count_key) {
        return whole_number(count_key, value);
    }
    match present(record, list_key) {
        Some(Value::String(text)) => Ok(count_skill_items(text) as u32),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter(|item| match item {
                Value::String(text) => !text.trim().is_empty(),
                Value::Null => false,
                _ => true,
            })
            .count() as u32),
        Some(value) => whole_number(list_key, value),
        None => Ok(0),
    }
}

/// Non-negative integral JSON number; `3.0` counts, `2.7` does not.
fn whole_level(n: &Number) -> Option<f64> {
    n.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0)
}

fn categorical(
    record: &RawRecord,
    level_key: &str,
    text_key: &str,
    lookup: fn(&str) -> Option<u8>,
    max_level: u8,
    default: u8,
) -> u8 {
    let level = |value: &Value| -> Option<u8> {
        match value {
            Value::Number(n) => whole_level(n).map(|v| v.min(u8::MAX as f64) as u8),
            Value::String(text) => match text.trim().parse::<u8>() {
                Ok(v) => Some(v),
                Err(_) => lookup(text),
            },
            _ => None,
        }
    };

    let raw = present(record, level_key).or_else(|| present(record, text_key));
    match raw.map(|value| (value, level(value))) {
        None => default,
        Some((_, Some(v))) if (1..=max_level).contains(&v) => v,
        Some((value, _)) => {
            app_log!(
                warn,
                "Unrecognised value {} for {}, using default {}",
                value,
                level_key,
                default
            );
            default
        }
    }
}

fn duration(record: &RawRecord) -> u32 {
    let raw = present(record, "duration_num").or_else(|| present(record, "project_duration"));
    let parsed = match raw {
        None => return DEFAULT_DURATION,
        Some(Value::Number(n)) => whole_level(n).map(|v| v.min(u32::MAX as f64) as u32),
        Some(Value::String(text)) => extract_duration(text),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        app_log!(warn, "Unrecognised project duration, using default {}", DEFAULT_DURATION);
        DEFAULT_DURATION
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_count_skill_items() {
        assert_eq!(count_skill_items(""), 0);
        assert_eq!(count_skill_items(" "), 0);
        assert_eq!(count_skill_items(","), 0);
        assert_eq!(count_skill_items("a, ,b"), 2);
        assert_eq!(count_skill_items("python,sql,flask"), 3);
        assert_eq!(count_skill_items(" docker , react ,"), 2);
    }

    #[test]
    fn test_skill_count_from_rating() {
        assert_eq!(skill_count_from_rating(r#"{"Python": 4, "SQL": 3}"#), 2);
        assert_eq!(skill_count_from_rating("[1, 2, 3]"), 3);
        assert_eq!(skill_count_from_rating("not json"), 0);
        assert_eq!(skill_count_from_rating(""), 0);
    }

    #[test]
    fn test_categorical_maps() {
        assert_eq!(difficulty_level("Easy"), Some(1));
        assert_eq!(difficulty_level(" hard "), Some(3));
        assert_eq!(difficulty_level("Extreme"), None);
        assert_eq!(applicant_type_level("experienced"), Some(3));
        assert_eq!(applicant_type_level("Student"), Some(1));
        assert_eq!(education_level("B.Tech"), Some(3));
        assert_eq!(education_level("M.Tech"), Some(5));
        assert_eq!(education_level("Diploma"), Some(1));
        assert_eq!(education_level("PhD"), None);
    }

    #[test]
    fn test_extract_duration() {
        assert_eq!(extract_duration("6 months"), Some(6));
        assert_eq!(extract_duration("about 12-14 weeks"), Some(12));
        assert_eq!(extract_duration("ongoing"), None);
    }

    #[test]
    fn test_feature_order_matches_names() {
        let vector = FeatureVector {
            skill_count: 1,
            experience_years: 2.0,
            profile_completeness: 3.0,
            required_skill_count: 4,
            optional_skill_count: 5,
            difficulty_num: 6,
            duration_num: 7,
            applicant_type_num: 8,
            education_num: 9,
        };
        assert_eq!(vector.to_row(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(FEATURE_NAMES[0], "skill_count");
        assert_eq!(FEATURE_NAMES[8], "education_num");
    }

    #[test]
    fn test_from_record_pre_shaped() {
        let vector = FeatureVector::from_record(&record(json!({
            "skill_count": 5,
            "experience_years": 2,
            "profile_completeness": 85,
            "required_skill_count": 3,
            "optional_skill_count": 2,
            "difficulty_num": 3,
            "duration_num": 6,
            "applicant_type_num": 1,
            "education_num": 4
        })))
        .unwrap();
        assert_eq!(vector.to_row(), [5.0, 2.0, 85.0, 3.0, 2.0, 3.0, 6.0, 1.0, 4.0]);
    }

    #[test]
    fn test_from_record_raw_fields() {
        let vector = FeatureVector::from_record(&record(json!({
            "skills_rating": "{\"Python\": 5, \"Rust\": 4, \"SQL\": 2}",
            "experience_years": "1.5",
            "profile_completeness": "70",
            "project_required_skills": "python, ,sql",
            "project_optional_skills": ["docker", "", "react"],
            "project_difficulty": "Hard",
            "project_duration": "3 months",
            "applicant_type": "experienced",
            "education": "MSc"
        })))
        .unwrap();
        assert_eq!(vector.skill_count, 3);
        assert_eq!(vector.experience_years, 1.5);
        assert_eq!(vector.required_skill_count, 2);
        assert_eq!(vector.optional_skill_count, 2);
        assert_eq!(vector.difficulty_num, 3);
        assert_eq!(vector.duration_num, 3);
        assert_eq!(vector.applicant_type_num, 3);
        assert_eq!(vector.education_num, 4);
    }

    #[test]
    fn test_from_record_defaults() {
        let vector = FeatureVector::from_record(&RawRecord::new()).unwrap();
        assert_eq!(vector.skill_count, 0);
        assert_eq!(vector.experience_years, 0.0);
        assert_eq!(vector.difficulty_num, DEFAULT_DIFFICULTY);
        assert_eq!(vector.duration_num, DEFAULT_DURATION);
        assert_eq!(vector.applicant_type_num, DEFAULT_APPLICANT_TYPE);
        assert_eq!(vector.education_num, DEFAULT_EDUCATION);
    }

    #[test]
    fn test_malformed_categorical_falls_back() {
        let vector = FeatureVector::from_record(&record(json!({
            "project_difficulty": "Impossible",
            "applicant_type_num": 9,
            "education": "PhD",
            "project_duration": "flexible"
        })))
        .unwrap();
        assert_eq!(vector.difficulty_num, DEFAULT_DIFFICULTY);
        assert_eq!(vector.applicant_type_num, DEFAULT_APPLICANT_TYPE);
        assert_eq!(vector.education_num, DEFAULT_EDUCATION);
        assert_eq!(vector.duration_num, DEFAULT_DURATION);
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = FeatureVector::from_record(&record(json!({"experience_years": "lots"})))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let err = FeatureVector::from_record(&record(json!({"skill_count": -1}))).unwrap_err();
        assert!(err.message().contains("negative"));

        assert!(FeatureVector::from_record(&record(json!({"skill_count": 2.5}))).is_err());
    }

    #[test]
    fn test_completeness_and_duration_bounds() {
        let vector = FeatureVector::from_record(&record(json!({
            "profile_completeness": 140,
            "duration_num": 0
        })))
        .unwrap();
        assert_eq!(vector.profile_completeness, 100.0);
        assert_eq!(vector.duration_num, 1);
    }

    #[test]
    fn test_integral_floats_are_levels() {
        let vector = FeatureVector::from_record(&record(json!({
            "difficulty_num": 3.0,
            "education_num": 5.0,
            "applicant_type_num": 1.0,
            "duration_num": 4.0
        })))
        .unwrap();
        assert_eq!(vector.difficulty_num, 3);
        assert_eq!(vector.education_num, 5);
        assert_eq!(vector.applicant_type_num, 1);
        assert_eq!(vector.duration_num, 4);

        let vector = FeatureVector::from_record(&record(json!({
            "difficulty_num": 2.5,
            "duration_num": 2.7
        })))
        .unwrap();
        assert_eq!(vector.difficulty_num, DEFAULT_DIFFICULTY);
        assert_eq!(vector.duration_num, DEFAULT_DURATION);
    }

    #[test]
    fn test_dataset_row_and_record_encode_alike() {
        let row = DatasetRow {
            skills_rating: Some(r#"{"Python": 4, "Java": 3, "Go": 1}"#.to_string()),
            experience_years: Some(1.5),
            profile_completeness: Some(140.0),
            project_required_skills: Some("python,sql".to_string()),
            project_optional_skills: Some("docker".to_string()),
            project_difficulty: Some("hard".to_string()),
            project_duration: Some("0 months".to_string()),
            applicant_type: Some("Student".to_string()),
            education: Some("M.Tech".to_string()),
            selection_status: Some(0),
        };
        let served = FeatureVector::from_record(&record(json!({
            "skills_rating": r#"{"Python": 4, "Java": 3, "Go": 1}"#,
            "experience_years": 1.5,
            "profile_completeness": 140,
            "project_required_skills": "python,sql",
            "project_optional_skills": "docker",
            "project_difficulty": "hard",
            "project_duration": "0 months",
            "applicant_type": "Student",
            "education": "M.Tech"
        })))
        .unwrap();
        let trained = FeatureVector::from_dataset_row(&row).unwrap();
        assert_eq!(trained.to_row(), served.to_row());
        assert_eq!(trained.profile_completeness, 100.0);
        assert_eq!(trained.duration_num, 1);

        let negative = DatasetRow {
            profile_completeness: Some(-5.0),
            ..row
        };
        assert_eq!(
            FeatureVector::from_dataset_row(&negative).unwrap_err(),
            vec!["profile_completeness"]
        );
        assert!(
            FeatureVector::from_record(&record(json!({"profile_completeness": -5}))).is_err()
        );
    }

    #[test]
    fn test_dataset_row_encoding() {
        let row = DatasetRow {
            skills_rating: Some(r#"{"Python": 4, "Java": 3}"#.to_string()),
            experience_years: Some(2.0),
            profile_completeness: Some(80.0),
            project_required_skills: Some("python,sql,flask".to_string()),
            project_optional_skills: None,
            project_difficulty: Some("Medium".to_string()),
            project_duration: Some("4 months".to_string()),
            applicant_type: Some("fresher".to_string()),
            education: Some("BSc".to_string()),
            selection_status: Some(1),
        };
        let vector = FeatureVector::from_dataset_row(&row).unwrap();
        assert_eq!(vector.to_row(), [2.0, 2.0, 80.0, 3.0, 0.0, 2.0, 4.0, 2.0, 2.0]);
        assert_eq!(row.label(), Some(1));
    }

    #[test]
    fn test_dataset_row_reports_unmapped_fields() {
        let row = DatasetRow {
            experience_years: Some(1.0),
            profile_completeness: Some(50.0),
            project_difficulty: Some("Extreme".to_string()),
            project_duration: Some("2 months".to_string()),
            applicant_type: Some("student".to_string()),
            education: Some("PhD".to_string()),
            ..Default::default()
        };
        let missing = FeatureVector::from_dataset_row(&row).unwrap_err();
        assert_eq!(missing, vec!["difficulty_num", "education_num"]);
        assert_eq!(row.label(), None);
    }
}

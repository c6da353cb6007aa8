//! Subject reference data.
//!
//! Subjects populate the slot-creation choices and pre-fill the teacher of a new slot.
//! When the store is unreachable or has no subjects for a year, the bundled list in
//! `data/subjects.json` is used instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::SubjectId;
use crate::validation::not_blank;

static FALLBACK_SUBJECTS: LazyLock<Vec<Subject>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../../data/subjects.json")).unwrap_or_default()
});

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum SubjectType {
    #[default]
    Lecture,
    Lab,
    Project,
}

impl SubjectType {
    pub const ALL: [SubjectType; 3] = [SubjectType::Lecture, SubjectType::Lab, SubjectType::Project];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Lecture => "Lecture",
            SubjectType::Lab => "Lab",
            SubjectType::Project => "Project",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subject type: {0}")]
pub struct UnknownSubjectType(pub String);

impl FromStr for SubjectType {
    type Err = UnknownSubjectType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSubjectType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub teacher: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
    pub hours_per_week: i32,
    pub year: String,
}

fn default_hours_per_week() -> i32 {
    3
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectDto {
    #[validate(custom(function = "not_blank", message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "teacher is required"))]
    pub teacher: String,
    #[serde(default, rename = "type")]
    pub kind: SubjectType,
    #[serde(default = "default_hours_per_week")]
    #[validate(range(min = 1, max = 40, message = "hoursPerWeek must be between 1 and 40"))]
    pub hours_per_week: i32,
    #[validate(custom(function = "not_blank", message = "year is required"))]
    pub year: String,
}

impl CreateSubjectDto {
    pub fn into_subject(self) -> Subject {
        Subject {
            id: SubjectId::new(),
            name: self.name.trim().to_string(),
            teacher: self.teacher.trim().to_string(),
            kind: self.kind,
            hours_per_week: self.hours_per_week,
            year: self.year.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SubjectQuery {
    /// Academic year to list subjects for, e.g. `2025`
    pub year: String,
}

/// Where a subject listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectSource {
    Store,
    Fallback,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubjectList {
    pub source: SubjectSource,
    pub subjects: Vec<Subject>,
}

/// Bundled subjects for `year`.
pub fn fallback_subjects(year: &str) -> Vec<Subject> {
    FALLBACK_SUBJECTS
        .iter()
        .filter(|subject| subject.year == year)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_list_parses_and_filters_by_year() {
        let subjects = fallback_subjects("2025");
        assert!(!subjects.is_empty());
        assert!(subjects.iter().all(|s| s.year == "2025"));
        assert!(
            subjects
                .iter()
                .any(|s| s.name == "DBMS" && s.teacher == "Dr. Rao")
        );

        assert!(fallback_subjects("1999").is_empty());
    }

    #[test]
    fn test_subject_wire_shape() {
        let subject = fallback_subjects("2025").remove(0);
        let json = serde_json::to_value(&subject).unwrap();
        assert!(json["hoursPerWeek"].is_number());
        assert!(json["type"].is_string());
    }

    #[test]
    fn test_create_subject_dto_defaults() {
        let dto: CreateSubjectDto =
            serde_json::from_str(r#"{"name":"DBMS","teacher":"Dr. Rao","year":"2025"}"#)
                .unwrap();
        assert_eq!(dto.kind, SubjectType::Lecture);
        assert_eq!(dto.hours_per_week, 3);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_subject_dto_validation() {
        let dto: CreateSubjectDto = serde_json::from_str(
            r#"{"name":" ","teacher":"Dr. Rao","year":"2025","hoursPerWeek":0}"#,
        )
        .unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("hours_per_week"));
        assert!(!fields.contains_key("teacher"));
    }

    #[test]
    fn test_subject_type_parse() {
        assert_eq!("lab".parse::<SubjectType>().unwrap(), SubjectType::Lab);
        assert!("Seminar".parse::<SubjectType>().is_err());
    }
}

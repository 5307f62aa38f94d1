//! Display-side data produced by the roster pipeline.

use serde::Serialize;

use crate::grading::{AggregationPolicy, FinalGrade};
use crate::services::grading_api::UniversityClass;

/// Placeholder for a class or student attribute the API did not supply.
pub const UNKNOWN: &str = "Unknown";

/// Identity of the class a roster belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub class_id: String,
    pub title: String,
    pub semester: String,
}

impl ClassInfo {
    /// Looks `class_id` up in the semester's class list, falling back to
    /// [`UNKNOWN`] title and semester.
    pub fn resolve(class_id: &str, classes: &[UniversityClass]) -> Self {
        match classes.iter().find(|c| c.class_id == class_id) {
            Some(class) => Self {
                class_id: class_id.to_string(),
                title: class.title.clone(),
                semester: class.semester.clone(),
            },
            None => Self {
                class_id: class_id.to_string(),
                title: UNKNOWN.to_string(),
                semester: UNKNOWN.to_string(),
            },
        }
    }
}

/// One table row: a student and their computed final grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub class_name: String,
    pub semester: String,
    pub final_grade: FinalGrade,
}

impl RosterRow {
    pub fn new(
        class: &ClassInfo,
        student_id: &str,
        student_name: &str,
        final_grade: FinalGrade,
    ) -> Self {
        Self {
            id: student_id.to_string(),
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
            class_id: class.class_id.clone(),
            class_name: class.title.clone(),
            semester: class.semester.clone(),
            final_grade,
        }
    }
}

/// A fetch that failed while the roster was assembled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum FetchFailure {
    Assignments { error: String },
    Students { error: String },
    StudentGrades { student_id: String, error: String },
}

/// Every row for one class, plus whatever went wrong fetching it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub class: ClassInfo,
    pub policy: AggregationPolicy,
    pub rows: Vec<RosterRow>,
    pub failures: Vec<FetchFailure>,
}

impl Roster {
    pub fn class_id(&self) -> &str {
        &self.class.class_id
    }
}

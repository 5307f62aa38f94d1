//! Trait and wire types for the grading API.

use crate::error::ApiError;
use crate::grading::{RawValue, ScoreMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A class offered in a semester, as returned by `/class/listBySemester`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityClass {
    pub class_id: String,
    pub title: String,
    pub semester: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meeting_time: Option<String>,
    #[serde(default)]
    pub meeting_location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of `/class/listAssignments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assignment_id: String,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub submission_date: Option<String>,
    #[serde(default)]
    pub weight: RawValue,
}

impl Assignment {
    /// Collects `assignmentId → weight`. A repeated id keeps the last weight.
    pub fn weight_map(assignments: &[Assignment]) -> ScoreMap {
        assignments
            .iter()
            .map(|a| (a.assignment_id.clone(), a.weight.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: String,
    #[serde(default)]
    pub final_grade: RawValue,
}

/// A student with grades embedded as enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub student_id: String,
    #[serde(alias = "name")]
    pub student_name: String,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl StudentProfile {
    /// Collects `courseId → finalGrade` from the enrollments.
    pub fn grade_map(&self) -> ScoreMap {
        self.enrollments
            .iter()
            .map(|e| (e.course_id.clone(), e.final_grade.clone()))
            .collect()
    }
}

/// `/class/listStudents` answers in one of two shapes depending on the
/// deployment: full profiles, or bare student ids that need a follow-up
/// `/student/listGrades` call each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentListing {
    Profiles(Vec<StudentProfile>),
    Ids(Vec<String>),
}

impl StudentListing {
    pub fn len(&self) -> usize {
        match self {
            StudentListing::Profiles(p) => p.len(),
            StudentListing::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `grades` field of a grade record: a single map, or a list of maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeSheet {
    Map(HashMap<String, RawValue>),
    List(Vec<HashMap<String, RawValue>>),
}

impl Default for GradeSheet {
    fn default() -> Self {
        GradeSheet::Map(HashMap::new())
    }
}

impl GradeSheet {
    /// Flattens into one map; on key collisions later maps win.
    pub fn into_map(self) -> ScoreMap {
        match self {
            GradeSheet::Map(map) => map,
            GradeSheet::List(maps) => maps.into_iter().flatten().collect(),
        }
    }
}

/// One student's grades for a class, from `/student/listGrades`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrades {
    pub student_id: String,
    #[serde(default, alias = "studentName")]
    pub name: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub grades: GradeSheet,
}

/// Abstraction over the grading API so the roster pipeline can run against
/// fakes in tests.
#[async_trait::async_trait]
pub trait GradingApi: Send + Sync {
    async fn list_classes(&self, semester: &str) -> Result<Vec<UniversityClass>, ApiError>;

    async fn list_assignments(&self, class_id: &str) -> Result<Vec<Assignment>, ApiError>;

    async fn list_students(&self, class_id: &str) -> Result<StudentListing, ApiError>;

    async fn student_grades(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> Result<StudentGrades, ApiError>;
}

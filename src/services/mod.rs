//! Contract with the remote grading API.

pub mod grading_api;

pub use grading_api::{
    Assignment, Enrollment, GradeSheet, GradingApi, StudentGrades, StudentListing, StudentProfile,
    UniversityClass,
};

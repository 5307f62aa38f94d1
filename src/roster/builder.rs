use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::ApiError;
use crate::grading::{AggregationPolicy, FinalGrade, ScoreMap, aggregate};
use crate::roster::types::{ClassInfo, FetchFailure, Roster, RosterRow, UNKNOWN};
use crate::services::grading_api::{
    Assignment, GradingApi, StudentGrades, StudentListing, UniversityClass,
};

/// How far Σweight may drift from 100 before percentage-scaled grading warns.
const PERCENT_TOLERANCE: f64 = 0.5;

/// Fetches a class's data from a [`GradingApi`] and grades every student.
///
/// Fetch failures never escape: they are logged, recorded in
/// [`Roster::failures`], and the affected part of the roster degrades.
pub struct RosterBuilder<A> {
    api: Arc<A>,
    policy: AggregationPolicy,
    concurrency: usize,
}

impl<A: GradingApi + 'static> RosterBuilder<A> {
    pub fn new(api: Arc<A>, policy: AggregationPolicy) -> Self {
        Self {
            api,
            policy,
            concurrency: 5,
        }
    }

    /// Caps the number of in-flight per-student grade fetches.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Classes offered in `semester`; empty if the fetch fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_classes(&self, semester: &str) -> Vec<UniversityClass> {
        match self.api.list_classes(semester).await {
            Ok(classes) => {
                info!(count = classes.len(), "Class list fetched");
                classes
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch class list");
                Vec::new()
            }
        }
    }

    /// Builds the roster for `class_id`.
    ///
    /// `classes` is the semester's class list, used only to resolve the class
    /// title and semester for display.
    #[tracing::instrument(skip(self, classes), fields(policy = %self.policy))]
    pub async fn build(&self, class_id: &str, classes: &[UniversityClass]) -> Roster {
        let class = ClassInfo::resolve(class_id, classes);
        let mut failures = Vec::new();

        let weights = match self.api.list_assignments(class_id).await {
            Ok(assignments) => {
                debug!(count = assignments.len(), "Assignments fetched");
                Assignment::weight_map(&assignments)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch assignments");
                failures.push(FetchFailure::Assignments {
                    error: e.to_string(),
                });
                ScoreMap::new()
            }
        };

        if self.policy == AggregationPolicy::PercentageScaled {
            warn_if_not_percentages(&weights);
        }

        let rows = match self.api.list_students(class_id).await {
            Ok(StudentListing::Profiles(profiles)) => {
                debug!(count = profiles.len(), "Student profiles fetched");
                profiles
                    .iter()
                    .map(|p| {
                        self.grade_row(&class, &p.student_id, &p.student_name, &p.grade_map(), &weights)
                    })
                    .collect()
            }
            Ok(StudentListing::Ids(ids)) => {
                debug!(count = ids.len(), "Student ids fetched");
                self.rows_from_ids(&class, ids, &weights, &mut failures).await
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch students");
                failures.push(FetchFailure::Students {
                    error: e.to_string(),
                });
                Vec::new()
            }
        };

        info!(
            rows = rows.len(),
            failures = failures.len(),
            "Roster built"
        );

        Roster {
            class,
            policy: self.policy,
            rows,
            failures,
        }
    }

    /// Fetches every student's grades concurrently and waits for all of them
    /// before grading. A failed fetch yields an `N/A` row for that student.
    async fn rows_from_ids(
        &self,
        class: &ClassInfo,
        ids: Vec<String>,
        weights: &ScoreMap,
        failures: &mut Vec<FetchFailure>,
    ) -> Vec<RosterRow> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(ids.len());

        for student_id in &ids {
            let sem = semaphore.clone();
            let api = self.api.clone();
            let student_id = student_id.clone();
            let class_id = class.class_id.clone();

            let span = tracing::info_span!(
                "student_grades",
                student_id = %student_id,
                class_id = %class_id,
            );

            let task = tokio::spawn(
                async move {
                    // The semaphore is never closed, so acquire cannot fail.
                    let _permit = sem.acquire().await.ok();
                    api.student_grades(&student_id, &class_id).await
                }
                .instrument(span),
            );
            tasks.push(task);
        }

        let mut outcomes: Vec<Result<StudentGrades, String>> = Vec::with_capacity(tasks.len());
        for task in tasks {
            let outcome = match task.await {
                Ok(result) => result.map_err(|e: ApiError| e.to_string()),
                Err(e) => Err(format!("grade fetch task failed: {e}")),
            };
            outcomes.push(outcome);
        }

        ids.into_iter()
            .zip(outcomes)
            .map(|(student_id, outcome)| match outcome {
                Ok(record) => {
                    if record.student_id != student_id {
                        warn!(
                            requested = %student_id,
                            returned = %record.student_id,
                            "Grade record belongs to a different student id"
                        );
                    }
                    let name = record.name.as_deref().unwrap_or(UNKNOWN).to_string();
                    let grades = record.grades.into_map();
                    self.grade_row(class, &student_id, &name, &grades, weights)
                }
                Err(error) => {
                    error!(student_id = %student_id, error = %error, "Failed to fetch student grades");
                    failures.push(FetchFailure::StudentGrades {
                        student_id: student_id.clone(),
                        error,
                    });
                    RosterRow::new(class, &student_id, UNKNOWN, FinalGrade::NotAvailable)
                }
            })
            .collect()
    }

    fn grade_row(
        &self,
        class: &ClassInfo,
        student_id: &str,
        student_name: &str,
        grades: &ScoreMap,
        weights: &ScoreMap,
    ) -> RosterRow {
        let result = aggregate(grades, weights, self.policy);
        for skipped in &result.skipped {
            warn!(
                student_id,
                key = %skipped.key,
                reason = %skipped.reason,
                "Grade entry excluded from final grade"
            );
        }
        debug!(
            student_id,
            matched = result.matched.len(),
            final_grade = %result.final_grade,
            "Student graded"
        );
        RosterRow::new(class, student_id, student_name, result.final_grade)
    }
}

fn warn_if_not_percentages(weights: &ScoreMap) {
    if weights.is_empty() {
        return;
    }
    let total: f64 = weights.values().filter_map(|w| w.as_finite()).sum();
    if (total - 100.0).abs() > PERCENT_TOLERANCE {
        warn!(
            total_weight = total,
            "Assignment weights do not sum to 100; percentage-scaled grades will be skewed"
        );
    }
}

/// Awaits every spawned roster task, logging the ones that panicked or were
/// cancelled. Returns how many failed.
pub async fn await_all(tasks: Vec<tokio::task::JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Roster task failed");
            failed += 1;
        }
    }
    failed
}

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use hexaboard_core::now_rfc3339;
use hexaboard_doc::WriteOp;

use crate::model::{AssessmentTask, Course};
use crate::service::{OnboardError, OnboardService};

/// Progress after a transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub progress: u32,
    pub completed: bool,
}

/// Progress through an ordered lecture sequence, clamped to 100.
pub(crate) fn compute_progress(current_index: usize, lecture_count: usize) -> u32 {
    let ratio = 100.0 * (current_index + 1) as f64 / lecture_count as f64;
    (ratio.round() as u32).min(100)
}

/// Deterministic assessment-task id for a course, so a retried finish
/// cannot mint a second task.
fn assessment_task_id(course_id: &str) -> String {
    format!("assessment-{}", course_id)
}

impl OnboardService {
    /// Move the fresher's position within a course.
    ///
    /// `new_index` must point inside the lecture sequence. Index,
    /// derived progress, completion flag, status and the timestamp are
    /// written as one atomic per-document update. Reaching the last
    /// index completes the course.
    pub fn advance_lecture(
        &self,
        fresher_id: &str,
        course_id: &str,
        new_index: usize,
    ) -> Result<ProgressState, OnboardError> {
        let collection = Self::courses_of(fresher_id);
        let course: Course = self.get_doc(&collection, course_id)?;

        if course.completed {
            return Err(OnboardError::Conflict(format!(
                "course {} is already completed",
                course_id
            )));
        }
        if new_index >= course.lectures.len() {
            return Err(OnboardError::Validation(format!(
                "lecture index {} out of range (course has {} lectures)",
                new_index,
                course.lectures.len()
            )));
        }

        let progress = compute_progress(new_index, course.lectures.len());
        let completed = progress == 100;
        self.update_doc(
            &collection,
            course_id,
            &[
                ("currentLectureIndex", json!(new_index)),
                ("progress", json!(progress)),
                ("completed", json!(completed)),
                ("status", json!(if completed { "completed" } else { "active" })),
                ("updatedAt", json!(now_rfc3339())),
            ],
        )?;

        debug!(fresher_id, course_id, new_index, progress, "lecture advanced");
        Ok(ProgressState { progress, completed })
    }

    /// Terminal transition: force the course to its last lecture, 100%
    /// progress, completed, and unlock exactly one assessment task.
    ///
    /// Task creation is idempotent: the task id is derived from the
    /// course id and created conditionally, so retries after a partial
    /// failure (and repeated finish calls) leave exactly one task.
    pub fn finish_course(
        &self,
        fresher_id: &str,
        course_id: &str,
    ) -> Result<ProgressState, OnboardError> {
        let collection = Self::courses_of(fresher_id);
        let course: Course = self.get_doc(&collection, course_id)?;

        let now = now_rfc3339();
        self.update_doc(
            &collection,
            course_id,
            &[
                ("currentLectureIndex", json!(course.lectures.len().saturating_sub(1))),
                ("progress", json!(100)),
                ("completed", json!(true)),
                ("status", json!("completed")),
                ("updatedAt", json!(now)),
            ],
        )?;

        let due = chrono::Utc::now() + chrono::Duration::days(self.config.assessment_due_days);
        let task = AssessmentTask {
            id: assessment_task_id(course_id),
            course_id: course_id.to_string(),
            course_title: course.title.clone(),
            status: "pending".to_string(),
            due_date: Some(due.to_rfc3339()),
            created_at: now,
        };
        match self.create_doc(&Self::tasks_of(fresher_id), &task.id, &task) {
            Ok(()) => info!(fresher_id, course_id, "assessment task unlocked"),
            Err(OnboardError::Conflict(_)) => {
                debug!(fresher_id, course_id, "assessment task already exists");
            }
            Err(e) => return Err(e),
        }

        Ok(ProgressState { progress: 100, completed: true })
    }

    /// Assessment tasks for a fresher.
    pub fn tasks_for_fresher(&self, fresher_id: &str) -> Result<Vec<AssessmentTask>, OnboardError> {
        self.query_docs(&Self::tasks_of(fresher_id), &[], None, None)
    }

    /// Administrative override: wind every course of the fresher back
    /// to the start. Applies to all courses unconditionally.
    pub fn reset_progress(&self, fresher_id: &str) -> Result<usize, OnboardError> {
        let collection = Self::courses_of(fresher_id);
        let courses: Vec<Course> = self.query_docs(&collection, &[], None, None)?;
        let now = now_rfc3339();

        let ops: Vec<WriteOp> = courses
            .iter()
            .map(|course| WriteOp::Update {
                collection: collection.clone(),
                id: course.id.clone(),
                fields: super::field_map(&[
                    ("currentLectureIndex", json!(0)),
                    ("progress", json!(0)),
                    ("completed", json!(false)),
                    ("status", json!("active")),
                    ("updatedAt", json!(now)),
                ]),
            })
            .collect();

        if !ops.is_empty() {
            self.store.batch_write(&ops)?;
        }
        info!(fresher_id, count = courses.len(), "progress reset");
        Ok(courses.len())
    }
}

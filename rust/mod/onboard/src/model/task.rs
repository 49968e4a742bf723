use serde::{Deserialize, Serialize};

/// A to-do item unlocked for a fresher upon completing a course.
///
/// The id is derived deterministically from the course id, so finishing
/// the same course twice yields exactly one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentTask {
    pub id: String,

    pub course_id: String,

    pub course_title: String,

    /// "pending" until the fresher submits the assessment.
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    pub created_at: String,
}

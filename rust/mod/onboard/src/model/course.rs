use serde::{Deserialize, Serialize};

/// Lifecycle of a course assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Completed,
}

/// One unit of video content within a course. Position in the parent's
/// `lectures` sequence defines playback order. Immutable once the
/// course is created, except by full course edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Resolved media location. Always present; a course document is
    /// never written while an upload is pending.
    pub video_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A course instance attached to exactly one fresher, tracking that
/// fresher's personal progress through the lecture sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub instructor: String,

    /// Ordered lecture sequence; insertion order is playback order.
    pub lectures: Vec<Lecture>,

    pub status: CourseStatus,

    /// 0–100, derived from `currentLectureIndex` and `lectures.len()`.
    #[serde(default)]
    pub progress: u32,

    /// 0-based pointer into `lectures`.
    #[serde(default)]
    pub current_lecture_index: usize,

    /// Derived: true iff `progress == 100`.
    #[serde(default)]
    pub completed: bool,

    /// Back-reference set when created via bulk department assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by_department: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

/// Draft of one lecture. Carries either a resolved `videoUrl` or raw
/// media bytes (base64) to be persisted before any document write.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureDraft {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub video_url: Option<String>,

    /// Base64-encoded media bytes to upload.
    #[serde(default)]
    pub video_data: Option<String>,

    /// Original filename of the upload, used in the stored media key.
    #[serde(default)]
    pub video_name: Option<String>,
}

/// Draft of a course to assign.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor: String,
    pub lectures: Vec<LectureDraft>,
}

/// Where a course draft is assigned.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    /// One course document under the given fresher.
    Individual { fresher_id: String },
    /// One course document per member of the department, written as a
    /// single atomic batch.
    Department { department_id: String },
}

/// Result of an assignment: how many course documents were written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOutcome {
    pub assigned_count: usize,
}

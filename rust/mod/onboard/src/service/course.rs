use base64::Engine as _;
use serde_json::json;
use tracing::info;

use hexaboard_core::{new_id, now_rfc3339};
use hexaboard_doc::{OrderBy, WriteOp};

use crate::model::{
    AssignOutcome, AssignTarget, Course, CourseDraft, CourseStatus, Fresher, Lecture, LectureDraft,
};
use crate::service::{OnboardError, OnboardService};

/// Make an upload filename safe for use inside a media key.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl OnboardService {
    /// Resolve one lecture draft into a Lecture with a stable media URL.
    ///
    /// Raw media bytes are persisted first; the course document is only
    /// written once every lecture has a resolved location.
    fn resolve_lecture(&self, index: usize, draft: &LectureDraft) -> Result<Lecture, OnboardError> {
        if draft.title.is_empty() {
            return Err(OnboardError::Validation(format!(
                "lecture {} is missing a title",
                index
            )));
        }

        let video_url = if let Some(data) = &draft.video_data {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| {
                    OnboardError::Validation(format!("lecture {}: invalid media encoding: {}", index, e))
                })?;
            let name = draft
                .video_name
                .as_deref()
                .map(sanitize_filename)
                .unwrap_or_else(|| format!("lecture-{}.mp4", index));
            let key = format!("videos/lectures/{}_{}", new_id(), name);
            self.media.store(&key, &bytes)?
        } else if let Some(url) = &draft.video_url {
            if url.is_empty() {
                return Err(OnboardError::Validation(format!(
                    "lecture {} has an empty video url",
                    index
                )));
            }
            url.clone()
        } else {
            return Err(OnboardError::Validation(format!(
                "lecture {} carries neither media bytes nor a video url",
                index
            )));
        };

        Ok(Lecture {
            title: draft.title.clone(),
            description: draft.description.clone(),
            video_url,
            duration: draft.duration.clone(),
        })
    }

    /// Validate a draft and resolve all lecture media.
    fn resolve_draft(&self, draft: &CourseDraft) -> Result<Vec<Lecture>, OnboardError> {
        if draft.title.is_empty() {
            return Err(OnboardError::Validation("course title is required".into()));
        }
        // Empty lecture sequences would make progress undefined, so
        // they are rejected outright.
        if draft.lectures.is_empty() {
            return Err(OnboardError::Validation(
                "a course needs at least one lecture".into(),
            ));
        }
        draft
            .lectures
            .iter()
            .enumerate()
            .map(|(i, lecture)| self.resolve_lecture(i, lecture))
            .collect()
    }

    fn new_course(
        draft: &CourseDraft,
        lectures: Vec<Lecture>,
        assigned_by_department: Option<String>,
    ) -> Course {
        let now = now_rfc3339();
        Course {
            id: new_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            instructor: draft.instructor.clone(),
            lectures,
            status: CourseStatus::Active,
            progress: 0,
            current_lecture_index: 0,
            completed: false,
            assigned_by_department,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Attach a course to one fresher or to every member of a department.
    ///
    /// Department mode writes one course document per member in a
    /// single atomic batch and fails fast on an empty department.
    pub fn assign_course(
        &self,
        draft: &CourseDraft,
        target: &AssignTarget,
    ) -> Result<AssignOutcome, OnboardError> {
        let lectures = self.resolve_draft(draft)?;

        match target {
            AssignTarget::Individual { fresher_id } => {
                let _fresher: Fresher = self.get_doc("users", fresher_id)?;
                let course = Self::new_course(draft, lectures, None);
                self.create_doc(&Self::courses_of(fresher_id), &course.id, &course)?;
                info!(fresher_id, course_id = %course.id, "course assigned");
                Ok(AssignOutcome { assigned_count: 1 })
            }
            AssignTarget::Department { department_id } => {
                let department = self.get_department(department_id)?;
                let members = self.department_members(department_id)?;
                if members.is_empty() {
                    return Err(OnboardError::Validation(format!(
                        "no freshers found in department '{}'",
                        department.name
                    )));
                }

                let mut ops = Vec::with_capacity(members.len());
                for member in &members {
                    let course =
                        Self::new_course(draft, lectures.clone(), Some(department_id.clone()));
                    let data = serde_json::to_value(&course)
                        .map_err(|e| OnboardError::Internal(e.to_string()))?;
                    ops.push(WriteOp::Set {
                        collection: Self::courses_of(&member.id),
                        id: course.id.clone(),
                        data,
                    });
                }

                self.store.batch_write(&ops)?;
                info!(
                    department_id,
                    assigned = members.len(),
                    "course assigned to department"
                );
                Ok(AssignOutcome {
                    assigned_count: members.len(),
                })
            }
        }
    }

    /// Courses assigned to a fresher, newest first.
    pub fn courses_for_fresher(&self, fresher_id: &str) -> Result<Vec<Course>, OnboardError> {
        self.query_docs(
            &Self::courses_of(fresher_id),
            &[],
            Some(&OrderBy::desc("createdAt")),
            None,
        )
    }

    /// Fetch one course assignment.
    pub fn get_course(&self, fresher_id: &str, course_id: &str) -> Result<Course, OnboardError> {
        self.get_doc(&Self::courses_of(fresher_id), course_id)
    }

    /// Remove exactly one course assignment. Department member counts
    /// are untouched: membership is per-fresher, not per-course.
    pub fn delete_course(&self, fresher_id: &str, course_id: &str) -> Result<(), OnboardError> {
        let collection = Self::courses_of(fresher_id);
        // Check existence so a bad id is reported, not silently ignored.
        let _course: Course = self.get_doc(&collection, course_id)?;
        self.store.delete(&collection, course_id)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::NewFresher;
    use crate::service::testutil::{TestEnv, test_env};

    pub(crate) fn draft(lecture_count: usize) -> CourseDraft {
        CourseDraft {
            title: "Rust Onboarding".into(),
            description: "Intro track".into(),
            instructor: "Sam".into(),
            lectures: (0..lecture_count)
                .map(|i| LectureDraft {
                    title: format!("Lecture {}", i + 1),
                    description: String::new(),
                    duration: None,
                    video_url: Some(format!("http://media.local/l{}.mp4", i + 1)),
                    video_data: None,
                    video_name: None,
                })
                .collect(),
        }
    }

    pub(crate) fn provision(env: &TestEnv, email: &str, dept: &str) -> String {
        env.svc
            .provision_fresher(NewFresher {
                name: email.split('@').next().unwrap_or("x").to_string(),
                email: email.to_string(),
                department_name: dept.to_string(),
                start_date: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_individual_assignment() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");

        let outcome = env
            .svc
            .assign_course(&draft(3), &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();
        assert_eq!(outcome.assigned_count, 1);

        let courses = env.svc.courses_for_fresher(&id).unwrap();
        assert_eq!(courses.len(), 1);
        let course = &courses[0];
        assert_eq!(course.status, CourseStatus::Active);
        assert_eq!(course.progress, 0);
        assert_eq!(course.current_lecture_index, 0);
        assert!(!course.completed);
        assert!(course.assigned_by_department.is_none());
        assert_eq!(course.lectures.len(), 3);
    }

    #[test]
    fn test_department_assignment_batches_all_members() {
        let env = test_env();
        let a = provision(&env, "a@x.com", "QA");
        let b = provision(&env, "b@x.com", "QA");
        provision(&env, "c@x.com", "Ops");
        let dept = env.svc.resolve_department("QA").unwrap();

        let outcome = env
            .svc
            .assign_course(
                &draft(2),
                &AssignTarget::Department { department_id: dept.id.clone() },
            )
            .unwrap();
        assert_eq!(outcome.assigned_count, 2);

        for id in [&a, &b] {
            let courses = env.svc.courses_for_fresher(id).unwrap();
            assert_eq!(courses.len(), 1);
            assert_eq!(
                courses[0].assigned_by_department.as_deref(),
                Some(dept.id.as_str())
            );
        }
    }

    #[test]
    fn test_department_assignment_rejects_empty_department() {
        let env = test_env();
        let dept = env.svc.resolve_department("Ghost Team").unwrap();
        let err = env
            .svc
            .assign_course(
                &draft(1),
                &AssignTarget::Department { department_id: dept.id },
            )
            .unwrap_err();
        match err {
            OnboardError::Validation(msg) => assert!(msg.contains("no freshers")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_lectures_rejected() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        let err = env
            .svc
            .assign_course(&draft(0), &AssignTarget::Individual { fresher_id: id })
            .unwrap_err();
        assert!(matches!(err, OnboardError::Validation(_)));
    }

    #[test]
    fn test_media_bytes_resolve_before_write() {
        use base64::Engine as _;
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");

        let mut course_draft = draft(1);
        course_draft.lectures[0].video_url = None;
        course_draft.lectures[0].video_data =
            Some(base64::engine::general_purpose::STANDARD.encode(b"fake mp4 bytes"));
        course_draft.lectures[0].video_name = Some("intro clip.mp4".into());

        env.svc
            .assign_course(&course_draft, &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();

        let course = &env.svc.courses_for_fresher(&id).unwrap()[0];
        let url = &course.lectures[0].video_url;
        assert!(url.starts_with("http://localhost:8080/media/videos/lectures/"));
        assert!(url.ends_with("intro_clip.mp4"));
    }

    #[test]
    fn test_lecture_without_media_rejected() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        let mut bad = draft(1);
        bad.lectures[0].video_url = None;
        let err = env
            .svc
            .assign_course(&bad, &AssignTarget::Individual { fresher_id: id })
            .unwrap_err();
        assert!(matches!(err, OnboardError::Validation(_)));
    }

    #[test]
    fn test_delete_course() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        env.svc
            .assign_course(&draft(1), &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();
        let course_id = env.svc.courses_for_fresher(&id).unwrap()[0].id.clone();

        env.svc.delete_course(&id, &course_id).unwrap();
        assert!(env.svc.courses_for_fresher(&id).unwrap().is_empty());
        assert!(matches!(
            env.svc.delete_course(&id, &course_id),
            Err(OnboardError::NotFound(_))
        ));
        // Member count untouched by course deletion.
        assert_eq!(env.svc.resolve_department("QA").unwrap().member_count, 1);
    }
}

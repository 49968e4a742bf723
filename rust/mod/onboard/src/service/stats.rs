use serde::Serialize;
use serde_json::json;

use crate::model::LoginLogEntry;
use crate::service::{OnboardError, OnboardService};

/// Aggregate counts for the admin dashboard. Re-derived from the store
/// on every call, never cached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub freshers: usize,
    pub courses: usize,
    pub submissions: usize,
    pub active_users: usize,
}

impl OnboardService {
    /// Number of fresher profiles.
    pub fn freshers_count(&self) -> Result<usize, OnboardError> {
        Ok(self
            .store
            .query("users", &[("role", json!("fresher"))], None, None)?
            .len())
    }

    /// Number of course assignments across all freshers.
    pub fn courses_count(&self) -> Result<usize, OnboardError> {
        Ok(self.store.collection_group("courses")?.len())
    }

    /// Number of assessment tasks across all freshers.
    pub fn submissions_count(&self) -> Result<usize, OnboardError> {
        Ok(self.store.collection_group("assignments")?.len())
    }

    /// Distinct identities that logged in within the active window.
    pub fn active_users_count(&self) -> Result<usize, OnboardError> {
        let cutoff =
            chrono::Utc::now() - chrono::Duration::hours(self.config.active_window_hours);
        let logs: Vec<LoginLogEntry> = self.query_docs("login_logs", &[], None, None)?;

        let mut seen = std::collections::HashSet::new();
        for entry in logs {
            if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(&entry.timestamp) {
                if ts.with_timezone(&chrono::Utc) >= cutoff {
                    seen.insert(entry.uid);
                }
            }
        }
        Ok(seen.len())
    }

    /// All dashboard counts in one call.
    pub fn counts(&self) -> Result<Counts, OnboardError> {
        Ok(Counts {
            freshers: self.freshers_count()?,
            courses: self.courses_count()?,
            submissions: self.submissions_count()?,
            active_users: self.active_users_count()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::AssignTarget;
    use crate::service::course::tests::{draft, provision};
    use crate::service::testutil::test_env;

    #[test]
    fn test_counts_track_store_state() {
        let env = test_env();
        let a = provision(&env, "a@x.com", "QA");
        let b = provision(&env, "b@x.com", "QA");

        env.svc
            .assign_course(&draft(2), &AssignTarget::Individual { fresher_id: a.clone() })
            .unwrap();
        env.svc
            .assign_course(&draft(2), &AssignTarget::Individual { fresher_id: b.clone() })
            .unwrap();
        let course_id = env.svc.courses_for_fresher(&a).unwrap()[0].id.clone();
        env.svc.finish_course(&a, &course_id).unwrap();

        let counts = env.svc.counts().unwrap();
        assert_eq!(counts.freshers, 2);
        assert_eq!(counts.courses, 2);
        assert_eq!(counts.submissions, 1);
        // No logins recorded yet.
        assert_eq!(counts.active_users, 0);
    }

    #[test]
    fn test_active_users_counts_distinct_recent_logins() {
        let env = test_env();
        provision(&env, "a@x.com", "QA");
        let p = env
            .svc
            .provision_fresher(crate::model::NewFresher {
                name: "Bo".into(),
                email: "bo@x.com".into(),
                department_name: "QA".into(),
                start_date: None,
            })
            .unwrap();
        env.svc.login("bo@x.com", &p.temporary_password, "ip").unwrap();
        env.svc.login("bo@x.com", &p.temporary_password, "ip").unwrap();

        // Two logins from one identity count once.
        assert_eq!(env.svc.active_users_count().unwrap(), 1);
    }
}

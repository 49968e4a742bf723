use std::collections::HashMap;

use serde_json::json;
use tracing::{error, info};

use hexaboard_core::{ListParams, ListResult, now_rfc3339};
use hexaboard_doc::WriteOp;
use hexaboard_identity::{IdentityError, NewIdentity};

use crate::model::{
    CsvImportReport, Fresher, ImportFailure, ImportSuccess, NewFresher, Provisioned,
};
use crate::service::password::generate_password;
use crate::service::{OnboardError, OnboardService};

/// Minimal structural email check: one '@' with a dotted domain.
fn validate_email(email: &str) -> Result<(), OnboardError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(OnboardError::Validation(format!("invalid email: {}", email)))
    }
}

impl OnboardService {
    /// Provision a single fresher: resolve the department, mint an
    /// identity, write the profile at the identity id, bump the member
    /// count, and queue the welcome notification.
    ///
    /// The steps are ordered but not atomic. An identity-creation
    /// failure aborts cleanly; a failure after that leaves an orphaned
    /// identity, surfaced as a partial-failure error with enough detail
    /// to reconcile. Not idempotent: a second call with the same email
    /// fails on the duplicate identity, which is what prevents
    /// double-provisioning.
    pub fn provision_fresher(&self, input: NewFresher) -> Result<Provisioned, OnboardError> {
        self.provision_with_role(input, "fresher")
    }

    pub(crate) fn provision_with_role(
        &self,
        input: NewFresher,
        role: &str,
    ) -> Result<Provisioned, OnboardError> {
        if input.department_name.is_empty() {
            return Err(OnboardError::Validation("department name is required".into()));
        }
        validate_email(&input.email)?;

        // 1. Resolve department (find-or-create).
        let department = self.resolve_department(&input.department_name)?;

        // 2. Generate the temporary password.
        let password = generate_password(self.config.password_length);

        // 3. Mint the identity; its id becomes the profile id.
        let identity = self.identity.create_identity(NewIdentity {
            email: input.email.clone(),
            password: password.clone(),
            display_name: input.name.clone(),
            role: role.to_string(),
        })?;

        // 4. Profile document at the identity id.
        let fresher = Fresher {
            id: identity.id.clone(),
            name: input.name.clone(),
            email: input.email.clone(),
            role: role.to_string(),
            department_id: Some(department.id.clone()),
            department_name: Some(input.department_name.clone()),
            status: "active".to_string(),
            start_date: input.start_date.clone(),
            created_at: now_rfc3339(),
        };
        if let Err(e) = self.create_doc("users", &identity.id, &fresher) {
            error!(
                identity_id = %identity.id,
                email = %input.email,
                error = %e,
                "profile write failed after identity creation; orphaned identity needs cleanup"
            );
            return Err(OnboardError::Partial(format!(
                "identity {} created for {} but profile write failed: {}",
                identity.id, input.email, e
            )));
        }

        // 5. Member count bump, co-located with the membership write.
        let now = now_rfc3339();
        if let Err(e) = self.store.batch_write(&[
            WriteOp::Increment {
                collection: "departments".into(),
                id: department.id.clone(),
                field: "memberCount".into(),
                delta: 1,
            },
            WriteOp::Update {
                collection: "departments".into(),
                id: department.id.clone(),
                fields: super::field_map(&[("updatedAt", json!(now))]),
            },
        ]) {
            error!(
                identity_id = %identity.id,
                department_id = %department.id,
                error = %e,
                "member count update failed after profile creation"
            );
            return Err(OnboardError::Partial(format!(
                "fresher {} provisioned but member count update for department {} failed: {}",
                identity.id, department.id, e
            )));
        }

        // 6. Welcome notification, fire-and-forget.
        self.enqueue_welcome_email(&input.email, &input.name, &input.email, &password);

        info!(id = %identity.id, email = %input.email, "fresher provisioned");
        Ok(Provisioned {
            id: identity.id,
            temporary_password: password,
        })
    }

    /// Bulk-import freshers from CSV text with `email,name,department`
    /// columns (optional `role`). Every row is attempted independently
    /// and reported in the per-row result lists.
    pub fn import_freshers_csv(&self, csv_text: &str) -> Result<CsvImportReport, OnboardError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut report = CsvImportReport::default();

        for record in reader.deserialize::<CsvRow>() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    report.failed.push(ImportFailure {
                        email: String::new(),
                        error: format!("unreadable row: {}", e),
                    });
                    continue;
                }
            };

            let email = row.email.clone();
            let outcome = self.provision_with_role(
                NewFresher {
                    name: row.name,
                    email: row.email,
                    department_name: row.department,
                    start_date: None,
                },
                row.role.as_deref().unwrap_or("fresher"),
            );
            match outcome {
                Ok(_) => report.success.push(ImportSuccess { email }),
                Err(e) => report.failed.push(ImportFailure {
                    email,
                    error: e.to_string(),
                }),
            }
        }

        Ok(report)
    }

    /// Assign every fresher that has a free-text department name but no
    /// resolved department link.
    ///
    /// Departments are resolved (find-or-create) during the scan; all
    /// profile updates and member-count increments then commit as one
    /// atomic batch. Increments use the store's atomic primitive, so
    /// concurrent external count changes during the scan are not lost.
    /// Re-running immediately assigns zero freshers: profiles already
    /// carrying a `departmentId` are skipped.
    pub fn auto_assign_freshers(&self) -> Result<usize, OnboardError> {
        let freshers: Vec<Fresher> =
            self.query_docs("users", &[("role", json!("fresher"))], None, None)?;

        let mut ops = Vec::new();
        let mut per_department: HashMap<String, i64> = HashMap::new();
        let mut assigned = 0usize;

        for fresher in freshers {
            let name = match (&fresher.department_name, &fresher.department_id) {
                (Some(name), None) if !name.is_empty() => name.clone(),
                _ => continue,
            };

            let department = self.resolve_department(&name)?;
            ops.push(WriteOp::Update {
                collection: "users".into(),
                id: fresher.id.clone(),
                fields: super::field_map(&[("departmentId", json!(department.id))]),
            });
            *per_department.entry(department.id).or_insert(0) += 1;
            assigned += 1;
        }

        let now = now_rfc3339();
        for (department_id, count) in per_department {
            ops.push(WriteOp::Increment {
                collection: "departments".into(),
                id: department_id.clone(),
                field: "memberCount".into(),
                delta: count,
            });
            ops.push(WriteOp::Update {
                collection: "departments".into(),
                id: department_id,
                fields: super::field_map(&[("updatedAt", json!(now))]),
            });
        }

        if !ops.is_empty() {
            self.store.batch_write(&ops)?;
        }

        info!(assigned, "auto-assignment pass complete");
        Ok(assigned)
    }

    /// Delete a fresher: identity first, then the profile document,
    /// then every document in the fresher's subcollections.
    ///
    /// An identity that is already gone is tolerated; deletion is
    /// idempotent for that specific failure mode. Any other identity
    /// error aborts before touching the profile.
    pub fn delete_fresher(&self, fresher_id: &str) -> Result<(), OnboardError> {
        match self.identity.delete_identity(fresher_id) {
            Ok(()) => {}
            Err(IdentityError::NotFound(_)) => {
                info!(fresher_id, "identity already removed; deleting profile anyway");
            }
            Err(e) => return Err(e.into()),
        }

        let mut ops = vec![WriteOp::Delete {
            collection: "users".into(),
            id: fresher_id.to_string(),
        }];
        for collection in [
            Self::courses_of(fresher_id),
            Self::tasks_of(fresher_id),
            Self::chat_of(fresher_id),
        ] {
            for doc in self.store.query(&collection, &[], None, None)? {
                ops.push(WriteOp::Delete {
                    collection: collection.clone(),
                    id: doc.id,
                });
            }
        }

        self.store.batch_write(&ops).map_err(|e| {
            error!(fresher_id, error = %e, "profile deletion failed after identity removal");
            OnboardError::Partial(format!(
                "identity {} deleted but profile cleanup failed: {}",
                fresher_id, e
            ))
        })?;
        Ok(())
    }

    /// Get a fresher profile by id.
    pub fn get_fresher(&self, id: &str) -> Result<Fresher, OnboardError> {
        self.get_doc("users", id)
    }

    /// List fresher profiles.
    pub fn list_freshers(&self, params: &ListParams) -> Result<ListResult<Fresher>, OnboardError> {
        let all: Vec<Fresher> =
            self.query_docs("users", &[("role", json!("fresher"))], None, None)?;
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset)
            .take(params.limit)
            .collect();
        Ok(ListResult { items, total })
    }
}

/// One CSV intake row. Unknown columns are ignored.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    email: String,
    name: String,
    #[serde(default)]
    role: Option<String>,
    department: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::test_env;

    fn ana() -> NewFresher {
        NewFresher {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            department_name: "QA".into(),
            start_date: Some("2024-01-10".into()),
        }
    }

    #[test]
    fn test_provision_creates_department_profile_and_mail() {
        let env = test_env();
        let provisioned = env.svc.provision_fresher(ana()).unwrap();
        assert_eq!(provisioned.temporary_password.len(), 10);

        let dept = env.svc.resolve_department("QA").unwrap();
        assert_eq!(dept.member_count, 1);

        let fresher = env.svc.get_fresher(&provisioned.id).unwrap();
        assert_eq!(fresher.role, "fresher");
        assert_eq!(fresher.department_id.as_deref(), Some(dept.id.as_str()));
        assert_eq!(fresher.start_date.as_deref(), Some("2024-01-10"));

        // Exactly one welcome notification queued.
        assert_eq!(env.svc.pending_outbox().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_email_aborts_before_profile() {
        let env = test_env();
        env.svc.provision_fresher(ana()).unwrap();
        let err = env.svc.provision_fresher(ana()).unwrap_err();
        assert!(matches!(err, OnboardError::Conflict(_)));

        // Only the first profile exists; count incremented once.
        assert_eq!(env.svc.list_freshers(&Default::default()).unwrap().total, 1);
        assert_eq!(env.svc.resolve_department("QA").unwrap().member_count, 1);
    }

    #[test]
    fn test_validation_rejected_before_any_write() {
        let env = test_env();
        let mut bad = ana();
        bad.email = "not-an-email".into();
        assert!(matches!(
            env.svc.provision_fresher(bad),
            Err(OnboardError::Validation(_))
        ));

        let mut no_dept = ana();
        no_dept.department_name = String::new();
        assert!(matches!(
            env.svc.provision_fresher(no_dept),
            Err(OnboardError::Validation(_))
        ));

        assert_eq!(env.svc.list_freshers(&Default::default()).unwrap().total, 0);
        assert_eq!(env.svc.list_departments(&Default::default()).unwrap().total, 0);
    }

    #[test]
    fn test_csv_import_reports_per_row() {
        let env = test_env();
        let csv = "email,name,department\n\
                   a@x.com,Ana,QA\n\
                   a@x.com,Dup,QA\n\
                   c@x.com,Cleo,Platform\n";
        let report = env.svc.import_freshers_csv(csv).unwrap();
        assert_eq!(report.success.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].email, "a@x.com");
        assert_eq!(report.success[0].email, "a@x.com");
        assert_eq!(report.success[1].email, "c@x.com");
    }

    #[test]
    fn test_auto_assign_then_noop() {
        let env = test_env();
        // Legacy-shaped profiles: department name only, no link.
        for (id, name, dept) in [("u1", "Ana", "QA"), ("u2", "Bo", "QA"), ("u3", "Cy", "Ops")] {
            env.svc
                .set_doc(
                    "users",
                    id,
                    &serde_json::json!({
                        "id": id,
                        "name": name,
                        "email": format!("{}@x.com", id),
                        "role": "fresher",
                        "departmentName": dept,
                        "status": "active",
                        "createdAt": hexaboard_core::now_rfc3339(),
                    }),
                )
                .unwrap();
        }

        assert_eq!(env.svc.auto_assign_freshers().unwrap(), 3);
        let qa = env.svc.resolve_department("QA").unwrap();
        assert_eq!(qa.member_count, 2);
        assert_eq!(env.svc.resolve_department("Ops").unwrap().member_count, 1);
        assert_eq!(env.svc.department_members(&qa.id).unwrap().len(), 2);

        // Second pass finds nothing to do and drifts no counters.
        assert_eq!(env.svc.auto_assign_freshers().unwrap(), 0);
        assert_eq!(env.svc.resolve_department("QA").unwrap().member_count, 2);
    }

    #[test]
    fn test_delete_fresher_removes_subcollections() {
        let env = test_env();
        let provisioned = env.svc.provision_fresher(ana()).unwrap();
        let id = provisioned.id;

        env.svc
            .set_doc(
                &OnboardService::courses_of(&id),
                "c1",
                &serde_json::json!({"title": "T"}),
            )
            .unwrap();
        env.svc
            .set_doc(
                &OnboardService::chat_of(&id),
                "m1",
                &serde_json::json!({"text": "hi"}),
            )
            .unwrap();

        env.svc.delete_fresher(&id).unwrap();
        assert!(matches!(
            env.svc.get_fresher(&id),
            Err(OnboardError::NotFound(_))
        ));
        assert!(
            env.svc
                .store
                .query(&OnboardService::courses_of(&id), &[], None, None)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_delete_fresher_tolerates_missing_identity() {
        let env = test_env();
        let provisioned = env.svc.provision_fresher(ana()).unwrap();
        env.svc.identity.delete_identity(&provisioned.id).unwrap();

        // Identity is gone, but deletion still succeeds and removes
        // the profile document.
        env.svc.delete_fresher(&provisioned.id).unwrap();
        assert!(matches!(
            env.svc.get_fresher(&provisioned.id),
            Err(OnboardError::NotFound(_))
        ));
    }
}

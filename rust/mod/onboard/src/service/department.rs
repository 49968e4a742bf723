use serde_json::json;
use sha2::{Digest, Sha256};

use hexaboard_core::{ListParams, ListResult, now_rfc3339};
use hexaboard_doc::{OrderBy, WriteOp};

use crate::model::{CreateDepartment, Department, Fresher};
use crate::service::{OnboardError, OnboardService};

/// Deterministic department document id for a given name.
///
/// The store has no atomic find-or-create, so the id is derived from
/// the exact name (case and whitespace significant) and creation goes
/// through a conditional write. Two concurrent resolutions of the same
/// unseen name then collapse onto one document instead of racing to
/// create duplicates.
pub(crate) fn department_id(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

impl OnboardService {
    /// Resolve a department by exact name, creating it if absent.
    ///
    /// Returns the existing record unchanged on a hit. On a miss,
    /// creates a department with `memberCount = 0` and placeholder
    /// manager/location.
    pub fn resolve_department(&self, name: &str) -> Result<Department, OnboardError> {
        if name.is_empty() {
            return Err(OnboardError::Validation("department name is required".into()));
        }

        let id = department_id(name);
        if let Some(existing) = self.try_get_doc::<Department>("departments", &id)? {
            return Ok(existing);
        }

        let now = now_rfc3339();
        let department = Department {
            id: id.clone(),
            name: name.to_string(),
            description: format!("Department for {}", name),
            manager: String::new(),
            location: String::new(),
            member_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        match self.create_doc("departments", &id, &department) {
            Ok(()) => Ok(department),
            // Lost the create race: someone else just made it. Use theirs.
            Err(OnboardError::Conflict(_)) => self.get_doc("departments", &id),
            Err(e) => Err(e),
        }
    }

    /// Create a department explicitly from the admin console.
    pub fn create_department(&self, input: CreateDepartment) -> Result<Department, OnboardError> {
        if input.name.is_empty() {
            return Err(OnboardError::Validation("department name is required".into()));
        }

        let id = department_id(&input.name);
        let now = now_rfc3339();
        let department = Department {
            id: id.clone(),
            name: input.name,
            description: input.description,
            manager: input.manager,
            location: input.location,
            member_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.create_doc("departments", &id, &department)
            .map_err(|e| match e {
                OnboardError::Conflict(_) => OnboardError::Conflict(format!(
                    "department '{}' already exists",
                    department.name
                )),
                other => other,
            })?;
        Ok(department)
    }

    /// Get a department by id.
    pub fn get_department(&self, id: &str) -> Result<Department, OnboardError> {
        self.get_doc("departments", id)
    }

    /// List departments, newest first.
    pub fn list_departments(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<Department>, OnboardError> {
        let all: Vec<Department> =
            self.query_docs("departments", &[], Some(&OrderBy::desc("createdAt")), None)?;
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset)
            .take(params.limit)
            .collect();
        Ok(ListResult { items, total })
    }

    /// Freshers whose resolved department link points at `department_id`.
    pub fn department_members(&self, department_id: &str) -> Result<Vec<Fresher>, OnboardError> {
        self.query_docs(
            "users",
            &[
                ("role", json!("fresher")),
                ("departmentId", json!(department_id)),
            ],
            None,
            None,
        )
    }

    /// Detach a fresher from a department, decrementing the member count.
    pub fn remove_member(
        &self,
        fresher_id: &str,
        department_id: &str,
    ) -> Result<(), OnboardError> {
        let fresher: Fresher = self.get_doc("users", fresher_id)?;
        if fresher.department_id.as_deref() != Some(department_id) {
            return Err(OnboardError::Validation(format!(
                "fresher {} is not a member of department {}",
                fresher_id, department_id
            )));
        }

        let now = now_rfc3339();
        self.store.batch_write(&[
            WriteOp::Update {
                collection: "users".into(),
                id: fresher_id.to_string(),
                fields: super::field_map(&[("departmentId", serde_json::Value::Null)]),
            },
            WriteOp::Increment {
                collection: "departments".into(),
                id: department_id.to_string(),
                field: "memberCount".into(),
                delta: -1,
            },
            WriteOp::Update {
                collection: "departments".into(),
                id: department_id.to_string(),
                fields: super::field_map(&[("updatedAt", json!(now))]),
            },
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::test_env;

    #[test]
    fn test_resolve_twice_returns_same_id_one_create() {
        let env = test_env();
        let first = env.svc.resolve_department("QA").unwrap();
        let second = env.svc.resolve_department("QA").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.member_count, 0);

        let list = env.svc.list_departments(&Default::default()).unwrap();
        assert_eq!(list.total, 1);
    }

    #[test]
    fn test_name_is_case_and_whitespace_sensitive() {
        let env = test_env();
        let a = env.svc.resolve_department("QA").unwrap();
        let b = env.svc.resolve_department("qa").unwrap();
        let c = env.svc.resolve_department(" QA").unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_resolve_preserves_existing_record() {
        let env = test_env();
        env.svc
            .create_department(CreateDepartment {
                name: "QA".into(),
                description: "Quality".into(),
                manager: "Pat".into(),
                location: "Floor 3".into(),
            })
            .unwrap();
        let resolved = env.svc.resolve_department("QA").unwrap();
        assert_eq!(resolved.manager, "Pat");
        assert_eq!(resolved.description, "Quality");
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let env = test_env();
        env.svc
            .create_department(CreateDepartment {
                name: "QA".into(),
                description: String::new(),
                manager: String::new(),
                location: String::new(),
            })
            .unwrap();
        let err = env
            .svc
            .create_department(CreateDepartment {
                name: "QA".into(),
                description: String::new(),
                manager: String::new(),
                location: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, OnboardError::Conflict(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let env = test_env();
        assert!(matches!(
            env.svc.resolve_department(""),
            Err(OnboardError::Validation(_))
        ));
    }
}

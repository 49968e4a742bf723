use tracing::info;

use hexaboard_core::{new_id, now_rfc3339};
use hexaboard_doc::OrderBy;

use crate::model::{LoginLogEntry, LoginResponse};
use crate::service::{OnboardError, OnboardService};

const LOGIN_LOGS: &str = "login_logs";

impl OnboardService {
    /// Verify credentials, issue a bearer token, and append the audit
    /// log entry. The log is append-only: there is no mutation or
    /// deletion path.
    pub fn login(&self, email: &str, password: &str, ip: &str) -> Result<LoginResponse, OnboardError> {
        if email.is_empty() || password.is_empty() {
            return Err(OnboardError::Validation("email and password are required".into()));
        }

        let identity = self.identity.verify_password(email, password)?;
        let token = self.identity.issue_token(&identity)?;

        let entry = LoginLogEntry {
            id: new_id(),
            uid: identity.id.clone(),
            role: identity.role.clone(),
            ip: ip.to_string(),
            timestamp: now_rfc3339(),
        };
        self.create_doc(LOGIN_LOGS, &entry.id, &entry)?;

        info!(uid = %identity.id, role = %identity.role, "login");
        Ok(LoginResponse {
            token,
            uid: identity.id,
            role: identity.role,
        })
    }

    /// Recent login log entries, newest first.
    pub fn login_logs(&self, limit: usize) -> Result<Vec<LoginLogEntry>, OnboardError> {
        self.query_docs(
            LOGIN_LOGS,
            &[],
            Some(&OrderBy::desc("timestamp")),
            Some(limit),
        )
    }
}

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use hexaboard_core::{new_id, now_rfc3339};
use hexaboard_doc::OrderBy;

use crate::service::{OnboardError, OnboardService};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("send failed: {0}")]
    Send(String),
}

/// Notification sink. Delivery failures are logged by the outbox worker
/// and retried up to a bound; they never fail the enclosing workflow.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Mailer that just logs. Stands in where no SMTP relay is configured.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
        info!(to, subject, "mail delivery (log only)");
        Ok(())
    }
}

/// Delivery state of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

/// A queued notification. Durable, so enqueueing and delivery are
/// decoupled: workflows enqueue and move on, the worker delivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub status: OutboxStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const OUTBOX: &str = "mail_outbox";

impl OnboardService {
    /// Queue a welcome notification carrying the temporary password.
    ///
    /// Callers treat this as fire-and-forget: a failure to enqueue is
    /// logged, never propagated.
    pub fn enqueue_welcome_email(&self, email: &str, name: &str, user_id: &str, password: &str) {
        let html = format!(
            "<p>Hello {name},</p>\
             <p>Your account has been created for HexaBoard. Here are your login details:</p>\
             <p><strong>User ID:</strong> {user_id}</p>\
             <p><strong>Password:</strong> {password}</p>\
             <p>Please keep this information secure.</p>\
             <p>Thank you,<br>The HexaBoard Team</p>"
        );
        if let Err(e) = self.enqueue_email(email, "Welcome to HexaBoard - Your Account Details!", &html)
        {
            warn!(email, error = %e, "failed to enqueue welcome email");
        }
    }

    /// Append a pending entry to the mail outbox.
    pub fn enqueue_email(&self, to: &str, subject: &str, html: &str) -> Result<(), OnboardError> {
        let now = now_rfc3339();
        let entry = OutboxEntry {
            id: new_id(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.create_doc(OUTBOX, &entry.id, &entry)
    }

    /// Pending outbox entries, oldest first.
    pub fn pending_outbox(&self) -> Result<Vec<OutboxEntry>, OnboardError> {
        self.query_docs(
            OUTBOX,
            &[("status", json!("pending"))],
            Some(&OrderBy::asc("createdAt")),
            None,
        )
    }

    /// Attempt delivery of every pending entry once.
    ///
    /// Entries that fail are kept pending with an incremented attempt
    /// counter until `max_attempts`, then marked failed for operator
    /// attention. Returns the number of entries delivered.
    pub fn process_outbox_once(
        &self,
        mailer: &dyn Mailer,
        max_attempts: u32,
    ) -> Result<usize, OnboardError> {
        let pending = self.pending_outbox()?;
        let mut sent = 0;

        for entry in pending {
            let now = now_rfc3339();
            match mailer.send(&entry.to, &entry.subject, &entry.html) {
                Ok(()) => {
                    self.update_doc(
                        OUTBOX,
                        &entry.id,
                        &[("status", json!("sent")), ("updatedAt", json!(now))],
                    )?;
                    sent += 1;
                }
                Err(e) => {
                    let attempts = entry.attempts + 1;
                    let status = if attempts >= max_attempts { "failed" } else { "pending" };
                    warn!(
                        to = %entry.to,
                        attempts,
                        error = %e,
                        "outbox delivery attempt failed"
                    );
                    self.update_doc(
                        OUTBOX,
                        &entry.id,
                        &[
                            ("status", json!(status)),
                            ("attempts", json!(attempts)),
                            ("lastError", json!(e.to_string())),
                            ("updatedAt", json!(now)),
                        ],
                    )?;
                }
            }
        }

        Ok(sent)
    }
}

pub mod chat;
pub mod completer;
pub mod course;
pub mod department;
pub mod fresher;
pub mod login;
pub mod outbox;
pub mod password;
pub mod progress;
pub mod stats;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use hexaboard_doc::{DocError, DocumentStore, OrderBy};
use hexaboard_identity::{IdentityError, IdentityProvider};
use hexaboard_media::{MediaError, MediaStore};

use crate::service::completer::TextCompleter;

/// Onboard service error type.
#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A workflow committed some steps and then failed. The message
    /// carries identity id / email so an operator can reconcile.
    #[error("partial failure: {0}")]
    Partial(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<OnboardError> for hexaboard_core::ServiceError {
    fn from(e: OnboardError) -> Self {
        match e {
            OnboardError::NotFound(m) => hexaboard_core::ServiceError::NotFound(m),
            OnboardError::Conflict(m) => hexaboard_core::ServiceError::Conflict(m),
            OnboardError::Validation(m) => hexaboard_core::ServiceError::Validation(m),
            OnboardError::Unauthorized(m) => hexaboard_core::ServiceError::Unauthorized(m),
            OnboardError::Partial(m) => hexaboard_core::ServiceError::Partial(m),
            OnboardError::Storage(m) => hexaboard_core::ServiceError::Storage(m),
            OnboardError::Internal(m) => hexaboard_core::ServiceError::Internal(m),
        }
    }
}

impl From<DocError> for OnboardError {
    fn from(e: DocError) -> Self {
        match e {
            DocError::NotFound(m) => OnboardError::NotFound(m),
            DocError::AlreadyExists(m) => OnboardError::Conflict(m),
            DocError::Storage(m) => OnboardError::Storage(m),
            DocError::Serialization(m) => OnboardError::Internal(m),
        }
    }
}

impl From<MediaError> for OnboardError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::InvalidKey(m) => OnboardError::Validation(format!("invalid media key: {}", m)),
            MediaError::NotFound(m) => OnboardError::NotFound(m),
            MediaError::Io(m) => OnboardError::Storage(m),
        }
    }
}

impl From<IdentityError> for OnboardError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Duplicate(m) => OnboardError::Conflict(format!("identity already exists: {}", m)),
            IdentityError::NotFound(m) => OnboardError::NotFound(format!("identity {}", m)),
            IdentityError::Unauthorized(m) => OnboardError::Unauthorized(m),
            IdentityError::Storage(m) => OnboardError::Storage(m),
            IdentityError::Internal(m) => OnboardError::Internal(m),
        }
    }
}

/// Configuration for the onboard service.
#[derive(Debug, Clone)]
pub struct OnboardConfig {
    /// Length of generated temporary passwords.
    pub password_length: usize,
    /// Window for the active-users count, in hours.
    pub active_window_hours: i64,
    /// Assessment tasks fall due this many days after course completion.
    pub assessment_due_days: i64,
    /// How many recent chat messages feed the analytics histogram.
    pub analytics_window: usize,
}

impl Default for OnboardConfig {
    fn default() -> Self {
        Self {
            password_length: 10,
            active_window_hours: 24,
            assessment_due_days: 7,
            analytics_window: 100,
        }
    }
}

/// The onboard service. Holds storage and external-service handles,
/// all injected, so every collaborator is fakeable in tests.
pub struct OnboardService {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) media: Arc<dyn MediaStore>,
    pub(crate) completer: Arc<dyn TextCompleter>,
    pub(crate) config: OnboardConfig,
}

impl OnboardService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        media: Arc<dyn MediaStore>,
        completer: Arc<dyn TextCompleter>,
        config: OnboardConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            identity,
            media,
            completer,
            config,
        })
    }

    /// Verify a bearer token through the identity provider.
    pub fn verify_token(&self, token: &str) -> Result<hexaboard_identity::Claims, OnboardError> {
        Ok(self.identity.verify_token(token)?)
    }

    // ── Collection paths ──

    pub(crate) fn courses_of(fresher_id: &str) -> String {
        format!("users/{}/courses", fresher_id)
    }

    pub(crate) fn tasks_of(fresher_id: &str) -> String {
        format!("users/{}/assignments", fresher_id)
    }

    pub(crate) fn chat_of(fresher_id: &str) -> String {
        format!("users/{}/chatbot", fresher_id)
    }

    // ── Generic document helpers ──

    /// Fetch and deserialize a document, or NotFound.
    pub(crate) fn get_doc<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, OnboardError> {
        let value = self
            .store
            .get(collection, id)?
            .ok_or_else(|| OnboardError::NotFound(format!("{}/{}", collection, id)))?;
        serde_json::from_value(value).map_err(|e| OnboardError::Internal(e.to_string()))
    }

    /// Fetch and deserialize a document if present.
    pub(crate) fn try_get_doc<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, OnboardError> {
        match self.store.get(collection, id)? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| OnboardError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Serialize and conditionally create a document (fails if present).
    pub(crate) fn create_doc<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), OnboardError> {
        let value = serde_json::to_value(record).map_err(|e| OnboardError::Internal(e.to_string()))?;
        Ok(self.store.create(collection, id, &value)?)
    }

    /// Serialize and upsert a document.
    pub(crate) fn set_doc<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), OnboardError> {
        let value = serde_json::to_value(record).map_err(|e| OnboardError::Internal(e.to_string()))?;
        Ok(self.store.set(collection, id, &value)?)
    }

    /// Merge top-level fields into an existing document.
    pub(crate) fn update_doc(
        &self,
        collection: &str,
        id: &str,
        fields: &[(&str, Value)],
    ) -> Result<(), OnboardError> {
        Ok(self.store.update(collection, id, &field_map(fields))?)
    }

    /// Query and deserialize a collection.
    pub(crate) fn query_docs<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        order: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<T>, OnboardError> {
        let docs = self.store.query(collection, filters, order, limit)?;
        docs.into_iter()
            .map(|doc| {
                serde_json::from_value(doc.data).map_err(|e| OnboardError::Internal(e.to_string()))
            })
            .collect()
    }
}

/// Build a serde_json field map from (name, value) pairs.
pub(crate) fn field_map(fields: &[(&str, Value)]) -> serde_json::Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::service::completer::TextCompleter;
    use async_trait::async_trait;
    use hexaboard_doc::SqliteDocStore;
    use hexaboard_identity::LocalIdentityProvider;
    use hexaboard_media::FileStore;

    /// Completer stub: returns a fixed reply, or errors when `fail` is set.
    pub struct StubCompleter {
        pub reply: String,
        pub fail: bool,
    }

    #[async_trait]
    impl TextCompleter for StubCompleter {
        async fn complete(&self, _prompt: &str) -> Result<String, super::completer::CompleterError> {
            if self.fail {
                Err(super::completer::CompleterError::Backend("stub offline".into()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    pub struct TestEnv {
        pub svc: Arc<OnboardService>,
        // Media files live here for the duration of the test.
        _media_dir: tempfile::TempDir,
    }

    pub fn test_env_with_completer(completer: Arc<dyn TextCompleter>) -> TestEnv {
        let store = Arc::new(SqliteDocStore::open_in_memory().unwrap());
        let identity = Arc::new(LocalIdentityProvider::open_in_memory("test-secret").unwrap());
        let media_dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FileStore::open(media_dir.path(), "http://localhost:8080/media").unwrap());
        let svc = OnboardService::new(store, identity, media, completer, OnboardConfig::default());
        TestEnv {
            svc,
            _media_dir: media_dir,
        }
    }

    pub fn test_env() -> TestEnv {
        test_env_with_completer(Arc::new(StubCompleter {
            reply: "stub reply".into(),
            fail: false,
        }))
    }
}

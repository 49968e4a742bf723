use std::path::PathBuf;

/// Storage layout configuration shared by service binaries.
///
/// The binary resolves a data directory from its server config, then
/// derives per-store paths from it unless explicitly overridden.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base directory for all persistent state.
    pub data_dir: Option<PathBuf>,

    /// Path to the document store database file.
    /// Defaults to `{data_dir}/docs.sqlite` if not specified.
    pub doc_path: Option<PathBuf>,

    /// Path to the identity database file.
    /// Defaults to `{data_dir}/identity.sqlite` if not specified.
    pub identity_path: Option<PathBuf>,

    /// Directory for uploaded lecture media.
    /// Defaults to `{data_dir}/media/` if not specified.
    pub media_dir: Option<PathBuf>,

    /// Listen address for the HTTP server.
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            doc_path: None,
            identity_path: None,
            media_dir: None,
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServiceConfig {
    fn base_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the document store path.
    pub fn resolve_doc_path(&self) -> PathBuf {
        self.doc_path
            .clone()
            .unwrap_or_else(|| self.base_dir().join("docs.sqlite"))
    }

    /// Resolve the identity database path.
    pub fn resolve_identity_path(&self) -> PathBuf {
        self.identity_path
            .clone()
            .unwrap_or_else(|| self.base_dir().join("identity.sqlite"))
    }

    /// Resolve the media storage directory.
    pub fn resolve_media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.base_dir().join("media"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_resolution_defaults() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/var/lib/hexaboard")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_doc_path(),
            PathBuf::from("/var/lib/hexaboard/docs.sqlite")
        );
        assert_eq!(
            config.resolve_media_dir(),
            PathBuf::from("/var/lib/hexaboard/media")
        );
    }

    #[test]
    fn test_explicit_override_wins() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            doc_path: Some(PathBuf::from("/elsewhere/d.sqlite")),
            ..Default::default()
        };
        assert_eq!(config.resolve_doc_path(), PathBuf::from("/elsewhere/d.sqlite"));
    }
}

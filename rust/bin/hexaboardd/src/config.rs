//! Server-side configuration, loaded from a TOML file.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address; the --listen flag overrides it.
    #[serde(default = "default_listen")]
    pub listen: String,

    pub storage: StorageConfig,

    pub auth: AuthConfig,

    /// Bootstrap admin account, created on first start.
    pub admin: AdminConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all persistent state.
    pub data_dir: String,

    /// Base URL under which stored lecture media is served.
    #[serde(default = "default_media_base")]
    pub public_media_base: String,
}

fn default_media_base() -> String {
    "http://localhost:8080/media".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,

    /// Token lifetime in seconds (default: 24h).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_token_ttl() -> i64 {
    86400
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// How often the outbox worker drains pending mail (seconds).
    #[serde(default = "default_mail_poll")]
    pub poll_interval_secs: u64,

    /// Delivery attempts before an entry is marked failed.
    #[serde(default = "default_mail_attempts")]
    pub max_attempts: u32,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_mail_poll(),
            max_attempts: default_mail_attempts(),
        }
    }
}

fn default_mail_poll() -> u64 {
    15
}

fn default_mail_attempts() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatConfig {
    /// Full generateContent endpoint of the text backend. When unset,
    /// the chat falls back to its canned reply for unmatched messages.
    #[serde(default)]
    pub completion_endpoint: String,

    #[serde(default)]
    pub api_key: String,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [storage]
            data_dir = "/tmp/hexaboard"

            [auth]
            jwt_secret = "secret"

            [admin]
            email = "admin@x.com"
            password = "pw"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl_secs, 86400);
        assert_eq!(config.mail.max_attempts, 5);
        assert_eq!(config.admin.name, "Administrator");
        assert!(config.chat.completion_endpoint.is_empty());
    }
}

//! Bootstrap — first-start checks and admin account creation.

use std::sync::Arc;

use hexaboard_identity::{IdentityError, IdentityProvider, NewIdentity};
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.admin.email.is_empty() || config.admin.password.is_empty() {
        anyhow::bail!("Bootstrap admin email/password missing in configuration.");
    }
    Ok(())
}

/// Ensure the bootstrap admin identity exists. Creates it if missing.
pub fn ensure_admin(
    identity: &Arc<dyn IdentityProvider>,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    match identity.create_identity(NewIdentity {
        email: config.admin.email.clone(),
        password: config.admin.password.clone(),
        display_name: config.admin.name.clone(),
        role: "admin".to_string(),
    }) {
        Ok(created) => {
            info!(id = %created.id, email = %created.email, "created bootstrap admin");
            Ok(())
        }
        Err(IdentityError::Duplicate(_)) => {
            info!(email = %config.admin.email, "bootstrap admin already exists");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("failed to create bootstrap admin: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexaboard_identity::LocalIdentityProvider;

    fn config() -> ServerConfig {
        toml::from_str(
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
        .unwrap()
    }

    #[test]
    fn test_verify_config_rejects_empty_secret() {
        let mut bad = config();
        bad.auth.jwt_secret = String::new();
        assert!(verify_config(&bad).is_err());
        assert!(verify_config(&config()).is_ok());
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let provider: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::open_in_memory("s").unwrap());
        let config = config();
        ensure_admin(&provider, &config).unwrap();
        ensure_admin(&provider, &config).unwrap();

        let admin = provider.verify_password("admin@x.com", "pw").unwrap();
        assert_eq!(admin.role, "admin");
    }
}

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// An authentication identity. The identity id doubles as the profile
/// document id in the document store: profiles are always looked up by
/// identity id, never by a separately minted id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: String,
    /// Role claim carried into issued tokens ("admin" or "fresher").
    pub role: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Input for creating a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: String,
}

/// JWT claims carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub sub: String,
    /// Role claim ("admin" or "fresher").
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// IdentityProvider issues opaque identities and role claims.
///
/// Passwords are hashed at rest; emails are unique case-insensitively.
pub trait IdentityProvider: Send + Sync {
    /// Create an identity. Fails with `Duplicate` if the email is taken.
    fn create_identity(&self, new: NewIdentity) -> Result<Identity, IdentityError>;

    /// Delete an identity. Fails with `NotFound` if it does not exist.
    fn delete_identity(&self, id: &str) -> Result<(), IdentityError>;

    /// Fetch an identity by id. Returns None if absent.
    fn get_identity(&self, id: &str) -> Result<Option<Identity>, IdentityError>;

    /// Verify email + password, returning the identity on success.
    fn verify_password(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Replace the role claim on an identity.
    fn set_role(&self, id: &str, role: &str) -> Result<(), IdentityError>;

    /// Sign a token carrying the identity's claims.
    fn issue_token(&self, identity: &Identity) -> Result<String, IdentityError>;

    /// Verify a token and return its claims.
    fn verify_token(&self, token: &str) -> Result<Claims, IdentityError>;
}

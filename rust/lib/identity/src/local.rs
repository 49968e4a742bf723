use std::path::Path;
use std::sync::Mutex;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rusqlite::Connection;

use crate::error::IdentityError;
use crate::traits::{Claims, Identity, IdentityProvider, NewIdentity};

/// LocalIdentityProvider is an embedded IdentityProvider backed by its
/// own SQLite table, with argon2id password hashes and HS256 JWTs.
pub struct LocalIdentityProvider {
    conn: Mutex<Connection>,
    jwt_secret: String,
    token_ttl: i64,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS identities (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

impl LocalIdentityProvider {
    /// Open or create the identity database at the given path.
    pub fn open(path: &Path, jwt_secret: &str, token_ttl: i64) -> Result<Self, IdentityError> {
        let conn = Connection::open(path).map_err(|e| IdentityError::Storage(e.to_string()))?;
        Self::init(conn, jwt_secret, token_ttl)
    }

    /// Create an in-memory identity database (useful for tests).
    pub fn open_in_memory(jwt_secret: &str) -> Result<Self, IdentityError> {
        let conn =
            Connection::open_in_memory().map_err(|e| IdentityError::Storage(e.to_string()))?;
        Self::init(conn, jwt_secret, 86400)
    }

    fn init(conn: Connection, jwt_secret: &str, token_ttl: i64) -> Result<Self, IdentityError> {
        conn.execute(SCHEMA, [])
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            jwt_secret: jwt_secret.to_string(),
            token_ttl,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, IdentityError> {
        self.conn
            .lock()
            .map_err(|e| IdentityError::Storage(e.to_string()))
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| IdentityError::Internal(format!("password hash failed: {}", e)))
}

fn verify_hash(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn row_identity(row: &rusqlite::Row) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: row.get("id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
    })
}

impl IdentityProvider for LocalIdentityProvider {
    fn create_identity(&self, new: NewIdentity) -> Result<Identity, IdentityError> {
        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string().replace('-', ""),
            email: new.email,
            display_name: new.display_name,
            role: new.role,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let hash = hash_password(&new.password)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO identities (id, email, password_hash, display_name, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &identity.id,
                &identity.email,
                &hash,
                &identity.display_name,
                &identity.role,
                &identity.created_at,
            ),
        )
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                IdentityError::Duplicate(identity.email.clone())
            } else {
                IdentityError::Storage(msg)
            }
        })?;

        Ok(identity)
    }

    fn delete_identity(&self, id: &str) -> Result<(), IdentityError> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM identities WHERE id = ?1", [id])
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn get_identity(&self, id: &str) -> Result<Option<Identity>, IdentityError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT id, email, display_name, role, created_at FROM identities WHERE id = ?1",
            [id],
            row_identity,
        );
        match result {
            Ok(identity) => Ok(Some(identity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(IdentityError::Storage(e.to_string())),
        }
    }

    fn verify_password(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT id, email, password_hash, display_name, role, created_at
             FROM identities WHERE email = ?1",
            [email],
            |row| {
                let hash: String = row.get("password_hash")?;
                Ok((row_identity(row)?, hash))
            },
        );
        let (identity, hash) = match result {
            Ok(pair) => pair,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(IdentityError::Unauthorized("invalid credentials".into()));
            }
            Err(e) => return Err(IdentityError::Storage(e.to_string())),
        };
        if !verify_hash(password, &hash) {
            return Err(IdentityError::Unauthorized("invalid credentials".into()));
        }
        Ok(identity)
    }

    fn set_role(&self, id: &str, role: &str) -> Result<(), IdentityError> {
        let conn = self.lock()?;
        let affected = conn
            .execute("UPDATE identities SET role = ?1 WHERE id = ?2", (role, id))
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn issue_token(&self, identity: &Identity) -> Result<String, IdentityError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: identity.id.clone(),
            role: identity.role.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.token_ttl)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| IdentityError::Internal(format!("JWT encode failed: {}", e)))
    }

    fn verify_token(&self, token: &str) -> Result<Claims, IdentityError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| IdentityError::Unauthorized(format!("invalid token: {}", e)))?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::open_in_memory("test-secret").unwrap()
    }

    fn new_identity(email: &str) -> NewIdentity {
        NewIdentity {
            email: email.to_string(),
            password: "s3cret!pw".to_string(),
            display_name: "Ana".to_string(),
            role: "fresher".to_string(),
        }
    }

    #[test]
    fn test_create_and_verify_password() {
        let p = provider();
        let identity = p.create_identity(new_identity("ana@x.com")).unwrap();
        assert_eq!(identity.id.len(), 32);

        let verified = p.verify_password("ana@x.com", "s3cret!pw").unwrap();
        assert_eq!(verified.id, identity.id);

        assert!(matches!(
            p.verify_password("ana@x.com", "wrong"),
            Err(IdentityError::Unauthorized(_))
        ));
        assert!(matches!(
            p.verify_password("nobody@x.com", "s3cret!pw"),
            Err(IdentityError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_duplicate_email_is_case_insensitive() {
        let p = provider();
        p.create_identity(new_identity("ana@x.com")).unwrap();
        assert!(matches!(
            p.create_identity(new_identity("Ana@X.com")),
            Err(IdentityError::Duplicate(_))
        ));
    }

    #[test]
    fn test_delete_not_found_is_distinct() {
        let p = provider();
        let identity = p.create_identity(new_identity("ana@x.com")).unwrap();
        p.delete_identity(&identity.id).unwrap();
        assert!(matches!(
            p.delete_identity(&identity.id),
            Err(IdentityError::NotFound(_))
        ));
    }

    #[test]
    fn test_token_round_trip_carries_role() {
        let p = provider();
        let mut input = new_identity("root@x.com");
        input.role = "admin".to_string();
        let identity = p.create_identity(input).unwrap();

        let token = p.issue_token(&identity).unwrap();
        let claims = p.verify_token(&token).unwrap();
        assert_eq!(claims.sub, identity.id);
        assert!(claims.is_admin());

        assert!(matches!(
            p.verify_token("not-a-token"),
            Err(IdentityError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_set_role() {
        let p = provider();
        let identity = p.create_identity(new_identity("ana@x.com")).unwrap();
        p.set_role(&identity.id, "admin").unwrap();
        let fetched = p.get_identity(&identity.id).unwrap().unwrap();
        assert_eq!(fetched.role, "admin");
    }
}

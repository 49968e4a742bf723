use serde::{Deserialize, Serialize};

/// Append-only audit record, written once per successful login and
/// read in descending time order. No mutation or deletion path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLogEntry {
    pub id: String,
    pub uid: String,
    pub role: String,
    pub ip: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Successful login: a bearer token plus the caller's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub uid: String,
    pub role: String,
}

use serde::{Deserialize, Serialize};

/// A fresher profile. The document id equals the identity id minted by
/// the identity provider; profiles are always looked up by identity id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fresher {
    pub id: String,

    pub name: String,

    pub email: String,

    /// "fresher" for everyone provisioned through this module; CSV
    /// imports may carry another role.
    pub role: String,

    /// Resolved department link. Absent until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    /// Free-text department name from intake; may disagree with the
    /// resolved `departmentId` until the next auto-assignment pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

fn default_status() -> String {
    "active".to_string()
}

/// Input for provisioning a single fresher.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFresher {
    pub name: String,
    pub email: String,
    pub department_name: String,
    #[serde(default)]
    pub start_date: Option<String>,
}

/// Result of provisioning: the new profile id (== identity id) and the
/// generated temporary password, delivered once to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioned {
    pub id: String,
    pub temporary_password: String,
}

/// One successfully imported CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSuccess {
    pub email: String,
}

/// One failed CSV row, with the reason it was rejected.
#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub email: String,
    pub error: String,
}

/// Per-row outcome of a bulk CSV import. A bulk call never fails
/// atomically: each row is attempted and reported independently.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CsvImportReport {
    pub success: Vec<ImportSuccess>,
    pub failed: Vec<ImportFailure>,
}

use serde::{Deserialize, Serialize};

/// An organizational grouping of freshers.
///
/// Documents keep the camelCase field names the stored data has always
/// used, so `memberCount`, `createdAt` etc. on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Deterministic id derived from the exact name (see the directory
    /// service); at most one department per distinct name value.
    pub id: String,

    /// Human-entered name. Case and whitespace are significant.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub manager: String,

    #[serde(default)]
    pub location: String,

    /// Cached count of freshers whose `departmentId` points here.
    /// Maintained by atomic increments, not recomputed on read.
    #[serde(default)]
    pub member_count: i64,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a department explicitly from the admin console.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub location: String,
}

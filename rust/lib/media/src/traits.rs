use crate::error::MediaError;

/// MediaStore persists uploaded lecture media (videos, thumbnails).
///
/// Keys are path-like strings: `videos/lectures/{id}_{name}`. Storing a
/// blob returns the stable URL that course documents reference; a course
/// document is never written with a pending media location.
pub trait MediaStore: Send + Sync {
    /// Persist a blob under `key`, overwriting any previous content.
    /// Returns the stable URL for the stored media.
    fn store(&self, key: &str, data: &[u8]) -> Result<String, MediaError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MediaError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), MediaError>;

    /// Check whether a blob exists.
    fn exists(&self, key: &str) -> Result<bool, MediaError>;
}

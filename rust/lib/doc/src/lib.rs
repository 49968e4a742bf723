pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::DocError;
pub use sqlite::SqliteDocStore;
pub use traits::{Doc, DocumentStore, OrderBy, WriteOp};

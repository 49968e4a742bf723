pub mod error;
pub mod local;
pub mod traits;

pub use error::IdentityError;
pub use local::LocalIdentityProvider;
pub use traits::{Claims, Identity, IdentityProvider, NewIdentity};

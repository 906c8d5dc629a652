//! Auth-domain types: the issued credential, redacted secrets, and caller identities.

pub mod credential;
pub mod identity;
pub mod secret;

pub use credential::*;
pub use identity::*;
pub use secret::*;

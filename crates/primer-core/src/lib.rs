//! Primer Core - Foundational types shared by the Primer crates
//!
//! - `PrimerError` / `Result` - the error taxonomy for catalog generation
//! - `Credential`, `CredentialRotator` - round-robin API key pools
//! - `ContentHash` - SHA-256 fingerprints of generated asset files
//! - `write_atomic` - temp-file + rename writes for the catalog and assets

mod credential;
mod error;
mod fs;
mod hash;

pub use credential::{Credential, CredentialRotator};
pub use error::{PrimerError, Result};
pub use fs::write_atomic;
pub use hash::ContentHash;

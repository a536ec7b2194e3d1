pub mod navigator;
pub mod store;
pub mod token;

pub use navigator::{LoginPrompt, Navigator};
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use token::{StoredCredential, TokenResponse};

//! Thin per-resource wrappers. Each method is a single pipeline call.

pub mod auth;
pub mod files;
pub mod notes;
pub mod recycle;
pub mod types;

pub use auth::AuthApi;
pub use files::{part_from_path, FilesApi};
pub use notes::NotesApi;
pub use recycle::RecycleApi;
pub use types::{ListQuery, Note, NoteDraft, NotePatch};

use crate::pipeline::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn notes(&self) -> NotesApi<'_> {
        NotesApi::new(self)
    }

    pub fn files(&self) -> FilesApi<'_> {
        FilesApi::new(self)
    }

    pub fn recycle(&self) -> RecycleApi<'_> {
        RecycleApi::new(self)
    }
}

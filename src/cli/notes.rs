use crate::api::{ListQuery, NoteDraft, NotePatch};
use crate::error::InkpadError;
use crate::runtime::Runtime;

use super::output::{is_tty, print_note, print_notes, print_value, OutputMode};

pub async fn run_list(
    runtime: &Runtime,
    query: &ListQuery,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let notes = runtime.client().notes().list(query).await?;
    print_notes(&notes, mode, is_tty());
    Ok(())
}

pub async fn run_get(runtime: &Runtime, id: &str, mode: OutputMode) -> Result<(), InkpadError> {
    let note = runtime.client().notes().get(id).await?;
    print_note(&note, mode, is_tty());
    Ok(())
}

pub async fn run_create(
    runtime: &Runtime,
    title: String,
    content: String,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let note = runtime
        .client()
        .notes()
        .create(&NoteDraft { title, content })
        .await?;
    print_note(&note, mode, is_tty());
    Ok(())
}

pub async fn run_update(
    runtime: &Runtime,
    id: &str,
    patch: NotePatch,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let note = runtime.client().notes().update(id, &patch).await?;
    print_note(&note, mode, is_tty());
    Ok(())
}

pub async fn run_delete(runtime: &Runtime, id: &str, mode: OutputMode) -> Result<(), InkpadError> {
    let body = runtime.client().notes().delete(id).await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_attach(
    runtime: &Runtime,
    id: &str,
    file_ids: &[String],
    detach: bool,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let notes = runtime.client().notes();
    let body = if detach {
        notes.detach(id, file_ids).await?
    } else {
        notes.attach(id, file_ids).await?
    };
    print_value(&body, mode);
    Ok(())
}

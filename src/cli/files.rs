use std::path::PathBuf;

use crate::api::{part_from_path, ListQuery};
use crate::error::InkpadError;
use crate::runtime::Runtime;

use super::output::{print_value, OutputMode};

pub async fn run_list(
    runtime: &Runtime,
    query: &ListQuery,
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let body = runtime.client().files().list(query).await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_upload(
    runtime: &Runtime,
    paths: &[PathBuf],
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        parts.push(part_from_path(path).await?);
    }
    let body = runtime.client().files().upload(parts).await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_delete(runtime: &Runtime, id: &str, mode: OutputMode) -> Result<(), InkpadError> {
    let body = runtime.client().files().delete(id).await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_recycle_list(runtime: &Runtime, mode: OutputMode) -> Result<(), InkpadError> {
    let body = runtime.client().recycle().items().await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_recycle_restore(
    runtime: &Runtime,
    ids: &[String],
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let body = runtime.client().recycle().restore(ids).await?;
    print_value(&body, mode);
    Ok(())
}

pub async fn run_recycle_purge(
    runtime: &Runtime,
    ids: &[String],
    mode: OutputMode,
) -> Result<(), InkpadError> {
    let body = runtime.client().recycle().purge(ids).await?;
    print_value(&body, mode);
    Ok(())
}

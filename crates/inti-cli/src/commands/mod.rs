use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use inti_client::forms::Upload;
use serde_json::Value;

pub mod auth;
pub mod events;
pub mod products;
pub mod profile;
pub mod social;

/// Reads an image to attach to a form.
pub fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file name: {}", path.display()))?;
    Ok(Upload::new(file_name, bytes))
}

/// The `id` of a freshly created post or product, when the backend echoes one.
pub fn created_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

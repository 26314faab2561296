
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tokio::fs;
use tracing::debug;

/// File extensions the extractor can turn into plain text.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "log"];

/// Extract the full text of an uploaded file.
///
/// Unsupported or unreadable files produce an error naming the offending
/// file, so the caller can report it without failing sibling sources.
#[inline]
pub async fn extract_text(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| anyhow!("File has no extension: {}", path.display()))?;

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(anyhow!(
            "Unsupported file type '{}': {}",
            extension,
            path.display()
        ));
    }

    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    debug!("Extracted {} bytes from {}", text.len(), path.display());
    Ok(text)
}

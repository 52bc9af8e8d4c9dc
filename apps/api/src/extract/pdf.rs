use std::path::Path;

use super::ExtractError;

/// Concatenated per-page text, as pdf-extract lays it out.
pub(super) fn extract(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

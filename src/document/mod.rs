// Document loader module
// Reads the source PDF into ordered page-level text

#[cfg(test)]
mod tests;

use std::path::Path;
use tracing::{debug, info};

use crate::{Result, SahayError};

/// Extracted text for a single page of the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
}

/// Load a PDF into ordered `(page number, page text)` pairs.
///
/// Fails with [`SahayError::DocumentRead`] when the file is missing,
/// unreadable, or not a valid PDF. Reading is the only side effect.
#[inline]
pub fn load_pdf_pages(path: &Path) -> Result<Vec<PageText>> {
    if !path.exists() {
        return Err(SahayError::DocumentRead(format!(
            "PDF file not found at {}",
            path.display()
        )));
    }

    debug!("Extracting text from {}", path.display());

    // pdf-extract can panic on malformed documents; treat a panic as an
    // unreadable document rather than taking the process down.
    let pages = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }))
    .map_err(|_| {
        SahayError::DocumentRead(format!(
            "Failed to parse PDF at {}: extractor aborted on malformed content",
            path.display()
        ))
    })?
    .map_err(|e| {
        SahayError::DocumentRead(format!("Failed to parse PDF at {}: {}", path.display(), e))
    })?;

    let pages: Vec<PageText> = pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page_number: u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1),
            text,
        })
        .collect();

    if pages.is_empty() {
        return Err(SahayError::DocumentRead(format!(
            "No pages extracted from {}",
            path.display()
        )));
    }

    info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

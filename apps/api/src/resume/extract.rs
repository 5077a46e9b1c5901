//! Binary-to-text extraction for uploaded resumes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    Empty,

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("document contains no extractable text")]
    NoText,
}

/// Extracts normalized text from a PDF or plain-text document. CPU-bound; call from
/// `spawn_blocking` inside async code.
pub fn extract_text(bytes: &[u8], media_type: &str) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::Empty);
    }

    let raw = match media_type.split(';').next().unwrap_or("").trim() {
        "application/pdf" => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        "text/plain" | "text/markdown" => String::from_utf8_lossy(bytes).into_owned(),
        other => return Err(ExtractError::UnsupportedMediaType(other.to_string())),
    };

    let text = normalize(&raw);
    if text.is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text)
}

/// Collapses runs of spaces within lines and runs of blank lines between them.
pub fn normalize(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in raw.replace('\r', "\n").replace('\u{a0}', " ").lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && out.last().map_or(true, String::is_empty) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out.join("\n")
}

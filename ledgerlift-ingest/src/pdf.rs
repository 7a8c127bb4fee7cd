//! PDF text extraction.
//!
//! `pdf-extract` emits one form feed per page boundary; splitting on it
//! gives the parser per-page text without any layout reconstruction.

use tracing::{debug, info};

use crate::error::{ExtractError, Result};

/// Anything that can turn raw document bytes into per-page text.
pub trait PageSource {
    fn extract_pages(&self, bytes: &[u8], password: Option<&str>) -> Result<Vec<String>>;
}

/// The `pdf-extract` backed source used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PageSource for PdfExtractor {
    /// Plain extraction runs first even when a password is supplied; only
    /// an encryption-flavored failure reaches for the password.
    fn extract_pages(&self, bytes: &[u8], password: Option<&str>) -> Result<Vec<String>> {
        let text = match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => text,
            Err(e) if mentions_encryption(&e.to_string()) => {
                let Some(pw) = password else {
                    return Err(ExtractError::PasswordRequired);
                };
                debug!("document is encrypted, retrying with the supplied password");
                pdf_extract::extract_text_from_mem_encrypted(bytes, pw)
                    .map_err(|e| decrypt_failure(&e.to_string()))?
            }
            Err(e) => return Err(ExtractError::Unreadable(e.to_string())),
        };

        let pages = split_pages(&text);
        if pages.is_empty() {
            debug!("extraction succeeded but every page was blank");
            return Err(ExtractError::Empty);
        }
        info!(pages = pages.len(), "extracted pdf text");
        Ok(pages)
    }
}

/// Failure classification for the retry: the document is already known to
/// be encrypted, so an encryption message now means the password was bad.
fn decrypt_failure(message: &str) -> ExtractError {
    if mentions_encryption(message) {
        ExtractError::WrongPassword
    } else {
        ExtractError::Unreadable(message.to_string())
    }
}

/// `pdf-extract` reports encryption problems only through its message text.
fn mentions_encryption(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("password") || m.contains("encrypt") || m.contains("decrypt")
}

/// Split extracted text on the form feeds `pdf-extract` writes between
/// pages, dropping pages with no visible text.
pub fn split_pages(text: &str) -> Vec<String> {
    text.split('\u{000C}')
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Rejoin pages for the line-oriented parser.
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

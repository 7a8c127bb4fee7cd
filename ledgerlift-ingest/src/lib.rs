//! ledgerlift-ingest: turning statement documents into page text.

pub mod error;
pub mod pdf;

pub use error::ExtractError;
pub use pdf::{PageSource, PdfExtractor, join_pages, split_pages};

//! In-memory document store.
//!
//! Text extraction happens outside this crate; the store receives the
//! extracted text and page count, normalises the text with
//! [`clean_text()`], and keeps it for the lifetime of the process under a
//! freshly generated id.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{DocQueryError, Result};

/// The only content type accepted for upload.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Output of the external text-extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, page_count: usize) -> Self {
        Self {
            text: text.into(),
            page_count,
        }
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    /// Cleaned text, see [`clean_text()`].
    pub text: String,
    pub page_count: usize,
}

/// Normalise extracted text.
///
/// Drops non-ASCII characters, collapses whitespace runs into a single
/// space and trims both ends. Characters are dropped before whitespace is
/// collapsed, so a non-ASCII separator between two words joins them.
///
/// The ASCII information separators (`0x1C`..=`0x1F`) count as whitespace.
pub fn clean_text(text: &str) -> String {
    let ascii: String = text.chars().filter(char::is_ascii).collect();
    ascii
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\x1c'..='\x1f')
}

/// Thread-safe, process-lifetime map from document id to [`Document`].
#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Uuid, Arc<Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, clean and store an uploaded document.
    ///
    /// Rejects any content type other than [`PDF_CONTENT_TYPE`].
    pub fn ingest(
        &self,
        filename: impl Into<String>,
        content_type: &str,
        extracted: ExtractedText,
    ) -> Result<Uuid> {
        let filename = filename.into();
        if content_type != PDF_CONTENT_TYPE {
            warn!(filename, content_type, "rejected upload with invalid content type");
            return Err(DocQueryError::InvalidDocument(
                "Invalid file type. Only PDFs are allowed.".to_string(),
            ));
        }

        let document = Document {
            id: Uuid::new_v4(),
            text: clean_text(&extracted.text),
            page_count: extracted.page_count,
            filename,
        };
        let id = document.id;
        info!(
            %id,
            filename = document.filename,
            page_count = document.page_count,
            text_len = document.text.len(),
            "document stored"
        );

        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(document));
        Ok(id)
    }

    /// Look up a stored document.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Document>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove a document, returning it if it was present.
    pub fn remove(&self, id: &Uuid) -> Option<Arc<Document>> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

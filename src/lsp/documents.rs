//! Open documents, keyed by uri.

use dashmap::DashMap;
use dashmap::mapref::one::Ref;
use lsp_types::TextDocumentContentChangeEvent;
use pscript_ide::{RangeError, apply_content_changes};
use pscript_syntax::{Program, parse};

/// Text of an open document and its parse.
#[derive(Debug)]
pub struct Document {
    pub text: String,
    pub version: i32,
    pub program: Program,
}

impl Document {
    fn new(text: String, version: i32) -> Self {
        let program = parse(&text).program;
        Self {
            text,
            version,
            program,
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<String, Document>,
}

impl DocumentStore {
    pub fn open(&self, uri: &str, text: String, version: i32) {
        self.documents
            .insert(uri.to_string(), Document::new(text, version));
    }

    /// Apply `changes` in order and re-parse. On error the document keeps
    /// its previous text and version. Returns `Ok(false)` for unknown uris.
    pub fn change(
        &self,
        uri: &str,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<bool, RangeError> {
        let Some(mut doc) = self.documents.get_mut(uri) else {
            return Ok(false);
        };
        let text = apply_content_changes(&doc.text, changes)?;
        *doc = Document::new(text, version);
        Ok(true)
    }

    pub fn close(&self, uri: &str) -> Option<Document> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    pub fn get(&self, uri: &str) -> Option<Ref<'_, String, Document>> {
        self.documents.get(uri)
    }

    /// Read guards over every open document.
    pub fn all(&self) -> Vec<dashmap::mapref::multiple::RefMulti<'_, String, Document>> {
        self.documents.iter().collect()
    }
}

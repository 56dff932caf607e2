//! Text extraction capability for file-like objects.
//!
//! Concrete extractors (PDF parsers, office formats, external utilities) live
//! in the application crate. This module defines the [`TextExtractor`] trait
//! and the priority-ordered [`ExtractorChain`] the projector consults.
//!
//! # Ordering
//!
//! ```text
//! priority 50   pdftotext      [pdf]
//! priority 100  pdf-extract    [pdf]
//! priority 100  catdoc         [doc]
//! priority 200  plain text     [txt, md, csv]
//! ```
//!
//! The first extractor, in ascending priority, that declares the file's
//! extension and returns non-blank text wins. Equal priorities keep
//! registration order.

use std::path::Path;

/// A pluggable `extract(path) -> text | none` capability.
pub trait TextExtractor: Send + Sync {
    /// Short name shown in diagnostics.
    fn name(&self) -> &str;

    /// Lowercase file extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&'static str];

    /// Lower runs first.
    fn priority(&self) -> i32;

    /// Extract plain text. `None` when the file cannot be read or yields
    /// nothing; implementations report their own failures.
    fn extract(&self, path: &Path) -> Option<String>;
}

/// Registered extractors, kept sorted by ascending priority.
#[derive(Default)]
pub struct ExtractorChain {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ExtractorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor. The chain stays sorted; the sort is stable.
    pub fn register(&mut self, extractor: Box<dyn TextExtractor>) {
        self.extractors.push(extractor);
        self.extractors.sort_by_key(|e| e.priority());
    }

    /// Extractors in the order they are tried.
    pub fn extractors(&self) -> &[Box<dyn TextExtractor>] {
        &self.extractors
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run the chain against `path`. Extension matching ignores case.
    pub fn extract(&self, path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extractors
            .iter()
            .filter(|e| e.extensions().iter().any(|x| *x == extension))
            .find_map(|e| e.extract(path).filter(|text| !text.trim().is_empty()))
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.name()))
            .finish()
    }
}

//! Dialect extractors turning source text into function, class and import records
//!
//! Each dialect gets its own module behind a common trait. Extraction is purely
//! lexical: line-oriented patterns plus a little per-file state, no syntax trees.

mod brace;
mod generic;
mod indent;
mod scan_state;

pub use brace::BraceExtractor;
pub use generic::GenericExtractor;
pub use indent::IndentExtractor;

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use super::model::{Dialect, FileExtraction, SourceFile};

/// Trait that all dialect extractors implement
pub trait DialectExtractor: Send + Sync {
    /// Dialect this extractor handles
    fn dialect(&self) -> Dialect;

    /// Scan one file's text. Never fails: unrecognized lines are skipped.
    fn extract(&self, file: &SourceFile, content: &str) -> FileExtraction;
}

/// Routes each source file to the extractor for its dialect
pub struct ExtractorRegistry {
    extractors: HashMap<Dialect, Box<dyn DialectExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Result<Self> {
        let candidates: Vec<Box<dyn DialectExtractor>> = vec![
            Box::new(BraceExtractor::new()?),
            Box::new(IndentExtractor::new()?),
            Box::new(GenericExtractor::new()?),
        ];

        let extractors = candidates
            .into_iter()
            .map(|extractor| (extractor.dialect(), extractor))
            .collect();

        Ok(Self { extractors })
    }

    /// Extract from text already in memory
    pub fn extract(&self, file: &SourceFile, content: &str) -> FileExtraction {
        match self.extractors.get(&file.dialect) {
            Some(extractor) => extractor.extract(file, content),
            None => FileExtraction {
                file: file.path.clone(),
                ..FileExtraction::default()
            },
        }
    }

    /// Read and extract one file. Unreadable or non-UTF-8 files are logged and skipped.
    pub fn extract_file(&self, file: &SourceFile) -> Option<FileExtraction> {
        let content = match std::fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", file.path.display(), e);
                return None;
            }
        };

        let extraction = self.extract(file, &content);
        debug!(
            "Extracted {} functions, {} classes, {} imports from {}",
            extraction.functions.len(),
            extraction.classes.len(),
            extraction.imports.len(),
            file.path.display()
        );
        Some(extraction)
    }
}

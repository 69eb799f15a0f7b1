//! Markdown shape validation and blank-line normalization.
//!
//! Validation is a flat containment check: a marker appearing anywhere in
//! the document satisfies it, even inside a code block or a sentence.

use crate::types::Marker;
use crate::{Error, Result};

/// Return the first required marker absent from `markdown`.
pub fn missing_marker(markdown: &str) -> Option<Marker> {
    Marker::ALL
        .into_iter()
        .find(|marker| !markdown.contains(marker.token()))
}

/// Validator and normalizer for generated slide markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Check that every structural marker is present.
    ///
    /// Logs which marker is missing when the check fails.
    pub fn validate(&self, markdown: &str) -> bool {
        self.check(markdown).is_ok()
    }

    /// Like [`validate`](Self::validate), returning the missing marker as an error.
    pub fn check(&self, markdown: &str) -> Result<()> {
        match missing_marker(markdown) {
            Some(marker) => {
                log::error!("Missing {} in the markdown content", marker.description());
                Err(Error::Validation(marker))
            }
            None => Ok(()),
        }
    }

    /// Collapse every run of blank lines into a single blank line.
    ///
    /// Non-blank lines are kept verbatim and in order.
    pub fn normalize(&self, markdown: &str) -> String {
        let mut lines = Vec::new();
        let mut prev_blank = false;

        for line in markdown.split('\n') {
            let blank = line.trim().is_empty();
            if !(blank && prev_blank) {
                lines.push(line);
            }
            prev_blank = blank;
        }

        lines.join("\n")
    }
}

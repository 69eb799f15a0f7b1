//! The validate → normalize → persist → convert pipeline.

use crate::normalize::MarkdownNormalizer;
use crate::types::OutputTarget;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Produces slide markdown from source text.
pub trait ContentGenerator {
    /// Generate markdown for `text`.
    fn generate(&self, text: &str) -> Result<String>;
}

/// Turns a markdown file into a slide deck.
pub trait DocumentConverter {
    /// Convert `markdown_file` into a deck written to `output_file`.
    fn convert(&self, markdown_file: &Path, output_file: &Path) -> Result<()>;
}

/// Validates generated markdown and hands it to a converter.
#[derive(Debug, Clone)]
pub struct SlideProcessor<C> {
    normalizer: MarkdownNormalizer,
    converter: C,
}

impl<C: DocumentConverter> SlideProcessor<C> {
    /// Create a processor around a converter.
    pub fn new(converter: C) -> Self {
        Self {
            normalizer: MarkdownNormalizer::new(),
            converter,
        }
    }

    /// The wrapped converter.
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Run the pipeline, reporting failure as `false`.
    ///
    /// Errors are logged, never propagated.
    pub fn process(&self, markdown: &str, output: impl AsRef<Path>) -> bool {
        match self.try_process(markdown, output) {
            Ok(_) => true,
            Err(Error::Validation(_)) => false,
            Err(e) => {
                log::error!("Error processing content: {}", e);
                false
            }
        }
    }

    /// Run the pipeline and return the written target.
    ///
    /// Nothing is written when validation fails. The markdown sibling is
    /// left in place if conversion fails.
    pub fn try_process(&self, markdown: &str, output: impl AsRef<Path>) -> Result<OutputTarget> {
        let target = OutputTarget::new(output);

        self.normalizer.check(markdown)?;
        let cleaned = self.normalizer.normalize(markdown);

        let markdown_path = target.markdown_path();
        if let Some(parent) = markdown_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&markdown_path, &cleaned)?;
        log::debug!("Wrote markdown to {}", markdown_path.display());

        self.converter.convert(&markdown_path, target.deck_path())?;

        log::info!(
            "Successfully converted {} to {}",
            markdown_path.display(),
            target.deck_path().display()
        );
        Ok(target)
    }
}

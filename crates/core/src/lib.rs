//! Core domain types, configuration, markdown validation and the
//! slide generation pipeline.

pub mod config;
pub mod error;
pub mod normalize;
pub mod processor;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use normalize::MarkdownNormalizer;
pub use processor::{ContentGenerator, DocumentConverter, SlideProcessor};
pub use types::{DeckSummary, Marker, OutputTarget, SlideSummary, SourceText};

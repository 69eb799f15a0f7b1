//! Error types for slide generation.

use crate::types::Marker;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No API credential is configured.
    #[error("GOOGLE_API_KEY not found in environment variables. Please create a .env file with your API key.")]
    MissingApiKey,

    /// A configuration value could not be used.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Neither an input file nor literal text was supplied.
    #[error("Either --input or --text must be provided")]
    MissingSource,

    /// The source text is empty.
    #[error("Source text is empty")]
    EmptySource,

    /// The generated markdown lacks a required structural marker.
    #[error("Missing {} in the markdown content", .0.description())]
    Validation(Marker),

    /// The remote generation API failed.
    #[error("Error processing content with Gemini: {0}")]
    RemoteService(String),

    /// The external converter failed.
    #[error("Error converting to PowerPoint: {0}")]
    Conversion(String),

    /// The converter could not be located or installed.
    #[error("{0}. Please install pandoc manually from https://pandoc.org/installing.html")]
    Bootstrap(String),

    /// A generated deck could not be inspected.
    #[error("Deck inspection error: {0}")]
    Deck(String),
}

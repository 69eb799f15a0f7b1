//! Gemini backend for slide content generation.
//!
//! Sends the source text wrapped in a fixed slide-formatting instruction to
//! the Gemini REST API and returns the markdown it produces.

pub mod client;
pub mod prompt;

pub use client::{GeminiClient, ModelInfo};
pub use prompt::build_prompt;

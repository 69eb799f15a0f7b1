//! Pandoc backend for turning slide markdown into PPTX.
//!
//! [`PandocBootstrap`] makes sure a pandoc executable is available before
//! any conversion runs; [`PandocConverter`] drives it.

pub mod bootstrap;
pub mod converter;

pub use bootstrap::{pandoc_version, PandocBootstrap, PandocRelease};
pub use converter::PandocConverter;

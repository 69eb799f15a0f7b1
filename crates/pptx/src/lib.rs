//! PPTX inspection for generated slide decks.
//!
//! Opens the ZIP container produced by the converter and reads the slide
//! order and slide titles. Nothing is modified.

pub mod inspect;

pub use inspect::DeckInspector;

//! Domain types for generating a presentation from text.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension of the produced slide deck.
pub const DECK_EXTENSION: &str = "pptx";

/// File extension of the persisted markdown sibling.
pub const MARKDOWN_EXTENSION: &str = "md";

/// A structural token the generated markdown must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Level-1 heading, used for the title slide.
    Title,
    /// Level-2 heading, one per slide.
    SlideTitle,
    /// Horizontal rule between slides.
    Separator,
    /// Dash bullet point.
    Bullet,
}

impl Marker {
    /// All markers, in the order they are checked.
    pub const ALL: [Marker; 4] = [
        Marker::Title,
        Marker::SlideTitle,
        Marker::Separator,
        Marker::Bullet,
    ];

    /// The literal text whose presence satisfies this marker.
    pub fn token(self) -> &'static str {
        match self {
            Marker::Title => "# ",
            Marker::SlideTitle => "## ",
            Marker::Separator => "---",
            Marker::Bullet => "- ",
        }
    }

    /// Human-readable name used in log and error messages.
    pub fn description(self) -> &'static str {
        match self {
            Marker::Title => "Title slide",
            Marker::SlideTitle => "Slide titles",
            Marker::Separator => "Slide separators",
            Marker::Bullet => "Bullet points",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Where the text to convert comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    /// Text given directly on the command line.
    Inline(String),
    /// A UTF-8 text file to read.
    File(PathBuf),
}

impl SourceText {
    /// Pick a source from the optional file and literal text arguments.
    ///
    /// The file wins when both are given.
    pub fn from_args(input: Option<PathBuf>, text: Option<String>) -> Result<Self> {
        match (input, text) {
            (Some(path), _) => Ok(Self::File(path)),
            (None, Some(text)) if !text.is_empty() => Ok(Self::Inline(text)),
            _ => Err(Error::MissingSource),
        }
    }

    /// Read the text, rejecting empty content.
    pub fn load(&self) -> Result<String> {
        let content = match self {
            Self::Inline(text) => text.clone(),
            Self::File(path) => std::fs::read_to_string(path)?,
        };

        if content.trim().is_empty() {
            return Err(Error::EmptySource);
        }

        Ok(content)
    }
}

/// The output deck path and its markdown sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    deck: PathBuf,
}

impl OutputTarget {
    /// Create a target, forcing the `.pptx` extension.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let deck = match path.extension().and_then(|e| e.to_str()) {
            Some(DECK_EXTENSION) => path.to_path_buf(),
            _ => path.with_extension(DECK_EXTENSION),
        };
        Self { deck }
    }

    /// Path of the slide deck.
    pub fn deck_path(&self) -> &Path {
        &self.deck
    }

    /// Path of the markdown file written next to the deck.
    pub fn markdown_path(&self) -> PathBuf {
        self.deck.with_extension(MARKDOWN_EXTENSION)
    }
}

/// Summary of a produced slide deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckSummary {
    /// Slides in presentation order.
    pub slides: Vec<SlideSummary>,
}

impl DeckSummary {
    /// Number of slides in the deck.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Titles of all slides that have one.
    pub fn titles(&self) -> Vec<&str> {
        self.slides
            .iter()
            .filter_map(|s| s.title.as_deref())
            .collect()
    }
}

/// A single slide of a produced deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideSummary {
    /// 1-based slide number.
    pub number: usize,

    /// Title text, if the slide has one.
    pub title: Option<String>,
}

impl SlideSummary {
    /// Create a slide summary.
    pub fn new(number: usize, title: Option<String>) -> Self {
        Self { number, title }
    }
}

//! Slide order and title extraction from a PPTX archive.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slides_core::{DeckSummary, Error, Result, SlideSummary};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Reads a summary out of a PPTX deck.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeckInspector;

impl DeckInspector {
    /// Create a new inspector.
    pub fn new() -> Self {
        Self
    }

    /// Inspect the deck at `path`.
    pub fn inspect(&self, path: &Path) -> Result<DeckSummary> {
        let file = File::open(path)?;
        self.inspect_reader(BufReader::new(file))
    }

    /// Inspect a deck from any seekable reader.
    pub fn inspect_reader<R: Read + Seek>(&self, reader: R) -> Result<DeckSummary> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Deck(format!("Failed to open ZIP: {}", e)))?;

        let mut summary = DeckSummary::default();
        for (idx, slide_path) in self.slide_order(&mut archive)?.iter().enumerate() {
            let xml = read_file_from_archive(&mut archive, slide_path)?;
            summary
                .slides
                .push(SlideSummary::new(idx + 1, slide_title(&xml)));
        }

        Ok(summary)
    }

    /// Ordered slide part paths from the presentation relationships.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attr_value(e, b"Type").unwrap_or_default();
                    let target = attr_value(e, b"Target").unwrap_or_default();

                    if rel_type.ends_with("/slide") {
                        let order = extract_slide_number(&target);
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((full_path, order));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Deck(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

/// Title of a slide: the title placeholder's text, else the first text shape.
fn slide_title(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_shape = false;
    let mut is_title = false;
    let mut in_paragraph = false;
    let mut text = String::new();
    let mut first_text: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    is_title = false;
                    text.clear();
                }
                b"ph" if in_shape => is_title = is_title_placeholder(e),
                b"p" if in_shape => {
                    in_paragraph = true;
                    if !text.is_empty() {
                        text.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if in_shape && local_name(e.name().as_ref()) == b"ph" {
                    is_title = is_title_placeholder(e);
                }
            }
            Ok(Event::Text(ref e)) if in_paragraph => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    let shape_text = text.trim();
                    if !shape_text.is_empty() {
                        if is_title {
                            return Some(shape_text.to_string());
                        }
                        first_text.get_or_insert_with(|| shape_text.to_string());
                    }
                    in_shape = false;
                    in_paragraph = false;
                }
                b"p" => in_paragraph = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
                break;
            }
            _ => {}
        }
    }

    first_text
}

fn is_title_placeholder(e: &BytesStart) -> bool {
    matches!(
        attr_value(e, b"type").as_deref(),
        Some("title") | Some("ctrTitle")
    )
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn read_file_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::Deck(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::Deck(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Extract a slide number from a target like "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}

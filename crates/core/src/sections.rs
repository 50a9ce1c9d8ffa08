//! Splits page text into titled legal sections.
//!
//! Headers are lines beginning with `Section`, `Article` or `Chapter`, or
//! short all-caps lines such as `OF OFFENCES AGAINST THE BODY`. Everything
//! between two headers becomes the first header's content.

use crate::models::{Page, Section};

const MAX_CAPS_HEADER_CHARS: usize = 100;

pub fn is_header(line: &str) -> bool {
    line.starts_with("Section")
        || line.starts_with("Article")
        || line.starts_with("Chapter")
        || (is_upper(line) && line.chars().count() < MAX_CAPS_HEADER_CHARS)
}

/// True when the line has at least one cased letter and none in lowercase.
fn is_upper(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

struct Pending {
    title: String,
    content: String,
    page_number: u32,
    source: String,
}

impl Pending {
    fn finish(self) -> Option<Section> {
        let content = self.content.trim();
        if self.title.is_empty() || content.is_empty() {
            return None;
        }
        Some(Section {
            title: self.title,
            content: content.to_string(),
            page_number: self.page_number,
            source: self.source,
        })
    }
}

/// Text before the first header and headers without body text are dropped.
/// Each section records the page its header appeared on.
pub fn extract_sections(pages: &[Page]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Pending> = None;

    for page in pages {
        for line in page.text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_header(line) {
                if let Some(section) = current.take().and_then(Pending::finish) {
                    sections.push(section);
                }
                current = Some(Pending {
                    title: line.to_string(),
                    content: String::new(),
                    page_number: page.number,
                    source: page.source.clone(),
                });
            } else if let Some(pending) = current.as_mut() {
                pending.content.push_str(line);
                pending.content.push(' ');
            }
        }
    }

    if let Some(section) = current.and_then(Pending::finish) {
        sections.push(section);
    }
    sections
}

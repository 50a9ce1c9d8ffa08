//! Discovers legal reference documents and reads them page by page.

use crate::models::Page;
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

pub fn kind_of(path: &Path) -> Option<DocumentKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some(DocumentKind::Pdf),
        "txt" | "md" => Some(DocumentKind::Text),
        _ => None,
    }
}

/// Expands configured paths into a sorted list of document files.
///
/// Files named explicitly are kept even when their extension is unknown to
/// the walker; directories are walked for pdf/txt/md files.
pub fn discover(paths: &[String], exclude: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let exclude_set = build_globset(exclude)?;
    let mut found = Vec::new();
    for root in paths {
        let root = PathBuf::from(root);
        if root.is_file() {
            found.push(root);
            continue;
        }
        if !root.is_dir() {
            debug!(path = %root.display(), "document path does not exist");
            continue;
        }
        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || should_descend(e.path(), &exclude_set))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if kind_of(path).is_some() {
                found.push(path.to_path_buf());
            }
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).with_context(|| format!("invalid exclude pattern {p}"))?);
    }
    Ok(builder.build()?)
}

/// Hidden and excluded entries are pruned, so nothing below them is walked.
fn should_descend(path: &Path, exclude_set: &GlobSet) -> bool {
    !is_hidden(path) && !exclude_set.is_match(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Reads every page of a document. Text files use form feeds as page breaks.
pub fn load_pages(path: &Path) -> anyhow::Result<Vec<Page>> {
    let source = path.to_string_lossy().into_owned();
    let pages = match kind_of(path) {
        Some(DocumentKind::Pdf) => pdf_pages(path)?,
        _ => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            split_pages(&text)
        }
    };
    info!(path = %source, pages = pages.len(), "loaded document");
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            number: i as u32 + 1,
            text,
            source: source.clone(),
        })
        .collect())
}

fn split_pages(text: &str) -> Vec<String> {
    text.split(FORM_FEED).map(str::to_string).collect()
}

#[cfg(feature = "pdf")]
fn pdf_pages(path: &Path) -> anyhow::Result<Vec<String>> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("failed to open PDF {}", path.display()))?;
    let mut pages = Vec::new();
    for (number, _) in doc.get_pages() {
        // Pages whose content streams cannot be decoded count as blank so
        // numbering stays aligned with the printed document.
        let text = doc.extract_text(&[number]).unwrap_or_default();
        pages.push(text);
    }
    Ok(pages)
}

#[cfg(not(feature = "pdf"))]
fn pdf_pages(path: &Path) -> anyhow::Result<Vec<String>> {
    anyhow::bail!(
        "PDF support is disabled in this build, cannot read {}",
        path.display()
    )
}

/// blake3 over every document's bytes, in order.
pub fn fingerprint(paths: &[PathBuf]) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in paths {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&bytes);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

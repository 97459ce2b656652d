use std::path::{Path, PathBuf};

use anyhow::Context;
use ragent_memory::TextBlock;

/// Page separator inside plain-text sources.
const PAGE_BREAK: char = '\u{000C}';

/// Read plain-text files into blocks, one per form-feed separated page.
///
/// Single-page files keep the path as their source; multi-page files are
/// labelled `path#page=N`, counting from 1. Empty pages are skipped.
pub async fn read_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<TextBlock>> {
    let mut blocks = Vec::new();
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read source '{}'", path.display()))?;
        blocks.extend(split_pages(&text, path));
    }
    Ok(blocks)
}

fn split_pages(text: &str, path: &Path) -> Vec<TextBlock> {
    let label = path.display().to_string();
    let pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    if pages.len() == 1 {
        return vec![TextBlock::new(text, label)];
    }
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| TextBlock::new(*page, format!("{label}#page={}", i + 1)))
        .collect()
}

/// Human-readable description used in the system prompt.
pub fn describe_sources(paths: &[PathBuf]) -> String {
    let names: Vec<String> = paths
        .iter()
        .map(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string());
            format!("'{name}'")
        })
        .collect();
    match names.as_slice() {
        [] => "no documents".to_string(),
        [one] => format!("the document {one}"),
        many => format!("the documents {}", many.join(", ")),
    }
}

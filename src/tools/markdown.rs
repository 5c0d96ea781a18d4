//! `extract_markdown_headers`: index the first H1 of every Markdown file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use walkdir::WalkDir;

use super::sort::write_pretty;
use crate::error::ToolError;

const TOOL: &str = "extract_markdown_headers";

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownHeadersArgs {
    pub input_path: String,
    pub output_path: String,
}

pub fn extract_markdown_headers(args: &MarkdownHeadersArgs) -> Result<String, ToolError> {
    let dir = scan_root(Path::new(&args.input_path));
    let mut index = BTreeMap::new();

    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry
            .with_context(|| format!("scanning {}", dir.display()))
            .map_err(|e| ToolError::execution(TOOL, e))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "md") {
            continue;
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|e| ToolError::execution(TOOL, e))?;
        if let Some(title) = first_h1(&contents) {
            index.insert(entry.file_name().to_string_lossy().into_owned(), title);
        }
    }

    write_pretty(Path::new(&args.output_path), &index).map_err(|e| ToolError::execution(TOOL, e))?;

    Ok(format!(
        "Extracted {} headers into {}",
        index.len(),
        args.output_path
    ))
}

/// A directory is scanned directly; a file path means "the directory holding it".
fn scan_root(input: &Path) -> PathBuf {
    if input.is_dir() {
        return input.to_path_buf();
    }
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn first_h1(contents: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn indexes_first_h1_per_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("intro.md"), "Some text\n# Introduction\n# Second").unwrap();
        std::fs::write(dir.path().join("guide.md"), "## Not this\n#  Guide  \n").unwrap();
        std::fs::write(dir.path().join("empty.md"), "no headers here").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "# Ignored").unwrap();
        let output = dir.path().join("index.json");

        let summary = extract_markdown_headers(&MarkdownHeadersArgs {
            input_path: dir.path().to_string_lossy().into_owned(),
            output_path: output.to_string_lossy().into_owned(),
        })
        .expect("extract");
        assert!(summary.starts_with("Extracted 2 headers"));

        let index: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(index.get("intro.md").map(String::as_str), Some("Introduction"));
        assert_eq!(index.get("guide.md").map(String::as_str), Some("Guide"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn file_path_scans_its_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "# Alpha").unwrap();
        assert_eq!(scan_root(&file), dir.path());
    }
}

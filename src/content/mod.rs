// Content module
// Discovers MDX blog posts, parses their front matter, and extracts plain text

#[cfg(test)]
mod tests;

pub mod extractor;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use extractor::extract_plain_text;

/// Front matter fields of an MDX blog post
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FrontMatter {
    pub title: String,
    pub date: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub draft: bool,
}

/// A published blog post ready for chunking and embedding
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    /// URL-safe identifier derived from the file stem
    pub slug: String,
    pub date: Option<String>,
    pub tags: Vec<String>,
    /// Plain text extracted from the markdown body
    pub body: String,
    pub path: PathBuf,
}

/// Recursively discover all published documents under the given directories.
///
/// Drafts are excluded. Files that fail to parse are skipped with a warning
/// so one broken post does not abort a whole index build.
#[inline]
pub fn discover_documents(content_dirs: &[PathBuf]) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for dir in content_dirs {
        if !dir.exists() {
            warn!("Content directory does not exist: {}", dir.display());
            continue;
        }
        collect_markdown_files(dir, &mut files)
            .with_context(|| format!("Failed to scan content directory: {}", dir.display()))?;
    }
    files.sort();

    let mut documents = Vec::new();
    for path in files {
        match load_document(&path) {
            Ok(Some(document)) => documents.push(document),
            Ok(None) => debug!("Skipping draft: {}", path.display()),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    debug!("Discovered {} published documents", documents.len());
    Ok(documents)
}

fn collect_markdown_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_files(&path, files)?;
        } else if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("mdx" | "md")
        ) {
            files.push(path);
        }
    }
    Ok(())
}

/// Load a single document, returning `None` for drafts
fn load_document(path: &Path) -> Result<Option<Document>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let (front_matter, body) = parse_front_matter(&source)
        .with_context(|| format!("Failed to parse front matter in {}", path.display()))?;

    if front_matter.draft {
        return Ok(None);
    }

    let slug = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("File has no usable stem: {}", path.display()))?;

    let title = if front_matter.title.trim().is_empty() {
        slug.clone()
    } else {
        front_matter.title
    };

    Ok(Some(Document {
        title,
        slug,
        date: front_matter.date,
        tags: front_matter.tags,
        body: extract_plain_text(body),
        path: path.to_path_buf(),
    }))
}

/// Split a document source into its YAML front matter and markdown body.
///
/// A document without a front matter fence is treated as all body.
#[inline]
pub fn parse_front_matter(source: &str) -> Result<(FrontMatter, &str)> {
    let Some(rest) = source
        .strip_prefix("---\r\n")
        .or_else(|| source.strip_prefix("---\n"))
    else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = rest.get(..offset).unwrap_or_default();
            let body = rest.get(offset + line.len()..).unwrap_or_default();
            let front_matter: FrontMatter =
                serde_yaml::from_str(yaml).context("Invalid YAML front matter")?;
            return Ok((front_matter, body));
        }
        offset += line.len();
    }

    anyhow::bail!("Unterminated front matter fence")
}

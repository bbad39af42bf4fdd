//! Pages and slugs.

use std::path::{Component, Path, PathBuf};

use lectern_mdx::{ParsedDoc, RenderedDoc};

/// A discovered, parsed and rendered content page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Source file path
    pub source_path: PathBuf,

    /// Relative path from docs dir
    pub relative_path: PathBuf,

    /// Slug derived from the relative path
    pub slug: String,

    /// Parsed document
    pub doc: ParsedDoc,

    /// Rendered body
    pub rendered: RenderedDoc,
}

impl Page {
    /// Page title from frontmatter.
    pub fn title(&self) -> &str {
        &self.doc.frontmatter.title
    }

    /// Page description from frontmatter.
    pub fn description(&self) -> &str {
        &self.doc.frontmatter.description
    }

    /// Public URL of the page.
    pub fn url(&self, base_url: &str) -> String {
        url_for(&self.slug, base_url)
    }

    /// Where the rendered page is written.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        if self.slug.is_empty() {
            output_dir.join("index.html")
        } else {
            output_dir.join(&self.slug).join("index.html")
        }
    }

    /// Whether the page lives in `directory` (or is its index page).
    pub fn is_in_directory(&self, directory: &str) -> bool {
        let directory = normalize_slug(directory);
        directory.is_empty()
            || self.slug == directory
            || self
                .slug
                .strip_prefix(&directory)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Compute a page slug from its path relative to the docs dir.
///
/// `guides/setup.md` becomes `guides/setup`, `guides/index.mdx` becomes
/// `guides` and the root `index.md` becomes the empty slug.
pub fn slug_for(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    normalize_slug(&segments.join("/"))
}

/// Normalize a slug as written in the sidebar or a link.
pub fn normalize_slug(slug: &str) -> String {
    let slug = slug.trim().trim_matches('/');
    let slug = slug
        .strip_suffix(".mdx")
        .or_else(|| slug.strip_suffix(".md"))
        .unwrap_or(slug);

    if slug == "index" {
        return String::new();
    }
    slug.strip_suffix("/index").unwrap_or(slug).to_string()
}

/// Normalize a base URL to start and end with `/`.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// URL for a slug under `base_url`.
pub fn url_for(slug: &str, base_url: &str) -> String {
    if slug.is_empty() {
        base_url.to_string()
    } else {
        format!("{}{}/", base_url, slug)
    }
}

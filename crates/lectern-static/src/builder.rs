//! Static site builder.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use lectern_mdx::{parse_mdx, render_markdown};

use crate::assets::AssetPipeline;
use crate::lint::{lint_site, Diagnostic, LintContext, LintReport};
use crate::page::{normalize_base_url, slug_for, Page};
use crate::sidebar::{mark_current, resolve_sidebar, SidebarError, SidebarGroup};
use crate::templates::{Context, NavGroup, TemplateEngine, TocEntry};

/// Longest plain-text excerpt stored per page in the search index.
const EXCERPT_CHARS: usize = 300;

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source docs directory
    pub docs_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Directory copied verbatim to the output root
    pub public_dir: Option<PathBuf>,

    /// Minify CSS output
    pub minify: bool,

    /// Base URL for the site
    pub base_url: String,

    /// Absolute origin used for the sitemap, e.g. `https://docs.example.com`
    pub site_url: Option<String>,

    /// Site title
    pub title: String,

    /// Site description
    pub description: String,

    /// Paths to CSS stylesheets to include
    pub styles: Vec<PathBuf>,

    /// Declared sidebar groups
    pub sidebar: Vec<SidebarGroup>,

    /// Report broken links as errors
    pub strict_links: bool,

    /// Live reload script injected into every page
    pub live_reload: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("dist"),
            public_dir: None,
            minify: true,
            base_url: "/".to_string(),
            site_url: None,
            title: "Documentation".to_string(),
            description: String::new(),
            styles: vec![],
            sidebar: vec![],
            strict_links: false,
            live_reload: None,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,

    /// Lint findings, all warnings on success
    pub report: LintReport,
}

/// A content file that failed to load.
#[derive(Debug, Clone)]
pub struct PageError {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read docs directory: {0}")]
    ReadError(String),

    #[error("Failed to parse {} page(s):\n{}", .0.len(), bullet_list(.0))]
    ParseErrors(Vec<PageError>),

    #[error("Duplicate slug \"{slug}\": {} and {}", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Sidebar(#[from] SidebarError),

    #[error("Lint failed with {} error(s):\n{}", .0.len(), bullet_list(.0))]
    Lint(Vec<Diagnostic>),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Refusing to clear output directory {}: it contains {}", .output.display(), .contains.display())]
    UnsafeOutputDir { output: PathBuf, contains: PathBuf },
}

fn bullet_list<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A loaded and validated site, ready to be written.
#[derive(Debug)]
pub struct Site {
    /// Pages sorted by slug
    pub pages: Vec<Page>,

    /// Resolved sidebar, nothing marked current
    pub sidebar: Vec<NavGroup>,

    /// Lint findings
    pub report: LintReport,
}

/// One record of `search-index.json`.
#[derive(Debug, Serialize)]
struct SearchEntry<'a> {
    title: &'a str,
    description: &'a str,
    url: String,
    content: String,
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(mut config: BuildConfig) -> Self {
        config.base_url = normalize_base_url(&config.base_url);

        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Load, validate and lint the site without writing anything.
    pub fn load(&self) -> Result<Site, BuildError> {
        let sources = self.discover_sources()?;

        let loaded: Vec<Result<Page, PageError>> = sources
            .par_iter()
            .map(|(source_path, relative_path)| self.load_page(source_path, relative_path))
            .collect();

        let mut pages = Vec::with_capacity(loaded.len());
        let mut errors = Vec::new();
        for result in loaded {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(BuildError::ParseErrors(errors));
        }

        pages.sort_by(|a, b| {
            a.slug
                .cmp(&b.slug)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });
        for pair in pages.windows(2) {
            if pair[0].slug == pair[1].slug {
                return Err(BuildError::DuplicateSlug {
                    slug: pair[0].slug.clone(),
                    first: pair[0].relative_path.clone(),
                    second: pair[1].relative_path.clone(),
                });
            }
        }

        let sidebar = resolve_sidebar(&self.config.sidebar, &pages, &self.config.base_url)?;

        let files = self.output_files();
        let report = lint_site(
            &pages,
            &sidebar,
            &LintContext {
                base_url: &self.config.base_url,
                files: &files,
                strict_links: self.config.strict_links,
            },
        );

        tracing::debug!(
            "Loaded {} pages, {} sidebar groups",
            pages.len(),
            sidebar.len()
        );

        Ok(Site {
            pages,
            sidebar,
            report,
        })
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let site = self.load()?;
        site.report.log();
        if site.report.has_errors() {
            return Err(BuildError::Lint(site.report.errors().cloned().collect()));
        }

        self.prepare_output_dir()?;

        if let Some(public_dir) = &self.config.public_dir {
            let copied = AssetPipeline::copy_public(public_dir, &self.config.output_dir)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", public_dir.display(), e)))?;
            if copied > 0 {
                tracing::debug!("Copied {} public files", copied);
            }
        }

        let styles = self.stylesheet_urls();

        // Render pages in parallel
        let results: Vec<Result<(), BuildError>> = site
            .pages
            .par_iter()
            .map(|page| self.write_page(page, &site.sidebar, &styles))
            .collect();
        for result in results {
            result?;
        }

        self.write_not_found(&site.sidebar, &styles)?;
        self.generate_assets()?;
        self.generate_search_index(&site.pages)?;
        self.generate_sitemap(&site.pages)?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages: site.pages.len(),
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
            report: site.report,
        })
    }

    /// Find all content files, sorted by path.
    fn discover_sources(&self) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
        if !self.config.docs_dir.is_dir() {
            return Err(BuildError::ReadError(format!(
                "Docs directory not found: {}",
                self.config.docs_dir.display()
            )));
        }

        let mut sources = Vec::new();

        for entry in WalkDir::new(&self.config.docs_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e))
        {
            let entry = entry.map_err(|e| BuildError::ReadError(e.to_string()))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "mdx" && ext != "md" {
                continue;
            }

            let relative_path = path
                .strip_prefix(&self.config.docs_dir)
                .unwrap_or(path)
                .to_path_buf();

            sources.push((path.to_path_buf(), relative_path));
        }

        Ok(sources)
    }

    fn load_page(&self, source_path: &Path, relative_path: &Path) -> Result<Page, PageError> {
        let error = |message: String| PageError {
            path: source_path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(source_path).map_err(|e| error(e.to_string()))?;
        let doc = parse_mdx(&content).map_err(|e| error(e.to_string()))?;
        let rendered = render_markdown(&doc.content);

        Ok(Page {
            source_path: source_path.to_path_buf(),
            relative_path: relative_path.to_path_buf(),
            slug: slug_for(relative_path),
            doc,
            rendered,
        })
    }

    /// Non-page files the build will emit, for link checking.
    fn output_files(&self) -> BTreeSet<String> {
        let mut files = self
            .config
            .public_dir
            .as_deref()
            .map(AssetPipeline::public_files)
            .unwrap_or_default();

        files.extend(
            ["404.html", "search-index.json", "assets/main.css", "assets/main.js"]
                .into_iter()
                .map(String::from),
        );
        files.extend(self.existing_styles().map(|(_, output)| output));
        if self.config.site_url.is_some() {
            files.insert("sitemap.xml".to_string());
            files.insert("robots.txt".to_string());
        }

        files
    }

    /// Clear the output directory, refusing if it holds any input.
    fn prepare_output_dir(&self) -> Result<(), BuildError> {
        let output = &self.config.output_dir;

        if output.exists() {
            let resolved_output = canonical(output);
            let inputs = std::iter::once(&self.config.docs_dir)
                .chain(self.config.public_dir.as_ref())
                .chain(self.config.styles.iter());

            for input in inputs {
                if input.exists() && canonical(input).starts_with(&resolved_output) {
                    return Err(BuildError::UnsafeOutputDir {
                        output: output.clone(),
                        contains: input.clone(),
                    });
                }
            }

            fs::remove_dir_all(output)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", output.display(), e)))?;
        }

        fs::create_dir_all(output)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", output.display(), e)))
    }

    /// Render and write a single page.
    fn write_page(
        &self,
        page: &Page,
        sidebar: &[NavGroup],
        styles: &[String],
    ) -> Result<(), BuildError> {
        let toc = if page.doc.frontmatter.table_of_contents {
            page.rendered
                .toc
                .iter()
                .filter(|e| (2..=3).contains(&e.level))
                .map(|e| TocEntry {
                    title: e.title.clone(),
                    id: e.id.clone(),
                    level: e.level,
                })
                .collect()
        } else {
            vec![]
        };

        let context = Context {
            title: page.title().to_string(),
            description: page.description().to_string(),
            site_title: self.config.title.clone(),
            content: page.rendered.html.clone(),
            sidebar: mark_current(sidebar, &page.slug),
            toc,
            base_url: self.config.base_url.clone(),
            styles: styles.to_vec(),
            live_reload: self.config.live_reload.clone(),
        };

        let html = self
            .templates
            .render_page("doc.html", &context)
            .map_err(|e| {
                BuildError::TemplateError(format!("{}: {}", page.source_path.display(), e))
            })?;

        write_file(&page.output_path(&self.config.output_dir), html.as_bytes())
    }

    fn write_not_found(&self, sidebar: &[NavGroup], styles: &[String]) -> Result<(), BuildError> {
        let context = Context {
            title: "Page not found".to_string(),
            description: "The page you are looking for does not exist.".to_string(),
            site_title: self.config.title.clone(),
            content: String::new(),
            sidebar: sidebar.to_vec(),
            toc: vec![],
            base_url: self.config.base_url.clone(),
            styles: styles.to_vec(),
            live_reload: self.config.live_reload.clone(),
        };

        let html = self
            .templates
            .render_page("404.html", &context)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        write_file(&self.config.output_dir.join("404.html"), html.as_bytes())
    }

    /// Configured stylesheets that exist, with their output paths.
    ///
    /// Custom styles live under `assets/custom/`, prefixed with their position
    /// in the config, so they never replace the theme or each other.
    fn existing_styles(&self) -> impl Iterator<Item = (&PathBuf, String)> {
        self.config
            .styles
            .iter()
            .enumerate()
            .filter_map(|(index, path)| {
                if !path.is_file() {
                    return None;
                }
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some((path, format!("assets/custom/{}-{}", index, name)))
            })
    }

    fn stylesheet_urls(&self) -> Vec<String> {
        self.existing_styles()
            .map(|(_, output)| format!("{}{}", self.config.base_url, output))
            .collect()
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.output_dir.join("assets");

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            match AssetPipeline::minify_css(&css) {
                Ok(minified) => minified,
                Err(e) => {
                    tracing::warn!("{}", e);
                    css
                }
            }
        } else {
            css
        };
        write_file(&assets_dir.join("main.css"), css.as_bytes())?;
        write_file(
            &assets_dir.join("main.js"),
            AssetPipeline::generate_js().as_bytes(),
        )?;

        // Copy configured stylesheets
        for style_path in &self.config.styles {
            if !style_path.is_file() {
                tracing::warn!("Stylesheet not found: {}", style_path.display());
            }
        }
        for (source_path, output) in self.existing_styles() {
            let content = fs::read(source_path).map_err(|e| {
                BuildError::ReadError(format!("{}: {}", source_path.display(), e))
            })?;
            write_file(&self.config.output_dir.join(&output), &content)?;
            tracing::debug!("Copied stylesheet from {}", source_path.display());
        }

        Ok(())
    }

    /// Generate search index.
    fn generate_search_index(&self, pages: &[Page]) -> Result<(), BuildError> {
        let index: Vec<SearchEntry<'_>> = pages
            .iter()
            .map(|page| SearchEntry {
                title: page.title(),
                description: page.description(),
                url: page.url(&self.config.base_url),
                content: page.doc.excerpt(EXCERPT_CHARS),
            })
            .collect();

        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write_file(
            &self.config.output_dir.join("search-index.json"),
            json.as_bytes(),
        )
    }

    /// Generate sitemap and robots.txt when the site origin is known.
    fn generate_sitemap(&self, pages: &[Page]) -> Result<(), BuildError> {
        let Some(site_url) = &self.config.site_url else {
            return Ok(());
        };
        let origin = site_url.trim_end_matches('/');

        let urls: Vec<String> = pages
            .iter()
            .map(|page| {
                format!(
                    "  <url>\n    <loc>{}{}</loc>\n  </url>",
                    escape_xml(origin),
                    escape_xml(&page.url(&self.config.base_url))
                )
            })
            .collect();

        let sitemap = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}\n</urlset>\n",
            urls.join("\n")
        );
        write_file(
            &self.config.output_dir.join("sitemap.xml"),
            sitemap.as_bytes(),
        )?;

        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}{}sitemap.xml\n",
            origin, self.config.base_url
        );
        write_file(&self.config.output_dir.join("robots.txt"), robots.as_bytes())
    }
}

/// Hidden and underscore-prefixed entries are not content.
fn is_ignored(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", parent.display(), e)))?;
    }
    fs::write(path, contents)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{LintKind, Severity};
    use crate::sidebar::{Autogenerate, SidebarEntry};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::{tempdir, TempDir};

    /// Every file under `dir` with its contents, keyed by relative path.
    fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let relative = e
                    .path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                (relative, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn page(title: &str, body: &str) -> String {
        format!(
            "---\ntitle: {}\ndescription: About {}\n---\n{}\n",
            title, title, body
        )
    }

    fn group(label: &str, slugs: &[&str]) -> SidebarGroup {
        SidebarGroup {
            label: label.to_string(),
            items: slugs
                .iter()
                .map(|s| SidebarEntry::Slug(s.to_string()))
                .collect(),
            autogenerate: None,
            collapsed: false,
        }
    }

    /// A docs tree with the given files plus a config pointing at it.
    fn fixture(files: &[(&str, String)]) -> (TempDir, BuildConfig) {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("docs");

        for (path, content) in files {
            let path = docs.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        fs::create_dir_all(&docs).unwrap();

        let config = BuildConfig {
            docs_dir: docs,
            output_dir: temp.path().join("dist"),
            title: "Product Docs".to_string(),
            ..Default::default()
        };
        (temp, config)
    }

    fn guide_site() -> (TempDir, BuildConfig) {
        let (temp, mut config) = fixture(&[
            ("index.md", page("Home", "# Welcome")),
            (
                "guides/setup.md",
                page("Setup", "## Install\n\n```sh\ncargo install lectern\n```"),
            ),
            ("guides/deploy.mdx", page("Deploy", "## Ship it")),
        ]);
        config.sidebar = vec![group("Guides", &["guides/setup", "guides/deploy"])];
        (temp, config)
    }

    #[tokio::test]
    async fn builds_simple_site() {
        let (_temp, config) = guide_site();
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).build().await.unwrap();

        assert_eq!(result.pages, 3);
        assert!(out.join("index.html").exists());
        assert!(out.join("guides/setup/index.html").exists());
        assert!(out.join("guides/deploy/index.html").exists());
        assert!(out.join("404.html").exists());
        assert!(out.join("assets/main.css").exists());
        assert!(out.join("assets/main.js").exists());
        assert!(!out.join("sitemap.xml").exists());
        assert_eq!(result.report.diagnostics.len(), 0);
    }

    #[tokio::test]
    async fn marks_current_page_and_renders_toc() {
        let (_temp, config) = guide_site();
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        let html = fs::read_to_string(out.join("guides/setup/index.html")).unwrap();
        assert!(html.contains(r#"aria-current="page">Setup</a>"#));
        assert!(html.contains(r##"<a href="#install">Install</a>"##));
        assert!(html.contains(r#"<h2 id="install">Install</h2>"#));
    }

    #[tokio::test]
    async fn generates_search_index_sorted_by_slug() {
        let (_temp, config) = guide_site();
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        let index: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(out.join("search-index.json")).unwrap())
                .unwrap();
        let urls: Vec<&str> = index.iter().map(|e| e["url"].as_str().unwrap()).collect();
        assert_eq!(urls, vec!["/", "/guides/deploy/", "/guides/setup/"]);
        assert_eq!(index[2]["title"], "Setup");
        assert_eq!(index[2]["description"], "About Setup");
        assert_eq!(index[2]["content"], "Install");
    }

    #[tokio::test]
    async fn orphan_page_builds_but_is_flagged() {
        let (temp, config) = guide_site();
        fs::write(
            temp.path().join("docs/guides/faq.md"),
            page("FAQ", "Nobody links here."),
        )
        .unwrap();
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).build().await.unwrap();

        assert!(out.join("guides/faq/index.html").exists());
        let orphans: Vec<_> = result.report.of_kind(LintKind::OrphanPage).collect();
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].message.contains("guides/faq"));
        assert_eq!(orphans[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn removed_referenced_page_fails_naming_slug() {
        let (temp, config) = guide_site();
        fs::remove_file(temp.path().join("docs/guides/deploy.mdx")).unwrap();

        let err = StaticBuilder::new(config).build().await.unwrap_err();

        assert!(matches!(err, BuildError::Sidebar(_)));
        let message = err.to_string();
        assert!(message.contains("guides/deploy"), "{}", message);
        assert!(message.contains("Guides"), "{}", message);
    }

    #[tokio::test]
    async fn duplicate_group_labels_render_distinctly() {
        let (_temp, mut config) = guide_site();
        config.sidebar = vec![
            group("Guides", &["guides/setup"]),
            group("Guides", &["guides/deploy"]),
        ];
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert_eq!(html.matches("<summary>Guides</summary>").count(), 2);
        assert!(html.contains(r#"id="sidebar-group-1""#));
        assert!(html.contains(r#"id="sidebar-group-2""#));
        assert!(html.contains(">Setup</a>"));
        assert!(html.contains(">Deploy</a>"));
    }

    #[tokio::test]
    async fn empty_title_fails_validation() {
        let (_temp, config) = fixture(&[
            ("index.md", page("Home", "Hi")),
            ("broken.md", "---\ntitle: \"\"\ndescription: x\n---\nBody\n".to_string()),
        ]);

        let err = StaticBuilder::new(config).build().await.unwrap_err();

        match &err {
            BuildError::ParseErrors(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].path.ends_with("broken.md"));
                assert!(errors[0].message.contains("title"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn reports_every_invalid_page() {
        let (_temp, config) = fixture(&[
            ("a.md", "no frontmatter".to_string()),
            ("b.md", "---\ntitle: B\n---\n".to_string()),
        ]);

        let err = StaticBuilder::new(config).load().unwrap_err();

        match err {
            BuildError::ParseErrors(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn builds_are_idempotent() {
        let (temp, mut config) = guide_site();
        let public = temp.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("favicon.svg"), "<svg/>").unwrap();
        config.public_dir = Some(public);
        config.site_url = Some("https://docs.example.com".to_string());
        let out = config.output_dir.clone();
        let builder = StaticBuilder::new(config);

        builder.build().await.unwrap();
        let first = snapshot(&out);
        builder.build().await.unwrap();
        let second = snapshot(&out);

        assert!(first.len() > 5);
        assert_eq!(first, second);
    }

    #[test]
    fn flags_missing_code_language() {
        let (_temp, mut config) = fixture(&[
            ("index.md", page("Home", "Hi")),
            ("cli.md", page("CLI", "Intro\n\n```\nlectern build\n```")),
        ]);
        config.sidebar = vec![group("Reference", &["cli"])];

        let site = StaticBuilder::new(config).load().unwrap();

        let findings: Vec<_> = site.report.of_kind(LintKind::MissingCodeLanguage).collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(7));
    }

    #[tokio::test]
    async fn broken_links_fail_when_strict() {
        let (_temp, mut config) = fixture(&[(
            "index.md",
            page("Home", "See [setup](/guides/missing/)."),
        )]);
        let out = config.output_dir.clone();

        let lenient = StaticBuilder::new(config.clone()).build().await.unwrap();
        assert_eq!(lenient.report.of_kind(LintKind::BrokenLink).count(), 1);
        assert!(out.join("index.html").exists());

        config.strict_links = true;
        let err = StaticBuilder::new(config).build().await.unwrap_err();
        assert!(matches!(err, BuildError::Lint(ref d) if d.len() == 1));
    }

    #[test]
    fn lints_content_inside_components() {
        let body = "<Aside type=\"tip\">\nSee [guide](/missing/).\n</Aside>\n\n\
                    <Card title=\"Next\">\nRead [more](/also-missing/).\n</Card>\n\n\
                    <Tabs>\n<TabItem label=\"npm\">\n```\nnpm i\n```\n</TabItem>\n</Tabs>";
        let (_temp, config) = fixture(&[("index.md", page("Home", body))]);

        let site = StaticBuilder::new(config).load().unwrap();

        let broken: Vec<_> = site.report.of_kind(LintKind::BrokenLink).collect();
        assert_eq!(broken.len(), 2, "{:?}", broken);
        assert!(broken[0].message.contains("/missing/"));
        assert_eq!(broken[0].line, Some(6));
        assert!(broken[1].message.contains("/also-missing/"));
        assert_eq!(broken[1].line, Some(10));

        let unlabelled: Vec<_> = site.report.of_kind(LintKind::MissingCodeLanguage).collect();
        assert_eq!(unlabelled.len(), 1);
        assert_eq!(unlabelled[0].line, Some(15));
    }

    #[tokio::test]
    async fn links_to_public_files_resolve() {
        let (temp, mut config) = fixture(&[(
            "index.md",
            page("Home", "![diagram](/images/arch.png) and [feed](/search-index.json)"),
        )]);
        let public = temp.path().join("public");
        fs::create_dir_all(public.join("images")).unwrap();
        fs::write(public.join("images/arch.png"), [1u8]).unwrap();
        config.public_dir = Some(public);
        config.strict_links = true;
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        assert!(out.join("images/arch.png").exists());
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let (_temp, config) = fixture(&[
            ("guides.md", page("Guides", "A")),
            ("guides/index.md", page("Guides index", "B")),
        ]);

        let err = StaticBuilder::new(config).load().unwrap_err();

        match err {
            BuildError::DuplicateSlug { slug, .. } => assert_eq!(slug, "guides"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn refuses_output_dir_containing_docs() {
        let (temp, mut config) = guide_site();
        config.output_dir = temp.path().to_path_buf();

        let err = StaticBuilder::new(config).build().await.unwrap_err();

        assert!(matches!(err, BuildError::UnsafeOutputDir { .. }));
        assert!(temp.path().join("docs/index.md").exists());
    }

    #[tokio::test]
    async fn clears_stale_output() {
        let (_temp, config) = guide_site();
        let out = config.output_dir.clone();
        fs::create_dir_all(out.join("old")).unwrap();
        fs::write(out.join("old/index.html"), "stale").unwrap();

        StaticBuilder::new(config).build().await.unwrap();

        assert!(!out.join("old").exists());
    }

    #[tokio::test]
    async fn writes_sitemap_under_base_url() {
        let (_temp, mut config) = guide_site();
        config.base_url = "docs".to_string();
        config.site_url = Some("https://example.com/".to_string());
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/docs/guides/setup/</loc>"));
        assert_eq!(sitemap.matches("<url>").count(), 3);
        let robots = fs::read_to_string(out.join("robots.txt")).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/docs/sitemap.xml"));
    }

    #[tokio::test]
    async fn copies_custom_styles() {
        let (temp, mut config) = guide_site();
        let style = temp.path().join("custom.css");
        fs::write(&style, ".brand { color: red; }").unwrap();
        config.styles = vec![style, temp.path().join("missing.css")];
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        assert!(out.join("assets/custom/0-custom.css").exists());
        let html = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("0-custom.css"));
        assert!(!html.contains("missing.css"));
    }

    #[tokio::test]
    async fn custom_styles_keep_theme_and_each_other() {
        let (temp, mut config) = guide_site();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::create_dir_all(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("a/main.css"), ".a { color: red; }").unwrap();
        fs::write(temp.path().join("b/main.css"), ".b { color: blue; }").unwrap();
        config.styles = vec![temp.path().join("a/main.css"), temp.path().join("b/main.css")];
        config.minify = false;
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().await.unwrap();

        let theme = fs::read_to_string(out.join("assets/main.css")).unwrap();
        assert!(theme.contains(".sidebar-item"));
        assert_eq!(
            fs::read_to_string(out.join("assets/custom/0-main.css")).unwrap(),
            ".a { color: red; }"
        );
        assert_eq!(
            fs::read_to_string(out.join("assets/custom/1-main.css")).unwrap(),
            ".b { color: blue; }"
        );
    }

    #[test]
    fn autogenerated_groups_include_directory_pages() {
        let (_temp, mut config) = guide_site();
        config.sidebar = vec![SidebarGroup {
            label: "Guides".to_string(),
            items: vec![],
            autogenerate: Some(Autogenerate {
                directory: "guides".to_string(),
            }),
            collapsed: true,
        }];

        let site = StaticBuilder::new(config).load().unwrap();

        let labels: Vec<&str> = site.sidebar[0]
            .items
            .iter()
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Deploy", "Setup"]);
        assert_eq!(site.report.of_kind(LintKind::OrphanPage).count(), 0);
    }

    #[test]
    fn ignores_hidden_and_underscored_entries() {
        let (_temp, config) = fixture(&[
            ("index.md", page("Home", "Hi")),
            ("_partials/note.md", "not a page".to_string()),
            (".drafts/wip.md", "not a page".to_string()),
        ]);

        let site = StaticBuilder::new(config).load().unwrap();

        assert_eq!(site.pages.len(), 1);
    }

    #[tokio::test]
    async fn missing_docs_dir_is_an_error() {
        let temp = tempdir().unwrap();
        let config = BuildConfig {
            docs_dir: temp.path().join("nope"),
            output_dir: temp.path().join("dist"),
            ..Default::default()
        };

        let err = StaticBuilder::new(config).build().await.unwrap_err();

        assert!(matches!(err, BuildError::ReadError(_)));
    }
}

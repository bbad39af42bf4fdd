//! Configuration file (`lectern.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use lectern_static::{BuildConfig, SidebarGroup};

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "lectern.toml";

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub lint: LintSettings,
    #[serde(default)]
    pub sidebar: Vec<SidebarGroup>,

    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Public origin, enables the sitemap
    pub url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            base_url: default_base_url(),
            url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DocsConfig {
    #[serde(default = "default_docs_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_public")]
    pub public: PathBuf,
    /// Paths to CSS stylesheets to include
    #[serde(default)]
    pub styles: Vec<PathBuf>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            output: default_output(),
            public: default_public(),
            styles: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_minify")]
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: default_minify(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LintSettings {
    /// Fail the build on broken internal links
    #[serde(default)]
    pub strict_links: bool,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_output() -> PathBuf {
    PathBuf::from("dist")
}
fn default_public() -> PathBuf {
    PathBuf::from("public")
}
fn default_title() -> String {
    "Documentation".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_minify() -> bool {
    true
}

impl Config {
    /// Load configuration from `path` if it exists.
    ///
    /// A missing file gives defaults relative to its directory. Returns an
    /// error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();

        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self {
                base_dir,
                ..Default::default()
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = base_dir;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve a configured path against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Build settings for the static builder.
    pub fn to_build_config(&self) -> BuildConfig {
        BuildConfig {
            docs_dir: self.resolve(&self.docs.dir),
            output_dir: self.resolve(&self.docs.output),
            public_dir: Some(self.resolve(&self.docs.public)),
            minify: self.build.minify,
            base_url: self.site.base_url.clone(),
            site_url: self.site.url.clone(),
            title: self.site.title.clone(),
            description: self.site.description.clone(),
            styles: self.docs.styles.iter().map(|s| self.resolve(s)).collect(),
            sidebar: self.sidebar.clone(),
            strict_links: self.lint.strict_links,
            live_reload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_static::{Autogenerate, SidebarEntry};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = Config::load(&temp.path().join(CONFIG_FILENAME)).unwrap();
        let build = config.to_build_config();

        assert_eq!(build.docs_dir, temp.path().join("docs"));
        assert_eq!(build.output_dir, temp.path().join("dist"));
        assert_eq!(build.public_dir, Some(temp.path().join("public")));
        assert_eq!(build.title, "Documentation");
        assert!(build.minify);
        assert!(!build.strict_links);
        assert!(build.sidebar.is_empty());
    }

    #[test]
    fn loads_full_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[site]
title = "Product Docs"
base_url = "/docs/"
url = "https://docs.example.com"

[docs]
dir = "content"
styles = ["styles/custom.css"]

[build]
minify = false

[lint]
strict_links = true

[[sidebar]]
label = "Start Here"
items = ["index", { label = "Install", slug = "guides/install" }]

[[sidebar]]
label = "Reference"
collapsed = true
autogenerate = { directory = "reference" }
"#,
        )
        .unwrap();

        let build = Config::load(&path).unwrap().to_build_config();

        assert_eq!(build.title, "Product Docs");
        assert_eq!(build.base_url, "/docs/");
        assert_eq!(build.site_url.as_deref(), Some("https://docs.example.com"));
        assert_eq!(build.docs_dir, temp.path().join("content"));
        assert_eq!(build.styles, vec![temp.path().join("styles/custom.css")]);
        assert!(!build.minify);
        assert!(build.strict_links);
        assert_eq!(build.sidebar.len(), 2);
        assert_eq!(
            build.sidebar[0].items[1],
            SidebarEntry::Page {
                label: "Install".to_string(),
                slug: "guides/install".to_string(),
            }
        );
        assert_eq!(
            build.sidebar[1].autogenerate,
            Some(Autogenerate {
                directory: "reference".to_string(),
            })
        );
        assert!(build.sidebar[1].collapsed);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "[site\ntitle = ").unwrap();

        let err = Config::load(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}

//! Asset pipeline for CSS, JavaScript and public files.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the theme CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Generate the runtime JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }

    /// Files under the public directory, as `/`-separated relative paths.
    pub fn public_files(public_dir: &Path) -> BTreeSet<String> {
        if !public_dir.is_dir() {
            return BTreeSet::new();
        }

        WalkDir::new(public_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(public_dir).ok()?;
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("/"))
            })
            .collect()
    }

    /// Copy the public directory verbatim into the output root.
    ///
    /// Returns the number of files copied.
    pub fn copy_public(public_dir: &Path, output_dir: &Path) -> io::Result<usize> {
        let files = Self::public_files(public_dir);

        for relative in &files {
            let target = output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(public_dir.join(relative), &target)?;
        }

        Ok(files.len())
    }
}

const DEFAULT_CSS: &str = r#"/* Lectern docs theme */

:root {
  --sidebar-width: 18rem;
  --toc-width: 14rem;
  --content-max-width: 48rem;

  --color-bg: #ffffff;
  --color-bg-muted: #f6f7f9;
  --color-fg: #17181c;
  --color-fg-muted: #5b616e;
  --color-border: #e2e4e9;
  --color-accent: #4f46e5;
  --color-accent-fg: #ffffff;
  --color-code-bg: #f3f4f6;

  --color-note: #2563eb;
  --color-tip: #16a34a;
  --color-caution: #d97706;
  --color-danger: #dc2626;

  --font-sans: system-ui, -apple-system, "Segoe UI", sans-serif;
  --font-mono: ui-monospace, "SFMono-Regular", Menlo, monospace;
  --radius: 0.5rem;
}

@media (prefers-color-scheme: dark) {
  :root {
    --color-bg: #111318;
    --color-bg-muted: #181b22;
    --color-fg: #e8eaef;
    --color-fg-muted: #9aa1ae;
    --color-border: #2a2e38;
    --color-accent: #818cf8;
    --color-accent-fg: #111318;
    --color-code-bg: #1c1f27;
  }
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: var(--font-sans);
  background: var(--color-bg);
  color: var(--color-fg);
  line-height: 1.65;
}

.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: 100vh;
}

/* Sidebar */
.sidebar {
  background: var(--color-bg-muted);
  border-right: 1px solid var(--color-border);
  padding: 1.25rem 1rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.sidebar-header {
  margin-bottom: 1.25rem;
}

.site-title {
  font-weight: 700;
  font-size: 1.125rem;
  color: var(--color-fg);
  text-decoration: none;
}

.sidebar ul {
  list-style: none;
  margin: 0;
  padding: 0;
}

.sidebar-group {
  margin-bottom: 0.75rem;
}

.sidebar-group summary {
  cursor: pointer;
  font-weight: 600;
  font-size: 0.875rem;
  padding: 0.25rem 0.5rem;
}

.sidebar-items {
  margin-top: 0.25rem;
}

.sidebar-item a {
  display: block;
  padding: 0.3rem 0.75rem;
  font-size: 0.875rem;
  color: var(--color-fg-muted);
  text-decoration: none;
  border-radius: var(--radius);
}

.sidebar-item a:hover {
  color: var(--color-fg);
  background: var(--color-border);
}

.sidebar-item.current > a {
  background: var(--color-accent);
  color: var(--color-accent-fg);
}

/* Main content */
.main {
  display: grid;
  grid-template-columns: minmax(0, 1fr) var(--toc-width);
  gap: 2.5rem;
  padding: 2rem 2.5rem;
  max-width: calc(var(--content-max-width) + var(--toc-width) + 5rem);
}

.doc {
  max-width: var(--content-max-width);
}

.page-title {
  font-size: 2.25rem;
  margin: 0 0 1.5rem;
}

.content h2 {
  font-size: 1.5rem;
  margin: 2.25rem 0 1rem;
  padding-bottom: 0.4rem;
  border-bottom: 1px solid var(--color-border);
}

.content h3 {
  font-size: 1.2rem;
  margin: 1.75rem 0 0.75rem;
}

.content a {
  color: var(--color-accent);
  text-underline-offset: 3px;
}

.content table {
  border-collapse: collapse;
  width: 100%;
  margin-bottom: 1rem;
}

.content th,
.content td {
  border: 1px solid var(--color-border);
  padding: 0.4rem 0.75rem;
  text-align: left;
}

/* Code */
.content pre {
  position: relative;
  background: var(--color-code-bg);
  border: 1px solid var(--color-border);
  border-radius: var(--radius);
  padding: 1rem;
  overflow-x: auto;
  font-size: 0.875rem;
}

.content code {
  font-family: var(--font-mono);
  font-size: 0.875em;
  background: var(--color-code-bg);
  padding: 0.1rem 0.35rem;
  border-radius: 0.25rem;
}

.content pre code {
  background: none;
  padding: 0;
}

.content pre.mermaid {
  background: var(--color-bg);
  text-align: center;
}

.copy-btn {
  position: absolute;
  top: 0.5rem;
  right: 0.5rem;
  padding: 0.2rem 0.6rem;
  font-size: 0.75rem;
  background: var(--color-bg);
  color: var(--color-fg-muted);
  border: 1px solid var(--color-border);
  border-radius: var(--radius);
  cursor: pointer;
}

/* Components */
.card-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(16rem, 1fr));
  gap: 1rem;
  margin-bottom: 1.5rem;
}

.card-grid.stagger > :nth-child(2n) {
  transform: translateY(1.5rem);
}

.card,
.link-card a {
  display: block;
  border: 1px solid var(--color-border);
  border-radius: var(--radius);
  padding: 1rem 1.25rem;
  background: var(--color-bg-muted);
}

.card-title,
.link-card-title {
  font-weight: 600;
  margin: 0 0 0.5rem;
}

.link-card {
  margin-bottom: 1rem;
}

.link-card a {
  color: var(--color-fg);
  text-decoration: none;
}

.link-card a:hover {
  border-color: var(--color-accent);
}

.link-card-description {
  display: block;
  color: var(--color-fg-muted);
}

.aside {
  border-left: 4px solid var(--color-note);
  background: var(--color-bg-muted);
  padding: 0.75rem 1rem;
  margin-bottom: 1rem;
  border-radius: 0 var(--radius) var(--radius) 0;
}

.aside-title {
  font-weight: 600;
  margin: 0 0 0.25rem;
}

.aside-tip {
  border-color: var(--color-tip);
}

.aside-caution {
  border-color: var(--color-caution);
}

.aside-danger {
  border-color: var(--color-danger);
}

.steps > ol {
  counter-reset: step;
  list-style: none;
  padding-left: 2.25rem;
}

.steps > ol > li {
  counter-increment: step;
  position: relative;
  margin-bottom: 1rem;
}

.steps > ol > li::before {
  content: counter(step);
  position: absolute;
  left: -2.25rem;
  width: 1.6rem;
  height: 1.6rem;
  border-radius: 50%;
  background: var(--color-accent);
  color: var(--color-accent-fg);
  text-align: center;
  font-size: 0.8rem;
  line-height: 1.6rem;
}

.tab-item {
  border: 1px solid var(--color-border);
  border-radius: var(--radius);
  padding: 0.5rem 1rem;
  margin-bottom: 0.5rem;
}

.badge {
  display: inline-block;
  font-size: 0.75rem;
  padding: 0.05rem 0.5rem;
  border-radius: 999px;
  background: var(--color-border);
}

.badge-tip,
.badge-success {
  background: var(--color-tip);
  color: #fff;
}

.badge-caution {
  background: var(--color-caution);
  color: #fff;
}

.badge-danger {
  background: var(--color-danger);
  color: #fff;
}

/* Table of contents */
.toc {
  position: sticky;
  top: 2rem;
  align-self: start;
  font-size: 0.875rem;
}

.toc h2 {
  font-size: 0.75rem;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  color: var(--color-fg-muted);
}

.toc ul {
  list-style: none;
  padding: 0;
}

.toc a {
  color: var(--color-fg-muted);
  text-decoration: none;
}

.toc a:hover {
  color: var(--color-fg);
}

.toc-level-3 {
  padding-left: 0.75rem;
}

/* Mobile */
.menu-btn {
  display: none;
}

@media (max-width: 960px) {
  .layout,
  .main {
    grid-template-columns: 1fr;
  }

  .toc {
    display: none;
  }

  .sidebar {
    position: fixed;
    left: -100%;
    z-index: 50;
    width: var(--sidebar-width);
    transition: left 0.2s;
  }

  .sidebar.open {
    left: 0;
  }

  .menu-btn {
    display: block;
    position: fixed;
    top: 0.75rem;
    right: 0.75rem;
    z-index: 100;
    padding: 0.4rem 0.8rem;
    background: var(--color-accent);
    color: var(--color-accent-fg);
    border: none;
    border-radius: var(--radius);
  }
}
"#;

const DEFAULT_JS: &str = r#"// Lectern runtime
(function() {
  'use strict';

  const menuBtn = document.querySelector('.menu-btn');
  const sidebar = document.querySelector('.sidebar');

  if (menuBtn && sidebar) {
    menuBtn.addEventListener('click', () => {
      const open = sidebar.classList.toggle('open');
      menuBtn.setAttribute('aria-expanded', String(open));
    });
  }

  // Keep the current sidebar entry in view
  const current = document.querySelector('.sidebar [aria-current="page"]');
  if (current) {
    current.scrollIntoView({ block: 'nearest' });
  }

  document.querySelectorAll('.content pre:not(.mermaid)').forEach(pre => {
    if (pre.querySelector('.copy-btn')) return;

    const btn = document.createElement('button');
    btn.className = 'copy-btn';
    btn.textContent = 'Copy';
    btn.setAttribute('type', 'button');

    btn.addEventListener('click', async () => {
      const code = pre.querySelector('code');
      try {
        await navigator.clipboard.writeText(code ? code.textContent : pre.textContent);
        btn.textContent = 'Copied';
      } catch (err) {
        btn.textContent = 'Failed';
      }
      setTimeout(() => { btn.textContent = 'Copy'; }, 2000);
    });

    pre.appendChild(btn);
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generates_css() {
        let css = AssetPipeline::generate_css();
        assert!(css.contains(":root"));
        assert!(css.contains(".sidebar-item.current"));
        assert!(css.contains(".aside-danger"));
    }

    #[test]
    fn generates_js() {
        let js = AssetPipeline::generate_js();
        assert!(js.contains("addEventListener"));
        assert!(js.contains("clipboard"));
    }

    #[test]
    fn minifies_theme() {
        let minified = AssetPipeline::minify_css(&AssetPipeline::generate_css()).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".card-grid"));
    }

    #[test]
    fn copies_public_files() {
        let temp = tempdir().unwrap();
        let public = temp.path().join("public");
        let out = temp.path().join("dist");
        fs::create_dir_all(public.join("images")).unwrap();
        fs::write(public.join("favicon.svg"), "<svg/>").unwrap();
        fs::write(public.join("images/arch.png"), [0u8, 1, 2]).unwrap();

        let files = AssetPipeline::public_files(&public);
        let copied = AssetPipeline::copy_public(&public, &out).unwrap();

        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["favicon.svg".to_string(), "images/arch.png".to_string()]
        );
        assert_eq!(copied, 2);
        assert_eq!(fs::read(out.join("images/arch.png")).unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn missing_public_dir_is_empty() {
        let temp = tempdir().unwrap();

        assert!(AssetPipeline::public_files(&temp.path().join("nope")).is_empty());
    }
}

//! Content lint pass.
//!
//! Runs after pages are parsed and the sidebar is resolved. Findings never
//! stop the build on their own unless their severity is [`Severity::Error`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::page::{normalize_slug, Page};
use crate::sidebar::referenced_slugs;
use crate::templates::NavGroup;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintKind {
    /// Page not reachable from the sidebar
    OrphanPage,
    /// Fenced code block without a language tag
    MissingCodeLanguage,
    /// Internal link to nothing
    BrokenLink,
    /// Component could not be expanded
    Component,
}

impl LintKind {
    /// Stable identifier shown next to messages.
    pub fn code(&self) -> &'static str {
        match self {
            LintKind::OrphanPage => "orphan-page",
            LintKind::MissingCodeLanguage => "missing-code-language",
            LintKind::BrokenLink => "broken-link",
            LintKind::Component => "component",
        }
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: LintKind,
    pub severity: Severity,
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: ", self.path.display(), line)?,
            None => write!(f, "{}: ", self.path.display())?,
        }
        write!(f, "{} [{}]", self.message, self.kind.code())
    }
}

/// All findings of one lint run, in page order.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    /// Findings with error severity.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Findings with warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: LintKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Warning => tracing::warn!("{}", diagnostic),
                Severity::Error => tracing::error!("{}", diagnostic),
            }
        }
    }
}

/// Inputs to the lint pass besides pages and sidebar.
#[derive(Debug, Clone)]
pub struct LintContext<'a> {
    /// Site base URL, normalized
    pub base_url: &'a str,
    /// Non-page files that will exist in the output, relative to its root
    pub files: &'a BTreeSet<String>,
    /// Report broken links as errors
    pub strict_links: bool,
}

/// Lint all pages.
pub fn lint_site(pages: &[Page], nav: &[NavGroup], ctx: &LintContext<'_>) -> LintReport {
    let mut report = LintReport::default();
    let mut in_sidebar: BTreeSet<String> =
        referenced_slugs(nav).into_iter().map(String::from).collect();
    // Sidebar links written as internal paths reach pages too.
    in_sidebar.extend(
        nav.iter()
            .flat_map(|g| g.items.iter())
            .filter(|i| i.slug.is_none() && !i.external)
            .filter_map(|i| resolve_link("", &i.href, ctx.base_url))
            .map(|resolved| normalize_slug(&resolved)),
    );
    let slugs: BTreeSet<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
    let link_severity = if ctx.strict_links {
        Severity::Error
    } else {
        Severity::Warning
    };

    for page in pages {
        let path = &page.source_path;

        if !page.slug.is_empty() && !in_sidebar.contains(&page.slug) {
            report.diagnostics.push(Diagnostic {
                kind: LintKind::OrphanPage,
                severity: Severity::Warning,
                path: path.clone(),
                line: None,
                message: format!("page \"{}\" is not reachable from the sidebar", page.slug),
            });
        }

        for block in page.doc.code_blocks.iter().filter(|b| b.missing_language()) {
            report.diagnostics.push(Diagnostic {
                kind: LintKind::MissingCodeLanguage,
                severity: Severity::Warning,
                path: path.clone(),
                line: Some(block.line_number),
                message: "fenced code block has no language tag".to_string(),
            });
        }

        for link in &page.doc.links {
            let Some(resolved) = resolve_link(&page.slug, &link.target, ctx.base_url) else {
                continue;
            };
            let exists = slugs.contains(normalize_slug(&resolved).as_str())
                || ctx.files.contains(resolved.trim_matches('/'));
            if !exists {
                report.diagnostics.push(Diagnostic {
                    kind: LintKind::BrokenLink,
                    severity: link_severity,
                    path: path.clone(),
                    line: Some(link.line),
                    message: format!("link \"{}\" does not resolve to a page or file", link.target),
                });
            }
        }

        for warning in &page.rendered.warnings {
            report.diagnostics.push(Diagnostic {
                kind: LintKind::Component,
                severity: Severity::Warning,
                path: path.clone(),
                line: None,
                message: warning.clone(),
            });
        }
    }

    report
}

/// Resolve an internal link to a site-relative path without leading slash.
///
/// Returns `None` for links that are not checked: external URLs, other
/// schemes and same-page fragments. Relative links resolve against the URL of
/// the page they appear on, which is its slug directory.
pub fn resolve_link(from_slug: &str, target: &str, base_url: &str) -> Option<String> {
    let target = target.trim();
    if target.is_empty() || target.starts_with('#') || target.starts_with("//") {
        return None;
    }
    if has_scheme(target) {
        return None;
    }

    let path = target
        .split(|c: char| c == '#' || c == '?')
        .next()
        .unwrap_or_default();
    if path.is_empty() {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    let relative = if let Some(absolute) = path.strip_prefix('/') {
        let base = base_url.trim_matches('/');
        if base.is_empty() {
            absolute
        } else if absolute == base {
            ""
        } else {
            absolute
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(absolute)
        }
    } else {
        segments.extend(from_slug.split('/').filter(|s| !s.is_empty()));
        path
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}

fn has_scheme(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

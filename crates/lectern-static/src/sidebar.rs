//! Sidebar declaration and resolution against discovered pages.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::{normalize_slug, url_for, Page};
use crate::templates::{NavGroup, NavItem};

/// A sidebar group as declared in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SidebarGroup {
    /// Group label; labels may repeat across groups
    pub label: String,

    /// Explicit entries, in display order
    #[serde(default)]
    pub items: Vec<SidebarEntry>,

    /// List every page under a directory after the explicit entries
    #[serde(default)]
    pub autogenerate: Option<Autogenerate>,

    /// Render the group closed unless it holds the current page
    #[serde(default)]
    pub collapsed: bool,
}

/// Autogenerated group contents.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Autogenerate {
    /// Directory relative to the docs root
    pub directory: String,
}

/// A sidebar entry as declared in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SidebarEntry {
    /// Bare slug; the label comes from the page
    Slug(String),
    /// Page reference with an explicit label
    Page { label: String, slug: String },
    /// Arbitrary link, not checked against pages
    Link { label: String, link: String },
}

/// A sidebar reference that does not match any page.
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved {
    /// Label of the group containing the reference
    pub group: String,
    /// Entry label, when one was declared
    pub label: Option<String>,
    /// What was referenced
    pub target: UnresolvedTarget,
}

/// Kind of unresolved reference.
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedTarget {
    /// Slug with no content file
    Slug(String),
    /// Autogenerate directory with no pages
    Directory(String),
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group \"{}\"", self.group)?;
        if let Some(label) = &self.label {
            write!(f, ", entry \"{}\"", label)?;
        }
        match &self.target {
            UnresolvedTarget::Slug(slug) => {
                let file = if slug.is_empty() { "index" } else { slug.as_str() };
                write!(
                    f,
                    ": slug \"{}\" has no content file ({}.md, {}.mdx or {}/index.md[x])",
                    slug, file, file, file
                )
            }
            UnresolvedTarget::Directory(dir) => {
                write!(f, ": autogenerate directory \"{}\" contains no pages", dir)
            }
        }
    }
}

/// Errors resolving the sidebar.
#[derive(Debug, thiserror::Error)]
pub enum SidebarError {
    #[error("Sidebar has {} unresolved reference(s):\n{}", .0.len(), format_list(.0))]
    Unresolved(Vec<Unresolved>),
}

fn format_list(entries: &[Unresolved]) -> String {
    entries
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve declared groups against pages, reporting every dangling reference.
pub fn resolve_sidebar(
    groups: &[SidebarGroup],
    pages: &[Page],
    base_url: &str,
) -> Result<Vec<NavGroup>, SidebarError> {
    let by_slug: BTreeMap<&str, &Page> = pages.iter().map(|p| (p.slug.as_str(), p)).collect();
    let mut unresolved = Vec::new();
    let mut nav = Vec::with_capacity(groups.len());

    for group in groups {
        let mut items = Vec::new();

        for entry in &group.items {
            match entry {
                SidebarEntry::Slug(slug) | SidebarEntry::Page { slug, .. } => {
                    let label = match entry {
                        SidebarEntry::Page { label, .. } => Some(label.clone()),
                        _ => None,
                    };
                    let slug = normalize_slug(slug);
                    match by_slug.get(slug.as_str()) {
                        Some(page) => items.push(NavItem {
                            label: label
                                .unwrap_or_else(|| page.doc.frontmatter.nav_label().to_string()),
                            href: page.url(base_url),
                            slug: Some(slug),
                            current: false,
                            external: false,
                        }),
                        None => unresolved.push(Unresolved {
                            group: group.label.clone(),
                            label,
                            target: UnresolvedTarget::Slug(slug),
                        }),
                    }
                }
                SidebarEntry::Link { label, link } => items.push(NavItem {
                    label: label.clone(),
                    href: link.clone(),
                    slug: None,
                    current: false,
                    external: is_external(link),
                }),
            }
        }

        if let Some(auto) = &group.autogenerate {
            let generated = autogenerate(pages, &auto.directory, base_url);
            if generated.is_empty() {
                unresolved.push(Unresolved {
                    group: group.label.clone(),
                    label: None,
                    target: UnresolvedTarget::Directory(normalize_slug(&auto.directory)),
                });
            }
            items.extend(generated);
        }

        nav.push(NavGroup {
            label: group.label.clone(),
            collapsed: group.collapsed,
            items,
            has_current: false,
        });
    }

    if unresolved.is_empty() {
        Ok(nav)
    } else {
        Err(SidebarError::Unresolved(unresolved))
    }
}

/// Entries for every visible page under `directory`.
fn autogenerate(pages: &[Page], directory: &str, base_url: &str) -> Vec<NavItem> {
    let mut matching: Vec<&Page> = pages
        .iter()
        .filter(|p| p.is_in_directory(directory) && !p.doc.frontmatter.sidebar.hidden)
        .collect();

    matching.sort_by(|a, b| {
        let order_a = a.doc.frontmatter.sidebar.order.unwrap_or(i32::MAX);
        let order_b = b.doc.frontmatter.sidebar.order.unwrap_or(i32::MAX);
        order_a
            .cmp(&order_b)
            .then_with(|| a.title().cmp(b.title()))
            .then_with(|| a.slug.cmp(&b.slug))
    });

    matching
        .into_iter()
        .map(|page| NavItem {
            label: page.doc.frontmatter.nav_label().to_string(),
            href: url_for(&page.slug, base_url),
            slug: Some(page.slug.clone()),
            current: false,
            external: false,
        })
        .collect()
}

/// Copy of the sidebar with the entry for `slug` marked current.
pub fn mark_current(nav: &[NavGroup], slug: &str) -> Vec<NavGroup> {
    nav.iter()
        .map(|group| {
            let items: Vec<NavItem> = group
                .items
                .iter()
                .map(|item| NavItem {
                    current: item.slug.as_deref() == Some(slug),
                    ..item.clone()
                })
                .collect();
            NavGroup {
                has_current: items.iter().any(|i| i.current),
                items,
                ..group.clone()
            }
        })
        .collect()
}

/// Every page slug reachable from the sidebar.
pub fn referenced_slugs(nav: &[NavGroup]) -> BTreeSet<&str> {
    nav.iter()
        .flat_map(|g| g.items.iter())
        .filter_map(|i| i.slug.as_deref())
        .collect()
}

fn is_external(link: &str) -> bool {
    link.starts_with("//") || link.contains("://") || link.starts_with("mailto:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::slug_for;
    use lectern_mdx::{parse_mdx, render_markdown};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn page(path: &str, title: &str, extra: &str) -> Page {
        let source = format!("---\ntitle: {title}\ndescription: About {title}\n{extra}---\nBody\n");
        let doc = parse_mdx(&source).unwrap();
        let rendered = render_markdown(&doc.content);
        Page {
            source_path: PathBuf::from("docs").join(path),
            relative_path: PathBuf::from(path),
            slug: slug_for(&PathBuf::from(path)),
            doc,
            rendered,
        }
    }

    fn parse_groups(toml_src: &str) -> Vec<SidebarGroup> {
        #[derive(Deserialize)]
        struct Wrapper {
            sidebar: Vec<SidebarGroup>,
        }
        toml::from_str::<Wrapper>(toml_src).unwrap().sidebar
    }

    #[test]
    fn parses_entry_forms() {
        let groups = parse_groups(
            r#"
[[sidebar]]
label = "Start"
items = [
  "getting-started/introduction",
  { label = "Install", slug = "getting-started/install" },
  { label = "GitHub", link = "https://github.com/example" },
]

[[sidebar]]
label = "Reference"
collapsed = true
autogenerate = { directory = "reference" }
"#,
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0].items[0],
            SidebarEntry::Slug("getting-started/introduction".to_string())
        );
        assert!(matches!(groups[0].items[1], SidebarEntry::Page { .. }));
        assert!(matches!(groups[0].items[2], SidebarEntry::Link { .. }));
        assert!(groups[1].collapsed);
        assert_eq!(groups[1].autogenerate.as_ref().unwrap().directory, "reference");
    }

    #[test]
    fn resolves_entries_in_order() {
        let pages = vec![
            page("getting-started/introduction.md", "Introduction", ""),
            page("getting-started/install.mdx", "Installation", "sidebar:\n  label: Install it\n"),
        ];
        let groups = vec![SidebarGroup {
            label: "Start".to_string(),
            items: vec![
                SidebarEntry::Slug("getting-started/install".to_string()),
                SidebarEntry::Page {
                    label: "Intro".to_string(),
                    slug: "/getting-started/introduction/".to_string(),
                },
            ],
            autogenerate: None,
            collapsed: false,
        }];

        let nav = resolve_sidebar(&groups, &pages, "/").unwrap();

        let labels: Vec<_> = nav[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Install it", "Intro"]);
        assert_eq!(nav[0].items[1].href, "/getting-started/introduction/");
    }

    #[test]
    fn reports_every_dangling_slug() {
        let pages = vec![page("guides/setup.md", "Setup", "")];
        let groups = vec![
            SidebarGroup {
                label: "Guides".to_string(),
                items: vec![
                    SidebarEntry::Slug("guides/setup".to_string()),
                    SidebarEntry::Page {
                        label: "Deploy".to_string(),
                        slug: "guides/deploy".to_string(),
                    },
                ],
                autogenerate: None,
                collapsed: false,
            },
            SidebarGroup {
                label: "API".to_string(),
                items: vec![],
                autogenerate: Some(Autogenerate {
                    directory: "api".to_string(),
                }),
                collapsed: false,
            },
        ];

        let SidebarError::Unresolved(missing) = resolve_sidebar(&groups, &pages, "/").unwrap_err();

        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].target, UnresolvedTarget::Slug("guides/deploy".to_string()));
        assert_eq!(missing[1].target, UnresolvedTarget::Directory("api".to_string()));
        let message = SidebarError::Unresolved(missing).to_string();
        assert!(message.contains("guides/deploy.md"));
    }

    #[test]
    fn autogenerates_by_order_then_title() {
        let pages = vec![
            page("reference/config.md", "Config", ""),
            page("reference/cli.md", "CLI", "sidebar:\n  order: 1\n"),
            page("reference/api.md", "API", ""),
            page("reference/internal.md", "Internal", "sidebar:\n  hidden: true\n"),
            page("guides/other.md", "Other", ""),
        ];
        let groups = vec![SidebarGroup {
            label: "Reference".to_string(),
            items: vec![],
            autogenerate: Some(Autogenerate {
                directory: "reference/".to_string(),
            }),
            collapsed: true,
        }];

        let nav = resolve_sidebar(&groups, &pages, "/docs/").unwrap();

        let labels: Vec<_> = nav[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["CLI", "API", "Config"]);
        assert_eq!(nav[0].items[0].href, "/docs/reference/cli/");
    }

    #[test]
    fn marks_current_entry_in_each_group() {
        let pages = vec![page("guides/setup.md", "Setup", "")];
        let group = SidebarGroup {
            label: "Guides".to_string(),
            items: vec![SidebarEntry::Slug("guides/setup".to_string())],
            autogenerate: None,
            collapsed: true,
        };
        let nav = resolve_sidebar(&[group.clone(), group], &pages, "/").unwrap();

        let marked = mark_current(&nav, "guides/setup");

        assert_eq!(marked.len(), 2);
        assert!(marked.iter().all(|g| g.has_current && g.items[0].current));
        assert!(nav.iter().all(|g| !g.has_current));
    }

    #[test]
    fn links_are_not_page_references() {
        let groups = vec![SidebarGroup {
            label: "More".to_string(),
            items: vec![SidebarEntry::Link {
                label: "Changelog".to_string(),
                link: "https://example.com/changelog".to_string(),
            }],
            autogenerate: None,
            collapsed: false,
        }];

        let nav = resolve_sidebar(&groups, &[], "/").unwrap();

        assert!(nav[0].items[0].external);
        assert!(referenced_slugs(&nav).is_empty());
    }
}

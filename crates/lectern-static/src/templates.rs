//! Template engine for rendering documentation pages.

use minijinja::Environment;
use serde::Serialize;

/// A resolved sidebar group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavGroup {
    /// Group label (not necessarily unique)
    pub label: String,
    /// Rendered closed unless it holds the current page
    pub collapsed: bool,
    /// Entries in declaration order
    pub items: Vec<NavItem>,
    /// Whether one of the items is the current page
    pub has_current: bool,
}

/// A resolved sidebar entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    /// Display label
    pub label: String,
    /// Link target
    pub href: String,
    /// Slug of the page this entry points at, if any
    pub slug: Option<String>,
    /// Whether this is the page being rendered
    pub current: bool,
    /// Points outside the site
    pub external: bool,
}

/// A table of contents entry.
#[derive(Debug, Clone, Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (2-3)
    pub level: u8,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Page description
    pub description: String,
    /// Site title
    pub site_title: String,
    /// Rendered content HTML
    pub content: String,
    /// Sidebar groups, current entry marked
    pub sidebar: Vec<NavGroup>,
    /// Table of contents
    pub toc: Vec<TocEntry>,
    /// Base URL
    pub base_url: String,
    /// Paths to CSS stylesheets to include
    pub styles: Vec<String>,
    /// Live reload client script, only set by the dev server
    pub live_reload: Option<String>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with default templates.
    pub fn new() -> Self {
        let mut env = Environment::new();

        for (name, source) in [
            ("base.html", BASE_TEMPLATE),
            ("doc.html", DOC_TEMPLATE),
            ("sidebar.html", SIDEBAR_TEMPLATE),
            ("404.html", NOT_FOUND_TEMPLATE),
        ] {
            env.add_template(name, source)
                .expect("built-in templates are valid");
        }

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template(template)?.render(context)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} | {{ site_title }}</title>
  <meta name="description" content="{{ description }}">
  <meta property="og:title" content="{{ title }}">
  <meta property="og:description" content="{{ description }}">
  <link rel="stylesheet" href="{{ base_url }}assets/main.css">
  {% for style in styles %}<link rel="stylesheet" href="{{ style }}">
  {% endfor %}
</head>
<body>
  <button class="menu-btn" type="button" aria-controls="sidebar" aria-expanded="false">Menu</button>
  <div class="layout">
    <nav class="sidebar" id="sidebar" aria-label="Main">
      {% include "sidebar.html" %}
    </nav>
    <main class="main">
      {% block content %}{% endblock %}
    </main>
  </div>
  <script src="{{ base_url }}assets/main.js"></script>
  {% if live_reload %}<script src="{{ live_reload }}"></script>{% endif %}
</body>
</html>
"##;

const DOC_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="doc">
  <h1 class="page-title">{{ title }}</h1>
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if toc %}
<aside class="toc" aria-labelledby="toc-heading">
  <h2 id="toc-heading">On this page</h2>
  <ul>
  {% for entry in toc %}
    <li class="toc-level-{{ entry.level }}">
      <a href="#{{ entry.id }}">{{ entry.title }}</a>
    </li>
  {% endfor %}
  </ul>
</aside>
{% endif %}
{% endblock %}
"##;

const SIDEBAR_TEMPLATE: &str = r##"<div class="sidebar-header">
  <a href="{{ base_url }}" class="site-title">{{ site_title }}</a>
</div>
<ul class="sidebar-groups">
{% for group in sidebar %}
  <li class="sidebar-group" id="sidebar-group-{{ loop.index }}">
    <details{% if not group.collapsed or group.has_current %} open{% endif %}>
      <summary>{{ group.label }}</summary>
      <ul class="sidebar-items">
      {% for item in group.items %}
        <li class="sidebar-item{% if item.current %} current{% endif %}">
          <a href="{{ item.href }}"{% if item.current %} aria-current="page"{% endif %}{% if item.external %} rel="noopener noreferrer"{% endif %}>{{ item.label }}</a>
        </li>
      {% endfor %}
      </ul>
    </details>
  </li>
{% endfor %}
</ul>
"##;

const NOT_FOUND_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="doc not-found">
  <h1 class="page-title">{{ title }}</h1>
  <div class="content">
    <p>{{ description }}</p>
    <p><a href="{{ base_url }}">Back to the home page</a></p>
  </div>
</article>
{% endblock %}
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context {
            title: "Architecture".to_string(),
            description: "How it fits together".to_string(),
            site_title: "Product Docs".to_string(),
            content: "<p>Hello world</p>".to_string(),
            sidebar: vec![],
            toc: vec![],
            base_url: "/".to_string(),
            styles: vec![],
            live_reload: None,
        }
    }

    fn item(label: &str, href: &str, current: bool) -> NavItem {
        NavItem {
            label: label.to_string(),
            href: href.to_string(),
            slug: Some(href.trim_matches('/').to_string()),
            current,
            external: false,
        }
    }

    #[test]
    fn renders_basic_page() {
        let engine = TemplateEngine::new();

        let html = engine.render_page("doc.html", &context()).unwrap();

        assert!(html.contains("<title>Architecture | Product Docs</title>"));
        assert!(html.contains(r#"<meta name="description" content="How it fits together">"#));
        assert!(html.contains("<p>Hello world</p>"));
        assert!(!html.contains("On this page"));
    }

    #[test]
    fn escapes_titles() {
        let engine = TemplateEngine::new();
        let mut ctx = context();
        ctx.title = "<script>".to_string();

        let html = engine.render_page("doc.html", &ctx).unwrap();

        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn renders_duplicate_group_labels_separately() {
        let engine = TemplateEngine::new();
        let mut ctx = context();
        ctx.sidebar = vec![
            NavGroup {
                label: "Guides".to_string(),
                collapsed: false,
                items: vec![item("Setup", "/guides/setup/", true)],
                has_current: true,
            },
            NavGroup {
                label: "Guides".to_string(),
                collapsed: true,
                items: vec![item("Deploy", "/ops/deploy/", false)],
                has_current: false,
            },
        ];

        let html = engine.render_page("doc.html", &ctx).unwrap();

        assert_eq!(html.matches("<summary>Guides</summary>").count(), 2);
        assert!(html.contains(r#"id="sidebar-group-1""#));
        assert!(html.contains(r#"id="sidebar-group-2""#));
        // minijinja escapes `/` inside attribute values
        assert!(html.contains(r#"aria-current="page">Setup</a>"#));
        assert_eq!(html.matches("aria-current").count(), 1);
        assert!(html.contains(">Deploy</a>"));
        assert_eq!(html.matches("<details open>").count(), 1);
    }

    #[test]
    fn renders_toc_and_live_reload() {
        let engine = TemplateEngine::new();
        let mut ctx = context();
        ctx.toc = vec![TocEntry {
            title: "Setup".to_string(),
            id: "setup".to_string(),
            level: 2,
        }];
        ctx.live_reload = Some("/__lectern/reload.js".to_string());

        let html = engine.render_page("doc.html", &ctx).unwrap();

        assert!(html.contains(r##"<a href="#setup">Setup</a>"##));
        assert!(html.contains(r#"reload.js"></script>"#));
    }

    #[test]
    fn renders_not_found_page() {
        let engine = TemplateEngine::new();
        let mut ctx = context();
        ctx.title = "Page not found".to_string();

        let html = engine.render_page("404.html", &ctx).unwrap();

        assert!(html.contains("Back to the home page"));
    }
}

//! Scaffold a documentation site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Files written by `init`, relative to the config file's directory.
const SCAFFOLD: &[(&str, &str)] = &[
    ("docs/index.md", DEFAULT_INDEX),
    (
        "docs/getting-started/introduction.md",
        DEFAULT_INTRODUCTION,
    ),
    ("docs/guides/writing-pages.md", DEFAULT_WRITING_PAGES),
    ("docs/reference/configuration.md", DEFAULT_CONFIGURATION),
];

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing lectern...");

    let root = config_path.parent().unwrap_or(Path::new(""));
    let docs_dir = root.join("docs");

    if docs_dir.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            docs_dir.display()
        );
        return Ok(());
    }

    write_scaffold(config_path, DEFAULT_CONFIG, yes)?;
    for (relative, content) in SCAFFOLD {
        write_scaffold(&root.join(relative), content, yes)?;
    }
    fs::create_dir_all(root.join("public")).context("Failed to create public directory")?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'lectern dev' to start the development server.");

    Ok(())
}

/// Write `content` to `path` unless it exists and `overwrite` is off.
fn write_scaffold(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::debug!("Keeping existing {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lectern configuration

[site]
title = "My Documentation"
description = "Documentation built with lectern"
# Path the site is served under
base_url = "/"
# Public origin; enables sitemap.xml and robots.txt
# url = "https://docs.example.com"

[docs]
dir = "docs"
output = "dist"
# Copied verbatim to the output root
public = "public"
# styles = ["styles/custom.css"]

[build]
minify = true

[lint]
# Fail the build on broken internal links
strict_links = false

[[sidebar]]
label = "Start Here"
items = [{ label = "Introduction", slug = "getting-started/introduction" }]

[[sidebar]]
label = "Guides"
items = ["guides/writing-pages"]

[[sidebar]]
label = "Reference"
collapsed = true
autogenerate = { directory = "reference" }
"#;

const DEFAULT_INDEX: &str = r#"---
title: Welcome
description: Start here to find your way around the documentation.
tableOfContents: false
---

This is your documentation site, built with **lectern**.

<CardGrid>
  <LinkCard title="Introduction" href="getting-started/introduction/" description="Install lectern and build your first site." />
  <LinkCard title="Writing pages" href="guides/writing-pages/" description="Frontmatter, Markdown and components." />
</CardGrid>
"#;

const DEFAULT_INTRODUCTION: &str = r#"---
title: Introduction
description: Install lectern and build your first site.
sidebar:
  order: 1
---

## Installation

```sh
cargo install lectern
```

## Development

Start the dev server. Pages rebuild and the browser reloads on every save.

```sh
lectern dev
```

<Aside type="tip">
Run `lectern check` in CI to catch missing pages and broken links early.
</Aside>

## Building

```sh
lectern build
```

The static site is written to `dist/`. Continue with
[writing pages](../../guides/writing-pages/).
"#;

const DEFAULT_WRITING_PAGES: &str = r#"---
title: Writing pages
description: Frontmatter, Markdown and components.
---

## Frontmatter

Every page starts with a YAML block. `title` and `description` are required.

```yaml
---
title: Deploying
description: Ship the site to any static host.
sidebar:
  label: Deploy
  order: 2
---
```

## Sidebar

Pages appear in the sidebar through the `[[sidebar]]` tables in
`lectern.toml`. Pages that no entry reaches are reported by `lectern check`.

## Components

```mdx
<Aside type="caution" title="Heads up">
Component children are regular **Markdown**.
</Aside>
```

Available components: `Aside`, `Badge`, `Card`, `CardGrid`, `LinkCard`,
`Steps`, `Tabs` and `TabItem`.
"#;

const DEFAULT_CONFIGURATION: &str = r#"---
title: Configuration
description: Every option of lectern.toml.
---

## Site

```toml
[site]
title = "My Documentation"
base_url = "/"
url = "https://docs.example.com"
```

## Lint

Set `strict_links = true` under `[lint]` to fail the build on broken internal
links.
"#;

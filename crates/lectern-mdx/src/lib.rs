//! Markdown/MDX parsing and rendering for lectern.
//!
//! This crate extracts and validates YAML frontmatter, collects code blocks
//! and link targets for linting, and renders page bodies to HTML with
//! embedded components, heading anchors and a table of contents.

pub mod codeblock;
pub mod components;
pub mod frontmatter;
pub mod parser;
pub mod render;

pub use codeblock::CodeBlock;
pub use components::{Component, ComponentError, PropValue};
pub use frontmatter::{Frontmatter, FrontmatterError, SidebarMeta};
pub use parser::{parse_mdx, LinkRef, ParseError, ParsedDoc};
pub use render::{render_markdown, slugify, RenderedDoc, TocEntry};

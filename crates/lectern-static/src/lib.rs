//! Static site generator for lectern documentation.
//!
//! Loads Markdown/MDX pages, resolves the declared sidebar, lints the result
//! and writes a deterministic static file tree.

pub mod assets;
pub mod builder;
pub mod lint;
pub mod page;
pub mod sidebar;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, PageError, Site, StaticBuilder};
pub use lint::{Diagnostic, LintKind, LintReport, Severity};
pub use page::Page;
pub use sidebar::{Autogenerate, SidebarEntry, SidebarError, SidebarGroup};

//! Frontmatter extraction and validation.

use serde::Deserialize;

/// Parsed frontmatter from a Markdown/MDX page.
///
/// Keys other than the ones below are accepted and ignored so that content
/// written for other generators ports unchanged.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title (required, non-empty)
    pub title: String,

    /// Page description for SEO and search (required, non-empty)
    pub description: String,

    /// Sidebar presentation overrides
    #[serde(default)]
    pub sidebar: SidebarMeta,

    /// Whether to render the "On this page" table of contents
    #[serde(rename = "tableOfContents", default = "default_true")]
    pub table_of_contents: bool,
}

/// The `sidebar:` frontmatter map.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SidebarMeta {
    /// Label used instead of the title in navigation
    #[serde(default)]
    pub label: Option<String>,

    /// Order within autogenerated groups (lower = first)
    #[serde(default)]
    pub order: Option<i32>,

    /// Exclude from autogenerated groups
    #[serde(default)]
    pub hidden: bool,
}

fn default_true() -> bool {
    true
}

impl Frontmatter {
    /// Check that required fields are not blank.
    pub fn validate(&self) -> Result<(), FrontmatterError> {
        if self.title.trim().is_empty() {
            return Err(FrontmatterError::EmptyField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(FrontmatterError::EmptyField("description"));
        }
        Ok(())
    }

    /// Label to show in navigation.
    pub fn nav_label(&self) -> &str {
        self.sidebar.label.as_deref().unwrap_or(&self.title)
    }
}

/// Extract frontmatter from MDX content.
///
/// Returns the parsed frontmatter and the remaining content after the frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start_matches('\u{feff}').trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    // `title:` with nothing after it is YAML null, not a missing key.
    let frontmatter: Frontmatter = serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        if message.contains("invalid type: unit value") {
            FrontmatterError::InvalidYaml(format!("{message} (a required field is blank)"))
        } else {
            FrontmatterError::InvalidYaml(message)
        }
    })?;

    // Drop the rest of the closing fence line (e.g. trailing `\r`).
    let remaining = match remaining.find('\n') {
        Some(pos) if remaining[..pos].trim().is_empty() => &remaining[pos + 1..],
        None if remaining.trim().is_empty() => "",
        _ => remaining,
    };

    Ok((Some(frontmatter), remaining))
}

/// Extract and validate frontmatter, requiring the block to be present.
pub fn require_frontmatter(source: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let (frontmatter, body) = extract_frontmatter(source)?;
    let frontmatter = frontmatter.ok_or(FrontmatterError::Missing)?;
    frontmatter.validate()?;
    Ok((frontmatter, body))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Missing frontmatter block - pages must start with ---")]
    Missing,

    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter field `{0}` must not be empty")]
    EmptyField(&'static str),
}

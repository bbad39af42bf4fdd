//! Code block extraction and parsing.

/// A code block found in a page body.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Language tag from the fence info string, lowercased
    pub language: Option<String>,

    /// Source code content
    pub source: String,

    /// Line number where the block starts (1-indexed, counted in the whole file)
    pub line_number: usize,

    /// Optional title or filename hint from the info string
    pub filename: Option<String>,

    /// Fenced (``` or ~~~) rather than indented
    pub fenced: bool,
}

impl CodeBlock {
    /// Create a fenced code block from its info string.
    pub fn fenced(info: &str, source: String, line_number: usize) -> Self {
        Self {
            language: language_from_info(info),
            source,
            line_number,
            filename: extract_filename(info),
            fenced: true,
        }
    }

    /// Create an indented code block.
    pub fn indented(source: String, line_number: usize) -> Self {
        Self {
            language: None,
            source,
            line_number,
            filename: None,
            fenced: false,
        }
    }

    /// Fenced blocks must carry a language tag; indented blocks cannot.
    pub fn missing_language(&self) -> bool {
        self.fenced && self.language.is_none()
    }

    /// Check if this block is a diagram rendered client-side.
    pub fn is_diagram(&self) -> bool {
        self.language.as_deref().is_some_and(is_diagram_language)
    }
}

/// Parse the language tag from a code fence info string.
///
/// The tag is the first word, unless that word is an attribute such as
/// `title="x"`.
pub fn language_from_info(info: &str) -> Option<String> {
    let lang = info.split_whitespace().next()?;
    if lang.contains('=') || lang.starts_with('{') {
        return None;
    }
    Some(lang.to_lowercase())
}

/// Languages rendered as diagrams rather than highlighted source.
pub fn is_diagram_language(lang: &str) -> bool {
    lang.eq_ignore_ascii_case("mermaid")
}

/// Extract filename from code fence info string if present.
///
/// Supports formats like:
/// - `ts title="client.ts"`
/// - `ts filename="client.ts"`
/// - `ts file=client.ts`
pub fn extract_filename(info: &str) -> Option<String> {
    for key in ["title=\"", "filename=\""] {
        if let Some(start) = info.find(key) {
            let rest = &info[start + key.len()..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }

    if let Some(start) = info.find("file=") {
        let rest = &info[start + 5..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let filename = rest[..end].trim_matches('"');
        if !filename.is_empty() {
            return Some(filename.to_string());
        }
    }

    None
}

/// An open code fence: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// The fence opened by `line`, if it starts with three or more backticks or tildes.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        (len >= 3).then_some(Self { marker, len })
    }

    /// A closing line is a run of the same marker at least as long, and nothing else.
    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let len = trimmed.chars().take_while(|c| *c == self.marker).count();
        len >= self.len && trimmed[len..].trim().is_empty()
    }
}

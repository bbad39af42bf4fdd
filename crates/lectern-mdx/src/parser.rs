//! MDX document parser.

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::codeblock::{CodeBlock, Fence};
use crate::components::{open_tag_len, parse_component, render_component, Component};
use crate::frontmatter::{require_frontmatter, Frontmatter, FrontmatterError};

/// A parsed MDX document.
#[derive(Debug, Clone)]
pub struct ParsedDoc {
    /// Validated frontmatter
    pub frontmatter: Frontmatter,

    /// Markdown content (without frontmatter or MDX import/export lines)
    pub content: String,

    /// Number of source lines preceding `content`
    pub line_offset: usize,

    /// Extracted code blocks
    pub code_blocks: Vec<CodeBlock>,

    /// Link targets found in the body
    pub links: Vec<LinkRef>,
}

/// A link target and where it appears.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRef {
    /// Raw destination as written
    pub target: String,

    /// Line number in the source file (1-indexed)
    pub line: usize,
}

/// Errors that can occur when parsing MDX.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Markdown extensions enabled everywhere pages are parsed or rendered.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Parse an MDX document.
///
/// Validates frontmatter, strips MDX module lines and collects code blocks
/// and link targets, including those inside component children.
pub fn parse_mdx(source: &str) -> Result<ParsedDoc, ParseError> {
    let (frontmatter, body) = require_frontmatter(source)?;

    let line_offset = source[..source.len() - body.len()].matches('\n').count();
    let content = strip_module_lines(body);

    let mut code_blocks = Vec::new();
    let mut links = Vec::new();
    collect_refs(&content, line_offset, &mut code_blocks, &mut links);

    code_blocks.sort_by_key(|b| b.line_number);
    links.sort_by_key(|l| l.line);

    Ok(ParsedDoc {
        frontmatter,
        content,
        line_offset,
        code_blocks,
        links,
    })
}

/// A component found at a line start, with the lines it and its children begin on.
struct Embedded {
    component: Component,
    line: usize,
    children_line: usize,
}

/// Collect code blocks and links from `content`, whose first line is file
/// line `line_offset + 1`.
///
/// Component children are walked separately since a component tag opens a
/// CommonMark HTML block that would swallow them.
fn collect_refs(
    content: &str,
    line_offset: usize,
    code_blocks: &mut Vec<CodeBlock>,
    links: &mut Vec<LinkRef>,
) {
    let (markdown, embedded) = split_components(content);
    let mut current_code_block: Option<(Option<String>, String, usize)> = None;

    let line_of = |range: &Range<usize>| line_offset + line_at(&markdown, range.start);

    for (event, range) in Parser::new_ext(&markdown, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => Some(info.to_string()),
                    CodeBlockKind::Indented => None,
                };
                current_code_block = Some((info, String::new(), line_of(&range)));
            }

            Event::Text(text) => {
                if let Some((_, ref mut source, _)) = current_code_block {
                    source.push_str(&text);
                }
            }

            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, source, line)) = current_code_block.take() {
                    code_blocks.push(match info {
                        Some(info) => CodeBlock::fenced(&info, source, line),
                        None => CodeBlock::indented(source, line),
                    });
                }
            }

            Event::Start(Tag::Link { dest_url, .. }) | Event::Start(Tag::Image { dest_url, .. }) => {
                links.push(LinkRef {
                    target: dest_url.to_string(),
                    line: line_of(&range),
                });
            }

            Event::Html(html) | Event::InlineHtml(html) => {
                for target in html_link_targets(&html) {
                    links.push(LinkRef {
                        target,
                        line: line_of(&range),
                    });
                }
            }

            _ => {}
        }
    }

    for Embedded {
        component,
        line,
        children_line,
    } in embedded
    {
        for prop in ["href", "src"] {
            if let Some(target) = component.prop(prop) {
                links.push(LinkRef {
                    target: target.to_string(),
                    line: line_offset + line,
                });
            }
        }
        if let Some(children) = &component.children {
            collect_refs(children, line_offset + children_line - 1, code_blocks, links);
        }
    }
}

/// Blank out the components the renderer expands, keeping line breaks so
/// offsets in the remaining Markdown still map to source lines.
fn split_components(content: &str) -> (String, Vec<Embedded>) {
    let mut markdown = String::with_capacity(content.len());
    let mut embedded = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut pos = 0;

    while pos < content.len() {
        let line_end = content[pos..]
            .find('\n')
            .map(|i| pos + i + 1)
            .unwrap_or(content.len());
        let line = &content[pos..line_end];
        let trimmed = line.trim_start();

        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
        } else if let Some(opened) = Fence::open(line) {
            fence = Some(opened);
        } else if trimmed.starts_with('<') && trimmed[1..].starts_with(|c: char| c.is_ascii_uppercase()) {
            let start = pos + (line.len() - trimmed.len());
            if let Some((component, end)) = expandable_component(content, start) {
                let children_start = start + open_tag_len(&content[start..]).unwrap_or(0);
                let inner = &content[children_start..end];
                let leading_newlines = inner.len() - inner.trim_start_matches('\n').len();

                embedded.push(Embedded {
                    component,
                    line: line_at(content, start),
                    children_line: line_at(content, children_start + leading_newlines),
                });

                markdown.push_str(&content[pos..start]);
                markdown.extend(content[start..end].chars().filter(|c| *c == '\n'));
                pos = end;
                continue;
            }
        }

        markdown.push_str(line);
        pos = line_end;
    }

    (markdown, embedded)
}

/// A component at `start` that renders, and the offset just past it.
fn expandable_component(content: &str, start: usize) -> Option<(Component, usize)> {
    let (component, consumed) = parse_component(&content[start..]).ok()??;
    render_component(&component, "").ok()?;
    Some((component, start + consumed))
}

impl ParsedDoc {
    /// Plain-text excerpt of the body for search, skipping code.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut text = String::new();
        let mut in_code = false;

        for event in Parser::new_ext(&self.content, markdown_options()) {
            match event {
                Event::Start(Tag::CodeBlock(_)) => in_code = true,
                Event::End(TagEnd::CodeBlock) => in_code = false,
                Event::Text(t) | Event::Code(t) if !in_code => {
                    if !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                    text.push_str(t.trim());
                }
                _ => {}
            }
            if text.chars().count() >= max_chars {
                break;
            }
        }

        text.chars().take(max_chars).collect()
    }
}

/// Blank out top-level MDX `import`/`export` lines, keeping line numbers stable.
fn strip_module_lines(body: &str) -> String {
    let mut fence: Option<Fence> = None;
    let mut out = String::with_capacity(body.len());

    for line in body.split_inclusive('\n') {
        let in_code = match fence {
            Some(open) => {
                if open.is_closed_by(line) {
                    fence = None;
                }
                true
            }
            None => {
                fence = Fence::open(line);
                fence.is_some()
            }
        };

        let is_module_line =
            !in_code && (line.starts_with("import ") || line.starts_with("export "));

        if is_module_line {
            if line.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(line);
        }
    }

    out
}

/// `href="..."` and `src="..."` values inside raw HTML or component tags.
fn html_link_targets(html: &str) -> Vec<String> {
    static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"\b(?:href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid attr regex")
    });

    ATTR_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 1-indexed line containing byte `offset`.
fn line_at(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

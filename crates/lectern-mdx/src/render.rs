//! Markdown to HTML rendering.
//!
//! Expands embedded components, assigns heading ids, collects the table of
//! contents and turns diagram fences into client-rendered blocks.

use std::collections::HashMap;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd};

use crate::codeblock::{is_diagram_language, language_from_info, Fence};
use crate::components::{html_escape, parse_component, render_component, Component};
use crate::parser::markdown_options;

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Output of rendering a page body.
#[derive(Debug, Clone, Default)]
pub struct RenderedDoc {
    /// Rendered HTML
    pub html: String,
    /// Every heading, in document order
    pub toc: Vec<TocEntry>,
    /// Non-fatal problems, such as unknown components
    pub warnings: Vec<String>,
}

/// Render a Markdown/MDX body to HTML.
pub fn render_markdown(content: &str) -> RenderedDoc {
    let mut renderer = Renderer::default();
    let html = renderer.render(content);

    RenderedDoc {
        html,
        toc: renderer.toc,
        warnings: renderer.warnings,
    }
}

#[derive(Default)]
struct Renderer {
    slugger: Slugger,
    toc: Vec<TocEntry>,
    warnings: Vec<String>,
    /// Nesting depth inside component children
    depth: usize,
}

impl Renderer {
    fn render(&mut self, content: &str) -> String {
        let (expanded, components) = self.expand_components(content);

        let events: Vec<Event> = Parser::new_ext(&expanded, markdown_options()).collect();
        let events = self.rewrite_events(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        // Children render after the enclosing page so its headings claim ids first.
        for (index, component) in components.iter().enumerate() {
            self.depth += 1;
            let children_html = component
                .children
                .as_deref()
                .map(|children| self.render(children))
                .unwrap_or_default();
            self.depth -= 1;

            let component_html = render_component(component, &children_html).unwrap_or_default();
            html_output = html_output.replace(&placeholder(index), &component_html);
        }

        html_output
    }

    /// Replace components starting at a line start (outside fences) with
    /// HTML-comment placeholders, returning the components to render.
    fn expand_components(&mut self, content: &str) -> (String, Vec<Component>) {
        let mut output = String::with_capacity(content.len());
        let mut found = Vec::new();
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
                output.push_str(line);
                pos = line_end;
                continue;
            }
            if let Some(opened) = Fence::open(line) {
                fence = Some(opened);
                output.push_str(line);
                pos = line_end;
                continue;
            }

            let starts_component = trimmed.starts_with('<')
                && trimmed[1..].starts_with(|c: char| c.is_ascii_uppercase());

            if starts_component {
                let start = pos + (line.len() - trimmed.len());
                match parse_component(&content[start..]) {
                    // Props are checked up front; unusable components pass through as written.
                    Ok(Some((component, consumed))) => match render_component(&component, "") {
                        Ok(_) => {
                            output.push('\n');
                            output.push_str(&placeholder(found.len()));
                            output.push_str("\n\n");
                            found.push(component);
                            pos = start + consumed;
                            // Swallow the rest of the closing line.
                            if let Some(rest) = content[pos..].find('\n') {
                                if content[pos..pos + rest].trim().is_empty() {
                                    pos += rest + 1;
                                }
                            }
                            continue;
                        }
                        Err(e) => self.warnings.push(e.to_string()),
                    },
                    Ok(None) => {}
                    Err(e) => self.warnings.push(e.to_string()),
                }
            }

            output.push_str(line);
            pos = line_end;
        }

        (output, found)
    }

    /// Assign heading ids, record TOC entries and convert diagram fences.
    fn rewrite_events<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut output = Vec::with_capacity(events.len());
        let mut iter = events.into_iter();

        while let Some(event) = iter.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let mut inner = Vec::new();
                    let mut text = String::new();
                    for event in iter.by_ref() {
                        match &event {
                            Event::End(TagEnd::Heading(_)) => break,
                            Event::Text(t) | Event::Code(t) => text.push_str(t),
                            _ => {}
                        }
                        inner.push(event);
                    }

                    let id = match id {
                        Some(explicit) => self.slugger.reserve(explicit.to_string()),
                        None => self.slugger.slug(&text),
                    };

                    if self.depth == 0 {
                        self.toc.push(TocEntry {
                            title: text.trim().to_string(),
                            id: id.clone(),
                            level: level as u8,
                        });
                    }

                    output.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(id)),
                        classes,
                        attrs,
                    }));
                    output.extend(inner);
                    output.push(Event::End(TagEnd::Heading(level)));
                }

                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                    if language_from_info(info).is_some_and(|l| is_diagram_language(&l)) =>
                {
                    let mut source = String::new();
                    for event in iter.by_ref() {
                        match event {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(t) => source.push_str(&t),
                            _ => {}
                        }
                    }
                    output.push(Event::Html(CowStr::from(format!(
                        "<pre class=\"mermaid\">{}</pre>\n",
                        html_escape(&source)
                    ))));
                }

                other => output.push(other),
            }
        }

        output
    }
}

fn placeholder(index: usize) -> String {
    format!("<!--lectern:component:{index}-->")
}

/// Generates unique heading ids within one page.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    /// Slugify `text`, suffixing `-1`, `-2`, ... on repeats.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let base = if base.is_empty() {
            "section".to_string()
        } else {
            base
        };
        self.reserve(base)
    }

    fn reserve(&mut self, base: String) -> String {
        let mut suffix = self.seen.get(&base).copied().unwrap_or(0);
        let mut id = if suffix == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, suffix)
        };
        while suffix > 0 && self.seen.contains_key(&id) {
            suffix += 1;
            id = format!("{}-{}", base, suffix);
        }

        self.seen.insert(base.clone(), suffix + 1);
        if id != base {
            self.seen.insert(id.clone(), 1);
        }
        id
    }
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

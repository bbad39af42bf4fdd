//! Embedded MDX components.
//!
//! Pages may use a small set of layout components such as
//! `<Card title="Setup">...</Card>` or `<Aside type="tip">...</Aside>`.
//! They are expanded to static HTML at build time; children are Markdown.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Components the renderer knows how to expand.
pub const KNOWN_COMPONENTS: &[&str] = &[
    "Aside", "Badge", "Card", "CardGrid", "LinkCard", "Steps", "TabItem", "Tabs",
];

/// A component element parsed from page source.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component name (e.g., "Card")
    pub name: String,

    /// Props in attribute order-independent form
    pub props: BTreeMap<String, PropValue>,

    /// Raw children source, if any
    pub children: Option<String>,

    /// Whether self-closing
    pub self_closing: bool,
}

/// A prop value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// String literal: title="Setup"
    String(String),
    /// Boolean (presence): stagger
    Boolean(bool),
    /// Expression: items={list}
    Expression(String),
}

impl PropValue {
    /// Get as string if it's a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Component {
    /// String prop by name.
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(PropValue::as_str)
    }

    /// Boolean prop by name; `flag` and `flag={true}` both count.
    pub fn flag(&self, name: &str) -> bool {
        match self.props.get(name) {
            Some(PropValue::Boolean(b)) => *b,
            Some(PropValue::Expression(e)) => e.trim() == "true",
            _ => false,
        }
    }

    fn required(&self, name: &'static str) -> Result<&str, ComponentError> {
        self.prop(name).ok_or_else(|| ComponentError::MissingProp {
            component: self.name.clone(),
            prop: name,
        })
    }
}

/// Errors from expanding a component.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    #[error("Unknown component <{0}>")]
    Unknown(String),

    #[error("<{component}> requires a `{prop}` prop")]
    MissingProp {
        component: String,
        prop: &'static str,
    },

    #[error("<{0}> is never closed")]
    Unclosed(String),
}

static OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Z][a-zA-Z0-9]*)((?:\s[^>]*?)?)\s*(/?)>").expect("Invalid open tag regex")
});

/// Byte length of the opening tag at the start of `source`.
pub(crate) fn open_tag_len(source: &str) -> Option<usize> {
    OPEN_RE.find(source).map(|m| m.end())
}

/// Parse a component element at the start of `source`.
///
/// Returns the component and the number of bytes consumed.
pub fn parse_component(source: &str) -> Result<Option<(Component, usize)>, ComponentError> {
    let Some(open_caps) = OPEN_RE.captures(source) else {
        return Ok(None);
    };
    let name = open_caps[1].to_string();
    let props_str = open_caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let self_closing = !open_caps[3].is_empty();
    let open_len = open_caps[0].len();

    if self_closing {
        let component = Component {
            name,
            props: parse_props(props_str),
            children: None,
            self_closing: true,
        };
        return Ok(Some((component, open_len)));
    }

    let close_pos = find_matching_close_tag(source, &name, open_len)
        .ok_or_else(|| ComponentError::Unclosed(name.clone()))?;
    let close_len = name.len() + 3;

    let children = source[open_len..close_pos].trim_matches('\n');
    let children = if children.trim().is_empty() {
        None
    } else {
        Some(dedent(children))
    };

    let component = Component {
        name,
        props: parse_props(props_str),
        children,
        self_closing: false,
    };
    Ok(Some((component, close_pos + close_len)))
}

/// Find the matching closing tag position, handling nested same-name components.
fn find_matching_close_tag(source: &str, name: &str, start_pos: usize) -> Option<usize> {
    let open_pattern = format!("<{}", name);
    let close_tag = format!("</{}>", name);

    let mut depth = 1;
    let mut pos = start_pos;

    while pos < source.len() {
        let next_open = source[pos..].find(&open_pattern).map(|o| pos + o);
        let next_close = source[pos..].find(&close_tag).map(|c| pos + c)?;

        match next_open {
            Some(open) if open < next_close => {
                let after_name = &source[open + open_pattern.len()..];
                let boundary = after_name
                    .chars()
                    .next()
                    .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace());
                if boundary {
                    // Another element of the same name; only an opening tag nests.
                    match OPEN_RE.captures(&source[open..]) {
                        Some(caps) if caps[3].is_empty() => {
                            depth += 1;
                            pos = open + caps[0].len();
                        }
                        Some(caps) => pos = open + caps[0].len(),
                        None => pos = open + open_pattern.len(),
                    }
                } else {
                    // A longer name sharing the prefix (<Card vs <CardGrid)
                    pos = open + open_pattern.len();
                }
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_close);
                }
                pos = next_close + close_tag.len();
            }
        }
    }

    None
}

/// Parse props from a props string.
fn parse_props(props_str: &str) -> BTreeMap<String, PropValue> {
    static PROP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"([a-zA-Z][a-zA-Z0-9_-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{([^}]*)\}))?"#)
            .expect("Invalid prop regex")
    });

    let mut props = BTreeMap::new();

    for caps in PROP_RE.captures_iter(props_str.trim()) {
        let name = caps[1].to_string();

        let value = if let Some(m) = caps.get(2).or_else(|| caps.get(3)) {
            PropValue::String(m.as_str().to_string())
        } else if let Some(m) = caps.get(4) {
            let expr = m.as_str().trim();
            // {"literal"} and {'literal'} are plain strings
            match expr
                .strip_prefix('"')
                .and_then(|e| e.strip_suffix('"'))
                .or_else(|| expr.strip_prefix('\'').and_then(|e| e.strip_suffix('\'')))
            {
                Some(literal) => PropValue::String(literal.to_string()),
                None => PropValue::Expression(expr.to_string()),
            }
        } else {
            PropValue::Boolean(true)
        };

        props.insert(name, value);
    }

    props
}

/// Remove the common leading indentation of all non-blank lines.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a component to HTML, given its children already rendered.
pub fn render_component(component: &Component, children_html: &str) -> Result<String, ComponentError> {
    let html = match component.name.as_str() {
        "Card" => {
            let title = html_escape(component.required("title")?);
            let icon = component
                .prop("icon")
                .map(|i| format!(r#"<span class="card-icon" data-icon="{}"></span>"#, html_escape(i)))
                .unwrap_or_default();
            format!(
                "<article class=\"card\">\n<p class=\"card-title\">{icon}<span>{title}</span></p>\n<div class=\"card-body\">\n{children_html}</div>\n</article>\n"
            )
        }
        "CardGrid" => {
            let class = if component.flag("stagger") {
                "card-grid stagger"
            } else {
                "card-grid"
            };
            format!("<div class=\"{class}\">\n{children_html}</div>\n")
        }
        "LinkCard" => {
            let title = html_escape(component.required("title")?);
            let href = html_escape(component.required("href")?);
            let description = component
                .prop("description")
                .map(|d| format!(r#"<span class="link-card-description">{}</span>"#, html_escape(d)))
                .unwrap_or_default();
            format!(
                "<div class=\"link-card\"><a href=\"{href}\"><span class=\"link-card-title\">{title}</span>{description}</a></div>\n"
            )
        }
        "Aside" => {
            let kind = match component.prop("type").unwrap_or("note") {
                k @ ("note" | "tip" | "caution" | "danger") => k,
                _ => "note",
            };
            let title = component
                .prop("title")
                .map(html_escape)
                .unwrap_or_else(|| capitalize(kind));
            format!(
                "<aside class=\"aside aside-{kind}\" aria-label=\"{title}\">\n<p class=\"aside-title\">{title}</p>\n<div class=\"aside-content\">\n{children_html}</div>\n</aside>\n"
            )
        }
        "Steps" => format!("<div class=\"steps\">\n{children_html}</div>\n"),
        "Tabs" => format!("<div class=\"tabs\">\n{children_html}</div>\n"),
        "TabItem" => {
            let label = html_escape(component.required("label")?);
            format!(
                "<details class=\"tab-item\" open>\n<summary>{label}</summary>\n{children_html}</details>\n"
            )
        }
        "Badge" => {
            let text = html_escape(component.required("text")?);
            let variant = component.prop("variant").unwrap_or("default");
            format!(
                "<span class=\"badge badge-{}\">{text}</span>",
                html_escape(variant)
            )
        }
        other => return Err(ComponentError::Unknown(other.to_string())),
    };

    Ok(html)
}

/// Escape HTML special characters including single quotes.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

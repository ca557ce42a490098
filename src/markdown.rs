//! Progressive markdown rendering.
//!
//! A thin incremental-safety layer over `pulldown-cmark`: safe to call
//! after every content delta while streaming. Before each pass an
//! unterminated code fence is closed with a synthetic fence so a partial
//! code block cannot swallow the rest of the document; the synthetic closer
//! is transient and never written back to the stored message.
//!
//! Link targets are restricted to http/https/mailto; anything else is
//! neutralized. Code blocks get a language label and optional best-effort
//! regex highlighting (a cosmetic classifier, not a tokenizer).

use std::borrow::Cow;
use std::sync::OnceLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;

use crate::config::WidgetConfig;

/// Schemes a rendered link may carry.
const SAFE_PROTOCOLS: &[&str] = &["http", "https", "mailto"];

/// Placeholder substituted for unsafe or malformed link targets.
const NEUTRALIZED_HREF: &str = "#";

const KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "return", "if", "else", "for", "while", "do", "switch",
    "case", "break", "continue", "try", "catch", "finally", "throw", "class", "extends", "new",
    "this", "super", "import", "export", "from", "as", "default", "async", "await", "yield",
    "static", "get", "set", "typeof", "instanceof", "in", "of", "delete", "void", "null",
    "undefined", "true", "false", "def", "print", "elif", "except", "pass", "with", "lambda",
    "global", "nonlocal", "raise", "assert", "and", "or", "not", "is", "None", "True", "False",
    "fn", "pub", "impl", "struct", "enum", "match", "mut", "use", "mod", "trait",
];

const TYPES: &[&str] = &[
    "string", "number", "boolean", "object", "array", "any", "never", "int", "float", "str",
    "list", "dict", "tuple", "set", "bool", "String", "Number", "Boolean", "Object", "Array",
    "Promise", "Map", "Set", "Vec", "Option", "Result",
];

const BUILTINS: &[&str] = &[
    "console", "window", "document", "Math", "JSON", "Date", "Error", "setTimeout", "setInterval",
    "fetch", "require", "module", "exports", "len", "range", "enumerate", "zip", "map", "filter",
    "sorted", "reversed", "input", "open", "type", "isinstance", "hasattr", "getattr", "setattr",
];

/// Renders untrusted, possibly-incomplete markdown to sanitized HTML.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    enable_markdown: bool,
    syntax_highlighting: bool,
}

impl MarkdownRenderer {
    /// Creates a renderer from the widget configuration.
    pub fn new(config: &WidgetConfig) -> Self {
        Self {
            enable_markdown: config.enable_markdown,
            syntax_highlighting: config.syntax_highlighting,
        }
    }

    /// Renders assistant content.
    ///
    /// While the stream is still in progress (`is_complete == false`) an
    /// unterminated code fence is closed for this pass only. When markdown
    /// is disabled the content is rendered as escaped plain text with line
    /// breaks preserved.
    pub fn render(&self, text: &str, is_complete: bool) -> String {
        if !self.enable_markdown {
            return plain_text(text);
        }
        let repaired = repair_unterminated_fence(text, is_complete);
        let body = self.convert(&repaired);
        format!("<div class=\"sidechat-markdown\">{body}</div>")
    }

    /// Renders user content: always plain text, never markdown.
    pub fn render_user(&self, text: &str) -> String {
        plain_text(text)
    }

    fn convert(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events = Vec::new();
        let mut code_block: Option<(String, String)> = None;

        for event in Parser::new_ext(text, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::Text(chunk) if code_block.is_some() => {
                    if let Some((_, body)) = code_block.as_mut() {
                        body.push_str(&chunk);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    let (lang, body) = code_block.take().unwrap_or_default();
                    events.push(Event::Html(self.code_block_html(&lang, &body).into()));
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: sanitize_link(&dest_url).into_owned().into(),
                        title,
                        id,
                    }));
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url: sanitize_link(&dest_url).into_owned().into(),
                        title,
                        id,
                    }));
                }
                other => events.push(other),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn code_block_html(&self, lang: &str, code: &str) -> String {
        let lang = if lang.is_empty() { "text" } else { lang };
        let body = if self.syntax_highlighting {
            highlight(code, lang)
        } else {
            escape_html(code)
        };
        let label = if lang == "text" {
            String::new()
        } else {
            format!(
                "<span class=\"sidechat-code-lang\">{}</span>",
                escape_html(lang)
            )
        };
        format!(
            "<div class=\"sidechat-code-block\">\
             <div class=\"sidechat-code-header\">{label}</div>\
             <pre><code class=\"language-{}\">{body}</code></pre>\
             </div>\n",
            escape_html(lang)
        )
    }
}

/// Closes an unterminated fenced code block for one render pass.
///
/// Applied only while streaming: an odd fence-marker count means the last
/// marker opened a block no closer has arrived for yet, so a synthetic
/// `\n```` is appended. The stored content is never modified.
fn repair_unterminated_fence(text: &str, is_complete: bool) -> Cow<'_, str> {
    if is_complete || text.matches("```").count() % 2 == 0 {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n```"))
    }
}

fn sanitize_link(dest: &str) -> Cow<'_, str> {
    match url::Url::parse(dest) {
        Ok(parsed) if SAFE_PROTOCOLS.contains(&parsed.scheme()) => Cow::Borrowed(dest),
        _ => Cow::Borrowed(NEUTRALIZED_HREF),
    }
}

/// Escapes text for HTML element and attribute contexts.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn plain_text(text: &str) -> String {
    format!(
        "<div class=\"sidechat-plaintext\">{}</div>",
        escape_html(text).replace('\n', "<br>")
    )
}

fn token_pattern() -> &'static Regex {
    static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();
    TOKEN_PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)(?P<string>"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|`(?:\\.|[^`\\])*`)|(?P<comment>//[^\n]*|#[^\n]*|/\*.*?\*/)|(?P<number>\b\d+(?:\.\d+)?\b)|(?P<word>\b[A-Za-z_][A-Za-z0-9_]*\b)"#,
        )
        .expect("token pattern is valid")
    })
}

fn classify_word(word: &str) -> Option<&'static str> {
    if KEYWORDS.contains(&word) {
        Some("keyword")
    } else if TYPES.contains(&word) {
        Some("type")
    } else if BUILTINS.contains(&word) {
        Some("builtin")
    } else {
        None
    }
}

/// Best-effort single-pass classifier for code-block text.
///
/// Strings, comments, numbers, and known keyword/type/builtin words are
/// wrapped in class-bearing spans; everything else is escaped verbatim.
fn highlight(code: &str, lang: &str) -> String {
    if matches!(lang, "text" | "plaintext") {
        return escape_html(code);
    }

    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    for caps in token_pattern().captures_iter(code) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        out.push_str(&escape_html(&code[last..m.start()]));
        let class = if caps.name("string").is_some() {
            Some("string")
        } else if caps.name("comment").is_some() {
            Some("comment")
        } else if caps.name("number").is_some() {
            Some("number")
        } else {
            classify_word(m.as_str())
        };
        match class {
            Some(class) => {
                out.push_str("<span class=\"sidechat-hl-");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&escape_html(m.as_str()));
                out.push_str("</span>");
            }
            None => out.push_str(&escape_html(m.as_str())),
        }
        last = m.end();
    }
    out.push_str(&escape_html(&code[last..]));
    out
}

//! Article extraction and cached-page rendering for linkshelf.
//!
//! `ReadabilityExtractor` fetches a page and pulls title, excerpt, author,
//! lead image and article body out of it with tag heuristics. The same
//! helpers render the stored HTML as a standalone cached page.

use async_trait::async_trait;
use std::time::Duration;

use crate::types::bookmark::Bookmark;
use crate::types::errors::FetchError;
use crate::types::reader::ArticleContent;

/// Words per minute for the slow reader, giving the upper read-time bound.
const SLOW_WPM: f64 = 200.0;
/// Words per minute for the fast reader, giving the lower read-time bound.
const FAST_WPM: usize = 275;

/// Fetches a URL and extracts article metadata from it.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ArticleContent, FetchError>;
}

/// Content extractor using `reqwest` and heuristic HTML parsing.
pub struct ReadabilityExtractor {
    client: reqwest::Client,
}

impl ReadabilityExtractor {
    /// Creates an extractor whose HTTP client gives up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ContentExtractor for ReadabilityExtractor {
    async fn extract(&self, url: &str) -> Result<ArticleContent, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Extraction(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().to_string();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);
        if !is_html {
            return Err(FetchError::Extraction("response is not HTML".to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        parse_article(&body, &final_url)
    }
}

/// Extracts article metadata and content from an HTML document.
pub fn parse_article(html: &str, final_url: &str) -> Result<ArticleContent, FetchError> {
    if html.trim().is_empty() {
        return Err(FetchError::Extraction("empty document".to_string()));
    }

    let cleaned = remove_blocks(&remove_blocks(html, "script"), "style");

    let title = meta_content(&cleaned, "og:title")
        .or_else(|| extract_between_tags(&cleaned, "title").map(|t| strip_tags(&t)))
        .map(|t| collapse_whitespace(&decode_entities(&t)))
        .unwrap_or_default();
    let excerpt = meta_content(&cleaned, "og:description")
        .or_else(|| meta_content(&cleaned, "description"))
        .map(|t| collapse_whitespace(&decode_entities(&t)))
        .unwrap_or_default();
    let author = meta_content(&cleaned, "author")
        .map(|t| collapse_whitespace(&decode_entities(&t)))
        .unwrap_or_default();
    let image_url = meta_content(&cleaned, "og:image").unwrap_or_default();

    let raw_content = extract_between_tags(&cleaned, "article")
        .or_else(|| extract_between_tags(&cleaned, "main"))
        .or_else(|| extract_between_tags(&cleaned, "body"))
        .unwrap_or_else(|| cleaned.clone());
    let content = collapse_whitespace(&decode_entities(&strip_tags(&raw_content)));
    let (min_read_time, max_read_time) = estimate_read_time(&content);

    Ok(ArticleContent {
        url: final_url.to_string(),
        title,
        excerpt,
        author,
        image_url,
        min_read_time,
        max_read_time,
        content,
        raw_content: raw_content.trim().to_string(),
    })
}

/// Returns (min, max) minutes for reading `text`. Zero words gives (0, 0).
pub fn estimate_read_time(text: &str) -> (i64, i64) {
    let words = text.split_whitespace().count();
    if words == 0 {
        return (0, 0);
    }
    let min = (words / FAST_WPM).max(1);
    let max = ((words as f64) / SLOW_WPM).ceil().max(1.0) as usize;
    (min as i64, max as i64)
}

/// Renders a stored bookmark as a standalone HTML page.
pub fn format_for_display(book: &Bookmark) -> String {
    let title = if book.title.is_empty() { "Untitled" } else { book.title.as_str() };

    let mut meta = Vec::new();
    if !book.author.is_empty() {
        meta.push(escape_html(&book.author));
    }
    if book.max_read_time > 0 {
        if book.min_read_time == book.max_read_time {
            meta.push(format!("{} min read", book.max_read_time));
        } else {
            meta.push(format!("{}-{} min read", book.min_read_time, book.max_read_time));
        }
    }

    let body = if book.html.trim().is_empty() {
        format!("<p>{}</p>", escape_html(&book.content))
    } else {
        sanitize_html(&book.html)
    };

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title><style>
body {{ font-family: Georgia, 'Times New Roman', serif; font-size: 18px; line-height: 1.6; max-width: 680px; margin: 0 auto; padding: 2em; color: #24292f; }}
h1 {{ font-size: 1.8em; margin-bottom: 0.3em; }}
.meta {{ color: #656d76; margin-bottom: 2em; }}
img, video {{ max-width: 100%; }}
</style></head><body>
<h1>{title}</h1>
<div class="meta"><a href="{url}">{url}</a>{sep}{meta}</div>
<div class="content">{body}</div>
</body></html>"#,
        title = escape_html(title),
        url = escape_html(&book.url),
        sep = if meta.is_empty() { "" } else { " &middot; " },
        meta = meta.join(" &middot; "),
        body = body,
    )
}

/// Removes `<script>` blocks and inline `on*` event handler attributes.
pub fn sanitize_html(html: &str) -> String {
    let without_scripts = remove_blocks(html, "script");
    let mut out = String::with_capacity(without_scripts.len());
    let mut rest = without_scripts.as_str();

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let tag = &rest[start..=start + len];
        out.push_str(&strip_event_handlers(tag));
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Escapes text for inclusion in HTML content or double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips HTML tags to get plain text.
fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    result.push(' ');
                }
                in_tag = false;
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

/// Extracts content between the first `<tag ...>` and its closing tag, case-insensitively.
fn extract_between_tags(html: &str, tag: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find(&open) {
        let start_idx = search_from + found;
        let after_name = lower[start_idx + open.len()..].chars().next();
        // Skip longer tag names sharing the prefix, e.g. <mainframe>.
        if matches!(after_name, Some(c) if c.is_ascii_alphanumeric() || c == '-') {
            search_from = start_idx + open.len();
            continue;
        }
        let tag_end = lower[start_idx..].find('>')?;
        let content_start = start_idx + tag_end + 1;
        let end_idx = lower[content_start..].find(&close)?;
        return Some(html[content_start..content_start + end_idx].to_string());
    }
    None
}

/// Removes every `<tag>...</tag>` block, case-insensitively.
fn remove_blocks(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&open) {
        let start = pos + found;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => return out,
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Finds `<meta name|property="key" content="...">` and returns the content.
fn meta_content(html: &str, key: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut pos = 0;
    while let Some(found) = lower[pos..].find("<meta") {
        let start = pos + found;
        let end = start + lower[start..].find('>')?;
        let attrs = parse_attributes(&html[start + "<meta".len()..end]);
        pos = end;

        let names_key = attrs.iter().any(|(name, value)| {
            (name == "name" || name == "property")
                && value.as_deref().map(|v| v.eq_ignore_ascii_case(key)).unwrap_or(false)
        });
        if !names_key {
            continue;
        }
        let content = attrs
            .into_iter()
            .find(|(name, _)| name == "content")
            .and_then(|(_, value)| value)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if content.is_some() {
            return content;
        }
    }
    None
}

/// Parses `name="value" other='x' flag` into lowercased names and raw values.
fn parse_attributes(body: &str) -> Vec<(String, Option<String>)> {
    let mut attrs = Vec::new();
    let mut chars = body.trim_end_matches('/').chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == '/') {
            chars.next();
        }
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '=' {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            break;
        }
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek() != Some(&'=') {
            attrs.push((name.to_ascii_lowercase(), None));
            continue;
        }
        chars.next();
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                for c in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    value.push(c);
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        attrs.push((name.to_ascii_lowercase(), Some(value)));
    }
    attrs
}

/// Rebuilds an opening tag without its `on*` attributes. Closing tags,
/// comments and doctypes pass through unchanged.
fn strip_event_handlers(tag: &str) -> String {
    let inner = &tag[1..tag.len() - 1];
    if inner.starts_with('/') || inner.starts_with('!') || inner.starts_with('?') {
        return tag.to_string();
    }
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let (name, rest) = inner.split_at(name_end);

    let attrs = parse_attributes(rest);
    if !attrs.iter().any(|(attr, _)| attr.starts_with("on")) {
        return tag.to_string();
    }

    let mut out = format!("<{}", name);
    for (attr, value) in attrs.into_iter().filter(|(attr, _)| !attr.starts_with("on")) {
        match value {
            Some(v) => out.push_str(&format!(" {}=\"{}\"", attr, v.replace('"', "&quot;"))),
            None => out.push_str(&format!(" {}", attr)),
        }
    }
    if inner.trim_end().ends_with('/') {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Decodes the handful of entities common in titles and descriptions.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

//! Readable-content extraction from HTML.
//!
//! Parses a page into a DOM, picks the main content area, and collects its
//! visible text while skipping boilerplate subtrees (scripts, styles,
//! navigation, and similar). Also gathers the document language, anchors
//! (resolved against the page URL), and `<meta>` pairs.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

use crate::types::{Link, PageContent};

/// Default maximum characters to return from extracted content.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements whose text never counts as readable content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
    "template",
];

/// Content roots tried in priority order.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

/// Extract readable content from raw HTML.
///
/// A page with no readable text yields empty `text` and a zero word count
/// rather than an error; title, language, links and meta are still filled.
pub fn extract_content(html: &str, url: &str) -> PageContent {
    extract_content_with_limit(html, url, DEFAULT_MAX_CHARS)
}

/// Same as [`extract_content`] with a custom character limit on `text`.
pub fn extract_content_with_limit(html: &str, url: &str, max_chars: usize) -> PageContent {
    let document = Html::parse_document(html);
    let base = Url::parse(url).ok();

    let text = normalise_whitespace(&extract_main_text(&document));
    let text = truncate_to_limit(&text, max_chars);
    let word_count = text.split_whitespace().count();

    PageContent {
        url: url.to_owned(),
        title: extract_title(&document),
        lang: extract_lang(&document),
        text,
        word_count,
        links: extract_links(&document, base.as_ref()),
        meta: extract_meta(&document),
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// `<title>`, falling back to the first `<h1>`.
fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|sel| select_first(document, sel))
        .map(|el| normalise_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn extract_lang(document: &Html) -> String {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(|l| l.trim().to_lowercase())
        .unwrap_or_default()
}

/// Text of the first content root that has any, falling back to nothing.
fn extract_main_text(document: &Html) -> String {
    CONTENT_ROOTS
        .iter()
        .filter_map(|sel| select_first(document, sel))
        .map(visible_text)
        .find(|t| !t.trim().is_empty())
        .unwrap_or_default()
}

/// Concatenated text nodes under `root`, skipping boilerplate subtrees.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

/// Anchors with an `href`, resolved against `base` when there is one.
fn extract_links(document: &Html, base: Option<&Url>) -> Vec<Link> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let url = match base {
                Some(base) => base.join(href).ok()?.to_string(),
                None => Url::parse(href).ok()?.to_string(),
            };
            Some(Link {
                text: normalise_whitespace(&a.text().collect::<String>()),
                url,
            })
        })
        .collect()
}

/// `<meta name|property=... content=...>` pairs; later duplicates win.
fn extract_meta(document: &Html) -> BTreeMap<String, String> {
    let Ok(selector) = Selector::parse("meta[name], meta[property]") else {
        return BTreeMap::new();
    };
    document
        .select(&selector)
        .filter_map(|m| {
            let el = m.value();
            let key = el.attr("name").or_else(|| el.attr("property"))?;
            let value = el.attr("content")?;
            (!key.is_empty()).then(|| (key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Collapse excess whitespace: runs of spaces become one, 3+ newlines become 2.
fn normalise_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count: u32 = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            newline_count += 1;
            prev_was_space = false;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if ch.is_whitespace() {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(ch);
        }
    }

    result
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Truncate text to the given byte limit, breaking at a char boundary.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_owned();
    }

    let mut end = max_chars;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }

    let mut truncated = text[..end].to_owned();
    truncated.push_str("\n\n[Content truncated]");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="EN-us">
<head>
    <title>Understanding Rust Ownership</title>
    <meta name="description" content="A deep dive into ownership.">
    <meta property="og:type" content="article">
    <meta name="empty-content">
    <script>analytics.track('view');</script>
</head>
<body>
    <header>Site header</header>
    <nav><a href="/">Home</a> <a href="/blog">Blog</a></nav>
    <article>
        <h1>Ownership</h1>
        <p>Ownership is one of Rust's most distinctive features.</p>
        <p>See <a href="/book/ch04">the book chapter</a> and
           <a href="https://doc.rust-lang.org/std/">std docs</a>.</p>
        <aside>Advertisement content</aside>
    </article>
    <footer>Privacy Policy</footer>
</body>
</html>"#;

    #[test]
    fn extract_title_from_html() {
        let html = "<html><head><title>My Page Title</title></head><body>Content</body></html>";
        assert_eq!(extract_content(html, "https://example.com").title, "My Page Title");
    }

    #[test]
    fn title_falls_back_to_h1() {
        let html = "<html><body><h1>Heading  Title</h1><p>Body</p></body></html>";
        assert_eq!(extract_content(html, "https://example.com").title, "Heading Title");
    }

    #[test]
    fn extract_title_empty_when_missing() {
        let html = "<html><body>Content here</body></html>";
        assert!(extract_content(html, "https://example.com").title.is_empty());
    }

    #[test]
    fn article_preferred_and_boilerplate_skipped() {
        let page = extract_content(ARTICLE_HTML, "https://blog.example/posts/1");
        assert!(page.text.contains("Ownership is one of Rust"));
        assert!(page.text.contains("the book chapter"));
        assert!(!page.text.contains("Site header"));
        assert!(!page.text.contains("Home"));
        assert!(!page.text.contains("Advertisement"));
        assert!(!page.text.contains("Privacy Policy"));
        assert!(!page.text.contains("analytics"));
    }

    #[test]
    fn lang_is_lowercased() {
        let page = extract_content(ARTICLE_HTML, "https://blog.example/posts/1");
        assert_eq!(page.lang, "en-us");
    }

    #[test]
    fn lang_empty_when_missing() {
        let page = extract_content("<html><body>x</body></html>", "https://example.com");
        assert!(page.lang.is_empty());
    }

    #[test]
    fn links_are_resolved_against_page_url() {
        let page = extract_content(ARTICLE_HTML, "https://blog.example/posts/1");
        let urls: Vec<&str> = page.links.iter().map(|l| l.url.as_str()).collect();
        assert!(urls.contains(&"https://blog.example/"));
        assert!(urls.contains(&"https://blog.example/book/ch04"));
        assert!(urls.contains(&"https://doc.rust-lang.org/std/"));
        let chapter = page
            .links
            .iter()
            .find(|l| l.url.ends_with("/book/ch04"))
            .expect("chapter link");
        assert_eq!(chapter.text, "the book chapter");
    }

    #[test]
    fn relative_links_dropped_without_base() {
        let html = r#"<html><body><a href="/rel">rel</a><a href="https://abs.example/">abs</a></body></html>"#;
        let page = extract_content(html, "not a url");
        assert_eq!(page.links.len(), 1);
        assert_eq!(page.links[0].url, "https://abs.example/");
    }

    #[test]
    fn meta_pairs_collected() {
        let page = extract_content(ARTICLE_HTML, "https://blog.example/posts/1");
        assert_eq!(
            page.meta.get("description").map(String::as_str),
            Some("A deep dive into ownership.")
        );
        assert_eq!(page.meta.get("og:type").map(String::as_str), Some("article"));
        assert!(!page.meta.contains_key("empty-content"));
    }

    #[test]
    fn fallback_to_body() {
        let page = extract_content("<html><body>Body content only</body></html>", "https://example.com");
        assert!(page.text.contains("Body content"));
    }

    #[test]
    fn main_content_preferred_over_body() {
        let html = r#"<html><body>
            <div>Outer div</div>
            <main>Main content area</main>
        </body></html>"#;
        let page = extract_content(html, "https://example.com");
        assert!(page.text.contains("Main content area"));
        assert!(!page.text.contains("Outer div"));
    }

    #[test]
    fn nav_tag_not_confused_with_similar_text() {
        let html = "<html><body><nav>Skip this</nav><p>Keep this navigate text</p></body></html>";
        let page = extract_content(html, "https://example.com");
        assert!(!page.text.contains("Skip this"));
        assert!(page.text.contains("navigate text"));
    }

    #[test]
    fn strip_noscript_and_iframe() {
        let html = r#"<html><body>
            <p>Visible content</p>
            <noscript>Enable JS please</noscript>
            <iframe src="ad.html">Ad frame</iframe>
        </body></html>"#;
        let page = extract_content(html, "https://example.com");
        assert!(page.text.contains("Visible content"));
        assert!(!page.text.contains("Enable JS"));
        assert!(!page.text.contains("Ad frame"));
    }

    #[test]
    fn word_count_accuracy() {
        let page = extract_content("<html><body>One two three four five</body></html>", "https://example.com");
        assert_eq!(page.word_count, 5);
    }

    #[test]
    fn whitespace_normalisation() {
        let html = "<html><body>Word1    Word2\n\n\n\n\nWord3</body></html>";
        let page = extract_content(html, "https://example.com");
        assert!(!page.text.contains("  "));
        assert!(!page.text.contains("\n\n\n"));
    }

    #[test]
    fn max_chars_truncation() {
        let html = format!("<html><body>{}</body></html>", "word ".repeat(1000));
        let page = extract_content_with_limit(&html, "https://example.com", 100);
        assert!(page.text.len() <= 125);
        assert!(page.text.contains("[Content truncated]"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let html = format!("<html><body>Hello {}</body></html>", "é".repeat(200));
        let page = extract_content_with_limit(&html, "https://example.com", 50);
        assert!(page.text.starts_with("Hello "));
    }

    #[test]
    fn empty_html_yields_empty_page() {
        let page = extract_content("", "https://example.com");
        assert!(page.text.is_empty());
        assert_eq!(page.word_count, 0);
        assert!(page.links.is_empty());
    }

    #[test]
    fn only_scripts_and_styles_yields_empty_text() {
        let html = r#"<html>
            <head><style>body{color:red}</style></head>
            <body>
                <script>console.log('hello');</script>
                <style>.hidden{display:none}</style>
            </body>
        </html>"#;
        let page = extract_content(html, "https://example.com");
        assert!(page.text.is_empty());
    }

    #[test]
    fn url_preserved_in_output() {
        let page = extract_content("<html><body>Content</body></html>", "https://test.example.com/page");
        assert_eq!(page.url, "https://test.example.com/page");
    }

    #[test]
    fn serialises_word_count_in_camel_case() {
        let page = extract_content("<html><body>a b</body></html>", "https://example.com");
        let json = serde_json::to_value(&page).expect("serialize");
        assert_eq!(json["wordCount"], 2);
        assert!(json["links"].is_array());
        assert!(json["meta"].is_object());
    }
}

use std::collections::HashMap;
use std::fmt::Write;

use hnfeeds_core::error::AppError;
use hnfeeds_core::models::Extracted;
use hnfeeds_core::traits::ContentExtractor;
use scraper::{ElementRef, Html, Node, Selector};

/// Paragraphs shorter than this do not vote for their container.
const MIN_PARAGRAPH_CHARS: usize = 25;

const POSITIVE_HINTS: &[&str] = &[
    "article", "body", "content", "entry", "main", "post", "story", "text",
];
const NEGATIVE_HINTS: &[&str] = &[
    "advert", "banner", "comment", "footer", "menu", "nav", "promo", "related", "share",
    "sidebar", "social", "sponsor",
];

const SKIPPED_TAGS: &[&str] = &[
    "aside", "button", "footer", "form", "header", "iframe", "nav", "noscript", "script",
    "style", "svg",
];
const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];
const KEPT_ATTRS: &[&str] = &["alt", "colspan", "href", "rowspan", "src", "title"];

/// Readability-style main-content extractor built on scraper.
///
/// Paragraphs vote for their parent (full score) and grandparent (half
/// score); the container with the best link-density-adjusted score wins. The
/// winner is serialized without scripts, chrome or presentational attributes
/// inside a single `<body id="readabilityBody">` wrapper. Pages without a
/// clear winner yield the contents of the whole `<body>`, unwrapped.
#[derive(Clone)]
pub struct ReadabilityExtractor {
    title: Selector,
    heading: Selector,
    paragraphs: Selector,
    body: Selector,
    links: Selector,
}

impl ReadabilityExtractor {
    pub fn new() -> Result<Self, AppError> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| AppError::ConfigError(format!("Invalid selector '{css}': {e}")))
        };

        Ok(Self {
            title: parse("title")?,
            heading: parse("h1")?,
            paragraphs: parse("p, pre, td")?,
            body: parse("body")?,
            links: parse("a")?,
        })
    }

    fn title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .chain(document.select(&self.heading))
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|t| !t.is_empty())
            .unwrap_or_default()
    }

    fn best_candidate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let mut candidates = HashMap::new();
        let mut vote = |el: ElementRef<'a>, score: f64| {
            candidates
                .entry(el.id())
                .or_insert_with(|| (el, class_weight(el)))
                .1 += score;
        };

        for paragraph in document.select(&self.paragraphs) {
            let text: String = paragraph.text().collect();
            let chars = text.trim().chars().count();
            if chars < MIN_PARAGRAPH_CHARS {
                continue;
            }
            let score = 1.0 + text.matches(',').count() as f64 + (chars / 100).min(3) as f64;

            let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            vote(parent, score);
            if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
                vote(grandparent, score / 2.0);
            }
        }

        candidates
            .into_values()
            .map(|(el, score)| (el, score * (1.0 - self.link_density(el))))
            .filter(|(_, score)| *score > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(el, _)| el)
    }

    fn link_density(&self, element: ElementRef<'_>) -> f64 {
        let total = element.text().map(|t| t.chars().count()).sum::<usize>();
        if total == 0 {
            return 0.0;
        }
        let linked = element
            .select(&self.links)
            .flat_map(|a| a.text())
            .map(|t| t.chars().count())
            .sum::<usize>();
        linked as f64 / total as f64
    }
}

impl ContentExtractor for ReadabilityExtractor {
    fn extract(&self, html: &str) -> Result<Extracted, AppError> {
        let document = Html::parse_document(html);
        let title = self.title(&document);

        let mut content = String::new();
        match self.best_candidate(&document) {
            Some(candidate) => {
                content.push_str(r#"<body id="readabilityBody">"#);
                write_children(candidate, &mut content);
                content.push_str("</body>");
            }
            // No article found: hand back the raw page contents unwrapped so
            // the plausibility gate can judge them.
            None => {
                let root = document
                    .select(&self.body)
                    .next()
                    .unwrap_or_else(|| document.root_element());
                write_children(root, &mut content);
            }
        }

        Ok(Extracted { title, content })
    }
}

fn class_weight(element: ElementRef<'_>) -> f64 {
    let value = element.value();
    let hints = format!(
        "{} {}",
        value.attr("class").unwrap_or(""),
        value.id().unwrap_or("")
    )
    .to_ascii_lowercase();

    let mut weight = match value.name() {
        "article" => 10.0,
        "div" | "section" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "ol" | "ul" | "dl" | "form" => -3.0,
        _ => 0.0,
    };
    if NEGATIVE_HINTS.iter().any(|h| hints.contains(h)) {
        weight -= 25.0;
    }
    if POSITIVE_HINTS.iter().any(|h| hints.contains(h)) {
        weight += 25.0;
    }
    weight
}

fn is_unlikely(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if SKIPPED_TAGS.contains(&value.name()) {
        return true;
    }
    let hints = format!(
        "{} {}",
        value.attr("class").unwrap_or(""),
        value.id().unwrap_or("")
    )
    .to_ascii_lowercase();
    NEGATIVE_HINTS.iter().any(|h| hints.contains(h))
        && !POSITIVE_HINTS.iter().any(|h| hints.contains(h))
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_into(text, false, out),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    if is_unlikely(element) {
        return;
    }
    let value = element.value();
    let name = value.name();

    out.push('<');
    out.push_str(name);
    for (attr, attr_value) in value.attrs() {
        if KEPT_ATTRS.contains(&attr) {
            let _ = write!(out, " {attr}=\"");
            escape_into(attr_value, true, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(element, out);
    let _ = write!(out, "</{name}>");
}

fn escape_into(text: &str, in_attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use hnfeeds_core::error::RejectReason;
    use hnfeeds_core::quality::QualityGates;

    use super::*;

    fn extractor() -> ReadabilityExtractor {
        ReadabilityExtractor::new().unwrap()
    }

    fn article_page() -> String {
        let paragraph = "Rust is a systems language, focused on safety, speed, and concurrency. ";
        format!(
            r#"<html><head><title>A long read</title><script>var x = 1;</script></head>
<body>
  <nav class="site-nav"><a href="/">Home</a><a href="/about">About</a></nav>
  <div class="sidebar"><p>Subscribe to our newsletter for more updates, offers and news.</p></div>
  <article class="post-content">
    <h2>Heading</h2>
    <p onclick="track()">{p}</p>
    <p>{p}{p}</p>
    <p>See <a href="https://example.com/ref" class="x">the reference</a> for details, please.</p>
    <div class="share-buttons"><p>Share this on every social network you can find today.</p></div>
  </article>
  <footer><p>Copyright notice, all rights reserved, forever and ever.</p></footer>
</body></html>"#,
            p = paragraph
        )
    }

    #[test]
    fn test_extracts_title_and_article() {
        let extracted = extractor().extract(&article_page()).unwrap();

        assert_eq!(extracted.title, "A long read");
        assert!(extracted.content.starts_with(r#"<body id="readabilityBody">"#));
        assert!(extracted.content.ends_with("</body>"));
        assert!(extracted.content.contains("Rust is a systems language"));
        assert!(extracted.content.contains(r#"<a href="https://example.com/ref">"#));
        assert!(!extracted.content.contains("newsletter"));
        assert!(!extracted.content.contains("Copyright"));
        assert!(!extracted.content.contains("Share this"));
    }

    #[test]
    fn test_strips_scripts_and_handlers() {
        let extracted = extractor().extract(&article_page()).unwrap();
        assert!(!extracted.content.contains("var x"));
        assert!(!extracted.content.contains("onclick"));
        assert!(!extracted.content.contains("class="));
    }

    #[test]
    fn test_output_passes_quality_gates() {
        let extracted = extractor().extract(&article_page()).unwrap();
        assert!(QualityGates::default().check(&extracted).is_ok());
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><head><title>Tiny</title></head><body><div>short</div></body></html>";
        let extracted = extractor().extract(html).unwrap();
        assert_eq!(extracted.title, "Tiny");
        assert_eq!(extracted.content, "<div>short</div>");
    }

    #[test]
    fn test_link_index_page_is_rejected_as_implausible() {
        let links: String = (0..200)
            .map(|i| format!(r#"<li><a href="/p/{i}">Story number {i}</a></li>"#))
            .collect();
        let html = format!(
            "<html><head><title>Index</title></head><body><ul>{links}</ul></body></html>"
        );

        let extracted = extractor().extract(&html).unwrap();
        assert!(!extracted.content.starts_with("<body"));
        assert!(extracted.content.len() > 1000);

        let err = QualityGates::default().check(&extracted).unwrap_err();
        assert!(matches!(
            err,
            AppError::ExtractionRejected(RejectReason::Implausible)
        ));
    }

    #[test]
    fn test_escapes_text() {
        let html = "<html><body><p>1 &lt; 2 &amp;&amp; 3 &gt; 2, which is plainly true.</p></body></html>";
        let extracted = extractor().extract(html).unwrap();
        assert!(extracted.content.contains("1 &lt; 2 &amp;&amp; 3 &gt; 2"));
    }

    #[test]
    fn test_heading_used_when_title_missing() {
        let html = "<html><body><h1>Only heading</h1></body></html>";
        assert_eq!(extractor().extract(html).unwrap().title, "Only heading");
    }

    #[test]
    fn test_empty_document() {
        let extracted = extractor().extract("").unwrap();
        assert_eq!(extracted.title, "");
        assert_eq!(extracted.content, "");
    }
}

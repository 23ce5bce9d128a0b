//! Thin capability layer over a parsed HTML tree.
//!
//! Everything the extractor and link discoverer need is expressed as
//! find-by-tag, find-by-attribute-pattern and visible text.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

/// Elements whose text never renders
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A hyperlink as it appears in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Parsed markup.
///
/// Not `Send`; parse, query and drop it without crossing an `.await`.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// All elements matching a tag (or any CSS selector)
    pub fn find_by_tag(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => {
                warn!("Invalid selector: {}", tag);
                Vec::new()
            }
        }
    }

    /// Elements where any of `attributes` matches `pattern`, in document order
    pub fn find_by_attribute_pattern(&self, attributes: &[&str], pattern: &Regex) -> Vec<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| {
                attributes.iter().any(|attr| {
                    element
                        .value()
                        .attr(attr)
                        .map_or(false, |value| pattern.is_match(value))
                })
            })
            .collect()
    }

    /// Visible text of the whole page
    pub fn visible_text(&self, separator: &str) -> String {
        element_text(self.html.root_element(), separator)
    }

    /// Every `<a href>` with its visible text
    pub fn anchors(&self) -> Vec<Anchor> {
        self.find_by_tag("a[href]")
            .into_iter()
            .filter_map(|element| {
                element.value().attr("href").map(|href| Anchor {
                    href: href.trim().to_string(),
                    text: element_text(element, " "),
                })
            })
            .collect()
    }
}

/// Trimmed, non-empty text nodes under `element` joined with `separator`
pub fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    let mut parts = Vec::new();

    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| HIDDEN_TAGS.contains(&el.name()))
            });
            if hidden {
                continue;
            }

            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }

    parts.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_scripts() {
        let doc = Document::parse(
            "<html><body><p>Hello</p><script>var x = 1;</script><style>p{}</style><p>there</p></body></html>",
        );
        assert_eq!(doc.visible_text(" "), "Hello there");
    }

    #[test]
    fn test_find_by_attribute_pattern_checks_each_attribute() {
        let doc = Document::parse(
            r#"<div class="Legal-Notes">a</div><section id="disclaimer">b</section><p class="intro">c</p>"#,
        );
        let pattern = Regex::new(r"(?i)legal|disclaimer").unwrap();
        let found = doc.find_by_attribute_pattern(&["class", "id"], &pattern);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_anchors() {
        let doc = Document::parse(r#"<a href=" /terms ">Terms <b>of</b> use</a><a>no href</a>"#);
        assert_eq!(
            doc.anchors(),
            vec![Anchor {
                href: "/terms".to_string(),
                text: "Terms of use".to_string()
            }]
        );
    }
}

use regex::Regex;
use std::sync::OnceLock;

use crate::page::document::{element_text, Document};

/// Footnote markers that usually point at fine print
const FOOTNOTE_MARKERS: &[char] = &['*', '†', '‡'];

fn footer_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)footer").expect("footer pattern is valid"))
}

fn fine_print_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)disclaimer|fine-?print|legal|terms").expect("fine print pattern is valid")
    })
}

/// Casts a wide net for fine print: footers, legal-looking containers,
/// `<small>` text and footnote-marked lines.
///
/// Output is not deduplicated; nested matches repeat their text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinePrintExtractor;

impl FinePrintExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &Document) -> String {
        let mut fragments: Vec<String> = Vec::new();

        // Footer-like elements
        let mut footers = document.find_by_tag("footer");
        for element in document.find_by_attribute_pattern(&["class"], footer_class()) {
            if !footers.contains(&element) {
                footers.push(element);
            }
        }
        push_texts(&mut fragments, footers.into_iter().map(|el| element_text(el, " ")));

        // Disclaimer, legal and terms containers
        let flagged = document.find_by_attribute_pattern(&["class", "id"], fine_print_attribute());
        push_texts(&mut fragments, flagged.into_iter().map(|el| element_text(el, " ")));

        // Small print
        let small = document.find_by_tag("small");
        push_texts(&mut fragments, small.into_iter().map(|el| element_text(el, " ")));

        // Footnote-marked lines
        let full_text = document.visible_text("\n");
        push_texts(
            &mut fragments,
            full_text
                .lines()
                .filter(|line| line.contains(FOOTNOTE_MARKERS))
                .map(|line| line.trim().to_string()),
        );

        fragments.join("\n")
    }
}

fn push_texts(fragments: &mut Vec<String>, texts: impl Iterator<Item = String>) {
    fragments.extend(texts.filter(|text| !text.is_empty()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(markup: &str) -> String {
        FinePrintExtractor::new().extract(&Document::parse(markup))
    }

    #[test]
    fn test_extracts_footer_tag_and_footer_class() {
        let text = extract(
            r#"<main>Buy now</main>
               <footer>Offer valid in the US only</footer>
               <div class="site-FOOTER-bottom">Copyright 2024</div>"#,
        );
        assert!(text.contains("Offer valid in the US only"));
        assert!(text.contains("Copyright 2024"));
        assert!(!text.contains("Buy now"));
    }

    #[test]
    fn test_extracts_flagged_class_and_id() {
        let text = extract(
            r#"<div class="finePrint">Auto renews monthly</div>
               <section id="legal-notes">Cancel anytime by phone</section>
               <p class="fine-print">Minimum spend applies</p>
               <p class="hero">Big savings</p>"#,
        );
        assert!(text.contains("Auto renews monthly"));
        assert!(text.contains("Cancel anytime by phone"));
        assert!(text.contains("Minimum spend applies"));
        assert!(!text.contains("Big savings"));
    }

    #[test]
    fn test_extracts_small_and_marked_lines() {
        let text = extract(
            r#"<p>Save 50%*</p><p>Free shipping†</p><p>Members only‡</p><p>Plain line</p>
               <small>Terms apply</small>"#,
        );
        assert!(text.contains("Save 50%*"));
        assert!(text.contains("Free shipping†"));
        assert!(text.contains("Members only‡"));
        assert!(text.contains("Terms apply"));
        assert!(!text.contains("Plain line"));
    }

    #[test]
    fn test_empty_page_yields_empty_text() {
        assert_eq!(extract("<html><body></body></html>"), "");
    }
}

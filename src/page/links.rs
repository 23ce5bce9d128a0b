use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};
use url::Url;

use crate::page::document::Document;

/// Link text or href fragments that suggest a legal or policy page
pub const TERMS_PATTERNS: &[&str] = &[
    "terms",
    "t&c",
    "t-c",
    "conditions",
    "legal",
    "disclaimer",
    "eligibility",
    "requirements",
    "privacy",
    "policy",
    "agreement",
];

fn terms_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = TERMS_PATTERNS
            .iter()
            .map(|pattern| regex::escape(pattern))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i){}", alternation)).expect("terms pattern is valid")
    })
}

/// Finds links to terms, policy and eligibility pages
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkDiscoverer;

impl LinkDiscoverer {
    pub fn new() -> Self {
        Self
    }

    /// Absolute, unique http(s) URLs of terms-like links in first-seen order
    pub fn discover(&self, document: &Document, base_url: &Url) -> Vec<Url> {
        let pattern = terms_pattern();
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.anchors() {
            if !pattern.is_match(&anchor.text) && !pattern.is_match(&anchor.href) {
                continue;
            }

            let absolute = match base_url.join(&anchor.href) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Skipping unresolvable link {}: {}", anchor.href, e);
                    continue;
                }
            };

            if !matches!(absolute.scheme(), "http" | "https") {
                debug!("Skipping non-HTTP link: {}", absolute);
                continue;
            }

            if seen.insert(absolute.to_string()) {
                links.push(absolute);
            }
        }

        info!("Found {} terms-related links", links.len());
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(markup: &str) -> Vec<String> {
        let base = Url::parse("https://shop.example.com/promo/spring").unwrap();
        LinkDiscoverer::new()
            .discover(&Document::parse(markup), &base)
            .into_iter()
            .map(|url| url.to_string())
            .collect()
    }

    #[test]
    fn test_matches_text_or_href() {
        let links = discover(
            r#"<a href="/legal/tos">Read more</a>
               <a href="/page-7">Privacy Policy</a>
               <a href="/shop">Shop now</a>"#,
        );
        assert_eq!(
            links,
            vec![
                "https://shop.example.com/legal/tos",
                "https://shop.example.com/page-7",
            ]
        );
    }

    #[test]
    fn test_deduplicates_resolved_urls() {
        let links = discover(
            r#"<a href="/terms">Terms</a>
               <a href="https://shop.example.com/terms">Terms &amp; Conditions</a>
               <a href="../terms">T&amp;C</a>"#,
        );
        assert_eq!(links, vec!["https://shop.example.com/terms"]);
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let links = discover(
            r#"<a href="mailto:x@y.com">Terms questions</a>
               <a href="javascript:openTerms()">Terms</a>
               <a href="tel:555">Eligibility hotline</a>"#,
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_resolves_relative_links_against_base() {
        let links = discover(r#"<a href="eligibility.html">Who can apply</a>"#);
        assert_eq!(links, vec!["https://shop.example.com/promo/eligibility.html"]);
    }
}

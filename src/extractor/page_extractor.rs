use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

/// Elements that count as a primary call to action anywhere in the document.
pub const CTA_SELECTOR: &str =
    r#"button, a[href*="contact"], a[href*="quote"], a[href*="book"], .cta, .btn-primary"#;

/// DOM signal extraction over an already parsed document.
///
/// Every function is pure; absent elements yield zero/false/empty rather than errors.
pub struct PageExtractor;

impl PageExtractor {
    /// Character length of the first `<title>`, untrimmed. 0 when absent.
    pub fn title_length(html: &Html) -> u32 {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
        html.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().chars().count() as u32)
            .unwrap_or(0)
    }

    pub fn has_meta_description(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector =
            SELECTOR.get_or_init(|| Selector::parse("meta[name='description']").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }

    pub fn h1_count(html: &Html) -> u32 {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("h1").unwrap());
        html.select(selector).count() as u32
    }

    /// Share of `<img>` elements with a non-empty `alt`, rounded. 100 when there are no images.
    pub fn alt_coverage_pct(html: &Html) -> u8 {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        let mut total = 0u32;
        let mut with_alt = 0u32;
        for img in html.select(selector) {
            total += 1;
            if img.value().attr("alt").map(|a| !a.trim().is_empty()).unwrap_or(false) {
                with_alt += 1;
            }
        }

        if total == 0 {
            return 100;
        }
        (100.0 * with_alt as f64 / total as f64).round() as u8
    }

    pub fn has_canonical(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("link[rel='canonical']").unwrap());
        html.select(selector).next().is_some()
    }

    pub fn has_viewport_meta(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='viewport']").unwrap());
        html.select(selector).next().is_some()
    }

    /// `@type` values from every JSON-LD block. Malformed blocks are skipped.
    pub fn schema_org_types(html: &Html) -> BTreeSet<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR
            .get_or_init(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

        let mut types = BTreeSet::new();
        for script in html.select(selector) {
            let raw = script.text().collect::<String>();
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
                log::trace!("[EXTRACT] Skipping malformed JSON-LD block");
                continue;
            };
            match &value {
                serde_json::Value::Array(items) => {
                    items.iter().for_each(|item| collect_schema_type(item, &mut types))
                }
                other => collect_schema_type(other, &mut types),
            }
        }
        types
    }

    /// Whole-document check for any call-to-action element.
    pub fn has_primary_cta(html: &Html) -> bool {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse(CTA_SELECTOR).unwrap());
        html.select(selector).next().is_some()
    }

    pub fn nav_item_count(html: &Html) -> u32 {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("nav a, header a").unwrap());
        html.select(selector).count() as u32
    }

    /// Readability over concatenated `<p>` text, 0..=100.
    ///
    /// `100 - (words/sentences - 15) * 2`, clamped. A page without paragraph
    /// text counts as one word in one sentence and scores 100.
    pub fn readability_score(html: &Html) -> f64 {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("p").unwrap());

        let text: String = html
            .select(selector)
            .flat_map(|p| p.text())
            .collect::<Vec<_>>()
            .concat();

        readability(&text)
    }

    /// An https page whose markup references any plain `http://` URL.
    pub fn has_mixed_content(raw_html: &str, page_url: &Url) -> bool {
        page_url.scheme() == "https" && raw_html.contains("http://")
    }
}

fn collect_schema_type(value: &serde_json::Value, types: &mut BTreeSet<String>) {
    match value.get("@type") {
        Some(serde_json::Value::String(t)) if !t.is_empty() => {
            types.insert(t.clone());
        }
        Some(serde_json::Value::Array(list)) => {
            for t in list.iter().filter_map(|t| t.as_str()) {
                if !t.is_empty() {
                    types.insert(t.to_string());
                }
            }
        }
        _ => {}
    }
}

fn readability(text: &str) -> f64 {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    let sentence_end = SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]+").unwrap());

    // splitting never yields fewer than one segment, even for ""
    let words = text.split(' ').count() as f64;
    let sentences = sentence_end.split(text).count().max(1) as f64;

    (100.0 - (words / sentences - 15.0) * 2.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(body)
    }

    #[test]
    fn title_length_counts_first_title_characters() {
        let html = doc("<html><head><title>Café  </title><title>ignored</title></head></html>");
        assert_eq!(PageExtractor::title_length(&html), 6);
        assert_eq!(PageExtractor::title_length(&doc("<p>no title</p>")), 0);
    }

    #[test]
    fn meta_description_requires_content() {
        let with = doc(r#"<meta name="description" content="Fast plumbing">"#);
        let empty = doc(r#"<meta name="description" content="">"#);
        let missing = doc(r#"<meta name="keywords" content="x">"#);
        assert!(PageExtractor::has_meta_description(&with));
        assert!(!PageExtractor::has_meta_description(&empty));
        assert!(!PageExtractor::has_meta_description(&missing));
    }

    #[test]
    fn alt_coverage_is_full_without_images() {
        assert_eq!(PageExtractor::alt_coverage_pct(&doc("<p>text only</p>")), 100);
    }

    #[test]
    fn alt_coverage_ignores_empty_alt() {
        let html = doc(
            r#"<img src="a.png" alt="Logo"><img src="b.png" alt=""><img src="c.png">"#,
        );
        assert_eq!(PageExtractor::alt_coverage_pct(&html), 33);
    }

    #[test]
    fn counts_h1_and_nav_links() {
        let html = doc(
            r#"<header><a href="/">Home</a></header>
               <nav><a href="/a">A</a><a href="/b">B</a></nav>
               <h1>One</h1><h1>Two</h1>"#,
        );
        assert_eq!(PageExtractor::h1_count(&html), 2);
        assert_eq!(PageExtractor::nav_item_count(&html), 3);
    }

    #[test]
    fn schema_types_skip_malformed_blocks() {
        let html = doc(
            r#"<script type="application/ld+json">{"@type": "Organization"}</script>
               <script type="application/ld+json">{ not json</script>
               <script type="application/ld+json">[{"@type": "WebSite"}, {"name": "no type"}]</script>
               <script type="application/ld+json">{"@type": ["LocalBusiness", "Organization"]}</script>"#,
        );
        let types: Vec<_> = PageExtractor::schema_org_types(&html).into_iter().collect();
        assert_eq!(types, vec!["LocalBusiness", "Organization", "WebSite"]);
    }

    #[test]
    fn cta_matches_anywhere_in_document() {
        assert!(PageExtractor::has_primary_cta(&doc(r#"<footer><a href="/contact-us">Talk</a></footer>"#)));
        assert!(PageExtractor::has_primary_cta(&doc(r#"<div class="cta">Go</div>"#)));
        assert!(PageExtractor::has_primary_cta(&doc("<button>Buy</button>")));
        assert!(!PageExtractor::has_primary_cta(&doc(r#"<a href="/about">About</a>"#)));
    }

    #[test]
    fn readability_defaults_and_clamps() {
        assert_eq!(PageExtractor::readability_score(&doc("<div>no paragraphs</div>")), 100.0);
        assert_eq!(PageExtractor::readability_score(&doc("<p> </p>")), 100.0);

        // 10 words, split into ["..." , ""] -> 2 segments -> 100 - (5 - 15) * 2 = 120 -> 100
        let short = doc("<p>One two three four five six seven eight nine ten.</p>");
        assert_eq!(PageExtractor::readability_score(&short), 100.0);

        let long_sentence = "word ".repeat(80);
        let long = doc(&format!("<p>{}</p>", long_sentence.trim()));
        assert_eq!(PageExtractor::readability_score(&long), 0.0);
    }

    #[test]
    fn mixed_content_only_on_https() {
        let https = Url::parse("https://example.com/").unwrap();
        let http = Url::parse("http://example.com/").unwrap();
        let markup = r#"<img src="http://cdn.example.com/a.png">"#;
        assert!(PageExtractor::has_mixed_content(markup, &https));
        assert!(!PageExtractor::has_mixed_content(markup, &http));
        assert!(!PageExtractor::has_mixed_content("<p>clean</p>", &https));
    }

    #[test]
    fn viewport_and_canonical_presence() {
        let html = doc(
            r#"<meta name="viewport" content="width=device-width"><link rel="canonical" href="/">"#,
        );
        assert!(PageExtractor::has_viewport_meta(&html));
        assert!(PageExtractor::has_canonical(&html));
        assert!(!PageExtractor::has_canonical(&doc("<p></p>")));
    }
}

// src/services/extract.rs

//! Fragment extraction from fetched documents.
//!
//! Pure functions: raw markup plus a CSS selector in, serialized
//! fragment out. The serialization comes straight from the query
//! engine, so identical input bytes always produce identical output.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};

/// Selector applied when a site has none configured.
const WHOLE_DOCUMENT: &str = "body";

/// Map a stored selector to the one actually applied. A blank selector
/// means "watch the whole document body".
pub fn effective_selector(selector: &str) -> &str {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        WHOLE_DOCUMENT
    } else {
        trimmed
    }
}

/// Extract the inner markup of the first node matching `selector`.
///
/// An empty fragment is a valid result: an element that exists but has
/// no content still fingerprints. Only a selector that matches no node
/// at all is an error.
pub fn extract_fragment(raw_html: &str, selector: &str) -> Result<String> {
    let document = Html::parse_document(raw_html);
    let effective = effective_selector(selector);
    let parsed =
        Selector::parse(effective).map_err(|e| AppError::selector(effective, format!("{e:?}")))?;

    let node = document
        .select(&parsed)
        .next()
        .ok_or_else(|| AppError::extraction(effective))?;

    Ok(node.inner_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>t</title></head>
        <body><div id="news"><p>hello</p></div><div class="empty"></div></body></html>"#;

    #[test]
    fn test_effective_selector_defaults_to_body() {
        assert_eq!(effective_selector(""), "body");
        assert_eq!(effective_selector("   "), "body");
        assert_eq!(effective_selector("div#news"), "div#news");
    }

    #[test]
    fn test_extract_fragment() {
        let fragment = extract_fragment(PAGE, "div#news").unwrap();
        assert_eq!(fragment, "<p>hello</p>");
    }

    #[test]
    fn test_extract_whole_body_by_default() {
        let fragment = extract_fragment(PAGE, "").unwrap();
        assert!(fragment.contains("<div id=\"news\">"));
        assert!(!fragment.contains("<title>"));
    }

    #[test]
    fn test_extract_empty_element_is_valid() {
        let fragment = extract_fragment(PAGE, "div.empty").unwrap();
        assert_eq!(fragment, "");
    }

    #[test]
    fn test_extract_no_match_is_error() {
        let err = extract_fragment(PAGE, "div#missing").unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
    }

    #[test]
    fn test_extract_invalid_selector_is_error() {
        let err = extract_fragment(PAGE, "[[invalid").unwrap_err();
        assert!(matches!(err, AppError::Selector { .. }));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = extract_fragment(PAGE, "body").unwrap();
        let b = extract_fragment(PAGE, "body").unwrap();
        assert_eq!(a, b);
    }
}

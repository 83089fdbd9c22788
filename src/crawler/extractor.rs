//! Judgment text extraction
//!
//! Pulls the judgment body and case title out of a document page. The
//! repository renders the judgment inside `<div class="judgments">` and the
//! case title in the first `<h1>`; either may be absent.

use scraper::{Html, Selector};

/// Fields extracted from a document page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCase {
    /// Case title from the first `<h1>`, if present and non-empty
    pub title: Option<String>,

    /// Judgment text, one line per text node, if the judgment section exists
    pub judgment: Option<String>,
}

/// Extracts the judgment section and title from raw HTML
///
/// A page whose judgment section exists but is empty still counts as having
/// content (an empty judgment), matching how the repository serves placeholder
/// documents. Only a missing section yields `judgment: None`.
pub fn extract_case(html: &str) -> ExtractedCase {
    let document = Html::parse_document(html);

    let judgment = Selector::parse("div.judgments").ok().and_then(|selector| {
        document.select(&selector).next().map(|section| {
            section
                .text()
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
    });

    let title = Selector::parse("h1").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|heading| heading.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    });

    ExtractedCase { title, judgment }
}

//! Subtitle table scraping
//!
//! Movie pages and the series AJAX fragment render subtitles as `<tr>` rows,
//! but the markup is too inconsistent (stray closing tags, archive rows) for a
//! DOM parser to handle both shapes. Rows are located textually instead.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::SubtitleListing;

const ROW_OPEN: &str = "<tr";
const ROW_CLOSE: &str = "</tr>";
const TITLE_CONTAINER: &str = "<div style=\"float: right; width: 95%;\">";
const LINE_BREAK: &str = "<br";

#[allow(clippy::expect_used)]
static SUBTITLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)data-subtitle-id="([A-Fa-f0-9]{32})""#).expect("subtitle id regex is valid")
});

/// Extract `(title, subtitle id)` listings from a catalog page, in row order.
///
/// A row counts only if it has the title container, a `<br` after the title,
/// and a 32 hex digit `data-subtitle-id`. Repeated ids keep their first row;
/// titles mentioning "zip" are archives and are skipped.
pub fn extract_listings(html: &str) -> Vec<SubtitleListing> {
    // ASCII lowercasing keeps byte offsets, so positions found here slice `html`
    let lowered = html.to_ascii_lowercase();
    let container = TITLE_CONTAINER.to_ascii_lowercase();

    let mut listings = Vec::new();
    let mut seen = HashSet::new();
    let mut pos = 0;

    while let Some(start) = find_from(&lowered, ROW_OPEN, pos) {
        let Some(end) = find_from(&lowered, ROW_CLOSE, start) else {
            break;
        };
        pos = end + ROW_CLOSE.len();

        let row = &html[start..end];
        let row_lower = &lowered[start..end];

        let Some(title) = row_title(row, row_lower, &container) else {
            continue;
        };
        let Some(id) = SUBTITLE_ID
            .captures(row)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
        else {
            continue;
        };

        if title.is_empty() || id.is_empty() || title.to_lowercase().contains("zip") {
            continue;
        }
        if !seen.insert(id.to_string()) {
            continue;
        }

        debug!(title, subtitle_id = id, "found subtitle");
        listings.push(SubtitleListing {
            title: title.to_string(),
            opaque_id: id.to_string(),
        });
    }

    listings
}

/// Text between the title container and the next line break
fn row_title<'a>(row: &'a str, row_lower: &str, container: &str) -> Option<&'a str> {
    let div = row_lower.find(container)?;
    let title_start = div + container.len();
    let br = find_from(row_lower, LINE_BREAK, title_start)?;
    Some(row[title_start..br].trim())
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| from + i)
}

use feed_rs::parser;

use super::models::RawItem;
use crate::{Error, Result};

/// Wrap width handed to html2text; whitespace is collapsed afterwards anyway
const TEXT_WIDTH: usize = 1000;

/// Parse RSS/Atom/JSON feed content into raw items.
///
/// Malformed content is logged and yields no items: a feed that cannot be
/// read contributes nothing to a run but never aborts it.
pub fn parse_items(content: &[u8]) -> Vec<RawItem> {
    match try_parse_items(content) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Discarding unparseable feed content: {}", e);
            Vec::new()
        }
    }
}

/// Parse feed content, surfacing the parse error to the caller
pub fn try_parse_items(content: &[u8]) -> Result<Vec<RawItem>> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed.entries.into_iter().map(|entry| {
        let title = entry.title
            .map(|t| t.content)
            .and_then(|t| clean_text(&t));

        let link = entry.links
            .first()
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());

        let description = entry.summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .and_then(|d| clean_text(&d));

        let author = entry.authors
            .first()
            .and_then(|a| clean_text(&a.name));

        let published_at = entry.published.or(entry.updated);

        RawItem {
            title,
            link,
            description,
            author,
            published_at,
        }
    }).collect();

    Ok(items)
}

/// Strip markup, decode entities and collapse whitespace; blank text becomes `None`
fn clean_text(raw: &str) -> Option<String> {
    let text = if raw.contains('<') || raw.contains('&') {
        html_to_text(raw)
    } else {
        raw.to_string()
    };

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|_| html.to_string())
}

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use super::model::{Job, Timestamp};
use crate::config::NormalizeConfig;
use crate::feed::{RawItem, Source};

/// Turns raw feed items into job records, filling in every missing field
#[derive(Debug, Clone)]
pub struct JobNormalizer {
    description_max_chars: usize,
    default_description: String,
}

impl Default for JobNormalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl JobNormalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            description_max_chars: config.description_max_chars,
            default_description: config.default_description.clone(),
        }
    }

    /// Build the job record for one feed item.
    ///
    /// The id depends only on the source name and the item's link (or its
    /// title when the link is unusable), so the same item normalizes to the
    /// same id on every run.
    pub fn normalize(&self, item: RawItem, source: &Source, now: DateTime<Utc>) -> Job {
        let title = item.title
            .unwrap_or_else(|| format!("{} Opportunity", source.name));

        let description = truncate_chars(
            item.description.as_deref().unwrap_or(&self.default_description),
            self.description_max_chars,
        );

        let company = item.author.unwrap_or_else(|| source.name.clone());

        let link = item.link.as_deref().and_then(absolute_http_url);
        let id = job_id(&source.name, link.as_deref().unwrap_or(&title));
        let url = link.unwrap_or_else(|| fallback_url(&source.name));

        let ttl = source.effective_ttl();
        let (published_at, expires_at) = item.published_at
            .and_then(|published| Some((published, published.checked_add_signed(ttl)?)))
            .or_else(|| Some((now, now.checked_add_signed(ttl)?)))
            .unwrap_or((now, DateTime::<Utc>::MAX_UTC));

        Job {
            id,
            title,
            description,
            company,
            url,
            source: source.name.clone(),
            published_at: Timestamp::from(published_at),
            expires_at: Timestamp::from(expires_at),
        }
    }

    pub fn normalize_all(&self, items: Vec<RawItem>, source: &Source, now: DateTime<Utc>) -> Vec<Job> {
        items.into_iter()
            .map(|item| self.normalize(item, source, now))
            .collect()
    }
}

/// Deterministic job id: `{source-slug}-{first 16 bytes of sha256(source, key)}`
pub fn job_id(source_name: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_name.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", source_slug(source_name), hex)
}

/// Landing page used when an item has no usable link
pub fn fallback_url(source_name: &str) -> String {
    format!("https://{}.com", source_slug(source_name))
}

fn source_slug(source_name: &str) -> String {
    let slug: String = source_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if slug.is_empty() {
        "source".to_string()
    } else {
        slug
    }
}

fn absolute_http_url(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url.to_string()),
        _ => None,
    }
}

/// Cut `text` to at most `max_chars` characters plus a "..." marker; 0 disables the limit
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }

    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((end, _)) => format!("{}...", text[..end].trim_end()),
    }
}

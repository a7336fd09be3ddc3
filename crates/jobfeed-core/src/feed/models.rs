use chrono::{DateTime, Duration, Utc};

/// A configured job feed, validated and with its TTL resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    /// How long a job from this feed stays listed after publication
    pub ttl: Duration,
    /// Cap on items taken from the head of the feed
    pub max_items: Option<usize>,
}

impl Source {
    /// Shortest lifetime a job can be given
    pub const MIN_TTL_DAYS: u32 = 1;
    /// Longest lifetime a job can be given
    pub const MAX_TTL_DAYS: u32 = 3650;

    /// `ttl` clamped to `MIN_TTL_DAYS..=MAX_TTL_DAYS`, so expiry always
    /// lands after publication and the date arithmetic cannot overflow
    pub fn effective_ttl(&self) -> Duration {
        self.ttl.clamp(
            Duration::days(i64::from(Self::MIN_TTL_DAYS)),
            Duration::days(i64::from(Self::MAX_TTL_DAYS)),
        )
    }
}

/// One feed entry as it came off the wire, before any defaulting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

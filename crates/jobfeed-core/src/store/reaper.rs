use chrono::{DateTime, Utc};

use crate::job::Job;

/// Keep only jobs that are still live at `now`.
///
/// A job whose expiry cannot be parsed is kept.
pub fn reap(jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
    jobs.into_iter()
        .filter(|job| {
            let expired = job.is_expired(now);
            if expired {
                tracing::debug!(id = %job.id, title = %job.title, "Reaping expired job");
            }
            !expired
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Timestamp;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn job(id: &str, expires_at: Timestamp) -> Job {
        Job {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            company: "Acme".to_string(),
            url: "https://example.com".to_string(),
            source: "Board".to_string(),
            published_at: Timestamp::from(now() - Duration::days(30)),
            expires_at,
        }
    }

    fn unparsed(raw: &str) -> Timestamp {
        serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap()
    }

    #[test]
    fn test_drops_yesterday_keeps_tomorrow() {
        let jobs = vec![
            job("a", Timestamp::from(now() - Duration::days(1))),
            job("b", Timestamp::from(now() + Duration::days(1))),
        ];

        let kept = reap(jobs, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    #[test]
    fn test_expiring_exactly_now_is_reaped() {
        let kept = reap(vec![job("a", Timestamp::from(now()))], now());
        assert!(kept.is_empty());
    }

    #[test]
    fn test_unparseable_expiry_is_kept() {
        let kept = reap(vec![job("a", unparsed("soon")), job("b", unparsed(""))], now());
        assert_eq!(kept.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_keeps_exactly_live_jobs(offsets in prop::collection::vec(prop::option::of(-1000i64..1000), 0..20)) {
            let jobs: Vec<Job> = offsets.iter().enumerate().map(|(i, offset)| {
                let expires = match offset {
                    Some(minutes) => Timestamp::from(now() + Duration::minutes(*minutes)),
                    None => unparsed("not a date"),
                };
                job(&i.to_string(), expires)
            }).collect();

            let expected: Vec<String> = offsets.iter().enumerate()
                .filter(|(_, offset)| offset.map_or(true, |m| m > 0))
                .map(|(i, _)| i.to_string())
                .collect();

            let kept: Vec<String> = reap(jobs, now()).into_iter().map(|j| j.id).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}

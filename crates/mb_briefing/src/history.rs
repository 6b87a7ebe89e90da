use std::collections::BTreeMap;
use chrono::{DateTime, Duration, Utc};
use mb_core::{Brief, BriefingTrends, BriefingsPerDay};

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const DEFAULT_TREND_DAYS: u32 = 7;

pub fn trends_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

fn day_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Brief counts over the last `days` days as of `now`.
///
/// Every one of those days shows up in `briefings_per_day`, with zero when
/// nothing was generated. Briefs older than the window are ignored.
pub fn compute_trends(briefs: &[Brief], days: u32, now: DateTime<Utc>) -> BriefingTrends {
    let cutoff = trends_cutoff(now, days);
    let in_window: Vec<&Brief> = briefs.iter().filter(|b| b.created_at >= cutoff).collect();

    let total_briefings = in_window.len();
    let avg_articles_per_brief = if total_briefings == 0 {
        0.0
    } else {
        let articles: usize = in_window.iter().map(|b| b.article_ids.len()).sum();
        let avg = articles as f64 / total_briefings as f64;
        (avg * 100.0).round() / 100.0
    };

    let mut per_day: BTreeMap<String, usize> = (0..days)
        .map(|i| (day_key(now - Duration::days(i64::from(i))), 0))
        .collect();
    for brief in &in_window {
        *per_day.entry(day_key(brief.created_at)).or_insert(0) += 1;
    }

    BriefingTrends {
        total_briefings,
        avg_articles_per_brief,
        briefings_per_day: per_day
            .into_iter()
            .map(|(date, count)| BriefingsPerDay { date, count })
            .collect(),
    }
}

use crate::record::{ClickEvent, LinkRecord};
use jiff::tz::TimeZone;
use serde::Serialize;

/// Format of the calendar-day keys in [`LinkStats::clicks_by_day`], e.g. `Sat Oct 17 2026`.
pub const DAY_FORMAT: &str = "%a %b %d %Y";

/// A record as shown in listings, with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    #[serde(flatten)]
    pub record: LinkRecord,
    pub short_url: String,
    pub is_expired: bool,
}

/// Number of clicks that landed in one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyClicks {
    /// Hour of the day, `0..=23`.
    pub hour: u8,
    pub clicks: u64,
}

/// Number of clicks that landed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyClicks {
    pub day: String,
    pub clicks: u64,
}

/// Detailed statistics for a single link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    #[serde(flatten)]
    pub summary: LinkSummary,
    pub clicks_by_hour: Vec<HourlyClicks>,
    pub clicks_by_day: Vec<DailyClicks>,
}

/// Where a short code stands, distinguishing the two cases that
/// `resolve` and `get` both report as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Active(LinkRecord),
    Expired(LinkRecord),
    NotFound,
}

/// Groups clicks by local hour of day, in order of first occurrence.
pub fn clicks_by_hour(history: &[ClickEvent], tz: &TimeZone) -> Vec<HourlyClicks> {
    tally(history.iter().map(|click| {
        let hour = click.timestamp.to_zoned(tz.clone()).hour();
        u8::try_from(hour).unwrap_or_default()
    }))
    .into_iter()
    .map(|(hour, clicks)| HourlyClicks { hour, clicks })
    .collect()
}

/// Groups clicks by local calendar day, in order of first occurrence.
pub fn clicks_by_day(history: &[ClickEvent], tz: &TimeZone) -> Vec<DailyClicks> {
    tally(
        history
            .iter()
            .map(|click| click.timestamp.to_zoned(tz.clone()).strftime(DAY_FORMAT).to_string()),
    )
    .into_iter()
    .map(|(day, clicks)| DailyClicks { day, clicks })
    .collect()
}

fn tally<K: PartialEq>(keys: impl Iterator<Item = K>) -> Vec<(K, u64)> {
    let mut buckets: Vec<(K, u64)> = Vec::new();
    for key in keys {
        match buckets.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, count)) => *count += 1,
            None => buckets.push((key, 1)),
        }
    }
    buckets
}

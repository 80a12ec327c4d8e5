use chrono::{DateTime, Duration, Timelike, Utc};

use crate::models::{DraftIdea, Idea};

/// Minutes between two consecutive publications.
pub const CADENCE_MINUTES: i64 = 5;

/// First free slot strictly after `from`, on the five-minute grid.
///
/// `from` is truncated to the minute first. A `from` already on the grid is
/// treated as taken (it is either "now" or the last slot handed out).
pub fn next_slot(from: DateTime<Utc>) -> DateTime<Utc> {
    let mut slot = from
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(from);

    if i64::from(slot.minute()) % CADENCE_MINUTES == 0 {
        slot += Duration::minutes(CADENCE_MINUTES);
    } else {
        while i64::from(slot.minute()) % CADENCE_MINUTES != 0 {
            slot += Duration::minutes(1);
        }
    }
    slot
}

/// Publication dates for `count` ideas, one per cadence step after `from`.
pub fn publication_slots(from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    let first = next_slot(from);
    (0..count)
        .map(|i| first + Duration::minutes(CADENCE_MINUTES * i as i64))
        .collect()
}

/// Give every draft a publication date, keeping input order.
pub fn schedule(from: DateTime<Utc>, drafts: Vec<DraftIdea>) -> Vec<Idea> {
    let slots = publication_slots(from, drafts.len());
    drafts
        .into_iter()
        .zip(slots)
        .map(|(draft, pub_date)| draft.into_idea(pub_date))
        .collect()
}

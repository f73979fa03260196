//! Mood aggregation: keeps one `MoodLog` per calendar day in sync with
//! the diary entries for that day.
//!
//! The log is always recomputed from scratch and replaced wholesale
//! rather than updated incrementally. Recomputation is idempotent and
//! derives fully from current entry state, so concurrent recomputes for
//! the same day are harmless (last writer wins).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::activity::ActivityCategory;
use crate::models::mood_log::{CategoryCounts, MoodLog};

/// The per-entry inputs to the daily aggregate: moods plus the linked
/// catalog activity's category, when the entry has one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryMood {
    pub id: Uuid,
    pub mood_before: Option<i32>,
    pub mood_after: i32,
    pub category: Option<ActivityCategory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub average_mood_before: f64,
    pub average_mood_after: f64,
    pub mood_change: f64,
    pub entry_count: i32,
    pub entry_ids: Vec<Uuid>,
    pub categories: CategoryCounts,
}

/// Inclusive day bounds: 00:00:00.000 through 23:59:59.999.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Aggregate a day's entries. Empty input yields `None` — the caller
/// deletes the log rather than storing a zero-entry aggregate.
///
/// An entry missing `mood_before` contributes its `mood_after` to the
/// before-average, so a day of after-only entries reads as "no change".
pub fn summarize(entries: &[EntryMood]) -> Option<DailySummary> {
    if entries.is_empty() {
        return None;
    }

    let n = entries.len() as f64;
    let before_sum: i64 = entries
        .iter()
        .map(|e| i64::from(e.mood_before.unwrap_or(e.mood_after)))
        .sum();
    let after_sum: i64 = entries.iter().map(|e| i64::from(e.mood_after)).sum();

    let mut categories = CategoryCounts::default();
    for entry in entries {
        match entry.category {
            Some(ActivityCategory::Routine) => categories.routine += 1,
            Some(ActivityCategory::Necessary) => categories.necessary += 1,
            Some(ActivityCategory::Pleasurable) => categories.pleasurable += 1,
            None => {}
        }
    }

    Some(DailySummary {
        average_mood_before: before_sum as f64 / n,
        average_mood_after: after_sum as f64 / n,
        mood_change: (after_sum - before_sum) as f64 / n,
        entry_count: entries.len() as i32,
        entry_ids: entries.iter().map(|e| e.id).collect(),
        categories,
    })
}

/// Recompute the mood log for `(user_id, date)` from the diary entries
/// whose timestamp falls within that day.
///
/// Must be called after every entry create, update (for both the old
/// and new date when the date changed) and delete — skipping it leaves
/// the aggregate stale. When the day has no entries left, any existing
/// log row is removed; otherwise the row is upserted as a whole, so a
/// failed recompute leaves the previous value intact.
pub async fn recalculate_for_date(
    db: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> AppResult<Option<MoodLog>> {
    let (start, end) = day_bounds(date);

    let entries = sqlx::query_as::<_, EntryMood>(
        r#"
        SELECT d.id, d.mood_before, d.mood_after, a.category
        FROM diary_entries d
        LEFT JOIN activities a ON a.id = d.activity_id
        WHERE d.user_id = $1 AND d.logged_at BETWEEN $2 AND $3
        ORDER BY d.logged_at ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    let Some(summary) = summarize(&entries) else {
        sqlx::query("DELETE FROM mood_logs WHERE user_id = $1 AND log_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(db)
            .await?;
        return Ok(None);
    };

    let log = sqlx::query_as::<_, MoodLog>(
        r#"
        INSERT INTO mood_logs (
            id, user_id, log_date,
            average_mood_before, average_mood_after, mood_change,
            entry_count, entry_ids,
            routine_count, necessary_count, pleasurable_count
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id, log_date) DO UPDATE SET
            average_mood_before = EXCLUDED.average_mood_before,
            average_mood_after = EXCLUDED.average_mood_after,
            mood_change = EXCLUDED.mood_change,
            entry_count = EXCLUDED.entry_count,
            entry_ids = EXCLUDED.entry_ids,
            routine_count = EXCLUDED.routine_count,
            necessary_count = EXCLUDED.necessary_count,
            pleasurable_count = EXCLUDED.pleasurable_count,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(summary.average_mood_before)
    .bind(summary.average_mood_after)
    .bind(summary.mood_change)
    .bind(summary.entry_count)
    .bind(&summary.entry_ids)
    .bind(summary.categories.routine)
    .bind(summary.categories.necessary)
    .bind(summary.categories.pleasurable)
    .fetch_one(db)
    .await?;

    Ok(Some(log))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mood_before: Option<i32>, mood_after: i32, category: Option<ActivityCategory>) -> EntryMood {
        EntryMood {
            id: Uuid::new_v4(),
            mood_before,
            mood_after,
            category,
        }
    }

    #[test]
    fn empty_day_yields_no_summary() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn two_entry_day_averages() {
        // 09:00 entry (3 -> 6) and 15:00 entry (5 -> 5)
        let entries = vec![entry(Some(3), 6, None), entry(Some(5), 5, None)];
        let summary = summarize(&entries).unwrap();

        assert_eq!(summary.entry_count, 2);
        assert!((summary.average_mood_before - 4.0).abs() < 1e-9);
        assert!((summary.average_mood_after - 5.5).abs() < 1e-9);
        assert!((summary.mood_change - 1.5).abs() < 1e-9);
    }

    #[test]
    fn missing_mood_before_falls_back_to_mood_after() {
        let entries = vec![entry(None, 8, None)];
        let summary = summarize(&entries).unwrap();

        assert!((summary.average_mood_before - 8.0).abs() < 1e-9);
        assert!((summary.average_mood_after - 8.0).abs() < 1e-9);
        assert!(summary.mood_change.abs() < 1e-9);
    }

    #[test]
    fn mood_change_equals_difference_of_averages() {
        let entries = vec![
            entry(Some(2), 7, None),
            entry(Some(4), 4, None),
            entry(None, 9, None),
            entry(Some(1), 10, None),
        ];
        let summary = summarize(&entries).unwrap();

        let expected = summary.average_mood_after - summary.average_mood_before;
        assert!((summary.mood_change - expected).abs() < 1e-9);
    }

    #[test]
    fn category_counts_skip_unlinked_entries() {
        let entries = vec![
            entry(Some(3), 5, Some(ActivityCategory::Routine)),
            entry(Some(4), 6, Some(ActivityCategory::Pleasurable)),
            entry(Some(5), 5, Some(ActivityCategory::Pleasurable)),
            entry(Some(2), 3, None),
        ];
        let summary = summarize(&entries).unwrap();

        assert_eq!(summary.categories.routine, 1);
        assert_eq!(summary.categories.necessary, 0);
        assert_eq!(summary.categories.pleasurable, 2);
        assert_eq!(summary.entry_count, 4);
    }

    #[test]
    fn summarize_is_idempotent() {
        let entries = vec![entry(Some(3), 6, Some(ActivityCategory::Necessary)), entry(Some(5), 5, None)];
        assert_eq!(summarize(&entries), summarize(&entries));
    }

    #[test]
    fn entry_ids_track_contributing_entries() {
        let entries = vec![entry(Some(3), 6, None), entry(Some(5), 5, None)];
        let summary = summarize(&entries).unwrap();
        let expected: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        assert_eq!(summary.entry_ids, expected);
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds(date);

        assert_eq!(start.to_rfc3339(), "2024-03-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-15T23:59:59.999+00:00");
    }
}

//! Progress tracking: the per-user week/day pointer through the
//! five-week program, its unlock rules, and the completion history.
//!
//! Transitions are pure functions of (current state, event); the async
//! functions below only load and persist.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::progress::{CompletedWeek, UserProgress};

pub const FINAL_WEEK: i32 = 5;
pub const DAYS_PER_WEEK: i32 = 7;

/// A week-completion event, ready to append to the history.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekCompletion {
    pub week_number: i32,
    pub completed_date: DateTime<Utc>,
    pub session_read: bool,
    pub days_completed: i32,
    pub total_entries: i32,
}

/// Day number within the current week: day 1 on the week's start date,
/// clamped to [1, 7] however much real time has elapsed.
pub fn day_number_for(week_start: NaiveDate, today: NaiveDate) -> i32 {
    let elapsed = (today - week_start).num_days();
    (elapsed + 1).clamp(1, i64::from(DAYS_PER_WEEK)) as i32
}

/// Week 1 is always unlocked; week N needs a completion record for
/// week N-1 with a full seven days logged.
pub fn is_week_unlocked(history: &[CompletedWeek], week_number: i32) -> bool {
    if week_number == 1 {
        return true;
    }
    history
        .iter()
        .any(|w| w.week_number == week_number - 1 && w.days_completed >= DAYS_PER_WEEK)
}

/// Apply the "complete current week" transition: produce the history
/// record for the week being closed and advance the pointer. The
/// pointer stops at week 5 (history keeps appending past it).
pub fn complete_week(
    progress: &mut UserProgress,
    now: DateTime<Utc>,
    entries_count: i64,
) -> WeekCompletion {
    let completion = WeekCompletion {
        week_number: progress.current_week,
        completed_date: now,
        session_read: true,
        days_completed: progress.current_day,
        total_entries: entries_count as i32,
    };

    if progress.current_week < FINAL_WEEK {
        progress.current_week += 1;
        progress.current_day = 1;
        progress.week_start_date = now;
    }

    completion
}

/// Fetch the user's progress row, creating it with defaults on first
/// access. Missing progress is never an error.
pub async fn get_or_create(db: &PgPool, user_id: Uuid) -> AppResult<UserProgress> {
    if let Some(progress) =
        sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?
    {
        return Ok(progress);
    }

    // Two lazy creates may race; the conflict clause makes the loser a
    // no-op and the follow-up select returns the winner's row.
    sqlx::query(
        "INSERT INTO user_progress (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(db)
    .await?;

    let progress =
        sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;

    Ok(progress)
}

/// Completion history in append order.
pub async fn completed_weeks(db: &PgPool, progress_id: Uuid) -> AppResult<Vec<CompletedWeek>> {
    let history = sqlx::query_as::<_, CompletedWeek>(
        "SELECT * FROM completed_weeks WHERE progress_id = $1 ORDER BY completed_date ASC",
    )
    .bind(progress_id)
    .fetch_all(db)
    .await?;

    Ok(history)
}

/// The "log an activity" transition: bump the running counter, move the
/// day pointer, touch the activity timestamp. Never advances the week.
pub async fn record_activity_logged(
    db: &PgPool,
    progress_id: Uuid,
    day_number: i32,
) -> AppResult<UserProgress> {
    let progress = sqlx::query_as::<_, UserProgress>(
        r#"
        UPDATE user_progress SET
            total_activities_logged = total_activities_logged + 1,
            current_day = $2,
            last_active_date = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(progress_id)
    .bind(day_number)
    .fetch_one(db)
    .await?;

    Ok(progress)
}

/// Persist the outcome of `complete_week`: append the history record
/// and store the advanced pointer.
pub async fn persist_completion(
    db: &PgPool,
    progress: &UserProgress,
    completion: &WeekCompletion,
) -> AppResult<CompletedWeek> {
    let record = sqlx::query_as::<_, CompletedWeek>(
        r#"
        INSERT INTO completed_weeks (
            id, progress_id, week_number, completed_date,
            session_read, days_completed, total_entries
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(progress.id)
    .bind(completion.week_number)
    .bind(completion.completed_date)
    .bind(completion.session_read)
    .bind(completion.days_completed)
    .bind(completion.total_entries)
    .fetch_one(db)
    .await?;

    sqlx::query(
        r#"
        UPDATE user_progress SET
            current_week = $2,
            current_day = $3,
            week_start_date = $4,
            last_active_date = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(progress.id)
    .bind(progress.current_week)
    .bind(progress.current_day)
    .bind(progress.week_start_date)
    .execute(db)
    .await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn progress_at(week: i32, day: i32) -> UserProgress {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        UserProgress {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            current_week: week,
            current_day: day,
            week_start_date: start,
            total_activities_logged: 0,
            started_date: start,
            last_active_date: start,
            created_at: start,
            updated_at: start,
        }
    }

    fn history_record(week_number: i32, days_completed: i32) -> CompletedWeek {
        let when = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        CompletedWeek {
            id: Uuid::new_v4(),
            progress_id: Uuid::new_v4(),
            week_number,
            completed_date: when,
            session_read: true,
            days_completed,
            total_entries: 20,
            created_at: when,
        }
    }

    #[test]
    fn day_number_starts_at_one() {
        let start = date(2024, 3, 4);
        assert_eq!(day_number_for(start, start), 1);
        assert_eq!(day_number_for(start, date(2024, 3, 5)), 2);
        assert_eq!(day_number_for(start, date(2024, 3, 10)), 7);
    }

    #[test]
    fn day_number_clamps_to_week_bounds() {
        let start = date(2024, 3, 4);
        // Weeks of inactivity still land on day 7.
        assert_eq!(day_number_for(start, date(2024, 4, 20)), 7);
        // A clock that drifted before the week start still reads day 1.
        assert_eq!(day_number_for(start, date(2024, 3, 1)), 1);
    }

    #[test]
    fn week_one_is_always_unlocked() {
        assert!(is_week_unlocked(&[], 1));
    }

    #[test]
    fn later_weeks_need_a_full_previous_week() {
        assert!(!is_week_unlocked(&[], 2));
        assert!(!is_week_unlocked(&[history_record(1, 6)], 2));
        assert!(is_week_unlocked(&[history_record(1, 7)], 2));
        // The record must be for the immediately preceding week.
        assert!(!is_week_unlocked(&[history_record(1, 7)], 3));
        assert!(is_week_unlocked(&[history_record(1, 7), history_record(2, 7)], 3));
    }

    #[test]
    fn completing_a_week_advances_the_pointer() {
        let mut progress = progress_at(2, 7);
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 10, 30, 0).unwrap();

        let completion = complete_week(&mut progress, now, 10);

        assert_eq!(completion.week_number, 2);
        assert_eq!(completion.days_completed, 7);
        assert_eq!(completion.total_entries, 10);
        assert!(completion.session_read);

        assert_eq!(progress.current_week, 3);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.week_start_date, now);
    }

    #[test]
    fn final_week_pointer_is_terminal() {
        let mut progress = progress_at(5, 4);
        let original_start = progress.week_start_date;
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();

        let completion = complete_week(&mut progress, now, 3);

        // History still appends for week 5...
        assert_eq!(completion.week_number, 5);
        assert_eq!(completion.days_completed, 4);
        // ...but the pointer no longer moves.
        assert_eq!(progress.current_week, 5);
        assert_eq!(progress.current_day, 4);
        assert_eq!(progress.week_start_date, original_start);
    }

    #[test]
    fn partial_week_records_current_day() {
        let mut progress = progress_at(1, 3);
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 21, 0, 0).unwrap();

        let completion = complete_week(&mut progress, now, 9);

        assert_eq!(completion.days_completed, 3);
        // A 3-day week 1 does not unlock week 2.
        let record = history_record(1, completion.days_completed);
        assert!(!is_week_unlocked(&[record], 2));
    }
}

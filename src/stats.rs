//! Monthly aggregation over raw check-in logs. Pure functions: the
//! handler fetches the user's habits and one month of logs, everything
//! else happens here.

use serde::{Deserialize, Serialize};

use crate::calendar::Month;
use crate::models::{Habit, LogWithHabit};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: String,
    pub days_in_month: u32,
    pub habit_count: u32,
    pub completed_count: u32,
    /// `round(100 * completed / (habits * days))`, 0 when the
    /// denominator is 0.
    pub overall_completion: u32,
    pub per_habit: Vec<HabitStat>,
    pub weekly: Vec<WeekStat>,
    pub per_day: Vec<DayStat>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitStat {
    pub habit_id: i64,
    pub name: String,
    pub completed_days: u32,
    pub percent: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekStat {
    pub label: String,
    pub start_day: u32,
    pub end_day: u32,
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayStat {
    pub day: u32,
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
}

fn percent(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 * 100.0) / total as f64).round() as u32
}

/// Day-of-month from a canonical `YYYY-MM-DD` string.
fn day_of_month(date: &str) -> Option<u32> {
    date.get(8..10)?.parse().ok()
}

/// Computes the month dashboard numbers. `habits` must be the user's
/// current habits in creation order; `logs` the user's logs for the
/// month. Logs of deleted habits never appear (the delete cascade
/// removed them), and `completed = false` rows count the same as absent
/// rows everywhere.
///
/// A habit created mid-month still divides by the full month length.
/// That over-penalizes new habits, but it is what the product does;
/// changing it needs product input.
pub fn month_summary(month: Month, habits: &[Habit], logs: &[LogWithHabit]) -> MonthSummary {
    let days = month.days();
    let habit_count = habits.len() as u32;

    let completed: Vec<&LogWithHabit> = logs.iter().filter(|l| l.completed).collect();
    let completed_count = completed.len() as u32;

    let overall_completion = percent(completed_count, habit_count * days);

    // Per-habit, sorted by percent descending. The sort is stable and
    // the input is in creation order, so ties keep oldest-first.
    let mut per_habit: Vec<HabitStat> = habits
        .iter()
        .map(|h| {
            let completed_days = completed.iter().filter(|l| l.habit.id == h.id).count() as u32;
            HabitStat {
                habit_id: h.id,
                name: h.name.clone(),
                completed_days,
                percent: percent(completed_days, days),
            }
        })
        .collect();
    per_habit.sort_by(|a, b| b.percent.cmp(&a.percent));

    // Fixed day-of-month buckets 1-7, 8-14, 15-21, 22-28, 29-end. The
    // last is clipped to the month length and dropped when empty.
    let weekly: Vec<WeekStat> = [(1u32, 7u32), (8, 14), (15, 21), (22, 28), (29, 31)]
        .iter()
        .enumerate()
        .filter_map(|(i, &(start, end))| {
            let end = end.min(days);
            if start > days {
                return None;
            }
            let bucket_days = end - start + 1;
            let total = bucket_days * habit_count;
            if total == 0 {
                return None;
            }
            let bucket_completed = completed
                .iter()
                .filter(|l| {
                    day_of_month(&l.date).is_some_and(|d| d >= start && d <= end)
                })
                .count() as u32;
            Some(WeekStat {
                label: format!("Week {}", i + 1),
                start_day: start,
                end_day: end,
                completed: bucket_completed,
                total,
                percent: percent(bucket_completed, total),
            })
        })
        .collect();

    let per_day: Vec<DayStat> = (1..=days)
        .map(|day| {
            let day_completed = completed
                .iter()
                .filter(|l| day_of_month(&l.date) == Some(day))
                .count() as u32;
            DayStat {
                day,
                completed: day_completed,
                total: habit_count,
                percent: percent(day_completed, habit_count),
            }
        })
        .collect();

    MonthSummary {
        month: month.prefix(),
        days_in_month: days,
        habit_count,
        completed_count,
        overall_completion,
        per_habit,
        weekly,
        per_day,
    }
}

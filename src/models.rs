use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

fn to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbHabit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category: String,
    pub color: String,
    pub created_at: NaiveDateTime,
}

impl From<DbHabit> for Habit {
    fn from(db: DbHabit) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            category: db.category,
            color: db.color,
            created_at: to_utc(db.created_at),
        }
    }
}

/// One check-in row. The `(habit_id, user_id, date)` triple is unique at
/// the store layer; `date` is the canonical `YYYY-MM-DD` text form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: i64,
    pub habit_id: i64,
    pub user_id: i64,
    pub date: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbHabitLog {
    pub id: i64,
    pub habit_id: i64,
    pub user_id: i64,
    pub date: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<DbHabitLog> for HabitLog {
    fn from(db: DbHabitLog) -> Self {
        Self {
            id: db.id,
            habit_id: db.habit_id,
            user_id: db.user_id,
            date: db.date,
            completed: db.completed,
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
        }
    }
}

/// Log with its habit embedded, as the month-listing and check-in
/// endpoints return it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LogWithHabit {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub habit: Habit,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbLogWithHabit {
    pub id: i64,
    pub habit_id: i64,
    pub user_id: i64,
    pub date: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub habit_name: String,
    pub habit_category: String,
    pub habit_color: String,
    pub habit_created_at: NaiveDateTime,
}

impl From<DbLogWithHabit> for LogWithHabit {
    fn from(db: DbLogWithHabit) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            date: db.date,
            completed: db.completed,
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
            habit: Habit {
                id: db.habit_id,
                user_id: db.user_id,
                name: db.habit_name,
                category: db.habit_category,
                color: db.habit_color,
                created_at: to_utc(db.habit_created_at),
            },
        }
    }
}

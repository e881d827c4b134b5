use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbSession, DbUser, Session, User};
use crate::error::AppError;
use crate::models::{DbHabit, DbLogWithHabit, Habit, LogWithHabit};

// ---------------------------------------------------------------------------
// Users

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    let row = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<DbUser>, AppError> {
    let row = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

#[instrument(skip_all, fields(email))]
pub async fn create_local_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    info!("Creating new local user");

    if find_user_by_email(pool, email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "An account with email '{}' already exists",
            email
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let now = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT INTO users (name, email, password, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(now)
    .execute(pool)
    .await?;

    get_user(pool, res.last_insert_rowid()).await
}

#[instrument(skip_all, fields(email))]
pub async fn create_google_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    google_id: &str,
) -> Result<User, AppError> {
    info!("Creating new federated user");

    let now = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT INTO users (name, email, google_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(google_id)
    .bind(now)
    .execute(pool)
    .await?;

    get_user(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, google_id))]
pub async fn link_google_id(
    pool: &Pool<Sqlite>,
    user_id: i64,
    google_id: &str,
) -> Result<(), AppError> {
    info!("Linking federated identity to existing user");

    sqlx::query("UPDATE users SET google_id = ? WHERE id = ?")
        .bind(google_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Returns the user only when the credentials check out; `None` covers
/// unknown email, password-less (Google-only) accounts, and mismatches
/// alike so callers cannot tell them apart.
#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");

    let row = find_user_by_email(pool, email).await?;

    match row {
        Some(user) => {
            let stored = match &user.password {
                Some(hash) => hash.clone(),
                None => return Ok(None),
            };
            match bcrypt::verify(password, &stored) {
                Ok(true) => Ok(Some(User::from(user))),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

#[instrument(skip(pool))]
pub async fn update_user_name(
    pool: &Pool<Sqlite>,
    user_id: i64,
    name: &str,
) -> Result<User, AppError> {
    info!("Updating user display name");

    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(user_id)
        .execute(pool)
        .await?;

    get_user(pool, user_id).await
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");

    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(user_id))]
pub async fn set_reset_otp(
    pool: &Pool<Sqlite>,
    user_id: i64,
    otp: &str,
    expires_at: NaiveDateTime,
) -> Result<(), AppError> {
    info!("Storing password reset OTP");

    sqlx::query("UPDATE users SET reset_otp = ?, reset_otp_expires = ? WHERE id = ?")
        .bind(otp)
        .bind(expires_at)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clear_reset_otp(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET reset_otp = NULL, reset_otp_expires = NULL WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn count_habits(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habits WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[instrument(skip(pool))]
pub async fn count_logs(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_logs WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Account deletion cascade: logs, habits, sessions, then the user row.
/// Each statement deletes by identity, so a partial failure leaves a
/// state that a retry completes.
#[instrument(skip(pool))]
pub async fn delete_user_cascade(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user account and all owned data");

    sqlx::query("DELETE FROM habit_logs WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM habits WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Habits
//
// Every habit query filters on the owning user inside the statement, so
// an id belonging to someone else reads as absent (NotFound, never
// Forbidden).

#[instrument(skip(pool))]
pub async fn get_habits(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Habit>, AppError> {
    let rows = sqlx::query_as::<_, DbHabit>(
        "SELECT * FROM habits WHERE user_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Habit::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_habit(
    pool: &Pool<Sqlite>,
    user_id: i64,
    habit_id: i64,
) -> Result<Habit, AppError> {
    let row = sqlx::query_as::<_, DbHabit>("SELECT * FROM habits WHERE id = ? AND user_id = ?")
        .bind(habit_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(habit) => Ok(Habit::from(habit)),
        _ => Err(AppError::NotFound("Habit not found".to_string())),
    }
}

#[instrument(skip(pool))]
pub async fn create_habit(
    pool: &Pool<Sqlite>,
    user_id: i64,
    name: &str,
    category: &str,
    color: &str,
) -> Result<Habit, AppError> {
    info!("Creating habit");

    let now = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT INTO habits (user_id, name, category, color, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(category)
    .bind(color)
    .bind(now)
    .execute(pool)
    .await?;

    get_habit(pool, user_id, res.last_insert_rowid()).await
}

#[instrument(skip(pool))]
pub async fn update_habit(
    pool: &Pool<Sqlite>,
    user_id: i64,
    habit_id: i64,
    name: Option<&str>,
    category: Option<&str>,
    color: Option<&str>,
) -> Result<Habit, AppError> {
    info!("Updating habit");

    let current = get_habit(pool, user_id, habit_id).await?;

    sqlx::query("UPDATE habits SET name = ?, category = ?, color = ? WHERE id = ? AND user_id = ?")
        .bind(name.unwrap_or(&current.name))
        .bind(category.unwrap_or(&current.category))
        .bind(color.unwrap_or(&current.color))
        .bind(habit_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    get_habit(pool, user_id, habit_id).await
}

/// Habit deletion cascade: deletes the habit row, then every log keyed
/// to `(habit, user)`. The two statements are deliberately independent;
/// a retry that finds the habit already gone still runs the log
/// deletion, so a partial failure is always recoverable by retrying.
#[instrument(skip(pool))]
pub async fn delete_habit_cascade(
    pool: &Pool<Sqlite>,
    user_id: i64,
    habit_id: i64,
) -> Result<(), AppError> {
    info!("Deleting habit and its logs");

    let res = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
        .bind(habit_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    let habit_existed = res.rows_affected() > 0;

    sqlx::query("DELETE FROM habit_logs WHERE habit_id = ? AND user_id = ?")
        .bind(habit_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if habit_existed {
        Ok(())
    } else {
        Err(AppError::NotFound("Habit not found".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Check-ins

const LOG_WITH_HABIT_COLUMNS: &str = "l.id, l.habit_id, l.user_id, l.date, l.completed, \
     l.created_at, l.updated_at, \
     h.name AS habit_name, h.category AS habit_category, h.color AS habit_color, \
     h.created_at AS habit_created_at";

/// Idempotent check-in upsert. The unique index on
/// `(habit_id, user_id, date)` serializes concurrent writers; the loser
/// of a race lands in the `DO UPDATE` arm and the stored `completed`
/// converges to the last committed write.
#[instrument(skip(pool))]
pub async fn set_check_in(
    pool: &Pool<Sqlite>,
    user_id: i64,
    habit_id: i64,
    date: &str,
    completed: bool,
) -> Result<LogWithHabit, AppError> {
    info!("Recording check-in");

    let now = Utc::now().naive_utc();

    sqlx::query(
        "INSERT INTO habit_logs (habit_id, user_id, date, completed, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (habit_id, user_id, date)
         DO UPDATE SET completed = excluded.completed, updated_at = excluded.updated_at",
    )
    .bind(habit_id)
    .bind(user_id)
    .bind(date)
    .bind(completed)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!(
        "SELECT {} FROM habit_logs l
         JOIN habits h ON h.id = l.habit_id
         WHERE l.habit_id = ? AND l.user_id = ? AND l.date = ?",
        LOG_WITH_HABIT_COLUMNS
    );

    let row = sqlx::query_as::<_, DbLogWithHabit>(&sql)
        .bind(habit_id)
        .bind(user_id)
        .bind(date)
        .fetch_one(pool)
        .await?;

    Ok(LogWithHabit::from(row))
}

#[instrument(skip(pool))]
pub async fn get_month_logs(
    pool: &Pool<Sqlite>,
    user_id: i64,
    month_prefix: &str,
) -> Result<Vec<LogWithHabit>, AppError> {
    let sql = format!(
        "SELECT {} FROM habit_logs l
         JOIN habits h ON h.id = l.habit_id
         WHERE l.user_id = ? AND l.date LIKE ? || '%'
         ORDER BY l.date ASC, l.id ASC",
        LOG_WITH_HABIT_COLUMNS
    );

    let rows = sqlx::query_as::<_, DbLogWithHabit>(&sql)
        .bind(user_id)
        .bind(month_prefix)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(LogWithHabit::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_all_logs(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<LogWithHabit>, AppError> {
    let sql = format!(
        "SELECT {} FROM habit_logs l
         JOIN habits h ON h.id = l.habit_id
         WHERE l.user_id = ?
         ORDER BY l.date ASC, l.id ASC",
        LOG_WITH_HABIT_COLUMNS
    );

    let rows = sqlx::query_as::<_, DbLogWithHabit>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(LogWithHabit::from).collect())
}

// ---------------------------------------------------------------------------
// Sessions

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let now = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT INTO user_sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(token)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<Session, AppError> {
    let session = sqlx::query_as::<_, DbSession>("SELECT * FROM user_sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    match session {
        Some(session) => Ok(Session::from(session)),
        _ => Err(AppError::Unauthorized("Invalid session token".to_string())),
    }
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

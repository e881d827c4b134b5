use chrono::{Duration, Utc};
use rand::Rng;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Session, User, SESSION_TTL_DAYS};
use crate::calendar::{parse_day, parse_month};
use crate::db::{
    authenticate_user, clear_reset_otp, count_habits, count_logs, create_google_user, create_habit,
    create_local_user, create_user_session, delete_habit_cascade, delete_user_cascade,
    find_user_by_email, get_all_logs, get_habit, get_habits, get_month_logs, link_google_id,
    set_check_in, set_reset_otp, update_habit, update_user_name, update_user_password,
};
use crate::email::DynMailer;
use crate::error::AppError;
use crate::export::{logs_to_csv, CsvAttachment};
use crate::google::DynVerifier;
use crate::models::{Habit, LogWithHabit};
use crate::stats::{month_summary, MonthSummary};

const OTP_TTL_MINUTES: i64 = 10;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserData,
}

async fn issue_session(db: &Pool<Sqlite>, user: User) -> Result<Json<AuthResponse>, AppError> {
    let token = Session::generate_token();
    let expires_at = (Utc::now() + Duration::days(SESSION_TTL_DAYS)).naive_utc();

    create_user_session(db, user.id, &token, expires_at).await?;

    Ok(Json(AuthResponse {
        token,
        user: UserData::from(user),
    }))
}

fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

// ---------------------------------------------------------------------------
// Auth

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    name: Option<String>,
    #[validate(email(message = "a valid email is required"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

#[post("/register", data = "<registration>")]
pub async fn api_register(
    registration: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AuthResponse>, AppError> {
    registration.validate()?;

    let name = registration
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .unwrap_or_else(|| default_name(&registration.email));

    let user = create_local_user(db, &name, &registration.email, &registration.password).await?;

    issue_session(db, user).await
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AuthResponse>, AppError> {
    match authenticate_user(db, &login.email, &login.password).await? {
        Some(user) => issue_session(db, user).await,
        None => Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        )),
    }
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    credential: String,
}

#[post("/google", data = "<request>")]
pub async fn api_google_login(
    request: Json<GoogleLoginRequest>,
    verifier: &State<DynVerifier>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AuthResponse>, AppError> {
    let identity = verifier.verify(&request.credential).await?;

    let user = match find_user_by_email(db, &identity.email).await? {
        Some(existing) => {
            if existing.google_id.is_none() {
                link_google_id(db, existing.id, &identity.google_id).await?;
            }
            crate::db::get_user(db, existing.id).await?
        }
        None => {
            let name = identity
                .name
                .clone()
                .unwrap_or_else(|| default_name(&identity.email));
            create_google_user(db, &name, &identity.email, &identity.google_id).await?
        }
    };

    issue_session(db, user).await
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "a valid email is required"))]
    email: String,
}

/// Always answers with the same ambiguous message so the endpoint never
/// discloses whether an account exists. Google-only accounts (no
/// password) are silently skipped too.
#[post("/forgot-password", data = "<request>")]
pub async fn api_forgot_password(
    request: Json<ForgotPasswordRequest>,
    mailer: &State<DynMailer>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    if let Some(user) = find_user_by_email(db, &request.email).await? {
        if user.password.is_some() {
            let otp = rand::rng().random_range(100_000..1_000_000).to_string();
            let expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).naive_utc();

            set_reset_otp(db, user.id, &otp, expires_at).await?;

            let body = format!(
                "Your OTP to reset your TrackItAll password is: {}\n\n\
                 This code is valid for {} minutes. If you did not request this, \
                 you can ignore this email.",
                otp, OTP_TTL_MINUTES
            );

            // A delivery failure must not change the response either,
            // or the timing/status would leak account existence.
            if let Err(err) = mailer
                .send(&user.email, "TrackItAll Password Reset OTP", &body)
                .await
            {
                err.log_and_record("forgot-password email delivery");
            }
        }
    }

    Ok(MessageResponse::new(
        "If that account exists, an OTP has been sent to its email.",
    ))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "a valid email is required"))]
    email: String,
    #[validate(length(min = 1, message = "otp is required"))]
    otp: String,
    #[validate(length(min = 1, message = "new password is required"))]
    new_password: String,
}

#[post("/reset-password-otp", data = "<request>")]
pub async fn api_reset_password(
    request: Json<ResetPasswordRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AuthResponse>, AppError> {
    request.validate()?;

    let user = match find_user_by_email(db, &request.email).await? {
        Some(user) if user.password.is_some() => user,
        _ => return Err(AppError::Unauthorized("Invalid reset request".to_string())),
    };

    let (stored_otp, expires_at) = match (&user.reset_otp, user.reset_otp_expires) {
        (Some(otp), Some(expires)) => (otp.clone(), expires),
        _ => {
            return Err(AppError::Validation(
                "No active reset request for this account".to_string(),
            ))
        }
    };

    if Utc::now().naive_utc() > expires_at {
        return Err(AppError::Expired("OTP has expired".to_string()));
    }

    if stored_otp != request.otp {
        return Err(AppError::Unauthorized("Invalid OTP".to_string()));
    }

    update_user_password(db, user.id, &request.new_password).await?;
    clear_reset_otp(db, user.id).await?;

    let user = crate::db::get_user(db, user.id).await?;
    issue_session(db, user).await
}

// ---------------------------------------------------------------------------
// Habits

#[get("/")]
pub async fn api_list_habits(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Habit>>, AppError> {
    let habits = get_habits(db, user.id).await?;
    Ok(Json(habits))
}

#[derive(Deserialize)]
pub struct CreateHabitRequest {
    name: String,
    category: Option<String>,
    color: Option<String>,
}

#[post("/", data = "<request>")]
pub async fn api_create_habit(
    request: Json<CreateHabitRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Habit>, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let category = request.category.as_deref().unwrap_or("General");
    let color = request.color.as_deref().unwrap_or("#22c55e");

    let habit = create_habit(db, user.id, name, category, color).await?;
    Ok(Json(habit))
}

#[derive(Deserialize)]
pub struct UpdateHabitRequest {
    name: Option<String>,
    category: Option<String>,
    color: Option<String>,
}

#[patch("/<id>", data = "<request>")]
pub async fn api_update_habit(
    id: i64,
    request: Json<UpdateHabitRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Habit>, AppError> {
    let name = match &request.name {
        Some(name) => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation("Name cannot be empty".to_string()));
            }
            Some(trimmed)
        }
        None => None,
    };

    let habit = update_habit(
        db,
        user.id,
        id,
        name,
        request.category.as_deref(),
        request.color.as_deref(),
    )
    .await?;

    Ok(Json(habit))
}

#[delete("/<id>")]
pub async fn api_delete_habit(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_habit_cascade(db, user.id, id).await?;
    Ok(MessageResponse::new("Habit deleted"))
}

#[get("/logs?<month>")]
pub async fn api_month_logs(
    month: Option<String>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<LogWithHabit>>, AppError> {
    let month = month.ok_or_else(|| AppError::Validation("month query is required".to_string()))?;
    let month = parse_month(&month)?;

    let logs = get_month_logs(db, user.id, &month.prefix()).await?;
    Ok(Json(logs))
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    date: String,
    completed: bool,
}

/// Sets the check-in for one `(habit, day)` slot. Idempotent: the store
/// upserts on `(habit, user, date)` and the last write wins.
///
/// The server deliberately accepts any strictly valid date, not just
/// today; "only today is writable" is enforced by the dashboard UI.
/// That keeps backfill possible across a corrected day boundary and
/// matches the shipped behaviour.
#[post("/<id>/log", data = "<request>")]
pub async fn api_set_check_in(
    id: i64,
    request: Json<CheckInRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LogWithHabit>, AppError> {
    // Ownership first: a foreign habit id reads as absent.
    get_habit(db, user.id, id).await?;

    let day = parse_day(&request.date)?;

    let log = set_check_in(
        db,
        user.id,
        id,
        &day.format("%Y-%m-%d").to_string(),
        request.completed,
    )
    .await?;

    Ok(Json(log))
}

#[get("/stats?<month>")]
pub async fn api_month_stats(
    month: Option<String>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MonthSummary>, AppError> {
    let month = month.ok_or_else(|| AppError::Validation("month query is required".to_string()))?;
    let month = parse_month(&month)?;

    let habits = get_habits(db, user.id).await?;
    let logs = get_month_logs(db, user.id, &month.prefix()).await?;

    Ok(Json(month_summary(month, &habits, &logs)))
}

// ---------------------------------------------------------------------------
// Users

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub habits_count: i64,
    pub logs_count: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub created_at: String,
    pub provider: String,
    pub stats: ProfileStats,
}

#[get("/me")]
pub async fn api_me(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<ProfileResponse>, AppError> {
    let habits_count = count_habits(db, user.id).await?;
    let logs_count = count_logs(db, user.id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        created_at: user.created_at.to_rfc3339(),
        provider: user.provider().to_string(),
        stats: ProfileStats {
            habits_count,
            logs_count,
        },
    }))
}

#[derive(Deserialize)]
pub struct ProfileUpdateRequest {
    name: String,
}

#[patch("/me", data = "<request>")]
pub async fn api_update_me(
    request: Json<ProfileUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<UserData>, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let updated = update_user_name(db, user.id, name).await?;
    Ok(Json(UserData::from(updated)))
}

#[get("/me/export?<format>")]
pub async fn api_export(
    format: Option<String>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<CsvAttachment, AppError> {
    let format = format.unwrap_or_else(|| "csv".to_string()).to_lowercase();
    if format != "csv" {
        return Err(AppError::Validation(
            "Only CSV export is supported for now".to_string(),
        ));
    }

    let logs = get_all_logs(db, user.id).await?;

    Ok(CsvAttachment {
        filename: "habit-progress.csv",
        body: logs_to_csv(&logs),
    })
}

#[delete("/me")]
pub async fn api_delete_me(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_user_cascade(db, user.id).await?;
    Ok(MessageResponse::new("Account and all data deleted"))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

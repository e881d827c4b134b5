use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// The authenticated account. `password` stays in the row struct only;
/// it never leaves the db layer except for bcrypt verification.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    #[serde(skip)]
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// `google` when the account is federated, `local` otherwise.
    pub fn provider(&self) -> &'static str {
        if self.google_id.is_some() {
            "google"
        } else {
            "local"
        }
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub password: Option<String>,
    pub google_id: Option<String>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<DbUser> for User {
    fn from(db: DbUser) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            google_id: db.google_id,
            created_at: DateTime::<Utc>::from_naive_utc_and_offset(db.created_at, Utc),
        }
    }
}

use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

/// Sessions issued at login are opaque 7-day tokens stored server-side.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl From<DbSession> for Session {
    fn from(db: DbSession) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            token: db.token,
            created_at: db.created_at,
            expires_at: db.expires_at,
        }
    }
}

impl Session {
    pub fn generate_token() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn is_valid(&self) -> bool {
        Utc::now().naive_utc() < self.expires_at
    }
}

use std::sync::Arc;

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::api::AuthResponse;
use crate::config::{AppConfig, Profile};
use crate::database::initialize_database;
use crate::email::{DynMailer, LogMailer};
use crate::google::{DynVerifier, GoogleIdentity, StaticVerifier};
use crate::init_rocket;
use crate::models::Habit;

pub const GOOGLE_CREDENTIAL: &str = "test-google-credential";
pub const GOOGLE_EMAIL: &str = "gina@example.com";
pub const STANDARD_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        profile: Profile::Development,
        google_client_id: None,
        smtp: None,
        email_from: "TrackItAll <no-reply@trackitall.test>".to_string(),
        asset_dir: "client/build".to_string(),
    }
}

/// In-memory database pinned to a single connection, so every query in
/// a test sees the same database.
pub async fn create_test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    initialize_database(&pool)
        .await
        .expect("Failed to apply schema");

    pool
}

/// Builds a local client over a fresh in-memory database, with the
/// log-only mailer and a verifier that accepts [`GOOGLE_CREDENTIAL`].
pub async fn setup_test_client() -> (Client, Pool<Sqlite>) {
    let pool = create_test_pool().await;

    let mailer: DynMailer = Arc::new(LogMailer);
    let verifier: DynVerifier = Arc::new(StaticVerifier {
        credential: GOOGLE_CREDENTIAL.to_string(),
        identity: GoogleIdentity {
            google_id: "google-sub-1".to_string(),
            email: GOOGLE_EMAIL.to_string(),
            name: Some("Gina".to_string()),
        },
    });

    let client = Client::tracked(init_rocket(pool.clone(), mailer, verifier, test_config()))
        .await
        .expect("valid rocket instance");

    (client, pool)
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

pub async fn register_test_user(client: &Client, email: &str) -> AuthResponse {
    let response = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(
            json!({
                "email": email,
                "password": STANDARD_PASSWORD
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    serde_json::from_str(&body).unwrap()
}

pub async fn create_test_habit(client: &Client, token: &str, name: &str) -> Habit {
    let response = client
        .post("/habits")
        .header(ContentType::JSON)
        .header(bearer(token))
        .body(json!({ "name": name }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    serde_json::from_str(&body).unwrap()
}

pub async fn check_in(
    client: &Client,
    token: &str,
    habit_id: i64,
    date: &str,
    completed: bool,
) -> Status {
    client
        .post(format!("/habits/{}/log", habit_id))
        .header(ContentType::JSON)
        .header(bearer(token))
        .body(json!({ "date": date, "completed": completed }).to_string())
        .dispatch()
        .await
        .status()
}

#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod calendar;
mod config;
mod database;
mod db;
mod email;
mod error;
mod export;
mod google;
mod models;
mod stats;
mod telemetry;
#[cfg(test)]
mod test;

use std::path::Path;
use std::sync::Arc;

use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use api::{
    api_create_habit, api_delete_habit, api_delete_me, api_export, api_forgot_password,
    api_google_login, api_list_habits, api_login, api_me, api_month_logs, api_month_stats,
    api_register, api_reset_password, api_set_check_in, api_update_habit, api_update_me, health,
};
use auth::unauthorized_api;
use config::{AppConfig, Profile};
use database::initialize_database;
use db::clean_expired_sessions;
use email::{DynMailer, LogMailer, SmtpMailer};
use google::{DisabledVerifier, DynVerifier, HttpVerifier};
use telemetry::TelemetryFairing;

#[launch]
async fn rocket() -> _ {
    telemetry::init_tracing();

    let config = AppConfig::from_env().expect("Failed to read configuration");

    let pool = SqlitePool::connect(&config.database_url)
        .await
        .expect("Failed to connect to SQLite database");

    initialize_database(&pool)
        .await
        .expect("Failed to apply database schema");

    let pool_clone = pool.clone();

    rocket::tokio::spawn(async move {
        rocket::tokio::time::sleep(rocket::tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            rocket::tokio::time::sleep(rocket::tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let mailer: DynMailer = match &config.smtp {
        Some(smtp) => Arc::new(
            SmtpMailer::new(smtp, &config.email_from).expect("Failed to build SMTP transport"),
        ),
        None => Arc::new(LogMailer),
    };

    let verifier: DynVerifier = match &config.google_client_id {
        Some(audience) => Arc::new(HttpVerifier::new(audience.clone())),
        None => Arc::new(DisabledVerifier),
    };

    init_rocket(pool, mailer, verifier, config)
}

pub fn init_rocket(
    pool: SqlitePool,
    mailer: DynMailer,
    verifier: DynVerifier,
    config: AppConfig,
) -> Rocket<Build> {
    info!("Starting habit tracker");

    let figment = rocket::Config::figment().merge(("port", config.port));

    let mut rocket = rocket::custom(figment)
        .manage(pool)
        .manage(mailer)
        .manage(verifier)
        .mount(
            "/auth",
            routes![
                api_register,
                api_login,
                api_google_login,
                api_forgot_password,
                api_reset_password,
            ],
        )
        .mount(
            "/habits",
            routes![
                api_list_habits,
                api_create_habit,
                api_update_habit,
                api_delete_habit,
                api_month_logs,
                api_set_check_in,
                api_month_stats,
            ],
        )
        .mount(
            "/users",
            routes![api_me, api_update_me, api_export, api_delete_me],
        )
        .mount("/", routes![health])
        .register("/", catchers![unauthorized_api])
        .attach(TelemetryFairing);

    if config.profile == Profile::Production {
        if Path::new(&config.asset_dir).is_dir() {
            rocket = rocket.mount("/", FileServer::from(&config.asset_dir).rank(20));
        } else {
            warn!(
                "Asset directory '{}' not found; skipping static file serving",
                config.asset_dir
            );
        }
    }

    rocket
}

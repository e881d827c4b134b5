use std::env;

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub profile: Profile,
    /// OAuth audience for Google sign-in; absent disables the route's
    /// real verifier.
    pub google_client_id: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub email_from: String,
    /// Static asset directory served in production.
    pub asset_dir: String,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Missing .env is fine; real deployments use the environment.
        let _ = dotenvy::dotenv();

        let database_url =
            optional("DATABASE_URL").unwrap_or_else(|| "sqlite://trackitall.db".to_string());

        let port = optional("PORT")
            .map(|p| p.parse::<u16>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("PORT is not a valid port number: {}", e))?
            .unwrap_or(5000);

        let profile = match optional("APP_PROFILE").as_deref() {
            Some("production") => Profile::Production,
            _ => Profile::Development,
        };

        let smtp = match (optional("SMTP_HOST"), optional("SMTP_USER"), optional("SMTP_PASS")) {
            (Some(host), Some(user), Some(pass)) => {
                let smtp_port = optional("SMTP_PORT")
                    .map(|p| p.parse::<u16>())
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("SMTP_PORT is not a valid port: {}", e))?
                    .unwrap_or(587);
                Some(SmtpConfig {
                    host,
                    port: smtp_port,
                    user,
                    pass,
                })
            }
            _ => {
                warn!("SMTP not fully configured; password reset emails will only be logged");
                None
            }
        };

        let google_client_id = optional("GOOGLE_CLIENT_ID");
        if google_client_id.is_none() {
            warn!("GOOGLE_CLIENT_ID not set; Google sign-in is disabled");
        }

        let email_from = optional("EMAIL_FROM")
            .unwrap_or_else(|| "TrackItAll <no-reply@trackitall.app>".to_string());

        let asset_dir = optional("ASSET_DIR").unwrap_or_else(|| "client/build".to_string());

        Ok(Self {
            database_url,
            port,
            profile,
            google_client_id,
            smtp,
            email_from,
            asset_dir,
        })
    }
}

//! Google sign-in. Federated identity is an external collaborator:
//! handlers verify the posted credential through `IdTokenVerifier` and
//! only ever see the resulting identity.

use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
}

#[rocket::async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError>;
}

pub type DynVerifier = Arc<dyn IdTokenVerifier>;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: String,
    name: Option<String>,
}

/// Verifies id tokens against Google's tokeninfo endpoint and checks
/// the audience matches our client id. Google rejects expired or
/// malformed tokens with a non-200.
pub struct HttpVerifier {
    client: reqwest::Client,
    audience: String,
}

impl HttpVerifier {
    pub fn new(audience: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            audience,
        }
    }
}

#[rocket::async_trait]
impl IdTokenVerifier for HttpVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError> {
        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Token verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(
                "Invalid Google credential".to_string(),
            ));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Bad tokeninfo response: {}", e)))?;

        if info.aud != self.audience {
            return Err(AppError::Unauthorized(
                "Google credential issued for a different application".to_string(),
            ));
        }

        Ok(GoogleIdentity {
            google_id: info.sub,
            email: info.email,
            name: info.name,
        })
    }
}

/// Stands in when no OAuth audience is configured.
pub struct DisabledVerifier;

#[rocket::async_trait]
impl IdTokenVerifier for DisabledVerifier {
    async fn verify(&self, _credential: &str) -> Result<GoogleIdentity, AppError> {
        Err(AppError::Unauthorized(
            "Google sign-in is not configured".to_string(),
        ))
    }
}

/// Test verifier: accepts exactly one known credential string.
pub struct StaticVerifier {
    pub credential: String,
    pub identity: GoogleIdentity,
}

#[rocket::async_trait]
impl IdTokenVerifier for StaticVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleIdentity, AppError> {
        if credential == self.credential {
            Ok(self.identity.clone())
        } else {
            Err(AppError::Unauthorized(
                "Invalid Google credential".to_string(),
            ))
        }
    }
}

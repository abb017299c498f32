//! Google OAuth access tokens for service accounts.
//!
//! Implements the JWT bearer grant: a service-account key file signs a short
//! lived RS256 assertion which the token endpoint exchanges for an access
//! token. Used for the Firebase Cloud Messaging API; it has no interaction
//! with object storage.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Scope for sending push notifications through FCM.
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
/// Scope for reading the account email.
pub const USERINFO_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";
/// Scope for reading the account profile.
pub const USERINFO_PROFILE_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.profile";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while obtaining an access token.
#[derive(Debug, Error)]
pub enum GoogleAuthError {
    /// The credentials file could not be read.
    #[error("failed to read credentials file: {0}")]
    ReadCredentials(String),

    /// The credentials file is not a usable service-account key.
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// The JWT assertion could not be signed.
    #[error("failed to sign token assertion: {0}")]
    Signing(String),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Request(String),

    /// The token endpoint refused the assertion.
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// The fields of a service-account JSON key this loader needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email, used as the assertion issuer.
    pub client_email: String,
    /// PEM encoded RSA private key.
    pub private_key: String,
    /// Identifier of the private key, sent as the JWT `kid`.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[hidden]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parses a service-account key from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if required fields are missing.
    pub fn from_json(json: &str) -> Result<Self, GoogleAuthError> {
        serde_json::from_str(json).map_err(|e| GoogleAuthError::InvalidCredentials(e.to_string()))
    }

    /// Reads and parses a service-account key file.
    ///
    /// # Errors
    ///
    /// Returns `ReadCredentials` if the file cannot be read and
    /// `InvalidCredentials` if it cannot be parsed.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GoogleAuthError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GoogleAuthError::ReadCredentials(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

/// Claims of the JWT bearer assertion.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges service-account keys for OAuth access tokens.
#[derive(Debug, Clone)]
pub struct GoogleTokenLoader {
    http: reqwest::Client,
    scopes: Vec<String>,
}

impl GoogleTokenLoader {
    /// Creates a loader requesting the Firebase messaging and userinfo scopes.
    ///
    /// # Errors
    ///
    /// Returns `Request` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, GoogleAuthError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| GoogleAuthError::Request(e.to_string()))?;

        Ok(Self {
            http,
            scopes: vec![
                FIREBASE_MESSAGING_SCOPE.to_string(),
                USERINFO_EMAIL_SCOPE.to_string(),
                USERINFO_PROFILE_SCOPE.to_string(),
            ],
        })
    }

    /// Replaces the requested scopes.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the key file at `credentials_path` and returns a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or invalid, signing fails,
    /// or the token endpoint does not issue a token.
    pub async fn load_access_token(
        &self,
        credentials_path: impl AsRef<Path>,
    ) -> Result<String, GoogleAuthError> {
        let key = ServiceAccountKey::from_file(credentials_path).await?;
        self.exchange(&key).await
    }

    /// Exchanges a signed assertion for `key` at its token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the token endpoint does not
    /// issue a token.
    pub async fn exchange(&self, key: &ServiceAccountKey) -> Result<String, GoogleAuthError> {
        let assertion = self.build_assertion(key, Utc::now())?;

        debug!(
            client_email = %key.client_email,
            token_uri = %key.token_uri,
            "Requesting access token"
        );

        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| GoogleAuthError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                GoogleAuthError::Request(format!(
                    "token endpoint returned {status} with an unreadable body: {e}"
                ))
            })?;
            return Err(GoogleAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Request(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Signs the RS256 assertion for `key`, issued at `now`.
    fn build_assertion(
        &self,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<String, GoogleAuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| GoogleAuthError::InvalidCredentials(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&key.private_key_id);

        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &encoding_key).map_err(|e| GoogleAuthError::Signing(e.to_string()))
    }
}

//! Client for the hosted authentication provider's sign-up endpoint.
//!
//! The provider speaks the GoTrue REST dialect: `POST /auth/v1/signup` with an
//! `apikey` header and a JSON `{email, password}` body. Successful calls
//! return a user object (top-level or under `user`); rejections carry their
//! text in `message`, `msg`, `error_description` or `error` depending on the
//! provider version.

use crate::APP_USER_AGENT;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info_span, instrument, Instrument};
use url::Url;

/// Credentials submitted when none are given on the command line.
pub const DEFAULT_EMAIL: &str = "test@example.com";
pub const DEFAULT_PASSWORD: &str = "password123";

pub const SIGNUP_SUCCESS_MESSAGE: &str =
    "Inscription réussie ! Vérifiez votre email pour confirmer votre compte.";
pub const ERROR_LABEL: &str = "Erreur : ";

const SIGNUP_PATH: &str = "auth/v1/signup";

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("{0}")]
    Transport(reqwest::Error),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct AuthProvider {
    signup_url: Url,
    api_key: SecretString,
    client: Client,
}

impl AuthProvider {
    /// Build a client for the provider at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, SignupError> {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let signup_url = Url::parse(&base)?.join(SIGNUP_PATH)?;

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(SignupError::Client)?;

        Ok(Self {
            signup_url,
            api_key,
            client,
        })
    }

    #[must_use]
    pub const fn signup_url(&self) -> &Url {
        &self.signup_url
    }

    /// Submit a sign-up request.
    ///
    /// # Errors
    /// Returns [`SignupError::Rejected`] with the provider's message when the
    /// call is refused, or a transport error when the provider is unreachable.
    #[instrument(skip(self, password), fields(url = %self.signup_url))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, SignupError> {
        let span = info_span!("http.client", http.method = "POST");
        let response = self
            .client
            .post(self.signup_url.clone())
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
            .json(&SignupRequest { email, password })
            .send()
            .instrument(span)
            .await
            .map_err(SignupError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(SignupError::Transport)?;
        let json: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = json
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            error!("Sign-up rejected: {} - {}", status, message);
            return Err(SignupError::Rejected { status, message });
        }

        let json = json.ok_or_else(|| SignupError::InvalidResponse(body.clone()))?;
        let user = json.get("user").filter(|u| u.is_object()).unwrap_or(&json);
        let user: ProviderUser = serde_json::from_value(user.clone())
            .map_err(|e| SignupError::InvalidResponse(e.to_string()))?;

        debug!("Sign-up accepted for {:?}", user.email);

        Ok(user)
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Text shown to the user for a sign-up outcome.
#[must_use]
pub fn outcome_message(result: &Result<ProviderUser, SignupError>) -> String {
    match result {
        Ok(_) => SIGNUP_SUCCESS_MESSAGE.to_string(),
        Err(err) => format!("{ERROR_LABEL}{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(base_url: &str) -> Result<AuthProvider, SignupError> {
        AuthProvider::new(base_url, SecretString::from("public-anon-key"))
    }

    #[test]
    fn signup_url_joins_path() {
        let with_slash = provider("https://project.example.co/")
            .map(|p| p.signup_url().to_string())
            .ok();
        let without_slash = provider("https://project.example.co")
            .map(|p| p.signup_url().to_string())
            .ok();
        let expected = Some("https://project.example.co/auth/v1/signup".to_string());
        assert_eq!(with_slash, expected);
        assert_eq!(without_slash, expected);
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            provider("not a url"),
            Err(SignupError::InvalidUrl(_))
        ));
    }

    #[test]
    fn error_message_prefers_message_field() {
        let body = json!({"msg": "short", "message": "long"});
        assert_eq!(error_message(&body), Some("long".to_string()));
        let body = json!({"error": "invalid_grant", "error_description": "bad"});
        assert_eq!(error_message(&body), Some("bad".to_string()));
        assert_eq!(error_message(&json!({"code": 400})), None);
    }

    #[tokio::test]
    async fn successful_signup_shows_success_message() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/signup")
                    .header("apikey", "public-anon-key")
                    .header("authorization", "Bearer public-anon-key")
                    .json_body(json!({"email": DEFAULT_EMAIL, "password": DEFAULT_PASSWORD}));
                then.status(200)
                    .json_body(json!({"id": "f3b1c2", "email": DEFAULT_EMAIL}));
            })
            .await;

        let result = provider(&server.base_url())?
            .sign_up(DEFAULT_EMAIL, DEFAULT_PASSWORD)
            .await;
        mock.assert_async().await;

        assert_eq!(
            result.as_ref().ok(),
            Some(&ProviderUser {
                id: Some("f3b1c2".to_string()),
                email: Some(DEFAULT_EMAIL.to_string()),
            })
        );
        assert_eq!(outcome_message(&result), SIGNUP_SUCCESS_MESSAGE);
        Ok(())
    }

    #[tokio::test]
    async fn nested_user_object_is_accepted() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(200)
                    .json_body(json!({"user": {"id": "u1", "email": "a@b.co"}, "session": null}));
            })
            .await;

        let user = provider(&server.base_url())?
            .sign_up("a@b.co", "password123")
            .await?;
        assert_eq!(user.id.as_deref(), Some("u1"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_signup_shows_provider_error() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(400)
                    .json_body(json!({"code": 400, "msg": "User already registered"}));
            })
            .await;

        let result = provider(&server.base_url())?
            .sign_up(DEFAULT_EMAIL, DEFAULT_PASSWORD)
            .await;

        assert!(matches!(
            result,
            Err(SignupError::Rejected { status, .. }) if status == StatusCode::BAD_REQUEST
        ));
        assert_eq!(
            outcome_message(&result),
            "Erreur : User already registered"
        );
        Ok(())
    }

    #[tokio::test]
    async fn rejection_without_body_uses_status() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/v1/signup");
                then.status(503).body("upstream down");
            })
            .await;

        let result = provider(&server.base_url())?
            .sign_up(DEFAULT_EMAIL, DEFAULT_PASSWORD)
            .await;
        assert_eq!(outcome_message(&result), "Erreur : HTTP 503");
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() -> anyhow::Result<()> {
        // Port 9 (discard) is closed on test hosts.
        let result = provider("http://127.0.0.1:9")?
            .sign_up(DEFAULT_EMAIL, DEFAULT_PASSWORD)
            .await;
        assert!(matches!(result, Err(SignupError::Transport(_))));
        assert!(outcome_message(&result).starts_with(ERROR_LABEL));
        Ok(())
    }
}

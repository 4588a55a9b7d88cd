//! Authenticated session lifecycle.
//!
//! A [`Session`] is constructed once at startup and passed to every consumer;
//! it is the single source of truth for the token, the user profile, and the
//! history store. The token itself lives in the durable [`TokenStore`] so it
//! survives restarts.

mod token;

pub use token::TokenStore;

use reqwest::{Method, StatusCode};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::models::{ErrorBody, LoginRequest, Profile, SignupRequest, TokenResponse};

/// Signup form fields, validated client-side before any network I/O.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: Option<String>,
    pub role: Option<String>,
}

impl SignupForm {
    /// Precondition check: all required fields present, passwords matching.
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.first_name,
            &self.last_name,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::validation("All required fields must be filled."));
        }
        if self.password != self.confirm_password {
            return Err(Error::validation("Passwords do not match."));
        }
        Ok(())
    }

    fn to_request(&self) -> SignupRequest {
        SignupRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            organization: self.organization.clone().unwrap_or_default(),
            role: self.role.clone().unwrap_or_default(),
        }
    }
}

/// Map a failed login call to an [`Error::Auth`], preferring the
/// server-supplied message and falling back to a generic one.
fn login_failure(error: Error) -> Error {
    match error {
        Error::Api { message, .. } if !message.is_empty() => Error::Auth(message),
        Error::Api { .. } | Error::Transport(_) => Error::Auth("Login failed".to_string()),
        other => other,
    }
}

/// Application-wide session state.
pub struct Session {
    client: ApiClient,
    profile: Option<Profile>,
    history: HistoryStore,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            profile: None,
            history: HistoryStore::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Profile of the authenticated user, once fetched.
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// True when a durable token is present.
    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().current().is_some()
    }

    /// Log in, store the token durably, then refresh profile and history.
    ///
    /// The token write is sequenced before the refresh calls, so both carry
    /// the new Authorization header. Refresh failures are logged and do not
    /// fail the login.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::validation(
                "Please enter both username and password.",
            ));
        }

        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: TokenResponse = self
            .client
            .post_json("/api/login/", &payload)
            .await
            .map_err(login_failure)?;
        if response.token.is_empty() {
            return Err(Error::Auth("Login failed".to_string()));
        }

        self.client.tokens().save(&response.token)?;
        info!(username, "logged in");

        if let Err(e) = self.fetch_profile().await {
            warn!("profile refresh after login failed: {}", e);
        }
        if let Err(e) = self.fetch_history().await {
            warn!("history refresh after login failed: {}", e);
        }
        Ok(())
    }

    /// Create a new account. Succeeds only on a 201 from the server; the
    /// returned token is surfaced but not stored (the user logs in next).
    pub async fn signup(&self, form: &SignupForm) -> Result<TokenResponse> {
        form.validate()?;

        let response = self
            .client
            .request(Method::POST, "/api/signup/")?
            .json(&form.to_request())
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_default();
        if message.is_empty() {
            Err(Error::Auth("Signup failed".to_string()))
        } else {
            Err(Error::Auth(message))
        }
    }

    /// Clear the durable token and drop in-memory session state.
    pub fn logout(&mut self) -> Result<()> {
        self.client.tokens().clear()?;
        self.profile = None;
        self.history.clear();
        info!("logged out");
        Ok(())
    }

    /// Authenticated profile fetch. On failure the prior profile is kept.
    pub async fn fetch_profile(&mut self) -> Result<&Profile> {
        match self.client.get_json::<Profile>("/api/user-info/").await {
            Ok(profile) => Ok(&*self.profile.insert(profile)),
            Err(e) => {
                warn!("profile fetch failed: {}", e);
                Err(e)
            }
        }
    }

    /// Authenticated history fetch. On failure prior records are kept.
    pub async fn fetch_history(&mut self) -> Result<()> {
        self.history.refresh(&self.client).await
    }
}

//! HTTP dispatch for the PolicyIntel API.
//!
//! All outbound calls funnel through [`ApiClient::request`], which consults
//! the durable token store and sets `Authorization: Token <value>` when a
//! token exists. Requests are built fresh every time, so a cleared token can
//! never leak through a stale header.

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::ErrorBody;
use crate::session::TokenStore;

/// Client for the PolicyIntel backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    /// Build a client from settings. Every request carries the configured
    /// timeout; a hung call fails instead of parking forever.
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        let base_url = Url::parse(&settings.base_url)?;
        Ok(Self {
            http,
            base_url,
            tokens: TokenStore::new(settings.token_path()),
        })
    }

    /// The durable token store backing this client.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Build a request against an API path, attaching the auth header when a
    /// token is stored.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.tokens.current() {
            builder = builder.header(AUTHORIZATION, format!("Token {}", token));
        }
        Ok(builder)
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path)?.send().await?;
        Self::decode(response).await
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.request(Method::POST, path)?.json(body).send().await?;
        Self::decode(response).await
    }

    /// POST a multipart form, returning the raw response for status-sensitive
    /// callers.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response> {
        let response = self
            .request(Method::POST, path)?
            .multipart(form)
            .send()
            .await?;
        Ok(response)
    }

    /// Decode a response, mapping non-success statuses to [`Error::Api`] with
    /// the server-supplied `error` message when one is present.
    pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_default();
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

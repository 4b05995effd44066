//! HTTP client for the exchange's private and public REST endpoints.
//!
//! Private endpoints take a millisecond timestamp and an HMAC signature over
//! the query string; public endpoints take neither. Both paths share one
//! request shape, including the API key header, which public endpoints ignore.

use std::borrow::Cow;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::signing;
use crate::{Clock, SystemClock};

pub const EXCHANGE_API_BASE: &str = "https://api.binance.com";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Error body the exchange returns for rejected requests.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

pub struct ExchangeClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl ExchangeClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            base_url: EXCHANGE_API_BASE.to_string(),
            credentials,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Points the client at a different base URL (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the clock used for request timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Issues a signed GET to a private endpoint and decodes the response.
    ///
    /// The query string is serialized once, signed with the account secret,
    /// and sent unchanged with the signature appended as the last parameter.
    pub async fn signed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &'static str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<T> {
        params.push(("timestamp", self.clock.timestamp_millis().to_string()));
        let query = encode_query(&params);
        let signature = signing::sign(self.credentials.api_secret(), &query);
        let url = format!(
            "{}{}?{query}&signature={signature}",
            self.base_url,
            normalize_path(path)
        );
        self.get(&url, context).await
    }

    /// Issues an unsigned GET to a public endpoint and decodes the response.
    pub async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T> {
        let query = encode_query(&params);
        let url = format!("{}{}?{query}", self.base_url, normalize_path(path));
        self.get(&url, context).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, context: &'static str) -> Result<T> {
        debug!(context, "requesting exchange endpoint");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.credentials.api_key())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        decode_response(context, status, &body)
    }
}

/// Decodes a response body into its expected schema.
///
/// A body that does not match the schema but does match the exchange's error
/// shape surfaces as [`Error::Exchange`], whatever the HTTP status; anything
/// else fails fast as a decode or unexpected-response error instead of
/// crashing later on a missing field.
pub(crate) fn decode_response<T: DeserializeOwned>(
    context: &'static str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(source) => {
            if let Ok(error) = serde_json::from_str::<ApiErrorBody>(body) {
                return Err(Error::Exchange {
                    code: error.code,
                    msg: error.msg,
                });
            }
            if !status.is_success() {
                return Err(Error::UnexpectedResponse {
                    context,
                    status,
                    body: body.chars().take(200).collect(),
                });
            }
            Err(Error::Decode { context, source })
        }
    }
}

fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

fn encode_query(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

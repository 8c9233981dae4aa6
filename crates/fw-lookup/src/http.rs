//! Shared HTTP plumbing for the geo providers.

use crate::error::{LookupError, LookupResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent with every provider request. Some of the free geo
/// endpoints reject clients without a browser-style agent string.
const USER_AGENT: &str = "Mozilla/5.0";

/// Builds the client shared by all providers in one chain.
pub fn build_client(timeout: Duration) -> LookupResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| LookupError::ConfigError(e.to_string()))
}

/// Issues a GET and deserializes the JSON body.
///
/// Transport failures are split into timeout / connection / request so the
/// retry policy can distinguish them; an unparseable body is reported with
/// a truncated excerpt for the logs.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> LookupResult<T> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            LookupError::Timeout(e.to_string())
        } else if e.is_connect() {
            LookupError::ConnectionFailed(e.to_string())
        } else {
            LookupError::RequestFailed(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::RequestFailed(format!("status {status}")));
    }

    let text = response
        .text()
        .await
        .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

    serde_json::from_str(&text).map_err(|e| {
        LookupError::InvalidResponse(format!(
            "{} - body: {}",
            e,
            text.chars().take(200).collect::<String>()
        ))
    })
}

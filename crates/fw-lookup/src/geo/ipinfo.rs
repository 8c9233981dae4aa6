//! ipinfo.io provider, the primary country source.

use crate::error::LookupResult;
use crate::geo::GeoProvider;
use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://ipinfo.io";

/// ipinfo.io lookup. Accepts an optional access token; without one the
/// anonymous quota applies and exhaustion simply degrades to the fallbacks.
pub struct Ipinfo {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    country: Option<String>,
}

impl Ipinfo {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            token,
        }
    }

    fn url_for(&self, address: &str) -> String {
        match &self.token {
            Some(token) => format!("{}/{}/json?token={}", self.base_url, address, token),
            None => format!("{}/{}/json", self.base_url, address),
        }
    }
}

#[async_trait]
impl GeoProvider for Ipinfo {
    fn name(&self) -> &str {
        "ipinfo"
    }

    async fn lookup_country(&self, address: &str) -> LookupResult<Option<String>> {
        let url = self.url_for(address);
        let response: IpinfoResponse = http::get_json(&self.client, &url).await?;
        Ok(response.country)
    }
}

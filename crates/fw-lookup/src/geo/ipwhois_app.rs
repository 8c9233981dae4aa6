//! ipwhois.app provider.

use crate::error::LookupResult;
use crate::geo::GeoProvider;
use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://ipwhois.app";

/// ipwhois.app lookup; the country lives in `country_code`.
pub struct IpwhoisApp {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpwhoisAppResponse {
    country_code: Option<String>,
}

impl IpwhoisApp {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpwhoisApp {
    fn name(&self) -> &str {
        "ipwhois.app"
    }

    async fn lookup_country(&self, address: &str) -> LookupResult<Option<String>> {
        let url = format!("{}/json/{}", self.base_url, address);
        let response: IpwhoisAppResponse = http::get_json(&self.client, &url).await?;
        Ok(response.country_code)
    }
}

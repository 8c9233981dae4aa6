//! ipapi.co provider.

use crate::error::LookupResult;
use crate::geo::GeoProvider;
use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://ipapi.co";

/// ipapi.co lookup; returns the ISO-2 `country` field.
pub struct IpapiCo {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    country: Option<String>,
}

impl IpapiCo {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpapiCo {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    async fn lookup_country(&self, address: &str) -> LookupResult<Option<String>> {
        let url = format!("{}/{}/json/", self.base_url, address);
        let response: IpapiCoResponse = http::get_json(&self.client, &url).await?;
        Ok(response.country)
    }
}

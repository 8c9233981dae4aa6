//! ip-api.com provider, the last fallback in the chain.

use crate::error::LookupResult;
use crate::geo::GeoProvider;
use crate::http;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "http://ip-api.com";

/// ip-api.com lookup. The endpoint reports errors in-band: a 200 response
/// with `status != "success"` carries no usable country.
pub struct IpApiCom {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiComResponse {
    status: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

impl IpApiComResponse {
    fn into_country(self) -> Option<String> {
        if self.status.as_deref() == Some("success") {
            self.country_code
        } else {
            None
        }
    }
}

impl IpApiCom {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiCom {
    fn name(&self) -> &str {
        "ip-api.com"
    }

    async fn lookup_country(&self, address: &str) -> LookupResult<Option<String>> {
        let url = format!(
            "{}/json/{}?fields=status,countryCode",
            self.base_url, address
        );
        let response: IpApiComResponse = http::get_json(&self.client, &url).await?;
        Ok(response.into_country())
    }
}

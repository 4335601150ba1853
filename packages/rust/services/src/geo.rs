//! Domain geolocation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use startupscout_shared::urls::extract_domain;
use startupscout_shared::{GeolocationConfig, HttpConfig, Result, ScoutError, UNKNOWN_COUNTRY};
use tracing::debug;

/// Raw answer from the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoLookup {
    /// `"success"` or `"fail"`.
    pub status: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl GeoLookup {
    /// Country name when the lookup succeeded with a non-empty country.
    pub fn country(&self) -> Option<&str> {
        match (&self.status[..], self.country.as_deref()) {
            ("success", Some(c)) if !c.trim().is_empty() => Some(c.trim()),
            _ => None,
        }
    }
}

/// Resolve a bare domain to a country.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<GeoLookup>;
}

/// Country for a startup URL, or `"Unknown"` on any failure.
pub async fn country_for_url(geolocator: &dyn Geolocator, url: &str) -> String {
    let domain = extract_domain(url);
    if domain.is_empty() {
        return UNKNOWN_COUNTRY.to_string();
    }

    match geolocator.lookup(&domain).await {
        Ok(lookup) => match lookup.country() {
            Some(country) => country.to_string(),
            None => {
                debug!(%domain, status = %lookup.status, "geolocation returned no country");
                UNKNOWN_COUNTRY.to_string()
            }
        },
        Err(e) => {
            debug!(%domain, error = %e, "geolocation failed");
            UNKNOWN_COUNTRY.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// IpApiClient
// ---------------------------------------------------------------------------

/// `ip-api.com` JSON endpoint client (free tier, 45 requests/minute).
pub struct IpApiClient {
    client: Client,
    endpoint: String,
}

impl IpApiClient {
    pub fn new(geo: &GeolocationConfig, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.as_str())
            .timeout(Duration::from_millis(http.timeout_ms))
            .build()
            .map_err(|e| ScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: geo.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Geolocator for IpApiClient {
    async fn lookup(&self, domain: &str) -> Result<GeoLookup> {
        let url = format!("{}{domain}", self.endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,country")])
            .send()
            .await
            .map_err(|e| ScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::http(url, status.as_u16()));
        }

        response
            .json::<GeoLookup>()
            .await
            .map_err(|e| ScoutError::parse(format!("{url}: invalid geolocation response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> IpApiClient {
        let geo = GeolocationConfig {
            endpoint: format!("{}/json/", server.uri()),
        };
        IpApiClient::new(&geo, &HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn lookup_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/acme.io"))
            .and(query_param("fields", "status,country"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "success", "country": "France"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            country_for_url(&client, "https://www.acme.io/about").await,
            "France"
        );
    }

    #[tokio::test]
    async fn failed_status_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(path("/json/nowhere.zz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "fail"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let lookup = client.lookup("nowhere.zz").await.unwrap();
        assert_eq!(lookup.country(), None);
        assert_eq!(country_for_url(&client, "https://nowhere.zz").await, "Unknown");
    }

    #[tokio::test]
    async fn http_error_and_garbage_are_unknown() {
        let server = MockServer::start().await;
        Mock::given(path("/json/limited.io"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/json/garbage.io"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(matches!(
            client.lookup("limited.io").await,
            Err(ScoutError::Http { status: 429, .. })
        ));
        assert_eq!(country_for_url(&client, "https://limited.io").await, "Unknown");
        assert_eq!(country_for_url(&client, "https://garbage.io").await, "Unknown");
    }

    #[tokio::test]
    async fn url_without_scheme_is_unknown() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        assert_eq!(country_for_url(&client, "acme.io").await, "Unknown");
    }
}

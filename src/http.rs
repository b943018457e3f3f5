//! Fault-tolerant HTTP access shared by every external provider
//!
//! Each request carries a connect and a read timeout and is retried on transient
//! failures. Callers either get a parsed body or a structured error; the soft
//! variants collapse that error to `None` after logging it.

use std::time::{Duration, Instant};

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::{DayTripError, Result};

/// Timeouts and retry budget for a [`ProviderClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl From<&HttpConfig> for ClientSettings {
    fn from(config: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            read_timeout: Duration::from_secs(config.read_timeout_seconds),
            max_retries: config.max_retries,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// HTTP client bound to one named provider
#[derive(Clone)]
pub struct ProviderClient {
    client: ClientWithMiddleware,
    provider: &'static str,
}

impl ProviderClient {
    pub fn new(provider: &'static str, settings: &ClientSettings) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| DayTripError::config(format!("Failed to build HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, provider })
    }

    /// Same connection pool under another provider name
    #[must_use]
    pub fn named(&self, provider: &'static str) -> Self {
        Self {
            client: self.client.clone(),
            provider,
        }
    }

    /// GET a JSON document, reporting failures as `ProviderUnavailable`
    pub async fn try_get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let request = with_headers(self.client.get(url), headers);
        self.execute(request, url).await
    }

    /// POST a JSON body and parse a JSON answer
    pub async fn try_post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        let payload = serde_json::to_vec(body).map_err(|e| {
            DayTripError::provider(self.provider, format!("Failed to encode request: {e}"))
        })?;
        let request = with_headers(self.client.post(url), headers)
            .header("Content-Type", "application/json")
            .body(payload);
        self.execute(request, url).await
    }

    /// GET a JSON document; any failure is logged and becomes `None`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Option<T> {
        match self.try_get_json(url, headers).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let endpoint = redact(url);
        let start = Instant::now();
        debug!(provider = self.provider, %endpoint, "Sending request");

        let response = request.send().await.map_err(|e| {
            DayTripError::provider(
                self.provider,
                format!("Request to {endpoint} failed: {}", send_error_text(e, url)),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DayTripError::provider(
                self.provider,
                format!("{endpoint} answered HTTP {status}"),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            DayTripError::provider(
                self.provider,
                format!("Failed to read body from {endpoint}: {}", e.without_url()),
            )
        })?;

        let elapsed = start.elapsed();
        debug!(
            provider = self.provider,
            %endpoint,
            "Response received in {:.3}s",
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!(
                provider = self.provider,
                "Slow API response detected: {:.3}s",
                elapsed.as_secs_f64()
            );
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            DayTripError::provider(
                self.provider,
                format!("Unexpected response schema from {endpoint}: {e}"),
            )
        })
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request
}

/// Drop the query string from log labels
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Describe a failed send without the request URL or its query
fn send_error_text(error: reqwest_middleware::Error, url: &str) -> String {
    let text = match error {
        reqwest_middleware::Error::Reqwest(e) => e.without_url().to_string(),
        reqwest_middleware::Error::Middleware(e) => format!("{e:#}"),
    };
    match url.split_once('?') {
        Some((_, query)) if !query.is_empty() => text.replace(query, "<redacted>"),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        message: String,
    }

    fn client() -> ProviderClient {
        let settings = ClientSettings {
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_millis(300),
            max_retries: 0,
            user_agent: "daytrip-test".to_string(),
        };
        ProviderClient::new("test", &settings).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_success_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hello"))
            .and(header("Authorization", "KakaoAK secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "hi"})),
            )
            .mount(&server)
            .await;

        let greeting: Option<Greeting> = client()
            .get_json(
                &format!("{}/hello", server.uri()),
                &[("Authorization", "KakaoAK secret")],
            )
            .await;
        assert_eq!(
            greeting,
            Some(Greeting {
                message: "hi".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/broken", server.uri());
        let greeting: Option<Greeting> = client().get_json(&url, &[]).await;
        assert!(greeting.is_none());

        let err = client().try_get_json::<Greeting>(&url, &[]).await.unwrap_err();
        assert!(matches!(err, DayTripError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_schema_violation_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"unexpected": 1})),
            )
            .mount(&server)
            .await;

        let greeting: Option<Greeting> = client()
            .get_json(&format!("{}/odd", server.uri()), &[])
            .await;
        assert!(greeting.is_none());
    }

    #[tokio::test]
    async fn test_read_timeout_is_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let greeting: Option<Greeting> = client()
            .get_json(&format!("{}/slow", server.uri()), &[])
            .await;
        assert!(greeting.is_none());
    }

    #[tokio::test]
    async fn test_post_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("Content-Type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
            )
            .mount(&server)
            .await;

        let greeting: Greeting = client()
            .try_post_json(
                &format!("{}/echo", server.uri()),
                &[],
                &serde_json::json!({"ping": true}),
            )
            .await
            .unwrap();
        assert_eq!(greeting.message, "ok");
    }

    #[test]
    fn test_redact_strips_query() {
        assert_eq!(
            redact("https://api.odsay.com/v1/api/searchPubTransPathT?apiKey=secret"),
            "https://api.odsay.com/v1/api/searchPubTransPathT"
        );
    }

    #[tokio::test]
    async fn test_connection_error_hides_query() {
        let url = "http://127.0.0.1:1/searchPubTransPathT?apiKey=SECRETKEY&SX=1";
        let err = client().try_get_json::<Greeting>(url, &[]).await.unwrap_err();

        assert!(matches!(err, DayTripError::ProviderUnavailable { .. }));
        let text = err.to_string();
        assert!(!text.contains("SECRETKEY"), "{text}");
        assert!(!text.contains("apiKey="), "{text}");
        assert!(text.contains("/searchPubTransPathT"), "{text}");
    }

    #[tokio::test]
    async fn test_timeout_error_hides_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = format!("{}/slow?apiKey=SECRETKEY", server.uri());
        let err = client().try_get_json::<Greeting>(&url, &[]).await.unwrap_err();
        assert!(!err.to_string().contains("SECRETKEY"));
    }
}

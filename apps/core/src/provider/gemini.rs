use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::AppError;
use crate::provider::error::ProviderError;
use crate::provider::traits::GenerativeProvider;

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    api_key: String,
    model_name: String,
    base_url: Url,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

impl GeminiProvider {
    /// Builds the adapter. The request timeout is the adapter's own; the
    /// response engine never imposes one.
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured.into());
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            api_key: config.api_key.clone(),
            model_name: config.model.clone(),
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model_name
        )
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model_name, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                ProviderError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error: {} - {}", status, body);
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            ProviderError::Malformed(e.to_string())
        })?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        debug!(reply_len = text.len(), "Gemini reply received");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, timeout: Duration) -> GeminiProvider {
        let config = ProviderConfig {
            api_key: "test-key".to_string(),
            model: "gemini-pro".to_string(),
            base_url: Url::parse(&server.uri()).unwrap(),
            timeout,
        };
        GeminiProvider::new(&config).unwrap()
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let config = ProviderConfig {
            api_key: "  ".to_string(),
            model: "gemini-pro".to_string(),
            base_url: Url::parse("http://localhost").unwrap(),
            timeout: Duration::from_secs(1),
        };
        let err = GeminiProvider::new(&config).err().unwrap();
        assert!(matches!(err, AppError::Provider(ProviderError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_generate_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hi there, how can I help?"}]}}]
            })))
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_secs(5));

        // 2. Act
        let result = provider.generate("Hello").await;

        // 3. Assert
        assert_eq!(result.unwrap(), "Hi there, how can I help?");
    }

    #[tokio::test]
    async fn test_generate_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_secs(5));

        let result = provider.generate("Hello").await;

        match result {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("Expected ProviderError::Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_quota_exhausted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_secs(5));

        let err = provider.generate("Hello").await.unwrap_err();
        assert!(err.is_quota());
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_secs(5));

        assert_eq!(
            provider.generate("Hello").await.unwrap_err(),
            ProviderError::EmptyResponse
        );
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_secs(5));

        assert!(matches!(
            provider.generate("Hello").await,
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({
                        "candidates": [{"content": {"parts": [{"text": "late"}]}}]
                    })),
            )
            .mount(&mock_server)
            .await;
        let provider = provider_for(&mock_server, Duration::from_millis(50));

        assert!(matches!(
            provider.generate("Hello").await,
            Err(ProviderError::Timeout(_))
        ));
    }
}

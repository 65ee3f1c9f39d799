//! Client for the text-classification inference service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::TextClassifier;
use crate::core::error::ClassifierError;
use crate::core::model::{LabelConfidence, TextClassification, TextLabel};

pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:5000/analyze";

#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    /// Endpoint accepting `{"text": ...}` posts.
    pub url: String,
    pub timeout: std::time::Duration,
}

impl Default for HttpClassifierConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CLASSIFIER_URL.to_string(),
            timeout: std::time::Duration::from_secs(30),
        }
    }
}

impl HttpClassifierConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpTextClassifier {
    client: reqwest::Client,
    config: HttpClassifierConfig,
}

impl HttpTextClassifier {
    pub fn new(config: HttpClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(HttpClassifierConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    text: String,
    prediction: Option<TextLabel>,
    confidence: Option<LabelConfidence>,
    error: Option<String>,
}

#[async_trait]
impl TextClassifier for HttpTextClassifier {
    async fn classify(&self, text: &str) -> Result<TextClassification, ClassifierError> {
        if text.trim().is_empty() {
            return Ok(TextClassification::non_ad(""));
        }

        let response = self
            .client
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ClassifierError::Status { status, body });
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ClassifierError::Parse(error));
        }
        let (Some(predicted_label), Some(confidence)) = (body.prediction, body.confidence) else {
            return Err(ClassifierError::Parse("missing prediction or confidence".to_string()));
        };

        debug!(?predicted_label, ad = confidence.ad, "classified fragment");
        Ok(TextClassification {
            text: if body.text.is_empty() { text.to_string() } else { body.text },
            predicted_label,
            confidence,
            region_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn classifier(server: &MockServer) -> HttpTextClassifier {
        HttpTextClassifier::from_url(format!("{}/analyze", server.uri()))
    }

    #[tokio::test]
    async fn posts_text_and_reads_label() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(json!({"text": "50% off shoes"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "50% off shoes",
                "prediction": "Ad",
                "confidence": {"Ad": 0.93, "Non-Ad": 0.07}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = classifier(&server).await.classify("50% off shoes").await.unwrap();
        assert_eq!(result.predicted_label, TextLabel::Ad);
        assert_eq!(result.confidence, LabelConfidence { ad: 0.93, non_ad: 0.07 });
    }

    #[tokio::test]
    async fn blank_text_skips_the_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = classifier(&server).await.classify("   ").await.unwrap();
        assert_eq!(result, TextClassification::non_ad(""));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model not loaded"})))
            .mount(&server)
            .await;

        let err = classifier(&server).await.classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn incomplete_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello"})))
            .mount(&server)
            .await;

        let err = classifier(&server).await.classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Parse(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = HttpClassifierConfig::new(format!("{}/analyze", server.uri()))
            .with_timeout(std::time::Duration::from_millis(50));
        let classifier = HttpTextClassifier::new(config);
        assert!(classifier.url().ends_with("/analyze"));

        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifierError::Request(_)));
    }
}

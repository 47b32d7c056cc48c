use std::path::Path;
use std::time::Duration;

use axum::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::Classifier;
use crate::error::{BotError, BotResult};

const CLASSIFY_URL: &str = "https://api.spoonacular.com/food/images/classify";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    classified: Vec<ClassifiedEntry>,
}

#[derive(Debug, Deserialize)]
struct ClassifiedEntry {
    name: String,
    #[serde(default)]
    probability: f64,
}

/// Remote image-classification backend: multipart upload of the image file,
/// API key as a query parameter.
pub struct SpoonacularClassifier {
    http: Client,
    url: String,
    api_key: String,
}

impl SpoonacularClassifier {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        Self::with_url(api_key, CLASSIFY_URL)
    }

    pub fn with_url(api_key: &str, url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn top_name(resp: ClassifyResponse) -> String {
    resp.classified
        .into_iter()
        .max_by(|a, b| a.probability.total_cmp(&b.probability))
        .map(|e| e.name.to_lowercase())
        .unwrap_or_default()
}

#[async_trait]
impl Classifier for SpoonacularClassifier {
    async fn classify(&self, image_path: &Path) -> BotResult<String> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| BotError::Classifier(e.to_string()))?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(&self.url)
            .query(&[("apiKey", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::Classifier(format!("status {status}")));
        }

        let body: ClassifyResponse = resp
            .json()
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;
        let name = top_name(body);
        debug!(label = %name, "spoonacular classification");
        Ok(name)
    }
}

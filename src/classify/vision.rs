use std::path::Path;
use std::time::Duration;

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Classifier, LabelMap};
use crate::error::{BotError, BotResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    #[serde(default)]
    score: f64,
}

/// Hosted vision-model backend. The inference endpoint takes raw image bytes
/// and answers with scored class predictions; the winning raw label goes
/// through the label map before it reaches the user.
pub struct VisionClassifier {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    labels: LabelMap,
}

impl VisionClassifier {
    pub fn new(endpoint: &str, api_key: Option<&str>, labels: LabelMap) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.map(str::to_string),
            labels,
        })
    }
}

fn top_label(predictions: Vec<Prediction>) -> String {
    predictions
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|p| p.label)
        .unwrap_or_default()
}

#[async_trait]
impl Classifier for VisionClassifier {
    async fn classify(&self, image_path: &Path) -> BotResult<String> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;

        let mut req = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::Classifier(format!("status {status}")));
        }

        let predictions: Vec<Prediction> = resp
            .json()
            .await
            .map_err(|e| BotError::Classifier(e.to_string()))?;
        let raw = top_label(predictions);
        let mapped = self.labels.display(&raw).to_string();
        debug!(raw = %raw, label = %mapped, "vision classification");
        Ok(mapped)
    }
}

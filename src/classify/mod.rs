use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::async_trait;
use tracing::warn;

use crate::config::{AppConfig, ClassifierBackend};
use crate::error::BotResult;

mod label_map;
mod spoonacular;
mod vision;

pub use label_map::LabelMap;
pub use spoonacular::SpoonacularClassifier;
pub use vision::VisionClassifier;

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns a best-guess food label for the image at `image_path`. An
    /// empty string is a valid "could not tell" outcome.
    async fn classify(&self, image_path: &Path) -> BotResult<String>;
}

/// Fail-soft wrapper: classification must never take the dispatcher down, so
/// any failure degrades to an empty label ("unknown food").
pub async fn classify_or_empty(classifier: &dyn Classifier, image_path: &Path) -> String {
    match classifier.classify(image_path).await {
        Ok(label) => label,
        Err(e) => {
            warn!(error = %e, "classification failed, degrading to unknown food");
            String::new()
        }
    }
}

/// Picks the one backend for this deployment. Called once at startup; the
/// dispatcher only ever sees the trait object.
pub fn classifier_from_config(
    config: &AppConfig,
    labels: LabelMap,
) -> anyhow::Result<Arc<dyn Classifier>> {
    match config.classifier_backend {
        ClassifierBackend::Spoonacular => {
            let api_key = config
                .spoonacular_api_key
                .as_deref()
                .context("SPOONACULAR_API_KEY is required for the spoonacular backend")?;
            Ok(Arc::new(SpoonacularClassifier::new(api_key)?))
        }
        ClassifierBackend::Vision => Ok(Arc::new(VisionClassifier::new(
            &config.vision_endpoint,
            config.vision_api_key.as_deref(),
            labels,
        )?)),
    }
}

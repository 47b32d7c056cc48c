use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Hosted vision model behind an inference endpoint.
    Vision,
    /// Spoonacular image classification API.
    Spoonacular,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub openai_api_key: String,
    pub chat_model: String,
    pub classifier_backend: ClassifierBackend,
    pub spoonacular_api_key: Option<String>,
    pub vision_endpoint: String,
    pub vision_api_key: Option<String>,
    pub nutrition_table: String,
    pub label_map: String,
}

const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_VISION_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/nateraw/food101-vit-base-patch16-224";

impl AppConfig {
    /// Reads the full configuration from the environment. Required keys fail
    /// here, at startup, not at first request.
    pub fn from_env() -> anyhow::Result<Self> {
        let channel_secret =
            std::env::var("LINE_CHANNEL_SECRET").context("LINE_CHANNEL_SECRET is required")?;
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .context("LINE_CHANNEL_ACCESS_TOKEN is required")?;
        let openai_api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is required")?;

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.into());

        let classifier_backend = match std::env::var("CLASSIFIER_BACKEND").ok().as_deref() {
            None | Some("vision") => ClassifierBackend::Vision,
            Some("spoonacular") => ClassifierBackend::Spoonacular,
            Some(other) => anyhow::bail!(
                "unknown CLASSIFIER_BACKEND {other:?} (expected \"vision\" or \"spoonacular\")"
            ),
        };

        let spoonacular_api_key = std::env::var("SPOONACULAR_API_KEY").ok();
        if classifier_backend == ClassifierBackend::Spoonacular && spoonacular_api_key.is_none() {
            anyhow::bail!("SPOONACULAR_API_KEY is required for the spoonacular backend");
        }

        Ok(Self {
            channel_secret,
            channel_access_token,
            openai_api_key,
            chat_model,
            classifier_backend,
            spoonacular_api_key,
            vision_endpoint: std::env::var("VISION_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_VISION_ENDPOINT.into()),
            vision_api_key: std::env::var("VISION_API_KEY").ok(),
            nutrition_table: std::env::var("NUTRITION_TABLE")
                .unwrap_or_else(|_| "data/nutrition.csv".into()),
            label_map: std::env::var("LABEL_MAP").unwrap_or_else(|_| "data/label_zh.json".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test covers all env scenarios; parallel env mutation would race.
    #[test]
    fn from_env_fails_fast_then_loads_with_defaults() {
        for key in [
            "LINE_CHANNEL_SECRET",
            "LINE_CHANNEL_ACCESS_TOKEN",
            "OPENAI_API_KEY",
            "CHAT_MODEL",
            "CLASSIFIER_BACKEND",
            "SPOONACULAR_API_KEY",
        ] {
            std::env::remove_var(key);
        }

        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("LINE_CHANNEL_SECRET"));

        std::env::set_var("LINE_CHANNEL_SECRET", "secret");
        std::env::set_var("LINE_CHANNEL_ACCESS_TOKEN", "token");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        std::env::set_var("OPENAI_API_KEY", "sk-test");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.classifier_backend, ClassifierBackend::Vision);
        assert_eq!(config.nutrition_table, "data/nutrition.csv");

        // The spoonacular backend refuses to start without its API key.
        std::env::set_var("CLASSIFIER_BACKEND", "spoonacular");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("SPOONACULAR_API_KEY"));

        std::env::set_var("SPOONACULAR_API_KEY", "abc123");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.classifier_backend, ClassifierBackend::Spoonacular);
        assert_eq!(config.spoonacular_api_key.as_deref(), Some("abc123"));

        std::env::set_var("CLASSIFIER_BACKEND", "quantum");
        assert!(AppConfig::from_env().is_err());

        for key in [
            "LINE_CHANNEL_SECRET",
            "LINE_CHANNEL_ACCESS_TOKEN",
            "OPENAI_API_KEY",
            "CLASSIFIER_BACKEND",
            "SPOONACULAR_API_KEY",
        ] {
            std::env::remove_var(key);
        }
    }
}

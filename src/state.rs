use std::path::Path;
use std::sync::Arc;

use crate::chat::{ChatProvider, OpenAiChat};
use crate::classify::{self, Classifier, LabelMap};
use crate::config::AppConfig;
use crate::messaging::{LineClient, MessagingClient};
use crate::nutrition::NutritionTable;
use crate::webhook::SignatureValidator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub nutrition: Arc<NutritionTable>,
    pub signature: Arc<SignatureValidator>,
    pub classifier: Arc<dyn Classifier>,
    pub chat: Arc<dyn ChatProvider>,
    pub messaging: Arc<dyn MessagingClient>,
}

impl AppState {
    /// Loads config and the static tables, builds the outbound clients.
    /// Everything expensive happens here, once, before the listener starts.
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let nutrition = Arc::new(NutritionTable::load(Path::new(&config.nutrition_table))?);
        let labels = LabelMap::load(Path::new(&config.label_map))?;

        let classifier = classify::classifier_from_config(&config, labels)?;
        let chat = Arc::new(OpenAiChat::new(&config.openai_api_key, &config.chat_model)?)
            as Arc<dyn ChatProvider>;
        let messaging = Arc::new(LineClient::new(&config.channel_access_token)?)
            as Arc<dyn MessagingClient>;

        Ok(Self::from_parts(
            config, nutrition, classifier, chat, messaging,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        nutrition: Arc<NutritionTable>,
        classifier: Arc<dyn Classifier>,
        chat: Arc<dyn ChatProvider>,
        messaging: Arc<dyn MessagingClient>,
    ) -> Self {
        let signature = Arc::new(SignatureValidator::new(&config.channel_secret));
        Self {
            config,
            nutrition,
            signature,
            classifier,
            chat,
            messaging,
        }
    }

    pub fn fake() -> Self {
        use axum::async_trait;
        use bytes::Bytes;

        use crate::error::BotResult;

        struct NullClassifier;
        #[async_trait]
        impl Classifier for NullClassifier {
            async fn classify(&self, _image_path: &Path) -> BotResult<String> {
                Ok(String::new())
            }
        }

        struct NullChat;
        #[async_trait]
        impl ChatProvider for NullChat {
            async fn chat(&self, _user_text: &str) -> BotResult<String> {
                Ok("多喝水，均衡飲食喔！".into())
            }
        }

        struct NullMessaging;
        #[async_trait]
        impl MessagingClient for NullMessaging {
            async fn reply(&self, _reply_token: &str, _text: &str) -> BotResult<()> {
                Ok(())
            }
            async fn get_message_content(&self, _message_id: &str) -> BotResult<Bytes> {
                Ok(Bytes::from_static(b"fake-jpeg-bytes"))
            }
        }

        Self::from_parts(
            Arc::new(Self::fake_config()),
            Arc::new(Self::fake_table()),
            Arc::new(NullClassifier),
            Arc::new(NullChat),
            Arc::new(NullMessaging),
        )
    }

    fn fake_config() -> AppConfig {
        AppConfig {
            channel_secret: "test-secret".into(),
            channel_access_token: "test-token".into(),
            openai_api_key: "test-key".into(),
            chat_model: "gpt-4o-mini".into(),
            classifier_backend: crate::config::ClassifierBackend::Vision,
            spoonacular_api_key: None,
            vision_endpoint: "http://localhost:9/classify".into(),
            vision_api_key: None,
            nutrition_table: "data/nutrition.csv".into(),
            label_map: "data/label_zh.json".into(),
        }
    }

    fn fake_table() -> NutritionTable {
        use crate::nutrition::FoodRecord;
        NutritionTable::from_records(vec![
            FoodRecord {
                name: "叉燒飯".into(),
                name_norm: "charsiu rice".into(),
                kcal: 650.0,
                protein: 30.0,
                fat: 20.0,
                carb: 78.0,
                advice: "去皮或少醬可以省不少熱量".into(),
            },
            FoodRecord {
                name: "滷肉飯".into(),
                name_norm: "braised pork rice".into(),
                kcal: 600.0,
                protein: 20.0,
                fat: 25.0,
                carb: 70.0,
                advice: "搭配燙青菜平衡一下".into(),
            },
        ])
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use axum::async_trait;
    use bytes::Bytes;

    use super::AppState;
    use crate::chat::ChatProvider;
    use crate::classify::Classifier;
    use crate::error::{BotError, BotResult};
    use crate::messaging::MessagingClient;

    /// Messaging double: records every delivered reply, optionally failing
    /// specific tokens or the media download.
    pub struct RecordingMessaging {
        replies: Mutex<Vec<(String, String)>>,
        pub fail_reply_tokens: Vec<String>,
        pub content: Option<Bytes>,
    }

    impl RecordingMessaging {
        pub fn new() -> Self {
            Self {
                replies: Mutex::new(Vec::new()),
                fail_reply_tokens: Vec::new(),
                content: Some(Bytes::from_static(b"fake-jpeg-bytes")),
            }
        }

        pub fn replies(&self) -> Vec<(String, String)> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingClient for RecordingMessaging {
        async fn reply(&self, reply_token: &str, text: &str) -> BotResult<()> {
            if self.fail_reply_tokens.iter().any(|t| t == reply_token) {
                return Err(BotError::ReplyDelivery("Invalid reply token".into()));
            }
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }

        async fn get_message_content(&self, _message_id: &str) -> BotResult<Bytes> {
            self.content
                .clone()
                .ok_or_else(|| BotError::MediaFetch("status 404".into()))
        }
    }

    /// Classifier double: fixed label or scripted failure, plus a record of
    /// the path it was handed and whether that file existed at call time.
    pub struct ScriptedClassifier {
        label: Option<String>,
        pub seen: Mutex<Option<(PathBuf, bool)>>,
    }

    impl ScriptedClassifier {
        pub fn with_label(label: &str) -> Self {
            Self {
                label: Some(label.into()),
                seen: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                label: None,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify(&self, image_path: &Path) -> BotResult<String> {
            *self.seen.lock().unwrap() =
                Some((image_path.to_path_buf(), image_path.exists()));
            self.label
                .clone()
                .ok_or_else(|| BotError::Classifier("inference backend down".into()))
        }
    }

    pub struct ScriptedChat {
        pub reply: Option<String>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn chat(&self, _user_text: &str) -> BotResult<String> {
            self.reply
                .clone()
                .ok_or_else(|| BotError::Chat("status 500".into()))
        }
    }

    /// `AppState::fake()` with the collaborators swapped for scripted doubles.
    pub fn state_with(
        classifier: Arc<dyn Classifier>,
        chat: Arc<dyn ChatProvider>,
        messaging: Arc<dyn MessagingClient>,
    ) -> AppState {
        let base = AppState::fake();
        AppState::from_parts(base.config, base.nutrition, classifier, chat, messaging)
    }
}

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

/// Maps a classifier's raw output label to a user-facing localized name.
/// Absent entries pass the raw label through unchanged.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    map: HashMap<String, String>,
}

impl LabelMap {
    /// A missing file is fine (raw labels get shown); a present but broken
    /// file is a startup error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "label map not found, raw labels will be used");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read label map {}", path.display()))?;
        let map: HashMap<String, String> = serde_json::from_str(&text)
            .with_context(|| format!("parse label map {}", path.display()))?;
        info!(entries = map.len(), "label map loaded");
        Ok(Self { map })
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            map: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn display<'a>(&'a self, raw: &'a str) -> &'a str {
        self.map.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

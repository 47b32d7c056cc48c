use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

/// One row of the nutrition table. `name` is the display form (usually the
/// Chinese dish name); `name_norm` is the lookup key. The table file may carry
/// an explicit `name_norm` column (e.g. a romanized alias); when blank the key
/// is derived from `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    #[serde(default)]
    pub name_norm: String,
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carb: f64,
    pub advice: String,
}

/// Lowercase and strip all whitespace.
pub fn normalize(s: &str) -> String {
    lazy_static! {
        static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    WS_RE.replace_all(&s.to_lowercase(), "").into_owned()
}

/// Static food table, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct NutritionTable {
    records: Vec<FoodRecord>,
}

impl NutritionTable {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("open nutrition table {}", path.display()))?;
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let rec: FoodRecord = row.context("parse nutrition table row")?;
            records.push(rec);
        }
        anyhow::ensure!(
            !records.is_empty(),
            "nutrition table {} has no rows",
            path.display()
        );
        info!(rows = records.len(), path = %path.display(), "nutrition table loaded");
        Ok(Self::from_records(records))
    }

    pub fn from_records(mut records: Vec<FoodRecord>) -> Self {
        for rec in &mut records {
            rec.name_norm = if rec.name_norm.is_empty() {
                normalize(&rec.name)
            } else {
                normalize(&rec.name_norm)
            };
        }
        Self { records }
    }

    /// Exact match on the normalized key first, then the first record whose
    /// key contains the query as a substring, in table order. An empty query
    /// matches nothing (a bare `contains("")` would return the first row).
    pub fn lookup(&self, query: &str) -> Option<&FoodRecord> {
        let q = normalize(query);
        if q.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.name_norm == q)
            .or_else(|| self.records.iter().find(|r| r.name_norm.contains(&q)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

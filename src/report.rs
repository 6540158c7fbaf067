//! 検証結果レポートの出力

use crate::error::Result;
use crate::session::Session;
use chrono::{DateTime, Utc};
use record_validator_common::{ReviewItem, Summary, Verdict};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub key_source: String,
    pub summary: Summary,
    pub results: Vec<ReviewItem>,
}

impl SessionReport {
    pub fn from_session(session: &Session) -> Self {
        Self {
            generated_at: Utc::now(),
            key_source: session.key_source().to_string(),
            summary: session.summary(),
            results: session.items().to_vec(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// サマリーの表示行（0件のカテゴリは出さない）
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    Verdict::ALL
        .iter()
        .filter(|v| summary.count(**v) > 0)
        .map(|v| format!("{} {} {}", v.icon(), summary.count(*v), v))
        .collect()
}

/// 出力先の既定値: `records.json` → `records.result.json`
pub fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("records.json");
    let result_name = if file_name.to_lowercase().ends_with(".json") {
        format!("{}.result.json", &file_name[..file_name.len() - 5])
    } else {
        format!("{file_name}.result.json")
    };
    input.with_file_name(result_name)
}

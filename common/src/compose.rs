//! エスカレーション用メール下書き
//!
//! 送信はしない。表示側が下書きを開くためのデータだけを組み立てる。

use crate::types::ValidationResult;
use serde::Serialize;

/// 宛先の初期値
pub const DEFAULT_RECIPIENT: &str = "example@company.com";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationDraft {
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub body: String,
}

impl EscalationDraft {
    /// `position` は結果セット内の0始まりの位置（件名は1始まりで表示）
    ///
    /// record_id は文字列のこともあるので件名の番号には使わない。
    /// 数値 ID が 0 から連番なら record_id + 1 と同じ番号になる。
    pub fn for_result(position: usize, result: &ValidationResult) -> Self {
        let score = result
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string());

        Self {
            to: DEFAULT_RECIPIENT.to_string(),
            cc: String::new(),
            subject: format!("Validation Result for Item {}", position + 1),
            body: format!(
                "Result: {}\nScore: {}\nReasoning:\n{}",
                result.result, score, result.llm_reasoning
            ),
        }
    }
}

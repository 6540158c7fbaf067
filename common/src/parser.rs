//! アップロード・レスポンスのパーサー
//!
//! - アップロードJSONをレコード配列として検証
//! - 分類サービスのレスポンスを ResultBatch にパース
//! - モデルが返した判定ラベルを5カテゴリに正規化

use crate::error::{Error, Result};
use crate::types::{Record, ResultBatch, Verdict};
use serde_json::Value;

/// トップレベルが配列でない場合のメッセージ
pub const NOT_AN_ARRAY: &str = "The JSON must be an array of records.";

/// JSONとして読めない場合のメッセージ
pub const INVALID_JSON: &str = "Invalid JSON format.";

/// パース済みJSONをレコード配列として取り出す
///
/// # Returns
/// * `Ok(Vec<Record>)` - トップレベルが配列
/// * `Err(Error::Format)` - 配列以外
pub fn records_from_value(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(Error::Format(NOT_AN_ARRAY.into())),
    }
}

/// JSONテキストをレコード配列としてパース
///
/// # Examples
/// ```
/// use record_validator_common::parse_records;
///
/// let records = parse_records(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
/// assert_eq!(records.len(), 2);
/// assert!(parse_records(r#"{"a": 1}"#).is_err());
/// ```
pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| Error::Format(INVALID_JSON.into()))?;
    records_from_value(value)
}

/// 分類サービスのレスポンス本文をパース
pub fn parse_result_batch(text: &str) -> Result<ResultBatch> {
    Ok(serde_json::from_str(text.trim())?)
}

/// 判定ラベルを正規化
///
/// 大文字小文字は無視。旧ラベル（OK/NOK等）も対応表で吸収し、
/// 不明なものは Undefined にする。
pub fn coerce_verdict(label: &str) -> Verdict {
    match label.trim().to_lowercase().as_str() {
        "reprocess" | "re-process" | "retry" => Verdict::Reprocess,
        "delete" => Verdict::Delete,
        "fix" | "nok" => Verdict::Fix,
        "escalate" => Verdict::Escalate,
        // "ok" は「対応不要」扱い
        _ => Verdict::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_from_array() {
        let records = records_from_value(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], 2);
    }

    #[test]
    fn test_records_empty_array() {
        let records = records_from_value(json!([])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_records_non_array_rejected() {
        for value in [json!({"a": 1}), json!("text"), json!(3), json!(null), json!(true)] {
            let err = records_from_value(value).unwrap_err();
            match err {
                Error::Format(msg) => assert_eq!(msg, NOT_AN_ARRAY),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_records_invalid_json() {
        let err = parse_records("[{").unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m == INVALID_JSON));
    }

    #[test]
    fn test_parse_result_batch() {
        let text = r#"{
            "results": [
                {"record_id": 0, "result": "Delete", "llm_reasoning": "duplicate"},
                {"record_id": 1, "result": "fix"}
            ],
            "key_source": "default key"
        }"#;
        let batch = parse_result_batch(text).unwrap();
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[0].result, Verdict::Delete);
        assert_eq!(batch.results[1].result, Verdict::Fix);
        assert_eq!(batch.key_source.as_deref(), Some("default key"));
    }

    #[test]
    fn test_parse_result_batch_invalid() {
        assert!(matches!(parse_result_batch("<html>"), Err(Error::Json(_))));
    }

    #[test]
    fn test_coerce_verdict_canonical() {
        for v in Verdict::ALL {
            assert_eq!(coerce_verdict(v.as_str()), v);
            assert_eq!(coerce_verdict(&v.as_str().to_uppercase()), v);
        }
    }

    #[test]
    fn test_coerce_verdict_aliases() {
        assert_eq!(coerce_verdict("re-process"), Verdict::Reprocess);
        assert_eq!(coerce_verdict(" Retry "), Verdict::Reprocess);
        assert_eq!(coerce_verdict("NOK"), Verdict::Fix);
        assert_eq!(coerce_verdict("ok"), Verdict::Undefined);
        assert_eq!(coerce_verdict("unknown"), Verdict::Undefined);
        assert_eq!(coerce_verdict(""), Verdict::Undefined);
        assert_eq!(coerce_verdict("archive"), Verdict::Undefined);
    }
}

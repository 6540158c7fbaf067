//! セッション状態
//!
//! レコード・検証結果・サマリー・UIフラグをひとまとめに保持し、
//! 状態遷移はすべてこのモジュールのメソッド経由で行う。
//!
//! 通信を伴う操作は2段階:
//! 1. `begin_*` で仮の状態変更（ローディング表示、retried=true など）
//! 2. 通信結果を `finish_*` に渡して確定またはロールバック
//!
//! 全置換のたびに世代番号を進め、古い世代で始まった再検証の結果は破棄する。

use crate::client::{RunOptions, ValidationClient};
use crate::error::{Result, ValidatorError};
use record_validator_common::{
    initialize_from_batch, parser, recompute_summary, reconciler, records_from_value,
    splice_retry, EscalationDraft, Record, RecordId, ResultBatch, ReviewItem, Summary,
    ValidationResult,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// key_source が返ってこなかった場合の表示
pub const UNKNOWN_KEY_SOURCE: &str = "API Unknown";

const DEMO_LOAD_FAILED: &str = "Failed to load demo example.";
const DEMO_NOT_AN_ARRAY: &str = "The demo file must be a JSON array.";

/// 一時的なUIフラグ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub loading: bool,
    pub is_validating: bool,
    pub file_error: Option<String>,
    /// 直近のバッチ検証の失敗
    pub run_error: Option<String>,
    /// フィードバック入力中の対象
    pub feedback_target: Option<RecordId>,
    pub feedback_text: String,
}

/// 1件ごとの操作可否
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionAvailability {
    pub accept: bool,
    pub reject: bool,
    pub retry: bool,
    pub worklist: bool,
}

/// 送信待ちのバッチ検証
#[derive(Debug, Clone)]
pub struct PendingRun {
    pub records: Vec<Record>,
    pub options: RunOptions,
    generation: u64,
}

/// 送信待ちの再検証
#[derive(Debug, Clone)]
pub struct PendingRetry {
    pub record_id: RecordId,
    pub record: Record,
    generation: u64,
}

/// 再検証結果の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Applied,
    /// 結果セットが置き換わっていたため破棄
    Dropped,
}

#[derive(Debug, Default)]
pub struct Session {
    records: Vec<Record>,
    items: Vec<ReviewItem>,
    summary: Summary,
    key_source: String,
    flags: UiFlags,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn item(&self, record_id: &RecordId) -> Option<&ReviewItem> {
        self.items.iter().find(|i| i.record_id() == record_id)
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn key_source(&self) -> &str {
        &self.key_source
    }

    pub fn flags(&self) -> &UiFlags {
        &self.flags
    }

    fn position(&self, record_id: &RecordId) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.record_id() == record_id)
            .ok_or_else(|| ValidatorError::NotFound(record_id.clone()))
    }

    // =============================================
    // アップロード
    // =============================================

    /// パース済みJSONをレコードとして取り込む
    ///
    /// 配列でなければ `file_error` を立てて `Format` を返し、他の状態は変えない。
    pub fn upload_records(&mut self, json: Value) -> Result<usize> {
        match records_from_value(json) {
            Ok(records) => Ok(self.replace_records(records)),
            Err(e) => Err(self.reject_upload(e.into())),
        }
    }

    /// JSONテキストをレコードとして取り込む
    pub fn upload_text(&mut self, text: &str) -> Result<usize> {
        match parser::parse_records(text) {
            Ok(records) => Ok(self.replace_records(records)),
            Err(e) => Err(self.reject_upload(e.into())),
        }
    }

    /// デモ用の固定JSONを読み込む
    pub fn load_demo(&mut self, path: &Path) -> Result<usize> {
        let value = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());

        let Some(value) = value else {
            warn!(path = %path.display(), "demo file could not be loaded");
            return Err(self.reject_upload(ValidatorError::Format(DEMO_LOAD_FAILED.into())));
        };

        match value {
            Value::Array(records) => Ok(self.replace_records(records)),
            _ => Err(self.reject_upload(ValidatorError::Format(DEMO_NOT_AN_ARRAY.into()))),
        }
    }

    fn reject_upload(&mut self, err: ValidatorError) -> ValidatorError {
        self.flags.file_error = Some(match &err {
            ValidatorError::Format(msg) => msg.clone(),
            other => other.to_string(),
        });
        err
    }

    fn replace_records(&mut self, records: Vec<Record>) -> usize {
        self.records = records;
        self.items.clear();
        self.summary = Summary::default();
        self.key_source.clear();
        self.flags.file_error = None;
        self.flags.run_error = None;
        self.flags.feedback_target = None;
        self.flags.feedback_text.clear();
        self.generation += 1;

        info!(records = self.records.len(), "records uploaded");
        self.records.len()
    }

    // =============================================
    // バッチ検証
    // =============================================

    /// バッチ検証の開始
    ///
    /// レコードが空なら `Ok(None)`（通信しない）。実行中なら `Busy`。
    pub fn begin_run(&mut self, options: RunOptions) -> Result<Option<PendingRun>> {
        if self.records.is_empty() {
            debug!("no records to validate");
            return Ok(None);
        }
        if self.flags.is_validating {
            return Err(ValidatorError::Busy("検証を実行中です".into()));
        }

        self.flags.loading = true;
        self.flags.is_validating = true;
        self.flags.run_error = None;
        self.generation += 1;

        info!(
            records = self.records.len(),
            use_rag = options.use_augmented_context,
            "validation run started"
        );

        Ok(Some(PendingRun {
            records: self.records.clone(),
            options,
            generation: self.generation,
        }))
    }

    /// バッチ検証の完了
    ///
    /// 成否にかかわらずローディング表示は解除する。失敗時は既存の結果を残す。
    pub fn finish_run(&mut self, pending: PendingRun, outcome: Result<ResultBatch>) -> Result<()> {
        self.flags.loading = false;
        self.flags.is_validating = false;

        if pending.generation != self.generation {
            warn!("records were replaced during validation; discarding results");
            return Ok(());
        }

        // 実行中は再検証を受け付けないので、残っている retried は古い世代のもの
        for item in &mut self.items {
            item.actions.retried = false;
        }

        match outcome.and_then(reject_duplicate_ids) {
            Ok(batch) => {
                let (items, summary) = initialize_from_batch(batch.results);
                self.items = items;
                self.summary = summary;
                self.key_source = batch
                    .key_source
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| UNKNOWN_KEY_SOURCE.to_string());

                info!(results = self.items.len(), key_source = %self.key_source, "validation run finished");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "validation failed");
                self.flags.run_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// バッチ検証（開始→通信→完了）
    pub async fn run_validation(
        &mut self,
        client: &dyn ValidationClient,
        options: RunOptions,
    ) -> Result<()> {
        let Some(pending) = self.begin_run(options)? else {
            return Ok(());
        };

        let outcome = client.submit(&pending.records, &pending.options).await;
        self.finish_run(pending, outcome)
    }

    // =============================================
    // 1件ごとの操作
    // =============================================

    pub fn availability(&self, record_id: &RecordId) -> Result<ActionAvailability> {
        let item = &self.items[self.position(record_id)?];
        let a = item.actions;
        let running = self.flags.is_validating;

        Ok(ActionAvailability {
            accept: !a.rejected && !a.retried && !running,
            reject: !a.accepted && !a.retried && !running,
            retry: !a.accepted && !a.rejected && !a.retried && !running,
            worklist: !a.worklisted,
        })
    }

    /// Reprocess を承認
    pub fn accept(&mut self, record_id: &RecordId) -> Result<bool> {
        if !self.availability(record_id)?.accept {
            return Err(ValidatorError::Busy(format!("{} は承認できません", record_id)));
        }
        Ok(reconciler::set_accepted(&mut self.items, record_id)?)
    }

    /// Delete を承認
    pub fn reject(&mut self, record_id: &RecordId) -> Result<bool> {
        if !self.availability(record_id)?.reject {
            return Err(ValidatorError::Busy(format!("{} は削除できません", record_id)));
        }
        Ok(reconciler::set_rejected(&mut self.items, record_id)?)
    }

    /// 承認/削除の取り消し
    pub fn undo_decision(&mut self, record_id: &RecordId) -> Result<bool> {
        let a = self.items[self.position(record_id)?].actions;
        if a.retried || self.flags.is_validating {
            return Err(ValidatorError::Busy(format!("{} は処理中です", record_id)));
        }
        Ok(reconciler::clear_decision(&mut self.items, record_id)?)
    }

    pub fn toggle_marked(&mut self, record_id: &RecordId) -> Result<bool> {
        Ok(reconciler::toggle_marked(&mut self.items, record_id)?)
    }

    /// ワークリスト登録（登録済みなら何もしない）
    pub fn worklist(&mut self, record_id: &RecordId) -> Result<bool> {
        Ok(reconciler::set_worklisted(&mut self.items, record_id)?)
    }

    // =============================================
    // 再検証
    // =============================================

    /// 再検証の開始。対象の retried を先に立てる
    pub fn begin_retry(&mut self, record_id: &RecordId) -> Result<PendingRetry> {
        if !self.availability(record_id)?.retry {
            return Err(ValidatorError::Busy(format!("{} は再検証できません", record_id)));
        }

        let index = self.position(record_id)?;
        let record = self
            .records
            .get(index)
            .cloned()
            .ok_or_else(|| ValidatorError::NotFound(record_id.clone()))?;

        reconciler::set_retried(&mut self.items, record_id, true)?;
        debug!(record_id = %record_id, "retry started");

        Ok(PendingRetry {
            record_id: record_id.clone(),
            record,
            generation: self.generation,
        })
    }

    /// 再検証の完了
    ///
    /// 成功時は1件だけ差し替えてサマリーを数え直す。失敗時は対象の retried だけを戻す。
    pub fn finish_retry(
        &mut self,
        pending: PendingRetry,
        outcome: Result<ValidationResult>,
    ) -> Result<RetryOutcome> {
        let record_id = &pending.record_id;

        if pending.generation != self.generation {
            warn!(record_id = %record_id, "result set was replaced; dropping late retry");
            return Ok(RetryOutcome::Dropped);
        }

        match outcome {
            Ok(updated) => {
                if let Err(e) = splice_retry(&mut self.items, record_id, updated) {
                    warn!(error = %e, "dropping retry result");
                    return Ok(RetryOutcome::Dropped);
                }
                self.summary = recompute_summary(&self.items);
                info!(record_id = %record_id, "retry applied");
                Ok(RetryOutcome::Applied)
            }
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "retry failed");
                self.clear_retried(record_id);
                Err(e)
            }
        }
    }

    fn clear_retried(&mut self, record_id: &RecordId) {
        // 置き換え済みなら対象がなくても問題ない
        let _ = reconciler::set_retried(&mut self.items, record_id, false);
    }

    /// 1件の再検証（開始→通信→完了）
    pub async fn retry_item(
        &mut self,
        client: &dyn ValidationClient,
        record_id: &RecordId,
        options: &RunOptions,
    ) -> Result<RetryOutcome> {
        let pending = self.begin_retry(record_id)?;
        let outcome = client.submit_one(&pending.record, options).await;
        self.finish_retry(pending, outcome)
    }

    // =============================================
    // フィードバック・エスカレーション
    // =============================================

    pub fn open_feedback(&mut self, record_id: &RecordId) -> Result<()> {
        self.position(record_id)?;
        self.flags.feedback_target = Some(record_id.clone());
        self.flags.feedback_text.clear();
        Ok(())
    }

    pub fn set_feedback_text(&mut self, text: impl Into<String>) {
        self.flags.feedback_text = text.into();
    }

    /// 入力を破棄して閉じる
    pub fn close_feedback(&mut self) {
        self.flags.feedback_target = None;
        self.flags.feedback_text.clear();
    }

    /// 送信して閉じる。入力中でなければ `None`
    pub fn send_feedback(&mut self) -> Result<Option<(RecordId, String)>> {
        let Some(target) = self.flags.feedback_target.take() else {
            return Ok(None);
        };
        let text = std::mem::take(&mut self.flags.feedback_text);

        match reconciler::mark_feedback_sent(&mut self.items, &target) {
            Ok(()) => {
                info!(record_id = %target, chars = text.len(), "feedback sent");
                Ok(Some((target, text)))
            }
            Err(e) => {
                warn!(error = %e, "feedback target disappeared");
                Err(e.into())
            }
        }
    }

    /// エスカレーション用の下書きを作る
    pub fn escalate(&mut self, record_id: &RecordId) -> Result<EscalationDraft> {
        let index = self.position(record_id)?;
        let draft = EscalationDraft::for_result(index, &self.items[index].result);
        reconciler::mark_emailed(&mut self.items, record_id)?;
        Ok(draft)
    }
}

/// record_id が重複したレスポンスは受け付けない
fn reject_duplicate_ids(batch: ResultBatch) -> Result<ResultBatch> {
    let mut seen = HashSet::new();
    if let Some(dup) = batch.results.iter().find(|r| !seen.insert(&r.record_id)) {
        return Err(ValidatorError::Remote {
            status: 200,
            body: format!("duplicate record_id in validation response: {}", dup.record_id),
        });
    }
    Ok(batch)
}

//! 検証結果の統合ロジック
//!
//! 分類サービスのレスポンスを画面用の ReviewItem 列に変換し、
//! 1件だけの再検証結果を差し込む。Summary は常に現在の結果セットから再計算する。

use crate::error::{Error, Result};
use crate::types::{RecordId, ReviewItem, Summary, ValidationResult};

/// バッチ全体から結果セットを作り直す（全置換はここだけ）
pub fn initialize_from_batch(batch: Vec<ValidationResult>) -> (Vec<ReviewItem>, Summary) {
    let items: Vec<ReviewItem> = batch.into_iter().map(ReviewItem::from).collect();
    let summary = recompute_summary(&items);
    (items, summary)
}

/// カテゴリ別件数を数え直す
pub fn recompute_summary(items: &[ReviewItem]) -> Summary {
    let mut summary = Summary::default();
    for item in items {
        summary.increment(item.result.result);
    }
    summary
}

fn find_mut<'a>(items: &'a mut [ReviewItem], record_id: &RecordId) -> Result<&'a mut ReviewItem> {
    items
        .iter_mut()
        .find(|item| item.record_id() == record_id)
        .ok_or_else(|| Error::NotFound(record_id.clone()))
}

/// 再検証結果を1件だけ差し込む
///
/// 判定フィールド（result / llm_reasoning / score / status / key_source）のみ置き換え、
/// record_id と accepted / rejected / marked は元の値を引き継ぐ。retried は必ず false。
/// 対象が見つからない場合は `Error::NotFound` を返し、結果セットは変更しない。
pub fn splice_retry(
    items: &mut [ReviewItem],
    record_id: &RecordId,
    updated: ValidationResult,
) -> Result<()> {
    let target = find_mut(items, record_id)?;

    target.result.result = updated.result;
    target.result.llm_reasoning = updated.llm_reasoning;
    target.result.score = updated.score;
    target.result.status = updated.status;
    target.result.key_source = updated.key_source;
    target.actions.retried = false;

    Ok(())
}

/// Reprocess を承認
///
/// rejected が立っている場合は何もしない。戻り値は状態が変わったかどうか。
pub fn set_accepted(items: &mut [ReviewItem], record_id: &RecordId) -> Result<bool> {
    let target = find_mut(items, record_id)?;
    if target.actions.rejected || target.actions.accepted {
        return Ok(false);
    }
    target.actions.accepted = true;
    target.actions.rejected = false;
    Ok(true)
}

/// Delete を承認（set_accepted の対）
pub fn set_rejected(items: &mut [ReviewItem], record_id: &RecordId) -> Result<bool> {
    let target = find_mut(items, record_id)?;
    if target.actions.accepted || target.actions.rejected {
        return Ok(false);
    }
    target.actions.rejected = true;
    target.actions.accepted = false;
    Ok(true)
}

/// 承認/削除の取り消し
pub fn clear_decision(items: &mut [ReviewItem], record_id: &RecordId) -> Result<bool> {
    let target = find_mut(items, record_id)?;
    let changed = target.actions.accepted || target.actions.rejected;
    target.actions.accepted = false;
    target.actions.rejected = false;
    Ok(changed)
}

/// ワークリスト登録（一方向、2回目以降は何もしない）
pub fn set_worklisted(items: &mut [ReviewItem], record_id: &RecordId) -> Result<bool> {
    let target = find_mut(items, record_id)?;
    if target.actions.worklisted {
        return Ok(false);
    }
    target.actions.worklisted = true;
    Ok(true)
}

/// ブックマーク切り替え。新しい値を返す
pub fn toggle_marked(items: &mut [ReviewItem], record_id: &RecordId) -> Result<bool> {
    let target = find_mut(items, record_id)?;
    target.actions.marked = !target.actions.marked;
    Ok(target.actions.marked)
}

pub fn set_retried(items: &mut [ReviewItem], record_id: &RecordId, retried: bool) -> Result<()> {
    find_mut(items, record_id)?.actions.retried = retried;
    Ok(())
}

pub fn mark_feedback_sent(items: &mut [ReviewItem], record_id: &RecordId) -> Result<()> {
    find_mut(items, record_id)?.actions.feedback_sent = true;
    Ok(())
}

pub fn mark_emailed(items: &mut [ReviewItem], record_id: &RecordId) -> Result<()> {
    find_mut(items, record_id)?.actions.emailed = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionState, Verdict};

    fn batch(verdicts: &[Verdict]) -> Vec<ValidationResult> {
        verdicts
            .iter()
            .enumerate()
            .map(|(i, v)| ValidationResult::new(i as i64, *v))
            .collect()
    }

    fn id(n: i64) -> RecordId {
        RecordId::Int(n)
    }

    #[test]
    fn test_initialize_default_action_state() {
        let (items, _) = initialize_from_batch(batch(&[Verdict::Delete, Verdict::Fix]));
        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.actions, ActionState::default());
        }
    }

    #[test]
    fn test_initialize_summary() {
        let (_, summary) = initialize_from_batch(batch(&[Verdict::Delete, Verdict::Fix]));
        assert_eq!(
            summary,
            Summary { reprocess: 0, delete: 1, fix: 1, escalate: 0, undefined: 0 }
        );
    }

    #[test]
    fn test_recompute_summary_empty() {
        assert_eq!(recompute_summary(&[]), Summary::default());
    }

    #[test]
    fn test_recompute_summary_every_category() {
        let (items, _) = initialize_from_batch(batch(&[
            Verdict::Reprocess,
            Verdict::Escalate,
            Verdict::Escalate,
            Verdict::Undefined,
            Verdict::Fix,
            Verdict::Reprocess,
        ]));
        let summary = recompute_summary(&items);
        for v in Verdict::ALL {
            let expected = items.iter().filter(|i| i.result.result == v).count();
            assert_eq!(summary.count(v), expected, "{}", v);
        }
        assert_eq!(summary.total(), items.len());
    }

    #[test]
    fn test_splice_retry_replaces_classification_only() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Delete, Verdict::Fix]));
        items[0].actions.marked = true;
        items[0].actions.accepted = true;
        items[0].actions.retried = true;
        items[0].actions.worklisted = true;
        let untouched = items[1].clone();

        let mut updated = ValidationResult::new(0, Verdict::Reprocess);
        updated.llm_reasoning = "lock timeout".into();
        updated.score = Some(0.8);
        updated.status = Some("OK".into());
        updated.key_source = Some("fallback key".into());

        splice_retry(&mut items, &id(0), updated).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].result.result, Verdict::Reprocess);
        assert_eq!(items[0].result.llm_reasoning, "lock timeout");
        assert_eq!(items[0].result.score, Some(0.8));
        assert_eq!(items[0].result.status.as_deref(), Some("OK"));
        assert_eq!(items[0].result.key_source.as_deref(), Some("fallback key"));
        assert!(items[0].actions.marked);
        assert!(items[0].actions.accepted);
        assert!(!items[0].actions.retried);
        assert_eq!(items[1], untouched);
    }

    #[test]
    fn test_splice_retry_keeps_record_id() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Delete, Verdict::Fix]));
        // 1件だけ送ると相手は record_id=0 で返してくる
        let updated = ValidationResult::new(0, Verdict::Escalate);
        splice_retry(&mut items, &id(1), updated).unwrap();

        assert_eq!(items[0].record_id(), &id(0));
        assert_eq!(items[1].record_id(), &id(1));
        assert_eq!(items[0].result.result, Verdict::Delete);
        assert_eq!(items[1].result.result, Verdict::Escalate);
    }

    #[test]
    fn test_splice_retry_not_found_leaves_items() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Delete]));
        let before = items.clone();
        let err = splice_retry(&mut items, &id(9), ValidationResult::new(9, Verdict::Fix));
        assert!(matches!(err, Err(Error::NotFound(RecordId::Int(9)))));
        assert_eq!(items, before);
    }

    #[test]
    fn test_accept_reject_exclusive() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Reprocess]));

        assert!(set_accepted(&mut items, &id(0)).unwrap());
        assert!(!set_rejected(&mut items, &id(0)).unwrap());
        assert!(items[0].actions.accepted);
        assert!(!items[0].actions.rejected);

        assert!(clear_decision(&mut items, &id(0)).unwrap());
        assert!(set_rejected(&mut items, &id(0)).unwrap());
        assert!(!set_accepted(&mut items, &id(0)).unwrap());
        assert!(!items[0].actions.accepted);
        assert!(items[0].actions.rejected);
    }

    #[test]
    fn test_worklist_latch() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Undefined]));
        assert!(set_worklisted(&mut items, &id(0)).unwrap());
        let after_first = items.clone();
        assert!(!set_worklisted(&mut items, &id(0)).unwrap());
        assert_eq!(items, after_first);
    }

    #[test]
    fn test_toggle_marked_twice() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Fix, Verdict::Fix]));
        items[1].actions.accepted = true;
        let before = items.clone();

        assert!(toggle_marked(&mut items, &id(1)).unwrap());
        assert!(!toggle_marked(&mut items, &id(1)).unwrap());
        assert_eq!(items, before);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let (mut items, _) = initialize_from_batch(batch(&[Verdict::Fix]));
        assert!(toggle_marked(&mut items, &RecordId::Text("zz".into())).is_err());
        assert!(set_accepted(&mut items, &id(3)).is_err());
    }
}

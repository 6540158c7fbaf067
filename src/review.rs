//! 対話式レビューモジュール
//!
//! 検証結果を1件ずつ選び、承認・削除・再検証などの操作を行う。
//! 操作の可否は Session::availability に従う。

use crate::client::{RunOptions, ValidationClient};
use crate::error::{Result, ValidatorError};
use crate::report::summary_lines;
use crate::session::{ActionAvailability, RetryOutcome, Session};
use dialoguer::{Input, Select};
use record_validator_common::{RecordId, ReviewItem};

/// 1件に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Reprocess を承認
    Accept,
    /// Delete を承認
    Reject,
    /// 承認/削除の取り消し
    Undo,
    Retry,
    Mark,
    Feedback,
    Escalate,
    Worklist,
    Back,
}

impl ReviewAction {
    pub fn label(&self, item: &ReviewItem) -> &'static str {
        let a = item.actions;
        match self {
            ReviewAction::Accept => "🔁 Reprocess",
            ReviewAction::Reject => "🗑️ Delete",
            ReviewAction::Undo => "↩ 取り消し",
            ReviewAction::Retry => "↻ Retry",
            ReviewAction::Mark if a.marked => "🚩 Unmark",
            ReviewAction::Mark => "🚩 Mark for Review",
            ReviewAction::Feedback => "🛠️ Fix（フィードバック）",
            ReviewAction::Escalate => "⚠️ Escalate",
            ReviewAction::Worklist => "❓ Undefined（ワークリスト）",
            ReviewAction::Back => "← 戻る",
        }
    }
}

/// 選択可能な操作の一覧
pub fn available_actions(item: &ReviewItem, availability: ActionAvailability) -> Vec<ReviewAction> {
    let mut actions = Vec::new();

    if availability.accept && !item.actions.accepted {
        actions.push(ReviewAction::Accept);
    }
    if availability.reject && !item.actions.rejected {
        actions.push(ReviewAction::Reject);
    }
    if (item.actions.accepted || item.actions.rejected) && !item.actions.retried {
        actions.push(ReviewAction::Undo);
    }
    if availability.retry {
        actions.push(ReviewAction::Retry);
    }
    actions.push(ReviewAction::Mark);
    actions.push(ReviewAction::Feedback);
    actions.push(ReviewAction::Escalate);
    if availability.worklist {
        actions.push(ReviewAction::Worklist);
    }
    actions.push(ReviewAction::Back);

    actions
}

/// 一覧表示用のラベル
pub fn item_label(position: usize, item: &ReviewItem) -> String {
    let a = item.actions;
    let mut tags = Vec::new();
    if a.marked {
        tags.push("🚩");
    }
    if a.accepted {
        tags.push("Reprocessed");
    }
    if a.rejected {
        tags.push("Deleted");
    }
    if a.retried {
        tags.push("Executing…");
    }
    if a.worklisted {
        tags.push("Unclear");
    }

    let mut label = format!("Item {}: {}", position + 1, item.result.result);
    if !tags.is_empty() {
        label.push_str(&format!(" [{}]", tags.join(", ")));
    }
    label
}

fn cli_error(e: dialoguer::Error) -> ValidatorError {
    ValidatorError::CliExecution(e.to_string())
}

/// 対話式でレビュー
pub async fn run_interactive_review(
    session: &mut Session,
    client: &dyn ValidationClient,
    options: &RunOptions,
) -> Result<()> {
    if session.items().is_empty() {
        println!("レビュー対象の結果がありません");
        return Ok(());
    }

    loop {
        println!("\nAnalysis:");
        for line in summary_lines(&session.summary()) {
            println!("  {}", line);
        }

        let mut labels: Vec<String> = session
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| item_label(i, item))
            .collect();
        labels.push("保存して終了".to_string());

        let choice = Select::new()
            .with_prompt("レコードを選択")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(cli_error)?;

        if choice >= session.items().len() {
            break;
        }

        review_item(session, client, options, choice).await?;
    }

    Ok(())
}

async fn review_item(
    session: &mut Session,
    client: &dyn ValidationClient,
    options: &RunOptions,
    position: usize,
) -> Result<()> {
    let item = session.items()[position].clone();
    let record_id = item.record_id().clone();

    println!("\n{}", item_label(position, &item));
    println!("  Reasoning: {}", item.result.llm_reasoning);
    if let Some(score) = item.result.score {
        println!("  Score: {}", score);
    }

    let actions = available_actions(&item, session.availability(&record_id)?);
    let labels: Vec<&str> = actions.iter().map(|a| a.label(&item)).collect();

    let choice = Select::new()
        .with_prompt("操作")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(cli_error)?;

    let outcome = match actions[choice] {
        ReviewAction::Accept => session.accept(&record_id).map(|_| "  → Reprocessed".to_string()),
        ReviewAction::Reject => session.reject(&record_id).map(|_| "  → Deleted".to_string()),
        ReviewAction::Undo => session.undo_decision(&record_id).map(|_| "  → 取り消しました".to_string()),
        ReviewAction::Retry => {
            println!("  ⏳ Executing…");
            match session.retry_item(client, &record_id, options).await {
                Ok(RetryOutcome::Applied) => Ok(format!(
                    "  → {}",
                    session
                        .item(&record_id)
                        .map(|i| i.result.result.to_string())
                        .unwrap_or_default()
                )),
                Ok(RetryOutcome::Dropped) => Ok("  → 結果セットが更新されたため破棄しました".to_string()),
                Err(e) => Err(e),
            }
        }
        ReviewAction::Mark => session
            .toggle_marked(&record_id)
            .map(|marked| (if marked { "  → 🚩 Marked" } else { "  → Unmarked" }).to_string()),
        ReviewAction::Feedback => prompt_feedback(session, &record_id),
        ReviewAction::Escalate => session.escalate(&record_id).map(|draft| {
            format!(
                "  To: {}\n  Subject: {}\n  ---\n{}\n  ---\n  （デモ用: 送信はされません）",
                draft.to, draft.subject, draft.body
            )
        }),
        ReviewAction::Worklist => session.worklist(&record_id).map(|_| "  → Unclear".to_string()),
        ReviewAction::Back => return Ok(()),
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(ValidatorError::CliExecution(e)) => return Err(ValidatorError::CliExecution(e)),
        Err(e) => println!("  ✗ {}", e),
    }

    Ok(())
}

fn prompt_feedback(session: &mut Session, record_id: &RecordId) -> Result<String> {
    session.open_feedback(record_id)?;

    let text: String = Input::new()
        .with_prompt("フィードバック（空欄でキャンセル）")
        .allow_empty(true)
        .interact_text()
        .map_err(cli_error)?;

    if text.trim().is_empty() {
        session.close_feedback();
        return Ok("  → キャンセルしました".to_string());
    }

    session.set_feedback_text(text.trim());
    session.send_feedback()?;
    Ok("  → フィードバックを送信しました".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_validator_common::{ValidationResult, Verdict};

    fn item() -> ReviewItem {
        ReviewItem::from(ValidationResult::new(0, Verdict::Reprocess))
    }

    fn all_enabled() -> ActionAvailability {
        ActionAvailability { accept: true, reject: true, retry: true, worklist: true }
    }

    #[test]
    fn test_actions_fresh_item() {
        let actions = available_actions(&item(), all_enabled());
        assert!(actions.contains(&ReviewAction::Accept));
        assert!(actions.contains(&ReviewAction::Reject));
        assert!(actions.contains(&ReviewAction::Retry));
        assert!(actions.contains(&ReviewAction::Worklist));
        assert!(!actions.contains(&ReviewAction::Undo));
        assert_eq!(actions.last(), Some(&ReviewAction::Back));
    }

    #[test]
    fn test_actions_accepted_item() {
        let mut it = item();
        it.actions.accepted = true;
        let availability = ActionAvailability { accept: true, reject: false, retry: false, worklist: true };
        let actions = available_actions(&it, availability);
        assert!(!actions.contains(&ReviewAction::Accept));
        assert!(!actions.contains(&ReviewAction::Reject));
        assert!(!actions.contains(&ReviewAction::Retry));
        assert!(actions.contains(&ReviewAction::Undo));
    }

    #[test]
    fn test_actions_worklisted_item() {
        let availability = ActionAvailability { worklist: false, ..all_enabled() };
        let actions = available_actions(&item(), availability);
        assert!(!actions.contains(&ReviewAction::Worklist));
    }

    #[test]
    fn test_item_label() {
        let mut it = item();
        assert_eq!(item_label(0, &it), "Item 1: Reprocess");

        it.actions.marked = true;
        it.actions.rejected = true;
        assert_eq!(item_label(4, &it), "Item 5: Reprocess [🚩, Deleted]");
    }

    #[test]
    fn test_mark_label_follows_state() {
        let mut it = item();
        assert_eq!(ReviewAction::Mark.label(&it), "🚩 Mark for Review");
        it.actions.marked = true;
        assert_eq!(ReviewAction::Mark.label(&it), "🚩 Unmark");
    }
}

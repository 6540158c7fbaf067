//! Record Validator Common Library
//!
//! CLIと対話レビューで共有される型と統合ロジック（I/Oなし）

pub mod types;
pub mod error;
pub mod parser;
pub mod reconciler;
pub mod compose;

pub use types::{ActionState, Record, RecordId, ResultBatch, ReviewItem, Summary, ValidationResult, Verdict};
pub use error::{Error, Result};
pub use parser::{coerce_verdict, parse_records, parse_result_batch, records_from_value};
pub use reconciler::{initialize_from_batch, recompute_summary, splice_retry};
pub use compose::EscalationDraft;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trade::Trade;

/// One recorded week in a ledger: the cash deposited that week and the
/// trades executed with it.
///
/// Entries are append-only. The only mutation the ledger supports is
/// popping the most recent entry (undo). Each asset class keeps its own
/// ledger file, so the trades in an entry all belong to one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEntry {
    /// Unique identifier
    pub id: Uuid,

    /// The Sunday this week starts on (ISO date, daily granularity).
    pub week_start: NaiveDate,

    /// Cash contributed this week, in the base currency. May be zero for
    /// a deposit-only skip week.
    pub deposit_amount: Decimal,

    /// Executed trades for the week, in execution order. May be empty.
    #[serde(default)]
    pub trades: Vec<Trade>,

    /// Optional free-text note for the week.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WeeklyEntry {
    pub fn new(week_start: NaiveDate, deposit_amount: Decimal, trades: Vec<Trade>) -> Self {
        Self {
            id: Uuid::new_v4(),
            week_start,
            deposit_amount,
            trades,
            notes: None,
        }
    }

    /// Create an entry with a note attached.
    pub fn with_notes(
        week_start: NaiveDate,
        deposit_amount: Decimal,
        trades: Vec<Trade>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            week_start,
            deposit_amount,
            trades,
            notes: Some(notes.into()),
        }
    }
}

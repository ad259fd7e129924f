//! Operation records for CSV replay and their parsed form.

use crate::amount::Amount;
use crate::stream::{Principal, Seconds, Timestamp};
use serde::Deserialize;
use std::str::FromStr;

/// Raw operation record as read from a replay CSV.
///
/// Uses string-based parsing for flexibility; columns that only apply to
/// some operations (`stream` for lifecycle ops, `recipient`/`amount`/
/// `rate`/`duration` for creation) are optional.
#[derive(Debug, Deserialize)]
pub struct OperationRecord {
    /// Operation: create, pause, resume, cancel, withdraw, push
    pub op: String,

    /// Principal issuing the operation
    pub caller: String,

    /// Target stream ID (absent for create)
    pub stream: Option<u64>,

    /// Recipient principal (create only)
    pub recipient: Option<String>,

    /// Total amount to lock (create only)
    pub amount: Option<String>,

    /// Rate per second (create only)
    pub rate: Option<String>,

    /// Stream duration in seconds (create only)
    pub duration: Option<u64>,

    /// Logical timestamp at which the operation executes
    pub at: Timestamp,
}

impl OperationRecord {
    /// Parses the raw CSV record into a typed operation.
    ///
    /// Returns `None` if the record is invalid (unknown op, missing target
    /// stream, malformed amounts, etc.).
    pub fn parse(&self) -> Option<ParsedOp> {
        let op = self.op.trim().to_lowercase();
        let caller = Principal::new(self.caller.trim());

        let kind = match op.as_str() {
            "create" => OpKind::Create {
                recipient: Principal::new(self.recipient.as_ref()?.trim()),
                amount: Self::parse_amount(self.amount.as_deref())?,
                rate: Self::parse_amount(self.rate.as_deref())?,
                duration: self.duration?,
            },
            "pause" => OpKind::Pause(self.stream?),
            "resume" => OpKind::Resume(self.stream?),
            "cancel" => OpKind::Cancel(self.stream?),
            "withdraw" => OpKind::Withdraw(self.stream?),
            "push" => OpKind::Push(self.stream?),
            _ => return None,
        };

        Some(ParsedOp {
            caller,
            at: self.at,
            kind,
        })
    }

    fn parse_amount(field: Option<&str>) -> Option<Amount> {
        let trimmed = field?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Amount::from_str(trimmed).ok()
    }
}

/// A parsed and validated operation ready for replay.
#[derive(Debug, Clone)]
pub struct ParsedOp {
    /// Principal issuing the operation
    pub caller: Principal,

    /// Logical timestamp of the operation
    pub at: Timestamp,

    /// Operation kind with associated data
    pub kind: OpKind,
}

/// Operation variants with associated data.
#[derive(Debug, Clone)]
pub enum OpKind {
    /// Open a new stream from the caller to `recipient`.
    Create {
        recipient: Principal,
        amount: Amount,
        rate: Amount,
        duration: Seconds,
    },

    /// Freeze accrual on the stream.
    Pause(u64),

    /// Resume accrual on the stream.
    Resume(u64),

    /// Terminate the stream (sender only).
    Cancel(u64),

    /// Pull-path release to the recipient.
    Withdraw(u64),

    /// Push-path automatic distribution.
    Push(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(op: &str) -> OperationRecord {
        OperationRecord {
            op: op.to_string(),
            caller: "alice".to_string(),
            stream: Some(1),
            recipient: None,
            amount: None,
            rate: None,
            duration: None,
            at: 1000,
        }
    }

    #[test]
    fn test_parse_create() {
        let rec = OperationRecord {
            op: "create".to_string(),
            caller: "alice".to_string(),
            stream: None,
            recipient: Some("bob".to_string()),
            amount: Some("1000".to_string()),
            rate: Some("10".to_string()),
            duration: Some(100),
            at: 1000,
        };

        let parsed = rec.parse().unwrap();
        assert_eq!(parsed.caller, Principal::from("alice"));
        assert_eq!(parsed.at, 1000);
        match parsed.kind {
            OpKind::Create {
                recipient,
                amount,
                rate,
                duration,
            } => {
                assert_eq!(recipient, Principal::from("bob"));
                assert_eq!(amount.to_string(), "1000.00000000");
                assert_eq!(rate.to_string(), "10.00000000");
                assert_eq!(duration, 100);
            }
            _ => panic!("Expected Create"),
        }
    }

    #[test]
    fn test_parse_lifecycle_ops() {
        assert!(matches!(record("pause").parse().unwrap().kind, OpKind::Pause(1)));
        assert!(matches!(record("resume").parse().unwrap().kind, OpKind::Resume(1)));
        assert!(matches!(record("cancel").parse().unwrap().kind, OpKind::Cancel(1)));
        assert!(matches!(record("withdraw").parse().unwrap().kind, OpKind::Withdraw(1)));
        assert!(matches!(record("push").parse().unwrap().kind, OpKind::Push(1)));
    }

    #[test]
    fn test_parse_handles_whitespace_and_case() {
        let mut rec = record("  Pause  ");
        rec.caller = "  alice  ".to_string();

        let parsed = rec.parse().unwrap();
        assert_eq!(parsed.caller, Principal::from("alice"));
        assert!(matches!(parsed.kind, OpKind::Pause(1)));
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(record("refund").parse().is_none());
    }

    #[test]
    fn test_parse_rejects_missing_stream() {
        let mut rec = record("withdraw");
        rec.stream = None;
        assert!(rec.parse().is_none());
    }

    #[test]
    fn test_parse_rejects_create_without_amount() {
        let rec = OperationRecord {
            op: "create".to_string(),
            caller: "alice".to_string(),
            stream: None,
            recipient: Some("bob".to_string()),
            amount: None,
            rate: Some("10".to_string()),
            duration: Some(100),
            at: 1000,
        };
        assert!(rec.parse().is_none());
    }
}

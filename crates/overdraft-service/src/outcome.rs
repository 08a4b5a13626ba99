//! Upgrade call outcomes and their wire shapes.

use overdraft_types::{Money, RequestId};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Error text carried by a funds rejection.
pub const INSUFFICIENT_FUNDS: &str = "insufficient funds";

/// How one upgrade call concluded.
///
/// Every call, on either path, resolves to exactly one of these; callers
/// never see an unstructured failure for an expected condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The debit applied and the user was granted premium.
    Granted {
        request_id: RequestId,
        message: String,
        balance_before: Money,
        balance_after: Money,
    },
    /// The funds check refused the debit. Expected business outcome, not an
    /// error.
    Rejected {
        request_id: RequestId,
        balance: Money,
    },
    /// The storage layer failed mid-call. The id correlates the result with
    /// any partial audit entry.
    Error {
        request_id: RequestId,
        message: String,
    },
}

impl UpgradeOutcome {
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Granted { request_id, .. }
            | Self::Rejected { request_id, .. }
            | Self::Error { request_id, .. } => *request_id,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Serializes to the shapes the route layer exposes:
///
/// ```text
/// granted:  {"success":true, "message":..., "balance_before":...,
///            "balance_after":..., "request_id":"REQ-001"}
/// rejected: {"success":false, "error":"insufficient funds",
///            "balance":..., "request_id":"REQ-002"}
/// error:    {"success":false, "error":..., "request_id":"REQ-003"}
/// ```
impl Serialize for UpgradeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Granted {
                request_id,
                message,
                balance_before,
                balance_after,
            } => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("balance_before", balance_before)?;
                map.serialize_entry("balance_after", balance_after)?;
                map.serialize_entry("request_id", &request_id.to_string())?;
                map.end()
            }
            Self::Rejected {
                request_id,
                balance,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", INSUFFICIENT_FUNDS)?;
                map.serialize_entry("balance", balance)?;
                map.serialize_entry("request_id", &request_id.to_string())?;
                map.end()
            }
            Self::Error {
                request_id,
                message,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", message)?;
                map.serialize_entry("request_id", &request_id.to_string())?;
                map.end()
            }
        }
    }
}

/// Result of a full system reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ResetReceipt {
    pub success: bool,
    pub balance: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granted_serializes_to_the_contract_shape() {
        let outcome = UpgradeOutcome::Granted {
            request_id: RequestId::new(1),
            message: "user 3 upgraded".to_string(),
            balance_before: Money::from_major(100),
            balance_after: Money::ZERO,
        };
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["success"], true);
        assert_eq!(value["request_id"], "REQ-001");
        assert_eq!(value["balance_before"], "100");
        assert_eq!(value["balance_after"], "0");
    }

    #[test]
    fn rejected_serializes_with_error_text_and_balance() {
        let outcome = UpgradeOutcome::Rejected {
            request_id: RequestId::new(2),
            balance: Money::from_major(40),
        };
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], INSUFFICIENT_FUNDS);
        assert_eq!(value["balance"], "40");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn error_carries_its_correlation_id() {
        let outcome = UpgradeOutcome::Error {
            request_id: RequestId::new(9),
            message: "I/O error: disk gone".to_string(),
        };
        assert!(outcome.is_error());
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["request_id"], "REQ-009");
    }
}

//! # Service Helpers
//!
//! Error constructors and argument checks shared by the API implementations.

use crate::domain::{RegistryError, TransferReason, MAX_TRANSACTIONS_COUNT};

pub(crate) fn not_found(op: &'static str, key: impl ToString) -> RegistryError {
    RegistryError::NotFound {
        op,
        key: key.to_string(),
    }
}

pub(crate) fn conflict(op: &'static str, key: impl ToString, reason: &str) -> RegistryError {
    RegistryError::Conflict {
        op,
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn invalid(op: &'static str, field: &'static str, reason: &str) -> RegistryError {
    RegistryError::InvalidArgument {
        op,
        field,
        reason: reason.to_string(),
    }
}

/// Reject an empty identifier.
pub(crate) fn require_non_empty(
    op: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(invalid(op, field, "must not be empty"));
    }
    Ok(())
}

/// Reject a negative amount.
pub(crate) fn require_non_negative(
    op: &'static str,
    field: &'static str,
    value: i64,
) -> Result<(), RegistryError> {
    if value < 0 {
        return Err(invalid(op, field, &format!("must not be negative, got {value}")));
    }
    Ok(())
}

/// Reject a transaction count that existing ledgers cannot represent.
pub(crate) fn require_transaction_count(
    op: &'static str,
    value: u64,
) -> Result<(), RegistryError> {
    if value > MAX_TRANSACTIONS_COUNT {
        return Err(invalid(
            op,
            "transactions_count",
            &format!("must not exceed {MAX_TRANSACTIONS_COUNT}, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn parse_reason(op: &'static str, raw: &str) -> Result<TransferReason, RegistryError> {
    raw.parse().map_err(|e: String| invalid(op, "reason", &e))
}

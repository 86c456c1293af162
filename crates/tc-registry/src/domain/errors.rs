//! # Domain Errors
//!
//! Error types for the Title Registry.
//!
//! ## Design Principles
//!
//! - Every variant names the operation that failed and the ledger key involved
//! - The first error aborts the unit of work, nothing is committed
//! - Outbound failures (`LedgerError`, `CodecError`) are mapped at the port boundary

use thiserror::Error;

/// Errors returned by every registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A record required by the operation is absent.
    #[error("{op}: {key} does not exist")]
    NotFound {
        /// Operation that failed.
        op: &'static str,
        /// Missing key (or sub-record path).
        key: String,
    },

    /// Supplied credential does not match the stored one.
    #[error("{op}: credential mismatch for {key}")]
    CredentialMismatch {
        /// Operation that failed.
        op: &'static str,
        /// Principal key that failed authentication.
        key: String,
    },

    /// The operation would violate a registry invariant.
    #[error("{op}: conflict on {key}: {reason}")]
    Conflict {
        /// Operation that failed.
        op: &'static str,
        /// Key whose state rejected the operation.
        key: String,
        /// Human readable cause.
        reason: String,
    },

    /// Stored bytes could not be decoded, or an expected field is missing.
    #[error("{op}: malformed record at {key}: {reason}")]
    MalformedRecord {
        /// Operation that failed.
        op: &'static str,
        /// Key of the offending record.
        key: String,
        /// Decoder message.
        reason: String,
    },

    /// The ledger collaborator failed (I/O, corruption).
    #[error("{op}: ledger unavailable: {message}")]
    StoreUnavailable {
        /// Operation that failed.
        op: &'static str,
        /// Collaborator message.
        message: String,
    },

    /// Optimistic concurrency check failed; the caller may resubmit.
    #[error("{op}: commit rejected, {key} changed after it was read")]
    CommitRejected {
        /// Operation that failed.
        op: &'static str,
        /// First key of the read set found stale.
        key: String,
    },

    /// Caller input is unusable before any record is touched.
    #[error("{op}: invalid argument `{field}`: {reason}")]
    InvalidArgument {
        /// Operation that failed.
        op: &'static str,
        /// Offending parameter.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl RegistryError {
    /// Map a ledger failure into the registry error space.
    pub fn ledger(op: &'static str, err: LedgerError) -> Self {
        match err {
            LedgerError::ReadConflict { key } => RegistryError::CommitRejected { op, key },
            other => RegistryError::StoreUnavailable {
                op,
                message: other.to_string(),
            },
        }
    }

    /// Map a codec failure for the record stored at `key`.
    pub fn codec(op: &'static str, key: impl Into<String>, err: CodecError) -> Self {
        RegistryError::MalformedRecord {
            op,
            key: key.into(),
            reason: err.to_string(),
        }
    }

    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::NotFound { .. } => "not_found",
            RegistryError::CredentialMismatch { .. } => "credential_mismatch",
            RegistryError::Conflict { .. } => "conflict",
            RegistryError::MalformedRecord { .. } => "malformed_record",
            RegistryError::StoreUnavailable { .. } => "store_unavailable",
            RegistryError::CommitRejected { .. } => "commit_rejected",
            RegistryError::InvalidArgument { .. } => "invalid_argument",
        }
    }

    /// Whether resubmitting the identical call can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::CommitRejected { .. } | RegistryError::StoreUnavailable { .. }
        )
    }
}

/// Errors raised by a `LedgerStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A key in the read set was modified by a concurrent commit.
    #[error("read conflict on {key}")]
    ReadConflict {
        /// Stale key, lossily rendered as text.
        key: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {message}")]
    Io {
        /// Backend message.
        message: String,
    },

    /// Persisted ledger data could not be parsed.
    #[error("corrupted ledger data: {message}")]
    Corrupted {
        /// Parser message.
        message: String,
    },
}

/// Errors raised by a `RecordCodec` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodecError {
    /// Encoder/decoder message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_op_and_key() {
        let err = RegistryError::NotFound {
            op: "approve_sale",
            key: "estate_s001".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("approve_sale"));
        assert!(text.contains("estate_s001"));
    }

    #[test]
    fn test_read_conflict_maps_to_commit_rejected() {
        let err = RegistryError::ledger(
            "accept_request",
            LedgerError::ReadConflict {
                key: "estate_s001".to_string(),
            },
        );
        assert!(matches!(err, RegistryError::CommitRejected { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_maps_to_store_unavailable() {
        let err = RegistryError::ledger(
            "create_user",
            LedgerError::Io {
                message: "disk gone".to_string(),
            },
        );
        assert_eq!(err.kind(), "store_unavailable");
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_conflict_is_not_retryable() {
        let err = RegistryError::Conflict {
            op: "accept_request",
            key: "estate_s001".to_string(),
            reason: "estate is already being sold".to_string(),
        };
        assert!(!err.is_retryable());
    }
}

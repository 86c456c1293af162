//! # Inbound Ports
//!
//! API traits defining what the Title Registry can do.
//!
//! Each call is one synchronous unit of work: authenticate, read, compute the
//! next state, then submit every write in a single commit. The first error
//! aborts the call and nothing is written.

use crate::domain::{
    Estate, EstateParams, EstatePatch, InvariantViolation, LedgerRecord, OfficeAdmin,
    OfficeAdminParams, Request, RegistryError, SaleState, SuperAdmin, SuperAdminSeed,
    TransactionParams, TransactionRecord, User, VerificationStatus,
};

/// Principals and their credentials.
pub trait IdentityApi {
    /// Write the SuperAdmin record. Fails with `Conflict` if it exists.
    fn init_ledger(&self, seed: &SuperAdminSeed) -> Result<SuperAdmin, RegistryError>;

    /// Compare `secret` with the credential stored at `principal_key`.
    ///
    /// `Ok(false)` on mismatch; `NotFound` for an absent key;
    /// `MalformedRecord` when the key does not name a principal or the record
    /// carries no textual credential.
    fn verify_credential(&self, principal_key: &str, secret: &str)
        -> Result<bool, RegistryError>;

    /// Create or replace an office administrator. SuperAdmin only.
    ///
    /// The replacement starts with an empty approval queue.
    fn create_or_replace_office_admin(
        &self,
        caller_key: &str,
        caller_secret: &str,
        params: &OfficeAdminParams,
    ) -> Result<OfficeAdmin, RegistryError>;

    /// Register a user. The initial credential is the uid.
    fn create_user(&self, uid: &str, name: &str) -> Result<User, RegistryError>;

    /// Update name and/or status. `None` keeps the stored value.
    fn modify_user(
        &self,
        uid: &str,
        name: Option<&str>,
        status: Option<VerificationStatus>,
    ) -> Result<User, RegistryError>;

    /// A user sets its own status and credential after authenticating.
    fn verify_user(
        &self,
        caller_key: &str,
        caller_secret: &str,
        status: VerificationStatus,
        new_secret: &str,
    ) -> Result<User, RegistryError>;

    /// Read a user.
    fn user(&self, uid: &str) -> Result<User, RegistryError>;

    /// Read an office administrator.
    fn office_admin(&self, office_code: &str) -> Result<OfficeAdmin, RegistryError>;
}

/// Parcel registration and administration.
pub trait EstateApi {
    /// Register a parcel and add it to the owner's holdings.
    fn create_estate(&self, params: &EstateParams) -> Result<Estate, RegistryError>;

    /// Override the fields set in `patch`.
    fn modify_estate(&self, survey_no: &str, patch: &EstatePatch)
        -> Result<Estate, RegistryError>;

    /// Flip the sale-availability flag.
    fn set_sale_availability(
        &self,
        survey_no: &str,
        available: bool,
    ) -> Result<Estate, RegistryError>;

    /// Set the verification status. Credential-gated.
    fn set_verification_status(
        &self,
        caller_key: &str,
        caller_secret: &str,
        survey_no: &str,
        status: VerificationStatus,
    ) -> Result<Estate, RegistryError>;

    /// Read a parcel.
    fn estate(&self, survey_no: &str) -> Result<Estate, RegistryError>;
}

/// Offer, acceptance and approval of a sale.
pub trait SaleWorkflowApi {
    /// Record an offer, or update the buyer's existing one.
    fn submit_or_update_request(
        &self,
        buyer: &str,
        buyer_name: &str,
        survey_no: &str,
        price: i64,
        timestamp: &str,
    ) -> Result<Request, RegistryError>;

    /// The owner accepts one offer; the parcel waits for registrar approval.
    fn accept_request(
        &self,
        seller_key: &str,
        seller_secret: &str,
        survey_no: &str,
        buyer: &str,
        timestamp: &str,
        reason: &str,
    ) -> Result<TransactionRecord, RegistryError>;

    /// The registrar approves the pending transaction and ownership moves.
    fn approve_sale(
        &self,
        approver_key: &str,
        survey_no: &str,
        action: &str,
        timestamp: &str,
    ) -> Result<Estate, RegistryError>;

    /// Current workflow state of a parcel.
    fn sale_state(&self, survey_no: &str) -> Result<SaleState, RegistryError>;
}

/// Per-parcel transaction log.
pub trait TransactionLogApi {
    /// Write a transaction at a caller-chosen sequence number.
    fn add_transaction(
        &self,
        survey_no: &str,
        sequence: u64,
        params: &TransactionParams,
    ) -> Result<TransactionRecord, RegistryError>;

    /// Read one transaction.
    fn transaction(&self, survey_no: &str, sequence: u64)
        -> Result<TransactionRecord, RegistryError>;

    /// Every transaction of a parcel, by ascending sequence.
    fn transaction_history(
        &self,
        survey_no: &str,
    ) -> Result<Vec<(u64, TransactionRecord)>, RegistryError>;
}

/// Operational debugging surface. Not part of the workflow contract.
pub trait LedgerInspectionApi {
    /// Decode whatever is stored at `key`.
    fn read_raw_record(&self, key: &str) -> Result<LedgerRecord, RegistryError>;

    /// Delete `key` unconditionally.
    fn delete_record(&self, key: &str) -> Result<(), RegistryError>;

    /// `Key: <k>, Value: <v>` lines for every key in `[start, end)`.
    fn scan_range(&self, start: &str, end: &str) -> Result<Vec<String>, RegistryError>;

    /// Check the cross-record rules over the whole ledger.
    fn audit_invariants(&self) -> Result<Vec<InvariantViolation>, RegistryError>;
}

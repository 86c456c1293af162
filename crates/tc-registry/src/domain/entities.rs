//! # Domain Entities
//!
//! Records persisted in the ledger, one per key.
//!
//! Field names on the wire are fixed: ledgers written by earlier deployments
//! must keep decoding, so every struct renames its fields explicitly.

use super::invariants::{push_unique, remove_unique};
use super::keys::RecordKey;
use super::value_objects::{SaleState, Timestamp, TransferReason, VerificationStatus};
use serde::{Deserialize, Deserializer, Serialize};

/// Largest transaction count an estate may carry; counts are signed 64-bit
/// integers in existing ledgers.
pub const MAX_TRANSACTIONS_COUNT: u64 = i64::MAX as u64;

/// The registry's super administrator, stored at `admin_super`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperAdmin {
    /// Plaintext credential.
    #[serde(rename = "password")]
    pub credential: String,
    /// Identifier of the person holding the role.
    pub uid: String,
    /// Display name.
    pub name: String,
}

/// Administrator of a registrar office, stored at `admin_<officeCode>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeAdmin {
    /// Plaintext credential.
    #[serde(rename = "password")]
    pub credential: String,
    /// Identifier of the registrar.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Transaction keys awaiting this office's approval, in arrival order.
    #[serde(rename = "toApprove", default, deserialize_with = "null_as_empty")]
    pub to_approve: Vec<String>,
}

impl OfficeAdmin {
    /// Fresh admin with an empty approval queue.
    pub fn new(credential: &str, uid: &str, name: &str) -> Self {
        Self {
            credential: credential.to_string(),
            uid: uid.to_string(),
            name: name.to_string(),
            to_approve: Vec::new(),
        }
    }

    /// Queue a transaction key for approval.
    pub fn enqueue(&mut self, tx_key: &RecordKey) {
        push_unique(&mut self.to_approve, tx_key.to_string());
    }

    /// Remove a transaction key from the queue. Returns whether it was queued.
    pub fn dequeue(&mut self, tx_key: &RecordKey) -> bool {
        remove_unique(&mut self.to_approve, &tx_key.to_string())
    }
}

/// End user, stored at `user_<uid>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Plaintext credential.
    #[serde(rename = "password")]
    pub credential: String,
    /// User identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Verification status.
    #[serde(default)]
    pub status: VerificationStatus,
    /// Survey numbers currently owned.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub owned: Vec<String>,
}

impl User {
    /// New unverified user whose credential is its own uid.
    pub fn new(uid: &str, name: &str) -> Self {
        Self {
            credential: uid.to_string(),
            uid: uid.to_string(),
            name: name.to_string(),
            status: VerificationStatus::Unverified,
            owned: Vec::new(),
        }
    }

    /// Whether `survey_no` is among this user's holdings.
    pub fn owns(&self, survey_no: &str) -> bool {
        self.owned.iter().any(|s| s == survey_no)
    }

    /// Add a holding.
    pub fn add_holding(&mut self, survey_no: &str) {
        push_unique(&mut self.owned, survey_no.to_string());
    }

    /// Drop a holding. Returns whether it was held.
    pub fn remove_holding(&mut self, survey_no: &str) -> bool {
        remove_unique(&mut self.owned, survey_no)
    }
}

/// A buyer's open offer, embedded in an [`Estate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Buyer uid.
    pub buyer: String,
    /// Buyer display name, fixed by the first offer.
    pub name: String,
    /// Offered price.
    pub proposed_price: i64,
    /// When the offer was made or last updated.
    pub date_time: Timestamp,
}

/// Entry of a parcel's transaction log, stored at
/// `transaction_<surveyNo>_<sequence>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Seller uid.
    pub seller: String,
    /// Buyer uid.
    pub buyer: String,
    /// When the seller accepted the offer.
    pub transaction_date_time: Timestamp,
    /// Office the estate belongs to.
    pub office_code: String,
    /// Uid of the approving registrar, empty until approved.
    #[serde(default)]
    pub approved_by: String,
    /// Approval time, zero until approved.
    #[serde(default)]
    pub approved_date_time: Timestamp,
    /// Agreed price.
    pub price: i64,
    /// Why ownership moves.
    pub reason: TransferReason,
}

impl TransactionRecord {
    /// Unapproved transaction, as created by an accepted offer.
    pub fn pending(
        seller: &str,
        buyer: &str,
        accepted_at: Timestamp,
        office_code: &str,
        price: i64,
        reason: TransferReason,
    ) -> Self {
        Self {
            seller: seller.to_string(),
            buyer: buyer.to_string(),
            transaction_date_time: accepted_at,
            office_code: office_code.to_string(),
            approved_by: String::new(),
            approved_date_time: Timestamp::zero(),
            price,
            reason,
        }
    }

    /// Whether a registrar has signed off.
    pub fn is_approved(&self) -> bool {
        !self.approved_by.is_empty()
    }

    /// Stamp the approval.
    pub fn approve(&mut self, approver_uid: &str, at: Timestamp) {
        self.approved_by = approver_uid.to_string();
        self.approved_date_time = at;
    }
}

/// A land parcel, stored at `estate_<surveyNo>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estate {
    /// Owner uid.
    pub owner: String,
    /// Registrar office responsible for the parcel.
    pub office_code: String,
    /// Address.
    pub location: String,
    /// Area in square metres.
    pub area: i64,
    /// Verification status.
    #[serde(default)]
    pub status: VerificationStatus,
    /// When the current owner acquired the parcel.
    pub purchased_on: Timestamp,
    /// Whether the owner advertises the parcel for sale.
    #[serde(default)]
    pub sale_availability: bool,
    /// Number of approved transactions.
    pub transactions_count: u64,
    /// Open offers, one per buyer.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requests: Vec<Request>,
    /// An offer was accepted and awaits approval.
    #[serde(default)]
    pub being_sold: bool,
}

impl Estate {
    /// Newly registered parcel: unverified, not for sale, no offers.
    pub fn new(params: &EstateParams) -> Self {
        Self {
            owner: params.owner.clone(),
            office_code: params.office_code.clone(),
            location: params.location.clone(),
            area: params.area,
            status: VerificationStatus::Unverified,
            purchased_on: Timestamp::parse_lenient(&params.acquired_at),
            sale_availability: false,
            transactions_count: params.transactions_count,
            requests: Vec::new(),
            being_sold: false,
        }
    }

    /// Workflow state derived from the flags.
    pub fn sale_state(&self) -> SaleState {
        if self.being_sold {
            SaleState::PendingApproval
        } else if self.requests.is_empty() {
            SaleState::Open
        } else {
            SaleState::Negotiating
        }
    }

    /// Sequence number the next transaction is written at, `None` once the
    /// count is exhausted.
    pub fn next_sequence(&self) -> Option<u64> {
        self.transactions_count.checked_add(1)
    }

    /// Open offer from `buyer`, if any.
    pub fn find_request(&self, buyer: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.buyer == buyer)
    }

    /// Record an offer. A repeat offer from the same buyer overwrites the
    /// price and time in place and keeps the original name.
    pub fn upsert_request(&mut self, offer: Request) -> Request {
        match self.requests.iter_mut().find(|r| r.buyer == offer.buyer) {
            Some(existing) => {
                existing.proposed_price = offer.proposed_price;
                existing.date_time = offer.date_time;
                existing.clone()
            }
            None => {
                self.requests.push(offer.clone());
                offer
            }
        }
    }

    /// Freeze the parcel pending approval. Every open offer is discarded.
    pub fn begin_sale(&mut self) {
        self.requests.clear();
        self.being_sold = true;
    }

    /// Hand the parcel to `buyer` and close the sale cycle.
    pub fn complete_transfer(&mut self, buyer: &str, at: Timestamp) {
        self.owner = buyer.to_string();
        self.purchased_on = at;
        self.sale_availability = false;
        self.being_sold = false;
        self.transactions_count = self.transactions_count.saturating_add(1);
    }

    /// Apply the fields set in `patch`.
    pub fn apply_patch(&mut self, patch: &EstatePatch) {
        if let Some(office_code) = &patch.office_code {
            self.office_code = office_code.clone();
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(area) = patch.area {
            self.area = area;
        }
        if let Some(acquired_at) = &patch.acquired_at {
            self.purchased_on = Timestamp::parse_lenient(acquired_at);
        }
        if let Some(count) = patch.transactions_count {
            self.transactions_count = count;
        }
    }
}

/// Parameters for registering a parcel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EstateParams {
    /// Registrar office.
    pub office_code: String,
    /// Survey number.
    pub survey_no: String,
    /// Owner uid.
    pub owner: String,
    /// Address.
    pub location: String,
    /// Area in square metres.
    pub area: i64,
    /// RFC 3339 acquisition time.
    pub acquired_at: String,
    /// Transactions already completed before registration.
    pub transactions_count: u64,
}

/// Per-field overrides for an estate. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EstatePatch {
    /// New office code.
    pub office_code: Option<String>,
    /// New address.
    pub location: Option<String>,
    /// New area.
    pub area: Option<i64>,
    /// New acquisition time, RFC 3339.
    pub acquired_at: Option<String>,
    /// New completed-transaction count.
    pub transactions_count: Option<u64>,
}

impl EstatePatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.office_code.is_none()
            && self.location.is_none()
            && self.area.is_none()
            && self.acquired_at.is_none()
            && self.transactions_count.is_none()
    }

    /// Whether the patch touches fields the sale workflow depends on.
    pub fn touches_workflow(&self) -> bool {
        self.office_code.is_some() || self.transactions_count.is_some()
    }
}

/// Parameters for creating or replacing an office administrator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfficeAdminParams {
    /// Office code, also the key suffix.
    pub office_code: String,
    /// Credential of the new admin.
    pub credential: String,
    /// Registrar uid.
    pub uid: String,
    /// Display name.
    pub name: String,
}

/// Raw fields of a backfilled transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionParams {
    /// Seller uid.
    pub seller: String,
    /// Buyer uid.
    pub buyer: String,
    /// `sell`, `sale`, `inheritance` or `gift`.
    pub reason: String,
    /// Agreed price.
    pub price: i64,
    /// RFC 3339 acceptance time.
    pub transaction_at: String,
    /// Office code.
    pub office_code: String,
    /// Approver uid, empty if unapproved.
    pub approved_by: String,
    /// RFC 3339 approval time.
    pub approved_at: String,
}

/// Seed for the SuperAdmin written by `init_ledger`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuperAdminSeed {
    /// Identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Plaintext credential.
    pub credential: String,
}

impl Default for SuperAdminSeed {
    fn default() -> Self {
        Self {
            uid: "123456789012".to_string(),
            name: "FName MName LName".to_string(),
            credential: "123456".to_string(),
        }
    }
}

impl From<&SuperAdminSeed> for SuperAdmin {
    fn from(seed: &SuperAdminSeed) -> Self {
        Self {
            credential: seed.credential.clone(),
            uid: seed.uid.clone(),
            name: seed.name.clone(),
        }
    }
}

/// An authenticated party, decoded according to its key prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    /// `admin_super`
    SuperAdmin(SuperAdmin),
    /// `admin_<officeCode>`
    OfficeAdmin(OfficeAdmin),
    /// `user_<uid>`
    User(User),
}

impl Principal {
    /// Stored credential.
    pub fn credential(&self) -> &str {
        match self {
            Principal::SuperAdmin(admin) => &admin.credential,
            Principal::OfficeAdmin(admin) => &admin.credential,
            Principal::User(user) => &user.credential,
        }
    }

    /// Identifier of the person behind the principal.
    pub fn uid(&self) -> &str {
        match self {
            Principal::SuperAdmin(admin) => &admin.uid,
            Principal::OfficeAdmin(admin) => &admin.uid,
            Principal::User(user) => &user.uid,
        }
    }
}

/// Any ledger record, typed by its key prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LedgerRecord {
    /// `admin_super`
    SuperAdmin(SuperAdmin),
    /// `admin_<officeCode>`
    OfficeAdmin(OfficeAdmin),
    /// `user_<uid>`
    User(User),
    /// `estate_<surveyNo>`
    Estate(Estate),
    /// `transaction_<surveyNo>_<n>`
    Transaction(TransactionRecord),
    /// Unknown prefix, raw bytes rendered as text.
    Opaque(String),
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

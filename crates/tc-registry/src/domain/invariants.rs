//! # Domain Invariants
//!
//! Cross-record consistency rules of the registry, and a snapshot auditor
//! that checks them over a full ledger scan.
//!
//! | Rule | Statement |
//! |------|-----------|
//! | Holdings | the owner lists the estate, no other user does |
//! | Count | `transactionsCount` equals the approved transactions; a pending one sits at `count + 1` |
//! | Freeze | `beingSold` implies no offers and a pending transaction at `count + 1` |
//! | Queue | an office queue holds exactly the pending transactions of its office |
//! | Offers | one offer per buyer per estate |

use super::entities::{Estate, LedgerRecord, OfficeAdmin, TransactionRecord, User};
use super::keys::RecordKey;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Append `value` unless already present.
pub fn push_unique(seq: &mut Vec<String>, value: String) {
    if !seq.contains(&value) {
        seq.push(value);
    }
}

/// Remove the element equal to `value`. Returns whether one was removed.
pub fn remove_unique(seq: &mut Vec<String>, value: &str) -> bool {
    match seq.iter().position(|s| s == value) {
        Some(index) => {
            seq.remove(index);
            true
        }
        None => false,
    }
}

/// Invariant: every offer on an estate comes from a different buyer.
pub fn invariant_distinct_buyers(estate: &Estate) -> bool {
    let mut seen = BTreeSet::new();
    estate.requests.iter().all(|r| seen.insert(r.buyer.as_str()))
}

/// Invariant: a frozen estate has no open offers.
pub fn invariant_frozen_without_offers(estate: &Estate) -> bool {
    !estate.being_sold || estate.requests.is_empty()
}

/// A broken cross-record rule found by [`LedgerSnapshot::violations`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The owner's holdings do not list the estate.
    #[error("estate {survey_no}: owner {owner} does not list it")]
    OwnerMissingHolding { survey_no: String, owner: String },

    /// A user other than the owner lists the estate.
    #[error("estate {survey_no}: listed by non-owner {uid}")]
    ForeignHolding { survey_no: String, uid: String },

    /// Approved transaction count disagrees with the estate.
    #[error("estate {survey_no}: transactionsCount {recorded} but {approved} approved transactions")]
    CountMismatch {
        survey_no: String,
        recorded: u64,
        approved: u64,
    },

    /// An unapproved transaction is not at `count + 1`.
    #[error("transaction {key}: unapproved but not next in sequence")]
    StrayPendingTransaction { key: String },

    /// A frozen estate still has offers.
    #[error("estate {survey_no}: being sold with open requests")]
    FrozenWithRequests { survey_no: String },

    /// A frozen estate has no pending transaction.
    #[error("estate {survey_no}: being sold without a pending transaction")]
    FrozenWithoutTransaction { survey_no: String },

    /// A queue entry is not a pending transaction of that office.
    #[error("office {office_code}: queue entry {key} is not awaiting this office")]
    StaleQueueEntry { office_code: String, key: String },

    /// A pending sale is missing from its office queue.
    #[error("office {office_code}: pending transaction {key} is not queued")]
    UnqueuedTransaction { office_code: String, key: String },

    /// Two offers from the same buyer.
    #[error("estate {survey_no}: duplicate offers from buyers")]
    DuplicateBuyer { survey_no: String },

    /// A `transaction_` key whose sequence is not canonical, e.g. zero-padded.
    #[error("key {key}: not a valid transaction key")]
    MalformedTransactionKey { key: String },
}

/// Typed view over every record in a ledger.
#[derive(Debug, Default, Clone)]
pub struct LedgerSnapshot {
    office_admins: BTreeMap<String, OfficeAdmin>,
    users: BTreeMap<String, User>,
    estates: BTreeMap<String, Estate>,
    transactions: BTreeMap<(String, u64), TransactionRecord>,
    malformed_keys: BTreeSet<String>,
}

impl LedgerSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded record. Records that do not take part in any rule are ignored.
    pub fn insert(&mut self, key: RecordKey, record: LedgerRecord) {
        match (key, record) {
            (RecordKey::OfficeAdmin(code), LedgerRecord::OfficeAdmin(admin)) => {
                self.office_admins.insert(code, admin);
            }
            (RecordKey::User(uid), LedgerRecord::User(user)) => {
                self.users.insert(uid, user);
            }
            (RecordKey::Estate(survey_no), LedgerRecord::Estate(estate)) => {
                self.estates.insert(survey_no, estate);
            }
            (
                RecordKey::Transaction {
                    survey_no,
                    sequence,
                },
                LedgerRecord::Transaction(tx),
            ) => {
                self.transactions.insert((survey_no, sequence), tx);
            }
            (key, _) if key.is_malformed_transaction() => {
                self.malformed_keys.insert(key.to_string());
            }
            _ => {}
        }
    }

    /// Every broken rule, in a deterministic order.
    pub fn violations(&self) -> Vec<InvariantViolation> {
        let mut found = Vec::new();
        self.check_holdings(&mut found);
        self.check_transactions(&mut found);
        self.check_queues(&mut found);
        for (survey_no, estate) in &self.estates {
            if !invariant_distinct_buyers(estate) {
                found.push(InvariantViolation::DuplicateBuyer {
                    survey_no: survey_no.clone(),
                });
            }
        }
        for key in &self.malformed_keys {
            found.push(InvariantViolation::MalformedTransactionKey { key: key.clone() });
        }
        found
    }

    fn check_holdings(&self, found: &mut Vec<InvariantViolation>) {
        for (survey_no, estate) in &self.estates {
            let owner_lists = self
                .users
                .get(&estate.owner)
                .is_some_and(|u| u.owns(survey_no));
            if !owner_lists {
                found.push(InvariantViolation::OwnerMissingHolding {
                    survey_no: survey_no.clone(),
                    owner: estate.owner.clone(),
                });
            }
            for (uid, user) in &self.users {
                if uid != &estate.owner && user.owns(survey_no) {
                    found.push(InvariantViolation::ForeignHolding {
                        survey_no: survey_no.clone(),
                        uid: uid.clone(),
                    });
                }
            }
        }
    }

    fn check_transactions(&self, found: &mut Vec<InvariantViolation>) {
        for (survey_no, estate) in &self.estates {
            let log = self.log_of(survey_no);
            let approved = log.iter().filter(|(_, tx)| tx.is_approved()).count() as u64;
            if approved != estate.transactions_count {
                found.push(InvariantViolation::CountMismatch {
                    survey_no: survey_no.clone(),
                    recorded: estate.transactions_count,
                    approved,
                });
            }
            for (sequence, tx) in &log {
                if !tx.is_approved() && Some(*sequence) != estate.next_sequence() {
                    found.push(InvariantViolation::StrayPendingTransaction {
                        key: RecordKey::transaction(survey_no, *sequence).to_string(),
                    });
                }
            }
            if estate.being_sold {
                if !invariant_frozen_without_offers(estate) {
                    found.push(InvariantViolation::FrozenWithRequests {
                        survey_no: survey_no.clone(),
                    });
                }
                if self.pending_of(survey_no, estate).is_none() {
                    found.push(InvariantViolation::FrozenWithoutTransaction {
                        survey_no: survey_no.clone(),
                    });
                }
            }
        }
    }

    fn check_queues(&self, found: &mut Vec<InvariantViolation>) {
        // Transactions awaiting approval, keyed by office.
        let mut awaiting: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for (survey_no, estate) in &self.estates {
            if !estate.being_sold {
                continue;
            }
            if let (Some(tx), Some(sequence)) =
                (self.pending_of(survey_no, estate), estate.next_sequence())
            {
                awaiting
                    .entry(tx.office_code.as_str())
                    .or_default()
                    .insert(RecordKey::transaction(survey_no, sequence).to_string());
            }
        }

        for (office_code, admin) in &self.office_admins {
            let expected = awaiting.get(office_code.as_str());
            for key in &admin.to_approve {
                if !expected.is_some_and(|keys| keys.contains(key)) {
                    found.push(InvariantViolation::StaleQueueEntry {
                        office_code: office_code.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        for (office_code, keys) in &awaiting {
            let queue = self.office_admins.get(*office_code).map(|a| &a.to_approve);
            for key in keys {
                if !queue.is_some_and(|q| q.contains(key)) {
                    found.push(InvariantViolation::UnqueuedTransaction {
                        office_code: office_code.to_string(),
                        key: key.clone(),
                    });
                }
            }
        }
    }

    fn log_of(&self, survey_no: &str) -> Vec<(u64, &TransactionRecord)> {
        self.transactions
            .iter()
            .filter(|((s, _), _)| s == survey_no)
            .map(|((_, seq), tx)| (*seq, tx))
            .collect()
    }

    fn pending_of(&self, survey_no: &str, estate: &Estate) -> Option<&TransactionRecord> {
        let sequence = estate.next_sequence()?;
        self.transactions
            .get(&(survey_no.to_string(), sequence))
            .filter(|tx| !tx.is_approved())
    }
}

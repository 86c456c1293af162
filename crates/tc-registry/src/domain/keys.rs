//! # Ledger Key Scheme
//!
//! Every record lives under its own key. The naming must stay bit-exact so
//! existing ledger snapshots remain readable:
//!
//! | Record | Key |
//! |--------|-----|
//! | SuperAdmin | `admin_super` |
//! | OfficeAdmin | `admin_<officeCode>` |
//! | User | `user_<uid>` |
//! | Estate | `estate_<surveyNo>` |
//! | Transaction | `transaction_<surveyNo>_<sequence>` |

use std::fmt;

/// Key of the singleton SuperAdmin record.
pub const SUPER_ADMIN_KEY: &str = "admin_super";
/// Office code reserved by the SuperAdmin key.
pub const RESERVED_OFFICE_CODE: &str = "super";

const ADMIN_PREFIX: &str = "admin_";
const USER_PREFIX: &str = "user_";
const ESTATE_PREFIX: &str = "estate_";
const TRANSACTION_PREFIX: &str = "transaction_";

/// Role of a principal, decided by the key prefix alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    /// `admin_super`
    SuperAdmin,
    /// `admin_<officeCode>`
    OfficeAdmin,
    /// `user_<uid>`
    User,
}

/// A typed ledger key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    /// The registry's super administrator.
    SuperAdmin,
    /// Administrator of one registrar office.
    OfficeAdmin(String),
    /// End user, keyed by uid.
    User(String),
    /// Land parcel, keyed by survey number.
    Estate(String),
    /// Entry of an estate's transaction log.
    Transaction {
        /// Survey number of the estate.
        survey_no: String,
        /// Dense, 1-based sequence number.
        sequence: u64,
    },
    /// Any key outside the scheme.
    Other(String),
}

impl RecordKey {
    /// Key of the admin for `office_code`.
    pub fn office_admin(office_code: &str) -> Self {
        RecordKey::OfficeAdmin(office_code.to_string())
    }

    /// Key of the user `uid`.
    pub fn user(uid: &str) -> Self {
        RecordKey::User(uid.to_string())
    }

    /// Key of the estate `survey_no`.
    pub fn estate(survey_no: &str) -> Self {
        RecordKey::Estate(survey_no.to_string())
    }

    /// Key of transaction `sequence` for `survey_no`.
    pub fn transaction(survey_no: &str, sequence: u64) -> Self {
        RecordKey::Transaction {
            survey_no: survey_no.to_string(),
            sequence,
        }
    }

    /// Classify a raw key by prefix.
    ///
    /// `transaction_` keys must end in `_<digits>` written without leading
    /// zeros to be recognised, so a parsed key always formats back to `raw`.
    /// Anything else (and any prefix with an empty remainder) is `Other`.
    pub fn parse(raw: &str) -> Self {
        if raw == SUPER_ADMIN_KEY {
            return RecordKey::SuperAdmin;
        }
        if let Some(code) = non_empty(raw.strip_prefix(ADMIN_PREFIX)) {
            return RecordKey::OfficeAdmin(code.to_string());
        }
        if let Some(uid) = non_empty(raw.strip_prefix(USER_PREFIX)) {
            return RecordKey::User(uid.to_string());
        }
        if let Some(survey_no) = non_empty(raw.strip_prefix(ESTATE_PREFIX)) {
            return RecordKey::Estate(survey_no.to_string());
        }
        if let Some(rest) = raw.strip_prefix(TRANSACTION_PREFIX) {
            if let Some((survey_no, seq)) = rest.rsplit_once('_') {
                if !survey_no.is_empty() && is_sequence(seq) {
                    if let Ok(sequence) = seq.parse() {
                        return RecordKey::transaction(survey_no, sequence);
                    }
                }
            }
        }
        RecordKey::Other(raw.to_string())
    }

    /// Role named by this key, if it addresses a principal.
    pub fn principal_kind(&self) -> Option<PrincipalKind> {
        match self {
            RecordKey::SuperAdmin => Some(PrincipalKind::SuperAdmin),
            RecordKey::OfficeAdmin(_) => Some(PrincipalKind::OfficeAdmin),
            RecordKey::User(_) => Some(PrincipalKind::User),
            _ => None,
        }
    }

    /// `Other` key carrying the transaction prefix, e.g. `transaction_s001_01`.
    pub fn is_malformed_transaction(&self) -> bool {
        matches!(self, RecordKey::Other(raw) if raw.starts_with(TRANSACTION_PREFIX))
    }

    /// Raw bytes handed to the ledger.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::SuperAdmin => f.write_str(SUPER_ADMIN_KEY),
            RecordKey::OfficeAdmin(code) => write!(f, "{ADMIN_PREFIX}{code}"),
            RecordKey::User(uid) => write!(f, "{USER_PREFIX}{uid}"),
            RecordKey::Estate(survey_no) => write!(f, "{ESTATE_PREFIX}{survey_no}"),
            RecordKey::Transaction {
                survey_no,
                sequence,
            } => write!(f, "{TRANSACTION_PREFIX}{survey_no}_{sequence}"),
            RecordKey::Other(raw) => f.write_str(raw),
        }
    }
}

/// Common prefix of every transaction of `survey_no`.
pub fn transaction_prefix(survey_no: &str) -> String {
    format!("{TRANSACTION_PREFIX}{survey_no}_")
}

/// Half-open key range `[prefix, successor)` covering every key with `prefix`.
pub fn prefix_range(prefix: &str) -> (Vec<u8>, Vec<u8>) {
    let start = prefix.as_bytes().to_vec();
    let mut end = start.clone();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return (start, end);
        }
    }
    // Empty (or all-0xFF) prefix: scan to the end of the key space.
    (start, vec![u8::MAX])
}

fn non_empty(part: Option<&str>) -> Option<&str> {
    part.filter(|s| !s.is_empty())
}

fn is_sequence(raw: &str) -> bool {
    !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'))
}

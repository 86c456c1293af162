//! # Domain Value Objects
//!
//! Immutable value types shared by the registry records.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Textual form of the zero timestamp.
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_UNIX_SECONDS: i64 = -62_135_596_800;

/// Verification state of a user or an estate.
///
/// Persisted as an integer: 0/1/2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VerificationStatus {
    /// Not yet verified.
    #[default]
    Unverified,
    /// Verified by a registrar.
    Verified,
    /// Suspended.
    Suspended,
}

impl TryFrom<i64> for VerificationStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unverified),
            1 => Ok(Self::Verified),
            2 => Ok(Self::Suspended),
            other => Err(format!("unknown verification status {other}")),
        }
    }
}

impl From<VerificationStatus> for i64 {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Unverified => 0,
            VerificationStatus::Verified => 1,
            VerificationStatus::Suspended => 2,
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "unverified" => Ok(Self::Unverified),
            "1" | "verified" => Ok(Self::Verified),
            "2" | "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown verification status `{other}`")),
        }
    }
}

/// Why ownership moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferReason {
    /// Sale to a buyer. Stored as `sell`.
    #[serde(rename = "sell", alias = "sale")]
    Sale,
    /// Inheritance.
    Inheritance,
    /// Gift.
    Gift,
}

impl TransferReason {
    /// Stored textual form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferReason::Sale => "sell",
            TransferReason::Inheritance => "inheritance",
            TransferReason::Gift => "gift",
        }
    }
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sell" | "sale" => Ok(Self::Sale),
            "inheritance" => Ok(Self::Inheritance),
            "gift" => Ok(Self::Gift),
            other => Err(format!("unknown transfer reason `{other}`")),
        }
    }
}

/// Sale workflow state, derived from estate flags.
///
/// A completed transfer immediately re-enters `Open`, so "transferred" is
/// never observable as a resting state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SaleState {
    /// Not being sold, no offers.
    Open,
    /// Not being sold, at least one offer.
    Negotiating,
    /// An offer was accepted and awaits registrar approval.
    PendingApproval,
}

impl SaleState {
    /// Buyers may submit or update offers.
    pub fn accepts_offers(&self) -> bool {
        !matches!(self, SaleState::PendingApproval)
    }
}

/// RFC 3339 instant with an explicit zero value.
///
/// The zero value serialises as `0001-01-01T00:00:00Z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timestamp(Option<DateTime<FixedOffset>>);

impl Timestamp {
    /// The zero timestamp.
    pub fn zero() -> Self {
        Self(None)
    }

    /// Parse RFC 3339 text, degrading to zero on failure.
    ///
    /// Lenient on purpose: callers historically relied on bad input being
    /// stored as the zero value instead of failing the operation.
    pub fn parse_lenient(raw: &str) -> Self {
        match Self::parse_strict(raw) {
            Ok(ts) => ts,
            Err(err) => {
                tracing::warn!(input = raw, error = %err, "unparseable timestamp stored as zero value");
                Self::zero()
            }
        }
    }

    /// Parse RFC 3339 text.
    pub fn parse_strict(raw: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(Self::from_datetime)
    }

    /// Wrap a datetime, normalising the zero instant.
    pub fn from_datetime(dt: DateTime<FixedOffset>) -> Self {
        if dt.timestamp() == ZERO_UNIX_SECONDS && dt.timestamp_subsec_nanos() == 0 {
            Self(None)
        } else {
            Self(Some(dt))
        }
    }

    /// Whether this is the zero value.
    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    /// Underlying datetime, `None` for zero.
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        self.0.as_ref()
    }

    /// RFC 3339 rendering, `Z` for UTC.
    pub fn to_rfc3339(&self) -> String {
        match &self.0 {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => ZERO_TIMESTAMP.to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_strict(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_integer_encoding() {
        assert_eq!(serde_json::to_string(&VerificationStatus::Verified).unwrap(), "1");
        let parsed: VerificationStatus = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, VerificationStatus::Suspended);
        assert!(serde_json::from_str::<VerificationStatus>("7").is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("verified".parse(), Ok(VerificationStatus::Verified));
        assert_eq!("0".parse(), Ok(VerificationStatus::Unverified));
        assert!("-1".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn test_reason_accepts_sale_alias() {
        let parsed: TransferReason = serde_json::from_str("\"sale\"").unwrap();
        assert_eq!(parsed, TransferReason::Sale);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"sell\"");
        assert_eq!("Gift".parse(), Ok(TransferReason::Gift));
    }

    #[test]
    fn test_sale_state_rules() {
        assert!(SaleState::Open.accepts_offers());
        assert!(SaleState::Negotiating.accepts_offers());
        assert!(!SaleState::PendingApproval.accepts_offers());
    }

    #[test]
    fn test_timestamp_keeps_offset() {
        let ts = Timestamp::parse_lenient("2021-12-15T20:34:33+05:30");
        assert!(!ts.is_zero());
        assert_eq!(ts.to_rfc3339(), "2021-12-15T20:34:33+05:30");
    }

    #[test]
    fn test_timestamp_utc_uses_z() {
        let ts = Timestamp::parse_lenient("2022-01-02T03:04:05+00:00");
        assert_eq!(ts.to_string(), "2022-01-02T03:04:05Z");
    }

    #[test]
    fn test_unparseable_timestamp_degrades_to_zero() {
        let ts = Timestamp::parse_lenient("yesterday");
        assert!(ts.is_zero());
        assert_eq!(ts.to_string(), ZERO_TIMESTAMP);
    }

    #[test]
    fn test_zero_timestamp_roundtrip() {
        let json = serde_json::to_string(&Timestamp::zero()).unwrap();
        assert_eq!(json, format!("\"{ZERO_TIMESTAMP}\""));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert!(back.is_zero());
    }
}

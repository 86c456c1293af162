//! Record Codec Adapters
//!
//! Implementations of the `RecordCodec` trait.

use crate::domain::errors::CodecError;
use crate::ports::outbound::RecordCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default record codec using JSON, the format existing ledgers are written in.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecordCodec;

impl RecordCodec for JsonRecordCodec {
    fn encode<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(record).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }
}

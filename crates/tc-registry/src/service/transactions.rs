//! # Transaction Log Implementation
//!
//! Direct backfill of log entries and ordered reads.

use super::helpers::{invalid, parse_reason, require_non_empty, require_non_negative};
use super::*;
use crate::domain::{
    prefix_range, transaction_prefix, RecordKey, RegistryError, Timestamp, TransactionParams,
    TransactionRecord,
};
use crate::ports::inbound::TransactionLogApi;
use tracing::{info, info_span};

impl<L, C> TransactionLogApi for RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    fn add_transaction(
        &self,
        survey_no: &str,
        sequence: u64,
        params: &TransactionParams,
    ) -> Result<TransactionRecord, RegistryError> {
        const OP: &str = "add_transaction";
        let _span = info_span!("add_transaction", survey_no, sequence).entered();
        require_non_empty(OP, "survey_no", survey_no)?;
        if sequence == 0 {
            return Err(invalid(OP, "sequence", "sequence numbers start at 1"));
        }
        require_non_negative(OP, "price", params.price)?;
        let reason = parse_reason(OP, &params.reason)?;

        let tx = TransactionRecord {
            seller: params.seller.clone(),
            buyer: params.buyer.clone(),
            transaction_date_time: Timestamp::parse_lenient(&params.transaction_at),
            office_code: params.office_code.clone(),
            approved_by: params.approved_by.clone(),
            approved_date_time: Timestamp::parse_lenient(&params.approved_at),
            price: params.price,
            reason,
        };

        let mut uow = self.begin(OP);
        uow.stage(&RecordKey::transaction(survey_no, sequence), &tx)?;
        uow.commit()?;

        info!("[tc-registry] transaction {} #{} written", survey_no, sequence);
        Ok(tx)
    }

    fn transaction(
        &self,
        survey_no: &str,
        sequence: u64,
    ) -> Result<TransactionRecord, RegistryError> {
        self.begin("transaction")
            .load(&RecordKey::transaction(survey_no, sequence))
    }

    fn transaction_history(
        &self,
        survey_no: &str,
    ) -> Result<Vec<(u64, TransactionRecord)>, RegistryError> {
        const OP: &str = "transaction_history";
        let (start, end) = prefix_range(&transaction_prefix(survey_no));
        let rows = self
            .ledger
            .range_scan(&start, &end)
            .map_err(|e| RegistryError::ledger(OP, e))?;

        let mut history = Vec::new();
        for row in rows {
            let (raw_key, bytes) = row.map_err(|e| RegistryError::ledger(OP, e))?;
            let key = RecordKey::parse(&String::from_utf8_lossy(&raw_key));
            // A longer survey number can share the prefix, e.g. `s_1` under `s`.
            let sequence = match &key {
                RecordKey::Transaction {
                    survey_no: owner,
                    sequence,
                } if owner == survey_no => *sequence,
                _ => continue,
            };
            let tx: TransactionRecord = self
                .codec
                .decode(&bytes)
                .map_err(|e| RegistryError::codec(OP, key.to_string(), e))?;
            history.push((sequence, tx));
        }
        history.sort_by_key(|(sequence, _)| *sequence);
        Ok(history)
    }
}

//! # Sale Workflow Implementation
//!
//! Offer, acceptance and approval of a parcel sale.
//!
//! ```text
//!   Open ──offer──→ Negotiating ──accept──→ PendingApproval ──approve──→ Open
//!                     │    ↑                                        (new owner)
//!                     └────┘ repeat offer overwrites
//! ```
//!
//! Acceptance discards every other open offer. Each transition stages all
//! affected records and commits them together.

use super::helpers::{conflict, not_found, parse_reason, require_non_empty, require_non_negative};
use super::*;
use crate::domain::{
    Estate, OfficeAdmin, Principal, RecordKey, RegistryError, Request, SaleState, Timestamp,
    TransactionRecord, User,
};
use crate::ports::inbound::SaleWorkflowApi;
use tracing::{info, info_span, warn};

impl<L, C> SaleWorkflowApi for RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    fn submit_or_update_request(
        &self,
        buyer: &str,
        buyer_name: &str,
        survey_no: &str,
        price: i64,
        timestamp: &str,
    ) -> Result<Request, RegistryError> {
        const OP: &str = "submit_or_update_request";
        let _span = info_span!("submit_or_update_request", survey_no, buyer).entered();
        require_non_empty(OP, "buyer", buyer)?;
        require_non_negative(OP, "price", price)?;

        let mut uow = self.begin(OP);
        let estate_key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&estate_key)?;
        if !estate.sale_state().accepts_offers() {
            return Err(conflict(OP, &estate_key, "a sale is pending approval"));
        }
        if estate.owner == buyer {
            return Err(conflict(OP, &estate_key, "the owner cannot bid on its own estate"));
        }
        // The buyer must be a registered user.
        let _: User = uow.load(&RecordKey::user(buyer))?;

        let stored = estate.upsert_request(Request {
            buyer: buyer.to_string(),
            name: buyer_name.to_string(),
            proposed_price: price,
            date_time: Timestamp::parse_lenient(timestamp),
        });
        uow.stage(&estate_key, &estate)?;
        uow.commit()?;

        info!(
            "[tc-registry] offer on {} from {} at {}",
            survey_no, buyer, stored.proposed_price
        );
        Ok(stored)
    }

    fn accept_request(
        &self,
        seller_key: &str,
        seller_secret: &str,
        survey_no: &str,
        buyer: &str,
        timestamp: &str,
        reason: &str,
    ) -> Result<TransactionRecord, RegistryError> {
        const OP: &str = "accept_request";
        let _span = info_span!("accept_request", survey_no, buyer).entered();
        let reason = parse_reason(OP, reason)?;

        let mut uow = self.begin(OP);
        let seller_key = RecordKey::parse(seller_key);
        let seller = match uow.authenticate(&seller_key, seller_secret)? {
            Principal::User(user) => user,
            _ => return Err(conflict(OP, &seller_key, "only a user can accept offers")),
        };

        let estate_key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&estate_key)?;
        if estate.owner != seller.uid {
            return Err(conflict(OP, &estate_key, "caller does not own this estate"));
        }
        if estate.being_sold {
            return Err(conflict(OP, &estate_key, "estate is already being sold"));
        }
        let offer = estate
            .find_request(buyer)
            .cloned()
            .ok_or_else(|| not_found(OP, format!("{estate_key}/requests/{buyer}")))?;

        let sequence = estate
            .next_sequence()
            .ok_or_else(|| conflict(OP, &estate_key, "transaction count is exhausted"))?;
        let tx_key = RecordKey::transaction(survey_no, sequence);
        if uow.exists(&tx_key)? {
            return Err(conflict(OP, &tx_key, "a transaction already occupies the next sequence"));
        }
        let admin_key = RecordKey::office_admin(&estate.office_code);
        let mut admin: OfficeAdmin = uow.load(&admin_key)?;

        let tx = TransactionRecord::pending(
            &seller.uid,
            &offer.buyer,
            Timestamp::parse_lenient(timestamp),
            &estate.office_code,
            offer.proposed_price,
            reason,
        );
        estate.begin_sale();
        admin.enqueue(&tx_key);

        uow.stage(&tx_key, &tx)?;
        uow.stage(&estate_key, &estate)?;
        uow.stage(&admin_key, &admin)?;
        uow.commit()?;

        info!(
            "[tc-registry] {} accepted offer from {} at {}, awaiting {}",
            survey_no, tx.buyer, tx.price, admin_key
        );
        Ok(tx)
    }

    fn approve_sale(
        &self,
        approver_key: &str,
        survey_no: &str,
        action: &str,
        timestamp: &str,
    ) -> Result<Estate, RegistryError> {
        const OP: &str = "approve_sale";
        let _span =
            info_span!("approve_sale", survey_no, approver = approver_key, action).entered();

        let mut uow = self.begin(OP);
        let estate_key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&estate_key)?;

        let sequence = estate
            .next_sequence()
            .ok_or_else(|| conflict(OP, &estate_key, "transaction count is exhausted"))?;
        let tx_key = RecordKey::transaction(survey_no, sequence);
        let mut tx: TransactionRecord = uow.load(&tx_key)?;
        if tx.is_approved() {
            return Err(conflict(OP, &tx_key, "transaction is already approved"));
        }
        if !estate.being_sold {
            return Err(conflict(OP, &estate_key, "no sale is pending for this estate"));
        }

        let admin_key = RecordKey::parse(approver_key);
        let office_code = match &admin_key {
            RecordKey::OfficeAdmin(code) => code.clone(),
            _ => return Err(not_found(OP, &admin_key)),
        };
        let mut admin: OfficeAdmin = uow.load(&admin_key)?;
        if office_code != tx.office_code {
            return Err(conflict(OP, &admin_key, "transaction belongs to another office"));
        }

        if estate.owner != tx.seller {
            return Err(conflict(OP, &tx_key, "seller no longer owns this estate"));
        }
        if tx.buyer == tx.seller {
            return Err(conflict(OP, &tx_key, "buyer and seller are the same user"));
        }
        let seller_key = RecordKey::user(&tx.seller);
        let buyer_key = RecordKey::user(&tx.buyer);
        let mut seller: User = uow.load(&seller_key)?;
        let mut buyer: User = uow.load(&buyer_key)?;

        let at = Timestamp::parse_lenient(timestamp);
        tx.approve(&admin.uid, at);
        estate.complete_transfer(&tx.buyer, at);
        if !seller.remove_holding(survey_no) {
            warn!("[tc-registry] seller {} did not list {}", seller.uid, survey_no);
        }
        buyer.add_holding(survey_no);
        if !admin.dequeue(&tx_key) {
            warn!("[tc-registry] {} was not queued at {}", tx_key, admin_key);
        }

        uow.stage(&tx_key, &tx)?;
        uow.stage(&estate_key, &estate)?;
        uow.stage(&seller_key, &seller)?;
        uow.stage(&buyer_key, &buyer)?;
        uow.stage(&admin_key, &admin)?;
        uow.commit()?;

        info!(
            "[tc-registry] {} transferred from {} to {} ({}), approved by {}",
            survey_no, tx.seller, tx.buyer, action, admin.uid
        );
        Ok(estate)
    }

    fn sale_state(&self, survey_no: &str) -> Result<SaleState, RegistryError> {
        let estate: Estate = self.begin("sale_state").load(&RecordKey::estate(survey_no))?;
        Ok(estate.sale_state())
    }
}

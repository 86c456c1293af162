//! # Estate API Implementation
//!
//! Parcel registration, administrative edits and flags.

use super::helpers::{
    conflict, require_non_empty, require_non_negative, require_transaction_count,
};
use super::*;
use crate::domain::{
    Estate, EstateParams, EstatePatch, RecordKey, RegistryError, User, VerificationStatus,
};
use crate::ports::inbound::EstateApi;
use tracing::{info, info_span};

impl<L, C> EstateApi for RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    fn create_estate(&self, params: &EstateParams) -> Result<Estate, RegistryError> {
        const OP: &str = "create_estate";
        let _span = info_span!("create_estate", survey_no = %params.survey_no).entered();
        require_non_empty(OP, "survey_no", &params.survey_no)?;
        require_non_empty(OP, "office_code", &params.office_code)?;
        require_non_empty(OP, "owner", &params.owner)?;
        require_non_negative(OP, "area", params.area)?;
        require_transaction_count(OP, params.transactions_count)?;

        let mut uow = self.begin(OP);
        let owner_key = RecordKey::user(&params.owner);
        let mut owner: User = uow.load(&owner_key)?;
        if owner.owns(&params.survey_no) {
            return Err(conflict(OP, &owner_key, "owner already lists this survey number"));
        }
        let estate_key = RecordKey::estate(&params.survey_no);
        if uow.exists(&estate_key)? {
            return Err(conflict(OP, &estate_key, "estate already registered"));
        }

        let estate = Estate::new(params);
        owner.add_holding(&params.survey_no);
        uow.stage(&estate_key, &estate)?;
        uow.stage(&owner_key, &owner)?;
        uow.commit()?;

        info!(
            "[tc-registry] estate {} registered to {} at office {}",
            params.survey_no, params.owner, params.office_code
        );
        Ok(estate)
    }

    fn modify_estate(
        &self,
        survey_no: &str,
        patch: &EstatePatch,
    ) -> Result<Estate, RegistryError> {
        const OP: &str = "modify_estate";
        let _span = info_span!("modify_estate", survey_no).entered();
        if let Some(area) = patch.area {
            require_non_negative(OP, "area", area)?;
        }
        if let Some(office_code) = &patch.office_code {
            require_non_empty(OP, "office_code", office_code)?;
        }
        if let Some(count) = patch.transactions_count {
            require_transaction_count(OP, count)?;
        }

        let mut uow = self.begin(OP);
        let key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&key)?;
        if estate.being_sold && patch.touches_workflow() {
            return Err(conflict(
                OP,
                &key,
                "office code and transaction count are frozen while a sale is pending",
            ));
        }

        let before = estate.clone();
        estate.apply_patch(patch);
        if estate != before {
            uow.stage(&key, &estate)?;
            uow.commit()?;
            info!("[tc-registry] estate {} modified", survey_no);
        }
        Ok(estate)
    }

    fn set_sale_availability(
        &self,
        survey_no: &str,
        available: bool,
    ) -> Result<Estate, RegistryError> {
        const OP: &str = "set_sale_availability";
        let _span = info_span!("set_sale_availability", survey_no, available).entered();

        let mut uow = self.begin(OP);
        let key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&key)?;
        if estate.sale_availability != available {
            estate.sale_availability = available;
            uow.stage(&key, &estate)?;
            uow.commit()?;
            info!("[tc-registry] estate {} sale availability {}", survey_no, available);
        }
        Ok(estate)
    }

    fn set_verification_status(
        &self,
        caller_key: &str,
        caller_secret: &str,
        survey_no: &str,
        status: VerificationStatus,
    ) -> Result<Estate, RegistryError> {
        const OP: &str = "set_verification_status";
        let _span = info_span!("set_verification_status", survey_no).entered();
        require_non_empty(OP, "caller_key", caller_key)?;

        let mut uow = self.begin(OP);
        let caller = uow.authenticate(&RecordKey::parse(caller_key), caller_secret)?;

        let key = RecordKey::estate(survey_no);
        let mut estate: Estate = uow.load(&key)?;
        estate.status = status;
        uow.stage(&key, &estate)?;
        uow.commit()?;

        info!(
            "[tc-registry] estate {} status {:?} set by {}",
            survey_no,
            status,
            caller.uid()
        );
        Ok(estate)
    }

    fn estate(&self, survey_no: &str) -> Result<Estate, RegistryError> {
        self.begin("estate").load(&RecordKey::estate(survey_no))
    }
}

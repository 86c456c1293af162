//! # Command Dispatch
//!
//! Runs one `Command` against a `RegistryService` and renders the result as
//! JSON. Every call is timed and counted in `tc-telemetry`.

use serde_json::{json, Value};
use tc_registry::{
    EstateApi, EstateParams, EstatePatch, IdentityApi, LedgerInspectionApi, LedgerStore,
    OfficeAdminParams, RegistryError, RegistryService, SaleWorkflowApi, SuperAdminSeed,
    TransactionLogApi, TransactionParams,
};
use tc_telemetry::OperationTimer;

use crate::cli::Command;

/// Run `command`. `now` stands in for omitted `--at` timestamps.
pub fn dispatch<L: LedgerStore>(
    service: &RegistryService<L>,
    seed: &SuperAdminSeed,
    command: &Command,
    now: &str,
) -> Result<Value, RegistryError> {
    let mut timer = OperationTimer::new(command.operation());
    let result = run(service, seed, command, now);
    if let Err(err) = &result {
        timer.fail(err.kind());
    }
    result
}

fn run<L: LedgerStore>(
    service: &RegistryService<L>,
    seed: &SuperAdminSeed,
    command: &Command,
    now: &str,
) -> Result<Value, RegistryError> {
    let at = |ts: &Option<String>| ts.clone().unwrap_or_else(|| now.to_string());

    let value = match command {
        Command::InitLedger => to_json(&service.init_ledger(seed)?),
        Command::VerifyCredential { key, secret } => {
            json!({ "valid": service.verify_credential(key, secret)? })
        }
        Command::SetOfficeAdmin {
            caller,
            caller_secret,
            office_code,
            uid,
            name,
            secret,
        } => to_json(&service.create_or_replace_office_admin(
            caller,
            caller_secret,
            &OfficeAdminParams {
                office_code: office_code.clone(),
                credential: secret.clone(),
                uid: uid.clone(),
                name: name.clone(),
            },
        )?),
        Command::CreateUser { uid, name } => to_json(&service.create_user(uid, name)?),
        Command::ModifyUser { uid, name, status } => {
            to_json(&service.modify_user(uid, name.as_deref(), *status)?)
        }
        Command::VerifyUser {
            caller,
            caller_secret,
            status,
            new_secret,
        } => to_json(&service.verify_user(caller, caller_secret, *status, new_secret)?),
        Command::User { uid } => to_json(&service.user(uid)?),
        Command::OfficeAdmin { office_code } => to_json(&service.office_admin(office_code)?),
        Command::CreateEstate {
            survey_no,
            office_code,
            owner,
            location,
            area,
            acquired_at,
            transactions_count,
        } => to_json(&service.create_estate(&EstateParams {
            office_code: office_code.clone(),
            survey_no: survey_no.clone(),
            owner: owner.clone(),
            location: location.clone(),
            area: *area,
            acquired_at: acquired_at.clone(),
            transactions_count: *transactions_count,
        })?),
        Command::ModifyEstate {
            survey_no,
            office_code,
            location,
            area,
            acquired_at,
            transactions_count,
        } => to_json(&service.modify_estate(
            survey_no,
            &EstatePatch {
                office_code: office_code.clone(),
                location: location.clone(),
                area: *area,
                acquired_at: acquired_at.clone(),
                transactions_count: *transactions_count,
            },
        )?),
        Command::SetSaleAvailability {
            survey_no,
            available,
        } => to_json(&service.set_sale_availability(survey_no, *available)?),
        Command::SetEstateStatus {
            caller,
            caller_secret,
            survey_no,
            status,
        } => to_json(&service.set_verification_status(caller, caller_secret, survey_no, *status)?),
        Command::Estate { survey_no } => to_json(&service.estate(survey_no)?),
        Command::SubmitRequest {
            buyer,
            buyer_name,
            survey_no,
            price,
            at: ts,
        } => to_json(&service.submit_or_update_request(buyer, buyer_name, survey_no, *price, &at(ts))?),
        Command::AcceptRequest {
            seller,
            seller_secret,
            survey_no,
            buyer,
            reason,
            at: ts,
        } => to_json(&service.accept_request(
            seller,
            seller_secret,
            survey_no,
            buyer,
            &at(ts),
            reason,
        )?),
        Command::ApproveSale {
            approver,
            survey_no,
            action,
            at: ts,
        } => to_json(&service.approve_sale(approver, survey_no, action, &at(ts))?),
        Command::SaleState { survey_no } => to_json(&service.sale_state(survey_no)?),
        Command::AddTransaction {
            survey_no,
            sequence,
            seller,
            buyer,
            reason,
            price,
            transaction_at,
            office_code,
            approved_by,
            approved_at,
        } => to_json(&service.add_transaction(
            survey_no,
            *sequence,
            &TransactionParams {
                seller: seller.clone(),
                buyer: buyer.clone(),
                reason: reason.clone(),
                price: *price,
                transaction_at: transaction_at.clone(),
                office_code: office_code.clone(),
                approved_by: approved_by.clone(),
                approved_at: approved_at.clone(),
            },
        )?),
        Command::Transaction {
            survey_no,
            sequence,
        } => to_json(&service.transaction(survey_no, *sequence)?),
        Command::History { survey_no } => Value::Array(
            service
                .transaction_history(survey_no)?
                .into_iter()
                .map(|(sequence, tx)| json!({ "sequence": sequence, "transaction": tx }))
                .collect(),
        ),
        Command::ReadRaw { key } => to_json(&service.read_raw_record(key)?),
        Command::DeleteRecord { key } => {
            service.delete_record(key)?;
            json!({ "deleted": key })
        }
        Command::Scan { start, end } => to_json(&service.scan_range(start, end)?),
        Command::Audit => {
            let violations: Vec<String> = service
                .audit_invariants()?
                .iter()
                .map(ToString::to_string)
                .collect();
            json!({ "consistent": violations.is_empty(), "violations": violations })
        }
    };
    Ok(value)
}

/// Encoding an in-memory record into a `Value` does not fail.
fn to_json<T: serde::Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2022-01-01T00:00:00Z";

    fn run_all(service: &RegistryService<tc_registry::InMemoryLedger>, commands: &[Command]) {
        for command in commands {
            dispatch(service, &SuperAdminSeed::default(), command, NOW).unwrap();
        }
    }

    #[test]
    fn test_sale_through_commands() {
        let service = RegistryService::in_memory();
        run_all(
            &service,
            &[
                Command::InitLedger,
                Command::SetOfficeAdmin {
                    caller: "admin_super".to_string(),
                    caller_secret: "123456".to_string(),
                    office_code: "PUN".to_string(),
                    uid: "reg-1".to_string(),
                    name: "Registrar".to_string(),
                    secret: "pun".to_string(),
                },
                Command::CreateUser {
                    uid: "u1".to_string(),
                    name: "Seller".to_string(),
                },
                Command::CreateUser {
                    uid: "b1".to_string(),
                    name: "Buyer".to_string(),
                },
                Command::CreateEstate {
                    survey_no: "s001".to_string(),
                    office_code: "PUN".to_string(),
                    owner: "u1".to_string(),
                    location: "Pune".to_string(),
                    area: 100,
                    acquired_at: String::new(),
                    transactions_count: 0,
                },
                Command::SubmitRequest {
                    buyer: "b1".to_string(),
                    buyer_name: "Buyer".to_string(),
                    survey_no: "s001".to_string(),
                    price: 150,
                    at: None,
                },
                Command::AcceptRequest {
                    seller: "user_u1".to_string(),
                    seller_secret: "u1".to_string(),
                    survey_no: "s001".to_string(),
                    buyer: "b1".to_string(),
                    reason: "sell".to_string(),
                    at: None,
                },
            ],
        );

        let estate = dispatch(
            &service,
            &SuperAdminSeed::default(),
            &Command::ApproveSale {
                approver: "admin_PUN".to_string(),
                survey_no: "s001".to_string(),
                action: "approve".to_string(),
                at: None,
            },
            NOW,
        )
        .unwrap();
        assert_eq!(estate["owner"], "b1");
        assert_eq!(estate["purchasedOn"], NOW);
        assert_eq!(estate["transactionsCount"], 1);

        let history = dispatch(
            &service,
            &SuperAdminSeed::default(),
            &Command::History {
                survey_no: "s001".to_string(),
            },
            NOW,
        )
        .unwrap();
        assert_eq!(history[0]["sequence"], 1);
        assert_eq!(history[0]["transaction"]["approvedBy"], "reg-1");

        let audit = dispatch(&service, &SuperAdminSeed::default(), &Command::Audit, NOW).unwrap();
        assert_eq!(audit["consistent"], true);
    }

    #[test]
    fn test_failure_is_counted_by_kind() {
        let service = RegistryService::in_memory();
        let before = tc_telemetry::OPERATIONS_TOTAL
            .with_label_values(&["user", "not_found"])
            .get();

        let result = dispatch(
            &service,
            &SuperAdminSeed::default(),
            &Command::User {
                uid: "ghost".to_string(),
            },
            NOW,
        );
        assert!(matches!(result, Err(RegistryError::NotFound { .. })));
        assert!(
            tc_telemetry::OPERATIONS_TOTAL
                .with_label_values(&["user", "not_found"])
                .get()
                >= before + 1.0
        );
    }
}

//! # Integration Test Flows
//!
//! Complete sale cycles against the file-backed ledger, including reopening
//! the ledger between steps.
//!
//! ## Flows Tested:
//!
//! 1. **Register → Offer → Accept → Approve** persisted across reopen
//! 2. **Two offices** approving their own sales independently
//! 3. **Backfilled history** followed by a live sale

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tc_registry::{
        EstateApi, EstateParams, FileBackedLedger, IdentityApi, LedgerError, LedgerInspectionApi,
        OfficeAdminParams, RegistryError, RegistryService, SaleState, SaleWorkflowApi,
        SuperAdminSeed, TransactionLogApi, TransactionParams,
    };
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type FileRegistry = RegistryService<FileBackedLedger>;

    fn open(path: &Path) -> FileRegistry {
        RegistryService::with_ledger(FileBackedLedger::open(path).unwrap())
    }

    fn bootstrap(registry: &FileRegistry, offices: &[&str]) {
        registry.init_ledger(&SuperAdminSeed::default()).unwrap();
        for office in offices {
            registry
                .create_or_replace_office_admin(
                    "admin_super",
                    "123456",
                    &OfficeAdminParams {
                        office_code: office.to_string(),
                        credential: format!("{office}-secret"),
                        uid: format!("reg-{office}"),
                        name: format!("Registrar {office}"),
                    },
                )
                .unwrap();
        }
    }

    fn estate(survey_no: &str, office_code: &str, owner: &str) -> EstateParams {
        EstateParams {
            office_code: office_code.to_string(),
            survey_no: survey_no.to_string(),
            owner: owner.to_string(),
            location: format!("Plot {survey_no}"),
            area: 500,
            acquired_at: "2018-06-01T00:00:00Z".to_string(),
            transactions_count: 0,
        }
    }

    fn assert_consistent(registry: &FileRegistry) {
        let violations = registry.audit_invariants().unwrap();
        assert!(violations.is_empty(), "invariants broken: {violations:?}");
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[test]
    fn test_sale_survives_reopen_between_steps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");

        {
            let registry = open(&path);
            bootstrap(&registry, &["PUN"]);
            registry.create_user("u1", "Seller").unwrap();
            registry.create_user("b1", "Buyer").unwrap();
            registry.create_estate(&estate("s001", "PUN", "u1")).unwrap();
            registry
                .submit_or_update_request("b1", "Buyer", "s001", 900, "2022-03-01T09:00:00+05:30")
                .unwrap();
        }
        {
            let registry = open(&path);
            assert_eq!(registry.sale_state("s001").unwrap(), SaleState::Negotiating);
            registry
                .accept_request("user_u1", "u1", "s001", "b1", "2022-03-02T09:00:00+05:30", "sell")
                .unwrap();
        }
        {
            let registry = open(&path);
            assert_eq!(registry.sale_state("s001").unwrap(), SaleState::PendingApproval);
            registry
                .approve_sale("admin_PUN", "s001", "approve", "2022-03-05T12:00:00Z")
                .unwrap();
        }

        let registry = open(&path);
        let estate = registry.estate("s001").unwrap();
        assert_eq!(estate.owner, "b1");
        assert_eq!(estate.transactions_count, 1);
        let tx = registry.transaction("s001", 1).unwrap();
        assert_eq!(tx.transaction_date_time.to_string(), "2022-03-02T09:00:00+05:30");
        assert_eq!(tx.approved_by, "reg-PUN");
        assert!(registry.user("b1").unwrap().owns("s001"));
        assert_consistent(&registry);
    }

    #[test]
    fn test_ledger_is_exclusive_while_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");

        let registry = open(&path);
        bootstrap(&registry, &[]);

        let second = FileBackedLedger::open(&path);
        assert!(matches!(second, Err(LedgerError::Io { .. })));

        drop(registry);
        assert!(FileBackedLedger::open(&path).is_ok());
    }

    #[test]
    fn test_offices_approve_only_their_own_sales() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir.path().join("ledger.tcl"));
        bootstrap(&registry, &["PUN", "MUM"]);
        for uid in ["u1", "u2", "b1"] {
            registry.create_user(uid, uid).unwrap();
        }
        registry.create_estate(&estate("p-1", "PUN", "u1")).unwrap();
        registry.create_estate(&estate("m-1", "MUM", "u2")).unwrap();

        for (survey, owner) in [("p-1", "u1"), ("m-1", "u2")] {
            registry
                .submit_or_update_request("b1", "Buyer", survey, 100, "2022-01-01T00:00:00Z")
                .unwrap();
            registry
                .accept_request(
                    &format!("user_{owner}"),
                    owner,
                    survey,
                    "b1",
                    "2022-01-02T00:00:00Z",
                    "sell",
                )
                .unwrap();
        }
        assert_eq!(
            registry.office_admin("PUN").unwrap().to_approve,
            vec!["transaction_p-1_1".to_string()]
        );
        assert_eq!(
            registry.office_admin("MUM").unwrap().to_approve,
            vec!["transaction_m-1_1".to_string()]
        );
        assert_consistent(&registry);

        let crossed = registry.approve_sale("admin_PUN", "m-1", "approve", "2022-01-03T00:00:00Z");
        assert!(matches!(crossed, Err(RegistryError::Conflict { .. })));

        registry
            .approve_sale("admin_MUM", "m-1", "approve", "2022-01-03T00:00:00Z")
            .unwrap();
        registry
            .approve_sale("admin_PUN", "p-1", "approve", "2022-01-03T00:00:00Z")
            .unwrap();

        let buyer = registry.user("b1").unwrap();
        assert!(buyer.owns("p-1") && buyer.owns("m-1"));
        assert!(registry.user("u1").unwrap().owned.is_empty());
        assert_consistent(&registry);
    }

    #[test]
    fn test_backfilled_history_then_live_sale() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir.path().join("ledger.tcl"));
        bootstrap(&registry, &["PUN"]);
        registry.create_user("heir", "Heir").unwrap();
        registry.create_user("b1", "Buyer").unwrap();

        registry
            .add_transaction(
                "s77",
                1,
                &TransactionParams {
                    seller: "ancestor".to_string(),
                    buyer: "heir".to_string(),
                    reason: "inheritance".to_string(),
                    price: 0,
                    transaction_at: "2001-01-01T00:00:00Z".to_string(),
                    office_code: "PUN".to_string(),
                    approved_by: "reg-old".to_string(),
                    approved_at: "2001-02-01T00:00:00Z".to_string(),
                },
            )
            .unwrap();
        let mut params = estate("s77", "PUN", "heir");
        params.transactions_count = 1;
        registry.create_estate(&params).unwrap();
        assert_consistent(&registry);

        registry
            .submit_or_update_request("b1", "Buyer", "s77", 1_000, "2023-01-01T00:00:00Z")
            .unwrap();
        let tx = registry
            .accept_request("user_heir", "heir", "s77", "b1", "2023-01-02T00:00:00Z", "gift")
            .unwrap();
        assert_eq!(tx.seller, "heir");
        assert!(registry.transaction("s77", 2).is_ok());

        registry
            .approve_sale("admin_PUN", "s77", "approve", "2023-01-05T00:00:00Z")
            .unwrap();
        let history = registry.transaction_history("s77").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1.seller, "ancestor");
        assert_eq!(history[1].1.buyer, "b1");
        assert_eq!(registry.estate("s77").unwrap().transactions_count, 2);
        assert_consistent(&registry);
    }
}

//! # Concurrency Tests
//!
//! Optimistic concurrency seen from the registry API: a commit whose reads
//! went stale is refused wholesale, and callers that retry converge without
//! losing updates.

use parking_lot::Mutex;
use tc_registry::{
    InMemoryLedger, LedgerError, LedgerStore, ReadSet, ScanIter, VersionedValue, WriteSet,
};

/// Write injected by an [`InterleavingLedger`] right before the next commit.
pub type Interloper = Box<dyn FnOnce(&InMemoryLedger) + Send>;

/// Ledger that lets a test slip a competing commit in between a unit of
/// work's reads and its own commit.
#[derive(Default)]
pub struct InterleavingLedger {
    inner: InMemoryLedger,
    interloper: Mutex<Option<Interloper>>,
}

impl InterleavingLedger {
    /// Run `write` against the ledger just before the next commit.
    pub fn before_next_commit(&self, write: impl FnOnce(&InMemoryLedger) + Send + 'static) {
        *self.interloper.lock() = Some(Box::new(write));
    }

    pub fn inner(&self) -> &InMemoryLedger {
        &self.inner
    }
}

impl LedgerStore for InterleavingLedger {
    fn get(&self, key: &[u8]) -> Result<Option<VersionedValue>, LedgerError> {
        self.inner.get(key)
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanIter<'_>, LedgerError> {
        self.inner.range_scan(start, end)
    }

    fn commit(&self, read_set: &ReadSet, write_set: WriteSet) -> Result<(), LedgerError> {
        let interloper = self.interloper.lock().take();
        if let Some(write) = interloper {
            write(&self.inner);
        }
        self.inner.commit(read_set, write_set)
    }
}

/// Rewrite `key` with its current bytes, bumping its version only.
pub fn touch(ledger: &InMemoryLedger, key: &str) {
    if let Ok(Some(current)) = ledger.get(key.as_bytes()) {
        let mut writes = WriteSet::new();
        writes.put(key.as_bytes().to_vec(), current.value);
        let _ = ledger.commit(&ReadSet::new(), writes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tc_registry::{
        EstateApi, EstateParams, IdentityApi, LedgerInspectionApi, OfficeAdminParams,
        RegistryError, RegistryService, SaleWorkflowApi, SuperAdminSeed,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn seeded<L: LedgerStore>(registry: &RegistryService<L>, buyers: usize) {
        registry.init_ledger(&SuperAdminSeed::default()).unwrap();
        registry
            .create_or_replace_office_admin(
                "admin_super",
                "123456",
                &OfficeAdminParams {
                    office_code: "PUN".to_string(),
                    credential: "pun".to_string(),
                    uid: "reg-PUN".to_string(),
                    name: "Registrar".to_string(),
                },
            )
            .unwrap();
        registry.create_user("u1", "Seller").unwrap();
        for i in 0..buyers {
            registry.create_user(&format!("b{i}"), "Buyer").unwrap();
        }
        registry
            .create_estate(&EstateParams {
                office_code: "PUN".to_string(),
                survey_no: "s001".to_string(),
                owner: "u1".to_string(),
                location: "Pune".to_string(),
                area: 100,
                acquired_at: "2020-01-01T00:00:00Z".to_string(),
                transactions_count: 0,
            })
            .unwrap();
    }

    fn snapshot<L: LedgerStore>(registry: &RegistryService<L>) -> Vec<String> {
        registry.scan_range("", "~").unwrap()
    }

    // =============================================================================
    // STALE READS
    // =============================================================================

    #[test]
    fn test_stale_approval_is_rejected_then_retried() {
        let registry = RegistryService::with_ledger(InterleavingLedger::default());
        seeded(&registry, 1);
        registry
            .submit_or_update_request("b0", "Buyer", "s001", 10, "2022-01-01T00:00:00Z")
            .unwrap();
        registry
            .accept_request("user_u1", "u1", "s001", "b0", "2022-01-02T00:00:00Z", "sell")
            .unwrap();

        registry.ledger().before_next_commit(|ledger| touch(ledger, "user_b0"));
        let before = snapshot(&registry);

        let err = registry
            .approve_sale("admin_PUN", "s001", "approve", "2022-01-03T00:00:00Z")
            .unwrap_err();
        assert!(matches!(err, RegistryError::CommitRejected { .. }));
        assert!(err.is_retryable());
        // Only the version of the touched key moved; no record content changed.
        assert_eq!(snapshot(&registry), before);

        let estate = registry
            .approve_sale("admin_PUN", "s001", "approve", "2022-01-03T00:00:00Z")
            .unwrap();
        assert_eq!(estate.owner, "b0");
        assert!(registry.audit_invariants().unwrap().is_empty());
    }

    #[test]
    fn test_acceptance_loses_to_concurrent_offer() {
        let registry = RegistryService::with_ledger(InterleavingLedger::default());
        seeded(&registry, 2);
        registry
            .submit_or_update_request("b0", "Buyer", "s001", 10, "2022-01-01T00:00:00Z")
            .unwrap();

        registry
            .ledger()
            .before_next_commit(|ledger| touch(ledger, "estate_s001"));
        let result =
            registry.accept_request("user_u1", "u1", "s001", "b0", "2022-01-02T00:00:00Z", "sell");
        assert!(matches!(result, Err(RegistryError::CommitRejected { .. })));

        let estate = registry.estate("s001").unwrap();
        assert!(!estate.being_sold);
        assert_eq!(estate.requests.len(), 1);
        assert!(registry.ledger().inner().get(b"transaction_s001_1").unwrap().is_none());
    }

    // =============================================================================
    // PARALLEL CALLERS
    // =============================================================================

    #[test]
    fn test_parallel_offers_are_not_lost() {
        const BUYERS: usize = 8;
        let registry = Arc::new(RegistryService::in_memory());
        seeded(registry.as_ref(), BUYERS);

        std::thread::scope(|scope| {
            for i in 0..BUYERS {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    let buyer = format!("b{i}");
                    loop {
                        match registry.submit_or_update_request(
                            &buyer,
                            "Buyer",
                            "s001",
                            100 + i as i64,
                            "2022-01-01T00:00:00Z",
                        ) {
                            Ok(_) => break,
                            Err(e) if e.is_retryable() => continue,
                            Err(e) => panic!("offer from {buyer} failed: {e}"),
                        }
                    }
                });
            }
        });

        let estate = registry.estate("s001").unwrap();
        assert_eq!(estate.requests.len(), BUYERS);
        assert!(registry.audit_invariants().unwrap().is_empty());
    }

    #[test]
    fn test_only_one_of_racing_accepts_wins() {
        const ROUNDS: usize = 4;
        let registry = Arc::new(RegistryService::in_memory());
        seeded(registry.as_ref(), 2);
        for buyer in ["b0", "b1"] {
            registry
                .submit_or_update_request(buyer, "Buyer", "s001", 10, "2022-01-01T00:00:00Z")
                .unwrap();
        }

        let outcomes: Vec<Result<_, RegistryError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..ROUNDS)
                .map(|i| {
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || {
                        let buyer = if i % 2 == 0 { "b0" } else { "b1" };
                        registry.accept_request(
                            "user_u1",
                            "u1",
                            "s001",
                            buyer,
                            "2022-01-02T00:00:00Z",
                            "sell",
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for loser in outcomes.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(
                loser,
                RegistryError::CommitRejected { .. }
                    | RegistryError::Conflict { .. }
                    | RegistryError::NotFound { .. }
            ));
        }
        assert_eq!(registry.office_admin("PUN").unwrap().to_approve.len(), 1);
        assert!(registry.audit_invariants().unwrap().is_empty());
    }
}

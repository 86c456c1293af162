//! # Title Registry Benchmarks
//!
//! | Area | Operation | Ledger |
//! |------|-----------|--------|
//! | Sale workflow | offer → accept → approve | in-memory |
//! | Transaction log | history of a long-lived parcel | in-memory |
//! | Audit | invariant scan over many parcels | in-memory |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tc_registry::{
    EstateApi, EstateParams, IdentityApi, InMemoryLedger, LedgerInspectionApi, OfficeAdminParams,
    RegistryService, SaleWorkflowApi, SuperAdminSeed, TransactionLogApi,
};

const AT: &str = "2024-01-01T00:00:00Z";

fn registry_with_parcels(parcels: usize) -> RegistryService<InMemoryLedger> {
    let registry = RegistryService::in_memory();
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
    registry.create_user("alice", "Alice").unwrap();
    registry.create_user("bob", "Bob").unwrap();
    for i in 0..parcels {
        registry
            .create_estate(&EstateParams {
                office_code: "PUN".to_string(),
                survey_no: format!("s{i:05}"),
                owner: "alice".to_string(),
                location: "Pune".to_string(),
                area: 100,
                acquired_at: AT.to_string(),
                transactions_count: 0,
            })
            .unwrap();
    }
    registry
}

/// One full sale of `survey_no` from `seller` to `buyer`.
fn sell(registry: &RegistryService<InMemoryLedger>, survey_no: &str, seller: &str, buyer: &str) {
    registry
        .submit_or_update_request(buyer, buyer, survey_no, 10, AT)
        .unwrap();
    registry
        .accept_request(&format!("user_{seller}"), seller, survey_no, buyer, AT, "sell")
        .unwrap();
    registry
        .approve_sale("admin_PUN", survey_no, "approve", AT)
        .unwrap();
}

fn bench_sale_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("sale-workflow");
    let registry = registry_with_parcels(1);
    let mut owner_is_alice = true;

    group.bench_function("offer_accept_approve", |b| {
        b.iter(|| {
            let (seller, buyer) = if owner_is_alice {
                ("alice", "bob")
            } else {
                ("bob", "alice")
            };
            sell(&registry, black_box("s00000"), seller, buyer);
            owner_is_alice = !owner_is_alice;
        })
    });
    group.finish();
}

fn bench_transaction_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction-log");
    for sales in [10usize, 100] {
        let registry = registry_with_parcels(1);
        for i in 0..sales {
            let (seller, buyer) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
            sell(&registry, "s00000", seller, buyer);
        }
        group.throughput(Throughput::Elements(sales as u64));
        group.bench_with_input(BenchmarkId::new("history", sales), &registry, |b, registry| {
            b.iter(|| black_box(registry.transaction_history("s00000").unwrap()))
        });
    }
    group.finish();
}

fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit");
    for parcels in [100usize, 1_000] {
        let registry = registry_with_parcels(parcels);
        group.throughput(Throughput::Elements(parcels as u64));
        group.bench_with_input(BenchmarkId::new("invariants", parcels), &registry, |b, registry| {
            b.iter(|| black_box(registry.audit_invariants().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sale_cycle, bench_transaction_history, bench_audit);
criterion_main!(benches);

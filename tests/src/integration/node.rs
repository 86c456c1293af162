//! # Node Dispatch Tests
//!
//! CLI parsing and dispatch against a ledger file, one process-like
//! invocation per command.

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;
    use serde_json::Value;
    use tc_node::{dispatch, Cli, Command, NodeConfig};
    use tc_registry::{FileBackedLedger, RegistryError, RegistryService};
    use tempfile::TempDir;

    const NOW: &str = "2024-05-01T10:00:00Z";

    /// Parse argv the way `tc-node` would.
    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("tc-node").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    /// Open the ledger, run one command, close the ledger.
    fn invoke(path: &Path, config: &NodeConfig, args: &[&str]) -> Result<Value, RegistryError> {
        let cli = parse(args);
        let service = RegistryService::with_ledger(FileBackedLedger::open(path).unwrap());
        dispatch(&service, &config.super_admin, &cli.command, NOW)
    }

    #[test]
    fn test_sale_over_separate_invocations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");
        let config = NodeConfig::default();

        let steps: [&[&str]; 7] = [
            &["init-ledger"],
            &[
                "set-office-admin",
                "--caller-secret",
                "123456",
                "PUN",
                "reg-1",
                "Registrar",
                "--secret",
                "pun",
            ],
            &["create-user", "u1", "Seller"],
            &["create-user", "b1", "Buyer"],
            &["create-estate", "s001", "PUN", "u1", "Pune", "100"],
            &["submit-request", "b1", "Buyer", "s001", "150"],
            &["accept-request", "user_u1", "--seller-secret", "u1", "s001", "b1"],
        ];
        for args in steps {
            invoke(&path, &config, args).unwrap();
        }

        let state = invoke(&path, &config, &["sale-state", "s001"]).unwrap();
        assert_eq!(state, "PendingApproval");

        let estate = invoke(&path, &config, &["approve-sale", "admin_PUN", "s001"]).unwrap();
        assert_eq!(estate["owner"], "b1");
        assert_eq!(estate["purchasedOn"], NOW);

        let history = invoke(&path, &config, &["history", "s001"]).unwrap();
        assert_eq!(history[0]["transaction"]["transactionDateTime"], NOW);

        let audit = invoke(&path, &config, &["audit"]).unwrap();
        assert_eq!(audit["consistent"], true);
    }

    #[test]
    fn test_configured_super_admin_is_seeded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");
        let config = NodeConfig::from_lookup(|name| match name {
            "TC_SUPER_ADMIN_UID" => Some("000011112222".to_string()),
            "TC_SUPER_ADMIN_SECRET" => Some("rotated".to_string()),
            _ => None,
        });

        let admin = invoke(&path, &config, &["init-ledger"]).unwrap();
        assert_eq!(admin["uid"], "000011112222");

        let check = invoke(&path, &config, &["verify-credential", "admin_super", "rotated"]).unwrap();
        assert_eq!(check["valid"], true);
    }

    #[test]
    fn test_errors_surface_with_kind_and_metrics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");
        let config = NodeConfig::default();
        tc_telemetry::register_metrics().unwrap();

        invoke(&path, &config, &["init-ledger"]).unwrap();
        let err = invoke(&path, &config, &["init-ledger"]).unwrap_err();
        assert_eq!(err.kind(), "conflict");

        let text = tc_telemetry::encode_metrics().unwrap();
        assert!(text.contains("tc_registry_operations_total"));
        assert!(text.contains("outcome=\"conflict\""));
    }

    #[test]
    fn test_raw_inspection_commands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.tcl");
        let config = NodeConfig::default();
        invoke(&path, &config, &["init-ledger"]).unwrap();
        invoke(&path, &config, &["create-user", "u1", "One"]).unwrap();

        let lines = invoke(&path, &config, &["scan", "user_", "user_~"]).unwrap();
        assert_eq!(lines.as_array().map(Vec::len), Some(1));

        let raw = invoke(&path, &config, &["read-raw", "user_u1"]).unwrap();
        assert_eq!(raw["password"], "u1");

        invoke(&path, &config, &["delete-record", "user_u1"]).unwrap();
        let gone = invoke(&path, &config, &["user", "u1"]);
        assert!(matches!(gone, Err(RegistryError::NotFound { .. })));
        assert_eq!(parse(&["audit"]).command, Command::Audit);
    }
}

//! # Command Line
//!
//! One subcommand per registry operation. Secrets are passed as arguments
//! or, where marked, through environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tc_registry::VerificationStatus;

use crate::config::LedgerBackend;

/// Title-Chain operator CLI
#[derive(Parser, Debug)]
#[command(name = "tc-node", version)]
#[command(about = "Land-title registry and sale workflow over a versioned ledger")]
pub struct Cli {
    /// Ledger file or database directory
    #[arg(long, env = "TC_LEDGER_PATH")]
    pub ledger: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = LedgerBackend::File)]
    pub backend: LedgerBackend,

    /// Log filter, overrides TC_LOG_LEVEL
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Registry operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write the SuperAdmin record into an empty ledger
    InitLedger,

    /// Check a principal's secret
    VerifyCredential { key: String, secret: String },

    /// Create or replace the registrar of an office (SuperAdmin only)
    SetOfficeAdmin {
        /// Caller key, normally admin_super
        #[arg(long, default_value = "admin_super")]
        caller: String,
        #[arg(long, env = "TC_CALLER_SECRET")]
        caller_secret: String,
        office_code: String,
        uid: String,
        name: String,
        /// Secret of the new registrar
        #[arg(long, env = "TC_OFFICE_SECRET")]
        secret: String,
    },

    /// Register a user; the initial secret equals the uid
    CreateUser { uid: String, name: String },

    /// Change a user's name or verification status
    ModifyUser {
        uid: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<VerificationStatus>,
    },

    /// Set the caller's own status and rotate its secret
    VerifyUser {
        caller: String,
        #[arg(long, env = "TC_CALLER_SECRET")]
        caller_secret: String,
        status: VerificationStatus,
        #[arg(long, env = "TC_NEW_SECRET")]
        new_secret: String,
    },

    /// Show a user
    User { uid: String },

    /// Show an office registrar
    OfficeAdmin { office_code: String },

    /// Register a parcel
    CreateEstate {
        survey_no: String,
        office_code: String,
        owner: String,
        location: String,
        area: i64,
        /// RFC 3339 acquisition time
        #[arg(long, default_value = "")]
        acquired_at: String,
        #[arg(long, default_value_t = 0)]
        transactions_count: u64,
    },

    /// Override parcel fields
    ModifyEstate {
        survey_no: String,
        #[arg(long)]
        office_code: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        area: Option<i64>,
        #[arg(long)]
        acquired_at: Option<String>,
        #[arg(long)]
        transactions_count: Option<u64>,
    },

    /// Advertise a parcel for sale or withdraw it
    SetSaleAvailability {
        survey_no: String,
        #[arg(action = clap::ArgAction::Set)]
        available: bool,
    },

    /// Set a parcel's verification status
    SetEstateStatus {
        caller: String,
        #[arg(long, env = "TC_CALLER_SECRET")]
        caller_secret: String,
        survey_no: String,
        status: VerificationStatus,
    },

    /// Show a parcel
    Estate { survey_no: String },

    /// Place or update an offer
    SubmitRequest {
        buyer: String,
        buyer_name: String,
        survey_no: String,
        price: i64,
        /// RFC 3339 time, defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Accept an offer as the owner
    AcceptRequest {
        seller: String,
        #[arg(long, env = "TC_CALLER_SECRET")]
        seller_secret: String,
        survey_no: String,
        buyer: String,
        /// sell, inheritance or gift
        #[arg(long, default_value = "sell")]
        reason: String,
        #[arg(long)]
        at: Option<String>,
    },

    /// Approve the pending sale as the office registrar
    ApproveSale {
        approver: String,
        survey_no: String,
        #[arg(long, default_value = "approve")]
        action: String,
        #[arg(long)]
        at: Option<String>,
    },

    /// Show where a parcel stands in the sale workflow
    SaleState { survey_no: String },

    /// Write a transaction record directly
    AddTransaction {
        survey_no: String,
        sequence: u64,
        seller: String,
        buyer: String,
        #[arg(long, default_value = "sell")]
        reason: String,
        #[arg(long, default_value_t = 0)]
        price: i64,
        #[arg(long, default_value = "")]
        transaction_at: String,
        #[arg(long, default_value = "")]
        office_code: String,
        #[arg(long, default_value = "")]
        approved_by: String,
        #[arg(long, default_value = "")]
        approved_at: String,
    },

    /// Show one transaction
    Transaction { survey_no: String, sequence: u64 },

    /// List a parcel's transactions in sequence order
    History { survey_no: String },

    /// Decode the record stored at a key
    ReadRaw { key: String },

    /// Remove a key, bypassing the workflow
    DeleteRecord { key: String },

    /// Dump keys in [start, end)
    Scan { start: String, end: String },

    /// Check cross-record invariants over the whole ledger
    Audit,
}

impl Command {
    /// Operation label used in metrics and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Command::InitLedger => "init_ledger",
            Command::VerifyCredential { .. } => "verify_credential",
            Command::SetOfficeAdmin { .. } => "create_or_replace_office_admin",
            Command::CreateUser { .. } => "create_user",
            Command::ModifyUser { .. } => "modify_user",
            Command::VerifyUser { .. } => "verify_user",
            Command::User { .. } => "user",
            Command::OfficeAdmin { .. } => "office_admin",
            Command::CreateEstate { .. } => "create_estate",
            Command::ModifyEstate { .. } => "modify_estate",
            Command::SetSaleAvailability { .. } => "set_sale_availability",
            Command::SetEstateStatus { .. } => "set_verification_status",
            Command::Estate { .. } => "estate",
            Command::SubmitRequest { .. } => "submit_or_update_request",
            Command::AcceptRequest { .. } => "accept_request",
            Command::ApproveSale { .. } => "approve_sale",
            Command::SaleState { .. } => "sale_state",
            Command::AddTransaction { .. } => "add_transaction",
            Command::Transaction { .. } => "transaction",
            Command::History { .. } => "transaction_history",
            Command::ReadRaw { .. } => "read_raw_record",
            Command::DeleteRecord { .. } => "delete_record",
            Command::Scan { .. } => "scan_range",
            Command::Audit => "audit_invariants",
        }
    }
}

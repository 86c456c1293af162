//! # Identity API Implementation
//!
//! SuperAdmin bootstrap, office administrators and users.

use super::helpers::{conflict, invalid, require_non_empty};
use super::*;
use crate::domain::{
    OfficeAdmin, OfficeAdminParams, Principal, RecordKey, RegistryError, SuperAdmin,
    SuperAdminSeed, User, VerificationStatus, RESERVED_OFFICE_CODE,
};
use crate::ports::inbound::IdentityApi;
use tracing::{info, info_span, warn};

impl<L, C> IdentityApi for RegistryService<L, C>
where
    L: LedgerStore,
    C: RecordCodec,
{
    fn init_ledger(&self, seed: &SuperAdminSeed) -> Result<SuperAdmin, RegistryError> {
        const OP: &str = "init_ledger";
        let _span = info_span!("init_ledger").entered();
        require_non_empty(OP, "credential", &seed.credential)?;

        let mut uow = self.begin(OP);
        let key = RecordKey::SuperAdmin;
        if uow.exists(&key)? {
            return Err(conflict(OP, &key, "ledger already initialised"));
        }
        let admin = SuperAdmin::from(seed);
        uow.stage(&key, &admin)?;
        uow.commit()?;

        info!("[tc-registry] ledger initialised, super admin {}", admin.uid);
        Ok(admin)
    }

    fn verify_credential(
        &self,
        principal_key: &str,
        secret: &str,
    ) -> Result<bool, RegistryError> {
        let mut uow = self.begin("verify_credential");
        let principal = uow.load_principal(&RecordKey::parse(principal_key))?;
        Ok(principal.credential() == secret)
    }

    fn create_or_replace_office_admin(
        &self,
        caller_key: &str,
        caller_secret: &str,
        params: &OfficeAdminParams,
    ) -> Result<OfficeAdmin, RegistryError> {
        const OP: &str = "create_or_replace_office_admin";
        let _span = info_span!("create_or_replace_office_admin", office = %params.office_code)
            .entered();

        require_non_empty(OP, "office_code", &params.office_code)?;
        if params.office_code == RESERVED_OFFICE_CODE {
            return Err(invalid(OP, "office_code", "reserved for the super admin"));
        }

        let caller = RecordKey::parse(caller_key);
        if caller != RecordKey::SuperAdmin {
            return Err(RegistryError::CredentialMismatch {
                op: OP,
                key: caller.to_string(),
            });
        }

        let mut uow = self.begin(OP);
        uow.authenticate(&caller, caller_secret)?;

        let key = RecordKey::office_admin(&params.office_code);
        if let Some(previous) = uow.load_optional::<OfficeAdmin>(&key)? {
            if !previous.to_approve.is_empty() {
                warn!(
                    "[tc-registry] replacing {} discards {} queued approvals: {:?}",
                    key,
                    previous.to_approve.len(),
                    previous.to_approve
                );
            }
        }

        let admin = OfficeAdmin::new(&params.credential, &params.uid, &params.name);
        uow.stage(&key, &admin)?;
        uow.commit()?;

        info!("[tc-registry] office admin {} set to {}", key, admin.uid);
        Ok(admin)
    }

    fn create_user(&self, uid: &str, name: &str) -> Result<User, RegistryError> {
        const OP: &str = "create_user";
        let _span = info_span!("create_user", uid).entered();
        require_non_empty(OP, "uid", uid)?;

        let mut uow = self.begin(OP);
        let key = RecordKey::user(uid);
        if uow.exists(&key)? {
            return Err(conflict(OP, &key, "user already exists"));
        }
        let user = User::new(uid, name);
        uow.stage(&key, &user)?;
        uow.commit()?;

        info!("[tc-registry] user {} created", uid);
        Ok(user)
    }

    fn modify_user(
        &self,
        uid: &str,
        name: Option<&str>,
        status: Option<VerificationStatus>,
    ) -> Result<User, RegistryError> {
        const OP: &str = "modify_user";
        let _span = info_span!("modify_user", uid).entered();

        let mut uow = self.begin(OP);
        let key = RecordKey::user(uid);
        let mut user: User = uow.load(&key)?;
        let before = user.clone();

        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(status) = status {
            user.status = status;
        }

        if user != before {
            uow.stage(&key, &user)?;
            uow.commit()?;
            info!("[tc-registry] user {} modified", uid);
        }
        Ok(user)
    }

    fn verify_user(
        &self,
        caller_key: &str,
        caller_secret: &str,
        status: VerificationStatus,
        new_secret: &str,
    ) -> Result<User, RegistryError> {
        const OP: &str = "verify_user";
        let _span = info_span!("verify_user", caller = caller_key).entered();
        require_non_empty(OP, "new_secret", new_secret)?;

        let caller = RecordKey::parse(caller_key);
        if !matches!(caller, RecordKey::User(_)) {
            return Err(invalid(OP, "caller_key", "must name a user"));
        }

        let mut uow = self.begin(OP);
        let mut user = match uow.authenticate(&caller, caller_secret)? {
            Principal::User(user) => user,
            _ => return Err(invalid(OP, "caller_key", "must name a user")),
        };
        user.status = status;
        user.credential = new_secret.to_string();
        uow.stage(&caller, &user)?;
        uow.commit()?;

        info!("[tc-registry] user {} verified with status {:?}", user.uid, status);
        Ok(user)
    }

    fn user(&self, uid: &str) -> Result<User, RegistryError> {
        self.begin("user").load(&RecordKey::user(uid))
    }

    fn office_admin(&self, office_code: &str) -> Result<OfficeAdmin, RegistryError> {
        self.begin("office_admin")
            .load(&RecordKey::office_admin(office_code))
    }
}

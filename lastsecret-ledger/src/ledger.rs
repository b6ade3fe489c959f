//! The access ledger state machine
//!
//! One `SecretLedger` is one deployment: a protected value, the owner that
//! controls it, the enablement table, and the signing domain grants must
//! target. The host environment serializes calls, so every operation sees
//! its pre-state, decides, and writes post-state before the next call is
//! observed; nothing here needs interior locking.

use std::collections::HashMap;

use lastsecret_core::{AccessGrant, Address, LedgerDomain};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::verifier::DelegationVerifier;
use crate::Result;

pub struct SecretLedger {
    domain: LedgerDomain,
    owner: Option<Address>,
    secret: u64,
    enabled: HashMap<Address, bool>,
    clock: Box<dyn Clock>,
}

impl SecretLedger {
    /// Create an uninitialized ledger over wall-clock time
    pub fn new(domain: LedgerDomain) -> Self {
        Self::with_clock(domain, Box::new(SystemClock))
    }

    /// Create an uninitialized ledger with an explicit time source
    pub fn with_clock(domain: LedgerDomain, clock: Box<dyn Clock>) -> Self {
        SecretLedger {
            domain,
            owner: None,
            secret: 0,
            enabled: HashMap::new(),
            clock,
        }
    }

    /// One-shot setup: the first caller becomes the owner, the protected
    /// value starts at zero, the enablement table starts empty
    pub fn initialize(&mut self, caller: Address) -> Result<()> {
        if self.owner.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        self.owner = Some(caller);
        self.secret = 0;
        self.enabled.clear();

        info!(owner = %caller, ledger = %self.domain.ledger, "ledger initialized");
        Ok(())
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    pub fn domain(&self) -> &LedgerDomain {
        &self.domain
    }

    /// Whether an identity is currently enabled. Absent entries read as
    /// disabled.
    pub fn is_enabled(&self, identity: &Address) -> bool {
        self.enabled.get(identity).copied().unwrap_or(false)
    }

    /// Owner-only write of the protected value
    pub fn set_value(&mut self, caller: Address, new_value: u64) -> Result<()> {
        self.require_owner(caller)?;
        self.secret = new_value;

        debug!(caller = %caller, "owner updated the protected value");
        Ok(())
    }

    /// Owner-only read of the protected value
    pub fn get_value(&self, caller: Address) -> Result<u64> {
        self.require_owner(caller)?;
        Ok(self.secret)
    }

    /// Owner-only toggle of an identity's enablement. Overwrites any
    /// previous entry; enabling twice is the same as enabling once.
    pub fn set_enabled(&mut self, caller: Address, identity: Address, flag: bool) -> Result<()> {
        self.require_owner(caller)?;
        self.enabled.insert(identity, flag);

        debug!(identity = %identity, flag, "enablement entry updated");
        Ok(())
    }

    /// Delegated write: any caller presenting a grant that survives
    /// verification
    pub fn set_value_delegated(
        &mut self,
        caller: Address,
        new_value: u64,
        grant: &AccessGrant,
    ) -> Result<()> {
        self.verify_grant(caller, grant)?;
        self.secret = new_value;

        debug!(caller = %caller, "delegate updated the protected value");
        Ok(())
    }

    /// Delegated read
    pub fn get_value_delegated(&self, caller: Address, grant: &AccessGrant) -> Result<u64> {
        self.verify_grant(caller, grant)?;
        Ok(self.secret)
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        match self.owner {
            Some(owner) if owner.constant_time_eq(&caller) => Ok(()),
            _ => Err(LedgerError::Unauthorized),
        }
    }

    fn verify_grant(&self, caller: Address, grant: &AccessGrant) -> Result<()> {
        // Before initialization there is no owner to have signed anything
        let owner = self.owner.ok_or(LedgerError::Unauthorized)?;

        let verifier =
            DelegationVerifier::new(owner, &self.domain, &self.enabled, self.clock.now());
        let outcome = verifier.verify(caller, grant);

        if let Err(ref err) = outcome {
            debug!(caller = %caller, error = %err, "delegated call rejected");
        }
        outcome
    }
}

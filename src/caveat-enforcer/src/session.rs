//! Cumulative spend tracking for one redemption flow.

use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::{Address, U256};
use caveat_policy_types::Delegation;
use parking_lot::Mutex;

use crate::{
    errors::Violation,
    evaluator::{self, ProposedCall},
};

/// Spend state for a sequence of calls redeeming one delegation.
///
/// Sessions never share counters: two sessions over the same delegation track spend
/// independently. Spend only grows, and only through [`evaluator::authorize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnforcementSession {
    delegation: Arc<Delegation>,
    spent: BTreeMap<Address, U256>,
}

impl EnforcementSession {
    pub fn new(delegation: Delegation) -> Self {
        Self::with_shared_delegation(Arc::new(delegation))
    }

    pub fn with_shared_delegation(delegation: Arc<Delegation>) -> Self {
        Self {
            delegation,
            spent: BTreeMap::new(),
        }
    }

    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    /// Cumulative amount of `token` authorized so far.
    pub fn spent(&self, token: Address) -> U256 {
        self.spent.get(&token).copied().unwrap_or(U256::ZERO)
    }

    /// Headroom under the tightest cap on `token`, `None` if the token is uncapped.
    pub fn remaining(&self, token: Address) -> Option<U256> {
        let cap = self
            .delegation
            .spend_caps()
            .filter(|cap| cap.token == token)
            .map(|cap| cap.max)
            .min()?;
        Some(cap.saturating_sub(self.spent(token)))
    }

    pub(crate) fn spent_totals(&self) -> &BTreeMap<Address, U256> {
        &self.spent
    }

    /// Apply the charges of a call that passed every caveat.
    pub(crate) fn commit(&mut self, charges: BTreeMap<Address, U256>) {
        for (token, amount) in charges {
            let entry = self.spent.entry(token).or_insert(U256::ZERO);
            *entry = entry.saturating_add(amount);
        }
    }
}

/// A session shared between concurrent callers.
///
/// The lock is held across the whole check-and-increment, so two calls that each fit under the
/// cap cannot both succeed when their sum does not.
#[derive(Clone, Debug)]
pub struct SharedSession {
    inner: Arc<Mutex<EnforcementSession>>,
}

impl SharedSession {
    pub fn new(session: EnforcementSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn authorize(&self, call: &ProposedCall) -> Result<(), Violation> {
        let mut session = self.inner.lock();
        evaluator::authorize(&mut session, call)
    }

    pub fn spent(&self, token: Address) -> U256 {
        self.inner.lock().spent(token)
    }

    pub fn snapshot(&self) -> EnforcementSession {
        self.inner.lock().clone()
    }
}

impl From<EnforcementSession> for SharedSession {
    fn from(session: EnforcementSession) -> Self {
        Self::new(session)
    }
}

use std::collections::BTreeMap;

use alloy_primitives::{Address, Selector, U256};
use caveat_policy_types::{
    AmountLocation, Caveat, CaveatKind, Delegation, SpendCap, SwapConstraints, SwapField,
    SwapParams, TokenLocation,
};

use crate::{
    abi::{
        argument_offset, decode_address, decode_selector, decode_uint256, parse_address,
        parse_call_data,
    },
    errors::{DecodeError, SwapValue, Violation},
    resolution::decode_swap_params,
    session::EnforcementSession,
};

/// A call the delegatee wants to make on the delegator's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposedCall {
    pub caller: Address,
    pub target: Address,
    pub call_data: Vec<u8>,
    pub value: U256,
    /// Present only for swap calls; `SwapConstraints` is skipped otherwise.
    pub swap_params: Option<SwapParams>,
}

impl ProposedCall {
    pub fn new(
        caller: Address,
        target: Address,
        call_data: impl Into<Vec<u8>>,
        value: U256,
    ) -> Self {
        Self {
            caller,
            target,
            call_data: call_data.into(),
            value,
            swap_params: None,
        }
    }

    /// Build a call from hex text. Addresses and call data may use any letter case and an
    /// optional `0x` prefix.
    pub fn from_hex(
        caller: &str,
        target: &str,
        call_data: &str,
        value: U256,
    ) -> Result<Self, DecodeError> {
        Ok(Self::new(
            parse_address(caller)?,
            parse_address(target)?,
            parse_call_data(call_data)?,
            value,
        ))
    }

    pub fn with_swap_params(mut self, params: SwapParams) -> Self {
        self.swap_params = Some(params);
        self
    }

    /// Attach swap params decoded from the call's own data, if it is an `exactInputSingle`.
    pub fn with_decoded_swap_params(mut self) -> Result<Self, DecodeError> {
        self.swap_params = decode_swap_params(&self.call_data)?;
        Ok(self)
    }
}

/// Authorize `call` against the session's delegation.
///
/// Checks run in caveat order and stop at the first violation. Spend is committed only after
/// every caveat has passed; a rejected call leaves the session untouched.
pub fn authorize(session: &mut EnforcementSession, call: &ProposedCall) -> Result<(), Violation> {
    let charges = evaluate(session.delegation(), session.spent_totals(), call)?;
    session.commit(charges);
    Ok(())
}

/// One-shot check against a zero spend baseline. Nothing is recorded.
pub fn validate(delegation: &Delegation, call: &ProposedCall) -> Result<(), Violation> {
    evaluate(delegation, &BTreeMap::new(), call).map(|_| ())
}

/// Amount of the capped token `call` would move, or `None` if its method is not declared as
/// moving a token or the token it moves is not the capped one.
pub fn spend_amount(cap: &SpendCap, call: &ProposedCall) -> Result<Option<U256>, DecodeError> {
    let Ok(selector) = decode_selector(&call.call_data) else {
        return Ok(None);
    };
    let Some(source) = cap.amount_source(selector) else {
        return Ok(None);
    };
    let token = match source.token {
        TokenLocation::CallTarget => call.target,
        TokenLocation::Argument(index) => decode_address(&call.call_data, argument_offset(index))?,
    };
    if token != cap.token {
        return Ok(None);
    }
    match source.location {
        AmountLocation::CallValue => Ok(Some(call.value)),
        AmountLocation::Argument(index) => {
            decode_uint256(&call.call_data, argument_offset(index)).map(Some)
        }
    }
}

/// Per-token spend a passing call would add.
type Charges = BTreeMap<Address, U256>;

fn evaluate(
    delegation: &Delegation,
    spent: &BTreeMap<Address, U256>,
    call: &ProposedCall,
) -> Result<Charges, Violation> {
    if call.caller != delegation.delegatee {
        return Err(Violation::NotDelegatee {
            caller: call.caller,
            delegatee: delegation.delegatee,
        });
    }

    let mut charges = Charges::new();
    for caveat in &delegation.caveats {
        match caveat {
            Caveat::AllowedTargets(allowed) => check_target(allowed, call.target)?,
            Caveat::AllowedMethods(allowed) => check_method(allowed, &call.call_data)?,
            Caveat::SpendCap(cap) => {
                let previous = spent.get(&cap.token).copied().unwrap_or(U256::ZERO);
                if let Some(amount) = check_spend(cap, previous, call)? {
                    // Caps on one token share a counter; the call moves the token once.
                    let charge = charges.entry(cap.token).or_insert(U256::ZERO);
                    *charge = (*charge).max(amount);
                }
            }
            Caveat::SwapConstraints(expected) => {
                if let Some(actual) = &call.swap_params {
                    check_swap(expected, actual)?;
                }
            }
        }
    }
    Ok(charges)
}

fn check_target(allowed: &[Address], target: Address) -> Result<(), Violation> {
    if allowed.contains(&target) {
        return Ok(());
    }
    Err(Violation::TargetNotAllowed {
        target,
        allowed: allowed.to_vec(),
    })
}

fn check_method(allowed: &[Selector], call_data: &[u8]) -> Result<(), Violation> {
    let selector = decode_selector(call_data).map_err(|source| Violation::Malformed {
        kind: CaveatKind::AllowedMethods,
        source,
    })?;
    if allowed.contains(&selector) {
        return Ok(());
    }
    Err(Violation::MethodNotAllowed {
        selector,
        allowed: allowed.to_vec(),
    })
}

fn check_spend(cap: &SpendCap, spent: U256, call: &ProposedCall) -> Result<Option<U256>, Violation> {
    let amount = spend_amount(cap, call).map_err(|source| Violation::Malformed {
        kind: CaveatKind::SpendCap,
        source,
    })?;
    let Some(amount) = amount else {
        return Ok(None);
    };
    match spent.checked_add(amount) {
        Some(total) if total <= cap.max => Ok(Some(amount)),
        _ => Err(Violation::CapExceeded {
            token: cap.token,
            spent,
            amount,
            cap: cap.max,
        }),
    }
}

fn check_swap(expected: &SwapConstraints, actual: &SwapParams) -> Result<(), Violation> {
    for field in SwapField::ALL {
        let (want, got) = match field {
            SwapField::TokenIn => (
                SwapValue::Address(expected.token_in),
                SwapValue::Address(actual.token_in),
            ),
            SwapField::TokenOut => (
                SwapValue::Address(expected.token_out),
                SwapValue::Address(actual.token_out),
            ),
            SwapField::Fee => (SwapValue::Fee(expected.fee), SwapValue::Fee(actual.fee)),
            SwapField::Recipient => (
                SwapValue::Address(expected.recipient),
                SwapValue::Address(actual.recipient),
            ),
        };
        if want != got {
            return Err(Violation::SwapConstraintViolation {
                field,
                expected: want,
                actual: got,
            });
        }
    }
    Ok(())
}

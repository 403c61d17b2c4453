use alloy_primitives::{Address, Selector, U256};
use caveat_policy_types::{CaveatKind, SwapField};
use thiserror::Error;

/// Errors while reading call data or textual ABI values.
///
/// These indicate a caller bug (bad input), not a constraint breach.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("call data too short: {len} bytes, need at least 4 for a selector")]
    CallDataTooShort { len: usize },
    #[error("malformed call data: need {needed} bytes to read word at offset {offset}, got {len}")]
    MalformedCallData {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("invalid hex value {value:?}: expected {expected_bytes} bytes")]
    InvalidHex {
        value: String,
        expected_bytes: usize,
    },
    #[error("call data {0:?} is not valid hex")]
    InvalidCallDataHex(String),
}

/// A swap field value, rendered in violation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapValue {
    Address(Address),
    Fee(u32),
}

impl std::fmt::Display for SwapValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapValue::Address(address) => write!(f, "{address}"),
            SwapValue::Fee(fee) => write!(f, "{fee}"),
        }
    }
}

/// Why a proposed call was rejected.
///
/// Returned to the redemption-execution collaborator; the engine never retries or logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("caller {caller} is not the delegatee {delegatee}")]
    NotDelegatee { caller: Address, delegatee: Address },

    #[error("AllowedTargets: target {target} not in allowed list {}", render_list(.allowed))]
    TargetNotAllowed {
        target: Address,
        allowed: Vec<Address>,
    },

    #[error("AllowedMethods: selector {selector} not in allowed list {}", render_list(.allowed))]
    MethodNotAllowed {
        selector: Selector,
        allowed: Vec<Selector>,
    },

    #[error(
        "SpendCap: spend {} of token {token} exceeds cap {cap} (already spent {spent})",
        attempted(.spent, .amount)
    )]
    CapExceeded {
        token: Address,
        spent: U256,
        amount: U256,
        cap: U256,
    },

    #[error("SwapConstraints.{field}: expected {expected}, got {actual}")]
    SwapConstraintViolation {
        field: SwapField,
        expected: SwapValue,
        actual: SwapValue,
    },

    #[error("{kind}: {source}")]
    Malformed {
        kind: CaveatKind,
        #[source]
        source: DecodeError,
    },
}

impl Violation {
    /// Caveat kind that rejected the call; `None` for identity failures.
    pub fn caveat_kind(&self) -> Option<CaveatKind> {
        match self {
            Violation::NotDelegatee { .. } => None,
            Violation::TargetNotAllowed { .. } => Some(CaveatKind::AllowedTargets),
            Violation::MethodNotAllowed { .. } => Some(CaveatKind::AllowedMethods),
            Violation::CapExceeded { .. } => Some(CaveatKind::SpendCap),
            Violation::SwapConstraintViolation { .. } => Some(CaveatKind::SwapConstraints),
            Violation::Malformed { kind, .. } => Some(*kind),
        }
    }

    /// True when the call was rejected for bad input rather than a policy breach.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Violation::Malformed { .. })
    }
}

fn attempted(spent: &U256, amount: &U256) -> U256 {
    spent.saturating_add(*amount)
}

fn render_list<T: std::fmt::Display>(items: &[T]) -> String {
    let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Faults while assembling bytecode. These are compiler bugs, not policy outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("label `{0}` is referenced but never defined")]
    UnresolvedLabel(String),
    #[error("label `{0}` is defined more than once")]
    DuplicateLabel(String),
    #[error("label `{label}` resolves to offset {offset}, which does not fit a {width}-byte immediate")]
    LabelOutOfRange {
        label: String,
        offset: usize,
        width: usize,
    },
    #[error("immediate {value} does not fit a {width}-byte push")]
    ImmediateTooWide { value: U256, width: usize },
}

use alloc::vec::Vec;
use core::fmt;

use alloy_primitives::{Address, Selector, U256};

/// Caveat kinds, in the order the resolution layer emits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaveatKind {
    AllowedTargets,
    AllowedMethods,
    SpendCap,
    SwapConstraints,
}

impl CaveatKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CaveatKind::AllowedTargets => "AllowedTargets",
            CaveatKind::AllowedMethods => "AllowedMethods",
            CaveatKind::SpendCap => "SpendCap",
            CaveatKind::SwapConstraints => "SwapConstraints",
        }
    }
}

impl fmt::Display for CaveatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the spent amount lives for a given method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmountLocation {
    /// Zero-based index of the 32-byte ABI word after the selector (byte offset `4 + 32 * i`).
    Argument(usize),
    /// The call's `value` field.
    CallValue,
}

impl AmountLocation {
    /// Byte offset of the amount word in call data, if it lives there.
    pub const fn call_data_offset(self) -> Option<usize> {
        match self {
            AmountLocation::Argument(index) => Some(4 + index * 32),
            AmountLocation::CallValue => None,
        }
    }
}

/// Where a call names the token it moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenLocation {
    /// The call's target is the token contract (ERC-20 `approve`, `transfer`).
    CallTarget,
    /// Address word at this ABI argument index (eg, `tokenIn` of an `exactInputSingle`).
    Argument(usize),
}

impl TokenLocation {
    /// Byte offset of the token address word in call data, if it lives there.
    pub const fn call_data_offset(self) -> Option<usize> {
        match self {
            TokenLocation::Argument(index) => Some(4 + index * 32),
            TokenLocation::CallTarget => None,
        }
    }
}

/// Declares that calls to `selector` move the token found at `token`, with the amount at
/// `location`. The call is charged only when that token is the capped one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AmountSource {
    pub selector: Selector,
    pub token: TokenLocation,
    pub location: AmountLocation,
}

/// Cumulative cap on the amount of `token` a delegation may move.
///
/// Only calls whose selector appears in `amounts`, and which move `token`, count against it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpendCap {
    pub token: Address,
    pub max: U256,
    pub amounts: Vec<AmountSource>,
}

impl SpendCap {
    pub fn new(token: Address, max: U256) -> Self {
        Self {
            token,
            max,
            amounts: Vec::new(),
        }
    }

    /// Count calls to `selector` made on the token contract itself, reading the amount from
    /// `location`.
    pub fn with_amount_at(self, selector: Selector, location: AmountLocation) -> Self {
        self.with_amount_for(selector, TokenLocation::CallTarget, location)
    }

    /// Count calls to `selector` whose moved token is found at `token`.
    pub fn with_amount_for(
        mut self,
        selector: Selector,
        token: TokenLocation,
        location: AmountLocation,
    ) -> Self {
        self.amounts.push(AmountSource {
            selector,
            token,
            location,
        });
        self
    }

    pub fn amount_source(&self, selector: Selector) -> Option<&AmountSource> {
        self.amounts.iter().find(|source| source.selector == selector)
    }
}

/// Expected swap parameters. Fee is a Uniswap V3 fee tier (`uint24`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwapConstraints {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
}

/// Swap parameters decoded from a proposed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
}

/// Fields checked by [`SwapConstraints`], in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapField {
    TokenIn,
    TokenOut,
    Fee,
    Recipient,
}

impl SwapField {
    pub const ALL: [SwapField; 4] = [
        SwapField::TokenIn,
        SwapField::TokenOut,
        SwapField::Fee,
        SwapField::Recipient,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SwapField::TokenIn => "tokenIn",
            SwapField::TokenOut => "tokenOut",
            SwapField::Fee => "fee",
            SwapField::Recipient => "recipient",
        }
    }
}

impl fmt::Display for SwapField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single constraint attached to a delegation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Caveat {
    AllowedTargets(Vec<Address>),
    AllowedMethods(Vec<Selector>),
    SpendCap(SpendCap),
    SwapConstraints(SwapConstraints),
}

impl Caveat {
    pub const fn kind(&self) -> CaveatKind {
        match self {
            Caveat::AllowedTargets(_) => CaveatKind::AllowedTargets,
            Caveat::AllowedMethods(_) => CaveatKind::AllowedMethods,
            Caveat::SpendCap(_) => CaveatKind::SpendCap,
            Caveat::SwapConstraints(_) => CaveatKind::SwapConstraints,
        }
    }
}

/// A grant from `delegator` letting `delegatee` act within `caveats`.
///
/// Holds no enforcement state; cumulative spend is tracked per session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Delegation {
    pub delegator: Address,
    pub delegatee: Address,
    pub caveats: Vec<Caveat>,
}

impl Delegation {
    pub fn new(delegator: Address, delegatee: Address, caveats: Vec<Caveat>) -> Self {
        Self {
            delegator,
            delegatee,
            caveats,
        }
    }

    /// First caveat of the given kind, if any.
    pub fn caveat(&self, kind: CaveatKind) -> Option<&Caveat> {
        self.caveats.iter().find(|caveat| caveat.kind() == kind)
    }

    pub fn spend_caps(&self) -> impl Iterator<Item = &SpendCap> {
        self.caveats.iter().filter_map(|caveat| match caveat {
            Caveat::SpendCap(cap) => Some(cap),
            _ => None,
        })
    }
}

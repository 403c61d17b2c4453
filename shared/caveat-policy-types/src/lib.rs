//! Shared types for delegation caveat enforcement.
//!
//! Used by the off-chain evaluator, the on-chain enforcer compiler, and the tooling that encodes
//! enforcer call data, so all three agree on one data model.

#![no_std]

extern crate alloc;

pub mod caveats;
pub mod enforcers;
pub mod opcodes;
pub mod tokens;

pub use caveats::{
    AmountLocation, AmountSource, Caveat, CaveatKind, Delegation, SpendCap, SwapConstraints,
    SwapField, SwapParams, TokenLocation,
};
pub use enforcers::EnforcerKind;
pub use opcodes::Opcode;
pub use tokens::{SwapPair, Token};

//! Caveat engine for delegated calls.
//!
//! A delegator grants a delegatee the right to act on its behalf within a list of caveats:
//! which contracts may be called, which methods, how much of a token may be moved in total, and
//! which swap parameters are acceptable. The same decisions are made twice:
//! - off-chain, by [`evaluator::authorize`] against an [`EnforcementSession`], as a pre-flight
//!   check;
//! - on-chain, by enforcer contracts whose bytecode [`compiler`] emits.
//!
//! The library performs no I/O and no logging; every outcome is a typed result.

pub mod abi;
pub mod assembler;
pub mod compiler;
pub mod errors;
pub mod evaluator;
pub mod registry;
pub mod resolution;
pub mod session;

#[cfg(test)]
mod mock_evm;
#[cfg(test)]
mod tests;

pub use caveat_policy_types::{
    AmountLocation, AmountSource, Caveat, CaveatKind, Delegation, EnforcerKind, SpendCap,
    SwapConstraints, SwapField, SwapPair, SwapParams, Token, TokenLocation,
};

pub use assembler::{AssembledProgram, Assembler, Instruction, Label};
pub use compiler::{compile, compile_all, deployable_code, runtime_code, EnforcerArtifact};
pub use errors::{AssemblerError, DecodeError, SwapValue, Violation};
pub use evaluator::{authorize, validate, ProposedCall};
pub use resolution::{resolve_caveats, resolve_delegation, SwapIntent};
pub use session::{EnforcementSession, SharedSession};

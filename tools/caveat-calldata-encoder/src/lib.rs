//! Call data for the redemption flow: `enforce(...)` calls into compiled enforcers, and the
//! delegated actions those enforcers guard.
//!
//! Hashing uses `sha3` directly rather than the engine's selector helpers, so the two can be
//! checked against each other.

pub mod actions;
pub mod encoder;


pub use actions::{
    encode_approve, encode_exact_input_single, encode_transfer, ActionError, ExactInputSingle,
};
pub use encoder::{
    encode_allowed_methods_call, encode_allowed_targets_call, encode_caveat_check,
    encode_value_limit_call, enforcer_selector, function_selector,
};

//! Static lookup tables for tokens, pools and the swap router, plus the Solidity interfaces the
//! engine decodes and encodes against.
//!
//! Registry data is read-only and supplied to resolution; it carries no decision logic.

pub mod constants;
pub mod interfaces;

pub use constants::{pair, pairs, token, tokens, SWAP_ROUTER_02};

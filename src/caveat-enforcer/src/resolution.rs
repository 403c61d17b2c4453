//! Intent to caveat-list resolution.
//!
//! A delegated swap intent ("swap token A for B, spending at most X of A, paying out to R")
//! maps to a fixed, ordered caveat list. Resolution is pure: every call builds a fresh list and
//! nothing is shared between calls.

use alloy_primitives::{Address, Selector, U256};
use alloy_sol_types::SolCall;
use caveat_policy_types::{
    AmountLocation, Caveat, Delegation, SpendCap, SwapConstraints, SwapPair, SwapParams,
    TokenLocation,
};
use once_cell::sync::Lazy;

use crate::{
    abi::{decode_selector, selector_of},
    errors::DecodeError,
    registry::{self, interfaces::ISwapRouter02},
};

pub const APPROVE_SIGNATURE: &str = "approve(address,uint256)";
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const EXACT_INPUT_SINGLE_SIGNATURE: &str =
    "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))";

static APPROVE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector_of(APPROVE_SIGNATURE));
static TRANSFER_SELECTOR: Lazy<Selector> = Lazy::new(|| selector_of(TRANSFER_SIGNATURE));
static EXACT_INPUT_SINGLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector_of(EXACT_INPUT_SINGLE_SIGNATURE));

/// Word index of `amount` in `approve(address,uint256)` / `transfer(address,uint256)`.
pub const TRANSFER_AMOUNT_ARGUMENT: usize = 1;
/// Word index of `amountIn` in the inline `exactInputSingle` params tuple.
pub const EXACT_INPUT_AMOUNT_ARGUMENT: usize = 4;
/// `tokenIn` word of the inline `exactInputSingle` params tuple.
pub const EXACT_INPUT_TOKEN_ARGUMENT: usize = 0;

pub fn approve_selector() -> Selector {
    *APPROVE_SELECTOR
}

pub fn transfer_selector() -> Selector {
    *TRANSFER_SELECTOR
}

pub fn exact_input_single_selector() -> Selector {
    *EXACT_INPUT_SINGLE_SELECTOR
}

/// A delegated single-hop swap, with `max_amount_in` already in the input token's raw units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapIntent {
    pub pair: SwapPair,
    pub max_amount_in: U256,
    pub recipient: Address,
    pub router: Address,
}

impl SwapIntent {
    /// Swap through the registry's SwapRouter02.
    pub fn new(pair: SwapPair, max_amount_in: U256, recipient: Address) -> Self {
        Self {
            pair,
            max_amount_in,
            recipient,
            router: registry::SWAP_ROUTER_02,
        }
    }

    pub fn with_router(mut self, router: Address) -> Self {
        self.router = router;
        self
    }
}

/// Caveats for a swap intent, always in the order
/// `AllowedTargets, AllowedMethods, SpendCap, SwapConstraints`.
pub fn resolve_caveats(intent: &SwapIntent) -> Vec<Caveat> {
    let token_in = intent.pair.token_in.address;
    let spend_cap = SpendCap::new(token_in, intent.max_amount_in)
        .with_amount_at(
            approve_selector(),
            AmountLocation::Argument(TRANSFER_AMOUNT_ARGUMENT),
        )
        .with_amount_for(
            exact_input_single_selector(),
            TokenLocation::Argument(EXACT_INPUT_TOKEN_ARGUMENT),
            AmountLocation::Argument(EXACT_INPUT_AMOUNT_ARGUMENT),
        );

    vec![
        Caveat::AllowedTargets(vec![token_in, intent.router]),
        Caveat::AllowedMethods(vec![approve_selector(), exact_input_single_selector()]),
        Caveat::SpendCap(spend_cap),
        Caveat::SwapConstraints(SwapConstraints {
            token_in,
            token_out: intent.pair.token_out.address,
            fee: intent.pair.fee,
            recipient: intent.recipient,
        }),
    ]
}

pub fn resolve_delegation(delegator: Address, delegatee: Address, intent: &SwapIntent) -> Delegation {
    Delegation::new(delegator, delegatee, resolve_caveats(intent))
}

/// Caveats for the registry's USDC -> WETH pair.
pub fn usdc_weth_swap_caveats(max_usdc: U256, recipient: Address) -> Vec<Caveat> {
    use registry::constants::{POOL_FEE, POOL_USDC_WETH_030, TOKEN_USDC, TOKEN_WETH};
    let pair = SwapPair::new(TOKEN_USDC, TOKEN_WETH, POOL_USDC_WETH_030, POOL_FEE);
    resolve_caveats(&SwapIntent::new(pair, max_usdc, recipient))
}

/// Decode the swap parameters of an `exactInputSingle` call.
///
/// Returns `Ok(None)` for any other selector.
pub fn decode_swap_params(call_data: &[u8]) -> Result<Option<SwapParams>, DecodeError> {
    let selector = decode_selector(call_data)?;
    if selector != exact_input_single_selector() {
        return Ok(None);
    }
    let call = ISwapRouter02::exactInputSingleCall::abi_decode(call_data, true).map_err(|_| {
        DecodeError::MalformedCallData {
            offset: 4,
            needed: 4 + 7 * 32,
            len: call_data.len(),
        }
    })?;
    let params = call.params;
    Ok(Some(SwapParams {
        token_in: params.tokenIn,
        token_out: params.tokenOut,
        fee: params.fee.to::<u32>(),
        recipient: params.recipient,
    }))
}

use alloy_primitives::{Address, Selector, U256};
use thiserror::Error;

use crate::encoder::{function_selector, push_address, push_uint};

pub const APPROVE_SIGNATURE: &str = "approve(address,uint256)";
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const EXACT_INPUT_SINGLE_SIGNATURE: &str =
    "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))";

/// SwapRouter02 `exactInputSingle` parameters. `fee` is a `uint24` fee tier and
/// `sqrt_price_limit_x96` a `uint160`; both are range-checked when encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExactInputSingle {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub sqrt_price_limit_x96: U256,
}

/// Error for parameters that do not fit their Solidity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("fee {0} does not fit uint24")]
    FeeOutOfRange(u32),
    #[error("sqrtPriceLimitX96 does not fit uint160")]
    PriceLimitOutOfRange,
}

fn encode_two_word_call(selector: Selector, to: Address, amount: U256) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 64);
    buf.extend_from_slice(selector.as_slice());
    push_address(&mut buf, to);
    push_uint(&mut buf, amount);
    buf
}

/// `approve(spender, amount)`
pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    encode_two_word_call(function_selector(APPROVE_SIGNATURE), spender, amount)
}

/// `transfer(to, amount)`
pub fn encode_transfer(to: Address, amount: U256) -> Vec<u8> {
    encode_two_word_call(function_selector(TRANSFER_SIGNATURE), to, amount)
}

/// `exactInputSingle(params)`. The params tuple is static, so it is encoded inline.
pub fn encode_exact_input_single(params: &ExactInputSingle) -> Result<Vec<u8>, ActionError> {
    if params.fee >= 1 << 24 {
        return Err(ActionError::FeeOutOfRange(params.fee));
    }
    if params.sqrt_price_limit_x96.bit_len() > 160 {
        return Err(ActionError::PriceLimitOutOfRange);
    }

    let mut buf = Vec::with_capacity(4 + 32 * 7);
    buf.extend_from_slice(function_selector(EXACT_INPUT_SINGLE_SIGNATURE).as_slice());
    push_address(&mut buf, params.token_in);
    push_address(&mut buf, params.token_out);
    push_uint(&mut buf, U256::from(params.fee));
    push_address(&mut buf, params.recipient);
    push_uint(&mut buf, params.amount_in);
    push_uint(&mut buf, params.amount_out_minimum);
    push_uint(&mut buf, params.sqrt_price_limit_x96);
    Ok(buf)
}

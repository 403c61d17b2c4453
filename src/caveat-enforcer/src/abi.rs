//! Fixed-width ABI scalar codec.
//!
//! All integers are unsigned 256-bit big-endian words; addresses occupy the low 20 bytes of a
//! word and selectors the high 4 bytes (right-padded).

use alloy_primitives::{keccak256, Address, Selector, U256};

use crate::errors::DecodeError;

pub const WORD: usize = 32;
pub const SELECTOR_LEN: usize = 4;

/// First four bytes of the Keccak-256 hash of a canonical function signature.
pub fn selector_of(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..SELECTOR_LEN])
}

/// Byte offset of the `index`-th argument word in call data (after the selector).
pub const fn argument_offset(index: usize) -> usize {
    SELECTOR_LEN + index * WORD
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(WORD).ok_or(DecodeError::MalformedCallData {
        offset,
        needed: usize::MAX,
        len: data.len(),
    })?;
    if data.len() < end {
        return Err(DecodeError::MalformedCallData {
            offset,
            needed: end,
            len: data.len(),
        });
    }
    Ok(&data[offset..end])
}

/// Read the 32-byte word at `offset` and return its low 20 bytes.
pub fn decode_address(data: &[u8], offset: usize) -> Result<Address, DecodeError> {
    let word = read_word(data, offset)?;
    Ok(Address::from_slice(&word[12..]))
}

pub fn decode_uint256(data: &[u8], offset: usize) -> Result<U256, DecodeError> {
    let word = read_word(data, offset)?;
    Ok(U256::from_be_slice(word))
}

/// First four bytes of `data`.
pub fn decode_selector(data: &[u8]) -> Result<Selector, DecodeError> {
    if data.len() < SELECTOR_LEN {
        return Err(DecodeError::CallDataTooShort { len: data.len() });
    }
    Ok(Selector::from_slice(&data[..SELECTOR_LEN]))
}

pub fn encode_address(address: Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_slice());
    word
}

pub fn encode_uint256(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

/// A `bytes4` argument: the selector followed by 28 zero bytes.
pub fn encode_selector_padded(selector: Selector) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[..SELECTOR_LEN].copy_from_slice(selector.as_slice());
    word
}

/// Offset word followed by length word, the head of a dynamic array argument.
pub fn encode_dynamic_array_header(offset: usize, length: usize) -> [u8; 2 * WORD] {
    let mut head = [0u8; 2 * WORD];
    head[..WORD].copy_from_slice(&encode_uint256(U256::from(offset)));
    head[WORD..].copy_from_slice(&encode_uint256(U256::from(length)));
    head
}

/// Parse a hex address in any letter case, with or without a `0x` prefix.
pub fn parse_address(value: &str) -> Result<Address, DecodeError> {
    parse_fixed::<20>(value).map(Address::from)
}

/// Parse a hex selector in any letter case, with or without a `0x` prefix.
pub fn parse_selector(value: &str) -> Result<Selector, DecodeError> {
    parse_fixed::<4>(value).map(Selector::from)
}

/// Parse hex call data of any length, with or without a `0x` prefix.
pub fn parse_call_data(value: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(strip_hex_prefix(value))
        .map_err(|_| DecodeError::InvalidCallDataHex(value.to_string()))
}

fn strip_hex_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

fn parse_fixed<const N: usize>(value: &str) -> Result<[u8; N], DecodeError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(strip_hex_prefix(value), &mut out).map_err(|_| {
        DecodeError::InvalidHex {
            value: value.to_string(),
            expected_bytes: N,
        }
    })?;
    Ok(out)
}

use alloy_primitives::{Address, FixedBytes, Selector, U256};
use caveat_policy_types::{Caveat, EnforcerKind};
use sha3::{Digest, Keccak256};

pub(crate) fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// Selector of a canonical signature such as `transfer(address,uint256)`.
pub fn function_selector(signature: &str) -> Selector {
    let hash = keccak256_bytes(signature.as_bytes());
    Selector::from_slice(&hash[..4])
}

pub fn enforcer_selector(kind: EnforcerKind) -> Selector {
    function_selector(kind.signature())
}

pub(crate) fn push_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(&[0u8; 12]);
    buf.extend_from_slice(address.as_slice());
}

pub(crate) fn push_uint(buf: &mut Vec<u8>, value: U256) {
    buf.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_selector_word(buf: &mut Vec<u8>, selector: Selector) {
    buf.extend_from_slice(selector.as_slice());
    buf.extend_from_slice(&[0u8; 28]);
}

/// Selector prefix of `enforce(scalar, T[] list)`, with room for the full encoding. The array
/// offset is always 0x40: the array follows the two head words.
fn allow_list_head(kind: EnforcerKind, len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 32 * (3 + len));
    buf.extend_from_slice(enforcer_selector(kind).as_slice());
    buf
}

/// `enforce(address target, address[] allowed)`
pub fn encode_allowed_targets_call(target: Address, allowed: &[Address]) -> Vec<u8> {
    let mut buf = allow_list_head(EnforcerKind::AllowedTargets, allowed.len());
    push_address(&mut buf, target);
    push_uint(&mut buf, U256::from(0x40u64));
    push_uint(&mut buf, U256::from(allowed.len()));
    for address in allowed {
        push_address(&mut buf, *address);
    }
    buf
}

/// `enforce(bytes4 selector, bytes4[] allowed)`
pub fn encode_allowed_methods_call(selector: Selector, allowed: &[Selector]) -> Vec<u8> {
    let mut buf = allow_list_head(EnforcerKind::AllowedMethods, allowed.len());
    push_selector_word(&mut buf, selector);
    push_uint(&mut buf, U256::from(0x40u64));
    push_uint(&mut buf, U256::from(allowed.len()));
    for allowed_selector in allowed {
        push_selector_word(&mut buf, *allowed_selector);
    }
    buf
}

/// `enforce(uint256 amount, uint256 cap)`
pub fn encode_value_limit_call(amount: U256, cap: U256) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 64);
    buf.extend_from_slice(enforcer_selector(EnforcerKind::ValueLimit).as_slice());
    push_uint(&mut buf, amount);
    push_uint(&mut buf, cap);
    buf
}

/// Build the enforcer call that re-checks `caveat` for a proposed call on-chain.
///
/// Returns `None` when the caveat has no enforcer or does not apply to this call (a spend cap
/// on a method it does not declare, or on a call moving some other token). Call data too short
/// to carry a selector, the token word or the amount word also yields `None`; the off-chain
/// evaluator reports those as malformed.
pub fn encode_caveat_check(
    caveat: &Caveat,
    target: Address,
    call_data: &[u8],
    value: U256,
) -> Option<(EnforcerKind, Vec<u8>)> {
    match caveat {
        Caveat::AllowedTargets(allowed) => Some((
            EnforcerKind::AllowedTargets,
            encode_allowed_targets_call(target, allowed),
        )),
        Caveat::AllowedMethods(allowed) => {
            let selector = Selector::try_from(call_data.get(..4)?).ok()?;
            Some((
                EnforcerKind::AllowedMethods,
                encode_allowed_methods_call(selector, allowed),
            ))
        }
        Caveat::SpendCap(cap) => {
            let selector = Selector::try_from(call_data.get(..4)?).ok()?;
            let source = cap.amount_source(selector)?;
            let token = match source.token.call_data_offset() {
                None => target,
                Some(offset) => Address::from_word(word_at(call_data, offset)?.into()),
            };
            if token != cap.token {
                return None;
            }
            let amount = match source.location.call_data_offset() {
                None => value,
                Some(offset) => U256::from_be_bytes(word_at(call_data, offset)?),
            };
            Some((EnforcerKind::ValueLimit, encode_value_limit_call(amount, cap.max)))
        }
        Caveat::SwapConstraints(_) => None,
    }
}

fn word_at(call_data: &[u8], offset: usize) -> Option<[u8; 32]> {
    call_data.get(offset..offset.checked_add(32)?)?.try_into().ok()
}

use alloy_primitives::{Address, U256};

/// Fungible token metadata. `balance_slot` is the ERC-20 balance mapping slot, used only by
/// test funding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
    pub balance_slot: u64,
}

impl Token {
    pub const fn new(symbol: &'static str, address: Address, decimals: u8, balance_slot: u64) -> Self {
        Self {
            symbol,
            address,
            decimals,
            balance_slot,
        }
    }

    /// Scale a whole-unit amount to the token's smallest unit.
    pub fn to_raw_units(&self, whole: u64) -> U256 {
        U256::from(whole) * U256::from(10u64).pow(U256::from(self.decimals))
    }
}

/// A pool-backed swap route. Fee is the Uniswap V3 fee tier in hundredths of a bip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwapPair {
    pub token_in: Token,
    pub token_out: Token,
    pub pool_address: Address,
    pub fee: u32,
}

impl SwapPair {
    pub const fn new(token_in: Token, token_out: Token, pool_address: Address, fee: u32) -> Self {
        Self {
            token_in,
            token_out,
            pool_address,
            fee,
        }
    }
}

//! Mainnet token, pool and router constants.

use alloy_primitives::{address, Address};
use caveat_policy_types::{SwapPair, Token};

pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
pub const WBTC: Address = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");

// Uniswap V3.
pub const SWAP_ROUTER_02: Address = address!("68b3465833fb72A70ecDF485E0e4C7bD8665Fc45");
pub const POOL_USDC_WETH_030: Address = address!("8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8");
pub const POOL_DAI_WETH_030: Address = address!("C2e9F25Be6257c210d7Adf0D4Cd6E3E881ba25f8");
pub const POOL_WBTC_WETH_030: Address = address!("CBCdF9626bC03E24f779434178A73a0B4bad62eD");
pub const POOL_USDT_WETH_030: Address = address!("4e68Ccd3E89f51C3074ca5072bbAC773960dFa36");

/// 0.3% fee tier.
pub const POOL_FEE: u32 = 3000;

pub const TOKEN_USDC: Token = Token::new("USDC", USDC, 6, 9);
pub const TOKEN_WETH: Token = Token::new("WETH", WETH, 18, 3);
pub const TOKEN_DAI: Token = Token::new("DAI", DAI, 18, 2);
pub const TOKEN_USDT: Token = Token::new("USDT", USDT, 6, 2);
pub const TOKEN_WBTC: Token = Token::new("WBTC", WBTC, 8, 0);

static TOKENS: [Token; 5] = [TOKEN_USDC, TOKEN_WETH, TOKEN_DAI, TOKEN_USDT, TOKEN_WBTC];

static PAIRS: [(&str, SwapPair); 4] = [
    (
        "USDC/WETH",
        SwapPair::new(TOKEN_USDC, TOKEN_WETH, POOL_USDC_WETH_030, POOL_FEE),
    ),
    (
        "DAI/WETH",
        SwapPair::new(TOKEN_DAI, TOKEN_WETH, POOL_DAI_WETH_030, POOL_FEE),
    ),
    (
        "WBTC/WETH",
        SwapPair::new(TOKEN_WBTC, TOKEN_WETH, POOL_WBTC_WETH_030, POOL_FEE),
    ),
    (
        "USDT/WETH",
        SwapPair::new(TOKEN_USDT, TOKEN_WETH, POOL_USDT_WETH_030, POOL_FEE),
    ),
];

pub fn tokens() -> &'static [Token] {
    &TOKENS
}

pub fn token(symbol: &str) -> Option<&'static Token> {
    TOKENS.iter().find(|token| token.symbol == symbol)
}

/// Registered pairs as `(name, pair)`, name formatted `IN/OUT`.
pub fn pairs() -> impl Iterator<Item = (&'static str, &'static SwapPair)> {
    PAIRS.iter().map(|(name, pair)| (*name, pair))
}

pub fn pair(name: &str) -> Option<&'static SwapPair> {
    PAIRS
        .iter()
        .find(|(pair_name, _)| *pair_name == name)
        .map(|(_, pair)| pair)
}

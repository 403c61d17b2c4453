//! Solidity ABI declarations for the contracts a delegated swap touches and for the compiled
//! enforcers.
//!
//! The engine hashes its own selectors from signature strings; these declarations are used to
//! decode structured call data and to keep the hashed selectors honest.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    interface ISwapRouter02 {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params)
            external
            payable
            returns (uint256 amountOut);
    }

    interface IAllowedTargetsEnforcer {
        function enforce(address target, address[] calldata allowed) external pure;
    }

    interface IAllowedMethodsEnforcer {
        function enforce(bytes4 selector, bytes4[] calldata allowed) external pure;
    }

    interface IValueLimitEnforcer {
        function enforce(uint256 amount, uint256 cap) external pure;
    }
}

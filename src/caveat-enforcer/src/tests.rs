#[cfg(test)]
mod tests {
    use crate::compiler::{compile, entry_selector, init_code, runtime_code};
    use crate::evaluator::{validate, ProposedCall};
    use crate::mock_evm::{self, Outcome};
    use crate::registry::constants::{SWAP_ROUTER_02, USDC, WETH};
    use crate::resolution::{
        approve_selector, exact_input_single_selector, resolve_caveats, transfer_selector,
        SwapIntent,
    };
    use alloy_primitives::{Address, Selector, U256};
    use caveat_calldata_encoder::{
        encode_allowed_methods_call, encode_allowed_targets_call, encode_approve,
        encode_caveat_check, encode_exact_input_single, encode_value_limit_call,
        enforcer_selector, function_selector, ExactInputSingle,
    };
    use caveat_policy_types::{AmountLocation, Caveat, Delegation, EnforcerKind, SpendCap};
    use proptest::prelude::*;

    fn delegatee() -> Address {
        Address::repeat_byte(0xde)
    }

    fn on_chain(kind: EnforcerKind, call_data: &[u8]) -> bool {
        mock_evm::call(&runtime_code(kind), call_data)
            .expect("enforcer faulted")
            .accepted()
    }

    fn off_chain(caveat: &Caveat, call: &ProposedCall) -> bool {
        let delegation = Delegation::new(Address::ZERO, delegatee(), vec![caveat.clone()]);
        validate(&delegation, call).is_ok()
    }

    #[test]
    fn test_selectors_agree_across_crates() {
        assert_eq!(approve_selector(), function_selector("approve(address,uint256)"));
        assert_eq!(transfer_selector(), function_selector("transfer(address,uint256)"));
        assert_eq!(
            exact_input_single_selector(),
            function_selector(
                "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))"
            )
        );
        for kind in EnforcerKind::ALL {
            assert_eq!(entry_selector(kind), enforcer_selector(kind));
        }
    }

    #[test]
    fn test_deploy_returns_runtime() {
        for kind in EnforcerKind::ALL {
            let artifact = compile(kind);
            let deployed = mock_evm::deploy(&artifact.deploy_data()).unwrap();
            assert_eq!(deployed, artifact.runtime, "{kind}");
        }
    }

    #[test]
    fn test_deploy_large_runtime() {
        let runtime: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let mut data = init_code(&runtime);
        data.extend_from_slice(&runtime);
        assert_eq!(mock_evm::deploy(&data).unwrap(), runtime);
    }

    #[test]
    fn test_allowed_targets_second_entry_and_miss() {
        let first = Address::repeat_byte(0x11);
        let second = Address::repeat_byte(0x22);
        let allowed = [first, second];

        let hit = encode_allowed_targets_call(second, &allowed);
        assert_eq!(
            mock_evm::call(&runtime_code(EnforcerKind::AllowedTargets), &hit),
            Ok(Outcome::Returned(Vec::new()))
        );

        let miss = encode_allowed_targets_call(Address::repeat_byte(0x33), &allowed);
        assert_eq!(
            mock_evm::call(&runtime_code(EnforcerKind::AllowedTargets), &miss),
            Ok(Outcome::Reverted(Vec::new()))
        );

        assert!(!on_chain(
            EnforcerKind::AllowedTargets,
            &encode_allowed_targets_call(first, &[])
        ));
    }

    fn with_length_word(mut data: Vec<u8>, length: u64) -> Vec<u8> {
        data[68..100].copy_from_slice(&U256::from(length).to_be_bytes::<32>());
        data
    }

    #[test]
    fn test_allow_list_length_beyond_call_data() {
        let zero_target = Address::ZERO;
        let empty = encode_allowed_targets_call(zero_target, &[]);
        assert!(!on_chain(EnforcerKind::AllowedTargets, &with_length_word(empty, 3)));

        let one = encode_allowed_targets_call(zero_target, &[USDC]);
        assert!(!on_chain(EnforcerKind::AllowedTargets, &one));
        assert!(!on_chain(EnforcerKind::AllowedTargets, &with_length_word(one, 2)));

        let real = encode_allowed_targets_call(zero_target, &[USDC, zero_target]);
        assert!(on_chain(EnforcerKind::AllowedTargets, &real));
        let mut truncated = real.clone();
        truncated.truncate(real.len() - 1);
        assert!(!on_chain(EnforcerKind::AllowedTargets, &truncated));

        let methods = encode_allowed_methods_call(Selector::ZERO, &[]);
        assert!(!on_chain(EnforcerKind::AllowedMethods, &with_length_word(methods, 1)));
    }

    #[test]
    fn test_wrong_entry_point_reverts() {
        let data = encode_allowed_targets_call(USDC, &[USDC]);
        assert!(on_chain(EnforcerKind::AllowedTargets, &data));
        assert!(!on_chain(EnforcerKind::AllowedMethods, &data));
        assert!(!on_chain(EnforcerKind::ValueLimit, &data));
        for kind in EnforcerKind::ALL {
            assert!(!on_chain(kind, &[]));
            assert!(!on_chain(kind, &[0xde, 0xad]));
        }
    }

    #[test]
    fn test_value_limit_boundary() {
        let cap = U256::from(10_000_000_000u64);
        assert!(on_chain(EnforcerKind::ValueLimit, &encode_value_limit_call(cap, cap)));
        assert!(on_chain(
            EnforcerKind::ValueLimit,
            &encode_value_limit_call(U256::ZERO, U256::ZERO)
        ));
        assert!(!on_chain(
            EnforcerKind::ValueLimit,
            &encode_value_limit_call(cap + U256::from(1u64), cap)
        ));
        assert!(!on_chain(
            EnforcerKind::ValueLimit,
            &encode_value_limit_call(U256::MAX, cap)
        ));
    }

    fn swap_data(amount_in: U256, fee: u32) -> Vec<u8> {
        encode_exact_input_single(&ExactInputSingle {
            token_in: USDC,
            token_out: WETH,
            fee,
            recipient: delegatee(),
            amount_in,
            amount_out_minimum: U256::ZERO,
            sqrt_price_limit_x96: U256::ZERO,
        })
        .unwrap()
    }

    #[test]
    fn test_resolved_caveats_agree_on_chain() {
        let pair = *crate::registry::pair("USDC/WETH").unwrap();
        let caveats = resolve_caveats(&SwapIntent::new(
            pair,
            U256::from(10_000_000_000u64),
            delegatee(),
        ));

        let calls = [
            (USDC, encode_approve(SWAP_ROUTER_02, U256::from(5_000_000_000u64))),
            (USDC, encode_approve(SWAP_ROUTER_02, U256::from(10_000_000_001u64))),
            (SWAP_ROUTER_02, swap_data(U256::from(10_000_000_000u64), 3000)),
            (SWAP_ROUTER_02, swap_data(U256::from(10_000_000_001u64), 3000)),
            (WETH, encode_approve(SWAP_ROUTER_02, U256::from(1u64))),
            (USDC, function_selector("transfer(address,uint256)").to_vec()),
        ];

        let mut checked = 0;
        for (target, data) in calls {
            let call = ProposedCall::new(delegatee(), target, data.clone(), U256::ZERO);
            for caveat in &caveats {
                let Some((kind, enforce)) = encode_caveat_check(caveat, target, &data, U256::ZERO)
                else {
                    continue;
                };
                assert_eq!(
                    on_chain(kind, &enforce),
                    off_chain(caveat, &call),
                    "{kind} disagrees for target {target}"
                );
                checked += 1;
            }
        }
        assert!(checked >= 12);
    }

    fn address_pool() -> Vec<Address> {
        let mut pool: Vec<Address> = (1..=6u8).map(Address::with_last_byte).collect();
        pool.push(Address::repeat_byte(0xff));
        pool.push(Address::ZERO);
        pool
    }

    fn selector_pool() -> Vec<Selector> {
        vec![
            approve_selector(),
            exact_input_single_selector(),
            transfer_selector(),
            Selector::from([0xff; 4]),
            Selector::from([0, 0, 0, 1]),
        ]
    }

    proptest! {
        #[test]
        fn allowed_targets_verdicts_agree(
            allowed in prop::sample::subsequence(address_pool(), 0..=8),
            target in prop::sample::select(address_pool()),
        ) {
            let call = ProposedCall::new(delegatee(), target, approve_selector().to_vec(), U256::ZERO);
            let caveat = Caveat::AllowedTargets(allowed.clone());
            let data = encode_allowed_targets_call(target, &allowed);
            prop_assert_eq!(on_chain(EnforcerKind::AllowedTargets, &data), off_chain(&caveat, &call));
            prop_assert_eq!(off_chain(&caveat, &call), allowed.contains(&target));
        }

        #[test]
        fn allowed_methods_verdicts_agree(
            allowed in prop::sample::subsequence(selector_pool(), 0..=5),
            selector in prop::sample::select(selector_pool()),
        ) {
            let mut call_data = selector.to_vec();
            call_data.extend_from_slice(&[0u8; 64]);
            let call = ProposedCall::new(delegatee(), USDC, call_data, U256::ZERO);
            let caveat = Caveat::AllowedMethods(allowed.clone());
            let data = encode_allowed_methods_call(selector, &allowed);
            prop_assert_eq!(on_chain(EnforcerKind::AllowedMethods, &data), off_chain(&caveat, &call));
        }

        #[test]
        fn value_limit_verdicts_agree(amount in 0u64..2_000, cap in 0u64..2_000) {
            let (amount, cap) = (U256::from(amount), U256::from(cap));
            let caveat = Caveat::SpendCap(
                SpendCap::new(USDC, cap).with_amount_at(approve_selector(), AmountLocation::Argument(1)),
            );
            let call = ProposedCall::new(delegatee(), USDC, encode_approve(SWAP_ROUTER_02, amount), U256::ZERO);
            let data = encode_value_limit_call(amount, cap);
            prop_assert_eq!(on_chain(EnforcerKind::ValueLimit, &data), off_chain(&caveat, &call));
        }

        #[test]
        fn value_limit_full_width(amount in any::<[u8; 32]>(), cap in any::<[u8; 32]>()) {
            let (amount, cap) = (U256::from_be_bytes(amount), U256::from_be_bytes(cap));
            let data = encode_value_limit_call(amount, cap);
            prop_assert_eq!(on_chain(EnforcerKind::ValueLimit, &data), amount <= cap);
        }
    }
}

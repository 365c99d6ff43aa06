use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use proptest::prelude::*;
use tokend_erc20::abi::IERC20;
use tokend_ethereum::prelude::*;
use tokend_testing::{any_address, MockNode, DEFAULT_ACCOUNT, SECOND_ACCOUNT};

async fn connected_service(node: &MockNode) -> TokenService {
    let config = ServiceConfig::direct_rpc(node.url()).with_timeouts(TimeoutConfig::fast());
    let service = TokenService::new(config).unwrap();
    service.manager().connect().await.unwrap();
    service
}

#[tokio::test]
async fn test_every_listed_token_resolves() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let tokens = service.get_tokens().unwrap();
    assert_eq!(tokens, symbols::ALL);
    for symbol in &tokens {
        let handle = service.get_token(symbol).unwrap();
        assert_eq!(handle.symbol(), symbol);
    }
}

#[tokio::test]
async fn test_token_versions_idempotent() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let first = service.get_token_versions().unwrap();
    let second = service.get_token_versions().unwrap();
    assert_eq!(first, second);
    assert_eq!(first["MKR"], vec![1, 2]);
}

#[tokio::test]
async fn test_native_balance_of_fresh_account() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let eth = service.get_token(symbols::ETH).unwrap();
    let owner = parse_address("0x0000000000000000000000000000000000000003").unwrap();
    assert_eq!(eth.balance_of(owner).await.unwrap(), U256::ZERO);

    let raw = eth.as_native().unwrap().balance_of_raw(owner).await.unwrap();
    assert_eq!(raw, U256::ZERO);
    assert_eq!(node.request_count("eth_call"), 0);
}

#[tokio::test]
async fn test_native_balance_paths_agree() {
    let node = MockNode::start().await;
    let amount = parse_amount("1.25", 18).unwrap();
    node.set_balance(SECOND_ACCOUNT, amount);
    let service = connected_service(&node).await;

    let eth = service.get_token(symbols::ETH).unwrap();
    let native = eth.as_native().unwrap();
    assert_eq!(eth.balance_of(SECOND_ACCOUNT).await.unwrap(), amount);
    assert_eq!(native.balance_of_raw(SECOND_ACCOUNT).await.unwrap(), amount);
}

#[tokio::test]
async fn test_native_approve_not_supported() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let eth = service.get_token(symbols::ETH).unwrap();
    let err = eth.approve(SECOND_ACCOUNT, U256::from(1u64)).await.unwrap_err();
    assert!(matches!(err, TokendError::NotSupported(_)));
    assert!(eth.approve_unlimited(SECOND_ACCOUNT).await.is_err());
    assert!(node.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_native_transfer() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let eth = service.get_token(symbols::ETH).unwrap();
    let amount = parse_amount("0.0000000015", 18).unwrap();
    let receipt = eth.transfer(DEFAULT_ACCOUNT, SECOND_ACCOUNT, amount).await.unwrap();
    assert!(receipt.is_mined());

    let sent = node.sent_transactions();
    let value: U256 = serde_json::from_value(sent[0]["value"].clone()).unwrap();
    let to: Address = serde_json::from_value(sent[0]["to"].clone()).unwrap();
    assert_eq!(value, U256::from(1_500_000_000u64));
    assert_eq!(to, SECOND_ACCOUNT);
}

#[tokio::test]
async fn test_native_transfer_raw() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let eth = service.get_token(symbols::ETH).unwrap();
    let receipt = eth
        .as_native()
        .unwrap()
        .transfer_raw(DEFAULT_ACCOUNT, SECOND_ACCOUNT, U256::from(3u64))
        .await
        .unwrap();
    assert!(receipt.is_mined());
    assert_eq!(node.sent_transactions().len(), 1);
}

#[tokio::test]
async fn test_erc20_handle_through_service() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;

    let dai = service.get_token(symbols::DAI).unwrap();
    let address = dai.as_erc20().unwrap().address();
    node.set_call_uint(address, IERC20::balanceOfCall::SELECTOR, U256::from(99u64));

    assert_eq!(dai.balance_of(DEFAULT_ACCOUNT).await.unwrap(), U256::from(99u64));
    let receipt = dai.approve_unlimited(SECOND_ACCOUNT).await.unwrap();
    assert!(!receipt.hash.is_zero());
}

#[tokio::test]
async fn test_handles_fail_after_disconnect() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;
    let eth = service.get_token(symbols::ETH).unwrap();

    service.manager().disconnect().await;
    assert!(matches!(eth.balance_of(DEFAULT_ACCOUNT).await, Err(TokendError::NotConnected)));
    assert!(matches!(service.get_tokens(), Err(TokendError::NotConnected)));
}

#[tokio::test]
async fn test_concurrent_balance_reads() {
    let node = MockNode::start().await;
    let service = connected_service(&node).await;
    let owners: Vec<Address> = (1u8..=8).map(Address::with_last_byte).collect();
    for (i, owner) in owners.iter().enumerate() {
        node.set_balance(*owner, U256::from(i as u64));
    }

    let eth = service.get_token(symbols::ETH).unwrap();
    let balances = futures::future::join_all(owners.iter().map(|owner| eth.balance_of(*owner))).await;
    for (i, balance) in balances.into_iter().enumerate() {
        assert_eq!(balance.unwrap(), U256::from(i as u64));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_native_allowance_is_sentinel(owner in any_address(), spender in any_address()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let node = MockNode::start().await;
            let service = connected_service(&node).await;
            let eth = service.get_token(symbols::ETH).unwrap();

            let allowance = eth.allowance(owner, spender).await.unwrap();
            assert_eq!(allowance, MAX_SAFE_INTEGER);
            assert_eq!(allowance, U256::from(9_007_199_254_740_991u64));
        });
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::network::TransactionBuilder;
use tokend_error::TokendError;
use tokend_provider::{ConnectionManager, Network, RequestKind, ServiceConfig, TimeoutConfig};
use tokend_testing::{MockNode, DEFAULT_ACCOUNT, SECOND_ACCOUNT};

fn config_for(node: &MockNode) -> ServiceConfig {
    ServiceConfig::direct_rpc(node.url()).with_timeouts(TimeoutConfig::fast())
}

#[tokio::test]
async fn test_connect_reads_chain_and_account() {
    let node = MockNode::start().await;
    let manager = ConnectionManager::new(config_for(&node));
    assert!(!manager.is_connected());

    manager.connect().await.unwrap();
    assert!(manager.is_connected());
    assert_eq!(manager.chain_id().await.unwrap(), 31337);
    assert_eq!(manager.default_account().await.unwrap(), Some(DEFAULT_ACCOUNT));
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let node = MockNode::start().await;
    let manager = ConnectionManager::new(config_for(&node));

    manager.connect().await.unwrap();
    manager.connect().await.unwrap();
    assert_eq!(node.request_count("eth_chainId"), 1);
}

#[tokio::test]
async fn test_concurrent_connect_dials_once() {
    let node = MockNode::start().await;
    let manager = ConnectionManager::new(config_for(&node));

    let (a, b) = futures::join!(manager.connect(), manager.connect());
    a.unwrap();
    b.unwrap();
    assert_eq!(node.request_count("eth_chainId"), 1);
}

#[tokio::test]
async fn test_configured_account_wins() {
    let node = MockNode::start().await;
    let manager = ConnectionManager::new(config_for(&node).with_account(SECOND_ACCOUNT));

    manager.connect().await.unwrap();
    assert_eq!(manager.default_account().await.unwrap(), Some(SECOND_ACCOUNT));
    assert_eq!(node.request_count("eth_accounts"), 0);
}

#[tokio::test]
async fn test_node_without_accounts() {
    let node = MockNode::start().await;
    node.set_accounts(vec![]);
    let manager = ConnectionManager::new(config_for(&node));

    manager.connect().await.unwrap();
    let connection = manager.connection().await.unwrap();
    assert_eq!(connection.default_account(), None);
    assert!(matches!(connection.sender(), Err(TokendError::MissingAccount)));
}

#[tokio::test]
async fn test_chain_id_mismatch() {
    let node = MockNode::with_chain_id(5).await;
    let config = config_for(&node).with_network(Network::Mainnet);
    let manager = ConnectionManager::new(config);

    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, TokendError::ChainIdMismatch { expected: 1, got: 5 }));
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = ServiceConfig::direct_rpc("http://127.0.0.1:1").with_timeouts(TimeoutConfig::fast());
    let manager = ConnectionManager::new(config);

    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, TokendError::Connection { .. }), "{err:?}");
    assert!(matches!(manager.connection().await, Err(TokendError::NotConnected)));
}

#[tokio::test]
async fn test_invalid_endpoint_rejected_before_dialing() {
    let manager = ConnectionManager::new(ServiceConfig::direct_rpc("not a url"));

    let err = manager.connect().await.unwrap_err();
    match err {
        TokendError::Connection { url, reason } => {
            assert_eq!(url, "not a url");
            assert!(reason.contains("invalid URL"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_disconnect() {
    let node = MockNode::start().await;
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    manager.disconnect().await;
    assert!(!manager.is_connected());
    assert!(matches!(manager.chain_id().await, Err(TokendError::NotConnected)));

    // Reconnecting after a disconnect dials again.
    manager.connect().await.unwrap();
    assert_eq!(node.request_count("eth_chainId"), 2);
}

#[tokio::test]
async fn test_get_balance() {
    let node = MockNode::start().await;
    node.set_balance(DEFAULT_ACCOUNT, U256::from(1_000_000u64));
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let connection = manager.connection().await.unwrap();
    assert_eq!(connection.get_balance(DEFAULT_ACCOUNT).await.unwrap(), U256::from(1_000_000u64));
    assert_eq!(connection.get_balance(SECOND_ACCOUNT).await.unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_raw_balance_request() {
    let node = MockNode::start().await;
    node.set_balance(DEFAULT_ACCOUNT, U256::from(42u64));
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let connection = manager.connection().await.unwrap();
    let balance: U256 = connection
        .raw_request("eth_getBalance", (DEFAULT_ACCOUNT, "latest"), RequestKind::Read)
        .await
        .unwrap();
    assert_eq!(balance, U256::from(42u64));
}

#[tokio::test]
async fn test_read_rpc_error() {
    let node = MockNode::start().await;
    node.fail_method("eth_getBalance", -32602, "invalid params");
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let err = manager
        .connection()
        .await
        .unwrap()
        .get_balance(DEFAULT_ACCOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, TokendError::RpcRequest { .. }));
}

#[tokio::test]
async fn test_call_returns_scripted_data() {
    let node = MockNode::start().await;
    let token = Address::with_last_byte(0x44);
    node.set_call_uint(token, [0x31, 0x3c, 0xe5, 0x67], U256::from(18u64));
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let data = manager
        .connection()
        .await
        .unwrap()
        .call(token, Bytes::from(vec![0x31, 0x3c, 0xe5, 0x67]))
        .await
        .unwrap();
    assert_eq!(U256::from_be_slice(&data), U256::from(18u64));
    assert_eq!(node.calls().len(), 1);
}

#[tokio::test]
async fn test_request_timeout() {
    let node = MockNode::start().await;
    let timeouts = TimeoutConfig::fast().with_request(Duration::from_millis(100));
    let manager = ConnectionManager::new(ServiceConfig::direct_rpc(node.url()).with_timeouts(timeouts));
    manager.connect().await.unwrap();

    node.set_delay(Duration::from_millis(500));
    let err = manager
        .connection()
        .await
        .unwrap()
        .get_balance(DEFAULT_ACCOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, TokendError::Timeout { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_send_transaction_waits_for_receipt() {
    let node = MockNode::start().await;
    node.set_block_number(7);
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let connection = manager.connection().await.unwrap();
    let tx = TransactionRequest::default()
        .with_from(DEFAULT_ACCOUNT)
        .with_to(SECOND_ACCOUNT)
        .with_value(U256::from(5u64));
    let receipt = connection.send_transaction(tx).await.unwrap();

    assert_eq!(receipt.block_number, Some(7));
    assert!(receipt.gas_used.is_some());
    assert_eq!(node.sent_transactions().len(), 1);
}

#[tokio::test]
async fn test_send_without_confirmations_returns_hash() {
    let node = MockNode::start().await;
    node.set_mining(false);
    let manager = ConnectionManager::new(config_for(&node).with_confirmations(0));
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let receipt = manager.connection().await.unwrap().send_transaction(tx).await.unwrap();
    assert!(!receipt.is_mined());
    assert_eq!(node.request_count("eth_getTransactionReceipt"), 0);
}

#[tokio::test]
async fn test_failed_receipt_is_revert() {
    let node = MockNode::start().await;
    node.set_receipt_status(false);
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let err = manager.connection().await.unwrap().send_transaction(tx).await.unwrap_err();
    assert!(matches!(err, TokendError::TransactionReverted(_)));
}

#[tokio::test]
async fn test_rejected_send_is_revert() {
    let node = MockNode::start().await;
    node.fail_method("eth_sendTransaction", -32000, "insufficient funds for transfer");
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let err = manager.connection().await.unwrap().send_transaction(tx).await.unwrap_err();
    match err {
        TokendError::TransactionReverted(reason) => assert!(reason.contains("insufficient funds")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_receipt_wait_times_out() {
    let node = MockNode::start().await;
    node.set_mining(false);
    let timeouts = TimeoutConfig::fast()
        .with_receipt(Duration::from_millis(300))
        .with_poll_interval(Duration::from_millis(20));
    let manager = ConnectionManager::new(ServiceConfig::direct_rpc(node.url()).with_timeouts(timeouts));
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let err = manager.connection().await.unwrap().send_transaction(tx).await.unwrap_err();
    assert!(node.request_count("eth_getTransactionReceipt") > 1);
    assert_eq!(node.sent_transactions().len(), 1);

    // The node accepted the transaction, so the caller gets its hash back.
    assert!(!err.is_retryable());
    let hash: B256 = err.pending_transaction().unwrap().parse().unwrap();
    assert!(!hash.is_zero());
    match err {
        TokendError::TransactionPending { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_failing_receipt_poll_reports_pending_hash() {
    let node = MockNode::start().await;
    node.fail_method("eth_getTransactionReceipt", -32603, "internal error");
    let manager = ConnectionManager::new(config_for(&node));
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let err = manager.connection().await.unwrap().send_transaction(tx).await.unwrap_err();
    assert!(matches!(err, TokendError::TransactionPending { .. }), "{err:?}");
    assert!(err.pending_transaction().is_some());
    assert_eq!(node.sent_transactions().len(), 1);
}

#[tokio::test]
async fn test_send_waits_for_confirmation_depth() {
    let node = Arc::new(MockNode::start().await);
    node.set_block_number(7);
    let manager = ConnectionManager::new(config_for(&node).with_confirmations(3));
    manager.connect().await.unwrap();

    // Mined in block 7; three confirmations need the head at block 9.
    let advance = tokio::spawn({
        let node = Arc::clone(&node);
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            node.set_block_number(8);
            tokio::time::sleep(Duration::from_millis(100)).await;
            node.set_block_number(9);
        }
    });

    let started = Instant::now();
    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let receipt = manager.connection().await.unwrap().send_transaction(tx).await.unwrap();
    advance.await.unwrap();

    assert_eq!(receipt.block_number, Some(7));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(node.request_count("eth_blockNumber") > 2);
}

#[tokio::test]
async fn test_confirmation_depth_never_reached() {
    let node = MockNode::start().await;
    node.set_block_number(7);
    let timeouts = TimeoutConfig::fast()
        .with_receipt(Duration::from_millis(300))
        .with_poll_interval(Duration::from_millis(20));
    let config = ServiceConfig::direct_rpc(node.url())
        .with_timeouts(timeouts)
        .with_confirmations(3);
    let manager = ConnectionManager::new(config);
    manager.connect().await.unwrap();

    let tx = TransactionRequest::default().with_from(DEFAULT_ACCOUNT).with_to(SECOND_ACCOUNT);
    let err = manager.connection().await.unwrap().send_transaction(tx).await.unwrap_err();
    assert!(matches!(err, TokendError::TransactionPending { .. }), "{err:?}");
    assert_eq!(node.request_count("eth_getTransactionReceipt"), 1);
    assert!(node.request_count("eth_blockNumber") > 1);
}

#[tokio::test]
#[ignore] // Requires anvil on PATH
async fn test_local_test_chain_spawns_node() {
    let manager = ConnectionManager::new(ServiceConfig::local_test_chain());
    manager.connect().await.unwrap();

    assert_eq!(manager.chain_id().await.unwrap(), 31337);
    assert_eq!(manager.default_account().await.unwrap(), Some(DEFAULT_ACCOUNT));
    manager.disconnect().await;
}

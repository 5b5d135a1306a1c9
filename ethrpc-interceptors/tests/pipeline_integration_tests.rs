//! Integration tests for the built-in interceptors running inside built chains

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{plain_block, poa_block, MockTransport, Reply};
use ethrpc_core::{
    ChainBuilder, HttpTransport, Interceptor, InterceptorDescriptor, JsonRpcResponse, Layer,
    NetworkConfig, Next, PipelineError, PipelineResult, Transport,
};
use ethrpc_interceptors::{
    default_registry, ArchiveStateTranslator, ExtraDataShim, ARCHIVE_STATE_LAYER,
    ARCHIVE_STATE_MESSAGE, EXTRA_DATA_LAYER,
};
use serde_json::{json, Value};

fn fork_config() -> NetworkConfig {
    NetworkConfig::new()
        .with("id", "mainnet-fork")
        .with("fork", "https://mainnet.example/rpc")
}

#[tokio::test]
async fn test_archive_state_error_is_translated_on_forks() {
    let transport = Arc::new(MockTransport::new(Reply::NodeError(
        "Returned error: missing trie node abc".to_string(),
    )));

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport.clone(), &fork_config())
        .await
        .unwrap();

    assert_eq!(chain.interceptor_names(), vec!["ArchiveStateTranslator"]);

    let result = chain
        .send("eth_getBalance", vec![json!("0x0000000000000000000000000000000000000000"), json!("0x10")])
        .await;

    assert_matches!(
        result,
        Err(PipelineError::ArchiveStateUnavailable { ref message }) if message == ARCHIVE_STATE_MESSAGE
    );
    assert_eq!(transport.call_count("eth_getBalance"), 1);
}

#[tokio::test]
async fn test_archive_state_errors_pass_through_without_fork() {
    let transport = Arc::new(MockTransport::new(Reply::NodeError(
        "missing trie node 0badc0de".to_string(),
    )));

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &NetworkConfig::new())
        .await
        .unwrap();

    assert!(chain.is_empty());

    let response = chain.send("eth_getBalance", vec![]).await.unwrap();
    assert_eq!(response.error_message(), Some("missing trie node 0badc0de"));
}

#[tokio::test]
async fn test_unrelated_node_errors_pass_through_on_forks() {
    let transport = Arc::new(
        MockTransport::healthy().on("eth_call", Reply::NodeError("execution reverted".to_string())),
    );

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &fork_config())
        .await
        .unwrap();

    let result = chain.request::<Value>("eth_call", vec![json!({}), json!("latest")]).await;
    assert_matches!(
        result,
        Err(PipelineError::Rpc { code: -32000, ref message }) if message == "execution reverted"
    );
}

#[tokio::test]
async fn test_shim_joins_when_probe_fails_validation() {
    let transport = Arc::new(MockTransport::poa());

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport.clone(), &NetworkConfig::new())
        .await
        .unwrap();

    assert_eq!(chain.interceptor_names(), vec!["ExtraDataShim"]);
    assert_eq!(chain.layers(), vec![EXTRA_DATA_LAYER]);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "eth_getBlockByNumber");
    assert_eq!(calls[0].1, vec![json!("latest"), json!(false)]);
}

#[tokio::test]
async fn test_shim_joins_when_node_reports_extra_data_length() {
    let transport = Arc::new(MockTransport::new(Reply::Result(json!("0x1"))).on(
        "eth_getBlockByNumber",
        Reply::NodeError("invalid extra data length: 97 bytes".to_string()),
    ));

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &NetworkConfig::new())
        .await
        .unwrap();

    assert!(chain.contains("ExtraDataShim"));
}

#[tokio::test]
async fn test_shim_absent_when_probe_succeeds() {
    let transport = Arc::new(MockTransport::healthy());

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &NetworkConfig::new())
        .await
        .unwrap();

    assert!(!chain.contains("ExtraDataShim"));
    assert!(chain.is_empty());
}

#[tokio::test]
async fn test_shim_relaxes_block_responses() {
    let transport = Arc::new(MockTransport::poa().on("eth_getBlockByHash", Reply::Result(poa_block())));

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &NetworkConfig::new())
        .await
        .unwrap();

    let block: Value = chain
        .request("eth_getBlockByHash", vec![json!("0x8b2a"), json!(false)])
        .await
        .unwrap();

    assert!(block.get("extraData").is_none());
    assert_eq!(block["proofOfAuthorityData"], poa_block()["extraData"]);

    // Non-block results are left alone.
    let balance: String = chain.request("eth_getBalance", vec![]).await.unwrap();
    assert_eq!(balance, "0x1");

    let stats = chain.interceptor_stats().await;
    assert_eq!(stats[0].0, "ExtraDataShim");
    assert_eq!(stats[0].1.total_invoked, 2);
    assert_eq!(stats[0].1.total_rewritten, 1);
}

#[tokio::test]
async fn test_both_builtins_on_poa_fork() {
    let transport = Arc::new(MockTransport::poa());

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &fork_config())
        .await
        .unwrap();

    assert_eq!(
        chain.interceptor_names(),
        vec!["ArchiveStateTranslator", "ExtraDataShim"]
    );
    assert_eq!(chain.layers(), vec![ARCHIVE_STATE_LAYER, EXTRA_DATA_LAYER]);

    let block: Value = chain
        .request("eth_getBlockByNumber", vec![json!("latest"), json!(false)])
        .await
        .unwrap();
    assert!(block.get("proofOfAuthorityData").is_some());
}

#[tokio::test]
async fn test_probe_transport_failure_fails_build() {
    let transport = Arc::new(MockTransport::new(Reply::Fail("connection refused".to_string())));

    let registry = default_registry();
    let result = ChainBuilder::new(&registry)
        .build(transport, &fork_config())
        .await;

    assert_matches!(
        result,
        Err(PipelineError::Build { ref interceptor, .. }) if interceptor == "ExtraDataShim"
    );
}

#[tokio::test]
async fn test_transport_failures_pass_through_untranslated() {
    let transport = Arc::new(
        MockTransport::healthy().on("eth_chainId", Reply::Fail("socket closed".to_string())),
    );

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &fork_config())
        .await
        .unwrap();

    let result = chain.send("eth_chainId", vec![]).await;
    assert_matches!(result, Err(PipelineError::Transport(_)));

    let stats = chain.stats().await;
    assert_eq!(stats.total_sends, 1);
    assert_eq!(stats.total_failures, 1);
}

#[tokio::test]
async fn test_building_twice_yields_identical_ordering() {
    let transport = Arc::new(MockTransport::poa());
    let registry = default_registry();
    let builder = ChainBuilder::new(&registry);

    let first = builder.build(transport.clone(), &fork_config()).await.unwrap();
    let second = builder.build(transport, &fork_config()).await.unwrap();

    assert_eq!(first.interceptor_names(), second.interceptor_names());
    assert_eq!(first.layers(), second.layers());
}

struct Blackhole;

#[async_trait]
impl Interceptor for Blackhole {
    fn name(&self) -> &str {
        "Blackhole"
    }

    async fn invoke(
        &self,
        _method: &str,
        _params: Vec<Value>,
        _next: Next<'_>,
    ) -> PipelineResult<JsonRpcResponse> {
        Ok(JsonRpcResponse::success(0, Value::Null))
    }
}

struct BlackholeDescriptor;

#[async_trait]
impl InterceptorDescriptor for BlackholeDescriptor {
    fn name(&self) -> &str {
        "Blackhole"
    }

    async fn applicable_layer(
        &self,
        _transport: &Arc<dyn Transport>,
        _config: &NetworkConfig,
    ) -> PipelineResult<Option<Layer>> {
        Ok(Some(Layer(95)))
    }

    fn instantiate(&self, _transport: Arc<dyn Transport>) -> Box<dyn Interceptor> {
        Box::new(Blackhole)
    }
}

#[tokio::test]
async fn test_interceptor_that_never_forwards_is_invariant_violation() {
    let transport = Arc::new(MockTransport::healthy());
    let registry = default_registry().with(BlackholeDescriptor);

    let chain = ChainBuilder::new(&registry)
        .build(transport.clone(), &fork_config())
        .await
        .unwrap();
    assert_eq!(
        chain.interceptor_names(),
        vec!["ArchiveStateTranslator", "Blackhole"]
    );

    let result = chain.send("eth_blockNumber", vec![]).await;
    assert_matches!(
        result,
        Err(PipelineError::ChainInvariantViolation { ref interceptor, .. }) if interceptor == "Blackhole"
    );
    assert_eq!(transport.call_count("eth_blockNumber"), 0);
}

#[tokio::test]
async fn test_registering_builtins_twice_keeps_one_each() {
    let registry = default_registry()
        .with(ArchiveStateTranslator)
        .with(ExtraDataShim);
    assert_eq!(registry.len(), 2);

    let transport = Arc::new(MockTransport::poa());
    let chain = ChainBuilder::new(&registry)
        .build(transport.clone(), &fork_config())
        .await
        .unwrap();

    assert_eq!(chain.len(), 2);
    assert_eq!(transport.call_count("eth_getBlockByNumber"), 1);
}

#[tokio::test]
async fn test_http_transport_end_to_end() {
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getBlockByNumber"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": plain_block()
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getStorageAt"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32000, "message": "project ID does not have access to archive state"}
        })))
        .mount(&server)
        .await;

    let transport = Arc::new(HttpTransport::new(server.uri()).unwrap());
    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &fork_config())
        .await
        .unwrap();

    assert_eq!(chain.interceptor_names(), vec!["ArchiveStateTranslator"]);

    let result = chain
        .send("eth_getStorageAt", vec![json!("0x00"), json!("0x0"), json!("0x1")])
        .await;
    assert_matches!(result, Err(PipelineError::ArchiveStateUnavailable { .. }));

    let info = chain.transport_info();
    assert_eq!(info.requests_sent, 2);
}

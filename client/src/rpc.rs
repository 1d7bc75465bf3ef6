/// NEAR JSON-RPC provider
///
/// This module provides HTTP-based JSON-RPC communication with NEAR archival and
/// regular nodes, implementing the queries and transaction submission needed by
/// account and contract handles.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ClientError, ClientResult};
use crate::keys::PublicKey;
use crate::transaction::SignedTransaction;
use crate::types::{AccountId, CryptoHash};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Access key as reported by `view_access_key`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AccessKeyView {
    pub nonce: u64,
    pub permission: Value,
}

/// Account state as reported by `view_account`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AccountView {
    pub amount: String,
    #[serde(default)]
    pub locked: String,
    pub code_hash: String,
    #[serde(default)]
    pub storage_usage: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub enum ExecutionStatus {
    SuccessValue(String),
    SuccessReceiptId(String),
    Failure(Value),
    Unknown,
    NotStarted,
    Started,
}

/// Final outcome of a committed transaction.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub transaction_outcome: Value,
}

impl ExecutionOutcome {
    /// Bytes returned by the called method, or the failure as an error.
    pub fn into_return_value(self) -> ClientResult<Vec<u8>> {
        match self.status {
            ExecutionStatus::SuccessValue(encoded) => BASE64.decode(encoded).map_err(|e| {
                ClientError::InvalidResponse(format!("Invalid SuccessValue encoding: {}", e))
            }),
            ExecutionStatus::SuccessReceiptId(_) => Ok(Vec::new()),
            ExecutionStatus::Failure(failure) => {
                Err(ClientError::ExecutionFailure(failure.to_string()))
            }
            other => Err(ClientError::ExecutionFailure(format!(
                "Transaction did not complete: {:?}",
                other
            ))),
        }
    }
}

/// Chain access used by accounts and contract handles.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    async fn view_account(&self, account_id: &AccountId) -> ClientResult<AccountView>;

    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> ClientResult<AccessKeyView>;

    /// Run a view method and return its raw result bytes.
    async fn call_function(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
    ) -> ClientResult<Vec<u8>>;

    async fn latest_block_hash(&self) -> ClientResult<CryptoHash>;

    async fn broadcast_tx_commit(
        &self,
        transaction: &SignedTransaction,
    ) -> ClientResult<ExecutionOutcome>;
}

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: String,
    method: String,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
#[allow(dead_code)] // fields are populated via serde; not all are read by all call sites
struct JsonRpcResponse<T> {
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC error structure
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallFunctionResult {
    result: Vec<u8>,
}

/// HTTP client for NEAR RPC communication
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    base_url: String,
}

impl RpcClient {
    /// Create a new RPC client for a node URL
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ClientError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(RpcClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query<T: DeserializeOwned>(&self, params: Value) -> ClientResult<T> {
        let result: Value = self.rpc_call("query", params).await?;
        // Some node versions report query failures inside the result body.
        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(ClientError::ExecutionFailure(error.to_string()));
        }
        Ok(serde_json::from_value(result)?)
    }

    /// Make a JSON-RPC call to the node
    async fn rpc_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> ClientResult<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        log::debug!("RPC {} -> {}", method, self.base_url);
        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::ConnectionTimeout(format!("calling {}", method))
                } else {
                    ClientError::NetworkError(format!("HTTP request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(ClientError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let rpc_response: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            let detail = error
                .data
                .map(|data| format!(" ({})", data))
                .unwrap_or_default();
            return Err(ClientError::NetworkError(format!(
                "RPC error {}: {}{}",
                error.code, error.message, detail
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("No result in RPC response".to_string()))
    }
}

#[async_trait]
impl Provider for RpcClient {
    async fn view_account(&self, account_id: &AccountId) -> ClientResult<AccountView> {
        let params = serde_json::json!({
            "request_type": "view_account",
            "finality": "final",
            "account_id": account_id,
        });
        self.query(params).await
    }

    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> ClientResult<AccessKeyView> {
        let params = serde_json::json!({
            "request_type": "view_access_key",
            "finality": "final",
            "account_id": account_id,
            "public_key": public_key,
        });
        self.query(params).await
    }

    async fn call_function(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
    ) -> ClientResult<Vec<u8>> {
        let params = serde_json::json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": contract_id,
            "method_name": method,
            "args_base64": BASE64.encode(args),
        });
        let response: CallFunctionResult = self.query(params).await?;
        Ok(response.result)
    }

    async fn latest_block_hash(&self) -> ClientResult<CryptoHash> {
        let block: Value = self
            .rpc_call("block", serde_json::json!({ "finality": "final" }))
            .await?;
        let hash = block
            .pointer("/header/hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::InvalidResponse("Block response has no hash".to_string()))?;
        hash.parse()
    }

    async fn broadcast_tx_commit(
        &self,
        transaction: &SignedTransaction,
    ) -> ClientResult<ExecutionOutcome> {
        let params = serde_json::json!([transaction.to_base64()?]);
        self.rpc_call("broadcast_tx_commit", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_value_is_decoded() {
        let outcome: ExecutionOutcome = serde_json::from_value(serde_json::json!({
            "status": { "SuccessValue": BASE64.encode(b"true") },
            "transaction_outcome": {}
        }))
        .unwrap();
        assert_eq!(outcome.into_return_value().unwrap(), b"true".to_vec());
    }

    #[test]
    fn failure_status_becomes_execution_failure() {
        let outcome: ExecutionOutcome = serde_json::from_value(serde_json::json!({
            "status": { "Failure": { "ActionError": { "index": 0 } } }
        }))
        .unwrap();
        assert!(matches!(
            outcome.into_return_value(),
            Err(ClientError::ExecutionFailure(_))
        ));
    }

    #[test]
    fn pending_status_is_not_success() {
        let outcome: ExecutionOutcome =
            serde_json::from_value(serde_json::json!({ "status": "Started" })).unwrap();
        assert!(outcome.into_return_value().is_err());
    }

    #[test]
    fn base_url_is_normalized() {
        let client = RpcClient::new("https://rpc.testnet.near.org/").unwrap();
        assert_eq!(client.base_url(), "https://rpc.testnet.near.org");
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires network access to rpc.testnet.near.org"]
    async fn test_real_block_hash() {
        let client = RpcClient::new("https://rpc.testnet.near.org").unwrap();
        let result = client.latest_block_hash().await;
        assert!(result.is_ok(), "Block query should succeed");
    }

    #[tokio::test]
    #[ignore = "requires network access to rpc.testnet.near.org"]
    async fn test_real_view_account() {
        let client = RpcClient::new("https://rpc.testnet.near.org").unwrap();
        let account = AccountId::new("testnet").unwrap();
        let result = client.view_account(&account).await;
        assert!(result.is_ok(), "view_account should succeed");
    }
}

//! Shared fixtures for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::Mutex;
use serde_json::Value;

use crate::connection::Connection;
use crate::errors::{ClientError, ClientResult};
use crate::generation::GenerationToken;
use crate::keys::PublicKey;
use crate::network;
use crate::rpc::{AccessKeyView, AccountView, ExecutionOutcome, ExecutionStatus, Provider};
use crate::signer::Signer;
use crate::transaction::SignedTransaction;
use crate::types::{AccountId, CryptoHash};

pub(crate) const MOCK_NONCE: u64 = 41;
pub(crate) const MOCK_BLOCK_HASH: [u8; 32] = [7u8; 32];

/// Provider answering from canned view results and recording every request.
#[derive(Debug, Default)]
pub(crate) struct MockProvider {
    views: Mutex<HashMap<(String, String), Vec<u8>>>,
    accounts: Mutex<HashSet<String>>,
    view_calls: Mutex<Vec<(String, String, Value)>>,
    broadcasts: Mutex<Vec<SignedTransaction>>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_view(self, contract: &str, method: &str, result: Value) -> Self {
        self.views.lock().insert(
            (contract.to_string(), method.to_string()),
            result.to_string().into_bytes(),
        );
        self
    }

    pub(crate) fn with_account(self, account: &str) -> Self {
        self.accounts.lock().insert(account.to_string());
        self
    }

    pub(crate) fn view_calls(&self) -> Vec<(String, String, Value)> {
        self.view_calls.lock().clone()
    }

    pub(crate) fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn view_account(&self, account_id: &AccountId) -> ClientResult<AccountView> {
        if self.accounts.lock().contains(account_id.as_str()) {
            Ok(AccountView {
                amount: "1000".into(),
                locked: "0".into(),
                code_hash: "11111111111111111111111111111111".into(),
                storage_usage: 100,
            })
        } else {
            Err(ClientError::ExecutionFailure(format!(
                "account {} does not exist while viewing",
                account_id
            )))
        }
    }

    async fn view_access_key(
        &self,
        _account_id: &AccountId,
        _public_key: &PublicKey,
    ) -> ClientResult<AccessKeyView> {
        Ok(AccessKeyView {
            nonce: MOCK_NONCE,
            permission: Value::String("FullAccess".into()),
        })
    }

    async fn call_function(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
    ) -> ClientResult<Vec<u8>> {
        let args = serde_json::from_slice(args).unwrap_or(Value::Null);
        self.view_calls
            .lock()
            .push((contract_id.to_string(), method.to_string(), args));
        self.views
            .lock()
            .get(&(contract_id.to_string(), method.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::ExecutionFailure(format!("MethodNotFound: {}", method)))
    }

    async fn latest_block_hash(&self) -> ClientResult<CryptoHash> {
        Ok(CryptoHash(MOCK_BLOCK_HASH))
    }

    async fn broadcast_tx_commit(
        &self,
        transaction: &SignedTransaction,
    ) -> ClientResult<ExecutionOutcome> {
        self.broadcasts.lock().push(transaction.clone());
        Ok(ExecutionOutcome {
            status: ExecutionStatus::SuccessValue(BASE64.encode(b"\"done\"")),
            transaction_outcome: Value::Null,
        })
    }
}

/// Testnet connection over `provider` with a generation that never advances.
pub(crate) fn connection(provider: Arc<MockProvider>, signer: Arc<dyn Signer>) -> Connection {
    connection_in(provider, signer, GenerationToken::detached())
}

pub(crate) fn connection_in(
    provider: Arc<MockProvider>,
    signer: Arc<dyn Signer>,
    generation: GenerationToken,
) -> Connection {
    let network = network::resolve("testnet").expect("testnet resolves");
    Connection::new(network, provider, signer, generation)
}

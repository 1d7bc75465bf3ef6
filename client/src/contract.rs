//! Typed contract handles.
//!
//! A [`ContractHandle`] binds a contract account to an [`Account`] and the
//! method manifest for its [`ContractKind`]. Construction makes no network
//! request; each method is checked against the manifest and the session
//! generation at invocation time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::account::Account;
use crate::errors::{ClientError, ClientResult};
use crate::manifest::{ContractKind, MethodKind, MethodManifest};
use crate::signer::SignerAuthority;
use crate::types::{AccountId, DEFAULT_FUNCTION_CALL_GAS};

/// Gas and attached deposit for a change call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub gas: u64,
    /// Attached deposit in yoctoNEAR.
    pub deposit: u128,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            gas: DEFAULT_FUNCTION_CALL_GAS,
            deposit: 0,
        }
    }
}

#[derive(Debug)]
struct HandleInner {
    kind: ContractKind,
    contract_id: AccountId,
    account: Account,
    manifest: MethodManifest,
}

/// Immutable callable proxy for one contract. Clones share the same binding.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    inner: Arc<HandleInner>,
}

impl ContractHandle {
    pub fn create(
        account: Account,
        contract_name: &str,
        kind: ContractKind,
        manifest: MethodManifest,
    ) -> ClientResult<Self> {
        let contract_id = AccountId::new(contract_name).map_err(|err| {
            ClientError::ContractBindFailure(format!(
                "{} contract '{}': {}",
                kind, contract_name, err
            ))
        })?;
        manifest.validate().map_err(|err| {
            ClientError::ContractBindFailure(format!(
                "{} contract '{}': {}",
                kind, contract_name, err
            ))
        })?;

        if account.authority() != kind.authority() {
            log::warn!(
                "Binding {} contract {} with a {:?} signer",
                kind,
                contract_id,
                account.authority()
            );
        }

        Ok(Self {
            inner: Arc::new(HandleInner {
                kind,
                contract_id,
                account,
                manifest,
            }),
        })
    }

    pub fn kind(&self) -> ContractKind {
        self.inner.kind
    }

    pub fn contract_id(&self) -> &AccountId {
        &self.inner.contract_id
    }

    /// Account the handle signs as; `None` before wallet sign-in.
    pub fn bound_account_id(&self) -> Option<&AccountId> {
        self.inner.account.account_id()
    }

    pub fn authority(&self) -> SignerAuthority {
        self.inner.account.authority()
    }

    pub fn view_methods(&self) -> &BTreeSet<String> {
        self.inner.manifest.view_methods()
    }

    pub fn change_methods(&self) -> &BTreeSet<String> {
        self.inner.manifest.change_methods()
    }

    /// Generation check without a network round trip.
    pub fn is_valid(&self) -> bool {
        self.inner.account.connection().generation().is_current()
    }

    /// Run a view method and decode its JSON result.
    pub async fn view<A, T>(&self, method: &str, args: &A) -> ClientResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.check_method(method, MethodKind::View)?;
        let args = serde_json::to_vec(args)?;
        let raw = self
            .inner
            .account
            .view_function(&self.inner.contract_id, method, &args)
            .await?;
        decode_result(method, &raw)
    }

    /// Sign and submit a change method, decoding its JSON return value.
    ///
    /// Methods that return nothing decode as `()` or `serde_json::Value::Null`.
    pub async fn call<A, T>(&self, method: &str, args: &A, options: CallOptions) -> ClientResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.check_method(method, MethodKind::Change)?;
        let args = serde_json::to_vec(args)?;
        let raw = self
            .inner
            .account
            .function_call(
                &self.inner.contract_id,
                method,
                args,
                options.gas,
                options.deposit,
            )
            .await?;
        if raw.is_empty() {
            return decode_result(method, b"null");
        }
        decode_result(method, &raw)
    }

    fn check_method(&self, method: &str, expected: MethodKind) -> ClientResult<()> {
        self.inner.account.connection().generation().ensure_current()?;
        match self.inner.manifest.kind_of(method) {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(ClientError::MethodKindMismatch(format!(
                "{}.{} is a {:?} method, not {:?}",
                self.inner.contract_id, method, kind, expected
            ))),
            None => Err(ClientError::UnknownMethod(format!(
                "{} has no method '{}'",
                self.inner.kind, method
            ))),
        }
    }
}

fn decode_result<T: DeserializeOwned>(method: &str, raw: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(raw).map_err(|e| {
        ClientError::InvalidResponse(format!("Could not decode result of {}: {}", method, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::SessionGeneration;
    use crate::keys::KeyPair;
    use crate::signer::WalletSigner;
    use crate::storage::{InMemoryKeyStore, KeyStore};
    use crate::testing::{self, MockProvider, MOCK_BLOCK_HASH, MOCK_NONCE};
    use crate::types::CryptoHash;
    use serde_json::{json, Value};

    fn signed_in(provider: Arc<MockProvider>) -> (Account, KeyPair) {
        let store = Arc::new(InMemoryKeyStore::new());
        let key = KeyPair::generate();
        store.set_key("testnet", "alice.testnet", key.clone()).unwrap();
        let connection = testing::connection(provider, Arc::new(WalletSigner::new(store)));
        (Account::new(connection, "alice.testnet").unwrap(), key)
    }

    fn unsigned(provider: Arc<MockProvider>) -> Account {
        let store = Arc::new(InMemoryKeyStore::new());
        let connection = testing::connection(provider, Arc::new(WalletSigner::new(store)));
        Account::unsigned(connection)
    }

    fn token(account: Account) -> ContractHandle {
        ContractHandle::create(
            account,
            "token.aerx.testnet",
            ContractKind::Token,
            ContractKind::Token.manifest(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn view_sends_json_args_and_decodes() {
        let provider = Arc::new(
            MockProvider::new().with_view("token.aerx.testnet", "ft_balance_of", json!("1500")),
        );
        let handle = token(unsigned(Arc::clone(&provider)));

        let balance: String = handle
            .view("ft_balance_of", &json!({ "account_id": "alice.testnet" }))
            .await
            .unwrap();
        assert_eq!(balance, "1500");
        assert_eq!(
            provider.view_calls(),
            vec![(
                "token.aerx.testnet".to_string(),
                "ft_balance_of".to_string(),
                json!({ "account_id": "alice.testnet" })
            )]
        );
        assert!(provider.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn call_builds_signed_transaction() {
        let provider = Arc::new(MockProvider::new());
        let (account, key) = signed_in(Arc::clone(&provider));
        let handle = token(account);

        let result: String = handle
            .call(
                "ft_transfer",
                &json!({ "receiver_id": "bob.testnet", "amount": "1" }),
                CallOptions {
                    deposit: 1,
                    ..CallOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(result, "done");

        let broadcasts = provider.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        let tx = &broadcasts[0].transaction;
        assert_eq!(tx.signer_id.as_str(), "alice.testnet");
        assert_eq!(tx.receiver_id.as_str(), "token.aerx.testnet");
        assert_eq!(tx.nonce, MOCK_NONCE + 1);
        assert_eq!(tx.block_hash, CryptoHash(MOCK_BLOCK_HASH));
        assert_eq!(tx.public_key, key.public_key());
        let action = tx.actions[0].as_function_call().unwrap();
        assert_eq!(action.method_name, "ft_transfer");
        assert_eq!(action.gas, DEFAULT_FUNCTION_CALL_GAS);
        assert_eq!(action.deposit, 1);
        key.public_key()
            .verify(tx.hash().unwrap().as_bytes(), &broadcasts[0].signature)
            .unwrap();
    }

    #[tokio::test]
    async fn call_without_account_fails_at_invocation() {
        let provider = Arc::new(MockProvider::new());
        let handle = token(unsigned(Arc::clone(&provider)));
        assert_eq!(handle.bound_account_id(), None);

        let result: ClientResult<Value> = handle
            .call("claim_gift", &json!({}), CallOptions::default())
            .await;
        assert!(matches!(result, Err(ClientError::NoSigningAuthority(_))));
        assert!(provider.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn manifest_is_enforced() {
        let provider = Arc::new(MockProvider::new());
        let (account, _) = signed_in(provider);
        let handle = token(account);

        let as_change: ClientResult<Value> = handle
            .call("ft_balance_of", &json!({}), CallOptions::default())
            .await;
        assert!(matches!(as_change, Err(ClientError::MethodKindMismatch(_))));

        let as_view: ClientResult<Value> = handle.view("ft_transfer", &json!({})).await;
        assert!(matches!(as_view, Err(ClientError::MethodKindMismatch(_))));

        let unknown: ClientResult<Value> = handle.view("all_pools", &json!({})).await;
        assert!(matches!(unknown, Err(ClientError::UnknownMethod(_))));
    }

    #[tokio::test]
    async fn handles_from_old_generation_are_rejected() {
        let provider = Arc::new(
            MockProvider::new().with_view("token.aerx.testnet", "ft_total_supply", json!("9")),
        );
        let generation = SessionGeneration::new();
        let store = Arc::new(InMemoryKeyStore::new());
        let connection = testing::connection_in(
            provider,
            Arc::new(WalletSigner::new(store)),
            generation.token(),
        );
        let handle = token(Account::unsigned(connection));

        let supply: String = handle.view("ft_total_supply", &json!({})).await.unwrap();
        assert_eq!(supply, "9");

        generation.advance();
        assert!(!handle.is_valid());
        let stale: ClientResult<String> = handle.view("ft_total_supply", &json!({})).await;
        assert_eq!(stale, Err(ClientError::HandleInvalidated));
    }

    #[test]
    fn invalid_contract_name_is_bind_failure() {
        let account = unsigned(Arc::new(MockProvider::new()));
        let result = ContractHandle::create(
            account,
            "Not A Contract",
            ContractKind::Exchange,
            ContractKind::Exchange.manifest(),
        );
        assert!(matches!(result, Err(ClientError::ContractBindFailure(_))));
    }

    #[test]
    fn overlapping_manifest_is_bind_failure() {
        let account = unsigned(Arc::new(MockProvider::new()));
        let result = ContractHandle::create(
            account,
            "aerx-dex.testnet",
            ContractKind::Exchange,
            MethodManifest::new(["all_pools"], ["all_pools", "lend"]),
        );
        assert!(matches!(result, Err(ClientError::ContractBindFailure(_))));
    }
}

//! Wallet session.
//!
//! Holds the signed-in account's auth data and implements the browser-wallet
//! sign-in handshake: a fresh function-call key is generated locally, the user
//! approves it in the wallet, and the wallet redirects back with the account id.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::account::Account;
use crate::connection::Connection;
use crate::errors::{ClientError, ClientResult};
use crate::keys::{KeyPair, PublicKey};
use crate::storage::{KeyStore, LocalStorage};
use crate::types::AccountId;

const AUTH_KEY_SUFFIX: &str = "_wallet_auth_key";
const PENDING_ACCESS_KEY_PREFIX: &str = "pending_key";
const LOGIN_WALLET_PATH: &str = "/login/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct AuthData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(default)]
    all_keys: Vec<String>,
}

/// Parameters for the wallet authorization redirect.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    /// Contract the delegated function-call key is restricted to.
    pub contract_id: String,
    /// Restrict the key to these methods; empty allows every change method.
    pub method_names: Vec<String>,
    pub success_url: Url,
    /// Defaults to `success_url`.
    pub failure_url: Option<Url>,
}

#[derive(Debug)]
pub struct WalletConnection {
    auth_data_key: String,
    connection: Connection,
    key_store: Arc<dyn KeyStore>,
    storage: Arc<LocalStorage>,
    auth: RwLock<AuthData>,
}

impl WalletConnection {
    /// Bind a wallet session to `app_name`, restoring any persisted auth data.
    pub fn new(
        connection: Connection,
        key_store: Arc<dyn KeyStore>,
        storage: Arc<LocalStorage>,
        app_name: &str,
    ) -> ClientResult<Self> {
        if app_name.trim().is_empty() {
            return Err(ClientError::ValidationError(
                "Wallet session requires an application name".to_string(),
            ));
        }
        let auth_data_key = format!("{}{}", app_name, AUTH_KEY_SUFFIX);
        let auth = match storage.get_item(&auth_data_key)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("Discarding unreadable wallet auth data: {}", err);
                AuthData::default()
            }),
            None => AuthData::default(),
        };

        Ok(Self {
            auth_data_key,
            connection,
            key_store,
            storage,
            auth: RwLock::new(auth),
        })
    }

    pub fn auth_data_key(&self) -> &str {
        &self.auth_data_key
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Signed-in account, if the wallet handshake has completed.
    pub fn account_id(&self) -> Option<AccountId> {
        let auth = self.auth.read();
        let raw = auth.account_id.as_deref()?;
        match AccountId::new(raw) {
            Ok(account_id) => Some(account_id),
            Err(err) => {
                log::warn!("Ignoring stored account id '{}': {}", raw, err);
                None
            }
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.account_id().is_some()
    }

    /// Account for the signed-in user; without sign-in it can only run view calls.
    pub fn account(&self) -> Account {
        match self.account_id() {
            Some(account_id) => Account::for_id(self.connection.clone(), account_id),
            None => Account::unsigned(self.connection.clone()),
        }
    }

    /// Register a pending key and build the wallet authorization URL.
    pub async fn request_sign_in(&self, request: &SignInRequest) -> ClientResult<Url> {
        let contract_id = AccountId::new(request.contract_id.as_str())?;
        self.connection
            .provider()
            .view_account(&contract_id)
            .await
            .map_err(|err| {
                ClientError::ValidationError(format!(
                    "Sign-in contract {} is not available on {}: {}",
                    contract_id,
                    self.connection.network_id(),
                    err
                ))
            })?;

        let key = KeyPair::generate();
        let public_key = key.public_key();
        self.key_store.set_key(
            self.connection.network_id(),
            &pending_key_slot(&public_key),
            key,
        )?;

        let mut url = Url::parse(&format!(
            "{}{}",
            self.connection.network().wallet_url.trim_end_matches('/'),
            LOGIN_WALLET_PATH
        ))?;
        {
            let failure_url = request.failure_url.as_ref().unwrap_or(&request.success_url);
            let mut query = url.query_pairs_mut();
            query
                .append_pair("success_url", request.success_url.as_str())
                .append_pair("failure_url", failure_url.as_str())
                .append_pair("contract_id", contract_id.as_str())
                .append_pair("public_key", &public_key.to_string());
            for method in &request.method_names {
                query.append_pair("methodNames", method);
            }
        }

        log::info!(
            "Requesting wallet sign-in for {} with key {}",
            contract_id,
            public_key
        );
        Ok(url)
    }

    /// Finish the handshake from the wallet's redirect back to the app.
    pub fn complete_sign_in(&self, callback_url: &Url) -> ClientResult<AccountId> {
        let mut account_id = None;
        let mut public_key = None;
        let mut all_keys = Vec::new();
        for (name, value) in callback_url.query_pairs() {
            match name.as_ref() {
                "account_id" => account_id = Some(value.into_owned()),
                "public_key" => public_key = Some(value.into_owned()),
                "all_keys" => {
                    all_keys = value
                        .split(',')
                        .filter(|key| !key.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                _ => {}
            }
        }

        let account_id = account_id.ok_or_else(|| {
            ClientError::ValidationError("Wallet callback has no account_id".to_string())
        })?;
        let account_id = AccountId::new(account_id)?;

        let auth = AuthData {
            account_id: Some(account_id.to_string()),
            all_keys,
        };
        self.storage
            .set_item(&self.auth_data_key, &serde_json::to_string(&auth)?)?;
        *self.auth.write() = auth;

        if let Some(public_key) = public_key {
            self.move_key_from_temporary(&account_id, &public_key.parse()?)?;
        }

        log::info!("Wallet sign-in completed for {}", account_id);
        Ok(account_id)
    }

    /// Forget the signed-in account and its delegated key.
    pub fn sign_out(&self) -> ClientResult<()> {
        let previous = self.account_id();
        *self.auth.write() = AuthData::default();
        self.storage.remove_item(&self.auth_data_key)?;
        if let Some(account_id) = previous {
            self.key_store
                .remove_key(self.connection.network_id(), account_id.as_str())?;
            log::info!("Signed out {}", account_id);
        }
        Ok(())
    }

    fn move_key_from_temporary(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> ClientResult<()> {
        let network_id = self.connection.network_id();
        let slot = pending_key_slot(public_key);
        match self.key_store.get_key(network_id, &slot)? {
            Some(key) => {
                self.key_store
                    .set_key(network_id, account_id.as_str(), key)?;
                self.key_store.remove_key(network_id, &slot)?;
            }
            None => log::warn!(
                "No pending key for {}; {} will have no signing key",
                public_key,
                account_id
            ),
        }
        Ok(())
    }
}

fn pending_key_slot(public_key: &PublicKey) -> String {
    format!("{}{}", PENDING_ACCESS_KEY_PREFIX, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::WalletSigner;
    use crate::storage::InMemoryKeyStore;
    use crate::testing::{self, MockProvider};
    use std::collections::HashMap;

    fn wallet(provider: MockProvider) -> (WalletConnection, Arc<InMemoryKeyStore>, Arc<LocalStorage>) {
        let key_store = Arc::new(InMemoryKeyStore::new());
        let storage = Arc::new(LocalStorage::in_memory());
        let connection = testing::connection(
            Arc::new(provider),
            Arc::new(WalletSigner::new(key_store.clone())),
        );
        let wallet =
            WalletConnection::new(connection, key_store.clone(), storage.clone(), "Aerx").unwrap();
        (wallet, key_store, storage)
    }

    fn request(contract: &str) -> SignInRequest {
        SignInRequest {
            contract_id: contract.to_string(),
            method_names: Vec::new(),
            success_url: Url::parse("http://localhost:3000/account").unwrap(),
            failure_url: None,
        }
    }

    #[tokio::test]
    async fn sign_in_round_trip_moves_pending_key() {
        let (wallet, key_store, storage) =
            wallet(MockProvider::new().with_account("aerx-token.testnet"));
        assert!(!wallet.is_signed_in());
        assert!(wallet.account().account_id().is_none());

        let url = wallet
            .request_sign_in(&request("aerx-token.testnet"))
            .await
            .unwrap();
        assert!(url
            .as_str()
            .starts_with("https://wallet.testnet.near.org/login/?"));
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["success_url"], "http://localhost:3000/account");
        assert_eq!(query["failure_url"], "http://localhost:3000/account");
        assert_eq!(query["contract_id"], "aerx-token.testnet");
        let public_key = query["public_key"].clone();
        let pending = format!("pending_key{}", public_key);
        assert!(key_store.get_key("testnet", &pending).unwrap().is_some());

        let callback = Url::parse(&format!(
            "http://localhost:3000/account?account_id=alice.testnet&public_key={}&all_keys={}",
            public_key, public_key
        ))
        .unwrap();
        let account_id = wallet.complete_sign_in(&callback).unwrap();
        assert_eq!(account_id.as_str(), "alice.testnet");
        assert!(wallet.is_signed_in());
        assert!(key_store.get_key("testnet", &pending).unwrap().is_none());
        let key = key_store.get_key("testnet", "alice.testnet").unwrap().unwrap();
        assert_eq!(key.public_key().to_string(), public_key);

        let stored = storage.get_item("Aerx_wallet_auth_key").unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored["accountId"], "alice.testnet");
        assert_eq!(stored["allKeys"][0], public_key.as_str());
    }

    #[tokio::test]
    async fn sign_in_requires_existing_contract() {
        let (wallet, key_store, _) = wallet(MockProvider::new());
        let result = wallet.request_sign_in(&request("missing.testnet")).await;
        assert!(matches!(result, Err(ClientError::ValidationError(_))));
        assert!(key_store.accounts("testnet").unwrap().is_empty());
    }

    #[tokio::test]
    async fn method_names_are_repeated() {
        let (wallet, _, _) = wallet(MockProvider::new().with_account("aerx-dex.testnet"));
        let mut req = request("aerx-dex.testnet");
        req.method_names = vec!["lend".into(), "swap_aex".into()];
        let url = wallet.request_sign_in(&req).await.unwrap();
        let methods: Vec<String> = url
            .query_pairs()
            .filter(|(name, _)| name == "methodNames")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(methods, vec!["lend", "swap_aex"]);
    }

    #[test]
    fn callback_without_account_is_rejected() {
        let (wallet, _, _) = wallet(MockProvider::new());
        let callback = Url::parse("http://localhost:3000/account?public_key=x").unwrap();
        assert!(matches!(
            wallet.complete_sign_in(&callback),
            Err(ClientError::ValidationError(_))
        ));
        assert!(!wallet.is_signed_in());
    }

    #[test]
    fn auth_data_is_restored_and_cleared() {
        let key_store = Arc::new(InMemoryKeyStore::new());
        key_store
            .set_key("testnet", "alice.testnet", KeyPair::generate())
            .unwrap();
        let storage = Arc::new(LocalStorage::in_memory());
        storage
            .set_item(
                "Aerx_wallet_auth_key",
                r#"{"accountId":"alice.testnet","allKeys":[]}"#,
            )
            .unwrap();
        let connection = testing::connection(
            Arc::new(MockProvider::new()),
            Arc::new(WalletSigner::new(key_store.clone())),
        );
        let wallet =
            WalletConnection::new(connection, key_store.clone(), storage.clone(), "Aerx").unwrap();
        assert_eq!(
            wallet.account().account_id().map(AccountId::as_str),
            Some("alice.testnet")
        );

        wallet.sign_out().unwrap();
        assert!(!wallet.is_signed_in());
        assert!(storage.get_item("Aerx_wallet_auth_key").unwrap().is_none());
        assert!(key_store.get_key("testnet", "alice.testnet").unwrap().is_none());
    }

    #[test]
    fn empty_app_name_is_rejected() {
        let key_store = Arc::new(InMemoryKeyStore::new());
        let connection = testing::connection(
            Arc::new(MockProvider::new()),
            Arc::new(WalletSigner::new(key_store.clone())),
        );
        let result =
            WalletConnection::new(connection, key_store, Arc::new(LocalStorage::in_memory()), " ");
        assert!(result.is_err());
    }
}

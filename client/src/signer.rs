//! Signing capabilities.
//!
//! Two authorities can sign for an account: the end user, through keys the
//! wallet delegated during sign-in, and the service, through a statically held
//! full-access key. Both implement [`Signer`], so accounts and contract handles
//! never need to know which one backs them.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};
use crate::keys::{KeyPair, PublicKey, Signature};
use crate::storage::{InMemoryKeyStore, KeyStore};
use crate::types::AccountId;

/// Who authorizes transactions signed through a [`Signer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerAuthority {
    /// Keys delegated by the end user through the wallet sign-in flow.
    Wallet,
    /// Static full-access key held by the application.
    Service,
}

pub trait Signer: Send + Sync + fmt::Debug {
    fn authority(&self) -> SignerAuthority;

    /// Public key able to sign for `account_id`, if any.
    fn public_key(
        &self,
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Option<PublicKey>>;

    fn sign(
        &self,
        message: &[u8],
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Signature>;
}

fn lookup_key(
    key_store: &dyn KeyStore,
    network_id: &str,
    account_id: &AccountId,
) -> ClientResult<KeyPair> {
    key_store
        .get_key(network_id, account_id.as_str())?
        .ok_or_else(|| ClientError::NoSigningAuthority(format!("{} on {}", account_id, network_id)))
}

/// Signs with keys the wallet delegated to this client.
#[derive(Debug, Clone)]
pub struct WalletSigner {
    key_store: Arc<dyn KeyStore>,
}

impl WalletSigner {
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self { key_store }
    }

    pub fn key_store(&self) -> &Arc<dyn KeyStore> {
        &self.key_store
    }
}

impl Signer for WalletSigner {
    fn authority(&self) -> SignerAuthority {
        SignerAuthority::Wallet
    }

    fn public_key(
        &self,
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Option<PublicKey>> {
        Ok(self
            .key_store
            .get_key(network_id, account_id.as_str())?
            .map(|key| key.public_key()))
    }

    fn sign(
        &self,
        message: &[u8],
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Signature> {
        let key = lookup_key(self.key_store.as_ref(), network_id, account_id)?;
        Ok(key.sign(message))
    }
}

/// Static credential for the service-signer path. Never persisted.
pub struct Credential {
    pub private_key: SecretString,
    pub account_name: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_name", &self.account_name)
            .finish_non_exhaustive()
    }
}

/// Signs with the service's own full-access key, held in a private key store.
#[derive(Debug)]
pub struct ServiceSigner {
    key_store: InMemoryKeyStore,
}

impl ServiceSigner {
    /// Register the credential's key under `(network_id, account_name)`.
    pub fn from_credential(network_id: &str, credential: &Credential) -> ClientResult<Self> {
        let key = KeyPair::from_secret_str(credential.private_key.expose_secret()).map_err(
            |err| ClientError::AccountConstructionFailure(format!("Malformed service key: {}", err)),
        )?;
        let key_store = InMemoryKeyStore::new();
        key_store.set_key(network_id, &credential.account_name, key)?;
        log::debug!(
            "Registered service key for {} on {}",
            credential.account_name,
            network_id
        );
        Ok(Self { key_store })
    }
}

impl Signer for ServiceSigner {
    fn authority(&self) -> SignerAuthority {
        SignerAuthority::Service
    }

    fn public_key(
        &self,
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Option<PublicKey>> {
        Ok(self
            .key_store
            .get_key(network_id, account_id.as_str())?
            .map(|key| key.public_key()))
    }

    fn sign(
        &self,
        message: &[u8],
        network_id: &str,
        account_id: &AccountId,
    ) -> ClientResult<Signature> {
        let key = lookup_key(&self.key_store, network_id, account_id)?;
        Ok(key.sign(message))
    }
}

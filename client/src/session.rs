use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::errors::{ClientError, ClientResult};
use crate::generation::SessionGeneration;
use crate::navigator::Navigator;
use crate::network;
use crate::rpc::Provider;
use crate::signer::WalletSigner;
use crate::storage::{ClientPaths, FileKeyStore, KeyStore, LocalStorage};
use crate::store::{SessionPhase, SessionStore};
use crate::types::AccountId;
use crate::validation::InputValidator;
use crate::wallet::{SignInRequest, WalletConnection};

/// Where the wallet sends the user after approving sign-in.
pub const DEFAULT_CALLBACK_PATH: &str = "/account";

/// A wallet-signed connection and what is known about its account.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection: Connection,
    pub wallet: Arc<WalletConnection>,
    /// `None` until the wallet sign-in completes.
    pub account_id: Option<AccountId>,
    pub generation: u64,
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        self.account_id.is_some()
    }
}

/// Manages the user-signed wallet session and publishes it to the store.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: Arc<ClientConfig>,
    paths: ClientPaths,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    generation: SessionGeneration,
    provider: Option<Arc<dyn Provider>>,
}

impl SessionManager {
    pub fn new(
        config: Arc<ClientConfig>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let paths = ClientPaths::new(config.data_dir())?;
        Ok(Self {
            config,
            paths,
            store,
            navigator,
            generation: SessionGeneration::new(),
            provider: None,
        })
    }

    /// Use `provider` for chain access instead of the network's RPC node.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Arc<ClientConfig> {
        &self.config
    }

    pub fn paths(&self) -> &ClientPaths {
        &self.paths
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn generation(&self) -> &SessionGeneration {
        &self.generation
    }

    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        self.provider.as_ref()
    }

    /// Connect to `environment_name` and restore the wallet session. Publishes nothing.
    pub async fn initialize(&self, environment_name: &str) -> ClientResult<Session> {
        let network = network::resolve(environment_name)?;

        self.paths.ensure_directories()?;
        let key_store: Arc<dyn KeyStore> =
            Arc::new(FileKeyStore::open(self.paths.keystore_file())?);
        let storage = Arc::new(LocalStorage::open(self.paths.local_storage_file())?);
        let signer = Arc::new(WalletSigner::new(Arc::clone(&key_store)));

        let token = self.generation.token();
        let generation = token.issued();
        let connection = match &self.provider {
            Some(provider) => Connection::new(network, Arc::clone(provider), signer, token),
            None => Connection::connect(network, signer, token)?,
        };

        let wallet = WalletConnection::new(
            connection.clone(),
            key_store,
            storage,
            &self.config.app_name(),
        )?;
        let account_id = wallet.account_id();
        match &account_id {
            Some(account_id) => log::info!("Wallet session restored for {}", account_id),
            None => log::warn!("Wallet session has no signed-in account"),
        }

        Ok(Session {
            connection,
            wallet: Arc::new(wallet),
            account_id,
            generation,
        })
    }

    /// Initialize and publish connection, wallet session and account id.
    pub async fn establish(&self, environment_name: &str) -> ClientResult<Session> {
        let session = self.initialize(environment_name).await?;
        self.store.set_connection(session.connection.clone());
        self.store.set_wallet_session(Arc::clone(&session.wallet));
        self.store.set_account_id(session.account_id.clone());
        self.store.set_phase(SessionPhase::SessionEstablished);
        Ok(session)
    }

    /// Send the user to the wallet to approve a key for the sign-in contract.
    pub async fn request_sign_in(&self, callback_path: Option<&str>) -> ClientResult<Url> {
        let wallet = self.store.wallet_session().ok_or(ClientError::NotConnected)?;
        let path = callback_path.unwrap_or(DEFAULT_CALLBACK_PATH);
        let request = SignInRequest {
            contract_id: self.config.sign_in_contract()?.clone(),
            method_names: Vec::new(),
            success_url: self.app_url(path)?,
            failure_url: None,
        };

        let url = wallet.request_sign_in(&request).await?;
        self.navigator.navigate(&url)?;
        Ok(url)
    }

    /// Apply the wallet's redirect and persist the signed-in account.
    ///
    /// Everything issued before sign-in was bound without signing authority,
    /// so the store is reset and the generation advanced; the caller
    /// reconnects to obtain handles bound to the returned account.
    pub fn complete_sign_in(&self, callback_url: &str) -> ClientResult<AccountId> {
        let wallet = self.store.wallet_session().ok_or(ClientError::NotConnected)?;
        let account_id = wallet.complete_sign_in(&Url::parse(callback_url)?)?;
        self.reset(&format!("signed in as {}", account_id));
        Ok(account_id)
    }

    /// Release all local session state and invalidate every handle issued so far.
    pub fn sign_out(&self, current_path: &str) -> ClientResult<()> {
        let wallet = self.store.wallet_session().ok_or(ClientError::NotConnected)?;
        let target = self.app_url(current_path)?;

        wallet.sign_out()?;
        self.reset("signed out");

        self.navigator.navigate(&target)
    }

    fn reset(&self, reason: &str) {
        self.store.remove_connection();
        self.store.remove_wallet_session();
        self.store.clear();
        let generation = self.generation.advance();
        log::info!("Session closed ({}); generation is now {}", reason, generation);
    }

    fn app_url(&self, path: &str) -> ClientResult<Url> {
        InputValidator::new().validate_redirect_path(path)?;
        let mut url = Url::parse(self.config.app_origin()?)?.join(path)?;
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

//! Session orchestration.
//!
//! One connection lifecycle, published to the store step by step:
//!
//! ```text
//! Uninitialized -> ConnectingNetwork -> SessionEstablished
//!     -> LoadingContracts{token, exchange, profile (user)}
//!     -> LoadingContracts{.., profile (service)} -> Ready
//! ```
//!
//! Any failure moves the store to `Failed` and is returned to the caller; no
//! session is ever published as `Ready` with a missing handle.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::account::Account;
use crate::binder::ServiceBinder;
use crate::config::ClientConfig;
use crate::contract::ContractHandle;
use crate::errors::{ClientError, ClientResult};
use crate::manifest::ContractKind;
use crate::network::NetworkEnvironment;
use crate::session::{Session, SessionManager};
use crate::store::{SessionPhase, SessionStore};

const USER_SIGNED: [ContractKind; 3] = [
    ContractKind::Token,
    ContractKind::Exchange,
    ContractKind::ProfileUser,
];

#[derive(Debug, Clone)]
pub struct SessionOrchestrator {
    manager: SessionManager,
    binder: Arc<dyn ServiceBinder>,
    step_timeout: Duration,
}

impl SessionOrchestrator {
    pub fn new(manager: SessionManager, binder: Arc<dyn ServiceBinder>) -> ClientResult<Self> {
        let step_timeout = manager.config().step_timeout()?;
        Ok(Self {
            manager,
            binder,
            step_timeout,
        })
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    fn store(&self) -> &Arc<dyn SessionStore> {
        self.manager.store()
    }

    /// Connect using the configured environment.
    pub async fn run(&self) -> ClientResult<Session> {
        let environment = self.manager.config().environment_name();
        self.connect(&environment).await
    }

    /// Establish a session on `environment_name` and bind every contract.
    pub async fn connect(&self, environment_name: &str) -> ClientResult<Session> {
        if self.store().connection().is_some() {
            let generation = self.manager.generation().advance();
            log::info!("Replacing open session; generation is now {}", generation);
            self.store().clear();
        }

        self.store().set_phase(SessionPhase::ConnectingNetwork);
        let config = match self.config_for(environment_name) {
            Ok(config) => config,
            Err(err) => return Err(self.fail(err)),
        };
        let session = match self
            .step(
                "establishing the wallet session",
                self.manager.establish(environment_name),
            )
            .await
        {
            Ok(session) => session,
            Err(err) => return Err(self.fail(err)),
        };
        if !session.is_signed_in() {
            log::warn!(
                "No signed-in account; user-signed contracts load without signing authority"
            );
        }

        if let Ok(service_network) = config.service_network() {
            if service_network.network_id != session.connection.network_id() {
                log::warn!(
                    "Service signer uses {} while the session runs on {}",
                    service_network.network_id,
                    session.connection.network_id()
                );
            }
        }

        let mut loaded = BTreeSet::new();
        self.store()
            .set_phase(SessionPhase::LoadingContracts(loaded.clone()));

        let account = session.wallet.account();
        let [token, exchange, profile_user] =
            USER_SIGNED.map(|kind| self.load_user_contract(&config, &account, kind));
        let handles = match self
            .step("loading user-signed contracts", async {
                tokio::try_join!(token, exchange, profile_user)
            })
            .await
        {
            Ok((token, exchange, profile_user)) => [token, exchange, profile_user],
            Err(err) => return Err(self.fail(err)),
        };
        for handle in handles {
            loaded.insert(handle.kind());
            self.store().set_contract(handle);
            self.store()
                .set_phase(SessionPhase::LoadingContracts(loaded.clone()));
        }

        let service_profile = match self
            .step("binding the service-signed profile contract", async {
                Ok::<_, ClientError>(self.binder.bind(ContractKind::ProfileService).await)
            })
            .await
        {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                return Err(self.fail(ClientError::ContractBindFailure(
                    "service-signed profile contract is unavailable".to_string(),
                )))
            }
            Err(err) => return Err(self.fail(err)),
        };
        loaded.insert(service_profile.kind());
        self.store().set_contract(service_profile);
        self.store()
            .set_phase(SessionPhase::LoadingContracts(loaded));

        self.store().set_phase(SessionPhase::Ready {
            signed_in: session.is_signed_in(),
        });
        log::info!(
            "Session ready on {} ({})",
            session.connection.network_id(),
            session
                .account_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "not signed in".to_string())
        );
        Ok(session)
    }

    /// Configuration whose contract defaults match `environment_name`.
    fn config_for(&self, environment_name: &str) -> ClientResult<Arc<ClientConfig>> {
        let environment: NetworkEnvironment = environment_name.parse()?;
        let config = self.manager.config();
        if environment == config.environment() {
            Ok(Arc::clone(config))
        } else {
            log::debug!(
                "Retargeting contract defaults from {} to {}",
                config.environment(),
                environment
            );
            Ok(Arc::new(config.with_environment(environment)))
        }
    }

    async fn load_user_contract(
        &self,
        config: &ClientConfig,
        account: &Account,
        kind: ContractKind,
    ) -> ClientResult<ContractHandle> {
        let contract_name = config.contract_name(kind)?;
        ContractHandle::create(account.clone(), contract_name, kind, kind.manifest())
    }

    async fn step<T, F>(&self, what: &str, future: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        tokio::time::timeout(self.step_timeout, future)
            .await
            .map_err(|_| ClientError::ConnectionTimeout(what.to_string()))?
    }

    fn fail(&self, err: ClientError) -> ClientError {
        log::error!("Session setup failed: {}", err);
        self.store().set_phase(SessionPhase::Failed(err.clone()));
        err
    }
}

//! Service-signed contract binding.
//!
//! The service holds a full-access key for its own account and signs
//! profile operations on the user's behalf, so the user never pays for them.
//! Binding never returns a partially built handle: any missing or malformed
//! input yields `None` and a logged reason.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::account::Account;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::contract::ContractHandle;
use crate::errors::ClientResult;
use crate::generation::SessionGeneration;
use crate::manifest::ContractKind;
use crate::rpc::Provider;
use crate::signer::ServiceSigner;

/// Produces service-signed contract handles.
#[async_trait]
pub trait ServiceBinder: Send + Sync + fmt::Debug {
    async fn bind(&self, kind: ContractKind) -> Option<ContractHandle>;
}

#[derive(Debug, Clone)]
pub struct ServiceSignerBinder {
    config: Arc<ClientConfig>,
    generation: SessionGeneration,
    provider: Option<Arc<dyn Provider>>,
}

impl ServiceSignerBinder {
    /// Handles are tied to `generation`, so they close with the user session.
    pub fn new(config: Arc<ClientConfig>, generation: SessionGeneration) -> Self {
        Self {
            config,
            generation,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Bind `kind`, reporting why binding failed.
    pub fn try_bind(&self, kind: ContractKind) -> ClientResult<ContractHandle> {
        let credential = self.config.credential(kind)?;

        let network = self.config.service_network()?;
        let signer = Arc::new(ServiceSigner::from_credential(
            &network.network_id,
            &credential,
        )?);
        let token = self.generation.token();
        let connection = match &self.provider {
            Some(provider) => Connection::new(network, Arc::clone(provider), signer, token),
            None => Connection::connect(network, signer, token)?,
        };

        let account = Account::new(connection, &credential.account_name)?;
        let handle =
            ContractHandle::create(account, &credential.account_name, kind, kind.manifest())?;
        log::info!(
            "Bound {} contract {} with service signer",
            kind,
            handle.contract_id()
        );
        Ok(handle)
    }
}

#[async_trait]
impl ServiceBinder for ServiceSignerBinder {
    async fn bind(&self, kind: ContractKind) -> Option<ContractHandle> {
        match self.try_bind(kind) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("Could not bind {} contract: {}", kind, err);
                None
            }
        }
    }
}

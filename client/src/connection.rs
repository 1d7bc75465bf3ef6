use std::sync::Arc;

use crate::errors::ClientResult;
use crate::generation::GenerationToken;
use crate::network::NetworkConfig;
use crate::rpc::{Provider, RpcClient};
use crate::signer::Signer;

/// A network endpoint paired with the signer that authorizes transactions on it.
#[derive(Debug, Clone)]
pub struct Connection {
    network: NetworkConfig,
    provider: Arc<dyn Provider>,
    signer: Arc<dyn Signer>,
    generation: GenerationToken,
}

impl Connection {
    pub fn new(
        network: NetworkConfig,
        provider: Arc<dyn Provider>,
        signer: Arc<dyn Signer>,
        generation: GenerationToken,
    ) -> Self {
        Self {
            network,
            provider,
            signer,
            generation,
        }
    }

    /// Connect to the network's RPC node. No request is made until first use.
    pub fn connect(
        network: NetworkConfig,
        signer: Arc<dyn Signer>,
        generation: GenerationToken,
    ) -> ClientResult<Self> {
        let provider = RpcClient::new(&network.node_url)?;
        log::info!(
            "Connected to {} via {} ({:?} signer)",
            network.network_id,
            provider.base_url(),
            signer.authority()
        );
        Ok(Self::new(network, Arc::new(provider), signer, generation))
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn network_id(&self) -> &str {
        &self.network.network_id
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn generation(&self) -> &GenerationToken {
        &self.generation
    }
}

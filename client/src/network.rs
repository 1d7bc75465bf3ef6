//! Network endpoint resolution for named environments.
//!
//! Resolution is a pure lookup: the same name always yields the same
//! [`NetworkConfig`], and unknown names are rejected instead of falling back to
//! a default network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};

/// Endpoint parameters for one NEAR network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network_id: String,
    pub node_url: String,
    pub wallet_url: String,
    pub helper_url: String,
    pub explorer_url: String,
}

/// Environments the client knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkEnvironment {
    Mainnet,
    Testnet,
    Betanet,
    Local,
}

impl NetworkEnvironment {
    pub const ALL: [NetworkEnvironment; 4] = [
        NetworkEnvironment::Mainnet,
        NetworkEnvironment::Testnet,
        NetworkEnvironment::Betanet,
        NetworkEnvironment::Local,
    ];

    /// Endpoint parameters for this environment.
    pub fn config(self) -> NetworkConfig {
        let (network_id, node_url, wallet_url, helper_url, explorer_url) = match self {
            NetworkEnvironment::Mainnet => (
                "mainnet",
                "https://rpc.mainnet.near.org",
                "https://wallet.near.org",
                "https://helper.mainnet.near.org",
                "https://explorer.mainnet.near.org",
            ),
            NetworkEnvironment::Testnet => (
                "testnet",
                "https://rpc.testnet.near.org",
                "https://wallet.testnet.near.org",
                "https://helper.testnet.near.org",
                "https://explorer.testnet.near.org",
            ),
            NetworkEnvironment::Betanet => (
                "betanet",
                "https://rpc.betanet.near.org",
                "https://wallet.betanet.near.org",
                "https://helper.betanet.near.org",
                "https://explorer.betanet.near.org",
            ),
            NetworkEnvironment::Local => (
                "local",
                "http://localhost:3030",
                "http://localhost:4000/wallet",
                "http://localhost:3000",
                "http://localhost:9001",
            ),
        };

        NetworkConfig {
            network_id: network_id.to_string(),
            node_url: node_url.to_string(),
            wallet_url: wallet_url.to_string(),
            helper_url: helper_url.to_string(),
            explorer_url: explorer_url.to_string(),
        }
    }
}

impl FromStr for NetworkEnvironment {
    type Err = ClientError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "mainnet" => Ok(NetworkEnvironment::Mainnet),
            "development" | "testnet" => Ok(NetworkEnvironment::Testnet),
            "betanet" => Ok(NetworkEnvironment::Betanet),
            "local" => Ok(NetworkEnvironment::Local),
            _ => Err(ClientError::UnknownEnvironment(name.to_string())),
        }
    }
}

impl fmt::Display for NetworkEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkEnvironment::Mainnet => "mainnet",
            NetworkEnvironment::Testnet => "testnet",
            NetworkEnvironment::Betanet => "betanet",
            NetworkEnvironment::Local => "local",
        };
        f.write_str(name)
    }
}

/// Resolve the network configuration for an environment name.
pub fn resolve(environment_name: &str) -> ClientResult<NetworkConfig> {
    let environment: NetworkEnvironment = environment_name.parse()?;
    Ok(environment.config())
}

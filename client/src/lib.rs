// lib.rs - Core library structure for the Aerx session client

pub mod account;
pub mod binder;
pub mod config;
pub mod connection;
pub mod contract;
pub mod errors;
pub mod generation;
pub mod keys;
pub mod manifest;
pub mod navigator;
pub mod network;
pub mod orchestrator;
pub mod profile;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod storage;
pub mod store;
pub mod transaction;
pub mod types;
pub mod validation;
pub mod wallet;

#[cfg(test)]
mod testing;

// Re-export common types
pub use account::Account;
pub use binder::{ServiceBinder, ServiceSignerBinder};
pub use config::ClientConfig;
pub use connection::Connection;
pub use contract::{CallOptions, ContractHandle};
pub use errors::{ClientError, ClientResult};
pub use generation::{GenerationToken, SessionGeneration};
pub use keys::{KeyPair, PublicKey, Signature};
pub use manifest::{ContractKind, MethodKind, MethodManifest};
pub use navigator::{LogNavigator, Navigator};
pub use network::{resolve, NetworkConfig, NetworkEnvironment};
pub use orchestrator::SessionOrchestrator;
pub use profile::{build_profile_view, ProfileView};
pub use rpc::{Provider, RpcClient};
pub use session::{Session, SessionManager};
pub use signer::{Credential, ServiceSigner, Signer, SignerAuthority, WalletSigner};
pub use storage::{ClientPaths, FileKeyStore, InMemoryKeyStore, KeyStore, LocalStorage};
pub use store::{LoadedContracts, MemorySessionStore, SessionPhase, SessionSnapshot, SessionStore};
pub use types::{AccountId, CryptoHash};
pub use wallet::{SignInRequest, WalletConnection};

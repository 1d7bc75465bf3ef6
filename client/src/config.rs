use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::errors::{ClientError, ClientResult};
use crate::manifest::ContractKind;
use crate::network::{self, NetworkConfig, NetworkEnvironment};
use crate::signer::Credential;

pub const KEY_APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
pub const KEY_APP_NAME: &str = "APP_NAME";
pub const KEY_APP_ORIGIN: &str = "APP_ORIGIN";
pub const KEY_DATA_DIR: &str = "DATA_DIR";
pub const KEY_LOG_LEVEL: &str = "LOG_LEVEL";
pub const KEY_TOKEN_CONTRACT: &str = "TOKEN_CONTRACT";
pub const KEY_PROFILE_CONTRACT: &str = "PROFILE_CONTRACT";
pub const KEY_DEX_CONTRACT: &str = "DEX_CONTRACT";
pub const KEY_SIGN_IN_CONTRACT: &str = "SIGN_IN_CONTRACT";
pub const KEY_SERVICE_ACCOUNT: &str = "SERVICE_ACCOUNT";
pub const KEY_SERVICE_NETWORK: &str = "SERVICE_NETWORK";
pub const KEY_STEP_TIMEOUT_SECS: &str = "STEP_TIMEOUT_SECS";

/// Wallet session namespace; auth data is stored under `<name>_wallet_auth_key`.
pub const DEFAULT_APP_NAME: &str = "Aerx";
const DEFAULT_STEP_TIMEOUT_SECS: u32 = 30;

const SERVICE_KEY_VARS: [&str; 2] = ["AERX_PNFT_PRIV_KEY", "NEXT_PUBLIC_PNFT_PRIV_KEY"];

/// Client configuration: environment-keyed defaults overridden by environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    environment: NetworkEnvironment,
    config_map: HashMap<String, String>,
    service_key: Option<SecretString>,
}

impl ClientConfig {
    /// Defaults for `environment` with no overrides applied.
    pub fn new(environment: NetworkEnvironment) -> Self {
        let mut config = ClientConfig {
            environment,
            config_map: HashMap::new(),
            service_key: None,
        };
        config.load_defaults();
        config
    }

    /// Select the environment from `AERX_ENV` (falling back to `NODE_ENV`) and apply overrides.
    pub fn from_env() -> ClientResult<Self> {
        let name = std::env::var("AERX_ENV")
            .or_else(|_| std::env::var("NODE_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let environment: NetworkEnvironment = name.parse()?;

        let mut config = Self::new(environment);
        config.config_map.insert(KEY_APP_ENVIRONMENT.to_string(), name);
        config.load_from_env_vars();
        config.service_key = first_env_value(&SERVICE_KEY_VARS).map(SecretString::from);
        log::info!(
            "Client configuration loaded for {} environment",
            config.environment
        );
        Ok(config)
    }

    /// The same configuration retargeted at `environment`.
    ///
    /// Environment-keyed defaults are recomputed; values that were set
    /// explicitly (by environment variable or [`ClientConfig::set`]) carry over.
    pub fn with_environment(&self, environment: NetworkEnvironment) -> Self {
        let previous_defaults = Self::new(self.environment).config_map;
        let mut config = Self::new(environment);
        for (key, value) in &self.config_map {
            if key != KEY_APP_ENVIRONMENT && previous_defaults.get(key) != Some(value) {
                config.config_map.insert(key.clone(), value.clone());
            }
        }
        config.service_key = self.service_key.clone();
        config
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config_map.get(key)
    }

    pub fn get_or_default(&self, key: &str, default: &str) -> String {
        self.config_map
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_required(&self, key: &str) -> ClientResult<&String> {
        self.config_map.get(key).ok_or_else(|| {
            ClientError::ValidationError(format!("Required config key '{}' not found", key))
        })
    }

    pub fn get_u32_with_default(&self, key: &str, default: u32) -> ClientResult<u32> {
        match self.config_map.get(key) {
            Some(value) => parse_u32_value(value, key),
            None => Ok(default),
        }
    }

    /// Set a configuration value (for testing purposes)
    pub fn set(&mut self, key: &str, value: &str) {
        self.config_map.insert(key.to_string(), value.to_string());
    }

    pub fn set_service_key(&mut self, key: Option<SecretString>) {
        self.service_key = key;
    }

    pub fn environment(&self) -> NetworkEnvironment {
        self.environment
    }

    /// Environment name handed to the network resolver for the wallet session.
    pub fn environment_name(&self) -> String {
        self.get_or_default(KEY_APP_ENVIRONMENT, &self.environment.to_string())
    }

    pub fn app_name(&self) -> String {
        self.get_or_default(KEY_APP_NAME, DEFAULT_APP_NAME)
    }

    pub fn app_origin(&self) -> ClientResult<&String> {
        self.get_required(KEY_APP_ORIGIN)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or_default(KEY_DATA_DIR, ".aerx"))
    }

    pub fn log_level(&self) -> String {
        self.get_or_default(KEY_LOG_LEVEL, "info")
    }

    /// Contract account for a user-signed binding.
    pub fn contract_name(&self, kind: ContractKind) -> ClientResult<&String> {
        match kind {
            ContractKind::Token => self.get_required(KEY_TOKEN_CONTRACT),
            ContractKind::Exchange => self.get_required(KEY_DEX_CONTRACT),
            ContractKind::ProfileUser => self.get_required(KEY_PROFILE_CONTRACT),
            ContractKind::ProfileService => self.get_required(KEY_SERVICE_ACCOUNT).map_err(|_| {
                ClientError::MissingCredential("service account name is not configured".into())
            }),
        }
    }

    /// Contract the wallet grants a function-call key for at sign-in.
    pub fn sign_in_contract(&self) -> ClientResult<&String> {
        self.config_map.get(KEY_SIGN_IN_CONTRACT).ok_or_else(|| {
            ClientError::ValidationError(
                "No sign-in contract configured; set TOKEN_CONTRACT_NAME".to_string(),
            )
        })
    }

    /// Network used by the service signer, independent of the app environment.
    pub fn service_network(&self) -> ClientResult<NetworkConfig> {
        network::resolve(&self.get_or_default(KEY_SERVICE_NETWORK, "testnet"))
    }

    pub fn step_timeout(&self) -> ClientResult<Duration> {
        let secs = self.get_u32_with_default(KEY_STEP_TIMEOUT_SECS, DEFAULT_STEP_TIMEOUT_SECS)?;
        Ok(Duration::from_secs(u64::from(secs)))
    }

    /// Static credential for a service-signed binding.
    pub fn credential(&self, kind: ContractKind) -> ClientResult<Credential> {
        if kind != ContractKind::ProfileService {
            return Err(ClientError::MissingCredential(format!(
                "{} contract has no service credential",
                kind
            )));
        }
        let private_key = self.service_key.clone().ok_or_else(|| {
            ClientError::MissingCredential("service private key is not configured".into())
        })?;
        let account_name = self
            .config_map
            .get(KEY_SERVICE_ACCOUNT)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                ClientError::MissingCredential("service account name is not configured".into())
            })?;
        Ok(Credential {
            private_key,
            account_name,
        })
    }

    fn load_defaults(&mut self) {
        self.config_map
            .insert(KEY_APP_NAME.to_string(), DEFAULT_APP_NAME.to_string());
        self.config_map.insert(
            KEY_APP_ORIGIN.to_string(),
            "http://localhost:3000".to_string(),
        );
        self.config_map
            .insert(KEY_DATA_DIR.to_string(), ".aerx".to_string());
        self.config_map
            .insert(KEY_SERVICE_NETWORK.to_string(), "testnet".to_string());
        self.config_map.insert(
            KEY_STEP_TIMEOUT_SECS.to_string(),
            DEFAULT_STEP_TIMEOUT_SECS.to_string(),
        );

        let (log_level, suffix) = match self.environment {
            NetworkEnvironment::Mainnet => ("info", "near"),
            NetworkEnvironment::Testnet => ("debug", "testnet"),
            NetworkEnvironment::Betanet => ("debug", "betanet"),
            NetworkEnvironment::Local => ("trace", "test.near"),
        };
        self.config_map
            .insert(KEY_LOG_LEVEL.to_string(), log_level.to_string());
        for (key, prefix) in [
            (KEY_TOKEN_CONTRACT, "aerx-token"),
            (KEY_PROFILE_CONTRACT, "aerx-profile"),
            (KEY_DEX_CONTRACT, "aerx-dex"),
        ] {
            self.config_map
                .insert(key.to_string(), format!("{}.{}", prefix, suffix));
        }
    }

    fn load_from_env_vars(&mut self) {
        let env_mappings = [
            ("AERX_APP_NAME", KEY_APP_NAME),
            ("AERX_APP_ORIGIN", KEY_APP_ORIGIN),
            ("AERX_DATA_DIR", KEY_DATA_DIR),
            ("AERX_LOG_LEVEL", KEY_LOG_LEVEL),
            ("AERX_TOKEN_CONTRACT", KEY_TOKEN_CONTRACT),
            ("AERX_PROFILE_CONTRACT", KEY_PROFILE_CONTRACT),
            ("AERX_DEX_CONTRACT", KEY_DEX_CONTRACT),
            ("TOKEN_CONTRACT_NAME", KEY_SIGN_IN_CONTRACT),
            ("NEXT_PUBLIC_PNFT_ID", KEY_SERVICE_ACCOUNT),
            ("AERX_PNFT_ID", KEY_SERVICE_ACCOUNT),
            ("AERX_SERVICE_NETWORK", KEY_SERVICE_NETWORK),
            ("AERX_STEP_TIMEOUT_SECS", KEY_STEP_TIMEOUT_SECS),
        ];

        for (env_var, config_key) in &env_mappings {
            if let Some(value) = env_value(env_var) {
                self.config_map.insert(config_key.to_string(), value);
                log::debug!(
                    "Loaded configuration {} from environment variable {}",
                    config_key,
                    env_var
                );
            }
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(NetworkEnvironment::Testnet)
    }
}

/// Read an environment variable, ignoring empty values and values with control characters.
fn env_value(env_var: &str) -> Option<String> {
    let value = std::env::var(env_var).ok()?;
    if value.trim().is_empty() {
        log::warn!("Environment variable {} is empty", env_var);
        return None;
    }
    if value.chars().any(|c| c.is_control()) {
        log::warn!(
            "Environment variable {} contains control characters, ignoring",
            env_var
        );
        return None;
    }
    Some(value)
}

fn first_env_value(env_vars: &[&str]) -> Option<String> {
    env_vars.iter().find_map(|var| env_value(var))
}

fn parse_u32_value(value: &str, key: &str) -> ClientResult<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::ValidationError(format!(
            "Configuration key '{}' cannot be empty",
            key
        )));
    }

    trimmed.parse::<u32>().map_err(|_| {
        ClientError::ValidationError(format!(
            "Invalid numeric value '{}' for key '{}'",
            value, key
        ))
    })
}

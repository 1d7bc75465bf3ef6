//! Core chain types shared across the client.

use std::fmt;
use std::io;
use std::str::FromStr;

use borsh::BorshSerialize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ClientError, ClientResult};
use crate::validation::InputValidator;

/// Default gas attached to function calls (30 Tgas).
pub const DEFAULT_FUNCTION_CALL_GAS: u64 = 30_000_000_000_000;

/// Validated NEAR account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> ClientResult<Self> {
        let value = value.into();
        InputValidator::new().validate_account_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AccountId::new(s).map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for AccountId {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        BorshSerialize::serialize(&self.0, writer)
    }
}

/// 32-byte hash, rendered as base58 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, BorshSerialize)]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for CryptoHash {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ClientError::InvalidResponse(format!("Invalid base58 hash: {}", e)))?;
        let array: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ClientError::InvalidResponse(format!(
                "Invalid hash length: expected 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

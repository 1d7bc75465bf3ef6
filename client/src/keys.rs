//! Ed25519 key material in the NEAR text encoding (`ed25519:<base58>`).

use std::fmt;
use std::io;
use std::str::FromStr;

use borsh::BorshSerialize;

use ed25519_dalek::{Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::errors::{ClientError, ClientResult};

const ED25519_PREFIX: &str = "ed25519:";
/// Borsh discriminant for ed25519 keys and signatures.
pub const ED25519_KEY_TYPE: u8 = 0;
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
const SEED_LEN: usize = 32;
const KEYPAIR_LEN: usize = 64;

/// Full-access or function-call key pair held by a key store.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Parse `ed25519:<base58>` holding either the 64-byte keypair form or a 32-byte seed.
    pub fn from_secret_str(encoded: &str) -> ClientResult<Self> {
        let trimmed = encoded.trim();
        let body = match trimmed.split_once(':') {
            Some(("ed25519", body)) => body,
            Some((curve, _)) => {
                return Err(ClientError::InvalidKey(format!(
                    "Unsupported key type '{}'",
                    curve
                )))
            }
            None => trimmed,
        };

        let bytes = Zeroizing::new(
            bs58::decode(body)
                .into_vec()
                .map_err(|e| ClientError::InvalidKey(format!("Invalid base58 key: {}", e)))?,
        );

        let signing_key = match bytes.len() {
            KEYPAIR_LEN => {
                let mut keypair = Zeroizing::new([0u8; KEYPAIR_LEN]);
                keypair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&keypair).map_err(|_| {
                    ClientError::InvalidKey("Public half does not match secret key".to_string())
                })?
            }
            SEED_LEN => {
                let mut seed = Zeroizing::new([0u8; SEED_LEN]);
                seed.copy_from_slice(&bytes);
                SigningKey::from_bytes(&seed)
            }
            other => {
                return Err(ClientError::InvalidKey(format!(
                    "Invalid secret key length: expected {} or {} bytes, got {}",
                    SEED_LEN, KEYPAIR_LEN, other
                )))
            }
        };

        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Secret key in the text form used by key stores.
    pub fn to_secret_string(&self) -> Zeroizing<String> {
        let keypair = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(format!(
            "{}{}",
            ED25519_PREFIX,
            bs58::encode(keypair.as_slice()).into_string()
        ))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> ClientResult<()> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| ClientError::InvalidKey(format!("Invalid public key: {}", e)))?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &signature)
            .map_err(|e| ClientError::SignatureError(e.to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ED25519_PREFIX, bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim().strip_prefix(ED25519_PREFIX).unwrap_or(s.trim());
        let bytes = bs58::decode(body)
            .into_vec()
            .map_err(|e| ClientError::InvalidKey(format!("Invalid base58 public key: {}", e)))?;
        let array: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ClientError::InvalidKey(format!(
                "Invalid public key length: expected {}, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for PublicKey {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[ED25519_KEY_TYPE])?;
        writer.write_all(&self.0)
    }
}

/// Ed25519 signature bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl BorshSerialize for Signature {
    fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[ED25519_KEY_TYPE])?;
        writer.write_all(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signature({}{})",
            ED25519_PREFIX,
            bs58::encode(self.0).into_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_string_round_trips_through_keypair_form() {
        let original = KeyPair::generate();
        let encoded = original.to_secret_string();
        assert!(encoded.starts_with("ed25519:"));
        let restored = KeyPair::from_secret_str(&encoded).unwrap();
        assert_eq!(restored.public_key(), original.public_key());
    }

    #[test]
    fn seed_form_is_accepted() {
        let seed = [11u8; 32];
        let encoded = format!("ed25519:{}", bs58::encode(seed).into_string());
        let pair = KeyPair::from_secret_str(&encoded).unwrap();
        let expected = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
        assert_eq!(pair.public_key().as_bytes(), &expected);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            KeyPair::from_secret_str("ed25519:0OIl"),
            Err(ClientError::InvalidKey(_))
        ));
        assert!(matches!(
            KeyPair::from_secret_str("secp256k1:abc"),
            Err(ClientError::InvalidKey(_))
        ));
        let short = format!("ed25519:{}", bs58::encode([1u8; 10]).into_string());
        assert!(KeyPair::from_secret_str(&short).is_err());
    }

    #[test]
    fn mismatched_public_half_is_rejected() {
        let mut bytes = KeyPair::generate()
            .signing_key
            .to_keypair_bytes()
            .to_vec();
        bytes[40] ^= 0xFF;
        let encoded = format!("ed25519:{}", bs58::encode(bytes).into_string());
        assert!(KeyPair::from_secret_str(&encoded).is_err());
    }

    #[test]
    fn signatures_verify_against_public_key() {
        let pair = KeyPair::generate();
        let signature = pair.sign(b"payload");
        pair.public_key().verify(b"payload", &signature).unwrap();
        assert!(pair.public_key().verify(b"other", &signature).is_err());
    }

    #[test]
    fn public_key_text_form() {
        let key = KeyPair::generate().public_key();
        let parsed: PublicKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key));
    }
}

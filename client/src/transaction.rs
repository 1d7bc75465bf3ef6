//! Function-call transactions in the NEAR binary (borsh) layout.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};

use crate::errors::ClientResult;
use crate::keys::{PublicKey, Signature};
use crate::types::{AccountId, CryptoHash};

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct FunctionCallAction {
    pub method_name: String,
    pub args: Vec<u8>,
    pub gas: u64,
    pub deposit: u128,
}

/// Transaction actions this client submits, tagged with their chain discriminant.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Action {
    FunctionCall(FunctionCallAction) = 2,
}

impl Action {
    pub fn as_function_call(&self) -> Option<&FunctionCallAction> {
        match self {
            Action::FunctionCall(call) => Some(call),
        }
    }
}

impl From<FunctionCallAction> for Action {
    fn from(call: FunctionCallAction) -> Self {
        Action::FunctionCall(call)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct Transaction {
    pub signer_id: AccountId,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: AccountId,
    pub block_hash: CryptoHash,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn encode(&self) -> ClientResult<Vec<u8>> {
        Ok(borsh::to_vec(self)?)
    }

    /// SHA-256 of the encoded transaction; this is what gets signed.
    pub fn hash(&self) -> ClientResult<CryptoHash> {
        let digest = Sha256::digest(self.encode()?);
        Ok(CryptoHash(digest.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn encode(&self) -> ClientResult<Vec<u8>> {
        Ok(borsh::to_vec(self)?)
    }

    /// Base64 payload accepted by `broadcast_tx_commit`.
    pub fn to_base64(&self) -> ClientResult<String> {
        Ok(BASE64.encode(self.encode()?))
    }
}

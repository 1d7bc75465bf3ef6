use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientError {
    // Configuration errors
    UnknownEnvironment(String),
    MissingCredential(String),
    ValidationError(String),

    // Key errors
    InvalidKey(String),
    SignatureError(String),

    // Network errors
    NetworkError(String),
    ConnectionTimeout(String),
    InvalidResponse(String),
    ExecutionFailure(String),

    // Storage errors
    StorageError(String),
    FileNotFound(String),
    PermissionDenied(String),

    // Session errors
    NotConnected,
    AccountConstructionFailure(String),
    ContractBindFailure(String),
    MalformedMetadata(String),
    NoSigningAuthority(String),
    UnknownMethod(String),
    MethodKindMismatch(String),
    HandleInvalidated,

    // Generic errors
    Unknown(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::UnknownEnvironment(name) => write!(
                f,
                "Unknown network environment '{}': use production, development, betanet or local",
                name
            ),
            ClientError::MissingCredential(msg) => write!(f, "Missing credential: {}", msg),
            ClientError::ValidationError(msg) => write!(f, "Validation error: {}", msg),

            ClientError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            ClientError::SignatureError(msg) => write!(f, "Signature error: {}", msg),

            ClientError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ClientError::ConnectionTimeout(step) => {
                write!(f, "Timed out while {}; check the node URL and retry", step)
            }
            ClientError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ClientError::ExecutionFailure(msg) => {
                write!(f, "Transaction execution failed: {}", msg)
            }

            ClientError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            ClientError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            ClientError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),

            ClientError::NotConnected => write!(
                f,
                "Wallet is not connected: initialize the session before signing in or out"
            ),
            ClientError::AccountConstructionFailure(msg) => {
                write!(f, "Could not load account: {}", msg)
            }
            ClientError::ContractBindFailure(msg) => {
                write!(f, "Failed to bind contract: {}", msg)
            }
            ClientError::MalformedMetadata(msg) => {
                write!(f, "Malformed profile metadata: {}", msg)
            }
            ClientError::NoSigningAuthority(msg) => write!(
                f,
                "No signing authority for {}: sign in with the wallet first",
                msg
            ),
            ClientError::UnknownMethod(msg) => write!(f, "Unknown contract method: {}", msg),
            ClientError::MethodKindMismatch(msg) => {
                write!(f, "Contract method kind mismatch: {}", msg)
            }
            ClientError::HandleInvalidated => write!(
                f,
                "Contract handle belongs to a closed session; reconnect to get a fresh handle"
            ),

            ClientError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

pub type ClientResult<T> = Result<T, ClientError>;

// Helper macro for easy error creation
#[macro_export]
macro_rules! client_error {
    ($variant:ident, $msg:expr) => {
        $crate::errors::ClientError::$variant($msg.to_string())
    };
    ($variant:ident) => {
        $crate::errors::ClientError::$variant
    };
}

// Conversion helpers
impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => ClientError::FileNotFound(error.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                ClientError::PermissionDenied(error.to_string())
            }
            _ => ClientError::StorageError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::ValidationError(format!("JSON error: {}", error))
    }
}

impl From<url::ParseError> for ClientError {
    fn from(error: url::ParseError) -> Self {
        ClientError::ValidationError(format!("URL error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_builds_variants() {
        let err = client_error!(MissingCredential, "private key");
        assert_eq!(err, ClientError::MissingCredential("private key".into()));
        assert_eq!(client_error!(NotConnected), ClientError::NotConnected);
    }

    #[test]
    fn io_errors_map_to_storage_variants() {
        let err: ClientError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ClientError::FileNotFound(_)));
        let err: ClientError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, ClientError::StorageError(_)));
    }
}

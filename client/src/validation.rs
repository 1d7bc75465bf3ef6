use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ClientError, ClientResult};

const MIN_ACCOUNT_ID_LEN: usize = 2;
const MAX_ACCOUNT_ID_LEN: usize = 64;
const MAX_METHOD_NAME_LEN: usize = 256;
const MAX_PATH_LEN: usize = 2048;

static ACCOUNT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([a-z\d]+[\-_])*[a-z\d]+\.)*([a-z\d]+[\-_])*[a-z\d]+$")
        .expect("account id pattern is valid")
});

static METHOD_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("method name pattern is valid"));

// Common malicious patterns to block in redirect paths
static MALICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)data:text/html",
        r"(?i)vbscript:",
        r"(?i)onload=",
        r"(?i)onerror=",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("malicious pattern is valid"))
    .collect()
});

/// Input validation for identifiers and redirect paths handled by the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a NEAR account id (named or implicit).
    pub fn validate_account_id(&self, account_id: &str) -> ClientResult<()> {
        if account_id.len() < MIN_ACCOUNT_ID_LEN {
            return Err(ClientError::ValidationError(format!(
                "Account id '{}' is shorter than {} characters",
                account_id, MIN_ACCOUNT_ID_LEN
            )));
        }

        if account_id.len() > MAX_ACCOUNT_ID_LEN {
            return Err(ClientError::ValidationError(format!(
                "Account id exceeds {} characters",
                MAX_ACCOUNT_ID_LEN
            )));
        }

        if !ACCOUNT_ID_PATTERN.is_match(account_id) {
            return Err(ClientError::ValidationError(format!(
                "Account id '{}' contains invalid characters",
                account_id
            )));
        }

        Ok(())
    }

    /// Validate a contract method name.
    pub fn validate_method_name(&self, method: &str) -> ClientResult<()> {
        if method.is_empty() || method.len() > MAX_METHOD_NAME_LEN {
            return Err(ClientError::ValidationError(
                "Method name must be between 1 and 256 characters".to_string(),
            ));
        }

        if !METHOD_NAME_PATTERN.is_match(method) {
            return Err(ClientError::ValidationError(format!(
                "Method name '{}' is not a valid identifier",
                method
            )));
        }

        Ok(())
    }

    /// Validate an origin-relative path used as a redirect target.
    pub fn validate_redirect_path(&self, path: &str) -> ClientResult<()> {
        self.check_basic_security(path)?;

        if !path.starts_with('/') || path.starts_with("//") {
            return Err(ClientError::ValidationError(format!(
                "Redirect path '{}' must be relative to the app origin",
                path
            )));
        }

        if path.len() > MAX_PATH_LEN {
            return Err(ClientError::ValidationError(
                "Redirect path too long".to_string(),
            ));
        }

        Ok(())
    }

    fn check_basic_security(&self, input: &str) -> ClientResult<()> {
        if input.chars().any(|c| c.is_control()) {
            return Err(ClientError::ValidationError(
                "Input contains control characters".to_string(),
            ));
        }

        for pattern in MALICIOUS_PATTERNS.iter() {
            if pattern.is_match(input) {
                return Err(ClientError::ValidationError(
                    "Input contains potentially malicious content".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ids() {
        let validator = InputValidator::new();
        for valid in [
            "alice.testnet",
            "pnft.aerx.testnet",
            "aex_token.testnet",
            "a-b_c.near",
            "98793cd91a3f870fb126f66285808c7e094afcfc4eda8a970f6648cdf0dbd6de",
        ] {
            assert!(validator.validate_account_id(valid).is_ok(), "{valid}");
        }
        for invalid in ["a", "Alice.testnet", "alice..near", ".alice", "alice.", "bo b"] {
            assert!(validator.validate_account_id(invalid).is_err(), "{invalid}");
        }
        assert!(validator.validate_account_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn method_names() {
        let validator = InputValidator::new();
        assert!(validator.validate_method_name("ft_balance_of").is_ok());
        assert!(validator.validate_method_name("").is_err());
        assert!(validator.validate_method_name("drop table").is_err());
    }

    #[test]
    fn redirect_paths() {
        let validator = InputValidator::new();
        assert!(validator.validate_redirect_path("/account").is_ok());
        assert!(validator.validate_redirect_path("/").is_ok());
        assert!(validator.validate_redirect_path("account").is_err());
        assert!(validator.validate_redirect_path("//evil.example").is_err());
        assert!(validator
            .validate_redirect_path("/x?javascript:alert(1)")
            .is_err());
    }
}

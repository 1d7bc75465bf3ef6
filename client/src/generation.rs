//! Session generations.
//!
//! Every connection records the generation it was opened in. Signing out
//! advances the counter, so handles created earlier reject further calls
//! instead of acting on a stale account.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::{ClientError, ClientResult};

/// Shared session generation counter.
#[derive(Debug, Clone, Default)]
pub struct SessionGeneration {
    current: Arc<AtomicU64>,
}

impl SessionGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Token bound to the current generation.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            counter: Arc::clone(&self.current),
            issued: self.current(),
        }
    }

    /// Invalidate every token issued so far; returns the new generation.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Snapshot of the generation a connection belongs to.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    counter: Arc<AtomicU64>,
    issued: u64,
}

impl GenerationToken {
    /// Token that is never invalidated, for connections outside any session.
    pub fn detached() -> Self {
        SessionGeneration::new().token()
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.issued
    }

    pub fn ensure_current(&self) -> ClientResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(ClientError::HandleInvalidated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_invalidates_older_tokens() {
        let generation = SessionGeneration::new();
        let first = generation.token();
        assert!(first.ensure_current().is_ok());

        assert_eq!(generation.advance(), 1);
        assert_eq!(first.ensure_current(), Err(ClientError::HandleInvalidated));

        let second = generation.token();
        assert_eq!(second.issued(), 1);
        assert!(second.is_current());
    }

    #[test]
    fn clones_share_the_counter() {
        let generation = SessionGeneration::new();
        let token = generation.token();
        generation.clone().advance();
        assert!(!token.is_current());
    }
}

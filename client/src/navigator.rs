use std::fmt;

use parking_lot::Mutex;
use url::Url;

use crate::errors::ClientResult;

/// Hands redirect targets to whatever hosts the client.
pub trait Navigator: Send + Sync + fmt::Debug {
    fn navigate(&self, url: &Url) -> ClientResult<()>;
}

/// Navigator for headless hosts: logs each target and keeps the history.
#[derive(Debug, Default)]
pub struct LogNavigator {
    history: Mutex<Vec<Url>>,
}

impl LogNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Url> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<Url> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for LogNavigator {
    fn navigate(&self, url: &Url) -> ClientResult<()> {
        log::info!("Navigate to {}", url);
        self.history.lock().push(url.clone());
        Ok(())
    }
}

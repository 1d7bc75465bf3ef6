mod document;
pub mod keystore;
pub mod local;
pub mod paths;

pub use keystore::{FileKeyStore, InMemoryKeyStore, KeyStore};
pub use local::LocalStorage;
pub use paths::ClientPaths;

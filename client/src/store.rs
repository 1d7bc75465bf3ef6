//! Session store.
//!
//! The single place the rest of the application reads connection state from.
//! Writers are the orchestrator, the session manager and profile sync; the
//! store itself only records what they publish.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::connection::Connection;
use crate::contract::ContractHandle;
use crate::errors::ClientError;
use crate::manifest::ContractKind;
use crate::profile::ProfileView;
use crate::types::AccountId;
use crate::wallet::WalletConnection;

/// Lifecycle of a session as published to the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    ConnectingNetwork,
    SessionEstablished,
    /// Contracts published so far.
    LoadingContracts(BTreeSet<ContractKind>),
    Ready {
        signed_in: bool,
    },
    Failed(ClientError),
}

impl SessionPhase {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionPhase::Ready { .. })
    }
}

/// The four contract bindings, filled in as they load.
#[derive(Debug, Clone, Default)]
pub struct LoadedContracts {
    pub token: Option<ContractHandle>,
    pub exchange: Option<ContractHandle>,
    pub profile_user: Option<ContractHandle>,
    pub profile_service: Option<ContractHandle>,
}

impl LoadedContracts {
    pub fn get(&self, kind: ContractKind) -> Option<&ContractHandle> {
        self.slot(kind).as_ref()
    }

    pub fn insert(&mut self, handle: ContractHandle) {
        let kind = handle.kind();
        *self.slot_mut(kind) = Some(handle);
    }

    pub fn kinds(&self) -> BTreeSet<ContractKind> {
        ContractKind::ALL
            .into_iter()
            .filter(|kind| self.slot(*kind).is_some())
            .collect()
    }

    fn slot(&self, kind: ContractKind) -> &Option<ContractHandle> {
        match kind {
            ContractKind::Token => &self.token,
            ContractKind::Exchange => &self.exchange,
            ContractKind::ProfileUser => &self.profile_user,
            ContractKind::ProfileService => &self.profile_service,
        }
    }

    fn slot_mut(&mut self, kind: ContractKind) -> &mut Option<ContractHandle> {
        match kind {
            ContractKind::Token => &mut self.token,
            ContractKind::Exchange => &mut self.exchange,
            ContractKind::ProfileUser => &mut self.profile_user,
            ContractKind::ProfileService => &mut self.profile_service,
        }
    }
}

/// Point-in-time copy of everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub connection: Option<Connection>,
    pub wallet_session: Option<Arc<WalletConnection>>,
    pub account_id: Option<AccountId>,
    pub contracts: LoadedContracts,
    pub profile: Option<ProfileView>,
}

pub trait SessionStore: Send + Sync + fmt::Debug {
    fn snapshot(&self) -> SessionSnapshot;

    fn set_phase(&self, phase: SessionPhase);
    fn set_connection(&self, connection: Connection);
    fn remove_connection(&self);
    fn set_wallet_session(&self, wallet: Arc<WalletConnection>);
    fn remove_wallet_session(&self);
    fn set_account_id(&self, account_id: Option<AccountId>);
    /// Publish a handle into the slot for its kind.
    fn set_contract(&self, handle: ContractHandle);
    fn set_profile(&self, profile: Option<ProfileView>);
    /// Drop the whole session and return to `Uninitialized`.
    fn clear(&self);

    fn phase(&self) -> SessionPhase {
        self.snapshot().phase
    }

    fn connection(&self) -> Option<Connection> {
        self.snapshot().connection
    }

    fn wallet_session(&self) -> Option<Arc<WalletConnection>> {
        self.snapshot().wallet_session
    }

    fn account_id(&self) -> Option<AccountId> {
        self.snapshot().account_id
    }

    fn contract(&self, kind: ContractKind) -> Option<ContractHandle> {
        self.snapshot().contracts.get(kind).cloned()
    }

    fn profile(&self) -> Option<ProfileView> {
        self.snapshot().profile
    }
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<RwLock<SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    fn set_phase(&self, phase: SessionPhase) {
        log::debug!("Session phase -> {:?}", phase);
        self.state.write().phase = phase;
    }

    fn set_connection(&self, connection: Connection) {
        self.state.write().connection = Some(connection);
    }

    fn remove_connection(&self) {
        self.state.write().connection = None;
    }

    fn set_wallet_session(&self, wallet: Arc<WalletConnection>) {
        self.state.write().wallet_session = Some(wallet);
    }

    fn remove_wallet_session(&self) {
        self.state.write().wallet_session = None;
    }

    fn set_account_id(&self, account_id: Option<AccountId>) {
        self.state.write().account_id = account_id;
    }

    fn set_contract(&self, handle: ContractHandle) {
        self.state.write().contracts.insert(handle);
    }

    fn set_profile(&self, profile: Option<ProfileView>) {
        self.state.write().profile = profile;
    }

    fn clear(&self) {
        *self.state.write() = SessionSnapshot::default();
    }

    fn phase(&self) -> SessionPhase {
        self.state.read().phase.clone()
    }

    fn wallet_session(&self) -> Option<Arc<WalletConnection>> {
        self.state.read().wallet_session.clone()
    }

    fn account_id(&self) -> Option<AccountId> {
        self.state.read().account_id.clone()
    }

    fn contract(&self, kind: ContractKind) -> Option<ContractHandle> {
        self.state.read().contracts.get(kind).cloned()
    }
}

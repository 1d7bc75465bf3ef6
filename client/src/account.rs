use crate::connection::Connection;
use crate::errors::{ClientError, ClientResult};
use crate::rpc::AccountView;
use crate::signer::SignerAuthority;
use crate::transaction::{FunctionCallAction, SignedTransaction, Transaction};
use crate::types::AccountId;

/// An account reference on a connection.
///
/// A wallet session that has not completed sign-in yields an account without
/// an id; it can still run view calls but every state-changing call fails with
/// [`ClientError::NoSigningAuthority`].
#[derive(Debug, Clone)]
pub struct Account {
    account_id: Option<AccountId>,
    connection: Connection,
}

impl Account {
    pub fn new(connection: Connection, account_id: &str) -> ClientResult<Self> {
        let account_id = AccountId::new(account_id).map_err(|err| {
            ClientError::AccountConstructionFailure(format!(
                "'{}' is not a valid account: {}",
                account_id, err
            ))
        })?;
        Ok(Self::for_id(connection, account_id))
    }

    pub fn for_id(connection: Connection, account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            connection,
        }
    }

    pub fn unsigned(connection: Connection) -> Self {
        Self {
            account_id: None,
            connection,
        }
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn authority(&self) -> SignerAuthority {
        self.connection.signer().authority()
    }

    /// On-chain state of this account.
    pub async fn state(&self) -> ClientResult<AccountView> {
        let account_id = self.signing_account("viewing state")?;
        self.connection.provider().view_account(account_id).await
    }

    pub async fn view_function(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: &[u8],
    ) -> ClientResult<Vec<u8>> {
        self.connection.generation().ensure_current()?;
        self.connection
            .provider()
            .call_function(contract_id, method, args)
            .await
    }

    /// Sign and submit a single function call; returns the method's raw return value.
    pub async fn function_call(
        &self,
        contract_id: &AccountId,
        method: &str,
        args: Vec<u8>,
        gas: u64,
        deposit: u128,
    ) -> ClientResult<Vec<u8>> {
        self.connection.generation().ensure_current()?;
        let signer_id = self.signing_account(method)?;
        let network_id = self.connection.network_id();
        let signer = self.connection.signer();
        let public_key = signer
            .public_key(network_id, signer_id)?
            .ok_or_else(|| ClientError::NoSigningAuthority(signer_id.to_string()))?;

        let provider = self.connection.provider();
        let access_key = provider.view_access_key(signer_id, &public_key).await?;
        let block_hash = provider.latest_block_hash().await?;

        let transaction = Transaction {
            signer_id: signer_id.clone(),
            public_key,
            nonce: access_key.nonce + 1,
            receiver_id: contract_id.clone(),
            block_hash,
            actions: vec![FunctionCallAction {
                method_name: method.to_string(),
                args,
                gas,
                deposit,
            }
            .into()],
        };
        let hash = transaction.hash()?;
        let signature = signer.sign(hash.as_bytes(), network_id, signer_id)?;
        let signed = SignedTransaction {
            transaction,
            signature,
        };

        log::info!(
            "Submitting {}.{} signed by {} ({:?}), tx {}",
            contract_id,
            method,
            signer_id,
            signer.authority(),
            hash
        );
        provider
            .broadcast_tx_commit(&signed)
            .await?
            .into_return_value()
    }

    fn signing_account(&self, action: &str) -> ClientResult<&AccountId> {
        self.account_id.as_ref().ok_or_else(|| {
            ClientError::NoSigningAuthority(format!("{} (no signed-in account)", action))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::WalletSigner;
    use crate::storage::InMemoryKeyStore;
    use crate::testing::{self, MockProvider};
    use std::sync::Arc;

    fn connection(provider: MockProvider) -> Connection {
        testing::connection(
            Arc::new(provider),
            Arc::new(WalletSigner::new(Arc::new(InMemoryKeyStore::new()))),
        )
    }

    #[test]
    fn invalid_account_id_is_construction_failure() {
        let result = Account::new(connection(MockProvider::new()), "ALICE!");
        assert!(matches!(
            result,
            Err(ClientError::AccountConstructionFailure(_))
        ));
    }

    #[tokio::test]
    async fn state_requires_an_account() {
        let provider = MockProvider::new().with_account("alice.testnet");
        let connection = connection(provider);

        let unsigned = Account::unsigned(connection.clone());
        assert!(matches!(
            unsigned.state().await,
            Err(ClientError::NoSigningAuthority(_))
        ));

        let account = Account::new(connection, "alice.testnet").unwrap();
        assert_eq!(account.authority(), SignerAuthority::Wallet);
        assert_eq!(account.state().await.unwrap().amount, "1000");
    }

    #[tokio::test]
    async fn function_call_without_key_has_no_authority() {
        let account = Account::new(connection(MockProvider::new()), "alice.testnet").unwrap();
        let contract = AccountId::new("aerx-token.testnet").unwrap();
        let result = account
            .function_call(&contract, "claim_gift", b"{}".to_vec(), 1, 0)
            .await;
        assert!(matches!(result, Err(ClientError::NoSigningAuthority(_))));
    }
}

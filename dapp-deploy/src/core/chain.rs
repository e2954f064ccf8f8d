// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Connection to the blockchain node.

use alloy::{
    primitives::{Address, Bytes, TxHash},
    providers::Provider,
    rpc::types::TransactionRequest,
};

use crate::utils::color::DebugColor;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("pending transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error("tx reverted {}", .tx_hash.debug_red())]
    Reverted { tx_hash: TxHash },
    #[error("{0}")]
    Node(String),
}

/// The parts of a mined transaction receipt the deployment pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub transaction_hash: TxHash,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
}

/// Operations the deployment pipeline needs from a blockchain node.
#[allow(async_fn_in_trait)]
pub trait ChainConnector {
    /// Account used when a contract does not choose one.
    fn default_account(&self) -> Option<Address>;

    async fn get_accounts(&self) -> Result<Vec<Address>, ChainError>;

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError>;

    async fn get_gas_price(&self) -> Result<u128, ChainError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError>;

    /// Sends a transaction and waits for it to be mined.
    ///
    /// `on_hash` runs once the node accepts the transaction into its pool.
    async fn send_transaction(
        &self,
        tx: TransactionRequest,
        on_hash: impl FnOnce(TxHash) + Send,
    ) -> Result<ChainReceipt, ChainError>;
}

/// [`ChainConnector`] backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct AlloyConnector<P> {
    provider: P,
    default_account: Option<Address>,
}

impl<P: Provider> AlloyConnector<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            default_account: None,
        }
    }

    pub fn with_default_account(mut self, account: Address) -> Self {
        self.default_account = Some(account);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> ChainConnector for AlloyConnector<P> {
    fn default_account(&self) -> Option<Address> {
        self.default_account
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        Ok(self.provider.estimate_gas(tx.clone()).await?)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
        on_hash: impl FnOnce(TxHash) + Send,
    ) -> Result<ChainReceipt, ChainError> {
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(@grey, "sent deploy tx: {}", tx_hash.debug_lavender());
        on_hash(tx_hash);

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash });
        }
        Ok(ChainReceipt {
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
        })
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! In-memory chain for exercising the deployment pipeline without a node.

use std::collections::HashMap;

use alloy::{
    primitives::{Address, Bytes, TxHash, B256},
    rpc::types::TransactionRequest,
};
use parking_lot::Mutex;

use crate::core::chain::{ChainConnector, ChainError, ChainReceipt};

/// A call made against a [`MockChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    GetAccounts,
    GetCode(Address),
    GetGasPrice,
    EstimateGas,
    SendTransaction,
}

#[derive(Debug)]
struct MockState {
    accounts: Vec<Address>,
    default_account: Option<Address>,
    code: HashMap<Address, Bytes>,
    gas_price: Option<u128>,
    gas_estimate: u64,
    send_failure: Option<String>,
    deployments: u64,
    calls: Vec<ChainCall>,
    sent: Vec<TransactionRequest>,
}

/// Records every call and answers from configured values.
///
/// Every sent transaction is mined immediately at the next sequential address.
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new(accounts: impl IntoIterator<Item = Address>) -> Self {
        Self {
            state: Mutex::new(MockState {
                accounts: accounts.into_iter().collect(),
                default_account: None,
                code: HashMap::new(),
                gas_price: Some(1_000_000_000),
                gas_estimate: 21_000,
                send_failure: None,
                deployments: 0,
                calls: Vec::new(),
                sent: Vec::new(),
            }),
        }
    }

    pub fn with_default_account(self, account: Address) -> Self {
        self.state.lock().default_account = Some(account);
        self
    }

    pub fn with_code(self, address: Address, code: impl Into<Bytes>) -> Self {
        self.state.lock().code.insert(address, code.into());
        self
    }

    /// `None` makes gas price requests fail.
    pub fn with_gas_price(self, gas_price: Option<u128>) -> Self {
        self.state.lock().gas_price = gas_price;
        self
    }

    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.state.lock().gas_estimate = gas;
        self
    }

    /// Makes every transaction fail with `message`.
    pub fn failing_sends(self, message: impl Into<String>) -> Self {
        self.state.lock().send_failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.state.lock().calls.clone()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    /// Address the `n`th successful deployment (starting at 1) is mined at.
    pub fn deployment_address(n: u64) -> Address {
        Address::left_padding_from(&(0xd000 + n).to_be_bytes())
    }

    fn record(&self, call: ChainCall) {
        self.state.lock().calls.push(call);
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ChainConnector for MockChain {
    fn default_account(&self) -> Option<Address> {
        self.state.lock().default_account
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.record(ChainCall::GetAccounts);
        Ok(self.state.lock().accounts.clone())
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        self.record(ChainCall::GetCode(address));
        Ok(self
            .state
            .lock()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        self.record(ChainCall::GetGasPrice);
        self.state
            .lock()
            .gas_price
            .ok_or_else(|| ChainError::Node("gas price unavailable".to_owned()))
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, ChainError> {
        self.record(ChainCall::EstimateGas);
        Ok(self.state.lock().gas_estimate)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
        on_hash: impl FnOnce(TxHash) + Send,
    ) -> Result<ChainReceipt, ChainError> {
        self.record(ChainCall::SendTransaction);
        let mut state = self.state.lock();
        state.sent.push(tx.clone());
        if let Some(message) = &state.send_failure {
            return Err(ChainError::Node(message.clone()));
        }

        state.deployments += 1;
        let n = state.deployments;
        let address = Self::deployment_address(n);
        let transaction_hash = B256::left_padding_from(&n.to_be_bytes());
        let code = tx.input.input().cloned().unwrap_or_default();
        state.code.insert(address, code);
        let gas_used = tx.gas.unwrap_or(state.gas_estimate);
        drop(state);

        on_hash(transaction_hash);
        Ok(ChainReceipt {
            transaction_hash,
            contract_address: Some(address),
            gas_used,
        })
    }
}

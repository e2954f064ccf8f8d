// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Deciding whether a contract needs to be deployed.

use alloy::primitives::Address;

use crate::core::{
    chain::{ChainConnector, ChainError},
    contract::{Contract, ContractError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Deploy,
    AlreadyDeployed(Address),
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("{0}")]
    Contract(#[from] ContractError),
    #[error("{0}")]
    Chain(#[from] ChainError),
}

/// Decides what to do with `contract`, checking in order:
///
/// 1. `deploy: false` skips the contract.
/// 2. A pinned `address` is taken as deployed, without asking the chain.
/// 3. Without a tracked address the contract is deployed.
/// 4. `track: false` redeploys regardless of the chain.
/// 5. Otherwise the contract is deployed only if the tracked address holds no code.
pub async fn decide(
    contract: &Contract,
    chain: &impl ChainConnector,
) -> Result<Decision, DecisionError> {
    if !contract.deploy {
        return Ok(Decision::Skip);
    }
    if let Some(address) = contract.pinned_address()? {
        return Ok(Decision::AlreadyDeployed(address));
    }
    let Some(tracked) = contract.tracked_address else {
        return Ok(Decision::Deploy);
    };
    if !contract.track {
        return Ok(Decision::Deploy);
    }
    let code = chain.get_code(tracked).await?;
    if code.is_empty() {
        // stale address, e.g. the chain was reset
        debug!(@grey, "no code at tracked address {tracked} for {}", contract.class_name);
        Ok(Decision::Deploy)
    } else {
        Ok(Decision::AlreadyDeployed(tracked))
    }
}

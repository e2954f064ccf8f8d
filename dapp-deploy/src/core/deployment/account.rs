// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use alloy::primitives::Address;

use super::DeploymentError;
use crate::core::contract::Contract;

/// Picks the sending account: `from`, then `fromIndex`, then the default account, then the
/// first available account.
///
/// Both `from` and `fromIndex` must be valid when given, even though `from` wins.
pub fn select_account(
    contract: &Contract,
    accounts: &[Address],
    default_account: Option<Address>,
) -> Result<Address, DeploymentError> {
    let from = contract.from_address()?;
    let indexed = contract
        .from_index
        .map(|index| {
            accounts
                .get(index)
                .copied()
                .ok_or(DeploymentError::NoAccountAtIndex {
                    index,
                    available: accounts.len(),
                })
        })
        .transpose()?;
    if let Some(from) = from {
        if indexed.is_some() {
            warn!(@yellow, "both \"from\" and \"fromIndex\" are defined for contract \"{}\", using \"from\" as deployer account", contract.class_name);
        }
        return Ok(from);
    }
    if let Some(account) = indexed {
        return Ok(account);
    }
    default_account
        .or_else(|| accounts.first().copied())
        .ok_or(DeploymentError::NoDeploymentAccount)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    const A: Address = address!("00000000000000000000000000000000000000a0");
    const B: Address = address!("00000000000000000000000000000000000000b0");
    const DEFAULT: Address = address!("00000000000000000000000000000000000000df");
    const LITERAL: Address = address!("00000000000000000000000000000000000000ff");

    #[test]
    fn priority() {
        let mut contract = Contract::new("Token");
        assert_eq!(select_account(&contract, &[A, B], None).unwrap(), A);
        assert_eq!(select_account(&contract, &[A, B], Some(DEFAULT)).unwrap(), DEFAULT);

        contract.from_index = Some(1);
        assert_eq!(select_account(&contract, &[A, B], Some(DEFAULT)).unwrap(), B);

        contract.from = Some(LITERAL.to_string());
        assert_eq!(select_account(&contract, &[A, B], Some(DEFAULT)).unwrap(), LITERAL);
    }

    #[test]
    fn errors() {
        let mut contract = Contract::new("Token");
        assert!(matches!(
            select_account(&contract, &[], None),
            Err(DeploymentError::NoDeploymentAccount)
        ));

        contract.from_index = Some(5);
        assert!(matches!(
            select_account(&contract, &[A, B], Some(DEFAULT)),
            Err(DeploymentError::NoAccountAtIndex { index: 5, available: 2 })
        ));

        // an out of range index is an error even when `from` is set
        contract.from = Some(LITERAL.to_string());
        assert!(matches!(
            select_account(&contract, &[A, B], None),
            Err(DeploymentError::NoAccountAtIndex { index: 5, available: 2 })
        ));

        contract.from = Some("not an address".to_owned());
        assert!(matches!(
            select_account(&contract, &[A, B], None),
            Err(DeploymentError::Contract(_))
        ));
    }
}

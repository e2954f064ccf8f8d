// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Registry of known contracts, consulted for `$Name` arguments and library addresses.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::core::contract::ContractSnapshot;

pub trait ContractRegistry: Send + Sync {
    fn lookup(&self, class_name: &str) -> Option<ContractSnapshot>;

    fn list_all(&self) -> Vec<ContractSnapshot>;

    /// Records the latest view of a contract.
    ///
    /// A published address is never retracted by a later snapshot without one.
    fn publish(&self, snapshot: ContractSnapshot);
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    contracts: RwLock<BTreeMap<String, ContractSnapshot>>,
}

impl ContractRegistry for InMemoryRegistry {
    fn lookup(&self, class_name: &str) -> Option<ContractSnapshot> {
        self.contracts.read().get(class_name).cloned()
    }

    fn list_all(&self) -> Vec<ContractSnapshot> {
        self.contracts.read().values().cloned().collect()
    }

    fn publish(&self, mut snapshot: ContractSnapshot) {
        let mut contracts = self.contracts.write();
        if let Some(existing) = contracts.get(&snapshot.class_name) {
            snapshot.deployed_address = snapshot.deployed_address.or(existing.deployed_address);
            snapshot.transaction_hash = snapshot.transaction_hash.or(existing.transaction_hash);
        }
        contracts.insert(snapshot.class_name.clone(), snapshot);
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::core::contract::Contract;

    #[test]
    fn addresses_are_never_retracted() {
        let registry = InMemoryRegistry::default();
        let mut token = Contract::new("Token");
        registry.publish(token.snapshot());
        assert_eq!(registry.lookup("Token").unwrap().deployed_address, None);

        let deployed = address!("00000000000000000000000000000000000000aa");
        token.set_deployed(deployed, None);
        registry.publish(token.snapshot());
        registry.publish(Contract::new("Token").snapshot());
        assert_eq!(
            registry.lookup("Token").unwrap().deployed_address,
            Some(deployed)
        );
        assert!(registry.lookup("Missing").is_none());
        assert_eq!(registry.list_all().len(), 1);
    }
}

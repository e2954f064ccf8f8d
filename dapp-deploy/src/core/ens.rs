// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Resolution of ENS-style names used as constructor arguments.

use std::collections::HashMap;

use alloy::{
    primitives::{address, keccak256, Address, B256},
    providers::Provider,
    sol,
};

/// ENS registry deployed on mainnet and the public testnets.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0bFb2997BA6C7d2e1e");

/// Top level domains recognized as names.
const TLDS: &[&str] = &["eth", "xyz", "luxe", "kred", "reverse", "test"];

sol! {
    #[sol(rpc)]
    interface ENSRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface PublicResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NameError {
    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("no resolver set for {0}")]
    NoResolver(String),
    #[error("{0} does not resolve to an address")]
    Unresolved(String),
}

/// Resolves human readable names to addresses.
#[allow(async_fn_in_trait)]
pub trait NameResolver {
    /// Whether `value` should be treated as a name at all.
    fn is_name(&self, value: &str) -> bool {
        is_name(value)
    }

    async fn resolve(&self, name: &str) -> Result<Address, NameError>;
}

/// Whether `value` looks like a name under one of the known top level domains.
pub fn is_name(value: &str) -> bool {
    let Some((label, tld)) = value.rsplit_once('.') else {
        return false;
    };
    !label.is_empty()
        && !label.split('.').any(str::is_empty)
        && !value.chars().any(char::is_whitespace)
        && TLDS.iter().any(|known| tld.eq_ignore_ascii_case(known))
}

/// EIP-137 namehash of `name`.
pub fn namehash(name: &str) -> B256 {
    let name = name.to_lowercase();
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        node = keccak256([node.as_slice(), label_hash.as_slice()].concat());
    }
    node
}

/// Looks names up through the ENS registry of the connected chain.
#[derive(Debug, Clone)]
pub struct EnsResolver<P> {
    provider: P,
    registry: Address,
}

impl<P: Provider> EnsResolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_registry(provider, ENS_REGISTRY)
    }

    pub fn with_registry(provider: P, registry: Address) -> Self {
        Self { provider, registry }
    }
}

impl<P: Provider> NameResolver for EnsResolver<P> {
    async fn resolve(&self, name: &str) -> Result<Address, NameError> {
        let node = namehash(name);
        let registry = ENSRegistry::new(self.registry, &self.provider);
        let resolver = registry.resolver(node).call().await?;
        if resolver.is_zero() {
            return Err(NameError::NoResolver(name.to_owned()));
        }
        let address = PublicResolver::new(resolver, &self.provider)
            .addr(node)
            .call()
            .await?;
        if address.is_zero() {
            return Err(NameError::Unresolved(name.to_owned()));
        }
        Ok(address)
    }
}

/// Fixed table of names, for chains without ENS.
#[derive(Debug, Clone, Default)]
pub struct StaticNames(HashMap<String, Address>);

impl StaticNames {
    pub fn insert(&mut self, name: impl Into<String>, address: Address) {
        self.0.insert(name.into().to_lowercase(), address);
    }
}

impl<S: Into<String>> FromIterator<(S, Address)> for StaticNames {
    fn from_iter<I: IntoIterator<Item = (S, Address)>>(iter: I) -> Self {
        let mut names = Self::default();
        iter.into_iter()
            .for_each(|(name, address)| names.insert(name, address));
        names
    }
}

impl NameResolver for StaticNames {
    async fn resolve(&self, name: &str) -> Result<Address, NameError> {
        self.0
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| NameError::Unresolved(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;

    use super::*;

    #[test]
    fn recognizes_names() {
        assert!(is_name("vitalik.eth"));
        assert!(is_name("sub.domain.ETH"));
        assert!(is_name("status.xyz"));
        assert!(!is_name("eth"));
        assert!(!is_name(".eth"));
        assert!(!is_name("a..eth"));
        assert!(!is_name("1.5"));
        assert!(!is_name("hello world.eth"));
        assert!(!is_name("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn computes_namehash() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[tokio::test]
    async fn static_names() {
        let owner = address!("00000000000000000000000000000000000000aa");
        let names: StaticNames = [("Owner.eth", owner)].into_iter().collect();
        assert_eq!(names.resolve("owner.eth").await.unwrap(), owner);
        assert!(matches!(
            names.resolve("nobody.eth").await,
            Err(NameError::Unresolved(_))
        ));
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Constructor arguments and their resolution.
//!
//! Configuration expresses references to other contracts and to accounts as `$`-prefixed
//! strings (`$Token`, `$accounts[1]`). These are classified once, when the configuration is
//! read, into [`ContractArg`] variants. Plain strings stay literal; whether one is a name such
//! as `vitalik.eth` is up to the [`NameResolver`] used when the arguments are resolved into
//! concrete [`ResolvedArg`] values right before deployment.

use std::collections::{BTreeMap, HashMap};

use alloy::{json_abi::JsonAbi, primitives::Address};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::core::{
    ens::{NameError, NameResolver},
    registry::ContractRegistry,
};

/// A declared constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractArg {
    Literal(Value),
    /// `$accounts[N]`
    AccountRef(usize),
    /// `$Name`
    ContractRef(String),
    /// Array-typed parameter, resolved element by element.
    Sequence(Vec<ContractArg>),
}

impl ContractArg {
    fn classify(text: &str) -> Self {
        if let Some(symbol) = text.strip_prefix('$') {
            let index = symbol
                .strip_prefix("accounts[")
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|index| index.parse().ok());
            return match index {
                Some(index) => Self::AccountRef(index),
                None => Self::ContractRef(symbol.to_owned()),
            };
        }
        Self::Literal(Value::String(text.to_owned()))
    }

    /// The configuration form of this argument.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::AccountRef(index) => Value::String(format!("$accounts[{index}]")),
            Self::ContractRef(name) => Value::String(format!("${name}")),
            Self::Sequence(args) => Value::Array(args.iter().map(Self::to_value).collect()),
        }
    }

    /// Names of contracts this argument refers to, including nested ones.
    pub fn contract_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::ContractRef(name) => refs.push(name),
            Self::Sequence(args) => args.iter().for_each(|arg| arg.contract_refs(refs)),
            _ => {}
        }
    }

    fn string_literals<'a>(&'a self, literals: &mut Vec<&'a str>) {
        match self {
            Self::Literal(Value::String(text)) => literals.push(text),
            Self::Sequence(args) => args.iter().for_each(|arg| arg.string_literals(literals)),
            _ => {}
        }
    }
}

impl From<Value> for ContractArg {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::classify(&text),
            Value::Array(values) => Self::Sequence(values.into_iter().map(Self::from).collect()),
            value => Self::Literal(value),
        }
    }
}

impl From<&str> for ContractArg {
    fn from(text: &str) -> Self {
        Self::classify(text)
    }
}

impl<'de> Deserialize<'de> for ContractArg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for ContractArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Constructor arguments, either in declaration order or keyed by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArgs {
    Positional(Vec<ContractArg>),
    Named(BTreeMap<String, ContractArg>),
}

impl Default for ConstructorArgs {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl ConstructorArgs {
    /// Every argument, in no particular order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &ContractArg> + '_> {
        match self {
            Self::Positional(args) => Box::new(args.iter()),
            Self::Named(args) => Box::new(args.values()),
        }
    }

    /// Names of contracts referenced anywhere in the arguments.
    pub fn contract_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.iter().for_each(|arg| arg.contract_refs(&mut refs));
        refs
    }

    /// Puts the arguments in constructor order.
    ///
    /// Named parameters without a supplied value become empty strings so the argument count
    /// still matches the constructor.
    pub fn positional(&self, class_name: &str, abi: &JsonAbi) -> Vec<ContractArg> {
        let named = match self {
            Self::Positional(args) => return args.clone(),
            Self::Named(named) => named,
        };
        let Some(constructor) = &abi.constructor else {
            if !named.is_empty() {
                warn!(@yellow, "{class_name} has named arguments but no constructor");
            }
            return Vec::new();
        };
        constructor
            .inputs
            .iter()
            .map(|input| match named.get(&input.name) {
                Some(arg) => arg.clone(),
                None => {
                    error!(@red, "{} has not been defined for {class_name} constructor", input.name);
                    ContractArg::Literal(Value::String(String::new()))
                }
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for ConstructorArgs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::default()),
            Value::Array(values) => Ok(Self::Positional(
                values.into_iter().map(ContractArg::from).collect(),
            )),
            Value::Object(values) => Ok(Self::Named(
                values
                    .into_iter()
                    .map(|(name, value)| (name, ContractArg::from(value)))
                    .collect(),
            )),
            other => Err(D::Error::custom(format!(
                "constructor arguments must be a list or a map, got {other}"
            ))),
        }
    }
}

impl Serialize for ConstructorArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Positional(args) => args.serialize(serializer),
            Self::Named(args) => args.serialize(serializer),
        }
    }
}

/// A constructor argument with every symbolic reference replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedArg {
    Value(Value),
    Address(Address),
    Sequence(Vec<ResolvedArg>),
}

#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("no corresponding account at index {index} ({available} accounts available)")]
    NoAccountAtIndex { index: usize, available: usize },
    #[error("could not resolve {name}: {source}")]
    Name {
        name: String,
        #[source]
        source: NameError,
    },
}

/// Resolves the constructor arguments of a contract.
///
/// Either every argument resolves or an error is returned; nothing is partially resolved.
pub async fn resolve_arguments(
    class_name: &str,
    args: &ConstructorArgs,
    abi: &JsonAbi,
    accounts: &[Address],
    registry: &dyn ContractRegistry,
    names: &impl NameResolver,
) -> Result<Vec<ResolvedArg>, ArgumentError> {
    let args = args.positional(class_name, abi);

    let mut pending = Vec::new();
    args.iter().for_each(|arg| arg.string_literals(&mut pending));
    let mut resolved_names = HashMap::new();
    for name in pending {
        if resolved_names.contains_key(name) || !names.is_name(name) {
            continue;
        }
        let address = names
            .resolve(name)
            .await
            .map_err(|source| ArgumentError::Name {
                name: name.to_owned(),
                source,
            })?;
        debug!(@grey, "resolved {name} to {address}");
        resolved_names.insert(name.to_owned(), address);
    }

    let resolver = Resolver {
        class_name,
        accounts,
        registry,
        names: &resolved_names,
    };
    args.iter().map(|arg| resolver.resolve(arg)).collect()
}

struct Resolver<'a> {
    class_name: &'a str,
    accounts: &'a [Address],
    registry: &'a dyn ContractRegistry,
    names: &'a HashMap<String, Address>,
}

impl Resolver<'_> {
    fn resolve(&self, arg: &ContractArg) -> Result<ResolvedArg, ArgumentError> {
        match arg {
            ContractArg::Literal(Value::String(text)) => Ok(match self.names.get(text) {
                Some(address) => ResolvedArg::Address(*address),
                None => ResolvedArg::Value(Value::String(text.clone())),
            }),
            ContractArg::Literal(value) => Ok(ResolvedArg::Value(value.clone())),
            ContractArg::AccountRef(index) => self
                .accounts
                .get(*index)
                .map(|account| ResolvedArg::Address(*account))
                .ok_or(ArgumentError::NoAccountAtIndex {
                    index: *index,
                    available: self.accounts.len(),
                }),
            ContractArg::ContractRef(name) => {
                // Interfaces and undeployed contracts still need a well-formed address
                let address = match self.registry.lookup(name) {
                    Some(contract) => contract.deployed_address.unwrap_or(Address::ZERO),
                    None => {
                        warn!(@yellow, "{} refers to unknown contract {name}", self.class_name);
                        Address::ZERO
                    }
                };
                Ok(ResolvedArg::Address(address))
            }
            ContractArg::Sequence(args) => args
                .iter()
                .map(|arg| self.resolve(arg))
                .collect::<Result<_, _>>()
                .map(ResolvedArg::Sequence),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{json_abi::JsonAbi, primitives::address};
    use serde_json::json;

    use super::*;
    use crate::core::{
        contract::Contract,
        ens::{NameError, StaticNames},
        registry::InMemoryRegistry,
    };

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const BOB: Address = address!("00000000000000000000000000000000000000b0");
    const CAROL: Address = address!("00000000000000000000000000000000000000c0");
    const TOKEN: Address = address!("1111111111111111111111111111111111111111");
    const REGISTRAR: Address = address!("2222222222222222222222222222222222222222");

    fn accounts() -> Vec<Address> {
        vec![ALICE, BOB, CAROL]
    }

    fn registry() -> InMemoryRegistry {
        let registry = InMemoryRegistry::default();
        let mut token = Contract::new("Token");
        token.set_deployed(TOKEN, None);
        registry.publish(token.snapshot());
        registry.publish(Contract::new("NotYetDeployed").snapshot());
        registry
    }

    fn names() -> StaticNames {
        [("registrar.eth", REGISTRAR)].into_iter().collect()
    }

    fn args(value: serde_json::Value) -> ConstructorArgs {
        serde_json::from_value(value).unwrap()
    }

    async fn resolve(
        args: &ConstructorArgs,
        abi: &JsonAbi,
    ) -> Result<Vec<ResolvedArg>, ArgumentError> {
        resolve_arguments("Test", args, abi, &accounts(), &registry(), &names()).await
    }

    #[test]
    fn classifies_symbols() {
        assert_eq!(ContractArg::from("$accounts[2]"), ContractArg::AccountRef(2));
        assert_eq!(
            ContractArg::from("$Token"),
            ContractArg::ContractRef("Token".to_owned())
        );
        assert_eq!(
            ContractArg::from("$accounts[x]"),
            ContractArg::ContractRef("accounts[x]".to_owned())
        );
        assert_eq!(
            ContractArg::from("registrar.eth"),
            ContractArg::Literal(json!("registrar.eth"))
        );
        assert_eq!(
            ContractArg::from("hello"),
            ContractArg::Literal(json!("hello"))
        );
        assert_eq!(
            ContractArg::from(json!(["$Token", 1])),
            ContractArg::Sequence(vec![
                ContractArg::ContractRef("Token".to_owned()),
                ContractArg::Literal(json!(1)),
            ])
        );
    }

    #[tokio::test]
    async fn resolves_accounts() {
        let resolved = resolve(&args(json!(["$accounts[2]"])), &JsonAbi::default())
            .await
            .unwrap();
        assert_eq!(resolved, vec![ResolvedArg::Address(CAROL)]);

        let err = resolve(&args(json!(["$accounts[99]"])), &JsonAbi::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::NoAccountAtIndex {
                index: 99,
                available: 3
            }
        ));
    }

    #[tokio::test]
    async fn resolves_contracts() {
        let resolved = resolve(
            &args(json!(["$Token", "$NotYetDeployed", "$Missing", 7])),
            &JsonAbi::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedArg::Address(TOKEN),
                ResolvedArg::Address(Address::ZERO),
                ResolvedArg::Address(Address::ZERO),
                ResolvedArg::Value(json!(7)),
            ]
        );
    }

    #[tokio::test]
    async fn resolves_nested_sequences() {
        let resolved = resolve(
            &args(json!([["$Token", "$accounts[0]", "registrar.eth"], 100])),
            &JsonAbi::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedArg::Sequence(vec![
                    ResolvedArg::Address(TOKEN),
                    ResolvedArg::Address(ALICE),
                    ResolvedArg::Address(REGISTRAR),
                ]),
                ResolvedArg::Value(json!(100)),
            ]
        );
    }

    #[tokio::test]
    async fn unresolved_name_fails_everything() {
        let err = resolve(&args(json!(["$Token", "unknown.eth"])), &JsonAbi::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ArgumentError::Name { ref name, .. } if name == "unknown.eth"));
    }

    #[tokio::test]
    async fn repositions_named_arguments() {
        let abi: JsonAbi = serde_json::from_value(json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "initialValue", "type": "uint256" },
                { "name": "_addresses", "type": "address[]" },
                { "name": "owner", "type": "address" }
            ]
        }]))
        .unwrap();
        let named = args(json!({
            "_addresses": ["$Token", "$accounts[1]"],
            "initialValue": 123
        }));
        let resolved = resolve(&named, &abi).await.unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedArg::Value(json!(123)),
                ResolvedArg::Sequence(vec![
                    ResolvedArg::Address(TOKEN),
                    ResolvedArg::Address(BOB),
                ]),
                ResolvedArg::Value(json!("")),
            ]
        );
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let supplied = args(json!([["$Token", "$accounts[1]"], "registrar.eth", "$Missing"]));
        let first = resolve(&supplied, &JsonAbi::default()).await.unwrap();
        let second = resolve(&supplied, &JsonAbi::default()).await.unwrap();
        assert_eq!(first, second);
    }

    /// Names under a private suffix, resolved to a fixed address.
    struct LocalNames;

    impl NameResolver for LocalNames {
        fn is_name(&self, value: &str) -> bool {
            value.ends_with(".local")
        }

        async fn resolve(&self, name: &str) -> Result<Address, NameError> {
            match name {
                "printer.local" => Ok(REGISTRAR),
                _ => Err(NameError::Unresolved(name.to_owned())),
            }
        }
    }

    #[tokio::test]
    async fn resolver_decides_what_is_a_name() {
        let supplied = args(json!([["printer.local", "$Token"], "registrar.eth", "hello"]));
        let resolved = resolve_arguments(
            "Test",
            &supplied,
            &JsonAbi::default(),
            &accounts(),
            &registry(),
            &LocalNames,
        )
        .await
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedArg::Sequence(vec![
                    ResolvedArg::Address(REGISTRAR),
                    ResolvedArg::Address(TOKEN),
                ]),
                ResolvedArg::Value(json!("registrar.eth")),
                ResolvedArg::Value(json!("hello")),
            ]
        );

        let err = resolve_arguments(
            "Test",
            &args(json!(["scanner.local"])),
            &JsonAbi::default(),
            &accounts(),
            &registry(),
            &LocalNames,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ArgumentError::Name { ref name, .. } if name == "scanner.local"));
    }
}

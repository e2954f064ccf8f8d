// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Contract descriptors.
//!
//! A [`Contract`] carries the declared configuration of one contract (loaded from a compiled
//! artifact plus user configuration) together with the deployment state produced by the
//! [`Deployer`](crate::Deployer). Deployment state is only writable from inside this crate;
//! everyone else observes it through [`ContractSnapshot`].

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, TxHash},
};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{
    arguments::{ConstructorArgs, ResolvedArg},
    linker::LinkReferences,
};

/// Either a literal value or a request to determine the value on-chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Setting<T> {
    #[default]
    Auto,
    Fixed(T),
}

pub type GasSetting = Setting<u64>;
pub type GasPriceSetting = Setting<u128>;

impl<T: Copy> Setting<T> {
    pub fn fixed(&self) -> Option<T> {
        match self {
            Self::Auto => None,
            Self::Fixed(value) => Some(*value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSetting {
    Number(u64),
    Text(String),
}

impl<'de, T: FromStr + From<u64>> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSetting::deserialize(deserializer)? {
            RawSetting::Number(value) => Ok(Self::Fixed(T::from(value))),
            RawSetting::Text(text) if text.trim().eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            RawSetting::Text(text) => text.trim().parse().map(Self::Fixed).map_err(|_| {
                D::Error::custom(format!("expected a number or \"auto\", got {text:?}"))
            }),
        }
    }
}

impl<T: Display> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::Fixed(value) => serializer.collect_str(value),
        }
    }
}

/// Progress of a contract through the deployment pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployState {
    #[default]
    Pending,
    AccountResolved,
    ArgsResolved,
    Decided,
    Skipped,
    AlreadyDeployed,
    Linking,
    GasPriced,
    GasEstimated,
    Submitted,
    Confirmed,
    Failed,
}

impl DeployState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::AlreadyDeployed | Self::Confirmed | Self::Failed
        )
    }
}

impl Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::AccountResolved => "account resolved",
            Self::ArgsResolved => "arguments resolved",
            Self::Decided => "decided",
            Self::Skipped => "skipped",
            Self::AlreadyDeployed => "already deployed",
            Self::Linking => "linking",
            Self::GasPriced => "gas priced",
            Self::GasEstimated => "gas estimated",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{class_name}: malformed {field} address {value:?}")]
    MalformedAddress {
        class_name: String,
        field: &'static str,
        value: String,
    },
}

fn default_true() -> bool {
    true
}

/// Deployment configuration and state for a single contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub class_name: String,
    #[serde(default)]
    pub abi_definition: JsonAbi,
    /// Hex encoded creation bytecode, possibly containing link placeholders.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub args: ConstructorArgs,
    #[serde(default)]
    pub link_references: LinkReferences,
    /// When false the contract is never deployed.
    #[serde(default = "default_true")]
    pub deploy: bool,
    /// When false the contract is redeployed even if a tracked deployment exists.
    #[serde(default = "default_true")]
    pub track: bool,
    /// Address pinned in configuration; the contract is treated as deployed there.
    #[serde(default)]
    pub address: Option<String>,
    /// Address recorded by a previous run.
    #[serde(default)]
    pub tracked_address: Option<Address>,
    #[serde(default)]
    pub gas: Option<GasSetting>,
    #[serde(default)]
    pub gas_price: Option<GasPriceSetting>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub from_index: Option<usize>,
    #[serde(default)]
    pub silent: bool,
    /// Contracts that must finish before this one, beyond those implied by its arguments.
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(skip)]
    state: DeployState,
    #[serde(skip_deserializing)]
    real_args: Option<Vec<ResolvedArg>>,
    #[serde(skip_deserializing)]
    deployment_account: Option<Address>,
    #[serde(skip_deserializing)]
    deployed_address: Option<Address>,
    #[serde(skip_deserializing)]
    transaction_hash: Option<TxHash>,
    #[serde(skip_deserializing)]
    error: Option<String>,
}

impl Contract {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            abi_definition: JsonAbi::default(),
            code: String::new(),
            args: ConstructorArgs::default(),
            link_references: LinkReferences::new(),
            deploy: true,
            track: true,
            address: None,
            tracked_address: None,
            gas: None,
            gas_price: None,
            gas_limit: None,
            from: None,
            from_index: None,
            silent: false,
            depends_on: Vec::new(),
            state: DeployState::Pending,
            real_args: None,
            deployment_account: None,
            deployed_address: None,
            transaction_hash: None,
            error: None,
        }
    }

    /// Parses a contract descriptor from its JSON artifact form.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Arguments after symbolic references were resolved.
    pub fn real_args(&self) -> Option<&[ResolvedArg]> {
        self.real_args.as_deref()
    }

    pub fn deployment_account(&self) -> Option<Address> {
        self.deployment_account
    }

    pub fn deployed_address(&self) -> Option<Address> {
        self.deployed_address
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        self.transaction_hash
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The pinned `address`, if any.
    pub fn pinned_address(&self) -> Result<Option<Address>, ContractError> {
        self.parse_address("address", self.address.as_deref())
    }

    /// The literal `from` account, if any.
    pub fn from_address(&self) -> Result<Option<Address>, ContractError> {
        self.parse_address("from", self.from.as_deref())
    }

    fn parse_address(
        &self,
        field: &'static str,
        value: Option<&str>,
    ) -> Result<Option<Address>, ContractError> {
        value
            .map(|value| {
                value
                    .trim()
                    .parse::<Address>()
                    .map_err(|_| ContractError::MalformedAddress {
                        class_name: self.class_name.clone(),
                        field,
                        value: value.to_owned(),
                    })
            })
            .transpose()
    }

    pub fn snapshot(&self) -> ContractSnapshot {
        ContractSnapshot {
            class_name: self.class_name.clone(),
            abi_definition: self.abi_definition.clone(),
            code: self.code.clone(),
            deploy: self.deploy,
            state: self.state,
            real_args: self.real_args.clone(),
            deployment_account: self.deployment_account,
            deployed_address: self.deployed_address,
            transaction_hash: self.transaction_hash,
            error: self.error.clone(),
        }
    }

    pub(crate) fn set_state(&mut self, state: DeployState) {
        self.state = state;
    }

    /// Arguments are resolved once per run and never replaced afterwards.
    pub(crate) fn set_real_args(&mut self, args: Vec<ResolvedArg>) {
        if self.real_args.is_none() {
            self.real_args = Some(args);
        }
    }

    pub(crate) fn set_deployment_account(&mut self, account: Address) {
        self.deployment_account = Some(account);
    }

    pub(crate) fn set_deployed(&mut self, address: Address, tx_hash: Option<TxHash>) {
        self.deployed_address = Some(address);
        if tx_hash.is_some() {
            self.transaction_hash = tx_hash;
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.state = DeployState::Failed;
    }
}

/// Read-only view of a contract, shared with the registry, hooks, and event listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    pub class_name: String,
    pub abi_definition: JsonAbi,
    pub code: String,
    pub deploy: bool,
    pub state: DeployState,
    pub real_args: Option<Vec<ResolvedArg>>,
    pub deployment_account: Option<Address>,
    pub deployed_address: Option<Address>,
    pub transaction_hash: Option<TxHash>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::core::arguments::ContractArg;

    #[test]
    fn parses_artifact() {
        let contract = Contract::from_json_str(
            r#"{
                "className": "Token",
                "code": "6080",
                "args": [1000, "$Owner", "$accounts[1]"],
                "gas": "auto",
                "gasPrice": "20000000000",
                "fromIndex": 1,
                "trackedAddress": "0x00000000000000000000000000000000000000aa"
            }"#,
        )
        .unwrap();
        assert_eq!(contract.class_name, "Token");
        assert!(contract.deploy);
        assert!(contract.track);
        assert_eq!(contract.gas, Some(Setting::Auto));
        assert_eq!(contract.gas_price, Some(Setting::Fixed(20_000_000_000)));
        assert_eq!(contract.from_index, Some(1));
        assert_eq!(
            contract.tracked_address,
            Some(address!("00000000000000000000000000000000000000aa"))
        );
        assert_eq!(
            contract.args,
            ConstructorArgs::Positional(vec![
                ContractArg::Literal(1000.into()),
                ContractArg::ContractRef("Owner".to_owned()),
                ContractArg::AccountRef(1),
            ])
        );
        assert_eq!(contract.state(), DeployState::Pending);
        assert!(contract.real_args().is_none());
    }

    #[test]
    fn gas_settings() {
        let gas: GasSetting = serde_json::from_str("21000").unwrap();
        assert_eq!(gas, Setting::Fixed(21_000));
        let gas: GasSetting = serde_json::from_str("\"AUTO\"").unwrap();
        assert_eq!(gas, Setting::Auto);
        assert!(serde_json::from_str::<GasSetting>("\"lots\"").is_err());
        assert_eq!(serde_json::to_string(&Setting::Fixed(5u64)).unwrap(), "\"5\"");
    }

    #[test]
    fn malformed_addresses() {
        let mut contract = Contract::new("Token");
        contract.address = Some("0x1234".to_owned());
        assert!(matches!(
            contract.pinned_address(),
            Err(ContractError::MalformedAddress { field: "address", .. })
        ));
        contract.from = Some("0x00000000000000000000000000000000000000AA".to_owned());
        assert_eq!(
            contract.from_address().unwrap(),
            Some(address!("00000000000000000000000000000000000000aa"))
        );
    }

    #[test]
    fn real_args_are_written_once() {
        let mut contract = Contract::new("Token");
        contract.set_real_args(vec![ResolvedArg::Address(Address::ZERO)]);
        contract.set_real_args(vec![]);
        assert_eq!(
            contract.real_args(),
            Some(&[ResolvedArg::Address(Address::ZERO)][..])
        );
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Deployment of a single contract.
//!
//! The [`Deployer`] walks a [`Contract`] through account selection, argument resolution, the
//! deploy decision, linking, gas pricing and estimation, submission and receipt handling,
//! recording each step in the contract's [`DeployState`].

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::{
    core::{
        arguments::{resolve_arguments, ArgumentError},
        chain::{ChainConnector, ChainError},
        config::DeployerConfig,
        contract::{Contract, ContractError, DeployState, Setting},
        decision::{decide, Decision, DecisionError},
        ens::NameResolver,
        events::{DeployEvent, EventSender},
        hooks::{DeployParams, HookError, Hooks},
        linker::{link, LinkError},
        registry::{ContractRegistry, InMemoryRegistry},
    },
    utils::{color::DebugColor, format_cost, format_gas},
};
use gas::GasMargin;
use request::{DeploymentRequest, RequestError};

mod account;
pub mod gas;
pub mod request;

const UNDERPRICED: &str = "replacement transaction underpriced";

/// Where a deployment error falls in the failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input detected before talking to the chain.
    Configuration,
    /// A symbolic argument, library or dependency has no address.
    Resolution,
    /// The node could not answer.
    Chain,
    /// The deployment transaction itself failed.
    Transaction,
}

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("{0}")]
    Contract(#[from] ContractError),
    #[error("no corresponding account at index {index} ({available} accounts available)")]
    NoAccountAtIndex { index: usize, available: usize },
    #[error("no deployment account available")]
    NoDeploymentAccount,
    #[error("{0}")]
    Arguments(#[from] ArgumentError),
    #[error("{0}")]
    Link(#[from] LinkError),
    #[error("{0}")]
    Request(#[from] RequestError),
    #[error("{0}")]
    Hook(#[from] HookError),

    #[error("could not get the gas price: {0}")]
    GasPrice(#[source] ChainError),
    #[error("estimated gas {estimate} exceeds the gas limit {limit}")]
    GasLimitExceeded { estimate: u64, limit: u64 },
    #[error("{0}")]
    Chain(#[from] ChainError),

    #[error("{0}")]
    Transaction(#[source] ChainError),
    #[error("receipt of tx {} has no contract address", .tx_hash.debug_red())]
    MissingContractAddress { tx_hash: TxHash },

    #[error("dependency {dependency} failed to deploy")]
    DependencyFailed { dependency: String },
    #[error("previous deployment failed: {message}")]
    PreviouslyFailed { message: String },
    #[error("deployment was already submitted and did not complete")]
    AlreadySubmitted,
}

impl DeploymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Contract(_)
            | Self::NoAccountAtIndex { .. }
            | Self::NoDeploymentAccount
            | Self::Request(_)
            | Self::Hook(_)
            | Self::PreviouslyFailed { .. }
            | Self::AlreadySubmitted => ErrorKind::Configuration,
            Self::Arguments(_) | Self::Link(_) | Self::DependencyFailed { .. } => {
                ErrorKind::Resolution
            }
            Self::GasPrice(_) | Self::GasLimitExceeded { .. } | Self::Chain(_) => ErrorKind::Chain,
            Self::Transaction(_) | Self::MissingContractAddress { .. } => ErrorKind::Transaction,
        }
    }
}

impl From<DecisionError> for DeploymentError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::Contract(err) => Self::Contract(err),
            DecisionError::Chain(err) => Self::Chain(err),
        }
    }
}

/// A mined deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub class_name: String,
    pub contract_address: Address,
    pub transaction_hash: TxHash,
    pub gas_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Skipped,
    AlreadyDeployed { address: Address },
    Confirmed(DeploymentReceipt),
}

impl DeployOutcome {
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Skipped => None,
            Self::AlreadyDeployed { address } => Some(*address),
            Self::Confirmed(receipt) => Some(receipt.contract_address),
        }
    }
}

/// Deploys contracts against a chain.
#[derive(TypedBuilder)]
pub struct Deployer<C, N> {
    chain: C,
    names: N,
    #[builder(default = Arc::new(InMemoryRegistry::default()) as Arc<dyn ContractRegistry>)]
    registry: Arc<dyn ContractRegistry>,
    #[builder(default)]
    config: DeployerConfig,
    #[builder(default)]
    hooks: Hooks,
    #[builder(default)]
    events: EventSender,
    #[builder(default)]
    gas_margin: GasMargin,
}

impl<C: ChainConnector, N: NameResolver> Deployer<C, N> {
    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    pub fn registry(&self) -> &Arc<dyn ContractRegistry> {
        &self.registry
    }

    /// Deploys `contract` unless it is skipped or already deployed.
    ///
    /// Failures are recorded on the contract and announced with [`DeployEvent::Error`] before
    /// being returned. A contract that already reached a terminal state is not deployed again.
    pub async fn deploy(&self, contract: &mut Contract) -> Result<DeployOutcome, DeploymentError> {
        match contract.state() {
            DeployState::Pending => {}
            DeployState::Failed => {
                return Err(DeploymentError::PreviouslyFailed {
                    message: contract.error().unwrap_or_default().to_owned(),
                })
            }
            DeployState::Submitted => return Err(DeploymentError::AlreadySubmitted),
            state if state.is_terminal() => {
                return Ok(match (state, contract.deployed_address()) {
                    (DeployState::Skipped, _) | (_, None) => DeployOutcome::Skipped,
                    (_, Some(address)) => DeployOutcome::AlreadyDeployed { address },
                });
            }
            // interrupted before anything was sent
            _ => contract.set_state(DeployState::Pending),
        }

        match self.run(contract).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.fail(contract, &err);
                Err(err)
            }
        }
    }

    /// Marks `contract` as failed because `dependency` did not deploy.
    pub(crate) fn fail_dependency(
        &self,
        contract: &mut Contract,
        dependency: &str,
    ) -> DeploymentError {
        let err = DeploymentError::DependencyFailed {
            dependency: dependency.to_owned(),
        };
        self.fail(contract, &err);
        err
    }

    async fn run(&self, contract: &mut Contract) -> Result<DeployOutcome, DeploymentError> {
        if !contract.deploy {
            return Ok(self.skip(contract));
        }
        contract.pinned_address()?;
        contract.from_address()?;

        let accounts = self.chain.get_accounts().await?;
        let account = account::select_account(contract, &accounts, self.chain.default_account())?;
        contract.set_deployment_account(account);
        contract.set_state(DeployState::AccountResolved);

        let args = resolve_arguments(
            &contract.class_name,
            &contract.args,
            &contract.abi_definition,
            &accounts,
            self.registry.as_ref(),
            &self.names,
        )
        .await?;
        contract.set_real_args(args);
        contract.set_state(DeployState::ArgsResolved);

        if !self.hooks.should_deploy(&contract.snapshot()).await {
            return Ok(self.skip(contract));
        }
        let decision = decide(contract, &self.chain).await?;
        contract.set_state(DeployState::Decided);
        match decision {
            Decision::Skip => Ok(self.skip(contract)),
            Decision::AlreadyDeployed(address) => Ok(self.already_deployed(contract, address)),
            Decision::Deploy => self.submit(contract, account).await,
        }
    }

    fn skip(&self, contract: &mut Contract) -> DeployOutcome {
        contract.set_state(DeployState::Skipped);
        progress!(contract.silent, @grey, "{} will not be deployed", contract.class_name);
        let snapshot = contract.snapshot();
        self.registry.publish(snapshot.clone());
        self.events.emit(DeployEvent::Undeployed(snapshot));
        DeployOutcome::Skipped
    }

    fn already_deployed(&self, contract: &mut Contract, address: Address) -> DeployOutcome {
        contract.set_deployed(address, None);
        contract.set_state(DeployState::AlreadyDeployed);
        progress!(
            contract.silent,
            @grey,
            "{} already deployed at {}",
            contract.class_name,
            address.debug_mint()
        );
        let snapshot = contract.snapshot();
        self.registry.publish(snapshot.clone());
        self.events.emit(DeployEvent::Deployed(snapshot.clone()));
        self.events.emit(DeployEvent::GenerateBindings(snapshot));
        DeployOutcome::AlreadyDeployed { address }
    }

    async fn submit(
        &self,
        contract: &mut Contract,
        account: Address,
    ) -> Result<DeployOutcome, DeploymentError> {
        contract.set_state(DeployState::Linking);
        if !contract.link_references.is_empty() {
            contract.code = link(
                &contract.class_name,
                &contract.code,
                &contract.link_references,
                self.registry.as_ref(),
            )?;
        }

        let params = DeployParams {
            code: contract.code.clone(),
            gas: contract.gas.unwrap_or(self.config.gas),
            gas_price: contract.gas_price.unwrap_or(self.config.gas_price),
            from: account,
        };
        let params = self
            .hooks
            .before_deploy(&contract.snapshot(), params)
            .await?;
        contract.set_deployment_account(params.from);

        let gas_price = match params.gas_price {
            Setting::Fixed(gas_price) => gas_price,
            Setting::Auto => self
                .chain
                .get_gas_price()
                .await
                .map_err(DeploymentError::GasPrice)?,
        };
        contract.gas_price = Some(Setting::Fixed(gas_price));
        contract.set_state(DeployState::GasPriced);

        let request = DeploymentRequest::new(
            &contract.class_name,
            params.from,
            &params.code,
            &contract.abi_definition,
            contract.real_args().unwrap_or_default(),
        )?
        .with_gas_price(gas_price);
        let gas = match params.gas {
            Setting::Fixed(gas) => gas,
            Setting::Auto => self.estimate(contract, &request).await?,
        };
        contract.gas = Some(Setting::Fixed(gas));
        contract.set_state(DeployState::GasEstimated);

        let silent = contract.silent;
        let class_name = contract.class_name.clone();
        let cost = U256::from(gas) * U256::from(gas_price);
        contract.set_state(DeployState::Submitted);
        let receipt = request
            .with_gas(gas)
            .exec(&self.chain, move |tx_hash| {
                progress!(
                    silent,
                    @grey,
                    "deploying {} with {} at {} wei gas price, estimated cost {} (tx hash {})",
                    class_name,
                    format_gas(gas.into()),
                    gas_price,
                    format_cost(cost),
                    tx_hash.debug_lavender()
                );
            })
            .await
            .map_err(DeploymentError::Transaction)?;
        let address = receipt
            .contract_address
            .ok_or(DeploymentError::MissingContractAddress {
                tx_hash: receipt.transaction_hash,
            })?;

        contract.set_deployed(address, Some(receipt.transaction_hash));
        contract.set_state(DeployState::Confirmed);
        progress!(
            contract.silent,
            @mint,
            "{} deployed at {} using {} gas (tx hash {})",
            contract.class_name,
            address,
            receipt.gas_used,
            receipt.transaction_hash
        );

        let receipt = DeploymentReceipt {
            class_name: contract.class_name.clone(),
            contract_address: address,
            transaction_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used,
        };
        let snapshot = contract.snapshot();
        self.registry.publish(snapshot.clone());
        self.events.emit(DeployEvent::Receipt(receipt.clone()));
        self.events.emit(DeployEvent::Deployed(snapshot.clone()));
        self.events.emit(DeployEvent::GenerateBindings(snapshot.clone()));
        self.hooks.after_deploy(&snapshot).await;
        Ok(DeployOutcome::Confirmed(receipt))
    }

    /// Estimates gas and applies the safety margin, capped at the gas limit.
    async fn estimate(
        &self,
        contract: &Contract,
        request: &DeploymentRequest,
    ) -> Result<u64, DeploymentError> {
        let estimate = request.estimate_gas(&self.chain).await?;
        let limit = contract.gas_limit.or(self.config.gas_limit);
        if let Some(limit) = limit {
            if estimate > limit {
                return Err(DeploymentError::GasLimitExceeded { estimate, limit });
            }
        }
        let gas = self
            .gas_margin
            .apply(estimate, self.config.max_gas_margin_bps);
        debug!(@grey, "estimated {estimate} gas for {}, sending {gas}", contract.class_name);
        Ok(limit.map_or(gas, |limit| gas.min(limit)))
    }

    fn fail(&self, contract: &mut Contract, err: &DeploymentError) {
        let message = format!("error deploying {}: {err}", contract.class_name);
        error!(@red, "{message}");
        if message.contains(UNDERPRICED) {
            warn!(@yellow, "a previous transaction from this account is still pending; wait for it to be mined or raise the gas price");
        }
        contract.set_error(message.clone());
        self.registry.publish(contract.snapshot());
        self.events.emit(DeployEvent::Error {
            class_name: contract.class_name.clone(),
            message,
        });
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Tools for deploying Ethereum smart contracts.
//!
//! The [`Deployer`] drives a single [`Contract`] descriptor through account selection, symbolic
//! argument resolution, the deploy/skip decision, library linking, gas pricing and estimation,
//! and transaction submission. [`DeploymentPlan`] orders a set of descriptors by their
//! dependencies and runs them through a deployer one by one.

#[macro_use]
mod macros;

pub mod core;
pub(crate) mod error;
pub mod utils;

pub use crate::core::{
    arguments::{ConstructorArgs, ContractArg, ResolvedArg},
    chain::{AlloyConnector, ChainConnector, ChainReceipt},
    config::DeployerConfig,
    contract::{Contract, ContractSnapshot, DeployState, GasPriceSetting, GasSetting, Setting},
    deployment::{DeployOutcome, Deployer, DeploymentError, DeploymentReceipt, ErrorKind},
    ens::{EnsResolver, NameResolver, StaticNames},
    events::{DeployEvent, EventSender},
    hooks::{DeployHook, DeployParams, HookError, Hooks},
    plan::{deploy_all, DeploymentPlan, DeploymentReport, PlanError, ReportEntry},
    registry::{ContractRegistry, InMemoryRegistry},
};
pub use error::{Error, Result};

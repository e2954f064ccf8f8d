// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Extension points around a deployment.
//!
//! Hooks run in registration order. A hook only sees a [`ContractSnapshot`] and can only change
//! the [`DeployParams`] handed to it; deployment state stays with the deployer.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::core::contract::{ContractSnapshot, GasPriceSetting, GasSetting};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Parameters of the deployment transaction that hooks may adjust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    /// Linked, hex encoded creation code.
    pub code: String,
    pub gas: GasSetting,
    pub gas_price: GasPriceSetting,
    pub from: Address,
}

#[async_trait]
pub trait DeployHook: Send + Sync {
    /// Returning false skips the contract, whatever its configuration says.
    async fn should_deploy(&self, _contract: &ContractSnapshot) -> Result<bool, HookError> {
        Ok(true)
    }

    /// Runs after linking, before the gas price is fetched.
    async fn before_deploy(
        &self,
        _contract: &ContractSnapshot,
        params: DeployParams,
    ) -> Result<DeployParams, HookError> {
        Ok(params)
    }

    /// Runs once the deployment transaction is mined.
    async fn after_deploy(&self, _contract: &ContractSnapshot) -> Result<(), HookError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Hooks(Vec<Arc<dyn DeployHook>>);

impl Hooks {
    pub fn register(&mut self, hook: impl DeployHook + 'static) {
        self.0.push(Arc::new(hook));
    }

    pub fn with(mut self, hook: impl DeployHook + 'static) -> Self {
        self.register(hook);
        self
    }

    /// A failing hook counts as a vote against deploying.
    pub(crate) async fn should_deploy(&self, contract: &ContractSnapshot) -> bool {
        for hook in &self.0 {
            match hook.should_deploy(contract).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(@grey, "{} deploy condition returned false; contract will not deploy", contract.class_name);
                    return false;
                }
                Err(err) => {
                    error!(@red, "{} deploy condition has an error; contract will not deploy: {err}", contract.class_name);
                    return false;
                }
            }
        }
        true
    }

    pub(crate) async fn before_deploy(
        &self,
        contract: &ContractSnapshot,
        mut params: DeployParams,
    ) -> Result<DeployParams, HookError> {
        for hook in &self.0 {
            params = hook.before_deploy(contract, params).await?;
        }
        Ok(params)
    }

    /// Failures are reported but do not undo the deployment.
    pub(crate) async fn after_deploy(&self, contract: &ContractSnapshot) {
        for hook in &self.0 {
            if let Err(err) = hook.after_deploy(contract).await {
                warn!(@yellow, "post-deploy action for {} failed: {err}", contract.class_name);
            }
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").field("len", &self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::core::contract::{Contract, Setting};

    struct Deny;

    #[async_trait]
    impl DeployHook for Deny {
        async fn should_deploy(&self, _contract: &ContractSnapshot) -> Result<bool, HookError> {
            Ok(false)
        }
    }

    struct Broken;

    #[async_trait]
    impl DeployHook for Broken {
        async fn should_deploy(&self, _contract: &ContractSnapshot) -> Result<bool, HookError> {
            Err(HookError::new("condition does not evaluate"))
        }

        async fn after_deploy(&self, _contract: &ContractSnapshot) -> Result<(), HookError> {
            Err(HookError::new("on deploy failed"))
        }
    }

    struct SetGas(u64, Arc<Mutex<Vec<u64>>>);

    #[async_trait]
    impl DeployHook for SetGas {
        async fn before_deploy(
            &self,
            _contract: &ContractSnapshot,
            mut params: DeployParams,
        ) -> Result<DeployParams, HookError> {
            self.1.lock().push(self.0);
            params.gas = Setting::Fixed(self.0);
            Ok(params)
        }
    }

    fn params() -> DeployParams {
        DeployParams {
            code: "6080".to_owned(),
            gas: Setting::Auto,
            gas_price: Setting::Auto,
            from: Address::ZERO,
        }
    }

    #[tokio::test]
    async fn deploys_without_hooks() {
        let snapshot = Contract::new("Token").snapshot();
        let hooks = Hooks::default();
        assert!(hooks.should_deploy(&snapshot).await);
        assert_eq!(hooks.before_deploy(&snapshot, params()).await.unwrap(), params());
    }

    #[tokio::test]
    async fn any_refusal_skips() {
        let snapshot = Contract::new("Token").snapshot();
        assert!(!Hooks::default().with(Deny).should_deploy(&snapshot).await);
        assert!(!Hooks::default().with(Broken).should_deploy(&snapshot).await);
    }

    #[tokio::test]
    async fn before_deploy_runs_in_order() {
        let snapshot = Contract::new("Token").snapshot();
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks = Hooks::default()
            .with(SetGas(100, order.clone()))
            .with(SetGas(200, order.clone()));
        let params = hooks.before_deploy(&snapshot, params()).await.unwrap();
        assert_eq!(params.gas, Setting::Fixed(200));
        assert_eq!(*order.lock(), vec![100, 200]);
    }

    #[tokio::test]
    async fn after_deploy_failures_are_tolerated() {
        let snapshot = Contract::new("Token").snapshot();
        Hooks::default().with(Broken).after_deploy(&snapshot).await;
    }
}

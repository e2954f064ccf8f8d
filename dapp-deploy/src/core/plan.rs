// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Deploying a set of contracts in dependency order.
//!
//! A contract depends on every contract it names in its arguments (`$Name`), every library in
//! its link references, and everything listed in `dependsOn`. Dependencies are deployed first;
//! when one fails, everything depending on it fails without contacting the chain.

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use crate::core::{
    chain::ChainConnector,
    contract::Contract,
    deployment::{DeployOutcome, Deployer, DeploymentError},
    ens::NameResolver,
};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("contract {0} is defined more than once")]
    Duplicate(String),
    #[error("{contract} depends on {dependency}, which is not defined")]
    UnknownDependency { contract: String, dependency: String },
    #[error("circular dependency between {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// Contracts ordered so that each comes after its dependencies.
#[derive(Debug)]
pub struct DeploymentPlan {
    contracts: Vec<Contract>,
    dependencies: Vec<BTreeSet<usize>>,
    order: Vec<usize>,
}

impl DeploymentPlan {
    /// Orders `contracts`, keeping the given order between independent contracts.
    pub fn new(contracts: Vec<Contract>) -> Result<Self, PlanError> {
        let mut index = HashMap::new();
        for (i, contract) in contracts.iter().enumerate() {
            if index.insert(contract.class_name.as_str(), i).is_some() {
                return Err(PlanError::Duplicate(contract.class_name.clone()));
            }
        }

        let mut dependencies = vec![BTreeSet::new(); contracts.len()];
        for (i, contract) in contracts.iter().enumerate() {
            for name in &contract.depends_on {
                let j = index
                    .get(name.as_str())
                    .ok_or_else(|| PlanError::UnknownDependency {
                        contract: contract.class_name.clone(),
                        dependency: name.clone(),
                    })?;
                dependencies[i].insert(*j);
            }
            // unknown references are left to argument resolution and linking
            let libraries = contract
                .link_references
                .values()
                .flat_map(|libraries| libraries.keys().map(String::as_str));
            for name in contract.args.contract_refs().into_iter().chain(libraries) {
                if let Some(j) = index.get(name) {
                    dependencies[i].insert(*j);
                }
            }
            dependencies[i].remove(&i);
        }

        let mut placed = vec![false; contracts.len()];
        let mut order = Vec::with_capacity(contracts.len());
        while order.len() < contracts.len() {
            let next = (0..contracts.len())
                .find(|&i| !placed[i] && dependencies[i].iter().all(|&j| placed[j]));
            let Some(i) = next else {
                let stuck = (0..contracts.len())
                    .filter(|&i| !placed[i])
                    .map(|i| contracts[i].class_name.clone())
                    .collect();
                return Err(PlanError::Cycle(stuck));
            };
            placed[i] = true;
            order.push(i);
        }

        Ok(Self {
            contracts,
            dependencies,
            order,
        })
    }

    /// Orders the contracts of a JSON array of artifacts.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let contracts: Vec<Contract> = serde_json::from_str(text)?;
        Ok(Self::new(contracts)?)
    }

    /// Loads a JSON array of artifacts from a file.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Class names in deployment order.
    pub fn order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.contracts[i].class_name.as_str())
            .collect()
    }

    pub fn contract(&self, class_name: &str) -> Option<&Contract> {
        self.contracts
            .iter()
            .find(|contract| contract.class_name == class_name)
    }
}

#[derive(Debug)]
pub struct ReportEntry {
    pub class_name: String,
    pub result: Result<DeployOutcome, DeploymentError>,
}

/// Outcome of every contract in a plan, in deployment order.
#[derive(Debug, Default)]
pub struct DeploymentReport {
    entries: Vec<ReportEntry>,
}

impl DeploymentReport {
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn get(&self, class_name: &str) -> Option<&Result<DeployOutcome, DeploymentError>> {
        self.entries
            .iter()
            .find(|entry| entry.class_name == class_name)
            .map(|entry| &entry.result)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| entry.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Every outcome in deployment order, or the first failure.
    pub fn into_result(self) -> crate::Result<Vec<(String, DeployOutcome)>> {
        self.entries
            .into_iter()
            .map(|entry| Ok((entry.class_name, entry.result?)))
            .collect()
    }
}

/// Deploys every contract of `plan` in order.
///
/// Every contract is published to the registry up front, so references between contracts
/// resolve consistently whether or not the referenced contract ends up deployed.
pub async fn deploy_all<C: ChainConnector, N: NameResolver>(
    deployer: &Deployer<C, N>,
    plan: &mut DeploymentPlan,
) -> DeploymentReport {
    for contract in &plan.contracts {
        deployer.registry().publish(contract.snapshot());
    }

    let mut failed = vec![false; plan.contracts.len()];
    let mut report = DeploymentReport::default();
    for &i in &plan.order {
        let failed_dependency = plan.dependencies[i]
            .iter()
            .find(|&&j| failed[j])
            .map(|&j| plan.contracts[j].class_name.clone());
        let contract = &mut plan.contracts[i];
        let result = match failed_dependency {
            Some(dependency) => Err(deployer.fail_dependency(contract, &dependency)),
            None => deployer.deploy(contract).await,
        };
        failed[i] = result.is_err();
        report.entries.push(ReportEntry {
            class_name: contract.class_name.clone(),
            result,
        });
    }

    let failures = report.failures().count();
    if failures == 0 {
        info!(@mint, "deployed {} contracts", report.entries.len());
    } else {
        warn!(@yellow, "{failures} of {} contracts failed to deploy", report.entries.len());
    }
    report
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Lifecycle notifications.
//!
//! Events are broadcast fire-and-forget: with no subscriber they are dropped, and a slow
//! subscriber loses the oldest events rather than blocking deployment.

use tokio::sync::broadcast;

use crate::core::{contract::ContractSnapshot, deployment::DeploymentReceipt};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// The contract will not be deployed in this run.
    Undeployed(ContractSnapshot),
    /// The contract has an address, either newly deployed or found on chain.
    Deployed(ContractSnapshot),
    Error {
        class_name: String,
        message: String,
    },
    Receipt(DeploymentReceipt),
    /// Bindings for the contract should be (re)generated from this snapshot.
    GenerateBindings(ContractSnapshot),
}

impl DeployEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undeployed(_) => "contract:undeployed",
            Self::Deployed(_) => "contract:deployed",
            Self::Error { .. } => "contract:error",
            Self::Receipt(_) => "contract:receipt",
            Self::GenerateBindings(_) => "contract:bindings",
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::Undeployed(contract)
            | Self::Deployed(contract)
            | Self::GenerateBindings(contract) => &contract.class_name,
            Self::Error { class_name, .. } => class_name,
            Self::Receipt(receipt) => &receipt.class_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender(broadcast::Sender<DeployEvent>);

impl EventSender {
    pub fn new(capacity: usize) -> Self {
        Self(broadcast::channel(capacity).0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeployEvent> {
        self.0.subscribe()
    }

    pub fn emit(&self, event: DeployEvent) {
        debug!(@grey, "{} {}", event.name(), event.class_name());
        // no subscribers is fine
        let _ = self.0.send(event);
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::Contract;

    #[test]
    fn emits_without_subscribers() {
        let events = EventSender::default();
        events.emit(DeployEvent::Undeployed(Contract::new("Token").snapshot()));
    }

    #[test]
    fn delivers_in_order() {
        let events = EventSender::default();
        let mut rx = events.subscribe();
        events.emit(DeployEvent::Undeployed(Contract::new("A").snapshot()));
        events.emit(DeployEvent::Error {
            class_name: "B".to_owned(),
            message: "boom".to_owned(),
        });
        let first = rx.try_recv().unwrap();
        assert_eq!((first.name(), first.class_name()), ("contract:undeployed", "A"));
        let second = rx.try_recv().unwrap();
        assert_eq!((second.name(), second.class_name()), ("contract:error", "B"));
        assert!(rx.try_recv().is_err());
    }
}

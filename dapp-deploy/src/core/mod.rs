// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub mod arguments;
pub mod chain;
pub mod config;
pub mod contract;
pub mod decision;
pub mod deployment;
pub mod ens;
pub mod events;
pub mod hooks;
pub mod linker;
pub mod plan;
pub mod registry;

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! General purpose utilities.

use alloy::primitives::{utils::format_ether, U256};

use color::Color;

pub mod color;
pub mod testing;

/// Pretty-prints an amount of gas.
pub fn format_gas(gas: u128) -> String {
    let text = format!("{gas} gas");
    if gas <= 3_000_000 {
        text.mint()
    } else if gas <= 7_000_000 {
        text.yellow()
    } else {
        text.pink()
    }
}

/// Pretty-prints a deployment cost given in wei.
pub fn format_cost(wei: U256) -> String {
    format!("{wei} wei ({} ETH)", format_ether(wei))
}

/// Strips an optional `0x` prefix from a hex string.
pub fn strip_0x(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Applies a margin expressed in basis points on top of a gas amount.
pub fn bump_gas(gas: u64, bump_bps: u32) -> u64 {
    let bumped = gas as u128 + gas as u128 * bump_bps as u128 / 10_000;
    u64::try_from(bumped).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix() {
        assert_eq!(strip_0x("0x6080"), "6080");
        assert_eq!(strip_0x("6080"), "6080");
        assert_eq!(strip_0x("0X6080"), "6080");
    }

    #[test]
    fn bumps_gas() {
        assert_eq!(bump_gas(21_000, 0), 21_000);
        assert_eq!(bump_gas(21_000, 1_000), 23_100);
        assert_eq!(bump_gas(21_000, 500), 22_050);
        assert_eq!(bump_gas(u64::MAX, 1_000), u64::MAX);
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{
    contract::{GasPriceSetting, GasSetting},
    deployment::gas::DEFAULT_MAX_MARGIN_BPS,
};

/// Run-wide defaults, overridden by the settings of individual contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeployerConfig {
    pub gas: GasSetting,
    pub gas_price: GasPriceSetting,
    /// Upper bound for automatically estimated gas.
    pub gas_limit: Option<u64>,
    /// Largest random margin added to gas estimates, in basis points.
    pub max_gas_margin_bps: u32,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            gas: GasSetting::Auto,
            gas_price: GasPriceSetting::Auto,
            gas_limit: None,
            max_gas_margin_bps: DEFAULT_MAX_MARGIN_BPS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml deserialize error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

impl DeployerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::core::contract::Setting;

    #[test]
    fn defaults() {
        let config = DeployerConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeployerConfig::default());
        assert_eq!(config.gas, Setting::Auto);
        assert_eq!(config.max_gas_margin_bps, 1_000);
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
gas = 6000000
gas-price = "20000000000"
gas-limit = 8000000
max-gas-margin-bps = 0
"#
        )
        .unwrap();
        let config = DeployerConfig::load(file.path()).unwrap();
        assert_eq!(config.gas, Setting::Fixed(6_000_000));
        assert_eq!(config.gas_price, Setting::Fixed(20_000_000_000));
        assert_eq!(config.gas_limit, Some(8_000_000));
        assert_eq!(config.max_gas_margin_bps, 0);
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(matches!(
            DeployerConfig::from_toml_str("gas = \"plenty\""),
            Err(ConfigError::TomlDeserialize(_))
        ));
        assert!(matches!(
            DeployerConfig::load("/nonexistent/deployer.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}

//! Emulator configuration.
//!
//! Configuration can come from a JSON file and is then overridden by
//! command-line flags:
//!
//! ```json
//! { "address_bits": 12, "max_steps": 50000, "address_policy": "wrap" }
//! ```

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Default memory size: one word for every value a register can hold.
pub const DEFAULT_ADDRESS_BITS: u8 = 16;

/// Largest supported memory (registers are 16 bits wide).
pub const MAX_ADDRESS_BITS: u8 = 16;

/// Default instruction ceiling for a single run.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// What a load or store does with an address past the end of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressPolicy {
    /// Report `MemoryError::AddressOutOfRange`.
    #[default]
    Fault,
    /// Mask the address into range.
    Wrap,
}

/// Emulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmuConfig {
    /// Memory holds `2^address_bits` words.
    pub address_bits: u8,
    /// Instruction ceiling; `None` runs until the program counter leaves the program.
    pub max_steps: Option<u64>,
    /// Handling of out-of-range load/store addresses.
    pub address_policy: AddressPolicy,
}

impl EmuConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EmuConfig = serde_json::from_str(text)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Check that the values describe a machine we can build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address_bits == 0 || self.address_bits > MAX_ADDRESS_BITS {
            return Err(ConfigError::AddressBits(self.address_bits));
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroStepLimit);
        }
        Ok(())
    }
}

impl Default for EmuConfig {
    fn default() -> Self {
        Self {
            address_bits: DEFAULT_ADDRESS_BITS,
            max_steps: Some(DEFAULT_MAX_STEPS),
            address_policy: AddressPolicy::Fault,
        }
    }
}

/// Errors raised while reading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("address_bits must be between 1 and 16, got {0}")]
    AddressBits(u8),

    #[error("max_steps must be at least 1 (omit it for no limit)")]
    ZeroStepLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EmuConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EmuConfig::from_json_str(r#"{ "address_policy": "wrap" }"#).unwrap();
        assert_eq!(config.address_policy, AddressPolicy::Wrap);
        assert_eq!(config.address_bits, DEFAULT_ADDRESS_BITS);
        assert_eq!(config.max_steps, Some(DEFAULT_MAX_STEPS));
    }

    #[test]
    fn test_null_max_steps_means_unlimited() {
        let config = EmuConfig::from_json_str(r#"{ "max_steps": null }"#).unwrap();
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_rejects_bad_address_bits() {
        assert_eq!(
            EmuConfig::from_json_str(r#"{ "address_bits": 17 }"#),
            Err(ConfigError::AddressBits(17))
        );
        assert_eq!(
            EmuConfig::from_json_str(r#"{ "address_bits": 0 }"#),
            Err(ConfigError::AddressBits(0))
        );
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(matches!(
            EmuConfig::from_json_str(r#"{ "adress_bits": 8 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("acc8-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_path("config-load.json");
        std::fs::write(&path, r#"{ "address_bits": 12, "max_steps": 50000, "address_policy": "wrap" }"#).unwrap();

        let config = EmuConfig::load(&path).unwrap();
        assert_eq!(
            config,
            EmuConfig { address_bits: 12, max_steps: Some(50000), address_policy: AddressPolicy::Wrap }
        );

        std::fs::write(&path, r#"{ "address_bits": 20 }"#).unwrap();
        assert_eq!(EmuConfig::load(&path), Err(ConfigError::AddressBits(20)));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let path = temp_path("config-missing.json");
        match EmuConfig::load(&path) {
            Err(ConfigError::Io { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_step_limit() {
        assert_eq!(
            EmuConfig::from_json_str(r#"{ "max_steps": 0 }"#),
            Err(ConfigError::ZeroStepLimit)
        );
    }
}

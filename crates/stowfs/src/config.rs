//! Store configuration.
//!
//! Usually built in code with the `with_*` methods, or parsed from a RON
//! snippet bundled alongside the assets:
//!
//! ```ron
//! (
//!     compression_level: 9,
//!     verify_on_insert: true,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::vfs::{VfsError, VfsResult};

/// Highest gzip level accepted.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Configuration for a [`MemoryBackend`](crate::MemoryBackend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Gzip level, 0 (store) through 9 (best).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Decompress every blob after compressing it and compare against the
    /// original content before it is stored.
    #[serde(default)]
    pub verify_on_insert: bool,
}

fn default_compression_level() -> u32 {
    6
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            verify_on_insert: false,
        }
    }
}

impl StoreConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gzip level.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Enable or disable post-compression verification.
    pub fn with_verify_on_insert(mut self, verify: bool) -> Self {
        self.verify_on_insert = verify;
        self
    }

    /// Parse and validate a RON config.
    pub fn from_ron(text: &str) -> VfsResult<Self> {
        let config: StoreConfig =
            ron::from_str(text).map_err(|e| VfsError::config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> VfsResult<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(VfsError::config(format!(
                "compression_level {} out of range 0..={}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(())
    }

    pub(crate) fn compression(&self) -> flate2::Compression {
        flate2::Compression::new(self.compression_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.compression_level, 6);
        assert!(!config.verify_on_insert);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_compression_level(1)
            .with_verify_on_insert(true);
        assert_eq!(config.compression_level, 1);
        assert!(config.verify_on_insert);
    }

    #[test]
    fn test_from_ron() {
        let config = StoreConfig::from_ron("(compression_level: 9, verify_on_insert: true)").unwrap();
        assert_eq!(config.compression_level, 9);
        assert!(config.verify_on_insert);
    }

    #[test]
    fn test_from_ron_uses_defaults_for_missing_fields() {
        let config = StoreConfig::from_ron("()").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_from_ron_rejects_bad_level() {
        let err = StoreConfig::from_ron("(compression_level: 12)").unwrap_err();
        assert!(matches!(err, VfsError::Config(_)));
    }

    #[test]
    fn test_from_ron_rejects_garbage() {
        let err = StoreConfig::from_ron("compression_level = 3").unwrap_err();
        assert!(matches!(err, VfsError::Config(_)));
    }
}

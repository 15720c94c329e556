//! Mount configuration
//!
//! Controls where the locator looks for the image and how many handles can be
//! open at once. Can be loaded from a TOML file:
//!
//! ```toml
//! signature = "FFileSys"
//! scan_limit = 524288
//! alignment = 4
//! max_open_files = 16
//! max_open_dirs = 16
//! ```

use crate::core::error::{FlashFsError, Result};
use crate::core::format::{
    DEFAULT_MAX_OPEN, DEFAULT_SCAN_LIMIT, HEADER_SIZE, IMAGE_ALIGNMENT, SIGNATURE, SIGNATURE_LEN,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlashFsConfig {
    /// 8-byte tag identifying the image start
    #[serde(
        serialize_with = "serialize_signature",
        deserialize_with = "deserialize_signature"
    )]
    pub signature: [u8; SIGNATURE_LEN],

    /// Number of bytes at the start of the region searched for the signature
    pub scan_limit: usize,

    /// Required alignment of the image base, relative to the region start
    pub alignment: usize,

    /// File handle pool capacity
    pub max_open_files: usize,

    /// Directory handle pool capacity
    pub max_open_dirs: usize,
}

impl Default for FlashFsConfig {
    fn default() -> Self {
        FlashFsConfig {
            signature: SIGNATURE,
            scan_limit: DEFAULT_SCAN_LIMIT,
            alignment: IMAGE_ALIGNMENT,
            max_open_files: DEFAULT_MAX_OPEN,
            max_open_dirs: DEFAULT_MAX_OPEN,
        }
    }
}

impl FlashFsConfig {
    /// Parse and validate a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: FlashFsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            return Err(FlashFsError::Config(format!(
                "alignment must be a power of two, got {}",
                self.alignment
            )));
        }

        if self.scan_limit < HEADER_SIZE {
            return Err(FlashFsError::Config(format!(
                "scan_limit must be at least {} bytes, got {}",
                HEADER_SIZE, self.scan_limit
            )));
        }

        if self.max_open_files == 0 || self.max_open_dirs == 0 {
            return Err(FlashFsError::Config(
                "handle pool capacities must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn serialize_signature<S>(signature: &[u8; SIGNATURE_LEN], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let text = std::str::from_utf8(signature)
        .map_err(|_| serde::ser::Error::custom("signature is not valid UTF-8"))?;
    serializer.serialize_str(text)
}

fn deserialize_signature<'de, D>(deserializer: D) -> std::result::Result<[u8; SIGNATURE_LEN], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.as_bytes().try_into().map_err(|_| {
        serde::de::Error::custom(format!(
            "signature must be exactly {} bytes, got {}",
            SIGNATURE_LEN,
            text.len()
        ))
    })
}

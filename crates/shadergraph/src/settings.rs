// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph settings.
//!
//! Settings live in a RON file next to the graphs they apply to. Missing
//! fields fall back to their defaults, so a partial file is valid.

use crate::codegen::{GenerationMode, OutputPrecision};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "shadergraph.ron";

/// Settings shared by validation and generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Scalar precision of generated code
    pub precision: OutputPrecision,
    /// Generation mode used for slot values and properties
    pub generation_mode: GenerationMode,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            precision: OutputPrecision::Float,
            generation_mode: GenerationMode::Preview,
        }
    }
}

impl GraphSettings {
    /// Parse settings from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize settings to pretty RON text
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_ron_str(&text)?;
        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

/// Error when loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid settings RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

//! domkit configuration file handling
//!
//! Settings live in `domkit.toml`:
//!
//! ```toml
//! [calendar]
//! epoch_year = 2000
//! first_day_of_week = "monday"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use domkit_widgets::CalendarOptions;

pub const CONFIG_FILE: &str = "domkit.toml";

/// Contents of `domkit.toml`
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DomkitConfig {
    #[serde(default)]
    pub calendar: CalendarOptions,
}

impl DomkitConfig {
    /// Load from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `domkit.toml` from a directory, falling back to defaults
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: DomkitConfig = toml::from_str(content)?;
        config.calendar.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

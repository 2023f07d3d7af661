//! Optional TOML configuration.
//!
//! ```toml
//! [limits]
//! max_call_depth = 512
//! max_elements = 10000
//! ```

use anyhow::{Context, Result};
use inkling::Limits;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub limits: Limits,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Settings =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("loaded {settings:?} from {}", path.display());
        Ok(settings)
    }
}

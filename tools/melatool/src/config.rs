//! melatool.toml configuration
//!
//! ```toml
//! [msb]
//! uid_type = "f64"
//! float_type = "f32"
//! int_type = "u32"
//! endian = "little"
//!
//! [par]
//! line_width = 130
//!
//! [par.symbols]
//! YEARS = "VUODET"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use melatools_core::msb::{Endian, MsbFormat, NumType};
use melatools_core::par::{DEFAULT_LINE_WIDTH, Keyword, Vocabulary};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub msb: MsbFormat,
    pub par: ParConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParConfig {
    pub line_width: usize,
    /// Textual name -> canonical keyword
    pub symbols: BTreeMap<String, String>,
}

impl Default for ParConfig {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
            symbols: BTreeMap::new(),
        }
    }
}

impl ToolConfig {
    /// Load the config file, or the built-in defaults without one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.msb.validate()?;
        Ok(config)
    }

    /// Built-in vocabulary extended with the configured aliases
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        let mut vocab = Vocabulary::finnish();
        for (name, key) in &self.par.symbols {
            let keyword: Keyword = key
                .parse()
                .with_context(|| format!("Bad symbol mapping {name} = {key}"))?;
            vocab.insert(name.clone(), keyword);
        }
        Ok(vocab)
    }
}

/// MSB layout overrides shared by every subcommand
#[derive(Args, Debug, Default, Clone)]
pub struct FormatArgs {
    /// Number type of the physical record uid
    #[arg(long, value_name = "TYPE")]
    pub uid_type: Option<NumType>,

    /// Number type of float slots
    #[arg(long, value_name = "TYPE")]
    pub float_type: Option<NumType>,

    /// Number type of integer slots
    #[arg(long, value_name = "TYPE")]
    pub int_type: Option<NumType>,

    /// Byte order: little, big or native
    #[arg(long)]
    pub endian: Option<Endian>,
}

impl FormatArgs {
    pub fn apply(&self, mut format: MsbFormat) -> Result<MsbFormat> {
        format.uid_type = self.uid_type.unwrap_or(format.uid_type);
        format.float_type = self.float_type.unwrap_or(format.float_type);
        format.int_type = self.int_type.unwrap_or(format.int_type);
        format.endian = self.endian.unwrap_or(format.endian);
        format.validate()?;
        Ok(format)
    }
}

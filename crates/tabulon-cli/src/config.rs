// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "tabulon";
pub const CONFIG_PATH_ENV: &str = "TABULON_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_OUTPUT_DELIMITER: char = ',';

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub input: Input,
    #[serde(default)]
    pub output: Output,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            input: Input::default(),
            output: Output::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Input {
    pub delimiter: Option<String>,
    pub cell_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Output {
    pub delimiter: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [input] and [output]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `tabulon --print-example-config` for the current schema",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(raw) = &self.input.delimiter {
            single_char("input.delimiter", raw, path)?;
        }
        if let Some(raw) = &self.output.delimiter {
            single_char("output.delimiter", raw, path)?;
        }
        if let Some(limit) = self.input.cell_limit
            && limit < 0
        {
            bail!(
                "input.cell_limit in {} must be non-negative, got {}",
                path.display(),
                limit
            );
        }
        Ok(())
    }

    /// Configured input delimiter; `None` leaves it to file-name guessing.
    pub fn input_delimiter(&self) -> Option<char> {
        self.input
            .delimiter
            .as_deref()
            .and_then(|raw| raw.chars().next())
    }

    pub fn output_delimiter(&self) -> char {
        self.output
            .delimiter
            .as_deref()
            .and_then(|raw| raw.chars().next())
            .unwrap_or(DEFAULT_OUTPUT_DELIMITER)
    }

    pub fn cell_limit(&self) -> usize {
        self.input
            .cell_limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(0)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tabulon config\n# Place this file at: {}\n\nversion = 1\n\n[input]\n# Optional. Default guesses from the file name (.tsv = tab, .psv = pipe, else comma)\n# delimiter = \",\"\n# Truncate every cell to this many characters; 0 disables truncation\ncell_limit = 0\n\n[output]\ndelimiter = \"{}\"\n",
            path.display(),
            DEFAULT_OUTPUT_DELIMITER,
        )
    }
}

fn single_char(field: &str, raw: &str, path: &Path) -> Result<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => bail!(
            "{field} in {} must be exactly one character, got {raw:?}",
            path.display()
        ),
    }
}

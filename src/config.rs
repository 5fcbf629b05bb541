use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tera::Context as TeraContext;
use thiserror::Error;
use tracing::info;

use crate::contract::{ExecutionParams, RequestBuilder, DEFAULT_DENOM};
use crate::TEMPLATES;

pub const INVOICER_CONFIG: &str = "invoicer.toml";
pub const DEFAULT_LCD_URL: &str = "https://api.xion-testnet-2.burnt.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tera(#[from] tera::Error),
    #[error(transparent)]
    DeserializeToml(#[from] toml::de::Error),
    #[error("No invoicer.toml found in {0} or any parent directory")]
    ConfigNotFound(String),
    #[error("Configuration already exists at {0}")]
    ConfigAlreadyExists(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub lcd_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_url: Option<String>,
    pub contract_address: String,
    #[serde(default = "default_denom")]
    pub denom: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_denom() -> String {
    DEFAULT_DENOM.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InvoicerConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub fee: ExecutionParams,
}

/// Values substituted into the config template by `invoicer init`.
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub contract_address: String,
    pub lcd_url: String,
    pub signer_url: Option<String>,
    pub granter: Option<String>,
}

impl InvoicerConfig {
    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        let config = toml::from_str::<InvoicerConfig>(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }

    /// Loads the nearest `invoicer.toml`, searching `start` and its parents.
    pub fn discover(start: impl AsRef<Path>) -> ConfigResult<(Self, PathBuf)> {
        let mut dir = start.as_ref().to_path_buf();
        match find_ancestor(&mut dir, INVOICER_CONFIG) {
            Some(path) => Ok((Self::load(&path)?, path)),
            None => Err(ConfigError::ConfigNotFound(
                start.as_ref().display().to_string(),
            )),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.network.contract_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "network.contract_address is empty".into(),
            ));
        }
        if self.network.lcd_url.trim().is_empty() {
            return Err(ConfigError::Invalid("network.lcd_url is empty".into()));
        }
        if self.network.denom.trim().is_empty() || self.fee.denom.trim().is_empty() {
            return Err(ConfigError::Invalid("denom is empty".into()));
        }
        if self.network.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "network.request_timeout_ms must be positive".into(),
            ));
        }
        if self.fee.gas == 0 {
            return Err(ConfigError::Invalid("fee.gas must be positive".into()));
        }
        Ok(())
    }

    pub fn request_builder(&self) -> RequestBuilder {
        RequestBuilder::new(
            self.network.contract_address.clone(),
            self.network.denom.clone(),
            self.fee.clone(),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.network.request_timeout_ms)
    }

    /// Writes a fresh `invoicer.toml` into `dir` from the embedded template.
    pub fn init(dir: impl AsRef<Path>, args: &InitArgs) -> ConfigResult<PathBuf> {
        let path = dir.as_ref().join(INVOICER_CONFIG);
        let defaults = ExecutionParams::default();
        let mut context = TeraContext::new();
        context.insert("LCD_URL", &args.lcd_url);
        context.insert("SIGNER_URL", &args.signer_url);
        context.insert("CONTRACT_ADDRESS", &args.contract_address);
        context.insert("DENOM", DEFAULT_DENOM);
        context.insert("REQUEST_TIMEOUT_MS", &DEFAULT_REQUEST_TIMEOUT_MS);
        context.insert("GAS", &defaults.gas);
        context.insert("FEE_AMOUNT", &defaults.amount);
        context.insert("FEE_DENOM", &defaults.denom);
        context.insert("GRANTER", &args.granter);

        let content = TEMPLATES.render(INVOICER_CONFIG, &context)?;
        // Refuse to write something we could not load back.
        Self::from_toml(&content)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(ConfigError::ConfigAlreadyExists(path.display().to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        file.write_all(content.as_bytes())?;
        info!(path = %path.display(), "wrote configuration");
        Ok(path)
    }
}

fn find_ancestor(curr_path: &mut PathBuf, target: &str) -> Option<PathBuf> {
    let target_path = curr_path.join(target);
    if target_path.exists() {
        Some(target_path)
    } else if curr_path.pop() {
        find_ancestor(curr_path, target)
    } else {
        None
    }
}

//! Application configuration loaded from a TOML file
//!
//! Lives at `<config dir>/mqtt-filetransfer/config.toml`. A default file is
//! written on first start so there is always something to edit.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::{create_dir_all, read_to_string, try_exists, write};
use tracing::{debug, info};

use crate::mqtt::config::BrokerConfig;

const CONFIG_DIR: &str = "mqtt-filetransfer";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// Defaults applied when a send request leaves them unspecified
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TransferSettings {
    pub chunk_size: u64,
    pub encoding: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024,
            encoding: "base64".to_string(),
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory available"))?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    Ok(path)
}

impl AppConfig {
    /// Reads the config file, writing the defaults first if it is missing
    pub async fn load_or_default() -> Result<Self> {
        let path = config_path()?;
        if !try_exists(&path).await? {
            info!("No config file found, writing defaults to {:?}", path);
            let config = Self::default();
            config.save().await?;
            return Ok(config);
        }

        let contents = read_to_string(&path).await?;
        let config = toml::from_str(&contents)?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }
        write(&path, toml::to_string_pretty(self)?).await?;
        debug!("Saved configuration to {:?}", path);
        Ok(())
    }
}

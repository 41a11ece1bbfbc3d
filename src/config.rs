use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use snafu::ResultExt as _;

use crate::error::{ApplicationError, ConfigLoadSnafu};

/// Process settings, read from environment variables (and a `.env` file when
/// one is present).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    /// The CSV file holding every video.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data").join("videos.csv")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    pub fn from_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Config, ApplicationError> {
        envy::from_iter(vars).context(ConfigLoadSnafu)
    }
}

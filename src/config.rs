use crate::action::Action;
use crate::call::CallTarget;
use anyhow::Error;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

/// The default spooling directory (should be OK for most Asterisk
/// installs).
pub const DEFAULT_SPOOL_DIR: &str = "/var/spool/asterisk/outgoing";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
    pub tmpdir: Option<PathBuf>,
    /// System user to spool call files as, usually the one Asterisk runs
    /// as.
    pub user: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SPOOL_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
            tmpdir: None,
            user: None,
            log_level: Some("info".to_string()),
            log_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}

/// A whole call described as a TOML document.
///
/// ```toml
/// [call]
/// channel = "SIP/1234"
/// wait_time = 30
///
/// [action]
/// type = "application"
/// name = "Playback"
/// data = "hello-world"
///
/// [set_var]
/// GREETING = "morning"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub call: CallTarget,
    pub action: Action,
    #[serde(default)]
    pub set_var: IndexMap<String, String>,
    #[serde(default)]
    pub archive: bool,
    /// Earliest time to place the call, local `%Y-%m-%d %H:%M:%S`.
    pub schedule: Option<String>,
    /// Base name to spool the file under.
    pub file_name: Option<String>,
}

impl CallSpec {
    pub fn load(path: &str) -> Result<Self, Error> {
        let spec = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(spec)
    }
}

//! Config file location
//!
//! Resolution order:
//!
//! 1. `--config <path>` on the command line
//! 2. `config.yaml` in the current working directory
//! 3. `<user config dir>/hand-joystick/config.yaml` (e.g. `~/.config` on
//!    Linux, `%APPDATA%` on Windows)
//!
//! A missing file is not an error: the defaults apply and hot reload stays off.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// Directory name under the platform config dir
const APP_DIR: &str = "hand-joystick";

const CONFIG_FILE: &str = "config.yaml";

/// Where the config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    CommandLine,
    WorkingDir,
    UserConfigDir,
}

impl ConfigOrigin {
    pub fn describe(self) -> &'static str {
        match self {
            ConfigOrigin::CommandLine => "--config",
            ConfigOrigin::WorkingDir => "working directory",
            ConfigOrigin::UserConfigDir => "user config dir",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config: PathBuf,
    pub origin: ConfigOrigin,
}

impl AppPaths {
    /// Resolve against the real working directory and platform dirs
    pub fn detect(explicit: Option<&Path>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve(explicit, &cwd, dirs::config_dir())
    }

    pub fn resolve(explicit: Option<&Path>, cwd: &Path, user_config_dir: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Self {
                config: path.to_path_buf(),
                origin: ConfigOrigin::CommandLine,
            };
        }

        let local = cwd.join(CONFIG_FILE);
        if local.exists() {
            return Self {
                config: local,
                origin: ConfigOrigin::WorkingDir,
            };
        }

        match user_config_dir {
            Some(dir) => Self {
                config: dir.join(APP_DIR).join(CONFIG_FILE),
                origin: ConfigOrigin::UserConfigDir,
            },
            None => {
                debug!("No platform config dir, using the working directory");
                Self {
                    config: local,
                    origin: ConfigOrigin::WorkingDir,
                }
            }
        }
    }

    pub fn config_exists(&self) -> bool {
        self.config.exists()
    }

    /// Create the directory that will hold the config file
    pub fn ensure_config_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating config directory: {}", parent.display());
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }
        Ok(())
    }
}

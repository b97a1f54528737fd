//! Hot reload of the config file
//!
//! The notify callback only records that the file changed. A reload task
//! waits for writes to settle, re-reads the file and forwards the result when
//! it parses, validates and differs from the config already in use.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Quiet period after the last change before the file is read again
const SETTLE: Duration = Duration::from_millis(100);

/// Delivers validated config updates for one file
pub struct ConfigWatcher {
    _watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Load `config_path` and start watching it
    ///
    /// The parent directory is watched so editors that save by replacing the
    /// file keep triggering reloads.
    pub async fn new(config_path: impl Into<PathBuf>) -> Result<(Self, AppConfig)> {
        let config_path = config_path.into();
        let initial = AppConfig::load(&config_path)
            .await
            .context("Failed to load initial config")?;

        let file_name = config_path
            .file_name()
            .map(|name| name.to_os_string())
            .with_context(|| format!("Config path has no file name: {}", config_path.display()))?;
        let dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (change_tx, change_rx) = mpsc::channel(1);
        let (update_tx, rx) = mpsc::channel(4);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) if touches(&event, &file_name) => {
                    debug!("Config file event: {:?}", event.kind);
                    // A full channel already holds a pending change
                    let _ = change_tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => error!("Config watch error: {}", e),
            }
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", dir.display()))?;

        tokio::spawn(reload_on_change(
            config_path.clone(),
            initial.clone(),
            change_rx,
            update_tx,
        ));
        info!("Watching {} for changes", config_path.display());

        Ok((
            Self {
                _watcher: Some(watcher),
                rx,
            },
            initial,
        ))
    }

    /// A watcher that never yields, for runs without a config file
    pub fn disabled() -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self { _watcher: None, rx }
    }

    /// Wait for the next config update
    ///
    /// Pends forever once the watcher is closed, so it can sit in a
    /// `tokio::select!` without spinning.
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        match self.rx.recv().await {
            Some(config) => Some(config),
            None => std::future::pending().await,
        }
    }
}

/// Content changes and create/rename events naming the config file
fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

/// Reload task; ends when the change channel closes with the watcher
async fn reload_on_change(
    path: PathBuf,
    mut current: AppConfig,
    mut changes: mpsc::Receiver<()>,
    updates: mpsc::Sender<AppConfig>,
) {
    while changes.recv().await.is_some() {
        // Collapse a burst of events into one read
        tokio::time::sleep(SETTLE).await;
        while changes.try_recv().is_ok() {}

        let Some(config) = reread(&path).await else {
            continue;
        };
        if config == current {
            debug!("Config file rewritten without changes");
            continue;
        }

        current = config.clone();
        info!("Configuration reloaded from {}", path.display());
        if updates.send(config).await.is_err() {
            break;
        }
    }
}

async fn reread(path: &Path) -> Option<AppConfig> {
    match AppConfig::load(path).await {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring config change, keeping the running config: {:#}", e);
            None
        }
    }
}

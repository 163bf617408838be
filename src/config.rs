use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::sink::OutputFormat;
use crate::source::SourceKind;

/// Environment variable consulted when `--store-uri` is not given.
pub const STORE_URI_ENV: &str = "LM_STORE_URI";

/// Profile used when `--profile` is not given.
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required document store connection string (--store-uri or LM_STORE_URI)")]
    MissingStore,
    #[error("Missing required --file flag for the file source")]
    MissingListFile,
    #[error("Missing required --dest flag for file output")]
    MissingDest,
    #[error("Missing required --queue flag")]
    MissingQueue,
    #[error("Unknown profile {0:?}")]
    UnknownProfile(String),
    #[error("Could not determine a data directory for the default channel")]
    NoDataDir,
}

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults; the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Document store connection string, lowest priority after flag and env.
    pub store_uri: Option<String>,
    /// Channel polling behaviour.
    pub queue: QueueSettings,
    /// Named channel locations, selected with `--profile`.
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueSettings {
    /// Messages pulled per receive call.
    pub batch_size: usize,
    /// Long-poll window per receive call, in seconds.
    pub wait_secs: u64,
    /// How long a received message stays hidden before redelivery.
    pub visibility_timeout_secs: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            wait_secs: 15,
            visibility_timeout_secs: 30,
        }
    }
}

impl QueueSettings {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Profile {
    /// SQLite file holding this profile's queues.
    pub channel_path: PathBuf,
}

impl AppConfig {
    /// Load config from `~/.config/livemusic/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the channel file for a profile. The default profile falls back
    /// to the XDG data directory; any other name must be configured.
    pub fn channel_path(&self, profile: Option<&str>) -> Result<PathBuf, ConfigError> {
        let name = profile.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PROFILE);
        match self.profiles.get(name) {
            Some(p) => Ok(p.channel_path.clone()),
            None if name == DEFAULT_PROFILE => default_channel_path(),
            None => Err(ConfigError::UnknownProfile(name.to_string())),
        }
    }

    fn channel_config(
        &self,
        queue: Option<String>,
        profile: Option<&str>,
    ) -> Result<ChannelConfig, ConfigError> {
        let queue = queue
            .filter(|q| !q.is_empty())
            .ok_or(ConfigError::MissingQueue)?;
        Ok(ChannelConfig {
            path: self.channel_path(profile)?,
            queue,
            settings: self.queue.clone(),
        })
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn default_channel_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("", "", crate::APP_NAME).ok_or(ConfigError::NoDataDir)?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir).ok();
    Ok(data_dir.join("channels.db"))
}

/// A resolved queue on a resolved channel file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub path: PathBuf,
    pub queue: String,
    pub settings: QueueSettings,
}

/// Raw `scan` flags.
#[derive(Debug, Default)]
pub struct ScanOptions {
    pub folders: Vec<String>,
    pub dest: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub recursive: bool,
    pub overwrite: bool,
    pub queue: Option<String>,
    pub profile: Option<String>,
}

/// Validated `scan` settings.
#[derive(Debug)]
pub struct ScanConfig {
    pub roots: Vec<String>,
    pub recursive: bool,
    pub output: OutputFormat,
    pub dest: Option<PathBuf>,
    pub overwrite: bool,
    pub channel: Option<ChannelConfig>,
}

impl ScanConfig {
    /// Output defaults to the list file when `--dest` is given, else stdout.
    pub fn resolve(opts: ScanOptions, app: &AppConfig) -> Result<Self, ConfigError> {
        let output = opts.format.unwrap_or(if opts.dest.is_some() {
            OutputFormat::File
        } else {
            OutputFormat::Stdout
        });

        let channel = match output {
            OutputFormat::File if opts.dest.is_none() => return Err(ConfigError::MissingDest),
            OutputFormat::Queue => Some(app.channel_config(opts.queue, opts.profile.as_deref())?),
            _ => None,
        };

        Ok(Self {
            roots: opts.folders,
            recursive: opts.recursive,
            output,
            dest: opts.dest,
            overwrite: opts.overwrite,
            channel,
        })
    }
}

/// Raw `analyze` flags.
#[derive(Debug, Default)]
pub struct AnalyzeOptions {
    pub files: Vec<String>,
    pub source: SourceKind,
    pub list_file: Option<PathBuf>,
    pub queue: Option<String>,
    pub store_uri: Option<String>,
    pub profile: Option<String>,
}

/// Validated `analyze` settings.
#[derive(Debug)]
pub struct AnalyzeConfig {
    pub files: Vec<String>,
    pub source: SourceKind,
    pub list_file: Option<PathBuf>,
    pub store_path: PathBuf,
    pub channel: Option<ChannelConfig>,
}

impl AnalyzeConfig {
    /// Store URI priority: flag > `env_store_uri` > config file.
    pub fn resolve(
        opts: AnalyzeOptions,
        app: &AppConfig,
        env_store_uri: Option<String>,
    ) -> Result<Self, ConfigError> {
        let uri = opts
            .store_uri
            .into_iter()
            .chain(env_store_uri)
            .chain(app.store_uri.clone())
            .find(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingStore)?;
        let store_path = store_path_from_uri(&uri).ok_or(ConfigError::MissingStore)?;

        let channel = match opts.source {
            SourceKind::File if opts.list_file.is_none() => {
                return Err(ConfigError::MissingListFile);
            }
            SourceKind::Sqs => Some(app.channel_config(opts.queue, opts.profile.as_deref())?),
            _ => None,
        };

        Ok(Self {
            files: opts.files,
            source: opts.source,
            list_file: opts.list_file,
            store_path,
            channel,
        })
    }
}

/// Accepts `sqlite://path` or a bare path.
fn store_path_from_uri(uri: &str) -> Option<PathBuf> {
    let uri = uri.trim();
    let path = uri.strip_prefix("sqlite://").unwrap_or(uri);
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

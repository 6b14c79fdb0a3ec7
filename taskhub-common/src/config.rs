//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `TASKHUB_ROOT_FOLDER` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is
//! logged and defaults apply.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TASKHUB_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "taskhub.db";

/// Upload directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
/// 25 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
/// Events buffered per subscriber before it starts lagging
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Optional settings read from `config.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub event_buffer: Option<usize>,
}

impl TomlConfig {
    /// Parse a config file, failing on I/O or syntax errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a config file if there is one, otherwise use defaults
    ///
    /// With no explicit path the platform config location is tried
    /// (`<config dir>/taskhub/config.toml`).
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                Self::default()
            }
        }
    }
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("taskhub").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taskhub"))
        .unwrap_or_else(|| PathBuf::from("./taskhub_data"))
}

/// Resolves the root folder from the four configuration tiers
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_root: Option<PathBuf>) -> Self {
        Self { cli_arg, toml_root }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates and locates the files kept under the root folder
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder and its uploads directory
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.uploads_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.root_folder.join(UPLOADS_DIR)
    }
}

/// Command-line / environment overrides handed in by the binary
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub event_buffer: usize,
}

impl ServerConfig {
    /// Merge CLI overrides over TOML values over compiled defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let root_folder = RootFolderResolver::new(cli.root_folder, toml.root_folder).resolve();

        Self {
            root_folder,
            bind_address: cli
                .bind_address
                .or(toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            event_buffer: toml
                .event_buffer
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_EVENT_BUFFER),
        }
    }

    /// Socket address for the listener; IPv6 hosts need no brackets
    pub fn listen_address(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.trim().parse().map_err(|_| {
            Error::Config(format!("Invalid bind address: {:?}", self.bind_address))
        })?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

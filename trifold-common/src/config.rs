//! Configuration loading and root folder resolution
//!
//! The root folder holds everything Trifold persists: the SQLite
//! database and the JSON archive file. Resolution priority:
//!
//! 1. Command-line argument (handled by the binary, highest)
//! 2. Environment variable (`TRIFOLD_ROOT_FOLDER`, then `TRIFOLD_ROOT`)
//! 3. `root_folder` in the module's TOML config file
//! 4. OS-dependent compiled default
//!
//! The TOML config file lives at `<config dir>/trifold/<module>.toml`
//! (for example `~/.config/trifold/trifold-ui.toml` on Linux), with
//! `/etc/trifold/<module>.toml` as a system-wide fallback on Linux.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::Provider;
use crate::{Error, Result};

/// Compiled defaults used when no configuration is present.
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    /// Platform-appropriate data directory for this user
    pub root_folder: PathBuf,
    /// Default tracing filter when neither RUST_LOG nor the TOML file
    /// specifies one
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the OS this binary was compiled for
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("trifold"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/trifold"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("trifold"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\trifold"))
        } else {
            dirs::data_local_dir()
                .map(|d| d.join("trifold"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/trifold"))
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
        }
    }
}

fn default_log_level() -> String {
    CompiledDefaults::for_current_platform().log_level
}

/// Logging section of the TOML config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive applied when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Per-provider overrides from the TOML config file.
///
/// API keys may also arrive via environment variables
/// (OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY), which take
/// precedence over TOML values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Concrete model name; each provider has a compiled default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Endpoint base URL override, mainly for proxies and tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Providers section of the TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Completion token cap applied to every provider request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
}

impl ProvidersConfig {
    /// Per-provider entry by identity
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }
}

/// On-disk TOML configuration file schema.
///
/// Every field is optional so a partial or missing file never blocks
/// startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Resolves the root folder for one module using the priority order
/// described at the top of this file.
pub struct RootFolderResolver {
    module_name: String,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
        }
    }

    /// Resolve the root folder. Never fails; the compiled platform
    /// default is the final fallback.
    pub fn resolve(&self) -> PathBuf {
        if let Ok(path) = std::env::var("TRIFOLD_ROOT_FOLDER") {
            debug!("Root folder from TRIFOLD_ROOT_FOLDER: {}", path);
            return PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("TRIFOLD_ROOT") {
            debug!("Root folder from TRIFOLD_ROOT: {}", path);
            return PathBuf::from(path);
        }

        if let Some(config) = self.load_toml_config() {
            if let Some(root) = config.root_folder {
                debug!("Root folder from config file: {}", root.display());
                return root;
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }

    /// Load this module's TOML config file, if present and parseable.
    ///
    /// A missing or malformed file is not fatal; callers fall back to
    /// defaults.
    pub fn load_toml_config(&self) -> Option<TomlConfig> {
        let path = self.config_file_path()?;

        #[cfg(unix)]
        if check_toml_permissions_loose(&path).unwrap_or(false) {
            warn!(
                "Config file {} is readable by other users; it may hold API keys (chmod 600 recommended)",
                path.display()
            );
        }

        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// First existing config file location for this module
    fn config_file_path(&self) -> Option<PathBuf> {
        let file_name = format!("{}.toml", self.module_name);

        if let Some(dir) = dirs::config_dir() {
            let user_config = dir.join("trifold").join(&file_name);
            if user_config.exists() {
                return Some(user_config);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/trifold").join(&file_name);
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Prepares a resolved root folder: directory creation plus the
/// well-known file locations inside it.
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// SQLite database location inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root.join("trifold.db")
    }

    /// JSON archive location inside the root folder
    pub fn archive_path(&self) -> PathBuf {
        self.root.join("history.json")
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Create the root folder (and parents) if missing. Idempotent.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Atomically write a TOML config file (temp file plus rename).
///
/// On Unix the file ends up with 0600 permissions since it may hold
/// provider API keys.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("TOML serialization failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&tmp_path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Report whether a config file is readable by group or others.
///
/// Only meaningful on Unix.
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

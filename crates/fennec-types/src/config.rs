//! Configuration loading for fennec-devtools.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/fennec-devtools/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FennecError;

/// Sentinel that opens an Android Sync session in `adb logcat -v time` output.
pub const DEFAULT_BEGIN_SENTINEL: &str = "Got onPerformSync. Extras bundle is";

/// Sentinel that closes an Android Sync session.
pub const DEFAULT_END_SENTINEL: &str = "Setting minimum next sync time to";

/// Settings for splitting a logcat stream into session files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Directory session files are written to
    #[serde(default = "default_log_directory")]
    pub directory: String,

    /// Session files are named `<prefix>-<timestamp>.txt`
    #[serde(default = "default_log_prefix")]
    pub prefix: String,

    /// Substring that starts a session
    #[serde(default = "default_begin_sentinel")]
    pub begin_sentinel: String,

    /// Substring that ends a session
    #[serde(default = "default_end_sentinel")]
    pub end_sentinel: String,

    /// Marker separating the timestamp from the level/tag column
    #[serde(default = "default_level_delimiter")]
    pub level_delimiter: String,
}

fn default_log_directory() -> String {
    ".".to_string()
}

fn default_log_prefix() -> String {
    "FxSync".to_string()
}

fn default_begin_sentinel() -> String {
    DEFAULT_BEGIN_SENTINEL.to_string()
}

fn default_end_sentinel() -> String {
    DEFAULT_END_SENTINEL.to_string()
}

fn default_level_delimiter() -> String {
    " I/".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            prefix: default_log_prefix(),
            begin_sentinel: default_begin_sentinel(),
            end_sentinel: default_end_sentinel(),
            level_delimiter: default_level_delimiter(),
        }
    }
}

impl LogSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.is_empty() {
            return Err("prefix must not be empty".to_string());
        }
        if self.prefix.contains('/') || self.prefix.contains('\\') {
            return Err(format!("prefix must not contain a path separator, got {}", self.prefix));
        }
        if self.begin_sentinel.is_empty() || self.end_sentinel.is_empty() {
            return Err("sentinels must not be empty".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path or name of the adb executable
    #[serde(default = "default_adb_path")]
    pub adb_path: String,

    /// Path or name of the sqlite3 executable
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Application package prefix; the user name is appended
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,

    /// Suffix for `run-as <package_prefix><whoami>` (defaults to the local user)
    #[serde(default)]
    pub whoami: Option<String>,

    /// World-readable directory on the device used to stage pulls
    #[serde(default = "default_device_output_dir")]
    pub device_output_dir: String,

    /// Local directory pulled databases land in
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// Row limit for plain table dumps
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Logcat session splitting
    #[serde(default)]
    pub logs: LogSettings,
}

fn default_adb_path() -> String {
    "adb".to_string()
}

fn default_sqlite_path() -> String {
    "sqlite3".to_string()
}

fn default_package_prefix() -> String {
    "org.mozilla.fennec_".to_string()
}

fn default_device_output_dir() -> String {
    "/sdcard".to_string()
}

fn default_temp_dir() -> String {
    std::env::temp_dir().to_string_lossy().to_string()
}

fn default_limit() -> u32 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            sqlite_path: default_sqlite_path(),
            package_prefix: default_package_prefix(),
            whoami: None,
            device_output_dir: default_device_output_dir(),
            temp_dir: default_temp_dir(),
            limit: default_limit(),
            log_level: default_log_level(),
            logs: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`<config dir>/fennec-devtools/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`FENNEC_*`, nested keys with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, FennecError> {
        let config_dir = ProjectDirs::from("", "", "fennec-devtools")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("adb_path", default_adb_path())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("sqlite_path", default_sqlite_path())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("package_prefix", default_package_prefix())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("device_output_dir", default_device_output_dir())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("temp_dir", default_temp_dir())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("limit", default_limit() as i64)
            .map_err(|e| FennecError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| FennecError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // FENNEC_ADB_PATH, FENNEC_LIMIT, FENNEC_LOGS__PREFIX, ...
        builder = builder.add_source(
            Environment::with_prefix("FENNEC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| FennecError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| FennecError::Config(e.to_string()))?;

        settings.logs.validate().map_err(FennecError::Config)?;
        Ok(settings)
    }

    /// The configured user suffix, or the local user name.
    pub fn resolved_whoami(&self) -> Option<String> {
        self.whoami
            .clone()
            .filter(|w| !w.is_empty())
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .or_else(|| std::env::var("USERNAME").ok().filter(|u| !u.is_empty()))
    }

    /// Android package name for `run-as`.
    pub fn package_name(&self, whoami: &str) -> String {
        format!("{}{}", self.package_prefix, whoami)
    }

    /// Application data directory on the device.
    pub fn device_root(&self, whoami: &str) -> String {
        format!("/data/data/{}", self.package_name(whoami))
    }

    /// Expand `~/` in the temp dir to the home directory
    pub fn expanded_temp_dir(&self) -> PathBuf {
        expand_home(&self.temp_dir)
    }

    /// Expand `~/` in the log directory to the home directory
    pub fn expanded_log_dir(&self) -> PathBuf {
        expand_home(&self.logs.directory)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.adb_path, "adb");
        assert_eq!(settings.sqlite_path, "sqlite3");
        assert_eq!(settings.limit, 200);
        assert_eq!(settings.logs.prefix, "FxSync");
        assert_eq!(settings.logs.level_delimiter, " I/");
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert!(!settings.adb_path.is_empty());
        assert!(!settings.logs.begin_sentinel.is_empty());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "limit = 15\nwhoami = \"nalexander\"\n\n[logs]\nprefix = \"Sync\"\ndirectory = \"/tmp/logs\""
        )
        .unwrap();

        let settings = Settings::load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(settings.limit, 15);
        assert_eq!(settings.whoami.as_deref(), Some("nalexander"));
        assert_eq!(settings.logs.prefix, "Sync");
        assert_eq!(settings.logs.directory, "/tmp/logs");
        // Unset nested keys keep their defaults
        assert_eq!(settings.logs.end_sentinel, DEFAULT_END_SENTINEL);
    }

    #[test]
    fn test_load_missing_cli_file_is_error() {
        let result = Settings::load(Some("/definitely/not/here/fennec.toml"));
        assert!(matches!(result, Err(FennecError::Config(_))));
    }

    #[test]
    fn test_package_name_and_root() {
        let settings = Settings::default();
        assert_eq!(settings.package_name("nalexander"), "org.mozilla.fennec_nalexander");
        assert_eq!(
            settings.device_root("nalexander"),
            "/data/data/org.mozilla.fennec_nalexander"
        );
    }

    #[test]
    fn test_resolved_whoami_prefers_setting() {
        let settings = Settings {
            whoami: Some("rnewman".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.resolved_whoami().as_deref(), Some("rnewman"));
    }

    #[test]
    fn test_log_settings_validation() {
        let mut logs = LogSettings::default();
        assert!(logs.validate().is_ok());

        logs.prefix = "a/b".to_string();
        assert!(logs.validate().is_err());

        logs.prefix = "FxSync".to_string();
        logs.end_sentinel.clear();
        assert!(logs.validate().is_err());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.logs.begin_sentinel, DEFAULT_BEGIN_SENTINEL);
        assert_eq!(decoded.limit, 200);
    }
}

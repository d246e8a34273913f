//! Configuration loader
//!
//! Loads [`RuntimeConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `ALARMPOOL_WORKERS` is set, loads from environment variables; any
//!    invalid variable is returned as an error
//! 2. If `ALARMPOOL_WORKERS` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ALARMPOOL_WORKERS`: Worker thread count (required for env loading)
//! - `ALARMPOOL_QUEUE_CAPACITY`: Task queue bound (unset = unbounded)
//! - `ALARMPOOL_SHUTDOWN_MODE`: `drop_pending` or `fire_pending`
//! - `ALARMPOOL_DRAIN_ON_SHUTDOWN`: Whether the pool drains on shutdown
//!   (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order), first in the current
//! working directory and then next to the executable:
//! 1. `alarmpool.toml`
//! 2. `alarmpool.json`
//! 3. `config.toml`
//! 4. `config.json`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use alarmpool_common::error::{CommonError, CommonResult};

use super::RuntimeConfig;
use crate::scheduler::ShutdownMode;

const WORKERS_VAR: &str = "ALARMPOOL_WORKERS";

/// File names probed by [`probe_config_paths`], in order.
pub const CONFIG_FILE_NAMES: [&str; 4] =
    ["alarmpool.toml", "alarmpool.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// Environment variables win when `ALARMPOOL_WORKERS` is present. Only its
/// absence falls back to a config file.
///
/// # Errors
/// Returns `CommonError::Config` if:
/// - An `ALARMPOOL_*` variable holds an invalid value
/// - `ALARMPOOL_WORKERS` is unset and no config file is found
/// - File format is invalid
/// - The loaded values fail validation
pub fn load() -> CommonResult<RuntimeConfig> {
    if std::env::var_os(WORKERS_VAR).is_none() {
        tracing::debug!("{} not set, loading configuration from file", WORKERS_VAR);
        return load_from_file(None);
    }

    let config = load_from_env()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from environment variables
///
/// `ALARMPOOL_WORKERS` must be present; the other variables fall back to
/// their defaults.
///
/// # Errors
/// Returns `CommonError::Config` if `ALARMPOOL_WORKERS` is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> CommonResult<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    config.pool.workers = env_parse(WORKERS_VAR, &env_var(WORKERS_VAR)?)?;
    config.pool.queue_capacity = match std::env::var("ALARMPOOL_QUEUE_CAPACITY") {
        Ok(raw) => Some(env_parse("ALARMPOOL_QUEUE_CAPACITY", &raw)?),
        Err(_) => None,
    };
    if let Ok(raw) = std::env::var("ALARMPOOL_SHUTDOWN_MODE") {
        config.scheduler.shutdown_mode = raw.parse::<ShutdownMode>().map_err(|e| {
            CommonError::config_field("ALARMPOOL_SHUTDOWN_MODE", e)
        })?;
    }
    config.scheduler.drain_pool_on_shutdown =
        env_bool("ALARMPOOL_DRAIN_ON_SHUTDOWN", config.scheduler.drain_pool_on_shutdown)?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `CommonError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded values fail validation
pub fn load_from_file(path: Option<PathBuf>) -> CommonResult<RuntimeConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CommonError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CommonError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        CommonError::config(format!("Failed to read config file: {}", e))
    })?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); files without
/// an extension are read as TOML.
///
/// # Errors
/// Returns `CommonError::Config` if the format is unsupported or parsing
/// fails.
pub fn parse_config(contents: &str, path: &Path) -> CommonResult<RuntimeConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid JSON format: {}", e))),
        _ => Err(CommonError::config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Checks the current working directory, then the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter().find_map(|dir| probe_config_paths_in(dir))
}

/// Probe a single directory for the standard config file names.
pub fn probe_config_paths_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> CommonResult<String> {
    std::env::var(key).map_err(|_| {
        CommonError::config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse a numeric (or other `FromStr`) environment value
fn env_parse<T>(key: &str, raw: &str) -> CommonResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| CommonError::config_field(key, format!("Invalid value '{}': {}", raw, e)))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Returns `default` if the variable is not set; any other spelling is an
/// error.
fn env_bool(key: &str, default: bool) -> CommonResult<bool> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CommonError::config_field(
            key,
            format!("Invalid value '{}': expected true/false, yes/no, on/off or 1/0", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::{const_mutex, Mutex};
    use tempfile::{Builder, TempDir};

    use super::*;

    static ENV_LOCK: Mutex<()> = const_mutex(());

    const ENV_KEYS: [&str; 4] = [
        "ALARMPOOL_WORKERS",
        "ALARMPOOL_QUEUE_CAPACITY",
        "ALARMPOOL_SHUTDOWN_MODE",
        "ALARMPOOL_DRAIN_ON_SHUTDOWN",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock();

        for (i, value) in ["1", "true", "yes", "on", "TRUE"].iter().enumerate() {
            let key = format!("ALARMPOOL_TEST_BOOL_TRUE_{i}");
            std::env::set_var(&key, value);
            assert_eq!(env_bool(&key, false), Ok(true), "{value} should parse as true");
            std::env::remove_var(&key);
        }

        for (i, value) in ["0", "false", "no", "off"].iter().enumerate() {
            let key = format!("ALARMPOOL_TEST_BOOL_FALSE_{i}");
            std::env::set_var(&key, value);
            assert_eq!(env_bool(&key, true), Ok(false), "{value} should parse as false");
            std::env::remove_var(&key);
        }

        std::env::remove_var("ALARMPOOL_TEST_BOOL_MISSING");
        assert_eq!(env_bool("ALARMPOOL_TEST_BOOL_MISSING", true), Ok(true));
        assert_eq!(env_bool("ALARMPOOL_TEST_BOOL_MISSING", false), Ok(false));

        std::env::set_var("ALARMPOOL_TEST_BOOL_TYPO", "ture");
        let err = env_bool("ALARMPOOL_TEST_BOOL_TYPO", true).unwrap_err();
        std::env::remove_var("ALARMPOOL_TEST_BOOL_TYPO");
        assert_eq!(err.field(), Some("ALARMPOOL_TEST_BOOL_TYPO"));
        assert!(err.to_string().contains("'ture'"));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("ALARMPOOL_WORKERS", "3");
        std::env::set_var("ALARMPOOL_QUEUE_CAPACITY", "64");
        std::env::set_var("ALARMPOOL_SHUTDOWN_MODE", "fire-pending");
        std::env::set_var("ALARMPOOL_DRAIN_ON_SHUTDOWN", "off");

        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.pool.queue_capacity, Some(64));
        assert_eq!(config.scheduler.shutdown_mode, ShutdownMode::FirePending);
        assert!(!config.scheduler.drain_pool_on_shutdown);
    }

    #[test]
    fn test_load_from_env_missing_workers() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, CommonError::Config { .. }));
        assert!(err.to_string().contains("ALARMPOOL_WORKERS"));
    }

    /// Validates `load_from_env` behavior for the malformed values scenario.
    ///
    /// Assertions:
    /// - Confirms a non-numeric worker count is a `Config` error.
    /// - Confirms an unknown shutdown mode is a `Config` error naming the
    ///   variable.
    /// - Confirms a zero worker count fails validation.
    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("ALARMPOOL_WORKERS", "many");
        assert!(matches!(load_from_env(), Err(CommonError::Config { .. })));

        std::env::set_var("ALARMPOOL_WORKERS", "2");
        std::env::set_var("ALARMPOOL_SHUTDOWN_MODE", "flush");
        match load_from_env() {
            Err(CommonError::Config { field, .. }) => {
                assert_eq!(field.as_deref(), Some("ALARMPOOL_SHUTDOWN_MODE"));
            }
            other => panic!("expected config error, got {other:?}"),
        }

        std::env::remove_var("ALARMPOOL_SHUTDOWN_MODE");
        std::env::set_var("ALARMPOOL_WORKERS", "0");
        assert!(load_from_env().is_err());

        clear_env();
    }

    /// Validates `load` behavior for the invalid environment scenario.
    ///
    /// Assertions:
    /// - Confirms a non-numeric `ALARMPOOL_WORKERS` is returned, not
    ///   replaced by a file lookup.
    /// - Confirms a zero worker count surfaces the validation failure.
    /// - Confirms a misspelt drain flag is rejected instead of read as
    ///   `false`.
    #[test]
    fn test_load_reports_invalid_env_instead_of_falling_back() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("ALARMPOOL_WORKERS", "abc");
        let err = load().unwrap_err();
        assert_eq!(err.field(), Some("ALARMPOOL_WORKERS"));
        assert!(!err.to_string().contains("No config file found"));

        std::env::set_var("ALARMPOOL_WORKERS", "0");
        let err = load().unwrap_err();
        assert_eq!(err.field(), Some("workers"));

        std::env::set_var("ALARMPOOL_WORKERS", "2");
        std::env::set_var("ALARMPOOL_SHUTDOWN_MODE", "flush");
        assert_eq!(load().unwrap_err().field(), Some("ALARMPOOL_SHUTDOWN_MODE"));

        std::env::remove_var("ALARMPOOL_SHUTDOWN_MODE");
        std::env::set_var("ALARMPOOL_DRAIN_ON_SHUTDOWN", "ture");
        let result = load();
        clear_env();
        assert_eq!(result.unwrap_err().field(), Some("ALARMPOOL_DRAIN_ON_SHUTDOWN"));
    }

    #[test]
    fn test_load_uses_env_when_workers_set() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("ALARMPOOL_WORKERS", "4");
        std::env::set_var("ALARMPOOL_DRAIN_ON_SHUTDOWN", "yes");
        let result = load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.pool.workers, 4);
        assert!(config.scheduler.drain_pool_on_shutdown);
    }

    #[test]
    fn test_parse_config_formats() {
        let toml = parse_config("[pool]\nworkers = 2\n", Path::new("a.toml")).unwrap();
        assert_eq!(toml.pool.workers, 2);

        let json = parse_config(r#"{"pool": {"workers": 5}}"#, Path::new("a.json")).unwrap();
        assert_eq!(json.pool.workers, 5);

        let bare = parse_config("[pool]\nworkers = 7\n", Path::new("alarmpool")).unwrap();
        assert_eq!(bare.pool.workers, 7);

        let err = parse_config("workers: 2", Path::new("a.yaml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format: yaml"));

        let err = parse_config("{", Path::new("a.json")).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON format"));
    }

    #[test]
    fn test_load_from_file_validates() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pool]\nworkers = 0").unwrap();

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/alarmpool.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_probe_prefers_alarmpool_names() {
        let dir = TempDir::new().unwrap();
        assert_eq!(probe_config_paths_in(dir.path()), None);

        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        assert_eq!(probe_config_paths_in(dir.path()), Some(dir.path().join("config.json")));

        std::fs::write(dir.path().join("alarmpool.toml"), "").unwrap();
        assert_eq!(probe_config_paths_in(dir.path()), Some(dir.path().join("alarmpool.toml")));
    }
}

//! Process settings loader
//!
//! Loads process-level settings from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `OFFBOARD_DB_PATH`: SQLite database file path
//! - `OFFBOARD_DB_POOL_SIZE`: Connection pool size
//! - `OFFBOARD_TENANTS`: Comma-separated tenant list, processed in order
//! - `OFFBOARD_LOG_DIR`: Directory for fallback audit log files
//! - `OFFBOARD_HTTP_TIMEOUT_SECS`: Outbound request timeout (optional)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `offboard.{json,toml}` in the
//! working directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};

use offboard_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use offboard_domain::{
    DatabaseSettings, HttpSettings, OffboardError, Result, RunSettings, Settings,
};

/// Load settings with automatic fallback strategy.
///
/// # Errors
/// Returns `OffboardError::Config` if neither source yields a complete
/// configuration.
pub fn load() -> Result<Settings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("settings loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from environment variables.
///
/// # Errors
/// Returns `OffboardError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Settings> {
    let db_path = env_var("OFFBOARD_DB_PATH")?;
    let pool_size = env_var("OFFBOARD_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| OffboardError::Config(format!("invalid pool size: {e}")))
    })?;

    let tenants: Vec<String> = env_var("OFFBOARD_TENANTS")?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if tenants.is_empty() {
        return Err(OffboardError::Config("OFFBOARD_TENANTS is empty".into()));
    }

    let log_dir = env_var("OFFBOARD_LOG_DIR")?;

    let timeout_seconds = match std::env::var("OFFBOARD_HTTP_TIMEOUT_SECS") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| OffboardError::Config(format!("invalid HTTP timeout: {e}")))?,
        Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
    };

    Ok(Settings {
        database: DatabaseSettings { path: db_path, pool_size },
        run: RunSettings { tenants, log_dir },
        http: HttpSettings { timeout_seconds },
    })
}

/// Load settings from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `OffboardError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OffboardError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            OffboardError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading settings from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OffboardError::Config(format!("failed to read config file: {e}")))?;

    parse_settings(&contents, &config_path)
}

/// Parse settings from string content; format detected by file extension.
fn parse_settings(contents: &str, path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| OffboardError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| OffboardError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(OffboardError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a settings file.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for name in ["config.json", "config.toml", "offboard.json", "offboard.toml"] {
            candidates.push(cwd.join(name));
            candidates.push(cwd.join("..").join(name));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in ["config.json", "config.toml", "offboard.json", "offboard.toml"] {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| OffboardError::Config(format!("missing required environment variable: {key}")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_env() {
        for key in [
            "OFFBOARD_DB_PATH",
            "OFFBOARD_DB_POOL_SIZE",
            "OFFBOARD_TENANTS",
            "OFFBOARD_LOG_DIR",
            "OFFBOARD_HTTP_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("OFFBOARD_DB_PATH", "/tmp/offboard.db");
        std::env::set_var("OFFBOARD_DB_POOL_SIZE", "4");
        std::env::set_var("OFFBOARD_TENANTS", "acme, globex");
        std::env::set_var("OFFBOARD_LOG_DIR", "/tmp/offboard-logs");

        let settings = load_from_env().expect("settings");
        assert_eq!(settings.database.path, "/tmp/offboard.db");
        assert_eq!(settings.database.pool_size, 4);
        assert_eq!(settings.run.tenants, vec!["acme", "globex"]);
        assert_eq!(settings.http.timeout_seconds, DEFAULT_HTTP_TIMEOUT_SECS);

        clear_env();
    }

    #[test]
    fn load_from_env_missing_var_fails() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(OffboardError::Config(_))));
    }

    #[test]
    fn load_from_env_rejects_empty_tenant_list() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("OFFBOARD_DB_PATH", "/tmp/offboard.db");
        std::env::set_var("OFFBOARD_DB_POOL_SIZE", "4");
        std::env::set_var("OFFBOARD_TENANTS", " , ");
        std::env::set_var("OFFBOARD_LOG_DIR", "/tmp/offboard-logs");

        let result = load_from_env();
        assert!(matches!(result, Err(OffboardError::Config(_))));

        clear_env();
    }

    #[test]
    fn load_from_file_toml() {
        let toml_content = r#"
[database]
path = "offboard.db"
pool_size = 2

[run]
tenants = ["acme"]
log_dir = "logs"

[http]
timeout_seconds = 15
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let settings = load_from_file(Some(path.clone())).expect("settings");
        assert_eq!(settings.database.path, "offboard.db");
        assert_eq!(settings.run.tenants, vec!["acme"]);
        assert_eq!(settings.http.timeout_seconds, 15);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_json() {
        let json_content = r#"{
            "database": { "path": "offboard.db", "pool_size": 2 },
            "run": { "tenants": ["acme", "globex"], "log_dir": "logs" },
            "http": { "timeout_seconds": 30 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let settings = load_from_file(Some(path.clone())).expect("settings");
        assert_eq!(settings.run.tenants.len(), 2);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(OffboardError::Config(_))));
    }

    #[test]
    fn unsupported_extension_fails() {
        let result = parse_settings("key: value", &PathBuf::from("config.yaml"));
        assert!(matches!(result, Err(OffboardError::Config(_))));
    }
}
